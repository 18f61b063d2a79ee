//! Error types for the semcom-sim system.
//!
//! Only genuinely fatal conditions live here. The expected outcomes of a
//! lossy channel (truncated trailing bits, triples that no longer map back
//! to the knowledge graph, empty reconstructions) are ordinary return
//! values and never surface as errors.

use thiserror::Error;

/// Top-level error type for all operations in the system.
///
/// Each variant corresponds to a specific failure domain:
/// - Huffman: code table construction
/// - Codec: symbol encode parameters and field widths
/// - Codebook: corrector codebook construction and width checks
/// - Channel: channel parameters
/// - Redundancy: repetition factor
#[derive(Debug, Error)]
pub enum Error {
    /// Huffman code table construction failed
    #[error("huffman codec error: {0}")]
    Huffman(#[from] HuffmanError),

    /// Symbol codec error (e.g., unknown triple element, bad width)
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Codebook error (e.g., empty codebook, width mismatch)
    #[error("codebook error: {0}")]
    Codebook(#[from] CodebookError),

    /// Channel parameter error
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Repetition coder parameter error
    #[error("redundancy error: {0}")]
    Redundancy(#[from] RedundancyError),
}

/// Huffman code table errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HuffmanError {
    /// No symbols with non-zero frequency (cannot build a code table)
    #[error("empty frequency table: cannot build code table")]
    EmptyFrequencyTable,

    /// Fallback width for unseen symbols must fit a char code point mask
    #[error("invalid fallback width {0}: must be in 1..=21")]
    InvalidFallbackWidth(usize),
}

/// Symbol codec errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Fixed-width character code outside the supported range
    #[error("invalid fixed width {0}: must be in 1..=8")]
    InvalidWidth(usize),

    /// A field value does not fit its declared bit width
    #[error("value {value} does not fit in {width} bits")]
    ValueTooWide { value: u64, width: usize },

    /// A triple element was not present when the vocabularies were built
    #[error("unknown {role} {name:?}")]
    UnknownElement { role: &'static str, name: String },

    /// The knowledge graph has no triples to build vocabularies from
    #[error("empty knowledge graph: cannot build semantic codec")]
    EmptyKnowledgeGraph,
}

/// Codebook (corrector) errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodebookError {
    /// Codebook has no entries
    #[error("empty codebook: nothing to correct against")]
    Empty,

    /// Codewords must hold at least one bit
    #[error("codebook entries have zero width")]
    ZeroWidth,

    /// Codeword widths disagree
    #[error("codeword width mismatch: expected {expected}, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },
}

/// Channel parameter errors.
#[derive(Debug, Error, PartialEq)]
pub enum ChannelError {
    /// Flip probability outside [0, 1] or NaN
    #[error("flip probability {0} outside [0, 1]")]
    InvalidProbability(f64),
}

/// Repetition coder errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedundancyError {
    /// Repetition factor must be at least one
    #[error("repetition factor must be >= 1")]
    ZeroFactor,
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
