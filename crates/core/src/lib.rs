//! semcom-sim-core: coding strategies over a noisy binary channel
//!
//! This library provides the core components for comparing how well three
//! encodings survive bit errors:
//! - A fixed-width character code (7 bits per character by default)
//! - A Huffman character code trained on corpus statistics
//! - A semantic-symbol code sending knowledge-graph triples as fixed-width
//!   id triples, repaired by nearest-codeword correction
//!
//! # Architecture
//!
//! The system is designed around clear module boundaries:
//! - `bits`: `BitVector`, the currency between every stage
//! - `huffman`: deterministic Huffman construction and online decoding
//! - `codec`: the `SymbolCodec` trait, fixed-width and Huffman text codecs
//! - `semantic`: triples, vocabularies and the semantic-symbol codec
//! - `channel`: seeded binary symmetric channel
//! - `redundancy`: repetition code with majority voting
//! - `corrector`: nearest-codeword correction against a fixed codebook
//! - `pipeline`: the three end-to-end reconstruction strategies
//! - `verbalize`: hand-off of reconstructed triples to a text generator
//! - `metrics`: bit accounting and reconstruction quality
//!
//! # Design Principles
//!
//! - **No panics**: fatal conditions are structured errors
//! - **Lossy is normal**: truncation and dropped triples are plain values
//! - **Deterministic**: seeded randomness makes runs reproducible
//! - **Shared read-only**: code tables and codebooks are built once and
//!   borrowed immutably by every run

pub mod bits;
pub mod channel;
pub mod codec;
pub mod corrector;
pub mod error;
pub mod huffman;
pub mod metrics;
pub mod pipeline;
pub mod redundancy;
pub mod semantic;
pub mod verbalize;

// Re-export commonly used types
pub use bits::BitVector;
pub use channel::{BinarySymmetricChannel, ChannelConfig};
pub use codec::{FixedWidthCodec, HuffmanCodec, HuffmanConfig, SymbolCodec, TextCodec};
pub use corrector::Codebook;
pub use error::{Error, Result};
pub use pipeline::{Sample, SimulationContext, Strategy};
pub use redundancy::RepetitionCode;
pub use semantic::{SemanticCodec, Triple};
