//! Interchangeable symbol codecs.
//!
//! Every strategy implements [`SymbolCodec`]: encode a slice of symbols to
//! one `BitVector`, decode a (possibly corrupted) `BitVector` back to
//! whatever symbols it still yields. Decoding never fails: bits that do not
//! form a complete unit are dropped.
//!
//! Text codecs (`Symbol = char`) also get [`TextCodec`] for free.

use crate::bits::{bits_to_uint, BitVector};
use crate::error::{CodecError, HuffmanError, Result};
use crate::huffman::{FrequencyTable, HuffmanCode};
use serde::{Deserialize, Serialize};

/// Encode/decode strategy over a symbol alphabet.
pub trait SymbolCodec {
    type Symbol;

    /// Concatenate the codewords of `symbols`.
    fn encode(&self, symbols: &[Self::Symbol]) -> Result<BitVector>;

    /// Recover as many symbols as `bits` still holds.
    fn decode(&self, bits: &BitVector) -> Vec<Self::Symbol>;

    /// Bits `encode` would produce for `symbols`.
    fn bit_cost(&self, symbols: &[Self::Symbol]) -> usize;
}

/// String convenience layer over character codecs.
pub trait TextCodec: SymbolCodec<Symbol = char> {
    fn encode_text(&self, text: &str) -> Result<BitVector> {
        let chars: Vec<char> = text.chars().collect();
        self.encode(&chars)
    }

    fn decode_text(&self, bits: &BitVector) -> String {
        self.decode(bits).into_iter().collect()
    }

    fn text_bit_cost(&self, text: &str) -> usize {
        let chars: Vec<char> = text.chars().collect();
        self.bit_cost(&chars)
    }
}

impl<T: SymbolCodec<Symbol = char> + ?Sized> TextCodec for T {}

/// Default width of the fixed-width baseline (7-bit ASCII).
pub const DEFAULT_FIXED_WIDTH: usize = 7;

/// Default width for characters missing from the Huffman code table.
pub const DEFAULT_FALLBACK_WIDTH: usize = 8;

/// Constant-width character code.
///
/// Each character is sent as its code point masked to `width` bits, so
/// anything outside the `width`-bit range is folded onto it (with width 7,
/// `'é'` (U+00E9) arrives as `'i'` (U+0069)). Decode reads whole `width`-bit
/// chunks and silently drops a shorter tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedWidthCodec {
    width: usize,
}

impl FixedWidthCodec {
    /// # Errors
    /// `CodecError::InvalidWidth` unless `1 <= width <= 8`.
    pub fn new(width: usize) -> Result<Self> {
        if !(1..=8).contains(&width) {
            return Err(CodecError::InvalidWidth(width).into());
        }
        Ok(Self { width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    fn mask(&self) -> u32 {
        (1u32 << self.width) - 1
    }

    /// Bits needed to send `text` as raw UTF-8 bytes.
    pub fn utf8_bit_cost(text: &str) -> usize {
        8 * text.len()
    }
}

impl Default for FixedWidthCodec {
    fn default() -> Self {
        Self {
            width: DEFAULT_FIXED_WIDTH,
        }
    }
}

impl SymbolCodec for FixedWidthCodec {
    type Symbol = char;

    fn encode(&self, symbols: &[char]) -> Result<BitVector> {
        let mut bits = BitVector::with_capacity(symbols.len() * self.width);
        for &c in symbols {
            bits.push_uint((c as u32 & self.mask()) as u64, self.width)?;
        }
        Ok(bits)
    }

    fn decode(&self, bits: &BitVector) -> Vec<char> {
        // Values below 256 are always valid scalar values.
        bits.blocks(self.width)
            .filter_map(|block| char::from_u32(bits_to_uint(block) as u32))
            .collect()
    }

    fn bit_cost(&self, symbols: &[char]) -> usize {
        symbols.len() * self.width
    }
}

/// Huffman code settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuffmanConfig {
    /// Width used for characters absent from the code table. The character
    /// is sent as its code point masked to this many bits.
    pub fallback_width: usize,
}

impl Default for HuffmanConfig {
    fn default() -> Self {
        Self {
            fallback_width: DEFAULT_FALLBACK_WIDTH,
        }
    }
}

/// Variable-length character code built from corpus statistics.
///
/// Characters the corpus never showed are sent with a fixed
/// `fallback_width`-bit pattern. The receiver has no way to tell such a
/// pattern from ordinary codewords, so it decodes as whatever codewords it
/// happens to spell.
#[derive(Debug, Clone)]
pub struct HuffmanCodec {
    code: HuffmanCode<char>,
    config: HuffmanConfig,
}

impl HuffmanCodec {
    /// Build from explicit character frequencies.
    pub fn new(frequencies: &FrequencyTable<char>, config: HuffmanConfig) -> Result<Self> {
        if !(1..=21).contains(&config.fallback_width) {
            return Err(HuffmanError::InvalidFallbackWidth(config.fallback_width).into());
        }
        let code = HuffmanCode::build(frequencies)?;
        Ok(Self { code, config })
    }

    /// Build from the character statistics of `corpus`.
    pub fn from_corpus(corpus: &str, config: HuffmanConfig) -> Result<Self> {
        Self::new(&FrequencyTable::from_text(corpus), config)
    }

    pub fn code(&self) -> &HuffmanCode<char> {
        &self.code
    }

    pub fn config(&self) -> HuffmanConfig {
        self.config
    }

    fn fallback_value(&self, c: char) -> u64 {
        let mask = (1u32 << self.config.fallback_width) - 1;
        (c as u32 & mask) as u64
    }
}

impl SymbolCodec for HuffmanCodec {
    type Symbol = char;

    fn encode(&self, symbols: &[char]) -> Result<BitVector> {
        let mut bits = BitVector::with_capacity(self.bit_cost(symbols));
        for &c in symbols {
            match self.code.table().get(&c) {
                Some(codeword) => bits.extend_from(codeword),
                None => bits.push_uint(self.fallback_value(c), self.config.fallback_width)?,
            }
        }
        Ok(bits)
    }

    fn decode(&self, bits: &BitVector) -> Vec<char> {
        self.code.trie().decode(bits)
    }

    fn bit_cost(&self, symbols: &[char]) -> usize {
        symbols
            .iter()
            .map(|c| {
                self.code
                    .table()
                    .get(c)
                    .map_or(self.config.fallback_width, BitVector::len)
            })
            .sum()
    }
}
