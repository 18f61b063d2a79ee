//! Fixed-length bit sequences.
//!
//! `BitVector` is the currency passed between every stage of the
//! simulation: codecs produce it, the channel corrupts it, the repetition
//! coder stretches and shrinks it, and the corrector snaps it back onto a
//! codebook. Bits are stored one per `bool`; they are never sign-extended
//! or reinterpreted as bytes.
//!
//! # Text form
//! A `BitVector` displays (and serializes) as a string of `'0'`/`'1'`
//! characters, first bit first.

use crate::error::{CodecError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An ordered, explicitly sized sequence of bits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitVector {
    bits: Vec<bool>,
}

impl BitVector {
    /// Create an empty bit vector.
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// Create an empty bit vector with room for `capacity` bits.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: Vec::with_capacity(capacity),
        }
    }

    /// Create a vector of `len` zero bits.
    pub fn zeros(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    /// Encode `value` as an unsigned big-endian field of exactly `width` bits.
    ///
    /// # Errors
    /// `CodecError::ValueTooWide` if `value` needs more than `width` bits
    /// or `width` exceeds 64.
    pub fn from_uint(value: u64, width: usize) -> Result<Self> {
        let mut bits = Self::with_capacity(width);
        bits.push_uint(value, width)?;
        Ok(bits)
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True if the vector holds no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bit at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Flip the bit at `index`. Out-of-range indices are ignored.
    pub fn flip(&mut self, index: usize) {
        if let Some(bit) = self.bits.get_mut(index) {
            *bit = !*bit;
        }
    }

    /// Iterate over the bits in order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Borrow the bits as a slice.
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Append one bit.
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Append `value` as a `width`-bit unsigned field, MSB first.
    pub fn push_uint(&mut self, value: u64, width: usize) -> Result<()> {
        if width > 64 || (width < 64 && value >> width != 0) {
            return Err(CodecError::ValueTooWide { value, width }.into());
        }
        for shift in (0..width).rev() {
            self.bits.push((value >> shift) & 1 == 1);
        }
        Ok(())
    }

    /// Append all bits of `other`.
    pub fn extend_from(&mut self, other: &BitVector) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Read a `width`-bit unsigned field starting at `offset`, MSB first.
    ///
    /// Returns `None` if the field runs past the end or `width > 64`.
    pub fn read_uint(&self, offset: usize, width: usize) -> Option<u64> {
        if width > 64 {
            return None;
        }
        let field = self.bits.get(offset..offset.checked_add(width)?)?;
        Some(bits_to_uint(field))
    }

    /// Copy out the bits in `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Option<BitVector> {
        self.bits.get(start..end).map(|bits| Self {
            bits: bits.to_vec(),
        })
    }

    /// Split into consecutive blocks of `width` bits.
    ///
    /// Trailing bits that do not fill a whole block are dropped. A `width`
    /// of zero yields no blocks.
    pub fn blocks(&self, width: usize) -> impl Iterator<Item = &[bool]> + '_ {
        let usable = if width == 0 { 0 } else { self.bits.len() - self.bits.len() % width };
        self.bits[..usable].chunks(width.max(1))
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Hamming distance to `other`, or `None` if the lengths differ.
    pub fn hamming_distance(&self, other: &BitVector) -> Option<usize> {
        if self.len() != other.len() {
            return None;
        }
        Some(
            self.bits
                .iter()
                .zip(&other.bits)
                .filter(|(a, b)| a != b)
                .count(),
        )
    }

    /// True if `self` is a (possibly equal) prefix of `other`.
    pub fn is_prefix_of(&self, other: &BitVector) -> bool {
        other.bits.starts_with(&self.bits)
    }
}

/// Interpret a slice of bits as an unsigned big-endian integer.
pub(crate) fn bits_to_uint(bits: &[bool]) -> u64 {
    bits.iter().fold(0u64, |acc, &b| (acc << 1) | b as u64)
}

impl From<Vec<bool>> for BitVector {
    fn from(bits: Vec<bool>) -> Self {
        Self { bits }
    }
}

impl From<&[bool]> for BitVector {
    fn from(bits: &[bool]) -> Self {
        Self {
            bits: bits.to_vec(),
        }
    }
}

impl FromIterator<bool> for BitVector {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Error parsing a `BitVector` from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid bit character {found:?} at position {position}")]
pub struct ParseBitsError {
    pub position: usize,
    pub found: char,
}

impl FromStr for BitVector {
    type Err = ParseBitsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.chars()
            .enumerate()
            .map(|(position, c)| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                found => Err(ParseBitsError { position, found }),
            })
            .collect()
    }
}

impl Serialize for BitVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BitVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
