//! Repetition coding.
//!
//! Encode repeats every bit `factor` times in a row. Decode splits the
//! input into consecutive `factor`-bit blocks, drops any incomplete tail
//! block, and majority-votes each block.
//!
//! # Tie rule
//!
//! A block decodes to 1 iff `2 * ones >= factor`, i.e. exact ties (only
//! possible for even factors) round up to 1. Odd factors never tie.

use crate::bits::BitVector;
use crate::error::{RedundancyError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fixed-rate repetition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct RepetitionCode {
    factor: usize,
}

impl RepetitionCode {
    /// # Errors
    /// `RedundancyError::ZeroFactor` if `factor` is 0.
    pub fn new(factor: usize) -> Result<Self> {
        if factor == 0 {
            return Err(RedundancyError::ZeroFactor.into());
        }
        if factor % 2 == 0 {
            warn!(factor, "even repetition factor: tied blocks decode to 1");
        }
        Ok(Self { factor })
    }

    /// No redundancy.
    pub fn identity() -> Self {
        Self { factor: 1 }
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn encode(&self, bits: &BitVector) -> BitVector {
        let mut out = BitVector::with_capacity(bits.len() * self.factor);
        for bit in bits.iter() {
            for _ in 0..self.factor {
                out.push(bit);
            }
        }
        out
    }

    pub fn decode(&self, bits: &BitVector) -> BitVector {
        bits.blocks(self.factor)
            .map(|block| {
                let ones = block.iter().filter(|&&b| b).count();
                2 * ones >= self.factor
            })
            .collect()
    }
}

impl Default for RepetitionCode {
    fn default() -> Self {
        Self { factor: 3 }
    }
}

impl TryFrom<usize> for RepetitionCode {
    type Error = crate::Error;

    fn try_from(factor: usize) -> Result<Self> {
        Self::new(factor)
    }
}

impl From<RepetitionCode> for usize {
    fn from(code: RepetitionCode) -> Self {
        code.factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bv(s: &str) -> BitVector {
        s.parse().unwrap()
    }

    #[test]
    fn test_encode_repeats_contiguously() {
        let rep = RepetitionCode::new(3).unwrap();
        assert_eq!(rep.encode(&bv("101")), bv("111000111"));
    }

    #[test]
    fn test_single_flip_per_block_corrected() {
        let rep = RepetitionCode::new(3).unwrap();
        let sent = rep.encode(&bv("10"));
        for i in 0..sent.len() {
            let mut rx = sent.clone();
            rx.flip(i);
            assert_eq!(rep.decode(&rx), bv("10"), "flip at {i}");
        }
    }

    #[test]
    fn test_double_flip_in_block_not_corrected() {
        let rep = RepetitionCode::new(3).unwrap();
        let mut rx = rep.encode(&bv("1"));
        rx.flip(0);
        rx.flip(2);
        assert_eq!(rep.decode(&rx), bv("0"));
    }

    #[test]
    fn test_tail_block_dropped() {
        let rep = RepetitionCode::new(3).unwrap();
        assert_eq!(rep.decode(&bv("11100011")), bv("10"));
        assert!(rep.decode(&bv("11")).is_empty());
    }

    #[test]
    fn test_even_factor_ties_round_up() {
        let rep = RepetitionCode::new(4).unwrap();
        assert_eq!(rep.decode(&bv("1100")), bv("1"));
        assert_eq!(rep.decode(&bv("1000")), bv("0"));
    }

    #[test]
    fn test_identity() {
        let rep = RepetitionCode::identity();
        assert_eq!(rep.encode(&bv("0110")), bv("0110"));
        assert_eq!(rep.decode(&bv("0110")), bv("0110"));
    }

    #[test]
    fn test_zero_factor_rejected() {
        assert!(RepetitionCode::new(0).is_err());
        assert!(serde_json::from_str::<RepetitionCode>("0").is_err());
        assert_eq!(serde_json::from_str::<RepetitionCode>("5").unwrap().factor(), 5);
    }
}
