//! Nearest-codeword correction against a fixed codebook.
//!
//! After the channel and the repetition decoder, a semantic codeword rarely
//! lands exactly on a valid pattern. The corrector snaps it to the codebook
//! entry at minimum Hamming distance.
//!
//! # Complexity
//!
//! A brute-force scan: O(entries × width) per call. The codebook is bounded
//! by the number of triples in the knowledge graph. The scan stops early on
//! an exact match.

use crate::bits::BitVector;
use crate::error::{CodebookError, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A non-empty set of equal-width codewords, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BitVector>", into = "Vec<BitVector>")]
pub struct Codebook {
    width: usize,
    entries: Vec<BitVector>,
}

impl Codebook {
    /// # Errors
    /// - `CodebookError::Empty` if `entries` is empty
    /// - `CodebookError::ZeroWidth` if the codewords have no bits
    /// - `CodebookError::WidthMismatch` if widths differ
    pub fn new(entries: Vec<BitVector>) -> Result<Self> {
        let width = entries.first().ok_or(CodebookError::Empty)?.len();
        if width == 0 {
            return Err(CodebookError::ZeroWidth.into());
        }
        if let Some(bad) = entries.iter().find(|e| e.len() != width) {
            return Err(CodebookError::WidthMismatch {
                expected: width,
                actual: bad.len(),
            }
            .into());
        }
        Ok(Self { width, entries })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the codebook has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[BitVector] {
        &self.entries
    }

    pub fn contains(&self, bits: &BitVector) -> bool {
        self.entries.contains(bits)
    }

    /// Find the entry nearest to `bits`. Ties go to the earliest entry.
    ///
    /// # Errors
    /// `CodebookError::WidthMismatch` if `bits` is not codebook-wide.
    pub fn nearest(&self, bits: &BitVector) -> Result<Correction<'_>> {
        let mismatch = || CodebookError::WidthMismatch {
            expected: self.width,
            actual: bits.len(),
        };
        if bits.len() != self.width {
            return Err(mismatch().into());
        }

        let mut best: Option<Correction<'_>> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            let distance = entry.hamming_distance(bits).ok_or_else(mismatch)?;
            if best.as_ref().map_or(true, |b| distance < b.distance) {
                best = Some(Correction {
                    index,
                    codeword: entry,
                    distance,
                });
                if distance == 0 {
                    break;
                }
            }
        }

        let best = best.ok_or(CodebookError::Empty)?;
        trace!(index = best.index, distance = best.distance, "corrected codeword");
        Ok(best)
    }

    /// The nearest entry's bits.
    pub fn correct(&self, bits: &BitVector) -> Result<BitVector> {
        Ok(self.nearest(bits)?.codeword.clone())
    }
}

impl TryFrom<Vec<BitVector>> for Codebook {
    type Error = Error;

    fn try_from(entries: Vec<BitVector>) -> Result<Self> {
        Self::new(entries)
    }
}

impl From<Codebook> for Vec<BitVector> {
    fn from(codebook: Codebook) -> Self {
        codebook.entries
    }
}

/// Result of a nearest-codeword search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction<'a> {
    /// Position of the chosen entry in the codebook
    pub index: usize,
    pub codeword: &'a BitVector,
    /// Bits that differed from the input
    pub distance: usize,
}

/// Snap `bits` to the nearest entry of `codebook`.
pub fn correct(bits: &BitVector, codebook: &Codebook) -> Result<BitVector> {
    codebook.correct(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(words: &[&str]) -> Codebook {
        Codebook::new(words.iter().map(|w| w.parse().unwrap()).collect()).unwrap()
    }

    fn bv(s: &str) -> BitVector {
        s.parse().unwrap()
    }

    #[test]
    fn test_member_returned_unchanged() {
        let codebook = book(&["0000", "0111", "1011"]);
        let hit = codebook.nearest(&bv("0111")).unwrap();
        assert_eq!(hit.index, 1);
        assert_eq!(hit.distance, 0);
        assert_eq!(hit.codeword, &bv("0111"));
    }

    #[test]
    fn test_nearest_entry() {
        let codebook = book(&["0000", "0111", "1011"]);
        assert_eq!(correct(&bv("0011"), &codebook).unwrap(), bv("0111"));
        assert_eq!(correct(&bv("1000"), &codebook).unwrap(), bv("0000"));
    }

    #[test]
    fn test_ties_go_to_first_entry() {
        let codebook = book(&["1100", "0011"]);
        // distance 2 to both
        let hit = codebook.nearest(&bv("1010")).unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(hit.distance, 2);
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            Codebook::new(Vec::new()),
            Err(Error::Codebook(CodebookError::Empty))
        ));
        assert!(matches!(
            Codebook::new(vec![BitVector::new()]),
            Err(Error::Codebook(CodebookError::ZeroWidth))
        ));
        assert!(matches!(
            Codebook::new(vec![bv("01"), bv("011")]),
            Err(Error::Codebook(CodebookError::WidthMismatch {
                expected: 2,
                actual: 3
            }))
        ));
    }

    #[test]
    fn test_input_width_mismatch() {
        let codebook = book(&["0000", "1111"]);
        assert!(codebook.nearest(&bv("000")).is_err());
        assert!(codebook.nearest(&bv("00000")).is_err());
    }

    #[test]
    fn test_serde_validates() {
        let codebook = book(&["01", "10"]);
        let json = serde_json::to_string(&codebook).unwrap();
        assert_eq!(json, r#"["01","10"]"#);
        let back: Codebook = serde_json::from_str(&json).unwrap();
        assert_eq!(back, codebook);

        assert!(serde_json::from_str::<Codebook>(r#"["01","101"]"#).is_err());
        assert!(serde_json::from_str::<Codebook>("[]").is_err());
    }
}
