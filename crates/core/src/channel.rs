//! Binary symmetric channel.
//!
//! Every bit is independently flipped with probability `p`:
//! output bit = input bit XOR Bernoulli(p).
//!
//! - `p = 0` is the identity channel
//! - `p = 1` flips every bit
//! - `p = 0.5` destroys all information in expectation
//!
//! # Determinism
//!
//! All randomness comes from a seeded ChaCha8 RNG. Exactly one uniform
//! draw `u` in [0, 1) is consumed per transmitted bit, whatever `p` is, and
//! the bit flips iff `u < p`. Two channels built with the same seed and fed
//! the same bit counts therefore see the same draws, and the flips at a
//! larger `p` are a superset of the flips at a smaller `p`. This is for
//! evaluation, not security.

use crate::bits::BitVector;
use crate::error::{ChannelError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Configuration for a channel instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Per-bit flip probability in [0, 1]
    pub flip_probability: f64,

    /// Random seed for determinism
    pub seed: u64,
}

impl ChannelConfig {
    pub fn new(flip_probability: f64, seed: u64) -> Result<Self> {
        validate_probability(flip_probability)?;
        Ok(Self {
            flip_probability,
            seed,
        })
    }

    /// A channel that never flips.
    pub fn noiseless(seed: u64) -> Self {
        Self {
            flip_probability: 0.0,
            seed,
        }
    }
}

fn validate_probability(p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(ChannelError::InvalidProbability(p).into());
    }
    Ok(())
}

/// Flip each bit of `bits` with probability `p`, drawing from `rng`.
///
/// Consumes one `f64` from `rng` per bit.
///
/// # Errors
/// `ChannelError::InvalidProbability` if `p` is NaN or outside [0, 1].
pub fn transmit<R: Rng + ?Sized>(bits: &BitVector, p: f64, rng: &mut R) -> Result<BitVector> {
    validate_probability(p)?;
    Ok(flip_bits(bits, p, rng).0)
}

fn flip_bits<R: Rng + ?Sized>(bits: &BitVector, p: f64, rng: &mut R) -> (BitVector, usize) {
    let mut flipped = 0;
    let out: BitVector = bits
        .iter()
        .map(|bit| {
            let roll: f64 = rng.gen();
            if roll < p {
                flipped += 1;
                !bit
            } else {
                bit
            }
        })
        .collect();
    (out, flipped)
}

/// Seeded binary symmetric channel with flip statistics.
///
/// # Thread Safety
/// Holds its own RNG; give each concurrent run its own instance.
#[derive(Debug, Clone)]
pub struct BinarySymmetricChannel {
    config: ChannelConfig,
    rng: ChaCha8Rng,
    bits_sent: u64,
    bits_flipped: u64,
}

impl BinarySymmetricChannel {
    /// # Errors
    /// `ChannelError::InvalidProbability` if the configured probability is
    /// NaN or outside [0, 1].
    pub fn new(config: ChannelConfig) -> Result<Self> {
        validate_probability(config.flip_probability)?;
        Ok(Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            bits_sent: 0,
            bits_flipped: 0,
        })
    }

    pub fn config(&self) -> ChannelConfig {
        self.config
    }

    /// Send `bits` through the channel. The output has the same length.
    pub fn transmit(&mut self, bits: &BitVector) -> BitVector {
        let (out, flipped) = flip_bits(bits, self.config.flip_probability, &mut self.rng);
        self.bits_sent += bits.len() as u64;
        self.bits_flipped += flipped as u64;
        out
    }

    pub fn stats(&self) -> ChannelStats {
        ChannelStats {
            bits_sent: self.bits_sent,
            bits_flipped: self.bits_flipped,
        }
    }
}

/// Statistics about channel behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Total bits sent into the channel
    pub bits_sent: u64,

    /// Bits the channel flipped
    pub bits_flipped: u64,
}

impl ChannelStats {
    pub fn merge(&mut self, other: &ChannelStats) {
        self.bits_sent += other.bits_sent;
        self.bits_flipped += other.bits_flipped;
    }

    /// Observed flip rate (flipped / sent).
    pub fn flip_rate(&self) -> f64 {
        if self.bits_sent == 0 {
            0.0
        } else {
            self.bits_flipped as f64 / self.bits_sent as f64
        }
    }
}
