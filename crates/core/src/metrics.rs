//! Metrics collection and reporting for channel sweeps.
//!
//! This module provides observable insight into each strategy:
//! - Bit accounting (payload bits, bits on the channel)
//! - Residual bit errors after majority voting
//! - Symbol accuracy of the reconstruction
//! - Empty-output rate (items that came back with nothing)
//!
//! Similarity scoring against reference text (embeddings, BLEU) is done
//! downstream; everything here is plain counting.
//!
//! # Thread Safety
//!
//! The structs are plain data. Collect one per run and [`merge`] them.
//!
//! [`merge`]: StrategyMetrics::merge

use crate::channel::ChannelStats;
use crate::codec::FixedWidthCodec;
use crate::pipeline::{SampleReconstruction, Strategy, TextReconstruction, TripleReconstruction};
use crate::semantic::Triple;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the fixed-width baseline's size is reported.
///
/// The channel always carries the codec's own bits; this only changes the
/// bit counts used for size comparison (kbits, bits per item).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BitAccounting {
    /// Count the codewords actually produced (`width` bits per character)
    #[default]
    Codeword,
    /// Count the text as raw UTF-8 bytes (8 bits per byte)
    Utf8Bytes,
}

/// Counters for one strategy over many items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyMetrics {
    /// Items reconstructed
    pub items: u64,

    /// Codec output bits, before repetition
    pub payload_bits: u64,

    /// Bits reported for size comparison; equals `payload_bits` unless a
    /// different [`BitAccounting`] was used
    pub accounted_bits: u64,

    /// Bits put on the channel
    pub channel_bits: u64,

    /// Payload bits still wrong after majority voting
    pub residual_bit_errors: u64,

    /// Symbols (characters or triples) in the originals
    pub symbols_sent: u64,

    /// Symbols in the reconstructions
    pub symbols_received: u64,

    /// Symbols that matched the original
    pub symbols_matched: u64,

    /// Items whose reconstruction was empty
    pub empty_outputs: u64,

    /// Semantic only: triples dropped during reconstruction
    pub dropped: u64,
}

impl StrategyMetrics {
    /// Record a text reconstruction against its original.
    ///
    /// Characters are compared position by position.
    pub fn record_text(&mut self, original: &str, rec: &TextReconstruction) {
        self.record_text_as(original, rec, BitAccounting::Codeword);
    }

    /// [`record_text`](Self::record_text) with the size counted per
    /// `accounting`.
    pub fn record_text_as(&mut self, original: &str, rec: &TextReconstruction, accounting: BitAccounting) {
        let sent = original.chars().count() as u64;
        let received = rec.text.chars().count() as u64;
        let matched = original
            .chars()
            .zip(rec.text.chars())
            .filter(|(a, b)| a == b)
            .count() as u64;

        self.record_common(rec.payload_bits, rec.channel_bits, rec.residual_bit_errors);
        self.accounted_bits += match accounting {
            BitAccounting::Codeword => rec.payload_bits,
            BitAccounting::Utf8Bytes => FixedWidthCodec::utf8_bit_cost(original),
        } as u64;
        self.symbols_sent += sent;
        self.symbols_received += received;
        self.symbols_matched += matched;
        if rec.text.is_empty() {
            self.empty_outputs += 1;
        }
    }

    /// Record a triple reconstruction against its original set.
    ///
    /// Triples are matched as multisets, ignoring order.
    pub fn record_triples(&mut self, original: &[Triple], rec: &TripleReconstruction) {
        let mut remaining: HashMap<&Triple, usize> = HashMap::new();
        for t in original {
            *remaining.entry(t).or_default() += 1;
        }
        let mut matched = 0u64;
        for t in &rec.triples {
            if let Some(n) = remaining.get_mut(t).filter(|n| **n > 0) {
                *n -= 1;
                matched += 1;
            }
        }

        self.record_common(rec.payload_bits, rec.channel_bits, rec.residual_bit_errors);
        self.accounted_bits += rec.payload_bits as u64;
        self.symbols_sent += original.len() as u64;
        self.symbols_received += rec.triples.len() as u64;
        self.symbols_matched += matched;
        self.dropped += rec.dropped as u64;
        if rec.triples.is_empty() {
            self.empty_outputs += 1;
        }
    }

    fn record_common(&mut self, payload: usize, channel: usize, residual: usize) {
        self.items += 1;
        self.payload_bits += payload as u64;
        self.channel_bits += channel as u64;
        self.residual_bit_errors += residual as u64;
    }

    /// Add another collector's counts to this one.
    pub fn merge(&mut self, other: &StrategyMetrics) {
        self.items += other.items;
        self.payload_bits += other.payload_bits;
        self.accounted_bits += other.accounted_bits;
        self.channel_bits += other.channel_bits;
        self.residual_bit_errors += other.residual_bit_errors;
        self.symbols_sent += other.symbols_sent;
        self.symbols_received += other.symbols_received;
        self.symbols_matched += other.symbols_matched;
        self.empty_outputs += other.empty_outputs;
        self.dropped += other.dropped;
    }

    /// Residual errors per payload bit.
    pub fn residual_bit_error_rate(&self) -> f64 {
        ratio(self.residual_bit_errors, self.payload_bits)
    }

    /// Matched symbols over the larger of sent and received counts.
    ///
    /// Returns 1.0 when nothing was sent and nothing came back.
    pub fn symbol_accuracy(&self) -> f64 {
        let denom = self.symbols_sent.max(self.symbols_received);
        if denom == 0 {
            1.0
        } else {
            self.symbols_matched as f64 / denom as f64
        }
    }

    /// Matched symbols over symbols sent.
    pub fn recall(&self) -> f64 {
        ratio(self.symbols_matched, self.symbols_sent)
    }

    /// Matched symbols over symbols received.
    pub fn precision(&self) -> f64 {
        ratio(self.symbols_matched, self.symbols_received)
    }

    /// Fraction of items that came back empty.
    pub fn empty_rate(&self) -> f64 {
        ratio(self.empty_outputs, self.items)
    }

    /// Accounted size in kilobits (1 kb = 1000 bits).
    pub fn payload_kilobits(&self) -> f64 {
        self.accounted_bits as f64 / 1000.0
    }

    /// Mean accounted bits per item.
    pub fn bits_per_item(&self) -> f64 {
        ratio(self.accounted_bits, self.items)
    }
}

fn ratio(num: u64, denom: u64) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// Aggregated results at one channel probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub flip_probability: f64,
    pub repetition: usize,
    /// How `fixed_width` sizes are counted
    pub fixed_width_accounting: BitAccounting,
    pub fixed_width: StrategyMetrics,
    pub huffman: StrategyMetrics,
    pub semantic: StrategyMetrics,
    pub channel: ChannelStats,
}

impl SweepPoint {
    pub fn new(flip_probability: f64, repetition: usize) -> Self {
        Self {
            flip_probability,
            repetition,
            fixed_width_accounting: BitAccounting::default(),
            fixed_width: StrategyMetrics::default(),
            huffman: StrategyMetrics::default(),
            semantic: StrategyMetrics::default(),
            channel: ChannelStats::default(),
        }
    }

    /// Count fixed-width sizes per `accounting` from now on.
    pub fn with_accounting(mut self, accounting: BitAccounting) -> Self {
        self.fixed_width_accounting = accounting;
        self
    }

    /// Record every strategy's result for one sample.
    pub fn record(&mut self, text: &str, triples: &[Triple], rec: &SampleReconstruction) {
        self.fixed_width
            .record_text_as(text, &rec.fixed_width, self.fixed_width_accounting);
        self.huffman.record_text(text, &rec.huffman);
        self.semantic.record_triples(triples, &rec.semantic);
    }

    pub fn strategy(&self, strategy: Strategy) -> &StrategyMetrics {
        match strategy {
            Strategy::FixedWidth => &self.fixed_width,
            Strategy::Huffman => &self.huffman,
            Strategy::Semantic => &self.semantic,
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!(
            "\n=== p = {:.3}, repetition x{} ===",
            self.flip_probability, self.repetition
        );
        println!(
            "Channel: {} bits sent, {} flipped ({:.2}%)",
            self.channel.bits_sent,
            self.channel.bits_flipped,
            self.channel.flip_rate() * 100.0
        );
        println!(
            "{:<12} {:>10} {:>10} {:>12} {:>10} {:>8}",
            "strategy", "kbits", "bits/item", "residual BER", "accuracy", "empty"
        );
        for strategy in Strategy::ALL {
            let m = self.strategy(strategy);
            println!(
                "{:<12} {:>10.2} {:>10.1} {:>12.4} {:>9.1}% {:>7.1}%",
                strategy.to_string(),
                m.payload_kilobits(),
                m.bits_per_item(),
                m.residual_bit_error_rate(),
                m.symbol_accuracy() * 100.0,
                m.empty_rate() * 100.0
            );
        }
        if self.fixed_width_accounting == BitAccounting::Utf8Bytes {
            println!("(fixed-width size counted as 8 bits per UTF-8 byte)");
        }
        if self.semantic.dropped > 0 {
            println!("Semantic triples dropped: {}", self.semantic.dropped);
        }
    }

    /// Export as `key=value` lines (for parsing/testing).
    pub fn export_text(&self) -> String {
        let mut out = format!(
            "flip_probability={:.4}\nrepetition={}\nfixed_width_accounting={}\n\
             channel_bits_sent={}\nchannel_bits_flipped={}\n",
            self.flip_probability,
            self.repetition,
            match self.fixed_width_accounting {
                BitAccounting::Codeword => "codeword",
                BitAccounting::Utf8Bytes => "utf8-bytes",
            },
            self.channel.bits_sent,
            self.channel.bits_flipped
        );
        for strategy in Strategy::ALL {
            let m = self.strategy(strategy);
            let key = strategy.to_string().replace('-', "_");
            out.push_str(&format!(
                "{key}.payload_bits={}\n\
                 {key}.accounted_bits={}\n\
                 {key}.residual_ber={:.6}\n\
                 {key}.symbol_accuracy={:.6}\n\
                 {key}.recall={:.6}\n\
                 {key}.empty_rate={:.6}\n",
                m.payload_bits,
                m.accounted_bits,
                m.residual_bit_error_rate(),
                m.symbol_accuracy(),
                m.recall(),
                m.empty_rate(),
            ));
        }
        out
    }
}
