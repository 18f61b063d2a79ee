//! End-to-end reconstruction strategies.
//!
//! Each strategy runs the same chain over a noisy channel:
//!
//! ```text
//! encode -> repeat -> channel -> majority vote -> [correct] -> decode
//! ```
//!
//! - **Fixed-width**: 7-bit (or configured width) characters.
//! - **Huffman**: corpus-trained variable-length characters. There is no
//!   correction step; a flipped bit can push the trie walk off codeword
//!   boundaries and garble the rest of the stream. That drift is expected
//!   behavior of the strategy and is left visible.
//! - **Semantic**: one fixed-width codeword per triple, snapped to the
//!   nearest knowledge-graph codeword and mapped back to its triple.
//!   Triples that cannot be encoded or mapped back are dropped, never
//!   replaced by a placeholder.
//!
//! # Shared state
//!
//! [`SimulationContext`] holds the codecs and the corrector codebook. It is
//! built once and only ever borrowed immutably, so one instance can serve
//! any number of concurrent runs, each with its own channel.
//!
//! # Channel draws
//!
//! Every function draws from the channel in input order. For
//! [`SimulationContext::reconstruct_sample`] that is fixed-width, then
//! Huffman, then each semantic triple in order.

use crate::bits::BitVector;
use crate::channel::BinarySymmetricChannel;
use crate::codec::{FixedWidthCodec, HuffmanCodec, HuffmanConfig, TextCodec};
use crate::corrector::Codebook;
use crate::error::{CodecError, Error, Result};
use crate::redundancy::RepetitionCode;
use crate::semantic::{SemanticCodec, Triple};
use crate::verbalize::TripleVerbalizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// The three coding strategies under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    FixedWidth,
    Huffman,
    Semantic,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::FixedWidth, Strategy::Huffman, Strategy::Semantic];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::FixedWidth => "fixed-width",
            Strategy::Huffman => "huffman",
            Strategy::Semantic => "semantic",
        })
    }
}

/// One evaluation item: a sentence and the triples it expresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub text: String,
    pub triples: Vec<Triple>,
}

/// Outcome of sending text through a character strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextReconstruction {
    pub text: String,
    /// Bits produced by the codec, before repetition
    pub payload_bits: usize,
    /// Bits actually put on the channel
    pub channel_bits: usize,
    /// Payload bits still wrong after majority voting
    pub residual_bit_errors: usize,
}

/// Outcome of sending triples through the semantic strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleReconstruction {
    /// Recovered triples, in input order; possibly empty
    pub triples: Vec<Triple>,
    pub payload_bits: usize,
    pub channel_bits: usize,
    /// Codeword bits still wrong after majority voting, before correction
    pub residual_bit_errors: usize,
    /// Bits changed by nearest-codeword correction
    pub corrected_bits: usize,
    /// Input triples that produced no output triple
    pub dropped: usize,
}

impl TripleReconstruction {
    /// Hand the triples to `verbalizer`. An empty set yields an empty
    /// string without calling it.
    pub fn verbalize<V: TripleVerbalizer + ?Sized>(&self, verbalizer: &V) -> String {
        if self.triples.is_empty() {
            return String::new();
        }
        verbalizer.verbalize(&self.triples)
    }
}

/// All three strategies applied to one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleReconstruction {
    pub fixed_width: TextReconstruction,
    pub huffman: TextReconstruction,
    pub semantic: TripleReconstruction,
}

/// Repeat, transmit and majority-vote one bit vector.
pub fn send_with_redundancy(
    bits: &BitVector,
    repetition: RepetitionCode,
    channel: &mut BinarySymmetricChannel,
) -> BitVector {
    let received = channel.transmit(&repetition.encode(bits));
    repetition.decode(&received)
}

fn residual_errors(sent: &BitVector, received: &BitVector) -> usize {
    // Repetition decode of `len * factor` bits always returns `len` bits.
    sent.hamming_distance(received).unwrap_or(sent.len())
}

/// Run a character codec end to end.
pub fn reconstruct_text<C: TextCodec + ?Sized>(
    codec: &C,
    text: &str,
    repetition: RepetitionCode,
    channel: &mut BinarySymmetricChannel,
) -> Result<TextReconstruction> {
    let bits = codec.encode_text(text)?;
    let received = send_with_redundancy(&bits, repetition, channel);
    Ok(TextReconstruction {
        text: codec.decode_text(&received),
        payload_bits: bits.len(),
        channel_bits: bits.len() * repetition.factor(),
        residual_bit_errors: residual_errors(&bits, &received),
    })
}

/// Run the semantic strategy triple by triple.
///
/// `codebook` must be `codec.codebook()` (or a subset of it) for the
/// inverse mapping to succeed.
///
/// # Errors
/// Only fatal conditions: a codebook whose width disagrees with the
/// codec's codewords.
pub fn reconstruct_triples(
    codec: &SemanticCodec,
    codebook: &Codebook,
    triples: &[Triple],
    repetition: RepetitionCode,
    channel: &mut BinarySymmetricChannel,
) -> Result<TripleReconstruction> {
    let mut out = TripleReconstruction {
        triples: Vec::with_capacity(triples.len()),
        payload_bits: 0,
        channel_bits: 0,
        residual_bit_errors: 0,
        corrected_bits: 0,
        dropped: 0,
    };

    for triple in triples {
        let bits = match codec.encode_triple(triple) {
            Ok(bits) => bits,
            Err(Error::Codec(CodecError::UnknownElement { role, name })) => {
                debug!(%triple, role, name = %name, "triple outside knowledge graph, dropped");
                out.dropped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let received = send_with_redundancy(&bits, repetition, channel);
        out.payload_bits += bits.len();
        out.channel_bits += bits.len() * repetition.factor();
        out.residual_bit_errors += residual_errors(&bits, &received);

        if received.is_empty() {
            out.dropped += 1;
            continue;
        }

        let correction = codebook.nearest(&received)?;
        out.corrected_bits += correction.distance;

        match codec.lookup(correction.codeword) {
            Some(recovered) => {
                trace!(sent = %triple, got = %recovered, distance = correction.distance, "triple");
                out.triples.push(recovered.clone());
            }
            None => out.dropped += 1,
        }
    }

    Ok(out)
}

/// Codecs and corrector codebook shared by every run.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    fixed_width: FixedWidthCodec,
    huffman: HuffmanCodec,
    semantic: SemanticCodec,
    codebook: Codebook,
}

impl SimulationContext {
    pub fn new(
        fixed_width: FixedWidthCodec,
        huffman: HuffmanCodec,
        semantic: SemanticCodec,
    ) -> Result<Self> {
        let codebook = semantic.codebook()?;
        debug!(
            codewords = codebook.len(),
            width = codebook.width(),
            huffman_symbols = huffman.code().table().len(),
            "simulation context ready"
        );
        Ok(Self {
            fixed_width,
            huffman,
            semantic,
            codebook,
        })
    }

    /// Train the Huffman code on every sample's text and build the
    /// knowledge graph from every sample's triples.
    pub fn from_samples(
        samples: &[Sample],
        fixed_width: usize,
        huffman: HuffmanConfig,
    ) -> Result<Self> {
        let corpus: String = samples.iter().map(|s| s.text.as_str()).collect();
        let graph = samples.iter().flat_map(|s| s.triples.iter());
        Self::new(
            FixedWidthCodec::new(fixed_width)?,
            HuffmanCodec::from_corpus(&corpus, huffman)?,
            SemanticCodec::new(graph)?,
        )
    }

    pub fn fixed_width(&self) -> &FixedWidthCodec {
        &self.fixed_width
    }

    pub fn huffman(&self) -> &HuffmanCodec {
        &self.huffman
    }

    pub fn semantic(&self) -> &SemanticCodec {
        &self.semantic
    }

    pub fn codebook(&self) -> &Codebook {
        &self.codebook
    }

    pub fn reconstruct_fixed_width(
        &self,
        text: &str,
        repetition: RepetitionCode,
        channel: &mut BinarySymmetricChannel,
    ) -> Result<TextReconstruction> {
        reconstruct_text(&self.fixed_width, text, repetition, channel)
    }

    pub fn reconstruct_huffman(
        &self,
        text: &str,
        repetition: RepetitionCode,
        channel: &mut BinarySymmetricChannel,
    ) -> Result<TextReconstruction> {
        reconstruct_text(&self.huffman, text, repetition, channel)
    }

    pub fn reconstruct_semantic(
        &self,
        triples: &[Triple],
        repetition: RepetitionCode,
        channel: &mut BinarySymmetricChannel,
    ) -> Result<TripleReconstruction> {
        reconstruct_triples(&self.semantic, &self.codebook, triples, repetition, channel)
    }

    /// Run all three strategies on `sample`.
    pub fn reconstruct_sample(
        &self,
        sample: &Sample,
        repetition: RepetitionCode,
        channel: &mut BinarySymmetricChannel,
    ) -> Result<SampleReconstruction> {
        Ok(SampleReconstruction {
            fixed_width: self.reconstruct_fixed_width(&sample.text, repetition, channel)?,
            huffman: self.reconstruct_huffman(&sample.text, repetition, channel)?,
            semantic: self.reconstruct_semantic(&sample.triples, repetition, channel)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelConfig;
    use crate::verbalize::LinearizingVerbalizer;

    fn samples() -> Vec<Sample> {
        vec![
            Sample {
                text: "Alan Bean was a test pilot.".into(),
                triples: vec![Triple::new("Alan_Bean", "occupation", "Test_pilot")],
            },
            Sample {
                text: "Apollo 12 was operated by NASA and crewed by Alan Bean.".into(),
                triples: vec![
                    Triple::new("Apollo_12", "operator", "NASA"),
                    Triple::new("Apollo_12", "crewMember", "Alan_Bean"),
                ],
            },
        ]
    }

    fn context() -> SimulationContext {
        SimulationContext::from_samples(&samples(), 7, HuffmanConfig::default()).unwrap()
    }

    fn channel(p: f64, seed: u64) -> BinarySymmetricChannel {
        BinarySymmetricChannel::new(ChannelConfig::new(p, seed).unwrap()).unwrap()
    }

    #[test]
    fn test_noiseless_round_trip_all_strategies() {
        let ctx = context();
        let mut ch = channel(0.0, 1);
        let rep = RepetitionCode::new(3).unwrap();
        for sample in samples() {
            let out = ctx.reconstruct_sample(&sample, rep, &mut ch).unwrap();
            assert_eq!(out.fixed_width.text, sample.text);
            assert_eq!(out.huffman.text, sample.text);
            assert_eq!(out.semantic.triples, sample.triples);
            assert_eq!(out.semantic.dropped, 0);
            assert_eq!(out.semantic.corrected_bits, 0);
        }
    }

    #[test]
    fn test_bit_accounting() {
        let ctx = context();
        let mut ch = channel(0.0, 1);
        let rep = RepetitionCode::new(3).unwrap();
        let sample = &samples()[1];
        let out = ctx.reconstruct_sample(sample, rep, &mut ch).unwrap();

        let chars = sample.text.chars().count();
        assert_eq!(out.fixed_width.payload_bits, chars * 7);
        assert_eq!(out.fixed_width.channel_bits, chars * 21);
        assert_eq!(
            out.semantic.payload_bits,
            2 * ctx.semantic().codeword_width()
        );
        assert!(out.huffman.payload_bits < out.fixed_width.payload_bits);
        assert!(out.semantic.payload_bits < out.huffman.payload_bits);
        assert_eq!(
            ch.stats().bits_sent as usize,
            out.fixed_width.channel_bits + out.huffman.channel_bits + out.semantic.channel_bits
        );
    }

    #[test]
    fn test_unknown_triple_dropped() {
        let ctx = context();
        let mut ch = channel(0.0, 1);
        let triples = vec![
            Triple::new("Alan_Bean", "spouse", "Sue_Bean"),
            Triple::new("Apollo_12", "operator", "NASA"),
        ];
        let out = ctx
            .reconstruct_semantic(&triples, RepetitionCode::identity(), &mut ch)
            .unwrap();
        assert_eq!(out.triples, vec![Triple::new("Apollo_12", "operator", "NASA")]);
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn test_empty_reconstruction_skips_verbalizer() {
        let ctx = context();
        let mut ch = channel(0.0, 1);
        let out = ctx
            .reconstruct_semantic(&[], RepetitionCode::default(), &mut ch)
            .unwrap();
        assert!(out.triples.is_empty());

        let calls = std::cell::Cell::new(0);
        let spy = |t: &[Triple]| {
            calls.set(calls.get() + 1);
            format!("{}", t.len())
        };
        assert_eq!(out.verbalize(&spy), "");
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_verbalize_reconstruction() {
        let ctx = context();
        let mut ch = channel(0.0, 3);
        let out = ctx
            .reconstruct_semantic(&samples()[1].triples, RepetitionCode::identity(), &mut ch)
            .unwrap();
        assert_eq!(
            out.verbalize(&LinearizingVerbalizer),
            "kg2text: Apollo 12 operator NASA, crewMember Alan Bean"
        );
    }

    #[test]
    fn test_semantic_output_always_in_graph() {
        let ctx = context();
        let mut ch = channel(0.3, 77);
        let rep = RepetitionCode::identity();
        for _ in 0..50 {
            let out = ctx
                .reconstruct_semantic(&samples()[1].triples, rep, &mut ch)
                .unwrap();
            assert_eq!(out.triples.len() + out.dropped, 2);
            for t in &out.triples {
                assert!(ctx.semantic().triples().contains(t));
            }
        }
    }

    #[test]
    fn test_strategy_display() {
        let names: Vec<String> = Strategy::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["fixed-width", "huffman", "semantic"]);
    }
}
