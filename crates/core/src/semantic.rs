//! Semantic-symbol code for knowledge-graph triples.
//!
//! A triple is sent as three fixed-width unsigned ids packed back to back:
//!
//! ```text
//! +-----------+---------------+-----------+
//! | head id   | relation id   | tail id   |
//! | hw bits   | rw bits       | tw bits   |
//! +-----------+---------------+-----------+
//! ```
//!
//! Each width is `ceil(log2(n))` (at least 1) for the `n` distinct heads,
//! relations and tails seen when the codec was built. The codec owns the
//! knowledge graph: the vocabularies, the list of known triples and the
//! inverse map from codeword to triple that the receiver uses after
//! nearest-codeword correction.

use crate::bits::BitVector;
use crate::codec::SymbolCodec;
use crate::corrector::Codebook;
use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// A (head, relation, tail) fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub head: String,
    pub relation: String,
    pub tail: String,
}

impl Triple {
    pub fn new(
        head: impl Into<String>,
        relation: impl Into<String>,
        tail: impl Into<String>,
    ) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} | {} | {})", self.head, self.relation, self.tail)
    }
}

/// Numeric form of a triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdTriple {
    pub head: u32,
    pub relation: u32,
    pub tail: u32,
}

/// Bits per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWidths {
    pub head: usize,
    pub relation: usize,
    pub tail: usize,
}

impl FieldWidths {
    pub fn total(&self) -> usize {
        self.head + self.relation + self.tail
    }
}

/// Minimum bits to give each of `count` items a distinct id (at least 1).
pub fn id_width(count: usize) -> usize {
    if count <= 2 {
        1
    } else {
        (usize::BITS - (count - 1).leading_zeros()) as usize
    }
}

/// Dense name to id assignment in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    names: Vec<String>,
    ids: HashMap<String, u32>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, assigning the next one if unseen.
    pub fn intern(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len() as u32;
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Field width needed for this vocabulary.
    pub fn width(&self) -> usize {
        id_width(self.len())
    }
}

/// Fixed-width triple codec over a knowledge graph.
///
/// Built once from every triple of the graph, then shared read-only.
#[derive(Debug, Clone)]
pub struct SemanticCodec {
    heads: Vocabulary,
    relations: Vocabulary,
    tails: Vocabulary,
    widths: FieldWidths,
    triples: Vec<Triple>,
    by_codeword: HashMap<BitVector, usize>,
}

impl SemanticCodec {
    /// Build vocabularies, widths and codewords for `graph`.
    ///
    /// Duplicate triples are kept once, in first-seen order.
    ///
    /// # Errors
    /// `CodecError::EmptyKnowledgeGraph` if `graph` yields no triples.
    pub fn new<'a, I>(graph: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Triple>,
    {
        let mut heads = Vocabulary::new();
        let mut relations = Vocabulary::new();
        let mut tails = Vocabulary::new();
        let mut triples = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for triple in graph {
            if !seen.insert(triple.clone()) {
                continue;
            }
            heads.intern(&triple.head);
            relations.intern(&triple.relation);
            tails.intern(&triple.tail);
            triples.push(triple.clone());
        }

        if triples.is_empty() {
            return Err(CodecError::EmptyKnowledgeGraph.into());
        }

        let widths = FieldWidths {
            head: heads.width(),
            relation: relations.width(),
            tail: tails.width(),
        };

        let mut codec = Self {
            heads,
            relations,
            tails,
            widths,
            triples: Vec::new(),
            by_codeword: HashMap::new(),
        };

        for (index, triple) in triples.iter().enumerate() {
            let codeword = codec.encode_triple(triple)?;
            codec.by_codeword.insert(codeword, index);
        }
        codec.triples = triples;

        debug!(
            triples = codec.triples.len(),
            heads = codec.heads.len(),
            relations = codec.relations.len(),
            tails = codec.tails.len(),
            width = codec.widths.total(),
            "built semantic codec"
        );

        Ok(codec)
    }

    pub fn widths(&self) -> FieldWidths {
        self.widths
    }

    /// Bits per triple codeword.
    pub fn codeword_width(&self) -> usize {
        self.widths.total()
    }

    /// Known triples in first-seen order.
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn heads(&self) -> &Vocabulary {
        &self.heads
    }

    pub fn relations(&self) -> &Vocabulary {
        &self.relations
    }

    pub fn tails(&self) -> &Vocabulary {
        &self.tails
    }

    /// Ids of a triple whose elements are all in the vocabularies.
    pub fn ids(&self, triple: &Triple) -> Result<IdTriple> {
        let lookup = |vocab: &Vocabulary, role: &'static str, name: &str| {
            vocab.id(name).ok_or_else(|| CodecError::UnknownElement {
                role,
                name: name.to_owned(),
            })
        };
        Ok(IdTriple {
            head: lookup(&self.heads, "head", &triple.head)?,
            relation: lookup(&self.relations, "relation", &triple.relation)?,
            tail: lookup(&self.tails, "tail", &triple.tail)?,
        })
    }

    /// Pack ids into a codeword.
    ///
    /// # Errors
    /// `CodecError::ValueTooWide` if an id does not fit its field.
    pub fn encode_ids(&self, ids: IdTriple) -> Result<BitVector> {
        let mut bits = BitVector::with_capacity(self.codeword_width());
        bits.push_uint(ids.head as u64, self.widths.head)?;
        bits.push_uint(ids.relation as u64, self.widths.relation)?;
        bits.push_uint(ids.tail as u64, self.widths.tail)?;
        Ok(bits)
    }

    pub fn encode_triple(&self, triple: &Triple) -> Result<BitVector> {
        self.encode_ids(self.ids(triple)?)
    }

    /// Unpack the three id fields. `None` if `bits` is not exactly one
    /// codeword wide.
    pub fn decode_ids(&self, bits: &BitVector) -> Option<IdTriple> {
        if bits.len() != self.codeword_width() {
            return None;
        }
        let FieldWidths {
            head,
            relation,
            tail,
        } = self.widths;
        Some(IdTriple {
            head: bits.read_uint(0, head)? as u32,
            relation: bits.read_uint(head, relation)? as u32,
            tail: bits.read_uint(head + relation, tail)? as u32,
        })
    }

    /// Names for `ids`, if every id is assigned. The result need not be a
    /// triple of the graph.
    pub fn resolve_ids(&self, ids: IdTriple) -> Option<Triple> {
        Some(Triple::new(
            self.heads.name(ids.head)?,
            self.relations.name(ids.relation)?,
            self.tails.name(ids.tail)?,
        ))
    }

    /// The graph triple whose codeword is exactly `bits`.
    pub fn lookup(&self, bits: &BitVector) -> Option<&Triple> {
        self.by_codeword.get(bits).map(|&i| &self.triples[i])
    }

    /// Every known triple's codeword, in graph order.
    pub fn codebook(&self) -> Result<Codebook> {
        let entries = self
            .triples
            .iter()
            .map(|t| self.encode_triple(t))
            .collect::<Result<Vec<_>>>()?;
        Codebook::new(entries)
    }
}

impl SymbolCodec for SemanticCodec {
    type Symbol = Triple;

    fn encode(&self, symbols: &[Triple]) -> Result<BitVector> {
        let mut bits = BitVector::with_capacity(self.bit_cost(symbols));
        for triple in symbols {
            bits.extend_from(&self.encode_triple(triple)?);
        }
        Ok(bits)
    }

    /// Splits into codeword-wide blocks and keeps the ones that name a
    /// graph triple. A short tail and unknown codewords are dropped.
    fn decode(&self, bits: &BitVector) -> Vec<Triple> {
        bits.blocks(self.codeword_width())
            .filter_map(|block| self.lookup(&BitVector::from(block)).cloned())
            .collect()
    }

    fn bit_cost(&self, symbols: &[Triple]) -> usize {
        symbols.len() * self.codeword_width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Vec<Triple> {
        vec![
            Triple::new("Alan_Bean", "occupation", "Test_pilot"),
            Triple::new("Alan_Bean", "birthPlace", "Wheeler,_Texas"),
            Triple::new("Apollo_12", "operator", "NASA"),
            Triple::new("Elliot_See", "birthPlace", "Dallas"),
            Triple::new("Alan_Bean", "occupation", "Test_pilot"),
        ]
    }

    #[test]
    fn test_id_width() {
        assert_eq!(id_width(0), 1);
        assert_eq!(id_width(1), 1);
        assert_eq!(id_width(2), 1);
        assert_eq!(id_width(3), 2);
        assert_eq!(id_width(4), 2);
        assert_eq!(id_width(5), 3);
        assert_eq!(id_width(256), 8);
        assert_eq!(id_width(257), 9);
    }

    #[test]
    fn test_widths_follow_vocabularies() {
        let codec = SemanticCodec::new(&graph()).unwrap();
        assert_eq!(codec.triples().len(), 4);
        // 3 heads, 3 relations, 4 tails
        assert_eq!(
            codec.widths(),
            FieldWidths {
                head: 2,
                relation: 2,
                tail: 2
            }
        );
        assert_eq!(codec.codeword_width(), 6);
    }

    #[test]
    fn test_encode_layout() {
        let codec = SemanticCodec::new(&graph()).unwrap();
        let bits = codec
            .encode_triple(&Triple::new("Apollo_12", "operator", "NASA"))
            .unwrap();
        // head 1, relation 2, tail 2
        assert_eq!(bits.to_string(), "011010");
        assert_eq!(
            codec.decode_ids(&bits),
            Some(IdTriple {
                head: 1,
                relation: 2,
                tail: 2
            })
        );
    }

    #[test]
    fn test_lookup_inverts_encode() {
        let codec = SemanticCodec::new(&graph()).unwrap();
        for triple in codec.triples() {
            let bits = codec.encode_triple(triple).unwrap();
            assert_eq!(codec.lookup(&bits), Some(triple));
        }
    }

    #[test]
    fn test_resolve_ids_beyond_graph() {
        let codec = SemanticCodec::new(&graph()).unwrap();
        let mixed = IdTriple {
            head: 2,
            relation: 0,
            tail: 0,
        };
        let triple = codec.resolve_ids(mixed).unwrap();
        assert_eq!(triple, Triple::new("Elliot_See", "occupation", "Test_pilot"));
        assert!(codec.lookup(&codec.encode_ids(mixed).unwrap()).is_none());

        let unassigned = IdTriple {
            head: 3,
            relation: 0,
            tail: 0,
        };
        assert!(codec.resolve_ids(unassigned).is_none());
    }

    #[test]
    fn test_unknown_element_is_an_error() {
        let codec = SemanticCodec::new(&graph()).unwrap();
        let err = codec
            .encode_triple(&Triple::new("Alan_Bean", "spouse", "Sue"))
            .unwrap_err();
        assert!(err.to_string().contains("relation"));
    }

    #[test]
    fn test_ids_must_fit_width() {
        let codec = SemanticCodec::new(&graph()).unwrap();
        let too_wide = IdTriple {
            head: 4,
            relation: 0,
            tail: 0,
        };
        assert!(codec.encode_ids(too_wide).is_err());
    }

    #[test]
    fn test_stream_decode_drops_tail() {
        let codec = SemanticCodec::new(&graph()).unwrap();
        let sent = &codec.triples()[..2];
        let mut bits = codec.encode(sent).unwrap();
        bits.push(true);
        bits.push(false);
        assert_eq!(codec.decode(&bits), sent.to_vec());
    }

    #[test]
    fn test_codebook_matches_graph() {
        let codec = SemanticCodec::new(&graph()).unwrap();
        let codebook = codec.codebook().unwrap();
        assert_eq!(codebook.len(), 4);
        assert_eq!(codebook.width(), 6);
    }

    #[test]
    fn test_empty_graph_is_an_error() {
        assert!(SemanticCodec::new(&Vec::<Triple>::new()).is_err());
    }
}
