//! Huffman code construction and online decoding.
//!
//! # Construction
//!
//! 1. Every symbol with non-zero frequency becomes a leaf, numbered in the
//!    frequency table's insertion order.
//! 2. A min-heap keyed by `(frequency, node number)` repeatedly pops the
//!    two lightest nodes and merges them under a new internal node (first
//!    pop on the `0` branch, second on the `1` branch). New nodes take the
//!    next number, so ties always resolve the same way for the same input.
//! 3. An iterative walk from the root assigns codewords.
//!
//! Nodes live in a flat arena addressed by index, so neither building nor
//! walking the tree recurses.
//!
//! A one-symbol alphabet is degenerate: the lone symbol gets the 1-bit
//! codeword `0` so that the stream stays decodable.
//!
//! # Decoding
//!
//! [`DecodeTrie`] is the receiver-side structure: one node per code
//! prefix, leaves holding the symbol. [`StreamDecoder`] walks it one bit at
//! a time and restarts at the root after every emitted symbol.

use crate::bits::BitVector;
use crate::error::{HuffmanError, Result};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;
use tracing::debug;

/// Symbol frequencies in first-insertion order.
///
/// The insertion order is the Huffman tie-break, so two tables with the
/// same counts inserted in the same order produce identical codes.
#[derive(Debug, Clone)]
pub struct FrequencyTable<S> {
    entries: Vec<(S, u64)>,
    index: HashMap<S, usize>,
}

impl<S: Clone + Eq + Hash> FrequencyTable<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add `count` occurrences of `symbol`. Counts saturate at `u64::MAX`.
    pub fn add(&mut self, symbol: S, count: u64) {
        match self.index.get(&symbol) {
            Some(&i) => self.entries[i].1 = self.entries[i].1.saturating_add(count),
            None => {
                self.index.insert(symbol.clone(), self.entries.len());
                self.entries.push((symbol, count));
            }
        }
    }

    /// Count each symbol of `symbols` once per occurrence.
    pub fn from_symbols<I: IntoIterator<Item = S>>(symbols: I) -> Self {
        let mut table = Self::new();
        for symbol in symbols {
            table.add(symbol, 1);
        }
        table
    }

    pub fn get(&self, symbol: &S) -> u64 {
        self.index.get(symbol).map_or(0, |&i| self.entries[i].1)
    }

    /// Iterate `(symbol, count)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&S, u64)> + '_ {
        self.entries.iter().map(|(s, c)| (s, *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u128 {
        self.entries.iter().map(|(_, c)| u128::from(*c)).sum()
    }
}

impl FrequencyTable<char> {
    /// Character frequencies of a text corpus.
    pub fn from_text(text: &str) -> Self {
        Self::from_symbols(text.chars())
    }
}

impl<S: Clone + Eq + Hash> Default for FrequencyTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Eq + Hash> FromIterator<(S, u64)> for FrequencyTable<S> {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (symbol, count) in iter {
            table.add(symbol, count);
        }
        table
    }
}

/// Merge-tree node. Children are arena indices.
#[derive(Debug)]
enum MergeNode<S> {
    Leaf(S),
    Internal { zero: usize, one: usize },
}

/// Symbol to codeword mapping, prefix-free.
///
/// Immutable once built; share it by reference across runs.
#[derive(Debug, Clone)]
pub struct CodeTable<S> {
    entries: Vec<(S, BitVector)>,
    index: HashMap<S, usize>,
}

impl<S: Clone + Eq + Hash> CodeTable<S> {
    /// Build an optimal prefix-free code for `frequencies`.
    ///
    /// Symbols with zero frequency get no codeword.
    ///
    /// # Errors
    /// `HuffmanError::EmptyFrequencyTable` if no symbol has a non-zero count.
    pub fn build(frequencies: &FrequencyTable<S>) -> Result<Self> {
        let mut arena: Vec<MergeNode<S>> = Vec::new();
        let mut heap = BinaryHeap::new();

        for (symbol, count) in frequencies.iter().filter(|(_, c)| *c > 0) {
            // Merged weights are sums of u64 counts and cannot overflow u128.
            heap.push(Reverse((u128::from(count), arena.len())));
            arena.push(MergeNode::Leaf(symbol.clone()));
        }

        if arena.is_empty() {
            return Err(HuffmanError::EmptyFrequencyTable.into());
        }

        while heap.len() > 1 {
            let (Some(Reverse((w0, zero))), Some(Reverse((w1, one)))) = (heap.pop(), heap.pop())
            else {
                break;
            };
            heap.push(Reverse((w0 + w1, arena.len())));
            arena.push(MergeNode::Internal { zero, one });
        }

        let root = match heap.pop() {
            Some(Reverse((_, root))) => root,
            None => return Err(HuffmanError::EmptyFrequencyTable.into()),
        };

        let mut codes: Vec<(usize, BitVector)> = Vec::with_capacity(arena.len() / 2 + 1);
        let mut stack = vec![(root, BitVector::new())];
        while let Some((node, prefix)) = stack.pop() {
            match &arena[node] {
                MergeNode::Leaf(_) => {
                    let code = if prefix.is_empty() {
                        BitVector::zeros(1)
                    } else {
                        prefix
                    };
                    codes.push((node, code));
                }
                MergeNode::Internal { zero, one } => {
                    let mut one_prefix = prefix.clone();
                    one_prefix.push(true);
                    let mut zero_prefix = prefix;
                    zero_prefix.push(false);
                    stack.push((*one, one_prefix));
                    stack.push((*zero, zero_prefix));
                }
            }
        }

        // Leaves occupy the first arena slots in insertion order.
        codes.sort_by_key(|(node, _)| *node);

        let mut entries = Vec::with_capacity(codes.len());
        let mut index = HashMap::with_capacity(codes.len());
        for (node, code) in codes {
            if let MergeNode::Leaf(symbol) = &arena[node] {
                index.insert(symbol.clone(), entries.len());
                entries.push((symbol.clone(), code));
            }
        }

        debug!(
            symbols = entries.len(),
            max_len = entries.iter().map(|(_, c)| c.len()).max().unwrap_or(0),
            "built huffman code table"
        );

        Ok(Self { entries, index })
    }

    /// Codeword for `symbol`, if it was in the frequency table.
    pub fn get(&self, symbol: &S) -> Option<&BitVector> {
        self.index.get(symbol).map(|&i| &self.entries[i].1)
    }

    /// Iterate `(symbol, codeword)` in frequency-table order.
    pub fn iter(&self) -> impl Iterator<Item = (&S, &BitVector)> + '_ {
        self.entries.iter().map(|(s, c)| (s, c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Codeword length per symbol.
    pub fn code_lengths(&self) -> HashMap<S, usize> {
        self.entries
            .iter()
            .map(|(s, c)| (s.clone(), c.len()))
            .collect()
    }

    /// Frequency-weighted mean codeword length over the symbols that have
    /// a codeword. Returns 0.0 for an all-zero table.
    pub fn expected_length(&self, frequencies: &FrequencyTable<S>) -> f64 {
        let mut weighted = 0u128;
        let mut total = 0u128;
        for (symbol, count) in frequencies.iter() {
            if let Some(code) = self.get(symbol) {
                weighted += u128::from(count) * code.len() as u128;
                total += u128::from(count);
            }
        }
        if total == 0 {
            0.0
        } else {
            weighted as f64 / total as f64
        }
    }

    /// True if no codeword is a prefix of another symbol's codeword.
    pub fn is_prefix_free(&self) -> bool {
        self.entries.iter().enumerate().all(|(i, (_, a))| {
            self.entries
                .iter()
                .enumerate()
                .all(|(j, (_, b))| i == j || !a.is_prefix_of(b))
        })
    }
}

#[derive(Debug, Clone)]
struct TrieNode<S> {
    children: [Option<usize>; 2],
    symbol: Option<S>,
}

impl<S> TrieNode<S> {
    fn empty() -> Self {
        Self {
            children: [None, None],
            symbol: None,
        }
    }
}

/// Prefix trie over the codewords of a [`CodeTable`].
#[derive(Debug, Clone)]
pub struct DecodeTrie<S> {
    nodes: Vec<TrieNode<S>>,
}

impl<S: Clone + Eq + Hash> DecodeTrie<S> {
    /// Build the trie holding every codeword of `table`.
    pub fn from_table(table: &CodeTable<S>) -> Self {
        let mut nodes = vec![TrieNode::empty()];
        for (symbol, code) in table.iter() {
            let mut cur = 0;
            for bit in code.iter() {
                let slot = bit as usize;
                cur = match nodes[cur].children[slot] {
                    Some(next) => next,
                    None => {
                        nodes.push(TrieNode::empty());
                        let next = nodes.len() - 1;
                        nodes[cur].children[slot] = Some(next);
                        next
                    }
                };
            }
            nodes[cur].symbol = Some(symbol.clone());
        }
        Self { nodes }
    }

    /// Start an online decode.
    pub fn stream(&self) -> StreamDecoder<'_, S> {
        StreamDecoder {
            trie: self,
            cursor: 0,
            pending: 0,
        }
    }

    /// Decode a whole bit sequence.
    ///
    /// Bits left over after the last complete codeword are dropped.
    pub fn decode(&self, bits: &BitVector) -> Vec<S> {
        let mut stream = self.stream();
        bits.iter()
            .filter_map(|bit| stream.feed(bit).cloned())
            .collect()
    }
}

/// Bit-at-a-time walker over a [`DecodeTrie`].
#[derive(Debug, Clone)]
pub struct StreamDecoder<'a, S> {
    trie: &'a DecodeTrie<S>,
    cursor: usize,
    pending: usize,
}

impl<'a, S> StreamDecoder<'a, S> {
    /// Consume one bit; returns the symbol when a leaf is reached.
    ///
    /// A bit with no matching branch (only possible for a one-symbol code)
    /// abandons the partial codeword and restarts at the root.
    pub fn feed(&mut self, bit: bool) -> Option<&'a S> {
        let trie = self.trie;
        match trie.nodes[self.cursor].children[bit as usize] {
            Some(next) => {
                if let Some(symbol) = &trie.nodes[next].symbol {
                    self.cursor = 0;
                    self.pending = 0;
                    Some(symbol)
                } else {
                    self.cursor = next;
                    self.pending += 1;
                    None
                }
            }
            None => {
                self.cursor = 0;
                self.pending = 0;
                None
            }
        }
    }

    /// Bits consumed since the last emitted symbol.
    pub fn pending_bits(&self) -> usize {
        self.pending
    }
}

/// A code table paired with its decode trie.
#[derive(Debug, Clone)]
pub struct HuffmanCode<S> {
    table: CodeTable<S>,
    trie: DecodeTrie<S>,
}

impl<S: Clone + Eq + Hash> HuffmanCode<S> {
    pub fn build(frequencies: &FrequencyTable<S>) -> Result<Self> {
        let table = CodeTable::build(frequencies)?;
        let trie = DecodeTrie::from_table(&table);
        Ok(Self { table, trie })
    }

    pub fn table(&self) -> &CodeTable<S> {
        &self.table
    }

    pub fn trie(&self) -> &DecodeTrie<S> {
        &self.trie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed() -> FrequencyTable<char> {
        [('a', 5), ('b', 2), ('c', 1), ('d', 1)].into_iter().collect()
    }

    fn code(table: &CodeTable<char>, c: char) -> String {
        table.get(&c).unwrap().to_string()
    }

    #[test]
    fn test_skewed_lengths() {
        let table = CodeTable::build(&skewed()).unwrap();
        let len = |c| table.get(&c).unwrap().len();

        assert!(len('a') <= len('b'));
        assert!(len('b') <= len('c'));
        assert!(len('b') <= len('d'));
        assert!(table.expected_length(&skewed()) <= 2.0);
        assert!(table.is_prefix_free());
    }

    #[test]
    fn test_tie_break_is_insertion_order() {
        // c and d merge first (both weight 1, c inserted first), then b with
        // that subtree, then the result with a.
        let table = CodeTable::build(&skewed()).unwrap();
        assert_eq!(code(&table, 'a'), "1");
        assert_eq!(code(&table, 'b'), "00");
        assert_eq!(code(&table, 'c'), "010");
        assert_eq!(code(&table, 'd'), "011");
    }

    #[test]
    fn test_deterministic_rebuild() {
        let freqs: FrequencyTable<char> = "abracadabra alakazam".chars().map(|c| (c, 1)).collect();
        let first = CodeTable::build(&freqs).unwrap();
        for _ in 0..10 {
            let again = CodeTable::build(&freqs).unwrap();
            for (symbol, code) in first.iter() {
                assert_eq!(again.get(symbol), Some(code));
            }
        }
    }

    #[test]
    fn test_single_symbol_gets_one_bit() {
        let freqs: FrequencyTable<char> = [('x', 9)].into_iter().collect();
        let code = HuffmanCode::build(&freqs).unwrap();
        assert_eq!(code.table().get(&'x').unwrap().to_string(), "0");

        let bits: BitVector = "000".parse().unwrap();
        assert_eq!(code.trie().decode(&bits), vec!['x', 'x', 'x']);
    }

    #[test]
    fn test_single_symbol_dead_branch_restarts() {
        let freqs: FrequencyTable<char> = [('x', 1)].into_iter().collect();
        let code = HuffmanCode::build(&freqs).unwrap();
        let bits: BitVector = "0100".parse().unwrap();
        assert_eq!(code.trie().decode(&bits), vec!['x', 'x', 'x']);
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let empty = FrequencyTable::<char>::new();
        assert!(CodeTable::build(&empty).is_err());

        let zeros: FrequencyTable<char> = [('a', 0), ('b', 0)].into_iter().collect();
        assert!(matches!(
            CodeTable::build(&zeros),
            Err(crate::Error::Huffman(HuffmanError::EmptyFrequencyTable))
        ));
    }

    #[test]
    fn test_zero_frequency_symbols_skipped() {
        let freqs: FrequencyTable<char> = [('a', 3), ('z', 0), ('b', 1)].into_iter().collect();
        let table = CodeTable::build(&freqs).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.get(&'z').is_none());
    }

    #[test]
    fn test_stream_decode_drops_partial_tail() {
        let code = HuffmanCode::build(&skewed()).unwrap();
        // a, b, c, then a dangling "01"
        let bits: BitVector = "10001001".parse().unwrap();
        let mut stream = code.trie().stream();
        let mut out = Vec::new();
        for bit in bits.iter() {
            if let Some(&c) = stream.feed(bit) {
                out.push(c);
            }
        }
        assert_eq!(out, vec!['a', 'b', 'c']);
        assert_eq!(stream.pending_bits(), 2);
        assert_eq!(code.trie().decode(&bits), out);
    }

    #[test]
    fn test_frequency_table_accumulates() {
        let table = FrequencyTable::from_text("hello");
        assert_eq!(table.get(&'l'), 2);
        assert_eq!(table.get(&'q'), 0);
        assert_eq!(table.total(), 5);
        let order: Vec<char> = table.iter().map(|(c, _)| *c).collect();
        assert_eq!(order, vec!['h', 'e', 'l', 'o']);
    }

    #[test]
    fn test_extreme_counts_build() {
        let freqs: FrequencyTable<char> = [('a', u64::MAX), ('b', 1)].into_iter().collect();
        let table = CodeTable::build(&freqs).unwrap();
        assert_eq!(code(&table, 'b'), "0");
        assert_eq!(code(&table, 'a'), "1");
        assert_eq!(table.expected_length(&freqs), 1.0);
        assert_eq!(freqs.total(), u128::from(u64::MAX) + 1);

        let three: FrequencyTable<char> = [('a', u64::MAX), ('b', u64::MAX), ('c', u64::MAX)]
            .into_iter()
            .collect();
        let table = CodeTable::build(&three).unwrap();
        assert!(table.is_prefix_free());
        assert_eq!(code(&table, 'c'), "0");
    }

    #[test]
    fn test_add_saturates() {
        let mut table = FrequencyTable::new();
        table.add('x', u64::MAX);
        table.add('x', 7);
        assert_eq!(table.get(&'x'), u64::MAX);
    }
}
