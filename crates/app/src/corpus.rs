//! Sample corpora: loading from JSON and seeded generation.
//!
//! A corpus file is a JSON array of samples:
//!
//! ```json
//! [
//!   {"text": "Alan Bean was a test pilot.",
//!    "triples": [["Alan_Bean", "occupation", "Test_pilot"]]},
//!   {"text": "...",
//!    "triples": [{"subject": "Apollo_12", "property": "operator", "object": "NASA"}]}
//! ]
//! ```
//!
//! When no file is given we generate sentences from a small fixed set of
//! entities and relations, so every run with the same seed sees the same
//! data.

use anyhow::{ensure, Context, Result};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use semcom_sim_core::{Sample, Triple};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct RawSample {
    text: String,
    #[serde(alias = "modified_triple_sets")]
    triples: Vec<RawTriple>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTriple {
    List(Vec<String>),
    Object {
        subject: String,
        property: String,
        object: String,
    },
}

impl RawTriple {
    fn into_triple(self) -> Option<Triple> {
        match self {
            RawTriple::List(parts) => {
                let mut parts = parts.into_iter();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(h), Some(r), Some(t)) => Some(Triple::new(h, r, t)),
                    _ => None,
                }
            }
            RawTriple::Object {
                subject,
                property,
                object,
            } => Some(Triple::new(subject, property, object)),
        }
    }
}

/// Parse a JSON corpus. Triples with fewer than three parts are skipped.
pub fn parse_corpus(json: &str) -> Result<Vec<Sample>> {
    let raw: Vec<RawSample> = serde_json::from_str(json).context("parsing corpus JSON")?;
    let mut skipped = 0usize;
    let samples: Vec<Sample> = raw
        .into_iter()
        .map(|s| {
            let total = s.triples.len();
            let triples: Vec<Triple> = s.triples.into_iter().filter_map(RawTriple::into_triple).collect();
            skipped += total - triples.len();
            Sample {
                text: s.text,
                triples,
            }
        })
        .collect();
    if skipped > 0 {
        debug!(skipped, "skipped malformed triples");
    }
    Ok(samples)
}

/// Read and parse a corpus file.
pub fn load_corpus(path: &Path) -> Result<Vec<Sample>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading corpus {}", path.display()))?;
    let samples = parse_corpus(&content)?;
    ensure!(!samples.is_empty(), "corpus {} has no samples", path.display());
    info!(path = %path.display(), samples = samples.len(), "loaded corpus");
    Ok(samples)
}

/// Lower-cased comparison key for an element: datatype suffix removed,
/// underscores and quotes turned into spaces, whitespace collapsed.
pub fn normalize_element(raw: &str) -> String {
    let value = raw.split("^^<").next().unwrap_or(raw);
    value
        .replace(['_', '"'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Keep only the triples whose head and tail both appear in the text.
pub fn align_sample(sample: &mut Sample) {
    let text = sample.text.to_lowercase();
    sample.triples.retain(|t| {
        let head = normalize_element(&t.head);
        let tail = normalize_element(&t.tail);
        !head.is_empty() && !tail.is_empty() && text.contains(&head) && text.contains(&tail)
    });
}

const ENTITIES: [&str; 12] = [
    "Alan_Bean",
    "Apollo_12",
    "Buzz_Aldrin",
    "Elliot_See",
    "NASA",
    "Texas",
    "Dallas",
    "United_States",
    "Test_pilot",
    "Wheeler,_Texas",
    "Glen_Ridge,_New_Jersey",
    "University_of_Texas_at_Austin",
];

const RELATIONS: [(&str, &str); 8] = [
    ("occupation", "worked as a"),
    ("birthPlace", "was born in"),
    ("operator", "is operated by"),
    ("crewMember", "had the crew member"),
    ("country", "is in"),
    ("almaMater", "studied at"),
    ("deathPlace", "died in"),
    ("mission", "flew on"),
];

/// Generate `count` samples of one to four facts each.
///
/// Texts are built from the same facts, so alignment keeps every triple.
pub fn generate_corpus(seed: u64, count: usize) -> Vec<Sample> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let samples: Vec<Sample> = (0..count).filter_map(|_| generate_sample(&mut rng)).collect();
    info!(seed, samples = samples.len(), "generated corpus");
    samples
}

fn generate_sample(rng: &mut ChaCha8Rng) -> Option<Sample> {
    let facts = rng.gen_range(1..=4);
    let subject = pick(rng, &ENTITIES)?;
    let mut triples = Vec::with_capacity(facts);
    let mut sentences = Vec::with_capacity(facts);

    for _ in 0..facts {
        // Facts mostly share a subject, like a WebNLG entry.
        let head = if rng.gen_bool(0.75) { subject } else { pick(rng, &ENTITIES)? };
        let (relation, phrase) = pick(rng, &RELATIONS)?;
        let tail = loop {
            let t = pick(rng, &ENTITIES)?;
            if t != head {
                break t;
            }
        };
        sentences.push(format!("{} {} {}.", display(head), phrase, display(tail)));
        triples.push(Triple::new(head, relation, tail));
    }

    Some(Sample {
        text: sentences.join(" "),
        triples,
    })
}

fn pick<T: Copy>(rng: &mut ChaCha8Rng, items: &[T]) -> Option<T> {
    items.choose(rng).copied()
}

fn display(element: &str) -> String {
    element.replace('_', " ")
}
