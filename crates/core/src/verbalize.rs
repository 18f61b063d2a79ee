//! Hand-off from reconstructed triples to a text generator.
//!
//! Text generation itself lives outside this crate. [`TripleVerbalizer`]
//! is the seam a generator plugs into; [`LinearizingVerbalizer`] produces
//! the flat prompt such a generator consumes.

use crate::semantic::Triple;

/// Turns a reconstructed triple set into text.
///
/// Callers never invoke it with an empty set; see
/// [`crate::pipeline::TripleReconstruction::verbalize`].
pub trait TripleVerbalizer {
    fn verbalize(&self, triples: &[Triple]) -> String;
}

impl<F> TripleVerbalizer for F
where
    F: Fn(&[Triple]) -> String,
{
    fn verbalize(&self, triples: &[Triple]) -> String {
        self(triples)
    }
}

/// Flattens triples around their most frequent head:
/// `"kg2text: <head> <relation> <tail>, <relation> <tail>"`.
///
/// Only triples whose head is the most frequent head are kept; ties pick
/// the head seen first. Elements are cleaned with [`clean_element`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearizingVerbalizer;

impl TripleVerbalizer for LinearizingVerbalizer {
    fn verbalize(&self, triples: &[Triple]) -> String {
        let cleaned: Vec<(String, String, String)> = triples
            .iter()
            .map(|t| {
                (
                    clean_element(&t.head),
                    clean_element(&t.relation),
                    clean_element(&t.tail),
                )
            })
            .collect();

        let mut counts: Vec<(&str, usize)> = Vec::new();
        for (head, _, _) in &cleaned {
            match counts.iter().position(|(h, _)| *h == head.as_str()) {
                Some(i) => counts[i].1 += 1,
                None => counts.push((head.as_str(), 1)),
            }
        }

        // max_by_key keeps the last maximum; scan in reverse to keep the first.
        let Some(main_head) = counts.iter().rev().max_by_key(|(_, n)| *n).map(|(h, _)| *h) else {
            return String::new();
        };

        let pairs: Vec<String> = cleaned
            .iter()
            .filter(|(h, _, _)| h.as_str() == main_head)
            .map(|(_, r, t)| format!("{r} {t}"))
            .collect();

        format!("kg2text: {main_head} {}", pairs.join(", "))
    }
}

/// Normalize a raw knowledge-graph element for display.
///
/// Drops a `^^<datatype>` suffix, turns underscores into spaces, removes
/// double quotes and collapses whitespace.
pub fn clean_element(raw: &str) -> String {
    let value = match raw.find("^^<") {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    value
        .replace('_', " ")
        .replace('"', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_element() {
        assert_eq!(clean_element("Alan_Bean"), "Alan Bean");
        assert_eq!(
            clean_element("\"1932-03-15\"^^<http://www.w3.org/2001/XMLSchema#date>"),
            "1932-03-15"
        );
        assert_eq!(clean_element("  Wheeler,_ _Texas "), "Wheeler, Texas");
    }

    #[test]
    fn test_linearize_main_head() {
        let triples = vec![
            Triple::new("Apollo_12", "operator", "NASA"),
            Triple::new("Alan_Bean", "occupation", "Test_pilot"),
            Triple::new("Alan_Bean", "mission", "Apollo_12"),
        ];
        assert_eq!(
            LinearizingVerbalizer.verbalize(&triples),
            "kg2text: Alan Bean occupation Test pilot, mission Apollo 12"
        );
    }

    #[test]
    fn test_linearize_tie_keeps_first_head() {
        let triples = vec![
            Triple::new("B", "r1", "x"),
            Triple::new("A", "r2", "y"),
        ];
        assert_eq!(LinearizingVerbalizer.verbalize(&triples), "kg2text: B r1 x");
    }

    #[test]
    fn test_linearize_empty() {
        assert_eq!(LinearizingVerbalizer.verbalize(&[]), "");
    }

    #[test]
    fn test_closure_verbalizer() {
        let count = |t: &[Triple]| format!("{} facts", t.len());
        assert_eq!(count.verbalize(&[Triple::new("a", "b", "c")]), "1 facts");
    }
}
