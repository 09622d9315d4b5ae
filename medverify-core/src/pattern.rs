//! Registration-number pattern scanning.
//!
//! Registration numbers printed on packaging come in two shapes: a letter
//! prefix (`A4-101466`) or a bare two-digit prefix (`04-1650`). OCR output
//! frequently pads the hyphen with whitespace (`B4 - 1650`), so the scanner
//! tolerates that and normalizes matches to a single bare `-`.

use std::sync::LazyLock;

use regex::Regex;

use crate::recognize::TextLine;

static LETTER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]\d{1,2}\s*-\s*\d{4,6}\b").expect("valid pattern"));

static DIGIT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2}\s*-\s*\d{4,6}\b").expect("valid pattern"));

/// A candidate number found in recognized text, with the confidence of the
/// line it was found on.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberCandidate {
    pub number: String,
    pub confidence: f64,
}

/// Collapse internal whitespace so `B4 - 1650` becomes `B4-1650`.
fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect()
}

/// All registration-number shapes in a single line, normalized, in match
/// order.
pub fn scan_line(text: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = LETTER_PREFIX
        .find_iter(text)
        .chain(DIGIT_PREFIX.find_iter(text))
        .map(|m| (m.start(), normalize(m.as_str())))
        .collect();
    // The two patterns are disjoint, but interleave their matches by
    // position so scan order is the line's left-to-right order.
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, number)| number).collect()
}

/// Best candidate across all recognized lines: highest per-line confidence
/// wins, ties resolve to the first candidate in line-scan order.
pub fn best_candidate<'a, I>(lines: I) -> Option<NumberCandidate>
where
    I: IntoIterator<Item = &'a TextLine>,
{
    let mut best: Option<NumberCandidate> = None;
    for line in lines {
        for number in scan_line(&line.text) {
            let better = match &best {
                Some(current) => line.confidence > current.confidence,
                None => true,
            };
            if better {
                best = Some(NumberCandidate {
                    number,
                    confidence: line.confidence,
                });
            }
        }
    }
    best
}
