//! Sentence splitting.
//!
//! A sentence ends at `.`, `!` or `?` followed by whitespace. Cruder than
//! UAX #29 segmentation: "Dr. Smith" splits after "Dr.", but no real
//! boundary is ever merged away.

use std::sync::LazyLock;

use regex::Regex;

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence terminator pattern is valid"));

/// Splits text into trimmed, non-empty sentences.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceSplitter;

impl SentenceSplitter {
    /// Create a splitter.
    pub fn new() -> Self {
        Self
    }

    /// Split `text` into sentences. Terminal punctuation stays with its
    /// sentence; surrounding whitespace is dropped.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let mut sentences = Vec::new();
        let mut start = 0;
        for m in SENTENCE_END.find_iter(text) {
            // The terminator is a single ASCII byte.
            let end = m.start() + 1;
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = m.end();
        }
        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail);
        }
        sentences
    }
}
