//! Recursive, separator-driven text splitting.
//!
//! Sizes are measured in estimated tokens (see [`TokenEstimator`]), not
//! bytes. Separators are tried coarsest first:
//!
//! ```text
//! "\n\n"  paragraphs
//! "\n"    lines
//! ". " "! " "? "   sentences
//! "; " ", "        clauses
//! " "     words
//! (none)  characters, cut at the last space that fits
//! ```
//!
//! Parts are accumulated greedily. When the next part would push the running
//! chunk over the limit, the chunk is emitted; a part that is too large on its
//! own is split again with the next separator. Separators stay attached to the
//! part before them, so punctuation is never lost at a chunk boundary.
//!
//! With sentence preservation on (the default), whole sentences are grouped
//! first and only oversized sentences go through the separator hierarchy.
//!
//! ## Overlap
//!
//! Each chunk after the first is prefixed with the tail of its predecessor,
//! about `overlap_size` tokens, cut at a sentence boundary when possible.
//! If the prefixed chunk would exceed the limit, the overlap shrinks by
//! whole sentences, or by words when the tail had no sentence boundary; the
//! chunk's own content is never dropped.

use super::{ChunkStats, SentenceSplitter, TokenEstimator};
use crate::config::ProcessingConfig;
use crate::error::{Error, Result};

/// Separator hierarchy, coarsest first. The character fallback follows the last.
pub const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", "; ", ", ", " "];

/// Overlap between consecutive chunks, as a fraction of the chunk size.
pub const DEFAULT_OVERLAP_RATIO: f64 = 0.1;

/// Splitting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    /// Target chunk size in estimated tokens.
    pub chunk_size: usize,
    /// Overlap prefix size in estimated tokens.
    pub overlap_size: usize,
    /// Group whole sentences before using the separator hierarchy.
    pub preserve_sentences: bool,
    /// Prefix chunks with the tail of the previous chunk.
    pub add_overlap: bool,
}

impl SplitConfig {
    /// Sentence-preserving config with 10% overlap.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            overlap_size: overlap_tokens(chunk_size, DEFAULT_OVERLAP_RATIO),
            preserve_sentences: true,
            add_overlap: true,
        }
    }

    /// Build from processing settings for a given chunk size.
    pub fn from_processing(chunk_size: usize, processing: &ProcessingConfig) -> Self {
        Self {
            chunk_size,
            overlap_size: overlap_tokens(chunk_size, processing.overlap_ratio),
            preserve_sentences: processing.preserve_sentences,
            add_overlap: processing.add_overlap,
        }
    }

    /// Set the overlap as a fraction of the chunk size.
    pub fn with_overlap_ratio(mut self, ratio: f64) -> Self {
        self.overlap_size = overlap_tokens(self.chunk_size, ratio);
        self
    }

    /// Disable overlap.
    pub fn without_overlap(mut self) -> Self {
        self.add_overlap = false;
        self
    }

    /// Enable or disable sentence preservation.
    pub fn with_preserve_sentences(mut self, enabled: bool) -> Self {
        self.preserve_sentences = enabled;
        self
    }
}

fn overlap_tokens(chunk_size: usize, ratio: f64) -> usize {
    (chunk_size as f64 * ratio.max(0.0)) as usize
}

/// Recursive, token-bounded text splitter.
///
/// ## Example
///
/// ```rust
/// use raptor::split::{SplitConfig, TextChunker};
///
/// let chunker = TextChunker::new(SplitConfig::new(8).without_overlap()).unwrap();
/// let chunks = chunker
///     .split("First paragraph here.\n\nSecond paragraph, a little longer than the first.")
///     .unwrap();
/// assert!(chunks.len() >= 2);
/// assert!(chunks[0].starts_with("First"));
/// ```
#[derive(Debug, Clone)]
pub struct TextChunker {
    config: SplitConfig,
    estimator: TokenEstimator,
    sentences: SentenceSplitter,
}

impl TextChunker {
    /// Create a chunker. Fails if `chunk_size == 0`.
    pub fn new(config: SplitConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::InvalidParameter {
                name: "chunk_size",
                message: "must be > 0",
            });
        }
        Ok(Self {
            config,
            estimator: TokenEstimator::new(),
            sentences: SentenceSplitter::new(),
        })
    }

    /// Chunker with default settings for `chunk_size`.
    pub fn with_chunk_size(chunk_size: usize) -> Result<Self> {
        Self::new(SplitConfig::new(chunk_size))
    }

    /// The active configuration.
    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// The estimator used for size checks.
    pub fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }

    /// Split `text` into ordered, non-empty chunks.
    pub fn split(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("text cannot be blank".into()));
        }

        if self.estimator.estimate(text) <= self.config.chunk_size {
            return Ok(vec![text.trim().to_string()]);
        }

        let chunks = if self.config.preserve_sentences {
            self.split_preserving_sentences(text)
        } else {
            let mut out = Vec::new();
            self.split_into(text, 0, &mut out);
            out
        };

        if self.config.add_overlap && self.config.overlap_size > 0 {
            Ok(self.add_overlap(&chunks))
        } else {
            Ok(chunks)
        }
    }

    /// Token statistics for a chunk list.
    pub fn stats<S: AsRef<str>>(&self, chunks: &[S]) -> ChunkStats {
        ChunkStats::from_chunks(chunks, &self.estimator)
    }

    fn fits(&self, text: &str) -> bool {
        self.estimator.estimate(text) <= self.config.chunk_size
    }

    fn split_preserving_sentences(&self, text: &str) -> Vec<String> {
        let sentences = self.sentences.split(text);
        let mut out = Vec::new();
        if sentences.is_empty() {
            self.split_into(text, 0, &mut out);
            return out;
        }

        let mut current = String::new();
        for sentence in sentences {
            if !self.fits(sentence) {
                flush(&mut current, &mut out);
                self.split_into(sentence, 0, &mut out);
                continue;
            }
            if !current.is_empty() && !self.fits(&format!("{current} {sentence}")) {
                flush(&mut current, &mut out);
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
        }
        flush(&mut current, &mut out);
        out
    }

    fn split_into(&self, text: &str, sep_index: usize, out: &mut Vec<String>) {
        if self.fits(text) {
            push_trimmed(out, text);
            return;
        }

        let Some(sep) = SEPARATORS.get(sep_index) else {
            self.split_by_chars(text, out);
            return;
        };

        let parts: Vec<&str> = text.split_inclusive(*sep).collect();
        if parts.len() <= 1 {
            self.split_into(text, sep_index + 1, out);
            return;
        }

        let mut current = String::new();
        for part in parts {
            if part.trim().is_empty() {
                continue;
            }
            if !self.fits(part) {
                flush(&mut current, out);
                self.split_into(part, sep_index + 1, out);
                continue;
            }
            if !current.trim().is_empty() && !self.fits(&format!("{current}{part}")) {
                flush(&mut current, out);
            }
            current.push_str(part);
        }
        flush(&mut current, out);
    }

    /// Last resort: cut by approximate character count, backing off to the
    /// last whitespace inside the window.
    fn split_by_chars(&self, text: &str, out: &mut Vec<String>) {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let total = chars.len();
        let byte_at = |i: usize| if i < total { chars[i].0 } else { text.len() };
        let budget = self.estimator.approx_char_size(self.config.chunk_size).max(1);

        let mut start = 0;
        while start < total {
            while start < total && chars[start].1.is_whitespace() {
                start += 1;
            }
            if start >= total {
                break;
            }

            let mut window = budget.min(total - start);
            loop {
                let tokens = self
                    .estimator
                    .estimate(&text[byte_at(start)..byte_at(start + window)]);
                if tokens <= self.config.chunk_size || window == 1 {
                    break;
                }
                window = (window * self.config.chunk_size / tokens).clamp(1, window - 1);
            }

            let mut end = start + window;
            if end < total {
                if let Some(space) = (start + 1..end).rev().find(|&i| chars[i].1.is_whitespace()) {
                    end = space;
                }
            }

            push_trimmed(out, &text[byte_at(start)..byte_at(end)]);
            start = end;
        }
    }

    fn add_overlap(&self, chunks: &[String]) -> Vec<String> {
        if chunks.len() <= 1 {
            return chunks.to_vec();
        }

        let mut out = Vec::with_capacity(chunks.len());
        out.push(chunks[0].clone());
        for pair in chunks.windows(2) {
            let overlap = self.extract_overlap(&pair[0]);
            out.push(self.prepend_overlap(&overlap, &pair[1]));
        }
        out
    }

    /// Tail of `text` worth about `overlap_size` tokens, preferring whole sentences.
    fn extract_overlap(&self, text: &str) -> Overlap {
        let limit = self.config.overlap_size;
        if self.estimator.estimate(text) <= limit {
            let text = text.trim();
            return if text.ends_with(['.', '!', '?']) {
                Overlap::Sentences(text.to_string())
            } else {
                Overlap::Words(text.to_string())
            };
        }

        let sentences = self.sentences.split(text);
        if sentences.len() > 1 {
            let mut taken: Vec<&str> = Vec::new();
            for sentence in sentences.iter().rev() {
                let candidate = if taken.is_empty() {
                    (*sentence).to_string()
                } else {
                    format!("{sentence} {}", taken.join(" "))
                };
                if self.estimator.estimate(&candidate) > limit {
                    break;
                }
                taken.insert(0, sentence);
            }
            if !taken.is_empty() {
                return Overlap::Sentences(taken.join(" "));
            }
        }

        Overlap::Words(self.tail_chars(text, self.estimator.approx_char_size(limit)))
    }

    fn tail_chars(&self, text: &str, max_chars: usize) -> String {
        let text = text.trim();
        let count = text.chars().count();
        if count <= max_chars {
            return text.to_string();
        }
        let skip = count - max_chars;
        let Some((byte_start, _)) = text.char_indices().nth(skip) else {
            return String::new();
        };
        let tail = &text[byte_start..];
        // Start at a word boundary unless the tail is a single word.
        match tail.find(char::is_whitespace) {
            Some(pos) if !text[..byte_start].ends_with(char::is_whitespace) => {
                tail[pos..].trim().to_string()
            }
            _ => tail.trim().to_string(),
        }
    }

    /// Prefix `chunk` with as much of `overlap` as fits.
    ///
    /// Sentence overlaps lose whole leading sentences and are dropped when
    /// not even the last one fits. Word overlaps lose leading words.
    fn prepend_overlap(&self, overlap: &Overlap, chunk: &str) -> String {
        let pieces: Vec<&str> = match overlap {
            Overlap::Sentences(text) => self.sentences.split(text),
            Overlap::Words(text) => text.split_whitespace().collect(),
        };
        for skip in 0..pieces.len() {
            let candidate = format!("{} {chunk}", pieces[skip..].join(" "));
            if self.fits(&candidate) {
                return candidate;
            }
        }
        chunk.to_string()
    }
}

/// Tail carried from one chunk into the next.
#[derive(Debug, Clone, PartialEq)]
enum Overlap {
    /// Whole sentences, cut only between sentences.
    Sentences(String),
    /// A character tail starting at a word boundary.
    Words(String),
}

fn push_trimmed(out: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn flush(current: &mut String, out: &mut Vec<String>) {
    push_trimmed(out, current);
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_ws(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn plain(chunk_size: usize) -> TextChunker {
        TextChunker::new(SplitConfig::new(chunk_size).without_overlap()).unwrap()
    }

    #[test]
    fn test_blank_text_rejected() {
        let chunker = TextChunker::with_chunk_size(100).unwrap();
        assert!(matches!(chunker.split(""), Err(Error::InvalidInput(_))));
        assert!(matches!(chunker.split(" \n\t"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(TextChunker::new(SplitConfig::new(0)).is_err());
    }

    #[test]
    fn test_small_text_single_trimmed_chunk() {
        let chunker = TextChunker::with_chunk_size(100).unwrap();
        assert_eq!(chunker.split("  A. B. C.  ").unwrap(), vec!["A. B. C."]);
    }

    #[test]
    fn test_respects_size_limit() {
        let chunker = plain(10);
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);
        let chunks = chunker.split(&text).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunker.estimator().estimate(chunk) <= 10,
                "chunk too large: {chunk:?}"
            );
        }
    }

    #[test]
    fn test_paragraphs_split_first() {
        let chunker = TextChunker::new(
            SplitConfig::new(10)
                .without_overlap()
                .with_preserve_sentences(false),
        )
        .unwrap();
        let text = "Alpha beta gamma delta.\n\nEpsilon zeta eta theta.\n\nIota kappa lambda mu.";
        let chunks = chunker.split(text).unwrap();
        assert_eq!(
            chunks,
            vec![
                "Alpha beta gamma delta.",
                "Epsilon zeta eta theta.",
                "Iota kappa lambda mu."
            ]
        );
    }

    #[test]
    fn test_punctuation_kept_at_boundaries() {
        let chunker = TextChunker::new(
            SplitConfig::new(6)
                .without_overlap()
                .with_preserve_sentences(false),
        )
        .unwrap();
        let text = "one two three; four five six, seven eight nine. ten eleven";
        let chunks = chunker.split(text).unwrap();
        assert_eq!(non_ws(&chunks.concat()), non_ws(text));
    }

    #[test]
    fn test_character_fallback_for_long_word() {
        let chunker = plain(5);
        let word = "a".repeat(100);
        let chunks = chunker.split(&word).unwrap();
        assert!(chunks.len() >= 5);
        assert_eq!(chunks.concat(), word);
        for chunk in &chunks {
            assert!(chunker.estimator().estimate(chunk) <= 5);
        }
    }

    #[test]
    fn test_character_fallback_multibyte() {
        let chunker = plain(2);
        let text = "é".repeat(40);
        let chunks = chunker.split(&text).unwrap();
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_sentences_grouped_greedily() {
        let chunker = plain(8);
        let text = "One two three. Four five six. Seven eight nine. Ten eleven twelve.";
        let chunks = chunker.split(text).unwrap();
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.ends_with('.'), "sentence cut mid-way: {chunk:?}");
        }
        assert_eq!(non_ws(&chunks.concat()), non_ws(text));
    }

    #[test]
    fn test_overlap_prefixes_previous_tail() {
        let chunker = TextChunker::new(SplitConfig::new(20).with_overlap_ratio(0.5)).unwrap();
        let text = "Cats purr softly. Dogs bark loudly at night. Birds sing at dawn each day. \
                    Fish swim in the cold river. Frogs croak near the pond.";
        let plain_chunks = plain(20).split(text).unwrap();
        let overlapped = chunker.split(text).unwrap();

        assert_eq!(plain_chunks.len(), overlapped.len());
        assert_eq!(overlapped[0], plain_chunks[0]);
        for (i, chunk) in overlapped.iter().enumerate().skip(1) {
            assert!(chunk.ends_with(&plain_chunks[i]), "own content lost: {chunk:?}");
            assert!(chunker.estimator().estimate(chunk) <= 20);
        }
    }

    #[test]
    fn test_overlap_truncated_not_content() {
        // Chunks already at the limit leave no room for overlap.
        let chunker = TextChunker::new(
            SplitConfig::new(3)
                .with_overlap_ratio(0.9)
                .with_preserve_sentences(false),
        )
        .unwrap();
        let text = "aaaa bbbb cccc dddd eeee ffff gggg";
        let chunks = chunker.split(text).unwrap();
        let bare = plain(3).split(text).unwrap();
        for (chunk, own) in chunks.iter().zip(&bare) {
            assert!(chunk.ends_with(own.as_str()));
        }
    }

    #[test]
    fn test_overlap_starts_at_sentence_boundary() {
        let chunker = TextChunker::new(SplitConfig::new(20).with_overlap_ratio(0.5)).unwrap();
        let text = "Cats purr softly. Dogs bark loudly at night. Birds sing at dawn each day. \
                    Fish swim in the cold river. Frogs croak near the pond.";
        let plain_chunks = plain(20).split(text).unwrap();
        let overlapped = chunker.split(text).unwrap();

        let splitter = SentenceSplitter::new();
        for (i, chunk) in overlapped.iter().enumerate().skip(1) {
            let prefix = chunk
                .strip_suffix(plain_chunks[i].as_str())
                .map(str::trim)
                .unwrap_or_default();
            let previous = splitter.split(&plain_chunks[i - 1]);
            assert!(
                prefix.is_empty() || previous.iter().any(|s| prefix.starts_with(s)),
                "overlap cut mid-sentence: {chunk:?}"
            );
        }
    }

    #[test]
    fn test_sentence_overlap_drops_leading_sentences() {
        let chunker = TextChunker::new(SplitConfig::new(10)).unwrap();
        let chunk = "Gamma three four five six.";

        let two = Overlap::Sentences("Alpha one. Beta two.".to_string());
        assert_eq!(
            chunker.prepend_overlap(&two, chunk),
            "Beta two. Gamma three four five six."
        );

        // The single sentence does not fit, so nothing of it is kept.
        let one = Overlap::Sentences("Alpha one two three four.".to_string());
        assert_eq!(chunker.prepend_overlap(&one, chunk), chunk);
    }

    #[test]
    fn test_word_overlap_drops_leading_words() {
        let chunker = TextChunker::new(SplitConfig::new(10)).unwrap();
        let words = Overlap::Words("one two three four".to_string());
        assert_eq!(
            chunker.prepend_overlap(&words, "Gamma three four five six."),
            "three four Gamma three four five six."
        );
    }

    #[test]
    fn test_stats() {
        let chunker = plain(10);
        let chunks = chunker.split(&"word ".repeat(50)).unwrap();
        let stats = chunker.stats(&chunks);
        assert_eq!(stats.count, chunks.len());
        assert!(stats.max_tokens <= 10);
        assert!(stats.min_tokens >= 1);
    }
}
