//! Chunk size statistics.

use core::fmt;

use super::TokenEstimator;

/// Token-size distribution over a list of chunks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChunkStats {
    /// Number of chunks.
    pub count: usize,
    /// Mean estimated tokens per chunk.
    pub average_tokens: f64,
    /// Smallest chunk, in estimated tokens.
    pub min_tokens: usize,
    /// Largest chunk, in estimated tokens.
    pub max_tokens: usize,
}

impl ChunkStats {
    /// Compute statistics for `chunks`. All fields are zero for an empty list.
    pub fn from_chunks<S: AsRef<str>>(chunks: &[S], estimator: &TokenEstimator) -> Self {
        if chunks.is_empty() {
            return Self::default();
        }

        let sizes: Vec<usize> = chunks
            .iter()
            .map(|c| estimator.estimate(c.as_ref()))
            .collect();
        let total: usize = sizes.iter().sum();

        Self {
            count: sizes.len(),
            average_tokens: total as f64 / sizes.len() as f64,
            min_tokens: sizes.iter().copied().min().unwrap_or(0),
            max_tokens: sizes.iter().copied().max().unwrap_or(0),
        }
    }
}

impl fmt::Display for ChunkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChunkStats {{ count: {}, avg: {:.1}, min: {}, max: {} }}",
            self.count, self.average_tokens, self.min_tokens, self.max_tokens
        )
    }
}
