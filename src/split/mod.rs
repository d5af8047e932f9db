//! Text splitting: token estimation, sentence detection, and the recursive
//! chunker that produces level-1 units.

mod recursive;
mod sentence;
mod stats;
mod tokens;

pub use recursive::{SplitConfig, TextChunker, DEFAULT_OVERLAP_RATIO, SEPARATORS};
pub use sentence::SentenceSplitter;
pub use stats::ChunkStats;
pub use tokens::TokenEstimator;
