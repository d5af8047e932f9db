//! # raptor
//!
//! Recursive abstractive summary trees: split text into chunks, embed them,
//! group similar chunks with Gaussian mixtures, summarize each group, and
//! repeat over the summaries.
//!
//! Embedding and text generation are supplied by the host through the
//! [`Embedder`] and [`TextGenerator`] traits; this crate owns splitting,
//! clustering and the recursion.
//!
//! ```rust
//! use raptor::{embed, summarize, RaptorConfig, TreeBuilder};
//!
//! let embedder = embed::from_fn(|texts: &[String]| {
//!     Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
//! });
//! let generator = summarize::from_fn(|_prompt: &str| Ok("A short summary.".to_string()));
//!
//! let builder = TreeBuilder::new(RaptorConfig::default(), embedder, generator).unwrap();
//! let tree = builder.process_text("A. B. C.", 100, 1).unwrap();
//!
//! assert_eq!(tree.depth(), 1);
//! assert_eq!(tree.root_summaries(), vec!["A short summary."]);
//! ```
//!
//! Parallel local clustering is on by default (feature `parallel`, backed by
//! `rayon`); without it every task runs on the calling thread.

pub mod cluster;
pub mod config;
pub mod embed;
/// Error types used across `raptor`.
pub mod error;
pub mod model;
pub mod similarity;
pub mod split;
pub mod summarize;
pub mod tree;

pub use cluster::{ClusteringEngine, ModelCache};
pub use config::{ClusteringConfig, ProcessingConfig, RaptorConfig};
pub use embed::Embedder;
pub use error::{Error, Result};
pub use model::{Cluster, ClusterSummary, EmbeddedUnit, LevelResult, TextUnit};
pub use split::{ChunkStats, SplitConfig, TextChunker, TokenEstimator};
pub use summarize::{PromptSummarizer, Summarizer, TextGenerator};
pub use tree::{RaptorTree, TreeBuilder};
