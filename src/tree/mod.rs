//! Recursive summary trees.
//!
//! RAPTOR (Recursive Abstractive Processing for Tree-Organized Retrieval)
//! builds a tree by:
//! 1. Splitting text into chunks
//! 2. Clustering the units of each level
//! 3. Summarizing each cluster
//! 4. Repeating over the summaries
//!
//! ## References
//!
//! Sarthi et al. (2024). "RAPTOR: Recursive Abstractive Processing for
//! Tree-Organized Retrieval." ICLR 2024.

mod builder;
mod raptor;

pub use builder::{TreeBuilder, LEVEL_FAILED, MAX_LEVEL_CEILING, SUMMARY_FAILED};
pub use raptor::RaptorTree;
