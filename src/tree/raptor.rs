//! The finished summary tree.
//!
//! - Level 0: the original chunks
//! - Level 1+: summaries of the level below
//!
//! A tree is assembled once by [`TreeBuilder`](super::TreeBuilder) and is
//! read-only afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::LevelResult;

/// Level results keyed by level, plus every text in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaptorTree {
    chunks: Vec<String>,
    levels: BTreeMap<usize, LevelResult>,
    all_texts: Vec<String>,
}

impl RaptorTree {
    pub(crate) fn new(chunks: Vec<String>, levels: Vec<LevelResult>) -> Self {
        let levels: BTreeMap<usize, LevelResult> =
            levels.into_iter().map(|l| (l.level, l)).collect();
        let mut all_texts = chunks.clone();
        for result in levels.values() {
            all_texts.extend(result.summaries.iter().map(|s| s.summary.clone()));
        }
        Self {
            chunks,
            levels,
            all_texts,
        }
    }

    /// Original chunks, in document order.
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Number of summary levels built.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Result for `level` (1-based).
    pub fn level(&self, level: usize) -> Option<&LevelResult> {
        self.levels.get(&level)
    }

    /// Level results in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = &LevelResult> {
        self.levels.values()
    }

    /// Chunks followed by each level's summaries, lowest level first.
    ///
    /// This is the "collapsed tree": every node as a retrieval candidate.
    pub fn all_texts(&self) -> &[String] {
        &self.all_texts
    }

    /// Summary texts at `level`; empty if the level does not exist.
    pub fn summaries_at(&self, level: usize) -> Vec<&str> {
        self.level(level)
            .map(|l| l.summaries.iter().map(|s| s.summary.as_str()).collect())
            .unwrap_or_default()
    }

    /// Summaries of the highest level.
    pub fn root_summaries(&self) -> Vec<&str> {
        self.levels
            .keys()
            .next_back()
            .map(|&top| self.summaries_at(top))
            .unwrap_or_default()
    }

    /// Whether any level fell back to a single failed summary.
    pub fn has_fallback(&self) -> bool {
        self.levels.values().any(|l| l.fallback)
    }
}
