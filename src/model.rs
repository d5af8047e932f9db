//! Units, clusters, summaries and per-level results.
//!
//! ```text
//! TextUnit ──embed──▶ EmbeddedUnit ──cluster──▶ Cluster ──summarize──▶ ClusterSummary
//!                                                                        │
//!            next level's TextUnits ◀───────────────────────────────────┘
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

/// A chunk or a summary. `id` is unique within its level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Position of this unit within its level.
    pub id: usize,
    /// Unit text.
    pub text: String,
}

impl TextUnit {
    /// Create a unit.
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// A unit with its embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedUnit {
    /// Position of this unit within its level.
    pub id: usize,
    /// Unit text.
    pub text: String,
    /// Embedding. All vectors in one batch share a length.
    pub vector: Vec<f32>,
}

impl EmbeddedUnit {
    /// Create an embedded unit.
    pub fn new(id: usize, text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id,
            text: text.into(),
            vector,
        }
    }

    /// Embedding dimension.
    pub fn dim(&self) -> usize {
        self.vector.len()
    }
}

impl AsRef<[f32]> for EmbeddedUnit {
    fn as_ref(&self) -> &[f32] {
        &self.vector
    }
}

/// A group of units to be summarized together.
///
/// `texts[i]` is the text of unit `member_ids[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Identifier, unique within one clustering pass.
    pub id: usize,
    /// Member texts, in member order.
    pub texts: Vec<String>,
    /// Member unit ids, parallel to `texts`.
    pub member_ids: Vec<usize>,
    /// Ids of the clusters folded into this one by small-cluster merging.
    /// Empty for clusters that were not produced by a merge.
    pub merged_from: Vec<usize>,
}

impl Cluster {
    /// Build a cluster from embedded members.
    pub fn from_units<'a, I>(id: usize, units: I) -> Self
    where
        I: IntoIterator<Item = &'a EmbeddedUnit>,
    {
        let (texts, member_ids) = units
            .into_iter()
            .map(|u| (u.text.clone(), u.id))
            .unzip();
        Self {
            id,
            texts,
            member_ids,
            merged_from: Vec::new(),
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cluster[{}] members={:?}", self.id, self.member_ids)
    }
}

/// Generated summary of one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Cluster this summary describes.
    pub cluster_id: usize,
    /// Tree level (1 = summaries of original chunks).
    pub level: usize,
    /// Summary text, or a placeholder when generation failed.
    pub summary: String,
    /// Ids of the units that were summarized.
    pub source_ids: Vec<usize>,
    /// Whether `summary` is a failure placeholder.
    pub failed: bool,
}

/// Everything produced while processing one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelResult {
    /// Tree level, starting at 1.
    pub level: usize,
    /// Embedded input units.
    pub embeddings: Vec<EmbeddedUnit>,
    /// Final clusters after post-processing.
    pub clusters: Vec<Cluster>,
    /// One summary per cluster, in cluster order.
    pub summaries: Vec<ClusterSummary>,
    /// Whether this level was replaced by the single-cluster fallback.
    pub fallback: bool,
}

impl LevelResult {
    /// Summary texts in order; the next level's input.
    pub fn summary_texts(&self) -> Vec<String> {
        self.summaries.iter().map(|s| s.summary.clone()).collect()
    }
}
