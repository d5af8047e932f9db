//! Cluster clean-up after local clustering.
//!
//! Empty clusters are dropped. With a minimum size above one, every cluster
//! smaller than the minimum is folded into a single merged cluster that is
//! appended after the clusters that were large enough. The merged cluster
//! lists the union of its members in `member_ids` and the ids of the
//! clusters it absorbed in `merged_from`; its own id is one past the largest
//! id seen.

use tracing::debug;

use crate::model::Cluster;

/// Drops empty clusters and merges undersized ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterPostProcessor {
    min_size: usize,
}

impl ClusterPostProcessor {
    /// Post-processor with the given minimum cluster size.
    pub fn new(min_size: usize) -> Self {
        Self { min_size }
    }

    /// Minimum cluster size.
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Clean up `clusters`. Never increases the cluster count and keeps
    /// every member.
    pub fn process(&self, clusters: Vec<Cluster>) -> Vec<Cluster> {
        let before = clusters.len();
        let next_id = clusters.iter().map(|c| c.id + 1).max().unwrap_or(0);
        let clusters: Vec<Cluster> = clusters.into_iter().filter(|c| !c.is_empty()).collect();

        if self.min_size <= 1 {
            return clusters;
        }

        let (mut kept, small): (Vec<Cluster>, Vec<Cluster>) = clusters
            .into_iter()
            .partition(|c| c.len() >= self.min_size);

        if !small.is_empty() {
            let mut merged = Cluster {
                id: next_id,
                texts: Vec::new(),
                member_ids: Vec::new(),
                merged_from: Vec::with_capacity(small.len()),
            };
            for cluster in small {
                merged.texts.extend(cluster.texts);
                merged.member_ids.extend(cluster.member_ids);
                merged.merged_from.push(cluster.id);
            }
            debug!(
                merged = merged.merged_from.len(),
                members = merged.len(),
                "merged undersized clusters"
            );
            kept.push(merged);
        }

        debug!(before, after = kept.len(), "post-processed clusters");
        kept
    }
}

impl Default for ClusterPostProcessor {
    fn default() -> Self {
        Self::new(3)
    }
}
