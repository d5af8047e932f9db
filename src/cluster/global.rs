//! First-stage clustering over a whole level.
//!
//! One mixture is fitted to every embedding of the level. Each unit goes to
//! its most probable component, unless that probability is below the
//! confidence threshold, in which case it lands in the *uncertain* bucket
//! whose id is one past the last component.

use std::collections::BTreeMap;

use tracing::debug;

use super::cache::{fit_with, ModelCache};
use super::gmm::argmax;
use super::selector::ModelSelector;
use crate::config::ClusteringConfig;
use crate::error::{Error, Result};
use crate::model::EmbeddedUnit;

/// A first-stage group of units.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalCluster {
    /// Component index, or the component count for the uncertain bucket.
    pub id: usize,
    /// Member units in input order.
    pub members: Vec<EmbeddedUnit>,
    /// Whether this is the low-confidence catch-all.
    pub uncertain: bool,
}

impl GlobalCluster {
    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Fits the level-wide mixture and buckets units by confidence.
#[derive(Debug, Clone)]
pub struct GlobalClusterer {
    selector: ModelSelector,
    threshold: f64,
    max_clusters: usize,
    max_iter: usize,
}

impl GlobalClusterer {
    /// Clusterer configured from clustering settings.
    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self {
            selector: ModelSelector::from_config(config),
            threshold: config.cluster_threshold,
            max_clusters: config.max_clusters,
            max_iter: config.max_iterations,
        }
    }

    /// Confidence threshold below which a unit is uncertain.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Candidate ceiling for `n` units.
    pub fn max_components(&self, n: usize) -> usize {
        self.max_clusters.min(n / 2).max(1)
    }

    /// Cluster `units`. The returned buckets partition the input exactly and
    /// are ordered by id.
    pub fn cluster(
        &self,
        units: &[EmbeddedUnit],
        cache: Option<&ModelCache>,
    ) -> Result<Vec<GlobalCluster>> {
        if units.is_empty() {
            return Ok(Vec::new());
        }

        let selection = self
            .selector
            .select(units, self.max_components(units.len()), cache);
        let k = selection.n_components;

        let gmm = self.selector.candidate(k).with_max_iter(self.max_iter);
        let model = fit_with(cache, &gmm, units)
            .map_err(|e| Error::Clustering(format!("global fit with k={k}: {e}")))?;
        let probs = model
            .predict_proba(units)
            .map_err(|e| Error::Clustering(format!("global assignment: {e}")))?;

        let uncertain_id = model.n_components();
        let mut buckets: BTreeMap<usize, Vec<EmbeddedUnit>> = BTreeMap::new();
        for (unit, row) in units.iter().zip(&probs) {
            let (best, p) = argmax(row);
            let id = if p < self.threshold { uncertain_id } else { best };
            buckets.entry(id).or_default().push(unit.clone());
        }

        let clusters: Vec<GlobalCluster> = buckets
            .into_iter()
            .map(|(id, members)| GlobalCluster {
                id,
                members,
                uncertain: id == uncertain_id,
            })
            .collect();

        let uncertain: usize = clusters
            .iter()
            .filter(|c| c.uncertain)
            .map(GlobalCluster::len)
            .sum();
        debug!(
            units = units.len(),
            k,
            clusters = clusters.len(),
            uncertain,
            "global clustering"
        );
        Ok(clusters)
    }
}
