//! Second-stage clustering inside each global cluster.
//!
//! Global clusters with at most three members pass through as one cluster.
//! Larger ones get their own, smaller-budget mixture and members are
//! hard-assigned to their most probable component. Output ids are assigned
//! after every task has finished, densely from zero, in global-cluster
//! order.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::cache::{fit_with, ModelCache};
use super::global::GlobalCluster;
use super::pool::TaskPool;
use super::selector::ModelSelector;
use crate::config::ClusteringConfig;
use crate::error::{Error, Result};
use crate::model::{Cluster, EmbeddedUnit};

/// Global clusters at or below this size are not split further.
pub const PASSTHROUGH_SIZE: usize = 3;

/// Splits global clusters into finer groups.
#[derive(Debug, Clone)]
pub struct LocalClusterer {
    selector: ModelSelector,
    max_clusters: usize,
    max_iter: usize,
    parallel: bool,
}

impl LocalClusterer {
    /// Clusterer configured from clustering settings.
    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self {
            selector: ModelSelector::from_config(config),
            max_clusters: config.max_clusters,
            max_iter: config.local_max_iterations,
            parallel: config.parallel,
        }
    }

    /// Candidate ceiling for a global cluster of `n` units.
    pub fn max_components(&self, n: usize) -> usize {
        self.max_clusters.min(n / 3).max(1)
    }

    /// Split every global cluster and number the results.
    ///
    /// Runs on `pool` when there is more than one global cluster and
    /// parallelism is enabled. A failing split keeps its global cluster
    /// whole and never affects the others.
    pub fn cluster(
        &self,
        globals: Vec<GlobalCluster>,
        pool: &TaskPool,
        cache: Option<&ModelCache>,
    ) -> Vec<Cluster> {
        let split = |global: GlobalCluster| -> Result<Vec<Vec<EmbeddedUnit>>> {
            self.split(&global.members, cache)
        };

        let inputs: Vec<Vec<EmbeddedUnit>> = globals.iter().map(|g| g.members.clone()).collect();
        let outcomes = if self.parallel && globals.len() > 1 {
            pool.join_all(globals, split)
        } else {
            TaskPool::sequential().join_all(globals, split)
        };

        let mut clusters = Vec::new();
        for (members, outcome) in inputs.into_iter().zip(outcomes) {
            let groups = match outcome {
                Ok(groups) => groups,
                Err(e) => {
                    warn!(
                        members = members.len(),
                        error = %e,
                        "local clustering failed, keeping global cluster whole"
                    );
                    vec![members]
                }
            };
            for group in groups {
                clusters.push(Cluster::from_units(clusters.len(), &group));
            }
        }

        debug!(clusters = clusters.len(), "local clustering");
        clusters
    }

    /// Split one global cluster's members into groups, in component order.
    pub fn split(
        &self,
        members: &[EmbeddedUnit],
        cache: Option<&ModelCache>,
    ) -> Result<Vec<Vec<EmbeddedUnit>>> {
        if members.len() <= PASSTHROUGH_SIZE {
            return Ok(vec![members.to_vec()]);
        }

        let selection = self
            .selector
            .select(members, self.max_components(members.len()), cache);
        let k = selection.n_components;
        if k == 1 {
            return Ok(vec![members.to_vec()]);
        }

        let gmm = self.selector.candidate(k).with_max_iter(self.max_iter);
        let labels = fit_with(cache, &gmm, members)
            .and_then(|model| model.predict(members))
            .map_err(|e| Error::Clustering(format!("local fit with k={k}: {e}")))?;

        let mut groups: BTreeMap<usize, Vec<EmbeddedUnit>> = BTreeMap::new();
        for (unit, label) in members.iter().zip(labels) {
            groups.entry(label).or_default().push(unit.clone());
        }
        Ok(groups.into_values().collect())
    }
}
