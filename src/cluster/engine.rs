//! The full clustering pass for one level.
//!
//! ```text
//! units ─▶ GlobalClusterer ─▶ LocalClusterer ─▶ ClusterPostProcessor ─▶ clusters
//! ```
//!
//! Tiny inputs skip the mixture models entirely:
//!
//! | Units | Result |
//! |-------|--------|
//! | 0 | no clusters |
//! | 1 | one cluster |
//! | 2 | one cluster if cosine similarity > threshold, else two |
//!
//! Invalid embeddings are rejected. Any other failure inside the pass falls
//! back to a single cluster holding every unit.

use tracing::{debug, warn};

use super::cache::ModelCache;
use super::global::GlobalClusterer;
use super::local::LocalClusterer;
use super::pool::TaskPool;
use super::postprocess::ClusterPostProcessor;
use crate::config::ClusteringConfig;
use crate::embed::validate_embeddings;
use crate::error::Result;
use crate::model::{Cluster, EmbeddedUnit};
use crate::similarity::cosine_similarity;

/// Global, local and post-processing stages with a shared model cache and
/// worker pool.
#[derive(Debug)]
pub struct ClusteringEngine {
    threshold: f64,
    global: GlobalClusterer,
    local: LocalClusterer,
    post: ClusterPostProcessor,
    pool: TaskPool,
    cache: ModelCache,
}

impl ClusteringEngine {
    /// Engine configured from clustering settings.
    pub fn new(config: &ClusteringConfig) -> Self {
        let pool = if config.parallel {
            TaskPool::new()
        } else {
            TaskPool::sequential()
        };
        Self {
            threshold: config.cluster_threshold,
            global: GlobalClusterer::from_config(config),
            local: LocalClusterer::from_config(config),
            post: ClusterPostProcessor::new(config.min_cluster_size),
            pool,
            cache: ModelCache::new(config.cache_capacity),
        }
    }

    /// The shared model cache.
    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    /// Group `units` into clusters.
    pub fn cluster(&self, units: &[EmbeddedUnit]) -> Result<Vec<Cluster>> {
        validate_embeddings(units)?;

        match units {
            [] => Ok(Vec::new()),
            [only] => Ok(vec![Cluster::from_units(0, [only])]),
            [a, b] => self.cluster_pair(a, b),
            _ => match self.run_stages(units) {
                Ok(clusters) => Ok(clusters),
                Err(e) => {
                    warn!(
                        units = units.len(),
                        error = %e,
                        "clustering failed, using a single cluster"
                    );
                    Ok(vec![Cluster::from_units(0, units)])
                }
            },
        }
    }

    fn cluster_pair(&self, a: &EmbeddedUnit, b: &EmbeddedUnit) -> Result<Vec<Cluster>> {
        let similarity = cosine_similarity(&a.vector, &b.vector)?;
        debug!(similarity, threshold = self.threshold, "clustering two units");
        if similarity > self.threshold {
            Ok(vec![Cluster::from_units(0, [a, b])])
        } else {
            Ok(vec![Cluster::from_units(0, [a]), Cluster::from_units(1, [b])])
        }
    }

    fn run_stages(&self, units: &[EmbeddedUnit]) -> Result<Vec<Cluster>> {
        let globals = self.global.cluster(units, Some(&self.cache))?;
        let local = self.local.cluster(globals, &self.pool, Some(&self.cache));
        let clusters = self.post.process(local);
        debug!(
            units = units.len(),
            clusters = clusters.len(),
            "clustering complete"
        );
        Ok(clusters)
    }
}

impl Default for ClusteringEngine {
    fn default() -> Self {
        Self::new(&ClusteringConfig::default())
    }
}
