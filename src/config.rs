//! Runtime configuration.
//!
//! Defaults mirror a production deployment: 2000-token chunks, three
//! summary levels, and a seeded mixture model capped at 50 components.
//! Every struct is `serde`-deserializable so a host can keep the values in
//! a TOML file:
//!
//! ```toml
//! [processing]
//! default_chunk_size = 1500
//!
//! [clustering]
//! min_cluster_size = 2
//! seed = 7
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration for tree building.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaptorConfig {
    /// Splitting and recursion settings.
    pub processing: ProcessingConfig,
    /// Mixture-model and post-processing settings.
    pub clustering: ClusteringConfig,
}

/// Splitting and recursion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Chunk size (estimated tokens) used by `process_text_default`.
    pub default_chunk_size: usize,
    /// Level count used by `process_text_default`.
    pub default_max_levels: usize,
    /// Longest accepted input, in characters.
    pub max_text_length: usize,
    /// Overlap between consecutive chunks as a fraction of the chunk size.
    pub overlap_ratio: f64,
    /// Group whole sentences before falling back to separators.
    pub preserve_sentences: bool,
    /// Prefix each chunk with the tail of its predecessor.
    pub add_overlap: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            default_chunk_size: 2000,
            default_max_levels: 3,
            max_text_length: 1_000_000,
            overlap_ratio: 0.1,
            preserve_sentences: true,
            add_overlap: true,
        }
    }
}

/// Mixture-model and post-processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Minimum responsibility for a confident global assignment. Also the
    /// cosine-similarity cut for the two-unit shortcut.
    pub cluster_threshold: f64,
    /// Clusters smaller than this are merged together.
    pub min_cluster_size: usize,
    /// Upper bound on candidate component counts.
    pub max_clusters: usize,
    /// EM iterations for the global refit.
    pub max_iterations: usize,
    /// EM iterations for each local refit.
    pub local_max_iterations: usize,
    /// EM iterations for each BIC candidate.
    pub selection_max_iterations: usize,
    /// Seed for EM initialization.
    pub seed: u64,
    /// Log-likelihood improvement below which EM stops.
    pub tolerance: f64,
    /// Variance floor added to every diagonal covariance entry.
    pub reg_covar: f64,
    /// Fitted models kept in the model cache.
    pub cache_capacity: usize,
    /// Run local clustering for separate global clusters concurrently.
    pub parallel: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            cluster_threshold: 0.1,
            min_cluster_size: 3,
            max_clusters: 50,
            max_iterations: 100,
            local_max_iterations: 50,
            selection_max_iterations: 50,
            seed: 224,
            tolerance: 1e-6,
            reg_covar: 1e-6,
            cache_capacity: 100,
            parallel: true,
        }
    }
}

impl RaptorConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| Error::InvalidInput(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the default chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.processing.default_chunk_size = chunk_size;
        self
    }

    /// Set the default level count.
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.processing.default_max_levels = max_levels;
        self
    }

    /// Set the overlap ratio.
    pub fn with_overlap_ratio(mut self, ratio: f64) -> Self {
        self.processing.overlap_ratio = ratio;
        self
    }

    /// Enable or disable chunk overlap.
    pub fn with_overlap(mut self, enabled: bool) -> Self {
        self.processing.add_overlap = enabled;
        self
    }

    /// Enable or disable sentence-preserving splitting.
    pub fn with_preserve_sentences(mut self, enabled: bool) -> Self {
        self.processing.preserve_sentences = enabled;
        self
    }

    /// Set the global confidence threshold.
    pub fn with_cluster_threshold(mut self, threshold: f64) -> Self {
        self.clustering.cluster_threshold = threshold;
        self
    }

    /// Set the minimum cluster size.
    pub fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.clustering.min_cluster_size = size;
        self
    }

    /// Set the maximum component count.
    pub fn with_max_clusters(mut self, max_clusters: usize) -> Self {
        self.clustering.max_clusters = max_clusters;
        self
    }

    /// Set the EM seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.clustering.seed = seed;
        self
    }

    /// Enable or disable concurrent local clustering.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.clustering.parallel = parallel;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let p = &self.processing;
        let c = &self.clustering;
        if p.default_chunk_size == 0 {
            return Err(Error::InvalidParameter {
                name: "default_chunk_size",
                message: "must be > 0",
            });
        }
        if p.default_max_levels == 0 {
            return Err(Error::InvalidParameter {
                name: "default_max_levels",
                message: "must be > 0",
            });
        }
        if !(0.0..1.0).contains(&p.overlap_ratio) {
            return Err(Error::InvalidParameter {
                name: "overlap_ratio",
                message: "must be in [0, 1)",
            });
        }
        if !(0.0..=1.0).contains(&c.cluster_threshold) {
            return Err(Error::InvalidParameter {
                name: "cluster_threshold",
                message: "must be in [0, 1]",
            });
        }
        if c.max_iterations == 0 || c.local_max_iterations == 0 || c.selection_max_iterations == 0
        {
            return Err(Error::InvalidParameter {
                name: "max_iterations",
                message: "iteration limits must be > 0",
            });
        }
        if c.reg_covar <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "reg_covar",
                message: "must be > 0",
            });
        }
        Ok(())
    }
}
