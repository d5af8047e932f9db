//! Two-stage probabilistic clustering of embedded units.
//!
//! ## Why soft clustering
//!
//! A summary chunk often spans several topics. A Gaussian mixture gives
//! each unit a distribution over components instead of forcing one label,
//! so units with no confident home can be set aside in an *uncertain*
//! bucket rather than diluting a real group.
//!
//! ## Stages
//!
//! 1. **Model selection**: fit mixtures for k = 1, 2, … and keep the lowest
//!    BIC ([`ModelSelector`]).
//! 2. **Global**: one mixture over the whole level; low-confidence units go
//!    to the uncertain bucket ([`GlobalClusterer`]).
//! 3. **Local**: a smaller mixture inside each global cluster, run
//!    concurrently on a [`TaskPool`] ([`LocalClusterer`]).
//! 4. **Post-processing**: drop empties, merge undersized clusters
//!    ([`ClusterPostProcessor`]).
//!
//! [`ClusteringEngine`] wires the stages together with a shared
//! [`ModelCache`].
//!
//! ## Usage
//!
//! ```rust
//! use raptor::cluster::ClusteringEngine;
//! use raptor::config::ClusteringConfig;
//! use raptor::model::EmbeddedUnit;
//!
//! let units: Vec<EmbeddedUnit> = (0..10)
//!     .map(|i| EmbeddedUnit::new(i, format!("chunk {i}"), vec![0.25, 0.5, 0.75]))
//!     .collect();
//!
//! let clusters = ClusteringEngine::new(&ClusteringConfig::default())
//!     .cluster(&units)
//!     .unwrap();
//! assert_eq!(clusters.len(), 1);
//! ```

mod cache;
mod engine;
mod global;
mod gmm;
mod local;
mod pool;
mod postprocess;
mod selector;

pub use cache::{ModelCache, DEFAULT_CACHE_CAPACITY};
pub use engine::ClusteringEngine;
pub use global::{GlobalCluster, GlobalClusterer};
pub use gmm::{bic, Gmm, GmmModel};
pub use local::{LocalClusterer, PASSTHROUGH_SIZE};
pub use pool::TaskPool;
pub use postprocess::ClusterPostProcessor;
pub use selector::{ModelSelector, Selection};
