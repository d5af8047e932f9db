//! Bounded cache of fitted mixture models.
//!
//! Keys carry the batch size, dimension and estimator parameters as plain
//! fields, plus a digest of every vector's bits. A hit needs all of them to
//! match; a miss fits and inserts. When full, the oldest inserted key is
//! evicted.
//!
//! The cache only saves work. Fitting is deterministic for a fixed seed, so
//! a hit and a miss produce the same model.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::gmm::{Gmm, GmmModel};
use crate::error::Result;

/// Default number of models kept.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Thread-safe, fixed-capacity model cache with oldest-first eviction.
#[derive(Debug)]
pub struct ModelCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Default)]
struct CacheInner {
    models: HashMap<FitKey, Arc<GmmModel>>,
    order: VecDeque<FitKey>,
}

/// Identity of one fit: batch shape, estimator parameters, content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FitKey {
    n_samples: usize,
    dim: usize,
    n_components: usize,
    max_iter: usize,
    seed: Option<u64>,
    tol: u64,
    reg_covar: u64,
    digest: u64,
}

impl FitKey {
    fn new<V: AsRef<[f32]>>(gmm: &Gmm, data: &[V]) -> Self {
        let mut hasher = DefaultHasher::new();
        for v in data {
            v.as_ref().len().hash(&mut hasher);
            for x in v.as_ref() {
                x.to_bits().hash(&mut hasher);
            }
        }
        Self {
            n_samples: data.len(),
            dim: data.first().map_or(0, |v| v.as_ref().len()),
            n_components: gmm.n_components(),
            max_iter: gmm.max_iter(),
            seed: gmm.seed(),
            tol: gmm.tol().to_bits(),
            reg_covar: gmm.reg_covar().to_bits(),
            digest: hasher.finish(),
        }
    }
}

impl ModelCache {
    /// Create a cache holding at most `capacity` models. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Maximum number of models kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Models currently cached.
    pub fn len(&self) -> usize {
        self.inner.lock().models.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that required a fit.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Drop every cached model.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.models.clear();
        inner.order.clear();
    }

    /// Return the cached model for (`gmm`, `data`), fitting it on a miss.
    ///
    /// The lock is not held while fitting; two threads missing on the same
    /// key both fit, and the second insert is ignored.
    pub fn get_or_fit<V: AsRef<[f32]>>(&self, gmm: &Gmm, data: &[V]) -> Result<Arc<GmmModel>> {
        if self.capacity == 0 {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return gmm.fit(data).map(Arc::new);
        }

        let key = FitKey::new(gmm, data);
        if let Some(model) = self.inner.lock().models.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(model));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let model = Arc::new(gmm.fit(data)?);

        let mut inner = self.inner.lock();
        if !inner.models.contains_key(&key) {
            while inner.models.len() >= self.capacity {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                inner.models.remove(&oldest);
            }
            inner.order.push_back(key.clone());
            inner.models.insert(key, Arc::clone(&model));
        }
        Ok(model)
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

/// Fit with the cache when one is supplied.
pub(crate) fn fit_with<V: AsRef<[f32]>>(
    cache: Option<&ModelCache>,
    gmm: &Gmm,
    data: &[V],
) -> Result<Arc<GmmModel>> {
    match cache {
        Some(cache) => cache.get_or_fit(gmm, data),
        None => gmm.fit(data).map(Arc::new),
    }
}
