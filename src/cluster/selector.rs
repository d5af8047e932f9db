//! Model-order selection by BIC.
//!
//! For k = 1, 2, … up to `min(max_components, N - 1)` a k-component mixture
//! is fitted and scored:
//!
//! ```text
//! BIC(k) = -2 × log L(k) + k × (d + 1) × ln N
//! ```
//!
//! The lowest score wins. The sweep stops early once three consecutive
//! candidates fail to beat the best score and k > 3. A candidate whose fit
//! fails numerically is skipped.

use tracing::debug;

use super::cache::{fit_with, ModelCache};
use super::gmm::Gmm;
use crate::config::ClusteringConfig;

/// Consecutive non-improving candidates before the sweep stops.
const PATIENCE: usize = 3;

/// Outcome of a BIC sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Chosen component count.
    pub n_components: usize,
    /// BIC of the chosen count; `None` when no fit was needed or none succeeded.
    pub bic: Option<f64>,
    /// Every scored candidate as `(k, bic)`, in sweep order.
    pub scores: Vec<(usize, f64)>,
}

impl Selection {
    fn trivial() -> Self {
        Self {
            n_components: 1,
            bic: None,
            scores: Vec::new(),
        }
    }
}

/// Chooses the mixture component count for a batch of vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelector {
    seed: u64,
    max_iter: usize,
    tol: f64,
    reg_covar: f64,
}

impl ModelSelector {
    /// Selector with the given seed and default fit settings.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_iter: 50,
            tol: 1e-6,
            reg_covar: 1e-6,
        }
    }

    /// Selector configured from clustering settings.
    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self {
            seed: config.seed,
            max_iter: config.selection_max_iterations,
            tol: config.tolerance,
            reg_covar: config.reg_covar,
        }
    }

    /// Set EM iterations per candidate.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Estimator for a `k`-component candidate.
    pub fn candidate(&self, k: usize) -> Gmm {
        Gmm::new()
            .with_n_components(k)
            .with_max_iter(self.max_iter)
            .with_tol(self.tol)
            .with_reg_covar(self.reg_covar)
            .with_seed(self.seed)
    }

    /// Pick a component count for `data`, at most `max_components`.
    ///
    /// Always returns `1 ≤ k ≤ min(max_components, N - 1)` when both bounds
    /// exceed 1, and `k = 1` otherwise.
    pub fn select<V: AsRef<[f32]>>(
        &self,
        data: &[V],
        max_components: usize,
        cache: Option<&ModelCache>,
    ) -> Selection {
        let n = data.len();
        if max_components <= 1 || n <= 1 {
            return Selection::trivial();
        }

        let upper = max_components.min(n - 1);
        debug!(n, max_components = upper, "selecting component count");

        let mut selection = Selection::trivial();
        let mut best = f64::INFINITY;
        let mut no_improvement = 0;

        for k in 1..=upper {
            let model = match fit_with(cache, &self.candidate(k), data) {
                Ok(model) => model,
                Err(e) => {
                    debug!(k, error = %e, "skipping candidate");
                    continue;
                }
            };

            let score = model.bic(n);
            if !score.is_finite() {
                debug!(k, "skipping candidate with non-finite BIC");
                continue;
            }
            selection.scores.push((k, score));

            if score < best {
                best = score;
                selection.n_components = k;
                selection.bic = Some(score);
                no_improvement = 0;
            } else {
                no_improvement += 1;
            }

            if no_improvement >= PATIENCE && k > 3 {
                debug!(k, "early stop: no BIC improvement");
                break;
            }
        }

        debug!(k = selection.n_components, bic = ?selection.bic, "selected component count");
        selection
    }
}
