//! Gaussian Mixture Model fitted by Expectation-Maximization.
//!
//! # The Probabilistic Model
//!
//! ```text
//! P(x) = Σₖ πₖ × N(x | μₖ, diag(σ²ₖ))
//! ```
//!
//! Covariances are diagonal. Embedding dimensions (hundreds to thousands)
//! usually exceed the number of units per level, so a full covariance would
//! be singular almost everywhere.
//!
//! # The EM Algorithm
//!
//! **E-step**: responsibilities
//! ```text
//! γₙₖ = πₖ N(xₙ | μₖ, σ²ₖ) / Σⱼ πⱼ N(xₙ | μⱼ, σ²ⱼ)
//! ```
//!
//! **M-step**: responsibility-weighted statistics
//! - Nₖ = Σₙ γₙₖ
//! - πₖ = Nₖ / N
//! - μₖ = Σₙ γₙₖ xₙ / Nₖ
//! - σ²ₖ = Σₙ γₙₖ (xₙ - μₖ)² / Nₖ + reg_covar
//!
//! Iteration stops once the total log-likelihood improves by less than
//! `tol`, or after `max_iter` rounds.
//!
//! # Failure Modes
//!
//! - **Local optima**: means are seeded k-means++ style, so results depend
//!   on the seed (and are reproducible for a fixed seed)
//! - **Collapsing components**: a component that owns (almost) no points
//!   keeps its previous mean and variance
//! - **Non-finite likelihood**: reported as [`Error::NumericalFailure`]

use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;

/// Gaussian Mixture Model estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct Gmm {
    /// Number of components (clusters).
    n_components: usize,
    /// Maximum EM iterations.
    max_iter: usize,
    /// Minimum log-likelihood improvement to keep iterating.
    tol: f64,
    /// Random seed.
    seed: Option<u64>,
    /// Regularization for covariance.
    reg_covar: f64,
}

/// A fitted mixture.
#[derive(Debug, Clone, PartialEq)]
pub struct GmmModel {
    means: Array2<f64>,
    variances: Array2<f64>,
    weights: Array1<f64>,
    log_likelihood: f64,
    n_iter: usize,
    converged: bool,
}

impl Gmm {
    /// Create a new GMM with default settings (8 components).
    pub fn new() -> Self {
        Self {
            n_components: 8,
            max_iter: 100,
            tol: 1e-6,
            seed: None,
            reg_covar: 1e-6,
        }
    }

    /// Set number of components.
    pub fn with_n_components(mut self, n: usize) -> Self {
        self.n_components = n;
        self
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance on log-likelihood improvement.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the variance floor.
    pub fn with_reg_covar(mut self, reg_covar: f64) -> Self {
        self.reg_covar = reg_covar;
        self
    }

    /// Requested component count.
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Maximum EM iterations.
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Convergence tolerance.
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Seed, if fixed.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Variance floor.
    pub fn reg_covar(&self) -> f64 {
        self.reg_covar
    }

    /// Fit the mixture to `data`.
    pub fn fit<V: AsRef<[f32]>>(&self, data: &[V]) -> Result<GmmModel> {
        let data_arr = to_array(data)?;
        let (n, d) = data_arr.dim();
        let k = self.n_components.min(n);

        if k == 0 {
            return Err(Error::InvalidParameter {
                name: "n_components",
                message: "must be > 0",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be > 0",
            });
        }

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut means = init_means(&data_arr, k, &mut *rng);

        // Variances: per-dimension data variance
        let global_mean = data_arr.sum_axis(ndarray::Axis(0)) / n as f64;
        let mut global_var = Array1::from_elem(d, self.reg_covar);
        for row in data_arr.rows() {
            for j in 0..d {
                let diff = row[j] - global_mean[j];
                global_var[j] += diff * diff / n as f64;
            }
        }
        let mut variances = Array2::zeros((k, d));
        for mut row in variances.rows_mut() {
            row.assign(&global_var);
        }

        // Weights: uniform
        let mut weights = Array1::from_elem(k, 1.0 / k as f64);

        let mut resp = Array2::zeros((n, k));
        let mut prev_ll = f64::NEG_INFINITY;
        let mut log_likelihood = f64::NEG_INFINITY;
        let mut converged = false;
        let mut n_iter = 0;

        for iter in 0..self.max_iter {
            log_likelihood = e_step(&data_arr, &means, &variances, &weights, &mut resp)?;
            n_iter = iter + 1;

            if log_likelihood - prev_ll < self.tol {
                converged = true;
                break;
            }
            prev_ll = log_likelihood;

            self.m_step(&data_arr, &resp, &mut means, &mut variances, &mut weights);
        }

        if !converged {
            // Parameters moved after the last E-step; score the final state.
            log_likelihood = e_step(&data_arr, &means, &variances, &weights, &mut resp)?;
        }

        Ok(GmmModel {
            means,
            variances,
            weights,
            log_likelihood,
            n_iter,
            converged,
        })
    }

    fn m_step(
        &self,
        data: &Array2<f64>,
        resp: &Array2<f64>,
        means: &mut Array2<f64>,
        variances: &mut Array2<f64>,
        weights: &mut Array1<f64>,
    ) {
        let (n, d) = data.dim();
        let k = weights.len();

        for c in 0..k {
            let resp_c = resp.column(c);
            let nk = resp_c.sum() + 10.0 * f64::EPSILON;
            weights[c] = nk / n as f64;

            if nk <= 1e-10 {
                continue;
            }

            let mut mean = Array1::<f64>::zeros(d);
            for (i, row) in data.rows().into_iter().enumerate() {
                mean.scaled_add(resp_c[i], &row);
            }
            mean /= nk;

            let mut var = Array1::<f64>::zeros(d);
            for (i, row) in data.rows().into_iter().enumerate() {
                let r = resp_c[i];
                for j in 0..d {
                    let diff = row[j] - mean[j];
                    var[j] += r * diff * diff;
                }
            }
            var /= nk;
            var += self.reg_covar;

            means.row_mut(c).assign(&mean);
            variances.row_mut(c).assign(&var);
        }

        let total = weights.sum();
        if total > 0.0 {
            *weights /= total;
        }
    }
}

impl Default for Gmm {
    fn default() -> Self {
        Self::new()
    }
}

impl GmmModel {
    /// Number of fitted components.
    pub fn n_components(&self) -> usize {
        self.weights.len()
    }

    /// Dimension of the fitted data.
    pub fn dim(&self) -> usize {
        self.means.ncols()
    }

    /// Total log-likelihood of the training data under the final parameters.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// EM iterations run.
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Whether EM stopped on the tolerance rather than the iteration cap.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Mixture weights.
    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    /// Bayesian Information Criterion for `n_samples` training points.
    pub fn bic(&self, n_samples: usize) -> f64 {
        bic(self.log_likelihood, self.n_components(), self.dim(), n_samples)
    }

    /// Responsibilities: entry `[i][k]` is P(component k | point i).
    pub fn predict_proba<V: AsRef<[f32]>>(&self, data: &[V]) -> Result<Vec<Vec<f64>>> {
        let data_arr = to_array(data)?;
        if data_arr.ncols() != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                found: data_arr.ncols(),
            });
        }
        let mut resp = Array2::zeros((data_arr.nrows(), self.n_components()));
        e_step(
            &data_arr,
            &self.means,
            &self.variances,
            &self.weights,
            &mut resp,
        )?;
        Ok(resp.rows().into_iter().map(|row| row.to_vec()).collect())
    }

    /// Hard assignment: most probable component per point.
    pub fn predict<V: AsRef<[f32]>>(&self, data: &[V]) -> Result<Vec<usize>> {
        Ok(self
            .predict_proba(data)?
            .iter()
            .map(|row| argmax(row).0)
            .collect())
    }
}

/// BIC as used for model-order selection:
///
/// ```text
/// BIC(k) = -2 × log L + k × (d + 1) × ln N
/// ```
pub fn bic(log_likelihood: f64, k: usize, dim: usize, n_samples: usize) -> f64 {
    let n_params = (k * (dim + 1)) as f64;
    -2.0 * log_likelihood + n_params * (n_samples as f64).ln()
}

/// Index and value of the largest entry (first wins on ties).
pub(crate) fn argmax(row: &[f64]) -> (usize, f64) {
    row.iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, p)| {
            if p > best.1 {
                (i, p)
            } else {
                best
            }
        })
}

/// k-means++ seeding: the first mean is a random point, each further mean a
/// point drawn with probability proportional to its squared distance from
/// the nearest mean already chosen.
fn init_means(data: &Array2<f64>, k: usize, rng: &mut dyn RngCore) -> Array2<f64> {
    let (n, d) = data.dim();
    let mut means = Array2::zeros((k, d));

    let first = rng.random_range(0..n);
    means.row_mut(0).assign(&data.row(first));

    for c in 1..k {
        let distances: Vec<f64> = data
            .rows()
            .into_iter()
            .map(|point| {
                (0..c)
                    .map(|m| {
                        point
                            .iter()
                            .zip(means.row(m).iter())
                            .map(|(a, b)| (a - b).powi(2))
                            .sum::<f64>()
                    })
                    .fold(f64::MAX, f64::min)
            })
            .collect();

        let total: f64 = distances.iter().sum();
        if total == 0.0 {
            let idx = rng.random_range(0..n);
            means.row_mut(c).assign(&data.row(idx));
            continue;
        }

        let threshold = rng.random::<f64>() * total;
        let mut cumsum = 0.0;
        let mut selected = n - 1;
        for (j, &dist) in distances.iter().enumerate() {
            cumsum += dist;
            if cumsum >= threshold {
                selected = j;
                break;
            }
        }
        means.row_mut(c).assign(&data.row(selected));
    }

    means
}

fn to_array<V: AsRef<[f32]>>(data: &[V]) -> Result<Array2<f64>> {
    let Some(first) = data.first() else {
        return Err(Error::EmptyInput);
    };
    let n = data.len();
    let d = first.as_ref().len();
    if d == 0 {
        return Err(Error::InvalidParameter {
            name: "data",
            message: "vectors must have at least one dimension",
        });
    }

    let mut flat: Vec<f64> = Vec::with_capacity(n * d);
    for point in data {
        let point = point.as_ref();
        if point.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: point.len(),
            });
        }
        flat.extend(point.iter().map(|&x| f64::from(x)));
    }
    Array2::from_shape_vec((n, d), flat).map_err(|e| Error::InvalidInput(e.to_string()))
}

/// Fill `resp` and return the total log-likelihood.
fn e_step(
    data: &Array2<f64>,
    means: &Array2<f64>,
    variances: &Array2<f64>,
    weights: &Array1<f64>,
    resp: &mut Array2<f64>,
) -> Result<f64> {
    let k = weights.len();
    let mut total = 0.0;
    let mut log_probs = vec![0.0; k];

    for (i, point) in data.rows().into_iter().enumerate() {
        for c in 0..k {
            log_probs[c] =
                weights[c].ln() + log_gaussian(&point, &means.row(c), &variances.row(c));
        }
        let log_sum = logsumexp(&log_probs);
        if !log_sum.is_finite() {
            return Err(Error::NumericalFailure(format!(
                "non-finite likelihood for point {i}"
            )));
        }
        for c in 0..k {
            resp[[i, c]] = (log_probs[c] - log_sum).exp();
        }
        total += log_sum;
    }

    Ok(total)
}

/// Log-density of a point under a diagonal Gaussian.
fn log_gaussian(
    point: &ArrayView1<'_, f64>,
    mean: &ArrayView1<'_, f64>,
    var: &ArrayView1<'_, f64>,
) -> f64 {
    let d = point.len() as f64;
    let mut log_prob = -0.5 * d * (2.0 * std::f64::consts::PI).ln();

    for i in 0..point.len() {
        let diff = point[i] - mean[i];
        log_prob -= 0.5 * var[i].ln();
        log_prob -= 0.5 * diff * diff / var[i];
    }

    log_prob
}

/// Log-sum-exp for numerical stability.
fn logsumexp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    let max_val = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max_val.is_infinite() {
        return max_val;
    }
    max_val
        + values
            .iter()
            .map(|&v| (v - max_val).exp())
            .sum::<f64>()
            .ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![0.0, 0.2],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
            vec![10.0, 10.2],
        ]
    }

    #[test]
    fn test_gmm_basic() {
        let data = two_blobs();
        let labels = Gmm::new()
            .with_n_components(2)
            .with_seed(42)
            .fit(&data)
            .and_then(|m| m.predict(&data))
            .unwrap();

        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_gmm_soft_assignments_sum_to_one() {
        let data = vec![vec![0.0, 0.0], vec![5.0, 5.0], vec![10.0, 10.0]];
        let probs = Gmm::new()
            .with_n_components(2)
            .with_seed(42)
            .fit(&data)
            .and_then(|m| m.predict_proba(&data))
            .unwrap();

        for row in &probs {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_gmm_deterministic_with_seed() {
        let data = two_blobs();
        let a = Gmm::new().with_n_components(2).with_seed(7).fit(&data).unwrap();
        let b = Gmm::new().with_n_components(2).with_seed(7).fit(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_gmm_converges_on_separated_data() {
        let model = Gmm::new()
            .with_n_components(2)
            .with_seed(1)
            .fit(&two_blobs())
            .unwrap();
        assert!(model.converged());
        assert!(model.n_iter() < 100);
        assert!(model.log_likelihood().is_finite());
    }

    #[test]
    fn test_identical_points_single_component_wins_bic() {
        let data = vec![vec![0.5f32, -0.25, 1.0]; 10];
        let one = Gmm::new().with_n_components(1).with_seed(3).fit(&data).unwrap();
        let two = Gmm::new().with_n_components(2).with_seed(3).fit(&data).unwrap();
        assert!(one.bic(data.len()) < two.bic(data.len()));
    }

    #[test]
    fn test_components_capped_by_points() {
        let data = vec![vec![0.0], vec![1.0]];
        let model = Gmm::new().with_n_components(5).with_seed(0).fit(&data).unwrap();
        assert_eq!(model.n_components(), 2);
    }

    #[test]
    fn test_bic_formula() {
        // -2 × (-10) + 2 × (3 + 1) × ln(8)
        let expected = 20.0 + 8.0 * 8f64.ln();
        assert!((bic(-10.0, 2, 3, 8) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_empty_and_ragged_input() {
        let empty: Vec<Vec<f32>> = vec![];
        assert_eq!(Gmm::new().fit(&empty), Err(Error::EmptyInput));

        let ragged = vec![vec![0.0, 1.0], vec![0.0]];
        assert_eq!(
            Gmm::new().fit(&ragged),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_predict_rejects_wrong_dimension() {
        let model = Gmm::new()
            .with_n_components(1)
            .with_seed(0)
            .fit(&two_blobs())
            .unwrap();
        assert!(model.predict(&[vec![1.0, 2.0, 3.0]]).is_err());
    }
}
