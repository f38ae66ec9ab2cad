//! Gaussian process regression with a squared-exponential kernel and a linear
//! mean function.
//!
//! Model:
//!
//! ```text
//! y(x) = a·x + f(x) + ε,   f ~ GP(0, σ²·exp(-(x - x')² / (2ℓ²))),   ε ~ N(0, σₙ²)
//! ```
//!
//! Hyperparameters `(ℓ, σ², σₙ²)` are chosen by maximizing the log marginal
//! likelihood over a deterministic log-spaced grid. For a fixed kernel the slope
//! `a` has a closed-form generalized least-squares estimate, so it is profiled
//! out instead of searched.
//!
//! Why grid search?
//! - The likelihood surface over the lengthscale is often multimodal for the
//!   short, noisy series the calibrator feeds in.
//! - It is deterministic given the same inputs.
//! - Grids are small; candidates are evaluated in parallel.

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use rayon::prelude::*;

use super::Regressor;
use crate::error::{Result, SolverError};
use crate::math::{log_space, product3};

/// Variance floor added to the kernel diagonal.
const JITTER: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpHyperparams {
    pub lengthscale: f64,
    pub signal_variance: f64,
    pub noise_variance: f64,
}

impl Default for GpHyperparams {
    fn default() -> Self {
        Self {
            lengthscale: 1.0,
            signal_variance: 1.0,
            noise_variance: 1.0,
        }
    }
}

/// Search grid for hyperparameter selection.
///
/// Variance bounds are relative to the sample variance of the targets.
#[derive(Debug, Clone)]
pub struct GpSearch {
    pub lengthscale_steps: usize,
    pub variance_steps: usize,
    pub noise_steps: usize,
    pub min_relative_noise: f64,
}

impl Default for GpSearch {
    fn default() -> Self {
        Self {
            lengthscale_steps: 12,
            variance_steps: 9,
            noise_steps: 9,
            min_relative_noise: 1e-6,
        }
    }
}

#[derive(Debug, Clone)]
struct FittedGp {
    hyper: GpHyperparams,
    slope: f64,
    train_x: Vec<f64>,
    alpha: DVector<f64>,
    log_marginal_likelihood: f64,
}

#[derive(Debug, Clone)]
pub struct GaussianProcess {
    initial: GpHyperparams,
    search: Option<GpSearch>,
    fitted: Option<FittedGp>,
}

impl Default for GaussianProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianProcess {
    /// GP with hyperparameters selected by grid search on `fit`.
    pub fn new() -> Self {
        Self {
            initial: GpHyperparams::default(),
            search: Some(GpSearch::default()),
            fitted: None,
        }
    }

    /// GP with fixed hyperparameters (only the mean slope is estimated).
    pub fn with_hyperparams(hyper: GpHyperparams) -> Self {
        Self {
            initial: hyper,
            search: None,
            fitted: None,
        }
    }

    /// Hyperparameters of the last fit.
    pub fn hyperparams(&self) -> Option<GpHyperparams> {
        self.fitted.as_ref().map(|f| f.hyper)
    }

    /// Slope of the linear mean function from the last fit.
    pub fn slope(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.slope)
    }

    fn candidates(&self, ys: &[f64]) -> Result<Vec<GpHyperparams>> {
        let Some(search) = &self.search else {
            return Ok(vec![self.initial]);
        };

        let n = ys.len() as f64;
        let mean = ys.iter().sum::<f64>() / n;
        let var = (ys.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / n).max(1e-12);

        let lengthscales = log_space(0.5, (4.0 * n).max(2.0), search.lengthscale_steps)?;
        let variances = log_space(1e-2 * var, 1e2 * var, search.variance_steps)?;
        let noises = log_space(search.min_relative_noise * var, var, search.noise_steps)?;

        let mut out: Vec<GpHyperparams> = product3(&lengthscales, &variances, &noises)
            .into_iter()
            .map(|[l, s, e]| GpHyperparams {
                lengthscale: l,
                signal_variance: s,
                noise_variance: e,
            })
            .collect();
        // The starting point always competes, so the search can only improve on it.
        out.insert(0, self.initial);
        Ok(out)
    }
}

impl Regressor for GaussianProcess {
    fn fit(&mut self, xs: &[f64], ys: &[f64]) -> Result<()> {
        if xs.is_empty() || xs.len() != ys.len() {
            return Err(SolverError::Regression(format!(
                "need matching non-empty inputs, got {} inputs and {} targets",
                xs.len(),
                ys.len()
            )));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(SolverError::Regression("non-finite training data".to_string()));
        }

        let candidates = self.candidates(ys)?;

        let fits: Vec<(usize, FittedGp)> = candidates
            .par_iter()
            .enumerate()
            .filter_map(|(idx, hyper)| fit_candidate(*hyper, xs, ys).map(|f| (idx, f)))
            .collect();

        // Deterministic selection: maximum likelihood, ties broken by grid index.
        let best = fits
            .into_iter()
            .reduce(|best, c| {
                let better = c.1.log_marginal_likelihood > best.1.log_marginal_likelihood
                    || (c.1.log_marginal_likelihood == best.1.log_marginal_likelihood && c.0 < best.0);
                if better { c } else { best }
            })
            .ok_or_else(|| SolverError::Regression("no hyperparameter candidate gave a finite likelihood".to_string()))?;

        log::debug!(
            "GP fit: lengthscale={:.3e} signal_var={:.3e} noise_var={:.3e} slope={:.3e} logml={:.4}",
            best.1.hyper.lengthscale,
            best.1.hyper.signal_variance,
            best.1.hyper.noise_variance,
            best.1.slope,
            best.1.log_marginal_likelihood
        );
        self.fitted = Some(best.1);
        Ok(())
    }

    fn predict(&self, xs: &[f64]) -> Result<Vec<f64>> {
        let Some(fitted) = &self.fitted else {
            return Err(SolverError::Regression("predict called before fit".to_string()));
        };
        let out = xs
            .iter()
            .map(|&x| {
                let k_star: f64 = fitted
                    .train_x
                    .iter()
                    .zip(fitted.alpha.iter())
                    .map(|(&xi, &ai)| rbf(x, xi, &fitted.hyper) * ai)
                    .sum();
                fitted.slope * x + k_star
            })
            .collect();
        Ok(out)
    }
}

fn rbf(x: f64, y: f64, hyper: &GpHyperparams) -> f64 {
    let d = x - y;
    hyper.signal_variance * (-(d * d) / (2.0 * hyper.lengthscale * hyper.lengthscale)).exp()
}

fn kernel_matrix(xs: &[f64], hyper: &GpHyperparams) -> DMatrix<f64> {
    let n = xs.len();
    let mut k = DMatrix::from_fn(n, n, |i, j| rbf(xs[i], xs[j], hyper));
    for i in 0..n {
        k[(i, i)] += hyper.noise_variance + JITTER;
    }
    k
}

fn fit_candidate(hyper: GpHyperparams, xs: &[f64], ys: &[f64]) -> Option<FittedGp> {
    let n = xs.len();
    let chol: Cholesky<f64, Dyn> = kernel_matrix(xs, &hyper).cholesky()?;

    let x = DVector::from_column_slice(xs);
    let y = DVector::from_column_slice(ys);

    // GLS slope of the linear mean: a = (xᵗK⁻¹y) / (xᵗK⁻¹x).
    let kinv_x = chol.solve(&x);
    let denom = x.dot(&kinv_x);
    let slope = if denom > f64::EPSILON { kinv_x.dot(&y) / denom } else { 0.0 };

    let r = &y - &x * slope;
    let alpha = chol.solve(&r);
    let log_det: f64 = chol.l().diagonal().iter().map(|d| d.ln()).sum();
    let log_ml =
        -0.5 * r.dot(&alpha) - log_det - 0.5 * n as f64 * (2.0 * std::f64::consts::PI).ln();

    if !(log_ml.is_finite() && slope.is_finite()) {
        return None;
    }

    Some(FittedGp {
        hyper,
        slope,
        train_x: xs.to_vec(),
        alpha,
        log_marginal_likelihood: log_ml,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_smooth_signal_with_small_noise() {
        let xs: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 0.3 * x + (0.5 * x).sin()).collect();

        let mut gp = GaussianProcess::new();
        gp.fit(&xs, &ys).unwrap();
        let pred = gp.predict(&xs).unwrap();
        for (p, y) in pred.iter().zip(&ys) {
            assert!((p - y).abs() < 0.15, "pred {p} vs {y}");
        }
        assert!(gp.hyperparams().is_some());
    }

    #[test]
    fn extrapolation_follows_linear_mean() {
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| -0.2 * x).collect();

        let mut gp = GaussianProcess::with_hyperparams(GpHyperparams {
            lengthscale: 1.0,
            signal_variance: 1e-4,
            noise_variance: 1e-6,
        });
        gp.fit(&xs, &ys).unwrap();
        assert!((gp.slope().unwrap() + 0.2).abs() < 1e-6);

        let far = gp.predict(&[100.0]).unwrap();
        assert!((far[0] + 20.0).abs() < 1e-3, "far prediction {}", far[0]);
    }

    #[test]
    fn fit_is_deterministic() {
        let xs: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let ys = [0.1, -0.3, 0.2, 0.05, -0.1, 0.4, 0.0, -0.2];

        let mut a = GaussianProcess::new();
        let mut b = GaussianProcess::new();
        a.fit(&xs, &ys).unwrap();
        b.fit(&xs, &ys).unwrap();
        assert_eq!(a.hyperparams(), b.hyperparams());
        assert_eq!(a.predict(&[20.0]).unwrap(), b.predict(&[20.0]).unwrap());
    }

    #[test]
    fn rejects_bad_inputs() {
        let mut gp = GaussianProcess::new();
        assert!(gp.fit(&[], &[]).is_err());
        assert!(gp.fit(&[1.0, 2.0], &[1.0]).is_err());
        assert!(gp.fit(&[1.0, f64::NAN], &[1.0, 2.0]).is_err());
        assert!(GaussianProcess::new().predict(&[1.0]).is_err());
    }
}
