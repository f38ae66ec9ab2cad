use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{Result, SolverError};
use crate::linops::{Operator, SymmetricKronecker};
use crate::math::psd_sqrt;

/// Normal distribution over symmetric `n×n` matrices, `N(M, W ⊗ₛ W)`.
#[derive(Debug, Clone)]
pub struct MatrixNormal {
    mean: Operator,
    cov: SymmetricKronecker,
}

impl MatrixNormal {
    pub fn new(mean: Operator, cov_factor: Operator) -> Result<Self> {
        if !mean.is_square() {
            return Err(SolverError::shape("matrix normal mean", (mean.dim(), mean.dim()), mean.shape()));
        }
        if cov_factor.shape() != mean.shape() {
            return Err(SolverError::shape(
                "matrix normal covariance factor",
                mean.shape(),
                cov_factor.shape(),
            ));
        }
        Ok(Self {
            mean,
            cov: SymmetricKronecker::new(cov_factor),
        })
    }

    pub fn mean(&self) -> &Operator {
        &self.mean
    }

    pub fn cov(&self) -> &SymmetricKronecker {
        &self.cov
    }

    /// The Kronecker factor `W` of the covariance.
    pub fn cov_factor(&self) -> &Operator {
        self.cov.factor()
    }

    pub fn dim(&self) -> usize {
        self.mean.dim()
    }

    /// Draw `count` dense samples `M + sym(L·Z·L)` with `L = W^{1/2}`, `Z` iid standard normal.
    ///
    /// Materializes `n×n` matrices; intended for small problems and diagnostics.
    pub fn sample<R: Rng>(&self, rng: &mut R, count: usize) -> Vec<DMatrix<f64>> {
        let n = self.dim();
        let mean = self.mean.to_dense();
        let root = psd_sqrt(&self.cov.factor().to_dense());
        (0..count)
            .map(|_| {
                let z = DMatrix::<f64>::from_fn(n, n, |_, _| rng.sample(StandardNormal));
                let m = &root * z * &root;
                &mean + (&m + m.transpose()) * 0.5
            })
            .collect()
    }
}

/// Normal distribution over vectors, `N(μ, Σ)` with `Σ` given as an operator.
#[derive(Debug, Clone)]
pub struct VectorNormal {
    mean: DVector<f64>,
    cov: Operator,
}

impl VectorNormal {
    pub fn new(mean: DVector<f64>, cov: Operator) -> Result<Self> {
        let n = mean.len();
        if cov.shape() != (n, n) {
            return Err(SolverError::shape("vector normal covariance", (n, n), cov.shape()));
        }
        Ok(Self { mean, cov })
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    pub fn cov(&self) -> &Operator {
        &self.cov
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Marginal variances, computed one unit vector at a time.
    pub fn var(&self) -> DVector<f64> {
        let n = self.dim();
        let mut out = DVector::zeros(n);
        let mut e = DVector::zeros(n);
        for i in 0..n {
            e[i] = 1.0;
            out[i] = self.cov.matvec(&e)[i];
            e[i] = 0.0;
        }
        out
    }

    /// Marginal standard deviations; round-off negatives are reported as zero.
    pub fn std(&self) -> DVector<f64> {
        self.var().map(|v| v.max(0.0).sqrt())
    }

    /// Trace of the covariance.
    pub fn trace_cov(&self) -> f64 {
        self.var().sum()
    }

    /// Draw `count` samples via a PSD square root of the dense covariance.
    pub fn sample<R: Rng>(&self, rng: &mut R, count: usize) -> Vec<DVector<f64>> {
        let n = self.dim();
        let root = psd_sqrt(&self.cov.to_dense());
        (0..count)
            .map(|_| {
                let z = DVector::<f64>::from_fn(n, |_, _| rng.sample(StandardNormal));
                &self.mean + &root * z
            })
            .collect()
    }
}
