//! Mutable state of one in-flight solve.

use nalgebra::DVector;

use super::update::{SideBelief, SideUpdate, rank2_update};
use crate::error::{Result, SolverError};
use crate::linops::Operator;

/// Prior beliefs over `A` and `H = A⁻¹`.
///
/// Covariances are `W_A ⊗ₛ W_A` and `W_H ⊗ₛ W_H`; the covariance factors must
/// be symmetric positive semi-definite.
#[derive(Debug, Clone)]
pub struct Prior {
    pub a_mean: Operator,
    pub a_covfactor: Operator,
    pub ainv_mean: Operator,
    pub ainv_covfactor: Operator,
}

impl Prior {
    /// All four operators equal to the identity.
    pub fn identity(n: usize) -> Self {
        Self::from_scale(n, 1.0)
    }

    /// `A₀ = W_A = α·I` and `H₀ = W_H = α⁻¹·I`.
    pub fn scaled(n: usize, alpha: f64) -> Result<Self> {
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(SolverError::InvalidConfig(format!(
                "prior scale must be finite and positive, got {alpha}"
            )));
        }
        Ok(Self::from_scale(n, alpha))
    }

    fn from_scale(n: usize, alpha: f64) -> Self {
        Self {
            a_mean: Operator::scalar(n, alpha),
            a_covfactor: Operator::scalar(n, alpha),
            ainv_mean: Operator::scalar(n, 1.0 / alpha),
            ainv_covfactor: Operator::scalar(n, 1.0 / alpha),
        }
    }

    /// Every operator must be `n×n`.
    pub fn validate(&self, n: usize) -> Result<()> {
        let fields = [
            ("prior A mean", &self.a_mean),
            ("prior A covariance factor", &self.a_covfactor),
            ("prior A⁻¹ mean", &self.ainv_mean),
            ("prior A⁻¹ covariance factor", &self.ainv_covfactor),
        ];
        for (name, op) in fields {
            if op.shape() != (n, n) {
                return Err(SolverError::shape(name, (n, n), op.shape()));
            }
        }
        Ok(())
    }
}

/// Current means and covariance factors for `A` and `A⁻¹`, the solution
/// estimate, and its residual `A·x − b`.
#[derive(Debug, Clone)]
pub struct BeliefState {
    a: SideBelief,
    ainv: SideBelief,
    pub x: DVector<f64>,
    pub residual: DVector<f64>,
}

impl BeliefState {
    pub fn new(prior: &Prior, x: DVector<f64>, residual: DVector<f64>) -> Self {
        Self {
            a: SideBelief::new(prior.a_mean.clone(), prior.a_covfactor.clone()),
            ainv: SideBelief::new(prior.ainv_mean.clone(), prior.ainv_covfactor.clone()),
            x,
            residual,
        }
    }

    pub fn a_mean(&self) -> &Operator {
        self.a.mean()
    }

    pub fn a_covfactor(&self) -> &Operator {
        self.a.covfactor()
    }

    pub fn ainv_mean(&self) -> &Operator {
        self.ainv.mean()
    }

    pub fn ainv_covfactor(&self) -> &Operator {
        self.ainv.covfactor()
    }

    /// Condition both sides on the observed pair `y = A·s`.
    pub fn observe(&mut self, s: &DVector<f64>, y: &DVector<f64>, iteration: usize) -> Result<()> {
        match rank2_update(&self.a, s, y)? {
            SideUpdate::Updated(next) => self.a = next,
            SideUpdate::Degenerate { dwd } => {
                log::debug!(
                    "iteration {iteration}: skipped A update, s'W_A s = {dwd:e}, explored rank {}",
                    self.a.explored_rank()
                );
            }
        }
        match rank2_update(&self.ainv, y, s)? {
            SideUpdate::Updated(next) => self.ainv = next,
            SideUpdate::Degenerate { dwd } => {
                log::debug!(
                    "iteration {iteration}: skipped A^-1 update, y'W_H y = {dwd:e}, explored rank {}",
                    self.ainv.explored_rank()
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_prior_inverts_the_scale() {
        let prior = Prior::scaled(2, 4.0).unwrap();
        let e = DVector::from_row_slice(&[1.0, 0.0]);
        assert_eq!(prior.a_mean.matvec(&e)[0], 4.0);
        assert_eq!(prior.ainv_mean.matvec(&e)[0], 0.25);
        assert!(Prior::scaled(2, 0.0).is_err());
        assert!(Prior::scaled(2, f64::NAN).is_err());
    }

    #[test]
    fn validate_reports_the_offending_operator() {
        let mut prior = Prior::identity(3);
        prior.ainv_covfactor = Operator::identity(2);
        let err = prior.validate(3).unwrap_err();
        assert!(err.to_string().contains("A⁻¹ covariance factor"));
    }
}
