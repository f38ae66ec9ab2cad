//! Output distributions for `x`, `A`, and `A⁻¹`.
//!
//! With an optional calibration, the covariance factors gain a correction that
//! lives only in the unexplored subspace:
//!
//! ```text
//! W_A ← W_A + P_S·Phi·P_S,   P_S = I − S(SᵗS)⁻¹Sᵗ
//! W_H ← W_H + P_Y·Psi·P_Y,   P_Y = I − Y(YᵗY)⁻¹Yᵗ
//! ```
//!
//! The belief over `x = H·b` is induced analytically:
//!
//! ```text
//! Cov(x)·v = ½ · ((bᵗW_H b)·W_H v + W_H b·(bᵗW_H v))
//! ```

use nalgebra::{DMatrix, DVector};

use crate::error::Result;
use crate::linops::{ComplementProjector, Congruence, LinearOperator, Operator};
use crate::prob::{MatrixNormal, VectorNormal};

use super::archive::IterationArchive;
use super::belief::BeliefState;
use super::calibrate::Calibration;

/// The three output beliefs.
#[derive(Debug, Clone)]
pub struct Posterior {
    pub x: VectorNormal,
    pub a: MatrixNormal,
    pub ainv: MatrixNormal,
}

/// Covariance of `x` induced by `Cov(H) = W ⊗ₛ W` and a fixed `b`.
#[derive(Debug, Clone)]
pub struct InducedSolutionCov {
    factor: Operator,
    wb: DVector<f64>,
    bwb: f64,
}

impl InducedSolutionCov {
    pub fn new(factor: Operator, b: &DVector<f64>) -> Self {
        let wb = factor.matvec(b);
        let bwb = wb.dot(b);
        Self { factor, wb, bwb }
    }
}

impl LinearOperator for InducedSolutionCov {
    fn shape(&self) -> (usize, usize) {
        self.factor.shape()
    }

    fn matvec(&self, v: &DVector<f64>) -> DVector<f64> {
        (self.factor.matvec(v) * self.bwb + &self.wb * self.wb.dot(v)) * 0.5
    }

    fn matmat(&self, v: &DMatrix<f64>) -> DMatrix<f64> {
        let coeffs = self.wb.tr_mul(v);
        (self.factor.matmat(v) * self.bwb + &self.wb * coeffs) * 0.5
    }
}

/// `W + P·(c·I)·P` with `P` projecting out the columns of `basis`.
fn with_unexplored_scale(covfactor: &Operator, basis: &DMatrix<f64>, scale: Operator) -> Result<Operator> {
    let projector = Operator::new(ComplementProjector::from_columns(basis));
    let correction = Operator::new(Congruence::new(projector, scale));
    covfactor.try_add(&correction)
}

/// Assemble immutable output distributions from the current belief.
pub fn build_posterior(
    belief: &BeliefState,
    archive: &IterationArchive,
    b: &DVector<f64>,
    calibration: Option<&Calibration>,
) -> Result<Posterior> {
    let n = b.len();

    let (a_covfactor, ainv_covfactor) = match calibration {
        Some(cal) => (
            with_unexplored_scale(belief.a_covfactor(), &archive.directions(n), cal.phi_operator(n))?,
            with_unexplored_scale(belief.ainv_covfactor(), &archive.observations(n), cal.psi_operator(n))?,
        ),
        None => (belief.a_covfactor().clone(), belief.ainv_covfactor().clone()),
    };

    let a = MatrixNormal::new(belief.a_mean().clone(), a_covfactor)?;
    let ainv = MatrixNormal::new(belief.ainv_mean().clone(), ainv_covfactor.clone())?;

    let x_cov = Operator::new(InducedSolutionCov::new(ainv_covfactor, b));
    let x = VectorNormal::new(belief.x.clone(), x_cov)?;

    Ok(Posterior { x, a, ainv })
}
