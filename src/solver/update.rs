//! Rank-2 belief updates.
//!
//! For a Gaussian belief `N(M, W ⊗ₛ W)` over a symmetric operator and a new
//! observation `o = X·d` (for the `A` side: `d = s`, `o = y`; for the `A⁻¹` side:
//! `d = y`, `o = s`), with
//!
//! ```text
//! Wd = W·d,   δ = o − M·d,   u = Wd / (dᵗWd),   v = δ − ½(dᵗδ)·u
//! ```
//!
//! the posterior is
//!
//! ```text
//! M ← M + u·vᵗ + v·uᵗ
//! W ← W − Wd·Wdᵗ / (dᵗWd)
//! ```
//!
//! The mean update is symmetric by form and makes `M·d = o` hold exactly.
//!
//! The covariance factor is never downdated by subtraction. It is kept as
//! `W = G·(I − QQᵗ)·G` with `G = W₀^{1/2}` the root of the prior factor and `Q`
//! an orthonormal basis of the explored part of `G·d`-space. Conditioning on `d`
//! appends the normalized component of `G·d` orthogonal to `Q`, which is exactly
//! the downdate above, but stays symmetric PSD with `W·d = 0` regardless of
//! round-off. `dᵗWd` is the squared norm of that component, so it cannot go
//! negative through cancellation.

use nalgebra::DVector;

use crate::error::{Result, SolverError};
use crate::linops::{ComplementProjector, Congruence, Operator};
use crate::math::psd_sqrt;

/// Smallest fraction of the prior variance `dᵗW₀d` that must remain unexplored
/// along `d` for an update to be accepted.
const MIN_UNEXPLORED_FRACTION: f64 = 1e-8;

/// Mean and covariance factor of one side of the belief.
#[derive(Debug, Clone)]
pub struct SideBelief {
    mean: Operator,
    covfactor: Operator,
    root: Operator,
    scale: f64,
    explored: ComplementProjector,
}

impl SideBelief {
    /// Start from a prior mean and a symmetric PSD covariance factor.
    pub fn new(mean: Operator, covfactor: Operator) -> Self {
        let n = covfactor.dim();
        let (root, scale) = match covfactor.inner().as_scalar() {
            Some(c) => (Operator::scalar(n, c.max(0.0).sqrt()), c.abs()),
            None => {
                let dense = covfactor.to_dense();
                (Operator::dense(psd_sqrt(&dense)), dense.norm())
            }
        };
        Self {
            mean,
            covfactor,
            root,
            scale,
            explored: ComplementProjector::identity(n),
        }
    }

    pub fn mean(&self) -> &Operator {
        &self.mean
    }

    pub fn covfactor(&self) -> &Operator {
        &self.covfactor
    }

    /// Number of directions the covariance has been conditioned on.
    pub fn explored_rank(&self) -> usize {
        self.explored.rank()
    }
}

/// Outcome of updating one side.
#[derive(Debug, Clone)]
pub enum SideUpdate {
    Updated(SideBelief),
    /// `d` lies (numerically) in the already explored subspace or the null
    /// space of the prior: it carries no information the belief does not
    /// already have, and the side is left unchanged.
    Degenerate { dwd: f64 },
}

/// Condition a side of the belief on `o = X·d`.
pub fn rank2_update(belief: &SideBelief, d: &DVector<f64>, o: &DVector<f64>) -> Result<SideUpdate> {
    let n = belief.mean.dim();
    if d.len() != n || o.len() != n {
        return Err(SolverError::shape("rank-2 update", (n, n), (d.len(), o.len())));
    }

    let gd = belief.root.matvec(d);
    let unexplored = belief.explored.project(&gd);
    let dwd = unexplored.norm_squared();
    let floor = f64::EPSILON * belief.scale * d.norm_squared();
    if !(dwd.is_finite() && dwd > MIN_UNEXPLORED_FRACTION * gd.norm_squared() && dwd > floor) {
        return Ok(SideUpdate::Degenerate { dwd });
    }

    let wd = belief.root.matvec(&unexplored);
    let delta = o - belief.mean.matvec(d);
    let u = &wd / dwd;
    let v = &delta - &u * (0.5 * d.dot(&delta));
    let mean = belief.mean.symmetric_rank2_update(&u, &v)?;

    let explored = belief.explored.with_direction(&(unexplored / dwd.sqrt()));
    let covfactor = Operator::new(Congruence::new(belief.root.clone(), Operator::new(explored.clone())));

    Ok(SideUpdate::Updated(SideBelief {
        mean,
        covfactor,
        root: belief.root.clone(),
        scale: belief.scale,
        explored,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    use crate::math::min_symmetric_eigenvalue;

    fn spd() -> DMatrix<f64> {
        DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.5, 1.0, 3.0, 0.2, 0.5, 0.2, 2.0])
    }

    #[test]
    fn mean_interpolates_all_observations() {
        let a = spd();
        let mut side = SideBelief::new(Operator::identity(3), Operator::identity(3));
        let dirs = [
            DVector::from_row_slice(&[1.0, 0.0, 0.0]),
            DVector::from_row_slice(&[0.3, 1.0, 0.0]),
        ];
        for d in &dirs {
            let o = &a * d;
            side = match rank2_update(&side, d, &o).unwrap() {
                SideUpdate::Updated(next) => next,
                SideUpdate::Degenerate { dwd } => panic!("unexpected degenerate step, dWd={dwd}"),
            };
        }
        for d in &dirs {
            assert_relative_eq!(side.mean().matvec(d), &a * d, epsilon = 1e-12);
        }
        let m = side.mean().to_dense();
        assert_relative_eq!(m.clone(), m.transpose(), epsilon = 1e-12);
    }

    #[test]
    fn covariance_stays_symmetric_psd_and_annihilates_direction() {
        let w0 = spd();
        let side = SideBelief::new(Operator::identity(3), Operator::dense(w0.clone()));
        let d = DVector::from_row_slice(&[1.0, -2.0, 0.5]);
        let o = DVector::from_row_slice(&[0.0, 1.0, 1.0]);
        let SideUpdate::Updated(next) = rank2_update(&side, &d, &o).unwrap() else {
            panic!("expected an update");
        };

        let w = next.covfactor().to_dense();
        assert_relative_eq!(w.clone(), w.transpose(), epsilon = 1e-12);
        assert!(min_symmetric_eigenvalue(&w) > -1e-12);
        assert_relative_eq!(next.covfactor().matvec(&d).norm(), 0.0, epsilon = 1e-12);

        // Same result as the explicit downdate.
        let wd = &w0 * &d;
        let expected = &w0 - &wd * wd.transpose() / d.dot(&wd);
        assert_relative_eq!(w, expected, epsilon = 1e-10);
    }

    #[test]
    fn direction_in_null_space_is_degenerate() {
        let side = SideBelief::new(
            Operator::identity(2),
            Operator::dense(DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0])),
        );
        let d = DVector::from_row_slice(&[0.0, 1.0]);
        let update = rank2_update(&side, &d, &d).unwrap();
        assert!(matches!(update, SideUpdate::Degenerate { .. }));
    }

    #[test]
    fn wrong_length_observation_is_a_shape_error() {
        let side = SideBelief::new(Operator::identity(3), Operator::identity(3));
        let d = DVector::from_row_slice(&[1.0, 0.0, 0.0]);
        let o = DVector::from_row_slice(&[1.0, 0.0]);
        let err = rank2_update(&side, &d, &o).unwrap_err();
        assert!(matches!(err, crate::error::SolverError::ShapeMismatch { .. }));
    }

    #[test]
    fn explored_direction_is_degenerate() {
        let side = SideBelief::new(Operator::identity(3), Operator::identity(3));
        let d = DVector::from_row_slice(&[1.0, 2.0, 0.0]);
        let SideUpdate::Updated(next) = rank2_update(&side, &d, &d).unwrap() else {
            panic!("expected an update");
        };
        assert_eq!(next.explored_rank(), 1);

        let again = &d * -3.0 + DVector::from_row_slice(&[0.0, 0.0, 1e-12]);
        let update = rank2_update(&next, &again, &again).unwrap();
        assert!(matches!(update, SideUpdate::Degenerate { .. }));
    }

    #[test]
    fn nearly_collinear_directions_keep_the_factor_psd() {
        let a = spd();
        let mut side = SideBelief::new(Operator::identity(3), Operator::scalar(3, 2.0));
        let dirs = [
            DVector::from_row_slice(&[1.0, 1.0, 1.0]),
            DVector::from_row_slice(&[1.0, 1.0 + 1e-3, 1.0]),
            DVector::from_row_slice(&[1.0, 1.0, 1.0 + 1e-3]),
        ];
        for d in &dirs {
            side = match rank2_update(&side, d, &(&a * d)).unwrap() {
                SideUpdate::Updated(next) => next,
                SideUpdate::Degenerate { dwd } => panic!("unexpected degenerate step, dWd={dwd}"),
            };
            let w = side.covfactor().to_dense();
            assert!(min_symmetric_eigenvalue(&w) > -1e-12);
        }
        // Three independent directions in 3-d explore everything.
        assert_relative_eq!(side.covfactor().to_dense().norm(), 0.0, epsilon = 1e-10);
        for d in &dirs {
            assert_relative_eq!(side.mean().matvec(d), &a * d, epsilon = 1e-8);
        }
    }
}
