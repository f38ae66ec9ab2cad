//! Probabilistic linear solver.
//!
//! Pipeline per solve:
//!
//! - start from a [`Prior`] over `A` and `A⁻¹`
//! - iterate: direction from the inverse belief, one true matvec, rank-2 update
//! - stop on [`check_convergence`]
//! - optionally calibrate the unexplored subspace ([`calibrate_uncertainty`])
//! - emit distributions over `x`, `A`, `A⁻¹` ([`build_posterior`]) and a [`SolverInfo`]

use crate::domain::{LinearSystem, SolverConfig, SolverInfo, SolverKind};
use crate::error::Result;
use crate::prob::{MatrixNormal, VectorNormal};
use crate::regression::GaussianProcess;

pub mod archive;
pub mod belief;
pub mod calibrate;
pub mod convergence;
pub mod general;
pub mod posterior;
pub mod symmetric;
pub mod update;

pub use archive::*;
pub use belief::*;
pub use calibrate::*;
pub use convergence::*;
pub use general::*;
pub use posterior::*;
pub use symmetric::*;

/// Everything a solve returns.
#[derive(Debug, Clone)]
pub struct Solution {
    pub x: VectorNormal,
    pub a: MatrixNormal,
    pub ainv: MatrixNormal,
    pub info: SolverInfo,
}

/// Solve `A·x = b` with the requested solver variant.
pub fn problinsolve(system: LinearSystem, prior: Prior, kind: SolverKind, config: &SolverConfig) -> Result<Solution> {
    problinsolve_with_callback(system, prior, kind, config, None)
}

/// [`problinsolve`] with an optional per-iteration observer.
///
/// The general variant fails before any iteration, so the observer is never called for it.
pub fn problinsolve_with_callback(
    system: LinearSystem,
    prior: Prior,
    kind: SolverKind,
    config: &SolverConfig,
    callback: Option<&mut Callback<'_>>,
) -> Result<Solution> {
    match kind {
        SolverKind::Symmetric => {
            let mut regressor = GaussianProcess::new();
            SymmetricSolver::new(system, prior)?.solve_with_regressor(config, &mut regressor, callback)
        }
        SolverKind::General => GeneralSolver::new(&system)?.solve(config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverError;
    use nalgebra::{DMatrix, DVector};

    fn system() -> LinearSystem {
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        LinearSystem::from_dense(a, DVector::from_row_slice(&[1.0, 2.0])).unwrap()
    }

    #[test]
    fn dispatches_to_symmetric() {
        let sol = problinsolve(system(), Prior::identity(2), SolverKind::Symmetric, &SolverConfig::default()).unwrap();
        assert!((sol.x.mean()[0] - 1.0 / 11.0).abs() < 1e-6);
    }

    #[test]
    fn callback_sees_every_iteration() {
        let mut seen = Vec::new();
        let mut observe = |snap: &IterationSnapshot<'_>| {
            seen.push(snap.iteration);
            std::ops::ControlFlow::Continue(())
        };
        let callback: &mut Callback<'_> = &mut observe;
        let sol = problinsolve_with_callback(
            system(),
            Prior::identity(2),
            SolverKind::Symmetric,
            &SolverConfig::default(),
            Some(callback),
        )
        .unwrap();
        assert_eq!(seen, (1..=sol.info.iterations).collect::<Vec<_>>());
    }

    #[test]
    fn general_is_rejected() {
        let err = problinsolve(system(), Prior::identity(2), SolverKind::General, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::Unsupported(_)));
    }
}
