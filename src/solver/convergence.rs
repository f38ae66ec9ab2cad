//! Stopping rules.
//!
//! Criteria, in order:
//!
//! 1. `‖r‖₂ <= atol` → `resid_atol`
//! 2. `‖r‖₂ <= rtol·‖b‖₂` → `resid_rtol`
//! 3. `iteration >= maxiter` → `maxiter` (with a warning: the returned estimate
//!    satisfies no accuracy tolerance)
//!
//! The residual tests come first so that a solve which meets its tolerance on
//! the last permitted iteration is reported as converged rather than as
//! exhausted. Whenever the tolerances do not hold, the iteration cap takes
//! precedence exactly as if it were tested first.
//!
//! An uncertainty-based rule (posterior contraction) is not implemented.

use crate::domain::ConvergenceCriterion;

/// `(has_converged, criterion)` for the current iterate.
pub fn check_convergence(
    iteration: usize,
    maxiter: usize,
    residual_norm: f64,
    b_norm: f64,
    atol: f64,
    rtol: f64,
) -> (bool, ConvergenceCriterion) {
    if residual_norm <= atol {
        return (true, ConvergenceCriterion::ResidAtol);
    }
    if residual_norm <= rtol * b_norm {
        return (true, ConvergenceCriterion::ResidRtol);
    }
    if iteration >= maxiter {
        log::warn!(
            "Iteration terminated. Solver reached the maximum number of iterations ({maxiter}) with residual norm {residual_norm:.3e}."
        );
        return (true, ConvergenceCriterion::Maxiter);
    }
    (false, ConvergenceCriterion::None)
}
