//! Uncertainty calibration for the unexplored subspace.
//!
//! After `k` iterations the solver has observed `A` only along `span(S)`. The
//! Rayleigh quotients `R_i = sᵢᵗAsᵢ / sᵢᵗsᵢ` seen so far are extrapolated to the
//! remaining `n − k` directions:
//!
//! 1. `logR_i = log(sᵢᵗyᵢ) − log(sᵢᵗsᵢ)` for each iteration `i`
//! 2. OLS line `logR ≈ β0 + β1·i`
//! 3. regress `logR − β0` over `i` (linear mean + smooth kernel), predict at `i = k..n`
//! 4. `R_pred = exp(prediction + β0)`, `Phi = mean(R_pred)·I`, `Psi = mean(1/R_pred)·I`
//!
//! The regression mean is linear in `i`, so far from the observed iterations
//! the prediction follows the trend without bound and `Phi` or `Psi` can become
//! astronomically large. The scales are still returned; `Phi·Psi` (which is 1
//! for a constant prediction) is checked against [`MAX_SCALE_SPREAD`] and a
//! warning is logged past it.

use crate::error::Result;
use crate::linops::Operator;
use crate::math::fit_line;
use crate::regression::Regressor;

use super::archive::IterationArchive;

/// Calibration only runs with more than this many iterations.
pub const MIN_CALIBRATION_ITERS: usize = 5;

/// `Phi·Psi` above which the extrapolated quotients are reported as unreliable.
pub const MAX_SCALE_SPREAD: f64 = 1e12;

/// Uncertainty scales assigned to the unexplored subspace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Scale for the covariance factor of `A`.
    pub phi: f64,
    /// Scale for the covariance factor of `A⁻¹`.
    pub psi: f64,
}

impl Calibration {
    pub fn phi_operator(&self, n: usize) -> Operator {
        Operator::scalar(n, self.phi)
    }

    pub fn psi_operator(&self, n: usize) -> Operator {
        Operator::scalar(n, self.psi)
    }
}

/// Returns `None` ("no correction") when too few iterations ran, when no
/// directions are left unexplored, or when a Rayleigh quotient is not positive
/// (indefinite `A`).
pub fn calibrate_uncertainty(
    archive: &IterationArchive,
    n: usize,
    regressor: &mut dyn Regressor,
) -> Result<Option<Calibration>> {
    let k = archive.len();
    if k <= MIN_CALIBRATION_ITERS {
        log::debug!("calibration skipped: {k} iterations <= {MIN_CALIBRATION_ITERS}");
        return Ok(None);
    }
    if k >= n {
        log::debug!("calibration skipped: all {n} directions explored");
        return Ok(None);
    }

    let log_r = archive.log_rayleigh_quotients();
    if log_r.iter().any(|v| !v.is_finite()) {
        log::warn!("calibration skipped: non-positive curvature s'As observed, Rayleigh quotient has no logarithm");
        return Ok(None);
    }

    let iters: Vec<f64> = (0..k).map(|i| i as f64).collect();
    let Some((beta0, beta1)) = fit_line(&iters, &log_r) else {
        log::warn!("calibration skipped: degenerate log-Rayleigh regression");
        return Ok(None);
    };
    log::debug!("log-Rayleigh trend: beta0={beta0:.4} beta1={beta1:.4}");

    let targets: Vec<f64> = log_r.iter().map(|r| r - beta0).collect();
    regressor.fit(&iters, &targets)?;

    let remaining: Vec<f64> = (k..n).map(|i| i as f64).collect();
    let predicted = regressor.predict(&remaining)?;

    let r_pred: Vec<f64> = predicted.iter().map(|p| (p + beta0).exp()).collect();
    let m = r_pred.len() as f64;
    let phi = r_pred.iter().sum::<f64>() / m;
    let psi = r_pred.iter().map(|r| 1.0 / r).sum::<f64>() / m;

    if !(phi.is_finite() && psi.is_finite() && phi > 0.0 && psi > 0.0) {
        log::warn!("calibration skipped: non-finite predicted scales phi={phi:e} psi={psi:e}");
        return Ok(None);
    }

    if phi * psi > MAX_SCALE_SPREAD {
        log::warn!(
            "calibration extrapolated Rayleigh quotients spanning many orders of magnitude \
             (phi={phi:.3e}, psi={psi:.3e}); uncertainty in the unexplored subspace is unreliable"
        );
    }
    log::info!("calibrated unexplored-subspace scales: phi={phi:.4e} psi={psi:.4e}");
    Ok(Some(Calibration { phi, psi }))
}
