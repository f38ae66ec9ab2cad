//! Least squares.
//!
//! The calibrator fits a straight line through the log-Rayleigh quotients of
//! the completed iterations:
//!
//! ```text
//! minimize Σ (logR_i - β0 - β1·i)^2
//! ```
//!
//! Implementation choices:
//! - We solve through SVD so a degenerate design (all inputs equal) is reported
//!   as `None` instead of producing non-finite coefficients.
//! - The problems are tiny (two columns), so SVD cost is irrelevant.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Ordinary least squares line `y ≈ β0 + β1·x`, returned as `(β0, β1)`.
///
/// Returns `None` for fewer than two points, mismatched lengths, or a
/// degenerate design.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len();
    let mut design = DMatrix::<f64>::zeros(n, 2);
    for (i, &x) in xs.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = x;
    }
    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let spread: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
    if spread <= f64::EPSILON * n as f64 {
        return None;
    }

    let beta = solve_least_squares(&design, &DVector::from_column_slice(ys))?;
    Some((beta[0], beta[1]))
}
