//! Square roots of symmetric positive semi-definite matrices.

use nalgebra::DMatrix;

/// Symmetric square root `L` with `L·L = M` for a PSD `M`.
///
/// `M` is symmetrized first; eigenvalues below zero (round-off on a PSD
/// matrix) are clamped to zero.
pub fn psd_sqrt(m: &DMatrix<f64>) -> DMatrix<f64> {
    let sym = (m + m.transpose()) * 0.5;
    let eig = sym.symmetric_eigen();
    let roots = eig.eigenvalues.map(|l| l.max(0.0).sqrt());
    let q = &eig.eigenvectors;
    q * DMatrix::from_diagonal(&roots) * q.transpose()
}

/// Smallest eigenvalue of the symmetric part of `M`.
pub fn min_symmetric_eigenvalue(m: &DMatrix<f64>) -> f64 {
    let sym = (m + m.transpose()) * 0.5;
    sym.symmetric_eigenvalues().min()
}
