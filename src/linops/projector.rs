//! Orthogonal projection onto the complement of a set of directions.

use nalgebra::{DMatrix, DVector};

use super::LinearOperator;

/// `I − Q·Qᵗ` where the columns of `Q` are an orthonormal basis of `span(S)`.
///
/// Equivalent to `I − S(SᵗS)⁻¹Sᵗ`, but built from a thin QR factorization so
/// nearly collinear directions do not require inverting an ill-conditioned Gram
/// matrix.
#[derive(Debug, Clone)]
pub struct ComplementProjector {
    dim: usize,
    basis: DMatrix<f64>,
}

impl ComplementProjector {
    /// `directions` is `n×k`, one direction per column. `k = 0` gives the identity.
    pub fn from_columns(directions: &DMatrix<f64>) -> Self {
        let dim = directions.nrows();
        let k = directions.ncols();
        if k == 0 {
            return Self::identity(dim);
        }
        let qr = directions.clone().qr();
        let q = qr.q();
        let r = qr.r();

        // Drop basis vectors that belong to (numerically) dependent columns.
        let scale = r.diagonal().amax().max(f64::MIN_POSITIVE);
        let keep: Vec<usize> = (0..r.nrows().min(r.ncols()))
            .filter(|&i| r[(i, i)].abs() > 1e-12 * scale)
            .collect();
        let columns: Vec<DVector<f64>> = keep.iter().map(|&i| q.column(i).into_owned()).collect();
        let basis = if columns.is_empty() {
            DMatrix::zeros(dim, 0)
        } else {
            DMatrix::from_columns(&columns)
        };

        Self { dim, basis }
    }

    /// Nothing projected out yet.
    pub fn identity(dim: usize) -> Self {
        Self {
            dim,
            basis: DMatrix::zeros(dim, 0),
        }
    }

    /// Dimension of the projected-out subspace.
    pub fn rank(&self) -> usize {
        self.basis.ncols()
    }

    /// Component of `x` orthogonal to the basis.
    ///
    /// Gram-Schmidt with one reorthogonalization pass, so the result stays
    /// orthogonal to working precision even when `x` lies almost entirely in
    /// the span.
    pub fn project(&self, x: &DVector<f64>) -> DVector<f64> {
        let once = self.matvec(x);
        self.matvec(&once)
    }

    /// Also project out `unit`, which must be a unit vector orthogonal to the basis.
    pub fn with_direction(&self, unit: &DVector<f64>) -> Self {
        let k = self.basis.ncols();
        let mut basis = self.basis.clone().resize_horizontally(k + 1, 0.0);
        basis.set_column(k, unit);
        Self { dim: self.dim, basis }
    }
}

impl LinearOperator for ComplementProjector {
    fn shape(&self) -> (usize, usize) {
        (self.dim, self.dim)
    }

    fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        x - &self.basis * self.basis.tr_mul(x)
    }

    fn matmat(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        x - &self.basis * self.basis.tr_mul(x)
    }
}
