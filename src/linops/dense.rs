//! Leaf operators: explicit matrices and scalar multiples of the identity.

use nalgebra::{DMatrix, DVector};

use super::LinearOperator;

/// An explicit matrix.
#[derive(Debug, Clone)]
pub struct Dense {
    matrix: DMatrix<f64>,
}

impl Dense {
    pub fn new(matrix: DMatrix<f64>) -> Self {
        Self { matrix }
    }
}

impl LinearOperator for Dense {
    fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        &self.matrix * x
    }

    fn matmat(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        &self.matrix * x
    }

    fn to_dense(&self) -> DMatrix<f64> {
        self.matrix.clone()
    }
}

/// `c·I` of dimension `n`.
#[derive(Debug, Clone, Copy)]
pub struct ScalarMult {
    dim: usize,
    scalar: f64,
}

impl ScalarMult {
    pub fn new(dim: usize, scalar: f64) -> Self {
        Self { dim, scalar }
    }

    pub fn identity(dim: usize) -> Self {
        Self::new(dim, 1.0)
    }

    pub fn scalar(&self) -> f64 {
        self.scalar
    }
}

impl LinearOperator for ScalarMult {
    fn shape(&self) -> (usize, usize) {
        (self.dim, self.dim)
    }

    fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        x * self.scalar
    }

    fn matmat(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        x * self.scalar
    }

    fn to_dense(&self) -> DMatrix<f64> {
        DMatrix::identity(self.dim, self.dim) * self.scalar
    }

    fn as_scalar(&self) -> Option<f64> {
        Some(self.scalar())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_mult_scales_every_column() {
        let op = ScalarMult::new(2, 3.0);
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(op.matmat(&x), DMatrix::from_row_slice(2, 2, &[3.0, 6.0, 9.0, 12.0]));
        assert_eq!(op.to_dense(), DMatrix::from_row_slice(2, 2, &[3.0, 0.0, 0.0, 3.0]));
    }

    #[test]
    fn dense_matches_matrix_product() {
        let m = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let op = Dense::new(m);
        let y = op.matvec(&DVector::from_row_slice(&[1.0, 2.0]));
        assert_eq!(y, DVector::from_row_slice(&[6.0, 7.0]));
    }
}
