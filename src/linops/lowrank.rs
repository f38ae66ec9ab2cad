//! Fixed-depth low-rank updates: `base + U·Vᵗ`.
//!
//! Wrapping a fresh rank-2 term around the previous operator at every iteration
//! would make each application walk a chain whose length grows with the
//! iteration count. Instead, updates append columns to `U` and `V` of a single
//! layer on top of the underlying base. Once the accumulated rank exceeds the
//! dimension, the operator is re-materialized as a dense matrix (at that point
//! the dense product is the cheaper one anyway). Updates are symmetric, so the
//! re-materialized matrix is symmetrized to drop accumulated round-off.

use nalgebra::{DMatrix, DVector};

use super::{LinearOperator, Operator};

#[derive(Debug, Clone)]
pub struct LowRank {
    base: Operator,
    left: DMatrix<f64>,
    right: DMatrix<f64>,
}

impl LowRank {
    /// # Panics
    /// Panics if `left` and `right` have different shapes.
    pub fn new(base: Operator, left: DMatrix<f64>, right: DMatrix<f64>) -> Self {
        assert_eq!(left.shape(), right.shape(), "low-rank factors must have equal shapes");
        Self { base, left, right }
    }

    /// `op + left·rightᵗ`, flattening into `op`'s own low-rank layer when it has one.
    pub fn extend(op: &Operator, left: &DMatrix<f64>, right: &DMatrix<f64>) -> Self {
        match op.inner().as_low_rank() {
            Some(existing) => Self::new(
                existing.base.clone(),
                hstack(&existing.left, left),
                hstack(&existing.right, right),
            ),
            None => Self::new(op.clone(), left.clone(), right.clone()),
        }
    }

    pub fn base(&self) -> &Operator {
        &self.base
    }

    pub fn rank(&self) -> usize {
        self.left.ncols()
    }

    /// Finish a symmetric update: keep the low-rank form while it is cheaper to apply.
    pub fn into_operator(self) -> Operator {
        let (n, _) = self.base.shape();
        if self.rank() > n {
            log::debug!("re-materializing rank-{} update of a {n}x{n} operator", self.rank());
            let dense = self.to_dense();
            Operator::dense((&dense + dense.transpose()) * 0.5)
        } else {
            Operator::new(self)
        }
    }
}

impl LinearOperator for LowRank {
    fn shape(&self) -> (usize, usize) {
        self.base.shape()
    }

    fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        let coeffs = self.right.tr_mul(x);
        self.base.matvec(x) + &self.left * coeffs
    }

    fn matmat(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let coeffs = self.right.tr_mul(x);
        self.base.matmat(x) + &self.left * coeffs
    }

    fn to_dense(&self) -> DMatrix<f64> {
        self.base.to_dense() + &self.left * self.right.transpose()
    }

    fn as_low_rank(&self) -> Option<&LowRank> {
        Some(self)
    }
}

fn hstack(a: &DMatrix<f64>, b: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = DMatrix::zeros(a.nrows(), a.ncols() + b.ncols());
    out.columns_mut(0, a.ncols()).copy_from(a);
    out.columns_mut(a.ncols(), b.ncols()).copy_from(b);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rematerializes_once_rank_exceeds_dimension() {
        let mut op = Operator::identity(2);
        let u = DVector::from_row_slice(&[1.0, 0.0]);
        let v = DVector::from_row_slice(&[0.0, 1.0]);
        op = op.symmetric_rank2_update(&u, &v).unwrap();
        assert!(op.inner().as_low_rank().is_some());

        op = op.symmetric_rank2_update(&u, &u).unwrap();
        assert!(op.inner().as_low_rank().is_none());
        let expected = DMatrix::from_row_slice(2, 2, &[3.0, 1.0, 1.0, 1.0]);
        assert_relative_eq!(op.to_dense(), expected, epsilon = 1e-14);
    }

    #[test]
    fn matmat_agrees_with_dense() {
        let base = Operator::dense(DMatrix::from_row_slice(3, 3, &[2.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 3.0]));
        let left = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let right = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, -1.0]);
        let lr = LowRank::new(base, left, right);
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 2.0, 2.0]);
        assert_relative_eq!(lr.matmat(&x), lr.to_dense() * &x, epsilon = 1e-12);
    }
}
