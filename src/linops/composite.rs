//! Lazily composed operators.

use nalgebra::{DMatrix, DVector};

use super::{LinearOperator, Operator};

/// `Σ terms`.
#[derive(Debug, Clone)]
pub struct Sum {
    terms: Vec<Operator>,
}

impl Sum {
    /// # Panics
    /// Panics on an empty term list; shapes are checked by [`Operator::try_add`].
    pub fn new(terms: Vec<Operator>) -> Self {
        assert!(!terms.is_empty(), "operator sum needs at least one term");
        Self { terms }
    }
}

impl LinearOperator for Sum {
    fn shape(&self) -> (usize, usize) {
        self.terms[0].shape()
    }

    fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut out = self.terms[0].matvec(x);
        for term in &self.terms[1..] {
            out += term.matvec(x);
        }
        out
    }

    fn matmat(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = self.terms[0].matmat(x);
        for term in &self.terms[1..] {
            out += term.matmat(x);
        }
        out
    }
}

/// `c·op`.
#[derive(Debug, Clone)]
pub struct Scaled {
    op: Operator,
    scalar: f64,
}

impl Scaled {
    pub fn new(op: Operator, scalar: f64) -> Self {
        Self { op, scalar }
    }
}

impl LinearOperator for Scaled {
    fn shape(&self) -> (usize, usize) {
        self.op.shape()
    }

    fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        self.op.matvec(x) * self.scalar
    }

    fn matmat(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        self.op.matmat(x) * self.scalar
    }
}

/// `P∘M∘P` for a symmetric `P`; symmetric (PSD) whenever `M` is.
#[derive(Debug, Clone)]
pub struct Congruence {
    outer: Operator,
    inner: Operator,
}

impl Congruence {
    pub fn new(outer: Operator, inner: Operator) -> Self {
        Self { outer, inner }
    }
}

impl LinearOperator for Congruence {
    fn shape(&self) -> (usize, usize) {
        self.outer.shape()
    }

    fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        self.outer.matvec(&self.inner.matvec(&self.outer.matvec(x)))
    }

    fn matmat(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        self.outer.matmat(&self.inner.matmat(&self.outer.matmat(x)))
    }
}
