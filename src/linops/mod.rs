//! Structured linear operators.
//!
//! Every belief the solver maintains (means and covariance factors of `A` and
//! `A⁻¹`) is a linear map that we only ever need to *apply*. Operators here are
//! composed by wrapping, never by densifying:
//!
//! - [`Dense`]: an explicit matrix
//! - [`ScalarMult`]: `c·I`
//! - [`LowRank`]: `base + U·Vᵗ` with thin `U`, `V`
//! - [`Sum`] / [`Scaled`]: operator arithmetic
//! - [`ComplementProjector`] / [`Congruence`]: `I − QQᵗ` and `P∘M∘P`
//! - [`SymmetricKronecker`]: the `W ⊗ₛ W` covariance over matrices
//!
//! [`Operator`] is the shared, immutable handle passed around by the solver.
//! Updating a belief builds a new handle; handles given out earlier (e.g. to a
//! callback) keep describing the state they were taken from.

use std::fmt;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use crate::error::{Result, SolverError};

pub mod composite;
pub mod dense;
pub mod kronecker;
pub mod lowrank;
pub mod projector;

pub use composite::*;
pub use dense::*;
pub use kronecker::*;
pub use lowrank::*;
pub use projector::*;

/// A linear map exposed only through its action on vectors and matrices.
pub trait LinearOperator: fmt::Debug + Send + Sync {
    /// `(rows, cols)`.
    fn shape(&self) -> (usize, usize);

    fn matvec(&self, x: &DVector<f64>) -> DVector<f64>;

    /// Apply to every column of `x`.
    fn matmat(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let (rows, _) = self.shape();
        let mut out = DMatrix::<f64>::zeros(rows, x.ncols());
        for (j, col) in x.column_iter().enumerate() {
            let y = self.matvec(&col.into_owned());
            out.set_column(j, &y);
        }
        out
    }

    /// Materialize as a dense matrix (`O(n²)` memory; diagnostics and small problems only).
    fn to_dense(&self) -> DMatrix<f64> {
        let (_, cols) = self.shape();
        self.matmat(&DMatrix::identity(cols, cols))
    }

    /// Downcast hook used by the rank-2 update engine to extend an existing
    /// low-rank representation instead of nesting a new one.
    fn as_low_rank(&self) -> Option<&LowRank> {
        None
    }

    /// `Some(c)` when the operator is `c·I`.
    fn as_scalar(&self) -> Option<f64> {
        None
    }
}

/// Cheaply clonable handle to an immutable operator.
#[derive(Clone)]
pub struct Operator(Arc<dyn LinearOperator>);

impl Operator {
    pub fn new<T: LinearOperator + 'static>(op: T) -> Self {
        Operator(Arc::new(op))
    }

    pub fn dense(matrix: DMatrix<f64>) -> Self {
        Operator::new(Dense::new(matrix))
    }

    pub fn identity(n: usize) -> Self {
        Operator::new(ScalarMult::identity(n))
    }

    pub fn scalar(n: usize, scalar: f64) -> Self {
        Operator::new(ScalarMult::new(n, scalar))
    }

    pub fn shape(&self) -> (usize, usize) {
        self.0.shape()
    }

    /// Dimension of a square operator (number of rows otherwise).
    pub fn dim(&self) -> usize {
        self.0.shape().0
    }

    pub fn is_square(&self) -> bool {
        let (r, c) = self.shape();
        r == c
    }

    pub fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        self.0.matvec(x)
    }

    pub fn matmat(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        self.0.matmat(x)
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        self.0.to_dense()
    }

    pub fn inner(&self) -> &dyn LinearOperator {
        self.0.as_ref()
    }

    /// `self + other`, composed lazily.
    pub fn try_add(&self, other: &Operator) -> Result<Operator> {
        if self.shape() != other.shape() {
            return Err(SolverError::shape("operator sum", self.shape(), other.shape()));
        }
        Ok(Operator::new(Sum::new(vec![self.clone(), other.clone()])))
    }

    /// `c·self`, composed lazily.
    pub fn scale(&self, c: f64) -> Operator {
        Operator::new(Scaled::new(self.clone(), c))
    }

    /// `self + u·vᵗ + v·uᵗ` (symmetric rank-2 update).
    pub fn symmetric_rank2_update(&self, u: &DVector<f64>, v: &DVector<f64>) -> Result<Operator> {
        self.check_vector("rank-2 update", u)?;
        self.check_vector("rank-2 update", v)?;
        let left = DMatrix::from_columns(&[u.clone(), v.clone()]);
        let right = DMatrix::from_columns(&[v.clone(), u.clone()]);
        Ok(LowRank::extend(self, &left, &right).into_operator())
    }

    fn check_vector(&self, context: &str, v: &DVector<f64>) -> Result<()> {
        if !self.is_square() || v.len() != self.dim() {
            return Err(SolverError::shape(context, self.shape(), (v.len(), 1)));
        }
        Ok(())
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<DMatrix<f64>> for Operator {
    fn from(matrix: DMatrix<f64>) -> Self {
        Operator::dense(matrix)
    }
}
