//! Symmetric Kronecker product `W ⊗ₛ W`.
//!
//! For matrix-variate beliefs with `Cov(A) = W ⊗ₛ W`, the covariance acts on a
//! matrix `X` as
//!
//! ```text
//! (W ⊗ₛ W) vec(X) = vec(½ · W (X + Xᵗ) Wᵗ)
//! ```
//!
//! so applying it only needs two products with `W` and never stores the
//! `n² × n²` matrix. As a [`LinearOperator`] it acts on column-major `vec(X)`.

use nalgebra::{DMatrix, DVector};

use super::{LinearOperator, Operator};

#[derive(Debug, Clone)]
pub struct SymmetricKronecker {
    factor: Operator,
}

impl SymmetricKronecker {
    pub fn new(factor: Operator) -> Self {
        Self { factor }
    }

    /// The Kronecker factor `W`.
    pub fn factor(&self) -> &Operator {
        &self.factor
    }

    /// Dimension `n` of the matrices the covariance is defined over.
    pub fn dim(&self) -> usize {
        self.factor.dim()
    }

    /// Apply to an `n×n` matrix.
    pub fn apply(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let sym = x + x.transpose();
        let w_sym = self.factor.matmat(&sym);
        // (W·Sym)·Wᵗ = (W·(W·Sym)ᵗ)ᵗ
        let out = self.factor.matmat(&w_sym.transpose()).transpose();
        out * 0.5
    }

    /// `Cov(A_ij, A_kl) = ½ (W_ik W_jl + W_il W_jk)`.
    pub fn entry_covariance(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        let n = self.dim();
        let unit = |idx: usize| {
            let mut e = DVector::zeros(n);
            e[idx] = 1.0;
            e
        };
        let wk = self.factor.matvec(&unit(k));
        let wl = self.factor.matvec(&unit(l));
        0.5 * (wk[i] * wl[j] + wl[i] * wk[j])
    }
}

impl LinearOperator for SymmetricKronecker {
    fn shape(&self) -> (usize, usize) {
        let n = self.dim();
        (n * n, n * n)
    }

    fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        let n = self.dim();
        let xm = DMatrix::from_column_slice(n, n, x.as_slice());
        let out = self.apply(&xm);
        DVector::from_column_slice(out.as_slice())
    }
}
