//! Gaussian distributions returned by the solver.
//!
//! - [`MatrixNormal`]: belief over `A` or `A⁻¹` with symmetric Kronecker covariance
//! - [`VectorNormal`]: belief over the solution `x`, with an operator covariance
//!
//! Both are immutable snapshots: they hold shared operator handles and are not
//! affected by later solver iterations.

pub mod normal;

pub use normal::*;
