//! Numerical utilities: least squares, grids, and PSD square roots.

pub mod grid;
pub mod ols;
pub mod spectral;

pub use grid::*;
pub use ols::*;
pub use spectral::*;
