//! One-dimensional regression used by uncertainty calibration.
//!
//! The calibrator only needs to fit scalar targets over scalar inputs and
//! predict the mean at new inputs, so the capability is a two-method trait.
//! [`GaussianProcess`] is the default implementation.

use crate::error::Result;

pub mod gp;

pub use gp::*;

/// Fit 1-D inputs to 1-D targets, then predict the mean on new inputs.
pub trait Regressor {
    fn fit(&mut self, xs: &[f64], ys: &[f64]) -> Result<()>;

    fn predict(&self, xs: &[f64]) -> Result<Vec<f64>>;
}
