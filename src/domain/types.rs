//! Shared domain types.
//!
//! Configuration and diagnostics are kept lightweight and serializable so they can be:
//!
//! - passed around in-memory during a solve
//! - exported to JSON
//! - compared across runs

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};
use crate::linops::Operator;

/// Default absolute and relative residual tolerance.
pub const DEFAULT_TOL: f64 = 1e-6;

/// Default iteration cap as a multiple of the problem dimension.
pub const DEFAULT_MAXITER_FACTOR: usize = 10;

/// Why the iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceCriterion {
    /// Iteration cap reached; no accuracy guarantee.
    Maxiter,
    /// `‖r‖₂ <= atol`.
    ResidAtol,
    /// `‖r‖₂ <= rtol·‖b‖₂`.
    ResidRtol,
    /// Not (yet) converged.
    None,
}

impl ConvergenceCriterion {
    pub fn as_str(self) -> &'static str {
        match self {
            ConvergenceCriterion::Maxiter => "maxiter",
            ConvergenceCriterion::ResidAtol => "resid_atol",
            ConvergenceCriterion::ResidRtol => "resid_rtol",
            ConvergenceCriterion::None => "",
        }
    }
}

impl fmt::Display for ConvergenceCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which solver variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Matrix-based solver for symmetric `A` (symmetric Kronecker covariances).
    Symmetric,
    /// Matrix-based solver for general `A`. Not implemented.
    General,
}

/// Built-in test problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemKind {
    /// `Q·diag(λ)·Qᵗ` with a log-uniform spectrum.
    RandomSpd,
    /// 1-D Dirichlet Laplacian (tridiagonal `[-1, 2, -1]`).
    Laplacian,
    /// RBF kernel Gram matrix on random inputs plus a nugget.
    Kernel,
}

impl ProblemKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ProblemKind::RandomSpd => "random SPD",
            ProblemKind::Laplacian => "1-D Laplacian",
            ProblemKind::Kernel => "RBF kernel Gram",
        }
    }
}

/// The system `A·x = b`. Immutable for the duration of a solve.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub a: Operator,
    pub b: DVector<f64>,
}

impl LinearSystem {
    /// Shape checks happen here, before any solver touches the system.
    pub fn new(a: Operator, b: DVector<f64>) -> Result<Self> {
        if !a.is_square() {
            return Err(SolverError::shape("system matrix", (a.dim(), a.dim()), a.shape()));
        }
        if b.len() != a.dim() {
            return Err(SolverError::shape("right-hand side", (a.dim(), 1), (b.len(), 1)));
        }
        Ok(Self { a, b })
    }

    pub fn from_dense(a: DMatrix<f64>, b: DVector<f64>) -> Result<Self> {
        Self::new(Operator::dense(a), b)
    }

    pub fn dim(&self) -> usize {
        self.b.len()
    }

    /// `A·x − b`.
    pub fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
        self.a.matvec(x) - &self.b
    }
}

/// Options recognized by `solve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Hard iteration cap; `None` means `10·n`.
    pub maxiter: Option<usize>,
    pub atol: f64,
    pub rtol: f64,
    /// Run Rayleigh-quotient uncertainty calibration after the loop.
    pub calibrate: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            maxiter: None,
            atol: DEFAULT_TOL,
            rtol: DEFAULT_TOL,
            calibrate: true,
        }
    }
}

impl SolverConfig {
    pub fn resolved_maxiter(&self, n: usize) -> usize {
        self.maxiter.unwrap_or(DEFAULT_MAXITER_FACTOR * n)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.atol.is_finite() && self.atol >= 0.0) {
            return Err(SolverError::InvalidConfig(format!(
                "atol must be finite and non-negative, got {}",
                self.atol
            )));
        }
        if !(self.rtol.is_finite() && self.rtol >= 0.0) {
            return Err(SolverError::InvalidConfig(format!(
                "rtol must be finite and non-negative, got {}",
                self.rtol
            )));
        }
        Ok(())
    }
}

/// Diagnostics returned alongside the output distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverInfo {
    pub iterations: usize,
    pub maxiter: usize,
    pub residual_l2norm: f64,
    pub convergence_criterion: ConvergenceCriterion,
    /// Reserved; never estimated by this solver.
    pub matrix_condition: Option<f64>,
    /// Whether the unexplored-subspace correction was applied.
    pub calibrated: bool,
    /// `Phi` and `Psi` scales when calibration ran.
    pub calibration_scales: Option<(f64, f64)>,
}

/// A full run’s configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub problem: ProblemKind,
    pub system_path: Option<PathBuf>,
    pub dim: usize,
    pub seed: u64,
    pub condition: f64,

    pub solver: SolverKind,
    pub solver_config: SolverConfig,
    /// Prior scale `α`: `A₀ = α·I`, `H₀ = α⁻¹·I`.
    pub prior_scale: f64,

    pub show: usize,
    pub export_report: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
    pub trace: bool,
    pub trace_dir: PathBuf,
}

/// A saved linear system (JSON), row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemFile {
    pub a: Vec<Vec<f64>>,
    pub b: Vec<f64>,
}

/// A saved solve report (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFile {
    pub tool: String,
    pub dim: usize,
    pub info: SolverInfo,
    pub x_mean: Vec<f64>,
    pub x_std: Vec<f64>,
    pub x_cov_trace: f64,
    /// `‖A·x_mean − b‖₂` recomputed against the true system.
    pub true_residual: f64,
}
