//! Error types.
//!
//! The library reports failures through [`SolverError`]. The `pls` binary wraps
//! everything into [`AppError`], which carries the process exit code:
//!
//! - `2`: invalid configuration, bad input files, I/O failures
//! - `4`: numerical failures during a solve

use thiserror::Error;

/// Failures raised by the operator algebra, the regression model, and the solver.
#[derive(Debug, Clone, Error)]
pub enum SolverError {
    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}.")]
    ShapeMismatch {
        context: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "Ill-conditioned step at iteration {iteration}: s'y = {sy:e} is numerically zero, step size is undefined."
    )]
    IllConditionedStep { iteration: usize, sy: f64 },

    #[error("Solve aborted by callback after iteration {iteration}.")]
    Aborted { iteration: usize },

    #[error("Regression failed: {0}")]
    Regression(String),

    #[error("Numerical failure: {0}")]
    Numerical(String),
}

impl SolverError {
    pub fn shape(context: impl Into<String>, expected: (usize, usize), actual: (usize, usize)) -> Self {
        SolverError::ShapeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Whether the failure was detected before any iteration ran.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SolverError::ShapeMismatch { .. } | SolverError::Unsupported(_) | SolverError::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SolverError>;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<SolverError> for AppError {
    fn from(err: SolverError) -> Self {
        let exit_code = if err.is_structural() { 2 } else { 4 };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
