//! Matrix-based solver for non-symmetric `A`.
//!
//! Not implemented: construction fails before any iteration so that a general
//! system is never silently treated as symmetric.

use super::Solution;
use crate::domain::{LinearSystem, SolverConfig};
use crate::error::{Result, SolverError};

#[derive(Debug)]
pub struct GeneralSolver {
    _private: (),
}

impl GeneralSolver {
    pub fn new(system: &LinearSystem) -> Result<Self> {
        Err(SolverError::Unsupported(format!(
            "general (non-symmetric) solver requested for a {n}x{n} system; only the symmetric solver is available",
            n = system.dim()
        )))
    }

    pub fn solve(&self, _config: &SolverConfig) -> Result<Solution> {
        Err(SolverError::Unsupported("general solver".to_string()))
    }
}
