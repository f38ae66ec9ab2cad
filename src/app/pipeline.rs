//! Shared "solve pipeline" logic.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load/generate system -> prior -> solve (optionally traced) -> outputs
//!
//! The front-end can then focus on presentation.

use crate::data::generate_problem;
use crate::debug::TraceRecorder;
use crate::domain::{LinearSystem, RunConfig};
use crate::error::AppError;
use crate::solver::{Callback, IterationSnapshot, Prior, Solution, problinsolve, problinsolve_with_callback};

/// All computed outputs of a single `pls solve` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub system: LinearSystem,
    pub solution: Solution,
    pub trace: Option<TraceRecorder>,
}

/// Execute the full solve pipeline and return the computed outputs.
pub fn run_solve(config: &RunConfig) -> Result<RunOutput, AppError> {
    // 1) Build or load the system.
    let system = match &config.system_path {
        Some(path) => crate::io::read_system_json(path)?,
        None => generate_problem(config.problem, config.dim, config.seed, config.condition)?,
    };

    run_solve_with_system(config, system)
}

/// Execute the solve on a pre-built system.
pub fn run_solve_with_system(config: &RunConfig, system: LinearSystem) -> Result<RunOutput, AppError> {
    // 2) Prior.
    let prior = Prior::scaled(system.dim(), config.prior_scale)?;

    // 3) Solve, recording a trace when requested.
    let mut trace = config.trace.then(TraceRecorder::new);
    let solution = match trace.as_mut() {
        Some(recorder) => {
            let mut record = |snap: &IterationSnapshot<'_>| recorder.record(snap);
            let callback: &mut Callback<'_> = &mut record;
            problinsolve_with_callback(
                system.clone(),
                prior,
                config.solver,
                &config.solver_config,
                Some(callback),
            )?
        }
        None => problinsolve(system.clone(), prior, config.solver, &config.solver_config)?,
    };

    Ok(RunOutput {
        system,
        solution,
        trace,
    })
}
