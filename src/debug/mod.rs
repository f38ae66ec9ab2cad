//! Trace bundle writer for inspecting a solve iteration by iteration.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{RunConfig, SolverInfo};
use crate::error::AppError;
use crate::report::calibration_label;
use crate::solver::IterationSnapshot;

/// One row of the trace table.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRow {
    pub iteration: usize,
    pub step_size: f64,
    pub residual_norm: f64,
    pub sy: f64,
    /// `sᵗAs / sᵗs`.
    pub rayleigh: f64,
    pub x_cov_trace: f64,
}

/// Collects per-iteration diagnostics through the solver callback.
#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    rows: Vec<TraceRow>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, snap: &IterationSnapshot<'_>) -> ControlFlow<()> {
        let sy = snap.search_dir.dot(snap.observation);
        self.rows.push(TraceRow {
            iteration: snap.iteration,
            step_size: snap.step_size,
            residual_norm: snap.residual.norm(),
            sy,
            rayleigh: sy / snap.search_dir.norm_squared(),
            x_cov_trace: snap.x.trace_cov(),
        });
        ControlFlow::Continue(())
    }

    pub fn rows(&self) -> &[TraceRow] {
        &self.rows
    }
}

pub fn write_trace_bundle(
    dir: &Path,
    recorder: &TraceRecorder,
    info: &SolverInfo,
    config: &RunConfig,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(4, format!("Failed to create trace dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("pls_trace_n{}_seed{}_{}.md", config.dim, config.seed, ts));

    let mut file =
        File::create(&path).map_err(|e| AppError::new(4, format!("Failed to create trace file: {e}")))?;
    write_markdown(&mut file, recorder, info, config)
        .map_err(|e| AppError::new(4, format!("Failed to write trace: {e}")))?;

    Ok(path)
}

fn write_markdown<W: Write>(
    out: &mut W,
    recorder: &TraceRecorder,
    info: &SolverInfo,
    config: &RunConfig,
) -> std::io::Result<()> {
    writeln!(out, "# pls trace")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    match &config.system_path {
        Some(path) => writeln!(out, "- system: {}", path.display())?,
        None => writeln!(
            out,
            "- problem: {} (n={}, seed={}, condition={:.3e})",
            config.problem.display_name(),
            config.dim,
            config.seed,
            config.condition
        )?,
    }
    writeln!(
        out,
        "- tolerances: atol={:.1e}, rtol={:.1e}, maxiter={}",
        config.solver_config.atol, config.solver_config.rtol, info.maxiter
    )?;
    writeln!(out, "- iterations: {}", info.iterations)?;
    writeln!(out, "- criterion: {}", info.convergence_criterion)?;
    writeln!(out, "- residual_l2norm: {:.6e}", info.residual_l2norm)?;
    writeln!(out, "- calibration: {}", calibration_label(info))?;

    writeln!(out, "\n## Iterations")?;
    writeln!(out, "| iter | step | \\|r\\| | s'y | rayleigh | tr Cov(x) |")?;
    writeln!(out, "| - | - | - | - | - | - |")?;
    for row in recorder.rows() {
        writeln!(
            out,
            "| {} | {:.6e} | {:.6e} | {:.6e} | {:.6e} | {:.6e} |",
            row.iteration, row.step_size, row.residual_norm, row.sy, row.rayleigh, row.x_cov_trace
        )?;
    }
    Ok(())
}
