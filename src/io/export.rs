//! Export solve results.
//!
//! - JSON report: diagnostics plus the solution belief (`domain::ReportFile`)
//! - CSV: one row per solution component, easy to consume in spreadsheets

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{LinearSystem, ReportFile};
use crate::error::AppError;
use crate::solver::Solution;

pub fn build_report(system: &LinearSystem, solution: &Solution) -> ReportFile {
    let mean = solution.x.mean();
    ReportFile {
        tool: "pls".to_string(),
        dim: system.dim(),
        info: solution.info.clone(),
        x_mean: mean.iter().copied().collect(),
        x_std: solution.x.std().iter().copied().collect(),
        x_cov_trace: solution.x.trace_cov(),
        true_residual: system.residual(mean).norm(),
    }
}

/// Write the solve report as JSON.
pub fn write_report_json(path: &Path, system: &LinearSystem, solution: &Solution) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &build_report(system, solution))
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

/// Write `index,mean,std` per solution component.
pub fn write_solution_csv(path: &Path, solution: &Solution) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "index,mean,std").map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    let std = solution.x.std();
    for (i, (m, s)) in solution.x.mean().iter().zip(std.iter()).enumerate() {
        writeln!(file, "{i},{m:.12e},{s:.12e}")
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
