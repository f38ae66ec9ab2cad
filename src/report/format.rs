//! Terminal formatting for solve results.
//!
//! We keep formatting code in one place so:
//! - the solver code stays free of presentation concerns
//! - output changes are localized

use crate::domain::{LinearSystem, RunConfig, SolverInfo};
use crate::solver::Solution;

/// Format the full run summary (problem + diagnostics + leading solution components).
pub fn format_run_summary(system: &LinearSystem, solution: &Solution, config: &RunConfig) -> String {
    let mut out = String::new();
    let info = &solution.info;

    out.push_str("=== pls - Probabilistic Linear Solver ===\n");
    match &config.system_path {
        Some(path) => out.push_str(&format!("System: {}\n", path.display())),
        None => out.push_str(&format!(
            "Problem: {} (seed={}, condition={:.3e})\n",
            config.problem.display_name(),
            config.seed,
            config.condition
        )),
    }
    out.push_str(&format!(
        "Dimension: n={} | |b|={:.4e}\n",
        system.dim(),
        system.b.norm()
    ));
    out.push_str(&format!(
        "Settings: maxiter={} atol={:.1e} rtol={:.1e} prior_scale={}\n",
        info.maxiter, config.solver_config.atol, config.solver_config.rtol, config.prior_scale
    ));

    out.push_str("\nDiagnostics:\n");
    out.push_str(&format!("- iterations  : {}\n", info.iterations));
    out.push_str(&format!("- criterion   : {}\n", criterion_label(info)));
    out.push_str(&format!("- |Ax - b|    : {:.4e}\n", info.residual_l2norm));
    out.push_str(&format!("- calibration : {}\n", calibration_label(info)));
    out.push_str(&format!("- tr Cov(x)   : {:.4e}\n", solution.x.trace_cov()));

    out.push_str(&format_components(solution, config.show));
    out
}

/// One-line description of the unexplored-subspace correction.
pub fn calibration_label(info: &SolverInfo) -> String {
    match info.calibration_scales {
        Some((phi, psi)) => format!("applied (phi={phi:.4e}, psi={psi:.4e})"),
        None => "none".to_string(),
    }
}

fn criterion_label(info: &SolverInfo) -> String {
    let label = info.convergence_criterion.as_str();
    if label.is_empty() { "-".to_string() } else { label.to_string() }
}

/// First `show` components of the solution as `mean ± std`.
pub fn format_components(solution: &Solution, show: usize) -> String {
    let mut out = String::new();
    let mean = solution.x.mean();
    let n = mean.len();
    let shown = show.min(n);
    if shown == 0 {
        return out;
    }

    out.push_str(&format!("\nSolution (first {shown} of {n}):\n"));
    out.push_str(&format!("{:>6} {:>16} {:>14}\n", "i", "mean", "std"));
    out.push_str(&format!("{:->6} {:->16} {:->14}\n", "", "", ""));

    let std = solution.x.std();
    for i in 0..shown {
        out.push_str(&format!("{i:>6} {:>16.8e} {:>14.4e}\n", mean[i], std[i]));
    }
    if shown < n {
        out.push_str(&format!("{:>6}\n", "..."));
    }
    out
}
