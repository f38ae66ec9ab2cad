//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds or loads the linear system
//! - runs the solver
//! - prints the report
//! - writes optional exports and traces

use clap::Parser;

use crate::cli::{Command, GenerateArgs, SolveArgs};
use crate::domain::{RunConfig, SolverConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `pls` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse_from(std::env::args());

    match cli.command {
        Command::Solve(args) => handle_solve(args),
        Command::Generate(args) => handle_generate(args),
    }
}

fn handle_solve(args: SolveArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let run = pipeline::run_solve(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.system, &run.solution, &config)
    );

    // Optional exports.
    if let Some(path) = &config.export_report {
        crate::io::write_report_json(path, &run.system, &run.solution)?;
    }
    if let Some(path) = &config.export_csv {
        crate::io::write_solution_csv(path, &run.solution)?;
    }
    if let Some(recorder) = &run.trace {
        let path = crate::debug::write_trace_bundle(&config.trace_dir, recorder, &run.solution.info, &config)?;
        println!("Trace written to {}", path.display());
    }

    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let p = &args.problem;
    let system = crate::data::generate_problem(p.problem, p.dim, p.seed, p.condition)?;
    crate::io::write_system_json(&args.out, &system)?;
    println!(
        "Wrote {} system (n={}, seed={}) to {}",
        p.problem.display_name(),
        p.dim,
        p.seed,
        args.out.display()
    );
    Ok(())
}

pub fn run_config_from_args(args: &SolveArgs) -> RunConfig {
    RunConfig {
        problem: args.problem.problem,
        system_path: args.system.clone(),
        dim: args.problem.dim,
        seed: args.problem.seed,
        condition: args.problem.condition,

        solver: args.solver,
        solver_config: SolverConfig {
            maxiter: args.maxiter,
            atol: args.atol,
            rtol: args.rtol,
            calibrate: !args.no_calibrate,
        },
        prior_scale: args.prior_scale,

        show: args.show,
        export_report: args.export_report.clone(),
        export_csv: args.export_csv.clone(),
        trace: args.trace,
        trace_dir: args.trace_dir.clone(),
    }
}
