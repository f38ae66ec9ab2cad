//! Command-line parsing for the probabilistic linear solver.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the numerical code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{DEFAULT_TOL, ProblemKind, SolverKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pls", version, about = "Probabilistic linear solver with calibrated uncertainty")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Solve a generated or saved system, print diagnostics, and optionally export.
    Solve(SolveArgs),
    /// Generate a test system and save it as JSON.
    Generate(GenerateArgs),
}

/// Options for building a test problem.
#[derive(Debug, Parser, Clone)]
pub struct ProblemArgs {
    /// Built-in problem family.
    #[arg(long, value_enum, default_value_t = ProblemKind::RandomSpd)]
    pub problem: ProblemKind,

    /// Problem dimension.
    #[arg(short = 'n', long, default_value_t = 50)]
    pub dim: usize,

    /// Random seed for problem generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Condition number (random SPD) or inverse nugget (kernel).
    #[arg(long, default_value_t = 100.0)]
    pub condition: f64,
}

/// Options for a solve.
#[derive(Debug, Parser, Clone)]
pub struct SolveArgs {
    #[command(flatten)]
    pub problem: ProblemArgs,

    /// Load the system from JSON instead of generating one.
    #[arg(long, value_name = "JSON")]
    pub system: Option<PathBuf>,

    /// Solver variant.
    #[arg(long, value_enum, default_value_t = SolverKind::Symmetric)]
    pub solver: SolverKind,

    /// Iteration cap (default: 10·n).
    #[arg(long)]
    pub maxiter: Option<usize>,

    /// Absolute residual tolerance.
    #[arg(long, default_value_t = DEFAULT_TOL)]
    pub atol: f64,

    /// Relative residual tolerance.
    #[arg(long, default_value_t = DEFAULT_TOL)]
    pub rtol: f64,

    /// Skip uncertainty calibration of the unexplored subspace.
    #[arg(long)]
    pub no_calibrate: bool,

    /// Prior scale α (A₀ = α·I, A⁻¹₀ = α⁻¹·I).
    #[arg(long, default_value_t = 1.0)]
    pub prior_scale: f64,

    /// Number of solution components to print.
    #[arg(long, default_value_t = 10)]
    pub show: usize,

    /// Export the solve report to JSON.
    #[arg(long = "export-report")]
    pub export_report: Option<PathBuf>,

    /// Export solution mean/std to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,

    /// Write a per-iteration markdown trace.
    #[arg(long)]
    pub trace: bool,

    /// Directory for trace bundles.
    #[arg(long, default_value = "debug")]
    pub trace_dir: PathBuf,
}

/// Options for generating a system file.
#[derive(Debug, Parser)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub problem: ProblemArgs,

    /// Output JSON path.
    #[arg(long, value_name = "JSON")]
    pub out: PathBuf,
}
