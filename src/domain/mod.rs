//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the linear system being solved (`LinearSystem`)
//! - solver configuration and diagnostics (`SolverConfig`, `SolverInfo`, `ConvergenceCriterion`)
//! - CLI-facing enums and the run configuration (`SolverKind`, `ProblemKind`, `RunConfig`)
//! - serializable file schemas (`SystemFile`, `ReportFile`)

pub mod types;

pub use types::*;
