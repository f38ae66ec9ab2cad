//! `problinsolve` library crate.
//!
//! The binary (`pls`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the solver is reusable from other crates
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod io;
pub mod linops;
pub mod math;
pub mod prob;
pub mod regression;
pub mod report;
pub mod solver;

#[cfg(test)]
mod testing;
