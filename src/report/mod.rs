//! Reporting utilities: formatted terminal output for a solve.

pub mod format;

pub use format::*;
