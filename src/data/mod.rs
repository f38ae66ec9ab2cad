//! Test problems.
//!
//! - seeded synthetic systems (`problems`)

pub mod problems;

pub use problems::*;
