//! Input/output helpers.
//!
//! - system JSON read/write (`system`)
//! - result exports (JSON/CSV) (`export`)

pub mod export;
pub mod system;

pub use export::*;
pub use system::*;
