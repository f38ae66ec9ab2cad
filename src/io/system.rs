//! Read/write linear systems as JSON.
//!
//! Schema (`domain::SystemFile`), row-major:
//!
//! ```json
//! { "a": [[4.0, 1.0], [1.0, 3.0]], "b": [1.0, 2.0] }
//! ```

use std::fs::File;
use std::path::Path;

use nalgebra::{DMatrix, DVector};

use crate::domain::{LinearSystem, SystemFile};
use crate::error::AppError;

/// Read and validate a system JSON file.
pub fn read_system_json(path: &Path) -> Result<LinearSystem, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open system JSON '{}': {e}", path.display())))?;
    let parsed: SystemFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid system JSON: {e}")))?;
    system_from_file(&parsed)
}

/// Write a system as JSON (the operator is materialized densely).
pub fn write_system_json(path: &Path, system: &LinearSystem) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create system JSON '{}': {e}", path.display())))?;

    let a = system.a.to_dense();
    let rows = a.row_iter().map(|row| row.iter().copied().collect()).collect();
    let out = SystemFile {
        a: rows,
        b: system.b.iter().copied().collect(),
    };

    serde_json::to_writer_pretty(file, &out)
        .map_err(|e| AppError::new(2, format!("Failed to write system JSON: {e}")))?;
    Ok(())
}

pub fn system_from_file(file: &SystemFile) -> Result<LinearSystem, AppError> {
    let n = file.a.len();
    if n == 0 {
        return Err(AppError::new(2, "System matrix is empty."));
    }
    if let Some((i, row)) = file.a.iter().enumerate().find(|(_, row)| row.len() != n) {
        return Err(AppError::new(
            2,
            format!("System matrix must be square: row {i} has {} entries, expected {n}.", row.len()),
        ));
    }
    if file.a.iter().flatten().chain(&file.b).any(|v| !v.is_finite()) {
        return Err(AppError::new(2, "System contains non-finite entries."));
    }

    let a = DMatrix::from_fn(n, n, |i, j| file.a[i][j]);
    let asym = (&a - a.transpose()).amax();
    if asym > 1e-10 * a.amax().max(1.0) {
        log::warn!("system matrix is not symmetric (max |A - A'| = {asym:.3e}); the symmetric solver assumes it is");
    }

    let b = DVector::from_column_slice(&file.b);
    Ok(LinearSystem::from_dense(a, b)?)
}
