//! Per-iteration history of a single solve.

use nalgebra::{DMatrix, DVector};

/// One completed iteration: direction `s`, observation `y = A·s`, and `sᵗy`.
#[derive(Debug, Clone)]
pub struct Step {
    pub search_dir: DVector<f64>,
    pub observation: DVector<f64>,
    pub sy: f64,
}

/// Append-only record of the steps taken so far.
#[derive(Debug, Clone, Default)]
pub struct IterationArchive {
    steps: Vec<Step>,
}

impl IterationArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, search_dir: DVector<f64>, observation: DVector<f64>, sy: f64) {
        self.steps.push(Step {
            search_dir,
            observation,
            sy,
        });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `S`: search directions as columns (`n×k`).
    pub fn directions(&self, n: usize) -> DMatrix<f64> {
        stack(n, self.steps.iter().map(|s| &s.search_dir))
    }

    /// `Y`: observations as columns (`n×k`).
    pub fn observations(&self, n: usize) -> DMatrix<f64> {
        stack(n, self.steps.iter().map(|s| &s.observation))
    }

    /// `log(sᵢᵗyᵢ) − log(sᵢᵗsᵢ)` per step. Non-positive curvature gives NaN.
    pub fn log_rayleigh_quotients(&self) -> Vec<f64> {
        self.steps
            .iter()
            .map(|s| {
                if s.sy > 0.0 {
                    s.sy.ln() - s.search_dir.norm_squared().ln()
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}

fn stack<'a>(n: usize, cols: impl Iterator<Item = &'a DVector<f64>>) -> DMatrix<f64> {
    let cols: Vec<DVector<f64>> = cols.cloned().collect();
    if cols.is_empty() {
        DMatrix::zeros(n, 0)
    } else {
        DMatrix::from_columns(&cols)
    }
}
