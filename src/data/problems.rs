//! Seeded synthetic linear systems.
//!
//! Every generator is deterministic given `(kind, n, seed, condition)`, so a run
//! can be reproduced from its command line alone.

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Normal, StandardNormal};

use crate::domain::{LinearSystem, ProblemKind};
use crate::error::{Result, SolverError};

/// RBF lengthscale for the kernel problem, on inputs spread over `[0, 1]`.
const KERNEL_LENGTHSCALE: f64 = 0.1;

/// Build `A·x = b` with `b ~ N(0, I)`.
///
/// `condition` is the exact condition number of the random SPD problem and the
/// inverse nugget (`σₙ² = 1/condition`) of the kernel problem. The Laplacian
/// ignores it.
pub fn generate_problem(kind: ProblemKind, n: usize, seed: u64, condition: f64) -> Result<LinearSystem> {
    if n == 0 {
        return Err(SolverError::InvalidConfig("Problem dimension must be > 0.".to_string()));
    }
    if !(condition.is_finite() && condition >= 1.0) {
        return Err(SolverError::InvalidConfig(format!(
            "Condition number must be finite and >= 1, got {condition}."
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let a = match kind {
        ProblemKind::RandomSpd => random_spd(&mut rng, n, condition),
        ProblemKind::Laplacian => laplacian(n),
        ProblemKind::Kernel => kernel_gram(&mut rng, n, 1.0 / condition),
    };

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| SolverError::Numerical(format!("Right-hand side distribution error: {e}")))?;
    let b = DVector::from_fn(n, |_, _| normal.sample(&mut rng));

    log::debug!("generated {} problem: n={n} seed={seed}", kind.display_name());
    LinearSystem::from_dense(a, b)
}

/// `Q·diag(λ)·Qᵗ` with `λ` log-spaced over `[1, condition]` and `Q` a random rotation.
fn random_spd(rng: &mut StdRng, n: usize, condition: f64) -> DMatrix<f64> {
    let g = DMatrix::<f64>::from_fn(n, n, |_, _| rng.sample(StandardNormal));
    let q = g.qr().q();
    let spectrum = DVector::from_fn(n, |i, _| {
        if n == 1 {
            1.0
        } else {
            condition.powf(i as f64 / (n - 1) as f64)
        }
    });
    let a = &q * DMatrix::from_diagonal(&spectrum) * q.transpose();
    // Round-off leaves `a` slightly asymmetric.
    (&a + a.transpose()) * 0.5
}

/// Tridiagonal `[-1, 2, -1]` (1-D Dirichlet Laplacian).
fn laplacian(n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |i, j| match i.abs_diff(j) {
        0 => 2.0,
        1 => -1.0,
        _ => 0.0,
    })
}

/// RBF Gram matrix on uniform inputs in `[0, 1]` plus a nugget on the diagonal.
fn kernel_gram(rng: &mut StdRng, n: usize, nugget: f64) -> DMatrix<f64> {
    let xs: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..=1.0)).collect();
    let two_l2 = 2.0 * KERNEL_LENGTHSCALE * KERNEL_LENGTHSCALE;
    DMatrix::from_fn(n, n, |i, j| {
        let d = xs[i] - xs[j];
        let k = (-d * d / two_l2).exp();
        if i == j { k + nugget } else { k }
    })
}
