//! Matrix-based probabilistic solver for symmetric systems.
//!
//! Each iteration queries the true operator once (`y = A·s`) and conditions
//! Gaussian beliefs over `A` and `H = A⁻¹` on the pair `(s, y)`. The solution
//! estimate moves along `s = −H·r` with an exact line search, so the iterates
//! match a conjugate-direction method when `A` is positive definite.

use std::ops::ControlFlow;

use nalgebra::DVector;

use super::archive::IterationArchive;
use super::belief::{BeliefState, Prior};
use super::calibrate::calibrate_uncertainty;
use super::convergence::check_convergence;
use super::posterior::{Posterior, build_posterior};
use super::Solution;
use crate::domain::{LinearSystem, SolverConfig, SolverInfo};
use crate::error::{Result, SolverError};
use crate::prob::{MatrixNormal, VectorNormal};
use crate::regression::{GaussianProcess, Regressor};

/// Read-only view of the solve after a completed iteration.
///
/// The distributions are the uncalibrated beliefs at this point.
#[derive(Debug)]
pub struct IterationSnapshot<'a> {
    /// Number of completed iterations (1 after the first step).
    pub iteration: usize,
    pub x: &'a VectorNormal,
    pub a: &'a MatrixNormal,
    pub ainv: &'a MatrixNormal,
    pub search_dir: &'a DVector<f64>,
    pub observation: &'a DVector<f64>,
    pub step_size: f64,
    pub residual: &'a DVector<f64>,
}

/// Per-iteration observer. `Break` aborts the solve.
pub type Callback<'a> = dyn FnMut(&IterationSnapshot<'_>) -> ControlFlow<()> + 'a;

#[derive(Debug, Clone)]
pub struct SymmetricSolver {
    system: LinearSystem,
    prior: Prior,
}

impl SymmetricSolver {
    /// Fails with `ShapeMismatch` if any prior operator is not `n×n`.
    pub fn new(system: LinearSystem, prior: Prior) -> Result<Self> {
        prior.validate(system.dim())?;
        Ok(Self { system, prior })
    }

    pub fn system(&self) -> &LinearSystem {
        &self.system
    }

    pub fn solve(&self, config: &SolverConfig) -> Result<Solution> {
        let mut regressor = GaussianProcess::new();
        self.solve_with_regressor(config, &mut regressor, None)
    }

    pub fn solve_with_callback<F>(&self, config: &SolverConfig, mut callback: F) -> Result<Solution>
    where
        F: FnMut(&IterationSnapshot<'_>) -> ControlFlow<()>,
    {
        let mut regressor = GaussianProcess::new();
        let callback: &mut Callback<'_> = &mut callback;
        self.solve_with_regressor(config, &mut regressor, Some(callback))
    }

    /// Full entry point: custom calibration regressor and optional observer.
    pub fn solve_with_regressor(
        &self,
        config: &SolverConfig,
        regressor: &mut dyn Regressor,
        mut callback: Option<&mut Callback<'_>>,
    ) -> Result<Solution> {
        config.validate()?;

        let n = self.system.dim();
        let b = &self.system.b;
        let b_norm = b.norm();
        let maxiter = config.resolved_maxiter(n);

        let x0 = self.prior.ainv_mean.matvec(b);
        let r0 = self.system.residual(&x0);
        let mut belief = BeliefState::new(&self.prior, x0, r0);
        let mut archive = IterationArchive::new();
        let mut iteration = 0;

        let (residual_norm, criterion) = loop {
            let residual_norm = belief.residual.norm();
            if !residual_norm.is_finite() {
                return Err(SolverError::Numerical(format!(
                    "residual norm became {residual_norm} at iteration {iteration}"
                )));
            }
            let (done, criterion) =
                check_convergence(iteration, maxiter, residual_norm, b_norm, config.atol, config.rtol);
            if done {
                break (residual_norm, criterion);
            }

            let s = -belief.ainv_mean().matvec(&belief.residual);
            let y = self.system.a.matvec(&s);
            let sy = s.dot(&y);
            if !sy.is_finite() || sy.abs() <= f64::EPSILON * s.norm() * y.norm() {
                return Err(SolverError::IllConditionedStep { iteration, sy });
            }

            let step_size = -s.dot(&belief.residual) / sy;
            belief.x += &s * step_size;
            belief.residual += &y * step_size;
            belief.observe(&s, &y, iteration)?;
            iteration += 1;

            log::debug!(
                "iteration {iteration}: step={step_size:.4e} s'y={sy:.4e} |r|={:.4e}",
                belief.residual.norm()
            );

            if let Some(cb) = callback.as_deref_mut() {
                let current = build_posterior(&belief, &archive, b, None)?;
                let snapshot = IterationSnapshot {
                    iteration,
                    x: &current.x,
                    a: &current.a,
                    ainv: &current.ainv,
                    search_dir: &s,
                    observation: &y,
                    step_size,
                    residual: &belief.residual,
                };
                if cb(&snapshot).is_break() {
                    log::info!("solve aborted by callback after {iteration} iterations");
                    return Err(SolverError::Aborted { iteration });
                }
            }
            archive.push(s, y, sy);
        };

        let calibration = if config.calibrate {
            calibrate_uncertainty(&archive, n, regressor)?
        } else {
            None
        };
        let Posterior { x, a, ainv } = build_posterior(&belief, &archive, b, calibration.as_ref())?;

        let info = SolverInfo {
            iterations: iteration,
            maxiter,
            residual_l2norm: residual_norm,
            convergence_criterion: criterion,
            matrix_condition: None,
            calibrated: calibration.is_some(),
            calibration_scales: calibration.map(|c| (c.phi, c.psi)),
        };
        log::info!(
            "solve finished: {} iterations, criterion {}, |r|={:.3e}",
            info.iterations,
            info.convergence_criterion,
            info.residual_l2norm
        );

        Ok(Solution { x, a, ainv, info })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;

    use crate::data::generate_problem;
    use crate::domain::{ConvergenceCriterion, ProblemKind};
    use crate::math::min_symmetric_eigenvalue;
    use crate::testing::warnings_during;

    fn uncalibrated(maxiter: usize, atol: f64, rtol: f64) -> SolverConfig {
        SolverConfig {
            maxiter: Some(maxiter),
            atol,
            rtol,
            calibrate: false,
        }
    }

    fn scenario_system() -> LinearSystem {
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        LinearSystem::from_dense(a, DVector::from_row_slice(&[1.0, 2.0])).unwrap()
    }

    fn random_spd(n: usize, seed: u64) -> LinearSystem {
        let mut rng = StdRng::seed_from_u64(seed);
        let g = DMatrix::<f64>::from_fn(n, n, |_, _| rng.sample(StandardNormal));
        let a = g.transpose() * &g + DMatrix::identity(n, n) * n as f64;
        let b = DVector::<f64>::from_fn(n, |_, _| rng.sample(StandardNormal));
        LinearSystem::from_dense(a, b).unwrap()
    }

    #[test]
    fn two_by_two_converges_on_absolute_tolerance() {
        let solver = SymmetricSolver::new(scenario_system(), Prior::identity(2)).unwrap();
        let (sol, warnings) = warnings_during(|| solver.solve(&uncalibrated(2, 1e-10, 0.0)).unwrap());

        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert!(sol.info.iterations <= 2);
        assert_eq!(sol.info.convergence_criterion, ConvergenceCriterion::ResidAtol);
        assert_relative_eq!(sol.x.mean()[0], 1.0 / 11.0, epsilon = 1e-10);
        assert_relative_eq!(sol.x.mean()[1], 7.0 / 11.0, epsilon = 1e-10);
        assert!(sol.info.matrix_condition.is_none());
    }

    #[test]
    fn zero_iterations_return_the_prior_estimate() {
        let solver = SymmetricSolver::new(scenario_system(), Prior::identity(2)).unwrap();
        let (sol, warnings) = warnings_during(|| solver.solve(&uncalibrated(0, 1e-10, 0.0)).unwrap());

        assert_eq!(warnings.len(), 1, "warnings: {warnings:?}");
        assert!(warnings[0].contains("maximum number of iterations"));
        assert_eq!(sol.info.iterations, 0);
        assert_eq!(sol.info.convergence_criterion, ConvergenceCriterion::Maxiter);
        assert_eq!(sol.x.mean().as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn identity_system_takes_one_step_along_b() {
        let b = DVector::from_row_slice(&[3.0, -1.0, 2.0]);
        let system = LinearSystem::from_dense(DMatrix::identity(3, 3), b.clone()).unwrap();
        let solver = SymmetricSolver::new(system, Prior::scaled(3, 2.0).unwrap()).unwrap();

        let mut first_dir = None;
        let sol = solver
            .solve_with_callback(&uncalibrated(10, 1e-12, 0.0), |snap| {
                if first_dir.is_none() {
                    first_dir = Some(snap.search_dir.clone());
                }
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(sol.info.iterations, 1);
        assert_eq!(sol.info.convergence_criterion, ConvergenceCriterion::ResidAtol);
        assert_relative_eq!(sol.x.mean().clone(), b.clone(), epsilon = 1e-12);
        let s = first_dir.unwrap();
        assert_relative_eq!(s.normalize(), b.normalize(), epsilon = 1e-12);
    }

    #[test]
    fn identity_prior_on_identity_system_is_already_exact() {
        let b = DVector::from_row_slice(&[3.0, -1.0]);
        let system = LinearSystem::from_dense(DMatrix::identity(2, 2), b.clone()).unwrap();
        let solver = SymmetricSolver::new(system, Prior::identity(2)).unwrap();
        let sol = solver.solve(&uncalibrated(10, 1e-12, 0.0)).unwrap();
        assert_eq!(sol.info.iterations, 0);
        assert_eq!(sol.x.mean(), &b);
    }

    #[test]
    fn terminates_within_n_iterations_on_spd() {
        let n = 8;
        let system = random_spd(n, 7);
        let solver = SymmetricSolver::new(system.clone(), Prior::identity(n)).unwrap();
        let sol = solver.solve(&uncalibrated(n, 0.0, 0.0)).unwrap();

        assert!(sol.info.iterations <= n);
        let resid = system.residual(sol.x.mean()).norm();
        assert!(resid <= 1e-8 * system.b.norm(), "residual {resid:e}");
    }

    #[test]
    fn means_interpolate_every_observation() {
        let n = 6;
        let solver = SymmetricSolver::new(random_spd(n, 11), Prior::identity(n)).unwrap();
        let mut pairs = Vec::new();
        let sol = solver
            .solve_with_callback(&uncalibrated(4, 0.0, 0.0), |snap| {
                pairs.push((snap.search_dir.clone(), snap.observation.clone()));
                for (s, y) in &pairs {
                    let scale = y.norm();
                    assert!((snap.a.mean().matvec(s) - y).norm() <= 1e-9 * scale);
                    assert!((snap.ainv.mean().matvec(y) - s).norm() <= 1e-9 * s.norm());
                }
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(pairs.len(), 4);
        assert_eq!(sol.info.iterations, 4);
    }

    #[test]
    fn covariance_factors_stay_symmetric_psd() {
        let n = 6;
        let solver = SymmetricSolver::new(random_spd(n, 3), Prior::identity(n)).unwrap();
        let sol = solver
            .solve_with_callback(&uncalibrated(5, 0.0, 0.0), |snap| {
                for w in [snap.a.cov_factor().to_dense(), snap.ainv.cov_factor().to_dense()] {
                    assert_relative_eq!(w.clone(), w.transpose(), epsilon = 1e-10);
                    assert!(min_symmetric_eigenvalue(&w) > -1e-9);
                }
                let cx = snap.x.cov().to_dense();
                assert!(min_symmetric_eigenvalue(&cx) > -1e-9);
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(sol.info.iterations, 5);
    }

    #[test]
    fn ill_conditioned_kernel_keeps_beliefs_consistent() {
        let n = 60;
        let system = generate_problem(ProblemKind::Kernel, n, 42, 1e8).unwrap();
        let solver = SymmetricSolver::new(system, Prior::identity(n)).unwrap();
        let config = SolverConfig {
            maxiter: Some(2 * n),
            calibrate: false,
            ..SolverConfig::default()
        };

        let mut pairs = Vec::new();
        let mut checked = 0;
        let sol = solver
            .solve_with_callback(&config, |snap| {
                let w_a = snap.a.cov_factor().to_dense();
                let w_h = snap.ainv.cov_factor().to_dense();
                for w in [&w_a, &w_h] {
                    let min = min_symmetric_eigenvalue(w);
                    assert!(min >= -1e-8, "iteration {}: min eigenvalue {min:e}", snap.iteration);
                }

                // Pairs the A belief has absorbed (W_A·s = 0) must be reproduced by its mean.
                pairs.push((snap.search_dir.clone(), snap.observation.clone()));
                let mean = snap.a.mean();
                let mean_norm = mean.to_dense().norm();
                for (s, y) in &pairs {
                    if (&w_a * s).norm() > 1e-9 * s.norm() {
                        continue;
                    }
                    let err = (mean.matvec(s) - y).norm();
                    let bound = 1e-6 * (mean_norm * s.norm() + y.norm());
                    assert!(err <= bound, "iteration {}: interpolation error {err:e}", snap.iteration);
                    checked += 1;
                }
                ControlFlow::Continue(())
            })
            .unwrap();

        assert!(sol.info.iterations >= 1);
        assert!(checked >= sol.info.iterations);
    }

    #[test]
    fn repeated_solves_are_identical() {
        let n = 7;
        let solver = SymmetricSolver::new(random_spd(n, 5), Prior::identity(n)).unwrap();
        let config = uncalibrated(n, 1e-9, 1e-9);
        let first = solver.solve(&config).unwrap();
        let second = solver.solve(&config).unwrap();
        assert_eq!(first.x.mean(), second.x.mean());
        assert_eq!(first.info, second.info);
    }

    #[test]
    fn calibration_runs_when_stopped_early() {
        let n = 20;
        let solver = SymmetricSolver::new(random_spd(n, 21), Prior::identity(n)).unwrap();
        let config = SolverConfig {
            maxiter: Some(10),
            atol: 0.0,
            rtol: 0.0,
            calibrate: true,
        };
        let sol = solver.solve(&config).unwrap();

        assert_eq!(sol.info.iterations, 10);
        assert!(sol.info.calibrated);
        let (phi, psi) = sol.info.calibration_scales.unwrap();
        assert!(phi > 0.0 && psi > 0.0);
        assert!(min_symmetric_eigenvalue(&sol.a.cov_factor().to_dense()) > -1e-9);
    }

    #[test]
    fn few_iterations_skip_calibration() {
        let solver = SymmetricSolver::new(scenario_system(), Prior::identity(2)).unwrap();
        let config = SolverConfig {
            maxiter: Some(2),
            atol: 1e-10,
            rtol: 0.0,
            calibrate: true,
        };
        let sol = solver.solve(&config).unwrap();
        assert!(!sol.info.calibrated);
        assert!(sol.info.calibration_scales.is_none());
    }

    #[test]
    fn callback_break_aborts() {
        let n = 5;
        let solver = SymmetricSolver::new(random_spd(n, 1), Prior::identity(n)).unwrap();
        let err = solver
            .solve_with_callback(&uncalibrated(n, 0.0, 0.0), |snap| {
                if snap.iteration == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap_err();
        assert!(matches!(err, SolverError::Aborted { iteration: 2 }));
    }

    #[test]
    fn zero_curvature_step_is_rejected() {
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, -2.0]);
        let system = LinearSystem::from_dense(a, DVector::from_row_slice(&[3.0, 1.0])).unwrap();
        let solver = SymmetricSolver::new(system, Prior::identity(2)).unwrap();
        let err = solver.solve(&uncalibrated(10, 1e-10, 0.0)).unwrap_err();
        assert!(matches!(err, SolverError::IllConditionedStep { iteration: 0, .. }));
    }

    #[test]
    fn mismatched_prior_fails_at_construction() {
        let err = SymmetricSolver::new(scenario_system(), Prior::identity(3)).unwrap_err();
        assert!(matches!(err, SolverError::ShapeMismatch { .. }));
    }

    #[test]
    fn invalid_config_fails_before_iterating() {
        let solver = SymmetricSolver::new(scenario_system(), Prior::identity(2)).unwrap();
        let bad = SolverConfig {
            rtol: f64::NAN,
            ..SolverConfig::default()
        };
        assert!(matches!(solver.solve(&bad), Err(SolverError::InvalidConfig(_))));
    }
}
