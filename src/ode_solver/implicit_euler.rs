use log::{debug, info};
use nalgebra::{DMatrix, DVector};
use num_traits::One;

use crate::{
    error::{ModelError, OdeSolverError},
    nonlinear_solver::convergence::wrms_norm,
    scalar::to_f64,
    Convergence, ImplicitEulerOp, JacobianUpdate, MassOp, ModelProblem, NewtonNonlinearSolver,
    Op, RhsOp, Scalar, Solution, SolverStatistics,
};

/// Variable step backward Euler integrator for `M x' = f(x, t)`.
///
/// Each step solves `M (x_{n+1} - x_n) = h f(x_{n+1}, t_{n+1})` with Newton's method. The local error is
/// estimated from the difference between the corrected state and a linear extrapolation of the last two
/// states, and output times are hit exactly by shortening the step.
pub struct ImplicitEuler<T: Scalar> {
    nonlinear_solver: NewtonNonlinearSolver<T>,
    statistics: SolverStatistics,
}

impl<T: Scalar> Default for ImplicitEuler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> ImplicitEuler<T> {
    pub fn new() -> Self {
        Self {
            nonlinear_solver: NewtonNonlinearSolver::new(JacobianUpdate::EveryIteration),
            statistics: SolverStatistics::default(),
        }
    }

    /// Statistics of the last call to [Self::solve].
    pub fn statistics(&self) -> &SolverStatistics {
        &self.statistics
    }

    fn check_finite(time: T) -> Result<(), ModelError> {
        if time > -T::INFINITY && time < T::INFINITY {
            Ok(())
        } else {
            Err(ModelError::from(OdeSolverError::NonFiniteTime(to_f64(time))))
        }
    }

    fn step_size_too_small(time: T) -> ModelError {
        ModelError::from(OdeSolverError::StepSizeTooSmall {
            time: to_f64(time),
        })
    }

    /// Integrate `problem` from its initial time, returning the states at each time in `t_eval`.
    ///
    /// `t_eval` must be finite, non-decreasing and start no earlier than the problem's initial time.
    pub fn solve(
        &mut self,
        problem: &ModelProblem<T>,
        t_eval: &[T],
    ) -> Result<Solution<T>, ModelError> {
        self.statistics = SolverStatistics::default();
        let options = &problem.options;
        options.validate()?;
        let model = &problem.model;
        let p = problem.p.as_slice();
        let k = problem.k.as_slice();

        Self::check_finite(problem.t0)?;
        let mut t = problem.t0;
        let mut x = problem.initial_states()?;
        model.check_consistency(t, x.as_slice(), p, k, options.consistency_tol)?;

        let mut state_time = t;
        for &stop_time in t_eval {
            Self::check_finite(stop_time)?;
            if stop_time < state_time {
                return Err(ModelError::from(
                    OdeSolverError::StopTimeBeforeCurrentTime {
                        stop_time: to_f64(stop_time),
                        state_time: to_f64(state_time),
                    },
                ));
            }
            state_time = stop_time;
        }

        let mass = MassOp::new(model, p, k);
        let rhs = RhsOp::new(model, p, k);
        let atol = DVector::from_element(model.nx, options.atol);
        let mut convergence = Convergence::new(options.rtol, &atol);
        convergence.set_max_iter(options.max_newton_iterations);

        let one = T::one();
        let safety = T::cast(0.9);
        let mut ys = DMatrix::zeros(model.nx, t_eval.len());
        let mut h = options.initial_step;
        // last accepted state and the step size that left it
        let mut last_step: Option<(DVector<T>, T)> = None;

        for (i, &t_out) in t_eval.iter().enumerate() {
            while t < t_out {
                if self.statistics.number_of_steps >= options.max_steps {
                    return Err(ModelError::from(OdeSolverError::TooManySteps {
                        max_steps: options.max_steps,
                        time: to_f64(t),
                    }));
                }
                let remaining = t_out - t;
                let truncated = h >= remaining;
                let h_step = if truncated { remaining } else { h };
                let t_new = t + h_step;

                let (x_pred, h_old) = match &last_step {
                    Some((x_old, h_old)) => (&x + (&x - x_old) * (h_step / *h_old), *h_old),
                    None => (x.clone(), h_step),
                };

                let op = ImplicitEulerOp::new(&mass, &rhs, x.clone(), t, h_step);
                self.nonlinear_solver.set_problem(&op);
                let mut x_new = x_pred.clone();
                let result = self.nonlinear_solver.solve_in_place(
                    &op,
                    &mut x_new,
                    t_new,
                    &x,
                    &mut convergence,
                );
                self.statistics.number_of_nonlinear_solver_iterations += convergence.niter();
                match result {
                    Ok(()) => {}
                    Err(ModelError::NonLinearSolverError(e)) => {
                        self.statistics.number_of_nonlinear_solver_fails += 1;
                        debug!("nonlinear solve failed at t = {t} with h = {h_step}: {e}");
                        h = h_step * T::cast(0.25);
                        if h < options.minimum_step {
                            return Err(Self::step_size_too_small(t));
                        }
                        continue;
                    }
                    Err(e) => return Err(e),
                }

                let error = (&x_new - &x_pred) * (h_step / (h_step + h_old));
                let error_norm = wrms_norm(&error, &x_new, &atol, options.rtol);
                if Scalar::is_nan(error_norm) || error_norm > one {
                    self.statistics.number_of_error_test_failures += 1;
                    let factor = if Scalar::is_nan(error_norm) {
                        options.min_step_shrink
                    } else {
                        (safety / error_norm.sqrt()).max(options.min_step_shrink)
                    };
                    h = h_step * factor;
                    debug!("error test failed at t = {t}, reducing step to {h}");
                    if h < options.minimum_step {
                        return Err(Self::step_size_too_small(t));
                    }
                    continue;
                }

                let x_old = std::mem::replace(&mut x, x_new);
                last_step = Some((x_old, h_step));
                t = if truncated { t_out } else { t_new };
                self.statistics.number_of_steps += 1;

                let factor = if error_norm <= T::EPSILON {
                    options.max_step_growth
                } else {
                    (safety / error_norm.sqrt()).min(options.max_step_growth)
                };
                let proposal = h_step * factor;
                h = if truncated { proposal.max(h) } else { proposal };
            }
            ys.column_mut(i).copy_from(&x);
        }

        let rhs_statistics = rhs.statistics();
        self.statistics.number_of_rhs_evals = rhs_statistics.number_of_calls;
        self.statistics.number_of_jac_evals = rhs_statistics.number_of_matrix_evals;
        info!(
            "solved model {} to t = {} in {} steps ({} error test failures, {} nonlinear solver failures)",
            model.name,
            t,
            self.statistics.number_of_steps,
            self.statistics.number_of_error_test_failures,
            self.statistics.number_of_nonlinear_solver_fails
        );

        Ok(Solution {
            ts: t_eval.to_vec(),
            ys,
            state_ids: model.state_ids,
            statistics: self.statistics.clone(),
        })
    }
}
