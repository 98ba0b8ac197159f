use serde::{Deserialize, Serialize};

use crate::{
    error::{ModelError, OdeSolverError},
    ode_solver_error, Scalar,
};

/// Tolerances and step size controls for [crate::ImplicitEuler].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions<T: Scalar> {
    pub rtol: T,
    pub atol: T,
    pub initial_step: T,
    pub minimum_step: T,
    pub max_steps: usize,
    pub max_newton_iterations: usize,
    pub max_step_growth: T,
    pub min_step_shrink: T,
    /// tolerance on the algebraic residuals of the initial state
    pub consistency_tol: T,
}

impl<T: Scalar> Default for SolverOptions<T> {
    fn default() -> Self {
        Self {
            rtol: T::cast(1e-6),
            atol: T::cast(1e-10),
            initial_step: T::cast(1e-6),
            minimum_step: T::cast(1e-14),
            max_steps: 500_000,
            max_newton_iterations: 10,
            max_step_growth: T::cast(5.0),
            min_step_shrink: T::cast(0.2),
            consistency_tol: T::cast(1e-8),
        }
    }
}

impl<T: Scalar> SolverOptions<T> {
    pub fn validate(&self) -> Result<(), ModelError> {
        let zero = T::cast(0.0);
        let one = T::cast(1.0);
        if self.rtol <= zero || self.atol < zero {
            return Err(ode_solver_error!(
                InvalidOptions,
                "rtol must be positive and atol non-negative"
            ));
        }
        if self.minimum_step <= zero || self.initial_step < self.minimum_step {
            return Err(ode_solver_error!(
                InvalidOptions,
                "initial_step must be at least minimum_step, which must be positive"
            ));
        }
        if self.max_step_growth <= one {
            return Err(ode_solver_error!(
                InvalidOptions,
                "max_step_growth must be greater than one"
            ));
        }
        if self.min_step_shrink <= zero || self.min_step_shrink >= one {
            return Err(ode_solver_error!(
                InvalidOptions,
                "min_step_shrink must be between zero and one"
            ));
        }
        if self.max_steps == 0 || self.max_newton_iterations == 0 {
            return Err(ode_solver_error!(
                InvalidOptions,
                "max_steps and max_newton_iterations must be non-zero"
            ));
        }
        Ok(())
    }
}
