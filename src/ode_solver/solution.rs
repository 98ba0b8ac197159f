use nalgebra::DMatrix;
use serde::Serialize;

use crate::{error::ModelError, model::state_index, Scalar};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SolverStatistics {
    pub number_of_steps: usize,
    pub number_of_error_test_failures: usize,
    pub number_of_nonlinear_solver_iterations: usize,
    pub number_of_nonlinear_solver_fails: usize,
    pub number_of_rhs_evals: usize,
    pub number_of_jac_evals: usize,
}

/// States of a model at the requested output times.
#[derive(Debug, Clone)]
pub struct Solution<T: Scalar> {
    pub ts: Vec<T>,
    /// one column per output time
    pub ys: DMatrix<T>,
    pub state_ids: &'static [&'static str],
    pub statistics: SolverStatistics,
}

impl<T: Scalar> Solution<T> {
    /// Trajectory of the state named `id`.
    pub fn state_by_id(&self, id: &str) -> Result<Vec<T>, ModelError> {
        let index = state_index(self.state_ids, id)?;
        Ok(self.ys.row(index).iter().copied().collect())
    }
}
