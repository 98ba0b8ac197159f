use nalgebra::{DMatrix, DVector, Dyn};

use crate::{
    error::{ModelError, NonLinearSolverError},
    non_linear_solver_error, Convergence, ConvergenceStatus, NonLinearOp, Scalar,
};

pub fn newton_iteration<T: Scalar>(
    xn: &mut DVector<T>,
    tmp: &mut DVector<T>,
    error_y: &DVector<T>,
    fun: impl Fn(&DVector<T>, &mut DVector<T>),
    mut linear_solver: impl FnMut(&DVector<T>, &mut DVector<T>) -> Result<(), ModelError>,
    convergence: &mut Convergence<T>,
) -> Result<(), ModelError> {
    convergence.reset();
    loop {
        fun(xn, tmp);
        //tmp = f_at_n

        linear_solver(xn, tmp)?;
        //tmp = -delta_n

        *xn -= &*tmp;
        // xn = xn + delta_n

        let res = convergence.check_new_iteration(tmp, error_y);
        match res {
            ConvergenceStatus::Continue => continue,
            ConvergenceStatus::Converged => return Ok(()),
            ConvergenceStatus::Diverged => break,
            ConvergenceStatus::MaximumIterations => break,
        }
    }
    Err(non_linear_solver_error!(NewtonDidNotConverge))
}

fn lu_solve_in_place<T: Scalar>(
    lu: Option<&nalgebra::LU<T, Dyn, Dyn>>,
    x: &mut DVector<T>,
) -> Result<(), ModelError> {
    let lu = lu.ok_or_else(|| {
        ModelError::from(NonLinearSolverError::Other(
            "jacobian not set".to_string(),
        ))
    })?;
    match lu.solve_mut(x) {
        true => Ok(()),
        false => Err(non_linear_solver_error!(LuSolveFailed)),
    }
}

/// When the jacobian used by [NewtonNonlinearSolver] is recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JacobianUpdate {
    /// only on [NewtonNonlinearSolver::reset_jacobian] (chord iteration)
    #[default]
    OnReset,
    /// at every iterate
    EveryIteration,
}

/// Newton solver for `F(x) = 0`, using a dense LU factorisation of the jacobian from the `nalgebra` library.
///
/// With [JacobianUpdate::OnReset] the jacobian is only recomputed by [NewtonNonlinearSolver::reset_jacobian].
pub struct NewtonNonlinearSolver<T: Scalar> {
    jacobian_update: JacobianUpdate,
    matrix: DMatrix<T>,
    lu: Option<nalgebra::LU<T, Dyn, Dyn>>,
    tmp: DVector<T>,
}

impl<T: Scalar> Default for NewtonNonlinearSolver<T> {
    fn default() -> Self {
        Self::new(JacobianUpdate::default())
    }
}

impl<T: Scalar> NewtonNonlinearSolver<T> {
    pub fn new(jacobian_update: JacobianUpdate) -> Self {
        Self {
            jacobian_update,
            matrix: DMatrix::zeros(0, 0),
            lu: None,
            tmp: DVector::zeros(0),
        }
    }

    pub fn is_jacobian_set(&self) -> bool {
        self.lu.is_some()
    }

    /// Set the problem to be solved, any previous jacobian is discarded.
    pub fn set_problem<C: NonLinearOp<T = T>>(&mut self, op: &C) {
        self.matrix = DMatrix::zeros(op.nout(), op.nstates());
        self.tmp = DVector::zeros(op.nstates());
        self.lu = None;
    }

    /// Recompute and factorise the jacobian of `op` at `(x, t)`.
    pub fn reset_jacobian<C: NonLinearOp<T = T>>(&mut self, op: &C, x: &DVector<T>, t: T) {
        op.jacobian_inplace(x, t, &mut self.matrix);
        self.lu = Some(self.matrix.clone().lu());
    }

    /// Solve the linearised problem `J * x = b`, where `J` was calculated using [Self::reset_jacobian].
    /// The input `b` is provided in `x`, and the solution is returned in `x`.
    pub fn solve_linearised_in_place(&self, x: &mut DVector<T>) -> Result<(), ModelError> {
        lu_solve_in_place(self.lu.as_ref(), x)
    }

    /// Solve the problem `F(x) = 0` in place, starting from the value of `xn`.
    pub fn solve_in_place<C: NonLinearOp<T = T>>(
        &mut self,
        op: &C,
        xn: &mut DVector<T>,
        t: T,
        error_y: &DVector<T>,
        convergence: &mut Convergence<T>,
    ) -> Result<(), ModelError> {
        if xn.len() != op.nstates() {
            let error = NonLinearSolverError::WrongStateLength {
                expected: op.nstates(),
                found: xn.len(),
            };
            return Err(ModelError::from(error));
        }
        if self.tmp.len() != op.nstates() {
            self.tmp = DVector::zeros(op.nstates());
        }
        if self.matrix.shape() != (op.nout(), op.nstates()) {
            self.matrix = DMatrix::zeros(op.nout(), op.nstates());
        }
        let mut tmp = std::mem::replace(&mut self.tmp, DVector::zeros(0));
        let jacobian_update = self.jacobian_update;
        let matrix = &mut self.matrix;
        let lu = &mut self.lu;
        let linear_solver = |x: &DVector<T>, b: &mut DVector<T>| {
            if jacobian_update == JacobianUpdate::EveryIteration {
                op.jacobian_inplace(x, t, matrix);
                *lu = Some(matrix.clone().lu());
            }
            lu_solve_in_place(lu.as_ref(), b)
        };
        let fun = |x: &DVector<T>, y: &mut DVector<T>| op.call_inplace(x, t, y);
        let result = newton_iteration(xn, &mut tmp, error_y, fun, linear_solver, convergence);
        self.tmp = tmp;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::robertson, ImplicitEulerOp, MassOp, Op, RhsOp};

    // F(x) = x^2 - 4, solved component-wise
    struct Square;

    impl Op for Square {
        type T = f64;
        fn nstates(&self) -> usize {
            2
        }
        fn nout(&self) -> usize {
            2
        }
        fn nparams(&self) -> usize {
            0
        }
    }

    impl NonLinearOp for Square {
        fn call_inplace(&self, x: &DVector<f64>, _t: f64, y: &mut DVector<f64>) {
            y.copy_from(&x.map(|v| v * v - 4.0));
        }
        fn jacobian_inplace(&self, x: &DVector<f64>, _t: f64, y: &mut DMatrix<f64>) {
            y.fill(0.0);
            y.set_diagonal(&x.map(|v| 2.0 * v));
        }
    }

    #[test]
    fn test_newton_with_fixed_jacobian() {
        let op = Square;
        let mut solver = NewtonNonlinearSolver::default();
        solver.set_problem(&op);
        let mut x = DVector::from_vec(vec![2.1, -1.9]);
        solver.reset_jacobian(&op, &x, 0.0);
        let atol = DVector::from_element(2, 1e-10);
        let mut conv = Convergence::new(1e-10, &atol);
        conv.set_max_iter(50);
        let y = x.clone();
        solver
            .solve_in_place(&op, &mut x, 0.0, &y, &mut conv)
            .unwrap();
        assert!((x[0] - 2.0).abs() < 1e-8);
        assert!((x[1] + 2.0).abs() < 1e-8);
    }

    #[test]
    fn test_solve_linearised_uses_reset_jacobian() {
        let op = Square;
        let mut solver = NewtonNonlinearSolver::default();
        solver.set_problem(&op);
        let mut b = DVector::from_vec(vec![4.2, 3.8]);
        assert!(solver.solve_linearised_in_place(&mut b).is_err());

        let x = DVector::from_vec(vec![2.1, -1.9]);
        solver.reset_jacobian(&op, &x, 0.0);
        assert!(solver.is_jacobian_set());
        solver.solve_linearised_in_place(&mut b).unwrap();
        assert!((b[0] - 1.0).abs() < 1e-14);
        assert!((b[1] + 1.0).abs() < 1e-14);

        // one chord step by hand: x - J^-1 F(x)
        let mut step = op.call(&x, 0.0);
        solver.solve_linearised_in_place(&mut step).unwrap();
        let x1 = &x - step;
        assert!((x1[0] - 2.0).abs() < 3e-3);
        assert!((x1[1] + 2.0).abs() < 3e-3);
    }

    #[test]
    fn test_newton_without_jacobian() {
        let op = Square;
        let mut solver = NewtonNonlinearSolver::default();
        solver.set_problem(&op);
        assert!(!solver.is_jacobian_set());
        let mut x = DVector::from_vec(vec![2.1, -1.9]);
        let atol = DVector::from_element(2, 1e-10);
        let mut conv = Convergence::new(1e-10, &atol);
        let y = x.clone();
        assert!(solver
            .solve_in_place(&op, &mut x, 0.0, &y, &mut conv)
            .is_err());
    }

    #[test]
    fn test_newton_wrong_state_length() {
        let op = Square;
        let mut solver = NewtonNonlinearSolver::default();
        solver.set_problem(&op);
        let mut x = DVector::from_vec(vec![2.1]);
        let atol = DVector::from_element(2, 1e-10);
        let mut conv = Convergence::new(1e-10, &atol);
        let y = x.clone();
        let err = solver
            .solve_in_place(&op, &mut x, 0.0, &y, &mut conv)
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::NonLinearSolverError(NonLinearSolverError::WrongStateLength {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_newton_singular_jacobian() {
        let op = Square;
        let mut solver = NewtonNonlinearSolver::default();
        solver.set_problem(&op);
        let mut x = DVector::from_vec(vec![0.0, 0.0]);
        solver.reset_jacobian(&op, &x, 0.0);
        let atol = DVector::from_element(2, 1e-10);
        let mut conv = Convergence::new(1e-10, &atol);
        let y = x.clone();
        let err = solver
            .solve_in_place(&op, &mut x, 0.0, &y, &mut conv)
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::NonLinearSolverError(NonLinearSolverError::LuSolveFailed)
        ));
    }

    #[test]
    fn test_implicit_euler_step_satisfies_constraint() {
        let model = robertson::definition::<f64>();
        let p = model.default_parameters.clone();
        let k = model.default_constants.clone();
        let mass = MassOp::new(&model, &p, &k);
        let rhs = RhsOp::new(&model, &p, &k);
        let x0 = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        let h = 1e-3;
        let op = ImplicitEulerOp::new(&mass, &rhs, x0.clone(), 0.0, h);

        let mut solver = NewtonNonlinearSolver::new(JacobianUpdate::EveryIteration);
        solver.set_problem(&op);
        let mut x = x0.clone();
        let atol = DVector::from_element(3, 1e-12);
        let mut conv = Convergence::new(1e-10, &atol);
        conv.set_max_iter(20);
        solver
            .solve_in_place(&op, &mut x, h, &x0, &mut conv)
            .unwrap();
        assert!((x.sum() - 1.0).abs() < 1e-12);
        assert!(x[0] < 1.0);
        assert!(x[1] > 0.0);
        assert!(op.call(&x, h).amax() < 1e-10);
    }
}
