use std::cell::RefCell;

use nalgebra::{DMatrix, DVector};
use num_traits::One;

use crate::{LinearOp, NonLinearOp, Op, Scalar};

use super::OpStatistics;

/// Residual of a backward Euler step of `M x' = f(x, t)` with step size `h`:
///
/// `F(x) = M (x - x_prev) - h f(x, t)`, with jacobian `M - h J(x, t)`.
pub struct ImplicitEulerOp<'a, T, Rhs>
where
    T: Scalar,
    Rhs: NonLinearOp<T = T>,
{
    rhs: &'a Rhs,
    x_prev: DVector<T>,
    h: T,
    mass_matrix: DMatrix<T>,
    tmp: RefCell<DVector<T>>,
    statistics: RefCell<OpStatistics>,
}

impl<'a, T, Rhs> ImplicitEulerOp<'a, T, Rhs>
where
    T: Scalar,
    Rhs: NonLinearOp<T = T>,
{
    /// Create the residual for a step from `(x_prev, t_prev)` of size `h`, the mass matrix is evaluated at `t_prev + h`.
    pub fn new<Mass: LinearOp<T = T>>(
        mass: &Mass,
        rhs: &'a Rhs,
        x_prev: DVector<T>,
        t_prev: T,
        h: T,
    ) -> Self {
        let n = rhs.nstates();
        let mass_matrix = mass.matrix(t_prev + h);
        Self {
            rhs,
            x_prev,
            h,
            mass_matrix,
            tmp: RefCell::new(DVector::zeros(n)),
            statistics: RefCell::new(OpStatistics::default()),
        }
    }
}

impl<T, Rhs> Op for ImplicitEulerOp<'_, T, Rhs>
where
    T: Scalar,
    Rhs: NonLinearOp<T = T>,
{
    type T = T;
    fn nstates(&self) -> usize {
        self.rhs.nstates()
    }
    fn nout(&self) -> usize {
        self.rhs.nout()
    }
    fn nparams(&self) -> usize {
        self.rhs.nparams()
    }
    fn statistics(&self) -> OpStatistics {
        self.statistics.borrow().clone()
    }
}

impl<T, Rhs> NonLinearOp for ImplicitEulerOp<'_, T, Rhs>
where
    T: Scalar,
    Rhs: NonLinearOp<T = T>,
{
    // F(x) = M (x - x_prev) - h f(x, t)
    fn call_inplace(&self, x: &DVector<T>, t: T, y: &mut DVector<T>) {
        self.statistics.borrow_mut().increment_call();
        self.rhs.call_inplace(x, t, y);
        let mut tmp = self.tmp.borrow_mut();
        tmp.copy_from(x);
        *tmp -= &self.x_prev;
        y.gemv(T::one(), &self.mass_matrix, &*tmp, -self.h);
    }

    // J = M - h df/dx
    fn jacobian_inplace(&self, x: &DVector<T>, t: T, y: &mut DMatrix<T>) {
        self.statistics.borrow_mut().increment_matrix();
        self.rhs.jacobian_inplace(x, t, y);
        *y *= -self.h;
        *y += &self.mass_matrix;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::robertson, MassOp, RhsOp};

    #[test]
    fn test_residual_and_jacobian() {
        let model = robertson::definition::<f64>();
        let p = model.default_parameters.clone();
        let k = model.default_constants.clone();
        let mass = MassOp::new(&model, &p, &k);
        let rhs = RhsOp::new(&model, &p, &k);
        let x_prev = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        let h = 0.1;
        let op = ImplicitEulerOp::new(&mass, &rhs, x_prev, 0.0, h);

        // at x = x_prev the residual is -h f(x_prev)
        let x = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        let r = op.call(&x, h);
        assert!((r[0] - 0.004).abs() < 1e-15);
        assert!((r[1] + 0.004).abs() < 1e-15);
        assert_eq!(r[2], 0.0);

        let j = op.jacobian(&x, h);
        let f_jac = rhs.jacobian(&x, h);
        let m = mass.matrix(h);
        assert_eq!(j, m - f_jac * h);
        assert_eq!(op.statistics().number_of_calls, 1);
        assert_eq!(op.statistics().number_of_matrix_evals, 1);
    }
}
