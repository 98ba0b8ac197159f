use std::cell::RefCell;

use nalgebra::{DMatrix, DVector};
use num_traits::{One, Zero};

use crate::{ModelDefinition, NonLinearOp, Op, Scalar};

use super::OpStatistics;

/// Right-hand side `f(x, t)` of a generated model, with the parameters and constants fixed.
pub struct RhsOp<'a, T: Scalar> {
    model: &'a ModelDefinition<T>,
    p: &'a [T],
    k: &'a [T],
    statistics: RefCell<OpStatistics>,
}

impl<'a, T: Scalar> RhsOp<'a, T> {
    pub fn new(model: &'a ModelDefinition<T>, p: &'a [T], k: &'a [T]) -> Self {
        Self {
            model,
            p,
            k,
            statistics: RefCell::new(OpStatistics::default()),
        }
    }
}

impl<T: Scalar> Op for RhsOp<'_, T> {
    type T = T;
    fn nstates(&self) -> usize {
        self.model.nx
    }
    fn nout(&self) -> usize {
        self.model.nx
    }
    fn nparams(&self) -> usize {
        self.model.np
    }
    fn statistics(&self) -> OpStatistics {
        self.statistics.borrow().clone()
    }
}

impl<T: Scalar> NonLinearOp for RhsOp<'_, T> {
    fn call_inplace(&self, x: &DVector<T>, t: T, y: &mut DVector<T>) {
        self.statistics.borrow_mut().increment_call();
        (self.model.rhs)(y.as_mut_slice(), t, x.as_slice(), self.p, self.k);
    }

    fn jacobian_inplace(&self, x: &DVector<T>, t: T, y: &mut DMatrix<T>) {
        self.statistics.borrow_mut().increment_matrix();
        y.fill(T::zero());
        (self.model.jacobian)(y.as_mut_slice(), t, x.as_slice(), self.p, self.k);
    }

    fn jac_mul_inplace(&self, x: &DVector<T>, t: T, v: &DVector<T>, y: &mut DVector<T>) {
        self.statistics.borrow_mut().increment_jac_mul();
        let mut jac = DMatrix::zeros(self.nout(), self.nstates());
        (self.model.jacobian)(jac.as_mut_slice(), t, x.as_slice(), self.p, self.k);
        y.gemv(T::one(), &jac, v, T::zero());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::robertson;

    #[test]
    fn test_rhs_call_and_jac_mul() {
        let model = robertson::definition::<f64>();
        let op = RhsOp::new(&model, &model.default_parameters, &model.default_constants);
        let x = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        assert_eq!(op.call(&x, 0.0).as_slice(), &[-0.04, 0.04, 0.0]);

        let v = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        let mut y = DVector::zeros(3);
        op.jac_mul_inplace(&x, 0.0, &v, &mut y);
        assert_eq!(y.as_slice(), &[-0.04, 0.04, 1.0]);

        let stats = op.statistics();
        assert_eq!(stats.number_of_calls, 1);
        assert_eq!(stats.number_of_jac_muls, 1);
        assert_eq!(stats.number_of_matrix_evals, 0);
    }
}
