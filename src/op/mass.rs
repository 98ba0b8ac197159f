use std::cell::RefCell;

use nalgebra::{DMatrix, DVector};
use num_traits::{One, Zero};

use crate::{LinearOp, ModelDefinition, Op, Scalar};

use super::OpStatistics;

/// Mass matrix of a generated model as a [LinearOp], with the parameters and constants fixed.
///
/// Generated mass matrices are evaluated at a zero state, so state dependent mass matrices are not supported.
pub struct MassOp<'a, T: Scalar> {
    model: &'a ModelDefinition<T>,
    p: &'a [T],
    k: &'a [T],
    x: Vec<T>,
    statistics: RefCell<OpStatistics>,
}

impl<'a, T: Scalar> MassOp<'a, T> {
    pub fn new(model: &'a ModelDefinition<T>, p: &'a [T], k: &'a [T]) -> Self {
        Self {
            model,
            p,
            k,
            x: vec![T::zero(); model.nx],
            statistics: RefCell::new(OpStatistics::default()),
        }
    }
}

impl<T: Scalar> Op for MassOp<'_, T> {
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

impl<T: Scalar> LinearOp for MassOp<'_, T> {
    fn gemv_inplace(&self, x: &DVector<T>, t: T, beta: T, y: &mut DVector<T>) {
        self.statistics.borrow_mut().increment_call();
        let mut m = DMatrix::zeros(self.nout(), self.nstates());
        (self.model.mass)(m.as_mut_slice(), t, &self.x, self.p, self.k);
        y.gemv(T::one(), &m, x, beta);
    }

    fn matrix_inplace(&self, t: T, y: &mut DMatrix<T>) {
        self.statistics.borrow_mut().increment_matrix();
        y.fill(T::zero());
        (self.model.mass)(y.as_mut_slice(), t, &self.x, self.p, self.k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::robertson;

    #[test]
    fn test_mass_gemv() {
        let model = robertson::definition::<f64>();
        let op = MassOp::new(&model, &model.default_parameters, &model.default_constants);
        let x = DVector::from_vec(vec![2.0, 3.0, 4.0]);
        let mut y = DVector::from_vec(vec![1.0, 1.0, 1.0]);
        op.gemv_inplace(&x, 0.0, 0.5, &mut y);
        assert_eq!(y.as_slice(), &[2.5, 3.5, 0.5]);
        assert_eq!(op.statistics().number_of_calls, 1);
    }

    #[test]
    fn test_mass_matrix_overwrites_buffer() {
        let model = robertson::definition::<f64>();
        let op = MassOp::new(&model, &model.default_parameters, &model.default_constants);
        let mut m = DMatrix::from_element(3, 3, 9.0);
        op.matrix_inplace(0.0, &mut m);
        assert_eq!(m, DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 1.0, 0.0])));
        assert_eq!(op.matrix(0.0), m);
        assert_eq!(op.statistics().number_of_matrix_evals, 2);
    }
}
