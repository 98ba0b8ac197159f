use nalgebra::{DMatrix, DVector};
use num_traits::{One, Zero};
use serde::Serialize;

use crate::Scalar;

pub mod implicit_euler;
pub mod mass;
pub mod rhs;

/// A generic operator trait.
///
/// Op is a trait for operators that, given a parameter vector `p` and constants `k`, operate on an input vector `x` to produce an output vector `y`.
/// It defines the number of states (i.e. length of `x`), the number of outputs (i.e. length of `y`), and number of parameters (i.e. length of `p`) of the operator.
pub trait Op {
    type T: Scalar;

    /// Return the number of input states of the operator.
    fn nstates(&self) -> usize;

    /// Return the number of outputs of the operator.
    fn nout(&self) -> usize;

    /// Return the number of parameters of the operator.
    fn nparams(&self) -> usize;

    /// Return statistics about the operator (e.g. how many times it was called, how many times the jacobian was computed, etc.)
    fn statistics(&self) -> OpStatistics {
        OpStatistics::default()
    }
}

/// A linear operator `y = A(t) x`.
pub trait LinearOp: Op {
    /// Compute `y = A x + beta * y`
    fn gemv_inplace(
        &self,
        x: &DVector<Self::T>,
        t: Self::T,
        beta: Self::T,
        y: &mut DVector<Self::T>,
    );

    /// Write the dense matrix `A(t)` into `y`
    fn matrix_inplace(&self, t: Self::T, y: &mut DMatrix<Self::T>);

    fn matrix(&self, t: Self::T) -> DMatrix<Self::T> {
        let mut y = DMatrix::zeros(self.nout(), self.nstates());
        self.matrix_inplace(t, &mut y);
        y
    }
}

/// A nonlinear operator `y = F(x, t)` with a dense jacobian.
pub trait NonLinearOp: Op {
    /// Compute the operator `F(x, t)` at a given state and time.
    fn call_inplace(&self, x: &DVector<Self::T>, t: Self::T, y: &mut DVector<Self::T>);

    /// Write the jacobian `dF/dx` at `(x, t)` into `y`
    fn jacobian_inplace(&self, x: &DVector<Self::T>, t: Self::T, y: &mut DMatrix<Self::T>);

    /// Compute the product of the jacobian with a given vector `y = J(x, t) v`.
    fn jac_mul_inplace(
        &self,
        x: &DVector<Self::T>,
        t: Self::T,
        v: &DVector<Self::T>,
        y: &mut DVector<Self::T>,
    ) {
        let mut jac = DMatrix::zeros(self.nout(), self.nstates());
        self.jacobian_inplace(x, t, &mut jac);
        y.gemv(Self::T::one(), &jac, v, Self::T::zero());
    }

    fn call(&self, x: &DVector<Self::T>, t: Self::T) -> DVector<Self::T> {
        let mut y = DVector::zeros(self.nout());
        self.call_inplace(x, t, &mut y);
        y
    }

    fn jacobian(&self, x: &DVector<Self::T>, t: Self::T) -> DMatrix<Self::T> {
        let mut y = DMatrix::zeros(self.nout(), self.nstates());
        self.jacobian_inplace(x, t, &mut y);
        y
    }
}

#[derive(Default, Clone, Debug, Serialize)]
pub struct OpStatistics {
    pub number_of_calls: usize,
    pub number_of_jac_muls: usize,
    pub number_of_matrix_evals: usize,
}

impl OpStatistics {
    pub fn increment_call(&mut self) {
        self.number_of_calls += 1;
    }

    pub fn increment_jac_mul(&mut self) {
        self.number_of_jac_muls += 1;
    }

    pub fn increment_matrix(&mut self) {
        self.number_of_matrix_evals += 1;
    }
}

impl<C: Op> Op for &C {
    type T = C::T;
    fn nstates(&self) -> usize {
        C::nstates(*self)
    }
    fn nout(&self) -> usize {
        C::nout(*self)
    }
    fn nparams(&self) -> usize {
        C::nparams(*self)
    }
    fn statistics(&self) -> OpStatistics {
        C::statistics(*self)
    }
}

impl<C: NonLinearOp> NonLinearOp for &C {
    fn call_inplace(&self, x: &DVector<Self::T>, t: Self::T, y: &mut DVector<Self::T>) {
        C::call_inplace(*self, x, t, y)
    }
    fn jacobian_inplace(&self, x: &DVector<Self::T>, t: Self::T, y: &mut DMatrix<Self::T>) {
        C::jacobian_inplace(*self, x, t, y)
    }
}

impl<C: LinearOp> LinearOp for &C {
    fn gemv_inplace(
        &self,
        x: &DVector<Self::T>,
        t: Self::T,
        beta: Self::T,
        y: &mut DVector<Self::T>,
    ) {
        C::gemv_inplace(*self, x, t, beta, y)
    }
    fn matrix_inplace(&self, t: Self::T, y: &mut DMatrix<Self::T>) {
        C::matrix_inplace(*self, t, y)
    }
}
