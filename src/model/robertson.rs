//! Generated functions for the Robertson chemical kinetics problem, written as a semi-explicit DAE:
//!
//! ```text
//! dx1/dt = -p1*x1 + p2*x2*x3
//! dx2/dt =  p1*x1 - p2*x2*x3 - p3*x2^2
//!      0 =  x1 + x2 + x3 - k1
//! ```
//!
//! Matrices are dense and column-major, so entry `(row, col)` lives at `row + col * NX`.
use num_traits::{One, Zero};

use crate::{ModelDefinition, Scalar};

pub const NAME: &str = "robertson";
pub const NX: usize = 3;
pub const NP: usize = 3;
pub const NK: usize = 1;

pub const STATE_IDS: [&str; NX] = ["x1", "x2", "x3"];
pub const PARAMETER_IDS: [&str; NP] = ["p1", "p2", "p3"];
pub const CONSTANT_IDS: [&str; NK] = ["k1"];

pub const DEFAULT_PARAMETERS: [f64; NP] = [0.04, 1.0e4, 3.0e7];
pub const DEFAULT_CONSTANTS: [f64; NK] = [1.0];

/// Mass matrix. Only (0,0) and (1,1) are written; (2,2) keeps the caller's zero, marking `x3` as algebraic.
pub fn mass_matrix<T: Scalar>(m: &mut [T], _t: T, _x: &[T], _p: &[T], _k: &[T]) {
    m[0] = T::one();
    m[4] = T::one();
}

pub fn rhs<T: Scalar>(f: &mut [T], _t: T, x: &[T], p: &[T], k: &[T]) {
    f[0] = -p[0] * x[0] + p[1] * x[1] * x[2];
    f[1] = p[0] * x[0] - p[1] * x[1] * x[2] - p[2] * x[1] * x[1];
    f[2] = x[0] + x[1] + x[2] - k[0];
}

/// Dense jacobian of [rhs] with respect to the states; entries that are structurally zero are left untouched.
pub fn jacobian<T: Scalar>(j: &mut [T], _t: T, x: &[T], p: &[T], _k: &[T]) {
    let two = T::one() + T::one();
    j[0] = -p[0];
    j[1] = p[0];
    j[2] = T::one();
    j[3] = p[1] * x[2];
    j[4] = -p[1] * x[2] - two * p[2] * x[1];
    j[5] = T::one();
    j[6] = p[1] * x[1];
    j[7] = -p[1] * x[1];
    j[8] = T::one();
}

pub fn initial_states<T: Scalar>(x0: &mut [T], _t: T, _p: &[T], k: &[T]) {
    x0[0] = k[0];
    x0[1] = T::zero();
    x0[2] = T::zero();
}

pub fn definition<T: Scalar>() -> ModelDefinition<T> {
    ModelDefinition {
        name: NAME,
        nx: NX,
        np: NP,
        nk: NK,
        state_ids: &STATE_IDS,
        parameter_ids: &PARAMETER_IDS,
        constant_ids: &CONSTANT_IDS,
        default_parameters: DEFAULT_PARAMETERS.iter().map(|&v| T::cast(v)).collect(),
        default_constants: DEFAULT_CONSTANTS.iter().map(|&v| T::cast(v)).collect(),
        mass: mass_matrix::<T>,
        rhs: rhs::<T>,
        jacobian: jacobian::<T>,
        initial_states: initial_states::<T>,
    }
}
