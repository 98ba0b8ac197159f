use nalgebra::DVector;
use num_traits::{One, Zero};

use crate::{scalar::IndexType, Scalar};

/// Convergence test for a Newton iteration, using a weighted root-mean-square norm of the update.
#[derive(Clone)]
pub struct Convergence<'a, T: Scalar> {
    pub rtol: T,
    pub atol: &'a DVector<T>,
    tol: T,
    max_iter: IndexType,
    niter: IndexType,
    old_norm: Option<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    Converged,
    Diverged,
    Continue,
    MaximumIterations,
}

impl<'a, T: Scalar> Convergence<'a, T> {
    pub fn new(rtol: T, atol: &'a DVector<T>) -> Self {
        Self {
            rtol,
            atol,
            tol: T::cast(0.33),
            max_iter: 10,
            niter: 0,
            old_norm: None,
        }
    }
    pub fn max_iter(&self) -> IndexType {
        self.max_iter
    }
    pub fn set_max_iter(&mut self, value: IndexType) {
        self.max_iter = value;
    }
    pub fn niter(&self) -> IndexType {
        self.niter
    }
    pub fn reset(&mut self) {
        self.niter = 0;
        self.old_norm = None;
    }

    /// Weighted RMS norm of `dy`, with weights `atol + rtol * |y|`.
    pub fn norm(&self, dy: &DVector<T>, y: &DVector<T>) -> T {
        wrms_norm(dy, y, self.atol, self.rtol)
    }

    pub fn check_new_iteration(&mut self, dy: &DVector<T>, y: &DVector<T>) -> ConvergenceStatus {
        self.niter += 1;
        let norm = self.norm(dy, y);
        if Scalar::is_nan(norm) {
            return ConvergenceStatus::Diverged;
        }
        // if norm is zero then we are done
        if norm <= T::EPSILON {
            return ConvergenceStatus::Converged;
        }
        let eta = if let Some(old_norm) = self.old_norm {
            let rate = (norm / old_norm).powf(T::one() / T::cast((self.niter - 1) as f64));

            // check if iteration is diverging
            if rate > T::cast(0.9) {
                return ConvergenceStatus::Diverged;
            }
            rate / (T::one() - rate)
        } else {
            self.old_norm = Some(norm);
            T::cast(20.0)
        };

        // check if iteration is converged
        if eta * norm < self.tol {
            return ConvergenceStatus::Converged;
        }
        if self.niter >= self.max_iter {
            return ConvergenceStatus::MaximumIterations;
        }
        ConvergenceStatus::Continue
    }
}

pub fn wrms_norm<T: Scalar>(dy: &DVector<T>, y: &DVector<T>, atol: &DVector<T>, rtol: T) -> T {
    if dy.is_empty() {
        return T::zero();
    }
    let sum = dy
        .iter()
        .zip(y.iter())
        .zip(atol.iter())
        .fold(T::zero(), |acc, ((dy, y), atol)| {
            let e = *dy / (*atol + rtol * y.abs());
            acc + e * e
        });
    (sum / T::cast(dy.len() as f64)).sqrt()
}
