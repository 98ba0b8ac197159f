use nalgebra::{DMatrix, DVector};
use num_traits::Zero;
use serde::Serialize;

use crate::{error::ModelError, scalar::to_f64, Scalar};

pub mod registry;
pub mod robertson;

/// Calling convention shared by every generated model function: `(out, t, x, p, k)`.
///
/// `out` is a caller-allocated buffer (matrices are dense and column-major), `t` is time, `x` the state vector,
/// `p` the parameters and `k` the constants. A generated function only writes the entries it needs and
/// never reads from `out`, so the caller is responsible for zeroing it.
pub type ModelFunction<T> = fn(&mut [T], T, &[T], &[T], &[T]);

/// Generated initial condition function: `(x0, t, p, k)`.
pub type InitialFunction<T> = fn(&mut [T], T, &[T], &[T]);

/// Classification of a state by its diagonal entry in the mass matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StateKind {
    Differential,
    Algebraic,
}

/// A generated model: its dimensions, identifiers, default values and function table.
#[derive(Clone, Debug)]
pub struct ModelDefinition<T: Scalar> {
    pub name: &'static str,
    pub nx: usize,
    pub np: usize,
    pub nk: usize,
    pub state_ids: &'static [&'static str],
    pub parameter_ids: &'static [&'static str],
    pub constant_ids: &'static [&'static str],
    pub default_parameters: Vec<T>,
    pub default_constants: Vec<T>,
    pub mass: ModelFunction<T>,
    pub rhs: ModelFunction<T>,
    pub jacobian: ModelFunction<T>,
    pub initial_states: InitialFunction<T>,
}

pub(crate) fn check_len(
    name: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), ModelError> {
    if expected != found {
        return Err(ModelError::WrongLength {
            name,
            expected,
            found,
        });
    }
    Ok(())
}

/// Position of `id` in `ids`.
pub(crate) fn state_index(ids: &[&str], id: &str) -> Result<usize, ModelError> {
    ids.iter()
        .position(|s| *s == id)
        .ok_or_else(|| ModelError::UnknownStateId(id.to_string()))
}

impl<T: Scalar> ModelDefinition<T> {
    pub fn check_dimensions(&self, x: &[T], p: &[T], k: &[T]) -> Result<(), ModelError> {
        check_len("state vector", self.nx, x.len())?;
        self.check_inputs(p, k)
    }

    fn check_inputs(&self, p: &[T], k: &[T]) -> Result<(), ModelError> {
        check_len("parameter vector", self.np, p.len())?;
        check_len("constant vector", self.nk, k.len())
    }

    pub fn state_index(&self, id: &str) -> Result<usize, ModelError> {
        state_index(self.state_ids, id)
    }

    pub fn mass_matrix(&self, t: T, x: &[T], p: &[T], k: &[T]) -> Result<DMatrix<T>, ModelError> {
        self.check_dimensions(x, p, k)?;
        let mut m = DMatrix::zeros(self.nx, self.nx);
        (self.mass)(m.as_mut_slice(), t, x, p, k);
        Ok(m)
    }

    pub fn rhs(&self, t: T, x: &[T], p: &[T], k: &[T]) -> Result<DVector<T>, ModelError> {
        self.check_dimensions(x, p, k)?;
        let mut f = DVector::zeros(self.nx);
        (self.rhs)(f.as_mut_slice(), t, x, p, k);
        Ok(f)
    }

    pub fn jacobian(&self, t: T, x: &[T], p: &[T], k: &[T]) -> Result<DMatrix<T>, ModelError> {
        self.check_dimensions(x, p, k)?;
        let mut j = DMatrix::zeros(self.nx, self.nx);
        (self.jacobian)(j.as_mut_slice(), t, x, p, k);
        Ok(j)
    }

    pub fn initial_states(&self, t: T, p: &[T], k: &[T]) -> Result<DVector<T>, ModelError> {
        self.check_inputs(p, k)?;
        let mut x0 = DVector::zeros(self.nx);
        (self.initial_states)(x0.as_mut_slice(), t, p, k);
        Ok(x0)
    }

    /// Classify each state from the diagonal of the mass matrix, a zero diagonal entry marks an algebraic state.
    pub fn state_kinds(
        &self,
        t: T,
        x: &[T],
        p: &[T],
        k: &[T],
    ) -> Result<Vec<StateKind>, ModelError> {
        let m = self.mass_matrix(t, x, p, k)?;
        Ok(m.diagonal()
            .iter()
            .map(|d| {
                if d.is_zero() {
                    StateKind::Algebraic
                } else {
                    StateKind::Differential
                }
            })
            .collect())
    }

    /// Check that the algebraic equations are satisfied at `x` to within `tol`.
    pub fn check_consistency(
        &self,
        t: T,
        x: &[T],
        p: &[T],
        k: &[T],
        tol: T,
    ) -> Result<(), ModelError> {
        let kinds = self.state_kinds(t, x, p, k)?;
        let f = self.rhs(t, x, p, k)?;
        for (index, kind) in kinds.iter().enumerate() {
            if *kind == StateKind::Algebraic && f[index].abs() > tol {
                return Err(ModelError::InconsistentInitialConditions {
                    index,
                    residual: to_f64(f[index]),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_matrix_is_column_major() {
        let model = robertson::definition::<f64>();
        let x = [1.0, 0.0, 0.0];
        let m = model
            .mass_matrix(0.0, &x, &model.default_parameters, &model.default_constants)
            .unwrap();
        assert_eq!(m.as_slice(), &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(1, 1)], 1.0);
        assert_eq!(m[(2, 2)], 0.0);
    }

    #[test]
    fn test_state_kinds() {
        let model = robertson::definition::<f64>();
        let kinds = model
            .state_kinds(0.0, &[1.0, 0.0, 0.0], &model.default_parameters, &model.default_constants)
            .unwrap();
        assert_eq!(
            kinds,
            vec![
                StateKind::Differential,
                StateKind::Differential,
                StateKind::Algebraic
            ]
        );
    }

    #[test]
    fn test_wrong_lengths() {
        let model = robertson::definition::<f64>();
        let p = model.default_parameters.clone();
        let k = model.default_constants.clone();
        let err = model.mass_matrix(0.0, &[1.0, 0.0], &p, &k).unwrap_err();
        assert!(matches!(
            err,
            ModelError::WrongLength {
                expected: 3,
                found: 2,
                ..
            }
        ));
        assert!(model.rhs(0.0, &[1.0, 0.0, 0.0], &p[..2], &k).is_err());
        assert!(model.initial_states(0.0, &p, &[]).is_err());
    }

    #[test]
    fn test_initial_states_are_consistent() {
        let model = robertson::definition::<f64>();
        let p = &model.default_parameters;
        let k = &model.default_constants;
        let x0 = model.initial_states(0.0, p, k).unwrap();
        assert_eq!(x0.as_slice(), &[1.0, 0.0, 0.0]);
        model
            .check_consistency(0.0, x0.as_slice(), p, k, 1e-12)
            .unwrap();
    }

    #[test]
    fn test_inconsistent_initial_states() {
        let model = robertson::definition::<f64>();
        let err = model
            .check_consistency(
                0.0,
                &[1.0, 0.0, 0.5],
                &model.default_parameters,
                &model.default_constants,
                1e-12,
            )
            .unwrap_err();
        match err {
            ModelError::InconsistentInitialConditions { index, residual } => {
                assert_eq!(index, 2);
                assert_eq!(residual, 0.5);
            }
            e => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn test_state_index() {
        let model = robertson::definition::<f64>();
        assert_eq!(model.state_index("x3").unwrap(), 2);
        assert!(matches!(
            model.state_index("y"),
            Err(ModelError::UnknownStateId(_))
        ));
    }
}
