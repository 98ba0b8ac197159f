use nalgebra::DVector;

use crate::{
    error::ModelError, model::check_len, parameter_scaling::unscale_all, ModelDefinition,
    ModelRegistry, ParameterScaling, Scalar, SolverOptions,
};

/// A generated model together with the parameters, constants and options needed to integrate it.
///
/// Parameters are always stored on linear scale.
#[derive(Clone, Debug)]
pub struct ModelProblem<T: Scalar> {
    pub model: ModelDefinition<T>,
    pub p: Vec<T>,
    pub k: Vec<T>,
    pub t0: T,
    pub x0: Option<Vec<T>>,
    pub options: SolverOptions<T>,
}

impl<T: Scalar> ModelProblem<T> {
    /// Problem using the model's default parameters and constants, starting at `t = 0`.
    pub fn new(model: ModelDefinition<T>) -> Self {
        let p = model.default_parameters.clone();
        let k = model.default_constants.clone();
        Self {
            model,
            p,
            k,
            t0: T::cast(0.0),
            x0: None,
            options: SolverOptions::default(),
        }
    }

    pub fn from_registry(registry: &ModelRegistry<T>, name: &str) -> Result<Self, ModelError> {
        Ok(Self::new(registry.get(name)?.clone()))
    }

    pub fn with_parameters(mut self, p: Vec<T>) -> Result<Self, ModelError> {
        check_len("parameter vector", self.model.np, p.len())?;
        self.p = p;
        Ok(self)
    }

    /// Set parameters given on the scales in `scales`, they are unscaled before being stored.
    pub fn with_scaled_parameters(
        self,
        p: &[T],
        scales: &[ParameterScaling],
    ) -> Result<Self, ModelError> {
        let p = unscale_all(p, scales)?;
        self.with_parameters(p)
    }

    pub fn with_constants(mut self, k: Vec<T>) -> Result<Self, ModelError> {
        check_len("constant vector", self.model.nk, k.len())?;
        self.k = k;
        Ok(self)
    }

    /// Override the generated initial states.
    pub fn with_initial_states(mut self, x0: Vec<T>) -> Result<Self, ModelError> {
        check_len("initial state vector", self.model.nx, x0.len())?;
        self.x0 = Some(x0);
        Ok(self)
    }

    pub fn with_t0(mut self, t0: T) -> Self {
        self.t0 = t0;
        self
    }

    pub fn with_options(mut self, options: SolverOptions<T>) -> Result<Self, ModelError> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    pub fn initial_states(&self) -> Result<DVector<T>, ModelError> {
        match &self.x0 {
            Some(x0) => Ok(DVector::from_column_slice(x0)),
            None => self.model.initial_states(self.t0, &self.p, &self.k),
        }
    }
}
