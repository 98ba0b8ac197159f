use std::collections::HashMap;

use log::warn;

use crate::{error::ModelError, ModelDefinition, Scalar};

use super::robertson;

/// Lookup of generated models by name.
///
/// Every generated model shares the same function signatures, so once a model is found by name
/// it can be evaluated without knowing anything else about it.
#[derive(Clone, Debug)]
pub struct ModelRegistry<T: Scalar> {
    models: HashMap<String, ModelDefinition<T>>,
}

impl<T: Scalar> Default for ModelRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> ModelRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Create a registry holding every model shipped with this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(robertson::definition());
        registry
    }

    /// Add a model, replacing any existing model with the same name.
    pub fn register(&mut self, model: ModelDefinition<T>) {
        if let Some(old) = self.models.insert(model.name.to_string(), model) {
            warn!("replaced existing model definition for {}", old.name);
        }
    }

    pub fn get(&self, name: &str) -> Result<&ModelDefinition<T>, ModelError> {
        self.models
            .get(name)
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Names of all registered models, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Evaluate the mass matrix of the named model into `m`.
    ///
    /// `m` must hold at least `nx * nx` elements and should be zeroed, only the non-zero entries of the
    /// mass matrix are written.
    pub fn eval_mass_matrix(
        &self,
        name: &str,
        m: &mut [T],
        t: T,
        x: &[T],
        p: &[T],
        k: &[T],
    ) -> Result<(), ModelError> {
        let model = self.get(name)?;
        let expected = model.nx * model.nx;
        if m.len() < expected {
            return Err(ModelError::BufferTooSmall {
                name: "mass matrix",
                expected,
                found: m.len(),
            });
        }
        model.check_dimensions(x, p, k)?;
        (model.mass)(m, t, x, p, k);
        Ok(())
    }
}
