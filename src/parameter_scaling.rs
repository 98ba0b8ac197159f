use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{error::ModelError, model::check_len, Scalar};

/// Scale on which a parameter value is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterScaling {
    /// linear scale
    #[default]
    #[serde(alias = "lin")]
    None,
    /// natural logarithm
    #[serde(alias = "log")]
    Ln,
    Log10,
}

impl FromStr for ParameterScaling {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lin" | "none" => Ok(Self::None),
            "log" | "ln" => Ok(Self::Ln),
            "log10" => Ok(Self::Log10),
            _ => Err(ModelError::UnknownScaling(s.to_string())),
        }
    }
}

impl ParameterScaling {
    /// Bring a value from linear scale onto this scale.
    pub fn scale<T: Scalar>(self, value: T) -> T {
        match self {
            Self::None => value,
            Self::Ln => value.ln(),
            Self::Log10 => value.log10(),
        }
    }

    /// Bring a value from this scale back to linear scale.
    pub fn unscale<T: Scalar>(self, value: T) -> T {
        match self {
            Self::None => value,
            Self::Ln => value.exp(),
            Self::Log10 => T::cast(10.0).powf(value),
        }
    }
}

/// Unscale every value by its matching scale.
pub fn unscale_all<T: Scalar>(
    values: &[T],
    scales: &[ParameterScaling],
) -> Result<Vec<T>, ModelError> {
    check_len("parameter scales", values.len(), scales.len())?;
    Ok(values
        .iter()
        .zip(scales)
        .map(|(v, s)| s.unscale(*v))
        .collect())
}
