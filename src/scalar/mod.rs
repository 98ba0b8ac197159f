use std::fmt::{Debug, Display};

/// Floating point type that generated models and the integrator are written over.
pub trait Scalar:
    nalgebra::RealField
    + num_traits::FromPrimitive
    + num_traits::ToPrimitive
    + Display
    + Debug
    + Copy
    + PartialOrd
{
    const EPSILON: Self;
    const INFINITY: Self;
    const NAN: Self;
    fn is_nan(self) -> bool;

    /// Convert a literal, rounding to the nearest representable value.
    fn cast(value: f64) -> Self;
}

pub type IndexType = usize;

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const INFINITY: Self = f64::INFINITY;
    const NAN: Self = f64::NAN;
    fn is_nan(self) -> bool {
        self.is_nan()
    }
    fn cast(value: f64) -> Self {
        value
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const INFINITY: Self = f32::INFINITY;
    const NAN: Self = f32::NAN;
    fn is_nan(self) -> bool {
        self.is_nan()
    }
    fn cast(value: f64) -> Self {
        value as f32
    }
}

/// Convert a scalar to `f64` for error reporting and logging.
pub(crate) fn to_f64<T: Scalar>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
