use nalgebra::{convert, RealField};
use num_traits::ToPrimitive;
use simba::scalar::SupersetOf;

/// Trait for floating point types (f32, f64)
/// Mainly used to identify the type of the field in nalgebra
pub trait FloatingPoint: RealField + ToPrimitive + Copy {
    /// Convert a f64 literal into the scalar type
    fn scalar(value: f64) -> Self {
        convert(value)
    }

    /// Widen the scalar to f64 (lossless for f32 and f64)
    fn as_f64(self) -> f64 {
        SupersetOf::<f64>::to_subset_unchecked(&self)
    }
}

impl FloatingPoint for f32 {}
impl FloatingPoint for f64 {}
