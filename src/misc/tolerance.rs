use super::FloatingPoint;

/// Tight tolerance for equality and degeneracy checks
pub const EPSILON: f64 = 1e-10;

/// Looser tolerance for geometric approximations
pub const GEOMETRIC_TOLERANCE: f64 = 1e-6;

pub fn epsilon<T: FloatingPoint>() -> T {
    T::scalar(EPSILON)
}

pub fn geometric_tolerance<T: FloatingPoint>() -> T {
    T::scalar(GEOMETRIC_TOLERANCE)
}
