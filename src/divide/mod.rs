//! Operations that cut a curve apart or resample it: splitting by knot insertion,
//! division by count or by arc length, and rotation-minimizing frames along the curve.
//! None of them mutate their input.

pub mod divide_curve;
pub mod perpendicular_frames;
pub mod split_curve;

pub use divide_curve::*;
pub use perpendicular_frames::*;
pub use split_curve::*;

#[cfg(test)]
mod tests;
