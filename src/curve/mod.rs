pub mod arc_length;
pub mod curve_sample;
pub mod nurbs_curve;
pub mod rational_curve;
pub use arc_length::ArcLengthOptions;
pub use curve_sample::*;
pub use nurbs_curve::*;
pub use rational_curve::*;

#[cfg(test)]
mod tests;
