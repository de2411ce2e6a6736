pub mod arc_curve;
pub use arc_curve::*;
