#![allow(clippy::needless_range_loop)]

mod arc;
mod bounding_box;
mod curve;
mod divide;
mod error;
mod knot;
mod misc;

pub mod prelude {
    pub use crate::arc::*;
    pub use crate::bounding_box::*;
    pub use crate::curve::*;
    pub use crate::divide::*;
    pub use crate::error::NurbsError;
    pub use crate::knot::*;
    pub use crate::misc::*;
}
