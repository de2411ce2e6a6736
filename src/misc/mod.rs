pub mod binomial;
pub mod floating_point;
pub mod interval;
pub mod plane;
pub mod ray;
pub mod tolerance;
pub mod transformable;

pub use binomial::*;
pub use floating_point::*;
pub use interval::*;
pub use plane::*;
pub use ray::*;
pub use tolerance::*;
pub use transformable::*;
