/// A value that can be mapped by a transform into a new value of the same type.
/// The receiver is left untouched.
pub trait Transformable<M>: Sized {
    fn transformed(&self, transform: M) -> Self;
}
