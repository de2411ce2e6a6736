use super::FloatingPoint;

/// An ordered pair of values `t0 <= t1`.
/// Used as a parameter range and, for arcs, as an angular domain in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval<T> {
    t0: T,
    t1: T,
}

impl<T: FloatingPoint> Interval<T> {
    pub fn new(t0: T, t1: T) -> Self {
        Self { t0, t1 }
    }

    pub fn t0(&self) -> T {
        self.t0
    }

    pub fn t1(&self) -> T {
        self.t1
    }

    pub fn length(&self) -> T {
        self.t1 - self.t0
    }

    pub fn mid(&self) -> T {
        (self.t0 + self.t1) * T::scalar(0.5)
    }

    /// Check if the interval is decreasing (`t1 < t0`)
    pub fn is_decreasing(&self) -> bool {
        self.t1 < self.t0
    }

    pub fn contains(&self, t: T) -> bool {
        self.t0 <= t && t <= self.t1
    }

    /// Map a normalized parameter in [0, 1] onto the interval
    /// # Example
    /// ```
    /// use knotwork::prelude::Interval;
    /// let interval = Interval::new(2., 6.);
    /// assert_eq!(interval.parameter_at(0.25), 3.);
    /// assert_eq!(interval.normalized_parameter_at(3.), 0.25);
    /// ```
    pub fn parameter_at(&self, normalized: T) -> T {
        self.t0 + self.length() * normalized
    }

    /// Inverse of [`Interval::parameter_at`]
    /// A zero-length interval maps every value to 0
    pub fn normalized_parameter_at(&self, t: T) -> T {
        let length = self.length();
        if length == T::zero() {
            T::zero()
        } else {
            (t - self.t0) / length
        }
    }
}

impl<T: FloatingPoint> From<(T, T)> for Interval<T> {
    fn from((t0, t1): (T, T)) -> Self {
        Self::new(t0, t1)
    }
}
