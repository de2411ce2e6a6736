use super::FloatingPoint;

/// Binomial coefficients backed by a lazily grown Pascal triangle.
#[derive(Debug, Clone)]
pub struct Binomial<T> {
    rows: Vec<Vec<T>>,
}

impl<T: FloatingPoint> Default for Binomial<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FloatingPoint> Binomial<T> {
    pub fn new() -> Self {
        Self {
            rows: vec![vec![T::one()]],
        }
    }

    /// Returns the binomial coefficient of `n` and `k`
    /// # Example
    /// ```
    /// use knotwork::prelude::Binomial;
    /// let mut binomial = Binomial::<f64>::new();
    /// assert_eq!(binomial.get(5, 2), 10.);
    /// assert_eq!(binomial.get(5, 6), 0.);
    /// ```
    pub fn get(&mut self, n: usize, k: usize) -> T {
        if k > n {
            return T::zero();
        }

        while self.rows.len() <= n {
            let prev = &self.rows[self.rows.len() - 1];
            let mut row = Vec::with_capacity(prev.len() + 1);
            row.push(T::one());
            row.extend(prev.windows(2).map(|w| w[0] + w[1]));
            row.push(T::one());
            self.rows.push(row);
        }

        self.rows[n][k]
    }
}
