use std::cmp::Ordering;
use std::ops::Index;

use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint};

use crate::error::ensure_nurbs;
use crate::misc::{epsilon, FloatingPoint, Interval};

use super::KnotMultiplicity;

/// Knot vector representation
/// A non-decreasing sequence of parameters whose length is `# of control points + degree + 1`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnotVector<T>(Vec<T>);

/// Result of a knot refinement: the longer knot vector and the recomputed control points
pub type Refinement<T, D> = (KnotVector<T>, Vec<OPoint<T, D>>);

impl<T: FloatingPoint> KnotVector<T> {
    pub fn new(knots: Vec<T>) -> Self {
        Self(knots)
    }

    /// Create a clamped uniform knot vector normalized to [0, 1]
    /// the first and last knots are repeated `degree + 1` times
    /// # Example
    /// ```
    /// use knotwork::prelude::KnotVector;
    /// let knots = KnotVector::<f64>::try_clamped_uniform(2, 4).unwrap();
    /// assert_eq!(knots.to_vec(), vec![0., 0., 0., 0.5, 1., 1., 1.]);
    /// ```
    pub fn try_clamped_uniform(degree: usize, control_point_count: usize) -> anyhow::Result<Self> {
        Self::validate_counts(degree, control_point_count)?;

        let segments = control_point_count - degree;
        let inv = T::one() / T::scalar(segments as f64);
        let mut knots = Vec::with_capacity(control_point_count + degree + 1);
        knots.extend(std::iter::repeat_n(T::zero(), degree + 1));
        knots.extend((1..segments).map(|i| T::scalar(i as f64) * inv));
        knots.extend(std::iter::repeat_n(T::one(), degree + 1));
        Ok(Self(knots))
    }

    /// Create a periodic (unclamped) uniform knot vector
    /// whose active domain `[knots[degree], knots[len - degree - 1]]` is [0, 1]
    /// # Example
    /// ```
    /// use knotwork::prelude::KnotVector;
    /// let knots = KnotVector::<f64>::try_periodic_uniform(2, 4).unwrap();
    /// assert_eq!(knots.to_vec(), vec![-1., -0.5, 0., 0.5, 1., 1.5, 2.]);
    /// assert_eq!(knots.domain(2), (0., 1.));
    /// ```
    pub fn try_periodic_uniform(degree: usize, control_point_count: usize) -> anyhow::Result<Self> {
        Self::validate_counts(degree, control_point_count)?;

        let inv = T::one() / T::scalar((control_point_count - degree) as f64);
        let knots = (0..(control_point_count + degree + 1))
            .map(|i| (T::scalar(i as f64) - T::scalar(degree as f64)) * inv)
            .collect();
        Ok(Self(knots))
    }

    fn validate_counts(degree: usize, control_point_count: usize) -> anyhow::Result<()> {
        ensure_nurbs!(degree >= 1, Configuration, "Degree must be at least 1");
        ensure_nurbs!(
            control_point_count > degree,
            Configuration,
            "Too few control points for degree {}: got {}, expected at least {}",
            degree,
            control_point_count,
            degree + 1
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.clone()
    }

    pub fn first(&self) -> T {
        self.0[0]
    }

    pub fn last(&self) -> T {
        self.0[self.0.len() - 1]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Check that no knot is smaller than its predecessor
    pub fn is_non_decreasing(&self) -> bool {
        self.0.windows(2).all(|w| w[0] <= w[1])
    }

    /// Get the domain of the knot vector by degree
    pub fn domain(&self, degree: usize) -> (T, T) {
        (self.0[degree], self.0[self.0.len() - 1 - degree])
    }

    pub fn domain_interval(&self, degree: usize) -> Interval<T> {
        let (t0, t1) = self.domain(degree);
        Interval::new(t0, t1)
    }

    pub fn clamp(&self, degree: usize, u: T) -> T {
        let (min, max) = self.domain(degree);
        u.clamp(min, max)
    }

    /// Get the multiplicity of each distinct knot
    /// # Example
    /// ```
    /// use knotwork::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let knot_multiplicity = knots.multiplicity();
    /// assert_eq!(knot_multiplicity[0].multiplicity(), 3);
    /// assert_eq!(knot_multiplicity[1].multiplicity(), 1);
    /// assert_eq!(knot_multiplicity[3].knot(), 3.);
    /// ```
    pub fn multiplicity(&self) -> Vec<KnotMultiplicity<T>> {
        let eps = epsilon::<T>();
        let mut mult = vec![];

        let mut current = KnotMultiplicity::new(self.0[0], 0);
        self.0.iter().for_each(|knot| {
            if (*knot - current.knot()).abs() > eps {
                mult.push(current);
                current = KnotMultiplicity::new(*knot, 0);
            }
            current.increment_multiplicity();
        });
        mult.push(current);

        mult
    }

    /// Count the knots equal to `u` within the tight tolerance
    pub fn multiplicity_of(&self, u: T) -> usize {
        let eps = epsilon::<T>();
        self.0.iter().filter(|k| (**k - u).abs() <= eps).count()
    }

    /// Check if the knot vector is clamped
    /// `clamped` means the first and last knots have a multiplicity greater than the degree
    pub fn is_clamped(&self, degree: usize) -> bool {
        let multiplicity = self.multiplicity();
        match (multiplicity.first(), multiplicity.last()) {
            (Some(start), Some(end)) => {
                start.multiplicity() > degree && end.multiplicity() > degree
            }
            _ => false,
        }
    }

    /// Find the span index `i` such that `knots[i] <= u < knots[i + 1]`
    /// over the active domain. The right end of the domain belongs to the last span,
    /// parameters outside the domain are clamped to the first or last span.
    /// # Example
    /// ```
    /// use knotwork::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// assert_eq!(knots.span_at(2, 2.5), 4);
    /// assert_eq!(knots.span_at(2, 3.), 4);
    /// assert_eq!(knots.span_at(2, 1.), 3);
    /// ```
    pub fn span_at(&self, degree: usize, u: T) -> usize {
        let n = self.len() - degree - 2;
        self.find_knot_span_index(n, degree, u)
    }

    /// Find the knot span index by binary search
    /// `n` is the index of the last control point
    pub fn find_knot_span_index(&self, n: usize, degree: usize, u: T) -> usize {
        let eps = epsilon::<T>();
        if u >= self[n + 1] - eps {
            return n;
        }

        if u < self[degree] + eps {
            return degree;
        }

        let mut low = degree;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while u < self[mid] || u >= self[mid + 1] {
            if u < self[mid] {
                high = mid;
            } else {
                low = mid;
            }
            mid = (low + high) / 2;
        }

        mid
    }

    /// Compute the `degree + 1` non-vanishing basis functions at `u` in the given span
    pub fn basis_functions(&self, span: usize, u: T, degree: usize) -> Vec<T> {
        let mut basis = vec![T::zero(); degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        basis[0] = T::one();

        for j in 1..=degree {
            left[j] = u - self[span + 1 - j];
            right[j] = self[span + j] - u;
            let mut saved = T::zero();

            for r in 0..j {
                let temp = basis[r] / (right[r + 1] + left[j - r]);
                basis[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }

            basis[j] = saved;
        }

        basis
    }

    /// Compute the non-vanishing basis functions and their derivatives up to `derivs`
    /// Row `k` holds the k-th derivatives; rows above `degree` are zero.
    pub fn derivative_basis_functions(
        &self,
        span: usize,
        u: T,
        degree: usize,
        derivs: usize,
    ) -> Vec<Vec<T>> {
        let p = degree;
        let mut ndu = vec![vec![T::zero(); p + 1]; p + 1];
        let mut left = vec![T::zero(); p + 1];
        let mut right = vec![T::zero(); p + 1];

        ndu[0][0] = T::one();

        for j in 1..=p {
            left[j] = u - self[span + 1 - j];
            right[j] = self[span + j] - u;

            let mut saved = T::zero();
            for r in 0..j {
                // lower triangle holds knot differences
                ndu[j][r] = right[r + 1] + left[j - r];
                let temp = ndu[r][j - 1] / ndu[j][r];

                // upper triangle holds basis functions
                ndu[r][j] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            ndu[j][j] = saved;
        }

        let mut ders = vec![vec![T::zero(); p + 1]; derivs + 1];
        for j in 0..=p {
            ders[0][j] = ndu[j][p];
        }

        let n = derivs.min(p) as isize;
        let ip = p as isize;
        let at = |v: isize| v as usize;
        let mut a = vec![vec![T::zero(); p + 1]; 2];

        for r in 0..=ip {
            let mut s1 = 0;
            let mut s2 = 1;
            a[0][0] = T::one();

            for k in 1..=n {
                let mut d = T::zero();
                let rk = r - k;
                let pk = ip - k;

                if r >= k {
                    a[s2][0] = a[s1][0] / ndu[at(pk + 1)][at(rk)];
                    d = a[s2][0] * ndu[at(rk)][at(pk)];
                }

                let j1 = if rk >= -1 { 1 } else { -rk };
                let j2 = if r - 1 <= pk { k - 1 } else { ip - r };

                for j in j1..=j2 {
                    a[s2][at(j)] =
                        (a[s1][at(j)] - a[s1][at(j - 1)]) / ndu[at(pk + 1)][at(rk + j)];
                    d += a[s2][at(j)] * ndu[at(rk + j)][at(pk)];
                }

                if r <= pk {
                    a[s2][at(k)] = -a[s1][at(k - 1)] / ndu[at(pk + 1)][at(r)];
                    d += a[s2][at(k)] * ndu[at(r)][at(pk)];
                }

                ders[at(k)][at(r)] = d;
                std::mem::swap(&mut s1, &mut s2);
            }
        }

        // multiply through by p! / (p - k)!
        let mut factor = T::scalar(p as f64);
        for k in 1..=at(n) {
            for j in 0..=p {
                ders[k][j] *= factor;
            }
            factor *= T::scalar((p - k) as f64);
        }

        ders
    }

    /// Refine the knot vector by inserting `knots_to_insert` (Boehm / Oslo style refinement).
    /// Each new control point is an affine blend of two neighbouring old ones, so the curve
    /// described by `(degree, control_points, self)` keeps its shape and parametrization.
    /// The receiver and `control_points` are left untouched.
    pub fn try_refine<D>(
        &self,
        degree: usize,
        control_points: &[OPoint<T, D>],
        knots_to_insert: &[T],
    ) -> anyhow::Result<Refinement<T, D>>
    where
        D: DimName,
        DefaultAllocator: Allocator<D>,
    {
        ensure_nurbs!(
            self.len() == control_points.len() + degree + 1,
            Configuration,
            "Invalid number of knots, got {}, expected {}",
            self.len(),
            control_points.len() + degree + 1
        );

        if knots_to_insert.is_empty() {
            return Ok((self.clone(), control_points.to_vec()));
        }

        let mut xs = knots_to_insert.to_vec();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let (min, max) = self.domain(degree);
        ensure_nurbs!(
            xs[0] >= min && xs[xs.len() - 1] <= max,
            Domain,
            "Knots to insert must lie in the domain [{}, {}]",
            min,
            max
        );

        let p = degree;
        let n = control_points.len() - 1;
        let m = n + p + 1;
        let r = xs.len() - 1;
        let a = self.find_knot_span_index(n, p, xs[0]);
        let b = self.find_knot_span_index(n, p, xs[r]) + 1;

        let mut points = vec![OPoint::<T, D>::origin(); n + r + 2];
        let mut knots = vec![T::zero(); m + r + 2];

        points[..=(a - p)].clone_from_slice(&control_points[..=(a - p)]);
        for j in (b - 1)..=n {
            points[j + r + 1] = control_points[j].clone();
        }
        knots[..=a].copy_from_slice(&self.0[..=a]);
        for j in (b + p)..=m {
            knots[j + r + 1] = self[j];
        }

        let mut i = b + p - 1;
        let mut k = b + p + r;

        for j in (0..=r).rev() {
            while xs[j] <= self[i] && i > a {
                points[k - p - 1] = control_points[i - p - 1].clone();
                knots[k] = self[i];
                k -= 1;
                i -= 1;
            }

            points[k - p - 1] = points[k - p].clone();
            for l in 1..=p {
                let ind = k - p + l;
                let alpha = knots[k + l] - xs[j];
                if alpha.abs() < T::default_epsilon() {
                    points[ind - 1] = points[ind].clone();
                } else {
                    let denom = knots[k + l] - self[i + l - p];
                    let alpha = if denom != T::zero() {
                        alpha / denom
                    } else {
                        T::zero()
                    };
                    points[ind - 1] = points[ind - 1].lerp(&points[ind], T::one() - alpha);
                }
            }

            knots[k] = xs[j];
            k -= 1;
        }

        Ok((KnotVector::new(knots), points))
    }

    /// Insert the knot `u` `multiplicity` times.
    /// A value within the tight tolerance of an existing knot is snapped onto it.
    /// # Failures
    /// - if `u` is outside the domain
    /// - if the resulting multiplicity of `u` would exceed `degree + 1`
    pub fn try_insert<D>(
        &self,
        u: T,
        multiplicity: usize,
        degree: usize,
        control_points: &[OPoint<T, D>],
    ) -> anyhow::Result<Refinement<T, D>>
    where
        D: DimName,
        DefaultAllocator: Allocator<D>,
    {
        let eps = epsilon::<T>();
        let u = self
            .iter()
            .find(|k| (**k - u).abs() <= eps)
            .copied()
            .unwrap_or(u);
        let existing = self.multiplicity_of(u);
        ensure_nurbs!(
            existing + multiplicity <= degree + 1,
            Domain,
            "Inserting knot {} {} times exceeds the maximum multiplicity {}",
            u,
            multiplicity,
            degree + 1
        );
        self.try_refine(degree, control_points, &vec![u; multiplicity])
    }
}

impl<T> Index<usize> for KnotVector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> FromIterator<T> for KnotVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
