use gauss_quad::GaussLegendre;
use itertools::Itertools;
use log::{trace, warn};
use nalgebra::{allocator::Allocator, DefaultAllocator, DimNameDiff, DimNameSub, U1};

use crate::{
    curve::RationalCurve,
    error::{ensure_nurbs, NurbsError},
    misc::{epsilon, FloatingPoint, EPSILON},
};

/// Options for the arc-length inversion used by `try_parameter_at_length` and the divide operations
#[derive(Clone, Debug, PartialEq)]
pub struct ArcLengthOptions<T: FloatingPoint> {
    /// Tolerance on the arc length residual, relative to max(1, total length)
    pub tolerance: T,
    /// Maximum number of Newton / bisection steps for a single inversion
    pub max_iterations: usize,
}

impl<T: FloatingPoint> Default for ArcLengthOptions<T> {
    fn default() -> Self {
        Self {
            tolerance: T::scalar(EPSILON),
            max_iterations: 100,
        }
    }
}

impl<T: FloatingPoint> ArcLengthOptions<T> {
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Cumulative arc lengths at the distinct knots of a curve's domain.
/// Lengths are integrated span by span, so the quadrature never straddles a knot
/// where the derivative may be discontinuous.
pub(crate) struct ArcLengthTable<T: FloatingPoint> {
    breaks: Vec<T>,
    cumulative: Vec<T>,
    gauss: GaussLegendre,
}

impl<T: FloatingPoint> ArcLengthTable<T> {
    pub fn try_new<D, C>(curve: &C) -> anyhow::Result<Self>
    where
        D: DimNameSub<U1>,
        C: RationalCurve<T, D> + ?Sized,
        DefaultAllocator: Allocator<D>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        let (start, end) = curve.knots_domain();
        let interior = curve
            .knots()
            .iter()
            .copied()
            .filter(|k| *k > start && *k < end)
            .dedup();
        let breaks: Vec<T> = std::iter::once(start)
            .chain(interior)
            .chain(std::iter::once(end))
            .collect();

        let gauss = gauss_legendre(curve.degree())?;
        let mut cumulative = Vec::with_capacity(breaks.len());
        let mut acc = T::zero();
        cumulative.push(acc);
        for (a, b) in breaks.iter().tuple_windows() {
            acc += segment_length(curve, &gauss, *a, *b);
            cumulative.push(acc);
        }

        // rescale onto the closed-form length so every sample agrees with `try_length`
        if let Some(exact) = curve.exact_length() {
            if acc > T::zero() {
                let scale = exact / acc;
                cumulative.iter_mut().for_each(|c| *c *= scale);
            }
            if let Some(last) = cumulative.last_mut() {
                *last = exact;
            }
        }

        Ok(Self {
            breaks,
            cumulative,
            gauss,
        })
    }

    pub fn total(&self) -> T {
        self.cumulative[self.cumulative.len() - 1]
    }

    pub fn start(&self) -> T {
        self.breaks[0]
    }

    pub fn end(&self) -> T {
        self.breaks[self.breaks.len() - 1]
    }

    /// Arc length from the domain start to `t`
    pub fn try_length_at<D, C>(&self, curve: &C, t: T) -> anyhow::Result<T>
    where
        D: DimNameSub<U1>,
        C: RationalCurve<T, D> + ?Sized,
        DefaultAllocator: Allocator<D>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        let eps = epsilon::<T>();
        let (start, end) = (self.start(), self.end());
        ensure_nurbs!(
            t >= start - eps && t <= end + eps,
            Domain,
            "parameter {:?} is outside of the domain [{:?}, {:?}]",
            t,
            start,
            end
        );
        let t = t.clamp(start, end);
        let idx = self.span_of(&self.breaks, t);
        Ok(self.cumulative[idx] + segment_length(curve, &self.gauss, self.breaks[idx], t))
    }

    /// Invert the arc length function by a safeguarded Newton iteration:
    /// Newton steps on `length(t) - target` with the speed `|C'(t)|` as derivative,
    /// falling back to bisection whenever a step leaves the current bracket.
    pub fn try_parameter_at<D, C>(
        &self,
        curve: &C,
        length: T,
        options: &ArcLengthOptions<T>,
    ) -> anyhow::Result<T>
    where
        D: DimNameSub<U1>,
        C: RationalCurve<T, D> + ?Sized,
        DefaultAllocator: Allocator<D>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        let total = self.total();
        let tolerance = options.tolerance * total.max(T::one());
        ensure_nurbs!(
            length >= -tolerance && length <= total + tolerance,
            Domain,
            "length {:?} is outside of the curve length [0, {:?}]",
            length,
            total
        );

        if length <= tolerance {
            return Ok(self.start());
        }
        if length >= total - tolerance {
            return Ok(self.end());
        }

        let idx = self.span_of(&self.cumulative, length);
        let (a, b) = (self.breaks[idx], self.breaks[idx + 1]);
        let target = length - self.cumulative[idx];
        let span_length = self.cumulative[idx + 1] - self.cumulative[idx];
        if target <= tolerance {
            return Ok(a);
        }

        let eps = epsilon::<T>();
        let resolution = T::default_epsilon() * (b - a).abs().max(T::one());
        let (mut lo, mut hi) = (a, b);
        let mut t = a + (b - a) * (target / span_length);

        for iteration in 0..options.max_iterations {
            let residual = segment_length(curve, &self.gauss, a, t) - target;
            trace!(
                "arc length inversion: iteration {}, t = {:?}, residual = {:?}",
                iteration,
                t,
                residual
            );
            if residual.abs() <= tolerance {
                return Ok(t);
            }

            if residual > T::zero() {
                hi = t;
            } else {
                lo = t;
            }
            if hi - lo <= resolution {
                return Ok(t);
            }

            let speed = curve.derivative_at(t).norm();
            let newton = t - residual / speed;
            t = if speed > eps && newton > lo && newton < hi {
                newton
            } else {
                (lo + hi) * T::scalar(0.5)
            };
        }

        warn!(
            "arc length inversion for length {:?} stopped after {} iterations",
            length, options.max_iterations
        );
        Err(NurbsError::numerical(format!(
            "arc length inversion did not converge within {} iterations",
            options.max_iterations
        ))
        .into())
    }

    /// Index of the last entry of `values` not greater than `x`, limited to the last span
    fn span_of(&self, values: &[T], x: T) -> usize {
        values
            .partition_point(|v| *v <= x)
            .saturating_sub(1)
            .min(self.breaks.len() - 2)
    }
}

/// Gauss-Legendre rule used for curve length, its order grows with the degree
pub(crate) fn gauss_legendre(degree: usize) -> anyhow::Result<GaussLegendre> {
    GaussLegendre::new(16 + degree)
        .map_err(|e| anyhow::anyhow!("failed to build the Gauss-Legendre rule: {:?}", e))
}

/// Length of the curve between `a` and `b` by gauss-legendre quadrature
pub(crate) fn segment_length<T, D, C>(curve: &C, gauss: &GaussLegendre, a: T, b: T) -> T
where
    T: FloatingPoint,
    D: DimNameSub<U1>,
    C: RationalCurve<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    if b <= a {
        return T::zero();
    }
    let sum = gauss.integrate(a.as_f64(), b.as_f64(), |x| {
        curve.derivative_at(T::scalar(x)).norm().as_f64()
    });
    T::scalar(sum)
}
