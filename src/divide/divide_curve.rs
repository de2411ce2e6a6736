use log::debug;
use nalgebra::{allocator::Allocator, DefaultAllocator, DimNameDiff, DimNameSub, U1};

use crate::{
    curve::{arc_length::ArcLengthTable, ArcLengthOptions, CurveSample, RationalCurve},
    error::ensure_nurbs,
    misc::{epsilon, FloatingPoint},
};

/// Samples of a curve of homogeneous dimension `D`
pub type CurveSamples<T, D> = Vec<CurveSample<T, DimNameDiff<D, U1>>>;

/// Divide the curve into `segments` pieces of equal arc length.
/// Returns `segments + 1` samples from the start to the end of the domain.
/// # Failures
/// - if `segments` is zero or the curve has no length
///
/// # Example
/// ```
/// use knotwork::prelude::*;
/// use nalgebra::Point3;
/// use approx::assert_relative_eq;
///
/// let line = NurbsCurve3D::try_from_points(
///     &[Point3::new(0., 0., 0.), Point3::new(1., 0., 0.), Point3::new(3., 0., 0.)],
///     2,
/// ).unwrap();
/// let samples = try_divide_by_count(&line, 3).unwrap();
/// assert_eq!(samples.len(), 4);
/// assert_relative_eq!(samples[1].point().x, 1., epsilon = 1e-8);
/// assert_relative_eq!(samples[2].length(), 2., epsilon = 1e-8);
/// ```
pub fn try_divide_by_count<T, D, C>(
    curve: &C,
    segments: usize,
) -> anyhow::Result<CurveSamples<T, D>>
where
    T: FloatingPoint,
    D: DimNameSub<U1>,
    C: RationalCurve<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    try_divide_by_count_with_options(curve, segments, &ArcLengthOptions::default())
}

pub fn try_divide_by_count_with_options<T, D, C>(
    curve: &C,
    segments: usize,
    options: &ArcLengthOptions<T>,
) -> anyhow::Result<CurveSamples<T, D>>
where
    T: FloatingPoint,
    D: DimNameSub<U1>,
    C: RationalCurve<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    ensure_nurbs!(segments >= 1, Domain, "Number of segments must be at least 1");
    let table = measured_table(curve)?;
    let total = table.total();
    let step = total / T::scalar(segments as f64);

    let mut samples = Vec::with_capacity(segments + 1);
    samples.push(sample(curve, table.start(), T::zero()));
    for i in 1..segments {
        let length = step * T::scalar(i as f64);
        let t = table.try_parameter_at(curve, length, options)?;
        samples.push(sample(curve, t, length));
    }
    samples.push(sample(curve, table.end(), total));

    debug!(
        "divided curve of length {:?} into {} segments",
        total, segments
    );
    Ok(samples)
}

/// Divide the curve into pieces of arc length `length`.
/// The last sample is always the end of the domain, so the last piece is the remainder
/// when `length` does not divide the curve length.
///
/// With `n = floor(total / length)`, the result holds `n + 1` samples when `length`
/// divides the total (within tolerance) and `n + 2` samples otherwise, the extra one being
/// the domain end after the shorter remainder. A `length` longer than the curve gives the
/// two end samples.
/// # Failures
/// - if `length` is not positive or the curve has no length
pub fn try_divide_by_length<T, D, C>(
    curve: &C,
    length: T,
) -> anyhow::Result<CurveSamples<T, D>>
where
    T: FloatingPoint,
    D: DimNameSub<U1>,
    C: RationalCurve<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    try_divide_by_length_with_options(curve, length, &ArcLengthOptions::default())
}

pub fn try_divide_by_length_with_options<T, D, C>(
    curve: &C,
    length: T,
    options: &ArcLengthOptions<T>,
) -> anyhow::Result<CurveSamples<T, D>>
where
    T: FloatingPoint,
    D: DimNameSub<U1>,
    C: RationalCurve<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    ensure_nurbs!(
        length > T::zero(),
        Domain,
        "Division length must be positive, got {:?}",
        length
    );
    let table = measured_table(curve)?;
    let total = table.total();
    let tolerance = options.tolerance * total.max(T::one());

    let mut samples = vec![sample(curve, table.start(), T::zero())];
    let mut k = T::one();
    loop {
        let current = length * k;
        if current >= total - tolerance {
            break;
        }
        let t = table.try_parameter_at(curve, current, options)?;
        samples.push(sample(curve, t, current));
        k += T::one();
    }
    samples.push(sample(curve, table.end(), total));

    debug!(
        "divided curve of length {:?} by {:?} into {} samples",
        total,
        length,
        samples.len()
    );
    Ok(samples)
}

fn measured_table<T, D, C>(curve: &C) -> anyhow::Result<ArcLengthTable<T>>
where
    T: FloatingPoint,
    D: DimNameSub<U1>,
    C: RationalCurve<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let table = ArcLengthTable::try_new(curve)?;
    ensure_nurbs!(
        table.total() > epsilon::<T>(),
        Domain,
        "Cannot divide a curve of zero length"
    );
    Ok(table)
}

fn sample<T, D, C>(curve: &C, t: T, length: T) -> CurveSample<T, DimNameDiff<D, U1>>
where
    T: FloatingPoint,
    D: DimNameSub<U1>,
    C: RationalCurve<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    CurveSample::new(t, length, curve.point_at(t))
}
