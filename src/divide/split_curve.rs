use log::debug;
use nalgebra::{allocator::Allocator, DefaultAllocator, DimNameDiff, DimNameSub, U1};

use crate::{
    curve::{NurbsCurve, RationalCurve},
    error::ensure_nurbs,
    misc::{epsilon, FloatingPoint, Interval},
};

/// Split the curve into two curves before and after the parameter.
///
/// The parameter is inserted until it reaches full multiplicity (`degree + 1`), where the
/// refined control polygon falls apart into two valid curves. Both halves keep the original
/// parametrization, so the first one ends and the second one starts at `u`.
/// # Failures
/// - if `u` is not strictly inside the domain
///
/// # Example
/// ```
/// use knotwork::prelude::*;
/// use nalgebra::Point3;
///
/// let curve = NurbsCurve3D::try_from_points(
///     &[
///         Point3::new(2., 2., 0.),
///         Point3::new(4., 12., 0.),
///         Point3::new(7., 12., 0.),
///         Point3::new(15., 2., 0.),
///     ],
///     3,
/// ).unwrap();
/// let (left, right) = try_split_curve(&curve, 0.5).unwrap();
/// assert_eq!(left.knots_domain().1, 0.5);
/// assert_eq!(right.knots_domain().0, 0.5);
/// ```
pub fn try_split_curve<T, D, C>(
    curve: &C,
    u: T,
) -> anyhow::Result<(NurbsCurve<T, D>, NurbsCurve<T, D>)>
where
    T: FloatingPoint,
    D: DimNameSub<U1>,
    C: RationalCurve<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let eps = epsilon::<T>();
    let degree = curve.degree();
    let knots = curve.knots();
    let (start, end) = curve.knots_domain();
    ensure_nurbs!(
        u > start + eps && u < end - eps,
        Domain,
        "Split parameter {:?} must lie strictly inside the domain ({:?}, {:?})",
        u,
        start,
        end
    );

    // snap onto an existing knot so its copies are counted
    let u = knots
        .iter()
        .find(|k| (**k - u).abs() <= eps)
        .copied()
        .unwrap_or(u);
    let existing = knots.multiplicity_of(u);
    let (refined_knots, refined_points) = knots.try_insert(
        u,
        degree + 1 - existing.min(degree + 1),
        degree,
        curve.control_points(),
    )?;

    let first = refined_knots
        .iter()
        .position(|k| (*k - u).abs() <= eps)
        .unwrap_or(0);
    debug!(
        "split at {:?}: knot index {}, {} + {} control points",
        u,
        first,
        first,
        refined_points.len() - first
    );

    let knots0 = refined_knots.as_slice()[..=(first + degree)].to_vec();
    let knots1 = refined_knots.as_slice()[first..].to_vec();
    let points0 = refined_points[..first].to_vec();
    let points1 = refined_points[first..].to_vec();
    Ok((
        NurbsCurve::try_new(degree, points0, knots0)?,
        NurbsCurve::try_new(degree, points1, knots1)?,
    ))
}

/// Extract the part of the curve over `interval`, keeping the original parametrization
/// # Failures
/// - if the interval is empty or leaves the domain
pub fn try_sub_curve<T, D, C>(
    curve: &C,
    interval: Interval<T>,
) -> anyhow::Result<NurbsCurve<T, D>>
where
    T: FloatingPoint,
    D: DimNameSub<U1>,
    C: RationalCurve<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let eps = epsilon::<T>();
    let (start, end) = curve.knots_domain();
    ensure_nurbs!(
        interval.length() > eps,
        Domain,
        "Sub curve interval [{:?}, {:?}] is empty or decreasing",
        interval.t0(),
        interval.t1()
    );
    ensure_nurbs!(
        interval.t0() >= start - eps && interval.t1() <= end + eps,
        Domain,
        "Sub curve interval [{:?}, {:?}] leaves the domain [{:?}, {:?}]",
        interval.t0(),
        interval.t1(),
        start,
        end
    );

    let tail = if interval.t0() > start + eps {
        try_split_curve(curve, interval.t0())?.1
    } else {
        NurbsCurve::try_new(
            curve.degree(),
            curve.control_points().to_vec(),
            curve.knots().to_vec(),
        )?
    };

    if interval.t1() < end - eps {
        Ok(try_split_curve(&tail, interval.t1())?.0)
    } else {
        Ok(tail)
    }
}
