use log::debug;
use nalgebra::{Const, Vector3};

use crate::{
    curve::RationalCurve,
    error::ensure_nurbs,
    misc::{epsilon, FloatingPoint, Plane},
};

/// Compute rotation-minimizing frames at the given parameters by the double reflection method
/// (Wang, Jüttler, Zheng, Liu: "Computation of Rotation Minimizing Frames", 2008).
///
/// Each frame is a plane whose origin is the curve point and whose `z_axis` is the unit tangent.
/// The first `x_axis` is an arbitrary perpendicular; every following one is obtained from the
/// previous frame by a reflection across the bisecting plane of the two origins, then a second
/// reflection that carries the reflected tangent onto the true tangent. Unlike Frenet frames,
/// the result does not flip at inflections or along straight pieces.
/// # Failures
/// - if the tangent vanishes at a parameter
/// - if two consecutive parameters give the same point
///
/// # Example
/// ```
/// use knotwork::prelude::*;
/// use nalgebra::Point3;
/// use approx::assert_relative_eq;
///
/// let curve = NurbsCurve3D::try_from_points(
///     &[
///         Point3::new(0., 0., 0.),
///         Point3::new(1., 2., 0.),
///         Point3::new(3., -1., 1.),
///         Point3::new(4., 1., 2.),
///     ],
///     3,
/// ).unwrap();
/// let parameters: Vec<f64> = (0..=10).map(|i| i as f64 / 10.).collect();
/// let frames = try_perpendicular_frames(&curve, &parameters).unwrap();
/// assert_eq!(frames.len(), 11);
/// for (frame, t) in frames.iter().zip(parameters) {
///     assert_relative_eq!(*frame.z_axis(), curve.tangent_at(t), epsilon = 1e-10);
///     assert_relative_eq!(frame.x_axis().dot(frame.z_axis()), 0., epsilon = 1e-10);
/// }
/// ```
pub fn try_perpendicular_frames<T, C>(
    curve: &C,
    parameters: &[T],
) -> anyhow::Result<Vec<Plane<T>>>
where
    T: FloatingPoint,
    C: RationalCurve<T, Const<4>> + ?Sized,
{
    let Some(first) = parameters.first() else {
        return Ok(vec![]);
    };

    let eps = epsilon::<T>();
    let origins: Vec<_> = parameters.iter().map(|t| curve.point_at(*t)).collect();
    let tangents = parameters
        .iter()
        .map(|t| {
            let tangent = curve.derivative_at(*t);
            let norm = tangent.norm();
            ensure_nurbs!(
                norm > eps,
                Numerical,
                "Tangent vanishes at parameter {:?}",
                t
            );
            Ok(tangent / norm)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut normals = Vec::with_capacity(parameters.len());
    normals.push(initial_normal(&tangents[0]));

    for i in 0..(parameters.len() - 1) {
        let v1 = origins[i + 1] - origins[i];
        let c1 = v1.norm_squared();
        ensure_nurbs!(
            c1 > eps * eps,
            Numerical,
            "Frames at {:?} and {:?} share the same origin",
            parameters[i],
            parameters[i + 1]
        );

        let two = T::scalar(2.);
        let r = &normals[i];
        let t = &tangents[i];
        let r_l = r - &v1 * (two / c1 * v1.dot(r));
        let t_l = t - &v1 * (two / c1 * v1.dot(t));

        let next = &tangents[i + 1];
        let v2 = next - t_l;
        let c2 = v2.norm_squared();
        let reflected = if c2 > eps * eps {
            &r_l - &v2 * (two / c2 * v2.dot(&r_l))
        } else {
            r_l
        };

        // remove the drift accumulated over many reflections
        let normal = (reflected.clone() - next * next.dot(&reflected)).normalize();
        normals.push(normal);
    }

    debug!(
        "{} perpendicular frames from parameter {:?}",
        parameters.len(),
        first
    );

    Ok(origins
        .into_iter()
        .zip(tangents)
        .zip(normals)
        .map(|((origin, tangent), normal)| {
            let binormal = tangent.cross(&normal);
            Plane::from_orthonormal(origin, normal, binormal, tangent)
        })
        .collect())
}

/// Unit vector perpendicular to the tangent, built from the world axis the tangent is least aligned with
fn initial_normal<T: FloatingPoint>(tangent: &Vector3<T>) -> Vector3<T> {
    let (tx, ty, tz) = (tangent.x.abs(), tangent.y.abs(), tangent.z.abs());
    let axis = if tx <= ty && tx <= tz {
        Vector3::x()
    } else if ty <= tz {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let v = tangent.cross(&axis).normalize();
    v.cross(tangent).normalize()
}
