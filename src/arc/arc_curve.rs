use log::debug;
use nalgebra::{Const, Isometry3, Point2, Point3, Point4, Vector2, Vector3, U3};

use crate::{
    bounding_box::BoundingBox,
    curve::{homogenize, NurbsCurve3D, RationalCurve},
    error::{ensure_nurbs, NurbsError},
    knot::KnotVector,
    misc::{epsilon, FloatingPoint, Interval, Plane, Ray, Transformable},
};

/// A circular arc lying in a plane, turning counter-clockwise around the plane normal.
///
/// The angular domain is measured in radians from the plane's x axis. Its exact NURBS form
/// (degree 2, one rational Bezier segment per quarter turn at most) is built once at
/// construction and kept as part of the value, so evaluating the arc as a curve never
/// rebuilds it. The curve parameter runs over [0, 1], not over the angles.
#[derive(Clone, Debug, PartialEq)]
pub struct Arc<T: FloatingPoint> {
    plane: Plane<T>,
    radius: T,
    domain: Interval<T>,
    knots: KnotVector<T>,
    control_points: Vec<Point4<T>>,
    raw_control_points: Vec<Point3<T>>,
}

impl<T: FloatingPoint> Arc<T> {
    /// Create an arc from its plane, radius and angular domain.
    /// A domain longer than a full turn is wrapped around.
    /// # Failures
    /// - if the radius is not positive
    /// - if the domain is decreasing or empty
    ///
    /// # Example
    /// ```
    /// use knotwork::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    /// use std::f64::consts::FRAC_PI_2;
    ///
    /// let arc = Arc::try_new(Plane::xy(), 2., Interval::new(0., FRAC_PI_2)).unwrap();
    /// assert_eq!(arc.control_points().len(), 3);
    /// assert_relative_eq!(arc.point_at(0.), Point3::new(2., 0., 0.));
    /// assert_relative_eq!(arc.point_at(1.), Point3::new(0., 2., 0.), epsilon = 1e-12);
    /// ```
    pub fn try_new(plane: Plane<T>, radius: T, domain: Interval<T>) -> anyhow::Result<Self> {
        let eps = epsilon::<T>();
        ensure_nurbs!(
            radius > eps,
            Configuration,
            "Arc radius must be positive, got {:?}",
            radius
        );
        ensure_nurbs!(
            !domain.is_decreasing(),
            Configuration,
            "Arc domain must not be decreasing, got [{:?}, {:?}]",
            domain.t0(),
            domain.t1()
        );
        ensure_nurbs!(
            domain.length() > eps,
            Configuration,
            "Arc domain must not be empty"
        );

        let two_pi = T::two_pi();
        let domain = if domain.length() > two_pi + eps {
            let wrapped = wrap_angle(domain.length());
            let length = if wrapped <= eps { two_pi } else { wrapped };
            Interval::new(domain.t0(), domain.t0() + length)
        } else {
            domain
        };

        let (knots, raw_control_points, weights) = build_nurbs(&plane, radius, &domain)?;
        let control_points = raw_control_points
            .iter()
            .zip(weights.iter())
            .map(|(p, w)| homogenize::<T, Const<4>>(p, *w))
            .collect();

        Ok(Self {
            plane,
            radius,
            domain,
            knots,
            control_points,
            raw_control_points,
        })
    }

    /// Arc starting on the plane's x axis and turning by `angle`
    pub fn try_from_angle(plane: Plane<T>, radius: T, angle: T) -> anyhow::Result<Self> {
        Self::try_new(plane, radius, Interval::new(T::zero(), angle))
    }

    /// Full circle
    pub fn try_circle(plane: Plane<T>, radius: T) -> anyhow::Result<Self> {
        Self::try_from_angle(plane, radius, T::two_pi())
    }

    /// Arc from `start` through `interior` to `end`
    /// # Failures
    /// - if two of the points coincide or the three points are collinear
    /// # Example
    /// ```
    /// use knotwork::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    ///
    /// let arc = Arc::try_from_three_points(
    ///     &Point3::new(1., 0., 0.),
    ///     &Point3::new(0., 1., 0.),
    ///     &Point3::new(-1., 0., 0.),
    /// ).unwrap();
    /// assert_relative_eq!(arc.radius(), 1.);
    /// assert_relative_eq!(arc.angle(), std::f64::consts::PI);
    /// assert_relative_eq!(*arc.center(), Point3::origin(), epsilon = 1e-12);
    /// ```
    pub fn try_from_three_points(
        start: &Point3<T>,
        interior: &Point3<T>,
        end: &Point3<T>,
    ) -> anyhow::Result<Self> {
        let eps = epsilon::<T>();
        let u = interior - start;
        let v = end - start;
        ensure_nurbs!(
            u.norm() > eps && v.norm() > eps && (end - interior).norm() > eps,
            Configuration,
            "Arc points must be distinct"
        );
        let w = u.cross(&v);
        let w2 = w.norm_squared();
        ensure_nurbs!(
            w.norm() > eps * u.norm() * v.norm(),
            Configuration,
            "Arc points must not be collinear"
        );

        // circumcenter of the triangle
        let center = start
            + (v.cross(&w) * u.norm_squared() + w.cross(&u) * v.norm_squared())
                / (T::scalar(2.) * w2);
        let x_direction = start - center;
        let radius = x_direction.norm();
        let normal = w.normalize();
        let plane = Plane::try_new(center, x_direction, normal.cross(&x_direction))?;

        let (x, y) = plane.closest_parameters(end);
        let angle = wrap_angle(y.atan2(x));
        Self::try_new(plane, radius, Interval::new(T::zero(), angle))
    }

    /// Arc from `start` to `end` leaving `start` along `direction`
    /// # Failures
    /// - if `start` and `end` coincide
    /// - if `direction` is zero or parallel to the chord
    pub fn try_from_start_end_direction(
        start: &Point3<T>,
        end: &Point3<T>,
        direction: &Vector3<T>,
    ) -> anyhow::Result<Self> {
        let eps = epsilon::<T>();
        let chord = end - start;
        ensure_nurbs!(
            chord.norm() > eps,
            Configuration,
            "Arc start and end must be distinct"
        );
        ensure_nurbs!(
            direction.norm() > eps,
            Configuration,
            "Arc start direction must not be zero"
        );
        let n = direction.cross(&chord);
        ensure_nurbs!(
            n.norm() > eps * direction.norm() * chord.norm(),
            Configuration,
            "Arc start direction must not be parallel to the chord"
        );

        let normal = n.normalize();
        let towards_center = normal.cross(direction).normalize();
        let radius = chord.norm_squared() / (T::scalar(2.) * chord.dot(&towards_center));
        let center = start + towards_center * radius;
        let x_direction = start - center;
        let plane = Plane::try_new(center, x_direction, normal.cross(&x_direction))?;

        let (x, y) = plane.closest_parameters(end);
        let angle = wrap_angle(y.atan2(x));
        Self::try_new(plane, radius, Interval::new(T::zero(), angle))
    }

    pub fn plane(&self) -> &Plane<T> {
        &self.plane
    }

    pub fn center(&self) -> &Point3<T> {
        self.plane.origin()
    }

    pub fn radius(&self) -> T {
        self.radius
    }

    /// Angular domain in radians
    pub fn domain(&self) -> Interval<T> {
        self.domain
    }

    /// Sweep angle in radians
    pub fn angle(&self) -> T {
        self.domain.length()
    }

    /// Exact arc length
    pub fn length(&self) -> T {
        self.radius * self.angle()
    }

    pub fn start_point(&self) -> Point3<T> {
        self.point_at_angle(self.domain.t0())
    }

    pub fn mid_point(&self) -> Point3<T> {
        self.point_at_angle(self.domain.mid())
    }

    pub fn end_point(&self) -> Point3<T> {
        self.point_at_angle(self.domain.t1())
    }

    /// Closed form point at an angle measured from the plane's x axis
    pub fn point_at_angle(&self, angle: T) -> Point3<T> {
        circle_point(&self.plane, self.radius, angle)
    }

    /// Unit tangent at an angle, pointing in the direction of increasing angle
    pub fn tangent_at_angle(&self, angle: T) -> Vector3<T> {
        circle_tangent(&self.plane, angle)
    }

    /// Closest point on the arc.
    /// The point is projected onto the plane; outside of the angular span the nearer end wins.
    pub fn closest_point(&self, point: &Point3<T>) -> Point3<T> {
        let (x, y) = self.plane.closest_parameters(point);
        if x.hypot(y) <= epsilon::<T>() {
            return self.start_point();
        }

        let t0 = self.domain.t0();
        let relative = wrap_angle(y.atan2(x) - t0);
        if relative <= self.angle() {
            return self.point_at_angle(t0 + relative);
        }

        let start = self.start_point();
        let end = self.end_point();
        if (point - start).norm() <= (point - end).norm() {
            start
        } else {
            end
        }
    }

    /// Axis-aligned box around the arc's end points and every quarter turn
    /// (0, π/2, π, 3π/2 in the plane's frame) inside the angular span
    pub fn bounding_box(&self) -> BoundingBox<T, U3> {
        let quarter = T::frac_pi_2();
        let first = (self.domain.t0() / quarter).ceil();
        let last = (self.domain.t1() / quarter).floor();
        let mut points = vec![self.start_point(), self.end_point()];
        let mut k = first;
        while k <= last {
            points.push(self.point_at_angle(k * quarter));
            k += T::one();
        }
        BoundingBox::new_with_points(points)
    }

    /// An independent NURBS curve with the same representation
    pub fn to_nurbs(&self) -> NurbsCurve3D<T> {
        NurbsCurve3D::from_parts_unchecked(2, self.control_points.clone(), self.knots.clone())
    }

    /// Euclidean control points of the cached representation
    pub fn raw_control_points(&self) -> &[Point3<T>] {
        &self.raw_control_points
    }
}

impl<T: FloatingPoint> RationalCurve<T, Const<4>> for Arc<T> {
    fn degree(&self) -> usize {
        2
    }

    fn knots(&self) -> &KnotVector<T> {
        &self.knots
    }

    fn control_points(&self) -> &[Point4<T>] {
        &self.control_points
    }

    fn exact_length(&self) -> Option<T> {
        Some(self.length())
    }
}

/// Rigid transforms map the cached representation exactly, so it is transformed in place of rebuilding
impl<'a, T: FloatingPoint> Transformable<&'a Isometry3<T>> for Arc<T> {
    fn transformed(&self, transform: &'a Isometry3<T>) -> Self {
        let raw_control_points: Vec<_> = self
            .raw_control_points
            .iter()
            .map(|p| transform * p)
            .collect();
        let control_points = raw_control_points
            .iter()
            .zip(self.control_points.iter())
            .map(|(p, cp)| homogenize::<T, Const<4>>(p, cp.w))
            .collect();
        Self {
            plane: self.plane.transformed(transform),
            radius: self.radius,
            domain: self.domain,
            knots: self.knots.clone(),
            control_points,
            raw_control_points,
        }
    }
}

#[cfg(feature = "serde")]
impl<T> serde::Serialize for Arc<T>
where
    T: FloatingPoint + serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Arc", 3)?;
        state.serialize_field("plane", &self.plane)?;
        state.serialize_field("radius", &self.radius)?;
        state.serialize_field("domain", &self.domain)?;
        state.end()
    }
}

/// Only the defining values are read, the NURBS representation is rebuilt by the constructor
#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for Arc<T>
where
    T: FloatingPoint + serde::Deserialize<'de>,
{
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(bound(deserialize = "T: FloatingPoint + serde::Deserialize<'de>"))]
        struct RawArc<T: FloatingPoint> {
            plane: Plane<T>,
            radius: T,
            domain: Interval<T>,
        }

        let raw = RawArc::<T>::deserialize(deserializer)?;
        Self::try_new(raw.plane, raw.radius, raw.domain).map_err(serde::de::Error::custom)
    }
}

/// Number of rational Bezier segments, each spanning at most a quarter turn
fn segment_count<T: FloatingPoint>(angle: T) -> usize {
    let quarter = T::frac_pi_2();
    if angle <= quarter {
        1
    } else if angle <= quarter * T::scalar(2.) {
        2
    } else if angle <= quarter * T::scalar(3.) {
        3
    } else {
        4
    }
}

/// Knots, Euclidean control points and weights of the exact arc representation
fn build_nurbs<T: FloatingPoint>(
    plane: &Plane<T>,
    radius: T,
    domain: &Interval<T>,
) -> anyhow::Result<(KnotVector<T>, Vec<Point3<T>>, Vec<T>)> {
    let segments = segment_count(domain.length());
    let delta = domain.length() / T::scalar(segments as f64);
    let weight = (delta * T::scalar(0.5)).cos();
    debug!(
        "arc of radius {:?} over {:?} rad: {} segment(s)",
        radius,
        domain.length(),
        segments
    );

    let mut points = Vec::with_capacity(2 * segments + 1);
    let mut weights = Vec::with_capacity(2 * segments + 1);
    points.push(circle_point(plane, radius, domain.t0()));
    weights.push(T::one());

    for i in 1..=segments {
        let theta0 = domain.t0() + delta * T::scalar((i - 1) as f64);
        let theta1 = if i == segments {
            domain.t1()
        } else {
            domain.t0() + delta * T::scalar(i as f64)
        };
        let p0 = circle_point(plane, radius, theta0);
        let p1 = circle_point(plane, radius, theta1);

        // intersect the tangent lines at both ends in plane coordinates
        let local = |p: &Point3<T>| {
            let (u, v) = plane.closest_parameters(p);
            Point2::new(u, v)
        };
        let r0 = Ray::new(local(&p0), Vector2::new(-theta0.sin(), theta0.cos()));
        let r1 = Ray::new(local(&p1), Vector2::new(-theta1.sin(), theta1.cos()));
        let hit = r0.find_intersection(&r1).ok_or_else(|| {
            NurbsError::numerical(format!(
                "Tangent lines of arc segment {} do not intersect",
                i
            ))
        })?;
        let interior = hit.point0();

        points.push(plane.point_at(interior.x, interior.y));
        weights.push(weight);
        points.push(p1);
        weights.push(T::one());
    }

    let mut knots = Vec::with_capacity(2 * segments + 4);
    knots.extend(std::iter::repeat_n(T::zero(), 3));
    for i in 1..segments {
        let k = T::scalar(i as f64) / T::scalar(segments as f64);
        knots.push(k);
        knots.push(k);
    }
    knots.extend(std::iter::repeat_n(T::one(), 3));

    Ok((KnotVector::new(knots), points, weights))
}

fn circle_point<T: FloatingPoint>(plane: &Plane<T>, radius: T, angle: T) -> Point3<T> {
    plane.point_at(radius * angle.cos(), radius * angle.sin())
}

fn circle_tangent<T: FloatingPoint>(plane: &Plane<T>, angle: T) -> Vector3<T> {
    plane.y_axis() * angle.cos() - plane.x_axis() * angle.sin()
}

/// Bring an angle into [0, 2π)
fn wrap_angle<T: FloatingPoint>(angle: T) -> T {
    let two_pi = T::two_pi();
    let wrapped = angle - two_pi * (angle / two_pi).floor();
    if wrapped >= two_pi {
        T::zero()
    } else {
        wrapped
    }
}
