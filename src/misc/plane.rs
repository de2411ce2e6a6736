use nalgebra::{Isometry3, IsometryMatrix3, Point3, Rotation3, Translation3, Vector3};

use crate::error::ensure_nurbs;

use super::{epsilon, geometric_tolerance, FloatingPoint, Transformable};

/// A plane in 3D space, given by an origin and a right-handed orthonormal frame.
/// The `z_axis` is the plane normal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Plane<T: FloatingPoint> {
    origin: Point3<T>,
    x_axis: Vector3<T>,
    y_axis: Vector3<T>,
    z_axis: Vector3<T>,
}

impl<T: FloatingPoint> Plane<T> {
    /// Create a plane from an origin and two in-plane directions.
    /// The x direction is kept, the y direction is re-orthogonalized against it.
    /// # Failures
    /// - if a direction has zero length
    /// - if the directions are parallel
    pub fn try_new(
        origin: Point3<T>,
        x_direction: Vector3<T>,
        y_direction: Vector3<T>,
    ) -> anyhow::Result<Self> {
        let eps = epsilon::<T>();
        ensure_nurbs!(
            x_direction.norm() > eps && y_direction.norm() > eps,
            Configuration,
            "Plane directions must not be zero vectors"
        );
        let x_axis = x_direction.normalize();
        let z = x_axis.cross(&y_direction);
        ensure_nurbs!(
            z.norm() > eps,
            Configuration,
            "Plane directions must not be parallel"
        );
        let z_axis = z.normalize();
        let y_axis = z_axis.cross(&x_axis);
        Ok(Self {
            origin,
            x_axis,
            y_axis,
            z_axis,
        })
    }

    /// Create a plane from explicit axes, which must form a right-handed orthonormal frame
    /// within the geometric tolerance. The axes are kept as given.
    /// # Failures
    /// - if an axis is not of unit length
    /// - if two axes are not perpendicular
    /// - if `z_axis` is not `x_axis × y_axis`
    pub fn try_from_axes(
        origin: Point3<T>,
        x_axis: Vector3<T>,
        y_axis: Vector3<T>,
        z_axis: Vector3<T>,
    ) -> anyhow::Result<Self> {
        let tol = geometric_tolerance::<T>();
        ensure_nurbs!(
            [&x_axis, &y_axis, &z_axis]
                .iter()
                .all(|axis| (axis.norm() - T::one()).abs() <= tol),
            Configuration,
            "Plane axes must be unit vectors"
        );
        ensure_nurbs!(
            x_axis.dot(&y_axis).abs() <= tol
                && y_axis.dot(&z_axis).abs() <= tol
                && z_axis.dot(&x_axis).abs() <= tol,
            Configuration,
            "Plane axes must be mutually perpendicular"
        );
        ensure_nurbs!(
            (x_axis.cross(&y_axis) - z_axis).norm() <= tol,
            Configuration,
            "Plane axes must form a right-handed frame"
        );
        Ok(Self {
            origin,
            x_axis,
            y_axis,
            z_axis,
        })
    }

    /// World XY plane at the origin
    pub fn xy() -> Self {
        Self {
            origin: Point3::origin(),
            x_axis: Vector3::x(),
            y_axis: Vector3::y(),
            z_axis: Vector3::z(),
        }
    }

    /// Build a plane from axes that are already orthonormal
    pub(crate) fn from_orthonormal(
        origin: Point3<T>,
        x_axis: Vector3<T>,
        y_axis: Vector3<T>,
        z_axis: Vector3<T>,
    ) -> Self {
        Self {
            origin,
            x_axis,
            y_axis,
            z_axis,
        }
    }

    pub fn origin(&self) -> &Point3<T> {
        &self.origin
    }

    pub fn x_axis(&self) -> &Vector3<T> {
        &self.x_axis
    }

    pub fn y_axis(&self) -> &Vector3<T> {
        &self.y_axis
    }

    pub fn z_axis(&self) -> &Vector3<T> {
        &self.z_axis
    }

    pub fn normal(&self) -> &Vector3<T> {
        &self.z_axis
    }

    /// Evaluate the plane at local coordinates
    pub fn point_at(&self, u: T, v: T) -> Point3<T> {
        self.origin + self.x_axis * u + self.y_axis * v
    }

    /// Project a point onto the plane and return its local coordinates
    /// # Example
    /// ```
    /// use knotwork::prelude::Plane;
    /// use nalgebra::Point3;
    /// let plane = Plane::<f64>::xy();
    /// let (u, v) = plane.closest_parameters(&Point3::new(2., 3., 7.));
    /// assert_eq!((u, v), (2., 3.));
    /// ```
    pub fn closest_parameters(&self, point: &Point3<T>) -> (T, T) {
        let d = point - self.origin;
        (d.dot(&self.x_axis), d.dot(&self.y_axis))
    }

    pub fn closest_point(&self, point: &Point3<T>) -> Point3<T> {
        let (u, v) = self.closest_parameters(point);
        self.point_at(u, v)
    }

    /// Calculate the signed distance from a point to the plane.
    pub fn signed_distance(&self, point: &Point3<T>) -> T {
        (point - self.origin).dot(&self.z_axis)
    }

    /// Returns the transformation that maps plane-local coordinates to world coordinates.
    pub fn matrix(&self) -> IsometryMatrix3<T> {
        let rot = Rotation3::from_basis_unchecked(&[self.x_axis, self.y_axis, self.z_axis]);
        let trans = Translation3::from(self.origin.coords);
        trans * rot
    }
}

impl<'a, T: FloatingPoint> Transformable<&'a Isometry3<T>> for Plane<T> {
    fn transformed(&self, transform: &'a Isometry3<T>) -> Self {
        Self {
            origin: transform * self.origin,
            x_axis: transform * self.x_axis,
            y_axis: transform * self.y_axis,
            z_axis: transform * self.z_axis,
        }
    }
}

/// Axes read from input are checked, never trusted
#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for Plane<T>
where
    T: FloatingPoint + serde::Deserialize<'de>,
{
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(bound(deserialize = "T: FloatingPoint + serde::Deserialize<'de>"))]
        struct RawPlane<T: FloatingPoint> {
            origin: Point3<T>,
            x_axis: Vector3<T>,
            y_axis: Vector3<T>,
            z_axis: Vector3<T>,
        }

        let raw = RawPlane::<T>::deserialize(deserializer)?;
        Self::try_from_axes(raw.origin, raw.x_axis, raw.y_axis, raw.z_axis)
            .map_err(serde::de::Error::custom)
    }
}
