use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint, OVector};

use super::{epsilon, FloatingPoint};

/// Represents a ray (an infinite line with a parametrization) in D dimensions.
#[derive(Clone, Debug)]
pub struct Ray<T: FloatingPoint, D>
where
    D: DimName,
    DefaultAllocator: Allocator<D>,
{
    origin: OPoint<T, D>,
    direction: OVector<T, D>,
}

/// Closest approach of two rays.
/// For coplanar, non-parallel rays both points coincide at the intersection.
#[derive(Clone, Debug)]
pub struct RayIntersection<T: FloatingPoint, D>
where
    D: DimName,
    DefaultAllocator: Allocator<D>,
{
    point0: OPoint<T, D>,
    parameter0: T,
    point1: OPoint<T, D>,
    parameter1: T,
}

impl<T: FloatingPoint, D> RayIntersection<T, D>
where
    D: DimName,
    DefaultAllocator: Allocator<D>,
{
    pub fn point0(&self) -> &OPoint<T, D> {
        &self.point0
    }

    pub fn parameter0(&self) -> T {
        self.parameter0
    }

    pub fn point1(&self) -> &OPoint<T, D> {
        &self.point1
    }

    pub fn parameter1(&self) -> T {
        self.parameter1
    }
}

impl<T: FloatingPoint, D> Ray<T, D>
where
    D: DimName,
    DefaultAllocator: Allocator<D>,
{
    pub fn new(origin: OPoint<T, D>, direction: OVector<T, D>) -> Self {
        Self { origin, direction }
    }

    pub fn origin(&self) -> &OPoint<T, D> {
        &self.origin
    }

    pub fn direction(&self) -> &OVector<T, D> {
        &self.direction
    }

    pub fn point_at(&self, t: T) -> OPoint<T, D> {
        &self.origin + &self.direction * t
    }

    /// Finds the closest approach between two rays.
    /// Returns `None` if the rays are parallel or one of them has no direction.
    /// # Example
    /// ```
    /// use knotwork::prelude::Ray;
    /// use nalgebra::{Point2, Vector2};
    /// let a = Ray::new(Point2::new(0., 0.), Vector2::new(1., 0.));
    /// let b = Ray::new(Point2::new(2., -1.), Vector2::new(0., 2.));
    /// let hit = a.find_intersection(&b).unwrap();
    /// assert_eq!(hit.parameter0(), 2.);
    /// assert_eq!(hit.parameter1(), 0.5);
    /// ```
    pub fn find_intersection(&self, other: &Self) -> Option<RayIntersection<T, D>> {
        let daa = self.direction.dot(&self.direction);
        let dbb = other.direction.dot(&other.direction);
        let dab = self.direction.dot(&other.direction);
        let det = daa * dbb - dab * dab;

        if det.abs() <= epsilon::<T>() * daa * dbb || daa == T::zero() || dbb == T::zero() {
            return None;
        }

        // normal equations of min |a(t) - b(w)|^2
        let r = &other.origin - &self.origin;
        let ra = r.dot(&self.direction);
        let rb = r.dot(&other.direction);
        let t = (ra * dbb - rb * dab) / det;
        let w = (ra * dab - rb * daa) / det;

        Some(RayIntersection {
            point0: self.point_at(t),
            parameter0: t,
            point1: other.point_at(w),
            parameter1: w,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    use super::Ray;

    #[test]
    fn skew_rays_closest_approach() {
        let a = Ray::new(Point3::new(0., 0., 0.), Vector3::new(1., 0., 0.));
        let b = Ray::new(Point3::new(3., -1., 1.), Vector3::new(0., 1., 0.));
        let hit = a.find_intersection(&b).unwrap();
        assert_relative_eq!(*hit.point0(), Point3::new(3., 0., 0.));
        assert_relative_eq!(*hit.point1(), Point3::new(3., 0., 1.));
        assert_relative_eq!(hit.parameter1(), 1.);
    }

    #[test]
    fn parallel_rays_do_not_intersect() {
        let a = Ray::new(Point3::new(0., 0., 0.), Vector3::new(1., 1., 0.));
        let b = Ray::new(Point3::new(0., 1., 0.), Vector3::new(-2., -2., 0.));
        assert!(a.find_intersection(&b).is_none());
    }
}
