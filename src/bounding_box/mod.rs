use nalgebra::{
    allocator::Allocator, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, OVector, U1,
};

use crate::{curve::NurbsCurve, curve::RationalCurve, misc::FloatingPoint};

/// An axis-aligned bounding box in D space.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    min: OVector<T, D>,
    max: OVector<T, D>,
}

impl<T: FloatingPoint, D: DimName> BoundingBox<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    /// Create a new bounding box from two corners.
    /// The corners are reordered per axis, so any two opposite corners can be given.
    pub fn new(a: OVector<T, D>, b: OVector<T, D>) -> Self {
        let min = a.zip_map(&b, |x, y| x.min(y));
        let max = a.zip_map(&b, |x, y| x.max(y));
        Self { min, max }
    }

    /// Create a new bounding box enclosing the given points.
    /// An empty iterator gives an inverted box (min = +inf, max = -inf) that contains nothing.
    pub fn new_with_points<I: IntoIterator<Item = OPoint<T, D>>>(iter: I) -> Self {
        let mut min = OVector::<T, D>::from_element(T::scalar(f64::INFINITY));
        let mut max = -min.clone();

        for point in iter {
            for i in 0..D::dim() {
                min[i] = min[i].min(point[i]);
                max[i] = max[i].max(point[i]);
            }
        }

        Self { min, max }
    }

    pub fn min(&self) -> &OVector<T, D> {
        &self.min
    }

    pub fn max(&self) -> &OVector<T, D> {
        &self.max
    }

    pub fn center(&self) -> OVector<T, D> {
        (&self.min + &self.max) * T::scalar(0.5)
    }

    pub fn size(&self) -> OVector<T, D> {
        &self.max - &self.min
    }

    /// Check if the bounding box intersects with another bounding box.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::Vector3;
    /// use knotwork::prelude::BoundingBox;
    ///
    /// let b0 = BoundingBox::new(Vector3::from_element(0.), Vector3::from_element(1.));
    /// assert!(b0.intersects(&b0, None));
    ///
    /// let b1 = BoundingBox::new(Vector3::from_element(0.5), Vector3::from_element(1.5));
    /// assert!(b0.intersects(&b1, None));
    ///
    /// let eps = 1e-6;
    /// let b2 = BoundingBox::new(Vector3::from_element(1. + eps), Vector3::from_element(2.));
    /// assert!(!b0.intersects(&b2, None));
    /// ```
    pub fn intersects(&self, other: &Self, tolerance: Option<T>) -> bool {
        let tolerance = tolerance.unwrap_or(T::default_epsilon());
        (0..D::dim()).all(|i| {
            self.min[i] - tolerance <= other.max[i] && other.min[i] - tolerance <= self.max[i]
        })
    }

    /// Check if the bounding box contains a point.
    /// # Examples
    /// ```
    /// use nalgebra::{Point3, Vector3};
    /// use knotwork::prelude::BoundingBox;
    /// let bb = BoundingBox::new(Vector3::from_element(0.), Vector3::from_element(1.));
    /// assert!(bb.contains(&Point3::new(0.5, 0.5, 0.5)));
    /// assert!(bb.contains(&Point3::new(0., 0.5, 1.0)));
    /// assert!(!bb.contains(&Point3::new(-1e-8, 0.5, 0.5)));
    /// ```
    pub fn contains(&self, point: &OPoint<T, D>) -> bool {
        (0..D::dim()).all(|i| self.min[i] <= point[i] && point[i] <= self.max[i])
    }

    /// Smallest box enclosing both boxes
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.zip_map(&other.min, |a, b| a.min(b)),
            max: self.max.zip_map(&other.max, |a, b| a.max(b)),
        }
    }
}

impl<T: FloatingPoint, D: DimName> FromIterator<OPoint<T, D>> for BoundingBox<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    fn from_iter<I: IntoIterator<Item = OPoint<T, D>>>(iter: I) -> Self {
        Self::new_with_points(iter)
    }
}

/// Bounding box of the control polygon, which encloses the curve (convex hull property)
impl<'a, T: FloatingPoint, D: DimName> From<&'a NurbsCurve<T, D>>
    for BoundingBox<T, DimNameDiff<D, U1>>
where
    DefaultAllocator: Allocator<D>,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    fn from(value: &'a NurbsCurve<T, D>) -> Self {
        Self::new_with_points(value.dehomogenized_control_points())
    }
}
