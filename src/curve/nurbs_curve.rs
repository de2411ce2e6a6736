use nalgebra::{
    allocator::Allocator, Const, DefaultAllocator, DimNameDiff, DimNameSub, OPoint, SMatrix,
    SVector, U1,
};

use crate::{
    curve::{homogenize, RationalCurve},
    error::ensure_nurbs,
    knot::KnotVector,
    misc::{FloatingPoint, Transformable},
};

/// NURBS curve representation
/// By generics, it can be used for 2D or 3D curves with f32 or f64 scalar types
#[derive(Clone, Debug, PartialEq)]
pub struct NurbsCurve<T: FloatingPoint, D: DimNameSub<U1>>
where
    DefaultAllocator: Allocator<D>,
{
    /// control points with homogeneous coordinates
    /// the last element of the vector is the `weight`
    control_points: Vec<OPoint<T, D>>,
    degree: usize,
    /// knot vector for the NURBS curve
    /// the length of the knot vector is equal to the `# of control points + degree + 1`
    knots: KnotVector<T>,
}

/// 2D NURBS curve alias
pub type NurbsCurve2D<T> = NurbsCurve<T, Const<3>>;

/// 3D NURBS curve alias
pub type NurbsCurve3D<T> = NurbsCurve<T, Const<4>>;

impl<T: FloatingPoint, D: DimNameSub<U1>> NurbsCurve<T, D>
where
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Create a new NURBS curve from homogeneous control points
    /// # Failures
    /// - if the degree is zero
    /// - if the number of control points is not greater than the degree
    /// - the number of knots is not equal to the number of control points + the degree + 1
    /// - if the knots are decreasing somewhere
    /// - if a weight is not positive
    ///
    /// # Example
    /// ```
    /// use knotwork::prelude::*;
    /// use nalgebra::Point3;
    ///
    /// let w = 1.; // weight for each control points
    /// let control_points: Vec<Point3<f64>> = vec![
    ///     Point3::new(50., 50., w),
    ///     Point3::new(30., 370., w),
    ///     Point3::new(180., 350., w),
    ///     Point3::new(150., 100., w),
    ///     Point3::new(250., 50., w),
    /// ];
    /// let degree = 3;
    /// let m = control_points.len() + degree + 1;
    /// // create an uniform knot vector
    /// let knots = (0..m).map(|i| i as f64).collect();
    /// let nurbs = NurbsCurve2D::try_new(3, control_points, knots);
    /// assert!(nurbs.is_ok());
    /// ```
    pub fn try_new(
        degree: usize,
        control_points: Vec<OPoint<T, D>>,
        knots: Vec<T>,
    ) -> anyhow::Result<Self> {
        ensure_nurbs!(degree >= 1, Configuration, "Degree must be at least 1");
        ensure_nurbs!(
            control_points.len() > degree,
            Configuration,
            "Too few control points for curve: got {}, expected at least {}",
            control_points.len(),
            degree + 1
        );
        ensure_nurbs!(
            knots.len() == control_points.len() + degree + 1,
            Configuration,
            "Invalid number of knots, got {}, expected {}",
            knots.len(),
            control_points.len() + degree + 1
        );

        let knots = KnotVector::new(knots);
        ensure_nurbs!(
            knots.is_non_decreasing(),
            Configuration,
            "Knots must be non-decreasing"
        );
        ensure_nurbs!(
            control_points
                .iter()
                .all(|p| p[D::dim() - 1] > T::zero()),
            Configuration,
            "Weights must be positive"
        );

        Ok(Self {
            degree,
            control_points,
            knots,
        })
    }

    /// Create a non-rational curve with a clamped uniform knot vector on [0, 1]
    /// # Example
    /// ```
    /// use knotwork::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![
    ///     Point3::new(0., 0., 0.),
    ///     Point3::new(1., 1., 0.),
    ///     Point3::new(2., 0., 0.),
    /// ];
    /// let curve = NurbsCurve3D::try_from_points(&points, 2).unwrap();
    /// assert_eq!(curve.knots_domain(), (0., 1.));
    /// assert_relative_eq!(curve.point_at(0.5), Point3::new(1., 0.5, 0.));
    /// ```
    pub fn try_from_points(
        points: &[OPoint<T, DimNameDiff<D, U1>>],
        degree: usize,
    ) -> anyhow::Result<Self> {
        let weights = vec![T::one(); points.len()];
        Self::try_from_weighted_points(points, &weights, degree)
    }

    /// Create a rational curve with a clamped uniform knot vector on [0, 1]
    /// from Euclidean points and their weights
    pub fn try_from_weighted_points(
        points: &[OPoint<T, DimNameDiff<D, U1>>],
        weights: &[T],
        degree: usize,
    ) -> anyhow::Result<Self> {
        ensure_nurbs!(
            points.len() == weights.len(),
            Configuration,
            "Got {} points but {} weights",
            points.len(),
            weights.len()
        );
        let knots = KnotVector::try_clamped_uniform(degree, points.len())?;
        let control_points = points
            .iter()
            .zip(weights.iter())
            .map(|(p, w)| homogenize(p, *w))
            .collect();
        Self::try_new(degree, control_points, knots.to_vec())
    }

    /// Check if the curve is clamped at both ends
    pub fn is_clamped(&self) -> bool {
        self.knots.is_clamped(self.degree)
    }

    /// Refine the knot vector of the curve
    /// Returns a new curve with the same shape and parametrization, the receiver is left untouched.
    /// # Example
    /// ```
    /// use knotwork::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![
    ///     Point3::new(0., 0., 0.),
    ///     Point3::new(1., 2., 0.),
    ///     Point3::new(3., 2., 1.),
    ///     Point3::new(4., 0., 0.),
    /// ];
    /// let curve = NurbsCurve3D::try_from_points(&points, 3).unwrap();
    /// let refined = curve.try_refine_knot(&[0.25, 0.5, 0.5]).unwrap();
    /// assert_eq!(refined.control_points().len(), 7);
    /// assert_relative_eq!(curve.point_at(0.3), refined.point_at(0.3), epsilon = 1e-10);
    /// ```
    pub fn try_refine_knot(&self, knots_to_insert: &[T]) -> anyhow::Result<Self> {
        let (knots, control_points) =
            self.knots
                .try_refine(self.degree, &self.control_points, knots_to_insert)?;
        Ok(Self {
            degree: self.degree,
            control_points,
            knots,
        })
    }

    /// Insert the knot `u` `multiplicity` times, returning a new curve
    pub fn try_insert_knot(&self, u: T, multiplicity: usize) -> anyhow::Result<Self> {
        let (knots, control_points) =
            self.knots
                .try_insert(u, multiplicity, self.degree, &self.control_points)?;
        Ok(Self {
            degree: self.degree,
            control_points,
            knots,
        })
    }

    /// Build a curve from parts that are valid by construction (refinement, splitting, arcs)
    pub(crate) fn from_parts_unchecked(
        degree: usize,
        control_points: Vec<OPoint<T, D>>,
        knots: KnotVector<T>,
    ) -> Self {
        Self {
            degree,
            control_points,
            knots,
        }
    }
}

impl<T: FloatingPoint, D: DimNameSub<U1>> RationalCurve<T, D> for NurbsCurve<T, D>
where
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    fn degree(&self) -> usize {
        self.degree
    }

    fn knots(&self) -> &KnotVector<T> {
        &self.knots
    }

    fn control_points(&self) -> &[OPoint<T, D>] {
        &self.control_points
    }
}

/// Apply a homogeneous transform matrix (e.g. `Matrix4` for 3D curves) to the Euclidean
/// control points, keeping their weights
impl<'a, T: FloatingPoint, const D: usize> Transformable<&'a SMatrix<T, D, D>>
    for NurbsCurve<T, Const<D>>
where
    Const<D>: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<Const<D>, U1>>,
{
    fn transformed(&self, transform: &'a SMatrix<T, D, D>) -> Self {
        let control_points = self
            .control_points
            .iter()
            .map(|p| {
                let w = p[D - 1];
                let mut v = p.coords / w;
                v[D - 1] = T::one();
                let mut t: SVector<T, D> = transform * v;
                let tw = t[D - 1];
                for i in 0..(D - 1) {
                    t[i] = t[i] / tw * w;
                }
                t[D - 1] = w;
                OPoint::<T, Const<D>> { coords: t }
            })
            .collect();
        Self {
            control_points,
            degree: self.degree,
            knots: self.knots.clone(),
        }
    }
}

#[cfg(feature = "serde")]
impl<T, D: DimNameSub<U1>> serde::Serialize for NurbsCurve<T, D>
where
    T: FloatingPoint + serde::Serialize,
    DefaultAllocator: Allocator<D>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let control_points: Vec<&[T]> = self
            .control_points
            .iter()
            .map(|p| p.coords.as_slice())
            .collect();
        let mut state = serializer.serialize_struct("NurbsCurve", 3)?;
        state.serialize_field("degree", &self.degree)?;
        state.serialize_field("knots", &self.knots)?;
        state.serialize_field("control_points", &control_points)?;
        state.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, T, D: DimNameSub<U1>> serde::Deserialize<'de> for NurbsCurve<T, D>
where
    T: FloatingPoint + serde::Deserialize<'de>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(serde::Deserialize)]
        struct RawCurve<T> {
            degree: usize,
            knots: Vec<T>,
            control_points: Vec<Vec<T>>,
        }

        let raw = RawCurve::<T>::deserialize(deserializer)?;
        let control_points = raw
            .control_points
            .iter()
            .map(|p| {
                if p.len() == D::dim() {
                    Ok(OPoint::<T, D>::from_slice(p))
                } else {
                    Err(De::Error::invalid_length(
                        p.len(),
                        &"homogeneous control point coordinates",
                    ))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::try_new(raw.degree, control_points, raw.knots).map_err(De::Error::custom)
    }
}
