use nalgebra::{
    allocator::Allocator, DefaultAllocator, DimNameDiff, DimNameSub, OPoint, OVector, U1,
};

use crate::{
    curve::arc_length::{ArcLengthOptions, ArcLengthTable},
    knot::KnotVector,
    misc::{epsilon, Binomial, FloatingPoint, Interval},
};

/// Capability set shared by every rational curve type.
///
/// Implementors only expose their degree, knot vector and homogeneous control points
/// (`(w * x, w * y, .., w)`); evaluation, derivatives and arc length are provided on top of them,
/// so any implementor can be handed to the divide operations.
pub trait RationalCurve<T: FloatingPoint, D: DimNameSub<U1>>
where
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    fn degree(&self) -> usize;

    fn knots(&self) -> &KnotVector<T>;

    /// Control points with homogeneous coordinates, the last element is the weight
    fn control_points(&self) -> &[OPoint<T, D>];

    fn knots_domain(&self) -> (T, T) {
        self.knots().domain(self.degree())
    }

    fn knots_domain_interval(&self) -> Interval<T> {
        self.knots().domain_interval(self.degree())
    }

    fn weights(&self) -> Vec<T> {
        self.control_points()
            .iter()
            .map(|p| p[D::dim() - 1])
            .collect()
    }

    /// Check if any weight differs from 1
    fn is_rational(&self) -> bool {
        let eps = epsilon::<T>();
        self.weights()
            .iter()
            .any(|w| (*w - T::one()).abs() > eps)
    }

    fn dehomogenized_control_points(&self) -> Vec<OPoint<T, DimNameDiff<D, U1>>> {
        self.control_points().iter().map(project).collect()
    }

    /// Evaluate the homogeneous point at a parameter by de Boor's algorithm
    fn homogeneous_point_at(&self, t: T) -> OPoint<T, D> {
        let degree = self.degree();
        let knots = self.knots();
        let span = knots.span_at(degree, t);
        let mut d = self.control_points()[(span - degree)..=span].to_vec();
        for r in 1..=degree {
            for j in (r..=degree).rev() {
                let i = span - degree + j;
                let denom = knots[i + degree + 1 - r] - knots[i];
                let alpha = if denom == T::zero() {
                    T::zero()
                } else {
                    (t - knots[i]) / denom
                };
                d[j] = d[j - 1].lerp(&d[j], alpha);
            }
        }
        d[degree].clone()
    }

    /// Evaluate the curve at a given parameter to get a dehomogenized point
    fn point_at(&self, t: T) -> OPoint<T, DimNameDiff<D, U1>> {
        project(&self.homogeneous_point_at(t))
    }

    /// Derivatives of the homogeneous curve up to `derivs`, orders above the degree vanish
    fn homogeneous_derivatives(&self, t: T, derivs: usize) -> Vec<OVector<T, D>> {
        let degree = self.degree();
        let knots = self.knots();
        let control_points = self.control_points();
        let span = knots.span_at(degree, t);
        let nders = knots.derivative_basis_functions(span, t, degree, derivs);
        nders
            .iter()
            .map(|row| {
                let mut v = OVector::<T, D>::zeros();
                for (j, n) in row.iter().enumerate() {
                    v += &control_points[span - degree + j].coords * *n;
                }
                v
            })
            .collect()
    }

    /// Evaluate the derivatives of the rational curve (quotient rule over the weight derivatives)
    /// The first element is the point itself as a vector
    fn rational_derivatives(&self, t: T, derivs: usize) -> Vec<OVector<T, DimNameDiff<D, U1>>> {
        let ders = self.homogeneous_derivatives(t, derivs);
        let dim = D::dim() - 1;
        let a_ders: Vec<_> = ders
            .iter()
            .map(|d| OVector::<T, DimNameDiff<D, U1>>::from_fn(|i, _| d[i]))
            .collect();
        let w_ders: Vec<_> = ders.iter().map(|d| d[dim]).collect();

        let mut binom = Binomial::<T>::new();
        let mut ck: Vec<OVector<T, DimNameDiff<D, U1>>> = Vec::with_capacity(derivs + 1);
        for k in 0..=derivs {
            let mut v = a_ders[k].clone();
            for i in 1..=k {
                let coef = binom.get(k, i) * w_ders[i];
                v -= &ck[k - i] * coef;
            }
            ck.push(v / w_ders[0]);
        }
        ck
    }

    /// First derivative of the curve
    fn derivative_at(&self, t: T) -> OVector<T, DimNameDiff<D, U1>> {
        let mut ders = self.rational_derivatives(t, 1);
        ders.swap_remove(1)
    }

    /// Unit tangent at a parameter
    /// A vanishing derivative yields the zero vector
    fn tangent_at(&self, t: T) -> OVector<T, DimNameDiff<D, U1>> {
        let d = self.derivative_at(t);
        let norm = d.norm();
        if norm > epsilon::<T>() {
            d / norm
        } else {
            d
        }
    }

    /// Closed-form length for curve types that know it.
    /// When present it replaces the quadrature total everywhere lengths are measured.
    fn exact_length(&self) -> Option<T> {
        None
    }

    /// Compute the length of the curve by span-wise Gauss-Legendre quadrature
    fn try_length(&self) -> anyhow::Result<T> {
        match self.exact_length() {
            Some(length) => Ok(length),
            None => Ok(ArcLengthTable::try_new(self)?.total()),
        }
    }

    /// Arc length from the start of the domain up to `t`
    fn try_length_at(&self, t: T) -> anyhow::Result<T> {
        let table = ArcLengthTable::try_new(self)?;
        table.try_length_at(self, t)
    }

    /// Find the parameter whose arc length from the start of the domain equals `length`
    fn try_parameter_at_length(&self, length: T) -> anyhow::Result<T> {
        let table = ArcLengthTable::try_new(self)?;
        table.try_parameter_at(self, length, &ArcLengthOptions::default())
    }
}

/// Dehomogenize a point, `None` if the weight is zero
pub fn dehomogenize<T: FloatingPoint, D: DimNameSub<U1>>(
    point: &OPoint<T, D>,
) -> Option<OPoint<T, DimNameDiff<D, U1>>>
where
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let w = point[D::dim() - 1];
    if w != T::zero() {
        Some(project(point))
    } else {
        None
    }
}

/// Divide by the weight; curve weights are positive by construction
fn project<T: FloatingPoint, D: DimNameSub<U1>>(
    point: &OPoint<T, D>,
) -> OPoint<T, DimNameDiff<D, U1>>
where
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let w = point[D::dim() - 1];
    OPoint::from(OVector::<T, DimNameDiff<D, U1>>::from_fn(|i, _| point[i] / w))
}

/// Lift a Euclidean point to homogeneous coordinates with the given weight
pub fn homogenize<T: FloatingPoint, D: DimNameSub<U1>>(
    point: &OPoint<T, DimNameDiff<D, U1>>,
    weight: T,
) -> OPoint<T, D>
where
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let dim = D::dim() - 1;
    OPoint::from(OVector::<T, D>::from_fn(|i, _| {
        if i < dim {
            point[i] * weight
        } else {
            weight
        }
    }))
}
