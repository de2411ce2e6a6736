use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};

use approx::assert_relative_eq;
use nalgebra::{Matrix4, Point2, Point3, Vector3};

use crate::{
    error::NurbsError,
    misc::Transformable,
    prelude::{ArcLengthOptions, NurbsCurve2D, NurbsCurve3D, RationalCurve},
};

use super::arc_length::ArcLengthTable;

fn planar_curve() -> NurbsCurve3D<f64> {
    NurbsCurve3D::try_from_points(
        &[
            Point3::new(5., 5., 0.),
            Point3::new(10., 10., 0.),
            Point3::new(20., 15., 0.),
            Point3::new(35., 15., 0.),
            Point3::new(45., 10., 0.),
            Point3::new(50., 5., 0.),
        ],
        3,
    )
    .unwrap()
}

/// Quarter circle of radius 1 as a single rational quadratic segment
fn quarter_circle() -> NurbsCurve2D<f64> {
    NurbsCurve2D::try_new(
        2,
        vec![
            Point3::new(1., 0., 1.),
            Point3::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2, FRAC_1_SQRT_2),
            Point3::new(0., 1., 1.),
        ],
        vec![0., 0., 0., 1., 1., 1.],
    )
    .unwrap()
}

fn configuration_error(err: anyhow::Error) -> bool {
    matches!(NurbsError::of(&err), Some(NurbsError::Configuration(_)))
}

#[test]
fn rejects_invalid_definitions() {
    let points = vec![Point3::new(0., 0., 1.), Point3::new(1., 0., 1.)];
    assert!(configuration_error(
        NurbsCurve2D::try_new(0, points.clone(), vec![0., 0., 1.]).unwrap_err()
    ));
    assert!(configuration_error(
        NurbsCurve2D::try_new(2, points.clone(), vec![0., 0., 0., 1., 1.]).unwrap_err()
    ));
    assert!(configuration_error(
        NurbsCurve2D::try_new(1, points.clone(), vec![0., 0., 1.]).unwrap_err()
    ));
    assert!(configuration_error(
        NurbsCurve2D::try_new(1, points.clone(), vec![0., 1., 0.5, 1.]).unwrap_err()
    ));
    assert!(configuration_error(
        NurbsCurve2D::try_new(
            1,
            vec![Point3::new(0., 0., 1.), Point3::new(1., 0., 0.)],
            vec![0., 0., 1., 1.]
        )
        .unwrap_err()
    ));
    assert!(configuration_error(
        NurbsCurve2D::try_from_weighted_points(
            &[Point2::new(0., 0.), Point2::new(1., 0.)],
            &[1.],
            1
        )
        .unwrap_err()
    ));
}

#[test]
fn interpolates_end_points() {
    let curve = planar_curve();
    assert!(curve.is_clamped());
    assert!(!curve.is_rational());
    let (start, end) = curve.knots_domain();
    assert_relative_eq!(curve.point_at(start), Point3::new(5., 5., 0.));
    assert_relative_eq!(curve.point_at(end), Point3::new(50., 5., 0.));
}

#[test]
fn rational_quarter_circle() {
    let curve = quarter_circle();
    assert!(curve.is_rational());
    for i in 0..=10 {
        let t = i as f64 / 10.;
        let p = curve.point_at(t);
        assert_relative_eq!(p.coords.norm(), 1., epsilon = 1e-12);

        // tangent of a circle is perpendicular to the radius
        let tangent = curve.tangent_at(t);
        assert_relative_eq!(tangent.norm(), 1., epsilon = 1e-12);
        assert_relative_eq!(tangent.dot(&p.coords), 0., epsilon = 1e-12);
    }
    assert_relative_eq!(curve.try_length().unwrap(), FRAC_PI_2, epsilon = 1e-10);
}

#[test]
fn derivatives_match_finite_differences() {
    let curve = planar_curve();
    let h = 1e-6;
    for t in [0.1, 0.3, 0.5, 0.77] {
        let numeric = (curve.point_at(t + h) - curve.point_at(t - h)) / (2. * h);
        assert_relative_eq!(curve.derivative_at(t), numeric, epsilon = 1e-5);
    }

    let ders = curve.rational_derivatives(0.4, 4);
    assert_eq!(ders.len(), 5);
    assert_relative_eq!(ders[0], curve.point_at(0.4).coords, epsilon = 1e-12);
    // a cubic has no fourth derivative
    assert_relative_eq!(ders[4], Vector3::zeros(), epsilon = 1e-10);
}

#[test]
fn length_of_unit_circle() {
    let corner_weight = 1. / 2.;
    let unit_circle = NurbsCurve2D::try_new(
        2,
        vec![
            Point3::new(1.0, 0.0, 1.),
            Point3::new(1.0, 1.0, 1.0) * corner_weight,
            Point3::new(-1.0, 1.0, 1.0) * corner_weight,
            Point3::new(-1.0, 0.0, 1.),
            Point3::new(-1.0, -1.0, 1.0) * corner_weight,
            Point3::new(1.0, -1.0, 1.0) * corner_weight,
            Point3::new(1.0, 0.0, 1.),
        ],
        vec![0., 0., 0., 1. / 4., 1. / 2., 1. / 2., 3. / 4., 1., 1., 1.],
    )
    .unwrap();
    assert_relative_eq!(unit_circle.try_length().unwrap(), 2. * PI, epsilon = 1e-10);
    assert_relative_eq!(unit_circle.try_length_at(0.5).unwrap(), PI, epsilon = 1e-10);
}

#[test]
fn length_inversion() {
    let curve = planar_curve();
    let total = curve.try_length().unwrap();
    assert_relative_eq!(total, 50.334675095518, epsilon = 1e-8);

    for t in [0.05, 1. / 3., 0.5, 0.9] {
        let length = curve.try_length_at(t).unwrap();
        let inverted = curve.try_parameter_at_length(length).unwrap();
        assert_relative_eq!(inverted, t, epsilon = 1e-9);
    }
    assert_eq!(curve.try_parameter_at_length(0.).unwrap(), 0.);
    assert_eq!(curve.try_parameter_at_length(total).unwrap(), 1.);

    let err = curve.try_parameter_at_length(total * 2.).unwrap_err();
    assert!(matches!(
        NurbsError::of(&err),
        Some(NurbsError::Domain(_))
    ));
    let err = curve.try_length_at(1.5).unwrap_err();
    assert!(matches!(
        NurbsError::of(&err),
        Some(NurbsError::Domain(_))
    ));
}

#[test]
fn length_inversion_reports_non_convergence() {
    let curve = planar_curve();
    let table = ArcLengthTable::try_new(&curve).unwrap();
    let options = ArcLengthOptions::default()
        .with_tolerance(0.)
        .with_max_iterations(1);
    let err = table.try_parameter_at(&curve, 20., &options).unwrap_err();
    assert!(matches!(
        NurbsError::of(&err),
        Some(NurbsError::Numerical(_))
    ));
}

#[test]
fn knot_refinement_keeps_shape() {
    let curve = planar_curve();
    let refined = curve.try_refine_knot(&[0.1, 0.5, 0.5, 0.8]).unwrap();
    assert_eq!(refined.control_points().len(), curve.control_points().len() + 4);
    assert_eq!(
        refined.knots().len(),
        refined.control_points().len() + refined.degree() + 1
    );
    // the receiver is untouched
    assert_eq!(curve.control_points().len(), 6);

    for i in 0..=20 {
        let t = i as f64 / 20.;
        assert_relative_eq!(curve.point_at(t), refined.point_at(t), epsilon = 1e-10);
        assert_relative_eq!(curve.tangent_at(t), refined.tangent_at(t), epsilon = 1e-9);
    }

    let inserted = quarter_circle().try_insert_knot(0.5, 2).unwrap();
    assert_eq!(inserted.knots().multiplicity_of(0.5), 2);
    assert_relative_eq!(
        inserted.point_at(0.25),
        quarter_circle().point_at(0.25),
        epsilon = 1e-12
    );
}

#[test]
fn transform_keeps_weights() {
    let circle = NurbsCurve3D::try_from_weighted_points(
        &[
            Point3::new(1., 0., 0.),
            Point3::new(1., 1., 0.),
            Point3::new(0., 1., 0.),
        ],
        &[1., FRAC_1_SQRT_2, 1.],
        2,
    )
    .unwrap();
    let translation = Matrix4::new_translation(&Vector3::new(1., 2., 3.));
    let moved = circle.transformed(&translation);
    assert_eq!(moved.weights(), circle.weights());
    for t in [0., 0.25, 0.6, 1.] {
        assert_relative_eq!(
            moved.point_at(t),
            circle.point_at(t) + Vector3::new(1., 2., 3.),
            epsilon = 1e-12
        );
    }
}
