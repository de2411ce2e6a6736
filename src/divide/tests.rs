use std::f64::consts::PI;

use approx::assert_relative_eq;
use nalgebra::{Point2, Point3};

use crate::{
    error::NurbsError,
    misc::{Interval, Plane},
    prelude::{
        try_divide_by_count, try_divide_by_length, try_perpendicular_frames, try_split_curve,
        try_sub_curve, Arc, NurbsCurve2D, NurbsCurve3D, RationalCurve,
    },
};

/// Degree 3 planar curve used as the reference for arc-length division
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

fn bezier_curve() -> NurbsCurve3D<f64> {
    NurbsCurve3D::try_from_points(
        &[
            Point3::new(2., 2., 0.),
            Point3::new(4., 12., 0.),
            Point3::new(7., 12., 0.),
            Point3::new(15., 2., 0.),
        ],
        3,
    )
    .unwrap()
}

fn is_domain_error(err: &anyhow::Error) -> bool {
    matches!(NurbsError::of(err), Some(NurbsError::Domain(_)))
}

#[test]
fn split_inserts_full_multiplicity() {
    let curve = bezier_curve();
    let (left, right) = try_split_curve(&curve, 0.5).unwrap();

    assert_eq!(left.knots().to_vec(), vec![0., 0., 0., 0., 0.5, 0.5, 0.5, 0.5]);
    assert_eq!(right.knots().to_vec(), vec![0.5, 0.5, 0.5, 0.5, 1., 1., 1., 1.]);
    assert_eq!(left.knots().multiplicity_of(0.5), 4);
    assert_eq!(right.knots().multiplicity_of(0.5), 4);
    assert_eq!(left.knots_domain(), (0., 0.5));
    assert_eq!(right.knots_domain(), (0.5, 1.));

    assert_relative_eq!(left.point_at(0.5), curve.point_at(0.5), epsilon = 1e-12);
    assert_relative_eq!(right.point_at(0.5), curve.point_at(0.5), epsilon = 1e-12);
}

#[test]
fn split_halves_reproduce_the_curve() {
    let curve = planar_curve();
    for u in [0.2, 1. / 3., 0.61] {
        let (left, right) = try_split_curve(&curve, u).unwrap();
        for i in 0..=10 {
            let t = u * i as f64 / 10.;
            assert_relative_eq!(left.point_at(t), curve.point_at(t), epsilon = 1e-10);
            assert_relative_eq!(left.tangent_at(t), curve.tangent_at(t), epsilon = 1e-9);

            let t = u + (1. - u) * i as f64 / 10.;
            assert_relative_eq!(right.point_at(t), curve.point_at(t), epsilon = 1e-10);
            assert_relative_eq!(right.tangent_at(t), curve.tangent_at(t), epsilon = 1e-9);
        }

        let total = curve.try_length().unwrap();
        let sum = left.try_length().unwrap() + right.try_length().unwrap();
        assert_relative_eq!(sum, total, epsilon = 1e-8);
    }
}

#[test]
fn split_rejects_boundary_parameters() {
    let curve = bezier_curve();
    for u in [0., 1., -0.5, 1.5] {
        let err = try_split_curve(&curve, u).unwrap_err();
        assert!(is_domain_error(&err), "parameter {}", u);
    }
}

#[test]
fn split_arc() {
    let arc = Arc::try_from_angle(Plane::xy(), 2., 1.5 * PI).unwrap();
    let (left, right) = try_split_curve(&arc, 0.4).unwrap();
    assert_relative_eq!(left.point_at(0.2), arc.point_at(0.2), epsilon = 1e-10);
    assert_relative_eq!(right.point_at(0.8), arc.point_at(0.8), epsilon = 1e-10);
    assert_relative_eq!(
        left.try_length().unwrap() + right.try_length().unwrap(),
        arc.length(),
        epsilon = 1e-8
    );
}

#[test]
fn sub_curve_keeps_parametrization() {
    let curve = planar_curve();
    let sub = try_sub_curve(&curve, Interval::new(0.25, 0.75)).unwrap();
    assert_eq!(sub.knots_domain(), (0.25, 0.75));
    for t in [0.25, 0.4, 0.6, 0.75] {
        assert_relative_eq!(sub.point_at(t), curve.point_at(t), epsilon = 1e-10);
    }

    let whole = try_sub_curve(&curve, Interval::new(0., 1.)).unwrap();
    assert_eq!(whole, curve);

    let err = try_sub_curve(&curve, Interval::new(0.5, 0.5)).unwrap_err();
    assert!(is_domain_error(&err));
    let err = try_sub_curve(&curve, Interval::new(-1., 0.5)).unwrap_err();
    assert!(is_domain_error(&err));
}

#[test]
fn divide_by_count_reference_parameters() {
    let curve = planar_curve();
    let samples = try_divide_by_count(&curve, 7).unwrap();
    let expected = [
        0., 0.122941, 0.265156, 0.420293, 0.579707, 0.734844, 0.877059, 1.,
    ];
    assert_eq!(samples.len(), expected.len());
    for (sample, parameter) in samples.iter().zip(expected) {
        assert_relative_eq!(sample.parameter(), parameter, epsilon = 1e-6);
        assert_relative_eq!(
            *sample.point(),
            curve.point_at(sample.parameter()),
            epsilon = 1e-12
        );
    }
    assert_eq!(samples[0].parameter(), 0.);
    assert_eq!(samples[7].parameter(), 1.);
}

#[test]
fn divide_by_count_is_monotonic() {
    let curve = planar_curve();
    let total = curve.try_length().unwrap();
    for n in [1, 2, 5, 13, 40] {
        let samples = try_divide_by_count(&curve, n).unwrap();
        assert_eq!(samples.len(), n + 1);
        assert!(samples
            .windows(2)
            .all(|w| w[0].parameter() < w[1].parameter()));
        for (i, sample) in samples.iter().enumerate() {
            let expected = total * i as f64 / n as f64;
            assert_relative_eq!(sample.length(), expected, epsilon = 1e-9);
            assert_relative_eq!(
                curve.try_length_at(sample.parameter()).unwrap(),
                expected,
                epsilon = 1e-7
            );
        }
    }

    let err = try_divide_by_count(&curve, 0).unwrap_err();
    assert!(is_domain_error(&err));
}

#[test]
fn divide_by_length_matches_count() {
    let curve = planar_curve();
    let total = curve.try_length().unwrap();
    for n in [1, 3, 7, 10] {
        let by_count = try_divide_by_count(&curve, n).unwrap();
        let by_length = try_divide_by_length(&curve, total / n as f64).unwrap();
        assert_eq!(by_length.len(), n + 1);
        for (a, b) in by_count.iter().zip(by_length.iter()) {
            assert_relative_eq!(a.parameter(), b.parameter(), epsilon = 1e-9);
        }
    }
}

#[test]
fn divide_by_length_ends_with_remainder() {
    let curve = planar_curve();
    let total = curve.try_length().unwrap();
    let samples = try_divide_by_length(&curve, 15.).unwrap();
    assert_eq!(samples.len(), 5);
    assert_relative_eq!(samples[3].length(), 45.);
    assert_eq!(samples[4].parameter(), 1.);
    assert_relative_eq!(samples[4].length(), total);

    let samples = try_divide_by_length(&curve, total * 2.).unwrap();
    assert_eq!(samples.len(), 2);

    for length in [0., -1.] {
        let err = try_divide_by_length(&curve, length).unwrap_err();
        assert!(is_domain_error(&err));
    }
}

#[test]
fn divide_arc_by_length() {
    let arc = Arc::try_from_angle(Plane::xy(), 1., PI).unwrap();
    let samples = try_divide_by_length(&arc, PI / 4.).unwrap();
    assert_eq!(samples.len(), 5);
    for (i, sample) in samples.iter().enumerate() {
        let angle = PI / 4. * i as f64;
        assert_relative_eq!(
            *sample.point(),
            arc.point_at_angle(angle),
            epsilon = 1e-8
        );
    }
}

#[test]
fn arc_samples_end_on_the_exact_length() {
    let arc = Arc::try_new(Plane::xy(), 3., Interval::new(0.3, 0.3 + 1.7 * PI)).unwrap();
    let exact = arc.try_length().unwrap();
    assert_eq!(exact, arc.length());

    let samples = try_divide_by_count(&arc, 9).unwrap();
    assert_eq!(samples[9].length(), exact);
    assert_relative_eq!(samples[3].length(), exact / 3., epsilon = 1e-12);

    let samples = try_divide_by_length(&arc, 2.5).unwrap();
    assert_eq!(samples.last().unwrap().length(), exact);
    assert_relative_eq!(arc.try_length_at(1.).unwrap(), exact, epsilon = 1e-12);
    assert_relative_eq!(arc.try_length_at(0.5).unwrap(), exact / 2., epsilon = 1e-9);
}

#[test]
fn divide_2d_curve() {
    let curve = NurbsCurve2D::try_from_points(
        &[Point2::new(0., 0.), Point2::new(2., 0.), Point2::new(4., 0.)],
        2,
    )
    .unwrap();
    let samples = try_divide_by_count(&curve, 4).unwrap();
    for (i, sample) in samples.iter().enumerate() {
        assert_relative_eq!(sample.point().x, i as f64, epsilon = 1e-9);
    }
}

#[test]
fn zero_length_curve_cannot_be_divided() {
    let point = Point3::new(1., 1., 1.);
    let curve = NurbsCurve3D::try_from_points(&[point, point, point], 2).unwrap();
    let err = try_divide_by_count(&curve, 3).unwrap_err();
    assert!(is_domain_error(&err));
    let err = try_divide_by_length(&curve, 0.1).unwrap_err();
    assert!(is_domain_error(&err));
}

#[test]
fn frames_are_orthonormal_and_follow_the_tangent() {
    let curve = NurbsCurve3D::try_from_points(
        &[
            Point3::new(0., 0., 0.),
            Point3::new(2., 3., 1.),
            Point3::new(4., -2., 2.),
            Point3::new(6., 4., -1.),
            Point3::new(9., 0., 0.),
        ],
        3,
    )
    .unwrap();
    let parameters: Vec<f64> = (0..=40).map(|i| i as f64 / 40.).collect();
    let frames = try_perpendicular_frames(&curve, &parameters).unwrap();
    assert_eq!(frames.len(), parameters.len());

    for (frame, t) in frames.iter().zip(parameters.iter()) {
        let (x, y, z) = (frame.x_axis(), frame.y_axis(), frame.z_axis());
        assert_relative_eq!(x.norm(), 1., epsilon = 1e-10);
        assert_relative_eq!(y.norm(), 1., epsilon = 1e-10);
        assert_relative_eq!(z.norm(), 1., epsilon = 1e-10);
        assert_relative_eq!(x.dot(y), 0., epsilon = 1e-10);
        assert_relative_eq!(y.dot(z), 0., epsilon = 1e-10);
        assert_relative_eq!(z.dot(x), 0., epsilon = 1e-10);
        assert_relative_eq!(x.cross(y), *z, epsilon = 1e-10);
        assert_relative_eq!(*z, curve.tangent_at(*t), epsilon = 1e-10);
        assert_relative_eq!(*frame.origin(), curve.point_at(*t), epsilon = 1e-12);
    }
}

#[test]
fn frames_do_not_twist_on_a_planar_curve() {
    // the curve lies in the xz plane, so the first normal is the y axis and must stay there
    let curve = NurbsCurve3D::try_from_points(
        &[
            Point3::new(0., 0., 0.),
            Point3::new(1., 0., 1.),
            Point3::new(2., 0., -1.),
            Point3::new(3., 0., 0.),
        ],
        3,
    )
    .unwrap();
    let parameters: Vec<f64> = (0..=30).map(|i| i as f64 / 30.).collect();
    let frames = try_perpendicular_frames(&curve, &parameters).unwrap();
    for frame in frames.iter() {
        assert_relative_eq!(frame.x_axis().y.abs(), 1., epsilon = 1e-10);
    }
}

#[test]
fn frames_along_an_arc() {
    let arc = Arc::try_circle(Plane::xy(), 2.).unwrap();
    let samples = try_divide_by_count(&arc, 16).unwrap();
    let parameters: Vec<f64> = samples.iter().map(|s| s.parameter()).collect();
    let frames = try_perpendicular_frames(&arc, &parameters).unwrap();
    for (frame, sample) in frames.iter().zip(samples.iter()) {
        assert_relative_eq!(*frame.origin(), *sample.point(), epsilon = 1e-12);
        // the first normal is radial and a planar curve keeps it in the plane
        assert_relative_eq!(frame.x_axis().z, 0., epsilon = 1e-10);
        assert_relative_eq!(frame.y_axis().z.abs(), 1., epsilon = 1e-10);
    }
}

#[test]
fn frames_edge_cases() {
    let curve = planar_curve();
    assert!(try_perpendicular_frames(&curve, &[]).unwrap().is_empty());
    assert_eq!(try_perpendicular_frames(&curve, &[0.3]).unwrap().len(), 1);

    let err = try_perpendicular_frames(&curve, &[0.3, 0.3]).unwrap_err();
    assert!(matches!(
        NurbsError::of(&err),
        Some(NurbsError::Numerical(_))
    ));
}
