use std::f64::consts::PI;

use approx::assert_relative_eq;
use knotwork::prelude::*;
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3, U3};

fn helix_like() -> NurbsCurve3D<f64> {
    NurbsCurve3D::try_from_points(
        &[
            Point3::new(1., 0., 0.),
            Point3::new(1., 1., 0.5),
            Point3::new(-1., 1., 1.),
            Point3::new(-1., -1., 1.5),
            Point3::new(1., -1., 2.),
            Point3::new(1., 0., 2.5),
        ],
        3,
    )
    .unwrap()
}

#[test]
fn split_then_divide_matches_divide() {
    let curve = helix_like();
    let total = curve.try_length().unwrap();
    let samples = try_divide_by_count(&curve, 6).unwrap();

    // splitting at a division point leaves the remaining divisions on the halves
    let at = samples[2].parameter();
    let (left, right) = try_split_curve(&curve, at).unwrap();
    assert_relative_eq!(left.try_length().unwrap(), total / 3., epsilon = 1e-7);

    let right_samples = try_divide_by_count(&right, 4).unwrap();
    for (a, b) in right_samples.iter().zip(samples[2..].iter()) {
        assert_relative_eq!(a.parameter(), b.parameter(), epsilon = 1e-7);
        assert_relative_eq!(*a.point(), *b.point(), epsilon = 1e-7);
    }
}

#[test]
fn division_is_invariant_under_rigid_motion() {
    let curve = helix_like();
    let iso = Isometry3::from_parts(
        Translation3::new(-3., 4., 1.),
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.7),
    );
    let moved = curve.transformed(&iso.to_homogeneous());
    let a = try_divide_by_length(&curve, 0.75).unwrap();
    let b = try_divide_by_length(&moved, 0.75).unwrap();
    assert_eq!(a.len(), b.len());
    for (a, b) in a.iter().zip(b.iter()) {
        assert_relative_eq!(a.parameter(), b.parameter(), epsilon = 1e-8);
        assert_relative_eq!(iso * a.point(), *b.point(), epsilon = 1e-8);
    }
}

#[test]
fn frames_sweep_a_profile_along_an_arc() {
    let arc = Arc::try_from_angle(Plane::xy(), 5., PI).unwrap();
    let parameters: Vec<f64> = try_divide_by_count(&arc, 12)
        .unwrap()
        .iter()
        .map(|s| s.parameter())
        .collect();
    let frames = try_perpendicular_frames(&arc, &parameters).unwrap();

    // a circle of radius 1 in each frame stays on the torus around the arc
    for frame in frames.iter() {
        for i in 0..8 {
            let angle = 2. * PI * i as f64 / 8.;
            let p = frame.point_at(angle.cos(), angle.sin());
            let radial = Vector3::new(p.x, p.y, 0.).norm() - 5.;
            assert_relative_eq!(radial.hypot(p.z), 1., epsilon = 1e-9);
        }
    }
}

#[test]
fn control_point_box_contains_the_arc() {
    let arc = Arc::try_new(Plane::xy(), 2., Interval::new(0.2, 2.4)).unwrap();
    let bb: BoundingBox<f64, U3> = BoundingBox::from(&arc.to_nurbs());
    for sample in try_divide_by_count(&arc, 20).unwrap() {
        assert!(bb.contains(sample.point()));
    }
}
