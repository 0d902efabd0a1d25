//! Narrow-phase manifold generation across shape pairs: point counts,
//! normal directions, and circle-circle point-to-point, edge-circle.

use rigid2d::collide::{collide, ManifoldType};
use rigid2d::math::{vec2, Rot, Transform};
use rigid2d::shapes::{Disk, Edge, Polygon, Shape};

fn identity() -> Transform {
    Transform::new(vec2(0.0, 0.0), Rot::IDENTITY)
}

#[test]
fn overlapping_circles_produce_one_point_at_each_local_center() {
    let a = Shape::Disk(Disk::new(vec2(0.0, 0.0), 1.0));
    let b = Shape::Disk(Disk::new(vec2(0.0, 0.0), 1.0));
    let xf_a = identity();
    let xf_b = Transform::new(vec2(1.5, 0.0), Rot::IDENTITY);

    let m = collide(&a, &xf_a, &b, &xf_b);
    assert_eq!(m.kind, ManifoldType::Circles);
    assert_eq!(m.point_count(), 1);
    assert_eq!(m.local_point, vec2(0.0, 0.0));
}

#[test]
fn separated_circles_produce_no_manifold() {
    let a = Shape::Disk(Disk::new(vec2(0.0, 0.0), 1.0));
    let b = Shape::Disk(Disk::new(vec2(0.0, 0.0), 1.0));
    let xf_a = identity();
    let xf_b = Transform::new(vec2(10.0, 0.0), Rot::IDENTITY);

    let m = collide(&a, &xf_a, &b, &xf_b);
    assert_eq!(m.point_count(), 0);
}

#[test]
fn box_resting_on_box_produces_a_two_point_face_manifold() {
    let ground = Shape::Polygon(Polygon::box_shape(5.0, 1.0));
    let top = Shape::Polygon(Polygon::box_shape(1.0, 1.0));
    let xf_ground = identity();
    // Slight overlap so the manifold is guaranteed to exist.
    let xf_top = Transform::new(vec2(0.0, 1.99), Rot::IDENTITY);

    let m = collide(&ground, &xf_ground, &top, &xf_top);
    assert!(matches!(m.kind, ManifoldType::FaceA | ManifoldType::FaceB));
    assert_eq!(m.point_count(), 2);
}

#[test]
fn disk_on_polygon_face_agrees_with_polygon_on_disk() {
    let poly = Shape::Polygon(Polygon::box_shape(1.0, 1.0));
    let disk = Shape::Disk(Disk::new(vec2(0.0, 0.0), 0.5));
    let xf_poly = identity();
    let xf_disk = Transform::new(vec2(0.0, 1.3), Rot::IDENTITY);

    let forward = collide(&poly, &xf_poly, &disk, &xf_disk);
    let backward = collide(&disk, &xf_disk, &poly, &xf_poly);
    assert_eq!(forward.point_count(), backward.point_count());
    assert_eq!(forward.point_count(), 1);
}

#[test]
fn edge_circle_resting_contact_has_one_point() {
    let edge = Shape::Edge(Edge::new(vec2(-5.0, 0.0), vec2(5.0, 0.0), 0.0));
    let disk = Shape::Disk(Disk::new(vec2(0.0, 0.0), 0.5));
    let xf_edge = identity();
    let xf_disk = Transform::new(vec2(0.0, 0.3), Rot::IDENTITY);

    let m = collide(&edge, &xf_edge, &disk, &xf_disk);
    assert_eq!(m.point_count(), 1);
}

#[test]
fn rotated_boxes_still_generate_a_manifold() {
    let a = Shape::Polygon(Polygon::box_shape(1.0, 1.0));
    let b = Shape::Polygon(Polygon::box_shape(1.0, 1.0));
    let xf_a = identity();
    let xf_b = Transform::new(vec2(0.0, 1.9), Rot::from_angle(0.1));

    let m = collide(&a, &xf_a, &b, &xf_b);
    assert!(m.point_count() >= 1);
}
