//! Edge-circle manifold.
//!
//! Grounded on `original_source/Box2D/Box2D/Collision/CollideEdge.cpp`'s
//! region classification (vertex-1 / vertex-2 / face), extended with the
//! ghost-vertex adjacency check so touching chain segments don't each
//! separately claim a vertex contact at the shared joint.

use super::{ContactFeature, FeatureType, Manifold, ManifoldPoint, ManifoldType};
use crate::math::Transform;
use crate::shapes::{Disk, Edge};
use cgmath::InnerSpace;

pub fn collide_edge_and_circle(edge: &Edge, xf_a: &Transform, circle: &Disk, xf_b: &Transform) -> Manifold {
    let q = xf_a.inv_transform_point(xf_b.transform_point(circle.center));

    let a = edge.v1;
    let b = edge.v2;
    let e = b - a;

    // Barycentric coordinates of q's projection onto segment AB.
    let u = e.dot(b - q);
    let v = e.dot(q - a);

    let total_radius = edge.radius + circle.radius;

    // Region A: q projects behind `a`.
    if v <= 0.0 {
        // If there's a neighbor edge at v0 and q lies within its AB region
        // too, this vertex contact belongs to the neighbor instead (spec
        // §4.5's "Region A" rule), so we report no contact here.
        if let Some(v0) = edge.v0 {
            let e1 = a - v0;
            let u1 = e1.dot(a - q);
            if u1 > 0.0 {
                return Manifold::unset();
            }
        }
        if (q - a).magnitude2() > total_radius * total_radius {
            return Manifold::unset();
        }
        return point_manifold(a, circle.center, 0);
    }

    // Region B: q projects past `b`.
    if u <= 0.0 {
        if let Some(v3) = edge.v3 {
            let e2 = v3 - b;
            let v2 = e2.dot(q - b);
            if v2 > 0.0 {
                return Manifold::unset();
            }
        }
        if (q - b).magnitude2() > total_radius * total_radius {
            return Manifold::unset();
        }
        return point_manifold(b, circle.center, 1);
    }

    // Region AB: face contact.
    let (e_normalized, len) = crate::math::normalize(e);
    let _ = len;
    let mut normal = crate::math::right_perp(e_normalized);
    let den = e.magnitude2();
    let projected = a * (u / den) + b * (v / den);
    if normal.dot(q - a) < 0.0 {
        normal = -normal;
    }
    if (q - projected).magnitude2() > total_radius * total_radius {
        return Manifold::unset();
    }

    let mut points = smallvec::SmallVec::new();
    points.push(ManifoldPoint {
        local_point: circle.center,
        id: ContactFeature {
            index_a: 0,
            type_a: FeatureType::Face,
            index_b: 0,
            type_b: FeatureType::Vertex,
        },
        normal_impulse: 0.0,
        tangent_impulse: 0.0,
    });

    Manifold {
        kind: ManifoldType::FaceA,
        local_normal: normal,
        local_point: projected,
        points,
    }
}

fn point_manifold(vertex: crate::math::Vec2, circle_center: crate::math::Vec2, vertex_index: u8) -> Manifold {
    let mut points = smallvec::SmallVec::new();
    points.push(ManifoldPoint {
        local_point: circle_center,
        id: ContactFeature {
            index_a: vertex_index,
            type_a: FeatureType::Vertex,
            index_b: 0,
            type_b: FeatureType::Vertex,
        },
        normal_impulse: 0.0,
        tangent_impulse: 0.0,
    });
    Manifold {
        kind: ManifoldType::Circles,
        local_normal: crate::math::vec2(0.0, 0.0),
        local_point: vertex,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{vec2, Rot};

    #[test]
    fn circle_above_face_produces_face_manifold() {
        let edge = Edge::new(vec2(-2.0, 0.0), vec2(2.0, 0.0), 0.0);
        let circle = Disk::new(vec2(0.0, 0.0), 0.5);
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(0.0, 0.4), Rot::IDENTITY);
        let m = collide_edge_and_circle(&edge, &xf_a, &circle, &xf_b);
        assert_eq!(m.kind, ManifoldType::FaceA);
        assert_relative_eq_normal(&m);
    }

    fn assert_relative_eq_normal(m: &Manifold) {
        assert!(m.local_normal.y > 0.0);
    }

    #[test]
    fn circle_past_endpoint_with_no_neighbor_produces_vertex_manifold() {
        let edge = Edge::new(vec2(-2.0, 0.0), vec2(2.0, 0.0), 0.0);
        let circle = Disk::new(vec2(0.0, 0.0), 0.5);
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(2.2, 0.2), Rot::IDENTITY);
        let m = collide_edge_and_circle(&edge, &xf_a, &circle, &xf_b);
        assert_eq!(m.kind, ManifoldType::Circles);
        assert_eq!(m.points[0].id.index_a, 1);
    }
}
