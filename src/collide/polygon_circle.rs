//! Polygon-circle manifold.

use super::{ContactFeature, FeatureType, Manifold, ManifoldPoint, ManifoldType};
use crate::math::{Transform, Vec2};
use crate::shapes::{Disk, Polygon};
use cgmath::InnerSpace;

pub fn collide_polygon_and_circle(
    poly: &Polygon,
    xf_a: &Transform,
    circle: &Disk,
    xf_b: &Transform,
) -> Manifold {
    // Circle center in the polygon's local frame.
    let c = xf_a.inv_transform_point(xf_b.transform_point(circle.center));

    // Find the edge with maximum separation.
    let mut normal_index = 0;
    let mut separation = f32::MIN;
    let total_radius = poly.radius + circle.radius;

    for (i, (v, n)) in poly.vertices.iter().zip(poly.normals.iter()).enumerate() {
        let s = n.dot(c - *v);
        if s > total_radius {
            return Manifold::unset();
        }
        if s > separation {
            separation = s;
            normal_index = i;
        }
    }

    let n = poly.vertices.len();
    let v1 = poly.vertices[normal_index];
    let v2 = poly.vertices[(normal_index + 1) % n];

    let mut points = smallvec::SmallVec::new();

    if separation < f32::EPSILON {
        // Circle center is inside the polygon: face region.
        points.push(ManifoldPoint {
            local_point: circle.center,
            id: ContactFeature {
                index_a: normal_index as u8,
                type_a: FeatureType::Face,
                index_b: 0,
                type_b: FeatureType::Vertex,
            },
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
        });
        return Manifold {
            kind: ManifoldType::FaceA,
            local_normal: poly.normals[normal_index],
            local_point: (v1 + v2) * 0.5,
            points,
        };
    }

    let u1 = (c - v1).dot(v2 - v1);
    let u2 = (c - v2).dot(v1 - v2);

    let (local_normal, local_point): (Vec2, Vec2) = if u1 <= 0.0 {
        if (c - v1).magnitude2() > total_radius * total_radius {
            return Manifold::unset();
        }
        let (normal, _) = crate::math::normalize(c - v1);
        (normal, v1)
    } else if u2 <= 0.0 {
        if (c - v2).magnitude2() > total_radius * total_radius {
            return Manifold::unset();
        }
        let (normal, _) = crate::math::normalize(c - v2);
        (normal, v2)
    } else {
        (poly.normals[normal_index], (v1 + v2) * 0.5)
    };

    points.push(ManifoldPoint {
        local_point: circle.center,
        id: ContactFeature {
            index_a: normal_index as u8,
            type_a: FeatureType::Vertex,
            index_b: 0,
            type_b: FeatureType::Vertex,
        },
        normal_impulse: 0.0,
        tangent_impulse: 0.0,
    });

    Manifold {
        kind: ManifoldType::FaceA,
        local_normal,
        local_point,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{vec2, Rot};

    #[test]
    fn circle_resting_on_top_face() {
        let poly = Polygon::box_shape(1.0, 1.0);
        let circle = Disk::new(vec2(0.0, 0.0), 0.5);
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(0.0, 1.3), Rot::IDENTITY);
        let m = collide_polygon_and_circle(&poly, &xf_a, &circle, &xf_b);
        assert_eq!(m.kind, ManifoldType::FaceA);
        assert_eq!(m.point_count(), 1);
    }

    #[test]
    fn circle_far_away_reports_unset() {
        let poly = Polygon::box_shape(1.0, 1.0);
        let circle = Disk::new(vec2(0.0, 0.0), 0.5);
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(10.0, 0.0), Rot::IDENTITY);
        let m = collide_polygon_and_circle(&poly, &xf_a, &circle, &xf_b);
        assert_eq!(m.kind, ManifoldType::Unset);
    }
}
