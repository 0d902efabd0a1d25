//! Polygon-polygon manifold.

use super::{ContactFeature, FeatureType, Manifold, ManifoldPoint, ManifoldType};
use crate::math::{Transform, Vec2};
use crate::shapes::Polygon;
use cgmath::InnerSpace;

/// Finds the edge of `poly` (in `poly`'s own frame, given `other`'s
/// vertices already expressed in `poly`'s frame) with maximum separation.
fn find_max_separation(poly: &Polygon, other_vertices: &[Vec2]) -> (f32, usize) {
    let mut best_index = 0;
    let mut best_separation = f32::MIN;

    for (i, (v, n)) in poly.vertices.iter().zip(poly.normals.iter()).enumerate() {
        let mut min_dot = f32::MAX;
        for ov in other_vertices {
            let d = n.dot(*ov - *v);
            if d < min_dot {
                min_dot = d;
            }
        }
        if min_dot > best_separation {
            best_separation = min_dot;
            best_index = i;
        }
    }

    (best_separation, best_index)
}

#[derive(Clone, Copy, Debug)]
struct ClipVertex {
    point: Vec2,
    feature: ContactFeature,
}

fn clip_segment_to_line(
    input: [ClipVertex; 2],
    normal: Vec2,
    offset: f32,
    edge_index: u8,
) -> smallvec::SmallVec<[ClipVertex; 2]> {
    let mut out = smallvec::SmallVec::new();

    let d0 = normal.dot(input[0].point) - offset;
    let d1 = normal.dot(input[1].point) - offset;

    if d0 <= 0.0 {
        out.push(input[0]);
    }
    if d1 <= 0.0 {
        out.push(input[1]);
    }

    if d0 * d1 < 0.0 {
        let t = d0 / (d0 - d1);
        let point = input[0].point + (input[1].point - input[0].point) * t;
        out.push(ClipVertex {
            point,
            feature: ContactFeature {
                index_a: edge_index,
                type_a: FeatureType::Face,
                index_b: input[0].feature.index_b,
                type_b: FeatureType::Vertex,
            },
        });
    }

    out
}

pub fn collide_polygons(a: &Polygon, xf_a: &Transform, b: &Polygon, xf_b: &Transform) -> Manifold {
    let total_radius = a.radius + b.radius;

    // Express B's vertices in A's frame and vice versa for the separation
    // scan, avoiding per-vertex transform round trips inside the loop.
    let rel_xf_ab = xf_a.mul_t(xf_b);
    let b_in_a: Vec<Vec2> = b.vertices.iter().map(|v| rel_xf_ab.transform_point(*v)).collect();
    let (separation_a, edge_a) = find_max_separation(a, &b_in_a);
    if separation_a > total_radius {
        return Manifold::unset();
    }

    let rel_xf_ba = xf_b.mul_t(xf_a);
    let a_in_b: Vec<Vec2> = a.vertices.iter().map(|v| rel_xf_ba.transform_point(*v)).collect();
    let (separation_b, edge_b) = find_max_separation(b, &a_in_b);
    if separation_b > total_radius {
        return Manifold::unset();
    }

    // Reference-polygon choice with hysteresis: prefer A unless B's
    // separation clearly wins.
    const RELATIVE_TOL: f32 = 0.98;
    const ABSOLUTE_TOL: f32 = 0.001;

    let (ref_poly, inc_poly, ref_xf, inc_xf, ref_edge, flip) =
        if separation_b > RELATIVE_TOL * separation_a + ABSOLUTE_TOL {
            (b, a, xf_b, xf_a, edge_b, true)
        } else {
            (a, b, xf_a, xf_b, edge_a, false)
        };

    let ref_normal = ref_poly.normals[ref_edge];

    // Find the incident edge: the edge on `inc_poly` whose normal is most
    // anti-parallel to the reference normal, expressed in inc_poly's frame.
    let ref_normal_in_inc = inc_xf.inv_transform_vector(ref_xf.transform_vector(ref_normal));
    let mut incident_edge = 0;
    let mut min_dot = f32::MAX;
    for (i, n) in inc_poly.normals.iter().enumerate() {
        let d = ref_normal_in_inc.dot(*n);
        if d < min_dot {
            min_dot = d;
            incident_edge = i;
        }
    }

    let n_inc = inc_poly.vertices.len();
    let i1 = incident_edge;
    let i2 = (incident_edge + 1) % n_inc;

    let v_incident = [
        ClipVertex {
            point: inc_xf.transform_point(inc_poly.vertices[i1]),
            feature: ContactFeature {
                index_a: 0,
                type_a: FeatureType::Vertex,
                index_b: i1 as u8,
                type_b: FeatureType::Vertex,
            },
        },
        ClipVertex {
            point: inc_xf.transform_point(inc_poly.vertices[i2]),
            feature: ContactFeature {
                index_a: 0,
                type_a: FeatureType::Vertex,
                index_b: i2 as u8,
                type_b: FeatureType::Vertex,
            },
        },
    ];

    let n_ref = ref_poly.vertices.len();
    let rv1 = ref_xf.transform_point(ref_poly.vertices[ref_edge]);
    let rv2 = ref_xf.transform_point(ref_poly.vertices[(ref_edge + 1) % n_ref]);
    let tangent = {
        let (t, _) = crate::math::normalize(rv2 - rv1);
        t
    };
    let world_normal = ref_xf.transform_vector(ref_normal);

    let side_offset1 = -tangent.dot(rv1) + total_radius;
    let clipped1 = clip_segment_to_line(v_incident, -tangent, side_offset1, ref_edge as u8);
    if clipped1.len() < 2 {
        return Manifold::unset();
    }

    let side_offset2 = tangent.dot(rv2) + total_radius;
    let input2 = [clipped1[0], clipped1[1]];
    let clipped2 = clip_segment_to_line(input2, tangent, side_offset2, ref_edge as u8);
    if clipped2.len() < 2 {
        return Manifold::unset();
    }

    let mut points = smallvec::SmallVec::new();
    let front_offset = world_normal.dot(rv1);

    for cv in clipped2.iter() {
        let separation = world_normal.dot(cv.point) - front_offset - total_radius;
        if separation <= total_radius {
            let local_point = ref_xf.inv_transform_point(cv.point);
            let mut feature = cv.feature;
            if flip {
                std::mem::swap(&mut feature.index_a, &mut feature.index_b);
                std::mem::swap(&mut feature.type_a, &mut feature.type_b);
            }
            points.push(ManifoldPoint {
                local_point,
                id: feature,
                normal_impulse: 0.0,
                tangent_impulse: 0.0,
            });
        }
    }

    if points.is_empty() {
        return Manifold::unset();
    }

    Manifold {
        kind: if flip { ManifoldType::FaceB } else { ManifoldType::FaceA },
        local_normal: ref_normal,
        local_point: ref_poly.vertices[ref_edge],
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{vec2, Rot};

    #[test]
    fn identical_coincident_squares_produce_two_points() {
        let a = Polygon::box_shape(2.0, 2.0);
        let b = Polygon::box_shape(2.0, 2.0);
        let xf = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let m = collide_polygons(&a, &xf, &b, &xf);
        assert_eq!(m.kind, ManifoldType::FaceA);
        assert_eq!(m.point_count(), 2);
    }

    #[test]
    fn separated_boxes_report_unset() {
        let a = Polygon::box_shape(1.0, 1.0);
        let b = Polygon::box_shape(1.0, 1.0);
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(10.0, 0.0), Rot::IDENTITY);
        let m = collide_polygons(&a, &xf_a, &b, &xf_b);
        assert_eq!(m.kind, ManifoldType::Unset);
    }

    #[test]
    fn slightly_overlapping_boxes_produce_face_manifold() {
        let a = Polygon::box_shape(1.0, 1.0);
        let b = Polygon::box_shape(1.0, 1.0);
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(0.0, 1.9), Rot::IDENTITY);
        let m = collide_polygons(&a, &xf_a, &b, &xf_b);
        assert_ne!(m.kind, ManifoldType::Unset);
        assert!(m.point_count() >= 1);
    }
}
