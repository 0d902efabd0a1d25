//! Edge-polygon manifold.
//!
//! Grounded on `original_source/Box2D/Box2D/Collision/CollideEdge.cpp`'s
//! `b2CollideEdgeAndPolygon`: edge adjacency constrains the admissible
//! contact normal cone, then the winning axis (edge vs. polygon, with
//! hysteresis) drives a Sutherland-Hodgman clip identical in spirit to
//! polygon-polygon.

use super::{ContactFeature, FeatureType, Manifold, ManifoldPoint, ManifoldType};
use crate::math::{Transform, Vec2};
use crate::settings::{EDGE_POLYGON_ABSOLUTE_HYSTERESIS, EDGE_POLYGON_RELATIVE_HYSTERESIS};
use crate::shapes::{Edge, Polygon};
use cgmath::InnerSpace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VertexClass {
    Isolated,
    Concave,
    Convex,
}

/// Classifies the edge normal's admissibility at each endpoint from the
/// neighboring ghost vertex, producing a lower/upper admissible-normal cone
/// against flicker between two near-tied reference faces.
struct EdgeAxis {
    normal: Vec2,
    lower_limit: Vec2,
    upper_limit: Vec2,
    normal_is_convex_lower: bool,
    normal_is_convex_upper: bool,
}

fn classify_vertex(prev: Vec2, a: Vec2, b: Vec2) -> VertexClass {
    use crate::math::cross;
    let e1 = a - prev;
    let e2 = b - a;
    let det = cross(e1, e2);
    if det > 1e-6 {
        VertexClass::Convex
    } else if det < -1e-6 {
        VertexClass::Concave
    } else {
        VertexClass::Isolated
    }
}

fn edge_axis(edge: &Edge) -> EdgeAxis {
    let e = edge.v2 - edge.v1;
    let (tangent, _) = crate::math::normalize(e);
    let normal = crate::math::right_perp(tangent);

    let lower_limit = match edge.v0 {
        Some(v0) => {
            let class = classify_vertex(v0, edge.v1, edge.v2);
            match class {
                VertexClass::Convex => {
                    let (n, _) = crate::math::normalize(edge.v1 - v0);
                    crate::math::right_perp(n)
                }
                _ => normal,
            }
        }
        None => normal,
    };

    let upper_limit = match edge.v3 {
        Some(v3) => {
            let class = classify_vertex(edge.v1, edge.v2, v3);
            match class {
                VertexClass::Convex => {
                    let (n, _) = crate::math::normalize(v3 - edge.v2);
                    crate::math::right_perp(n)
                }
                _ => normal,
            }
        }
        None => normal,
    };

    EdgeAxis {
        normal,
        lower_limit,
        upper_limit,
        normal_is_convex_lower: edge.v0.is_some(),
        normal_is_convex_upper: edge.v3.is_some(),
    }
}

fn in_admissible_cone(n: Vec2, axis: &EdgeAxis) -> bool {
    // A normal is admissible if it lies within the cone spanned by
    // lower_limit..upper_limit sweeping through `normal`; degenerates to
    // "always admissible" when there is no neighbor on that side.
    let lower_ok = !axis.normal_is_convex_lower || crate::math::cross(axis.lower_limit, n) >= -1e-3;
    let upper_ok = !axis.normal_is_convex_upper || crate::math::cross(n, axis.upper_limit) >= -1e-3;
    lower_ok && upper_ok
}

pub fn collide_edge_and_polygon(edge: &Edge, xf_a: &Transform, poly: &Polygon, xf_b: &Transform) -> Manifold {
    let total_radius = edge.radius + poly.radius;
    let axis = edge_axis(edge);

    let rel_xf = xf_a.mul_t(xf_b);
    let poly_in_edge: Vec<Vec2> = poly.vertices.iter().map(|v| rel_xf.transform_point(*v)).collect();
    let poly_normals_in_edge: Vec<Vec2> = poly
        .normals
        .iter()
        .map(|n| xf_a.inv_transform_vector(xf_b.transform_vector(*n)))
        .collect();

    // (1) Edge-axis separation: project polygon vertices onto the edge
    // normal.
    let mut edge_separation = f32::MAX;
    for v in &poly_in_edge {
        let s = axis.normal.dot(*v - edge.v1);
        if s < edge_separation {
            edge_separation = s;
        }
    }
    // Box2D tracks `-max(normal . (v - v1))` as the separation scalar so
    // larger means "more separated"; flip sign to match that convention.
    let edge_separation = -edge_separation;
    if edge_separation > total_radius {
        return Manifold::unset();
    }

    // (2) Polygon-axis separation, filtered by the admissible cone.
    let mut poly_separation = f32::MIN;
    let mut poly_edge_index = 0usize;
    for (i, n) in poly_normals_in_edge.iter().enumerate() {
        if !in_admissible_cone(-*n, &axis) {
            continue;
        }
        let v = poly_in_edge[i];
        let mut min_dot = f32::MAX;
        for ev in [edge.v1, edge.v2] {
            let d = n.dot(ev - v);
            if d < min_dot {
                min_dot = d;
            }
        }
        if min_dot > poly_separation {
            poly_separation = min_dot;
            poly_edge_index = i;
        }
    }
    if poly_separation > total_radius {
        return Manifold::unset();
    }

    let use_edge_axis = edge_separation
        >= EDGE_POLYGON_RELATIVE_HYSTERESIS * poly_separation + EDGE_POLYGON_ABSOLUTE_HYSTERESIS;

    if use_edge_axis {
        collide_with_edge_as_reference(edge, xf_a, poly, xf_b, &axis, &poly_in_edge, total_radius)
    } else {
        collide_with_polygon_as_reference(
            edge,
            xf_a,
            poly,
            xf_b,
            poly_edge_index,
            &poly_normals_in_edge,
            total_radius,
        )
    }
}

#[derive(Clone, Copy, Debug)]
struct ClipVertex {
    point: Vec2,
    feature: ContactFeature,
}

fn clip_segment(
    input: [ClipVertex; 2],
    normal: Vec2,
    offset: f32,
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
        out.push(ClipVertex {
            point: input[0].point + (input[1].point - input[0].point) * t,
            feature: input[1].feature,
        });
    }
    out
}

fn collide_with_edge_as_reference(
    edge: &Edge,
    xf_a: &Transform,
    poly: &Polygon,
    xf_b: &Transform,
    axis: &EdgeAxis,
    poly_in_edge: &[Vec2],
    total_radius: f32,
) -> Manifold {
    // Incident edge on the polygon: most anti-parallel normal to the edge
    // axis.
    let mut incident = 0;
    let mut min_dot = f32::MAX;
    for (i, v) in poly_in_edge.iter().enumerate() {
        let n = poly.normals[i];
        let n_in_edge = xf_a.inv_transform_vector(xf_b.transform_vector(n));
        let d = axis.normal.dot(n_in_edge);
        if d < min_dot {
            min_dot = d;
            incident = i;
        }
        let _ = v;
    }
    let n_poly = poly.vertices.len();
    let i1 = incident;
    let i2 = (incident + 1) % n_poly;

    let v_incident = [
        ClipVertex {
            point: poly_in_edge[i1],
            feature: ContactFeature {
                index_a: 0,
                type_a: FeatureType::Vertex,
                index_b: i1 as u8,
                type_b: FeatureType::Vertex,
            },
        },
        ClipVertex {
            point: poly_in_edge[i2],
            feature: ContactFeature {
                index_a: 0,
                type_a: FeatureType::Vertex,
                index_b: i2 as u8,
                type_b: FeatureType::Vertex,
            },
        },
    ];

    let (tangent, _) = crate::math::normalize(edge.v2 - edge.v1);
    let side1 = -tangent.dot(edge.v1) + total_radius;
    let clipped1 = clip_segment(v_incident, -tangent, side1);
    if clipped1.len() < 2 {
        return Manifold::unset();
    }
    let side2 = tangent.dot(edge.v2) + total_radius;
    let clipped2 = clip_segment([clipped1[0], clipped1[1]], tangent, side2);
    if clipped2.len() < 2 {
        return Manifold::unset();
    }

    let front = axis.normal.dot(edge.v1);
    let mut points = smallvec::SmallVec::new();
    for cv in clipped2.iter() {
        let separation = axis.normal.dot(cv.point) - front;
        if separation <= total_radius {
            points.push(ManifoldPoint {
                local_point: cv.point,
                id: cv.feature,
                normal_impulse: 0.0,
                tangent_impulse: 0.0,
            });
        }
    }
    if points.is_empty() {
        return Manifold::unset();
    }

    Manifold {
        kind: ManifoldType::FaceA,
        local_normal: axis.normal,
        local_point: edge.v1,
        points,
    }
}

fn collide_with_polygon_as_reference(
    edge: &Edge,
    xf_a: &Transform,
    poly: &Polygon,
    xf_b: &Transform,
    ref_edge: usize,
    poly_normals_in_edge: &[Vec2],
    total_radius: f32,
) -> Manifold {
    let n_poly = poly.vertices.len();
    let rel_xf = xf_b.mul_t(xf_a);
    let edge_v1_in_poly = rel_xf.transform_point(edge.v1);
    let edge_v2_in_poly = rel_xf.transform_point(edge.v2);

    // Clip the edge segment (the "incident" feature here) against the
    // polygon's reference face, expressed in the polygon's local frame,
    // then transform the result back into the edge-shape's frame as
    // clip pass requires it.
    let v_incident = [
        ClipVertex {
            point: edge_v1_in_poly,
            feature: ContactFeature {
                index_a: ref_edge as u8,
                type_a: FeatureType::Face,
                index_b: 0,
                type_b: FeatureType::Vertex,
            },
        },
        ClipVertex {
            point: edge_v2_in_poly,
            feature: ContactFeature {
                index_a: ref_edge as u8,
                type_a: FeatureType::Face,
                index_b: 1,
                type_b: FeatureType::Vertex,
            },
        },
    ];

    let rv1 = poly.vertices[ref_edge];
    let rv2 = poly.vertices[(ref_edge + 1) % n_poly];
    let (tangent, _) = crate::math::normalize(rv2 - rv1);
    let ref_normal = poly.normals[ref_edge];
    let _ = poly_normals_in_edge;

    let side1 = -tangent.dot(rv1) + total_radius;
    let clipped1 = clip_segment(v_incident, -tangent, side1);
    if clipped1.len() < 2 {
        return Manifold::unset();
    }
    let side2 = tangent.dot(rv2) + total_radius;
    let clipped2 = clip_segment([clipped1[0], clipped1[1]], tangent, side2);
    if clipped2.len() < 2 {
        return Manifold::unset();
    }

    let front = ref_normal.dot(rv1);
    let mut points = smallvec::SmallVec::new();
    for cv in clipped2.iter() {
        let separation = ref_normal.dot(cv.point) - front;
        if separation <= total_radius {
            let mut feature = cv.feature;
            std::mem::swap(&mut feature.index_a, &mut feature.index_b);
            std::mem::swap(&mut feature.type_a, &mut feature.type_b);
            points.push(ManifoldPoint {
                // Re-express back in the edge shape's local frame (A),
                // which is what `local_point` must be for a FaceB
                // manifold's *points* (the incident shape's points are
                // always given in A's frame by convention).
                local_point: xf_a.inv_transform_point(xf_b.transform_point(cv.point)),
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
        kind: ManifoldType::FaceB,
        local_normal: ref_normal,
        local_point: rv1,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{vec2, Rot};

    #[test]
    fn box_resting_on_edge_produces_face_manifold() {
        let edge = Edge::new(vec2(-2.0, 0.0), vec2(2.0, 0.0), 0.5);
        let poly = Polygon::box_shape(0.5, 0.5);
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(0.0, 0.95), Rot::IDENTITY);
        let m = collide_edge_and_polygon(&edge, &xf_a, &poly, &xf_b);
        assert_ne!(m.kind, ManifoldType::Unset);
        assert!(m.point_count() >= 1);
        assert!(m.point_count() <= 2);
    }

    #[test]
    fn distant_box_reports_unset() {
        let edge = Edge::new(vec2(-2.0, 0.0), vec2(2.0, 0.0), 0.0);
        let poly = Polygon::box_shape(0.5, 0.5);
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(0.0, 10.0), Rot::IDENTITY);
        let m = collide_edge_and_polygon(&edge, &xf_a, &poly, &xf_b);
        assert_eq!(m.kind, ManifoldType::Unset);
    }
}
