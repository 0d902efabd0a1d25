//! Edge shape (a single line segment with optional ghost-vertex adjacency).
//!
//! Edge mass falls back to disk mass when
//! both endpoints coincide, otherwise `m = ρ·(2rL + πr²)`; adjacency
//! (`has_vertex0`/`has_vertex3` + ghost vertices) is what lets
//! edge-circle/edge-polygon manifolds avoid seams between chain segments.

use crate::math::{vec2, Transform, Vec2};
use crate::shapes::{Aabb, DistanceProxy, MassData};
use cgmath::InnerSpace;
use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub v1: Vec2,
    pub v2: Vec2,
    pub radius: f32,
    /// Ghost vertex before `v1`, used to classify the v1 region.
    pub v0: Option<Vec2>,
    /// Ghost vertex after `v2`, used to classify the v2 region.
    pub v3: Option<Vec2>,
}

impl Edge {
    pub fn new(v1: Vec2, v2: Vec2, radius: f32) -> Self {
        Edge {
            v1,
            v2,
            radius,
            v0: None,
            v3: None,
        }
    }

    pub fn with_adjacency(mut self, v0: Option<Vec2>, v3: Option<Vec2>) -> Self {
        self.v0 = v0;
        self.v3 = v3;
        self
    }

    pub fn has_vertex0(&self) -> bool {
        self.v0.is_some()
    }

    pub fn has_vertex3(&self) -> bool {
        self.v3.is_some()
    }

    pub fn distance_proxy(&self) -> DistanceProxy {
        let mut vertices = smallvec::SmallVec::new();
        vertices.push(self.v1);
        vertices.push(self.v2);
        DistanceProxy {
            vertices,
            radius: self.radius,
        }
    }

    pub fn aabb(&self, xf: &Transform) -> Aabb {
        let p1 = xf.transform_point(self.v1);
        let p2 = xf.transform_point(self.v2);
        let lower = vec2(p1.x.min(p2.x), p1.y.min(p2.y));
        let upper = vec2(p1.x.max(p2.x), p1.y.max(p2.y));
        Aabb {
            lower: vec2(lower.x - self.radius, lower.y - self.radius),
            upper: vec2(upper.x + self.radius, upper.y + self.radius),
        }
    }

    pub fn mass_data(&self, density: f32) -> MassData {
        let d = self.v2 - self.v1;
        let length = d.magnitude();
        let center = (self.v1 + self.v2) * 0.5;
        if length < f32::EPSILON {
            // Coincident endpoints: treat as a disk at that point.
            let mass = density * PI * self.radius * self.radius;
            let inertia = mass * (0.5 * self.radius * self.radius + center.magnitude2());
            return MassData { mass, center, inertia };
        }
        let mass = density * (2.0 * self.radius * length + PI * self.radius * self.radius);
        // Polar moment of a capsule-like segment: rod term plus the two
        // semicircular caps (their own inertia + parallel-axis offset),
        // rod-plus-end-caps decomposition.
        let rod_mass = density * 2.0 * self.radius * length;
        let rod_inertia = rod_mass * length * length / 12.0;
        let cap_mass = density * PI * self.radius * self.radius;
        let cap_inertia = cap_mass * (0.5 * self.radius * self.radius + (length * 0.5).powi(2));
        let inertia = rod_inertia + cap_inertia + mass * center.magnitude2();
        MassData { mass, center, inertia }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn coincident_endpoints_behave_like_a_disk() {
        let e = Edge::new(vec2(1.0, 1.0), vec2(1.0, 1.0), 0.5);
        let md = e.mass_data(1.0);
        assert_relative_eq!(md.mass, PI * 0.25, epsilon = 1e-4);
    }

    #[test]
    fn mass_scales_linearly_with_density() {
        let e = Edge::new(vec2(-2.0, 0.0), vec2(2.0, 0.0), 0.25);
        let m1 = e.mass_data(1.0);
        let m2 = e.mass_data(2.0);
        assert_relative_eq!(m2.mass, m1.mass * 2.0, epsilon = 1e-4);
    }
}
