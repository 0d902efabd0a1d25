//! Shape library: disk, polygon, edge, chain.
//!
//! A single `Shape` enum with a tag match instead of per-shape dynamic
//! dispatch, so the distance/collide kernels dispatch once per contact
//! rather than per point.

mod chain;
mod disk;
mod edge;
mod polygon;

pub use chain::Chain;
pub use disk::Disk;
pub use edge::Edge;
pub use polygon::Polygon;

use cgmath::InnerSpace;

use crate::error::{PhysicsError, Result};
use crate::math::{vec2, Transform, Vec2};
use crate::settings::{MAX_POLYGON_VERTICES, MAX_SIMPLEX_VERTICES};

/// Mass properties computed for a shape at unit or arbitrary density.
///
/// `mass` and `inertia` are linear in density: scaling density by k scales
/// mass and inertia by k; the center of mass is unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct MassData {
    pub mass: f32,
    pub center: Vec2,
    pub inertia: f32,
}

/// Support-point proxy consumed by the GJK distance engine: a vertex buffer
/// plus a vertex radius.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceProxy {
    pub vertices: smallvec::SmallVec<[Vec2; 8]>,
    pub radius: f32,
}

impl DistanceProxy {
    pub fn single(point: Vec2, radius: f32) -> Self {
        let mut vertices = smallvec::SmallVec::new();
        vertices.push(point);
        DistanceProxy { vertices, radius }
    }

    /// Returns the vertex index that is furthest in `direction`.
    pub fn support(&self, direction: Vec2) -> usize {
        let mut best_index = 0;
        let mut best_value = self.vertices[0].x * direction.x + self.vertices[0].y * direction.y;
        for (i, v) in self.vertices.iter().enumerate().skip(1) {
            let value = v.x * direction.x + v.y * direction.y;
            if value > best_value {
                best_index = i;
                best_value = value;
            }
        }
        debug_assert!(self.vertices.len() <= MAX_SIMPLEX_VERTICES * 4);
        best_index
    }

    pub fn vertex(&self, index: usize) -> Vec2 {
        self.vertices[index]
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub lower: Vec2,
    pub upper: Vec2,
}

impl Aabb {
    pub fn new(lower: Vec2, upper: Vec2) -> Self {
        Aabb { lower, upper }
    }

    pub fn from_point(p: Vec2, radius: f32) -> Self {
        Aabb {
            lower: vec2(p.x - radius, p.y - radius),
            upper: vec2(p.x + radius, p.y + radius),
        }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            lower: vec2(self.lower.x.min(other.lower.x), self.lower.y.min(other.lower.y)),
            upper: vec2(self.upper.x.max(other.upper.x), self.upper.y.max(other.upper.y)),
        }
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        self.lower.x <= other.lower.x
            && self.lower.y <= other.lower.y
            && other.upper.x <= self.upper.x
            && other.upper.y <= self.upper.y
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.lower.x <= other.upper.x
            && self.lower.y <= other.upper.y
            && other.lower.x <= self.upper.x
            && other.lower.y <= self.upper.y
    }

    pub fn perimeter(&self) -> f32 {
        let w = self.upper.x - self.lower.x;
        let h = self.upper.y - self.lower.y;
        2.0 * (w + h)
    }

    pub fn extended(&self, margin: f32) -> Aabb {
        Aabb {
            lower: vec2(self.lower.x - margin, self.lower.y - margin),
            upper: vec2(self.upper.x + margin, self.upper.y + margin),
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.lower + self.upper) * 0.5
    }
}

/// Collision filter bits, shared by all fixtures on a shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Filter {
    pub category_bits: u32,
    pub mask_bits: u32,
    pub group_index: i16,
}

impl Default for Filter {
    fn default() -> Self {
        Filter {
            category_bits: 0x0001,
            mask_bits: 0xFFFF,
            group_index: 0,
        }
    }
}

impl Filter {
    /// Mirrors Box2D's `b2ShouldCollide`: a nonzero matching group index
    /// short-circuits the category/mask test.
    pub fn should_collide(&self, other: &Filter) -> bool {
        if self.group_index == other.group_index && self.group_index != 0 {
            return self.group_index > 0;
        }
        (self.category_bits & other.mask_bits) != 0 && (self.mask_bits & other.category_bits) != 0
    }
}

/// Tagged shape variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Disk(Disk),
    Polygon(Polygon),
    Edge(Edge),
    Chain(Chain),
}

impl Shape {
    pub fn child_count(&self) -> usize {
        match self {
            Shape::Disk(_) | Shape::Polygon(_) | Shape::Edge(_) => 1,
            Shape::Chain(c) => c.child_count(),
        }
    }

    pub fn distance_proxy(&self, child: usize) -> DistanceProxy {
        match self {
            Shape::Disk(d) => d.distance_proxy(),
            Shape::Polygon(p) => p.distance_proxy(),
            Shape::Edge(e) => e.distance_proxy(),
            Shape::Chain(c) => c.distance_proxy(child),
        }
    }

    pub fn aabb(&self, xf: &Transform, child: usize) -> Aabb {
        match self {
            Shape::Disk(d) => d.aabb(xf),
            Shape::Polygon(p) => p.aabb(xf),
            Shape::Edge(e) => e.aabb(xf),
            Shape::Chain(c) => c.aabb(xf, child),
        }
    }

    pub fn mass_data(&self, density: f32) -> MassData {
        match self {
            Shape::Disk(d) => d.mass_data(density),
            Shape::Polygon(p) => p.mass_data(density),
            Shape::Edge(e) => e.mass_data(density),
            // Chains are used for static terrain only; zero mass/inertia,
            // matching Box2D's b2ChainShape::ComputeMass.
            Shape::Chain(_) => MassData::default(),
        }
    }

    pub fn radius(&self) -> f32 {
        match self {
            Shape::Disk(d) => d.radius,
            Shape::Polygon(p) => p.radius,
            Shape::Edge(e) => e.radius,
            Shape::Chain(c) => c.radius,
        }
    }

    /// Resolves a shape to the concrete variant collision routines dispatch
    /// on for a given child index: a `Chain` becomes the `Edge` (with ghost
    /// vertices) at that child, everything else is single-child and returns
    /// unchanged.
    pub fn child_shape(&self, child: usize) -> Shape {
        match self {
            Shape::Chain(c) => Shape::Edge(c.edge_at(child)),
            other => other.clone(),
        }
    }
}

/// Validates geometry at fixture-creation time.
pub fn validate_polygon_vertices(vertices: &[Vec2]) -> Result<()> {
    if vertices.len() < 3 {
        return Err(PhysicsError::DegenerateGeometry("polygon needs >= 3 vertices"));
    }
    if vertices.len() > MAX_POLYGON_VERTICES {
        return Err(PhysicsError::CapacityExceeded("polygon vertex count"));
    }
    // Reject (near-)zero signed area, which indicates collinear vertices or
    // a degenerate winding.
    let mut area2 = 0.0;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        area2 += a.x * b.y - b.x * a.y;
    }
    if area2.abs() < 1e-9 {
        return Err(PhysicsError::DegenerateGeometry("polygon vertices are collinear"));
    }
    Ok(())
}

pub fn validate_edge(v1: Vec2, v2: Vec2, radius: f32) -> Result<()> {
    if (v1 - v2).magnitude2() < 1e-12 && radius <= 0.0 {
        return Err(PhysicsError::DegenerateGeometry(
            "edge has zero length and zero radius",
        ));
    }
    Ok(())
}
