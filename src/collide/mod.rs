//! Narrow-phase: produces a [`Manifold`] per supported shape-pair, using
//! per-pair clipping routines (Sutherland-Hodgman style face clipping for
//! polygon/edge pairs) rather than a generic GJK+EPA fallback.

mod circle_circle;
mod edge_circle;
mod edge_polygon;
mod polygon_circle;
mod polygon_polygon;
mod world_manifold;

pub use world_manifold::{world_manifold, WorldManifold};

use crate::math::{Transform, Vec2};
use crate::shapes::Shape;

/// Which feature on shape A and shape B produced a manifold point, used to
/// persist warm-start impulses across steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ContactFeature {
    pub index_a: u8,
    pub type_a: FeatureType,
    pub index_b: u8,
    pub type_b: FeatureType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureType {
    Vertex,
    Face,
}

impl Default for FeatureType {
    fn default() -> Self {
        FeatureType::Vertex
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ManifoldPoint {
    /// Point in the reference shape's local frame (or the circle B's
    /// center, for `Circles` manifolds).
    pub local_point: Vec2,
    pub id: ContactFeature,
    /// Normal/tangent impulses accumulated by the solver; carried across
    /// steps for warm starting, zeroed for freshly appearing points.
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManifoldType {
    Unset,
    Circles,
    FaceA,
    FaceB,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Manifold {
    pub kind: ManifoldType,
    pub local_normal: Vec2,
    pub local_point: Vec2,
    pub points: smallvec::SmallVec<[ManifoldPoint; 2]>,
}

impl Manifold {
    pub fn unset() -> Self {
        Manifold {
            kind: ManifoldType::Unset,
            local_normal: Vec2::new(0.0, 0.0),
            local_point: Vec2::new(0.0, 0.0),
            points: smallvec::SmallVec::new(),
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

/// Dispatches to the appropriate per-pair collision routine based on the
/// tagged shape variants. Runs once per contact, not per point.
pub fn collide(
    shape_a: &Shape,
    xf_a: &Transform,
    shape_b: &Shape,
    xf_b: &Transform,
) -> Manifold {
    match (shape_a, shape_b) {
        (Shape::Disk(a), Shape::Disk(b)) => circle_circle::collide_circles(a, xf_a, b, xf_b),
        (Shape::Polygon(a), Shape::Disk(b)) => {
            polygon_circle::collide_polygon_and_circle(a, xf_a, b, xf_b)
        }
        (Shape::Disk(a), Shape::Polygon(b)) => {
            flip(polygon_circle::collide_polygon_and_circle(b, xf_b, a, xf_a))
        }
        (Shape::Polygon(a), Shape::Polygon(b)) => {
            polygon_polygon::collide_polygons(a, xf_a, b, xf_b)
        }
        (Shape::Edge(a), Shape::Disk(b)) => edge_circle::collide_edge_and_circle(a, xf_a, b, xf_b),
        (Shape::Disk(a), Shape::Edge(b)) => {
            flip(edge_circle::collide_edge_and_circle(b, xf_b, a, xf_a))
        }
        (Shape::Edge(a), Shape::Polygon(b)) => {
            edge_polygon::collide_edge_and_polygon(a, xf_a, b, xf_b)
        }
        (Shape::Polygon(a), Shape::Edge(b)) => {
            flip(edge_polygon::collide_edge_and_polygon(b, xf_b, a, xf_a))
        }
        // Chains are resolved to their constituent Edge children by the
        // caller (ContactManager) before reaching this dispatch.
        (Shape::Chain(_), _) | (_, Shape::Chain(_)) => {
            unreachable!("chain shapes must be resolved to Edge children before colliding")
        }
    }
}

/// Swaps A/B roles on a manifold produced for the flipped pair, so that
/// `collide(a, b)` and `flip(collide(b, a))` agree: same world contact
/// points, opposite normals.
fn flip(mut m: Manifold) -> Manifold {
    match m.kind {
        ManifoldType::FaceA => m.kind = ManifoldType::FaceB,
        ManifoldType::FaceB => m.kind = ManifoldType::FaceA,
        _ => {}
    }
    for p in &mut m.points {
        std::mem::swap(&mut p.id.index_a, &mut p.id.index_b);
        std::mem::swap(&mut p.id.type_a, &mut p.id.type_b);
    }
    m
}
