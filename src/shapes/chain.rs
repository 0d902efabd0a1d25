//! Chain shape: a sequence of connected edges with ghost vertices at each
//! interior joint, so narrow-phase manifolds never see a seam.

use crate::error::{PhysicsError, Result};
use crate::math::Transform;
use crate::math::Vec2;
use crate::shapes::{Aabb, DistanceProxy, Edge};

#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    pub vertices: Vec<Vec2>,
    pub radius: f32,
    /// Whether the chain forms a closed loop (first/last vertex connect).
    pub looped: bool,
}

impl Chain {
    pub fn new(vertices: Vec<Vec2>, radius: f32, looped: bool) -> Result<Self> {
        if vertices.len() < 2 {
            return Err(PhysicsError::DegenerateGeometry(
                "chain needs at least 2 vertices",
            ));
        }
        for w in vertices.windows(2) {
            use cgmath::InnerSpace;
            if (w[0] - w[1]).magnitude2() < 1e-12 {
                return Err(PhysicsError::DegenerateGeometry(
                    "chain has duplicate adjacent vertices",
                ));
            }
        }
        Ok(Chain {
            vertices,
            radius,
            looped,
        })
    }

    pub fn child_count(&self) -> usize {
        if self.looped {
            self.vertices.len()
        } else {
            self.vertices.len() - 1
        }
    }

    pub fn edge_at(&self, child: usize) -> Edge {
        let n = self.vertices.len();
        let i1 = child;
        let i2 = (child + 1) % n;
        let v1 = self.vertices[i1];
        let v2 = self.vertices[i2];

        let v0 = if self.looped {
            Some(self.vertices[(i1 + n - 1) % n])
        } else if i1 > 0 {
            Some(self.vertices[i1 - 1])
        } else {
            None
        };
        let v3 = if self.looped {
            Some(self.vertices[(i2 + 1) % n])
        } else if i2 + 1 < n {
            Some(self.vertices[i2 + 1])
        } else {
            None
        };

        Edge::new(v1, v2, self.radius).with_adjacency(v0, v3)
    }

    pub fn distance_proxy(&self, child: usize) -> DistanceProxy {
        self.edge_at(child).distance_proxy()
    }

    pub fn aabb(&self, xf: &Transform, child: usize) -> Aabb {
        self.edge_at(child).aabb(xf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec2;

    #[test]
    fn open_chain_has_no_adjacency_at_the_ends() {
        let chain = Chain::new(
            vec![vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(2.0, 0.0), vec2(3.0, 0.0)],
            0.0,
            false,
        )
        .unwrap();
        assert_eq!(chain.child_count(), 3);
        assert!(!chain.edge_at(0).has_vertex0());
        assert!(chain.edge_at(1).has_vertex0());
        assert!(chain.edge_at(1).has_vertex3());
        assert!(!chain.edge_at(2).has_vertex3());
    }

    #[test]
    fn looped_chain_wraps_adjacency() {
        let chain = Chain::new(
            vec![vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(1.0, 1.0), vec2(0.0, 1.0)],
            0.0,
            true,
        )
        .unwrap();
        assert_eq!(chain.child_count(), 4);
        assert!(chain.edge_at(0).has_vertex0());
        assert!(chain.edge_at(3).has_vertex3());
    }

    #[test]
    fn duplicate_adjacent_vertices_rejected() {
        let err = Chain::new(vec![vec2(0.0, 0.0), vec2(0.0, 0.0)], 0.0, false);
        assert!(err.is_err());
    }
}
