//! Fixture: a shape instance attached to a body, with material properties,
//! the collision filter, and its broad-phase proxies.

use crate::body::BodyId;
use crate::broadphase::TreeProxyId;
use crate::error::{PhysicsError, Result};
use crate::shapes::{Filter, Shape};
use slotmap::new_key_type;

new_key_type! {
    pub struct FixtureId;
}

/// Construction parameters for [`crate::world::World::create_fixture`].
#[derive(Clone, Debug)]
pub struct FixtureConf {
    pub shape: Shape,
    pub friction: f32,
    pub restitution: f32,
    pub density: f32,
    pub is_sensor: bool,
    pub filter: Filter,
}

impl Default for FixtureConf {
    fn default() -> Self {
        FixtureConf {
            shape: Shape::Disk(crate::shapes::Disk::new(crate::math::vec2(0.0, 0.0), 0.5)),
            friction: 0.2,
            restitution: 0.0,
            density: 1.0,
            is_sensor: false,
            filter: Filter::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Fixture {
    pub body: BodyId,
    pub shape: Shape,
    pub friction: f32,
    pub restitution: f32,
    pub density: f32,
    pub is_sensor: bool,
    pub filter: Filter,
    /// One broad-phase proxy per shape child.
    pub proxies: Vec<TreeProxyId>,
    pub user_data: u64,
}

impl Fixture {
    pub fn new(body: BodyId, conf: &FixtureConf) -> Result<Self> {
        if !conf.density.is_finite() || conf.density < 0.0 {
            return Err(PhysicsError::InvalidArgument("fixture density must be finite and non-negative"));
        }
        if !conf.friction.is_finite() || conf.friction < 0.0 {
            return Err(PhysicsError::InvalidArgument("fixture friction must be finite and non-negative"));
        }
        if !conf.restitution.is_finite() {
            return Err(PhysicsError::InvalidArgument("fixture restitution must be finite"));
        }
        match &conf.shape {
            Shape::Polygon(p) => crate::shapes::validate_polygon_vertices(&p.vertices)?,
            Shape::Edge(e) => crate::shapes::validate_edge(e.v1, e.v2, e.radius)?,
            Shape::Chain(c) => {
                if c.vertices.len() < 2 {
                    return Err(PhysicsError::DegenerateGeometry("chain needs >= 2 vertices"));
                }
            }
            Shape::Disk(_) => {}
        }
        Ok(Fixture {
            body,
            shape: conf.shape.clone(),
            friction: conf.friction,
            restitution: conf.restitution,
            density: conf.density,
            is_sensor: conf.is_sensor,
            filter: conf.filter,
            proxies: Vec::new(),
            user_data: 0,
        })
    }
}

/// Mixes two fixtures' friction coefficients, per Box2D's default
/// `b2MixFriction` (geometric mean).
pub fn mix_friction(a: f32, b: f32) -> f32 {
    (a * b).max(0.0).sqrt()
}

/// Mixes two fixtures' restitution, per Box2D's default `b2MixRestitution`
/// (the larger of the two bounces win).
pub fn mix_restitution(a: f32, b: f32) -> f32 {
    a.max(b)
}
