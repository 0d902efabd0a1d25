//! A candidate contact between two fixture children: manifold, flags,
//! mixed material properties, and TOI bookkeeping.

use crate::body::BodyId;
use crate::collide::Manifold;
use crate::distance::SimplexCache;
use crate::fixture::FixtureId;

/// Unordered key for a (fixtureA, childA, fixtureB, childB) pair, used by
/// the contact manager to avoid creating duplicate contacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContactKey {
    pub fixture_a: FixtureId,
    pub child_a: usize,
    pub fixture_b: FixtureId,
    pub child_b: usize,
}

impl ContactKey {
    pub fn new(fixture_a: FixtureId, child_a: usize, fixture_b: FixtureId, child_b: usize) -> Self {
        ContactKey { fixture_a, child_a, fixture_b, child_b }
    }
}

#[derive(Clone, Debug)]
pub struct Contact {
    pub fixture_a: FixtureId,
    pub child_a: usize,
    pub fixture_b: FixtureId,
    pub child_b: usize,
    pub body_a: BodyId,
    pub body_b: BodyId,

    pub manifold: Manifold,
    pub touching: bool,
    pub enabled: bool,
    /// Set when a filter listener rejects the pair after creation; forces
    /// destruction on the next filter pass.
    pub filter_blocked: bool,
    pub is_sensor: bool,

    pub friction: f32,
    pub restitution: f32,
    pub tangent_speed: f32,

    pub toi: f32,
    pub toi_count: u32,
    pub toi_valid: bool,

    pub simplex_cache: SimplexCache,
    pub in_island: bool,
}

impl Contact {
    pub fn new(
        fixture_a: FixtureId,
        child_a: usize,
        fixture_b: FixtureId,
        child_b: usize,
        body_a: BodyId,
        body_b: BodyId,
        is_sensor: bool,
        friction: f32,
        restitution: f32,
    ) -> Self {
        Contact {
            fixture_a,
            child_a,
            fixture_b,
            child_b,
            body_a,
            body_b,
            manifold: Manifold::unset(),
            touching: false,
            enabled: true,
            filter_blocked: false,
            is_sensor,
            friction,
            restitution,
            tangent_speed: 0.0,
            toi: 1.0,
            toi_count: 0,
            toi_valid: false,
            simplex_cache: SimplexCache::default(),
            in_island: false,
        }
    }

    pub fn key(&self) -> ContactKey {
        ContactKey::new(self.fixture_a, self.child_a, self.fixture_b, self.child_b)
    }
}
