//! Error kinds surfaced by the public API. Every public mutator fails
//! closed: on error, nothing changes and the error is reported, never
//! recovered internally.

use thiserror::Error;

/// Errors returned by [`crate::world::World`] and body/fixture/joint
/// mutators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// A public mutator was invoked while the world is mid-`step`
    /// (inside a destruction/contact/listener callback).
    #[error("world is locked: cannot mutate during a callback")]
    LockedWorld,

    /// A capacity limit (`max_bodies`, `max_joints`, `max_contacts`,
    /// `max_polygon_vertices`) was exceeded.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(&'static str),

    /// A setter received a NaN/infinite value, a negative density or
    /// friction, or a joint limit with `lower > upper`.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Degenerate geometry was supplied at fixture creation time (polygon
    /// with fewer than 3 vertices or collinear vertices, chain with
    /// duplicate adjacent vertices, zero-length edge with no radius).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),

    /// A handle (`BodyId`/`FixtureId`/`JointId`) referred to an entity that
    /// no longer exists.
    #[error("stale handle: {0}")]
    StaleHandle(&'static str),
}

/// Convenience alias used across the crate's public API.
pub type Result<T> = std::result::Result<T, PhysicsError>;
