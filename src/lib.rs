//! A 2D rigid body physics engine core: broad-phase, narrow-phase, an
//! island-partitioned sequential-impulse solver, joints, and continuous
//! collision.
//!
//! Features:
//!
//! * Shape library: disk, convex polygon, edge, and one-sided chain, each
//!   with an analytic mass formula and a [`shapes::DistanceProxy`] for GJK.
//! * A dynamic AABB tree broad-phase with fattened, hysteresis-resistant
//!   proxies.
//! * GJK distance queries with simplex caching, feeding both narrow-phase
//!   manifold generation and continuous collision.
//! * Sequential-impulse velocity solving with a 2-point block solver and
//!   non-linear Gauss-Seidel position correction.
//! * Eleven joint types sharing one init/warm-start/solve interface.
//! * Island-based partitioning so disconnected clusters of bodies solve,
//!   sleep, and wake independently.
//! * Conservative-advancement time-of-impact for bullet bodies.
//!
//! # Example
//!
//! ```
//! use rigid2d::body::{BodyConf, BodyType};
//! use rigid2d::fixture::FixtureConf;
//! use rigid2d::math::vec2;
//! use rigid2d::shapes::{Disk, Shape};
//! use rigid2d::world::World;
//!
//! let mut world = World::new(vec2(0.0, -10.0));
//! let ground = world
//!     .create_body(&BodyConf { body_type: BodyType::Static, ..Default::default() })
//!     .unwrap();
//! world
//!     .create_fixture(
//!         ground,
//!         &FixtureConf { shape: Shape::Disk(Disk::new(vec2(0.0, 0.0), 5.0)), ..Default::default() },
//!     )
//!     .unwrap();
//!
//! let body = world
//!     .create_body(&BodyConf { body_type: BodyType::Dynamic, position: vec2(0.0, 10.0), ..Default::default() })
//!     .unwrap();
//! world
//!     .create_fixture(body, &FixtureConf { shape: Shape::Disk(Disk::new(vec2(0.0, 0.0), 0.5)), ..Default::default() })
//!     .unwrap();
//!
//! let stats = world.step(1.0 / 60.0, 8, 3, None);
//! assert!(stats.islands_found >= 1);
//! ```

pub mod body;
pub mod broadphase;
pub mod collide;
pub mod contact;
pub mod contact_manager;
pub mod distance;
pub mod error;
pub mod fixture;
pub mod island;
pub mod joints;
pub mod math;
pub mod settings;
pub mod shapes;
pub mod solver;
pub mod stats;
pub mod toi;
pub mod world;

pub use body::{Body, BodyConf, BodyId, BodyType};
pub use contact::Contact;
pub use contact_manager::ContactListener;
pub use error::{PhysicsError, Result};
pub use fixture::{Fixture, FixtureConf, FixtureId};
pub use joints::{Joint, JointKind};
pub use settings::Settings;
pub use stats::StepStats;
pub use world::World;

/// Re-exports the types most call sites need, so embedders can
/// `use rigid2d::prelude::*;` instead of naming each submodule.
pub mod prelude {
    pub use crate::body::{Body, BodyConf, BodyId, BodyType, JointId};
    pub use crate::contact::{Contact, ContactKey};
    pub use crate::contact_manager::ContactListener;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::fixture::{Fixture, FixtureConf, FixtureId};
    pub use crate::joints::{Joint, JointKind};
    pub use crate::math::{vec2, Rot, Transform, Vec2};
    pub use crate::settings::Settings;
    pub use crate::shapes::{Aabb, Chain, Disk, Edge, Filter, Polygon, Shape};
    pub use crate::stats::StepStats;
    pub use crate::world::World;
}
