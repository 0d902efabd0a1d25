//! Tunable constants governing contact slop, position correction limits,
//! sleep thresholds, and iteration caps for the broad-phase, GJK, and TOI
//! solvers.

use std::f32::consts::PI;

/// Contact penetration tolerance. Points are allowed to penetrate by this
/// much without triggering correction; also used as the TOI target
/// separation multiplier base.
pub const LINEAR_SLOP: f32 = 0.005;

/// Joint angular tolerance.
pub const ANGULAR_SLOP: f32 = 2.0 * PI / 180.0;

/// Skin radius added to polygon and edge shapes.
pub const POLYGON_RADIUS: f32 = 2.0 * LINEAR_SLOP;

/// Maximum per-iteration linear position correction.
pub const MAX_LINEAR_CORRECTION: f32 = 0.2;

/// Maximum per-iteration angular position correction.
pub const MAX_ANGULAR_CORRECTION: f32 = 8.0 / 180.0 * PI;

/// Maximum per-step body translation (for non-continuous bodies, a soft
/// clamp to avoid tunneling through ordinary contacts).
pub const MAX_TRANSLATION: f32 = 4.0;

/// Maximum per-step body rotation.
pub const MAX_ROTATION: f32 = 0.5 * PI;

/// Incoming relative normal velocity below which restitution is zeroed out,
/// eliminating small-scale jitter.
pub const VELOCITY_THRESHOLD: f32 = 1.0;

/// Broad-phase AABB fattening margin.
pub const AABB_EXTENSION: f32 = 0.1;

/// Broad-phase displacement-direction fattening multiplier.
pub const AABB_MULTIPLIER: f32 = 4.0;

/// Maximum manifold points per contact (one edge clip pair, or one circle).
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// Maximum vertices in a convex polygon.
pub const MAX_POLYGON_VERTICES: usize = 254;

/// Maximum vertices tracked by a GJK simplex (a 2D simplex never needs more
/// than a triangle to enclose the origin).
pub const MAX_SIMPLEX_VERTICES: usize = 3;

/// GJK iteration cap.
pub const MAX_DISTANCE_ITERS: u32 = 20;

/// TOI conservative-advancement outer iteration cap.
pub const MAX_TOI_ITERS: u32 = 20;

/// TOI bisection root-finding iteration cap.
pub const MAX_TOI_ROOT_ITERS: u32 = 30;

/// Per-contact TOI substep cap, guarding against pathological loops.
pub const MAX_SUB_STEPS: u32 = 48;

/// Minimum time a body must remain below the sleep thresholds before it is
/// put to sleep.
pub const MIN_STILL_TIME_TO_SLEEP: f32 = 0.5;

/// Linear speed (squared internally) below which a body is considered still.
pub const LINEAR_SLEEP_TOLERANCE: f32 = 0.01;

/// Angular speed below which a body is considered still.
pub const ANGULAR_SLEEP_TOLERANCE: f32 = 2.0 / 180.0 * PI;

/// Target separation the TOI solver drives contacts to, expressed as a
/// multiple of `LINEAR_SLOP`.
pub const TARGET_SEPARATION_SLOP_FACTOR: f32 = 3.0;

/// Default world capacities (overridable via [`Settings`]).
pub const DEFAULT_MAX_BODIES: usize = 1 << 20;
pub const DEFAULT_MAX_JOINTS: usize = 1 << 20;
pub const DEFAULT_MAX_CONTACTS: usize = 1 << 22;

/// Edge-polygon axis-selection hysteresis, preventing the chosen reference
/// face from flickering between two near-equal separations.
pub const EDGE_POLYGON_RELATIVE_HYSTERESIS: f32 = 0.98;
pub const EDGE_POLYGON_ABSOLUTE_HYSTERESIS: f32 = LINEAR_SLOP / 5.0;

/// Per-world overridable knobs. Everything else above is a fixed numerical
/// tolerance that is not meaningful to vary per world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    pub max_bodies: usize,
    pub max_joints: usize,
    pub max_contacts: usize,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub warm_starting: bool,
    pub continuous_physics: bool,
    pub sub_stepping: bool,
    pub allow_sleep: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_bodies: DEFAULT_MAX_BODIES,
            max_joints: DEFAULT_MAX_JOINTS,
            max_contacts: DEFAULT_MAX_CONTACTS,
            velocity_iterations: 8,
            position_iterations: 3,
            warm_starting: true,
            continuous_physics: true,
            sub_stepping: false,
            allow_sleep: true,
        }
    }
}
