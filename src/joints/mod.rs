//! Joint constraints: point-to-point, angular, and axis constraints between
//! body pairs, sharing one init/solve-velocity/solve-position interface.

pub mod distance;
pub mod friction;
pub mod gear;
pub mod motor;
pub mod mouse;
pub mod prismatic;
pub mod pulley;
pub mod revolute;
pub mod rope;
pub mod weld;
pub mod wheel;

pub use distance::{DistanceJoint, DistanceJointDef};
pub use friction::{FrictionJoint, FrictionJointDef};
pub use gear::{GearJoint, GearJointDef, GearedJointKind};
pub use motor::{MotorJoint, MotorJointDef};
pub use mouse::{MouseJoint, MouseJointDef};
pub use prismatic::{PrismaticJoint, PrismaticJointDef};
pub use pulley::{PulleyJoint, PulleyJointDef};
pub use revolute::{RevoluteJoint, RevoluteJointDef};
pub use rope::{RopeJoint, RopeJointDef};
pub use weld::{WeldJoint, WeldJointDef};
pub use wheel::{WheelJoint, WheelJointDef};

use crate::body::BodyId;
use crate::math::Vec2;
use crate::solver::velocity_constraint::SolverBody;

/// Converts a frequency/damping-ratio spring description into the
/// stiffness/damping coefficients the soft constraints solve with directly,
/// mirroring Box2D's `b2LinearStiffness`/`b2AngularStiffness` helpers.
pub fn soft_constraint_coefficients(frequency_hz: f32, damping_ratio: f32, effective_mass: f32) -> (f32, f32) {
    if frequency_hz <= 0.0 {
        return (0.0, 0.0);
    }
    let omega = 2.0 * std::f32::consts::PI * frequency_hz;
    let stiffness = effective_mass * omega * omega;
    let damping = 2.0 * effective_mass * damping_ratio * omega;
    (stiffness, damping)
}

/// Per-variant joint configuration, dispatched through a tag match
/// instead of per-type dynamic dispatch.
#[derive(Clone, Debug)]
pub enum JointKind {
    Revolute(RevoluteJoint),
    Prismatic(PrismaticJoint),
    Distance(DistanceJoint),
    Pulley(PulleyJoint),
    Gear(GearJoint),
    Weld(WeldJoint),
    Friction(FrictionJoint),
    Motor(MotorJoint),
    Mouse(MouseJoint),
    Rope(RopeJoint),
    Wheel(WheelJoint),
}

#[derive(Clone, Debug)]
pub struct Joint {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub collide_connected: bool,
    pub user_data: u64,
    pub kind: JointKind,
    pub in_island: bool,
}

impl Joint {
    pub fn new(body_a: BodyId, body_b: BodyId, collide_connected: bool, kind: JointKind) -> Self {
        Joint { body_a, body_b, collide_connected, user_data: 0, kind, in_island: false }
    }

    pub fn init_velocity_constraints(&mut self, a: &SolverBody, b: &SolverBody, dt: f32) {
        match &mut self.kind {
            JointKind::Revolute(j) => j.init_velocity_constraints(a, b, dt),
            JointKind::Prismatic(j) => j.init_velocity_constraints(a, b, dt),
            JointKind::Distance(j) => j.init_velocity_constraints(a, b, dt),
            JointKind::Pulley(j) => j.init_velocity_constraints(a, b),
            JointKind::Gear(j) => j.init_velocity_constraints(a, b),
            JointKind::Weld(j) => j.init_velocity_constraints(a, b, dt),
            JointKind::Friction(j) => j.init_velocity_constraints(a, b),
            JointKind::Motor(j) => j.init_velocity_constraints(a, b),
            JointKind::Mouse(j) => j.init_velocity_constraints(b, dt),
            JointKind::Rope(j) => j.init_velocity_constraints(a, b),
            JointKind::Wheel(j) => j.init_velocity_constraints(a, b, dt),
        }
    }

    pub fn warm_start(&self, a: &mut SolverBody, b: &mut SolverBody) {
        match &self.kind {
            JointKind::Revolute(j) => j.warm_start(a, b),
            JointKind::Prismatic(j) => j.warm_start(a, b),
            JointKind::Distance(j) => j.warm_start(a, b),
            JointKind::Pulley(j) => j.warm_start(a, b),
            JointKind::Gear(j) => j.warm_start(a, b),
            JointKind::Weld(j) => j.warm_start(a, b),
            JointKind::Friction(j) => j.warm_start(a, b),
            JointKind::Motor(j) => j.warm_start(a, b),
            JointKind::Mouse(j) => j.warm_start(b),
            JointKind::Rope(j) => j.warm_start(a, b),
            JointKind::Wheel(j) => j.warm_start(a, b),
        }
    }

    pub fn solve_velocity_constraints(&mut self, a: &mut SolverBody, b: &mut SolverBody, dt: f32) {
        match &mut self.kind {
            JointKind::Revolute(j) => j.solve_velocity_constraints(a, b),
            JointKind::Prismatic(j) => j.solve_velocity_constraints(a, b),
            JointKind::Distance(j) => j.solve_velocity_constraints(a, b),
            JointKind::Pulley(j) => j.solve_velocity_constraints(a, b),
            JointKind::Gear(j) => j.solve_velocity_constraints(a, b),
            JointKind::Weld(j) => j.solve_velocity_constraints(a, b),
            JointKind::Friction(j) => j.solve_velocity_constraints(a, b, dt),
            JointKind::Motor(j) => j.solve_velocity_constraints(a, b, dt),
            JointKind::Mouse(j) => j.solve_velocity_constraints(b),
            JointKind::Rope(j) => j.solve_velocity_constraints(a, b),
            JointKind::Wheel(j) => j.solve_velocity_constraints(a, b),
        }
    }

    /// Returns true once the positional error is within tolerance.
    pub fn solve_position_constraints(&self, a: &mut SolverBody, b: &mut SolverBody) -> bool {
        match &self.kind {
            JointKind::Revolute(j) => j.solve_position_constraints(a, b),
            JointKind::Prismatic(j) => j.solve_position_constraints(a, b),
            JointKind::Distance(j) => j.solve_position_constraints(a, b),
            JointKind::Pulley(j) => j.solve_position_constraints(a, b),
            JointKind::Gear(j) => j.solve_position_constraints(a, b),
            JointKind::Weld(j) => j.solve_position_constraints(a, b),
            JointKind::Friction(_) => true,
            JointKind::Motor(_) => true,
            JointKind::Mouse(_) => true,
            JointKind::Rope(j) => j.solve_position_constraints(a, b),
            JointKind::Wheel(j) => j.solve_position_constraints(a, b),
        }
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        match &self.kind {
            JointKind::Revolute(j) => j.reaction_force(inv_dt),
            JointKind::Prismatic(j) => j.reaction_force(inv_dt),
            JointKind::Distance(j) => j.reaction_force(inv_dt),
            JointKind::Pulley(j) => j.reaction_force(inv_dt),
            JointKind::Gear(j) => j.reaction_force(inv_dt),
            JointKind::Weld(j) => j.reaction_force(inv_dt),
            JointKind::Friction(j) => j.reaction_force(inv_dt),
            JointKind::Motor(j) => j.reaction_force(inv_dt),
            JointKind::Mouse(j) => j.reaction_force(inv_dt),
            JointKind::Rope(j) => j.reaction_force(inv_dt),
            JointKind::Wheel(j) => j.reaction_force(inv_dt),
        }
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        match &self.kind {
            JointKind::Revolute(j) => j.reaction_torque(inv_dt),
            JointKind::Prismatic(j) => j.reaction_torque(inv_dt),
            JointKind::Distance(_) => 0.0,
            JointKind::Pulley(_) => 0.0,
            JointKind::Gear(j) => j.reaction_torque(inv_dt),
            JointKind::Weld(j) => j.reaction_torque(inv_dt),
            JointKind::Friction(j) => j.reaction_torque(inv_dt),
            JointKind::Motor(j) => j.reaction_torque(inv_dt),
            JointKind::Mouse(_) => 0.0,
            JointKind::Rope(_) => 0.0,
            JointKind::Wheel(j) => j.reaction_torque(inv_dt),
        }
    }

    /// Whether this joint's two bodies should still run narrow-phase
    /// collision against each other.
    pub fn allows_collision(&self) -> bool {
        self.collide_connected
    }
}
