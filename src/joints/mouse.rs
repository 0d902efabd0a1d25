//! Single dynamic body pulled toward a world-space target through a soft
//! constraint. References only `body_b`; `body_a` is a nominal ground body
//! since the joint has no second real endpoint.

use cgmath::Matrix2;

use crate::joints::soft_constraint_coefficients;
use crate::math::{cross, cross_sv, vec2, Rot, Vec2};
use crate::solver::velocity_constraint::SolverBody;

#[derive(Clone, Debug)]
pub struct MouseJointDef {
    pub target: Vec2,
    pub max_force: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,
}

impl Default for MouseJointDef {
    fn default() -> Self {
        MouseJointDef {
            target: vec2(0.0, 0.0),
            max_force: 0.0,
            frequency_hz: 5.0,
            damping_ratio: 0.7,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MouseJoint {
    pub target: Vec2,
    pub max_force: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,

    local_anchor_b: Vec2,
    r_b: Vec2,
    k: Matrix2<f32>,
    c0: Vec2,
    gamma: f32,
    impulse: Vec2,
}

impl MouseJoint {
    pub fn new(def: &MouseJointDef, body_b: &SolverBody) -> Self {
        let q = Rot::from_angle(body_b.a);
        let local_anchor_b = q.inv_rotate(def.target - body_b.c);
        MouseJoint {
            target: def.target,
            max_force: def.max_force,
            frequency_hz: def.frequency_hz,
            damping_ratio: def.damping_ratio,
            local_anchor_b,
            r_b: vec2(0.0, 0.0),
            k: Matrix2::new(0.0, 0.0, 0.0, 0.0),
            c0: vec2(0.0, 0.0),
            gamma: 0.0,
            impulse: vec2(0.0, 0.0),
        }
    }

    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    pub fn init_velocity_constraints(&mut self, b: &SolverBody, dt: f32) {
        self.r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);

        let mass = if b.inv_mass > 0.0 { 1.0 / b.inv_mass } else { 0.0 };
        let (stiffness, damping) = soft_constraint_coefficients(self.frequency_hz, self.damping_ratio, mass);
        let h = dt;
        self.gamma = {
            let g = h * (damping + h * stiffness);
            if g > 0.0 { 1.0 / g } else { 0.0 }
        };
        let beta = h * stiffness * self.gamma;

        let k11 = b.inv_mass + b.inv_i * self.r_b.y * self.r_b.y + self.gamma;
        let k12 = -b.inv_i * self.r_b.x * self.r_b.y;
        let k22 = b.inv_mass + b.inv_i * self.r_b.x * self.r_b.x + self.gamma;
        self.k = Matrix2::new(k11, k12, k12, k22);

        self.c0 = (b.c + self.r_b - self.target) * beta;
    }

    pub fn warm_start(&self, b: &mut SolverBody) {
        let p = self.impulse;
        b.v += p * b.inv_mass;
        b.w += b.inv_i * cross(self.r_b, p);
    }

    pub fn solve_velocity_constraints(&mut self, b: &mut SolverBody) {
        let cdot = b.v + cross_sv(b.w, self.r_b);
        let rhs = cdot + self.c0 + self.impulse * self.gamma;
        let impulse = -crate::math::solve22(self.k, rhs);

        let old = self.impulse;
        self.impulse += impulse;
        let max_impulse = self.max_force;
        let mag2 = self.impulse.x * self.impulse.x + self.impulse.y * self.impulse.y;
        if mag2 > max_impulse * max_impulse && max_impulse > 0.0 {
            let scale = max_impulse / mag2.sqrt();
            self.impulse = self.impulse * scale;
        }
        let applied = self.impulse - old;

        b.v += applied * b.inv_mass;
        b.w += b.inv_i * cross(self.r_b, applied);
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.impulse * inv_dt
    }
}
