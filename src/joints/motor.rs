//! Drives a body toward a target relative transform with capped force and
//! torque; used for kinematic-control rigs.

use crate::math::{cross, cross_sv, vec2, Rot, Vec2};
use crate::solver::velocity_constraint::SolverBody;

#[derive(Clone, Debug)]
pub struct MotorJointDef {
    pub linear_offset: Vec2,
    pub angular_offset: f32,
    pub max_force: f32,
    pub max_torque: f32,
    pub correction_factor: f32,
}

impl Default for MotorJointDef {
    fn default() -> Self {
        MotorJointDef {
            linear_offset: vec2(0.0, 0.0),
            angular_offset: 0.0,
            max_force: 1.0,
            max_torque: 1.0,
            correction_factor: 0.3,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MotorJoint {
    pub linear_offset: Vec2,
    pub angular_offset: f32,
    pub max_force: f32,
    pub max_torque: f32,
    pub correction_factor: f32,

    r_a: Vec2,
    r_b: Vec2,
    linear_error: Vec2,
    angular_error: f32,
    k: cgmath::Matrix2<f32>,
    angular_mass: f32,
    linear_impulse: Vec2,
    angular_impulse: f32,
}

impl MotorJoint {
    pub fn new(def: &MotorJointDef) -> Self {
        MotorJoint {
            linear_offset: def.linear_offset,
            angular_offset: def.angular_offset,
            max_force: def.max_force,
            max_torque: def.max_torque,
            correction_factor: def.correction_factor,
            r_a: vec2(0.0, 0.0),
            r_b: vec2(0.0, 0.0),
            linear_error: vec2(0.0, 0.0),
            angular_error: 0.0,
            k: cgmath::Matrix2::new(0.0, 0.0, 0.0, 0.0),
            angular_mass: 0.0,
            linear_impulse: vec2(0.0, 0.0),
            angular_impulse: 0.0,
        }
    }

    pub fn init_velocity_constraints(&mut self, a: &SolverBody, b: &SolverBody) {
        self.r_a = Rot::from_angle(a.a).rotate(-a.local_center);
        self.r_b = Rot::from_angle(b.a).rotate(-b.local_center);

        self.linear_error = (b.c - a.c) - Rot::from_angle(a.a).rotate(self.linear_offset);
        self.angular_error = b.a - a.a - self.angular_offset;

        let k11 = a.inv_mass + b.inv_mass + a.inv_i * self.r_a.y * self.r_a.y + b.inv_i * self.r_b.y * self.r_b.y;
        let k12 = -a.inv_i * self.r_a.x * self.r_a.y - b.inv_i * self.r_b.x * self.r_b.y;
        let k22 = a.inv_mass + b.inv_mass + a.inv_i * self.r_a.x * self.r_a.x + b.inv_i * self.r_b.x * self.r_b.x;
        self.k = cgmath::Matrix2::new(k11, k12, k12, k22);

        let inv_angular = a.inv_i + b.inv_i;
        self.angular_mass = if inv_angular > 0.0 { 1.0 / inv_angular } else { 0.0 };
    }

    pub fn warm_start(&self, a: &mut SolverBody, b: &mut SolverBody) {
        a.w -= a.inv_i * self.angular_impulse;
        b.w += b.inv_i * self.angular_impulse;

        let p = self.linear_impulse;
        a.v -= p * a.inv_mass;
        a.w -= a.inv_i * cross(self.r_a, p);
        b.v += p * b.inv_mass;
        b.w += b.inv_i * cross(self.r_b, p);
    }

    pub fn solve_velocity_constraints(&mut self, a: &mut SolverBody, b: &mut SolverBody, dt: f32) {
        let inv_h = if dt > 0.0 { 1.0 / dt } else { 0.0 };

        {
            let cdot = b.w - a.w + inv_h * self.correction_factor * self.angular_error;
            let impulse = -self.angular_mass * cdot;
            let old = self.angular_impulse;
            let max_impulse = self.max_torque * dt;
            self.angular_impulse = (old + impulse).clamp(-max_impulse, max_impulse);
            let applied = self.angular_impulse - old;
            a.w -= a.inv_i * applied;
            b.w += b.inv_i * applied;
        }

        {
            let cdot = (b.v + cross_sv(b.w, self.r_b)) - (a.v + cross_sv(a.w, self.r_a))
                + self.linear_error * (inv_h * self.correction_factor);
            let impulse = -crate::math::solve22(self.k, cdot);
            let old = self.linear_impulse;
            self.linear_impulse += impulse;

            let max_impulse = self.max_force * dt;
            let mag2 = self.linear_impulse.x * self.linear_impulse.x + self.linear_impulse.y * self.linear_impulse.y;
            if mag2 > max_impulse * max_impulse && max_impulse > 0.0 {
                let scale = max_impulse / mag2.sqrt();
                self.linear_impulse = self.linear_impulse * scale;
            }
            let applied = self.linear_impulse - old;

            a.v -= applied * a.inv_mass;
            a.w -= a.inv_i * cross(self.r_a, applied);
            b.v += applied * b.inv_mass;
            b.w += b.inv_i * cross(self.r_b, applied);
        }
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.linear_impulse * inv_dt
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        self.angular_impulse * inv_dt
    }
}
