//! Velocity-only point and angular friction, capped by `max_force`/
//! `max_torque`; applies no position constraint.

use cgmath::Matrix2;

use crate::math::{cross, cross_sv, vec2, Rot, Vec2};
use crate::solver::velocity_constraint::SolverBody;

#[derive(Clone, Debug)]
pub struct FrictionJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub max_force: f32,
    pub max_torque: f32,
}

impl Default for FrictionJointDef {
    fn default() -> Self {
        FrictionJointDef {
            local_anchor_a: vec2(0.0, 0.0),
            local_anchor_b: vec2(0.0, 0.0),
            max_force: 0.0,
            max_torque: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FrictionJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub max_force: f32,
    pub max_torque: f32,

    r_a: Vec2,
    r_b: Vec2,
    k: Matrix2<f32>,
    angular_mass: f32,
    linear_impulse: Vec2,
    angular_impulse: f32,
}

impl FrictionJoint {
    pub fn new(def: &FrictionJointDef) -> Self {
        FrictionJoint {
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            max_force: def.max_force,
            max_torque: def.max_torque,
            r_a: vec2(0.0, 0.0),
            r_b: vec2(0.0, 0.0),
            k: Matrix2::new(0.0, 0.0, 0.0, 0.0),
            angular_mass: 0.0,
            linear_impulse: vec2(0.0, 0.0),
            angular_impulse: 0.0,
        }
    }

    pub fn init_velocity_constraints(&mut self, a: &SolverBody, b: &SolverBody) {
        self.r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        self.r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);

        let k11 = a.inv_mass + b.inv_mass + a.inv_i * self.r_a.y * self.r_a.y + b.inv_i * self.r_b.y * self.r_b.y;
        let k12 = -a.inv_i * self.r_a.x * self.r_a.y - b.inv_i * self.r_b.x * self.r_b.y;
        let k22 = a.inv_mass + b.inv_mass + a.inv_i * self.r_a.x * self.r_a.x + b.inv_i * self.r_b.x * self.r_b.x;
        self.k = Matrix2::new(k11, k12, k12, k22);

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
        {
            let cdot = b.w - a.w;
            let impulse = -self.angular_mass * cdot;
            let old = self.angular_impulse;
            let max_impulse = self.max_torque * dt;
            self.angular_impulse = (old + impulse).clamp(-max_impulse, max_impulse);
            let applied = self.angular_impulse - old;
            a.w -= a.inv_i * applied;
            b.w += b.inv_i * applied;
        }

        {
            let cdot = (b.v + cross_sv(b.w, self.r_b)) - (a.v + cross_sv(a.w, self.r_a));
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
