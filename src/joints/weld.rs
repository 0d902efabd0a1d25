//! Locks relative position and angle, with an optional soft angular
//! constraint.

use cgmath::{Matrix3, Vector3};

use crate::joints::soft_constraint_coefficients;
use crate::math::{cross, cross_sv, invert_sym33, solve33, vec2, Rot, Vec2};
use crate::solver::velocity_constraint::SolverBody;

#[derive(Clone, Debug)]
pub struct WeldJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub reference_angle: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,
}

impl Default for WeldJointDef {
    fn default() -> Self {
        WeldJointDef {
            local_anchor_a: vec2(0.0, 0.0),
            local_anchor_b: vec2(0.0, 0.0),
            reference_angle: 0.0,
            frequency_hz: 0.0,
            damping_ratio: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WeldJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub reference_angle: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,

    r_a: Vec2,
    r_b: Vec2,
    mass: Matrix3<f32>,
    bias: f32,
    gamma: f32,
    impulse: Vector3<f32>,
}

impl WeldJoint {
    pub fn new(def: &WeldJointDef) -> Self {
        WeldJoint {
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            reference_angle: def.reference_angle,
            frequency_hz: def.frequency_hz,
            damping_ratio: def.damping_ratio,
            r_a: vec2(0.0, 0.0),
            r_b: vec2(0.0, 0.0),
            mass: Matrix3::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            bias: 0.0,
            gamma: 0.0,
            impulse: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    fn k_matrix(&self, a: &SolverBody, b: &SolverBody) -> Matrix3<f32> {
        let k11 = a.inv_mass + b.inv_mass + a.inv_i * self.r_a.y * self.r_a.y + b.inv_i * self.r_b.y * self.r_b.y;
        let k12 = -a.inv_i * self.r_a.x * self.r_a.y - b.inv_i * self.r_b.x * self.r_b.y;
        let k13 = -a.inv_i * self.r_a.y - b.inv_i * self.r_b.y;
        let k22 = a.inv_mass + b.inv_mass + a.inv_i * self.r_a.x * self.r_a.x + b.inv_i * self.r_b.x * self.r_b.x;
        let k23 = a.inv_i * self.r_a.x + b.inv_i * self.r_b.x;
        let k33 = a.inv_i + b.inv_i;
        // cgmath::Matrix3::new takes columns; build symmetric matrix explicitly.
        Matrix3::new(k11, k12, k13, k12, k22, k23, k13, k23, k33)
    }

    pub fn init_velocity_constraints(&mut self, a: &SolverBody, b: &SolverBody, dt: f32) {
        self.r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        self.r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);

        let k = self.k_matrix(a, b);

        if self.frequency_hz > 0.0 {
            let inv_angular = a.inv_i + b.inv_i;
            let angular_mass = if inv_angular > 0.0 { 1.0 / inv_angular } else { 0.0 };
            let (stiffness, damping) = soft_constraint_coefficients(self.frequency_hz, self.damping_ratio, angular_mass);
            let h = dt;
            self.gamma = {
                let g = h * (damping + h * stiffness);
                if g > 0.0 { 1.0 / g } else { 0.0 }
            };
            let c = b.a - a.a - self.reference_angle;
            self.bias = c * h * stiffness * self.gamma;
            let k33 = (a.inv_i + b.inv_i + self.gamma).max(f32::EPSILON);
            let mut k = k;
            k.z.z = k33;
            self.mass = invert_sym33(k);
        } else {
            self.gamma = 0.0;
            self.bias = 0.0;
            self.mass = invert_sym33(k);
        }
    }

    pub fn warm_start(&self, a: &mut SolverBody, b: &mut SolverBody) {
        let p = vec2(self.impulse.x, self.impulse.y);
        a.v -= p * a.inv_mass;
        a.w -= a.inv_i * (cross(self.r_a, p) + self.impulse.z);
        b.v += p * b.inv_mass;
        b.w += b.inv_i * (cross(self.r_b, p) + self.impulse.z);
    }

    pub fn solve_velocity_constraints(&mut self, a: &mut SolverBody, b: &mut SolverBody) {
        if self.frequency_hz > 0.0 {
            let cdot2 = b.w - a.w;
            let impulse2 = -self.mass.z.z * (cdot2 + self.bias + self.gamma * self.impulse.z);
            self.impulse.z += impulse2;
            a.w -= a.inv_i * impulse2;
            b.w += b.inv_i * impulse2;

            let vp_a = a.v + cross_sv(a.w, self.r_a);
            let vp_b = b.v + cross_sv(b.w, self.r_b);
            let cdot1 = vp_b - vp_a;

            let impulse1 = -crate::math::solve22(
                cgmath::Matrix2::new(self.mass.x.x, self.mass.x.y, self.mass.y.x, self.mass.y.y),
                cdot1,
            );
            self.impulse.x += impulse1.x;
            self.impulse.y += impulse1.y;

            let p = impulse1;
            a.v -= p * a.inv_mass;
            a.w -= a.inv_i * cross(self.r_a, p);
            b.v += p * b.inv_mass;
            b.w += b.inv_i * cross(self.r_b, p);
        } else {
            let vp_a = a.v + cross_sv(a.w, self.r_a);
            let vp_b = b.v + cross_sv(b.w, self.r_b);
            let cdot = Vector3::new(vp_b.x - vp_a.x, vp_b.y - vp_a.y, b.w - a.w);
            let impulse = -solve33(self.mass, cdot);
            self.impulse += impulse;

            let p = vec2(impulse.x, impulse.y);
            a.v -= p * a.inv_mass;
            a.w -= a.inv_i * (cross(self.r_a, p) + impulse.z);
            b.v += p * b.inv_mass;
            b.w += b.inv_i * (cross(self.r_b, p) + impulse.z);
        }
    }

    pub fn solve_position_constraints(&self, a: &mut SolverBody, b: &mut SolverBody) -> bool {
        let r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        let r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);

        let c1 = (b.c + r_b) - (a.c + r_a);
        let c2 = b.a - a.a - self.reference_angle;
        let position_error = c1.x.hypot(c1.y);
        let angular_error = c2.abs();

        if self.frequency_hz > 0.0 {
            let k11 = a.inv_mass + b.inv_mass + a.inv_i * r_a.y * r_a.y + b.inv_i * r_b.y * r_b.y;
            let k12 = -a.inv_i * r_a.x * r_a.y - b.inv_i * r_b.x * r_b.y;
            let k22 = a.inv_mass + b.inv_mass + a.inv_i * r_a.x * r_a.x + b.inv_i * r_b.x * r_b.x;
            let impulse = -crate::math::solve22(cgmath::Matrix2::new(k11, k12, k12, k22), c1);
            a.c -= impulse * a.inv_mass;
            a.a -= a.inv_i * cross(r_a, impulse);
            b.c += impulse * b.inv_mass;
            b.a += b.inv_i * cross(r_b, impulse);
        } else {
            let k11 = a.inv_mass + b.inv_mass + a.inv_i * r_a.y * r_a.y + b.inv_i * r_b.y * r_b.y;
            let k12 = -a.inv_i * r_a.x * r_a.y - b.inv_i * r_b.x * r_b.y;
            let k13 = -a.inv_i * r_a.y - b.inv_i * r_b.y;
            let k22 = a.inv_mass + b.inv_mass + a.inv_i * r_a.x * r_a.x + b.inv_i * r_b.x * r_b.x;
            let k23 = a.inv_i * r_a.x + b.inv_i * r_b.x;
            let k33 = a.inv_i + b.inv_i;
            let k = Matrix3::new(k11, k12, k13, k12, k22, k23, k13, k23, k33);
            let c = Vector3::new(c1.x, c1.y, c2);
            let impulse = -solve33(k, c);

            let p = vec2(impulse.x, impulse.y);
            a.c -= p * a.inv_mass;
            a.a -= a.inv_i * (cross(r_a, p) + impulse.z);
            b.c += p * b.inv_mass;
            b.a += b.inv_i * (cross(r_b, p) + impulse.z);
        }

        position_error <= crate::settings::LINEAR_SLOP * 3.0 && angular_error <= crate::settings::ANGULAR_SLOP
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        vec2(self.impulse.x, self.impulse.y) * inv_dt
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        self.impulse.z * inv_dt
    }
}
