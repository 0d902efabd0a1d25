//! Two body/ground-anchor segments linked through a ratio, constraining the
//! total (length_a + ratio * length_b) to a constant. No limit or motor.

use crate::math::{cross, cross_sv, normalize, vec2, Rot, Vec2};
use crate::solver::velocity_constraint::SolverBody;

#[derive(Clone, Debug)]
pub struct PulleyJointDef {
    pub ground_anchor_a: Vec2,
    pub ground_anchor_b: Vec2,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length_a: f32,
    pub length_b: f32,
    pub ratio: f32,
}

impl Default for PulleyJointDef {
    fn default() -> Self {
        PulleyJointDef {
            ground_anchor_a: vec2(0.0, 1.0),
            ground_anchor_b: vec2(0.0, 1.0),
            local_anchor_a: vec2(0.0, 0.0),
            local_anchor_b: vec2(0.0, 0.0),
            length_a: 0.0,
            length_b: 0.0,
            ratio: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PulleyJoint {
    pub ground_anchor_a: Vec2,
    pub ground_anchor_b: Vec2,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length_a: f32,
    pub length_b: f32,
    pub ratio: f32,
    pub constant: f32,

    r_a: Vec2,
    r_b: Vec2,
    u_a: Vec2,
    u_b: Vec2,
    mass: f32,
    impulse: f32,
}

impl PulleyJoint {
    pub fn new(def: &PulleyJointDef) -> Self {
        PulleyJoint {
            ground_anchor_a: def.ground_anchor_a,
            ground_anchor_b: def.ground_anchor_b,
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            length_a: def.length_a,
            length_b: def.length_b,
            ratio: def.ratio,
            constant: def.length_a + def.ratio * def.length_b,
            r_a: vec2(0.0, 0.0),
            r_b: vec2(0.0, 0.0),
            u_a: vec2(1.0, 0.0),
            u_b: vec2(1.0, 0.0),
            mass: 0.0,
            impulse: 0.0,
        }
    }

    pub fn init_velocity_constraints(&mut self, a: &SolverBody, b: &SolverBody) {
        self.r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        self.r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);

        let p_a = a.c + self.r_a;
        let p_b = b.c + self.r_b;
        let (u_a, len_a) = normalize(p_a - self.ground_anchor_a);
        let (u_b, len_b) = normalize(p_b - self.ground_anchor_b);
        self.u_a = u_a;
        self.u_b = u_b;

        let cr_a = cross(self.r_a, u_a);
        let cr_b = cross(self.r_b, u_b);
        let mut inv_mass = a.inv_mass + a.inv_i * cr_a * cr_a;
        inv_mass += self.ratio * self.ratio * (b.inv_mass + b.inv_i * cr_b * cr_b);
        self.mass = if inv_mass > 0.0 { 1.0 / inv_mass } else { 0.0 };

        let _ = (len_a, len_b);
    }

    pub fn warm_start(&self, a: &mut SolverBody, b: &mut SolverBody) {
        let p_a = self.u_a * (-self.impulse);
        let p_b = self.u_b * (-self.ratio * self.impulse);

        a.v += p_a * a.inv_mass;
        a.w += a.inv_i * cross(self.r_a, p_a);
        b.v += p_b * b.inv_mass;
        b.w += b.inv_i * cross(self.r_b, p_b);
    }

    pub fn solve_velocity_constraints(&mut self, a: &mut SolverBody, b: &mut SolverBody) {
        let vp_a = a.v + cross_sv(a.w, self.r_a);
        let vp_b = b.v + cross_sv(b.w, self.r_b);
        let cdot = -self.u_a.dot(vp_a) - self.ratio * self.u_b.dot(vp_b);
        let impulse = -self.mass * cdot;
        self.impulse += impulse;

        let p_a = self.u_a * (-impulse);
        let p_b = self.u_b * (-self.ratio * impulse);

        a.v += p_a * a.inv_mass;
        a.w += a.inv_i * cross(self.r_a, p_a);
        b.v += p_b * b.inv_mass;
        b.w += b.inv_i * cross(self.r_b, p_b);
    }

    pub fn solve_position_constraints(&self, a: &mut SolverBody, b: &mut SolverBody) -> bool {
        let r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        let r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);

        let p_a = a.c + r_a;
        let p_b = b.c + r_b;
        let (u_a, len_a) = normalize(p_a - self.ground_anchor_a);
        let (u_b, len_b) = normalize(p_b - self.ground_anchor_b);

        let c = self.constant - len_a - self.ratio * len_b;
        let linear_error = c.abs();

        let cr_a = cross(r_a, u_a);
        let cr_b = cross(r_b, u_b);
        let mut inv_mass = a.inv_mass + a.inv_i * cr_a * cr_a;
        inv_mass += self.ratio * self.ratio * (b.inv_mass + b.inv_i * cr_b * cr_b);
        let mass = if inv_mass > 0.0 { 1.0 / inv_mass } else { 0.0 };
        let impulse = -mass * c;

        let p_a_impulse = u_a * (-impulse);
        let p_b_impulse = u_b * (-self.ratio * impulse);

        a.c += p_a_impulse * a.inv_mass;
        a.a += a.inv_i * cross(r_a, p_a_impulse);
        b.c += p_b_impulse * b.inv_mass;
        b.a += b.inv_i * cross(r_b, p_b_impulse);

        linear_error < crate::settings::LINEAR_SLOP
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.u_b * (self.ratio * self.impulse * inv_dt)
    }
}
