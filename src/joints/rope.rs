//! Inextensible upper bound on distance between two anchors: a one-sided
//! position constraint with no spring.

use crate::math::{cross, cross_sv, normalize, vec2, Rot, Vec2};
use crate::solver::velocity_constraint::SolverBody;

#[derive(Clone, Debug)]
pub struct RopeJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub max_length: f32,
}

impl Default for RopeJointDef {
    fn default() -> Self {
        RopeJointDef {
            local_anchor_a: vec2(0.0, 0.0),
            local_anchor_b: vec2(0.0, 0.0),
            max_length: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RopeJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub max_length: f32,

    u: Vec2,
    r_a: Vec2,
    r_b: Vec2,
    length: f32,
    mass: f32,
    impulse: f32,
}

impl RopeJoint {
    pub fn new(def: &RopeJointDef) -> Self {
        RopeJoint {
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            max_length: def.max_length,
            u: vec2(1.0, 0.0),
            r_a: vec2(0.0, 0.0),
            r_b: vec2(0.0, 0.0),
            length: 0.0,
            mass: 0.0,
            impulse: 0.0,
        }
    }

    pub fn init_velocity_constraints(&mut self, a: &SolverBody, b: &SolverBody) {
        self.r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        self.r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);
        let d = (b.c + self.r_b) - (a.c + self.r_a);
        let (u, len) = normalize(d);
        self.u = u;
        self.length = len;

        let cr_a = cross(self.r_a, u);
        let cr_b = cross(self.r_b, u);
        let inv_mass = a.inv_mass + b.inv_mass + a.inv_i * cr_a * cr_a + b.inv_i * cr_b * cr_b;
        self.mass = if inv_mass > 0.0 { 1.0 / inv_mass } else { 0.0 };

        if self.length <= self.max_length {
            self.impulse = 0.0;
        }
    }

    pub fn warm_start(&self, a: &mut SolverBody, b: &mut SolverBody) {
        let p = self.u * self.impulse;
        a.v -= p * a.inv_mass;
        a.w -= a.inv_i * cross(self.r_a, p);
        b.v += p * b.inv_mass;
        b.w += b.inv_i * cross(self.r_b, p);
    }

    pub fn solve_velocity_constraints(&mut self, a: &mut SolverBody, b: &mut SolverBody) {
        if self.length <= self.max_length {
            return;
        }
        let vp_a = a.v + cross_sv(a.w, self.r_a);
        let vp_b = b.v + cross_sv(b.w, self.r_b);
        let cdot = (vp_b - vp_a).dot(self.u);

        let mut impulse = -self.mass * cdot;
        let old = self.impulse;
        self.impulse = (old + impulse).min(0.0);
        impulse = self.impulse - old;

        let p = self.u * impulse;
        a.v -= p * a.inv_mass;
        a.w -= a.inv_i * cross(self.r_a, p);
        b.v += p * b.inv_mass;
        b.w += b.inv_i * cross(self.r_b, p);
    }

    pub fn solve_position_constraints(&self, a: &mut SolverBody, b: &mut SolverBody) -> bool {
        let r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        let r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);
        let d = (b.c + r_b) - (a.c + r_a);
        let (u, len) = normalize(d);
        let c = (len - self.max_length).clamp(0.0, crate::settings::MAX_LINEAR_CORRECTION);

        if c <= 0.0 {
            return true;
        }

        let cr_a = cross(r_a, u);
        let cr_b = cross(r_b, u);
        let inv_mass = a.inv_mass + b.inv_mass + a.inv_i * cr_a * cr_a + b.inv_i * cr_b * cr_b;
        if inv_mass <= 0.0 {
            return true;
        }
        let impulse = -c / inv_mass;
        let p = u * impulse;
        a.c -= p * a.inv_mass;
        a.a -= a.inv_i * cross(r_a, p);
        b.c += p * b.inv_mass;
        b.a += b.inv_i * cross(r_b, p);

        (len - self.max_length) <= crate::settings::LINEAR_SLOP
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.u * (self.impulse * inv_dt)
    }
}
