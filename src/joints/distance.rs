//! Target-length constraint between two anchors, with optional min/max
//! length bounds and a soft spring.

use crate::joints::soft_constraint_coefficients;
use crate::math::{cross, cross_sv, normalize, vec2, Rot, Vec2};
use crate::solver::velocity_constraint::SolverBody;

#[derive(Clone, Debug)]
pub struct DistanceJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length: f32,
    pub min_length: f32,
    pub max_length: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,
}

impl Default for DistanceJointDef {
    fn default() -> Self {
        DistanceJointDef {
            local_anchor_a: vec2(0.0, 0.0),
            local_anchor_b: vec2(0.0, 0.0),
            length: 1.0,
            min_length: 0.0,
            max_length: f32::MAX,
            frequency_hz: 0.0,
            damping_ratio: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DistanceJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length: f32,
    pub min_length: f32,
    pub max_length: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,

    u: Vec2,
    r_a: Vec2,
    r_b: Vec2,
    current_length: f32,
    axial_mass: f32,
    soft_mass: f32,
    bias: f32,
    gamma: f32,
    impulse: f32,
    lower_impulse: f32,
    upper_impulse: f32,
    inv_h: f32,
}

impl DistanceJoint {
    pub fn new(def: &DistanceJointDef) -> Self {
        DistanceJoint {
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            length: def.length.max(crate::settings::LINEAR_SLOP),
            min_length: def.min_length.max(0.0),
            max_length: def.max_length,
            frequency_hz: def.frequency_hz,
            damping_ratio: def.damping_ratio,
            u: vec2(1.0, 0.0),
            r_a: vec2(0.0, 0.0),
            r_b: vec2(0.0, 0.0),
            current_length: 0.0,
            axial_mass: 0.0,
            soft_mass: 0.0,
            bias: 0.0,
            gamma: 0.0,
            impulse: 0.0,
            lower_impulse: 0.0,
            upper_impulse: 0.0,
            inv_h: 0.0,
        }
    }

    pub fn init_velocity_constraints(&mut self, a: &SolverBody, b: &SolverBody, dt: f32) {
        self.inv_h = if dt > 0.0 { 1.0 / dt } else { 0.0 };
        self.r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        self.r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);
        let d = (b.c + self.r_b) - (a.c + self.r_a);
        let (u, len) = normalize(d);
        self.u = u;
        self.current_length = len;

        let cr_a = cross(self.r_a, u);
        let cr_b = cross(self.r_b, u);
        let inv_mass = a.inv_mass + b.inv_mass + a.inv_i * cr_a * cr_a + b.inv_i * cr_b * cr_b;
        self.axial_mass = if inv_mass > 0.0 { 1.0 / inv_mass } else { 0.0 };

        if self.frequency_hz > 0.0 && self.min_length < self.max_length {
            let (stiffness, damping) = soft_constraint_coefficients(self.frequency_hz, self.damping_ratio, self.axial_mass);
            let c = len - self.length;
            let h = dt;
            self.gamma = {
                let g = h * (damping + h * stiffness);
                if g > 0.0 { 1.0 / g } else { 0.0 }
            };
            self.bias = c * h * stiffness * self.gamma;
            let inv_mass_soft = inv_mass + self.gamma;
            self.soft_mass = if inv_mass_soft > 0.0 { 1.0 / inv_mass_soft } else { 0.0 };
        } else {
            self.gamma = 0.0;
            self.bias = 0.0;
            self.soft_mass = self.axial_mass;
            self.lower_impulse = 0.0;
            self.upper_impulse = 0.0;
        }

        if self.min_length >= self.max_length {
            self.impulse = 0.0;
        }
    }

    pub fn warm_start(&self, a: &mut SolverBody, b: &mut SolverBody) {
        let axial = self.impulse + self.lower_impulse - self.upper_impulse;
        let p = self.u * axial;
        a.v -= p * a.inv_mass;
        a.w -= a.inv_i * cross(self.r_a, p);
        b.v += p * b.inv_mass;
        b.w += b.inv_i * cross(self.r_b, p);
    }

    fn relative_normal_velocity(&self, a: &SolverBody, b: &SolverBody) -> f32 {
        let vp_a = a.v + cross_sv(a.w, self.r_a);
        let vp_b = b.v + cross_sv(b.w, self.r_b);
        (vp_b - vp_a).dot(self.u)
    }

    pub fn solve_velocity_constraints(&mut self, a: &mut SolverBody, b: &mut SolverBody) {
        let apply = |joint: &DistanceJoint, a: &mut SolverBody, b: &mut SolverBody, impulse: f32| {
            let p = joint.u * impulse;
            a.v -= p * a.inv_mass;
            a.w -= a.inv_i * cross(joint.r_a, p);
            b.v += p * b.inv_mass;
            b.w += b.inv_i * cross(joint.r_b, p);
        };

        if self.min_length < self.max_length {
            if self.frequency_hz > 0.0 {
                let cdot = self.relative_normal_velocity(a, b);
                let impulse = -self.soft_mass * (cdot + self.bias + self.gamma * self.impulse);
                self.impulse += impulse;
                apply(self, a, b, impulse);
            }

            {
                let c = self.current_length - self.min_length;
                let cdot = self.relative_normal_velocity(a, b);
                let mut impulse = -self.axial_mass * (cdot + c.min(0.0) * self.inv_h);
                let old = self.lower_impulse;
                self.lower_impulse = (old + impulse).max(0.0);
                impulse = self.lower_impulse - old;
                apply(self, a, b, impulse);
            }
            {
                let c = self.max_length - self.current_length;
                let cdot = -self.relative_normal_velocity(a, b);
                let mut impulse = -self.axial_mass * (cdot + c.min(0.0) * self.inv_h);
                let old = self.upper_impulse;
                self.upper_impulse = (old + impulse).max(0.0);
                impulse = self.upper_impulse - old;
                apply(self, a, b, -impulse);
            }
        } else {
            let cdot = self.relative_normal_velocity(a, b);
            let impulse = -self.axial_mass * cdot;
            self.impulse += impulse;
            apply(self, a, b, impulse);
        }
    }

    pub fn solve_position_constraints(&self, a: &mut SolverBody, b: &mut SolverBody) -> bool {
        if self.frequency_hz > 0.0 {
            // A soft joint relies entirely on the velocity-level bias.
            return true;
        }

        let r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        let r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);
        let d = (b.c + r_b) - (a.c + r_a);
        let (u, len) = normalize(d);

        let c = if self.min_length == self.max_length {
            len - self.length
        } else if len < self.min_length {
            len - self.min_length
        } else if len > self.max_length {
            len - self.max_length
        } else {
            0.0
        };

        if c.abs() < crate::settings::LINEAR_SLOP {
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

        c.abs() <= crate::settings::LINEAR_SLOP * 3.0
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.u * ((self.impulse + self.lower_impulse - self.upper_impulse) * inv_dt)
    }
}
