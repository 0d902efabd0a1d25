//! Point and perpendicular-axis constraint (one translational degree of
//! freedom remains), with a translation limit and a motor along the axis.

use cgmath::Matrix2;

use crate::math::{cross, cross_sv, solve22, vec2, Rot, Vec2};
use crate::solver::velocity_constraint::SolverBody;

#[derive(Clone, Debug)]
pub struct PrismaticJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub local_axis_a: Vec2,
    pub reference_angle: f32,
    pub enable_limit: bool,
    pub lower_translation: f32,
    pub upper_translation: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_force: f32,
}

impl Default for PrismaticJointDef {
    fn default() -> Self {
        PrismaticJointDef {
            local_anchor_a: vec2(0.0, 0.0),
            local_anchor_b: vec2(0.0, 0.0),
            local_axis_a: vec2(1.0, 0.0),
            reference_angle: 0.0,
            enable_limit: false,
            lower_translation: 0.0,
            upper_translation: 0.0,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_force: 0.0,
        }
    }
}

/// `a1`/`a2` are the axis moment arms (`cross(d + rA, axis)`), matching
/// `b2PrismaticJoint`'s `a1`/`a2`; `s1`/`s2` the perpendicular-axis arms.
#[derive(Clone, Debug)]
pub struct PrismaticJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub local_axis_a: Vec2,
    pub reference_angle: f32,
    pub enable_limit: bool,
    pub lower_translation: f32,
    pub upper_translation: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_force: f32,

    axis: Vec2,
    perp: Vec2,
    s1: f32,
    s2: f32,
    a1: f32,
    a2: f32,
    k: Matrix2<f32>,
    axial_mass: f32,
    impulse: Vec2,
    motor_impulse: f32,
    lower_impulse: f32,
    upper_impulse: f32,
    max_motor_force_this_step: f32,
}

impl PrismaticJoint {
    pub fn new(def: &PrismaticJointDef) -> Self {
        PrismaticJoint {
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            local_axis_a: def.local_axis_a,
            reference_angle: def.reference_angle,
            enable_limit: def.enable_limit,
            lower_translation: def.lower_translation,
            upper_translation: def.upper_translation,
            enable_motor: def.enable_motor,
            motor_speed: def.motor_speed,
            max_motor_force: def.max_motor_force,
            axis: vec2(1.0, 0.0),
            perp: vec2(0.0, 1.0),
            s1: 0.0,
            s2: 0.0,
            a1: 0.0,
            a2: 0.0,
            k: Matrix2::new(0.0, 0.0, 0.0, 0.0),
            axial_mass: 0.0,
            impulse: vec2(0.0, 0.0),
            motor_impulse: 0.0,
            lower_impulse: 0.0,
            upper_impulse: 0.0,
            max_motor_force_this_step: 0.0,
        }
    }

    fn update_geometry(&mut self, a: &SolverBody, b: &SolverBody) -> Vec2 {
        let r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        let r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);
        let d = (b.c + r_b) - (a.c + r_a);

        self.axis = Rot::from_angle(a.a).rotate(self.local_axis_a);
        self.perp = crate::math::left_perp(self.axis);

        self.s1 = cross(d + r_a, self.axis);
        self.s2 = cross(r_b, self.axis);
        self.a1 = cross(d + r_a, self.perp);
        self.a2 = cross(r_b, self.perp);
        d
    }

    pub fn init_velocity_constraints(&mut self, a: &SolverBody, b: &SolverBody, dt: f32) {
        self.update_geometry(a, b);

        let k11 = a.inv_mass + b.inv_mass + a.inv_i * self.a1 * self.a1 + b.inv_i * self.a2 * self.a2;
        let k12 = a.inv_i * self.a1 + b.inv_i * self.a2;
        let k22 = { let sum = a.inv_i + b.inv_i; if sum > 0.0 { sum } else { 1.0 } };
        self.k = Matrix2::new(k11, k12, k12, k22);

        let inv_axial = a.inv_mass + b.inv_mass + a.inv_i * self.s1 * self.s1 + b.inv_i * self.s2 * self.s2;
        self.axial_mass = if inv_axial > 0.0 { 1.0 / inv_axial } else { 0.0 };
        self.max_motor_force_this_step = self.max_motor_force * dt;

        if !self.enable_motor {
            self.motor_impulse = 0.0;
        }
        if !self.enable_limit {
            self.lower_impulse = 0.0;
            self.upper_impulse = 0.0;
        }
    }

    pub fn warm_start(&self, a: &mut SolverBody, b: &mut SolverBody) {
        let axial = self.motor_impulse + self.lower_impulse - self.upper_impulse;
        let p = self.axis * axial + self.perp * self.impulse.x;
        let la = axial * self.a1 + self.impulse.x * self.s1 + self.impulse.y;
        let lb = axial * self.a2 + self.impulse.x * self.s2 + self.impulse.y;

        a.v -= p * a.inv_mass;
        a.w -= a.inv_i * la;
        b.v += p * b.inv_mass;
        b.w += b.inv_i * lb;
    }

    pub fn solve_velocity_constraints(&mut self, a: &mut SolverBody, b: &mut SolverBody) {
        if self.enable_motor {
            let cdot = self.axis.dot(b.v - a.v) + self.a2 * b.w - self.a1 * a.w - self.motor_speed;
            let mut impulse = self.axial_mass * (-cdot);
            let old = self.motor_impulse;
            self.motor_impulse = (old + impulse).clamp(-self.max_motor_force_this_step, self.max_motor_force_this_step);
            impulse = self.motor_impulse - old;
            let p = self.axis * impulse;
            a.v -= p * a.inv_mass;
            a.w -= a.inv_i * impulse * self.a1;
            b.v += p * b.inv_mass;
            b.w += b.inv_i * impulse * self.a2;
        }

        if self.enable_limit {
            {
                let cdot = self.axis.dot(b.v - a.v) + self.a2 * b.w - self.a1 * a.w;
                let mut impulse = self.axial_mass * (-cdot);
                let old = self.lower_impulse;
                self.lower_impulse = (old + impulse).max(0.0);
                impulse = self.lower_impulse - old;
                let p = self.axis * impulse;
                a.v -= p * a.inv_mass;
                a.w -= a.inv_i * impulse * self.a1;
                b.v += p * b.inv_mass;
                b.w += b.inv_i * impulse * self.a2;
            }
            {
                let cdot = -(self.axis.dot(b.v - a.v) + self.a2 * b.w - self.a1 * a.w);
                let mut impulse = self.axial_mass * (-cdot);
                let old = self.upper_impulse;
                self.upper_impulse = (old + impulse).max(0.0);
                impulse = self.upper_impulse - old;
                let p = self.axis * (-impulse);
                a.v -= p * a.inv_mass;
                a.w += a.inv_i * impulse * self.a1;
                b.v += p * b.inv_mass;
                b.w -= b.inv_i * impulse * self.a2;
            }
        }

        let perp_cdot = self.perp.dot(b.v - a.v) + self.s2 * b.w - self.s1 * a.w;
        let cdot = vec2(perp_cdot, b.w - a.w);
        let impulse = -solve22(self.k, cdot);
        self.impulse += impulse;

        let p = self.perp * impulse.x;
        let la = impulse.x * self.s1 + impulse.y;
        let lb = impulse.x * self.s2 + impulse.y;

        a.v -= p * a.inv_mass;
        a.w -= a.inv_i * la;
        b.v += p * b.inv_mass;
        b.w += b.inv_i * lb;
    }

    pub fn solve_position_constraints(&self, a: &mut SolverBody, b: &mut SolverBody) -> bool {
        let r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        let r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);
        let d = (b.c + r_b) - (a.c + r_a);
        let axis = Rot::from_angle(a.a).rotate(self.local_axis_a);
        let perp = crate::math::left_perp(axis);

        let s1 = cross(d + r_a, perp);
        let s2 = cross(r_b, perp);

        let c1 = vec2(perp.dot(d), b.a - a.a - self.reference_angle);
        let linear_error = c1.x.abs();
        let angular_error = c1.y.abs();

        let k11 = a.inv_mass + b.inv_mass + a.inv_i * s1 * s1 + b.inv_i * s2 * s2;
        let k12 = a.inv_i * s1 + b.inv_i * s2;
        let k22 = { let sum = a.inv_i + b.inv_i; if sum > 0.0 { sum } else { 1.0 } };
        let k = Matrix2::new(k11, k12, k12, k22);
        let impulse = -solve22(k, c1);

        let p = perp * impulse.x;
        let la = impulse.x * s1 + impulse.y;
        let lb = impulse.x * s2 + impulse.y;

        a.c -= p * a.inv_mass;
        a.a -= a.inv_i * la;
        b.c += p * b.inv_mass;
        b.a += b.inv_i * lb;

        linear_error <= crate::settings::LINEAR_SLOP * 3.0 && angular_error <= crate::settings::ANGULAR_SLOP
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        (self.perp * self.impulse.x + self.axis * (self.motor_impulse + self.lower_impulse - self.upper_impulse)) * inv_dt
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        self.impulse.y * inv_dt
    }
}
