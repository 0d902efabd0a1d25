//! Point-on-perpendicular-axis constraint with a soft suspension spring
//! along the axis, an optional translation limit, and an optional angular
//! motor (free relative rotation otherwise, unlike the prismatic joint).

use crate::joints::soft_constraint_coefficients;
use crate::math::{cross, left_perp, vec2, Rot, Vec2};
use crate::solver::velocity_constraint::SolverBody;

#[derive(Clone, Debug)]
pub struct WheelJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub local_axis_a: Vec2,
    pub enable_limit: bool,
    pub lower_translation: f32,
    pub upper_translation: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_torque: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,
}

impl Default for WheelJointDef {
    fn default() -> Self {
        WheelJointDef {
            local_anchor_a: vec2(0.0, 0.0),
            local_anchor_b: vec2(0.0, 0.0),
            local_axis_a: vec2(0.0, 1.0),
            enable_limit: false,
            lower_translation: 0.0,
            upper_translation: 0.0,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            frequency_hz: 2.0,
            damping_ratio: 0.7,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WheelJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub local_axis_a: Vec2,
    pub enable_limit: bool,
    pub lower_translation: f32,
    pub upper_translation: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_torque: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,

    axis: Vec2,
    perp: Vec2,
    s1: f32,
    s2: f32,
    a1: f32,
    a2: f32,
    perp_mass: f32,
    angular_mass: f32,
    axial_mass: f32,
    spring_mass: f32,
    bias: f32,
    gamma: f32,
    perp_impulse: f32,
    spring_impulse: f32,
    motor_impulse: f32,
    lower_impulse: f32,
    upper_impulse: f32,
    max_motor_torque_this_step: f32,
}

impl WheelJoint {
    pub fn new(def: &WheelJointDef) -> Self {
        WheelJoint {
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            local_axis_a: def.local_axis_a,
            enable_limit: def.enable_limit,
            lower_translation: def.lower_translation,
            upper_translation: def.upper_translation,
            enable_motor: def.enable_motor,
            motor_speed: def.motor_speed,
            max_motor_torque: def.max_motor_torque,
            frequency_hz: def.frequency_hz,
            damping_ratio: def.damping_ratio,
            axis: vec2(0.0, 1.0),
            perp: vec2(1.0, 0.0),
            s1: 0.0,
            s2: 0.0,
            a1: 0.0,
            a2: 0.0,
            perp_mass: 0.0,
            angular_mass: 0.0,
            axial_mass: 0.0,
            spring_mass: 0.0,
            bias: 0.0,
            gamma: 0.0,
            perp_impulse: 0.0,
            spring_impulse: 0.0,
            motor_impulse: 0.0,
            lower_impulse: 0.0,
            upper_impulse: 0.0,
            max_motor_torque_this_step: 0.0,
        }
    }

    fn update_geometry(&mut self, a: &SolverBody, b: &SolverBody) -> Vec2 {
        let r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        let r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);
        let d = (b.c + r_b) - (a.c + r_a);

        self.axis = Rot::from_angle(a.a).rotate(self.local_axis_a);
        self.perp = left_perp(self.axis);

        self.s1 = cross(d + r_a, self.perp);
        self.s2 = cross(r_b, self.perp);
        self.a1 = cross(d + r_a, self.axis);
        self.a2 = cross(r_b, self.axis);
        d
    }

    pub fn init_velocity_constraints(&mut self, a: &SolverBody, b: &SolverBody, dt: f32) {
        let d = self.update_geometry(a, b);

        let inv_perp = a.inv_mass + b.inv_mass + a.inv_i * self.s1 * self.s1 + b.inv_i * self.s2 * self.s2;
        self.perp_mass = if inv_perp > 0.0 { 1.0 / inv_perp } else { 0.0 };

        let inv_angular = a.inv_i + b.inv_i;
        self.angular_mass = if inv_angular > 0.0 { 1.0 / inv_angular } else { 0.0 };

        let inv_axial = a.inv_mass + b.inv_mass + a.inv_i * self.a1 * self.a1 + b.inv_i * self.a2 * self.a2;
        self.axial_mass = if inv_axial > 0.0 { 1.0 / inv_axial } else { 0.0 };

        if self.frequency_hz > 0.0 {
            let (stiffness, damping) = soft_constraint_coefficients(self.frequency_hz, self.damping_ratio, self.axial_mass);
            let h = dt;
            self.gamma = {
                let g = h * (damping + h * stiffness);
                if g > 0.0 { 1.0 / g } else { 0.0 }
            };
            let translation = self.axis.dot(d);
            self.bias = translation * h * stiffness * self.gamma;
            self.spring_mass = {
                let inv = inv_axial + self.gamma;
                if inv > 0.0 { 1.0 / inv } else { 0.0 }
            };
        } else {
            self.gamma = 0.0;
            self.bias = 0.0;
            self.spring_impulse = 0.0;
            self.spring_mass = 0.0;
        }

        self.max_motor_torque_this_step = self.max_motor_torque * dt;

        if !self.enable_motor {
            self.motor_impulse = 0.0;
        }
        if !self.enable_limit {
            self.lower_impulse = 0.0;
            self.upper_impulse = 0.0;
        }
    }

    pub fn warm_start(&self, a: &mut SolverBody, b: &mut SolverBody) {
        let axial = self.spring_impulse + self.motor_impulse + self.lower_impulse - self.upper_impulse;
        let p = self.perp * self.perp_impulse + self.axis * axial;
        let la = self.perp_impulse * self.s1 + axial * self.a1 + self.motor_impulse;
        let lb = self.perp_impulse * self.s2 + axial * self.a2 + self.motor_impulse;

        a.v -= p * a.inv_mass;
        a.w -= a.inv_i * la;
        b.v += p * b.inv_mass;
        b.w += b.inv_i * lb;
    }

    pub fn solve_velocity_constraints(&mut self, a: &mut SolverBody, b: &mut SolverBody) {
        if self.frequency_hz > 0.0 {
            let cdot = self.axis.dot(b.v - a.v) + self.a2 * b.w - self.a1 * a.w;
            let impulse = -self.spring_mass * (cdot + self.bias + self.gamma * self.spring_impulse);
            self.spring_impulse += impulse;

            let p = self.axis * impulse;
            a.v -= p * a.inv_mass;
            a.w -= a.inv_i * impulse * self.a1;
            b.v += p * b.inv_mass;
            b.w += b.inv_i * impulse * self.a2;
        }

        if self.enable_motor {
            let cdot = b.w - a.w - self.motor_speed;
            let mut impulse = -self.angular_mass * cdot;
            let old = self.motor_impulse;
            self.motor_impulse = (old + impulse).clamp(-self.max_motor_torque_this_step, self.max_motor_torque_this_step);
            impulse = self.motor_impulse - old;
            a.w -= a.inv_i * impulse;
            b.w += b.inv_i * impulse;
        }

        if self.enable_limit {
            {
                let cdot = self.axis.dot(b.v - a.v) + self.a2 * b.w - self.a1 * a.w;
                let mut impulse = -self.axial_mass * cdot;
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
                let mut impulse = -self.axial_mass * cdot;
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

        let cdot = self.perp.dot(b.v - a.v) + self.s2 * b.w - self.s1 * a.w;
        let impulse = -self.perp_mass * cdot;
        self.perp_impulse += impulse;

        let p = self.perp * impulse;
        a.v -= p * a.inv_mass;
        a.w -= a.inv_i * impulse * self.s1;
        b.v += p * b.inv_mass;
        b.w += b.inv_i * impulse * self.s2;
    }

    pub fn solve_position_constraints(&self, a: &mut SolverBody, b: &mut SolverBody) -> bool {
        let r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        let r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);
        let d = (b.c + r_b) - (a.c + r_a);
        let axis = Rot::from_angle(a.a).rotate(self.local_axis_a);
        let perp = left_perp(axis);

        let s1 = cross(d + r_a, perp);
        let s2 = cross(r_b, perp);
        let c = perp.dot(d);
        let linear_error = c.abs();

        let inv = a.inv_mass + b.inv_mass + a.inv_i * s1 * s1 + b.inv_i * s2 * s2;
        let mass = if inv > 0.0 { 1.0 / inv } else { 0.0 };
        let impulse = -mass * c;

        let p = perp * impulse;
        a.c -= p * a.inv_mass;
        a.a -= a.inv_i * impulse * s1;
        b.c += p * b.inv_mass;
        b.a += b.inv_i * impulse * s2;

        linear_error <= crate::settings::LINEAR_SLOP * 3.0
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        let axial = self.spring_impulse + self.motor_impulse + self.lower_impulse - self.upper_impulse;
        (self.perp * self.perp_impulse + self.axis * axial) * inv_dt
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        self.motor_impulse * inv_dt
    }
}
