//! Point-to-point constraint at a shared anchor, with an optional angle
//! limit and motor.

use cgmath::Matrix2;

use crate::math::{cross, cross_sv, solve22, vec2, Rot, Vec2};
use crate::solver::velocity_constraint::SolverBody;

#[derive(Clone, Debug)]
pub struct RevoluteJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub reference_angle: f32,
    pub enable_limit: bool,
    pub lower_angle: f32,
    pub upper_angle: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_torque: f32,
}

impl Default for RevoluteJointDef {
    fn default() -> Self {
        RevoluteJointDef {
            local_anchor_a: vec2(0.0, 0.0),
            local_anchor_b: vec2(0.0, 0.0),
            reference_angle: 0.0,
            enable_limit: false,
            lower_angle: 0.0,
            upper_angle: 0.0,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RevoluteJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub reference_angle: f32,
    pub enable_limit: bool,
    pub lower_angle: f32,
    pub upper_angle: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_torque: f32,

    r_a: Vec2,
    r_b: Vec2,
    k: Matrix2<f32>,
    angular_mass: f32,
    point_impulse: Vec2,
    motor_impulse: f32,
    lower_impulse: f32,
    upper_impulse: f32,
    max_torque_this_step: f32,
}

impl RevoluteJoint {
    pub fn new(def: &RevoluteJointDef) -> Self {
        RevoluteJoint {
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            reference_angle: def.reference_angle,
            enable_limit: def.enable_limit,
            lower_angle: def.lower_angle,
            upper_angle: def.upper_angle,
            enable_motor: def.enable_motor,
            motor_speed: def.motor_speed,
            max_motor_torque: def.max_motor_torque,
            r_a: vec2(0.0, 0.0),
            r_b: vec2(0.0, 0.0),
            k: Matrix2::new(0.0, 0.0, 0.0, 0.0),
            angular_mass: 0.0,
            point_impulse: vec2(0.0, 0.0),
            motor_impulse: 0.0,
            lower_impulse: 0.0,
            upper_impulse: 0.0,
            max_torque_this_step: 0.0,
        }
    }

    fn anchors(&self, a: &SolverBody, b: &SolverBody) -> (Vec2, Vec2) {
        let r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        let r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);
        (r_a, r_b)
    }

    pub fn init_velocity_constraints(&mut self, a: &SolverBody, b: &SolverBody, dt: f32) {
        let (r_a, r_b) = self.anchors(a, b);
        self.r_a = r_a;
        self.r_b = r_b;

        let k11 = a.inv_mass + b.inv_mass + a.inv_i * r_a.y * r_a.y + b.inv_i * r_b.y * r_b.y;
        let k12 = -a.inv_i * r_a.x * r_a.y - b.inv_i * r_b.x * r_b.y;
        let k22 = a.inv_mass + b.inv_mass + a.inv_i * r_a.x * r_a.x + b.inv_i * r_b.x * r_b.x;
        self.k = Matrix2::new(k11, k12, k12, k22);

        let inv_angular = a.inv_i + b.inv_i;
        self.angular_mass = if inv_angular > 0.0 { 1.0 / inv_angular } else { 0.0 };
        self.max_torque_this_step = self.max_motor_torque * dt;

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
        a.w -= a.inv_i * axial;
        b.w += b.inv_i * axial;

        let p = self.point_impulse;
        a.v -= p * a.inv_mass;
        a.w -= a.inv_i * cross(self.r_a, p);
        b.v += p * b.inv_mass;
        b.w += b.inv_i * cross(self.r_b, p);
    }

    pub fn solve_velocity_constraints(&mut self, a: &mut SolverBody, b: &mut SolverBody) {
        if self.enable_motor {
            let cdot = b.w - a.w - self.motor_speed;
            let mut impulse = -self.angular_mass * cdot;
            let old = self.motor_impulse;
            self.motor_impulse = (old + impulse).clamp(-self.max_torque_this_step, self.max_torque_this_step);
            impulse = self.motor_impulse - old;
            a.w -= a.inv_i * impulse;
            b.w += b.inv_i * impulse;
        }

        if self.enable_limit {
            {
                let cdot = b.w - a.w;
                let mut impulse = -self.angular_mass * cdot;
                let old = self.lower_impulse;
                self.lower_impulse = (old + impulse).max(0.0);
                impulse = self.lower_impulse - old;
                a.w -= a.inv_i * impulse;
                b.w += b.inv_i * impulse;
            }
            {
                let cdot = a.w - b.w;
                let mut impulse = -self.angular_mass * cdot;
                let old = self.upper_impulse;
                self.upper_impulse = (old + impulse).max(0.0);
                impulse = self.upper_impulse - old;
                a.w += a.inv_i * impulse;
                b.w -= b.inv_i * impulse;
            }
        }

        let cdot = (b.v + cross_sv(b.w, self.r_b)) - (a.v + cross_sv(a.w, self.r_a));
        let impulse = -solve22(self.k, cdot);
        self.point_impulse += impulse;

        a.v -= impulse * a.inv_mass;
        a.w -= a.inv_i * cross(self.r_a, impulse);
        b.v += impulse * b.inv_mass;
        b.w += b.inv_i * cross(self.r_b, impulse);
    }

    pub fn solve_position_constraints(&self, a: &mut SolverBody, b: &mut SolverBody) -> bool {
        let mut angular_error = 0.0f32;
        if self.enable_limit {
            let joint_angle = b.a - a.a - self.reference_angle;
            let lower_violation = (joint_angle - self.lower_angle).min(0.0);
            let upper_violation = (self.upper_angle - joint_angle).min(0.0);
            if lower_violation < 0.0 || upper_violation < 0.0 {
                let inv_angular = a.inv_i + b.inv_i;
                if inv_angular > 0.0 {
                    let correction = (lower_violation - upper_violation).clamp(
                        -crate::settings::MAX_ANGULAR_CORRECTION,
                        crate::settings::MAX_ANGULAR_CORRECTION,
                    );
                    let impulse = -correction / inv_angular;
                    a.a -= a.inv_i * impulse;
                    b.a += b.inv_i * impulse;
                }
                angular_error = lower_violation.abs().max(upper_violation.abs());
            }
        }

        let r_a = Rot::from_angle(a.a).rotate(self.local_anchor_a - a.local_center);
        let r_b = Rot::from_angle(b.a).rotate(self.local_anchor_b - b.local_center);
        let c = (b.c + r_b) - (a.c + r_a);
        let position_error = c.x.hypot(c.y);

        let k11 = a.inv_mass + b.inv_mass + a.inv_i * r_a.y * r_a.y + b.inv_i * r_b.y * r_b.y;
        let k12 = -a.inv_i * r_a.x * r_a.y - b.inv_i * r_b.x * r_b.y;
        let k22 = a.inv_mass + b.inv_mass + a.inv_i * r_a.x * r_a.x + b.inv_i * r_b.x * r_b.x;
        let k = Matrix2::new(k11, k12, k12, k22);
        let impulse = -solve22(k, c);

        a.c -= impulse * a.inv_mass;
        a.a -= a.inv_i * cross(r_a, impulse);
        b.c += impulse * b.inv_mass;
        b.a += b.inv_i * cross(r_b, impulse);

        position_error <= crate::settings::LINEAR_SLOP * 3.0 && angular_error <= crate::settings::ANGULAR_SLOP
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.point_impulse * inv_dt
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        (self.motor_impulse + self.lower_impulse - self.upper_impulse) * inv_dt
    }
}
