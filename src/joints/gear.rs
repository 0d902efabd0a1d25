//! Couples the coordinate of a revolute or prismatic degree of freedom on
//! each body through a fixed ratio. The two coupled joints are not tracked
//! live; their anchor/axis/reference data is copied in at construction.

use crate::math::{cross, vec2, Rot, Vec2};
use crate::solver::velocity_constraint::SolverBody;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GearedJointKind {
    Revolute,
    Prismatic { local_axis: Vec2 },
}

#[derive(Clone, Debug)]
pub struct GearJointDef {
    pub kind_a: GearedJointKind,
    pub kind_b: GearedJointKind,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub reference_angle_a: f32,
    pub reference_angle_b: f32,
    pub ratio: f32,
    pub constant: f32,
}

impl Default for GearJointDef {
    fn default() -> Self {
        GearJointDef {
            kind_a: GearedJointKind::Revolute,
            kind_b: GearedJointKind::Revolute,
            local_anchor_a: vec2(0.0, 0.0),
            local_anchor_b: vec2(0.0, 0.0),
            reference_angle_a: 0.0,
            reference_angle_b: 0.0,
            ratio: 1.0,
            constant: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GearJoint {
    pub kind_a: GearedJointKind,
    pub kind_b: GearedJointKind,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub reference_angle_a: f32,
    pub reference_angle_b: f32,
    pub ratio: f32,
    pub constant: f32,

    jv_a: Vec2,
    jw_a: f32,
    jv_b: Vec2,
    jw_b: f32,
    mass: f32,
    impulse: f32,
}

impl GearJoint {
    pub fn new(def: &GearJointDef) -> Self {
        GearJoint {
            kind_a: def.kind_a,
            kind_b: def.kind_b,
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            reference_angle_a: def.reference_angle_a,
            reference_angle_b: def.reference_angle_b,
            ratio: def.ratio,
            constant: def.constant,
            jv_a: vec2(0.0, 0.0),
            jw_a: 0.0,
            jv_b: vec2(0.0, 0.0),
            jw_b: 0.0,
            mass: 0.0,
            impulse: 0.0,
        }
    }

    fn jacobian_and_coordinate(kind: &GearedJointKind, body: &SolverBody, local_anchor: Vec2, reference_angle: f32) -> (Vec2, f32, f32) {
        match *kind {
            GearedJointKind::Revolute => (vec2(0.0, 0.0), 1.0, body.a - reference_angle),
            GearedJointKind::Prismatic { local_axis } => {
                let axis = Rot::from_angle(body.a).rotate(local_axis);
                let r = Rot::from_angle(body.a).rotate(local_anchor - body.local_center);
                let jw = cross(r, axis);
                let coordinate = (body.c + r).dot(axis);
                (axis, jw, coordinate - reference_angle)
            }
        }
    }

    fn update_geometry(&mut self, a: &SolverBody, b: &SolverBody) -> (f32, f32) {
        let (jv_a, jw_a, coord_a) = Self::jacobian_and_coordinate(&self.kind_a, a, self.local_anchor_a, self.reference_angle_a);
        let (jv_b, jw_b, coord_b) = Self::jacobian_and_coordinate(&self.kind_b, b, self.local_anchor_b, self.reference_angle_b);
        self.jv_a = jv_a;
        self.jw_a = jw_a;
        self.jv_b = jv_b;
        self.jw_b = jw_b;
        (coord_a, coord_b)
    }

    pub fn init_velocity_constraints(&mut self, a: &SolverBody, b: &SolverBody) {
        self.update_geometry(a, b);

        let mass_a = a.inv_mass * self.jv_a.dot(self.jv_a) + a.inv_i * self.jw_a * self.jw_a;
        let mass_b = b.inv_mass * self.jv_b.dot(self.jv_b) + b.inv_i * self.jw_b * self.jw_b;
        let mass = mass_a + self.ratio * self.ratio * mass_b;
        self.mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
    }

    pub fn warm_start(&self, a: &mut SolverBody, b: &mut SolverBody) {
        let p_a = self.jv_a * self.impulse;
        let p_b = self.jv_b * (self.impulse * self.ratio);

        a.v += p_a * a.inv_mass;
        a.w += a.inv_i * self.impulse * self.jw_a;
        b.v += p_b * b.inv_mass;
        b.w += b.inv_i * self.impulse * self.ratio * self.jw_b;
    }

    pub fn solve_velocity_constraints(&mut self, a: &mut SolverBody, b: &mut SolverBody) {
        let cdot = self.jv_a.dot(a.v) + self.jw_a * a.w + self.ratio * (self.jv_b.dot(b.v) + self.jw_b * b.w);
        let impulse = -self.mass * cdot;
        self.impulse += impulse;

        let p_a = self.jv_a * impulse;
        let p_b = self.jv_b * (impulse * self.ratio);

        a.v += p_a * a.inv_mass;
        a.w += a.inv_i * impulse * self.jw_a;
        b.v += p_b * b.inv_mass;
        b.w += b.inv_i * impulse * self.ratio * self.jw_b;
    }

    pub fn solve_position_constraints(&self, a: &mut SolverBody, b: &mut SolverBody) -> bool {
        let mut clone = self.clone();
        let (coord_a, coord_b) = clone.update_geometry(a, b);
        let c = coord_a + clone.ratio * coord_b - clone.constant;

        let mass_a = a.inv_mass * clone.jv_a.dot(clone.jv_a) + a.inv_i * clone.jw_a * clone.jw_a;
        let mass_b = b.inv_mass * clone.jv_b.dot(clone.jv_b) + b.inv_i * clone.jw_b * clone.jw_b;
        let mass = mass_a + clone.ratio * clone.ratio * mass_b;
        let effective_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        let impulse = -effective_mass * c;

        let p_a = clone.jv_a * impulse;
        let p_b = clone.jv_b * (impulse * clone.ratio);

        a.c += p_a * a.inv_mass;
        a.a += a.inv_i * impulse * clone.jw_a;
        b.c += p_b * b.inv_mass;
        b.a += b.inv_i * impulse * clone.ratio * clone.jw_b;

        c.abs() < crate::settings::LINEAR_SLOP
    }

    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        (self.jv_a * self.impulse) * inv_dt
    }

    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        self.impulse * self.jw_a * inv_dt
    }
}
