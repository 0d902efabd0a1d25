//! Rigid body data model: type, sweep, velocity/acceleration, fixture list.

use crate::error::{PhysicsError, Result};
use crate::fixture::FixtureId;
use crate::math::{vec2, Rot, Sweep, Transform, Vec2};
use crate::shapes::MassData;
use slotmap::new_key_type;

new_key_type! {
    pub struct BodyId;
}

new_key_type! {
    pub struct JointId;
}

new_key_type! {
    pub struct ContactId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyType {
    Static,
    Kinematic,
    Dynamic,
}

impl BodyType {
    pub fn is_accelerable(self) -> bool {
        matches!(self, BodyType::Dynamic)
    }

    pub fn is_speedable(self) -> bool {
        !matches!(self, BodyType::Static)
    }
}

/// Construction parameters for [`crate::world::World::create_body`].
#[derive(Clone, Debug)]
pub struct BodyConf {
    pub body_type: BodyType,
    pub position: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub allow_sleep: bool,
    pub awake: bool,
    pub fixed_rotation: bool,
    pub bullet: bool,
    pub enabled: bool,
    pub gravity_scale: f32,
}

impl Default for BodyConf {
    fn default() -> Self {
        BodyConf {
            body_type: BodyType::Static,
            position: vec2(0.0, 0.0),
            angle: 0.0,
            linear_velocity: vec2(0.0, 0.0),
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            allow_sleep: true,
            awake: true,
            fixed_rotation: false,
            bullet: false,
            enabled: true,
            gravity_scale: 1.0,
        }
    }
}

/// A (other-body, contact) edge in a body's adjacency list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactEdge {
    pub other: BodyId,
    pub contact: ContactId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JointEdge {
    pub other: BodyId,
    pub joint: JointId,
}

/// A rigid body. Owns its fixtures; holds unordered edge lists to the
/// contacts and joints touching it.
#[derive(Clone, Debug)]
pub struct Body {
    pub body_type: BodyType,
    pub sweep: Sweep,
    pub transform: Transform,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub linear_acceleration: Vec2,
    pub angular_acceleration: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_scale: f32,
    pub mass: f32,
    pub inv_mass: f32,
    pub inertia: f32,
    pub inv_inertia: f32,
    pub fixtures: Vec<FixtureId>,
    pub contact_edges: Vec<ContactEdge>,
    pub joint_edges: Vec<JointEdge>,
    pub sleep_time: f32,
    pub awake: bool,
    pub enabled: bool,
    pub fixed_rotation: bool,
    pub bullet: bool,
    pub allow_sleep: bool,
    pub in_island: bool,
    pub mass_dirty: bool,
    pub user_data: u64,
}

impl Body {
    pub fn new(conf: &BodyConf) -> Self {
        let q = Rot::from_angle(conf.angle);
        let transform = Transform::new(conf.position, q);
        let sweep = Sweep {
            local_center: vec2(0.0, 0.0),
            c0: conf.position,
            c: conf.position,
            a0: conf.angle,
            a: conf.angle,
            alpha0: 0.0,
        };
        let speedable = conf.body_type.is_speedable();
        let accelerable = conf.body_type.is_accelerable();
        Body {
            body_type: conf.body_type,
            sweep,
            transform,
            linear_velocity: if speedable { conf.linear_velocity } else { vec2(0.0, 0.0) },
            angular_velocity: if speedable { conf.angular_velocity } else { 0.0 },
            linear_acceleration: vec2(0.0, 0.0),
            angular_acceleration: 0.0,
            linear_damping: conf.linear_damping,
            angular_damping: conf.angular_damping,
            gravity_scale: conf.gravity_scale,
            mass: if accelerable { 1.0 } else { 0.0 },
            inv_mass: if accelerable { 1.0 } else { 0.0 },
            inertia: 0.0,
            inv_inertia: 0.0,
            fixtures: Vec::new(),
            contact_edges: Vec::new(),
            joint_edges: Vec::new(),
            sleep_time: 0.0,
            awake: speedable && conf.awake,
            enabled: conf.enabled,
            fixed_rotation: conf.fixed_rotation,
            bullet: conf.bullet,
            allow_sleep: conf.allow_sleep,
            in_island: false,
            mass_dirty: true,
            user_data: 0,
        }
    }

    pub fn world_center(&self) -> Vec2 {
        self.sweep.c
    }

    pub fn local_center(&self) -> Vec2 {
        self.sweep.local_center
    }

    /// World point for a fixture-local point.
    pub fn world_point(&self, local: Vec2) -> Vec2 {
        self.transform.transform_point(local)
    }

    pub fn set_transform(&mut self, position: Vec2, angle: f32) {
        let q = Rot::from_angle(angle);
        self.transform = Transform::new(position, q);
        self.sweep.a0 = angle;
        self.sweep.a = angle;
        self.sweep.c0 = self.transform.transform_point(self.sweep.local_center);
        self.sweep.c = self.sweep.c0;
    }

    pub fn synchronize_transform(&mut self) {
        self.transform.q = Rot::from_angle(self.sweep.a);
        self.transform.p = self.sweep.c - self.transform.q.rotate(self.sweep.local_center);
    }

    pub fn set_awake(&mut self, awake: bool) {
        if !self.body_type.is_speedable() {
            return;
        }
        if awake {
            self.awake = true;
            self.sleep_time = 0.0;
        } else {
            self.awake = false;
            self.sleep_time = 0.0;
            self.linear_velocity = vec2(0.0, 0.0);
            self.angular_velocity = 0.0;
        }
    }

    pub fn should_collide(&self, other: &Body) -> bool {
        self.body_type.is_accelerable() || other.body_type.is_accelerable()
    }

    pub fn apply_force(&mut self, force: Vec2, point: Vec2, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if !self.awake {
            return;
        }
        self.linear_acceleration += force * self.inv_mass;
        self.angular_acceleration += crate::math::cross(point - self.sweep.c, force) * self.inv_inertia;
    }

    pub fn apply_force_to_center(&mut self, force: Vec2, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if !self.awake {
            return;
        }
        self.linear_acceleration += force * self.inv_mass;
    }

    pub fn apply_torque(&mut self, torque: f32, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if !self.awake {
            return;
        }
        self.angular_acceleration += torque * self.inv_inertia;
    }

    pub fn apply_linear_impulse(&mut self, impulse: Vec2, point: Vec2, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if !self.awake {
            return;
        }
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += crate::math::cross(point - self.sweep.c, impulse) * self.inv_inertia;
    }

    pub fn apply_angular_impulse(&mut self, impulse: f32, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if !self.awake {
            return;
        }
        self.angular_velocity += impulse * self.inv_inertia;
    }

    pub fn set_mass_data(&mut self, data: MassData) -> Result<()> {
        if !data.mass.is_finite() || data.mass < 0.0 || !data.inertia.is_finite() || data.inertia < 0.0 {
            return Err(PhysicsError::InvalidArgument("mass/inertia must be finite and non-negative"));
        }
        if self.body_type != BodyType::Dynamic {
            return Ok(());
        }
        self.mass = if data.mass > 0.0 { data.mass } else { 1.0 };
        self.inv_mass = 1.0 / self.mass;

        if data.inertia > 0.0 && !self.fixed_rotation {
            let local_inertia = data.inertia - self.mass * data.center.x.mul_add(data.center.x, data.center.y * data.center.y);
            debug_assert!(local_inertia >= 0.0);
            self.inertia = local_inertia;
            self.inv_inertia = 1.0 / local_inertia.max(f32::EPSILON);
        } else {
            self.inertia = 0.0;
            self.inv_inertia = 0.0;
        }

        let old_center = self.sweep.c;
        self.sweep.local_center = data.center;
        self.sweep.c0 = self.transform.transform_point(self.sweep.local_center);
        self.sweep.c = self.sweep.c0;
        self.linear_velocity += crate::math::cross_sv(self.angular_velocity, self.sweep.c - old_center);
        self.mass_dirty = false;
        Ok(())
    }
}
