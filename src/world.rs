//! Owns bodies, fixtures, joints, and contacts, and drives the per-step
//! pipeline: pair update, island-based discrete solve, then continuous
//! collision for fast bodies.

use std::collections::HashSet;

use slotmap::SlotMap;

use crate::body::{Body, BodyConf, BodyId, BodyType, ContactId, JointEdge, JointId};
use crate::broadphase::RayCastInput;
use crate::contact::Contact;
use crate::contact_manager::{ContactListener, ContactManager};
use crate::error::{PhysicsError, Result};
use crate::fixture::{Fixture, FixtureConf, FixtureId};
use crate::island;
use crate::joints::Joint;
use crate::math::Vec2;
use crate::settings::{Settings, MAX_SUB_STEPS, TARGET_SEPARATION_SLOP_FACTOR, LINEAR_SLOP};
use crate::shapes::Aabb;
use crate::solver;
use crate::solver::position_constraint::{solve_position_constraint, transform_of};
use crate::solver::velocity_constraint::{init_velocity_constraint, solve_velocity_constraint, SolverBody};
use crate::stats::StepStats;
use crate::toi::{time_of_impact, ToiState};

pub struct World {
    pub bodies: SlotMap<BodyId, Body>,
    pub fixtures: SlotMap<FixtureId, Fixture>,
    pub joints: SlotMap<JointId, Joint>,
    contact_manager: ContactManager,
    pub gravity: Vec2,
    pub settings: Settings,
    locked: bool,
}

impl World {
    pub fn new(gravity: Vec2) -> Self {
        World {
            bodies: SlotMap::with_key(),
            fixtures: SlotMap::with_key(),
            joints: SlotMap::with_key(),
            contact_manager: ContactManager::new(),
            gravity,
            settings: Settings::default(),
            locked: false,
        }
    }

    fn check_unlocked(&self) -> Result<()> {
        if self.locked {
            return Err(PhysicsError::LockedWorld);
        }
        Ok(())
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub fn set_allow_sleeping(&mut self, allow: bool) {
        self.settings.allow_sleep = allow;
    }

    pub fn set_warm_starting(&mut self, enabled: bool) {
        self.settings.warm_starting = enabled;
    }

    pub fn set_continuous(&mut self, enabled: bool) {
        self.settings.continuous_physics = enabled;
    }

    pub fn set_sub_stepping(&mut self, enabled: bool) {
        self.settings.sub_stepping = enabled;
    }

    pub fn create_body(&mut self, conf: &BodyConf) -> Result<BodyId> {
        self.check_unlocked()?;
        if self.bodies.len() >= self.settings.max_bodies {
            return Err(PhysicsError::CapacityExceeded("max_bodies"));
        }
        Ok(self.bodies.insert(Body::new(conf)))
    }

    pub fn destroy_body(&mut self, id: BodyId) -> Result<()> {
        self.check_unlocked()?;
        let Some(body) = self.bodies.get(id) else {
            return Err(PhysicsError::StaleHandle("body"));
        };

        let joint_ids: Vec<JointId> = body.joint_edges.iter().map(|e| e.joint).collect();
        for jid in joint_ids {
            self.destroy_joint(jid)?;
        }

        let fixture_ids: Vec<FixtureId> = self.bodies[id].fixtures.clone();
        for fid in fixture_ids {
            self.destroy_fixture_inner(fid);
        }

        self.bodies.remove(id);
        Ok(())
    }

    pub fn create_fixture(&mut self, body_id: BodyId, conf: &FixtureConf) -> Result<FixtureId> {
        self.check_unlocked()?;
        if !self.bodies.contains_key(body_id) {
            return Err(PhysicsError::StaleHandle("body"));
        }
        let fixture = Fixture::new(body_id, conf)?;
        let xf = self.bodies[body_id].transform;
        let fixture_id = self.fixtures.insert(fixture);
        self.contact_manager.create_fixture_proxies(fixture_id, &mut self.fixtures[fixture_id], &xf);
        self.bodies[body_id].fixtures.push(fixture_id);
        self.bodies[body_id].mass_dirty = true;
        self.reset_mass_data(body_id);
        Ok(fixture_id)
    }

    pub fn destroy_fixture(&mut self, fixture_id: FixtureId) -> Result<()> {
        self.check_unlocked()?;
        if !self.fixtures.contains_key(fixture_id) {
            return Err(PhysicsError::StaleHandle("fixture"));
        }
        let body_id = self.fixtures[fixture_id].body;
        self.destroy_fixture_inner(fixture_id);
        self.reset_mass_data(body_id);
        Ok(())
    }

    fn destroy_fixture_inner(&mut self, fixture_id: FixtureId) {
        self.contact_manager.destroy_contacts_for_fixture(fixture_id, &mut self.bodies);
        if let Some(mut fixture) = self.fixtures.remove(fixture_id) {
            self.contact_manager.destroy_fixture_proxies(&mut fixture);
            if let Some(body) = self.bodies.get_mut(fixture.body) {
                body.fixtures.retain(|&f| f != fixture_id);
            }
        }
    }

    /// Recomputes a body's mass, inverse mass, inertia, and center of mass
    /// from its current fixtures' shapes and densities.
    pub fn reset_mass_data(&mut self, body_id: BodyId) {
        let Some(body) = self.bodies.get(body_id) else { return };
        if body.body_type != BodyType::Dynamic {
            return;
        }
        let fixture_ids = body.fixtures.clone();

        let mut mass = 0.0f32;
        let mut center = Vec2::new(0.0, 0.0);
        let mut inertia = 0.0f32;
        for fid in &fixture_ids {
            let f = &self.fixtures[*fid];
            if f.density == 0.0 {
                continue;
            }
            let md = f.shape.mass_data(f.density);
            mass += md.mass;
            center += md.center * md.mass;
            inertia += md.inertia;
        }

        if mass > 0.0 {
            center *= 1.0 / mass;
        } else {
            mass = 1.0;
        }

        let data = crate::shapes::MassData { mass, center, inertia };
        let _ = self.bodies[body_id].set_mass_data(data);
    }

    pub fn create_joint(&mut self, joint: Joint) -> Result<JointId> {
        self.check_unlocked()?;
        if self.joints.len() >= self.settings.max_joints {
            return Err(PhysicsError::CapacityExceeded("max_joints"));
        }
        if !self.bodies.contains_key(joint.body_a) || !self.bodies.contains_key(joint.body_b) {
            return Err(PhysicsError::StaleHandle("body"));
        }
        let body_a = joint.body_a;
        let body_b = joint.body_b;
        let id = self.joints.insert(joint);
        self.bodies[body_a].joint_edges.push(JointEdge { other: body_b, joint: id });
        self.bodies[body_b].joint_edges.push(JointEdge { other: body_a, joint: id });
        Ok(id)
    }

    pub fn destroy_joint(&mut self, id: JointId) -> Result<()> {
        self.check_unlocked()?;
        let Some(joint) = self.joints.remove(id) else {
            return Err(PhysicsError::StaleHandle("joint"));
        };
        if let Some(body) = self.bodies.get_mut(joint.body_a) {
            body.joint_edges.retain(|e| e.joint != id);
        }
        if let Some(body) = self.bodies.get_mut(joint.body_b) {
            body.joint_edges.retain(|e| e.joint != id);
        }
        Ok(())
    }

    /// Unordered body pairs that a non-colliding joint forbids from
    /// generating contacts, computed once per step so the pair-update pass
    /// doesn't need to borrow `self.joints` while `self.bodies` is also
    /// borrowed mutably.
    fn forbidden_pairs(&self) -> HashSet<(BodyId, BodyId)> {
        let mut forbidden = HashSet::new();
        for (_, j) in self.joints.iter() {
            if !j.collide_connected {
                forbidden.insert((j.body_a, j.body_b));
                forbidden.insert((j.body_b, j.body_a));
            }
        }
        forbidden
    }

    pub fn query_aabb<F: FnMut(FixtureId, usize) -> bool>(&self, aabb: &Aabb, mut visitor: F) {
        self.contact_manager.tree.query(aabb, |proxy| {
            let (fixture_id, child) = *self.contact_manager.tree.user_data(proxy);
            visitor(fixture_id, child)
        });
    }

    pub fn ray_cast<F: FnMut(FixtureId, usize, &RayCastInput) -> f32>(&self, p1: Vec2, p2: Vec2, mut visitor: F) {
        let input = RayCastInput { p1, p2, max_fraction: 1.0 };
        self.contact_manager.tree.ray_cast(&input, |proxy, input| {
            let (fixture_id, child) = *self.contact_manager.tree.user_data(proxy);
            visitor(fixture_id, child, input)
        });
    }

    pub fn proxy_count(&self) -> usize {
        self.contact_manager.tree.proxy_count()
    }

    pub fn tree_height(&self) -> i32 {
        self.contact_manager.tree.height()
    }

    pub fn tree_area_ratio(&self) -> f32 {
        self.contact_manager.tree.area_ratio()
    }

    pub fn contacts(&self) -> &SlotMap<ContactId, Contact> {
        &self.contact_manager.contacts
    }

    /// Advances the simulation by `dt`, running the full pair-update,
    /// island-solve, sleep, and continuous-collision pipeline. Rejects
    /// reentrant calls from inside a listener callback.
    pub fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32, listener: Option<&mut dyn ContactListener>) -> StepStats {
        self.step_with_settings(dt, velocity_iterations, position_iterations, listener)
    }

    fn step_with_settings(
        &mut self,
        dt: f32,
        velocity_iterations: u32,
        position_iterations: u32,
        listener: Option<&mut dyn ContactListener>,
    ) -> StepStats {
        let mut stats = StepStats::new();
        self.settings.velocity_iterations = velocity_iterations;
        self.settings.position_iterations = position_iterations;

        self.locked = true;

        for (_, fixture) in self.fixtures.iter() {
            let body = &self.bodies[fixture.body];
            self.contact_manager.synchronize_fixture(fixture, &body.transform, Vec2::new(0.0, 0.0));
        }
        let forbidden = self.forbidden_pairs();
        let joint_forbids = |a: BodyId, b: BodyId| forbidden.contains(&(a, b));
        let contacts_before = self.contact_manager.contacts.len();
        self.contact_manager.find_new_contacts(&mut self.bodies, &self.fixtures, &joint_forbids);
        stats.contacts_added = (self.contact_manager.contacts.len() - contacts_before) as u32;
        let before_update = self.contact_manager.contacts.len();
        self.contact_manager.update_contacts(&mut self.bodies, &self.fixtures, &joint_forbids, listener);
        stats.contacts_destroyed = (before_update - self.contact_manager.contacts.len()) as u32;
        stats.contacts_updated = self.contact_manager.contacts.len() as u32;
        log::trace!(target: "rigid2d::world", "pair update: +{} contacts, -{} contacts, {} live", stats.contacts_added, stats.contacts_destroyed, stats.contacts_updated);

        if dt > 0.0 {
            let islands = island::build_islands(&mut self.bodies, &mut self.contact_manager.contacts, &mut self.joints);
            stats.islands_found = islands.len() as u32;
            log::debug!(target: "rigid2d::world", "solving {} islands", islands.len());
            let awake_before = self.bodies.values().filter(|b| b.awake).count();
            for isl in &islands {
                solver::solve_island(
                    isl,
                    &mut self.bodies,
                    &self.fixtures,
                    &mut self.contact_manager.contacts,
                    &mut self.joints,
                    self.gravity,
                    dt,
                    &self.settings,
                );
                stats.islands_solved += 1;
                stats.velocity_iterations_sum += velocity_iterations * isl.contacts.len() as u32;
                stats.position_iterations_sum += position_iterations * isl.contacts.len() as u32;
            }

            let awake_after = self.bodies.values().filter(|b| b.awake).count();
            stats.bodies_slept = awake_before.saturating_sub(awake_after) as u32;
            if stats.bodies_slept > 0 {
                log::trace!(target: "rigid2d::world", "{} bodies fell asleep", stats.bodies_slept);
            }

            for (_, fixture) in self.fixtures.iter() {
                let body = &self.bodies[fixture.body];
                self.contact_manager.synchronize_fixture(fixture, &body.transform, Vec2::new(0.0, 0.0));
            }

            if self.settings.continuous_physics {
                self.solve_toi(dt, &mut stats);
            }
        }

        self.locked = false;
        stats
    }

    /// Continuous collision pass: repeatedly finds the contact with the
    /// smallest time of impact among pairs where at least one body is a
    /// bullet (or either body was involved in a previous sub-step), rewinds
    /// both sweeps to just before contact, and resolves that single contact
    /// so a fast body cannot tunnel through thin geometry within this step.
    fn solve_toi(&mut self, _dt: f32, stats: &mut StepStats) {
        for _ in 0..MAX_SUB_STEPS {
            let mut min_toi = 1.0f32;
            let mut min_contact: Option<ContactId> = None;

            for (id, contact) in self.contact_manager.contacts.iter() {
                if !contact.enabled || contact.is_sensor {
                    continue;
                }
                let ba = &self.bodies[contact.body_a];
                let bb = &self.bodies[contact.body_b];
                if !ba.bullet && !bb.bullet {
                    continue;
                }
                if !ba.body_type.is_accelerable() && !bb.body_type.is_accelerable() {
                    continue;
                }
                if contact.toi_count >= crate::settings::MAX_SUB_STEPS {
                    stats.toi_contacts_at_max_substeps += 1;
                    continue;
                }

                let fa = &self.fixtures[contact.fixture_a];
                let fb = &self.fixtures[contact.fixture_b];
                let proxy_a = fa.shape.distance_proxy(contact.child_a);
                let proxy_b = fb.shape.distance_proxy(contact.child_b);

                let alpha0 = ba.sweep.alpha0.max(bb.sweep.alpha0);
                let target = TARGET_SEPARATION_SLOP_FACTOR * LINEAR_SLOP;
                let output = time_of_impact(&proxy_a, &ba.sweep, &proxy_b, &bb.sweep, target, LINEAR_SLOP * 0.25);
                stats.toi_contacts_found += 1;

                let alpha = match output.state {
                    ToiState::Touching => output.t.clamp(alpha0, 1.0),
                    _ => continue,
                };

                if alpha < min_toi {
                    min_toi = alpha;
                    min_contact = Some(id);
                }
            }

            let Some(contact_id) = min_contact else { break };
            let (body_a, body_b) = {
                let c = &self.contact_manager.contacts[contact_id];
                (c.body_a, c.body_b)
            };

            {
                let sweep_a = self.bodies[body_a].sweep;
                let sweep_b = self.bodies[body_b].sweep;
                if sweep_a.alpha0 < min_toi {
                    let mut s = sweep_a;
                    s.advance(min_toi);
                    self.bodies[body_a].sweep = s;
                    self.bodies[body_a].synchronize_transform();
                }
                if sweep_b.alpha0 < min_toi {
                    let mut s = sweep_b;
                    s.advance(min_toi);
                    self.bodies[body_b].sweep = s;
                    self.bodies[body_b].synchronize_transform();
                }
            }

            {
                let contact = &self.contact_manager.contacts[contact_id];
                let fa = &self.fixtures[contact.fixture_a];
                let fb = &self.fixtures[contact.fixture_b];
                let shape_a = fa.shape.child_shape(contact.child_a);
                let shape_b = fb.shape.child_shape(contact.child_b);
                let xf_a = self.bodies[body_a].transform;
                let xf_b = self.bodies[body_b].transform;
                let new_manifold = crate::collide::collide(&shape_a, &xf_a, &shape_b, &xf_b);
                self.contact_manager.contacts[contact_id].manifold = new_manifold;
                self.contact_manager.contacts[contact_id].touching =
                    self.contact_manager.contacts[contact_id].manifold.point_count() > 0;
            }
            self.contact_manager.contacts[contact_id].toi_count += 1;

            self.solve_toi_island(body_a, body_b, contact_id, stats);

            if self.settings.sub_stepping {
                break;
            }
        }
        if stats.toi_contacts_at_max_substeps > 0 {
            log::warn!(
                target: "rigid2d::world",
                "{} contacts hit the TOI substep cap this step",
                stats.toi_contacts_at_max_substeps
            );
        }
    }

    /// Resolves a single TOI contact: a miniature two-body island using the
    /// regular contact velocity/position constraint solvers, holding every
    /// other body fixed (zero inverse mass) so only the two TOI bodies move.
    fn solve_toi_island(&mut self, body_a: BodyId, body_b: BodyId, contact_id: ContactId, stats: &mut StepStats) {
        let fa = self.contact_manager.contacts[contact_id].fixture_a;
        let fb = self.contact_manager.contacts[contact_id].fixture_b;
        let radius_a = self.fixtures[fa].shape.radius();
        let radius_b = self.fixtures[fb].shape.radius();
        let friction = self.contact_manager.contacts[contact_id].friction;
        let restitution = self.contact_manager.contacts[contact_id].restitution;
        let tangent_speed = self.contact_manager.contacts[contact_id].tangent_speed;

        let ba = &self.bodies[body_a];
        let bb = &self.bodies[body_b];
        let mut sb_a = SolverBody {
            c: ba.sweep.c,
            a: ba.sweep.a,
            v: ba.linear_velocity,
            w: ba.angular_velocity,
            local_center: ba.sweep.local_center,
            inv_mass: if ba.body_type.is_accelerable() { ba.inv_mass } else { 0.0 },
            inv_i: if ba.body_type.is_accelerable() { ba.inv_inertia } else { 0.0 },
        };
        let mut sb_b = SolverBody {
            c: bb.sweep.c,
            a: bb.sweep.a,
            v: bb.linear_velocity,
            w: bb.angular_velocity,
            local_center: bb.sweep.local_center,
            inv_mass: if bb.body_type.is_accelerable() { bb.inv_mass } else { 0.0 },
            inv_i: if bb.body_type.is_accelerable() { bb.inv_inertia } else { 0.0 },
        };

        let manifold = self.contact_manager.contacts[contact_id].manifold.clone();
        if manifold.point_count() == 0 {
            return;
        }

        for _ in 0..4 {
            let min_sep = solve_position_constraint(&manifold, radius_a, radius_b, &mut sb_a, &mut sb_b);
            stats.min_separation = stats.min_separation.min(min_sep);
            if min_sep >= -1.5 * LINEAR_SLOP {
                break;
            }
        }

        let xf_a = transform_of(&sb_a);
        let xf_b = transform_of(&sb_b);
        let mut vc = init_velocity_constraint(
            &manifold, &xf_a, radius_a, &xf_b, radius_b, 0, 1, &sb_a, &sb_b, friction, restitution, tangent_speed,
        );
        for _ in 0..self.settings.velocity_iterations {
            solve_velocity_constraint(&mut vc, &mut sb_a, &mut sb_b);
        }

        self.bodies[body_a].sweep.c = sb_a.c;
        self.bodies[body_a].sweep.a = sb_a.a;
        self.bodies[body_a].linear_velocity = sb_a.v;
        self.bodies[body_a].angular_velocity = sb_a.w;
        self.bodies[body_a].synchronize_transform();

        self.bodies[body_b].sweep.c = sb_b.c;
        self.bodies[body_b].sweep.a = sb_b.a;
        self.bodies[body_b].linear_velocity = sb_b.v;
        self.bodies[body_b].angular_velocity = sb_b.w;
        self.bodies[body_b].synchronize_transform();
    }
}
