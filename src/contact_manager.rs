//! Contact lifecycle: pair creation from broad-phase proxy moves, filtering,
//! and manifold updates with warm-start impulse carry-over.

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::body::{Body, BodyId, ContactEdge, ContactId};
use crate::broadphase::{DynamicTree, TreeProxyId};
use crate::collide;
use crate::contact::{Contact, ContactKey};
use crate::fixture::{mix_friction, mix_restitution, Fixture, FixtureId};
use crate::math::Transform;
use crate::settings::AABB_EXTENSION;
use crate::shapes::Aabb;

/// Per-step observer of contact lifecycle transitions; implemented by the
/// embedding application. All methods default to no-ops.
pub trait ContactListener {
    fn begin_contact(&mut self, _contact: ContactId) {}
    fn end_contact(&mut self, _contact: ContactId) {}
    fn pre_solve(&mut self, _contact: ContactId, _old_manifold: &collide::Manifold) {}
}

pub type ProxyUserData = (FixtureId, usize);

pub struct ContactManager {
    pub tree: DynamicTree<ProxyUserData>,
    pub contacts: SlotMap<ContactId, Contact>,
    index: HashMap<ContactKey, ContactId>,
    moved: Vec<TreeProxyId>,
}

impl Default for ContactManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactManager {
    pub fn new() -> Self {
        ContactManager {
            tree: DynamicTree::new(),
            contacts: SlotMap::with_key(),
            index: HashMap::new(),
            moved: Vec::new(),
        }
    }

    pub fn create_fixture_proxies(&mut self, fixture_id: FixtureId, fixture: &mut Fixture, xf: &Transform) {
        let child_count = fixture.shape.child_count();
        fixture.proxies.reserve(child_count);
        for child in 0..child_count {
            let aabb = fixture.shape.aabb(xf, child).extended(AABB_EXTENSION);
            let proxy = self.tree.create_proxy(aabb, (fixture_id, child));
            fixture.proxies.push(proxy);
            self.moved.push(proxy);
        }
    }

    pub fn destroy_fixture_proxies(&mut self, fixture: &mut Fixture) {
        for proxy in fixture.proxies.drain(..) {
            self.tree.destroy_proxy(proxy);
        }
    }

    /// Re-synchronizes every proxy of `fixture` against the body's current
    /// transform, queuing it for pair-finding if it moved.
    pub fn synchronize_fixture(&mut self, fixture: &Fixture, xf: &Transform, displacement: crate::math::Vec2) {
        for (child, &proxy) in fixture.proxies.iter().enumerate() {
            let aabb = fixture.shape.aabb(xf, child);
            if self.tree.move_proxy(proxy, aabb, displacement) {
                self.moved.push(proxy);
            }
        }
    }

    /// Destroys every contact touching `fixture_id` (called when the fixture
    /// itself is destroyed).
    pub fn destroy_contacts_for_fixture(&mut self, fixture_id: FixtureId, bodies: &mut SlotMap<BodyId, Body>) {
        let stale: Vec<ContactId> = self
            .contacts
            .iter()
            .filter(|(_, c)| c.fixture_a == fixture_id || c.fixture_b == fixture_id)
            .map(|(id, _)| id)
            .collect();
        for id in stale {
            self.destroy_contact(id, bodies);
        }
    }

    fn destroy_contact(&mut self, id: ContactId, bodies: &mut SlotMap<BodyId, Body>) {
        if let Some(contact) = self.contacts.remove(id) {
            self.index.remove(&contact.key());
            if let Some(body) = bodies.get_mut(contact.body_a) {
                body.contact_edges.retain(|e| e.contact != id);
            }
            if let Some(body) = bodies.get_mut(contact.body_b) {
                body.contact_edges.retain(|e| e.contact != id);
            }
        }
    }

    /// For every proxy that moved since the last call, queries the tree
    /// and creates a `Contact` for every new admissible unordered pair.
    pub fn find_new_contacts(
        &mut self,
        bodies: &mut SlotMap<BodyId, Body>,
        fixtures: &SlotMap<FixtureId, Fixture>,
        joint_forbids: &dyn Fn(BodyId, BodyId) -> bool,
    ) {
        let moved = std::mem::take(&mut self.moved);
        for proxy_a in &moved {
            let (fixture_a, child_a) = *self.tree.user_data(*proxy_a);
            let fat_aabb = self.tree.fat_aabb(*proxy_a);
            let mut candidates = Vec::new();
            self.tree.query(&fat_aabb, |proxy_b| {
                candidates.push(proxy_b);
                true
            });
            for proxy_b in candidates {
                if proxy_b == *proxy_a {
                    continue;
                }
                let (fixture_b, child_b) = *self.tree.user_data(proxy_b);
                self.try_create_contact(fixture_a, child_a, fixture_b, child_b, bodies, fixtures, joint_forbids);
            }
        }
    }

    fn try_create_contact(
        &mut self,
        mut fixture_a: FixtureId,
        mut child_a: usize,
        mut fixture_b: FixtureId,
        mut child_b: usize,
        bodies: &mut SlotMap<BodyId, Body>,
        fixtures: &SlotMap<FixtureId, Fixture>,
        joint_forbids: &dyn Fn(BodyId, BodyId) -> bool,
    ) {
        let fa = &fixtures[fixture_a];
        let fb = &fixtures[fixture_b];
        if fa.body == fb.body {
            return;
        }
        // Canonicalize key ordering so (a, b) and (b, a) share one contact.
        if fixture_b < fixture_a || (fixture_a == fixture_b && child_b < child_a) {
            std::mem::swap(&mut fixture_a, &mut fixture_b);
            std::mem::swap(&mut child_a, &mut child_b);
        }
        let key = ContactKey::new(fixture_a, child_a, fixture_b, child_b);
        if self.index.contains_key(&key) {
            return;
        }
        let fa = &fixtures[fixture_a];
        let fb = &fixtures[fixture_b];
        let body_a = fa.body;
        let body_b = fb.body;
        {
            let ba = &bodies[body_a];
            let bb = &bodies[body_b];
            if !ba.should_collide(bb) {
                return;
            }
            if joint_forbids(body_a, body_b) {
                return;
            }
        }
        if !fa.filter.should_collide(&fb.filter) {
            return;
        }

        let is_sensor = fa.is_sensor || fb.is_sensor;
        let friction = mix_friction(fa.friction, fb.friction);
        let restitution = mix_restitution(fa.restitution, fb.restitution);
        let contact = Contact::new(fixture_a, child_a, fixture_b, child_b, body_a, body_b, is_sensor, friction, restitution);
        let id = self.contacts.insert(contact);
        self.index.insert(key, id);
        bodies[body_a].contact_edges.push(ContactEdge { other: body_b, contact: id });
        bodies[body_b].contact_edges.push(ContactEdge { other: body_a, contact: id });
    }

    /// Filters and destroys stale pairs, then recomputes manifolds for the
    /// rest, preserving warm-start impulses by feature id and firing
    /// listener callbacks.
    pub fn update_contacts(
        &mut self,
        bodies: &mut SlotMap<BodyId, Body>,
        fixtures: &SlotMap<FixtureId, Fixture>,
        joint_forbids: &dyn Fn(BodyId, BodyId) -> bool,
        listener: Option<&mut dyn ContactListener>,
    ) {
        let ids: Vec<ContactId> = self.contacts.keys().collect();
        let mut listener = listener;
        for id in ids {
            let should_destroy = {
                let contact = &self.contacts[id];
                let fa = &fixtures[contact.fixture_a];
                let fb = &fixtures[contact.fixture_b];
                let ba = &bodies[contact.body_a];
                let bb = &bodies[contact.body_b];
                let overlap = self
                    .tree
                    .fat_aabb(fa.proxies[contact.child_a])
                    .overlaps(&self.tree.fat_aabb(fb.proxies[contact.child_b]));
                !overlap
                    || !fa.filter.should_collide(&fb.filter)
                    || !ba.should_collide(bb)
                    || joint_forbids(contact.body_a, contact.body_b)
            };
            if should_destroy {
                self.destroy_contact(id, bodies);
                continue;
            }

            let (both_awake, xf_a, xf_b) = {
                let contact = &self.contacts[id];
                let ba = &bodies[contact.body_a];
                let bb = &bodies[contact.body_b];
                (ba.awake || bb.awake, ba.transform, bb.transform)
            };
            if !both_awake {
                continue;
            }

            let old_manifold = self.contacts[id].manifold.clone();
            let fa = &fixtures[self.contacts[id].fixture_a];
            let fb = &fixtures[self.contacts[id].fixture_b];
            let is_sensor = self.contacts[id].is_sensor;
            let child_a = self.contacts[id].child_a;
            let child_b = self.contacts[id].child_b;
            let shape_a = fa.shape.child_shape(child_a);
            let shape_b = fb.shape.child_shape(child_b);

            let new_manifold = if is_sensor {
                collide::Manifold::unset()
            } else {
                collide::collide(&shape_a, &xf_a, &shape_b, &xf_b)
            };

            let new_touching = if is_sensor {
                let proxy_a = shape_a.distance_proxy(0);
                let proxy_b = shape_b.distance_proxy(0);
                let mut cache = self.contacts[id].simplex_cache;
                let out = crate::distance::distance(
                    &mut cache,
                    &proxy_a,
                    &xf_a,
                    &proxy_b,
                    &xf_b,
                    crate::distance::DistanceInput { use_radii: true },
                );
                self.contacts[id].simplex_cache = cache;
                out.distance < 10.0 * f32::EPSILON
            } else {
                new_manifold.point_count() > 0
            };

            let mut merged = new_manifold;
            carry_warm_start(&old_manifold, &mut merged);

            let was_touching = self.contacts[id].touching;
            self.contacts[id].manifold = merged;
            self.contacts[id].touching = new_touching;

            if let Some(listener) = listener.as_deref_mut() {
                if new_touching && !was_touching {
                    listener.begin_contact(id);
                } else if !new_touching && was_touching {
                    listener.end_contact(id);
                }
                if new_touching && !is_sensor {
                    listener.pre_solve(id, &old_manifold);
                }
            }
        }
    }
}

/// Keeps a manifold point's accumulated impulses when its `ContactFeature`
/// id matches a point that existed in the previous manifold; fresh points
/// start at zero.
fn carry_warm_start(old: &collide::Manifold, new: &mut collide::Manifold) {
    for np in new.points.iter_mut() {
        for op in old.points.iter() {
            if np.id == op.id {
                np.normal_impulse = op.normal_impulse;
                np.tangent_impulse = op.tangent_impulse;
                break;
            }
        }
    }
}
