//! Builds simulation islands by flood-filling the contact/joint adjacency
//! graph outward from each awake, accelerable body, so the solver can step
//! disconnected clusters independently and sleep them as a unit.

use std::collections::HashSet;

use slotmap::SlotMap;

use crate::body::{Body, BodyId, ContactId, JointId};
use crate::contact::Contact;
use crate::joints::Joint;

pub struct Island {
    pub bodies: Vec<BodyId>,
    pub contacts: Vec<ContactId>,
    pub joints: Vec<JointId>,
}

/// Flood-fills from every not-yet-islanded awake dynamic/kinematic body,
/// crossing a contact edge only if the contact is touching, enabled, and
/// not a sensor, and crossing every joint edge regardless of touching
/// state. A static body is appended to whichever island(s) reach it but
/// never propagates the walk and never claims the global `in_island` flag,
/// since it has no velocity to couple and may legitimately border many
/// disjoint islands at once, mirroring `b2Island`'s seed-body traversal.
pub fn build_islands(
    bodies: &mut SlotMap<BodyId, Body>,
    contacts: &mut SlotMap<ContactId, Contact>,
    joints: &mut SlotMap<JointId, Joint>,
) -> Vec<Island> {
    for (_, body) in bodies.iter_mut() {
        body.in_island = false;
    }
    for (_, contact) in contacts.iter_mut() {
        contact.in_island = false;
    }
    for (_, joint) in joints.iter_mut() {
        joint.in_island = false;
    }

    let seeds: Vec<BodyId> = bodies
        .iter()
        .filter(|(_, b)| b.enabled && b.awake && b.body_type.is_speedable())
        .map(|(id, _)| id)
        .collect();

    let mut islands = Vec::new();

    for seed in seeds {
        if bodies[seed].in_island {
            continue;
        }

        let mut island = Island {
            bodies: Vec::new(),
            contacts: Vec::new(),
            joints: Vec::new(),
        };
        let mut static_in_island: HashSet<BodyId> = HashSet::new();
        let mut stack = vec![seed];
        bodies[seed].in_island = true;

        while let Some(body_id) = stack.pop() {
            island.bodies.push(body_id);

            let contact_edges = bodies[body_id].contact_edges.clone();
            for edge in contact_edges {
                let contact = &contacts[edge.contact];
                if contact.in_island || !contact.touching || !contact.enabled || contact.is_sensor {
                    continue;
                }
                island.contacts.push(edge.contact);
                contacts[edge.contact].in_island = true;
                push_other(bodies, &mut island, &mut static_in_island, &mut stack, edge.other);
            }

            let joint_edges = bodies[body_id].joint_edges.clone();
            for edge in joint_edges {
                let joint = &joints[edge.joint];
                if joint.in_island {
                    continue;
                }
                island.joints.push(edge.joint);
                joints[edge.joint].in_island = true;
                push_other(bodies, &mut island, &mut static_in_island, &mut stack, edge.other);
            }
        }

        islands.push(island);
    }

    islands
}

fn push_other(
    bodies: &mut SlotMap<BodyId, Body>,
    island: &mut Island,
    static_in_island: &mut HashSet<BodyId>,
    stack: &mut Vec<BodyId>,
    other: BodyId,
) {
    if !bodies[other].enabled {
        return;
    }
    if !bodies[other].body_type.is_speedable() {
        if static_in_island.insert(other) {
            island.bodies.push(other);
        }
        return;
    }
    if !bodies[other].in_island {
        bodies[other].in_island = true;
        stack.push(other);
    }
}
