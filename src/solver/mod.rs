//! Per-island step orchestration: integrate accelerations into velocities,
//! warm-start and iterate joint/contact velocity constraints, integrate
//! velocities into positions, run the NGS position pass, write the results
//! back to the bodies, and update the island's sleep state.

pub mod position_constraint;
pub mod velocity_constraint;

use std::collections::HashMap;

use cgmath::InnerSpace;
use slotmap::SlotMap;

use crate::body::{Body, BodyId, ContactId, JointId};
use crate::contact::Contact;
use crate::fixture::{Fixture, FixtureId};
use crate::island::Island;
use crate::joints::Joint;
use crate::math::{vec2, Vec2};
use crate::settings::{
    Settings, ANGULAR_SLEEP_TOLERANCE, LINEAR_SLEEP_TOLERANCE, MAX_ROTATION, MAX_TRANSLATION, MIN_STILL_TIME_TO_SLEEP,
};

use position_constraint::{solve_position_constraint, transform_of};
use velocity_constraint::{init_velocity_constraint, solve_velocity_constraint, warm_start, ContactVelocityConstraint, SolverBody};

fn two_mut(bodies: &mut [SolverBody], i: usize, j: usize) -> (&mut SolverBody, &mut SolverBody) {
    assert_ne!(i, j, "a constraint cannot couple a body to itself");
    if i < j {
        let (left, right) = bodies.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = bodies.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

struct IslandContact {
    id: ContactId,
    index_a: usize,
    index_b: usize,
    radius_a: f32,
    radius_b: f32,
}

/// Solves one island for one step. Returns whether the island's bodies
/// should be put to sleep after this step.
#[allow(clippy::too_many_arguments)]
pub fn solve_island(
    island: &Island,
    bodies: &mut SlotMap<BodyId, Body>,
    fixtures: &SlotMap<FixtureId, Fixture>,
    contacts: &mut SlotMap<ContactId, Contact>,
    joints: &mut SlotMap<JointId, Joint>,
    gravity: Vec2,
    dt: f32,
    settings: &Settings,
) {
    if dt <= 0.0 {
        return;
    }

    let index_of: HashMap<BodyId, usize> = island.bodies.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    let mut solver_bodies: Vec<SolverBody> = island
        .bodies
        .iter()
        .map(|&id| {
            let b = &bodies[id];
            SolverBody {
                c: b.sweep.c,
                a: b.sweep.a,
                v: b.linear_velocity,
                w: b.angular_velocity,
                local_center: b.sweep.local_center,
                inv_mass: b.inv_mass,
                inv_i: b.inv_inertia,
            }
        })
        .collect();

    // Integrate forces into velocities, with simple linear/angular damping.
    for (i, &id) in island.bodies.iter().enumerate() {
        let body = &mut bodies[id];
        if body.body_type != crate::body::BodyType::Dynamic {
            continue;
        }
        let sb = &mut solver_bodies[i];
        sb.v += (gravity * body.gravity_scale + body.linear_acceleration) * dt;
        sb.w += body.angular_acceleration * dt;
        sb.v *= 1.0 / (1.0 + dt * body.linear_damping);
        sb.w *= 1.0 / (1.0 + dt * body.angular_damping);
        body.linear_acceleration = vec2(0.0, 0.0);
        body.angular_acceleration = 0.0;
    }

    let mut island_contacts: Vec<IslandContact> = Vec::with_capacity(island.contacts.len());
    let mut vcs: Vec<ContactVelocityConstraint> = Vec::with_capacity(island.contacts.len());

    for &contact_id in &island.contacts {
        let contact = &contacts[contact_id];
        let index_a = index_of[&contact.body_a];
        let index_b = index_of[&contact.body_b];
        let fa = &fixtures[contact.fixture_a];
        let fb = &fixtures[contact.fixture_b];
        let radius_a = fa.shape.radius();
        let radius_b = fb.shape.radius();
        let xf_a = transform_of(&solver_bodies[index_a]);
        let xf_b = transform_of(&solver_bodies[index_b]);

        let vc = init_velocity_constraint(
            &contact.manifold,
            &xf_a,
            radius_a,
            &xf_b,
            radius_b,
            index_a,
            index_b,
            &solver_bodies[index_a],
            &solver_bodies[index_b],
            contact.friction,
            contact.restitution,
            contact.tangent_speed,
        );
        vcs.push(vc);
        island_contacts.push(IslandContact { id: contact_id, index_a, index_b, radius_a, radius_b });
    }

    // Warm-start: joints first, then contacts, matching the order they are
    // solved in during the velocity-iteration loop below.
    if settings.warm_starting {
        for &joint_id in &island.joints {
            let joint = &mut joints[joint_id];
            let (ia, ib) = (index_of[&joint.body_a], index_of[&joint.body_b]);
            let (a, b) = two_mut(&mut solver_bodies, ia, ib);
            joint.init_velocity_constraints(a, b, dt);
            joint.warm_start(a, b);
        }
        for vc in &vcs {
            let (a, b) = two_mut(&mut solver_bodies, vc.index_a, vc.index_b);
            warm_start(vc, a, b);
        }
    } else {
        for &joint_id in &island.joints {
            let joint = &mut joints[joint_id];
            let (ia, ib) = (index_of[&joint.body_a], index_of[&joint.body_b]);
            let (a, b) = two_mut(&mut solver_bodies, ia, ib);
            joint.init_velocity_constraints(a, b, dt);
        }
        for vc in vcs.iter_mut() {
            for p in vc.points.iter_mut() {
                p.normal_impulse = 0.0;
                p.tangent_impulse = 0.0;
            }
        }
    }

    for _ in 0..settings.velocity_iterations {
        for &joint_id in &island.joints {
            let joint = &mut joints[joint_id];
            let (ia, ib) = (index_of[&joint.body_a], index_of[&joint.body_b]);
            let (a, b) = two_mut(&mut solver_bodies, ia, ib);
            joint.solve_velocity_constraints(a, b, dt);
        }
        for vc in vcs.iter_mut() {
            let (a, b) = two_mut(&mut solver_bodies, vc.index_a, vc.index_b);
            solve_velocity_constraint(vc, a, b);
        }
    }

    // Integrate velocities into positions, clamping per-step translation
    // and rotation so a single step cannot tunnel a fast body clean through
    // ordinary (non-continuous) geometry.
    for sb in solver_bodies.iter_mut() {
        let mut translation = sb.v * dt;
        if translation.dot(translation) > MAX_TRANSLATION * MAX_TRANSLATION {
            let ratio = MAX_TRANSLATION / translation.magnitude().max(1e-9);
            sb.v *= ratio;
            translation = sb.v * dt;
        }
        let mut rotation = sb.w * dt;
        if rotation * rotation > MAX_ROTATION * MAX_ROTATION {
            let ratio = MAX_ROTATION / rotation.abs().max(1e-9);
            sb.w *= ratio;
            rotation = sb.w * dt;
        }
        sb.c += translation;
        sb.a += rotation;
    }

    for _ in 0..settings.position_iterations {
        let mut all_ok = true;

        for &joint_id in &island.joints {
            let joint = &joints[joint_id];
            let (ia, ib) = (index_of[&joint.body_a], index_of[&joint.body_b]);
            let (a, b) = two_mut(&mut solver_bodies, ia, ib);
            if !joint.solve_position_constraints(a, b) {
                all_ok = false;
            }
        }

        for ic in &island_contacts {
            let contact = &contacts[ic.id];
            let (a, b) = two_mut(&mut solver_bodies, ic.index_a, ic.index_b);
            let min_separation = solve_position_constraint(&contact.manifold, ic.radius_a, ic.radius_b, a, b);
            if min_separation < -3.0 * crate::settings::LINEAR_SLOP {
                all_ok = false;
            }
        }

        if all_ok {
            break;
        }
    }

    // Write the island's impulses and final transforms back.
    for (vc, ic) in vcs.iter().zip(island_contacts.iter()) {
        let contact = &mut contacts[ic.id];
        for (i, p) in vc.points.iter().enumerate() {
            contact.manifold.points[i].normal_impulse = p.normal_impulse;
            contact.manifold.points[i].tangent_impulse = p.tangent_impulse;
        }
    }

    let mut min_sleep_time = f32::MAX;
    let allow_sleep_island = settings.allow_sleep;

    for (i, &id) in island.bodies.iter().enumerate() {
        let body = &mut bodies[id];
        if !body.body_type.is_speedable() {
            continue;
        }
        let sb = solver_bodies[i];
        body.linear_velocity = sb.v;
        body.angular_velocity = sb.w;
        body.sweep.c0 = body.sweep.c;
        body.sweep.a0 = body.sweep.a;
        body.sweep.c = sb.c;
        body.sweep.a = sb.a;
        body.synchronize_transform();

        if !allow_sleep_island || !body.allow_sleep || body.linear_velocity.dot(body.linear_velocity) > LINEAR_SLEEP_TOLERANCE * LINEAR_SLEEP_TOLERANCE || body.angular_velocity * body.angular_velocity > ANGULAR_SLEEP_TOLERANCE * ANGULAR_SLEEP_TOLERANCE {
            body.sleep_time = 0.0;
        } else {
            body.sleep_time += dt;
        }
        min_sleep_time = min_sleep_time.min(body.sleep_time);
    }

    if allow_sleep_island && min_sleep_time >= MIN_STILL_TIME_TO_SLEEP {
        for &id in &island.bodies {
            if bodies[id].body_type.is_speedable() {
                bodies[id].set_awake(false);
            }
        }
    }
}
