//! Per-contact sequential-impulse velocity constraint, including the
//! 2-point block solver.

use cgmath::{InnerSpace, Matrix2, SquareMatrix};
use smallvec::SmallVec;

use crate::collide::{self, Manifold};
use crate::math::{cross, cross_sv, solve22, vec2, Transform, Vec2};
use crate::settings::VELOCITY_THRESHOLD;

#[derive(Clone, Copy, Debug, Default)]
pub struct VelocityConstraintPoint {
    pub r_a: Vec2,
    pub r_b: Vec2,
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
    pub normal_mass: f32,
    pub tangent_mass: f32,
    pub velocity_bias: f32,
}

/// Per-body data the velocity/position solvers read and write, indexed by
/// each island's local body ordering (matches Box2D's `b2Position`/
/// `b2Velocity` split arrays).
#[derive(Clone, Copy, Debug)]
pub struct SolverBody {
    pub c: Vec2,
    pub a: f32,
    pub v: Vec2,
    pub w: f32,
    pub local_center: Vec2,
    pub inv_mass: f32,
    pub inv_i: f32,
}

pub struct ContactVelocityConstraint {
    pub index_a: usize,
    pub index_b: usize,
    pub normal: Vec2,
    pub points: SmallVec<[VelocityConstraintPoint; 2]>,
    pub k: Matrix2<f32>,
    pub normal_mass: Matrix2<f32>,
    pub friction: f32,
    pub restitution: f32,
    pub tangent_speed: f32,
}

pub fn init_velocity_constraint(
    manifold: &Manifold,
    xf_a: &Transform,
    radius_a: f32,
    xf_b: &Transform,
    radius_b: f32,
    index_a: usize,
    index_b: usize,
    body_a: &SolverBody,
    body_b: &SolverBody,
    friction: f32,
    restitution: f32,
    tangent_speed: f32,
) -> ContactVelocityConstraint {
    let world = collide::world_manifold(manifold, xf_a, radius_a, xf_b, radius_b);

    let mut points = SmallVec::new();
    for (i, p) in manifold.points.iter().enumerate() {
        let r_a = world.points[i] - body_a.c;
        let r_b = world.points[i] - body_b.c;

        let rn_a = cross(r_a, world.normal);
        let rn_b = cross(r_b, world.normal);
        let k_normal = body_a.inv_mass + body_b.inv_mass + body_a.inv_i * rn_a * rn_a + body_b.inv_i * rn_b * rn_b;
        let normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

        let tangent = crate::math::right_perp(world.normal);
        let rt_a = cross(r_a, tangent);
        let rt_b = cross(r_b, tangent);
        let k_tangent = body_a.inv_mass + body_b.inv_mass + body_a.inv_i * rt_a * rt_a + body_b.inv_i * rt_b * rt_b;
        let tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

        let rel_velocity = (body_b.v + cross_sv(body_b.w, r_b)) - (body_a.v + cross_sv(body_a.w, r_a));
        let vn = rel_velocity.dot(world.normal);
        let velocity_bias = if vn < -VELOCITY_THRESHOLD { -restitution * vn } else { 0.0 };

        points.push(VelocityConstraintPoint {
            r_a,
            r_b,
            normal_impulse: p.normal_impulse,
            tangent_impulse: p.tangent_impulse,
            normal_mass,
            tangent_mass,
            velocity_bias,
        });
    }

    let mut k = Matrix2::from_value(0.0);
    if points.len() == 2 {
        let r_a1 = points[0].r_a;
        let r_b1 = points[0].r_b;
        let r_a2 = points[1].r_a;
        let r_b2 = points[1].r_b;

        let rn1_a = cross(r_a1, world.normal);
        let rn1_b = cross(r_b1, world.normal);
        let rn2_a = cross(r_a2, world.normal);
        let rn2_b = cross(r_b2, world.normal);

        let k11 = body_a.inv_mass + body_b.inv_mass + body_a.inv_i * rn1_a * rn1_a + body_b.inv_i * rn1_b * rn1_b;
        let k22 = body_a.inv_mass + body_b.inv_mass + body_a.inv_i * rn2_a * rn2_a + body_b.inv_i * rn2_b * rn2_b;
        let k12 = body_a.inv_mass + body_b.inv_mass + body_a.inv_i * rn1_a * rn2_a + body_b.inv_i * rn1_b * rn2_b;

        const MAX_CONDITION_NUMBER: f32 = 1000.0;
        if k11 * k11 < MAX_CONDITION_NUMBER * (k11 * k22 - k12 * k12) {
            k = Matrix2::new(k11, k12, k12, k22);
        } else {
            // Ill-conditioned: fall back to sequential per-point solving by
            // dropping the second point's coupling.
            points.truncate(1);
        }
    }

    ContactVelocityConstraint {
        index_a,
        index_b,
        normal: world.normal,
        points,
        k,
        normal_mass: k.invert().unwrap_or(Matrix2::from_value(0.0)),
        friction,
        restitution,
        tangent_speed,
    }
}

pub fn warm_start(vc: &ContactVelocityConstraint, body_a: &mut SolverBody, body_b: &mut SolverBody) {
    let tangent = crate::math::right_perp(vc.normal);
    for p in &vc.points {
        let impulse = vc.normal * p.normal_impulse + tangent * p.tangent_impulse;
        body_a.v -= impulse * body_a.inv_mass;
        body_a.w -= body_a.inv_i * cross(p.r_a, impulse);
        body_b.v += impulse * body_b.inv_mass;
        body_b.w += body_b.inv_i * cross(p.r_b, impulse);
    }
}

pub fn solve_velocity_constraint(vc: &mut ContactVelocityConstraint, body_a: &mut SolverBody, body_b: &mut SolverBody) {
    let tangent = crate::math::right_perp(vc.normal);

    // Friction pass.
    for p in vc.points.iter_mut() {
        let dv = (body_b.v + cross_sv(body_b.w, p.r_b)) - (body_a.v + cross_sv(body_a.w, p.r_a));
        let vt = dv.dot(tangent) - vc.tangent_speed;
        let mut lambda = p.tangent_mass * (-vt);

        let max_friction = vc.friction * p.normal_impulse;
        let new_impulse = (p.tangent_impulse + lambda).clamp(-max_friction, max_friction);
        lambda = new_impulse - p.tangent_impulse;
        p.tangent_impulse = new_impulse;

        let impulse = tangent * lambda;
        body_a.v -= impulse * body_a.inv_mass;
        body_a.w -= body_a.inv_i * cross(p.r_a, impulse);
        body_b.v += impulse * body_b.inv_mass;
        body_b.w += body_b.inv_i * cross(p.r_b, impulse);
    }

    // Normal pass.
    if vc.points.len() == 1 {
        let p = &mut vc.points[0];
        let dv = (body_b.v + cross_sv(body_b.w, p.r_b)) - (body_a.v + cross_sv(body_a.w, p.r_a));
        let vn = dv.dot(vc.normal);
        let mut lambda = -p.normal_mass * (vn - p.velocity_bias);
        let new_impulse = (p.normal_impulse + lambda).max(0.0);
        lambda = new_impulse - p.normal_impulse;
        p.normal_impulse = new_impulse;

        let impulse = vc.normal * lambda;
        body_a.v -= impulse * body_a.inv_mass;
        body_a.w -= body_a.inv_i * cross(p.r_a, impulse);
        body_b.v += impulse * body_b.inv_mass;
        body_b.w += body_b.inv_i * cross(p.r_b, impulse);
    } else if vc.points.len() == 2 {
        solve_block(vc, body_a, body_b);
    }
}

/// 2-point block (LCP) solver: tries all four Karush-Kuhn-Tucker cases in
/// order (both free, point 1 free / point 2 at zero, the reverse, both at
/// zero) and accepts the first that satisfies complementarity, matching
/// Box2D's `b2ContactSolver::SolveVelocityConstraints`.
fn solve_block(vc: &mut ContactVelocityConstraint, body_a: &mut SolverBody, body_b: &mut SolverBody) {
    let a = vec2(vc.points[0].normal_impulse, vc.points[1].normal_impulse);
    debug_assert!(a.x >= 0.0 && a.y >= 0.0);

    let r_a1 = vc.points[0].r_a;
    let r_b1 = vc.points[0].r_b;
    let r_a2 = vc.points[1].r_a;
    let r_b2 = vc.points[1].r_b;

    let dv1 = (body_b.v + cross_sv(body_b.w, r_b1)) - (body_a.v + cross_sv(body_a.w, r_a1));
    let dv2 = (body_b.v + cross_sv(body_b.w, r_b2)) - (body_a.v + cross_sv(body_a.w, r_a2));

    let vn1 = dv1.dot(vc.normal);
    let vn2 = dv2.dot(vc.normal);

    let mut b = vec2(vn1 - vc.points[0].velocity_bias, vn2 - vc.points[1].velocity_bias);
    b -= vec2(vc.k.x.x * a.x + vc.k.y.x * a.y, vc.k.x.y * a.x + vc.k.y.y * a.y);

    // Case 1: both points free (x >= 0).
    let x = -solve22(vc.normal_mass, b);
    if x.x >= 0.0 && x.y >= 0.0 {
        finish_block(vc, body_a, body_b, x, a, r_a1, r_b1, r_a2, r_b2);
        return;
    }

    // Case 2: point 1 free, point 2 clamped to zero.
    let x1 = -vc.points[0].normal_mass * b.x;
    let vn2_case2 = vc.k.x.y * x1 + b.y;
    if x1 >= 0.0 && vn2_case2 >= 0.0 {
        finish_block(vc, body_a, body_b, vec2(x1, 0.0), a, r_a1, r_b1, r_a2, r_b2);
        return;
    }

    // Case 3: point 2 free, point 1 clamped to zero.
    let x2 = -vc.points[1].normal_mass * b.y;
    let vn1_case3 = vc.k.y.x * x2 + b.x;
    if x2 >= 0.0 && vn1_case3 >= 0.0 {
        finish_block(vc, body_a, body_b, vec2(0.0, x2), a, r_a1, r_b1, r_a2, r_b2);
        return;
    }

    // Case 4: both clamped to zero, only valid if the resulting (unclamped)
    // normal velocities are already separating.
    if b.x >= 0.0 && b.y >= 0.0 {
        finish_block(vc, body_a, body_b, vec2(0.0, 0.0), a, r_a1, r_b1, r_a2, r_b2);
    }
    // No case satisfies complementarity (can happen with near-singular K);
    // leave impulses as they were rather than apply an inconsistent update.
}

fn finish_block(
    vc: &mut ContactVelocityConstraint,
    body_a: &mut SolverBody,
    body_b: &mut SolverBody,
    x: Vec2,
    a: Vec2,
    r_a1: Vec2,
    r_b1: Vec2,
    r_a2: Vec2,
    r_b2: Vec2,
) {
    let d = x - a;
    let p1 = vc.normal * d.x;
    let p2 = vc.normal * d.y;
    body_a.v -= (p1 + p2) * body_a.inv_mass;
    body_a.w -= body_a.inv_i * (cross(r_a1, p1) + cross(r_a2, p2));
    body_b.v += (p1 + p2) * body_b.inv_mass;
    body_b.w += body_b.inv_i * (cross(r_b1, p1) + cross(r_b2, p2));

    vc.points[0].normal_impulse = x.x;
    vc.points[1].normal_impulse = x.y;
}
