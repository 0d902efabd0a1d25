//! Non-linear Gauss-Seidel position correction.

use crate::collide::{world_manifold, Manifold};
use crate::math::{cross, Rot, Transform};
use crate::settings::{LINEAR_SLOP, MAX_LINEAR_CORRECTION};

use super::velocity_constraint::SolverBody;

const BAUMGARTE: f32 = 0.2;

pub(crate) fn transform_of(body: &SolverBody) -> Transform {
    let q = Rot::from_angle(body.a);
    let p = body.c - q.rotate(body.local_center);
    Transform { p, q }
}

/// Solves one contact's position constraint for the current iteration,
/// returning the worst (most negative) separation observed. The
/// worse-separated point is solved first, then the manifold is
/// re-evaluated against the updated positions before solving the other, so
/// a two-point manifold never corrects a stale separation.
pub fn solve_position_constraint(
    manifold: &Manifold,
    radius_a: f32,
    radius_b: f32,
    body_a: &mut SolverBody,
    body_b: &mut SolverBody,
) -> f32 {
    if manifold.points.is_empty() {
        return 0.0;
    }

    let order: Vec<usize> = {
        let xf_a = transform_of(body_a);
        let xf_b = transform_of(body_b);
        let world = world_manifold(manifold, &xf_a, radius_a, &xf_b, radius_b);
        let mut idx: Vec<usize> = (0..world.separations.len()).collect();
        idx.sort_by(|&a, &b| world.separations[a].partial_cmp(&world.separations[b]).unwrap());
        idx
    };

    let mut min_separation = 0.0f32;
    for point_index in order {
        let xf_a = transform_of(body_a);
        let xf_b = transform_of(body_b);
        let world = world_manifold(manifold, &xf_a, radius_a, &xf_b, radius_b);

        let point = world.points[point_index];
        let separation = world.separations[point_index];
        min_separation = min_separation.min(separation);

        let r_a = point - body_a.c;
        let r_b = point - body_b.c;

        let c = (BAUMGARTE * (separation + LINEAR_SLOP)).clamp(-MAX_LINEAR_CORRECTION, 0.0);

        let rn_a = cross(r_a, world.normal);
        let rn_b = cross(r_b, world.normal);
        let k = body_a.inv_mass + body_b.inv_mass + body_a.inv_i * rn_a * rn_a + body_b.inv_i * rn_b * rn_b;
        let impulse = if k > 0.0 { -c / k } else { 0.0 };

        let p = world.normal * impulse;
        body_a.c -= p * body_a.inv_mass;
        body_a.a -= body_a.inv_i * cross(r_a, p);
        body_b.c += p * body_b.inv_mass;
        body_b.a += body_b.inv_i * cross(r_b, p);
    }

    min_separation
}
