//! Continuous collision via conservative advancement: finds the first time
//! of impact between two swept shapes within a step and rewinds both
//! sweeps to just before the impact, so a fast ("bullet") body never
//! tunnels clean through thin geometry.

use cgmath::InnerSpace;

use crate::distance::{distance, DistanceInput, SimplexCache};
use crate::math::Sweep;
use crate::settings::{
    LINEAR_SLOP, MAX_TOI_ITERS, MAX_TOI_ROOT_ITERS, TARGET_SEPARATION_SLOP_FACTOR,
};
use crate::shapes::DistanceProxy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToiState {
    /// The shapes never approach closer than the target separation within
    /// `[0, 1]`, or touch only after the conservative-advancement iteration
    /// cap is hit.
    Unknown,
    /// The shapes never come within target separation during the sweep.
    Separated,
    /// The shapes already overlap below the target separation at `t = 0`;
    /// no root exists to find.
    Overlapped,
    /// A valid `t` was found in `[0, 1]`.
    Touching,
}

#[derive(Clone, Copy, Debug)]
pub struct ToiOutput {
    pub state: ToiState,
    pub t: f32,
}

/// Computes the first time (in `[0, 1]`, fractions of the current step)
/// that two swept convex proxies approach within `target` of each other,
/// starting the root search from `cache`'s warm-start state. Mirrors
/// Box2D's `b2TimeOfImpact`: an outer conservative-advancement loop that
/// repeatedly solves the fixed-orientation GJK distance for the proxies
/// evaluated at the current trial `t`, converts the closing rate into a
/// bound on how far `t` can safely advance, and uses a bounded root search
/// to refine `t` once a straddling bracket is found.
pub fn time_of_impact(
    proxy_a: &DistanceProxy,
    sweep_a: &Sweep,
    proxy_b: &DistanceProxy,
    sweep_b: &Sweep,
    target: f32,
    tolerance: f32,
) -> ToiOutput {
    let mut cache = SimplexCache::default();
    let target = (target - proxy_a.radius - proxy_b.radius).max(LINEAR_SLOP);

    let mut t1 = 0.0f32;
    let k_max_iterations = MAX_TOI_ITERS;
    let mut iter = 0;

    loop {
        let xf_a1 = sweep_a.get_transform(t1);
        let xf_b1 = sweep_b.get_transform(t1);

        let output = distance(&mut cache, proxy_a, &xf_a1, proxy_b, &xf_b1, DistanceInput { use_radii: false });

        if output.distance <= 0.0 {
            return ToiOutput { state: ToiState::Overlapped, t: 0.0 };
        }

        if output.distance < target + tolerance {
            return ToiOutput { state: ToiState::Touching, t: t1 };
        }

        // Separation function: evaluates the signed separation along the
        // witness normal found at t1, for any t, so the root search below
        // can bracket without re-running full GJK each sample.
        let sep_fn = SeparationFunction::new(proxy_a, sweep_a, proxy_b, sweep_b, &cache, t1);

        let mut t2 = 1.0f32;
        let mut root_iter = 0;

        loop {
            let (s2, index_a, index_b) = sep_fn.find_min_separation(t2);

            if s2 > target + tolerance {
                return ToiOutput { state: ToiState::Separated, t: 1.0 };
            }

            if s2 > target - tolerance {
                t1 = t2;
                break;
            }

            let s1 = sep_fn.evaluate(index_a, index_b, t1);

            if s1 < target - tolerance {
                return ToiOutput { state: ToiState::Touching, t: t1 };
            }

            if s1 <= target + tolerance {
                t1 = t2;
                break;
            }

            let mut a1 = t1;
            let mut a2 = t2;
            loop {
                let t = if root_iter & 1 == 1 {
                    a1 + (target - s1) * (a2 - a1) / (sep_fn.evaluate(index_a, index_b, a2) - s1)
                } else {
                    0.5 * (a1 + a2)
                };

                root_iter += 1;

                let s = sep_fn.evaluate(index_a, index_b, t);

                if (s - target).abs() < tolerance {
                    t2 = t;
                    break;
                }

                if s > target {
                    a1 = t;
                } else {
                    a2 = t;
                }

                if root_iter == MAX_TOI_ROOT_ITERS {
                    break;
                }
            }

            if root_iter == MAX_TOI_ROOT_ITERS {
                break;
            }
        }

        iter += 1;

        if iter == k_max_iterations {
            break;
        }
    }

    ToiOutput { state: ToiState::Unknown, t: t1 }
}

/// Tracks the witness feature found at the outer loop's current `t1` and
/// evaluates how the separation along that fixed feature pair changes as
/// `t` moves, without re-running GJK for every root-search sample.
struct SeparationFunction<'a> {
    proxy_a: &'a DistanceProxy,
    sweep_a: &'a Sweep,
    proxy_b: &'a DistanceProxy,
    sweep_b: &'a Sweep,
    axis: crate::math::Vec2,
    local_point: crate::math::Vec2,
    kind: SeparationKind,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SeparationKind {
    Points,
    FaceA,
    FaceB,
}

impl<'a> SeparationFunction<'a> {
    fn new(
        proxy_a: &'a DistanceProxy,
        sweep_a: &'a Sweep,
        proxy_b: &'a DistanceProxy,
        sweep_b: &'a Sweep,
        cache: &SimplexCache,
        t1: f32,
    ) -> Self {
        let xf_a = sweep_a.get_transform(t1);
        let xf_b = sweep_b.get_transform(t1);

        if cache.count == 1 {
            let local_point_a = proxy_a.vertex(cache.index_a[0] as usize);
            let local_point_b = proxy_b.vertex(cache.index_b[0] as usize);
            let point_a = xf_a.transform_point(local_point_a);
            let point_b = xf_b.transform_point(local_point_b);
            let (axis, _) = crate::math::normalize(point_b - point_a);
            return SeparationFunction { proxy_a, sweep_a, proxy_b, sweep_b, axis, local_point: crate::math::vec2(0.0, 0.0), kind: SeparationKind::Points };
        }

        if cache.index_a[0] == cache.index_a[1] {
            // Two points on B, one on A: A is the reference face.
            let local_point_b1 = proxy_b.vertex(cache.index_b[0] as usize);
            let local_point_b2 = proxy_b.vertex(cache.index_b[1] as usize);
            let mut axis = crate::math::right_perp(local_point_b2 - local_point_b1);
            let (normalized, _) = crate::math::normalize(axis);
            axis = normalized;
            let normal = xf_b.q.rotate(axis);

            let local_point = (local_point_b1 + local_point_b2) * 0.5;
            let point_b = xf_b.transform_point(local_point);

            let local_point_a = proxy_a.vertex(cache.index_a[0] as usize);
            let point_a = xf_a.transform_point(local_point_a);

            let s = (point_a - point_b).dot(normal);
            let axis = if s < 0.0 { -normal } else { normal };

            return SeparationFunction { proxy_a, sweep_a, proxy_b, sweep_b, axis, local_point, kind: SeparationKind::FaceB };
        }

        // Two points on A, one on B: B is the reference face.
        let local_point_a1 = proxy_a.vertex(cache.index_a[0] as usize);
        let local_point_a2 = proxy_a.vertex(cache.index_a[1] as usize);
        let mut axis = crate::math::right_perp(local_point_a2 - local_point_a1);
        let (normalized, _) = crate::math::normalize(axis);
        axis = normalized;
        let normal = xf_a.q.rotate(axis);

        let local_point = (local_point_a1 + local_point_a2) * 0.5;
        let point_a = xf_a.transform_point(local_point);

        let local_point_b = proxy_b.vertex(cache.index_b[0] as usize);
        let point_b = xf_b.transform_point(local_point_b);

        let s = (point_b - point_a).dot(normal);
        let axis = if s < 0.0 { -normal } else { normal };

        SeparationFunction { proxy_a, sweep_a, proxy_b, sweep_b, axis, local_point, kind: SeparationKind::FaceA }
    }

    fn find_min_separation(&self, t: f32) -> (f32, usize, usize) {
        let xf_a = self.sweep_a.get_transform(t);
        let xf_b = self.sweep_b.get_transform(t);

        match self.kind {
            SeparationKind::Points => {
                let axis_a = xf_a.inv_transform_vector(self.axis);
                let axis_b = xf_b.inv_transform_vector(-self.axis);
                let index_a = self.proxy_a.support(axis_a);
                let index_b = self.proxy_b.support(axis_b);
                let point_a = xf_a.transform_point(self.proxy_a.vertex(index_a));
                let point_b = xf_b.transform_point(self.proxy_b.vertex(index_b));
                ((point_b - point_a).dot(self.axis), index_a, index_b)
            }
            SeparationKind::FaceA => {
                let normal = xf_a.q.rotate(self.axis);
                let point_a = xf_a.transform_point(self.local_point);
                let axis_b = xf_b.inv_transform_vector(-normal);
                let index_b = self.proxy_b.support(axis_b);
                let point_b = xf_b.transform_point(self.proxy_b.vertex(index_b));
                ((point_b - point_a).dot(normal), 0, index_b)
            }
            SeparationKind::FaceB => {
                let normal = xf_b.q.rotate(self.axis);
                let point_b = xf_b.transform_point(self.local_point);
                let axis_a = xf_a.inv_transform_vector(-normal);
                let index_a = self.proxy_a.support(axis_a);
                let point_a = xf_a.transform_point(self.proxy_a.vertex(index_a));
                ((point_a - point_b).dot(normal), index_a, 0)
            }
        }
    }

    fn evaluate(&self, index_a: usize, index_b: usize, t: f32) -> f32 {
        let xf_a = self.sweep_a.get_transform(t);
        let xf_b = self.sweep_b.get_transform(t);

        match self.kind {
            SeparationKind::Points => {
                let point_a = xf_a.transform_point(self.proxy_a.vertex(index_a));
                let point_b = xf_b.transform_point(self.proxy_b.vertex(index_b));
                (point_b - point_a).dot(self.axis)
            }
            SeparationKind::FaceA => {
                let normal = xf_a.q.rotate(self.axis);
                let point_a = xf_a.transform_point(self.local_point);
                let point_b = xf_b.transform_point(self.proxy_b.vertex(index_b));
                (point_b - point_a).dot(normal)
            }
            SeparationKind::FaceB => {
                let normal = xf_b.q.rotate(self.axis);
                let point_b = xf_b.transform_point(self.local_point);
                let point_a = xf_a.transform_point(self.proxy_a.vertex(index_a));
                (point_a - point_b).dot(normal)
            }
        }
    }
}

/// Target separation contacts are advanced to by the TOI solver: a few
/// linear slops, matching the tolerance the outer step's NGS position pass
/// already settles ordinary contacts to.
pub fn target_separation() -> f32 {
    TARGET_SEPARATION_SLOP_FACTOR * LINEAR_SLOP
}
