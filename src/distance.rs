//! GJK closest-distance engine with simplex caching.
//!
//! Reports only distance and witness points between two convex proxies;
//! manifold construction (penetration, clipping) lives in `crate::collide`.

use crate::math::{cross, vec2, Transform, Vec2};
use crate::settings::MAX_DISTANCE_ITERS;
use crate::shapes::DistanceProxy;
use cgmath::InnerSpace;

/// One vertex of the GJK simplex: support points from each proxy, their
/// Minkowski difference, and a barycentric weight.
#[derive(Clone, Copy, Debug, Default)]
struct SimplexVertex {
    index_a: usize,
    index_b: usize,
    w_a: Vec2,
    w_b: Vec2,
    w: Vec2,
    a: f32,
}

/// Persistent warm-start state between GJK calls on the same shape pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimplexCache {
    pub count: u8,
    pub index_a: [u8; 3],
    pub index_b: [u8; 3],
    pub metric: f32,
}

/// Result of [`distance`].
#[derive(Clone, Copy, Debug)]
pub struct DistanceOutput {
    pub point_a: Vec2,
    pub point_b: Vec2,
    pub distance: f32,
    pub iterations: u32,
}

/// Optional radii to pull the witness points to the shape surfaces rather
/// than the core (skin-less) geometry.
#[derive(Clone, Copy, Debug, Default)]
pub struct DistanceInput {
    pub use_radii: bool,
}

struct Simplex {
    vertices: [SimplexVertex; 3],
    count: usize,
}

impl Simplex {
    fn from_cache(
        cache: &SimplexCache,
        proxy_a: &DistanceProxy,
        xf_a: &Transform,
        proxy_b: &DistanceProxy,
        xf_b: &Transform,
    ) -> Self {
        debug_assert!((cache.count as usize) <= 3);
        let mut vertices = [SimplexVertex::default(); 3];
        let mut count = cache.count as usize;

        for i in 0..count {
            let ia = cache.index_a[i] as usize;
            let ib = cache.index_b[i] as usize;
            let w_a = xf_a.transform_point(proxy_a.vertex(ia));
            let w_b = xf_b.transform_point(proxy_b.vertex(ib));
            vertices[i] = SimplexVertex {
                index_a: ia,
                index_b: ib,
                w_a,
                w_b,
                w: w_b - w_a,
                a: 0.0,
            };
        }

        if count == 0 {
            let w_a = xf_a.transform_point(proxy_a.vertex(0));
            let w_b = xf_b.transform_point(proxy_b.vertex(0));
            vertices[0] = SimplexVertex {
                index_a: 0,
                index_b: 0,
                w_a,
                w_b,
                w: w_b - w_a,
                a: 1.0,
            };
            count = 1;
        }

        Simplex { vertices, count }
    }

    fn write_cache(&self, cache: &mut SimplexCache) {
        cache.count = self.count as u8;
        for i in 0..self.count {
            cache.index_a[i] = self.vertices[i].index_a as u8;
            cache.index_b[i] = self.vertices[i].index_b as u8;
        }
        cache.metric = self.metric();
    }

    fn metric(&self) -> f32 {
        match self.count {
            1 => 0.0,
            2 => (self.vertices[1].w - self.vertices[0].w).magnitude(),
            3 => cross(
                self.vertices[1].w - self.vertices[0].w,
                self.vertices[2].w - self.vertices[0].w,
            ),
            _ => unreachable!(),
        }
    }

    fn search_direction(&self) -> Vec2 {
        match self.count {
            1 => -self.vertices[0].w,
            2 => {
                let e12 = self.vertices[1].w - self.vertices[0].w;
                let sgn = cross(e12, -self.vertices[0].w);
                if sgn > 0.0 {
                    crate::math::left_perp(e12)
                } else {
                    crate::math::right_perp(e12)
                }
            }
            _ => unreachable!(),
        }
    }

    fn closest_point(&self) -> Vec2 {
        match self.count {
            1 => self.vertices[0].w,
            2 => self.vertices[0].w * self.vertices[0].a + self.vertices[1].w * self.vertices[1].a,
            3 => Vec2::new(0.0, 0.0),
            _ => unreachable!(),
        }
    }

    fn witness_points(&self) -> (Vec2, Vec2) {
        match self.count {
            1 => (self.vertices[0].w_a, self.vertices[0].w_b),
            2 => (
                self.vertices[0].w_a * self.vertices[0].a + self.vertices[1].w_a * self.vertices[1].a,
                self.vertices[0].w_b * self.vertices[0].a + self.vertices[1].w_b * self.vertices[1].a,
            ),
            3 => {
                let p = self.vertices[0].w_a * self.vertices[0].a
                    + self.vertices[1].w_a * self.vertices[1].a
                    + self.vertices[2].w_a * self.vertices[2].a;
                (p, p)
            }
            _ => unreachable!(),
        }
    }

    /// Reduces the simplex to the Voronoi region of the origin closest to
    /// it (the seven-region case analysis for a triangle simplex).
    fn solve(&mut self) {
        match self.count {
            1 => self.vertices[0].a = 1.0,
            2 => self.solve2(),
            3 => self.solve3(),
            _ => unreachable!(),
        }
    }

    fn solve2(&mut self) {
        let w1 = self.vertices[0].w;
        let w2 = self.vertices[1].w;
        let e12 = w2 - w1;

        let d12_2 = -w1.dot(e12);
        if d12_2 <= 0.0 {
            self.vertices[0].a = 1.0;
            self.count = 1;
            return;
        }

        let d12_1 = w2.dot(e12);
        if d12_1 <= 0.0 {
            self.vertices[0] = self.vertices[1];
            self.vertices[0].a = 1.0;
            self.count = 1;
            return;
        }

        let inv_d12 = 1.0 / (d12_1 + d12_2);
        self.vertices[0].a = d12_1 * inv_d12;
        self.vertices[1].a = d12_2 * inv_d12;
        self.count = 2;
    }

    fn solve3(&mut self) {
        let w1 = self.vertices[0].w;
        let w2 = self.vertices[1].w;
        let w3 = self.vertices[2].w;

        let e12 = w2 - w1;
        let w1e12 = w1.dot(e12);
        let w2e12 = w2.dot(e12);
        let d12_1 = w2e12;
        let d12_2 = -w1e12;

        let e13 = w3 - w1;
        let w1e13 = w1.dot(e13);
        let w3e13 = w3.dot(e13);
        let d13_1 = w3e13;
        let d13_2 = -w1e13;

        let e23 = w3 - w2;
        let w2e23 = w2.dot(e23);
        let w3e23 = w3.dot(e23);
        let d23_1 = w3e23;
        let d23_2 = -w2e23;

        let n123 = cross(e12, e13);

        let d123_1 = n123 * cross(w2, w3);
        let d123_2 = n123 * cross(w3, w1);
        let d123_3 = n123 * cross(w1, w2);

        if d12_2 <= 0.0 && d13_2 <= 0.0 {
            self.vertices[0].a = 1.0;
            self.count = 1;
            return;
        }

        if d12_1 > 0.0 && d12_2 > 0.0 && d123_3 <= 0.0 {
            let inv = 1.0 / (d12_1 + d12_2);
            self.vertices[0].a = d12_1 * inv;
            self.vertices[1].a = d12_2 * inv;
            self.count = 2;
            return;
        }

        if d13_1 > 0.0 && d13_2 > 0.0 && d123_2 <= 0.0 {
            let inv = 1.0 / (d13_1 + d13_2);
            self.vertices[0].a = d13_1 * inv;
            self.vertices[1] = self.vertices[2];
            self.vertices[1].a = d13_2 * inv;
            self.count = 2;
            return;
        }

        if d12_1 <= 0.0 && d23_2 <= 0.0 {
            self.vertices[0] = self.vertices[1];
            self.vertices[0].a = 1.0;
            self.count = 1;
            return;
        }

        if d13_1 <= 0.0 && d23_1 <= 0.0 {
            self.vertices[0] = self.vertices[2];
            self.vertices[0].a = 1.0;
            self.count = 1;
            return;
        }

        if d23_1 > 0.0 && d23_2 > 0.0 && d123_1 <= 0.0 {
            let inv = 1.0 / (d23_1 + d23_2);
            self.vertices[1].a = d23_1 * inv;
            self.vertices[2].a = d23_2 * inv;
            self.vertices[0] = self.vertices[2];
            self.count = 2;
            return;
        }

        // Interior: origin is enclosed by the triangle.
        let inv = 1.0 / (d123_1 + d123_2 + d123_3);
        self.vertices[0].a = d123_1 * inv;
        self.vertices[1].a = d123_2 * inv;
        self.vertices[2].a = d123_3 * inv;
        self.count = 3;
    }
}

/// Computes the closest distance between two convex shapes, warm-starting
/// from (and updating) `cache`.
pub fn distance(
    cache: &mut SimplexCache,
    proxy_a: &DistanceProxy,
    xf_a: &Transform,
    proxy_b: &DistanceProxy,
    xf_b: &Transform,
    input: DistanceInput,
) -> DistanceOutput {
    let mut simplex = Simplex::from_cache(cache, proxy_a, xf_a, proxy_b, xf_b);

    let mut save_a = [0usize; 3];
    let mut save_b = [0usize; 3];
    let mut iterations = 0;

    while iterations < MAX_DISTANCE_ITERS {
        let save_count = simplex.count;
        for i in 0..save_count {
            save_a[i] = simplex.vertices[i].index_a;
            save_b[i] = simplex.vertices[i].index_b;
        }

        simplex.solve();

        if simplex.count == 3 {
            // Origin is enclosed by the triangle: shapes overlap.
            break;
        }

        let d = simplex.search_direction();
        if d.magnitude2() < f32::EPSILON * f32::EPSILON {
            break;
        }

        let index_a = proxy_a.support(xf_a.inv_transform_vector(-d));
        let index_b = proxy_b.support(xf_b.inv_transform_vector(d));

        let w_a = xf_a.transform_point(proxy_a.vertex(index_a));
        let w_b = xf_b.transform_point(proxy_b.vertex(index_b));

        iterations += 1;

        let mut duplicate = false;
        for i in 0..save_count {
            if index_a == save_a[i] && index_b == save_b[i] {
                duplicate = true;
                break;
            }
        }
        if duplicate {
            break;
        }

        let vertex = SimplexVertex {
            index_a,
            index_b,
            w_a,
            w_b,
            w: w_b - w_a,
            a: 0.0,
        };
        simplex.vertices[simplex.count] = vertex;
        simplex.count += 1;
    }

    simplex.write_cache(cache);

    // Invalidate the cache if the metric changed drastically — a >2x jump
    // or a collapse below epsilon indicates the warm start was stale.
    let new_metric = simplex.metric();
    if cache.metric > f32::EPSILON
        && (new_metric > 2.0 * cache.metric || new_metric < 0.5 * cache.metric)
    {
        cache.count = 0;
    }

    let (mut point_a, mut point_b) = simplex.witness_points();
    let mut distance_val = (point_b - point_a).magnitude();

    if input.use_radii {
        let r_a = proxy_a.radius;
        let r_b = proxy_b.radius;
        if distance_val > r_a + r_b && distance_val > f32::EPSILON {
            distance_val -= r_a + r_b;
            let (normal, _) = crate::math::normalize(point_b - point_a);
            point_a += normal * r_a;
            point_b -= normal * r_b;
        } else {
            let mid = (point_a + point_b) * 0.5;
            point_a = mid;
            point_b = mid;
            distance_val = 0.0;
        }
    }

    DistanceOutput {
        point_a,
        point_b,
        distance: distance_val,
        iterations,
    }
}

/// Overlap test convenience wrapper: shapes overlap once GJK's search
/// direction collapses to (near) zero without separating them.
pub fn test_overlap(
    proxy_a: &DistanceProxy,
    xf_a: &Transform,
    proxy_b: &DistanceProxy,
    xf_b: &Transform,
) -> bool {
    let mut cache = SimplexCache::default();
    let output = distance(
        &mut cache,
        proxy_a,
        xf_a,
        proxy_b,
        xf_b,
        DistanceInput { use_radii: true },
    );
    output.distance < 10.0 * f32::EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{vec2, Rot};
    use crate::shapes::Disk;
    use approx::assert_relative_eq;

    #[test]
    fn distance_between_separated_disks() {
        let a = Disk::new(vec2(0.0, 0.0), 1.0).distance_proxy();
        let b = Disk::new(vec2(0.0, 0.0), 1.0).distance_proxy();
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(3.0, 0.0), Rot::IDENTITY);
        let mut cache = SimplexCache::default();
        let out = distance(&mut cache, &a, &xf_a, &b, &xf_b, DistanceInput { use_radii: true });
        assert_relative_eq!(out.distance, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn warm_started_cache_reproduces_same_result() {
        let a = Disk::new(vec2(0.0, 0.0), 0.5).distance_proxy();
        let b = Disk::new(vec2(0.0, 0.0), 0.5).distance_proxy();
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(2.0, 0.3), Rot::IDENTITY);

        let mut empty_cache = SimplexCache::default();
        let out1 = distance(
            &mut empty_cache,
            &a,
            &xf_a,
            &b,
            &xf_b,
            DistanceInput { use_radii: false },
        );

        let mut warm_cache = empty_cache;
        let out2 = distance(
            &mut warm_cache,
            &a,
            &xf_a,
            &b,
            &xf_b,
            DistanceInput { use_radii: false },
        );

        assert_relative_eq!(out1.distance, out2.distance, epsilon = 1e-4);
    }

    #[test]
    fn overlapping_shapes_report_zero_use_radii_distance() {
        let a = Disk::new(vec2(0.0, 0.0), 1.0).distance_proxy();
        let b = Disk::new(vec2(0.0, 0.0), 1.0).distance_proxy();
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(0.5, 0.0), Rot::IDENTITY);
        let mut cache = SimplexCache::default();
        let out = distance(&mut cache, &a, &xf_a, &b, &xf_b, DistanceInput { use_radii: true });
        assert_relative_eq!(out.distance, 0.0, epsilon = 1e-4);
    }
}
