//! Converts a local-frame [`Manifold`] into world-space points, separations
//! and a shared normal, which is what the velocity and position solvers
//! consume.

use super::{Manifold, ManifoldType};
use crate::math::{Transform, Vec2};
use cgmath::InnerSpace;
use smallvec::SmallVec;

#[derive(Clone, Debug, PartialEq)]
pub struct WorldManifold {
    pub normal: Vec2,
    pub points: SmallVec<[Vec2; 2]>,
    pub separations: SmallVec<[f32; 2]>,
}

pub fn world_manifold(
    manifold: &Manifold,
    xf_a: &Transform,
    radius_a: f32,
    xf_b: &Transform,
    radius_b: f32,
) -> WorldManifold {
    let mut points = SmallVec::new();
    let mut separations = SmallVec::new();

    if manifold.points.is_empty() {
        return WorldManifold {
            normal: Vec2::new(1.0, 0.0),
            points,
            separations,
        };
    }

    match manifold.kind {
        ManifoldType::Unset => WorldManifold {
            normal: Vec2::new(1.0, 0.0),
            points,
            separations,
        },
        ManifoldType::Circles => {
            let point_a = xf_a.transform_point(manifold.local_point);
            let point_b = xf_b.transform_point(manifold.points[0].local_point);
            let (normal, distance) = if (point_b - point_a).magnitude2() > 1.0e-18 {
                crate::math::normalize(point_b - point_a)
            } else {
                (Vec2::new(1.0, 0.0), 0.0)
            };
            let ca = point_a + normal * radius_a;
            let cb = point_b - normal * radius_b;
            points.push((ca + cb) * 0.5);
            separations.push(distance - radius_a - radius_b);
            WorldManifold { normal, points, separations }
        }
        ManifoldType::FaceA => {
            let normal = xf_a.transform_vector(manifold.local_normal);
            let plane_point = xf_a.transform_point(manifold.local_point);
            for p in &manifold.points {
                let clip_point = xf_b.transform_point(p.local_point);
                let ca = clip_point + (normal * (radius_a - normal.dot(clip_point - plane_point)));
                let cb = clip_point - normal * radius_b;
                points.push((ca + cb) * 0.5);
                separations.push(normal.dot(clip_point - plane_point) - radius_a - radius_b);
            }
            WorldManifold { normal, points, separations }
        }
        ManifoldType::FaceB => {
            let normal = xf_b.transform_vector(manifold.local_normal);
            let plane_point = xf_b.transform_point(manifold.local_point);
            for p in &manifold.points {
                let clip_point = xf_a.transform_point(p.local_point);
                let cb = clip_point + (normal * (radius_b - normal.dot(clip_point - plane_point)));
                let ca = clip_point - normal * radius_a;
                points.push((ca + cb) * 0.5);
                separations.push(normal.dot(clip_point - plane_point) - radius_a - radius_b);
            }
            // By convention the normal points from A to B; FaceB manifolds
            // store it pointing out of B, so flip it back for solver use.
            WorldManifold {
                normal: -normal,
                points,
                separations,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collide::{circle_circle::collide_circles, ManifoldType};
    use crate::math::{vec2, Rot};
    use crate::shapes::Disk;

    #[test]
    fn circle_circle_world_manifold_separation_matches_gap() {
        let a = Disk::new(vec2(0.0, 0.0), 1.0);
        let b = Disk::new(vec2(0.0, 0.0), 1.0);
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(1.5, 0.0), Rot::IDENTITY);
        let m = collide_circles(&a, &xf_a, &b, &xf_b);
        assert_eq!(m.kind, ManifoldType::Circles);
        let wm = world_manifold(&m, &xf_a, a.radius, &xf_b, b.radius);
        assert_eq!(wm.points.len(), 1);
        assert!((wm.separations[0] - (-0.5)).abs() < 1e-4);
        assert!(wm.normal.x > 0.0);
    }
}
