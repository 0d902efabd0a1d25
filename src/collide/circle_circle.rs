//! Circle-circle manifold.

use super::{ContactFeature, FeatureType, Manifold, ManifoldPoint, ManifoldType};
use crate::math::Transform;
use crate::shapes::Disk;
use cgmath::InnerSpace;

pub fn collide_circles(a: &Disk, xf_a: &Transform, b: &Disk, xf_b: &Transform) -> Manifold {
    let p_a = xf_a.transform_point(a.center);
    let p_b = xf_b.transform_point(b.center);
    let d = p_b - p_a;
    let dist2 = d.magnitude2();
    let radius_sum = a.radius + b.radius;

    if dist2 > radius_sum * radius_sum {
        return Manifold::unset();
    }

    let mut points = smallvec::SmallVec::new();
    points.push(ManifoldPoint {
        local_point: b.center,
        id: ContactFeature {
            index_a: 0,
            type_a: FeatureType::Vertex,
            index_b: 0,
            type_b: FeatureType::Vertex,
        },
        normal_impulse: 0.0,
        tangent_impulse: 0.0,
    });

    Manifold {
        kind: ManifoldType::Circles,
        local_normal: crate::math::vec2(0.0, 0.0),
        local_point: a.center,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{vec2, Rot};

    #[test]
    fn distant_disks_report_unset() {
        let a = Disk::new(vec2(0.0, 0.0), 1.0);
        let b = Disk::new(vec2(0.0, 0.0), 1.0);
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(3.0, 0.0), Rot::IDENTITY);
        let m = collide_circles(&a, &xf_a, &b, &xf_b);
        assert_eq!(m.kind, ManifoldType::Unset);
        assert_eq!(m.point_count(), 0);
    }

    #[test]
    fn overlapping_disks_report_one_point() {
        let a = Disk::new(vec2(0.0, 0.0), 1.0);
        let b = Disk::new(vec2(0.0, 0.0), 1.0);
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(1.5, 0.0), Rot::IDENTITY);
        let m = collide_circles(&a, &xf_a, &b, &xf_b);
        assert_eq!(m.kind, ManifoldType::Circles);
        assert_eq!(m.point_count(), 1);
        assert_eq!(m.local_point, a.center);
        assert_eq!(m.points[0].local_point, b.center);
        assert_eq!(m.points[0].id.index_a, 0);
        assert_eq!(m.points[0].id.index_b, 0);
    }

    #[test]
    fn touching_exactly_at_sum_of_radii_reports_one_point() {
        let a = Disk::new(vec2(0.0, 0.0), 1.0);
        let b = Disk::new(vec2(0.0, 0.0), 1.0);
        let xf_a = Transform::new(vec2(0.0, 0.0), Rot::IDENTITY);
        let xf_b = Transform::new(vec2(2.0, 0.0), Rot::IDENTITY);
        let m = collide_circles(&a, &xf_a, &b, &xf_b);
        assert_eq!(m.kind, ManifoldType::Circles);
        assert_eq!(m.point_count(), 1);
    }
}
