//! Disk (circle) shape.
//!
//! Grounded on `src/collide/primitives/primitive2d/circle.rs`'s support
//! function and bound computation.
//! (`m = ρπr², I = ½mr² + m‖c‖²`).

use crate::math::{Transform, Vec2};
use crate::shapes::{Aabb, DistanceProxy, MassData};
use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Disk {
    pub center: Vec2,
    pub radius: f32,
}

impl Disk {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Disk { center, radius }
    }

    pub fn distance_proxy(&self) -> DistanceProxy {
        DistanceProxy::single(self.center, self.radius)
    }

    pub fn aabb(&self, xf: &Transform) -> Aabb {
        let p = xf.transform_point(self.center);
        Aabb::from_point(p, self.radius)
    }

    pub fn mass_data(&self, density: f32) -> MassData {
        use cgmath::InnerSpace;
        let mass = density * PI * self.radius * self.radius;
        let inertia = mass * (0.5 * self.radius * self.radius + self.center.magnitude2());
        MassData {
            mass,
            center: self.center,
            inertia,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mass_scales_linearly_with_density() {
        let d = Disk::new(Vec2::new(1.0, 0.0), 2.0);
        let m1 = d.mass_data(1.0);
        let m3 = d.mass_data(3.0);
        assert_relative_eq!(m3.mass, m1.mass * 3.0, epsilon = 1e-4);
        assert_relative_eq!(m3.inertia, m1.inertia * 3.0, epsilon = 1e-4);
        assert_relative_eq!(m3.center.x, m1.center.x, epsilon = 1e-6);
    }
}
