//! Core math primitives: vectors, rotations, transforms, sweeps. Rotations
//! use an explicit cos/sin pair rather than a generic `Pose<P, R>`, and
//! `cgmath`'s `Matrix2`/`Matrix3` back the linear-system solves used by the
//! constraint solver.

use cgmath::{InnerSpace, Matrix2, Matrix3, SquareMatrix, Vector2, Vector3, Zero};
use std::f32;

/// A 2D vector. A thin newtype over [`cgmath::Vector2<f32>`] exposing a
/// plain `Vec2 { x, y }` data model while reusing `cgmath`'s vector
/// arithmetic.
pub type Vec2 = Vector2<f32>;

/// Convenience free-function constructor.
#[inline]
pub fn vec2(x: f32, y: f32) -> Vec2 {
    Vector2::new(x, y)
}

/// Scalar cross product of two 2D vectors (`a.x*b.y - a.y*b.x`).
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Cross product of a scalar and a vector: rotates `v` by +90 degrees scaled
/// by `s`. Used throughout the solver for `omega x r`.
#[inline]
pub fn cross_sv(s: f32, v: Vec2) -> Vec2 {
    vec2(-s * v.y, s * v.x)
}

/// Cross product of a vector and a scalar: `v x s`.
#[inline]
pub fn cross_vs(v: Vec2, s: f32) -> Vec2 {
    vec2(s * v.y, -s * v.x)
}

/// Forward perpendicular: rotate `v` -90 degrees (right-hand turn).
#[inline]
pub fn right_perp(v: Vec2) -> Vec2 {
    vec2(v.y, -v.x)
}

/// Reverse perpendicular: rotate `v` +90 degrees (left-hand turn).
#[inline]
pub fn left_perp(v: Vec2) -> Vec2 {
    vec2(-v.y, v.x)
}

/// Clamped, NaN-safe square root used when a distance could be marginally
/// negative due to floating point error.
#[inline]
pub fn safe_sqrt(x: f32) -> f32 {
    if x <= 0.0 {
        0.0
    } else {
        x.sqrt()
    }
}

/// Normalizes `v`, returning the unit vector and the original length. If the
/// input is (near) zero, returns the zero vector and zero length rather than
/// dividing by zero.
#[inline]
pub fn normalize(v: Vec2) -> (Vec2, f32) {
    let len = v.magnitude();
    if len < f32::EPSILON {
        (Vec2::zero(), 0.0)
    } else {
        (v / len, len)
    }
}

/// A rotation stored as a unit-length (cos, sin) pair.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rot {
    pub cos: f32,
    pub sin: f32,
}

impl Rot {
    /// Identity rotation.
    pub const IDENTITY: Rot = Rot { cos: 1.0, sin: 0.0 };

    /// Builds a rotation from an angle in radians.
    pub fn from_angle(angle: f32) -> Self {
        Rot {
            cos: angle.cos(),
            sin: angle.sin(),
        }
    }

    /// Recovers the angle in radians.
    pub fn angle(&self) -> f32 {
        self.sin.atan2(self.cos)
    }

    /// Rotates a vector by this rotation.
    #[inline]
    pub fn rotate(&self, v: Vec2) -> Vec2 {
        vec2(
            self.cos * v.x - self.sin * v.y,
            self.sin * v.x + self.cos * v.y,
        )
    }

    /// Rotates a vector by the inverse of this rotation.
    #[inline]
    pub fn inv_rotate(&self, v: Vec2) -> Vec2 {
        vec2(
            self.cos * v.x + self.sin * v.y,
            -self.sin * v.x + self.cos * v.y,
        )
    }

    /// Composes two rotations: `self` followed by `other` in the Box2D
    /// convention `q = a * b` means "apply b, then a" when used on points.
    #[inline]
    pub fn mul(&self, other: &Rot) -> Rot {
        Rot {
            cos: self.cos * other.cos - self.sin * other.sin,
            sin: self.sin * other.cos + self.cos * other.sin,
        }
    }

    /// `a^-1 * b`: the relative rotation from `self` to `other`.
    #[inline]
    pub fn mul_t(&self, other: &Rot) -> Rot {
        Rot {
            cos: self.cos * other.cos + self.sin * other.sin,
            sin: self.cos * other.sin - self.sin * other.cos,
        }
    }

    /// Re-normalizes in case of accumulated floating point drift.
    pub fn normalize(&mut self) {
        let (n, len) = normalize(vec2(self.cos, self.sin));
        if len > 0.0 {
            self.cos = n.x;
            self.sin = n.y;
        }
    }
}

impl Default for Rot {
    fn default() -> Self {
        Rot::IDENTITY
    }
}

/// A rigid transform: position + rotation.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub p: Vec2,
    pub q: Rot,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        p: Vector2::new(0.0, 0.0),
        q: Rot::IDENTITY,
    };

    pub fn new(p: Vec2, q: Rot) -> Self {
        Transform { p, q }
    }

    /// Transforms a local point into world space.
    #[inline]
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        self.q.rotate(point) + self.p
    }

    /// Transforms a world point into this transform's local space.
    #[inline]
    pub fn inv_transform_point(&self, point: Vec2) -> Vec2 {
        self.q.inv_rotate(point - self.p)
    }

    /// Transforms a local vector (ignores translation) into world space.
    #[inline]
    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        self.q.rotate(v)
    }

    /// Transforms a world vector into local space (ignores translation).
    #[inline]
    pub fn inv_transform_vector(&self, v: Vec2) -> Vec2 {
        self.q.inv_rotate(v)
    }

    /// Composition `self * other`: apply `other` in local space then `self`.
    pub fn mul(&self, other: &Transform) -> Transform {
        Transform {
            q: self.q.mul(&other.q),
            p: self.q.rotate(other.p) + self.p,
        }
    }

    /// `self^-1 * other`.
    pub fn mul_t(&self, other: &Transform) -> Transform {
        Transform {
            q: self.q.mul_t(&other.q),
            p: self.q.inv_rotate(other.p - self.p),
        }
    }
}

/// A body's motion over the current time step, used by the continuous
/// collision (TOI) pipeline. `c0`/`c1` are the center of mass at the start
/// and (currently predicted) end of the step; `a0`/`a1` the corresponding
/// angles; `local_center` is the body-local center of mass; `alpha0` is how
/// much of the step has already been consumed by a previous TOI event.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sweep {
    pub local_center: Vec2,
    pub c0: Vec2,
    pub c: Vec2,
    pub a0: f32,
    pub a: f32,
    pub alpha0: f32,
}

impl Default for Sweep {
    fn default() -> Self {
        Sweep {
            local_center: Vec2::zero(),
            c0: Vec2::zero(),
            c: Vec2::zero(),
            a0: 0.0,
            a: 0.0,
            alpha0: 0.0,
        }
    }
}

impl Sweep {
    /// Interpolates the sweep's center/angle at `beta` in `[0, 1]` between
    /// the start and end of the step.
    pub fn get_transform(&self, beta: f32) -> Transform {
        let c = self.c0 * (1.0 - beta) + self.c * beta;
        let a = self.a0 * (1.0 - beta) + self.a * beta;
        let q = Rot::from_angle(a);
        let p = c - q.rotate(self.local_center);
        Transform { p, q }
    }

    /// Advances `alpha0` to `alpha`, re-expressing `c0`/`a0` at the new
    /// alpha via linear interpolation, matching `b2Sweep::Advance`.
    pub fn advance(&mut self, alpha: f32) {
        debug_assert!(self.alpha0 < 1.0);
        let beta = (alpha - self.alpha0) / (1.0 - self.alpha0);
        self.c0 += (self.c - self.c0) * beta;
        self.a0 += (self.a - self.a0) * beta;
        self.alpha0 = alpha;
    }

    /// Normalizes the angles to keep floating point precision stable over
    /// long-running simulations.
    pub fn normalize(&mut self) {
        let two_pi = 2.0 * f32::consts::PI;
        let d = two_pi * (self.a0 / two_pi).floor();
        self.a0 -= d;
        self.a -= d;
    }
}

/// 2x2 matrix solve, used by the 2-point contact block solver.
pub fn solve22(a: Matrix2<f32>, b: Vec2) -> Vec2 {
    let a11 = a.x.x;
    let a12 = a.y.x;
    let a21 = a.x.y;
    let a22 = a.y.y;
    let mut det = a11 * a22 - a12 * a21;
    if det.abs() > f32::EPSILON {
        det = 1.0 / det;
    }
    vec2(
        det * (a22 * b.x - a12 * b.y),
        det * (a11 * b.y - a21 * b.x),
    )
}

/// 3x3 symmetric solve, used by the revolute/prismatic limit solvers.
pub fn solve33(a: Matrix3<f32>, b: Vector3<f32>) -> Vector3<f32> {
    let mut det = a.x.dot(a.y.cross(a.z));
    if det.abs() > f32::EPSILON {
        det = 1.0 / det;
    }
    let col1 = a.y.cross(a.z);
    let col2 = a.z.cross(a.x);
    let col3 = a.x.cross(a.y);
    Vector3::new(
        det * b.dot(col1),
        det * b.dot(col2),
        det * b.dot(col3),
    )
}

/// Inverts a symmetric 3x3 matrix, returning a zero matrix if singular.
pub fn invert_sym33(a: Matrix3<f32>) -> Matrix3<f32> {
    a.invert().unwrap_or_else(Matrix3::zero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rotation_round_trip() {
        let r = Rot::from_angle(1.234);
        let v = vec2(3.0, -2.0);
        let rotated = r.rotate(v);
        let back = r.inv_rotate(rotated);
        assert_relative_eq!(back.x, v.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, v.y, epsilon = 1e-5);
    }

    #[test]
    fn transform_set_get_identity() {
        let t = Transform::new(vec2(1.0, 2.0), Rot::from_angle(0.5));
        let p = vec2(4.0, -1.0);
        let world = t.transform_point(p);
        let local = t.inv_transform_point(world);
        assert_relative_eq!(local.x, p.x, epsilon = 1e-5);
        assert_relative_eq!(local.y, p.y, epsilon = 1e-5);
    }

    #[test]
    fn sweep_interpolates_linearly() {
        let mut s = Sweep::default();
        s.c0 = vec2(0.0, 0.0);
        s.c = vec2(10.0, 0.0);
        let mid = s.get_transform(0.5);
        assert_relative_eq!(mid.p.x, 5.0, epsilon = 1e-5);
    }
}
