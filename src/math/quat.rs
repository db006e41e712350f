//! Rotation quaternion.
//!
//! Composition is non-commutative: `a * b` applies `b` first, then `a`,
//! matching the matrix convention in [`super::mat4`].

use std::ops::Mul;

use super::vec3::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Rotation of `angle` radians about `axis` (need not be normalized).
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let axis = axis.normalize();
        let (s, c) = (angle / 2.0).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// Rotation from Euler angles in radians, applied as roll (Z), then
    /// pitch (X), then yaw (Y).
    pub fn from_euler(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self::from_axis_angle(Vec3::Y, yaw)
            * Self::from_axis_angle(Vec3::X, pitch)
            * Self::from_axis_angle(Vec3::Z, roll)
    }

    /// Rotation taking the local −Z axis onto `forward` and keeping local +Y
    /// as close to `up` as possible. Falls back to identity for a zero
    /// `forward`.
    pub fn look_rotation(forward: Vec3, up: Vec3) -> Self {
        let back = -forward.normalize();
        if back == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let mut right = up.cross(back);
        if right.magnitude() <= 1e-12 {
            // forward is parallel to up; pick any perpendicular
            right = if back.x.abs() < 0.9 { Vec3::X } else { Vec3::Z }.cross(back);
        }
        let right = right.normalize();
        let up = back.cross(right);
        Self::from_basis(right, up, back)
    }

    /// Quaternion for the rotation matrix whose columns are `x`, `y`, `z`.
    fn from_basis(x: Vec3, y: Vec3, z: Vec3) -> Self {
        let trace = x.x + y.y + z.z;
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new(0.25 * s, (y.z - z.y) / s, (z.x - x.z) / s, (x.y - y.x) / s)
        } else if x.x > y.y && x.x > z.z {
            let s = (1.0 + x.x - y.y - z.z).sqrt() * 2.0;
            Self::new((y.z - z.y) / s, 0.25 * s, (y.x + x.y) / s, (z.x + x.z) / s)
        } else if y.y > z.z {
            let s = (1.0 + y.y - x.x - z.z).sqrt() * 2.0;
            Self::new((z.x - x.z) / s, (y.x + x.y) / s, 0.25 * s, (z.y + y.z) / s)
        } else {
            let s = (1.0 + z.z - x.x - y.y).sqrt() * 2.0;
            Self::new((x.y - y.x) / s, (z.x + x.z) / s, (z.y + y.z) / s, 0.25 * s)
        };
        q.normalize()
    }

    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let n = self.norm();
        if n <= f64::EPSILON {
            return Self::IDENTITY;
        }
        Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn inverse(&self) -> Self {
        let n2 = self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z;
        if n2 <= f64::EPSILON {
            return Self::IDENTITY;
        }
        let c = self.conjugate();
        Self::new(c.w / n2, c.x / n2, c.y / n2, c.z / n2)
    }

    /// Rotates `v` as `q * v * q⁻¹`.
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let r = *self * p * self.inverse();
        Vec3::new(r.x, r.y, r.z)
    }
}

/// Hamilton product.
impl Mul<Quat> for Quat {
    type Output = Quat;

    fn mul(self, rhs: Quat) -> Self::Output {
        Quat::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }
}

impl Mul<Vec3> for Quat {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Self::Output {
        self.rotate(rhs)
    }
}
