//! View frustum planes and the box-vs-frustum test.

use crate::math::{Aabb, Mat4, Vec3, Vec4};

/// Half-space `normal · p + d >= 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f64,
}

impl Plane {
    pub const fn new(normal: Vec3, d: f64) -> Self {
        Self { normal, d }
    }

    /// Plane from `(a, b, c, d)` coefficients, scaled to a unit normal.
    ///
    /// A plane whose normal vanishes (the far plane of an effectively
    /// infinite projection) becomes the all-accepting zero plane.
    pub fn from_coefficients(v: Vec4) -> Self {
        let normal = v.xyz();
        let length = normal.magnitude();
        if length <= 1e-12 || !length.is_finite() {
            return Self::default();
        }
        Self::new(normal / length, v.w / length)
    }

    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f64 {
        self.normal.dot(p) + self.d
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    pub const fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extracts left, right, bottom, top, near, far planes from a combined
    /// view-projection matrix (Gribb/Hartmann).
    pub fn from_matrix(m: &Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        Self::new([
            Plane::from_coefficients(r3 + r0),
            Plane::from_coefficients(r3 - r0),
            Plane::from_coefficients(r3 + r1),
            Plane::from_coefficients(r3 - r1),
            Plane::from_coefficients(r3 + r2),
            Plane::from_coefficients(r3 - r2),
        ])
    }

    /// Frustum whose planes are the six faces of `bounds`; everything inside
    /// the box passes.
    pub fn from_box(bounds: &Aabb) -> Self {
        Self::new([
            Plane::new(Vec3::X, -bounds.min.x),
            Plane::new(-Vec3::X, bounds.max.x),
            Plane::new(Vec3::Y, -bounds.min.y),
            Plane::new(-Vec3::Y, bounds.max.y),
            Plane::new(Vec3::Z, -bounds.min.z),
            Plane::new(-Vec3::Z, bounds.max.z),
        ])
    }

    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    /// Conservative box test. A box entirely behind any one plane is
    /// rejected; boxes near frustum corners may pass even when outside.
    pub fn intersects(&self, bounds: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            // corner farthest along the plane normal
            let n = plane.normal;
            let p = Vec3::new(
                if n.x >= 0.0 { bounds.max.x } else { bounds.min.x },
                if n.y >= 0.0 { bounds.max.y } else { bounds.min.y },
                if n.z >= 0.0 { bounds.max.z } else { bounds.min.z },
            );
            plane.signed_distance(p) >= 0.0
        })
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.signed_distance(p) >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;
    use std::f64::consts::FRAC_PI_2;

    fn camera_frustum() -> Frustum {
        // camera at origin looking down -Z
        let proj = Mat4::perspective(FRAC_PI_2, 1.0, 0.1, 100.0);
        let view = Mat4::from_quat(Quat::IDENTITY);
        Frustum::from_matrix(&(proj * view))
    }

    #[test]
    fn box_in_front_passes_box_behind_fails() {
        let f = camera_frustum();
        assert!(f.intersects(&Aabb::cube(Vec3::new(0.0, 0.0, -10.0), 1.0)));
        assert!(!f.intersects(&Aabb::cube(Vec3::new(0.0, 0.0, 10.0), 1.0)));
        assert!(!f.intersects(&Aabb::cube(Vec3::new(50.0, 0.0, -10.0), 1.0)));
        assert!(!f.intersects(&Aabb::cube(Vec3::new(0.0, 0.0, -500.0), 1.0)));
    }

    #[test]
    fn straddling_box_passes() {
        let f = camera_frustum();
        // crosses the right plane
        assert!(f.intersects(&Aabb::cube(Vec3::new(10.0, 0.0, -10.0), 1.5)));
    }

    #[test]
    fn infinite_far_plane_accepts_distant_boxes() {
        let proj = Mat4::perspective(FRAC_PI_2, 1.0, 0.1, 1e30);
        let f = Frustum::from_matrix(&proj);
        assert!(f.intersects(&Aabb::cube(Vec3::new(0.0, 0.0, -1e9), 1.0)));
        assert!(f.contains_point(Vec3::new(0.0, 0.0, -1e12)));
    }

    #[test]
    fn box_frustum_matches_containment() {
        let bounds = Aabb::cube(Vec3::ZERO, 5.0);
        let f = Frustum::from_box(&bounds);
        assert!(f.contains_point(Vec3::new(4.9, -4.9, 0.0)));
        assert!(!f.contains_point(Vec3::new(5.1, 0.0, 0.0)));
    }
}
