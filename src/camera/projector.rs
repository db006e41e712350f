//! Immutable snapshot of a camera's matrices for one viewport size.
//!
//! Workers receive a copy of this instead of the camera itself, so a camera
//! move or window resize never changes the projection under a frame that is
//! already in flight.

use crate::clipper::{self, trivially_outside, ClippedTriangle};
use crate::culling::Frustum;
use crate::face::Face;
use crate::math::{Mat4, Quat, Vec2, Vec3, Vec4};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projector {
    pub view: Mat4,
    pub projection: Mat4,
    /// `projection * view`; world-space faces need no model matrix.
    pub mvp: Mat4,
    pub frustum: Frustum,
    pub width: f64,
    pub height: f64,
    pub position: Vec3,
    pub rotation: Quat,
}

impl Projector {
    /// `fov_y` is in radians. A zero-sized viewport is treated as 1x1 for
    /// the aspect ratio.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        position: Vec3,
        rotation: Quat,
        fov_y: f64,
        near: f64,
        far: f64,
        width: u32,
        height: u32,
    ) -> Self {
        let aspect = width.max(1) as f64 / height.max(1) as f64;
        // world -> camera is the inverse of the camera's pose
        let view = Mat4::from_quat(rotation).transpose() * Mat4::translation(-position);
        let projection = Mat4::perspective(fov_y, aspect, near, far);
        let mvp = projection * view;
        Self {
            view,
            projection,
            mvp,
            frustum: Frustum::from_matrix(&mvp),
            width: width as f64,
            height: height as f64,
            position,
            rotation,
        }
    }

    /// Camera forward direction in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// World point to pixel coordinates (origin top-left, Y down).
    ///
    /// Points on the eye plane come back non-finite.
    pub fn project(&self, point: Vec3) -> Vec2 {
        let clip = self.mvp * Vec4::point(point);
        let ndc = Vec3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w);
        clipper::ndc_to_screen(ndc, self.width, self.height)
    }

    /// World point at `distance` from the camera along the view ray through
    /// pixel `screen`.
    pub fn unproject(&self, screen: Vec2, distance: f64) -> Vec3 {
        let x = 2.0 * screen.x / self.width.max(1.0) - 1.0;
        let y = 1.0 - 2.0 * screen.y / self.height.max(1.0);

        // Two points on the ray: the near plane (ndc z = -1) and ndc z = 0,
        // which stays finite even for an effectively infinite far plane.
        let direction = self.mvp.inverse().and_then(|inv| {
            let near = (inv * Vec4::new(x, y, -1.0, 1.0)).perspective_divide()?;
            let mid = (inv * Vec4::new(x, y, 0.0, 1.0)).perspective_divide()?;
            let dir = (mid - near).normalize();
            dir.is_finite().then_some(dir)
        });

        self.position + direction.unwrap_or_else(|| self.forward()) * distance
    }

    /// Cheap, permissive visibility test run before clipping.
    ///
    /// Rejects a face only when all vertices are outside one clip plane, or
    /// when its projection misses the viewport rectangle entirely. Faces
    /// crossing the eye plane are always accepted and left to the clipper.
    pub fn face_overlaps_frustum(&self, face: &Face) -> bool {
        let clip = face.vertices().map(|v| self.mvp * Vec4::point(v));
        if trivially_outside(&clip) {
            return false;
        }
        if clip.iter().any(|p| p.w <= 0.0) {
            return true;
        }

        let pts = clip.map(|p| {
            clipper::ndc_to_screen(
                Vec3::new(p.x / p.w, p.y / p.w, p.z / p.w),
                self.width,
                self.height,
            )
        });
        if pts.iter().any(|p| !p.is_finite()) {
            return false;
        }

        let (w, h) = (self.width, self.height);
        if pts
            .iter()
            .any(|p| (0.0..=w).contains(&p.x) && (0.0..=h).contains(&p.y))
        {
            return true;
        }

        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(w, 0.0),
            Vec2::new(w, h),
            Vec2::new(0.0, h),
        ];
        for i in 0..3 {
            let (a, b) = (pts[i], pts[(i + 1) % 3]);
            for j in 0..4 {
                if segments_intersect(a, b, corners[j], corners[(j + 1) % 4]) {
                    return true;
                }
            }
        }

        corners.iter().any(|&c| point_in_triangle(c, &pts))
    }

    /// Clips `face` to the view volume and projects the survivors.
    pub fn clip_and_project_face(&self, face: &Face) -> Vec<ClippedTriangle> {
        clipper::clip_and_project(
            &self.mvp,
            face.vertices(),
            face.texture().map(|t| t.coords),
            self.width,
            self.height,
        )
    }
}

fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    (b - a).cross(c - a)
}

fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

fn point_in_triangle(p: Vec2, tri: &[Vec2; 3]) -> bool {
    let d1 = orientation(tri[0], tri[1], p);
    let d2 = orientation(tri[1], tri[2], p);
    let d3 = orientation(tri[2], tri[0], p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn projector() -> Projector {
        Projector::new(Vec3::ZERO, Quat::IDENTITY, FRAC_PI_2, 0.1, 1e30, 100, 100)
    }

    #[test]
    fn point_ahead_projects_to_center() {
        let p = projector().project(Vec3::new(0.0, 0.0, -5.0));
        assert_relative_eq!(p.x, 50.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn y_points_down_on_screen() {
        let p = projector().project(Vec3::new(0.0, 1.0, -2.0));
        assert!(p.y < 50.0);
    }

    #[test]
    fn unproject_then_project_round_trips() {
        let proj = Projector::new(
            Vec3::new(3.0, -1.0, 8.0),
            Quat::from_euler(0.3, -0.7, 0.1),
            70f64.to_radians(),
            0.1,
            1e30,
            640,
            480,
        );
        for (screen, distance) in [
            (Vec2::new(320.0, 240.0), 5.0),
            (Vec2::new(12.5, 400.0), 20.0),
            (Vec2::new(600.0, 3.0), 1000.0),
        ] {
            let world = proj.unproject(screen, distance);
            assert_relative_eq!(world.distance(proj.position), distance, epsilon = 1e-6);
            let back = proj.project(world);
            assert_relative_eq!(back.x, screen.x, epsilon = 1e-6);
            assert_relative_eq!(back.y, screen.y, epsilon = 1e-6);
        }
    }

    #[test]
    fn overlap_test_is_permissive_but_rejects_far_off_faces() {
        let proj = projector();
        let ahead = Face::plain([
            Vec3::new(-1.0, -1.0, -5.0),
            Vec3::new(1.0, -1.0, -5.0),
            Vec3::new(0.0, 1.0, -5.0),
        ]);
        let behind = Face::plain([
            Vec3::new(-1.0, -1.0, 5.0),
            Vec3::new(1.0, -1.0, 5.0),
            Vec3::new(0.0, 1.0, 5.0),
        ]);
        // covers the whole screen with every vertex off-screen
        let huge = Face::plain([
            Vec3::new(-100.0, -100.0, -5.0),
            Vec3::new(100.0, -100.0, -5.0),
            Vec3::new(0.0, 100.0, -5.0),
        ]);
        assert!(proj.face_overlaps_frustum(&ahead));
        assert!(!proj.face_overlaps_frustum(&behind));
        assert!(proj.face_overlaps_frustum(&huge));
    }
}
