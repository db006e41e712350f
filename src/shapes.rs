//! Ready-made objects.
//!
//! Every constructor builds its faces around the local origin; place the
//! result with [`Object::set_position`] and [`Object::set_rotation`].

use image::Rgba;

use crate::colors;
use crate::face::Face;
use crate::math::{Vec2, Vec3};
use crate::object::Object;
use crate::scene::TickCallback;

/// Angular step of the round shapes, in degrees.
const SEGMENT_DEGREES: usize = 20;

fn faces_from_indices(vertices: &[Vec3], indices: &[[usize; 3]], color: Rgba<u8>) -> Vec<Face> {
    indices
        .iter()
        .map(|&[a, b, c]| Face::new([vertices[a], vertices[b], vertices[c]], color))
        .collect()
}

/// Axis-aligned cube with edge length `size`: 12 faces.
pub fn cube(size: f64, color: Rgba<u8>) -> Object {
    let h = size / 2.0;
    let vertices = [
        Vec3::new(-h, -h, -h),
        Vec3::new(h, -h, -h),
        Vec3::new(h, h, -h),
        Vec3::new(-h, h, -h),
        Vec3::new(-h, -h, h),
        Vec3::new(h, -h, h),
        Vec3::new(h, h, h),
        Vec3::new(-h, h, h),
    ];
    #[rustfmt::skip]
    let indices = [
        // back, front
        [0, 1, 2], [0, 2, 3],
        [4, 5, 6], [4, 6, 7],
        // bottom, top
        [0, 1, 5], [0, 5, 4],
        [2, 3, 7], [2, 7, 6],
        // left, right
        [0, 3, 7], [0, 7, 4],
        [1, 2, 6], [1, 6, 5],
    ];
    Object::new("cube", faces_from_indices(&vertices, &indices, color))
}

/// Square in the XY plane split into a `resolution` x `resolution` grid of
/// quads, two faces each.
pub fn plane(size: f64, resolution: usize, color: Rgba<u8>) -> Object {
    let resolution = resolution.max(1);
    let half = size / 2.0;
    let step = size / resolution as f64;
    let stride = resolution + 1;

    let mut vertices = Vec::with_capacity(stride * stride);
    for i in 0..=resolution {
        for j in 0..=resolution {
            vertices.push(Vec3::new(
                -half + i as f64 * step,
                -half + j as f64 * step,
                0.0,
            ));
        }
    }

    let mut indices = Vec::with_capacity(resolution * resolution * 2);
    for i in 0..resolution {
        for j in 0..resolution {
            let top_left = i * stride + j;
            let top_right = top_left + 1;
            let bottom_left = top_left + stride;
            let bottom_right = bottom_left + 1;
            indices.push([top_left, top_right, bottom_right]);
            indices.push([top_left, bottom_right, bottom_left]);
        }
    }
    Object::new("plane", faces_from_indices(&vertices, &indices, color))
}

/// Point on a circle of `radius` in the XY plane at `z`.
fn rim(radius: f64, degrees: usize, z: f64) -> Vec3 {
    let angle = (degrees as f64).to_radians();
    Vec3::new(radius * angle.cos(), radius * angle.sin(), z)
}

/// Open tube along Z, centered on the origin.
pub fn cylinder(height: f64, radius: f64, color: Rgba<u8>) -> Object {
    let h = height / 2.0;
    let faces = (0..360)
        .step_by(SEGMENT_DEGREES)
        .flat_map(|deg| {
            let next = deg + SEGMENT_DEGREES;
            let (p1, p2) = (rim(radius, deg, -h), rim(radius, deg, h));
            let (p3, p4) = (rim(radius, next, h), rim(radius, next, -h));
            [Face::new([p1, p2, p3], color), Face::new([p1, p3, p4], color)]
        })
        .collect();
    Object::new("cylinder", faces)
}

/// Cone along Z with its apex at `+height / 2`; the base is left open.
pub fn cone(height: f64, radius: f64, color: Rgba<u8>) -> Object {
    let h = height / 2.0;
    let apex = Vec3::new(0.0, 0.0, h);
    let faces = (0..360)
        .step_by(SEGMENT_DEGREES)
        .map(|deg| {
            Face::new(
                [apex, rim(radius, deg, -h), rim(radius, deg + SEGMENT_DEGREES, -h)],
                color,
            )
        })
        .collect();
    Object::new("cone", faces)
}

/// Three flat arrows from the origin: red along X, green along Y and blue
/// along Z.
pub fn orientation_gizmo() -> Object {
    let size = 2.0;
    let t = size / 20.0;
    let strip = |a: Vec3, b: Vec3, c: Vec3, d: Vec3, color| {
        [Face::new([a, b, c], color), Face::new([b, d, c], color)]
    };

    let mut faces = Vec::with_capacity(6);
    faces.extend(strip(
        Vec3::new(0.0, -t, -t),
        Vec3::new(size, -t, -t),
        Vec3::new(0.0, t, -t),
        Vec3::new(size, t, -t),
        colors::RED,
    ));
    faces.extend(strip(
        Vec3::new(-t, 0.0, -t),
        Vec3::new(-t, size, -t),
        Vec3::new(t, 0.0, -t),
        Vec3::new(t, size, -t),
        colors::GREEN,
    ));
    faces.extend(strip(
        Vec3::new(-t, -t, 0.0),
        Vec3::new(-t, -t, size),
        Vec3::new(t, -t, 0.0),
        Vec3::new(t, -t, size),
        colors::BLUE,
    ));
    Object::new("orientation", faces)
}

/// Tick callback that keeps the object in `slot` at a fixed position in
/// window pixels, `distance` in front of the camera. Pair with
/// [`orientation_gizmo`] to keep the axes in a corner of the view.
///
/// The camera pose is read when the callback runs, so camera moves made by
/// earlier callbacks of the same tick are followed.
pub fn pin_to_screen(slot: usize, screen: Vec2, distance: f64) -> TickCallback {
    Box::new(move |state| {
        let (width, height) = state.window_size;
        let position = state
            .camera
            .projector_for(width, height)
            .unproject(screen, distance);
        if let Some(object) = state.objects.get_mut(slot) {
            object.set_position(position);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::math::{Aabb, Quat};
    use crate::scene::{Scene, SceneHost};
    use approx::assert_relative_eq;

    fn bounds(object: &Object) -> Aabb {
        object
            .faces()
            .iter()
            .map(Face::bounds)
            .reduce(|a, b| a.union(&b))
            .unwrap()
    }

    #[test]
    fn cube_has_twelve_faces_within_its_size() {
        let cube = cube(2.0, colors::WHITE);
        assert_eq!(cube.face_count(), 12);
        let b = bounds(&cube);
        assert_eq!(b.min, Vec3::splat(-1.0));
        assert_eq!(b.max, Vec3::splat(1.0));
    }

    #[test]
    fn plane_grid_face_count() {
        assert_eq!(plane(10.0, 4, colors::WHITE).face_count(), 32);
        assert_eq!(plane(10.0, 0, colors::WHITE).face_count(), 2);
        let b = bounds(&plane(10.0, 3, colors::WHITE));
        assert_relative_eq!(b.max.x, 5.0, epsilon = 1e-12);
        assert_relative_eq!(b.size().z, 0.0);
    }

    #[test]
    fn round_shapes_use_twenty_degree_segments() {
        assert_eq!(cylinder(2.0, 1.0, colors::WHITE).face_count(), 36);
        assert_eq!(cone(2.0, 1.0, colors::WHITE).face_count(), 18);
        let b = bounds(&cone(4.0, 1.0, colors::WHITE));
        assert_relative_eq!(b.max.z, 2.0);
        assert_relative_eq!(b.min.z, -2.0);
    }

    #[test]
    fn gizmo_axes_are_colored() {
        let gizmo = orientation_gizmo();
        assert_eq!(gizmo.face_count(), 6);
        let palette: Vec<_> = gizmo.faces().iter().map(Face::color).collect();
        assert_eq!(&palette[0..2], &[colors::RED, colors::RED]);
        assert_eq!(&palette[4..6], &[colors::BLUE, colors::BLUE]);
    }

    #[test]
    fn pinned_object_follows_camera_moved_in_the_same_tick() {
        let mut scene = Scene::new(200, 100);
        scene.set_resolution_factor(0.5).unwrap();
        scene.set_camera(Camera::new(Vec3::ZERO, Quat::IDENTITY));
        scene.register_tick(Box::new(|state| {
            state.camera.translate(Vec3::new(5.0, 0.0, 0.0));
        }));
        let slot = scene.add_object(orientation_gizmo());
        scene.register_tick(pin_to_screen(slot, Vec2::new(100.0, 50.0), 10.0));

        scene.tick();
        // window center, straight ahead of the moved camera
        let position = scene.objects()[slot].position();
        assert_relative_eq!(position.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(position.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(position.z, -10.0, epsilon = 1e-9);

        // top-left window pixel at half resolution: 90 degree fov, aspect 2
        scene.register_tick(pin_to_screen(slot, Vec2::new(0.0, 0.0), 10.0));
        scene.tick();
        let camera = Vec3::new(10.0, 0.0, 0.0);
        let expected = camera + Vec3::new(-2.0, 1.0, -1.0).normalize() * 10.0;
        assert_relative_eq!(
            scene.objects()[slot].position().distance(expected),
            0.0,
            epsilon = 1e-9
        );
        assert_eq!(scene.viewport(), (100, 50));
    }
}
