//! Perspective camera.
//!
//! # Coordinate System
//!
//! Right-handed world space:
//! - X: positive right
//! - Y: positive up
//! - Z: positive toward the viewer; the identity camera looks down −Z
//!
//! The camera rotation maps camera space to world space. View, projection,
//! MVP and frustum are cached in a [`Projector`] and only recomputed by
//! [`Camera::update`], never as a side effect of moving the camera.
//!
//! The camera also owns the spatial index over the scene's world-space
//! faces. Objects hold an [`IndexLink`] to it and flag it stale when they
//! change; the next [`Camera::refresh_index`] rebuilds it from scratch.

mod controller;
mod projector;

pub use controller::{CameraController, ManualController, OrbitController, DEFAULT_ORBIT_DISTANCE};
pub use projector::Projector;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, PoisonError, RwLock};

use rayon::prelude::*;

use crate::clipper::ClippedTriangle;
use crate::culling::Octree;
use crate::error::{Error, Result};
use crate::face::Face;
use crate::math::{Quat, Vec2, Vec3};
use crate::object::{IndexLink, Object};

pub const DEFAULT_FOV_DEGREES: f64 = 90.0;
pub const DEFAULT_NEAR: f64 = 0.1;
/// Effectively infinite; the far frustum plane degenerates and accepts everything.
pub const DEFAULT_FAR: f64 = 1e30;

#[derive(Debug)]
pub struct Camera {
    position: Vec3,
    rotation: Quat,
    fov_degrees: f64,
    near: f64,
    far: f64,
    controller: CameraController,

    projector: Projector,
    cache_dirty: bool,

    index: Arc<RwLock<Octree>>,
    stale: Arc<AtomicBool>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

impl Camera {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        let rotation = rotation.normalize();
        Self {
            position,
            rotation,
            fov_degrees: DEFAULT_FOV_DEGREES,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            controller: CameraController::None,
            projector: Projector::new(
                position,
                rotation,
                DEFAULT_FOV_DEGREES.to_radians(),
                DEFAULT_NEAR,
                DEFAULT_FAR,
                1,
                1,
            ),
            cache_dirty: true,
            index: Arc::new(RwLock::new(Octree::default())),
            stale: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Creates a camera at `position` looking toward `target` with +Y up.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let mut camera = Self::new(position, Quat::IDENTITY);
        camera.look_at(target);
        camera
    }

    // ============ Pose ============

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn fov_degrees(&self) -> f64 {
        self.fov_degrees
    }

    pub fn near(&self) -> f64 {
        self.near
    }

    pub fn far(&self) -> f64 {
        self.far
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.position = position;
        self.cache_dirty = true;
        self
    }

    pub fn set_rotation(&mut self, rotation: Quat) -> &mut Self {
        self.rotation = rotation.normalize();
        self.cache_dirty = true;
        self
    }

    pub fn translate(&mut self, delta: Vec3) -> &mut Self {
        self.set_position(self.position + delta)
    }

    pub fn look_at(&mut self, target: Vec3) -> &mut Self {
        self.set_rotation(Quat::look_rotation(target - self.position, Vec3::Y))
    }

    /// Sets the vertical field of view. Must lie strictly between 0 and 180.
    pub fn set_fov_degrees(&mut self, degrees: f64) -> Result<&mut Self> {
        if !(degrees > 0.0 && degrees < 180.0) {
            return Err(Error::InvalidFov(degrees));
        }
        self.fov_degrees = degrees;
        self.cache_dirty = true;
        Ok(self)
    }

    // ============ Controller ============

    pub fn controller(&self) -> &CameraController {
        &self.controller
    }

    /// Installs a controller and adopts its pose immediately.
    pub fn set_controller(&mut self, controller: CameraController) -> &mut Self {
        self.controller = controller;
        self.apply_controller();
        self
    }

    /// Edits the controller in place, then adopts its pose.
    pub fn control<F>(&mut self, edit: F) -> &mut Self
    where
        F: FnOnce(&mut CameraController),
    {
        edit(&mut self.controller);
        self.apply_controller();
        self
    }

    pub fn on_drag(&mut self, dx: f64, dy: f64) {
        self.control(|c| c.on_drag(dx, dy));
    }

    pub fn on_drag_end(&mut self) {
        self.control(CameraController::on_drag_end);
    }

    pub fn on_scroll(&mut self, dx: f64, dy: f64) {
        self.control(|c| c.on_scroll(dx, dy));
    }

    fn apply_controller(&mut self) {
        if let Some((position, rotation)) = self.controller.pose() {
            self.set_position(position);
            self.set_rotation(rotation);
        }
    }

    // ============ Cached matrices ============

    /// Recomputes view, projection, MVP and frustum for a viewport.
    /// Call after a resize or a camera move.
    pub fn update(&mut self, width: u32, height: u32) -> &Projector {
        self.projector = self.projector_for(width, height);
        self.cache_dirty = false;
        &self.projector
    }

    /// The cached snapshot from the last [`Camera::update`].
    pub fn projector(&self) -> Projector {
        if self.cache_dirty {
            log::debug!("camera cache used before update; projection reflects an older pose");
        }
        self.projector
    }

    /// A fresh snapshot for the current pose without touching the cache.
    pub fn projector_for(&self, width: u32, height: u32) -> Projector {
        Projector::new(
            self.position,
            self.rotation,
            self.fov_degrees.to_radians(),
            self.near,
            self.far,
            width,
            height,
        )
    }

    pub fn project(&self, point: Vec3) -> Vec2 {
        self.projector.project(point)
    }

    pub fn unproject(&self, screen: Vec2, distance: f64) -> Vec3 {
        self.projector.unproject(screen, distance)
    }

    pub fn face_overlaps_frustum(&self, face: &Face) -> bool {
        self.projector.face_overlaps_frustum(face)
    }

    pub fn clip_and_project_face(&self, face: &Face) -> Vec<ClippedTriangle> {
        self.projector.clip_and_project_face(face)
    }

    // ============ Spatial index ============

    /// Link handed to objects so their mutations mark this index stale.
    pub fn index_link(&self) -> IndexLink {
        IndexLink::new(&self.stale)
    }

    pub fn index(&self) -> &Arc<RwLock<Octree>> {
        &self.index
    }

    pub fn is_index_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// Rebuilds the index from the objects' world-space faces under the
    /// write lock.
    pub fn build_octree(&self, objects: &[Object]) {
        let faces: Vec<Face> = objects
            .par_iter()
            .flat_map_iter(|object| object.world_faces())
            .collect();
        let tree = Octree::build(faces);

        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        *index = tree;
        self.stale.store(false, Ordering::Release);
    }

    /// Rebuilds the index if anything changed since the last build.
    /// Returns whether a rebuild happened.
    pub fn refresh_index(&self, objects: &[Object]) -> bool {
        if self.stale.swap(false, Ordering::AcqRel) {
            self.build_octree(objects);
            true
        } else {
            false
        }
    }

    /// Streams indexed faces inside the cached frustum.
    pub fn visible_faces(&self) -> Receiver<Face> {
        Octree::query(&self.index, self.projector.frustum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle_at(z: f64) -> Object {
        Object::new(
            "tri",
            vec![Face::plain([
                Vec3::new(-1.0, -1.0, z),
                Vec3::new(1.0, -1.0, z),
                Vec3::new(0.0, 1.0, z),
            ])],
        )
    }

    #[test]
    fn fov_outside_range_is_rejected() {
        let mut camera = Camera::default();
        assert!(matches!(camera.set_fov_degrees(0.0), Err(Error::InvalidFov(_))));
        assert!(camera.set_fov_degrees(180.0).is_err());
        assert!(camera.set_fov_degrees(f64::NAN).is_err());
        assert!(camera.set_fov_degrees(60.0).is_ok());
        assert_relative_eq!(camera.fov_degrees(), 60.0);
    }

    #[test]
    fn caches_change_only_on_update() {
        let mut camera = Camera::default();
        camera.update(100, 100);
        let before = camera.projector();
        camera.set_position(Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(camera.projector(), before);
        camera.update(100, 100);
        assert_ne!(camera.projector(), before);
    }

    #[test]
    fn look_at_faces_target() {
        let camera = Camera::looking_at(Vec3::new(5.0, 5.0, 5.0), Vec3::ZERO);
        let expected = (Vec3::ZERO - camera.position()).normalize();
        assert_relative_eq!(camera.forward().dot(expected), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn object_changes_trigger_index_rebuild() {
        let mut camera = Camera::default();
        camera.update(100, 100);
        let mut objects = vec![triangle_at(-5.0)];
        objects[0].link_index(camera.index_link());

        assert!(camera.refresh_index(&objects));
        assert!(!camera.refresh_index(&objects));
        assert_eq!(camera.visible_faces().iter().count(), 1);

        objects[0].set_position(Vec3::new(0.0, 0.0, 20.0));
        assert!(camera.is_index_stale());
        assert!(camera.refresh_index(&objects));
        // now behind the camera
        assert_eq!(camera.visible_faces().iter().count(), 0);
    }

    #[test]
    fn orbit_controller_drives_pose() {
        let mut camera = Camera::default();
        camera.set_controller(CameraController::Orbit(
            OrbitController::new(Vec3::ZERO).with_distance(10.0),
        ));
        assert_relative_eq!(camera.position().z, 10.0, epsilon = 1e-12);

        camera.on_scroll(0.0, 1.0);
        assert_relative_eq!(camera.position().magnitude(), 5.0, epsilon = 1e-12);

        camera.on_drag(30.0, 0.0);
        assert_relative_eq!(camera.position().magnitude(), 5.0, epsilon = 1e-12);
        assert!(camera.position().x.abs() > 0.1);
    }
}
