//! Scene objects.
//!
//! An [`Object`] is a collection of local-space [`Face`]s with a position and
//! rotation applied at query time. World-space faces are derived on demand
//! and never stored, so mutating an object only has to tell the camera's
//! spatial index that it is out of date.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use rayon::prelude::*;

use crate::face::Face;
use crate::math::{Quat, Vec3};

/// Non-owning handle to a spatial index's stale flag.
///
/// Dangling links are harmless: marking does nothing once the index is gone.
#[derive(Clone, Debug, Default)]
pub struct IndexLink(Weak<AtomicBool>);

impl IndexLink {
    pub(crate) fn new(flag: &Arc<AtomicBool>) -> Self {
        Self(Arc::downgrade(flag))
    }

    /// Flags the linked index for a rebuild.
    pub fn mark_stale(&self) {
        if let Some(flag) = self.0.upgrade() {
            flag.store(true, Ordering::Release);
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Object {
    name: String,
    faces: Vec<Face>,
    position: Vec3,
    rotation: Quat,
    index: IndexLink,
}

impl Object {
    pub fn new(name: impl Into<String>, faces: Vec<Face>) -> Self {
        Self {
            name: name.into(),
            faces,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Faces in local space.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    // ============ Mutators (each invalidates the spatial index) ============

    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.position = position;
        self.index.mark_stale();
        self
    }

    pub fn translate(&mut self, delta: Vec3) -> &mut Self {
        self.set_position(self.position + delta)
    }

    pub fn set_rotation(&mut self, rotation: Quat) -> &mut Self {
        self.rotation = rotation.normalize();
        self.index.mark_stale();
        self
    }

    /// Applies `delta` on top of the current rotation (world axes).
    pub fn rotate(&mut self, delta: Quat) -> &mut Self {
        self.set_rotation(delta * self.rotation)
    }

    pub fn set_faces(&mut self, faces: Vec<Face>) -> &mut Self {
        self.faces = faces;
        self.index.mark_stale();
        self
    }

    pub fn push_face(&mut self, face: Face) -> &mut Self {
        self.faces.push(face);
        self.index.mark_stale();
        self
    }

    /// Edits faces in place. The index is invalidated afterwards.
    pub fn edit_faces<F>(&mut self, edit: F) -> &mut Self
    where
        F: FnOnce(&mut Vec<Face>),
    {
        edit(&mut self.faces);
        self.index.mark_stale();
        self
    }

    /// Links this object to a spatial index and flags the index for a rebuild.
    pub fn link_index(&mut self, link: IndexLink) {
        self.index = link;
        self.index.mark_stale();
    }

    /// Faces rotated and translated into world space, transformed in parallel.
    pub fn world_faces(&self) -> Vec<Face> {
        let (rotation, position) = (self.rotation, self.position);
        self.faces
            .par_iter()
            .map(|face| face.transformed(rotation, position))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn single_face_object() -> Object {
        Object::new("tri", vec![Face::plain([Vec3::ZERO, Vec3::X, Vec3::Y])])
    }

    #[test]
    fn world_faces_apply_rotation_then_position() {
        let mut object = single_face_object();
        object
            .set_rotation(Quat::from_axis_angle(Vec3::Z, FRAC_PI_2))
            .set_position(Vec3::new(10.0, 0.0, 0.0));

        let world = object.world_faces();
        let v = world[0].vertices()[1];
        assert_relative_eq!(v.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-12);
        // local faces untouched
        assert_eq!(object.faces()[0].vertices()[1], Vec3::X);
    }

    #[test]
    fn mutations_mark_linked_index_stale() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut object = single_face_object();
        object.link_index(IndexLink::new(&flag));
        assert!(flag.swap(false, Ordering::AcqRel));

        object.translate(Vec3::Y);
        assert!(flag.swap(false, Ordering::AcqRel));

        object.edit_faces(|faces| faces.clear());
        assert!(flag.load(Ordering::Acquire));
    }

    #[test]
    fn dropped_index_is_ignored() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut object = single_face_object();
        object.link_index(IndexLink::new(&flag));
        drop(flag);
        object.set_position(Vec3::ONE);
    }
}
