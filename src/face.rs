//! Triangle faces, the unit of work for every pipeline stage.

use std::sync::{Arc, OnceLock};

use image::Rgba;

use crate::colors;
use crate::math::{Aabb, Quat, Vec2, Vec3};
use crate::texture::Texture;

/// A texture image plus the UV pair for each face vertex.
#[derive(Clone, Debug)]
pub struct FaceTexture {
    pub image: Arc<Texture>,
    pub coords: [Vec2; 3],
}

/// Memoized bounding box. Empty until first read after an invalidation.
#[derive(Clone, Debug, Default)]
struct BoundsCell(OnceLock<Aabb>);

impl BoundsCell {
    fn get_or_compute(&self, vertices: &[Vec3; 3]) -> Aabb {
        *self.0.get_or_init(|| {
            let min = vertices[0].min(vertices[1]).min(vertices[2]);
            let max = vertices[0].max(vertices[1]).max(vertices[2]);
            Aabb::new(min, max)
        })
    }

    fn invalidate(&mut self) {
        self.0.take();
    }
}

#[derive(Clone, Debug)]
pub struct Face {
    vertices: [Vec3; 3],
    color: Rgba<u8>,
    texture: Option<FaceTexture>,
    bounds: BoundsCell,
}

impl Face {
    pub fn new(vertices: [Vec3; 3], color: Rgba<u8>) -> Self {
        Self {
            vertices,
            color,
            texture: None,
            bounds: BoundsCell::default(),
        }
    }

    /// A white face, for when only geometry matters.
    pub fn plain(vertices: [Vec3; 3]) -> Self {
        Self::new(vertices, colors::WHITE)
    }

    pub fn with_texture(mut self, image: Arc<Texture>, coords: [Vec2; 3]) -> Self {
        self.texture = Some(FaceTexture { image, coords });
        self
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec3; 3] {
        &self.vertices
    }

    #[inline]
    pub fn color(&self) -> Rgba<u8> {
        self.color
    }

    #[inline]
    pub fn texture(&self) -> Option<&FaceTexture> {
        self.texture.as_ref()
    }

    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    pub fn set_vertices(&mut self, vertices: [Vec3; 3]) -> &mut Self {
        self.vertices = vertices;
        self.bounds.invalidate();
        self
    }

    /// Replaces one vertex. Returns false, leaving the face untouched, when
    /// `index` is not 0, 1 or 2.
    pub fn set_vertex(&mut self, index: usize, vertex: Vec3) -> bool {
        let Some(slot) = self.vertices.get_mut(index) else {
            return false;
        };
        *slot = vertex;
        self.bounds.invalidate();
        true
    }

    pub fn translate(&mut self, delta: Vec3) -> &mut Self {
        for v in &mut self.vertices {
            *v = *v + delta;
        }
        self.bounds.invalidate();
        self
    }

    pub fn set_color(&mut self, color: Rgba<u8>) -> &mut Self {
        self.color = color;
        self
    }

    pub fn set_texture(&mut self, texture: Option<FaceTexture>) -> &mut Self {
        self.texture = texture;
        self
    }

    /// Bounding box of the three vertices, computed once per geometry change.
    pub fn bounds(&self) -> Aabb {
        self.bounds.get_or_compute(&self.vertices)
    }

    pub fn centroid(&self) -> Vec3 {
        (self.vertices[0] + self.vertices[1] + self.vertices[2]) / 3.0
    }

    /// Distance from the centroid to `point`; used for back-to-front ordering.
    pub fn distance_to(&self, point: Vec3) -> f64 {
        self.centroid().distance(point)
    }

    /// Copy of this face rotated about the origin and then translated.
    /// Color and texture are carried over unchanged.
    pub fn transformed(&self, rotation: Quat, position: Vec3) -> Face {
        let vertices = self.vertices.map(|v| rotation * v + position);
        Face {
            vertices,
            color: self.color,
            texture: self.texture.clone(),
            bounds: BoundsCell::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_face() -> Face {
        Face::plain([Vec3::ZERO, Vec3::X, Vec3::Y])
    }

    #[test]
    fn bounds_follow_geometry_changes() {
        let mut face = unit_face();
        assert_eq!(face.bounds(), Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)));

        assert!(face.set_vertex(2, Vec3::new(0.0, 3.0, -2.0)));
        assert_eq!(
            face.bounds(),
            Aabb::new(Vec3::new(0.0, 0.0, -2.0), Vec3::new(1.0, 3.0, 0.0))
        );

        face.translate(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(face.bounds().min.x, 1.0);
    }

    #[test]
    fn set_vertex_ignores_out_of_range_index() {
        let mut face = unit_face();
        let before = face.bounds();
        assert!(!face.set_vertex(3, Vec3::splat(9.0)));
        assert_eq!(face.vertices(), &[Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(face.bounds(), before);
    }

    #[test]
    fn transformed_moves_vertices_not_source() {
        let face = unit_face();
        let moved = face.transformed(Quat::IDENTITY, Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(moved.vertices()[1], Vec3::new(1.0, 0.0, -5.0));
        assert_eq!(face.vertices()[1], Vec3::X);
        assert_eq!(moved.bounds().max.z, -5.0);
    }
}
