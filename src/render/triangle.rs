use std::sync::Arc;

use image::Rgba;

use crate::clipper::ClippedTriangle;
use crate::face::Face;
use crate::math::{Vec2, Vec3};
use crate::texture::Texture;

/// A clipped, screen-space triangle ready for rasterization.
#[derive(Clone, Debug)]
pub struct ProjectedTriangle {
    /// Pixel coordinates, origin top-left.
    pub points: [Vec2; 3],
    /// NDC depth per vertex; smaller is nearer.
    pub depths: [f64; 3],
    pub color: Rgba<u8>,
    pub texture: Option<Arc<Texture>>,
    pub tex_coords: Option<[Vec2; 3]>,
    /// World-space distance from the camera to the source face.
    pub distance: f64,
}

impl ProjectedTriangle {
    pub fn new(points: [Vec2; 3], depths: [f64; 3], color: Rgba<u8>) -> Self {
        Self {
            points,
            depths,
            color,
            texture: None,
            tex_coords: None,
            distance: 0.0,
        }
    }

    /// Attaches face color, texture and camera distance to clipper output.
    pub fn from_clipped(clipped: ClippedTriangle, face: &Face, eye: Vec3) -> Self {
        let texture = face.texture();
        Self {
            points: clipped.points,
            depths: clipped.depths,
            color: face.color(),
            texture: texture.map(|t| Arc::clone(&t.image)),
            tex_coords: texture.and(clipped.tex_coords),
            distance: face.distance_to(eye),
        }
    }

    /// Texture and UVs, when both are present.
    pub fn texturing(&self) -> Option<(&Texture, &[Vec2; 3])> {
        Some((self.texture.as_deref()?, self.tex_coords.as_ref()?))
    }
}
