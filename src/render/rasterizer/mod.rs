//! Triangle and line rasterization into a depth-tested [`FrameBuffer`].

mod line;
mod scanline;

pub use line::{draw_line, draw_triangle_outline};
pub use scanline::ScanlineRasterizer;

use image::Rgba;

use super::framebuffer::FrameBuffer;
use super::triangle::ProjectedTriangle;
use crate::math::Vec2;
use crate::texture::Texture;

/// What a filled triangle writes per pixel.
#[derive(Clone, Copy, Debug)]
pub enum Fill<'a> {
    Solid(Rgba<u8>),
    /// Nearest texture sample; `fallback` when the texture has no pixels.
    Textured {
        texture: &'a Texture,
        coords: [Vec2; 3],
        fallback: Rgba<u8>,
    },
    /// Depth test and depth write only.
    DepthOnly,
}

/// Trait for triangle rasterization algorithms.
///
/// Implementors define how triangles are filled into a frame buffer; every
/// written pixel must pass the depth test.
pub trait Rasterizer {
    fn fill_triangle(&self, triangle: &ProjectedTriangle, buffer: &mut FrameBuffer, fill: &Fill);
}
