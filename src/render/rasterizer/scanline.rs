//! Scanline-based triangle rasterization.
//!
//! This module implements triangle rasterization using the classic scanline algorithm
//! with flat-top/flat-bottom triangle decomposition.
//!
//! # Algorithm Overview
//!
//! 1. **Sort vertices** by Y coordinate (top to bottom in screen space)
//! 2. **Decompose** the triangle into simpler shapes (flat-top and/or flat-bottom)
//! 3. **Rasterize** each scanline by computing left/right edge intersections
//!
//! # Triangle Decomposition
//!
//! ```text
//!        v0                   v0
//!        /\                   /\
//!       /  \                 /  \
//!      /    \       =>      /----\<- split at v1.y
//!     /      \             v1   split
//!    /________\             \    /
//!   v1        v2             \  /
//!                             \/
//!                             v2
//!
//!   General triangle      Flat-bottom (top) + Flat-top (bottom)
//! ```
//!
//! # Attribute Interpolation
//!
//! Depth and texture coordinates are interpolated linearly in screen space:
//! first along the two edges bounding a scanline (using Y progress), then
//! across the span between them (using X progress). Every pixel is depth
//! tested before it is written.

use super::{Fill, Rasterizer};
use crate::math::Vec2;
use crate::render::framebuffer::FrameBuffer;
use crate::render::triangle::ProjectedTriangle;

const EPSILON: f64 = 1e-9;

/// A screen vertex with the attributes carried across a triangle.
#[derive(Clone, Copy, Debug)]
struct ScanVertex {
    x: f64,
    y: f64,
    z: f64,
    uv: Vec2,
}

impl ScanVertex {
    #[inline]
    fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
            uv: self.uv.lerp(other.uv, t),
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.uv.is_finite()
    }
}

/// Scanline-based triangle rasterizer.
///
/// The rasterizer handles vertex sorting internally, so input triangles can
/// have vertices in any order and either winding.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScanlineRasterizer;

impl ScanlineRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Sorts three vertices by Y coordinate (ascending: top to bottom in screen space).
    /// After sorting: `v[0].y <= v[1].y <= v[2].y`
    fn sort_vertices(v: &mut [ScanVertex; 3]) {
        if v[1].y < v[0].y {
            v.swap(0, 1);
        }
        if v[2].y < v[1].y {
            v.swap(1, 2);
        }
        if v[1].y < v[0].y {
            v.swap(0, 1);
        }
    }

    /// Writes one pixel through the depth test.
    #[inline]
    fn shade(x: i32, y: i32, p: &ScanVertex, buffer: &mut FrameBuffer, fill: &Fill) {
        match fill {
            Fill::Solid(color) => {
                buffer.set_pixel_with_depth(x, y, p.z, *color);
            }
            Fill::Textured {
                texture, fallback, ..
            } => {
                let color = texture.sample(p.uv.x, p.uv.y).unwrap_or(*fallback);
                buffer.set_pixel_with_depth(x, y, p.z, color);
            }
            Fill::DepthOnly => {
                buffer.test_and_write_depth(x, y, p.z);
            }
        }
    }

    /// Fills pixels on row `y` between two edge points.
    fn fill_span(y: i32, a: ScanVertex, b: ScanVertex, buffer: &mut FrameBuffer, fill: &Fill) {
        let (left, right) = if a.x <= b.x { (a, b) } else { (b, a) };
        let span = right.x - left.x;

        let x_start = (left.x.ceil() as i32).max(0);
        let x_end = (right.x.floor() as i32).min(buffer.width() as i32 - 1);

        for x in x_start..=x_end {
            let t = if span.abs() < EPSILON {
                0.0
            } else {
                (x as f64 - left.x) / span
            };
            Self::shade(x, y, &left.lerp(right, t), buffer, fill);
        }
    }

    /// Scanline range covering `[top, bottom]`, clipped to the buffer.
    fn rows(top: f64, bottom: f64, buffer: &FrameBuffer) -> std::ops::RangeInclusive<i32> {
        let start = (top.ceil() as i32).max(0);
        let end = (bottom.floor() as i32).min(buffer.height() as i32 - 1);
        start..=end
    }

    /// Fills a flat-bottom triangle: apex `v0` above `v1` and `v2`, which
    /// share the same Y.
    ///
    /// ```text
    ///        v0 (top)
    ///        /\
    ///       /  \
    ///      /____\
    ///    v1      v2  (same Y)
    /// ```
    fn fill_flat_bottom(
        v0: ScanVertex,
        v1: ScanVertex,
        v2: ScanVertex,
        buffer: &mut FrameBuffer,
        fill: &Fill,
    ) {
        let height = v1.y - v0.y;
        if height.abs() < EPSILON {
            return;
        }
        for y in Self::rows(v0.y, v1.y, buffer) {
            let t = (y as f64 - v0.y) / height;
            Self::fill_span(y, v0.lerp(v1, t), v0.lerp(v2, t), buffer, fill);
        }
    }

    /// Fills a flat-top triangle: `v0` and `v1` share the same Y above the
    /// bottom vertex `v2`.
    ///
    /// ```text
    ///   v0______v1  (same Y)
    ///     \    /
    ///      \  /
    ///       \/
    ///       v2 (bottom)
    /// ```
    fn fill_flat_top(
        v0: ScanVertex,
        v1: ScanVertex,
        v2: ScanVertex,
        buffer: &mut FrameBuffer,
        fill: &Fill,
    ) {
        let height = v2.y - v0.y;
        if height.abs() < EPSILON {
            return;
        }
        for y in Self::rows(v0.y, v2.y, buffer) {
            let t = (y as f64 - v0.y) / height;
            Self::fill_span(y, v0.lerp(v2, t), v1.lerp(v2, t), buffer, fill);
        }
    }
}

impl Rasterizer for ScanlineRasterizer {
    fn fill_triangle(&self, triangle: &ProjectedTriangle, buffer: &mut FrameBuffer, fill: &Fill) {
        let uvs = match fill {
            Fill::Textured { coords, .. } => *coords,
            _ => [Vec2::ZERO; 3],
        };
        let mut v = [0, 1, 2].map(|i| ScanVertex {
            x: triangle.points[i].x,
            y: triangle.points[i].y,
            z: triangle.depths[i],
            uv: uvs[i],
        });
        if v.iter().any(|p| !p.is_finite()) {
            return;
        }

        Self::sort_vertices(&mut v);
        let [v0, v1, v2] = v;

        // Already flat-bottom
        if (v1.y - v2.y).abs() < EPSILON {
            Self::fill_flat_bottom(v0, v1, v2, buffer, fill);
            return;
        }

        // Already flat-top
        if (v0.y - v1.y).abs() < EPSILON {
            Self::fill_flat_top(v0, v1, v2, buffer, fill);
            return;
        }

        // General triangle: the split point lies on edge v0->v2 at v1's Y.
        let t = (v1.y - v0.y) / (v2.y - v0.y);
        let split = v0.lerp(v2, t);

        Self::fill_flat_bottom(v0, v1, split, buffer, fill);
        Self::fill_flat_top(v1, split, v2, buffer, fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{BLUE, RED, WHITE};
    use crate::render::framebuffer::ZBuffer;
    use crate::texture::Texture;
    use image::RgbaImage;

    fn quad_halves(depth: f64, color: image::Rgba<u8>) -> [ProjectedTriangle; 2] {
        [
            ProjectedTriangle::new(
                [Vec2::new(0.0, 0.0), Vec2::new(9.0, 0.0), Vec2::new(0.0, 9.0)],
                [depth; 3],
                color,
            ),
            ProjectedTriangle::new(
                [Vec2::new(9.0, 0.0), Vec2::new(9.0, 9.0), Vec2::new(0.0, 9.0)],
                [depth; 3],
                color,
            ),
        ]
    }

    fn render(order: &[&ProjectedTriangle]) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(10, 10, WHITE);
        let mut depth = ZBuffer::new(10, 10);
        let mut fb = FrameBuffer::new(&mut image, &mut depth);
        for tri in order {
            ScanlineRasterizer.fill_triangle(tri, &mut fb, &Fill::Solid(tri.color));
        }
        image
    }

    #[test]
    fn nearer_triangle_wins_regardless_of_order() {
        let near = quad_halves(0.2, RED);
        let far = quad_halves(0.8, BLUE);
        let a = render(&[&far[0], &far[1], &near[0], &near[1]]);
        let b = render(&[&near[0], &near[1], &far[0], &far[1]]);
        assert_eq!(a, b);
        assert!(a.pixels().all(|p| *p == RED));
    }

    #[test]
    fn covers_interior_and_leaves_outside() {
        let tri = ProjectedTriangle::new(
            [Vec2::new(1.0, 1.0), Vec2::new(8.0, 1.0), Vec2::new(1.0, 8.0)],
            [0.0; 3],
            RED,
        );
        let image = render(&[&tri]);
        assert_eq!(*image.get_pixel(2, 2), RED);
        assert_eq!(*image.get_pixel(8, 8), WHITE);
        assert_eq!(*image.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn texture_is_sampled_with_interpolated_uvs() {
        // left column red, right column blue
        let texture = Texture::from_image(RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                RED
            } else {
                BLUE
            }
        }));
        let tri = ProjectedTriangle::new(
            [Vec2::new(0.0, 0.0), Vec2::new(9.0, 0.0), Vec2::new(0.0, 9.0)],
            [0.0; 3],
            WHITE,
        );
        let fill = Fill::Textured {
            texture: &texture,
            coords: [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            fallback: WHITE,
        };
        let mut image = RgbaImage::from_pixel(10, 10, WHITE);
        let mut depth = ZBuffer::new(10, 10);
        ScanlineRasterizer.fill_triangle(&tri, &mut FrameBuffer::new(&mut image, &mut depth), &fill);
        assert_eq!(*image.get_pixel(0, 0), RED);
        assert_eq!(*image.get_pixel(9, 0), BLUE);
    }

    #[test]
    fn depth_only_fill_leaves_color() {
        let tri = ProjectedTriangle::new(
            [Vec2::new(0.0, 0.0), Vec2::new(9.0, 0.0), Vec2::new(0.0, 9.0)],
            [0.3; 3],
            RED,
        );
        let mut image = RgbaImage::from_pixel(10, 10, WHITE);
        let mut depth = ZBuffer::new(10, 10);
        ScanlineRasterizer.fill_triangle(
            &tri,
            &mut FrameBuffer::new(&mut image, &mut depth),
            &Fill::DepthOnly,
        );
        assert!(image.pixels().all(|p| *p == WHITE));
        assert_eq!(depth.get(1, 1), 0.3);
    }
}
