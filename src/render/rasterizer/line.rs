//! Depth-aware Bresenham lines for triangle outlines.

use image::Rgba;

use crate::math::Vec2;
use crate::render::framebuffer::FrameBuffer;
use crate::render::triangle::ProjectedTriangle;

/// Draws a line from `a` to `b` using Bresenham's algorithm.
///
/// Depth is interpolated by the fraction of steps taken. A pixel is drawn
/// when the line is no farther than the z-buffer plus `bias`; lines never
/// write depth, so later fills and outlines see the same buffer.
pub fn draw_line(
    buffer: &mut FrameBuffer,
    a: Vec2,
    depth_a: f64,
    b: Vec2,
    depth_b: f64,
    color: Rgba<u8>,
    bias: f64,
) {
    if !(a.is_finite() && b.is_finite()) {
        return;
    }
    let (x0, y0) = (a.x.floor() as i32, a.y.floor() as i32);
    let (x1, y1) = (b.x.floor() as i32, b.y.floor() as i32);

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let steps = dx.max(dy);

    // Lines this long are far outside the viewport and not worth walking.
    let limit = 4 * (buffer.width() as i32 + buffer.height() as i32).max(1);
    if steps > limit {
        return;
    }

    let x_step = if x0 < x1 { 1 } else { -1 };
    let y_step = if y0 < y1 { 1 } else { -1 };

    let mut err = dx - dy;
    let (mut x, mut y) = (x0, y0);
    let mut step = 0;

    loop {
        let t = if steps == 0 {
            0.0
        } else {
            step as f64 / steps as f64
        };
        let depth = depth_a + (depth_b - depth_a) * t;
        buffer.set_pixel_if_visible(x, y, depth, bias, color);

        if x == x1 && y == y1 {
            break;
        }
        step += 1;

        // Doubled error decides whether to step in x, y, or both.
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += x_step;
        }
        if e2 < dx {
            err += dx;
            y += y_step;
        }
    }
}

/// Outlines the three edges of a projected triangle.
pub fn draw_triangle_outline(
    buffer: &mut FrameBuffer,
    triangle: &ProjectedTriangle,
    color: Rgba<u8>,
    bias: f64,
) {
    let [p0, p1, p2] = triangle.points;
    let [z0, z1, z2] = triangle.depths;
    draw_line(buffer, p0, z0, p1, z1, color, bias);
    draw_line(buffer, p1, z1, p2, z2, color, bias);
    draw_line(buffer, p2, z2, p0, z0, color, bias);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{BLACK, WHITE};
    use crate::render::framebuffer::ZBuffer;
    use image::RgbaImage;

    #[test]
    fn diagonal_line_hits_both_endpoints() {
        let mut image = RgbaImage::from_pixel(8, 8, WHITE);
        let mut depth = ZBuffer::new(8, 8);
        let mut fb = FrameBuffer::new(&mut image, &mut depth);
        draw_line(&mut fb, Vec2::new(0.0, 0.0), 0.0, Vec2::new(7.0, 7.0), 0.0, BLACK, 0.0);
        for i in 0..8 {
            assert_eq!(*image.get_pixel(i, i), BLACK);
        }
        assert_eq!(*image.get_pixel(7, 0), WHITE);
    }

    #[test]
    fn occluded_segment_is_hidden() {
        let mut image = RgbaImage::from_pixel(8, 1, WHITE);
        let mut depth = ZBuffer::new(8, 1);
        for x in 4..8 {
            depth.set(x, 0, 0.1);
        }
        let mut fb = FrameBuffer::new(&mut image, &mut depth);
        draw_line(&mut fb, Vec2::new(0.0, 0.0), 0.5, Vec2::new(7.0, 0.0), 0.5, BLACK, 1e-5);
        assert_eq!(*image.get_pixel(2, 0), BLACK);
        assert_eq!(*image.get_pixel(5, 0), WHITE);
    }
}
