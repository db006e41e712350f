//! Frame buffer abstraction for 2D pixel access.
//!
//! Provides a view over the frame image and its depth buffer with
//! bounds-checked access. Depth is NDC z in [-1, 1]: smaller values are
//! closer to the camera and `+∞` marks a pixel nothing was drawn to.

use image::{Rgba, RgbaImage};

/// Per-pixel minimum depth for one frame, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct ZBuffer {
    data: Vec<f64>,
    width: u32,
    height: u32,
}

impl ZBuffer {
    /// A buffer with every pixel at `+∞`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![f64::INFINITY; width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Depth at (x, y); out-of-bounds reads as `+∞`.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> f64 {
        self.index(x, y).map_or(f64::INFINITY, |i| self.data[i])
    }

    pub fn set(&mut self, x: i32, y: i32, depth: f64) {
        if let Some(i) = self.index(x, y) {
            self.data[i] = depth;
        }
    }

    /// Row-major depths.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// True when something was drawn at (x, y).
    pub fn has_depth(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_finite()
    }
}

/// Mutable view over a frame image and its depth buffer.
pub struct FrameBuffer<'a> {
    image: &'a mut RgbaImage,
    depth: &'a mut ZBuffer,
}

impl<'a> FrameBuffer<'a> {
    pub fn new(image: &'a mut RgbaImage, depth: &'a mut ZBuffer) -> Self {
        debug_assert_eq!(
            image.dimensions(),
            (depth.width(), depth.height()),
            "Depth buffer size doesn't match image"
        );
        Self { image, depth }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width() as i32 && y >= 0 && y < self.height() as i32
    }

    /// Depth test: writes depth and color when `depth` is strictly nearer
    /// than what is stored. Returns whether the pixel was written.
    #[inline]
    pub fn set_pixel_with_depth(&mut self, x: i32, y: i32, depth: f64, color: Rgba<u8>) -> bool {
        if !self.test_and_write_depth(x, y, depth) {
            return false;
        }
        self.image.put_pixel(x as u32, y as u32, color);
        true
    }

    /// Depth-only write, for frames that need depth but no fill color.
    #[inline]
    pub fn test_and_write_depth(&mut self, x: i32, y: i32, depth: f64) -> bool {
        if !self.in_bounds(x, y) || depth.is_nan() || depth >= self.depth.get(x, y) {
            return false;
        }
        self.depth.set(x, y, depth);
        true
    }

    /// Writes color when `depth` is no farther than the stored depth plus
    /// `bias`. Depth is left untouched.
    #[inline]
    pub fn set_pixel_if_visible(&mut self, x: i32, y: i32, depth: f64, bias: f64, color: Rgba<u8>) {
        if self.in_bounds(x, y) && depth <= self.depth.get(x, y) + bias {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Set a pixel without depth testing.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if self.in_bounds(x, y) {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Get the color at (x, y), or None if out of bounds.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        self.in_bounds(x, y)
            .then(|| *self.image.get_pixel(x as u32, y as u32))
    }

    pub fn depth(&self) -> &ZBuffer {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{BLUE, RED, WHITE};

    #[test]
    fn nearer_depth_wins() {
        let mut image = RgbaImage::from_pixel(2, 2, WHITE);
        let mut depth = ZBuffer::new(2, 2);
        let mut fb = FrameBuffer::new(&mut image, &mut depth);

        assert!(fb.set_pixel_with_depth(0, 0, 0.5, RED));
        assert!(!fb.set_pixel_with_depth(0, 0, 0.7, BLUE));
        assert!(!fb.set_pixel_with_depth(0, 0, 0.5, BLUE));
        assert!(fb.set_pixel_with_depth(0, 0, 0.1, BLUE));
        assert_eq!(fb.get_pixel(0, 0), Some(BLUE));
        assert!(!fb.set_pixel_with_depth(5, 0, 0.0, RED));
    }

    #[test]
    fn visibility_test_does_not_write_depth() {
        let mut image = RgbaImage::from_pixel(1, 1, WHITE);
        let mut depth = ZBuffer::new(1, 1);
        depth.set(0, 0, 0.5);
        let mut fb = FrameBuffer::new(&mut image, &mut depth);

        fb.set_pixel_if_visible(0, 0, 0.6, 0.01, RED);
        assert_eq!(fb.get_pixel(0, 0), Some(WHITE));
        fb.set_pixel_if_visible(0, 0, 0.505, 0.01, RED);
        assert_eq!(fb.get_pixel(0, 0), Some(RED));
        assert_eq!(fb.depth().get(0, 0), 0.5);
    }
}
