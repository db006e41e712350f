use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::error::Result;

/// Represents a 2D texture for texture mapping.
#[derive(Clone, Debug)]
pub struct Texture {
    image: RgbaImage,
}

impl Texture {
    /// Load a texture from an image file (PNG, JPG, etc.)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let image = image::open(path)?.to_rgba8();
        Ok(Self { image })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Sample the texture at UV coordinates using nearest-neighbor filtering.
    ///
    /// # UV Coordinate Convention
    /// - UVs are clamped to [0,1]
    /// - (0,0) = bottom-left, textures are stored top-left origin, so V is flipped
    ///
    /// Returns `None` for an empty image so callers can fall back to a solid color.
    #[inline]
    pub fn sample(&self, u: f64, v: f64) -> Option<Rgba<u8>> {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 || !u.is_finite() || !v.is_finite() {
            return None;
        }
        let u = u.clamp(0.0, 1.0);
        let v = (1.0 - v).clamp(0.0, 1.0);

        let x = ((u * (width - 1) as f64).floor() as u32).min(width - 1);
        let y = ((v * (height - 1) as f64).floor() as u32).min(height - 1);
        Some(*self.image.get_pixel(x, y))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{BLUE, RED};

    fn two_row_texture() -> Texture {
        // top row red, bottom row blue
        Texture::from_image(RgbaImage::from_fn(2, 2, |_, y| if y == 0 { RED } else { BLUE }))
    }

    #[test]
    fn v_is_flipped() {
        let tex = two_row_texture();
        assert_eq!(tex.sample(0.0, 1.0), Some(RED));
        assert_eq!(tex.sample(0.0, 0.0), Some(BLUE));
    }

    #[test]
    fn out_of_range_uvs_are_clamped() {
        let tex = two_row_texture();
        assert_eq!(tex.sample(-3.0, 7.0), Some(RED));
        assert_eq!(tex.sample(2.0, -1.0), Some(BLUE));
    }

    #[test]
    fn empty_texture_samples_nothing() {
        let tex = Texture::from_image(RgbaImage::new(0, 0));
        assert_eq!(tex.sample(0.5, 0.5), None);
    }
}
