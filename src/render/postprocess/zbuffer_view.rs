use image::RgbaImage;

use super::depth::{log_depth, DepthRange};
use crate::colors;
use crate::render::framebuffer::ZBuffer;

/// Grayscale picture of the depth buffer: near is dark, far is light and
/// pixels without depth are white.
pub fn render_zbuffer(zbuffer: &ZBuffer) -> RgbaImage {
    let (width, height) = (zbuffer.width(), zbuffer.height());
    let mut image = RgbaImage::from_pixel(width, height, colors::WHITE);
    let Some(range) = DepthRange::from_zbuffer(zbuffer) else {
        return image;
    };

    for (pixel, &z) in image.pixels_mut().zip(zbuffer.as_slice()) {
        if !z.is_finite() {
            continue;
        }
        // Depths too close for a log are drawn as nearest.
        let t = log_depth(z).map_or(0.0, |l| range.normalize(l));
        *pixel = colors::gray((t * 255.0).round() as u8);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_is_white() {
        let image = render_zbuffer(&ZBuffer::new(4, 3));
        assert_eq!(image.dimensions(), (4, 3));
        assert!(image.pixels().all(|p| *p == colors::WHITE));
    }

    #[test]
    fn near_is_darker_than_far() {
        let mut z = ZBuffer::new(3, 1);
        z.set(0, 0, 0.3);
        z.set(1, 0, 0.9);
        let image = render_zbuffer(&z);
        assert_eq!(*image.get_pixel(0, 0), colors::gray(0));
        assert_eq!(*image.get_pixel(1, 0), colors::gray(255));
        assert_eq!(*image.get_pixel(2, 0), colors::WHITE);
    }
}
