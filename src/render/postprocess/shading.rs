use image::RgbaImage;

use super::depth::{log_depth, DepthRange};
use crate::colors;
use crate::config::ShadingConfig;
use crate::render::framebuffer::ZBuffer;

/// Darkens every pixel with depth, from `max_shade` at the nearest depth to
/// `min_shade` at the farthest. Background pixels are left alone.
pub fn apply_pseudo_shading(image: &mut RgbaImage, zbuffer: &ZBuffer, config: &ShadingConfig) {
    let Some(range) = DepthRange::from_zbuffer(zbuffer) else {
        return;
    };
    for (pixel, &z) in image.pixels_mut().zip(zbuffer.as_slice()) {
        if !z.is_finite() {
            continue;
        }
        let t = log_depth(z).map_or(0.0, |l| range.normalize(l));
        let factor = config.max_shade + (config.min_shade - config.max_shade) * t;
        *pixel = colors::modulate(*pixel, factor);
    }
}
