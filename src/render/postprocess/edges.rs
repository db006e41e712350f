//! Depth-discontinuity outlines.
//!
//! A Sobel filter runs over the normalized log-depth field. Each pixel has
//! its own threshold, higher for distant pixels and lowered where the
//! gradient suggests the surface is seen at a grazing angle. Marked pixels
//! are grown by the dilation radius and painted black.

use image::RgbaImage;
use rayon::prelude::*;

use super::depth::{log_depth, DepthRange};
use crate::colors;
use crate::config::EdgeDetectionConfig;
use crate::render::framebuffer::ZBuffer;

/// Gradients at or below this are treated as flat for the grazing estimate.
const FLAT_GRADIENT: f64 = 0.001;

/// Normalized log depth per pixel. Pixels without depth sit at the far end
/// of the range so silhouettes against the background register as edges.
fn normalized_field(zbuffer: &ZBuffer, range: &DepthRange) -> Vec<f64> {
    zbuffer
        .as_slice()
        .par_iter()
        .map(|&z| range.normalize(log_depth(z).unwrap_or(range.max)))
        .collect()
}

/// Lowers the threshold by up to half where the surface normal implied by
/// the gradient turns away from the viewer.
fn grazing_mask(sx: f64, sy: f64, gradient: f64, config: &EdgeDetectionConfig) -> f64 {
    if gradient <= FLAT_GRADIENT {
        return 0.0;
    }
    let mut nz = 1.0 / (sx * sx + sy * sy + 1.0).sqrt();
    if nz.is_nan() {
        nz = 0.0;
    }
    let fresnel = (1.0 - nz).max(0.0).powf(config.grazing_power);
    let hardness = config.grazing_hardness.max(f64::EPSILON);
    ((fresnel + hardness - 1.0) / hardness).clamp(0.0, 1.0)
}

/// Row-major edge mask for the frame, before dilation.
pub fn detect_edges(zbuffer: &ZBuffer, config: &EdgeDetectionConfig) -> Vec<bool> {
    let (width, height) = (zbuffer.width() as usize, zbuffer.height() as usize);
    let mut mask = vec![false; width * height];
    let Some(range) = DepthRange::from_zbuffer(zbuffer) else {
        return mask;
    };
    if width < 3 || height < 3 {
        return mask;
    }

    let field = normalized_field(zbuffer, &range);
    let at = |x: usize, y: usize| field[y * width + x];

    mask.par_chunks_mut(width)
        .enumerate()
        .skip(1)
        .take(height - 2)
        .for_each(|(y, row)| {
            for x in 1..width - 1 {
                let sx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
                let sy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
                let gradient = (sx * sx + sy * sy).sqrt();

                let mut threshold =
                    config.base_threshold * (1.0 + config.depth_modulation * at(x, y));
                threshold /= 1.0 + grazing_mask(sx, sy, gradient, config);
                row[x] = gradient > threshold;
            }
        });
    mask
}

/// Grows every marked pixel to a disc of `radius`.
pub fn dilate(mask: &[bool], width: usize, height: usize, radius: u32) -> Vec<bool> {
    if radius == 0 {
        return mask.to_vec();
    }
    let r = radius as i64;
    let mut grown = vec![false; mask.len()];
    grown.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            'search: for dy in -r..=r {
                let ny = y as i64 + dy;
                if ny < 0 || ny >= height as i64 {
                    continue;
                }
                for dx in -r..=r {
                    let nx = x as i64 + dx;
                    if nx < 0 || nx >= width as i64 || dx * dx + dy * dy > r * r {
                        continue;
                    }
                    if mask[ny as usize * width + nx as usize] {
                        *out = true;
                        break 'search;
                    }
                }
            }
        }
    });
    grown
}

/// Detects, dilates and paints depth edges onto `image`. Returns the number
/// of pixels painted.
pub fn apply_edge_outline(
    image: &mut RgbaImage,
    zbuffer: &ZBuffer,
    config: &EdgeDetectionConfig,
) -> usize {
    let (width, height) = (zbuffer.width() as usize, zbuffer.height() as usize);
    let edges = detect_edges(zbuffer, config);
    let edges = dilate(&edges, width, height, config.dilation_radius);

    let mut painted = 0;
    for (pixel, edge) in image.pixels_mut().zip(edges) {
        if edge {
            *pixel = colors::BLACK;
            painted += 1;
        }
    }
    painted
}
