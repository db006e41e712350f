//! Color constants and small helpers over [`image::Rgba<u8>`].

use image::Rgba;

pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Opaque color from 8-bit channels.
#[inline]
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

/// Opaque gray level.
#[inline]
pub const fn gray(level: u8) -> Rgba<u8> {
    Rgba([level, level, level, 255])
}

/// Multiplies the RGB channels by `factor` (clamped to [0, 1]); alpha is kept.
#[inline]
pub fn modulate(color: Rgba<u8>, factor: f64) -> Rgba<u8> {
    let factor = if factor.is_nan() { 1.0 } else { factor.clamp(0.0, 1.0) };
    let [r, g, b, a] = color.0;
    let scale = |c: u8| (c as f64 * factor).round() as u8;
    Rgba([scale(r), scale(g), scale(b), a])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulate_scales_rgb_only() {
        assert_eq!(modulate(Rgba([200, 100, 50, 128]), 0.5), Rgba([100, 50, 25, 128]));
        assert_eq!(modulate(WHITE, 2.0), WHITE);
        assert_eq!(modulate(WHITE, f64::NAN), WHITE);
    }
}
