//! Log-depth statistics shared by the depth-based passes.

use crate::render::framebuffer::ZBuffer;

/// Fraction of the sorted log depths cut from each end before normalizing,
/// so single outlier depths do not flatten the contrast.
const LOW_PERCENTILE: f64 = 0.02;
const HIGH_PERCENTILE: f64 = 0.98;

/// Log of a buffer depth; only finite, strictly positive depths have one.
#[inline]
pub fn log_depth(z: f64) -> Option<f64> {
    (z.is_finite() && z > 0.0).then(|| z.ln())
}

/// Percentile-clipped range of log depths in one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthRange {
    pub min: f64,
    pub max: f64,
}

impl DepthRange {
    /// `None` when no pixel has a usable depth.
    pub fn from_zbuffer(zbuffer: &ZBuffer) -> Option<Self> {
        let mut values: Vec<f64> = zbuffer
            .as_slice()
            .iter()
            .filter_map(|&z| log_depth(z))
            .collect();
        if values.is_empty() {
            return None;
        }

        let last = values.len() - 1;
        let mut low = (values.len() as f64 * LOW_PERCENTILE) as usize;
        let mut high = ((values.len() as f64 * HIGH_PERCENTILE) as usize).min(last);
        if high <= low {
            low = 0;
            high = last;
        }

        let (_, &mut min, rest) = values.select_nth_unstable_by(low, f64::total_cmp);
        let max = if high == low {
            min
        } else {
            *rest.select_nth_unstable_by(high - low - 1, f64::total_cmp).1
        };

        if min == max {
            return Some(Self { min: 0.0, max: 1.0 });
        }
        Some(Self { min, max })
    }

    /// Maps a log depth into [0, 1]; 0 is nearest.
    #[inline]
    pub fn normalize(&self, log_z: f64) -> f64 {
        ((log_z - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}
