//! Renderer configuration.
//!
//! Plain structs with sensible [`Default`]s and a fluent builder API where
//! setters return `&mut Self` for chaining:
//!
//! ```ignore
//! let mut config = RendererConfig::default();
//! config.set_worker_count(4).set_outline_depth_bias(1e-4);
//! config.edge_detection.set_base_threshold(0.3).set_dilation_radius(2);
//! ```

use std::num::NonZeroUsize;

/// Per-feature switches read by the renderer every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderToggles {
    /// Fill triangles with their face color.
    pub face_colors: bool,
    /// Sample face textures where available. Only read while face colors
    /// are on.
    pub textures: bool,
    /// Draw triangle outlines.
    pub face_outlines: bool,
    /// Outline depth discontinuities found in the z-buffer.
    pub edge_outline: bool,
    /// Replace the frame with a grayscale view of the z-buffer.
    pub zbuffer_debug: bool,
    /// Darken pixels by depth.
    pub pseudo_shading: bool,
}

impl Default for RenderToggles {
    fn default() -> Self {
        Self {
            face_colors: true,
            textures: true,
            face_outlines: false,
            edge_outline: false,
            zbuffer_debug: false,
            pseudo_shading: true,
        }
    }
}

impl RenderToggles {
    /// Every feature off.
    pub const fn none() -> Self {
        Self {
            face_colors: false,
            textures: false,
            face_outlines: false,
            edge_outline: false,
            zbuffer_debug: false,
            pseudo_shading: false,
        }
    }

    /// True when triangles are filled. Without face colors only outlines
    /// are drawn, whatever the texture switch says.
    pub fn fills(&self) -> bool {
        self.face_colors
    }

    /// True when a fill should sample a face's texture.
    pub fn samples_textures(&self) -> bool {
        self.face_colors && self.textures
    }

    /// True when the pipeline needs clipped triangles at all.
    pub fn needs_geometry(&self) -> bool {
        self.fills()
            || self.face_outlines
            || self.edge_outline
            || self.zbuffer_debug
            || self.pseudo_shading
    }
}

/// Tuning for the depth-discontinuity outline pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeDetectionConfig {
    /// Gradient threshold at zero normalized depth.
    pub base_threshold: f64,
    /// How strongly the threshold grows with normalized depth.
    pub depth_modulation: f64,
    /// Exponent applied to the grazing-angle estimate.
    pub grazing_power: f64,
    /// Softness of the grazing-angle mask, in (0, 1].
    pub grazing_hardness: f64,
    /// Radius in pixels by which detected edges are grown.
    pub dilation_radius: u32,
}

impl Default for EdgeDetectionConfig {
    fn default() -> Self {
        Self {
            base_threshold: 0.25,
            depth_modulation: 0.5,
            grazing_power: 2.0,
            grazing_hardness: 0.5,
            dilation_radius: 1,
        }
    }
}

impl EdgeDetectionConfig {
    pub fn set_base_threshold(&mut self, value: f64) -> &mut Self {
        self.base_threshold = value;
        self
    }

    pub fn set_depth_modulation(&mut self, value: f64) -> &mut Self {
        self.depth_modulation = value;
        self
    }

    pub fn set_grazing_power(&mut self, value: f64) -> &mut Self {
        self.grazing_power = value;
        self
    }

    pub fn set_grazing_hardness(&mut self, value: f64) -> &mut Self {
        self.grazing_hardness = value;
        self
    }

    pub fn set_dilation_radius(&mut self, radius: u32) -> &mut Self {
        self.dilation_radius = radius;
        self
    }
}

/// Shade range for the depth-darkening pass. Nearest pixels get
/// `max_shade`, farthest get `min_shade`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadingConfig {
    pub min_shade: f64,
    pub max_shade: f64,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            min_shade: 0.5,
            max_shade: 1.0,
        }
    }
}

impl ShadingConfig {
    pub fn set_range(&mut self, min_shade: f64, max_shade: f64) -> &mut Self {
        self.min_shade = min_shade;
        self.max_shade = max_shade;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererConfig {
    /// Number of render worker threads.
    pub worker_count: usize,
    /// Faces per frustum-test instruction.
    pub frustum_batch_size: usize,
    /// Slack allowed when depth testing outlines against filled pixels.
    pub outline_depth_bias: f64,
    pub edge_detection: EdgeDetectionConfig,
    pub shading: ShadingConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            worker_count: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4),
            frustum_batch_size: 64,
            outline_depth_bias: 1e-5,
            edge_detection: EdgeDetectionConfig::default(),
            shading: ShadingConfig::default(),
        }
    }
}

impl RendererConfig {
    pub fn set_worker_count(&mut self, count: usize) -> &mut Self {
        self.worker_count = count;
        self
    }

    pub fn set_frustum_batch_size(&mut self, size: usize) -> &mut Self {
        self.frustum_batch_size = size.max(1);
        self
    }

    pub fn set_outline_depth_bias(&mut self, bias: f64) -> &mut Self {
        self.outline_depth_bias = bias;
        self
    }
}
