//! A CPU-based software 3D rendering pipeline.
//!
//! Scenes of triangle meshes are culled with an octree and the camera
//! frustum, clipped in homogeneous clip space, projected, z-buffered and
//! scan-converted into an [`image::RgbaImage`]. Optional depth-based passes
//! add edge outlines and pseudo-shading. No graphics API is involved.
//!
//! # Quick Start
//!
//! ```ignore
//! use threedview::prelude::*;
//!
//! let mut scene = Scene::new(800, 600);
//! scene.add_object(shapes::cube(100.0, colors::RED));
//! scene.set_camera(Camera::looking_at(Vec3::new(0.0, 0.0, 400.0), Vec3::ZERO));
//!
//! let renderer = Renderer::new(RendererConfig::default())?;
//! let image = renderer.render(&scene);
//! ```

// Public API - exposed to library consumers
pub mod camera;
pub mod clipper;
pub mod colors;
pub mod config;
pub mod culling;
pub mod error;
pub mod face;
pub mod math;
pub mod object;
pub mod render;
pub mod scene;
pub mod shapes;
pub mod texture;
pub mod timing;

// Window & model loading, only with the viewer
#[cfg(feature = "viewer")]
pub mod obj;
#[cfg(feature = "viewer")]
pub mod window;

// Re-export commonly needed types at crate root for convenience
pub use camera::Camera;
pub use config::{EdgeDetectionConfig, RenderToggles, RendererConfig, ShadingConfig};
pub use error::{Error, Result};
pub use face::Face;
pub use object::Object;
pub use render::{FrameStats, Renderer};
pub use scene::{Scene, SceneHost};
pub use texture::Texture;

/// Prelude module for convenient imports.
///
/// # Example
/// ```ignore
/// use threedview::prelude::*;
/// ```
pub mod prelude {
    // Camera
    pub use crate::camera::{Camera, CameraController, ManualController, OrbitController};

    // Scene
    pub use crate::face::Face;
    pub use crate::object::Object;
    pub use crate::scene::{Scene, SceneHost, TickState};
    pub use crate::shapes;
    pub use crate::texture::Texture;

    // Rendering
    pub use crate::colors;
    pub use crate::config::{EdgeDetectionConfig, RenderToggles, RendererConfig, ShadingConfig};
    pub use crate::render::{FrameStats, Renderer};
    pub use crate::timing::{spawn_render_loop, spawn_tick_loop, LoopHandle, RateLimiter};

    // Math
    pub use crate::math::{Aabb, Mat4, Quat, Vec2, Vec3, Vec4};
}

/// Module exposing internals for benchmarking. Not part of the stable API.
pub mod bench {
    pub use crate::clipper::clip_and_project;
    pub use crate::culling::{Frustum, Octree};
    pub use crate::render::{
        Fill, FrameBuffer, ProjectedTriangle, Rasterizer, ScanlineRasterizer, ZBuffer,
    };
}
