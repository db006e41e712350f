use image::Rgba;

use crate::camera::Projector;
use crate::config::RenderToggles;
use crate::scene::SceneHost;

/// Everything a frame needs from its host, captured once when the frame
/// starts and shared read-only with the workers.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext {
    pub width: u32,
    pub height: u32,
    pub background: Rgba<u8>,
    pub toggles: RenderToggles,
    pub projector: Projector,
}

impl FrameContext {
    /// Snapshot of `host`. The camera's cached projector is used when it was
    /// updated for this viewport; otherwise a fresh one is built.
    pub fn capture<H: SceneHost + ?Sized>(host: &H) -> Self {
        let (width, height) = host.viewport();
        let camera = host.camera();
        let cached = camera.projector();
        let projector = if cached.width == width as f64 && cached.height == height as f64 {
            cached
        } else {
            log::debug!("camera cache is for another viewport, projecting for {width}x{height}");
            camera.projector_for(width, height)
        };
        Self {
            width,
            height,
            background: host.background(),
            toggles: host.toggles(),
            projector,
        }
    }
}
