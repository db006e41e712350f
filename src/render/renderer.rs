//! Per-frame orchestration.
//!
//! The [`Renderer`] owns the worker pool and turns a [`SceneHost`] into an
//! image. Each stage is a barrier: the next one starts only after the
//! previous one has been fully collected.
//!
//! ```text
//! capture ─► background ─► index refresh + octree query ─► frustum test
//!        ─► clip/project ─► sort far to near ─► fill ─► outlines
//!        ─► z-buffer view ─► edge outline ─► pseudo-shading
//! ```

use std::sync::Arc;

use image::RgbaImage;

use super::context::FrameContext;
use super::framebuffer::{FrameBuffer, ZBuffer};
use super::postprocess::{apply_edge_outline, apply_pseudo_shading, render_zbuffer};
use super::rasterizer::{draw_triangle_outline, Fill, Rasterizer, ScanlineRasterizer};
use super::triangle::ProjectedTriangle;
use super::worker::WorkerPool;
use crate::colors;
use crate::config::{RenderToggles, RendererConfig};
use crate::culling::Octree;
use crate::error::Result;
use crate::face::Face;
use crate::scene::SceneHost;

/// Counts from the last rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Faces returned by the octree query.
    pub candidates: usize,
    /// Faces that passed the per-face frustum test.
    pub visible: usize,
    /// Triangles produced by clipping and triangulation.
    pub triangles: usize,
}

pub struct Renderer {
    config: RendererConfig,
    pool: WorkerPool,
    rasterizer: ScanlineRasterizer,
}

impl Renderer {
    /// Starts `config.worker_count` render workers.
    pub fn new(config: RendererConfig) -> Result<Self> {
        let pool = WorkerPool::new(config.worker_count)?;
        Ok(Self {
            config,
            pool,
            rasterizer: ScanlineRasterizer::new(),
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Post-processing and batching settings apply from the next frame.
    /// The worker count is fixed at construction.
    pub fn config_mut(&mut self) -> &mut RendererConfig {
        &mut self.config
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn render<H: SceneHost + ?Sized>(&self, host: &H) -> RgbaImage {
        self.render_with_stats(host).0
    }

    pub fn render_with_stats<H: SceneHost + ?Sized>(&self, host: &H) -> (RgbaImage, FrameStats) {
        let frame = Arc::new(FrameContext::capture(host));
        let toggles = frame.toggles;
        let mut stats = FrameStats::default();
        let mut image = RgbaImage::from_pixel(frame.width, frame.height, frame.background);

        let objects = host.objects();
        if objects.is_empty() || !toggles.needs_geometry() {
            return (image, stats);
        }
        let mut zbuffer = ZBuffer::new(frame.width, frame.height);

        let camera = host.camera();
        if camera.refresh_index(objects) {
            log::debug!("spatial index rebuilt for {} objects", objects.len());
        }
        let candidates: Vec<Face> = Octree::query(camera.index(), frame.projector.frustum)
            .into_iter()
            .collect();
        stats.candidates = candidates.len();

        let visible = self
            .pool
            .frustum_test(&frame, candidates, self.config.frustum_batch_size);
        stats.visible = visible.len();

        let mut triangles = self.pool.clip_and_project(&frame, visible);
        // farthest first
        triangles.sort_by(|a, b| b.distance.total_cmp(&a.distance));
        stats.triangles = triangles.len();

        {
            let mut buffer = FrameBuffer::new(&mut image, &mut zbuffer);
            self.fill(&triangles, &mut buffer, &toggles);
            if toggles.face_outlines {
                self.outline(&triangles, &mut buffer, &toggles);
            }
        }

        if toggles.zbuffer_debug {
            image = render_zbuffer(&zbuffer);
        }
        if toggles.edge_outline {
            let painted = apply_edge_outline(&mut image, &zbuffer, &self.config.edge_detection);
            log::trace!("edge outline painted {painted} pixels");
        }
        if toggles.pseudo_shading {
            apply_pseudo_shading(&mut image, &zbuffer, &self.config.shading);
        }

        log::debug!(
            "frame {}x{}: {} candidates, {} visible, {} triangles",
            frame.width,
            frame.height,
            stats.candidates,
            stats.visible,
            stats.triangles
        );
        (image, stats)
    }

    /// Fills every triangle. With fills toggled off only depth is written,
    /// so outlines and the depth passes still see occlusion.
    fn fill(&self, triangles: &[ProjectedTriangle], buffer: &mut FrameBuffer, toggles: &RenderToggles) {
        for triangle in triangles {
            let fill = if !toggles.fills() {
                Fill::DepthOnly
            } else {
                match triangle.texturing() {
                    Some((texture, coords)) if toggles.samples_textures() => Fill::Textured {
                        texture,
                        coords: *coords,
                        fallback: triangle.color,
                    },
                    _ => Fill::Solid(triangle.color),
                }
            };
            self.rasterizer.fill_triangle(triangle, buffer, &fill);
        }
    }

    fn outline(&self, triangles: &[ProjectedTriangle], buffer: &mut FrameBuffer, toggles: &RenderToggles) {
        let bias = self.config.outline_depth_bias;
        for triangle in triangles {
            let color = if toggles.fills() {
                colors::BLACK
            } else {
                triangle.color
            };
            draw_triangle_outline(buffer, triangle, color, bias);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::math::{Quat, Vec3};
    use crate::object::Object;
    use crate::scene::Scene;
    use crate::shapes;

    fn renderer() -> Renderer {
        let mut config = RendererConfig::default();
        config.set_worker_count(2);
        Renderer::new(config).unwrap()
    }

    fn cube_scene() -> Scene {
        let mut scene = Scene::new(64, 64);
        scene.set_background(colors::WHITE);
        scene.set_camera(Camera::new(Vec3::new(0.0, 0.0, 3.0), Quat::IDENTITY));
        scene.add_object(shapes::cube(1.0, colors::RED));
        scene
    }

    #[test]
    fn empty_scene_is_background() {
        let mut scene = Scene::new(8, 8);
        scene.set_background(colors::BLUE);
        let (image, stats) = renderer().render_with_stats(&scene);
        assert!(image.pixels().all(|p| *p == colors::BLUE));
        assert_eq!(stats, FrameStats::default());
    }

    #[test]
    fn nothing_toggled_skips_geometry() {
        let mut scene = cube_scene();
        scene.set_toggles(RenderToggles::none());
        let (image, stats) = renderer().render_with_stats(&scene);
        assert_eq!(stats.triangles, 0);
        assert!(image.pixels().all(|p| *p == colors::WHITE));
    }

    #[test]
    fn fills_off_still_hides_back_outlines() {
        let mut scene = cube_scene();
        scene.set_toggles(RenderToggles {
            face_outlines: true,
            ..RenderToggles::none()
        });
        let image = renderer().render(&scene);
        // outline colors come from the faces when fills are off
        assert!(image.pixels().any(|p| *p == colors::RED));
        assert_eq!(*image.get_pixel(0, 0), colors::WHITE);
    }

    #[test]
    fn textures_alone_do_not_fill() {
        let mut scene = cube_scene();
        scene.set_toggles(RenderToggles {
            textures: true,
            ..RenderToggles::none()
        });
        let (image, stats) = renderer().render_with_stats(&scene);
        assert_eq!(stats.triangles, 0);
        assert!(image.pixels().all(|p| *p == colors::WHITE));

        // with outlines on, faces are outlined in their own color but not filled
        scene.set_toggles(RenderToggles {
            textures: true,
            face_outlines: true,
            ..RenderToggles::none()
        });
        let image = renderer().render(&scene);
        let red = image.pixels().filter(|p| **p == colors::RED).count();
        assert!(red > 0 && red < 120, "red {red}");
        assert!(image.pixels().all(|p| *p != colors::BLACK));
        // inside the front face, off its diagonal
        assert_eq!(*image.get_pixel(35, 35), colors::WHITE);
    }

    #[test]
    fn zbuffer_view_replaces_the_frame() {
        let mut scene = cube_scene();
        scene.set_toggles(RenderToggles {
            zbuffer_debug: true,
            ..RenderToggles::default()
        });
        let image = renderer().render(&scene);
        assert!(image.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
        assert_eq!(*image.get_pixel(0, 0), colors::WHITE);
    }

    #[test]
    fn moving_an_object_rebuilds_the_index() {
        let mut scene = cube_scene();
        let renderer = renderer();
        let (_, before) = renderer.render_with_stats(&scene);
        assert_eq!(before.triangles, 12);

        scene.objects_mut()[0].translate(Vec3::new(0.0, 0.0, 10.0));
        assert!(scene.camera().is_index_stale());
        let (image, after) = renderer.render_with_stats(&scene);
        assert_eq!(after.visible, 0);
        assert!(image.pixels().all(|p| *p == colors::WHITE));
    }

    #[test]
    fn scene_objects_can_be_added_after_rendering() {
        let mut scene = cube_scene();
        let renderer = renderer();
        renderer.render(&scene);
        scene.add_object(Object::new("empty", Vec::new()));
        assert!(scene.camera().is_index_stale());
        assert_eq!(renderer.render_with_stats(&scene).1.triangles, 12);
    }
}
