//! The host side of rendering: what a frame is rendered from.
//!
//! [`SceneHost`] is the widget-like surface the [`Renderer`] reads each
//! frame. [`Scene`] is the stock implementation used by the loops in
//! [`crate::timing`] and the viewer.
//!
//! [`Renderer`]: crate::render::Renderer

use std::time::{Duration, Instant};

use image::Rgba;

use crate::camera::Camera;
use crate::colors;
use crate::config::RenderToggles;
use crate::error::{Error, Result};
use crate::object::Object;

/// Mutable view of a scene handed to tick callbacks.
pub struct TickState<'a> {
    /// Time since the previous tick; zero on the first.
    pub delta: Duration,
    /// Logical window size, before the resolution factor.
    pub window_size: (u32, u32),
    pub objects: &'a mut [Object],
    pub camera: &'a mut Camera,
}

pub type TickCallback = Box<dyn FnMut(&mut TickState<'_>) + Send + Sync>;

/// What the renderer needs from whoever owns the scene.
pub trait SceneHost {
    /// Render resolution in pixels.
    fn viewport(&self) -> (u32, u32);
    fn background(&self) -> Rgba<u8>;
    fn toggles(&self) -> RenderToggles;
    fn objects(&self) -> &[Object];
    fn camera(&self) -> &Camera;
    /// Adds a callback run on every tick.
    fn register_tick(&mut self, callback: TickCallback);
}

pub struct Scene {
    window_size: (u32, u32),
    resolution_factor: f64,
    background: Rgba<u8>,
    toggles: RenderToggles,
    objects: Vec<Object>,
    camera: Camera,
    ticks: Vec<TickCallback>,
    last_tick: Option<Instant>,
    /// Frames per second for the render loop; `None` is uncapped, zero pauses.
    pub fps_cap: Option<f64>,
    /// Ticks per second for the tick loop; `None` is uncapped, zero pauses.
    pub tps_cap: Option<f64>,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        let mut scene = Self {
            window_size: (width, height),
            resolution_factor: 1.0,
            background: colors::TRANSPARENT,
            toggles: RenderToggles::default(),
            objects: Vec::new(),
            camera: Camera::default(),
            ticks: Vec::new(),
            last_tick: None,
            fps_cap: Some(60.0),
            tps_cap: Some(60.0),
        };
        scene.update_camera();
        scene
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    /// Changes the logical size and refreshes the camera caches.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
        self.update_camera();
    }

    pub fn resolution_factor(&self) -> f64 {
        self.resolution_factor
    }

    /// Scales the render resolution relative to the window size.
    pub fn set_resolution_factor(&mut self, factor: f64) -> Result<&mut Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(Error::InvalidResolutionFactor(factor));
        }
        self.resolution_factor = factor;
        self.update_camera();
        Ok(self)
    }

    pub fn set_background(&mut self, color: Rgba<u8>) -> &mut Self {
        self.background = color;
        self
    }

    pub fn toggles_mut(&mut self) -> &mut RenderToggles {
        &mut self.toggles
    }

    pub fn set_toggles(&mut self, toggles: RenderToggles) -> &mut Self {
        self.toggles = toggles;
        self
    }

    /// Adds an object and links it to the camera's index. Returns its slot.
    pub fn add_object(&mut self, mut object: Object) -> usize {
        object.link_index(self.camera.index_link());
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn remove_object(&mut self, slot: usize) -> Option<Object> {
        if slot >= self.objects.len() {
            return None;
        }
        let object = self.objects.remove(slot);
        self.camera.index_link().mark_stale();
        Some(object)
    }

    pub fn objects_mut(&mut self) -> &mut [Object] {
        &mut self.objects
    }

    pub fn object_mut(&mut self, slot: usize) -> Option<&mut Object> {
        self.objects.get_mut(slot)
    }

    pub fn find_object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name() == name)
    }

    /// Replaces the camera and relinks every object to its index.
    pub fn set_camera(&mut self, camera: Camera) -> Camera {
        let previous = std::mem::replace(&mut self.camera, camera);
        for object in &mut self.objects {
            object.link_index(self.camera.index_link());
        }
        self.update_camera();
        previous
    }

    /// Mutable camera access. Call [`Scene::update_camera`] after moving it
    /// outside a tick.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Recomputes the camera caches for the current viewport.
    pub fn update_camera(&mut self) {
        let (width, height) = self.viewport();
        self.camera.update(width, height);
    }

    /// Runs every tick callback once, then refreshes the camera caches.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let delta = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.duration_since(last));
        self.last_tick = Some(now);

        let mut state = TickState {
            delta,
            window_size: self.window_size,
            objects: &mut self.objects,
            camera: &mut self.camera,
        };
        for callback in &mut self.ticks {
            callback(&mut state);
        }
        self.update_camera();
    }
}

impl SceneHost for Scene {
    fn viewport(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f64 * self.resolution_factor).round() as u32).max(1);
        (scale(self.window_size.0), scale(self.window_size.1))
    }

    fn background(&self) -> Rgba<u8> {
        self.background
    }

    fn toggles(&self) -> RenderToggles {
        self.toggles
    }

    fn objects(&self) -> &[Object] {
        &self.objects
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn register_tick(&mut self, callback: TickCallback) {
        self.ticks.push(callback);
    }
}
