//! SDL2 window that presents rendered frames and reports mouse input.

use image::RgbaImage;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseButton;
use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect;

pub const WINDOW_WIDTH: u32 = 800;
pub const WINDOW_HEIGHT: u32 = 600;

/// `RgbaImage` stores bytes as R, G, B, A; on little-endian hosts that is
/// SDL's packed ABGR8888.
const FRAME_FORMAT: PixelFormatEnum = PixelFormatEnum::ABGR8888;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEvent {
    Quit,
    Resize(u32, u32),
    /// Mouse moved with the left button held, in pixels.
    Drag(f64, f64),
    DragEnd,
    Scroll(f64, f64),
}

pub struct Window {
    texture: sdl2::render::Texture<'static>,
    texture_creator: Box<sdl2::render::TextureCreator<sdl2::video::WindowContext>>,
    canvas: sdl2::render::Canvas<sdl2::video::Window>,
    texture_size: (u32, u32),
    event_pump: sdl2::EventPump,
    width: u32,
    height: u32,
    dragging: bool,
}

impl Window {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .resizable()
            .build()
            .map_err(|e| e.to_string())?;

        let canvas = window.into_canvas().build().map_err(|e| e.to_string())?;
        let texture_creator = Box::new(canvas.texture_creator());
        let event_pump = sdl_context.event_pump()?;

        // SAFETY: texture_creator is heap-allocated and lives as long as Window.
        // We ensure texture is dropped before texture_creator by struct field order.
        let texture_creator_ref: &'static sdl2::render::TextureCreator<sdl2::video::WindowContext> =
            unsafe { &*(texture_creator.as_ref() as *const _) };
        let texture = texture_creator_ref
            .create_texture_streaming(FRAME_FORMAT, width, height)
            .map_err(|e| e.to_string())?;

        Ok(Self {
            texture,
            texture_creator,
            canvas,
            texture_size: (width, height),
            event_pump,
            width,
            height,
            dragging: false,
        })
    }

    /// Drains pending SDL events into window events.
    pub fn poll_events(&mut self) -> Vec<WindowEvent> {
        let mut events = Vec::new();
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => events.push(WindowEvent::Quit),
                Event::Window {
                    win_event: sdl2::event::WindowEvent::Resized(w, h),
                    ..
                } => {
                    self.width = w.max(1) as u32;
                    self.height = h.max(1) as u32;
                    events.push(WindowEvent::Resize(self.width, self.height));
                }
                Event::MouseButtonDown {
                    mouse_btn: MouseButton::Left,
                    ..
                } => self.dragging = true,
                Event::MouseButtonUp {
                    mouse_btn: MouseButton::Left,
                    ..
                } => {
                    self.dragging = false;
                    events.push(WindowEvent::DragEnd);
                }
                Event::MouseMotion { xrel, yrel, .. } if self.dragging => {
                    events.push(WindowEvent::Drag(xrel as f64, yrel as f64));
                }
                Event::MouseWheel { x, y, .. } => {
                    events.push(WindowEvent::Scroll(x as f64, y as f64));
                }
                _ => {}
            }
        }
        events
    }

    /// Shows a frame stretched over the whole window. The streaming texture
    /// follows the frame size, which differs from the window size when a
    /// resolution factor is set.
    pub fn present(&mut self, frame: &RgbaImage) -> Result<(), String> {
        let size = frame.dimensions();
        if size != self.texture_size {
            // SAFETY: Same as in new() - texture_creator outlives texture
            let texture_creator_ref: &'static sdl2::render::TextureCreator<sdl2::video::WindowContext> =
                unsafe { &*(self.texture_creator.as_ref() as *const _) };
            self.texture = texture_creator_ref
                .create_texture_streaming(FRAME_FORMAT, size.0, size.1)
                .map_err(|e| e.to_string())?;
            self.texture_size = size;
        }

        self.texture
            .update(None, frame.as_raw(), (size.0 * 4) as usize)
            .map_err(|e| e.to_string())?;

        self.canvas.clear();
        self.canvas
            .copy(&self.texture, None, Some(Rect::new(0, 0, self.width, self.height)))?;
        self.canvas.present();
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
