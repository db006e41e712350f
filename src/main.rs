use std::sync::{Arc, PoisonError, RwLock};

use threedview::obj::load_obj;
use threedview::prelude::*;
use threedview::window::{Window, WindowEvent, WINDOW_HEIGHT, WINDOW_WIDTH};

/// Screen position of the orientation gizmo, in window pixels.
const GIZMO_ANCHOR: (f64, f64) = (60.0, 70.0);
const GIZMO_DISTANCE: f64 = 20.0;

fn demo_objects() -> Vec<Object> {
    let mut ground = shapes::plane(600.0, 12, colors::gray(200));
    ground
        .set_rotation(Quat::from_axis_angle(Vec3::X, -std::f64::consts::FRAC_PI_2))
        .set_position(Vec3::new(0.0, -60.0, 0.0));

    let mut cube = shapes::cube(100.0, colors::rgb(220, 80, 60));
    cube.set_position(Vec3::new(-150.0, -10.0, 0.0));

    let mut cylinder = shapes::cylinder(120.0, 40.0, colors::rgb(70, 140, 220));
    cylinder.set_rotation(Quat::from_axis_angle(Vec3::X, std::f64::consts::FRAC_PI_2));

    let mut cone = shapes::cone(120.0, 50.0, colors::rgb(90, 190, 90));
    cone.set_rotation(Quat::from_axis_angle(Vec3::X, -std::f64::consts::FRAC_PI_2))
        .set_position(Vec3::new(150.0, 0.0, 0.0));

    vec![ground, cube, cylinder, cone]
}

fn build_scene() -> Result<Scene, Box<dyn std::error::Error>> {
    let mut scene = Scene::new(WINDOW_WIDTH, WINDOW_HEIGHT);
    scene.set_background(colors::rgb(40, 40, 48));
    scene.toggles_mut().edge_outline = true;

    let objects = match std::env::args().nth(1) {
        Some(path) => load_obj(path)?,
        None => demo_objects(),
    };
    for object in objects {
        scene.add_object(object);
    }

    let gizmo = scene.add_object(shapes::orientation_gizmo());
    let anchor = Vec2::new(GIZMO_ANCHOR.0, GIZMO_ANCHOR.1);
    scene.register_tick(shapes::pin_to_screen(gizmo, anchor, GIZMO_DISTANCE));

    scene
        .camera_mut()
        .set_controller(CameraController::Orbit(OrbitController::new(Vec3::ZERO)));
    scene.update_camera();
    Ok(scene)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut window = Window::new("threedview", WINDOW_WIDTH, WINDOW_HEIGHT)?;
    let scene = Arc::new(RwLock::new(build_scene()?));
    let renderer = Renderer::new(RendererConfig::default())?;
    let _ticks = spawn_tick_loop(Arc::clone(&scene))?;

    let mut limiter = RateLimiter::new("frame", None);
    'running: loop {
        {
            let mut scene = scene.write().unwrap_or_else(PoisonError::into_inner);
            for event in window.poll_events() {
                match event {
                    WindowEvent::Quit => break 'running,
                    WindowEvent::Resize(w, h) => scene.resize(w, h),
                    WindowEvent::Drag(dx, dy) => scene.camera_mut().on_drag(dx, dy),
                    WindowEvent::DragEnd => scene.camera_mut().on_drag_end(),
                    WindowEvent::Scroll(dx, dy) => scene.camera_mut().on_scroll(dx, dy),
                }
            }
            scene.update_camera();
            limiter.set_rate(scene.fps_cap);
        }

        let frame = {
            let scene = scene.read().unwrap_or_else(PoisonError::into_inner);
            renderer.render(&*scene)
        };
        window.present(&frame)?;
        limiter.wait();
    }

    Ok(())
}
