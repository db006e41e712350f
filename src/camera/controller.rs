//! Camera controllers driven by pointer input.
//!
//! A [`CameraController`] turns drag and scroll events into a camera pose.
//! The host forwards raw input; the camera applies whatever pose the active
//! controller reports after each event.

use crate::math::{Quat, Vec3};

/// Radians of rotation per pixel dragged.
const DRAG_SENSITIVITY: f64 = 0.01;
/// Distance units per scroll step.
const SCROLL_SENSITIVITY: f64 = 5.0;
const MIN_ORBIT_DISTANCE: f64 = 1.0;
pub const DEFAULT_ORBIT_DISTANCE: f64 = 500.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CameraController {
    /// Input is ignored and the camera keeps its own pose.
    #[default]
    None,
    Manual(ManualController),
    Orbit(OrbitController),
}

impl CameraController {
    pub fn on_drag(&mut self, dx: f64, dy: f64) {
        match self {
            Self::Orbit(orbit) => orbit.drag(dx, dy),
            Self::Manual(_) | Self::None => {}
        }
    }

    pub fn on_drag_end(&mut self) {
        match self {
            Self::Orbit(orbit) => orbit.drag_end(),
            Self::Manual(_) | Self::None => {}
        }
    }

    pub fn on_scroll(&mut self, dx: f64, dy: f64) {
        match self {
            Self::Orbit(orbit) => orbit.scroll(dx, dy),
            Self::Manual(_) | Self::None => {}
        }
    }

    /// Camera position and rotation this controller dictates, if any.
    pub fn pose(&self) -> Option<(Vec3, Quat)> {
        match self {
            Self::None => None,
            Self::Manual(manual) => Some((manual.position, manual.rotation)),
            Self::Orbit(orbit) => Some(orbit.pose()),
        }
    }
}

/// Direct position/rotation control, e.g. from sliders.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManualController {
    pub position: Vec3,
    pub rotation: Quat,
}

impl ManualController {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Rotates about a world axis by `degrees`.
    pub fn rotate(&mut self, axis: Vec3, degrees: f64) -> &mut Self {
        let delta = Quat::from_axis_angle(axis, degrees.to_radians());
        self.rotation = (delta * self.rotation).normalize();
        self
    }

    pub fn translate(&mut self, delta: Vec3) -> &mut Self {
        self.position = self.position + delta;
        self
    }
}

/// Orbits a target point: dragging turns the view around it, scrolling
/// moves toward or away from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitController {
    pub target: Vec3,
    pub rotation: Quat,
    pub distance: f64,
    pub controls_enabled: bool,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl OrbitController {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            rotation: Quat::IDENTITY,
            distance: DEFAULT_ORBIT_DISTANCE,
            controls_enabled: true,
        }
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance.max(MIN_ORBIT_DISTANCE);
        self
    }

    pub fn drag(&mut self, dx: f64, dy: f64) {
        if !self.controls_enabled {
            return;
        }
        let yaw = Quat::from_axis_angle(Vec3::Y, dx * DRAG_SENSITIVITY);
        let pitch = Quat::from_axis_angle(Vec3::X, -dy * DRAG_SENSITIVITY);
        self.rotation = (yaw * pitch * self.rotation).normalize();
    }

    pub fn drag_end(&mut self) {}

    pub fn scroll(&mut self, _dx: f64, dy: f64) {
        if !self.controls_enabled {
            return;
        }
        self.distance = (self.distance - dy * SCROLL_SENSITIVITY).max(MIN_ORBIT_DISTANCE);
    }

    /// Camera sits `distance` along the rotated +Z axis and looks back at
    /// the target, so its rotation is the orbit rotation itself.
    pub fn pose(&self) -> (Vec3, Quat) {
        let offset = self.rotation * Vec3::new(0.0, 0.0, self.distance);
        (self.target + offset, self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn orbit_pose_looks_at_target() {
        let mut orbit = OrbitController::new(Vec3::new(1.0, 2.0, 3.0)).with_distance(10.0);
        orbit.drag(40.0, -25.0);
        let (position, rotation) = orbit.pose();
        assert_relative_eq!(position.distance(orbit.target), 10.0, epsilon = 1e-9);

        let forward = rotation * -Vec3::Z;
        let to_target = (orbit.target - position).normalize();
        assert_relative_eq!(forward.dot(to_target), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn scroll_clamps_distance() {
        let mut orbit = OrbitController::default();
        orbit.scroll(0.0, 2.0);
        assert_relative_eq!(orbit.distance, 490.0);
        orbit.scroll(0.0, 1000.0);
        assert_relative_eq!(orbit.distance, 1.0);
    }

    #[test]
    fn disabled_orbit_ignores_input() {
        let mut orbit = OrbitController::default();
        orbit.controls_enabled = false;
        let before = orbit;
        orbit.drag(10.0, 10.0);
        orbit.scroll(0.0, 3.0);
        assert_eq!(orbit, before);
    }

    #[test]
    fn none_controller_has_no_pose() {
        let mut controller = CameraController::None;
        controller.on_drag(5.0, 5.0);
        assert_eq!(controller.pose(), None);
    }
}
