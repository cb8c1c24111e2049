//! Keyboard, mouse and scroll handling for the fly camera.

use cgmath::Vector2;
use winit::{
    event::{ElementState, MouseScrollDelta},
    keyboard::KeyCode,
};

use crate::camera::{Camera, CameraMovement};

/// Pixels of a touchpad scroll that count as one wheel line.
const PIXELS_PER_LINE: f32 = 20.0;

/// Turns absolute cursor positions into per-event offsets.
///
/// The y offset is inverted (window y grows downwards, pitch grows upwards).
/// The first position after creation or [`MouseTracker::reset`] only primes
/// the tracker and yields a zero offset, so the view does not jump.
#[derive(Debug, Default)]
pub struct MouseTracker {
    last: Option<(f64, f64)>,
}

impl MouseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&mut self, x: f64, y: f64) -> Vector2<f32> {
        let offset = match self.last {
            Some((last_x, last_y)) => Vector2::new((x - last_x) as f32, (last_y - y) as f32),
            None => Vector2::new(0.0, 0.0),
        };
        self.last = Some((x, y));
        offset
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Held movement keys and lock shortcuts.
#[derive(Debug, Default)]
pub struct CameraController {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    ctrl: bool,
    lock_toggles: bool,
}

impl CameraController {
    /// `lock_toggles` enables Ctrl+R (rotation lock) and Ctrl+P (pitch lock).
    pub fn new(lock_toggles: bool) -> Self {
        Self {
            lock_toggles,
            ..Default::default()
        }
    }

    pub fn set_ctrl(&mut self, pressed: bool) {
        self.ctrl = pressed;
    }

    /// Track a key transition. Returns `true` if the key belongs to the camera.
    pub fn process_key(&mut self, camera: &mut Camera, key: KeyCode, state: ElementState) -> bool {
        let pressed = state.is_pressed();
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => self.forward = pressed,
            KeyCode::KeyS | KeyCode::ArrowDown => self.backward = pressed,
            KeyCode::KeyA | KeyCode::ArrowLeft => self.left = pressed,
            KeyCode::KeyD | KeyCode::ArrowRight => self.right = pressed,
            KeyCode::KeyR if pressed && self.ctrl && self.lock_toggles => {
                let locked = camera.toggle_rotation_lock();
                log::info!("rotation lock {}", if locked { "on" } else { "off" });
            }
            KeyCode::KeyP if pressed && self.ctrl && self.lock_toggles => {
                let locked = camera.toggle_pitch_lock();
                log::info!("pitch lock {}", if locked { "on" } else { "off" });
            }
            _ => return false,
        }
        true
    }

    /// Move the camera for every held key.
    pub fn update(&self, camera: &mut Camera, dt: f32) {
        let held = [
            (self.forward, CameraMovement::Forward),
            (self.backward, CameraMovement::Backward),
            (self.left, CameraMovement::Left),
            (self.right, CameraMovement::Right),
        ];
        for (_, direction) in held.into_iter().filter(|(down, _)| *down) {
            camera.on_key_pressed(dt, direction);
        }
    }

    pub fn process_scroll(&self, camera: &mut Camera, delta: &MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => *y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
        };
        camera.on_mouse_scroll(lines);
    }
}
