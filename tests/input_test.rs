use cgmath::Vector2;
use render_sandbox::{
    camera::Camera,
    input::{CameraController, MouseTracker},
    pick::cursor_to_texel,
};
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseScrollDelta},
    keyboard::KeyCode,
};

#[test]
fn first_mouse_event_only_primes_the_tracker() {
    let mut tracker = MouseTracker::new();
    assert_eq!(tracker.offset(800.0, 450.0), Vector2::new(0.0, 0.0));
    assert_eq!(tracker.offset(810.0, 440.0), Vector2::new(10.0, 10.0));
    assert_eq!(tracker.offset(805.0, 460.0), Vector2::new(-5.0, -20.0));

    tracker.reset();
    assert_eq!(tracker.offset(0.0, 0.0), Vector2::new(0.0, 0.0));
}

#[test]
fn held_keys_move_every_update() {
    let mut camera = Camera::default();
    let mut controller = CameraController::new(true);

    assert!(controller.process_key(&mut camera, KeyCode::KeyW, ElementState::Pressed));
    controller.update(&mut camera, 0.2);
    controller.update(&mut camera, 0.2);
    assert!((camera.position().z - (3.0 - 2.5 * 0.4)).abs() < 1e-5);

    controller.process_key(&mut camera, KeyCode::KeyW, ElementState::Released);
    controller.update(&mut camera, 1.0);
    assert!((camera.position().z - 2.0).abs() < 1e-5);
}

#[test]
fn opposite_keys_cancel_out() {
    let mut camera = Camera::default();
    let mut controller = CameraController::new(true);
    controller.process_key(&mut camera, KeyCode::KeyA, ElementState::Pressed);
    controller.process_key(&mut camera, KeyCode::KeyD, ElementState::Pressed);
    controller.update(&mut camera, 1.0);
    assert!(camera.position().x.abs() < 1e-5);
}

#[test]
fn other_keys_are_not_consumed() {
    let mut camera = Camera::default();
    let mut controller = CameraController::new(true);
    assert!(!controller.process_key(&mut camera, KeyCode::KeyF, ElementState::Pressed));
    // R without Ctrl is not a shortcut.
    assert!(!controller.process_key(&mut camera, KeyCode::KeyR, ElementState::Pressed));
    assert!(!camera.is_rotation_locked());
}

#[test]
fn ctrl_shortcuts_toggle_the_locks() {
    let mut camera = Camera::default();
    let mut controller = CameraController::new(true);
    controller.set_ctrl(true);

    assert!(controller.process_key(&mut camera, KeyCode::KeyR, ElementState::Pressed));
    assert!(camera.is_rotation_locked());
    // Releasing the key does not toggle again.
    controller.process_key(&mut camera, KeyCode::KeyR, ElementState::Released);
    assert!(camera.is_rotation_locked());

    controller.process_key(&mut camera, KeyCode::KeyP, ElementState::Pressed);
    assert!(camera.is_pitch_locked());
    controller.process_key(&mut camera, KeyCode::KeyP, ElementState::Pressed);
    assert!(!camera.is_pitch_locked());
}

#[test]
fn lock_shortcuts_can_be_disabled() {
    let mut camera = Camera::default();
    let mut controller = CameraController::new(false);
    controller.set_ctrl(true);
    controller.process_key(&mut camera, KeyCode::KeyR, ElementState::Pressed);
    controller.process_key(&mut camera, KeyCode::KeyP, ElementState::Pressed);
    assert!(!camera.is_rotation_locked());
    assert!(!camera.is_pitch_locked());
}

#[test]
fn scroll_lines_and_pixels_zoom() {
    let mut camera = Camera::default();
    let controller = CameraController::new(true);
    controller.process_scroll(&mut camera, &MouseScrollDelta::LineDelta(0.0, 5.0));
    assert_eq!(camera.fov(), 40.0);
    controller.process_scroll(
        &mut camera,
        &MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 100.0)),
    );
    assert_eq!(camera.fov(), 35.0);
}

#[test]
fn cursor_is_clamped_into_the_pick_target() {
    let size = PhysicalSize::new(1600u32, 900u32);
    let texel = |x: f64, y: f64| cursor_to_texel(PhysicalPosition::new(x, y), size.width, size.height);
    assert_eq!(texel(10.7, 20.2), (10, 20));
    assert_eq!(texel(-5.0, -1.0), (0, 0));
    assert_eq!(texel(1600.0, 900.0), (1599, 899));
    assert_eq!(texel(5000.0, 3.0), (1599, 3));
    assert_eq!(cursor_to_texel(PhysicalPosition::new(3.0, 3.0), 0, 0), (0, 0));
}
