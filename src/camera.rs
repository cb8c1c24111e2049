//! Fly camera driven by key, mouse and scroll input.
//!
//! [`Camera`] keeps a world position plus yaw/pitch Euler angles (in degrees)
//! and derives an orthonormal forward/right/up basis from them after every
//! orientation change. [`Projection`] turns the camera's field of view into a
//! perspective matrix for wgpu's clip space.

use cgmath::{InnerSpace, Matrix4, Point3, Vector2, Vector3};

/// Smallest and largest field of view (degrees) reachable by scrolling.
pub const FOV_RANGE: (f32, f32) = (1.0, 45.0);
/// Pitch is kept inside this range (degrees) when constrained.
pub const PITCH_LIMIT: f32 = 89.0;

pub const DEFAULT_SPEED: f32 = 2.5;
pub const DEFAULT_SENSITIVITY: f32 = 0.1;
pub const DEFAULT_FOV: f32 = 45.0;

/// cgmath produces OpenGL clip space (z in [-1, 1]); wgpu expects z in [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Euler-angle camera.
///
/// Yaw is measured from the +x axis towards +z, so a yaw of -90° looks down -z.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Point3<f32>,
    world_up: Vector3<f32>,
    forward: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    reference_yaw: f32,
    fov: f32,
    pub speed: f32,
    pub sensitivity: f32,
    pitch_locked: bool,
    rotation_locked: bool,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(
        position: P,
        world_up: Vector3<f32>,
        yaw: cgmath::Deg<f32>,
        pitch: cgmath::Deg<f32>,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            world_up,
            forward: Vector3::new(0.0, 0.0, -1.0),
            right: Vector3::new(1.0, 0.0, 0.0),
            up: world_up,
            yaw: yaw.0,
            pitch: pitch.0,
            reference_yaw: yaw.0,
            fov: DEFAULT_FOV,
            speed: DEFAULT_SPEED,
            sensitivity: DEFAULT_SENSITIVITY,
            pitch_locked: false,
            rotation_locked: false,
        };
        camera.update_basis();
        camera
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn set_position<P: Into<Point3<f32>>>(&mut self, position: P) {
        self.position = position.into();
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.forward
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    /// Yaw in degrees.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in degrees.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Vertical field of view in degrees.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn is_pitch_locked(&self) -> bool {
        self.pitch_locked
    }

    pub fn is_rotation_locked(&self) -> bool {
        self.rotation_locked
    }

    /// Look-at matrix from the position towards `position + forward`.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.forward, self.up)
    }

    /// Translate along the forward or right axis by `speed * dt`.
    pub fn on_key_pressed(&mut self, dt: f32, direction: CameraMovement) {
        let velocity = self.speed * dt;
        let delta = match direction {
            CameraMovement::Forward => self.forward * velocity,
            CameraMovement::Backward => -self.forward * velocity,
            CameraMovement::Left => -self.right * velocity,
            CameraMovement::Right => self.right * velocity,
        };
        self.position += delta;
    }

    /// Rotate by a pixel offset, keeping the pitch inside ±89°.
    pub fn on_mouse_move(&mut self, offset: Vector2<f32>) {
        self.on_mouse_move_with(offset, true);
    }

    pub fn on_mouse_move_with(&mut self, offset: Vector2<f32>, constrain_pitch: bool) {
        self.yaw += offset.x * self.sensitivity;
        self.pitch += offset.y * self.sensitivity;

        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.update_basis();
    }

    /// Zoom: scrolling up narrows the field of view.
    pub fn on_mouse_scroll(&mut self, y_offset: f32) {
        self.fov = (self.fov - y_offset).clamp(FOV_RANGE.0, FOV_RANGE.1);
    }

    pub fn set_pitch_lock(&mut self, locked: bool) {
        self.pitch_locked = locked;
        self.update_basis();
    }

    pub fn set_rotation_lock(&mut self, locked: bool) {
        self.rotation_locked = locked;
        self.update_basis();
    }

    pub fn toggle_pitch_lock(&mut self) -> bool {
        self.set_pitch_lock(!self.pitch_locked);
        self.pitch_locked
    }

    pub fn toggle_rotation_lock(&mut self) -> bool {
        self.set_rotation_lock(!self.rotation_locked);
        self.rotation_locked
    }

    fn update_basis(&mut self) {
        if self.rotation_locked {
            self.yaw = self.reference_yaw;
            self.pitch = 0.0;
        } else if self.pitch_locked {
            self.pitch = 0.0;
        }

        let (sin_yaw, cos_yaw) = self.yaw.to_radians().sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.to_radians().sin_cos();
        let direction = Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch);

        self.forward = direction.normalize();
        self.right = self.forward.cross(self.world_up).normalize();
        self.up = self.right.cross(self.forward).normalize();
    }
}

impl Default for Camera {
    /// The sandbox start pose: three units back on +z, looking down -z.
    fn default() -> Self {
        Self::new(
            (0.0, 0.0, 3.0),
            Vector3::unit_y(),
            cgmath::Deg(-90.0),
            cgmath::Deg(0.0),
        )
    }
}

/// Perspective parameters that do not depend on the camera pose.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self, fov: cgmath::Deg<f32>) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(fov, self.aspect, self.znear, self.zfar)
    }
}
