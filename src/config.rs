//! Startup settings of a sandbox window.

use std::path::{Path, PathBuf};

use cgmath::Point3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorMode {
    /// Hidden and grabbed; every mouse motion turns the camera.
    Captured,
    /// Visible; the camera turns while the right button is held.
    Free,
}

#[derive(Clone, Debug)]
pub struct SandboxConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub cursor: CursorMode,
    pub clear_colour: wgpu::Color,
    /// Give the main depth buffer a stencil aspect.
    pub stencil: bool,
    /// Enable the Ctrl+R / Ctrl+P camera lock shortcuts.
    pub lock_toggles: bool,
    pub camera_position: Point3<f32>,
    /// Degrees.
    pub camera_yaw: f32,
    /// Degrees.
    pub camera_pitch: f32,
    pub asset_root: PathBuf,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            title: "Render Sandbox".to_string(),
            width: 800,
            height: 600,
            cursor: CursorMode::Captured,
            clear_colour: wgpu::Color {
                r: 0.15,
                g: 0.15,
                b: 0.15,
                a: 1.0,
            },
            stencil: false,
            lock_toggles: true,
            camera_position: Point3::new(0.0, 0.0, 3.0),
            camera_yaw: -90.0,
            camera_pitch: 0.0,
            asset_root: PathBuf::from("assets"),
        }
    }
}

impl SandboxConfig {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_cursor(mut self, cursor: CursorMode) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_clear_colour(mut self, clear_colour: wgpu::Color) -> Self {
        self.clear_colour = clear_colour;
        self
    }

    pub fn with_stencil(mut self, stencil: bool) -> Self {
        self.stencil = stencil;
        self
    }

    pub fn with_lock_toggles(mut self, enabled: bool) -> Self {
        self.lock_toggles = enabled;
        self
    }

    pub fn with_camera(mut self, position: Point3<f32>, yaw: f32, pitch: f32) -> Self {
        self.camera_position = position;
        self.camera_yaw = yaw;
        self.camera_pitch = pitch;
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    /// `path` relative to the asset root.
    pub fn asset(&self, path: impl AsRef<Path>) -> PathBuf {
        self.asset_root.join(path)
    }
}
