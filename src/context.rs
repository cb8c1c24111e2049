use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use cgmath::Matrix4;
use winit::{dpi::PhysicalPosition, window::Window};

use crate::{
    camera::{Camera, Projection},
    config::SandboxConfig,
    data_structures::{cache::TextureManager, mesh::MeshIds, texture::DepthBuffer},
    input::CameraController,
};

pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;

/// Window, device and the shared state every sandbox draws with.
#[derive(Debug)]
pub struct Context {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub depth: DepthBuffer,
    pub camera: Camera,
    pub controller: CameraController,
    pub projection: Projection,
    pub textures: TextureManager,
    pub ids: MeshIds,
    pub clear_colour: wgpu::Color,
    /// Last cursor position inside the window, in physical pixels.
    pub cursor: PhysicalPosition<f64>,
    pub settings: SandboxConfig,
    frame_index: u64,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: SandboxConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can present to the window")?;
        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders write linear colours and rely on an sRGB surface for the conversion.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first().copied())
            .context("surface reports no texture formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = Camera::new(
            settings.camera_position,
            cgmath::Vector3::unit_y(),
            cgmath::Deg(settings.camera_yaw),
            cgmath::Deg(settings.camera_pitch),
        );
        let projection = Projection::new(config.width, config.height, Z_NEAR, Z_FAR);
        let depth = DepthBuffer::new(
            &device,
            [config.width, config.height],
            settings.stencil,
            "depth_texture",
        );
        let textures = TextureManager::new(&device, &queue);

        Ok(Self {
            window,
            surface,
            controller: CameraController::new(settings.lock_toggles),
            textures,
            ids: MeshIds::default(),
            clear_colour: settings.clear_colour,
            cursor: PhysicalPosition::new(0.0, 0.0),
            device,
            queue,
            config,
            depth,
            camera,
            projection,
            settings,
            frame_index: 0,
        })
    }

    /// Reconfigure the surface, depth buffer and projection. Zero sizes (a
    /// minimised window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.projection.resize(width, height);
        self.depth = DepthBuffer::new(&self.device, [width, height], self.settings.stencil, "depth_texture");
        true
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn depth_format(&self) -> wgpu::TextureFormat {
        self.depth.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// `path` relative to the configured asset root.
    pub fn asset(&self, path: impl AsRef<Path>) -> PathBuf {
        self.settings.asset(path)
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.camera.view_matrix()
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection.calc_matrix(cgmath::Deg(self.camera.fov()))
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub(crate) fn next_frame(&mut self) -> u64 {
        self.frame_index += 1;
        self.frame_index
    }
}

async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        })
        .await
        .context("cannot open the GPU device")
}

/// Device and queue without a window, for off-screen work and tests.
pub async fn headless_device() -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..wgpu::InstanceDescriptor::new_without_display_handle()
    });
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .context("no GPU adapter available")?;
    request_device(&adapter).await
}
