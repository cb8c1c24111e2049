//! Window, event loop and frame pacing.
//!
//! A demo implements [`Sandbox`] and hands it to [`run`]. Each frame:
//! 1. held movement keys move the camera (`CameraController::update`)
//! 2. [`Sandbox::on_update`] runs with the elapsed time
//! 3. [`Sandbox::on_prepass`] may record off-screen passes (e.g. picking)
//! 4. [`Sandbox::on_render`] draws into the main pass
//! 5. the frame is submitted and presented, then [`Sandbox::on_submitted`] runs
//!
//! Mouse look depends on [`CursorMode`]: with a captured cursor raw mouse
//! motion turns the camera, with a free cursor it turns while the right button
//! is held.

use std::{iter, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, ModifiersState, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::{
    config::{CursorMode, SandboxConfig},
    context::Context,
    frame::Frame,
    input::MouseTracker,
};

/// One demo program.
pub trait Sandbox: Sized {
    /// Load shaders, meshes and textures. An error aborts [`run`].
    fn init(ctx: &mut Context) -> impl Future<Output = anyhow::Result<Self>>;

    /// A key went down (repeats excluded). Escape never reaches this; it closes
    /// the window.
    fn on_key_pressed(&mut self, _ctx: &mut Context, _key: KeyCode, _modifiers: ModifiersState) {}

    /// `time` is seconds since start, `dt` seconds since the last frame.
    fn on_update(&mut self, _ctx: &mut Context, _time: f32, _dt: f32) {}

    /// Record passes that must run before the main pass.
    fn on_prepass(
        &mut self,
        _ctx: &mut Context,
        _encoder: &mut wgpu::CommandEncoder,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_render(&mut self, ctx: &mut Context, frame: &mut Frame) -> anyhow::Result<()>;

    /// The frame's commands have been submitted.
    fn on_submitted(&mut self, _ctx: &mut Context) {}

    fn on_resize(&mut self, _ctx: &mut Context, _width: u32, _height: u32) {}
}

struct AppState<S> {
    ctx: Context,
    sandbox: S,
    is_surface_configured: bool,
}

impl<S: Sandbox> AppState<S> {
    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
            self.sandbox.on_resize(&mut self.ctx, width, height);
        }
    }

    fn render(&mut self) -> anyhow::Result<()> {
        self.ctx.window.request_redraw();

        if !self.is_surface_configured {
            return Ok(());
        }

        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output)
            | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
            wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated => {
                let size = self.ctx.window.inner_size();
                self.resize(size.width, size.height);
                return Ok(());
            }
            e => {
                log::error!("Unable to render {:?}", e);
                return Ok(());
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let index = self.ctx.next_frame();
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.sandbox.on_prepass(&mut self.ctx, &mut encoder)?;
        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(self.ctx.depth.attachment()),
                ..Default::default()
            });
            let mut frame = Frame::new(index, render_pass);
            self.sandbox.on_render(&mut self.ctx, &mut frame)?;
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        self.sandbox.on_submitted(&mut self.ctx);
        Ok(())
    }
}

struct App<S> {
    async_runtime: tokio::runtime::Runtime,
    config: SandboxConfig,
    state: Option<AppState<S>>,
    error: Option<anyhow::Error>,
    mouse: MouseTracker,
    modifiers: ModifiersState,
    looking: bool,
    start_time: Instant,
    last_time: Instant,
}

impl<S: Sandbox> App<S> {
    fn new(config: SandboxConfig) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            config,
            state: None,
            error: None,
            mouse: MouseTracker::new(),
            modifiers: ModifiersState::empty(),
            looking: false,
            start_time: Instant::now(),
            last_time: Instant::now(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Arc<Window>> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.width,
                self.config.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attributes)?);
        if self.config.cursor == CursorMode::Captured {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                log::warn!("Could not capture the cursor: {}", e);
            }
            window.set_cursor_visible(false);
        }
        Ok(window)
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let Some(state) = &mut self.state else {
            return;
        };
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        if code == KeyCode::Escape && event.state.is_pressed() {
            event_loop.exit();
            return;
        }
        state
            .ctx
            .controller
            .process_key(&mut state.ctx.camera, code, event.state);
        if event.state == ElementState::Pressed && !event.repeat {
            state
                .sandbox
                .on_key_pressed(&mut state.ctx, code, self.modifiers);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &mut self.state else {
            return;
        };
        let dt = self.last_time.elapsed().as_secs_f32();
        self.last_time = Instant::now();
        let time = self.start_time.elapsed().as_secs_f32();

        state.ctx.controller.update(&mut state.ctx.camera, dt);
        state.sandbox.on_update(&mut state.ctx, time, dt);
        if let Err(e) = state.render() {
            self.fail(event_loop, e);
        }
    }
}

impl<S: Sandbox> ApplicationHandler for App<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = match self.create_window(event_loop) {
            Ok(window) => window,
            Err(e) => return self.fail(event_loop, e),
        };

        let config = self.config.clone();
        let init_future = async move {
            let mut ctx = Context::new(window, config).await?;
            let sandbox = S::init(&mut ctx).await?;
            anyhow::Ok((ctx, sandbox))
        };
        match self.async_runtime.block_on(init_future) {
            Ok((ctx, sandbox)) => {
                let size = ctx.window.inner_size();
                let mut state = AppState {
                    ctx,
                    sandbox,
                    is_surface_configured: false,
                };
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
                self.start_time = Instant::now();
                self.last_time = Instant::now();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e.context("sandbox initialisation failed")),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        if self.config.cursor != CursorMode::Captured {
            return;
        }
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            let offset = cgmath::Vector2::new(dx as f32, -dy as f32);
            state.ctx.camera.on_mouse_move(offset);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.state.is_none() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    state.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
                if let Some(state) = &mut self.state {
                    state.ctx.controller.set_ctrl(self.modifiers.control_key());
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(state) = &mut self.state {
                    state.ctx.cursor = position;
                    if self.config.cursor == CursorMode::Free && self.looking {
                        let offset = self.mouse.offset(position.x, position.y);
                        state.ctx.camera.on_mouse_move(offset);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Right,
                ..
            } => {
                self.looking = button_state.is_pressed();
                self.mouse.reset();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(state) = &mut self.state {
                    state.ctx.controller.process_scroll(&mut state.ctx.camera, &delta);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Open a window for `S` and run until it is closed.
///
/// Errors while creating the window, the GPU device or the sandbox itself are
/// returned; so is an error from a sandbox render hook, which ends the loop.
pub fn run<S: Sandbox>(config: SandboxConfig) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let event_loop = EventLoop::new()?;
    let mut app: App<S> = App::new(config)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
