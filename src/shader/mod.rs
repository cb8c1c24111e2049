//! Shader programs: a WGSL vertex + fragment pair linked into one render
//! pipeline, with uniforms set by name.
//!
//! Every program reads its uniforms from one struct at `@group(0) @binding(0)`.
//! Sampled textures live in `@group(1)`: the `i`-th sampler name of the
//! [`ShaderDesc`] is a `texture_2d<f32>` at binding `2i` and its `sampler` at
//! binding `2i + 1`.
//!
//! Setting a uniform only changes the CPU copy. [`Shader::bind_for_draw`]
//! snapshots it into the next slot of a per-frame ring buffer, so each draw in
//! a frame sees the values that were current when it was recorded.

use std::path::Path;

use thiserror::Error;

use crate::{
    data_structures::texture::{BoundTexture, MAX_TEXTURE_UNITS, Texture},
    frame::Frame,
    resources::load_string,
};

mod pipeline;
pub mod uniform;

use uniform::{UniformBlock, UniformKind, UniformStruct};

pub const DEFAULT_MAX_DRAWS_PER_FRAME: u32 = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader source {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
    #[error("no active uniform named `{0}`")]
    UnknownUniform(String),
    #[error("uniform `{name}` is a {expected}, cannot set it from a {found}")]
    UniformTypeMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },
    #[error("texture unit {0} is out of range (0..{MAX_TEXTURE_UNITS})")]
    InvalidTextureUnit(i32),
    #[error("shader `{label}` exceeded {max} draws in one frame")]
    DrawBudgetExceeded { label: String, max: u32 },
}

impl ShaderError {
    /// `true` for errors GL would have silently ignored (location -1).
    pub fn is_unknown_uniform(&self) -> bool {
        matches!(self, ShaderError::UnknownUniform(_))
    }
}

/// Everything about a program besides its source code.
#[derive(Clone, Debug)]
pub struct ShaderDesc {
    pub label: String,
    pub uniforms: UniformStruct,
    /// Sampler uniform names, in binding order.
    pub samplers: Vec<String>,
    pub color_format: wgpu::TextureFormat,
    pub blend: Option<wgpu::BlendState>,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub depth_write: bool,
    pub depth_compare: wgpu::CompareFunction,
    pub stencil: wgpu::StencilState,
    pub cull_mode: Option<wgpu::Face>,
    pub max_draws_per_frame: u32,
}

impl ShaderDesc {
    pub fn new(label: &str, uniforms: UniformStruct, color_format: wgpu::TextureFormat) -> Self {
        Self {
            label: label.to_string(),
            uniforms,
            samplers: Vec::new(),
            color_format,
            blend: None,
            depth_format: None,
            depth_write: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            cull_mode: None,
            max_draws_per_frame: DEFAULT_MAX_DRAWS_PER_FRAME,
        }
    }

    pub fn with_samplers(mut self, names: &[&str]) -> Self {
        self.samplers = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_depth(mut self, format: wgpu::TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn with_depth_write(mut self, enabled: bool) -> Self {
        self.depth_write = enabled;
        self
    }

    pub fn with_depth_compare(mut self, compare: wgpu::CompareFunction) -> Self {
        self.depth_compare = compare;
        self
    }

    pub fn with_stencil(mut self, stencil: wgpu::StencilState) -> Self {
        self.stencil = stencil;
        self
    }

    pub fn with_blend(mut self, blend: Option<wgpu::BlendState>) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_cull_mode(mut self, cull_mode: Option<wgpu::Face>) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    pub fn with_max_draws(mut self, max: u32) -> Self {
        self.max_draws_per_frame = max.max(1);
        self
    }
}

#[derive(Debug)]
struct SamplerSlot {
    name: String,
    unit: u32,
}

/// A linked vertex + fragment program and its uniform state.
#[derive(Debug)]
pub struct Shader {
    label: String,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    block: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    max_draws: u32,
    cursor: u32,
    frame: Option<u64>,
    samplers: Vec<SamplerSlot>,
    texture_layout: Option<wgpu::BindGroupLayout>,
    fallback: BoundTexture,
}

impl Shader {
    /// Read both stages from disk, then build as [`Shader::from_sources`].
    pub async fn from_files(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
        desc: ShaderDesc,
    ) -> Result<Self, ShaderError> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();
        let read = |path: &Path| {
            let path = path.to_path_buf();
            async move {
                load_string(&path).await.map_err(|source| {
                    log::error!("failed to read shader source {}: {source}", path.display());
                    ShaderError::Io {
                        path: path.display().to_string(),
                        reason: format!("{source:#}"),
                    }
                })
            }
        };
        let vertex = read(vertex_path).await?;
        let fragment = read(fragment_path).await?;
        Self::from_sources(device, queue, &vertex, &fragment, desc).await
    }

    pub async fn from_sources(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        vertex_source: &str,
        fragment_source: &str,
        desc: ShaderDesc,
    ) -> Result<Self, ShaderError> {
        let vertex = compile_stage(device, &desc.label, ShaderStage::Vertex, vertex_source).await?;
        let fragment =
            compile_stage(device, &desc.label, ShaderStage::Fragment, fragment_source).await?;

        let block = UniformBlock::new(&desc.uniforms);
        let uniform_layout = pipeline::uniform_layout(device, &desc.label, block.size());
        let texture_layout = (!desc.samplers.is_empty())
            .then(|| pipeline::texture_layout(device, &desc.label, desc.samplers.len()));

        let link_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let render_pipeline = {
            let mut layouts = vec![Some(&uniform_layout)];
            layouts.extend(texture_layout.as_ref().map(Some));
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{} pipeline layout", desc.label)),
                bind_group_layouts: &layouts,
                immediate_size: 0,
            });
            pipeline::mk_render_pipeline(device, &layout, &vertex, &fragment, &desc)
        };
        if let Some(error) = link_scope.pop().await {
            let log = error.to_string();
            log::error!("shader `{}` failed to link:\n{log}", desc.label);
            return Err(ShaderError::Link { log });
        }

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = block.size().div_ceil(alignment) * alignment;
        let max_draws = desc.max_draws_per_frame.max(1);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} uniform ring", desc.label)),
            size: uniform_stride * max_draws as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(block.size()),
                }),
            }],
            label: Some(&format!("{} uniform bind group", desc.label)),
        });

        let fallback = Texture::solid(device, queue, [255, 255, 255, 255], "fallback white").bound();
        let samplers = desc
            .samplers
            .iter()
            .enumerate()
            .map(|(i, name)| SamplerSlot {
                name: name.clone(),
                unit: i as u32,
            })
            .collect();

        log::info!("linked shader `{}`", desc.label);
        Ok(Self {
            label: desc.label,
            device: device.clone(),
            queue: queue.clone(),
            pipeline: render_pipeline,
            block,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            max_draws,
            cursor: 0,
            frame: None,
            samplers,
            texture_layout,
            fallback,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.block
    }

    /// Texture unit a sampler currently reads from.
    pub fn sampler_unit(&self, name: &str) -> Option<u32> {
        self.samplers.iter().find(|s| s.name == name).map(|s| s.unit)
    }

    /// Make this program current on the frame's pass.
    pub fn use_program(&self, frame: &mut Frame) {
        frame.pass().set_pipeline(&self.pipeline);
    }

    fn write(&mut self, name: &str, kinds: &[UniformKind], bytes: &[u8]) -> Result<(), ShaderError> {
        self.block.write(name, kinds, bytes)
    }

    pub fn set_uniform_bool(&mut self, name: &str, value: bool) -> Result<(), ShaderError> {
        self.write(name, &[UniformKind::Bool], bytemuck::bytes_of(&(value as u32)))
    }

    /// Also assigns sampler `name` to texture unit `value`.
    pub fn set_uniform_int(&mut self, name: &str, value: i32) -> Result<(), ShaderError> {
        if let Some(slot) = self.samplers.iter_mut().find(|s| s.name == name) {
            if !(0..MAX_TEXTURE_UNITS as i32).contains(&value) {
                return Err(ShaderError::InvalidTextureUnit(value));
            }
            slot.unit = value as u32;
            return Ok(());
        }
        self.write(
            name,
            &[UniformKind::Int, UniformKind::Bool],
            bytemuck::bytes_of(&value),
        )
    }

    pub fn set_uniform_uint(&mut self, name: &str, value: u32) -> Result<(), ShaderError> {
        self.write(name, &[UniformKind::UInt], bytemuck::bytes_of(&value))
    }

    pub fn set_uniform_float(&mut self, name: &str, value: f32) -> Result<(), ShaderError> {
        self.write(name, &[UniformKind::Float], bytemuck::bytes_of(&value))
    }

    pub fn set_uniform3f(&mut self, name: &str, x: f32, y: f32, z: f32) -> Result<(), ShaderError> {
        self.write(name, &[UniformKind::Vec3], bytemuck::cast_slice(&[x, y, z]))
    }

    pub fn set_uniform4f(
        &mut self,
        name: &str,
        x: f32,
        y: f32,
        z: f32,
        w: f32,
    ) -> Result<(), ShaderError> {
        self.write(name, &[UniformKind::Vec4], bytemuck::cast_slice(&[x, y, z, w]))
    }

    pub fn set_vector2f(&mut self, name: &str, value: cgmath::Vector2<f32>) -> Result<(), ShaderError> {
        let value: [f32; 2] = value.into();
        self.write(name, &[UniformKind::Vec2], bytemuck::cast_slice(&value))
    }

    pub fn set_vector3f(&mut self, name: &str, value: cgmath::Vector3<f32>) -> Result<(), ShaderError> {
        let value: [f32; 3] = value.into();
        self.write(name, &[UniformKind::Vec3], bytemuck::cast_slice(&value))
    }

    pub fn set_vector4f(&mut self, name: &str, value: cgmath::Vector4<f32>) -> Result<(), ShaderError> {
        let value: [f32; 4] = value.into();
        self.write(name, &[UniformKind::Vec4], bytemuck::cast_slice(&value))
    }

    /// Column-major matrix.
    pub fn set_uniform_mat4f(&mut self, name: &str, value: &[f32; 16]) -> Result<(), ShaderError> {
        self.write(name, &[UniformKind::Mat4], bytemuck::cast_slice(value))
    }

    pub fn set_matrix4f(&mut self, name: &str, value: &cgmath::Matrix4<f32>) -> Result<(), ShaderError> {
        let columns: [[f32; 4]; 4] = (*value).into();
        self.write(name, &[UniformKind::Mat4], bytemuck::cast_slice(&columns))
    }

    /// Record the current uniforms and textures for the next draw on `frame`.
    ///
    /// The pipeline is set as well, so a draw never runs against another
    /// program's bind groups.
    pub fn bind_for_draw(&mut self, frame: &mut Frame) -> Result<(), ShaderError> {
        if self.frame != Some(frame.index()) {
            self.frame = Some(frame.index());
            self.cursor = 0;
        }
        if self.cursor >= self.max_draws {
            return Err(ShaderError::DrawBudgetExceeded {
                label: self.label.clone(),
                max: self.max_draws,
            });
        }
        let offset = self.cursor as u64 * self.uniform_stride;
        self.queue
            .write_buffer(&self.uniform_buffer, offset, self.block.bytes());
        self.cursor += 1;

        let textures = self.texture_bind_group(frame);
        let pass = frame.pass();
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[offset as u32]);
        if let Some(textures) = &textures {
            pass.set_bind_group(1, textures, &[]);
        }
        Ok(())
    }

    fn texture_bind_group(&self, frame: &Frame) -> Option<wgpu::BindGroup> {
        let layout = self.texture_layout.as_ref()?;
        let bound: Vec<&BoundTexture> = self
            .samplers
            .iter()
            .map(|slot| frame.units().get(slot.unit as usize).unwrap_or(&self.fallback))
            .collect();
        let entries: Vec<wgpu::BindGroupEntry> = bound
            .iter()
            .enumerate()
            .flat_map(|(i, texture)| {
                [
                    wgpu::BindGroupEntry {
                        binding: 2 * i as u32,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2 * i as u32 + 1,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ]
            })
            .collect();
        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &entries,
            label: Some(&format!("{} texture bind group", self.label)),
        }))
    }
}

async fn compile_stage(
    device: &wgpu::Device,
    label: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{label} {stage}")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let info = module.get_compilation_info().await;
    let scope_error = scope.pop().await;

    let mut log: Vec<String> = info
        .messages
        .iter()
        .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
        .map(|m| match &m.location {
            Some(at) => format!("{}:{}: {}", at.line_number, at.line_position, m.message),
            None => m.message.clone(),
        })
        .collect();
    if let (true, Some(error)) = (log.is_empty(), scope_error) {
        log.push(error.to_string());
    }
    if !log.is_empty() {
        let log = log.join("\n");
        log::error!("{stage} shader of `{label}` failed to compile:\n{log}");
        return Err(ShaderError::Compile { stage, log });
    }
    Ok(module)
}
