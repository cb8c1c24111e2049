//! Meshes: vertex and index buffers plus the textures drawn with them.

use std::rc::Rc;

use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::Texture,
    frame::Frame,
    shader::{Shader, ShaderError},
};

/// Vertex record shared by every mesh.
///
/// `object_id` is what the picking pass writes out; 0 is reserved for
/// "nothing under the cursor".
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub object_id: u32,
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            object_id: 0,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Uint32,
                },
            ],
        }
    }
}

/// How a flat float array is interleaved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexLayout {
    /// position(3) normal(3) uv(2)
    Standard,
    /// position(3) normal(3) uv(2) id(1)
    Tagged,
}

impl VertexLayout {
    pub fn floats_per_vertex(self) -> usize {
        match self {
            VertexLayout::Standard => 8,
            VertexLayout::Tagged => 9,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("{len} floats do not split into vertices of {stride} floats")]
    Misaligned { len: usize, stride: usize },
}

/// Split interleaved data into vertices. Standard vertices come back with
/// `object_id == 0`; tagged ones carry their tag.
pub fn vertices_from_interleaved(
    data: &[f32],
    layout: VertexLayout,
) -> Result<Vec<Vertex>, MeshError> {
    let stride = layout.floats_per_vertex();
    if data.len() % stride != 0 {
        return Err(MeshError::Misaligned {
            len: data.len(),
            stride,
        });
    }
    Ok(data
        .chunks_exact(stride)
        .map(|v| Vertex {
            position: [v[0], v[1], v[2]],
            normal: [v[3], v[4], v[5]],
            tex_coords: [v[6], v[7]],
            object_id: match layout {
                VertexLayout::Standard => 0,
                VertexLayout::Tagged => v[8] as u32,
            },
        })
        .collect())
}

/// Hands out mesh ids, starting at 1.
#[derive(Debug)]
pub struct MeshIds {
    next: u32,
}

impl Default for MeshIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl MeshIds {
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

impl TextureKind {
    pub fn uniform_prefix(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
        }
    }
}

/// Sampler uniform names for a texture list, numbered per kind from 1:
/// `[Diffuse, Specular, Diffuse]` gives `u_Material.texture_diffuse1`,
/// `u_Material.texture_specular1`, `u_Material.texture_diffuse2`.
pub fn sampler_uniform_names(kinds: &[TextureKind]) -> Vec<String> {
    let (mut diffuse, mut specular) = (0, 0);
    kinds
        .iter()
        .map(|kind| {
            let counter = match kind {
                TextureKind::Diffuse => &mut diffuse,
                TextureKind::Specular => &mut specular,
            };
            *counter += 1;
            format!("u_Material.{}{}", kind.uniform_prefix(), counter)
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct MeshTexture {
    pub texture: Rc<Texture>,
    pub kind: TextureKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawCall {
    Indexed { count: u32 },
    Sequential { count: u32 },
}

impl DrawCall {
    /// Indexed whenever there are indices, otherwise one vertex per element.
    pub fn for_counts(vertices: u32, indices: u32) -> Self {
        if indices > 0 {
            DrawCall::Indexed { count: indices }
        } else {
            DrawCall::Sequential { count: vertices }
        }
    }

    pub fn count(self) -> u32 {
        match self {
            DrawCall::Indexed { count } | DrawCall::Sequential { count } => count,
        }
    }

    pub fn is_empty(self) -> bool {
        self.count() == 0
    }
}

#[derive(Debug)]
pub struct Mesh {
    pub label: String,
    id: u32,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    index_count: u32,
    textures: Vec<MeshTexture>,
}

impl Mesh {
    /// Upload explicit vertex, index and texture lists. Every vertex is tagged
    /// with the new mesh's id.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        mut vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<MeshTexture>,
        ids: &mut MeshIds,
    ) -> Self {
        let id = ids.next_id();
        vertices.iter_mut().for_each(|v| v.object_id = id);
        Self::upload(device, label, id, &vertices, &indices, textures)
    }

    /// Upload interleaved demo geometry. Standard data is tagged with the new
    /// mesh's id, tagged data keeps its own ids.
    pub fn from_interleaved(
        device: &wgpu::Device,
        label: &str,
        data: &[f32],
        layout: VertexLayout,
        ids: &mut MeshIds,
    ) -> Result<Self, MeshError> {
        let mut vertices = vertices_from_interleaved(data, layout)?;
        let id = ids.next_id();
        if layout == VertexLayout::Standard {
            vertices.iter_mut().for_each(|v| v.object_id = id);
        }
        Ok(Self::upload(device, label, id, &vertices, &[], Vec::new()))
    }

    fn upload(
        device: &wgpu::Device,
        label: &str,
        id: u32,
        vertices: &[Vertex],
        indices: &[u32],
        textures: Vec<MeshTexture>,
    ) -> Self {
        let vertex_buffer = (!vertices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertex Buffer")),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });
        let index_buffer = (!indices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Index Buffer")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        Self {
            label: label.to_string(),
            id,
            vertex_buffer,
            index_buffer,
            vertex_count: vertices.len() as u32,
            index_count: indices.len() as u32,
            textures,
        }
    }

    pub fn with_textures(mut self, textures: Vec<MeshTexture>) -> Self {
        self.textures = textures;
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn textures(&self) -> &[MeshTexture] {
        &self.textures
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn draw_call(&self) -> DrawCall {
        DrawCall::for_counts(self.vertex_count, self.index_count)
    }

    /// Bind this mesh's textures to units `0..n`, point the matching sampler
    /// uniforms at them and issue one draw.
    ///
    /// Sampler names the shader does not declare are skipped. Bindings are
    /// left in place afterwards.
    pub fn draw(&self, shader: &mut Shader, frame: &mut Frame) -> Result<(), ShaderError> {
        let kinds: Vec<TextureKind> = self.textures.iter().map(|t| t.kind).collect();
        let names = sampler_uniform_names(&kinds);
        for (unit, (texture, name)) in self.textures.iter().zip(&names).enumerate() {
            match shader.set_uniform_int(name, unit as i32) {
                Err(e) if !e.is_unknown_uniform() => return Err(e),
                _ => {}
            }
            texture.texture.bind(frame.units_mut(), unit);
        }
        frame.units_mut().activate(0);

        let call = self.draw_call();
        let Some(vertex_buffer) = &self.vertex_buffer else {
            return Ok(());
        };
        if call.is_empty() {
            return Ok(());
        }
        shader.bind_for_draw(frame)?;
        let pass = frame.pass();
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        match (call, &self.index_buffer) {
            (DrawCall::Indexed { count }, Some(index_buffer)) => {
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..count, 0, 0..1);
            }
            (call, _) => pass.draw(0..call.count(), 0..1),
        }
        Ok(())
    }
}
