//! Models: the meshes of one imported scene file, drawn in file order.

use std::path::{Path, PathBuf};

use crate::{
    data_structures::{
        cache::TextureManager,
        mesh::{DrawCall, Mesh, MeshIds, MeshTexture},
    },
    frame::Frame,
    resources::scene::{ImportOptions, SceneData, import_scene, scene_directory},
    shader::{Shader, ShaderError},
};

#[derive(Debug, Default)]
pub struct Model {
    meshes: Vec<Mesh>,
    directory: PathBuf,
}

impl Model {
    /// Import `path` with the default options (triangulated, flipped UVs).
    ///
    /// A scene that fails to import is logged and gives a model without
    /// meshes, which draws nothing.
    pub async fn load(
        device: &wgpu::Device,
        textures: &mut TextureManager,
        ids: &mut MeshIds,
        path: &Path,
    ) -> Self {
        Self::load_with(device, textures, ids, path, ImportOptions::default()).await
    }

    pub async fn load_with(
        device: &wgpu::Device,
        textures: &mut TextureManager,
        ids: &mut MeshIds,
        path: &Path,
        options: ImportOptions,
    ) -> Self {
        match import_scene(path, options).await {
            Ok(scene) => Self::from_scene(device, textures, ids, &scene),
            Err(e) => {
                log::error!("failed to import {}: {e}", path.display());
                Self {
                    meshes: Vec::new(),
                    directory: scene_directory(path),
                }
            }
        }
    }

    /// Upload imported scene data, fetching textures through the cache.
    pub fn from_scene(
        device: &wgpu::Device,
        textures: &mut TextureManager,
        ids: &mut MeshIds,
        scene: &SceneData,
    ) -> Self {
        let meshes = scene
            .meshes
            .iter()
            .map(|mesh| {
                let mesh_textures = mesh
                    .textures
                    .iter()
                    .map(|t| MeshTexture {
                        texture: match &t.embedded {
                            Some(bytes) => textures.get_embedded(&t.path, bytes),
                            None => textures.get(&t.path),
                        },
                        kind: t.kind,
                    })
                    .collect();
                Mesh::new(
                    device,
                    &mesh.name,
                    mesh.vertices.clone(),
                    mesh.indices.clone(),
                    mesh_textures,
                    ids,
                )
            })
            .collect();
        Self {
            meshes,
            directory: scene.directory.clone(),
        }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.meshes.iter().map(Mesh::draw_call).collect()
    }

    pub fn draw(&self, shader: &mut Shader, frame: &mut Frame) -> Result<(), ShaderError> {
        for mesh in &self.meshes {
            mesh.draw(shader, frame)?;
        }
        Ok(())
    }
}
