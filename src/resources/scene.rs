//! Scene import: Wavefront OBJ (with MTL materials) and glTF 2.0.
//!
//! An import produces plain CPU data, a flat list of [`SceneMesh`]es in the
//! order the file's hierarchy visits them. Node transforms are not applied.
//! Texture references are resolved against the scene file's directory but not
//! loaded; that is the job of the texture cache. Images embedded in a glTF
//! binary are handed over as encoded bytes under a `<scene>#image<N>` key.

use std::{
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;

use crate::{
    data_structures::mesh::{TextureKind, Vertex},
    resources::load_string,
};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid OBJ file: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("invalid glTF file: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("scene has no root node")]
    MissingRoot,
    #[error("unsupported scene content: {0}")]
    Unsupported(String),
    #[error("unknown scene format `{0}`")]
    UnknownFormat(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    /// Split polygons (OBJ) and strips/fans (glTF) into triangles. Without it,
    /// OBJ objects with non-triangle faces and glTF strip and fan primitives
    /// are skipped.
    pub triangulate: bool,
    /// Store `v` as `1 - v`.
    pub flip_uvs: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            flip_uvs: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneTexture {
    pub path: PathBuf,
    pub kind: TextureKind,
    /// Encoded image data for textures stored inside the scene file.
    pub embedded: Option<Arc<[u8]>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneMesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Diffuse maps first, then specular maps.
    pub textures: Vec<SceneTexture>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneData {
    /// Directory texture paths are resolved against.
    pub directory: PathBuf,
    pub meshes: Vec<SceneMesh>,
}

pub fn scene_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Import the scene at `path`; the format is picked from the extension.
pub async fn import_scene(path: &Path, options: ImportOptions) -> Result<SceneData, ImportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let directory = scene_directory(path);
    let bytes = tokio::fs::read(path).await.map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let meshes = match extension.as_str() {
        "obj" => import_obj(&bytes, &directory, options).await?,
        "gltf" | "glb" => import_gltf(&bytes, path, &directory, options).await?,
        _ => return Err(ImportError::UnknownFormat(extension)),
    };
    log::info!("imported {} meshes from {}", meshes.len(), path.display());
    Ok(SceneData { directory, meshes })
}

fn flip(uv: [f32; 2], options: ImportOptions) -> [f32; 2] {
    if options.flip_uvs {
        [uv[0], 1.0 - uv[1]]
    } else {
        uv
    }
}

async fn import_obj(
    bytes: &[u8],
    directory: &Path,
    options: ImportOptions,
) -> Result<Vec<SceneMesh>, ImportError> {
    let mut reader = BufReader::new(Cursor::new(bytes));
    let (models, materials) = tobj::load_obj_buf_async(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: options.triangulate,
            single_index: true,
            ..Default::default()
        },
        |mtl| {
            let mtl_path = directory.join(&mtl);
            async move {
                let text = load_string(&mtl_path).await.map_err(|e| {
                    log::warn!("{e:#}");
                    tobj::LoadError::OpenFileFailed
                })?;
                tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(text)))
            }
        },
    )
    .await?;
    let materials = materials.unwrap_or_else(|e| {
        log::warn!("ignoring materials of OBJ scene in {}: {e}", directory.display());
        Vec::new()
    });

    Ok(models
        .into_iter()
        .filter_map(|model| {
            let mesh = &model.mesh;
            if !options.triangulate && mesh.face_arities.iter().any(|&n| n != 3) {
                log::warn!("skipping OBJ object `{}` with non-triangle faces", model.name);
                return None;
            }
            let vertices = (0..mesh.positions.len() / 3)
                .map(|i| {
                    let uv = [
                        mesh.texcoords.get(i * 2).copied().unwrap_or(0.0),
                        mesh.texcoords.get(i * 2 + 1).copied().unwrap_or(0.0),
                    ];
                    Vertex::new(
                        [
                            mesh.positions[i * 3],
                            mesh.positions[i * 3 + 1],
                            mesh.positions[i * 3 + 2],
                        ],
                        [
                            mesh.normals.get(i * 3).copied().unwrap_or(0.0),
                            mesh.normals.get(i * 3 + 1).copied().unwrap_or(0.0),
                            mesh.normals.get(i * 3 + 2).copied().unwrap_or(0.0),
                        ],
                        if mesh.texcoords.is_empty() { uv } else { flip(uv, options) },
                    )
                })
                .collect();

            let mut textures = Vec::new();
            if let Some(material) = mesh.material_id.and_then(|id| materials.get(id)) {
                if let Some(diffuse) = &material.diffuse_texture {
                    textures.push(SceneTexture {
                        path: directory.join(diffuse),
                        kind: TextureKind::Diffuse,
                        embedded: None,
                    });
                }
                if let Some(specular) = &material.specular_texture {
                    textures.push(SceneTexture {
                        path: directory.join(specular),
                        kind: TextureKind::Specular,
                        embedded: None,
                    });
                }
            }

            Some(SceneMesh {
                name: model.name,
                vertices,
                indices: mesh.indices.clone(),
                textures,
            })
        })
        .collect())
}

async fn import_gltf(
    bytes: &[u8],
    path: &Path,
    directory: &Path,
    options: ImportOptions,
) -> Result<Vec<SceneMesh>, ImportError> {
    let gltf = gltf::Gltf::from_slice(bytes)?;

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf.blob.as_deref().ok_or_else(|| {
                    ImportError::Unsupported("binary buffer without a GLB chunk".to_string())
                })?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                return Err(ImportError::Unsupported("data URI buffers".to_string()));
            }
            gltf::buffer::Source::Uri(uri) => {
                let path = directory.join(uri);
                let bin = tokio::fs::read(&path)
                    .await
                    .map_err(|source| ImportError::Io { path, source })?;
                buffer_data.push(bin);
            }
        }
    }

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or(ImportError::MissingRoot)?;

    let images = embedded_images(&gltf, &buffer_data, path);
    let sources = Sources {
        buffers: &buffer_data,
        images: &images,
        directory,
    };
    let mut meshes = Vec::new();
    for node in scene.nodes() {
        visit_node(&node, &sources, options, &mut meshes);
    }
    Ok(meshes)
}

/// Where primitive data and textures of one glTF file come from.
struct Sources<'a> {
    buffers: &'a [Vec<u8>],
    /// Per image index: the cache key and bytes of images stored in a buffer view.
    images: &'a [Option<(PathBuf, Arc<[u8]>)>],
    directory: &'a Path,
}

fn embedded_images(
    gltf: &gltf::Gltf,
    buffers: &[Vec<u8>],
    path: &Path,
) -> Vec<Option<(PathBuf, Arc<[u8]>)>> {
    gltf.images()
        .map(|image| {
            let gltf::image::Source::View { view, .. } = image.source() else {
                return None;
            };
            let buffer = buffers.get(view.buffer().index())?;
            let bytes = buffer.get(view.offset()..view.offset() + view.length())?;
            let key = PathBuf::from(format!("{}#image{}", path.display(), image.index()));
            Some((key, Arc::from(bytes)))
        })
        .collect()
}

fn visit_node(
    node: &gltf::Node,
    sources: &Sources,
    options: ImportOptions,
    out: &mut Vec<SceneMesh>,
) {
    if let Some(mesh) = node.mesh() {
        let name = mesh.name().or(node.name()).unwrap_or("mesh").to_string();
        for primitive in mesh.primitives() {
            if let Some(scene_mesh) = read_primitive(&primitive, &name, sources, options)
            {
                out.push(scene_mesh);
            }
        }
    }
    for child in node.children() {
        visit_node(&child, sources, options, out);
    }
}

fn read_primitive(
    primitive: &gltf::Primitive,
    name: &str,
    sources: &Sources,
    options: ImportOptions,
) -> Option<SceneMesh> {
    use gltf::mesh::Mode;

    let mode = primitive.mode();
    match mode {
        Mode::Triangles => {}
        Mode::TriangleStrip | Mode::TriangleFan if options.triangulate => {}
        other => {
            log::warn!("skipping {other:?} primitive of mesh `{name}`");
            return None;
        }
    }

    let reader = primitive.reader(|buffer| sources.buffers.get(buffer.index()).map(Vec::as_slice));
    let Some(positions) = reader.read_positions() else {
        log::warn!("skipping primitive of mesh `{name}` without positions");
        return None;
    };
    let positions: Vec<[f32; 3]> = positions.collect();
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|n| n.collect())
        .unwrap_or_default();
    let tex_coords: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().map(|uv| flip(uv, options)).collect())
        .unwrap_or_default();

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, position)| {
            Vertex::new(
                *position,
                normals.get(i).copied().unwrap_or_default(),
                tex_coords.get(i).copied().unwrap_or_default(),
            )
        })
        .collect();

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|i| i.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());
    let indices = match mode {
        Mode::TriangleStrip => triangulate_strip(&indices),
        Mode::TriangleFan => triangulate_fan(&indices),
        _ => indices,
    };

    let mut textures = Vec::new();
    if let Some(info) = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_texture()
    {
        let image = info.texture().source();
        match image.source() {
            gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
                textures.push(SceneTexture {
                    path: sources.directory.join(uri),
                    kind: TextureKind::Diffuse,
                    embedded: None,
                });
            }
            gltf::image::Source::View { .. } => match sources.images.get(image.index()) {
                Some(Some((key, bytes))) => textures.push(SceneTexture {
                    path: key.clone(),
                    kind: TextureKind::Diffuse,
                    embedded: Some(bytes.clone()),
                }),
                _ => log::warn!("base colour texture of mesh `{name}` lies outside its buffer"),
            },
            gltf::image::Source::Uri { .. } => {
                log::warn!("skipping data URI base colour texture of mesh `{name}`")
            }
        }
    }

    Some(SceneMesh {
        name: name.to_string(),
        vertices,
        indices,
        textures,
    })
}

/// Triangle list of a strip, keeping every triangle counter-clockwise.
pub fn triangulate_strip(indices: &[u32]) -> Vec<u32> {
    indices
        .windows(3)
        .enumerate()
        .flat_map(|(i, w)| {
            if i % 2 == 0 {
                [w[0], w[1], w[2]]
            } else {
                [w[1], w[0], w[2]]
            }
        })
        .collect()
}

pub fn triangulate_fan(indices: &[u32]) -> Vec<u32> {
    match indices.split_first() {
        Some((&hub, rest)) => rest
            .windows(2)
            .flat_map(|w| [hub, w[0], w[1]])
            .collect(),
        None => Vec::new(),
    }
}
