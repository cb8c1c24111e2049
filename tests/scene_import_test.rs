use std::path::{Path, PathBuf};

use render_sandbox::{
    data_structures::mesh::TextureKind,
    resources::scene::{
        ImportError, ImportOptions, import_scene, scene_directory, triangulate_fan,
        triangulate_strip,
    },
};

const QUADS_OBJ: &str = "\
mtllib quads.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 0.25
vt 0 0.25
vn 0 0 1

o first
usemtl wall
f 1/1/1 2/2/1 3/3/1 4/4/1

o second
f 1/1/1 3/3/1 4/4/1
";

const QUADS_MTL: &str = "\
newmtl wall
Kd 1 1 1
map_Kd textures/wall.png
map_Ks textures/wall_specular.png
";

fn write(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn obj_objects_come_back_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "quads.mtl", QUADS_MTL);
    let path = write(dir.path(), "quads.obj", QUADS_OBJ);

    let scene = import_scene(&path, ImportOptions::default()).await.unwrap();
    assert_eq!(scene.directory, dir.path());
    let names: Vec<&str> = scene.meshes.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);

    let first = &scene.meshes[0];
    assert_eq!(first.indices.len(), 6);
    assert_eq!(scene.meshes[1].indices.len(), 3);
    assert!(first.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
}

#[tokio::test]
async fn obj_texture_paths_resolve_against_the_scene_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "quads.mtl", QUADS_MTL);
    let path = write(dir.path(), "quads.obj", QUADS_OBJ);

    let scene = import_scene(&path, ImportOptions::default()).await.unwrap();
    let textures = &scene.meshes[0].textures;
    assert_eq!(textures.len(), 2);
    assert_eq!(textures[0].kind, TextureKind::Diffuse);
    assert_eq!(textures[0].path, dir.path().join("textures/wall.png"));
    assert_eq!(textures[1].kind, TextureKind::Specular);
    assert_eq!(textures[1].path, dir.path().join("textures/wall_specular.png"));
}

#[tokio::test]
async fn obj_uvs_are_flipped_unless_disabled() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "quads.mtl", QUADS_MTL);
    let path = write(dir.path(), "quads.obj", QUADS_OBJ);

    let v_of = |scene: &render_sandbox::resources::scene::SceneData| {
        let mut vs: Vec<f32> = scene.meshes[0]
            .vertices
            .iter()
            .map(|v| v.tex_coords[1])
            .collect();
        vs.sort_by(f32::total_cmp);
        vs
    };

    let flipped = import_scene(&path, ImportOptions::default()).await.unwrap();
    assert_eq!(v_of(&flipped), vec![0.75, 0.75, 1.0, 1.0]);

    let options = ImportOptions {
        flip_uvs: false,
        ..Default::default()
    };
    let raw = import_scene(&path, options).await.unwrap();
    assert_eq!(v_of(&raw), vec![0.0, 0.0, 0.25, 0.25]);
}

#[tokio::test]
async fn obj_without_its_material_library_still_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "quads.obj", QUADS_OBJ);

    let scene = import_scene(&path, ImportOptions::default()).await.unwrap();
    assert_eq!(scene.meshes.len(), 2);
    assert!(scene.meshes.iter().all(|m| m.textures.is_empty()));
}

#[tokio::test]
async fn obj_polygons_are_skipped_without_triangulation() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "quads.mtl", QUADS_MTL);
    let path = write(dir.path(), "quads.obj", QUADS_OBJ);

    let options = ImportOptions {
        triangulate: false,
        ..Default::default()
    };
    let scene = import_scene(&path, options).await.unwrap();
    let names: Vec<&str> = scene.meshes.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["second"]);
    assert_eq!(scene.meshes[0].indices.len(), 3);
}

#[tokio::test]
async fn empty_obj_has_no_meshes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "empty.obj", "# nothing here\n");
    let scene = import_scene(&path, ImportOptions::default()).await.unwrap();
    assert!(scene.meshes.is_empty());
}

#[tokio::test]
async fn missing_files_are_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.obj");
    let err = import_scene(&path, ImportOptions::default()).await.unwrap_err();
    assert!(matches!(err, ImportError::Io { path: p, .. } if p == path));
}

#[tokio::test]
async fn unknown_extensions_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "scene.fbx", "binary blob");
    let err = import_scene(&path, ImportOptions::default()).await.unwrap_err();
    assert!(matches!(err, ImportError::UnknownFormat(ext) if ext == "fbx"));
}

#[tokio::test]
async fn gltf_without_scenes_has_no_root() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "bare.gltf", r#"{"asset":{"version":"2.0"}}"#);
    let err = import_scene(&path, ImportOptions::default()).await.unwrap_err();
    assert!(matches!(err, ImportError::MissingRoot));
}

#[tokio::test]
async fn malformed_gltf_is_a_gltf_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "broken.gltf", "{ not json");
    let err = import_scene(&path, ImportOptions::default()).await.unwrap_err();
    assert!(matches!(err, ImportError::Gltf(_)));
}

/// Four positions in an external buffer drawn with `mode`, in a node tree two
/// levels deep.
fn four_vertex_gltf(mode: u32) -> String {
    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [ {{ "nodes": [0] }} ],
  "nodes": [
    {{ "name": "parent", "children": [1], "translation": [5.0, 0.0, 0.0] }},
    {{ "name": "child", "mesh": 0 }}
  ],
  "meshes": [ {{
    "name": "quad",
    "primitives": [ {{ "attributes": {{ "POSITION": 0 }}, "mode": {mode} }} ]
  }} ],
  "buffers": [ {{ "uri": "quad.bin", "byteLength": 48 }} ],
  "bufferViews": [ {{ "buffer": 0, "byteOffset": 0, "byteLength": 48 }} ],
  "accessors": [ {{
    "bufferView": 0,
    "componentType": 5126,
    "count": 4,
    "type": "VEC3",
    "min": [0.0, 0.0, 0.0],
    "max": [1.0, 1.0, 0.0]
  }} ]
}}"#
    )
}

fn quad_bin() -> Vec<u8> {
    let positions: [f32; 12] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
    positions.iter().flat_map(|f| f.to_le_bytes()).collect()
}

#[tokio::test]
async fn gltf_strip_is_triangulated_and_transforms_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "quad.bin", quad_bin());
    let path = write(dir.path(), "strip.gltf", four_vertex_gltf(5));

    let scene = import_scene(&path, ImportOptions::default()).await.unwrap();
    assert_eq!(scene.meshes.len(), 1);
    let mesh = &scene.meshes[0];
    assert_eq!(mesh.name, "quad");
    assert_eq!(mesh.indices, vec![0, 1, 2, 2, 1, 3]);
    assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);
    assert!(mesh.vertices.iter().all(|v| v.normal == [0.0; 3]));
    assert!(mesh.textures.is_empty());
}

#[tokio::test]
async fn gltf_strip_is_skipped_without_triangulation() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "quad.bin", quad_bin());
    let path = write(dir.path(), "strip.gltf", four_vertex_gltf(5));

    let options = ImportOptions {
        triangulate: false,
        ..Default::default()
    };
    let scene = import_scene(&path, options).await.unwrap();
    assert!(scene.meshes.is_empty());
}

const FAKE_IMAGE: &[u8] = b"\x89PNG embedded image bytes";

/// A triangle whose base colour texture is stored in the same buffer as its
/// positions.
fn textured_triangle_gltf(image_len: usize) -> String {
    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scenes": [ {{ "nodes": [0] }} ],
  "nodes": [ {{ "mesh": 0 }} ],
  "meshes": [ {{
    "name": "tri",
    "primitives": [ {{ "attributes": {{ "POSITION": 0 }}, "material": 0 }} ]
  }} ],
  "materials": [ {{ "pbrMetallicRoughness": {{ "baseColorTexture": {{ "index": 0 }} }} }} ],
  "textures": [ {{ "source": 0 }} ],
  "images": [ {{ "bufferView": 1, "mimeType": "image/png" }} ],
  "buffers": [ {{ "uri": "tri.bin", "byteLength": {total} }} ],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": {image_len} }}
  ],
  "accessors": [ {{
    "bufferView": 0,
    "componentType": 5126,
    "count": 3,
    "type": "VEC3",
    "min": [0.0, 0.0, 0.0],
    "max": [1.0, 1.0, 0.0]
  }} ]
}}"#,
        total = 36 + image_len
    )
}

#[tokio::test]
async fn gltf_buffer_view_images_are_embedded() {
    let dir = tempfile::tempdir().unwrap();
    let mut bin = quad_bin();
    bin.truncate(36);
    bin.extend_from_slice(FAKE_IMAGE);
    write(dir.path(), "tri.bin", bin);
    let path = write(dir.path(), "tri.gltf", textured_triangle_gltf(FAKE_IMAGE.len()));

    let scene = import_scene(&path, ImportOptions::default()).await.unwrap();
    let textures = &scene.meshes[0].textures;
    assert_eq!(textures.len(), 1);
    assert_eq!(textures[0].kind, TextureKind::Diffuse);
    assert_eq!(textures[0].embedded.as_deref(), Some(FAKE_IMAGE));
    assert_eq!(textures[0].path, PathBuf::from(format!("{}#image0", path.display())));
}

#[tokio::test]
async fn gltf_points_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "quad.bin", quad_bin());
    let path = write(dir.path(), "points.gltf", four_vertex_gltf(0));
    let scene = import_scene(&path, ImportOptions::default()).await.unwrap();
    assert!(scene.meshes.is_empty());
}

#[tokio::test]
async fn gltf_fan_is_triangulated_around_the_first_vertex() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "quad.bin", quad_bin());
    let path = write(dir.path(), "fan.gltf", four_vertex_gltf(6));
    let scene = import_scene(&path, ImportOptions::default()).await.unwrap();
    assert_eq!(scene.meshes[0].indices, vec![0, 1, 2, 0, 2, 3]);
}

#[test]
fn strip_alternates_winding() {
    assert_eq!(triangulate_strip(&[0, 1, 2, 3, 4]), vec![0, 1, 2, 2, 1, 3, 2, 3, 4]);
    assert!(triangulate_strip(&[0, 1]).is_empty());
}

#[test]
fn fan_shares_the_hub() {
    assert_eq!(triangulate_fan(&[9, 1, 2, 3]), vec![9, 1, 2, 9, 2, 3]);
    assert!(triangulate_fan(&[]).is_empty());
    assert!(triangulate_fan(&[4, 5]).is_empty());
}

#[test]
fn scene_directory_defaults_to_the_current_one() {
    assert_eq!(scene_directory(Path::new("model.obj")), PathBuf::from("."));
    assert_eq!(
        scene_directory(Path::new("assets/models/crate.obj")),
        PathBuf::from("assets/models")
    );
}
