//! Geometry, uniform layouts and light setup shared by the demo programs.

use render_sandbox::{
    camera::Camera,
    cgmath::{Angle, Deg, EuclideanSpace, Matrix4, Vector3, Vector4},
    material::Material,
    shader::{
        Shader, ShaderError,
        uniform::{UniformStruct, UniformType},
    },
};

pub const SHADER_DIR: &str = "shaders";

/// Asset directory of the repository, independent of the working directory.
pub const ASSET_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets");

/// Unit cube centred on the origin, 36 vertices of position(3) normal(3) uv(2).
#[rustfmt::skip]
pub const CUBE_VERTICES: [f32; 288] = [
    -0.5, -0.5, -0.5,   0.0,  0.0, -1.0,   0.0, 0.0,
     0.5, -0.5, -0.5,   0.0,  0.0, -1.0,   1.0, 0.0,
     0.5,  0.5, -0.5,   0.0,  0.0, -1.0,   1.0, 1.0,
     0.5,  0.5, -0.5,   0.0,  0.0, -1.0,   1.0, 1.0,
    -0.5,  0.5, -0.5,   0.0,  0.0, -1.0,   0.0, 1.0,
    -0.5, -0.5, -0.5,   0.0,  0.0, -1.0,   0.0, 0.0,

    -0.5, -0.5,  0.5,   0.0,  0.0,  1.0,   0.0, 0.0,
     0.5, -0.5,  0.5,   0.0,  0.0,  1.0,   1.0, 0.0,
     0.5,  0.5,  0.5,   0.0,  0.0,  1.0,   1.0, 1.0,
     0.5,  0.5,  0.5,   0.0,  0.0,  1.0,   1.0, 1.0,
    -0.5,  0.5,  0.5,   0.0,  0.0,  1.0,   0.0, 1.0,
    -0.5, -0.5,  0.5,   0.0,  0.0,  1.0,   0.0, 0.0,

    -0.5,  0.5,  0.5,  -1.0,  0.0,  0.0,   1.0, 0.0,
    -0.5,  0.5, -0.5,  -1.0,  0.0,  0.0,   1.0, 1.0,
    -0.5, -0.5, -0.5,  -1.0,  0.0,  0.0,   0.0, 1.0,
    -0.5, -0.5, -0.5,  -1.0,  0.0,  0.0,   0.0, 1.0,
    -0.5, -0.5,  0.5,  -1.0,  0.0,  0.0,   0.0, 0.0,
    -0.5,  0.5,  0.5,  -1.0,  0.0,  0.0,   1.0, 0.0,

     0.5,  0.5,  0.5,   1.0,  0.0,  0.0,   1.0, 0.0,
     0.5,  0.5, -0.5,   1.0,  0.0,  0.0,   1.0, 1.0,
     0.5, -0.5, -0.5,   1.0,  0.0,  0.0,   0.0, 1.0,
     0.5, -0.5, -0.5,   1.0,  0.0,  0.0,   0.0, 1.0,
     0.5, -0.5,  0.5,   1.0,  0.0,  0.0,   0.0, 0.0,
     0.5,  0.5,  0.5,   1.0,  0.0,  0.0,   1.0, 0.0,

    -0.5, -0.5, -0.5,   0.0, -1.0,  0.0,   0.0, 1.0,
     0.5, -0.5, -0.5,   0.0, -1.0,  0.0,   1.0, 1.0,
     0.5, -0.5,  0.5,   0.0, -1.0,  0.0,   1.0, 0.0,
     0.5, -0.5,  0.5,   0.0, -1.0,  0.0,   1.0, 0.0,
    -0.5, -0.5,  0.5,   0.0, -1.0,  0.0,   0.0, 0.0,
    -0.5, -0.5, -0.5,   0.0, -1.0,  0.0,   0.0, 1.0,

    -0.5,  0.5, -0.5,   0.0,  1.0,  0.0,   0.0, 1.0,
     0.5,  0.5, -0.5,   0.0,  1.0,  0.0,   1.0, 1.0,
     0.5,  0.5,  0.5,   0.0,  1.0,  0.0,   1.0, 0.0,
     0.5,  0.5,  0.5,   0.0,  1.0,  0.0,   1.0, 0.0,
    -0.5,  0.5,  0.5,   0.0,  1.0,  0.0,   0.0, 0.0,
    -0.5,  0.5, -0.5,   0.0,  1.0,  0.0,   0.0, 1.0,
];

pub const MAX_POINT_LIGHTS: usize = 4;

/// Constant, linear and quadratic terms; the light fades out over roughly 50 units.
pub const ATTENUATION: (f32, f32, f32) = (1.0, 0.09, 0.032);

fn directional_light() -> UniformStruct {
    UniformStruct::new()
        .with("direction", UniformType::Vec3)
        .with("ambient", UniformType::Vec4)
        .with("diffuse", UniformType::Vec4)
        .with("specular", UniformType::Vec4)
}

fn point_light() -> UniformStruct {
    UniformStruct::new()
        .with("position", UniformType::Vec3)
        .with("ambient", UniformType::Vec4)
        .with("diffuse", UniformType::Vec4)
        .with("specular", UniformType::Vec4)
        .with("constant", UniformType::Float)
        .with("linear", UniformType::Float)
        .with("quadratic", UniformType::Float)
}

fn spot_light() -> UniformStruct {
    UniformStruct::new()
        .with("position", UniformType::Vec3)
        .with("direction", UniformType::Vec3)
        .with("ambient", UniformType::Vec4)
        .with("diffuse", UniformType::Vec4)
        .with("specular", UniformType::Vec4)
        .with("constant", UniformType::Float)
        .with("linear", UniformType::Float)
        .with("quadratic", UniformType::Float)
        .with("cutOff", UniformType::Float)
        .with("outerCutOff", UniformType::Float)
}

/// Uniforms of `lit_fragment.wgsl`.
pub fn lit_uniforms() -> UniformStruct {
    UniformStruct::transforms()
        .with("u_ViewPosition", UniformType::Vec3)
        .with("u_PointLightCount", UniformType::Int)
        .with_struct(
            "u_Material",
            UniformStruct::new().with("shininess", UniformType::Float),
        )
        .with_struct("u_DirectionalLight", directional_light())
        .with_array(
            "u_PointLights",
            UniformType::Struct(point_light()),
            MAX_POINT_LIGHTS as u32,
        )
        .with_struct("u_SpotLight", spot_light())
}

/// Uniforms of `material_fragment.wgsl`.
pub fn material_uniforms() -> UniformStruct {
    UniformStruct::transforms()
        .with("u_ViewPosition", UniformType::Vec3)
        .with_struct("u_Material", Material::uniform_struct())
        .with_struct("u_DirectionalLight", directional_light())
}

/// Uniforms of `unlit_fragment.wgsl`.
pub fn unlit_uniforms() -> UniformStruct {
    UniformStruct::transforms().with("u_Color", UniformType::Vec4)
}

/// Uniforms of `outline_vertex.wgsl` paired with `unlit_fragment.wgsl`.
pub fn outline_uniforms() -> UniformStruct {
    unlit_uniforms().with("u_OutlineWidth", UniformType::Float)
}

/// Uniforms of `textured_fragment.wgsl`.
pub fn textured_uniforms() -> UniformStruct {
    UniformStruct::transforms().with("u_MixFactor", UniformType::Float)
}

/// Shader file under the asset root's shader directory.
pub fn shader_path(name: &str) -> String {
    format!("{SHADER_DIR}/{name}")
}

/// Sun-like light pointing down and slightly away from the viewer.
pub fn set_directional_light(shader: &mut Shader) -> Result<(), ShaderError> {
    shader.set_uniform3f("u_DirectionalLight.direction", -0.2, -1.0, -0.3)?;
    shader.set_uniform4f("u_DirectionalLight.ambient", 0.2, 0.2, 0.2, 1.0)?;
    shader.set_uniform4f("u_DirectionalLight.diffuse", 0.8, 0.8, 0.8, 1.0)?;
    shader.set_uniform4f("u_DirectionalLight.specular", 0.5, 0.5, 0.5, 1.0)
}

pub fn set_point_light(
    shader: &mut Shader,
    index: usize,
    position: Vector3<f32>,
) -> Result<(), ShaderError> {
    let name = format!("u_PointLights[{index}]");
    let (constant, linear, quadratic) = ATTENUATION;
    shader.set_vector3f(&format!("{name}.position"), position)?;
    shader.set_uniform4f(&format!("{name}.ambient"), 0.05, 0.05, 0.05, 1.0)?;
    shader.set_uniform4f(&format!("{name}.diffuse"), 0.8, 0.8, 0.8, 1.0)?;
    shader.set_uniform4f(&format!("{name}.specular"), 1.0, 1.0, 1.0, 1.0)?;
    shader.set_uniform_float(&format!("{name}.constant"), constant)?;
    shader.set_uniform_float(&format!("{name}.linear"), linear)?;
    shader.set_uniform_float(&format!("{name}.quadratic"), quadratic)
}

/// Flashlight held by the camera. A switched-off light keeps its cone but
/// contributes nothing.
pub fn set_spot_light(shader: &mut Shader, camera: &Camera, on: bool) -> Result<(), ShaderError> {
    let (constant, linear, quadratic) = ATTENUATION;
    let strength = if on { 1.0 } else { 0.0 };
    let colour = Vector4::new(strength, strength, strength, 1.0);
    let position = camera.position();
    shader.set_uniform3f("u_SpotLight.position", position.x, position.y, position.z)?;
    shader.set_vector3f("u_SpotLight.direction", camera.forward())?;
    shader.set_uniform4f("u_SpotLight.ambient", 0.0, 0.0, 0.0, 1.0)?;
    shader.set_vector4f("u_SpotLight.diffuse", colour)?;
    shader.set_vector4f("u_SpotLight.specular", colour)?;
    shader.set_uniform_float("u_SpotLight.constant", constant)?;
    shader.set_uniform_float("u_SpotLight.linear", linear)?;
    shader.set_uniform_float("u_SpotLight.quadratic", quadratic)?;
    shader.set_uniform_float("u_SpotLight.cutOff", Deg(5.0_f32).cos())?;
    shader.set_uniform_float("u_SpotLight.outerCutOff", Deg(17.5_f32).cos())
}

/// Write view, projection and eye position, the per-frame camera uniforms.
pub fn set_camera(
    shader: &mut Shader,
    camera: &Camera,
    view: &Matrix4<f32>,
    projection: &Matrix4<f32>,
) -> Result<(), ShaderError> {
    shader.set_matrix4f("u_View", view)?;
    shader.set_matrix4f("u_Projection", projection)?;
    match shader.set_vector3f("u_ViewPosition", camera.position().to_vec()) {
        Err(e) if !e.is_unknown_uniform() => Err(e),
        _ => Ok(()),
    }
}
