//! Classic Phong material presets.

use cgmath::Vector4;

use crate::shader::{
    Shader, ShaderError,
    uniform::{UniformStruct, UniformType},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub ambient: Vector4<f32>,
    pub diffuse: Vector4<f32>,
    pub specular: Vector4<f32>,
    pub shininess: f32,
}

pub const OBSIDIAN: Material = Material {
    ambient: Vector4::new(0.05375, 0.05, 0.06625, 1.0),
    diffuse: Vector4::new(0.18275, 0.17, 0.22525, 1.0),
    specular: Vector4::new(0.332741, 0.328634, 0.346435, 1.0),
    shininess: 38.4,
};

pub const EMERALD: Material = Material {
    ambient: Vector4::new(0.0215, 0.1745, 0.0215, 1.0),
    diffuse: Vector4::new(0.07568, 0.61424, 0.07568, 1.0),
    specular: Vector4::new(0.633, 0.727811, 0.633, 1.0),
    shininess: 0.6,
};

pub const RUBY: Material = Material {
    ambient: Vector4::new(0.1745, 0.01175, 0.01175, 1.0),
    diffuse: Vector4::new(0.61424, 0.04136, 0.04136, 1.0),
    specular: Vector4::new(0.727811, 0.626959, 0.626959, 1.0),
    shininess: 0.6,
};

impl Material {
    /// Uniform struct with the members [`Material::apply`] writes.
    pub fn uniform_struct() -> UniformStruct {
        UniformStruct::new()
            .with("ambient", UniformType::Vec4)
            .with("diffuse", UniformType::Vec4)
            .with("specular", UniformType::Vec4)
            .with("shininess", UniformType::Float)
    }

    /// Write `<prefix>.ambient`, `.diffuse`, `.specular` and `.shininess`.
    pub fn apply(&self, shader: &mut Shader, prefix: &str) -> Result<(), ShaderError> {
        shader.set_vector4f(&format!("{prefix}.ambient"), self.ambient)?;
        shader.set_vector4f(&format!("{prefix}.diffuse"), self.diffuse)?;
        shader.set_vector4f(&format!("{prefix}.specular"), self.specular)?;
        shader.set_uniform_float(&format!("{prefix}.shininess"), self.shininess)
    }
}
