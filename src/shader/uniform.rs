//! CPU-side uniform blocks addressed by name.
//!
//! A shader's uniforms live in one WGSL struct bound at `@group(0) @binding(0)`.
//! [`UniformStruct`] mirrors that struct on the host; [`UniformBlock`] lays it
//! out with the uniform address-space rules (vec3 aligned to 16, struct and
//! array members aligned and padded to 16) and flattens it into
//! `name -> slot` entries such as `u_PointLights[2].position`.

use std::collections::HashMap;

use super::ShaderError;

/// Member type of a uniform struct.
///
/// `Bool` is stored as a `u32`: WGSL has no host-shareable `bool`.
#[derive(Clone, Debug, PartialEq)]
pub enum UniformType {
    Bool,
    Int,
    UInt,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Struct(UniformStruct),
    Array(Box<UniformType>, u32),
}

/// Leaf kinds that can actually be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Bool,
    Int,
    UInt,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl std::fmt::Display for UniformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UniformKind::Bool => "bool",
            UniformKind::Int => "i32",
            UniformKind::UInt => "u32",
            UniformKind::Float => "f32",
            UniformKind::Vec2 => "vec2<f32>",
            UniformKind::Vec3 => "vec3<f32>",
            UniformKind::Vec4 => "vec4<f32>",
            UniformKind::Mat4 => "mat4x4<f32>",
        };
        f.write_str(name)
    }
}

/// Ordered list of named members, like a WGSL `struct`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UniformStruct {
    members: Vec<(String, UniformType)>,
}

impl UniformStruct {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, ty: UniformType) -> Self {
        self.members.push((name.to_string(), ty));
        self
    }

    pub fn with_struct(self, name: &str, inner: UniformStruct) -> Self {
        self.with(name, UniformType::Struct(inner))
    }

    pub fn with_array(self, name: &str, element: UniformType, count: u32) -> Self {
        self.with(name, UniformType::Array(Box::new(element), count))
    }

    /// `u_Model`, `u_View` and `u_Projection`, the prefix every sandbox
    /// vertex stage reads.
    pub fn transforms() -> Self {
        Self::new()
            .with("u_Model", UniformType::Mat4)
            .with("u_View", UniformType::Mat4)
            .with("u_Projection", UniformType::Mat4)
    }

    pub fn members(&self) -> &[(String, UniformType)] {
        &self.members
    }
}

fn round_up(align: u32, value: u32) -> u32 {
    value.div_ceil(align) * align
}

impl UniformType {
    pub fn align(&self) -> u32 {
        match self {
            UniformType::Bool | UniformType::Int | UniformType::UInt | UniformType::Float => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec3 | UniformType::Vec4 | UniformType::Mat4 => 16,
            UniformType::Struct(s) => {
                let widest = s.members.iter().map(|(_, ty)| ty.align()).max().unwrap_or(4);
                round_up(16, widest)
            }
            UniformType::Array(element, _) => round_up(16, element.align()),
        }
    }

    pub fn size(&self) -> u32 {
        match self {
            UniformType::Bool | UniformType::Int | UniformType::UInt | UniformType::Float => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec3 => 12,
            UniformType::Vec4 => 16,
            UniformType::Mat4 => 64,
            UniformType::Struct(s) => round_up(16, s.unpadded_size()),
            UniformType::Array(element, count) => element_stride(element) * count,
        }
    }

    fn kind(&self) -> Option<UniformKind> {
        Some(match self {
            UniformType::Bool => UniformKind::Bool,
            UniformType::Int => UniformKind::Int,
            UniformType::UInt => UniformKind::UInt,
            UniformType::Float => UniformKind::Float,
            UniformType::Vec2 => UniformKind::Vec2,
            UniformType::Vec3 => UniformKind::Vec3,
            UniformType::Vec4 => UniformKind::Vec4,
            UniformType::Mat4 => UniformKind::Mat4,
            UniformType::Struct(_) | UniformType::Array(..) => return None,
        })
    }
}

fn element_stride(element: &UniformType) -> u32 {
    round_up(16, round_up(element.align(), element.size()))
}

impl UniformStruct {
    fn member_offsets(&self) -> Vec<u32> {
        let mut cursor = 0;
        self.members
            .iter()
            .map(|(_, ty)| {
                let offset = round_up(ty.align(), cursor);
                cursor = offset + ty.size();
                offset
            })
            .collect()
    }

    fn unpadded_size(&self) -> u32 {
        match (self.members.last(), self.member_offsets().last()) {
            (Some((_, ty)), Some(offset)) => offset + ty.size(),
            _ => 0,
        }
    }
}

/// Byte offset and kind of one writable uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: u32,
    pub kind: UniformKind,
}

/// A laid-out uniform struct plus its current contents.
#[derive(Clone, Debug)]
pub struct UniformBlock {
    slots: HashMap<String, UniformSlot>,
    data: Vec<u8>,
}

impl UniformBlock {
    pub fn new(layout: &UniformStruct) -> Self {
        let mut slots = HashMap::new();
        flatten_struct(layout, "", 0, &mut slots);
        // wgpu rejects zero-sized uniform bindings.
        let size = UniformType::Struct(layout.clone()).size().max(16);
        Self {
            slots,
            data: vec![0; size as usize],
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn slot(&self, name: &str) -> Option<UniformSlot> {
        self.slots.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Write `bytes` to the uniform called `name` if its kind is one of `accepted`.
    pub fn write(
        &mut self,
        name: &str,
        accepted: &[UniformKind],
        bytes: &[u8],
    ) -> Result<(), ShaderError> {
        let slot = self
            .slot(name)
            .ok_or_else(|| ShaderError::UnknownUniform(name.to_string()))?;
        if !accepted.contains(&slot.kind) {
            return Err(ShaderError::UniformTypeMismatch {
                name: name.to_string(),
                expected: slot.kind,
                found: accepted[0],
            });
        }
        let start = slot.offset as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Raw bytes of a uniform, mostly useful to check what a draw will see.
    pub fn read(&self, name: &str) -> Option<&[u8]> {
        let slot = self.slot(name)?;
        let start = slot.offset as usize;
        let len = match slot.kind {
            UniformKind::Bool | UniformKind::Int | UniformKind::UInt | UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
        };
        Some(&self.data[start..start + len])
    }
}

fn qualified(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn flatten_struct(
    layout: &UniformStruct,
    prefix: &str,
    base: u32,
    slots: &mut HashMap<String, UniformSlot>,
) {
    for ((name, ty), offset) in layout.members.iter().zip(layout.member_offsets()) {
        flatten_member(ty, &qualified(prefix, name), base + offset, slots);
    }
}

fn flatten_member(
    ty: &UniformType,
    name: &str,
    offset: u32,
    slots: &mut HashMap<String, UniformSlot>,
) {
    match ty {
        UniformType::Struct(inner) => flatten_struct(inner, name, offset, slots),
        UniformType::Array(element, count) => {
            let stride = element_stride(element);
            for i in 0..*count {
                flatten_member(element, &format!("{name}[{i}]"), offset + i * stride, slots);
            }
        }
        leaf => {
            if let Some(kind) = leaf.kind() {
                slots.insert(name.to_string(), UniformSlot { offset, kind });
            }
        }
    }
}
