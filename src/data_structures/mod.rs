//! Engine data structures: textures, the texture cache, meshes and models.
//!
//! - `texture` holds GPU textures, the depth buffer and texture units
//! - `cache` is the weak-handle texture cache
//! - `mesh` contains the vertex format and single draw-call meshes
//! - `model` groups the meshes of one imported scene

pub mod cache;
pub mod mesh;
pub mod model;
pub mod texture;
