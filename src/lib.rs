//! render-sandbox
//!
//! A small real-time 3D rendering sandbox on top of wgpu. The library holds
//! the reusable pieces (shader programs with named uniforms, meshes, a shared
//! texture cache, scene import and a fly camera); demo programs implement
//! [`app::Sandbox`] and call [`app::run`].
//!
//! High-level modules
//! - `app`: window, event loop and the `Sandbox` hooks
//! - `camera`: Euler-angle fly camera and perspective projection
//! - `config`: startup settings
//! - `context`: device, surface and the state shared by every frame
//! - `data_structures`: textures, the texture cache, meshes and models
//! - `frame`: per-frame render pass plus texture units
//! - `input`: mouse offsets and held-key camera movement
//! - `material`: Phong material presets
//! - `pick`: off-screen id target for mouse picking
//! - `resources`: file loading, image decoding and scene import
//! - `shader`: WGSL programs and uniform blocks
//!

pub mod app;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod frame;
pub mod input;
pub mod material;
pub mod pick;
pub mod resources;
pub mod shader;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit::keyboard::{KeyCode, ModifiersState};
