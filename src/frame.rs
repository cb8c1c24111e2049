//! Per-frame drawing state handed to shaders and meshes.

use crate::data_structures::texture::TextureUnits;

/// One render pass plus the texture-unit table draws in it read from.
///
/// Shaders use [`Frame::index`] to know when a new frame started so they can
/// recycle their per-draw uniform slots. Passes recorded into the same command
/// buffer (e.g. an off-screen picking pass and the main pass) should share an
/// index.
pub struct Frame<'a> {
    index: u64,
    pass: wgpu::RenderPass<'a>,
    units: TextureUnits,
}

impl<'a> Frame<'a> {
    pub fn new(index: u64, pass: wgpu::RenderPass<'a>) -> Self {
        Self {
            index,
            pass,
            units: TextureUnits::default(),
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn pass(&mut self) -> &mut wgpu::RenderPass<'a> {
        &mut self.pass
    }

    pub fn units(&self) -> &TextureUnits {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut TextureUnits {
        &mut self.units
    }
}
