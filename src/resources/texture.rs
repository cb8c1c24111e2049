//! Image decoding and mip generation, kept apart from the GPU upload so it can
//! be exercised without a device.

use std::path::Path;

use anyhow::Context;
use image::{RgbaImage, imageops::FilterType};

/// A decoded image, flipped so that row 0 is the bottom of the picture (the
/// texture-space origin meshes use), expanded to RGBA8.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// Channel count of the source image before expansion.
    pub channels: u8,
    pub rgba: RgbaImage,
}

impl TextureData {
    pub fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        let img = image::load_from_memory(bytes)?.flipv();
        let channels = img.color().channel_count();
        let rgba = img.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            channels,
            rgba,
        })
    }

    /// Fails when either side is larger than `max_dimension`, the device's
    /// 2D texture limit.
    pub fn check_dimensions(&self, max_dimension: u32) -> anyhow::Result<()> {
        if self.width > max_dimension || self.height > max_dimension {
            anyhow::bail!(
                "{}x{} exceeds the maximum texture size of {max_dimension}",
                self.width,
                self.height
            );
        }
        Ok(())
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading texture {}", path.display()))?;
        Self::decode(&bytes).with_context(|| format!("decoding texture {}", path.display()))
    }
}

/// Number of levels in a full mip chain down to 1×1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Every mip level of `base`, level 0 first. Each level halves the previous one
/// (rounding down, never below one texel).
pub fn mip_chain(base: &RgbaImage) -> Vec<RgbaImage> {
    let levels = mip_level_count(base.width(), base.height());
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(base.clone());
    for level in 1..levels {
        let width = (base.width() >> level).max(1);
        let height = (base.height() >> level).max(1);
        let previous = &chain[level as usize - 1];
        let next = image::imageops::resize(previous, width, height, FilterType::Triangle);
        chain.push(next);
    }
    chain
}
