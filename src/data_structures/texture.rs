//! GPU textures, the depth attachment and the texture-unit table.
//!
//! [`Texture`] owns one 2D `wgpu::Texture` with a full mip chain and a sampler
//! whose wrap and filter settings can be changed after creation. Binding works
//! like GL texture units: [`Texture::bind`] attaches the image to a slot of a
//! frame's [`TextureUnits`], and the next draw's shader reads its samplers from
//! those slots.

use std::{
    cell::{Cell, RefCell},
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::resources::texture::{TextureData, mip_chain, mip_level_count};

/// Number of texture units a frame tracks.
pub const MAX_TEXTURE_UNITS: usize = 16;

/// What a shader needs to sample a texture.
#[derive(Clone, Debug)]
pub struct BoundTexture {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Per-frame unit table with an active unit, as in GL.
#[derive(Debug, Default)]
pub struct TextureUnits {
    active: usize,
    units: [Option<BoundTexture>; MAX_TEXTURE_UNITS],
}

impl TextureUnits {
    pub fn active(&self) -> usize {
        self.active
    }

    /// Select the unit later attach/detach calls affect. Out-of-range units are
    /// clamped to the last one.
    pub fn activate(&mut self, unit: usize) {
        if unit >= MAX_TEXTURE_UNITS {
            log::warn!("texture unit {unit} out of range, using {}", MAX_TEXTURE_UNITS - 1);
        }
        self.active = unit.min(MAX_TEXTURE_UNITS - 1);
    }

    pub fn attach(&mut self, texture: BoundTexture) {
        self.units[self.active] = Some(texture);
    }

    pub fn detach(&mut self) {
        self.units[self.active] = None;
    }

    pub fn get(&self, unit: usize) -> Option<&BoundTexture> {
        self.units.get(unit)?.as_ref()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerSettings {
    pub wrap_u: wgpu::AddressMode,
    pub wrap_v: wgpu::AddressMode,
    pub min_filter: wgpu::FilterMode,
    pub mag_filter: wgpu::FilterMode,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            wrap_u: wgpu::AddressMode::Repeat,
            wrap_v: wgpu::AddressMode::Repeat,
            min_filter: wgpu::FilterMode::Linear,
            mag_filter: wgpu::FilterMode::Linear,
        }
    }
}

fn create_sampler(device: &wgpu::Device, settings: SamplerSettings) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: settings.wrap_u,
        address_mode_v: settings.wrap_v,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: settings.mag_filter,
        min_filter: settings.min_filter,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}

/// A 2D image on the GPU.
#[derive(Debug)]
pub struct Texture {
    path: PathBuf,
    width: u32,
    height: u32,
    channels: u8,
    loaded: bool,
    #[allow(unused)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    device: wgpu::Device,
    sampler: RefCell<wgpu::Sampler>,
    settings: Cell<SamplerSettings>,
}

impl Texture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Decode and upload `path`. A file that cannot be read or decoded is
    /// logged and yields an empty 1×1 texture that reports `!is_loaded()`.
    pub fn load(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path) -> Self {
        match Self::try_load(device, queue, path) {
            Ok(texture) => texture,
            Err(e) => {
                log::error!("failed to load texture {}: {e:#}", path.display());
                Self::empty(device, queue, path)
            }
        }
    }

    pub fn try_load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
    ) -> anyhow::Result<Self> {
        let data = TextureData::open(path)?;
        Self::try_upload(device, queue, &data, path)
    }

    /// Decode an image held in memory, such as one embedded in a glTF
    /// binary. `key` names the texture in logs and in the cache. Failures
    /// give the same empty texture as [`Texture::load`].
    pub fn load_bytes(device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8], key: &Path) -> Self {
        let uploaded = TextureData::decode(bytes)
            .with_context(|| format!("decoding texture {}", key.display()))
            .and_then(|data| Self::try_upload(device, queue, &data, key));
        match uploaded {
            Ok(texture) => texture,
            Err(e) => {
                log::error!("failed to load texture {}: {e:#}", key.display());
                Self::empty(device, queue, key)
            }
        }
    }

    fn try_upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &TextureData,
        path: &Path,
    ) -> anyhow::Result<Self> {
        data.check_dimensions(device.limits().max_texture_dimension_2d)
            .with_context(|| format!("uploading texture {}", path.display()))?;
        log::info!(
            "loaded texture {} ({}x{}, {} channels)",
            path.display(),
            data.width,
            data.height,
            data.channels
        );
        Ok(Self::from_data(device, queue, data, path))
    }

    /// Upload decoded data with every mip level.
    pub fn from_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &TextureData,
        path: &Path,
    ) -> Self {
        let levels = mip_chain(&data.rgba);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&path.display().to_string()),
            size: wgpu::Extent3d {
                width: data.width,
                height: data.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_level_count(data.width, data.height),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (mip_level, level) in levels.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                level.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level.width()),
                    rows_per_image: Some(level.height()),
                },
                wgpu::Extent3d {
                    width: level.width(),
                    height: level.height(),
                    depth_or_array_layers: 1,
                },
            );
        }
        Self::wrap(device, texture, path, data.width, data.height, data.channels, true)
    }

    /// A single texel of one colour, used where a sampler has nothing bound.
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4], label: &str) -> Self {
        let texture = single_texel(device, queue, rgba, label);
        Self::wrap(device, texture, Path::new(label), 1, 1, 4, true)
    }

    fn empty(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path) -> Self {
        let texture = single_texel(device, queue, [0; 4], &path.display().to_string());
        Self::wrap(device, texture, path, 0, 0, 0, false)
    }

    fn wrap(
        device: &wgpu::Device,
        texture: wgpu::Texture,
        path: &Path,
        width: u32,
        height: u32,
        channels: u8,
        loaded: bool,
    ) -> Self {
        let settings = SamplerSettings::default();
        Self {
            path: path.to_path_buf(),
            width,
            height,
            channels,
            loaded,
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            texture,
            device: device.clone(),
            sampler: RefCell::new(create_sampler(device, settings)),
            settings: Cell::new(settings),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channels of the source image (3 for RGB, 4 for RGBA, ...); 0 if not loaded.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        self.settings.get()
    }

    pub fn set_wrap_mode(&self, wrap_u: wgpu::AddressMode, wrap_v: wgpu::AddressMode) {
        self.update_sampler(SamplerSettings {
            wrap_u,
            wrap_v,
            ..self.settings.get()
        });
    }

    pub fn set_filter(&self, min_filter: wgpu::FilterMode, mag_filter: wgpu::FilterMode) {
        self.update_sampler(SamplerSettings {
            min_filter,
            mag_filter,
            ..self.settings.get()
        });
    }

    fn update_sampler(&self, settings: SamplerSettings) {
        self.settings.set(settings);
        self.sampler.replace(create_sampler(&self.device, settings));
    }

    pub fn bound(&self) -> BoundTexture {
        BoundTexture {
            view: self.view.clone(),
            sampler: self.sampler.borrow().clone(),
        }
    }

    /// Make `unit` active and attach this texture to it.
    pub fn bind(&self, units: &mut TextureUnits, unit: usize) {
        units.activate(unit);
        units.attach(self.bound());
    }

    /// Detach whatever is bound to the active unit.
    pub fn unbind(&self, units: &mut TextureUnits) {
        units.detach();
    }
}

fn single_texel(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    rgba: [u8; 4],
    label: &str,
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width: 1,
        height: 1,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: Texture::FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        &rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: Some(1),
        },
        size,
    );
    texture
}

/// Depth (optionally depth + stencil) attachment of the main pass.
#[derive(Debug)]
pub struct DepthBuffer {
    #[allow(unused)]
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

impl DepthBuffer {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

    pub fn format_for(stencil: bool) -> wgpu::TextureFormat {
        if stencil {
            Self::DEPTH_STENCIL_FORMAT
        } else {
            Self::DEPTH_FORMAT
        }
    }

    pub fn new(device: &wgpu::Device, size: [u32; 2], stencil: bool, label: &str) -> Self {
        let format = Self::format_for(stencil);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size[0].max(1),
                height: size[1].max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            format,
        }
    }

    pub fn has_stencil(&self) -> bool {
        self.format.has_stencil_aspect()
    }

    /// Attachment that clears depth to 1 (and stencil to 0 when present).
    pub fn attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: self.has_stencil().then_some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(0),
                store: wgpu::StoreOp::Store,
            }),
        }
    }
}
