//! Mouse picking through an off-screen integer render target.
//!
//! Meshes are drawn a second time with a shader that writes each vertex's
//! `object_id` into an `R32Uint` attachment. After the frame is submitted the
//! texel under the cursor is read back; 0 means the background.

use winit::dpi::PhysicalPosition;

pub const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Uint;
pub const PICK_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Copies must use a row pitch that is a multiple of this.
const ROW_PITCH: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

/// Texel under a cursor position, clamped into a `width × height` target.
pub fn cursor_to_texel(position: PhysicalPosition<f64>, width: u32, height: u32) -> (u32, u32) {
    let clamp = |v: f64, size: u32| {
        let max = size.saturating_sub(1) as f64;
        v.max(0.0).min(max).floor() as u32
    };
    (clamp(position.x, width), clamp(position.y, height))
}

#[derive(Debug)]
pub struct PickTarget {
    #[allow(unused)]
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    #[allow(unused)]
    depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
    readback: wgpu::Buffer,
    width: u32,
    height: u32,
    pending: bool,
}

impl PickTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let extent3d = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pick texture"),
            size: extent3d,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PICK_FORMAT,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pick depth texture"),
            size: extent3d,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PICK_DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick readback"),
            size: ROW_PITCH as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
            depth,
            readback,
            width,
            height,
            pending: false,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        *self = Self::new(device, width, height);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pass that clears ids to 0 and depth to 1.
    pub fn begin_pass<'e>(&self, encoder: &'e mut wgpu::CommandEncoder) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Pick Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            ..Default::default()
        })
    }

    /// Queue a copy of the texel under `position`; read it with
    /// [`PickTarget::read_id`] once the encoder has been submitted.
    pub fn copy_pixel(&mut self, encoder: &mut wgpu::CommandEncoder, position: PhysicalPosition<f64>) {
        let (x, y) = cursor_to_texel(position, self.width, self.height);
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.color,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(ROW_PITCH),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.pending = true;
    }

    /// Id written under the cursor by the last submitted pick pass. Blocks
    /// until the GPU is done. `None` for the background or when no copy is
    /// pending.
    pub fn read_id(&mut self, device: &wgpu::Device) -> Option<u32> {
        if !std::mem::take(&mut self.pending) {
            return None;
        }
        let slice = self.readback.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        if let Err(e) = device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        }) {
            log::error!("waiting for the pick readback failed: {e}");
            return None;
        }
        match futures::executor::block_on(rx.receive()) {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                log::error!("cannot map the pick readback: {e}");
                return None;
            }
            None => return None,
        }
        let id = {
            let data = slice.get_mapped_range();
            u32::from_le_bytes([data[0], data[1], data[2], data[3]])
        };
        self.readback.unmap();
        log::debug!("picked id {id}");
        (id != 0).then_some(id)
    }
}
