#![cfg(feature = "integration-tests")]

use std::path::PathBuf;

use render_sandbox::{
    context::headless_device, data_structures::texture::DepthBuffer, frame::Frame,
};

pub(crate) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub(crate) fn asset(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets").join(path)
}

/// Off-screen colour + depth target that renders one frame at a time and
/// hands the result back as an image.
pub(crate) struct Offscreen {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    color: wgpu::Texture,
    depth: DepthBuffer,
    width: u32,
    height: u32,
    frame_index: u64,
}

impl Offscreen {
    pub(crate) async fn new(width: u32, height: u32) -> Self {
        let (device, queue) = headless_device().await.expect("no GPU for integration tests");
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = DepthBuffer::new(&device, [width, height], false, "test depth");
        Self {
            device,
            queue,
            color,
            depth,
            width,
            height,
            frame_index: 0,
        }
    }

    pub(crate) fn depth_format(&self) -> wgpu::TextureFormat {
        self.depth.format
    }

    /// Run `draw` inside a pass cleared to `clear`. Commands are not submitted.
    pub(crate) fn record<F>(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        clear: wgpu::Color,
        draw: F,
    ) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Frame) -> anyhow::Result<()>,
    {
        self.frame_index += 1;
        let view = self.color.create_view(&wgpu::TextureViewDescriptor::default());
        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("test pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(self.depth.attachment()),
            ..Default::default()
        });
        let mut frame = Frame::new(self.frame_index, pass);
        draw(&mut frame)
    }

    /// Render one frame and read the target back.
    pub(crate) async fn render<F>(&mut self, clear: wgpu::Color, draw: F) -> anyhow::Result<image::RgbaImage>
    where
        F: FnOnce(&mut Frame) -> anyhow::Result<()>,
    {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("test") });
        self.record(&mut encoder, clear, draw)?;

        let unpadded = self.width * 4;
        let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("test readback"),
            size: (padded * self.height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })?;
        rx.receive().await.expect("readback channel closed")?;

        let mut pixels = Vec::with_capacity((unpadded * self.height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(padded as usize) {
                pixels.extend_from_slice(&row[..unpadded as usize]);
            }
        }
        readback.unmap();
        image::RgbaImage::from_raw(self.width, self.height, pixels)
            .ok_or_else(|| anyhow::anyhow!("readback has the wrong size"))
    }
}
