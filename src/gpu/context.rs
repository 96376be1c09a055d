//! GPU context management - headless device and queue setup, texture helpers

use crate::error::{BlitError, BlitResult};
use crate::gpu::device::GraphicsDevice;

/// Adapter and device selection for a headless context
#[derive(Clone, Debug)]
pub struct ContextConfig {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    /// Use a software adapter (e.g. for CI machines without a GPU)
    pub force_fallback_adapter: bool,
    pub device_label: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            device_label: "Blit Device".to_string(),
        }
    }
}

/// Holds all wgpu state needed for blitting
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Create a new headless GPU context
    pub fn new(config: &ContextConfig) -> BlitResult<Self> {
        pollster::block_on(Self::new_async(config))
    }

    async fn new_async(config: &ContextConfig) -> BlitResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: config.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: config.force_fallback_adapter,
            })
            .await
            .ok_or_else(|| BlitError::device("Failed to find suitable GPU adapter"))?;

        let adapter_info = adapter.get_info();
        log::info!("Using GPU: {} ({:?})", adapter_info.name, adapter_info.backend);

        // Lets 32-bit float sources go through the linear sampler
        let required_features = adapter.features() & wgpu::Features::FLOAT32_FILTERABLE;
        if required_features.is_empty() {
            log::debug!("FLOAT32_FILTERABLE unavailable, 32-bit float sources cannot be blitted");
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some(&config.device_label),
                    required_features,
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| BlitError::device(format!("Failed to create device: {e}")))?;

        Ok(Self {
            device,
            queue,
            adapter_info,
        })
    }

    /// Create a 2D texture; `layers > 1` makes it a 2D array
    pub fn create_texture(
        &self,
        label: &str,
        size: (u32, u32),
        layers: u32,
        mip_level_count: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: layers,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
    }

    pub fn create_encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Upload RGBA8 pixels into mip 0 of one array layer.
    /// `data` should be width * height * 4 bytes.
    pub fn upload_rgba8(&self, texture: &wgpu::Texture, layer: u32, data: &[u8]) {
        let (width, height) = (texture.width(), texture.height());
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Read back one mip level of one layer of an RGBA8 texture (blocks until done)
    pub fn read_rgba8(&self, texture: &wgpu::Texture, mip: u32, layer: u32) -> BlitResult<Vec<u8>> {
        let (width, height) = self.texture_desc(texture).mip_size(mip);
        let unpadded_row = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row = unpadded_row.div_ceil(align) * align;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: (padded_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.create_encoder("Readback Encoder");
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: mip,
                origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.submit(encoder);

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| BlitError::device("Readback callback was never invoked"))?
            .map_err(|e| BlitError::device(format!("Failed to map readback buffer: {e}")))?;

        let mut pixels = Vec::with_capacity((unpadded_row * height) as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks(padded_row as usize) {
                pixels.extend_from_slice(&row[..unpadded_row as usize]);
            }
        }
        buffer.unmap();

        Ok(pixels)
    }
}
