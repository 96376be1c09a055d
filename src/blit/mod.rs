//! Texture blits and mip-chain generation
//!
//! A blit renders a single full-screen triangle into the destination view
//! while sampling the source view. The shader is specialized per
//! `ProgramVariantKey` and compiled on first use; pipelines are additionally
//! specialized per destination format. Both live for as long as the
//! `Blitter` does.

pub mod cache;
pub mod variant;

use std::sync::Arc;

use crate::error::{BlitError, BlitResult};
use crate::gpu::{
    GraphicsDevice, RenderPassEncoder, ScissorRect, SubresourceRange, TextureDesc, TextureFilter,
    TextureShape, Viewport,
};

pub use cache::VariantCache;
pub use variant::{PipelineVariantKey, ProgramVariantKey, TextureDataType, TextureLayout};

/// Logical name of the blit template in the shader library
pub const BLIT_SHADER: &str = "blit";
pub const VERTEX_ENTRY_POINT: &str = "vs_main";
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";
/// Shader parameter receiving the source view
pub const SRC_PARAM: &str = "src";
/// Shader parameter receiving the sampler (`sampler` itself is a WGSL keyword)
pub const SAMPLER_PARAM: &str = "src_sampler";

/// Blits between textures, with cached format-specialized pipelines.
///
/// Not thread-safe: resolving a variant mutates the caches, so every
/// recording method takes `&mut self`.
pub struct Blitter<D: GraphicsDevice> {
    device: Arc<D>,
    linear_sampler: D::Sampler,
    point_sampler: D::Sampler,
    programs: VariantCache<ProgramVariantKey, D::Program>,
    pipelines: VariantCache<PipelineVariantKey, D::Pipeline>,
}

impl<D: GraphicsDevice> Blitter<D> {
    /// Create a blitter bound to `device`, with its linear and point samplers
    pub fn new(device: Arc<D>) -> BlitResult<Self> {
        let linear_sampler = device.create_sampler(TextureFilter::Linear)?;
        let point_sampler = device.create_sampler(TextureFilter::Point)?;

        Ok(Self {
            device,
            linear_sampler,
            point_sampler,
            programs: VariantCache::new(),
            pipelines: VariantCache::new(),
        })
    }

    /// Number of compiled programs
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Number of created pipelines
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Copy `src` into `dst`, resampling and converting as needed.
    ///
    /// # Errors
    /// `InvalidArgument` if either texture is not 2D / 2D-array, if the
    /// destination is not a render attachment or the source is not
    /// sampleable. Compilation and pipeline failures are propagated.
    pub fn blit(
        &mut self,
        encoder: &mut D::Encoder,
        dst: &D::TextureView,
        src: &D::TextureView,
        filter: TextureFilter,
    ) -> BlitResult<()> {
        let dst_desc = self.device.view_texture_desc(dst);
        let src_desc = self.device.view_texture_desc(src);
        validate_destination(&dst_desc)?;
        let src_layout = validate_source(&src_desc)?;

        let dst_mip = self.device.view_range(dst).base_mip_level;
        let src_mip = self.device.view_range(src).base_mip_level;

        // Both sizes come from the source texture; the viewport covers the
        // source's extent at the destination level.
        let (dst_width, dst_height) = src_desc.mip_size(dst_mip);
        let (src_width, src_height) = src_desc.mip_size(src_mip);

        let key = ProgramVariantKey {
            src_layout,
            src_type: TextureDataType::from_format(src_desc.format),
            dst_type: TextureDataType::from_format(dst_desc.format),
        };
        let pipeline = self.resolve_pipeline(key, dst_desc.format)?;

        log::trace!(
            "blit {key}: mip {src_mip} ({src_width}x{src_height}) -> mip {dst_mip} \
             ({dst_width}x{dst_height}), {filter:?}"
        );

        let sampler = match filter {
            TextureFilter::Linear => &self.linear_sampler,
            TextureFilter::Point => &self.point_sampler,
        };

        let mut pass = self.device.begin_render_pass(encoder, &[dst])?;
        pass.bind_pipeline(&pipeline)?;
        pass.set_viewport(Viewport::from_size(dst_width, dst_height));
        pass.set_scissor_rect(ScissorRect::from_size(dst_width, dst_height));
        pass.set_texture(SRC_PARAM, src)?;
        pass.set_sampler(SAMPLER_PARAM, sampler)?;
        pass.draw(3)?;
        pass.end();

        Ok(())
    }

    /// Blit between whole textures through default views
    pub fn blit_texture(
        &mut self,
        encoder: &mut D::Encoder,
        dst: &D::Texture,
        src: &D::Texture,
        filter: TextureFilter,
    ) -> BlitResult<()> {
        let dst_view = self.device.create_texture_view(dst, SubresourceRange::default())?;
        let src_view = self.device.create_texture_view(src, SubresourceRange::default())?;
        self.blit(encoder, &dst_view, &src_view, filter)
    }

    /// Fill mips 1.. of one array layer, each level downsampled from the
    /// previous one with linear filtering.
    ///
    /// # Errors
    /// `InvalidArgument` if `layer` is out of range; otherwise whatever the
    /// individual blits report.
    pub fn generate_mips(
        &mut self,
        encoder: &mut D::Encoder,
        texture: &D::Texture,
        layer: u32,
    ) -> BlitResult<()> {
        let desc = self.device.texture_desc(texture);
        if layer >= desc.array_layer_count {
            return Err(BlitError::invalid_argument(format!(
                "layer {layer} out of range for texture with {} layer(s)",
                desc.array_layer_count
            )));
        }

        for mip in 0..desc.mip_level_count.saturating_sub(1) {
            let src = self
                .device
                .create_texture_view(texture, SubresourceRange::single(mip, layer))?;
            let dst = self
                .device
                .create_texture_view(texture, SubresourceRange::single(mip + 1, layer))?;
            self.blit(encoder, &dst, &src, TextureFilter::default())?;
        }
        Ok(())
    }

    /// Compiled program for `key`, compiling on first use
    pub fn resolve_program(&mut self, key: ProgramVariantKey) -> BlitResult<Arc<D::Program>> {
        let device = &self.device;
        self.programs.get_or_try_insert_with(key, || {
            log::debug!("Compiling blit program {key}");
            let template = device.load_source(BLIT_SHADER)?;
            let source = key.specialize(&template);
            let module = device.compile_module(&format!("blit_{key}"), &source)?;
            let vertex = device.entry_point(&module, VERTEX_ENTRY_POINT)?;
            let fragment = device.entry_point(&module, FRAGMENT_ENTRY_POINT)?;
            device.link_program(&[&module], &[vertex, fragment])
        })
    }

    /// Pipeline for `key` rendering into `dst_format`, created on first use
    pub fn resolve_pipeline(
        &mut self,
        key: ProgramVariantKey,
        dst_format: wgpu::TextureFormat,
    ) -> BlitResult<Arc<D::Pipeline>> {
        let pipeline_key = PipelineVariantKey {
            program: key,
            dst_format,
        };
        if let Some(pipeline) = self.pipelines.get(&pipeline_key) {
            return Ok(pipeline);
        }

        let program = self.resolve_program(key)?;
        let device = &self.device;
        self.pipelines.get_or_try_insert_with(pipeline_key, || {
            log::debug!("Creating blit pipeline {key} -> {dst_format:?}");
            device.create_render_pipeline(&program, &[dst_format])
        })
    }
}

fn validate_destination(desc: &TextureDesc) -> BlitResult<()> {
    if !matches!(desc.shape, TextureShape::Texture2D | TextureShape::Texture2DArray) {
        return Err(BlitError::invalid_argument(format!(
            "destination must be a 2D or 2D array texture, got {:?}",
            desc.shape
        )));
    }
    if !desc.usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
        return Err(BlitError::invalid_argument(
            "destination texture was not created with RENDER_ATTACHMENT usage",
        ));
    }
    Ok(())
}

fn validate_source(desc: &TextureDesc) -> BlitResult<TextureLayout> {
    let layout = TextureLayout::from_shape(desc.shape).ok_or_else(|| {
        BlitError::invalid_argument(format!(
            "source must be a 2D or 2D array texture, got {:?}",
            desc.shape
        ))
    })?;
    if !desc.usage.contains(wgpu::TextureUsages::TEXTURE_BINDING) {
        return Err(BlitError::invalid_argument(
            "source texture was not created with TEXTURE_BINDING usage",
        ));
    }
    Ok(layout)
}
