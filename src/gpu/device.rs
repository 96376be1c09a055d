//! Device and shader-compiler interfaces consumed by the blitter
//!
//! The blitter never touches a concrete graphics API. Everything it needs is
//! expressed through `GraphicsDevice`, `ShaderCompiler` and
//! `RenderPassEncoder`; `GpuContext` implements them on top of wgpu.

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::BlitResult;

/// Sampling filter used for both minification and magnification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Point,
    #[default]
    Linear,
}

/// Declared type of a texture as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureShape {
    Texture1D,
    Texture2D,
    Texture2DArray,
    Texture3D,
}

/// Metadata the blitter reads from a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub shape: TextureShape,
    pub usage: wgpu::TextureUsages,
    pub format: wgpu::TextureFormat,
    /// Width and height of mip level 0
    pub size: (u32, u32),
    pub mip_level_count: u32,
    pub array_layer_count: u32,
}

impl TextureDesc {
    /// Pixel size of the given mip level (never smaller than 1x1)
    pub fn mip_size(&self, level: u32) -> (u32, u32) {
        let shrink = |dim: u32| dim.checked_shr(level).unwrap_or(0).max(1);
        (shrink(self.size.0), shrink(self.size.1))
    }
}

/// Range of mips and array layers selected by a texture view.
/// `None` counts mean "all remaining".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubresourceRange {
    pub base_mip_level: u32,
    pub mip_level_count: Option<u32>,
    pub base_array_layer: u32,
    pub array_layer_count: Option<u32>,
}

impl SubresourceRange {
    /// Exactly one mip level of one array layer
    pub fn single(mip_level: u32, array_layer: u32) -> Self {
        Self {
            base_mip_level: mip_level,
            mip_level_count: Some(1),
            base_array_layer: array_layer,
            array_layer_count: Some(1),
        }
    }

    /// Whether every selected mip and layer exists in a texture described by `desc`
    pub fn fits(&self, desc: &TextureDesc) -> bool {
        let within = |base: u32, count: Option<u32>, total: u32| match count {
            None => base < total,
            Some(0) => false,
            Some(n) => base.checked_add(n).is_some_and(|end| end <= total),
        };
        within(self.base_mip_level, self.mip_level_count, desc.mip_level_count)
            && within(self.base_array_layer, self.array_layer_count, desc.array_layer_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport at the origin with the default 0..1 depth range
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ScissorRect {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Session-style shader service: load source, compile, extract entry points, link.
pub trait ShaderCompiler {
    type Module;
    type EntryPoint;
    type Program;

    /// Load a fixed shader source by logical name
    fn load_source(&self, name: &str) -> BlitResult<Cow<'static, str>>;

    /// Compile complete shader source text into a module
    fn compile_module(&self, label: &str, source: &str) -> BlitResult<Self::Module>;

    /// Look up a named entry point in a compiled module
    fn entry_point(&self, module: &Self::Module, name: &str) -> BlitResult<Self::EntryPoint>;

    /// Link entry points from the given modules into a program
    fn link_program(
        &self,
        modules: &[&Self::Module],
        entry_points: &[Self::EntryPoint],
    ) -> BlitResult<Self::Program>;
}

/// Resource creation, queries and render-pass recording
pub trait GraphicsDevice: ShaderCompiler {
    type Texture;
    type TextureView;
    type Sampler;
    type Pipeline;
    type Encoder;
    type RenderPass<'e>: RenderPassEncoder<Self>
    where
        Self: 'e;

    /// Create a sampler using `filter` for both min and mag filtering
    fn create_sampler(&self, filter: TextureFilter) -> BlitResult<Self::Sampler>;

    fn create_texture_view(
        &self,
        texture: &Self::Texture,
        range: SubresourceRange,
    ) -> BlitResult<Self::TextureView>;

    fn texture_desc(&self, texture: &Self::Texture) -> TextureDesc;

    /// Metadata of the texture a view was created from
    fn view_texture_desc(&self, view: &Self::TextureView) -> TextureDesc;

    fn view_range(&self, view: &Self::TextureView) -> SubresourceRange;

    /// Create a graphics pipeline for `program` rendering into `color_formats`.
    /// The pipeline keeps `program` alive.
    fn create_render_pipeline(
        &self,
        program: &Arc<Self::Program>,
        color_formats: &[wgpu::TextureFormat],
    ) -> BlitResult<Self::Pipeline>;

    fn begin_render_pass<'e>(
        &'e self,
        encoder: &'e mut Self::Encoder,
        color_attachments: &[&Self::TextureView],
    ) -> BlitResult<Self::RenderPass<'e>>;
}

/// Commands recordable inside a render pass
pub trait RenderPassEncoder<D: GraphicsDevice + ?Sized> {
    fn bind_pipeline(&mut self, pipeline: &D::Pipeline) -> BlitResult<()>;

    fn set_viewport(&mut self, viewport: Viewport);

    fn set_scissor_rect(&mut self, rect: ScissorRect);

    /// Bind a texture view to the named shader parameter of the bound pipeline
    fn set_texture(&mut self, name: &str, view: &D::TextureView) -> BlitResult<()>;

    /// Bind a sampler to the named shader parameter of the bound pipeline
    fn set_sampler(&mut self, name: &str, sampler: &D::Sampler) -> BlitResult<()>;

    /// Non-indexed, single-instance draw
    fn draw(&mut self, vertex_count: u32) -> BlitResult<()>;

    fn end(self);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(width: u32, height: u32) -> TextureDesc {
        TextureDesc {
            shape: TextureShape::Texture2D,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            format: wgpu::TextureFormat::Rgba8Unorm,
            size: (width, height),
            mip_level_count: 1,
            array_layer_count: 1,
        }
    }

    #[test]
    fn test_mip_size_halves_and_clamps() {
        let d = desc(256, 64);
        assert_eq!(d.mip_size(0), (256, 64));
        assert_eq!(d.mip_size(1), (128, 32));
        assert_eq!(d.mip_size(6), (4, 1));
        assert_eq!(d.mip_size(8), (1, 1));
        assert_eq!(d.mip_size(40), (1, 1));
    }

    #[test]
    fn test_single_range() {
        let r = SubresourceRange::single(3, 2);
        assert_eq!(r.base_mip_level, 3);
        assert_eq!(r.mip_level_count, Some(1));
        assert_eq!(r.base_array_layer, 2);
        assert_eq!(r.array_layer_count, Some(1));
        assert_eq!(SubresourceRange::default().mip_level_count, None);
    }

    #[test]
    fn test_range_fits_checks_counts() {
        let mut d = desc(64, 64);
        d.mip_level_count = 7;
        d.array_layer_count = 3;

        assert!(SubresourceRange::default().fits(&d));
        assert!(SubresourceRange::single(6, 2).fits(&d));
        assert!(!SubresourceRange::single(7, 0).fits(&d));
        assert!(!SubresourceRange::single(0, 3).fits(&d));

        let too_many_mips = SubresourceRange {
            mip_level_count: Some(100),
            ..Default::default()
        };
        assert!(!too_many_mips.fits(&d));

        let tail = SubresourceRange {
            base_mip_level: 4,
            mip_level_count: Some(3),
            base_array_layer: 1,
            array_layer_count: None,
        };
        assert!(tail.fits(&d));

        let empty = SubresourceRange {
            array_layer_count: Some(0),
            ..Default::default()
        };
        assert!(!empty.fits(&d));

        let overflow = SubresourceRange {
            base_mip_level: 1,
            mip_level_count: Some(u32::MAX),
            ..Default::default()
        };
        assert!(!overflow.fits(&d));
    }
}
