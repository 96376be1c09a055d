//! GPU layer: the device interfaces the blitter is written against, and
//! their wgpu implementation

pub mod backend;
pub mod context;
pub mod device;
pub mod preprocess;

pub use backend::{
    GpuEntryPoint, GpuPipeline, GpuProgram, GpuRenderPass, GpuShaderModule, GpuTextureView,
    ShaderParameter,
};
pub use context::{ContextConfig, GpuContext};
pub use device::{
    GraphicsDevice, RenderPassEncoder, ScissorRect, ShaderCompiler, SubresourceRange, TextureDesc,
    TextureFilter, TextureShape, Viewport,
};

/// Blit template, specialized through `SRC_LAYOUT`, `SRC_TYPE` and `DST_TYPE`
pub const BLIT_WGSL: &str = include_str!("shaders/blit.wgsl");

/// Number of mip levels in a full chain down to 1x1
pub fn full_mip_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_mip_count() {
        assert_eq!(full_mip_count(1, 1), 1);
        assert_eq!(full_mip_count(2, 1), 2);
        assert_eq!(full_mip_count(256, 256), 9);
        assert_eq!(full_mip_count(300, 20), 9);
        assert_eq!(full_mip_count(0, 0), 1);
    }
}
