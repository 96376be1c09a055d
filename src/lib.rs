//! Texture blits and mip-chain generation with lazily compiled,
//! format-specialized full-screen-triangle shaders.

pub mod blit;
pub mod error;
pub mod gpu;
pub mod reference;


// Re-export public API
pub use blit::{Blitter, PipelineVariantKey, ProgramVariantKey, TextureDataType, TextureLayout};
pub use error::{BlitError, BlitResult};
pub use gpu::{
    ContextConfig, GpuContext, GraphicsDevice, RenderPassEncoder, ShaderCompiler, SubresourceRange,
    TextureDesc, TextureFilter, TextureShape,
};
pub use reference::{downsample_rgba8, mean_abs_error, save_ppm};
