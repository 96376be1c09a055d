//! Shader variant classification
//!
//! A blit program only depends on how the source is laid out and on the
//! numeric class of source and destination. Everything else (size, exact
//! format) is irrelevant to the generated shader.

use std::fmt;

use crate::gpu::TextureShape;

/// Numeric class of a pixel format as seen by the shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDataType {
    /// Float, normalized (unorm/snorm/srgb) and depth formats
    Float,
    /// Everything else (uint/sint/stencil)
    Integer,
}

impl TextureDataType {
    pub fn from_format(format: wgpu::TextureFormat) -> Self {
        match format.sample_type(None, None) {
            Some(wgpu::TextureSampleType::Float { .. }) | Some(wgpu::TextureSampleType::Depth) => {
                Self::Float
            }
            Some(wgpu::TextureSampleType::Uint) | Some(wgpu::TextureSampleType::Sint) => {
                Self::Integer
            }
            // Combined depth/stencil formats have no single sample type
            None if format.has_depth_aspect() => Self::Float,
            None => Self::Integer,
        }
    }

    /// Value substituted for `SRC_TYPE` / `DST_TYPE`
    pub const fn define_value(self) -> u32 {
        match self {
            Self::Float => 0,
            Self::Integer => 1,
        }
    }
}

/// How the shader addresses the source texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureLayout {
    Texture2D,
    Texture2DArray,
}

impl TextureLayout {
    /// `None` for shapes the blitter cannot sample from
    pub fn from_shape(shape: TextureShape) -> Option<Self> {
        match shape {
            TextureShape::Texture2D => Some(Self::Texture2D),
            TextureShape::Texture2DArray => Some(Self::Texture2DArray),
            TextureShape::Texture1D | TextureShape::Texture3D => None,
        }
    }

    /// Value substituted for `SRC_LAYOUT`
    pub const fn define_value(self) -> u32 {
        match self {
            Self::Texture2D => 0,
            Self::Texture2DArray => 1,
        }
    }
}

/// Key of the program cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramVariantKey {
    pub src_layout: TextureLayout,
    pub src_type: TextureDataType,
    pub dst_type: TextureDataType,
}

impl ProgramVariantKey {
    /// Prepend this variant's defines to the shared template
    pub fn specialize(&self, template: &str) -> String {
        format!(
            "#define SRC_LAYOUT {}\n#define SRC_TYPE {}\n#define DST_TYPE {}\n{template}",
            self.src_layout.define_value(),
            self.src_type.define_value(),
            self.dst_type.define_value(),
        )
    }

    /// All 8 distinct program variants
    pub fn all() -> impl Iterator<Item = Self> {
        use TextureDataType::{Float, Integer};
        use TextureLayout::{Texture2D, Texture2DArray};
        [Texture2D, Texture2DArray].into_iter().flat_map(|src_layout| {
            [Float, Integer].into_iter().flat_map(move |src_type| {
                [Float, Integer].into_iter().map(move |dst_type| Self {
                    src_layout,
                    src_type,
                    dst_type,
                })
            })
        })
    }
}

impl fmt::Display for ProgramVariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = match self.src_layout {
            TextureLayout::Texture2D => "2d",
            TextureLayout::Texture2DArray => "2d_array",
        };
        let ty = |t: TextureDataType| match t {
            TextureDataType::Float => "float",
            TextureDataType::Integer => "int",
        };
        write!(f, "{layout}_{}_to_{}", ty(self.src_type), ty(self.dst_type))
    }
}

/// Key of the pipeline cache: the render target format is baked into pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineVariantKey {
    pub program: ProgramVariantKey,
    pub dst_format: wgpu::TextureFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use wgpu::TextureFormat as F;

    #[test]
    fn test_float_and_normalized_formats_are_float() {
        for format in [
            F::Rgba8Unorm,
            F::Rgba8UnormSrgb,
            F::Bgra8Unorm,
            F::Rgba8Snorm,
            F::R16Float,
            F::Rgba16Float,
            F::R32Float,
            F::Rgba32Float,
            F::Rgb10a2Unorm,
            F::Depth32Float,
            F::Depth24PlusStencil8,
        ] {
            assert_eq!(TextureDataType::from_format(format), TextureDataType::Float, "{format:?}");
        }
    }

    #[test]
    fn test_other_formats_are_integer() {
        let integer = [
            F::R8Uint,
            F::R8Sint,
            F::Rgba8Uint,
            F::Rg16Sint,
            F::R32Uint,
            F::Rgba32Sint,
            F::Stencil8,
        ];
        for format in integer {
            assert_eq!(
                TextureDataType::from_format(format),
                TextureDataType::Integer,
                "{format:?}"
            );
        }
    }

    #[test]
    fn test_layout_only_for_2d_shapes() {
        assert_eq!(
            TextureLayout::from_shape(TextureShape::Texture2D),
            Some(TextureLayout::Texture2D)
        );
        assert_eq!(
            TextureLayout::from_shape(TextureShape::Texture2DArray),
            Some(TextureLayout::Texture2DArray)
        );
        assert_eq!(TextureLayout::from_shape(TextureShape::Texture1D), None);
        assert_eq!(TextureLayout::from_shape(TextureShape::Texture3D), None);
    }

    #[test]
    fn test_specialize_prepends_defines() {
        let key = ProgramVariantKey {
            src_layout: TextureLayout::Texture2DArray,
            src_type: TextureDataType::Float,
            dst_type: TextureDataType::Integer,
        };
        let source = key.specialize("BODY");
        assert_eq!(source, "#define SRC_LAYOUT 1\n#define SRC_TYPE 0\n#define DST_TYPE 1\nBODY");
    }

    #[test]
    fn test_all_variants_are_distinct() {
        let keys: HashSet<_> = ProgramVariantKey::all().collect();
        assert_eq!(keys.len(), 8);
        let labels: HashSet<_> = ProgramVariantKey::all().map(|k| k.to_string()).collect();
        assert_eq!(labels.len(), 8);
    }
}
