//! wgpu implementation of `ShaderCompiler`, `GraphicsDevice` and `RenderPassEncoder`
//!
//! Shaders are WGSL templates run through `preprocess`, then parsed and
//! validated with naga so compile errors surface synchronously. Resource
//! bindings are reflected from the naga module and turned into an explicit
//! bind group layout; render passes resolve named parameters against it.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::blit::BLIT_SHADER;
use crate::error::{BlitError, BlitResult};
use crate::gpu::context::GpuContext;
use crate::gpu::device::{
    GraphicsDevice, RenderPassEncoder, ScissorRect, ShaderCompiler, SubresourceRange, TextureDesc,
    TextureFilter, TextureShape, Viewport,
};
use crate::gpu::preprocess::preprocess;
use crate::gpu::BLIT_WGSL;

/// A resource binding reflected from a shader module
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderParameter {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub ty: wgpu::BindingType,
}

pub struct GpuShaderModule {
    label: String,
    module: Arc<wgpu::ShaderModule>,
    entry_points: Vec<(String, naga::ShaderStage)>,
    parameters: Vec<ShaderParameter>,
}

#[derive(Clone)]
pub struct GpuEntryPoint {
    module: Arc<wgpu::ShaderModule>,
    name: String,
    stage: naga::ShaderStage,
}

/// Linked vertex + fragment entry points with their binding layout
pub struct GpuProgram {
    label: String,
    vertex: GpuEntryPoint,
    fragment: GpuEntryPoint,
    parameters: Vec<ShaderParameter>,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
}

impl GpuProgram {
    fn parameter(&self, name: &str) -> BlitResult<&ShaderParameter> {
        self.parameters.iter().find(|p| p.name == name).ok_or_else(|| {
            BlitError::invalid_argument(format!("program {} has no parameter `{name}`", self.label))
        })
    }
}

pub struct GpuPipeline {
    pipeline: wgpu::RenderPipeline,
    program: Arc<GpuProgram>,
}

/// A view over a subresource range.
///
/// Holds a sampled view (dimension matching the texture's shape) when the
/// texture is sampleable, and a single-mip single-layer 2D view of the base
/// subresource when it is renderable.
pub struct GpuTextureView {
    desc: TextureDesc,
    range: SubresourceRange,
    sampled: Option<Arc<wgpu::TextureView>>,
    attachment: Option<wgpu::TextureView>,
}

enum BoundResource {
    Texture(Arc<wgpu::TextureView>),
    Sampler(Arc<wgpu::Sampler>),
}

pub struct GpuRenderPass<'e> {
    device: &'e wgpu::Device,
    pass: wgpu::RenderPass<'e>,
    features: wgpu::Features,
    target_size: (u32, u32),
    program: Option<Arc<GpuProgram>>,
    bound: BTreeMap<u32, BoundResource>,
}

/// Run `f` inside a validation error scope and report what the device rejected
fn validation_scope<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> Result<T, wgpu::Error> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let out = f();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(err),
        None => Ok(out),
    }
}

/// Whether a view of `format` can be bound where the layout expects `ty`
fn binding_accepts_format(
    ty: &wgpu::BindingType,
    format: wgpu::TextureFormat,
    features: wgpu::Features,
) -> bool {
    use wgpu::TextureSampleType as S;

    let wgpu::BindingType::Texture {
        sample_type: expected,
        ..
    } = ty
    else {
        return false;
    };
    let Some(actual) = format.sample_type(None, Some(features)) else {
        return false;
    };
    match (*expected, actual) {
        (S::Float { filterable: true }, S::Float { filterable }) => filterable,
        (S::Float { filterable: false }, S::Float { .. } | S::Depth) => true,
        (expected, actual) => expected == actual,
    }
}

/// Viewport extent after clipping to the render target
fn clamp_viewport(viewport: &Viewport, target: (u32, u32)) -> (f32, f32) {
    let (max_w, max_h) = (target.0 as f32, target.1 as f32);
    let width = viewport.width.min(max_w - viewport.x).max(0.0);
    let height = viewport.height.min(max_h - viewport.y).max(0.0);
    (width, height)
}

fn clamp_scissor(rect: ScissorRect, target: (u32, u32)) -> ScissorRect {
    let x = rect.x.min(target.0);
    let y = rect.y.min(target.1);
    ScissorRect {
        x,
        y,
        width: rect.width.min(target.0 - x),
        height: rect.height.min(target.1 - y),
    }
}

fn reflect_parameters(module: &naga::Module) -> BlitResult<Vec<ShaderParameter>> {
    let mut parameters = Vec::new();
    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        let name = var
            .name
            .clone()
            .ok_or_else(|| BlitError::compilation("resource binding without a name"))?;

        let ty = match &module.types[var.ty].inner {
            naga::TypeInner::Image {
                dim: naga::ImageDimension::D2,
                arrayed,
                class: naga::ImageClass::Sampled { kind, multi: false },
            } => {
                let sample_type = match kind {
                    naga::ScalarKind::Float => wgpu::TextureSampleType::Float { filterable: true },
                    naga::ScalarKind::Uint => wgpu::TextureSampleType::Uint,
                    naga::ScalarKind::Sint => wgpu::TextureSampleType::Sint,
                    other => {
                        return Err(BlitError::compilation(format!(
                            "`{name}` has unsupported sample kind {other:?}"
                        )));
                    }
                };
                wgpu::BindingType::Texture {
                    sample_type,
                    view_dimension: if *arrayed {
                        wgpu::TextureViewDimension::D2Array
                    } else {
                        wgpu::TextureViewDimension::D2
                    },
                    multisampled: false,
                }
            }
            naga::TypeInner::Sampler { comparison: false } => {
                wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
            }
            other => {
                return Err(BlitError::compilation(format!(
                    "`{name}` has unsupported resource type {other:?}"
                )));
            }
        };

        parameters.push(ShaderParameter {
            name,
            group: binding.group,
            binding: binding.binding,
            ty,
        });
    }
    Ok(parameters)
}

impl ShaderCompiler for GpuContext {
    type Module = GpuShaderModule;
    type EntryPoint = GpuEntryPoint;
    type Program = GpuProgram;

    fn load_source(&self, name: &str) -> BlitResult<Cow<'static, str>> {
        match name {
            BLIT_SHADER => Ok(Cow::Borrowed(BLIT_WGSL)),
            _ => Err(BlitError::compilation(format!("unknown shader source `{name}`"))),
        }
    }

    fn compile_module(&self, label: &str, source: &str) -> BlitResult<GpuShaderModule> {
        let wgsl = preprocess(source).map_err(|e| match e {
            BlitError::Compilation(msg) => BlitError::compilation(format!("{label}: {msg}")),
            other => other,
        })?;

        let module = naga::front::wgsl::parse_str(&wgsl)
            .map_err(|e| BlitError::compilation(format!("{label}: {}", e.emit_to_string(&wgsl))))?;
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .map_err(|e| BlitError::compilation(format!("{label}: {}", e.into_inner())))?;

        let parameters = reflect_parameters(&module)?;
        let entry_points = module
            .entry_points
            .iter()
            .map(|ep| (ep.name.clone(), ep.stage))
            .collect();

        let shader = validation_scope(&self.device, || {
            self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(wgsl.into()),
            })
        })
        .map_err(|e| BlitError::compilation(format!("{label}: {e}")))?;

        log::debug!("Compiled shader module {label} ({} parameters)", parameters.len());

        Ok(GpuShaderModule {
            label: label.to_string(),
            module: Arc::new(shader),
            entry_points,
            parameters,
        })
    }

    fn entry_point(&self, module: &GpuShaderModule, name: &str) -> BlitResult<GpuEntryPoint> {
        let (_, stage) = module
            .entry_points
            .iter()
            .find(|(ep, _)| ep == name)
            .ok_or_else(|| {
                BlitError::compilation(format!("{}: no entry point `{name}`", module.label))
            })?;
        Ok(GpuEntryPoint {
            module: Arc::clone(&module.module),
            name: name.to_string(),
            stage: *stage,
        })
    }

    fn link_program(
        &self,
        modules: &[&GpuShaderModule],
        entry_points: &[GpuEntryPoint],
    ) -> BlitResult<GpuProgram> {
        let label = modules
            .iter()
            .map(|m| m.label.as_str())
            .collect::<Vec<_>>()
            .join("+");

        let pick = |stage: naga::ShaderStage| -> BlitResult<GpuEntryPoint> {
            let mut matching = entry_points.iter().filter(|ep| ep.stage == stage);
            match (matching.next(), matching.next()) {
                (Some(ep), None) => Ok(ep.clone()),
                (None, _) => Err(BlitError::compilation(format!(
                    "{label}: no {stage:?} entry point"
                ))),
                (Some(_), Some(_)) => Err(BlitError::compilation(format!(
                    "{label}: more than one {stage:?} entry point"
                ))),
            }
        };
        let vertex = pick(naga::ShaderStage::Vertex)?;
        let fragment = pick(naga::ShaderStage::Fragment)?;

        let mut by_binding: BTreeMap<u32, ShaderParameter> = BTreeMap::new();
        for param in modules.iter().flat_map(|m| m.parameters.iter()) {
            if param.group != 0 {
                return Err(BlitError::compilation(format!(
                    "{label}: `{}` uses bind group {}, only group 0 is supported",
                    param.name, param.group
                )));
            }
            if let Some(existing) = by_binding.get(&param.binding) {
                if existing != param {
                    return Err(BlitError::compilation(format!(
                        "{label}: `{}` and `{}` both use binding {}",
                        existing.name, param.name, param.binding
                    )));
                }
                continue;
            }
            by_binding.insert(param.binding, param.clone());
        }
        let parameters: Vec<ShaderParameter> = by_binding.into_values().collect();

        let entries: Vec<wgpu::BindGroupLayoutEntry> = parameters
            .iter()
            .map(|p| wgpu::BindGroupLayoutEntry {
                binding: p.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: p.ty,
                count: None,
            })
            .collect();

        let bind_group_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label} Bind Group Layout")),
                entries: &entries,
            });
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{label} Pipeline Layout")),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        Ok(GpuProgram {
            label,
            vertex,
            fragment,
            parameters,
            bind_group_layout,
            pipeline_layout,
        })
    }
}

impl GraphicsDevice for GpuContext {
    type Texture = wgpu::Texture;
    type TextureView = GpuTextureView;
    type Sampler = Arc<wgpu::Sampler>;
    type Pipeline = GpuPipeline;
    type Encoder = wgpu::CommandEncoder;
    type RenderPass<'e>
        = GpuRenderPass<'e>
    where
        Self: 'e;

    fn create_sampler(&self, filter: TextureFilter) -> BlitResult<Arc<wgpu::Sampler>> {
        let (label, mode) = match filter {
            TextureFilter::Linear => ("Blit Sampler (Linear)", wgpu::FilterMode::Linear),
            TextureFilter::Point => ("Blit Sampler (Point)", wgpu::FilterMode::Nearest),
        };
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            mag_filter: mode,
            min_filter: mode,
            ..Default::default()
        });
        Ok(Arc::new(sampler))
    }

    fn create_texture_view(
        &self,
        texture: &wgpu::Texture,
        range: SubresourceRange,
    ) -> BlitResult<GpuTextureView> {
        let desc = self.texture_desc(texture);
        if !range.fits(&desc) {
            return Err(BlitError::invalid_argument(format!(
                "{range:?} outside texture with {} mip(s) and {} layer(s)",
                desc.mip_level_count, desc.array_layer_count
            )));
        }

        let sampled = if desc.usage.contains(wgpu::TextureUsages::TEXTURE_BINDING) {
            let dimension = match desc.shape {
                TextureShape::Texture1D => wgpu::TextureViewDimension::D1,
                TextureShape::Texture2D => wgpu::TextureViewDimension::D2,
                TextureShape::Texture2DArray => wgpu::TextureViewDimension::D2Array,
                TextureShape::Texture3D => wgpu::TextureViewDimension::D3,
            };
            let view = validation_scope(&self.device, || {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Blit Sampled View"),
                    dimension: Some(dimension),
                    base_mip_level: range.base_mip_level,
                    mip_level_count: range.mip_level_count,
                    base_array_layer: range.base_array_layer,
                    array_layer_count: range.array_layer_count,
                    ..Default::default()
                })
            })
            .map_err(|e| BlitError::device(format!("failed to create sampled view: {e}")))?;
            Some(Arc::new(view))
        } else {
            None
        };

        let renderable = desc.usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
            && matches!(desc.shape, TextureShape::Texture2D | TextureShape::Texture2DArray);
        let attachment = if renderable {
            let view = validation_scope(&self.device, || {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Blit Attachment View"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_mip_level: range.base_mip_level,
                    mip_level_count: Some(1),
                    base_array_layer: range.base_array_layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .map_err(|e| BlitError::device(format!("failed to create attachment view: {e}")))?;
            Some(view)
        } else {
            None
        };

        Ok(GpuTextureView {
            desc,
            range,
            sampled,
            attachment,
        })
    }

    fn texture_desc(&self, texture: &wgpu::Texture) -> TextureDesc {
        let layers = texture.depth_or_array_layers();
        let shape = match texture.dimension() {
            wgpu::TextureDimension::D1 => TextureShape::Texture1D,
            wgpu::TextureDimension::D2 if layers > 1 => TextureShape::Texture2DArray,
            wgpu::TextureDimension::D2 => TextureShape::Texture2D,
            wgpu::TextureDimension::D3 => TextureShape::Texture3D,
        };
        TextureDesc {
            shape,
            usage: texture.usage(),
            format: texture.format(),
            size: (texture.width(), texture.height()),
            mip_level_count: texture.mip_level_count(),
            array_layer_count: if shape == TextureShape::Texture3D { 1 } else { layers },
        }
    }

    fn view_texture_desc(&self, view: &GpuTextureView) -> TextureDesc {
        view.desc
    }

    fn view_range(&self, view: &GpuTextureView) -> SubresourceRange {
        view.range
    }

    fn create_render_pipeline(
        &self,
        program: &Arc<GpuProgram>,
        color_formats: &[wgpu::TextureFormat],
    ) -> BlitResult<GpuPipeline> {
        let targets: Vec<Option<wgpu::ColorTargetState>> = color_formats
            .iter()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();
        let label = format!("{} Pipeline {color_formats:?}", program.label);

        let pipeline = validation_scope(&self.device, || {
            self.device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(&label),
                    layout: Some(&program.pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &program.vertex.module,
                        entry_point: Some(program.vertex.name.as_str()),
                        buffers: &[], // Positions come from the vertex index
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &program.fragment.module,
                        entry_point: Some(program.fragment.name.as_str()),
                        targets: &targets,
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: None,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        unclipped_depth: false,
                        conservative: false,
                    },
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                })
        })
        .map_err(|e| BlitError::pipeline_creation(format!("{label}: {e}")))?;

        Ok(GpuPipeline {
            pipeline,
            program: Arc::clone(program),
        })
    }

    fn begin_render_pass<'e>(
        &'e self,
        encoder: &'e mut wgpu::CommandEncoder,
        color_attachments: &[&GpuTextureView],
    ) -> BlitResult<GpuRenderPass<'e>> {
        let mut attachments = Vec::with_capacity(color_attachments.len());
        for view in color_attachments {
            let target = view.attachment.as_ref().ok_or_else(|| {
                BlitError::invalid_argument("color attachment view is not renderable")
            })?;
            attachments.push(Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            }));
        }
        let target_size = color_attachments
            .first()
            .map(|view| view.desc.mip_size(view.range.base_mip_level))
            .unwrap_or((0, 0));

        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Blit Render Pass"),
            color_attachments: &attachments,
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        Ok(GpuRenderPass {
            device: &self.device,
            pass,
            features: self.device.features(),
            target_size,
            program: None,
            bound: BTreeMap::new(),
        })
    }
}

impl GpuRenderPass<'_> {
    fn bound_program(&self) -> BlitResult<&Arc<GpuProgram>> {
        self.program
            .as_ref()
            .ok_or_else(|| BlitError::invalid_argument("no pipeline bound"))
    }
}

impl RenderPassEncoder<GpuContext> for GpuRenderPass<'_> {
    fn bind_pipeline(&mut self, pipeline: &GpuPipeline) -> BlitResult<()> {
        self.pass.set_pipeline(&pipeline.pipeline);
        self.program = Some(Arc::clone(&pipeline.program));
        self.bound.clear();
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        // wgpu rejects viewports larger than the attachment
        let (width, height) = clamp_viewport(&viewport, self.target_size);
        if width != viewport.width || height != viewport.height {
            log::warn!(
                "Clamping viewport {}x{} to attachment size {}x{}",
                viewport.width,
                viewport.height,
                self.target_size.0,
                self.target_size.1
            );
        }
        self.pass.set_viewport(
            viewport.x,
            viewport.y,
            width,
            height,
            viewport.min_depth,
            viewport.max_depth,
        );
    }

    fn set_scissor_rect(&mut self, rect: ScissorRect) {
        let rect = clamp_scissor(rect, self.target_size);
        self.pass.set_scissor_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn set_texture(&mut self, name: &str, view: &GpuTextureView) -> BlitResult<()> {
        let param = self.bound_program()?.parameter(name)?;
        if !matches!(param.ty, wgpu::BindingType::Texture { .. }) {
            return Err(BlitError::invalid_argument(format!(
                "`{name}` is not a texture parameter"
            )));
        }
        if !binding_accepts_format(&param.ty, view.desc.format, self.features) {
            return Err(BlitError::invalid_argument(format!(
                "{:?} view cannot be bound to `{name}` ({:?})",
                view.desc.format, param.ty
            )));
        }
        let binding = param.binding;
        let sampled = view.sampled.clone().ok_or_else(|| {
            BlitError::invalid_argument(format!("view bound to `{name}` is not sampleable"))
        })?;
        self.bound.insert(binding, BoundResource::Texture(sampled));
        Ok(())
    }

    fn set_sampler(&mut self, name: &str, sampler: &Arc<wgpu::Sampler>) -> BlitResult<()> {
        let param = self.bound_program()?.parameter(name)?;
        if !matches!(param.ty, wgpu::BindingType::Sampler(_)) {
            return Err(BlitError::invalid_argument(format!(
                "`{name}` is not a sampler parameter"
            )));
        }
        let binding = param.binding;
        self.bound.insert(binding, BoundResource::Sampler(Arc::clone(sampler)));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32) -> BlitResult<()> {
        let program = Arc::clone(self.bound_program()?);

        let mut entries = Vec::with_capacity(program.parameters.len());
        for param in &program.parameters {
            let resource = match self.bound.get(&param.binding) {
                Some(BoundResource::Texture(view)) => wgpu::BindingResource::TextureView(view),
                Some(BoundResource::Sampler(sampler)) => wgpu::BindingResource::Sampler(sampler),
                None => {
                    return Err(BlitError::invalid_argument(format!(
                        "shader parameter `{}` was not bound",
                        param.name
                    )));
                }
            };
            entries.push(wgpu::BindGroupEntry {
                binding: param.binding,
                resource,
            });
        }

        let bind_group = validation_scope(self.device, || {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Blit Bind Group"),
                layout: &program.bind_group_layout,
                entries: &entries,
            })
        })
        .map_err(|e| BlitError::device(format!("failed to create bind group: {e}")))?;
        drop(entries);

        self.pass.set_bind_group(0, &bind_group, &[]);
        self.pass.draw(0..vertex_count, 0..1);
        Ok(())
    }

    fn end(self) {
        drop(self.pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blit::{ProgramVariantKey, TextureDataType, TextureLayout};
    use wgpu::{TextureFormat, TextureSampleType, TextureViewDimension};

    const FILTERABLE: TextureSampleType = TextureSampleType::Float { filterable: true };

    fn parse(source: &str) -> naga::Module {
        let wgsl = preprocess(source).unwrap();
        naga::front::wgsl::parse_str(&wgsl).unwrap()
    }

    fn variant_parameters(
        src_layout: TextureLayout,
        src_type: TextureDataType,
    ) -> Vec<ShaderParameter> {
        let key = ProgramVariantKey {
            src_layout,
            src_type,
            dst_type: TextureDataType::Float,
        };
        reflect_parameters(&parse(&key.specialize(BLIT_WGSL))).unwrap()
    }

    fn texture_param(
        sample_type: TextureSampleType,
        view_dimension: TextureViewDimension,
    ) -> ShaderParameter {
        ShaderParameter {
            name: "src".to_string(),
            group: 0,
            binding: 0,
            ty: wgpu::BindingType::Texture {
                sample_type,
                view_dimension,
                multisampled: false,
            },
        }
    }

    fn sampler_param() -> ShaderParameter {
        ShaderParameter {
            name: "src_sampler".to_string(),
            group: 0,
            binding: 1,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        }
    }

    #[test]
    fn test_reflects_float_2d_variant() {
        let params = variant_parameters(TextureLayout::Texture2D, TextureDataType::Float);
        assert_eq!(
            params,
            vec![
                texture_param(FILTERABLE, TextureViewDimension::D2),
                sampler_param(),
            ]
        );
    }

    #[test]
    fn test_reflects_integer_array_variant() {
        // The sampler is unused by integer variants but still part of the layout
        let params = variant_parameters(TextureLayout::Texture2DArray, TextureDataType::Integer);
        assert_eq!(
            params,
            vec![
                texture_param(TextureSampleType::Uint, TextureViewDimension::D2Array),
                sampler_param(),
            ]
        );
    }

    #[test]
    fn test_reflects_signed_textures_and_skips_private_globals() {
        let module = parse(
            "var<private> counter: u32;\n\
             @group(0) @binding(3) var ids: texture_2d<i32>;\n",
        );
        let params = reflect_parameters(&module).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "ids");
        assert_eq!(params[0].binding, 3);
        assert!(matches!(
            params[0].ty,
            wgpu::BindingType::Texture {
                sample_type: TextureSampleType::Sint,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_unsupported_resources() {
        let sources = [
            ("volume", "@group(0) @binding(0) var volume: texture_3d<f32>;\n"),
            ("shadow", "@group(0) @binding(0) var shadow: sampler_comparison;\n"),
            ("data", "@group(0) @binding(0) var<storage, read> data: array<u32>;\n"),
        ];
        for (name, source) in sources {
            let err = reflect_parameters(&parse(source)).unwrap_err();
            assert!(
                matches!(&err, BlitError::Compilation(msg) if msg.contains(name)),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn test_filterable_float_binding_accepts_only_filterable_formats() {
        let ty = texture_param(FILTERABLE, TextureViewDimension::D2).ty;
        let none = wgpu::Features::empty();

        assert!(binding_accepts_format(&ty, TextureFormat::Rgba8Unorm, none));
        assert!(binding_accepts_format(&ty, TextureFormat::Rgba16Float, none));
        assert!(!binding_accepts_format(&ty, TextureFormat::R32Float, none));
        assert!(binding_accepts_format(
            &ty,
            TextureFormat::R32Float,
            wgpu::Features::FLOAT32_FILTERABLE
        ));
        assert!(!binding_accepts_format(&ty, TextureFormat::Depth32Float, none));
        assert!(!binding_accepts_format(&ty, TextureFormat::Depth24PlusStencil8, none));
        assert!(!binding_accepts_format(&ty, TextureFormat::R8Sint, none));
        assert!(!binding_accepts_format(&ty, TextureFormat::Rgba8Uint, none));
    }

    #[test]
    fn test_integer_bindings_require_matching_signedness() {
        let uint = texture_param(TextureSampleType::Uint, TextureViewDimension::D2).ty;
        let none = wgpu::Features::empty();

        assert!(binding_accepts_format(&uint, TextureFormat::Rgba8Uint, none));
        assert!(binding_accepts_format(&uint, TextureFormat::R32Uint, none));
        assert!(!binding_accepts_format(&uint, TextureFormat::R8Sint, none));
        assert!(!binding_accepts_format(&uint, TextureFormat::Rgba8Unorm, none));
        assert!(!binding_accepts_format(&sampler_param().ty, TextureFormat::Rgba8Unorm, none));
    }

    #[test]
    fn test_clamp_viewport() {
        let target = (64, 32);
        let at = |x: f32, y: f32, width: u32, height: u32| Viewport {
            x,
            y,
            ..Viewport::from_size(width, height)
        };

        assert_eq!(clamp_viewport(&at(0.0, 0.0, 64, 32), target), (64.0, 32.0));
        assert_eq!(clamp_viewport(&at(0.0, 0.0, 128, 128), target), (64.0, 32.0));
        assert_eq!(clamp_viewport(&at(0.0, 0.0, 16, 8), target), (16.0, 8.0));
        assert_eq!(clamp_viewport(&at(48.0, 24.0, 32, 32), target), (16.0, 8.0));
        assert_eq!(clamp_viewport(&at(80.0, 40.0, 32, 32), target), (0.0, 0.0));
    }

    #[test]
    fn test_clamp_scissor() {
        let target = (64, 32);
        let at = |x: u32, y: u32, width: u32, height: u32| ScissorRect {
            x,
            y,
            width,
            height,
        };

        assert_eq!(clamp_scissor(ScissorRect::from_size(64, 32), target), at(0, 0, 64, 32));
        assert_eq!(clamp_scissor(ScissorRect::from_size(128, 128), target), at(0, 0, 64, 32));
        assert_eq!(clamp_scissor(ScissorRect::from_size(16, 8), target), at(0, 0, 16, 8));
        assert_eq!(clamp_scissor(at(48, 24, 32, 32), target), at(48, 24, 16, 8));
        assert_eq!(clamp_scissor(at(80, 40, 32, 32), target), at(64, 32, 0, 0));
    }
}
