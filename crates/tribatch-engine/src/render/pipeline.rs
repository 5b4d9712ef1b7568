use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use thiserror::Error;

use crate::scene::{Vertex, UNIFORM_BLOCK_SIZE};
use crate::texture::TextureFilter;

use super::RenderCtx;

/// WGSL source of the quad program used by every backend.
pub const QUAD_SHADER: &str = include_str!("shaders/quad.wgsl");

const VERTEX_ENTRY: &str = "vs_main";
const FRAGMENT_ENTRY: &str = "fs_main";

static NEXT_PIPELINE_ID: AtomicU64 = AtomicU64::new(1);

/// Shader program failure, with the diagnostic text.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader `{label}` failed to compile:\n{log}")]
    Compile { label: String, log: String },

    #[error("shader `{label}` failed to link:\n{log}")]
    Link { label: String, log: String },
}

/// Parses and validates a WGSL program.
///
/// Syntax and type errors are compile errors. A program without both a
/// `vs_main` vertex and a `fs_main` fragment entry point is a link error.
pub fn compile_program(label: &str, source: &str) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        label: label.to_owned(),
        log: e.emit_to_string(source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| ShaderError::Compile {
        label: label.to_owned(),
        log: e.emit_to_string(source),
    })?;

    for (name, stage) in [
        (VERTEX_ENTRY, naga::ShaderStage::Vertex),
        (FRAGMENT_ENTRY, naga::ShaderStage::Fragment),
    ] {
        let found = module
            .entry_points
            .iter()
            .any(|ep| ep.name == name && ep.stage == stage);
        if !found {
            return Err(ShaderError::Link {
                label: label.to_owned(),
                log: format!("missing {stage:?} entry point `{name}`"),
            });
        }
    }

    Ok(module)
}

/// Compiled quad program plus the layouts and sampler shared by a backend.
///
/// Bind group 0 holds the 64-byte uniform block (dynamic offset);
/// bind group 1 holds texture unit 0 (texture view + sampler).
pub struct QuadPipeline {
    id: u64,
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
    pub sampler: wgpu::Sampler,
    pub format: wgpu::TextureFormat,
}

impl QuadPipeline {
    /// Builds the pipeline from WGSL `source`, validated by [`compile_program`] first.
    pub fn new(ctx: &RenderCtx<'_>, filter: TextureFilter, source: &str) -> Result<Self> {
        let label = "tribatch quad shader";
        compile_program(label, source).inspect_err(|e| log::error!("{e}"))?;

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let uniform_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("tribatch uniform bgl"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: true,
                            min_binding_size: wgpu::BufferSize::new(UNIFORM_BLOCK_SIZE),
                        },
                        count: None,
                    }],
                });

        let texture_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("tribatch texture bgl"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("tribatch quad pipeline layout"),
                    bind_group_layouts: &[&uniform_layout, &texture_layout],
                    immediate_size: 0,
                });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tribatch quad pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
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
            multiview_mask: None,
            cache: None,
        });

        let mode = filter.to_wgpu();
        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tribatch sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: mode,
            min_filter: mode,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            id: NEXT_PIPELINE_ID.fetch_add(1, Ordering::Relaxed),
            pipeline,
            uniform_layout,
            texture_layout,
            sampler,
            format: ctx.surface_format,
        })
    }

    /// Identity used by the binding cache.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Bind group exposing one 64-byte window of `buffer` at a dynamic offset.
    pub fn uniform_bind_group(
        &self,
        device: &wgpu::Device,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tribatch uniform bind group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(UNIFORM_BLOCK_SIZE),
                }),
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_shader_validates() {
        let module = compile_program("quad", QUAD_SHADER).expect("quad shader should validate");
        assert_eq!(module.entry_points.len(), 2);
    }

    #[test]
    fn syntax_error_is_compile_error() {
        let err = compile_program("broken", "fn vs_main( {").unwrap_err();
        match err {
            ShaderError::Compile { label, log } => {
                assert_eq!(label, "broken");
                assert!(!log.is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn type_error_is_compile_error() {
        let src = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return 1.0; }";
        assert!(matches!(
            compile_program("types", src),
            Err(ShaderError::Compile { .. })
        ));
    }

    #[test]
    fn missing_fragment_entry_is_link_error() {
        let src = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";
        let err = compile_program("vertex only", src).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
        assert!(err.to_string().contains("fs_main"));
    }
}
