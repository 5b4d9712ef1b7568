use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::coords::ColorRgba;
use crate::handle::Handle;
use crate::scene::{UniformBlock, Vertex};
use crate::texture::TextureFilter;

use super::{
    BatchedBackend, FrameStats, ImmediateBackend, PerDrawBackend, RenderCtx, QUAD_SHADER,
};

/// Common contract of the interchangeable rendering strategies.
///
/// Per frame the caller runs `begin_frame`, then any number of
/// `uniform`/`texture`/`draw` calls, then `end_frame`. `uniform` and `texture`
/// set state that applies to every following `draw` until changed.
///
/// Variants differ only in when data crosses into GPU memory:
/// - [`BackendKind::Immediate`]: fresh buffers and a full rebind for every draw
/// - [`BackendKind::Batched`]: draws are recorded and uploaded in bulk at `end_frame`
/// - [`BackendKind::PerDrawUniform`]: geometry and uniform uploaded and bound per draw
pub trait RendererBackend {
    fn kind(&self) -> BackendKind;

    /// Builds the shader pipeline and the fallback texture.
    ///
    /// Shader compile or link failures are returned; the backend is unusable afterwards.
    fn setup(&mut self, ctx: &RenderCtx<'_>) -> anyhow::Result<()>;

    /// Starts a frame that clears `target` and resets per-frame state.
    fn begin_frame(&mut self, ctx: &RenderCtx<'_>, target: &wgpu::TextureView);

    /// Sets the uniform block used by subsequent draws.
    fn uniform(&mut self, block: &UniformBlock);

    /// Sets the texture used by subsequent draws.
    fn texture(&mut self, handle: Handle);

    /// Submits one indexed triangle list; `indices` address `vertices`.
    fn draw(&mut self, ctx: &RenderCtx<'_>, vertices: &[Vertex], indices: &[u32]);

    /// Finishes the frame, submits GPU work and returns its counters.
    fn end_frame(&mut self, ctx: &RenderCtx<'_>) -> FrameStats;

    /// Creates an RGBA8 texture. Returns [`Handle::INVALID`] when the pool is
    /// exhausted or the input is malformed.
    fn create_texture(
        &mut self,
        ctx: &RenderCtx<'_>,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Handle;

    /// Destroys a texture following the variant's destroy policy.
    fn destroy_texture(&mut self, handle: Handle);

    /// Releases every GPU resource. `setup` may be called again afterwards.
    fn cleanup(&mut self);

    /// Counters of the last completed frame.
    fn stats(&self) -> FrameStats;
}

/// Selects a [`RendererBackend`] implementation.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BackendKind {
    Immediate,
    #[default]
    Batched,
    PerDrawUniform,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::Immediate,
        BackendKind::Batched,
        BackendKind::PerDrawUniform,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            BackendKind::Immediate => "immediate",
            BackendKind::Batched => "batched",
            BackendKind::PerDrawUniform => "per-draw",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown backend `{0}` (expected immediate, batched or per-draw)")]
pub struct ParseBackendKindError(String);

impl FromStr for BackendKind {
    type Err = ParseBackendKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(BackendKind::Immediate),
            "batched" | "batch" => Ok(BackendKind::Batched),
            "per-draw" | "per-draw-uniform" | "perdraw" => Ok(BackendKind::PerDrawUniform),
            _ => Err(ParseBackendKindError(s.to_owned())),
        }
    }
}

/// Settings shared by all backend variants.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Texture handle pool size; fixed for the backend's lifetime.
    pub texture_capacity: u16,
    pub clear_color: ColorRgba,
    /// Sampling filter for every texture (wrap mode is clamp-to-edge).
    pub filter: TextureFilter,
    /// WGSL program with `vs_main`/`fs_main` over the quad vertex and uniform layout.
    pub shader: Cow<'static, str>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            texture_capacity: 128,
            clear_color: ColorRgba::new(0.3, 0.3, 0.5, 1.0),
            filter: TextureFilter::Linear,
            shader: Cow::Borrowed(QUAD_SHADER),
        }
    }
}

/// Instantiates the backend selected by `kind`. Call [`RendererBackend::setup`] next.
pub fn create_backend(kind: BackendKind, config: BackendConfig) -> Box<dyn RendererBackend> {
    match kind {
        BackendKind::Immediate => Box::new(ImmediateBackend::new(config)),
        BackendKind::Batched => Box::new(BatchedBackend::new(config)),
        BackendKind::PerDrawUniform => Box::new(PerDrawBackend::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::Headless;

    #[test]
    fn kind_parses_its_own_name() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.to_string().parse::<BackendKind>(), Ok(kind));
        }
    }

    #[test]
    fn kind_parse_is_case_insensitive() {
        assert_eq!("Per-Draw".parse::<BackendKind>(), Ok(BackendKind::PerDrawUniform));
        assert_eq!(" BATCHED ".parse::<BackendKind>(), Ok(BackendKind::Batched));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "instanced".parse::<BackendKind>().unwrap_err();
        assert!(err.to_string().contains("instanced"));
    }

    #[test]
    fn factory_returns_requested_kind() {
        for kind in BackendKind::ALL {
            let backend = create_backend(kind, BackendConfig::default());
            assert_eq!(backend.kind(), kind);
            assert_eq!(backend.stats(), FrameStats::default());
        }
    }

    #[test]
    fn setup_fails_on_shader_errors() {
        let Some(gpu) = Headless::new() else { return };
        let broken = [
            ("fn vs_main( {", "failed to compile"),
            (
                "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }",
                "fs_main",
            ),
        ];

        for kind in BackendKind::ALL {
            for (source, expected) in broken {
                let config = BackendConfig {
                    shader: Cow::Borrowed(source),
                    ..BackendConfig::default()
                };
                let mut backend = create_backend(kind, config);
                let err = backend.setup(&gpu.ctx()).unwrap_err();
                let message = format!("{err:#}");
                assert!(message.contains(kind.name()), "{message}");
                assert!(message.contains(expected), "{message}");
            }
        }
    }

    #[test]
    fn failed_setup_renders_clear_only_frames() {
        let Some(gpu) = Headless::new() else { return };
        let config = BackendConfig {
            shader: Cow::Borrowed("fn vs_main( {"),
            ..BackendConfig::default()
        };
        let quad = Vertex::quad([-0.5, -0.5], [0.5, 0.5]);

        for kind in BackendKind::ALL {
            let mut backend = create_backend(kind, config.clone());
            assert!(backend.setup(&gpu.ctx()).is_err());
            assert!(!backend.create_texture(&gpu.ctx(), 1, 1, &[0; 4]).is_valid());

            backend.begin_frame(&gpu.ctx(), &gpu.view);
            backend.draw(&gpu.ctx(), &quad, &crate::scene::QUAD_INDICES);
            assert_eq!(backend.end_frame(&gpu.ctx()).draw_calls, 0);
        }
    }

    #[test]
    fn default_config_matches_demo_clear_color() {
        let config = BackendConfig::default();
        assert_eq!(config.clear_color, ColorRgba::new(0.3, 0.3, 0.5, 1.0));
        assert_eq!(config.texture_capacity, 128);
    }
}
