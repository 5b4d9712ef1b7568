//! GPU rendering backends.
//!
//! Every backend implements [`RendererBackend`] over the same quad pipeline
//! ([`QuadPipeline`]), texture registry and binding cache, composed through a
//! shared base. They differ only in when geometry and uniform data are uploaded.
//!
//! Convention:
//! - vertex positions are NDC, transformed by the uniform block's offset/scale
//! - uniform block = bind group 0 (dynamic offset), texture unit 0 = bind group 1

mod backend;
mod base;
mod batched;
mod buffer;
mod ctx;
mod frame;
#[cfg(test)]
mod headless;
mod immediate;
mod per_draw;
mod pipeline;
mod stats;

pub use backend::{
    create_backend, BackendConfig, BackendKind, ParseBackendKindError, RendererBackend,
};
pub use batched::BatchedBackend;
pub use buffer::{align_to, GpuBuffer};
pub use ctx::RenderCtx;
pub use immediate::ImmediateBackend;
pub use per_draw::PerDrawBackend;
pub use pipeline::{compile_program, QuadPipeline, ShaderError, QUAD_SHADER};
pub use stats::{FrameStats, ProfileSample};
