//! Texture ownership.
//!
//! Responsibilities:
//! - map pool handles to native texture resources (`registry`)
//! - decide when a destroyed texture's resource and handle are actually released
//! - create wgpu textures from raw RGBA pixels (`gpu`)
//! - decode image files into raw RGBA pixels (`decode`)

mod gpu;
mod decode;
mod registry;

pub use decode::{ImageData, ImageError};
pub use gpu::{GpuTexture, TextureFilter};
pub(crate) use gpu::validate_rgba;
pub use registry::{DestroyPolicy, TextureRegistry};
