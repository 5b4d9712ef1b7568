//! Per-frame draw accumulation.
//!
//! Responsibilities:
//! - merge many logically independent draws into shared vertex/index/uniform storage
//! - rebase each draw's local indices into the shared vertex space
//! - describe how to slice the shared storage back into individual draws (`DrawCommand`)
//!
//! Commands keep submission order; nothing is sorted or reordered.

mod cmd;
mod list;
mod uniform;
mod vertex;

pub use cmd::DrawCommand;
pub use list::DrawList;
pub use uniform::{pack_uniforms, uniform_stride, UniformBlock, UNIFORM_BLOCK_SIZE};
pub use vertex::{Vertex, QUAD_INDICES};
