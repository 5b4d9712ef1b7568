//! Contract between the runtime loop and the application driving a backend.
//!
//! The runtime owns the window and GPU; the application receives a per-frame
//! context and decides what to render.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
