//! Small value types shared by backends and callers.
//!
//! Vertex positions are in normalized device coordinates (-1..1, +Y up).
//! [`Viewport`] carries the surface size so callers can correct for aspect ratio.

mod color;
mod viewport;

pub use color::ColorRgba;
pub use viewport::Viewport;
