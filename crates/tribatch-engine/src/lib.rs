//! Tribatch engine crate.
//!
//! A small rendering layer over wgpu:
//! - [`handle`]: fixed-capacity handle pool with O(1) alloc/free
//! - [`state`]: redundant-binding elimination
//! - [`texture`]: handle-indexed texture registry with immediate or deferred destruction
//! - [`scene`]: per-frame draw list batching geometry and uniform blocks
//! - [`render`]: the `RendererBackend` contract and its three strategies
//!
//! plus the window/GPU runtime used to drive them.

pub mod core;
pub mod device;
pub mod time;
pub mod window;

pub mod coords;
pub mod handle;
pub mod logging;
pub mod render;
pub mod scene;
pub mod state;
pub mod texture;
