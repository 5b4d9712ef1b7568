//! Opaque resource handles.
//!
//! Handles are small integers issued from a fixed-capacity pool. They carry no
//! payload; owners (e.g. the texture registry) index their own slot arrays with them.

mod alloc;

pub use alloc::{Handle, HandleAllocator};
