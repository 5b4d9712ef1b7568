//! Redundant-binding elimination.
//!
//! Every binding call a backend issues goes through a [`StateCache`]; the call is
//! only forwarded when the requested value differs from the last one applied.
//! As long as all mutation goes through the cache, cache and GPU state agree.

mod bindings;
mod cache;

pub use bindings::{BindingCache, UniformBinding, TEXTURE_UNITS};
pub use cache::StateCache;
