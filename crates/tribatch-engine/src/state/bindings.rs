use crate::handle::Handle;

use super::StateCache;

/// Number of texture units tracked (one bind group per unit).
pub const TEXTURE_UNITS: usize = 4;

/// Identifies what is bound at the uniform bind group: which buffer incarnation
/// and which dynamic offset into it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UniformBinding {
    pub buffer_generation: u64,
    pub offset: u32,
}

/// Per-pass binding state for the quad pipeline.
///
/// Each field caches one binding point; `bind_calls` counts the calls that were
/// actually forwarded to the render pass.
#[derive(Debug, Default)]
pub struct BindingCache {
    pipeline: StateCache<u64>,
    uniform: StateCache<UniformBinding>,
    textures: [StateCache<Handle>; TEXTURE_UNITS],
    bind_calls: u32,
}

impl BindingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything. Called when a new render pass starts with no bindings.
    pub fn invalidate_all(&mut self) {
        self.pipeline.invalidate();
        self.uniform.invalidate();
        for unit in &mut self.textures {
            unit.invalidate();
        }
    }

    /// Drops `handle` from every unit that still believes it is bound.
    ///
    /// Required when a handle is destroyed: a recycled handle must be rebound.
    pub fn forget_texture(&mut self, handle: Handle) {
        for unit in &mut self.textures {
            if unit.current() == Some(handle) {
                unit.invalidate();
            }
        }
    }

    pub fn bind_pipeline(&mut self, id: u64, bind: impl FnOnce(u64)) -> bool {
        let applied = self.pipeline.apply(id, bind);
        self.count(applied)
    }

    pub fn bind_uniform(
        &mut self,
        binding: UniformBinding,
        force: bool,
        bind: impl FnOnce(UniformBinding),
    ) -> bool {
        let applied = self.uniform.apply_with(binding, force, bind);
        self.count(applied)
    }

    /// Binds `handle` on texture `unit`. Units beyond [`TEXTURE_UNITS`] are not cached.
    pub fn bind_texture(&mut self, unit: usize, handle: Handle, bind: impl FnOnce(Handle)) -> bool {
        let applied = match self.textures.get_mut(unit) {
            Some(cache) => cache.apply(handle, bind),
            None => {
                bind(handle);
                true
            }
        };
        self.count(applied)
    }

    pub fn bound_texture(&self, unit: usize) -> Option<Handle> {
        self.textures.get(unit).and_then(StateCache::current)
    }

    /// Number of binding calls forwarded since the last [`take_bind_calls`](Self::take_bind_calls).
    pub fn bind_calls(&self) -> u32 {
        self.bind_calls
    }

    pub fn take_bind_calls(&mut self) -> u32 {
        std::mem::take(&mut self.bind_calls)
    }

    fn count(&mut self, applied: bool) -> bool {
        if applied {
            self.bind_calls += 1;
        }
        applied
    }
}
