use crate::handle::{Handle, HandleAllocator};

/// When a destroyed texture is released.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DestroyPolicy {
    /// Resource dropped and handle recycled inside `destroy`.
    ///
    /// Only sound when nothing recorded later in the frame resolves the handle again.
    /// Draws recorded earlier in the frame may still name the handle: they hold
    /// the old resource by reference, so a handle reused in the same frame
    /// never redirects them to the new texture.
    Immediate,
    /// Handle queued; release happens in [`TextureRegistry::commit_destroyed`],
    /// which backends call after the frame's commands were submitted.
    Deferred,
}

/// Handle-indexed texture table.
///
/// Generic over the resource type so the lifecycle rules are independent of wgpu.
/// One slot per handle value; an empty slot means nothing is bound to that handle.
#[derive(Debug)]
pub struct TextureRegistry<T> {
    handles: HandleAllocator,
    slots: Vec<Option<T>>,
    policy: DestroyPolicy,
    pending: Vec<Handle>,
}

impl<T> TextureRegistry<T> {
    pub fn new(capacity: u16, policy: DestroyPolicy) -> Self {
        Self {
            handles: HandleAllocator::new(capacity),
            slots: (0..capacity).map(|_| None).collect(),
            policy,
            pending: Vec::new(),
        }
    }

    /// Allocates a handle and stores the resource built by `make`.
    ///
    /// Returns [`Handle::INVALID`] without calling `make` when the pool is exhausted.
    pub fn create(&mut self, make: impl FnOnce() -> T) -> Handle {
        let handle = self.handles.alloc();
        if !handle.is_valid() {
            log::warn!(
                "texture pool exhausted ({} of {} handles live)",
                self.handles.len(),
                self.handles.capacity()
            );
            return Handle::INVALID;
        }

        self.slots[handle.index()] = Some(make());
        handle
    }

    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    /// Destroys `handle` according to the registry's policy.
    ///
    /// Returns whether anything was released right away. Invalid, unknown, and
    /// already-pending handles are ignored.
    pub fn destroy(&mut self, handle: Handle) -> bool {
        if !handle.is_valid() || !self.handles.is_allocated(handle) {
            return false;
        }

        match self.policy {
            DestroyPolicy::Immediate => {
                self.release(handle);
                true
            }
            DestroyPolicy::Deferred => {
                if self.pending.contains(&handle) {
                    log::debug!("texture {handle:?} already pending destruction");
                } else {
                    self.pending.push(handle);
                }
                false
            }
        }
    }

    /// Releases every handle queued by deferred destruction.
    ///
    /// Must only run once no recorded command can still reference them.
    /// Returns the number released.
    pub fn commit_destroyed(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        for &handle in &pending {
            self.release(handle);
        }
        let released = pending.len();

        // Hand the allocation back for the next frame.
        self.pending = pending;
        self.pending.clear();
        released
    }

    /// Handles awaiting [`commit_destroyed`](Self::commit_destroyed).
    pub fn pending(&self) -> &[Handle] {
        &self.pending
    }

    pub fn is_pending(&self, handle: Handle) -> bool {
        self.pending.contains(&handle)
    }

    /// Drops every resource and resets the pool. Teardown only.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.pending.clear();
        self.handles.reset();
    }

    #[inline]
    pub fn policy(&self) -> DestroyPolicy {
        self.policy
    }

    /// Live handles, including ones pending deferred destruction.
    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.handles.capacity()
    }

    fn release(&mut self, handle: Handle) {
        if let Some(slot) = self.slots.get_mut(handle.index()) {
            *slot = None;
        }
        self.handles.free(handle);
    }
}
