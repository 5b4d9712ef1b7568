/// Opaque pool handle.
///
/// Valid handles lie in `[0, capacity)`. [`Handle::INVALID`] is returned when the
/// pool is exhausted and is never issued by an allocator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Handle(u16);

impl Handle {
    /// Sentinel for "no handle".
    pub const INVALID: Handle = Handle(u16::MAX);

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u16::MAX
    }

    /// Slot index for owners that keep per-handle arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Bounded handle pool with O(1) alloc/free and index reuse.
///
/// Layout:
/// - `dense[..len]` holds the issued handles, `dense[len..]` the free ones
/// - `sparse[h]` is the position of handle `h` inside `dense`
///
/// Freeing swaps the handle with the last issued entry, so reuse order is LIFO-ish
/// and not FIFO. Freeing a handle twice without an intervening `alloc` corrupts
/// the pool; callers own that discipline.
#[derive(Debug, Clone)]
pub struct HandleAllocator {
    dense: Box<[u16]>,
    sparse: Box<[u16]>,
    len: u16,
}

impl HandleAllocator {
    /// Creates a pool issuing handles in `[0, capacity)`.
    pub fn new(capacity: u16) -> Self {
        let mut allocator = Self {
            dense: vec![0; capacity as usize].into_boxed_slice(),
            sparse: vec![0; capacity as usize].into_boxed_slice(),
            len: 0,
        };
        allocator.reset();
        allocator
    }

    /// Discards every allocation. Only meant for full teardown/reinit.
    pub fn reset(&mut self) {
        self.len = 0;
        for (i, slot) in self.dense.iter_mut().enumerate() {
            *slot = i as u16;
        }
        for (i, slot) in self.sparse.iter_mut().enumerate() {
            *slot = i as u16;
        }
    }

    /// Issues an unused handle, or [`Handle::INVALID`] when the pool is exhausted.
    pub fn alloc(&mut self) -> Handle {
        if self.is_full() {
            return Handle::INVALID;
        }

        let index = self.len;
        let raw = self.dense[index as usize];
        self.sparse[raw as usize] = index;
        self.len += 1;

        Handle(raw)
    }

    /// Returns `handle` to the pool. The invalid sentinel and out-of-range values are ignored.
    pub fn free(&mut self, handle: Handle) {
        if !handle.is_valid() || handle.index() >= self.dense.len() {
            return;
        }
        debug_assert!(self.len > 0, "free called on an empty handle pool");
        debug_assert!(self.is_allocated(handle), "double free of {handle:?}");
        if self.len == 0 {
            return;
        }

        let top = self.len - 1;
        let index = self.sparse[handle.index()];

        // Move the last issued handle into the hole, park the freed one at `top`.
        let moved = self.dense[top as usize];
        self.dense[index as usize] = moved;
        self.sparse[moved as usize] = index;

        self.dense[top as usize] = handle.0;
        self.sparse[handle.index()] = top;

        self.len = top;
    }

    /// Returns whether `handle` is currently issued.
    pub fn is_allocated(&self, handle: Handle) -> bool {
        let Some(&index) = self.sparse.get(handle.index()) else {
            return false;
        };
        index < self.len && self.dense[index as usize] == handle.0
    }

    /// Number of issued handles.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pool capacity fixed at construction.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Iterates issued handles (order unspecified).
    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        self.dense[..self.len()].iter().map(|&raw| Handle(raw))
    }
}
