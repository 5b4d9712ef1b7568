/// "Set if changed" wrapper around one piece of bound GPU state.
///
/// `None` means unknown (fresh pass, or invalidated), so the next `apply` always binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateCache<T> {
    current: Option<T>,
}

impl<T> Default for StateCache<T> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<T: Copy + PartialEq> StateCache<T> {
    #[inline]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Runs `bind` only if `value` differs from the cached value.
    ///
    /// Returns whether `bind` was invoked.
    #[inline]
    pub fn apply(&mut self, value: T, bind: impl FnOnce(T)) -> bool {
        self.apply_with(value, false, bind)
    }

    /// Runs `bind` unconditionally and records `value`.
    #[inline]
    pub fn apply_forced(&mut self, value: T, bind: impl FnOnce(T)) -> bool {
        self.apply_with(value, true, bind)
    }

    pub fn apply_with(&mut self, value: T, force: bool, bind: impl FnOnce(T)) -> bool {
        if !force && self.current == Some(value) {
            return false;
        }
        bind(value);
        self.current = Some(value);
        true
    }

    #[inline]
    pub fn current(&self) -> Option<T> {
        self.current
    }

    /// Marks the state unknown so the next `apply` binds.
    #[inline]
    pub fn invalidate(&mut self) {
        self.current = None;
    }
}
