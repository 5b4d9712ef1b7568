use crate::handle::Handle;

/// One indexed draw over a contiguous slice of the shared index buffer.
///
/// The uniform block for the command lives at the same position in
/// [`DrawList::uniforms`](super::DrawList::uniforms).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCommand {
    /// First index of the slice.
    pub offset: u32,
    /// Number of indices in the slice.
    pub count: u32,
    /// Texture bound while drawing the slice.
    pub texture: Handle,
}

impl DrawCommand {
    #[inline]
    pub const fn new(offset: u32, count: u32, texture: Handle) -> Self {
        Self { offset, count, texture }
    }

    /// Index range for `draw_indexed`.
    #[inline]
    pub fn index_range(&self) -> std::ops::Range<u32> {
        self.offset..self.offset + self.count
    }
}
