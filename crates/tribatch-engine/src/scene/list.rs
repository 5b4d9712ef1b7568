use crate::handle::Handle;

use super::{DrawCommand, UniformBlock, Vertex};

/// Per-frame accumulation of draws into shared vertex, index and uniform storage.
///
/// Performance characteristics:
/// - `submit()` is O(vertices + indices); indices are rebased while copying
/// - `reset()` keeps allocated capacity; no per-frame allocation once warmed
///
/// Commands stay in submission order and `commands()[i]` pairs with `uniforms()[i]`.
#[derive(Debug, Default)]
pub struct DrawList {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    commands: Vec<DrawCommand>,
    uniforms: Vec<UniformBlock>,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all recorded draws. Keeps allocated capacity for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.commands.clear();
        self.uniforms.clear();
    }

    /// Appends one draw.
    ///
    /// `indices` are relative to `vertices`; they are shifted by the number of
    /// vertices already recorded so the stored indices address the shared buffer.
    pub fn submit(
        &mut self,
        uniform: &UniformBlock,
        texture: Handle,
        vertices: &[Vertex],
        indices: &[u32],
    ) {
        let base = self.vertices.len() as u32;
        let offset = self.indices.len() as u32;

        self.vertices.extend_from_slice(vertices);
        self.indices.extend(indices.iter().map(|&i| i + base));
        self.uniforms.push(*uniform);
        self.commands.push(DrawCommand::new(offset, indices.len() as u32, texture));
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    #[inline]
    pub fn uniforms(&self) -> &[UniformBlock] {
        &self.uniforms
    }

    /// Number of recorded draws.
    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::QUAD_INDICES;

    fn triangle() -> [Vertex; 3] {
        [
            Vertex::new([0.0, 0.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0], [1.0, 0.0]),
            Vertex::new([0.0, 1.0], [0.0, 1.0]),
        ]
    }

    #[test]
    fn second_submit_rebases_indices() {
        let mut list = DrawList::new();
        let tex = Handle::from_raw(0);
        list.submit(&UniformBlock::default(), tex, &triangle(), &[0, 1, 2]);
        list.submit(&UniformBlock::default(), tex, &triangle(), &[0, 1, 2]);

        assert_eq!(list.vertices().len(), 6);
        assert_eq!(list.indices(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(list.len(), 2);
        assert!(list.commands().iter().all(|c| c.count == 3));
        assert_eq!(list.commands()[1].offset, 3);
    }

    #[test]
    fn commands_cover_indices_without_gaps() {
        let mut list = DrawList::new();
        let quad = Vertex::quad([0.0, 0.0], [1.0, 1.0]);
        for i in 0..5u16 {
            if i % 2 == 0 {
                list.submit(&UniformBlock::default(), Handle::from_raw(i), &quad, &QUAD_INDICES);
            } else {
                list.submit(&UniformBlock::default(), Handle::from_raw(i), &triangle(), &[2, 1, 0]);
            }
        }

        let mut expected = 0;
        for cmd in list.commands() {
            assert_eq!(cmd.offset, expected);
            expected += cmd.count;
        }
        assert_eq!(expected as usize, list.indices().len());
        let max = list.indices().iter().copied().max().unwrap_or(0);
        assert!((max as usize) < list.vertices().len());
    }

    #[test]
    fn uniforms_and_textures_follow_submission_order() {
        let mut list = DrawList::new();
        let red = UniformBlock::tinted([1.0, 0.0, 0.0, 1.0], [0.0, 0.0], [1.0, 1.0]);
        let blue = UniformBlock::tinted([0.0, 0.0, 1.0, 1.0], [0.0, 0.0], [1.0, 1.0]);
        list.submit(&red, Handle::from_raw(7), &triangle(), &[0, 1, 2]);
        list.submit(&blue, Handle::from_raw(2), &triangle(), &[0, 1, 2]);

        assert_eq!(list.uniforms(), &[red, blue]);
        assert_eq!(list.commands()[0].texture, Handle::from_raw(7));
        assert_eq!(list.commands()[1].texture, Handle::from_raw(2));
    }

    #[test]
    fn reset_empties_everything() {
        let mut list = DrawList::new();
        list.submit(&UniformBlock::default(), Handle::from_raw(0), &triangle(), &[0, 1, 2]);
        list.reset();

        assert!(list.is_empty());
        assert!(list.vertices().is_empty());
        assert!(list.indices().is_empty());
        assert!(list.uniforms().is_empty());

        list.submit(&UniformBlock::default(), Handle::from_raw(0), &triangle(), &[0, 1, 2]);
        assert_eq!(list.indices(), &[0, 1, 2]);
    }

    #[test]
    fn empty_draw_records_zero_count_command() {
        let mut list = DrawList::new();
        list.submit(&UniformBlock::default(), Handle::from_raw(0), &[], &[]);
        assert_eq!(list.commands()[0], DrawCommand::new(0, 0, Handle::from_raw(0)));
    }
}
