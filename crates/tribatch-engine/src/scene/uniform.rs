use bytemuck::{Pod, Zeroable};

/// Size of one [`UniformBlock`] in bytes.
pub const UNIFORM_BLOCK_SIZE: u64 = std::mem::size_of::<UniformBlock>() as u64;

/// Per-draw shader constants: four RGBA float vectors (64 bytes).
///
/// Shader convention:
/// - `vectors[0]`: tint multiplied with the sampled texel
/// - `vectors[1]`: `xy` offset and `zw` scale applied to vertex positions
/// - `vectors[2..]`: free for callers
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct UniformBlock {
    pub vectors: [[f32; 4]; 4],
}

impl Default for UniformBlock {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl UniformBlock {
    /// White tint, no offset, unit scale.
    pub const IDENTITY: UniformBlock = UniformBlock {
        vectors: [
            [1.0, 1.0, 1.0, 1.0],
            [0.0, 0.0, 1.0, 1.0],
            [0.0; 4],
            [0.0; 4],
        ],
    };

    /// Block with the given tint and position transform.
    pub fn tinted(tint: [f32; 4], offset: [f32; 2], scale: [f32; 2]) -> Self {
        let mut block = Self::IDENTITY;
        block.vectors[0] = tint;
        block.vectors[1] = [offset[0], offset[1], scale[0], scale[1]];
        block
    }

    #[inline]
    pub fn tint(&self) -> [f32; 4] {
        self.vectors[0]
    }
}

/// Distance between consecutive blocks in a uniform buffer bound with dynamic offsets.
///
/// Rounds [`UNIFORM_BLOCK_SIZE`] up to the device's `min_uniform_buffer_offset_alignment`.
pub fn uniform_stride(min_alignment: u32) -> u64 {
    let align = u64::from(min_alignment.max(1));
    UNIFORM_BLOCK_SIZE.div_ceil(align) * align
}

/// Lays out `blocks` at `stride` byte intervals, zero padding between blocks.
pub fn pack_uniforms(blocks: &[UniformBlock], stride: u64) -> Vec<u8> {
    let stride = stride.max(UNIFORM_BLOCK_SIZE) as usize;
    let mut bytes = vec![0u8; blocks.len() * stride];
    for (chunk, block) in bytes.chunks_exact_mut(stride).zip(blocks) {
        chunk[..UNIFORM_BLOCK_SIZE as usize].copy_from_slice(bytemuck::bytes_of(block));
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_sixty_four_bytes() {
        assert_eq!(UNIFORM_BLOCK_SIZE, 64);
    }

    #[test]
    fn stride_rounds_up_to_alignment() {
        assert_eq!(uniform_stride(256), 256);
        assert_eq!(uniform_stride(64), 64);
        assert_eq!(uniform_stride(32), 64);
        assert_eq!(uniform_stride(0), 64);
    }

    #[test]
    fn packed_blocks_land_on_stride_boundaries() {
        let a = UniformBlock::tinted([1.0, 0.0, 0.0, 1.0], [0.0, 0.0], [1.0, 1.0]);
        let b = UniformBlock::tinted([0.0, 1.0, 0.0, 1.0], [0.5, 0.5], [2.0, 2.0]);
        let bytes = pack_uniforms(&[a, b], 256);

        assert_eq!(bytes.len(), 512);
        assert_eq!(&bytes[..64], bytemuck::bytes_of(&a));
        assert!(bytes[64..256].iter().all(|&byte| byte == 0));
        assert_eq!(&bytes[256..320], bytemuck::bytes_of(&b));
    }

    #[test]
    fn tinted_sets_tint_and_transform() {
        let block = UniformBlock::tinted([0.1, 0.2, 0.3, 0.4], [0.5, 0.6], [0.7, 0.8]);
        assert_eq!(block.tint(), [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(block.vectors[1], [0.5, 0.6, 0.7, 0.8]);
    }
}
