use bytemuck::{Pod, Zeroable};

/// Interleaved vertex: position (xy) + texture coordinate (uv), 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub texcoord: [f32; 2],
}

/// Two counter-clockwise triangles over [`Vertex::quad`] corners.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2  // texcoord
    ];

    #[inline]
    pub const fn new(position: [f32; 2], texcoord: [f32; 2]) -> Self {
        Self { position, texcoord }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    /// Axis-aligned quad from `min` to `max`, texcoords spanning the full texture.
    ///
    /// Corner order matches [`QUAD_INDICES`]. Texture `v` grows downward while
    /// position `y` grows upward.
    pub fn quad(min: [f32; 2], max: [f32; 2]) -> [Vertex; 4] {
        [
            Vertex::new([min[0], min[1]], [0.0, 1.0]),
            Vertex::new([max[0], min[1]], [1.0, 1.0]),
            Vertex::new([max[0], max[1]], [1.0, 0.0]),
            Vertex::new([min[0], max[1]], [0.0, 0.0]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_four_floats() {
        assert_eq!(std::mem::size_of::<Vertex>(), 16);
        assert_eq!(Vertex::layout().array_stride, 16);
    }

    #[test]
    fn quad_corners_span_min_max() {
        let q = Vertex::quad([-1.0, -0.5], [1.0, 0.5]);
        assert_eq!(q[0].position, [-1.0, -0.5]);
        assert_eq!(q[2].position, [1.0, 0.5]);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < q.len()));
    }
}
