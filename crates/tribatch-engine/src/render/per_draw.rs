use crate::handle::Handle;
use crate::scene::{UniformBlock, Vertex};
use crate::state::UniformBinding;
use crate::texture::DestroyPolicy;

use super::base::BackendBase;
use super::buffer::GpuBuffer;
use super::{BackendConfig, BackendKind, FrameStats, RenderCtx, RendererBackend};

/// Geometry and uniform block uploaded and bound for each draw as it is made.
///
/// Unlike [`ImmediateBackend`](super::ImmediateBackend) the buffers persist across
/// frames; each draw appends into them. The uniform block goes to its own
/// aligned slot and is bound with a dynamic offset every draw.
///
/// Textures are destroyed immediately, as draws bind them at call time.
pub struct PerDrawBackend {
    base: BackendBase,
    vertices: GpuBuffer,
    indices: GpuBuffer,
    uniforms: GpuBuffer,
    /// Uniform bind group and the buffer generation it was built for.
    uniform_group: Option<(u64, wgpu::BindGroup)>,
}

impl PerDrawBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            base: BackendBase::new(config, DestroyPolicy::Immediate),
            vertices: GpuBuffer::new("tribatch per-draw vbo", wgpu::BufferUsages::VERTEX),
            indices: GpuBuffer::new("tribatch per-draw ibo", wgpu::BufferUsages::INDEX),
            uniforms: GpuBuffer::new("tribatch per-draw ubo", wgpu::BufferUsages::UNIFORM),
            uniform_group: None,
        }
    }

    fn refresh_uniform_group(&mut self, device: &wgpu::Device) {
        let generation = self.uniforms.generation();
        if matches!(&self.uniform_group, Some((g, _)) if *g == generation) {
            return;
        }
        let (Some(pipeline), Some(buffer)) = (self.base.pipeline.as_ref(), self.uniforms.buffer())
        else {
            return;
        };
        self.uniform_group = Some((generation, pipeline.uniform_bind_group(device, buffer)));
    }
}

impl RendererBackend for PerDrawBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::PerDrawUniform
    }

    fn setup(&mut self, ctx: &RenderCtx<'_>) -> anyhow::Result<()> {
        self.base.setup(ctx, BackendKind::PerDrawUniform)
    }

    fn begin_frame(&mut self, ctx: &RenderCtx<'_>, target: &wgpu::TextureView) {
        self.base.begin_pass(ctx, target);
        self.vertices.rewind();
        self.indices.rewind();
        self.uniforms.rewind();
    }

    fn uniform(&mut self, block: &UniformBlock) {
        self.base.uniform = *block;
    }

    fn texture(&mut self, handle: Handle) {
        self.base.texture = handle;
    }

    fn draw(&mut self, ctx: &RenderCtx<'_>, vertices: &[Vertex], indices: &[u32]) {
        if indices.is_empty() || !self.base.in_frame() || !self.base.is_ready() {
            return;
        }

        let stride = self.base.uniform_stride(ctx);
        let block = self.base.uniform;
        let texture = self.base.texture;
        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(indices);
        let uniform_bytes = bytemuck::bytes_of(&block);

        let vertex_offset = self.vertices.append(ctx.device, ctx.queue, vertex_bytes, 4);
        let index_offset = self.indices.append(ctx.device, ctx.queue, index_bytes, 4);
        let uniform_offset = self.uniforms.append(ctx.device, ctx.queue, uniform_bytes, stride);
        self.base.record_upload(vertex_bytes.len());
        self.base.record_upload(index_bytes.len());
        self.base.record_upload(uniform_bytes.len());

        self.refresh_uniform_group(ctx.device);

        if !self.base.bind_texture(texture) {
            return;
        }

        let (Some((generation, group)), Some(vbo), Some(ibo)) = (
            self.uniform_group.as_ref(),
            self.vertices.buffer(),
            self.indices.buffer(),
        ) else {
            return;
        };

        let binding = UniformBinding {
            buffer_generation: *generation,
            offset: uniform_offset as u32,
        };
        self.base.bind_uniform(binding, group, false);
        self.base.bind_geometry(
            vbo.slice(vertex_offset..vertex_offset + vertex_bytes.len() as u64),
            ibo.slice(index_offset..index_offset + index_bytes.len() as u64),
        );
        self.base.draw_indexed(0..indices.len() as u32);
    }

    fn end_frame(&mut self, ctx: &RenderCtx<'_>) -> FrameStats {
        self.base.finish(ctx)
    }

    fn create_texture(
        &mut self,
        ctx: &RenderCtx<'_>,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Handle {
        self.base.create_texture(ctx, width, height, pixels)
    }

    fn destroy_texture(&mut self, handle: Handle) {
        self.base.destroy_texture(handle);
    }

    fn cleanup(&mut self) {
        self.base.cleanup();
        self.vertices.release();
        self.indices.release();
        self.uniforms.release();
        self.uniform_group = None;
        log::debug!("per-draw backend released");
    }

    fn stats(&self) -> FrameStats {
        self.base.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::Headless;
    use crate::scene::QUAD_INDICES;

    fn ready(gpu: &Headless) -> PerDrawBackend {
        let mut backend = PerDrawBackend::new(BackendConfig::default());
        backend.setup(&gpu.ctx()).expect("quad pipeline should build");
        backend
    }

    #[test]
    fn uniform_is_uploaded_and_bound_per_draw() {
        let Some(gpu) = Headless::new() else { return };
        let mut backend = ready(&gpu);
        let texture = gpu.solid_texture(&mut backend, [0, 0, 255, 255]);
        let quad = Vertex::quad([-0.5, -0.5], [0.5, 0.5]);

        // Enough draws to outgrow the initial buffers at least once.
        let count = 200u32;
        for _ in 0..2 {
            backend.begin_frame(&gpu.ctx(), &gpu.view);
            backend.texture(texture);
            for i in 0..count {
                let x = i as f32 / count as f32;
                backend.uniform(&UniformBlock::tinted([1.0; 4], [x, 0.0], [0.1, 0.1]));
                backend.draw(&gpu.ctx(), &quad, &QUAD_INDICES);
            }
            let stats = backend.end_frame(&gpu.ctx());

            assert_eq!(stats.draw_calls, count);
            assert_eq!(stats.uploads, 3 * count);
            // pipeline + texture once, then uniform offset + two buffers per draw
            assert_eq!(stats.bind_calls, 2 + 3 * count);
        }
    }

    #[test]
    fn handle_recycled_mid_frame_keeps_earlier_draws() {
        let Some(gpu) = Headless::new() else { return };
        let mut backend = ready(&gpu);
        let quad = Vertex::quad([-0.5, -0.5], [0.5, 0.5]);
        let texture = gpu.solid_texture(&mut backend, [255, 0, 0, 255]);

        backend.begin_frame(&gpu.ctx(), &gpu.view);
        backend.texture(texture);
        backend.draw(&gpu.ctx(), &quad, &QUAD_INDICES);
        backend.destroy_texture(texture);

        let recreated = gpu.solid_texture(&mut backend, [0, 255, 0, 255]);
        assert_eq!(recreated, texture);
        backend.texture(recreated);
        backend.draw(&gpu.ctx(), &quad, &QUAD_INDICES);
        let stats = backend.end_frame(&gpu.ctx());

        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.textures_released, 0);
    }

    #[test]
    fn cleanup_allows_setup_again() {
        let Some(gpu) = Headless::new() else { return };
        let mut backend = ready(&gpu);
        backend.cleanup();

        backend.setup(&gpu.ctx()).expect("second setup should succeed");
        let quad = Vertex::quad([-0.5, -0.5], [0.5, 0.5]);
        backend.begin_frame(&gpu.ctx(), &gpu.view);
        backend.draw(&gpu.ctx(), &quad, &QUAD_INDICES);
        assert_eq!(backend.end_frame(&gpu.ctx()).draw_calls, 1);
    }
}
