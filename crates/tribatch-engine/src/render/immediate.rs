use wgpu::util::DeviceExt;

use crate::handle::Handle;
use crate::scene::{UniformBlock, Vertex};
use crate::state::UniformBinding;
use crate::texture::DestroyPolicy;

use super::base::BackendBase;
use super::{BackendConfig, BackendKind, FrameStats, RenderCtx, RendererBackend};

/// No batching: every draw creates its own vertex, index and uniform buffers
/// and rebinds all of them before issuing one indexed draw.
///
/// Textures are destroyed immediately; commands already recorded keep their
/// resources alive until the GPU is done with them.
pub struct ImmediateBackend {
    base: BackendBase,
    /// Counts uniform buffers so each bind is seen as a new binding.
    uniform_serial: u64,
}

impl ImmediateBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            base: BackendBase::new(config, DestroyPolicy::Immediate),
            uniform_serial: 0,
        }
    }
}

impl RendererBackend for ImmediateBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Immediate
    }

    fn setup(&mut self, ctx: &RenderCtx<'_>) -> anyhow::Result<()> {
        self.base.setup(ctx, BackendKind::Immediate)
    }

    fn begin_frame(&mut self, ctx: &RenderCtx<'_>, target: &wgpu::TextureView) {
        self.base.begin_pass(ctx, target);
    }

    fn uniform(&mut self, block: &UniformBlock) {
        self.base.uniform = *block;
    }

    fn texture(&mut self, handle: Handle) {
        self.base.texture = handle;
    }

    fn draw(&mut self, ctx: &RenderCtx<'_>, vertices: &[Vertex], indices: &[u32]) {
        if indices.is_empty() || !self.base.in_frame() {
            return;
        }
        let Some(pipeline) = self.base.pipeline.as_ref() else { return };

        let block = self.base.uniform;
        let texture = self.base.texture;
        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(indices);
        let uniform_bytes = bytemuck::bytes_of(&block);

        let vbo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tribatch immediate vbo"),
            contents: vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tribatch immediate ibo"),
            contents: index_bytes,
            usage: wgpu::BufferUsages::INDEX,
        });
        let ubo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tribatch immediate ubo"),
            contents: uniform_bytes,
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let uniform_group = pipeline.uniform_bind_group(ctx.device, &ubo);

        self.base.record_upload(vertex_bytes.len());
        self.base.record_upload(index_bytes.len());
        self.base.record_upload(uniform_bytes.len());

        if !self.base.bind_texture(texture) {
            return;
        }

        self.uniform_serial += 1;
        let binding = UniformBinding {
            buffer_generation: self.uniform_serial,
            offset: 0,
        };
        self.base.bind_uniform(binding, &uniform_group, true);
        self.base.bind_geometry(vbo.slice(..), ibo.slice(..));
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
        log::debug!("immediate backend released");
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

    fn ready(gpu: &Headless) -> ImmediateBackend {
        let mut backend = ImmediateBackend::new(BackendConfig::default());
        backend.setup(&gpu.ctx()).expect("quad pipeline should build");
        backend
    }

    #[test]
    fn every_draw_uploads_and_rebinds() {
        let Some(gpu) = Headless::new() else { return };
        let mut backend = ready(&gpu);
        let quad = Vertex::quad([-0.5, -0.5], [0.5, 0.5]);

        backend.begin_frame(&gpu.ctx(), &gpu.view);
        for _ in 0..8 {
            backend.draw(&gpu.ctx(), &quad, &QUAD_INDICES);
        }
        let stats = backend.end_frame(&gpu.ctx());

        assert_eq!(stats.draw_calls, 8);
        assert_eq!(stats.uploads, 3 * 8);
        // pipeline + fallback texture once, then forced uniform + two buffers per draw
        assert_eq!(stats.bind_calls, 2 + 3 * 8);
    }

    #[test]
    fn fallback_texture_survives_destroy() {
        let Some(gpu) = Headless::new() else { return };
        let mut backend = ready(&gpu);
        let fallback = backend.base.texture;
        assert!(fallback.is_valid());

        backend.destroy_texture(fallback);

        let quad = Vertex::quad([-1.0, -1.0], [1.0, 1.0]);
        backend.begin_frame(&gpu.ctx(), &gpu.view);
        backend.draw(&gpu.ctx(), &quad, &QUAD_INDICES);
        let stats = backend.end_frame(&gpu.ctx());

        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.textures_released, 0);
    }

    #[test]
    fn handle_recycled_mid_frame_keeps_earlier_draws() {
        let Some(gpu) = Headless::new() else { return };
        let mut backend = ready(&gpu);
        let quad = Vertex::quad([-0.5, -0.5], [0.5, 0.5]);
        let texture = gpu.solid_texture(&mut backend, [255, 0, 0, 255]);

        backend.begin_frame(&gpu.ctx(), &gpu.view);
        backend.texture(texture);
        for _ in 0..3 {
            backend.draw(&gpu.ctx(), &quad, &QUAD_INDICES);
        }
        backend.destroy_texture(texture);

        let recreated = gpu.solid_texture(&mut backend, [0, 255, 0, 255]);
        assert_eq!(recreated, texture);
        backend.texture(recreated);
        for _ in 0..2 {
            backend.draw(&gpu.ctx(), &quad, &QUAD_INDICES);
        }
        let stats = backend.end_frame(&gpu.ctx());

        assert_eq!(stats.draw_calls, 5);
        assert_eq!(stats.textures_released, 0);
    }

    #[test]
    fn missing_texture_skips_the_draw() {
        let Some(gpu) = Headless::new() else { return };
        let mut backend = ready(&gpu);
        let quad = Vertex::quad([-0.5, -0.5], [0.5, 0.5]);

        backend.begin_frame(&gpu.ctx(), &gpu.view);
        backend.texture(Handle::INVALID);
        backend.draw(&gpu.ctx(), &quad, &QUAD_INDICES);
        let stats = backend.end_frame(&gpu.ctx());

        assert_eq!(stats.draw_calls, 0);
    }
}
