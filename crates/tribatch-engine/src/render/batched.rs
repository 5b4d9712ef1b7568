use crate::handle::Handle;
use crate::scene::{pack_uniforms, DrawList, UniformBlock, Vertex};
use crate::state::UniformBinding;
use crate::texture::DestroyPolicy;

use super::base::BackendBase;
use super::buffer::GpuBuffer;
use super::{BackendConfig, BackendKind, FrameStats, RenderCtx, RendererBackend};

/// Records the whole frame into a [`DrawList`] and touches the GPU only in `end_frame`.
///
/// `end_frame` performs three uploads (vertices, indices, packed uniform blocks),
/// binds the shared buffers once and then issues one indexed draw per command,
/// selecting the command's uniform block by dynamic offset. Texture binds go
/// through the binding cache, so runs of commands sharing a texture bind it once.
///
/// Texture destruction is deferred: commands recorded earlier in the frame may
/// still reference a destroyed handle until the frame is submitted.
pub struct BatchedBackend {
    base: BackendBase,
    list: DrawList,
    vertices: GpuBuffer,
    indices: GpuBuffer,
    uniforms: GpuBuffer,
    uniform_group: Option<(u64, wgpu::BindGroup)>,
}

impl BatchedBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            base: BackendBase::new(config, DestroyPolicy::Deferred),
            list: DrawList::new(),
            vertices: GpuBuffer::new("tribatch batched vbo", wgpu::BufferUsages::VERTEX),
            indices: GpuBuffer::new("tribatch batched ibo", wgpu::BufferUsages::INDEX),
            uniforms: GpuBuffer::new("tribatch batched ubo", wgpu::BufferUsages::UNIFORM),
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

    /// Uploads the draw list and replays its commands into the open pass.
    fn flush(&mut self, ctx: &RenderCtx<'_>) {
        let stride = self.base.uniform_stride(ctx);

        let vertex_bytes: &[u8] = bytemuck::cast_slice(self.list.vertices());
        let index_bytes: &[u8] = bytemuck::cast_slice(self.list.indices());
        if vertex_bytes.is_empty() || index_bytes.is_empty() {
            return;
        }
        let vertex_len = vertex_bytes.len() as u64;
        let index_len = index_bytes.len() as u64;
        let packed = pack_uniforms(self.list.uniforms(), stride);

        self.vertices.upload(ctx.device, ctx.queue, vertex_bytes);
        self.indices.upload(ctx.device, ctx.queue, index_bytes);
        self.uniforms.upload(ctx.device, ctx.queue, &packed);
        self.base.record_upload(vertex_bytes.len());
        self.base.record_upload(index_bytes.len());
        self.base.record_upload(packed.len());

        self.refresh_uniform_group(ctx.device);

        let (Some((generation, group)), Some(vbo), Some(ibo)) = (
            self.uniform_group.as_ref(),
            self.vertices.buffer(),
            self.indices.buffer(),
        ) else {
            return;
        };

        self.base.bind_geometry(vbo.slice(..vertex_len), ibo.slice(..index_len));

        for (i, cmd) in self.list.commands().iter().enumerate() {
            if cmd.count == 0 || !self.base.bind_texture(cmd.texture) {
                continue;
            }
            let binding = UniformBinding {
                buffer_generation: *generation,
                offset: (i as u64 * stride) as u32,
            };
            self.base.bind_uniform(binding, group, false);
            self.base.draw_indexed(cmd.index_range());
        }
    }
}

impl RendererBackend for BatchedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Batched
    }

    fn setup(&mut self, ctx: &RenderCtx<'_>) -> anyhow::Result<()> {
        self.base.setup(ctx, BackendKind::Batched)
    }

    fn begin_frame(&mut self, ctx: &RenderCtx<'_>, target: &wgpu::TextureView) {
        self.base.begin_pass(ctx, target);
        self.list.reset();
    }

    fn uniform(&mut self, block: &UniformBlock) {
        self.base.uniform = *block;
    }

    fn texture(&mut self, handle: Handle) {
        self.base.texture = handle;
    }

    fn draw(&mut self, _ctx: &RenderCtx<'_>, vertices: &[Vertex], indices: &[u32]) {
        if !self.base.in_frame() {
            log::debug!("draw outside begin_frame/end_frame ignored");
            return;
        }
        self.list.submit(&self.base.uniform, self.base.texture, vertices, indices);
    }

    fn end_frame(&mut self, ctx: &RenderCtx<'_>) -> FrameStats {
        if self.base.in_frame() && self.base.is_ready() && !self.list.is_empty() {
            self.flush(ctx);
        }
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
        self.list.reset();
        self.vertices.release();
        self.indices.release();
        self.uniforms.release();
        self.uniform_group = None;
        log::debug!("batched backend released");
    }

    fn stats(&self) -> FrameStats {
        self.base.stats()
    }
}
