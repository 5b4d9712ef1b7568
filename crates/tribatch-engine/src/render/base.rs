use std::ops::Range;

use anyhow::{Context, Result};

use crate::handle::Handle;
use crate::scene::{uniform_stride, UniformBlock};
use crate::state::{BindingCache, UniformBinding};
use crate::texture::{validate_rgba, DestroyPolicy, GpuTexture, TextureRegistry};

use super::frame::FramePass;
use super::{BackendConfig, BackendKind, FrameStats, QuadPipeline, RenderCtx};

/// 2x2 texture bound until the caller selects another one: red, green / blue, yellow.
const FALLBACK_TEXELS: [u8; 16] = [
    255, 0, 0, 255, 0, 255, 0, 255, //
    0, 0, 255, 255, 255, 255, 0, 255,
];

/// Bind group slots used by the quad pipeline.
const UNIFORM_GROUP: u32 = 0;
const TEXTURE_GROUP: u32 = 1;

/// State shared by every backend variant, composed into each of them.
///
/// Owns the pipeline, the texture registry and the binding cache, and funnels
/// every render pass call through the cache so binding counts stay accurate.
pub(crate) struct BackendBase {
    pub(crate) config: BackendConfig,
    pub(crate) pipeline: Option<QuadPipeline>,
    pub(crate) textures: TextureRegistry<GpuTexture>,
    bindings: BindingCache,
    pass: Option<FramePass>,

    /// State set by `uniform()` / `texture()`.
    pub(crate) uniform: UniformBlock,
    pub(crate) texture: Handle,
    fallback: Handle,

    frame: FrameStats,
    last: FrameStats,
}

impl BackendBase {
    pub(crate) fn new(config: BackendConfig, policy: DestroyPolicy) -> Self {
        let textures = TextureRegistry::new(config.texture_capacity, policy);
        Self {
            config,
            pipeline: None,
            textures,
            bindings: BindingCache::new(),
            pass: None,
            uniform: UniformBlock::default(),
            texture: Handle::INVALID,
            fallback: Handle::INVALID,
            frame: FrameStats::default(),
            last: FrameStats::default(),
        }
    }

    pub(crate) fn setup(&mut self, ctx: &RenderCtx<'_>, kind: BackendKind) -> Result<()> {
        if self.pipeline.is_some() {
            log::debug!("{kind} backend set up twice; releasing previous resources");
            self.cleanup();
        }

        let pipeline = QuadPipeline::new(ctx, self.config.filter, &self.config.shader)
            .with_context(|| format!("{kind} backend setup failed"))?;
        self.pipeline = Some(pipeline);

        self.fallback = self.create_texture(ctx, 2, 2, &FALLBACK_TEXELS);
        anyhow::ensure!(
            self.fallback.is_valid(),
            "{kind} backend: no texture handle left for the fallback texture"
        );
        self.texture = self.fallback;
        self.uniform = UniformBlock::default();

        log::info!(
            "{kind} backend ready: {} texture slots, {:?} filtering, uniform stride {}",
            self.textures.capacity(),
            self.config.filter,
            self.uniform_stride(ctx),
        );
        Ok(())
    }

    #[inline]
    pub(crate) fn is_ready(&self) -> bool {
        self.pipeline.is_some()
    }

    #[inline]
    pub(crate) fn in_frame(&self) -> bool {
        self.pass.is_some()
    }

    pub(crate) fn uniform_stride(&self, ctx: &RenderCtx<'_>) -> u64 {
        uniform_stride(ctx.uniform_alignment())
    }

    /// Opens the frame's render pass and binds the pipeline.
    pub(crate) fn begin_pass(&mut self, ctx: &RenderCtx<'_>, target: &wgpu::TextureView) {
        if self.pass.take().is_some() {
            log::warn!("begin_frame called twice; the open frame is discarded");
        }

        self.frame = FrameStats::default();
        self.bindings.invalidate_all();
        self.bindings.take_bind_calls();

        let mut pass = FramePass::begin(ctx, target, self.config.clear_color);
        if let (Some(pipeline), Some(rpass)) = (self.pipeline.as_ref(), pass.pass()) {
            self.bindings
                .bind_pipeline(pipeline.id(), |_| rpass.set_pipeline(&pipeline.pipeline));
        }
        self.pass = Some(pass);
    }

    /// Binds `handle` on texture unit 0.
    ///
    /// Returns `false` (and binds nothing) when the handle does not resolve to a
    /// live texture; the caller must skip the draw.
    pub(crate) fn bind_texture(&mut self, handle: Handle) -> bool {
        let Some(texture) = self.textures.get(handle) else {
            log::debug!("draw skipped: texture {handle:?} is not live");
            return false;
        };
        let Some(rpass) = self.pass.as_mut().and_then(FramePass::pass) else {
            return false;
        };

        self.bindings.bind_texture(0, handle, |_| {
            rpass.set_bind_group(TEXTURE_GROUP, &texture.bind_group, &[]);
        });
        true
    }

    /// Binds `group` at the dynamic offset described by `binding`.
    ///
    /// `force` bypasses the cache.
    pub(crate) fn bind_uniform(
        &mut self,
        binding: UniformBinding,
        group: &wgpu::BindGroup,
        force: bool,
    ) {
        let Some(rpass) = self.pass.as_mut().and_then(FramePass::pass) else { return };
        self.bindings.bind_uniform(binding, force, |b| {
            rpass.set_bind_group(UNIFORM_GROUP, group, &[b.offset]);
        });
    }

    /// Binds vertex and index buffer ranges. Not cached.
    pub(crate) fn bind_geometry(
        &mut self,
        vertices: wgpu::BufferSlice<'_>,
        indices: wgpu::BufferSlice<'_>,
    ) {
        let Some(rpass) = self.pass.as_mut().and_then(FramePass::pass) else { return };
        rpass.set_vertex_buffer(0, vertices);
        rpass.set_index_buffer(indices, wgpu::IndexFormat::Uint32);
        self.frame.bind_calls += 2;
    }

    pub(crate) fn draw_indexed(&mut self, indices: Range<u32>) {
        let Some(rpass) = self.pass.as_mut().and_then(FramePass::pass) else { return };
        rpass.draw_indexed(indices, 0, 0..1);
        self.frame.draw_calls += 1;
    }

    pub(crate) fn record_upload(&mut self, bytes: usize) {
        self.frame.uploads += 1;
        self.frame.upload_bytes += bytes as u64;
    }

    /// Ends the pass, submits it and commits deferred texture destruction.
    ///
    /// Textures are released after submission: every command referencing them
    /// is already in the queue, which keeps the resources alive until done.
    pub(crate) fn finish(&mut self, ctx: &RenderCtx<'_>) -> FrameStats {
        match self.pass.take() {
            Some(pass) => {
                if let Some(commands) = pass.finish() {
                    ctx.queue.submit(std::iter::once(commands));
                }
            }
            None => log::warn!("end_frame called without begin_frame"),
        }

        self.frame.textures_released = self.textures.commit_destroyed() as u32;
        self.frame.bind_calls += self.bindings.take_bind_calls();
        self.last = self.frame;
        self.last
    }

    pub(crate) fn create_texture(
        &mut self,
        ctx: &RenderCtx<'_>,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Handle {
        if let Err(reason) = validate_rgba(width, height, pixels) {
            log::warn!("create_texture rejected: {reason}");
            return Handle::INVALID;
        }
        let max = ctx.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            log::warn!("create_texture rejected: {width}x{height} exceeds device limit {max}");
            return Handle::INVALID;
        }
        let Some(pipeline) = self.pipeline.as_ref() else {
            log::warn!("create_texture called before setup");
            return Handle::INVALID;
        };

        let handle = self.textures.create(|| {
            GpuTexture::upload(
                ctx.device,
                ctx.queue,
                &pipeline.texture_layout,
                &pipeline.sampler,
                width,
                height,
                pixels,
            )
        });
        if handle.is_valid() {
            self.record_upload(pixels.len());
        }
        handle
    }

    pub(crate) fn destroy_texture(&mut self, handle: Handle) {
        if handle == self.fallback {
            log::debug!("fallback texture is owned by the backend; destroy ignored");
            return;
        }
        if self.textures.destroy(handle) {
            self.bindings.forget_texture(handle);
        }
    }

    pub(crate) fn cleanup(&mut self) {
        self.pass = None;
        self.textures.clear();
        self.pipeline = None;
        self.bindings.invalidate_all();
        self.fallback = Handle::INVALID;
        self.texture = Handle::INVALID;
    }

    #[inline]
    pub(crate) fn stats(&self) -> FrameStats {
        self.last
    }
}
