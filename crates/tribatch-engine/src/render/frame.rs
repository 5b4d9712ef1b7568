use crate::coords::ColorRgba;

use super::RenderCtx;

/// Encoder plus one render pass kept open from `begin_frame` to `end_frame`.
///
/// The pass is detached from the encoder's borrow (`forget_lifetime`) so it can
/// live inside a backend between calls. It must end before the encoder finishes;
/// field order makes drop order agree.
pub(crate) struct FramePass {
    pass: Option<wgpu::RenderPass<'static>>,
    encoder: Option<wgpu::CommandEncoder>,
}

impl FramePass {
    /// Opens a pass on `target` that clears it to `clear`.
    pub(crate) fn begin(ctx: &RenderCtx<'_>, target: &wgpu::TextureView, clear: ColorRgba) -> Self {
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tribatch frame encoder"),
            });

        let pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tribatch frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        Self {
            pass: Some(pass),
            encoder: Some(encoder),
        }
    }

    #[inline]
    pub(crate) fn pass(&mut self) -> Option<&mut wgpu::RenderPass<'static>> {
        self.pass.as_mut()
    }

    /// Ends the pass and returns the recorded command buffer.
    pub(crate) fn finish(mut self) -> Option<wgpu::CommandBuffer> {
        drop(self.pass.take());
        self.encoder.take().map(wgpu::CommandEncoder::finish)
    }
}
