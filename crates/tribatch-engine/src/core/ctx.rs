use winit::window::Window;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::RenderCtx;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Context for work outside a frame (texture creation, setup).
    pub fn render_ctx(&self) -> RenderCtx<'_> {
        self.gpu.render_ctx()
    }

    /// Acquires the surface, calls `draw` with the render context and the
    /// surface view, then presents.
    ///
    /// `draw` must submit everything it recorded before returning; backends do
    /// this in `end_frame`. Lost or outdated surfaces skip the frame.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &wgpu::TextureView),
    {
        let frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("surface frame unavailable: {err}");
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    _ => AppControl::Continue,
                };
            }
        };

        {
            let rctx = self.gpu.render_ctx();
            draw(&rctx, &frame.view);
        }

        self.window.pre_present_notify();
        self.gpu.present(frame);
        AppControl::Continue
    }
}
