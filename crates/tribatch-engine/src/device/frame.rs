/// One acquired swapchain image.
///
/// Backends record into `view`; [`Gpu::present`](super::Gpu::present) hands the
/// image back once the frame's commands were submitted. Holding the surface
/// texture blocks acquisition of the next frame.
pub struct SurfaceFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}
