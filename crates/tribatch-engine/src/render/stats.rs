use std::time::Duration;

/// Counters for one completed frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Indexed draws issued to the render pass.
    pub draw_calls: u32,
    /// Binding calls that reached the render pass (pipeline, bind groups, buffers).
    pub bind_calls: u32,
    /// Host-to-GPU transfers (buffer writes, buffer creation with contents, texture writes).
    pub uploads: u32,
    pub upload_bytes: u64,
    /// Textures whose deferred destruction completed at the end of the frame.
    pub textures_released: u32,
}

/// Per-frame timing handed to a profiling overlay or log.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ProfileSample {
    pub cpu_ms: f32,
    /// GPU timer queries are not wired up; always `None`.
    pub gpu_ms: Option<f32>,
    pub draw_count: u32,
    pub draws_per_second: f32,
}

impl ProfileSample {
    /// Builds a sample from the CPU time spent recording a frame.
    pub fn from_frame(cpu: Duration, stats: &FrameStats) -> Self {
        let secs = cpu.as_secs_f32();
        let draws_per_second = if secs > 0.0 {
            stats.draw_calls as f32 / secs
        } else {
            0.0
        };

        Self {
            cpu_ms: secs * 1000.0,
            gpu_ms: None,
            draw_count: stats.draw_calls,
            draws_per_second,
        }
    }
}
