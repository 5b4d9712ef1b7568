//! Frame timing.
//!
//! - one `FrameClock` per render loop; `tick()` once per presented frame
//! - `IntervalTimer` to throttle periodic work such as profile logging

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime, IntervalTimer};
