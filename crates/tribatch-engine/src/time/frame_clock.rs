use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time since the previous tick in seconds, clamped.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped to avoid pathological values when the application is paused
/// by the debugger, minimized, or stalls.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the baseline, e.g. after the surface was reconfigured.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Fires at most once per `period`.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period: Duration,
    next: Option<Instant>,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    /// Returns `true` when `period` has passed since the last time it returned `true`.
    ///
    /// The first call only arms the timer.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.next {
            None => {
                self.next = Some(now + self.period);
                false
            }
            Some(next) if now >= next => {
                self.next = Some(now + self.period);
                true
            }
            Some(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_is_clamped() {
        let mut clock = FrameClock::with_clamps(Duration::from_millis(1), Duration::from_millis(50));
        let start = clock.last;

        let ft = clock.tick_at(start);
        assert!((ft.dt - 0.001).abs() < 1e-6);

        let ft = clock.tick_at(start + Duration::from_secs(3));
        assert!((ft.dt - 0.05).abs() < 1e-6);
    }

    #[test]
    fn frame_index_counts_ticks() {
        let mut clock = FrameClock::new();
        let base = clock.last;
        for i in 0..3u64 {
            let ft = clock.tick_at(base + Duration::from_millis(16 * (i + 1)));
            assert_eq!(ft.frame_index, i);
        }
    }

    #[test]
    fn interval_fires_once_per_period() {
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        let t0 = Instant::now();

        assert!(!timer.ready(t0));
        assert!(!timer.ready(t0 + Duration::from_millis(500)));
        assert!(timer.ready(t0 + Duration::from_millis(1000)));
        assert!(!timer.ready(t0 + Duration::from_millis(1500)));
        assert!(timer.ready(t0 + Duration::from_millis(2100)));
    }
}
