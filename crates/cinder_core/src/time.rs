//! Fixed-rate frame clock
//!
//! Hosts drive `update`/`post_update` once per frame with the delta produced here.

use std::time::Duration;

/// Default frame rate (60 Hz = 16.666ms per frame)
pub const DEFAULT_TICK_RATE_HZ: u32 = 60;

/// Frame counter with a fixed delta per frame.
pub struct FrameClock {
    tick_rate_hz: u32,
    frame_count: u64,
    elapsed: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_rate(DEFAULT_TICK_RATE_HZ)
    }

    /// A rate of zero is clamped to 1 Hz.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz: tick_rate_hz.max(1),
            frame_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64)
    }

    /// Advance one frame and return its delta in seconds.
    pub fn advance(&mut self) -> f32 {
        let step = self.frame_duration();
        self.frame_count += 1;
        self.elapsed += step;
        step.as_secs_f32()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
