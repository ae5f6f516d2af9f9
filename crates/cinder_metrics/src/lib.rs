//! Cinder Metrics - lifecycle phase instrumentation
//!
//! Zero-cost wrappers for timing script lifecycle phases and counting passes.
//! Everything vanishes when the `metrics` feature is off.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use cinder_metrics::{CallCounter, PhaseTimer};
//!
//! let mut timer = PhaseTimer::new();
//! timer.time("update", || system.update(dt));
//! println!("update: {:?}", timer.total("update"));
//! ```

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod phase_timer;

#[cfg(feature = "metrics")]
pub use counter::CallCounter;
#[cfg(feature = "metrics")]
pub use phase_timer::PhaseTimer;

/// Whether instrumentation is compiled in.
pub const ENABLED: bool = cfg!(feature = "metrics");

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct PhaseTimer;

#[cfg(not(feature = "metrics"))]
impl PhaseTimer {
    pub fn new() -> Self { Self }
    pub fn time<F, R>(&mut self, _phase: &'static str, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn total(&self, _phase: &str) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn last(&self, _phase: &str) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn samples(&self, _phase: &str) -> u64 { 0 }
    pub fn reset(&mut self) {}
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct CallCounter;

#[cfg(not(feature = "metrics"))]
impl CallCounter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &'static str, _value: u64) {}
    pub fn get(&self, _name: &str) -> u64 { 0 }
    pub fn reset_all(&mut self) {}
}

#[cfg(test)]
mod tests {
    #[test]
    fn stubs_and_real_types_share_an_api() {
        let mut timer = super::PhaseTimer::new();
        let value = timer.time("update", || 21 * 2);
        assert_eq!(value, 42);

        let mut counter = super::CallCounter::new();
        counter.increment("update", 3);
        if super::ENABLED {
            assert_eq!(counter.get("update"), 3);
            assert_eq!(timer.samples("update"), 1);
        } else {
            assert_eq!(counter.get("update"), 0);
        }
    }
}
