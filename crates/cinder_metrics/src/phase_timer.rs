//! Wall-clock timing of named lifecycle phases

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy)]
struct PhaseSample {
    total: Duration,
    last: Duration,
    samples: u64,
}

#[derive(Debug, Default)]
pub struct PhaseTimer {
    phases: HashMap<&'static str, PhaseSample>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, charging its duration to `phase`.
    pub fn time<F, R>(&mut self, phase: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        let sample = self.phases.entry(phase).or_default();
        sample.total += elapsed;
        sample.last = elapsed;
        sample.samples += 1;
        result
    }

    pub fn total(&self, phase: &str) -> Duration {
        self.phases.get(phase).map(|s| s.total).unwrap_or(Duration::ZERO)
    }

    /// Duration of the most recent run of `phase`.
    pub fn last(&self, phase: &str) -> Duration {
        self.phases.get(phase).map(|s| s.last).unwrap_or(Duration::ZERO)
    }

    pub fn samples(&self, phase: &str) -> u64 {
        self.phases.get(phase).map(|s| s.samples).unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.phases.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.phases.iter().map(|(name, sample)| (*name, sample.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_per_phase() {
        let mut timer = PhaseTimer::new();
        timer.time("update", || std::thread::sleep(Duration::from_millis(1)));
        timer.time("update", || ());
        timer.time("post_update", || ());

        assert_eq!(timer.samples("update"), 2);
        assert_eq!(timer.samples("post_update"), 1);
        assert!(timer.total("update") >= Duration::from_millis(1));
        assert!(timer.last("update") <= timer.total("update"));

        timer.reset();
        assert_eq!(timer.samples("update"), 0);
    }
}
