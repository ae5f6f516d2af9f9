//! Named counters for lifecycle passes

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct CallCounter {
    counters: HashMap<&'static str, u64>,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: &'static str, value: u64) {
        *self.counters.entry(name).or_insert(0) += value;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn reset_all(&mut self) {
        self.counters.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.counters.iter().map(|(name, count)| (*name, *count))
    }
}
