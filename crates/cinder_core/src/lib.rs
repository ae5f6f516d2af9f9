//! Cinder Core
//!
//! Primitives shared between the script scheduler and the framework that hosts it:
//! - Generational entity handles
//! - Fixed-rate frame clock

pub mod entity;
pub mod time;

pub use entity::{Entity, EntityAllocator};
pub use time::FrameClock;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
