//! Entity handle with generational index
//!
//! The scheduler never walks the scene graph. All it keeps of an entity is this
//! 8-byte handle, which is also the value stored in entity-reference attributes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity handle (generation-indexed for safety)
///
/// Format: [32-bit index | 32-bit generation]
/// - Index: Slot in the host's entity table
/// - Generation: Incremented when the slot is recycled (prevents use-after-free)
///
/// Example:
/// ```ignore
/// let mut entities = EntityAllocator::new();
/// let player = entities.alloc();
/// entities.free(player);
/// assert!(!entities.is_alive(player));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Serialize to 64-bit integer (scene files, raw script attributes)
    pub fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Deserialize from 64-bit integer
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Hands out entity handles and recycles freed slots with a bumped generation.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self) -> Entity {
        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            self.alive[slot] = true;
            return Entity::new(index, self.generations[slot]);
        }

        let index = self.generations.len() as u32;
        self.generations.push(0);
        self.alive.push(true);
        Entity::new(index, 0)
    }

    /// Release an entity. Returns false for stale or already freed handles.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = entity.index() as usize;
        self.alive[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(entity.index());
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index() as usize;
        self.alive.get(slot).copied().unwrap_or(false)
            && self.generations[slot] == entity.generation()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.alive.iter().filter(|alive| **alive).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_roundtrip_keeps_generation() {
        let entity = Entity::new(7, 3);
        assert_eq!(Entity::from_bits(entity.to_bits()), entity);
        assert_eq!(entity.to_bits() >> 32, 3);
    }

    #[test]
    fn recycled_slot_invalidates_stale_handle() {
        let mut entities = EntityAllocator::new();
        let first = entities.alloc();
        assert!(entities.free(first));
        assert!(!entities.free(first), "double free must be rejected");

        let second = entities.alloc();
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert!(!entities.is_alive(first));
        assert!(entities.is_alive(second));
        assert_eq!(entities.len(), 1);
    }
}
