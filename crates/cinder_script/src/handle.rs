use std::fmt;

/// Handle to one script instance owned by a [`ScriptScheduler`](crate::ScriptScheduler).
///
/// Generational like [`Entity`](cinder_core::Entity): a handle to a destroyed or
/// swapped-out instance never resolves to the slot's next occupant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScriptHandle {
    index: u32,
    generation: u32,
}

impl ScriptHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the owning scheduler.
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ScriptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}
