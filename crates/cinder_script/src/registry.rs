use crate::attributes::RawAttributes;
use crate::handle::ScriptHandle;
use std::collections::HashMap;

/// Subscription to hot reloads of the script's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapHook {
    /// Type revision the live instance was built from.
    pub revision: u32,
}

/// A `create` for a type that was not registered yet.
#[derive(Debug, Clone, PartialEq)]
pub struct AwaitingScript {
    /// Position in the instance list at the time of the request.
    pub index: usize,
    pub enabled: bool,
    pub attributes: Option<RawAttributes>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexEntry {
    Live {
        handle: ScriptHandle,
        swap_hook: SwapHook,
    },
    Awaiting(AwaitingScript),
}

/// Per-scheduler lookup from script name to its live instance or awaiting request.
///
/// Each name maps to at most one entry, and each live handle appears under exactly one
/// name.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    entries: HashMap<String, IndexEntry>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_live(&mut self, name: impl Into<String>, handle: ScriptHandle, revision: u32) {
        self.entries.insert(
            name.into(),
            IndexEntry::Live {
                handle,
                swap_hook: SwapHook { revision },
            },
        );
    }

    pub fn insert_awaiting(&mut self, name: impl Into<String>, awaiting: AwaitingScript) {
        self.entries.insert(name.into(), IndexEntry::Awaiting(awaiting));
    }

    /// Point an existing live entry at a replacement instance and refresh its hook.
    pub fn rebind(&mut self, name: &str, handle: ScriptHandle, revision: u32) -> bool {
        match self.entries.get_mut(name) {
            Some(IndexEntry::Live {
                handle: current,
                swap_hook,
            }) => {
                *current = handle;
                swap_hook.revision = revision;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<IndexEntry> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.get(name)
    }

    /// Handle of the live instance registered under `name`.
    pub fn live(&self, name: &str) -> Option<ScriptHandle> {
        match self.entries.get(name) {
            Some(IndexEntry::Live { handle, .. }) => Some(*handle),
            _ => None,
        }
    }

    pub fn swap_hook(&self, name: &str) -> Option<SwapHook> {
        match self.entries.get(name) {
            Some(IndexEntry::Live { swap_hook, .. }) => Some(*swap_hook),
            _ => None,
        }
    }

    pub fn awaiting(&self, name: &str) -> Option<&AwaitingScript> {
        match self.entries.get(name) {
            Some(IndexEntry::Awaiting(awaiting)) => Some(awaiting),
            _ => None,
        }
    }

    /// Awaiting requests ordered by their recorded index.
    pub fn awaiting_entries(&self) -> Vec<(&str, &AwaitingScript)> {
        let mut awaiting: Vec<(&str, &AwaitingScript)> = self
            .entries
            .iter()
            .filter_map(|(name, entry)| match entry {
                IndexEntry::Awaiting(awaiting) => Some((name.as_str(), awaiting)),
                IndexEntry::Live { .. } => None,
            })
            .collect();
        awaiting.sort_by(|a, b| a.1.index.cmp(&b.1.index).then_with(|| a.0.cmp(b.0)));
        awaiting
    }

    pub fn live_entries(&self) -> impl Iterator<Item = (&str, ScriptHandle)> {
        self.entries.iter().filter_map(|(name, entry)| match entry {
            IndexEntry::Live { handle, .. } => Some((name.as_str(), *handle)),
            IndexEntry::Awaiting(_) => None,
        })
    }

    pub fn clear_awaiting(&mut self) {
        self.entries
            .retain(|_, entry| matches!(entry, IndexEntry::Live { .. }));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn awaiting(index: usize) -> AwaitingScript {
        AwaitingScript {
            index,
            enabled: true,
            attributes: None,
        }
    }

    #[test]
    fn live_lookup_ignores_awaiting_entries() {
        let mut registry = InstanceRegistry::new();
        let handle = ScriptHandle::new(0, 0);
        registry.insert_live("mover", handle, 2);
        registry.insert_awaiting("later", awaiting(1));

        assert_eq!(registry.live("mover"), Some(handle));
        assert_eq!(registry.swap_hook("mover"), Some(SwapHook { revision: 2 }));
        assert_eq!(registry.live("later"), None);
        assert_eq!(registry.awaiting("later").map(|a| a.index), Some(1));
        assert!(!registry.rebind("later", handle, 0), "awaiting entries cannot be rebound");
    }

    #[test]
    fn rebind_and_clear_awaiting() {
        let mut registry = InstanceRegistry::new();
        registry.insert_live("mover", ScriptHandle::new(0, 0), 0);
        registry.insert_awaiting("b", awaiting(3));
        registry.insert_awaiting("a", awaiting(1));

        let names: Vec<&str> = registry.awaiting_entries().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["a", "b"]);

        let replacement = ScriptHandle::new(1, 0);
        assert!(registry.rebind("mover", replacement, 1));
        assert_eq!(registry.live("mover"), Some(replacement));

        registry.clear_awaiting();
        assert_eq!(registry.len(), 1);
        assert!(registry.remove("mover").is_some());
        assert!(registry.is_empty());
    }
}
