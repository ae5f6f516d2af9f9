use crate::script::ScriptType;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Outcome of registering a script type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First registration under this name.
    Added,
    /// The name was already registered; live instances holding a swap hook of an
    /// older revision should be hot-swapped.
    Replaced { revision: u32 },
}

struct RegisteredType {
    script_type: Rc<ScriptType>,
    revision: u32,
}

/// Name → script type table shared by every scheduler of an application.
///
/// Cloning the registry clones the handle, not the table. Borrows of the table are
/// never held across a script callback.
#[derive(Clone, Default)]
pub struct ScriptTypeRegistry {
    types: Rc<RefCell<HashMap<String, RegisteredType>>>,
}

impl ScriptTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, script_type: ScriptType) -> Registration {
        let name = script_type.name().to_string();
        let script_type = Rc::new(script_type);
        let mut types = self.types.borrow_mut();
        match types.get_mut(&name) {
            Some(existing) => {
                existing.revision += 1;
                existing.script_type = script_type;
                tracing::debug!(script = %name, revision = existing.revision, "script type replaced");
                Registration::Replaced {
                    revision: existing.revision,
                }
            }
            None => {
                types.insert(
                    name.clone(),
                    RegisteredType {
                        script_type,
                        revision: 0,
                    },
                );
                tracing::debug!(script = %name, "script type registered");
                Registration::Added
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Rc<ScriptType>> {
        self.types
            .borrow()
            .get(name)
            .map(|registered| Rc::clone(&registered.script_type))
    }

    pub fn revision(&self, name: &str) -> Option<u32> {
        self.types.borrow().get(name).map(|registered| registered.revision)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.borrow().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> bool {
        self.types.borrow_mut().remove(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.borrow().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;

    struct Noop;
    impl Script for Noop {}

    #[test]
    fn re_registration_bumps_revision() {
        let registry = ScriptTypeRegistry::new();
        assert_eq!(registry.register(ScriptType::new("noop", || Noop)), Registration::Added);
        assert_eq!(registry.revision("noop"), Some(0));

        let shared = registry.clone();
        assert_eq!(
            shared.register(ScriptType::new("noop", || Noop)),
            Registration::Replaced { revision: 1 }
        );
        assert_eq!(registry.revision("noop"), Some(1), "clones share one table");
        assert_eq!(registry.names(), vec!["noop".to_string()]);
        assert!(registry.remove("noop"));
        assert!(registry.get("noop").is_none());
    }
}
