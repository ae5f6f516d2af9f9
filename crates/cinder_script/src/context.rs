use crate::attributes::{AttributeValue, Attributes};
use crate::error::AttributeError;
use crate::handle::ScriptHandle;
use crate::scheduler::ScriptScheduler;
use std::ops::{Deref, DerefMut};

/// What a running callback sees: its own handle plus mutable access to the scheduler
/// that owns it.
///
/// Everything a script does to its siblings (`create`, `destroy`, `move_script`, `swap`,
/// `get`) goes through the scheduler via `Deref`. Structural changes made here are
/// reentrant: removals are deferred until the outermost traversal returns.
pub struct ScriptContext<'a> {
    scheduler: &'a mut ScriptScheduler,
    handle: ScriptHandle,
}

impl<'a> ScriptContext<'a> {
    pub(crate) fn new(scheduler: &'a mut ScriptScheduler, handle: ScriptHandle) -> Self {
        Self { scheduler, handle }
    }

    /// Handle of the script whose callback is running.
    pub fn handle(&self) -> ScriptHandle {
        self.handle
    }

    pub fn name(&self) -> Option<&str> {
        self.scheduler.instance_name(self.handle)
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        self.scheduler.attributes(self.handle)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes().and_then(|attributes| attributes.get(name))
    }

    pub fn set_attribute(
        &mut self,
        name: &str,
        value: AttributeValue,
    ) -> Result<AttributeValue, AttributeError> {
        self.scheduler.set_attribute(self.handle, name, value)
    }

    /// Toggle the running script's own enabled flag.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.scheduler.set_instance_enabled(self.handle, enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.scheduler.is_instance_enabled(self.handle)
    }

    pub fn scripts(&mut self) -> &mut ScriptScheduler {
        self.scheduler
    }
}

impl Deref for ScriptContext<'_> {
    type Target = ScriptScheduler;

    fn deref(&self) -> &Self::Target {
        self.scheduler
    }
}

impl DerefMut for ScriptContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.scheduler
    }
}
