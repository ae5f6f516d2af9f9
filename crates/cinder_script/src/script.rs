//! Script behaviour trait and script type descriptors.

use crate::attributes::{AttributeDef, AttributeSchema};
use crate::context::ScriptContext;
use crate::error::AttributeError;
use bitflags::bitflags;
use std::any::Any;
use std::fmt;

/// Result returned by every fallible script callback.
pub type ScriptResult = anyhow::Result<()>;

bitflags! {
    /// Callbacks a script type implements. Declared once per type; the scheduler never
    /// probes an instance for a callback.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        const INITIALIZE = 1 << 0;
        const POST_INITIALIZE = 1 << 1;
        const UPDATE = 1 << 2;
        const POST_UPDATE = 1 << 3;
        const SWAP = 1 << 4;
        const DESTROY = 1 << 5;
    }
}

/// Lifecycle method names, reported alongside callback errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptMethod {
    Initialize,
    PostInitialize,
    Update,
    PostUpdate,
    Swap,
    Destroy,
}

impl ScriptMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ScriptMethod::Initialize => "initialize",
            ScriptMethod::PostInitialize => "post_initialize",
            ScriptMethod::Update => "update",
            ScriptMethod::PostUpdate => "post_update",
            ScriptMethod::Swap => "swap",
            ScriptMethod::Destroy => "destroy",
        }
    }

    /// Capability bit gating this method.
    pub fn capability(self) -> Capabilities {
        match self {
            ScriptMethod::Initialize => Capabilities::INITIALIZE,
            ScriptMethod::PostInitialize => Capabilities::POST_INITIALIZE,
            ScriptMethod::Update => Capabilities::UPDATE,
            ScriptMethod::PostUpdate => Capabilities::POST_UPDATE,
            ScriptMethod::Swap => Capabilities::SWAP,
            ScriptMethod::Destroy => Capabilities::DESTROY,
        }
    }
}

impl fmt::Display for ScriptMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downcasting support for `dyn Script`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A user-authored behaviour attached to an entity.
///
/// Only callbacks whose bit is set in the type's [`Capabilities`] are ever invoked.
/// A callback returning `Err` disables the instance and raises an `error` notification;
/// sibling scripts keep running.
///
/// While a callback runs, the instance is checked out of its scheduler: the
/// [`ScriptContext`] can reach every sibling but `get::<T>` on the running script
/// returns `None`.
#[allow(unused_variables)]
pub trait Script: AsAny {
    fn initialize(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        Ok(())
    }

    /// Runs after every script of the entity (or of the subtree being enabled) has
    /// initialized.
    fn post_initialize(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        Ok(())
    }

    fn update(&mut self, ctx: &mut ScriptContext<'_>, dt: f32) -> ScriptResult {
        Ok(())
    }

    fn post_update(&mut self, ctx: &mut ScriptContext<'_>, dt: f32) -> ScriptResult {
        Ok(())
    }

    /// Hot reload: migrate transient state out of the instance being replaced.
    fn swap(&mut self, ctx: &mut ScriptContext<'_>, old: &mut dyn Script) -> ScriptResult {
        Ok(())
    }

    /// Called exactly once, after the instance stopped receiving updates.
    fn destroy(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        Ok(())
    }

    /// Effective enabled state changed (own flag, component or entity).
    fn on_state(&mut self, enabled: bool) {}

    /// A callback of this instance failed. Return `true` to mark the error handled,
    /// which suppresses the scheduler's unhandled-error warning.
    fn on_error(&mut self, method: ScriptMethod, error: &anyhow::Error) -> bool {
        false
    }
}

type ScriptFactory = Box<dyn Fn() -> Box<dyn Script>>;

/// Everything the scheduler needs to instantiate a script by name.
pub struct ScriptType {
    name: String,
    capabilities: Capabilities,
    attributes: AttributeSchema,
    factory: ScriptFactory,
}

impl ScriptType {
    pub fn new<S, F>(name: impl Into<String>, factory: F) -> Self
    where
        S: Script,
        F: Fn() -> S + 'static,
    {
        Self {
            name: name.into(),
            capabilities: Capabilities::empty(),
            attributes: AttributeSchema::new(),
            factory: Box::new(move || Box::new(factory()) as Box<dyn Script>),
        }
    }

    /// Replace the declared capability set.
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Declare one attribute.
    pub fn attribute(mut self, def: AttributeDef) -> Result<Self, AttributeError> {
        self.attributes.add(def)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn capability_set(&self) -> Capabilities {
        self.capabilities
    }

    pub fn attributes(&self) -> &AttributeSchema {
        &self.attributes
    }

    pub(crate) fn instantiate(&self) -> Box<dyn Script> {
        (self.factory)()
    }
}

impl fmt::Debug for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptType")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("attributes", &self.attributes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Marker(u32);

    impl Script for Marker {}

    #[test]
    fn instantiated_scripts_downcast_to_their_type() {
        let ty = ScriptType::new("marker", || Marker(7))
            .capabilities(Capabilities::UPDATE | Capabilities::SWAP);
        assert!(ty.has(Capabilities::UPDATE));
        assert!(!ty.has(Capabilities::POST_UPDATE));

        let script = ty.instantiate();
        let marker = script.as_ref().as_any().downcast_ref::<Marker>();
        assert_eq!(marker.map(|m| m.0), Some(7));
    }

    #[test]
    fn method_maps_to_capability() {
        assert_eq!(ScriptMethod::PostUpdate.capability(), Capabilities::POST_UPDATE);
        assert_eq!(ScriptMethod::PostInitialize.to_string(), "post_initialize");
    }
}
