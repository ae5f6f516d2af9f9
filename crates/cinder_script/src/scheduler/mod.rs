//! Per-entity script scheduler.
//!
//! Instances live in a generational slot arena addressed by [`ScriptHandle`]. While a
//! callback runs, its script object is checked out of the slot and the scheduler itself
//! is lent to the callback through [`ScriptContext`]; that is how a script creates,
//! destroys, moves or swaps siblings in the middle of a pass.
//!
//! Every callback and every lifecycle pass runs inside a traversal, tracked as a depth
//! counter. Destroying an instance while the depth is non-zero only flags it and queues
//! it; the slot is released and execution order renumbered when the outermost traversal
//! ends.

mod lifecycle;
mod resolver;

pub use resolver::DuplicatedEntities;

use crate::attributes::{AttributeValue, Attributes, RawAttributes};
use crate::callback_list::OrderedCallbackList;
use crate::context::ScriptContext;
use crate::error::{AttributeError, SchedulerError};
use crate::events::{ScriptEvent, ScriptEvents};
use crate::handle::ScriptHandle;
use crate::registry::{AwaitingScript, IndexEntry, InstanceRegistry};
use crate::script::{Capabilities, Script, ScriptMethod, ScriptResult, ScriptType};
use crate::settings::SchedulerSettings;
use crate::types::ScriptTypeRegistry;
use cinder_core::Entity;
use std::fmt;
use std::rc::Rc;

/// Where an instance is in its lifecycle. Enabled/disabled is orthogonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Created,
    AttributesBound,
    Initialized,
    PostInitialized,
    Destroyed,
}

/// Snapshot of one instance's lifecycle flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceState {
    enabled: bool,
    initialized: bool,
    post_initialized: bool,
    destroyed: bool,
    attributes_bound: bool,
    execution_order: u32,
    // effective state last reported through `on_state`
    last_effective: bool,
    // destroy requested while the instance's own callback was running
    destroy_deferred: bool,
}

impl InstanceState {
    /// The instance's own flag, regardless of component or entity state.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_post_initialized(&self) -> bool {
        self.post_initialized
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn attributes_bound(&self) -> bool {
        self.attributes_bound
    }

    pub fn execution_order(&self) -> u32 {
        self.execution_order
    }

    pub fn phase(&self) -> LifecyclePhase {
        if self.destroyed {
            LifecyclePhase::Destroyed
        } else if self.post_initialized {
            LifecyclePhase::PostInitialized
        } else if self.initialized {
            LifecyclePhase::Initialized
        } else if self.attributes_bound {
            LifecyclePhase::AttributesBound
        } else {
            LifecyclePhase::Created
        }
    }

    fn effective(&self, component_active: bool) -> bool {
        self.enabled && !self.destroyed && component_active
    }
}

/// Attribute payload handed to a new instance.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeSource {
    /// Scene data, parsed against the schema on binding.
    Raw(RawAttributes),
    /// Typed values from another instance (swap, clone).
    Values(Attributes),
}

/// Options for [`ScriptScheduler::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreateArgs {
    pub enabled: bool,
    /// Position in the instance list; out-of-range values append.
    pub index: Option<usize>,
    /// Defer attribute binding and initialization to the lifecycle passes.
    pub preloading: bool,
    pub attributes: Option<AttributeSource>,
}

impl Default for CreateArgs {
    fn default() -> Self {
        Self {
            enabled: true,
            index: None,
            preloading: false,
            attributes: None,
        }
    }
}

impl CreateArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn preloading(mut self, preloading: bool) -> Self {
        self.preloading = preloading;
        self
    }

    pub fn raw_attributes(mut self, raw: RawAttributes) -> Self {
        self.attributes = Some(AttributeSource::Raw(raw));
        self
    }

    pub fn attributes(mut self, values: Attributes) -> Self {
        self.attributes = Some(AttributeSource::Values(values));
        self
    }
}

struct InstanceEntry {
    name: String,
    script_type: Rc<ScriptType>,
    // `None` while one of its callbacks is on the stack
    script: Option<Box<dyn Script>>,
    attributes: Attributes,
    pending_attributes: Option<AttributeSource>,
    state: InstanceState,
}

struct ScriptSlot {
    generation: u32,
    entry: Option<InstanceEntry>,
}

fn slot_entry(slots: &[ScriptSlot], handle: ScriptHandle) -> Option<&InstanceEntry> {
    slots
        .get(handle.index() as usize)
        .filter(|slot| slot.generation == handle.generation())
        .and_then(|slot| slot.entry.as_ref())
}

fn slot_entry_mut(slots: &mut [ScriptSlot], handle: ScriptHandle) -> Option<&mut InstanceEntry> {
    slots
        .get_mut(handle.index() as usize)
        .filter(|slot| slot.generation == handle.generation())
        .and_then(|slot| slot.entry.as_mut())
}

fn execution_order(slots: &[ScriptSlot], handle: ScriptHandle) -> u32 {
    slot_entry(slots, handle).map_or(u32::MAX, |entry| entry.state.execution_order)
}

/// Owns every script instance of one entity and runs them in execution order.
pub struct ScriptScheduler {
    slots: Vec<ScriptSlot>,
    free_slots: Vec<u32>,
    /// Instances in execution order, including destroyed ones awaiting the drain.
    instances: Vec<ScriptHandle>,
    update_list: OrderedCallbackList<ScriptHandle>,
    post_update_list: OrderedCallbackList<ScriptHandle>,
    index: InstanceRegistry,
    pending_destroy: Vec<ScriptHandle>,
    depth: u32,

    types: ScriptTypeRegistry,
    settings: SchedulerSettings,
    events: ScriptEvents,

    entity: Option<Entity>,
    enabled: bool,
    entity_enabled: bool,
    entity_being_enabled: bool,
    being_enabled: bool,
    // last computed `enabled && entity_enabled`
    active: bool,
}

impl ScriptScheduler {
    pub fn new(types: ScriptTypeRegistry, settings: SchedulerSettings) -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            instances: Vec::new(),
            update_list: OrderedCallbackList::new(),
            post_update_list: OrderedCallbackList::new(),
            index: InstanceRegistry::new(),
            pending_destroy: Vec::new(),
            depth: 0,
            types,
            settings,
            events: ScriptEvents::new(),
            entity: None,
            enabled: true,
            entity_enabled: true,
            entity_being_enabled: false,
            being_enabled: false,
            active: true,
        }
    }

    /// Bind to the owning entity. No callbacks run; the host follows up with the
    /// lifecycle passes.
    pub fn attach(&mut self, entity: Entity, entity_enabled: bool) {
        self.entity = Some(entity);
        self.entity_enabled = entity_enabled;
        self.active = self.enabled && entity_enabled;
    }

    pub fn detach(&mut self) -> Option<Entity> {
        self.entity.take()
    }

    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    pub fn types(&self) -> &ScriptTypeRegistry {
        &self.types
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn events(&self) -> &ScriptEvents {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut ScriptEvents {
        &mut self.events
    }

    pub fn registry(&self) -> &InstanceRegistry {
        &self.index
    }

    // ------------------------------------------------------------------------
    // Structural operations
    // ------------------------------------------------------------------------

    /// Create the script registered under `name`.
    ///
    /// Fails without side effects when a live instance already uses the name. An
    /// unregistered type records an awaiting entry instead and reports
    /// [`SchedulerError::AwaitingType`]; the instance is created once the type is
    /// registered.
    pub fn create(&mut self, name: &str, args: CreateArgs) -> Result<ScriptHandle, SchedulerError> {
        if self.index.live(name).is_some() {
            tracing::warn!(script = name, entity = ?self.entity, "script is already added to this entity");
            return Err(SchedulerError::DuplicateScript {
                name: name.to_string(),
            });
        }

        let Some(script_type) = self.types.get(name) else {
            let index = args.index.unwrap_or(self.instances.len());
            let attributes = match args.attributes {
                Some(AttributeSource::Raw(raw)) => Some(raw),
                Some(AttributeSource::Values(_)) => {
                    tracing::debug!(script = name, "typed attributes dropped for awaiting script");
                    None
                }
                None => None,
            };
            tracing::warn!(script = name, index, entity = ?self.entity, "script type not registered, awaiting it");
            self.index.insert_awaiting(
                name,
                AwaitingScript {
                    index,
                    enabled: args.enabled,
                    attributes,
                },
            );
            return Err(SchedulerError::AwaitingType {
                name: name.to_string(),
            });
        };

        let revision = self.types.revision(name).unwrap_or(0);
        Ok(self.create_with_type(name, script_type, revision, args))
    }

    fn create_with_type(
        &mut self,
        name: &str,
        script_type: Rc<ScriptType>,
        revision: u32,
        args: CreateArgs,
    ) -> ScriptHandle {
        let len = self.instances.len();
        let position = args.index.filter(|&index| index < len);

        let mut state = InstanceState {
            enabled: args.enabled,
            execution_order: position.unwrap_or(len) as u32,
            ..InstanceState::default()
        };
        state.last_effective = state.effective(self.active);

        let capabilities = script_type.capability_set();
        let handle = self.alloc_slot(InstanceEntry {
            name: name.to_string(),
            attributes: script_type.attributes().defaults(),
            pending_attributes: args.attributes,
            script: Some(script_type.instantiate()),
            script_type,
            state,
        });

        match position {
            None => {
                self.instances.push(handle);
                if capabilities.contains(Capabilities::UPDATE) {
                    self.update_list.append(handle);
                }
                if capabilities.contains(Capabilities::POST_UPDATE) {
                    self.post_update_list.append(handle);
                }
            }
            Some(position) => {
                self.instances.insert(position, handle);
                self.renumber(position + 1);
                let slots = &self.slots;
                if capabilities.contains(Capabilities::UPDATE) {
                    self.update_list
                        .insert(handle, |h| execution_order(slots, *h));
                }
                if capabilities.contains(Capabilities::POST_UPDATE) {
                    self.post_update_list
                        .insert(handle, |h| execution_order(slots, *h));
                }
            }
        }
        self.index.insert_live(name, handle, revision);

        if !args.preloading {
            self.bind_attributes(handle);
        }
        tracing::debug!(script = name, %handle, order = position.unwrap_or(len), "script created");
        self.events.emit(ScriptEvent::Created {
            name: name.to_string(),
            handle,
        });

        if !args.preloading {
            self.initialize_instance(handle);
            self.post_initialize_instance(handle);
        }
        handle
    }

    /// Destroy the script registered under `name`.
    ///
    /// Returns `false` when nothing is registered under the name, so a second destroy
    /// of the same script is a no-op. Cancelling an awaiting entry counts as a destroy.
    pub fn destroy(&mut self, name: &str) -> bool {
        let handle = match self.index.remove(name) {
            None => return false,
            Some(IndexEntry::Awaiting(_)) => {
                self.events.emit(ScriptEvent::Destroyed {
                    name: name.to_string(),
                    handle: None,
                });
                return true;
            }
            Some(IndexEntry::Live { handle, .. }) => handle,
        };

        let Some(entry) = slot_entry_mut(&mut self.slots, handle) else {
            return false;
        };
        entry.state.enabled = false;
        entry.state.destroyed = true;
        let has_destroy = entry.script_type.has(Capabilities::DESTROY);
        self.refresh_instance_state(handle);

        let immediate = self.depth == 0;
        if immediate {
            if let Some(position) = self.unlink(handle) {
                self.renumber(position);
            }
        } else {
            self.pending_destroy.push(handle);
        }
        tracing::debug!(script = name, %handle, deferred = !immediate, "script destroyed");

        self.events.emit(ScriptEvent::Destroyed {
            name: name.to_string(),
            handle: Some(handle),
        });
        if has_destroy {
            self.run_destroy(handle);
        }
        if immediate {
            self.release_slot(handle);
        }
        true
    }

    /// Hot-swap the live instance under `name` for a fresh instance of the currently
    /// registered type.
    ///
    /// The replacement keeps the old instance's own enabled flag, lifecycle progress,
    /// attribute values and execution order, then receives `swap(old)`.
    pub fn swap(&mut self, name: &str) -> Result<ScriptHandle, SchedulerError> {
        let unknown = || SchedulerError::UnknownScript {
            name: name.to_string(),
        };
        let old_handle = self.index.live(name).ok_or_else(unknown)?;
        let script_type = self.types.get(name).ok_or_else(unknown)?;
        if !script_type.has(Capabilities::SWAP) {
            tracing::warn!(script = name, "script type does not support swapping");
            return Err(SchedulerError::NotSwappable {
                name: name.to_string(),
            });
        }
        let old = slot_entry(&self.slots, old_handle).ok_or_else(unknown)?;
        if old.script.is_none() {
            tracing::warn!(script = name, "cannot swap a script while its callback runs");
            return Err(SchedulerError::InstanceBusy {
                name: name.to_string(),
            });
        }

        let (attributes, pending_attributes) = if old.state.attributes_bound {
            (script_type.attributes().rebind(&old.attributes), None)
        } else {
            (script_type.attributes().defaults(), old.pending_attributes.clone())
        };
        let state = InstanceState {
            destroy_deferred: false,
            ..old.state
        };
        let revision = self.types.revision(name).unwrap_or(0);

        let new_handle = self.alloc_slot(InstanceEntry {
            name: name.to_string(),
            script: Some(script_type.instantiate()),
            script_type: Rc::clone(&script_type),
            attributes,
            pending_attributes,
            state,
        });
        if let Some(position) = self.instances.iter().position(|h| *h == old_handle) {
            self.instances[position] = new_handle;
        }

        self.update_list.remove(&old_handle);
        self.post_update_list.remove(&old_handle);
        let slots = &self.slots;
        if script_type.has(Capabilities::UPDATE) {
            self.update_list
                .insert(new_handle, |h| execution_order(slots, *h));
        }
        if script_type.has(Capabilities::POST_UPDATE) {
            self.post_update_list
                .insert(new_handle, |h| execution_order(slots, *h));
        }
        self.index.rebind(name, new_handle, revision);

        let old_script = self.release_slot(old_handle).and_then(|entry| entry.script);
        if let Some(mut old_script) = old_script {
            self.invoke(new_handle, ScriptMethod::Swap, |script, ctx| {
                script.swap(ctx, old_script.as_mut())
            });
        }

        tracing::debug!(script = name, old = %old_handle, new = %new_handle, revision, "script swapped");
        self.events.emit(ScriptEvent::Swapped {
            name: name.to_string(),
            old: old_handle,
            new: new_handle,
        });
        Ok(new_handle)
    }

    /// Move the script under `name` to position `index` of the instance list.
    ///
    /// Returns `false` for an out-of-range index, an unknown name or a no-op move.
    pub fn move_script(&mut self, name: &str, index: usize) -> bool {
        let len = self.instances.len();
        if index >= len {
            tracing::warn!(script = name, index, len, "move target out of range");
            return false;
        }
        let Some(handle) = self.index.live(name) else {
            return false;
        };
        let Some(from) = self.instances.iter().position(|h| *h == handle) else {
            return false;
        };
        if from == index {
            return false;
        }

        let moved = self.instances.remove(from);
        self.instances.insert(index, moved);
        self.renumber(0);
        let slots = &self.slots;
        self.update_list.sort(|h| execution_order(slots, *h));
        self.post_update_list.sort(|h| execution_order(slots, *h));

        tracing::debug!(script = name, from, to = index, "script moved");
        self.events.emit(ScriptEvent::Moved {
            name: name.to_string(),
            handle,
            to: index,
            from,
        });
        true
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Whether a live instance is registered under `name`.
    pub fn has(&self, name: &str) -> bool {
        self.index.live(name).is_some()
    }

    pub fn is_awaiting(&self, name: &str) -> bool {
        self.index.awaiting(name).is_some()
    }

    pub fn handle(&self, name: &str) -> Option<ScriptHandle> {
        self.index.live(name)
    }

    /// The live instance under `name`, if it is a `T`. Returns `None` while the
    /// instance's own callback is running.
    pub fn get<T: Script>(&self, name: &str) -> Option<&T> {
        let handle = self.index.live(name)?;
        slot_entry(&self.slots, handle)?
            .script
            .as_deref()
            .and_then(|script| script.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: Script>(&mut self, name: &str) -> Option<&mut T> {
        let handle = self.index.live(name)?;
        slot_entry_mut(&mut self.slots, handle)?
            .script
            .as_deref_mut()
            .and_then(|script| script.as_any_mut().downcast_mut::<T>())
    }

    pub fn instance_name(&self, handle: ScriptHandle) -> Option<&str> {
        slot_entry(&self.slots, handle).map(|entry| entry.name.as_str())
    }

    pub fn instance_state(&self, handle: ScriptHandle) -> Option<InstanceState> {
        slot_entry(&self.slots, handle).map(|entry| entry.state)
    }

    pub fn attributes(&self, handle: ScriptHandle) -> Option<&Attributes> {
        slot_entry(&self.slots, handle).map(|entry| &entry.attributes)
    }

    /// Assign one attribute, validated against the instance's schema.
    pub fn set_attribute(
        &mut self,
        handle: ScriptHandle,
        name: &str,
        value: AttributeValue,
    ) -> Result<AttributeValue, AttributeError> {
        let entry = slot_entry_mut(&mut self.slots, handle).ok_or_else(|| AttributeError::Unknown {
            name: name.to_string(),
        })?;
        entry
            .attributes
            .set(entry.script_type.attributes(), name, value)
    }

    /// Set an instance's own enabled flag. The first effective enable initializes it.
    pub fn set_instance_enabled(&mut self, handle: ScriptHandle, enabled: bool) -> bool {
        let Some(entry) = slot_entry_mut(&mut self.slots, handle) else {
            return false;
        };
        entry.state.enabled = enabled;
        self.refresh_instance_state(handle);
        true
    }

    /// Effective state: own flag, not destroyed, component and entity enabled.
    pub fn is_instance_enabled(&self, handle: ScriptHandle) -> bool {
        slot_entry(&self.slots, handle).is_some_and(|entry| entry.state.effective(self.active))
    }

    /// Instance handles in execution order.
    pub fn instances(&self) -> &[ScriptHandle] {
        &self.instances
    }

    /// Names of the live instances in execution order.
    pub fn script_names(&self) -> Vec<&str> {
        self.instances
            .iter()
            .filter_map(|handle| slot_entry(&self.slots, *handle))
            .filter(|entry| !entry.state.destroyed)
            .map(|entry| entry.name.as_str())
            .collect()
    }

    pub fn update_order(&self) -> Vec<&str> {
        self.list_names(&self.update_list)
    }

    pub fn post_update_order(&self) -> Vec<&str> {
        self.list_names(&self.post_update_list)
    }

    fn list_names<'a>(&'a self, list: &'a OrderedCallbackList<ScriptHandle>) -> Vec<&'a str> {
        list.iter()
            .filter_map(|handle| self.instance_name(*handle))
            .collect()
    }

    pub fn is_traversing(&self) -> bool {
        self.depth > 0
    }

    pub fn pending_destroy_len(&self) -> usize {
        self.pending_destroy.len()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    // ------------------------------------------------------------------------
    // Instance transitions
    // ------------------------------------------------------------------------

    /// `Created -> AttributesBound`. Runs once per instance.
    fn bind_attributes(&mut self, handle: ScriptHandle) {
        let Some(entry) = slot_entry_mut(&mut self.slots, handle) else {
            return;
        };
        if entry.state.attributes_bound {
            return;
        }
        let schema = entry.script_type.attributes();
        match entry.pending_attributes.take() {
            Some(AttributeSource::Raw(raw)) => entry.attributes = schema.bind_raw(&raw),
            Some(AttributeSource::Values(values)) => entry.attributes = schema.rebind(&values),
            None => {}
        }
        entry.state.attributes_bound = true;
    }

    fn initialize_instance(&mut self, handle: ScriptHandle) {
        let active = self.active;
        let Some(entry) = slot_entry_mut(&mut self.slots, handle) else {
            return;
        };
        if entry.state.initialized || !entry.state.effective(active) {
            return;
        }
        entry.state.initialized = true;
        let run = entry.script_type.has(Capabilities::INITIALIZE);
        self.bind_attributes(handle);
        if run {
            self.invoke(handle, ScriptMethod::Initialize, |script, ctx| script.initialize(ctx));
        }
    }

    fn post_initialize_instance(&mut self, handle: ScriptHandle) {
        let active = self.active;
        let Some(entry) = slot_entry_mut(&mut self.slots, handle) else {
            return;
        };
        // initialize may have disabled the instance
        if !entry.state.initialized || entry.state.post_initialized || !entry.state.effective(active) {
            return;
        }
        entry.state.post_initialized = true;
        if entry.script_type.has(Capabilities::POST_INITIALIZE) {
            self.invoke(handle, ScriptMethod::PostInitialize, |script, ctx| {
                script.post_initialize(ctx)
            });
        }
    }

    /// Re-derive an instance's effective state after any of its inputs changed.
    fn refresh_instance_state(&mut self, handle: ScriptHandle) {
        let active = self.active;
        let Some(entry) = slot_entry_mut(&mut self.slots, handle) else {
            return;
        };
        let effective = entry.state.effective(active);
        if effective == entry.state.last_effective {
            return;
        }
        entry.state.last_effective = effective;
        if let Some(script) = entry.script.as_mut() {
            script.on_state(effective);
        }
        if !effective {
            return;
        }

        self.initialize_instance(handle);
        // post-initialize waits for the whole component while it is being enabled
        if !self.being_enabled {
            self.post_initialize_instance(handle);
        }
    }

    // ------------------------------------------------------------------------
    // Error boundary and traversal
    // ------------------------------------------------------------------------

    /// Run one callback of `handle` with the script checked out of its slot.
    ///
    /// An `Err` is contained here. If the instance is destroyed while its own callback
    /// runs, its `destroy` callback runs right after the current one returns.
    fn invoke<F>(&mut self, handle: ScriptHandle, method: ScriptMethod, call: F)
    where
        F: FnOnce(&mut dyn Script, &mut ScriptContext<'_>) -> ScriptResult,
    {
        let Some(entry) = slot_entry_mut(&mut self.slots, handle) else {
            return;
        };
        let Some(mut script) = entry.script.take() else {
            if method == ScriptMethod::Destroy {
                entry.state.destroy_deferred = true;
            }
            return;
        };

        self.begin_traversal();
        let result = {
            let mut ctx = ScriptContext::new(self, handle);
            call(script.as_mut(), &mut ctx)
        };
        let destroy_deferred = match slot_entry_mut(&mut self.slots, handle) {
            Some(entry) => {
                entry.script = Some(script);
                std::mem::take(&mut entry.state.destroy_deferred)
            }
            None => false,
        };

        if let Err(error) = result {
            self.report_error(handle, method, error);
        }
        if destroy_deferred {
            self.run_destroy(handle);
        }
        self.end_traversal();
    }

    fn run_destroy(&mut self, handle: ScriptHandle) {
        self.invoke(handle, ScriptMethod::Destroy, |script, ctx| script.destroy(ctx));
    }

    fn report_error(&mut self, handle: ScriptHandle, method: ScriptMethod, error: anyhow::Error) {
        let Some(name) = self.instance_name(handle).map(str::to_string) else {
            return;
        };
        if self.settings.disable_on_error {
            self.set_instance_enabled(handle, false);
        }
        let handled = slot_entry_mut(&mut self.slots, handle)
            .and_then(|entry| entry.script.as_mut())
            .is_some_and(|script| script.on_error(method, &error));
        if !handled && self.settings.log_unhandled_errors {
            tracing::warn!(script = %name, %method, entity = ?self.entity, "script callback failed: {error:#}");
        }
        self.events.emit(ScriptEvent::Error {
            name,
            handle,
            method,
            message: format!("{error:#}"),
        });
    }

    fn begin_traversal(&mut self) {
        self.depth += 1;
    }

    fn end_traversal(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.drain_pending();
        }
    }

    fn drain_pending(&mut self) {
        if self.pending_destroy.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_destroy);
        for handle in &pending {
            self.unlink(*handle);
            self.release_slot(*handle);
        }
        self.renumber(0);
        tracing::trace!(count = pending.len(), "deferred destroys drained");
    }

    // ------------------------------------------------------------------------
    // Arena
    // ------------------------------------------------------------------------

    fn alloc_slot(&mut self, entry: InstanceEntry) -> ScriptHandle {
        if let Some(index) = self.free_slots.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return ScriptHandle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(ScriptSlot {
            generation: 0,
            entry: Some(entry),
        });
        ScriptHandle::new(index, 0)
    }

    fn release_slot(&mut self, handle: ScriptHandle) -> Option<InstanceEntry> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(handle.index());
        Some(entry)
    }

    /// Drop `handle` from the instance list and both callback lists.
    fn unlink(&mut self, handle: ScriptHandle) -> Option<usize> {
        let position = self.instances.iter().position(|h| *h == handle)?;
        self.instances.remove(position);
        self.update_list.remove(&handle);
        self.post_update_list.remove(&handle);
        Some(position)
    }

    fn renumber(&mut self, start: usize) {
        for (order, handle) in self.instances.iter().enumerate().skip(start) {
            if let Some(entry) = slot_entry_mut(&mut self.slots, *handle) {
                entry.state.execution_order = order as u32;
            }
        }
    }
}

impl fmt::Debug for ScriptScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptScheduler")
            .field("entity", &self.entity)
            .field("scripts", &self.script_names())
            .field("enabled", &self.enabled)
            .field("entity_enabled", &self.entity_enabled)
            .field("depth", &self.depth)
            .finish()
    }
}
