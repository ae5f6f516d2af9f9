//! Component-level lifecycle entry points invoked by the owning framework.

use super::{AttributeSource, CreateArgs, ScriptScheduler};
use crate::callback_list::OrderedCallbackList;
use crate::events::ScriptEvent;
use crate::handle::ScriptHandle;
use crate::registry::IndexEntry;
use crate::script::ScriptMethod;
use crate::settings::LateBinding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Update,
    PostUpdate,
}

impl ScriptScheduler {
    /// The component's own enabled flag.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_entity_enabled(&self) -> bool {
        self.entity_enabled
    }

    /// Component enabled and owning entity enabled.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            self.on_enable();
        } else {
            self.on_disable();
        }
    }

    /// Mirror the owning entity's enabled flag.
    pub fn set_entity_enabled(&mut self, enabled: bool) {
        if self.entity_enabled == enabled {
            return;
        }
        self.entity_enabled = enabled;
        if enabled {
            self.on_enable();
        } else {
            self.on_disable();
        }
    }

    /// Set while the owning entity is part of a subtree being enabled. The
    /// post-initialize pass is then left to [`on_post_state_change`](Self::on_post_state_change),
    /// which the host calls once the whole subtree is enabled.
    pub fn set_entity_being_enabled(&mut self, being_enabled: bool) {
        self.entity_being_enabled = being_enabled;
    }

    pub fn on_enable(&mut self) {
        self.being_enabled = true;
        self.check_state();
        if !self.entity_being_enabled {
            self.on_post_state_change();
        }
        self.being_enabled = false;
    }

    pub fn on_disable(&mut self) {
        self.check_state();
    }

    fn check_state(&mut self) {
        let state = self.enabled && self.entity_enabled;
        if state == self.active {
            return;
        }
        self.active = state;
        tracing::trace!(entity = ?self.entity, enabled = state, "script component state changed");
        self.events.emit(if state {
            ScriptEvent::Enabled
        } else {
            ScriptEvent::Disabled
        });
        self.events.emit(ScriptEvent::StateChanged { enabled: state });

        self.traverse(|scheduler, handle| scheduler.refresh_instance_state(handle));
    }

    /// Post-initialize every initialized, enabled instance that has not been yet.
    pub fn on_post_state_change(&mut self) {
        self.traverse(|scheduler, handle| scheduler.post_initialize_instance(handle));
    }

    /// Bind attributes of every instance created while preloading.
    pub fn on_initialize_attributes(&mut self) {
        for handle in self.instances.clone() {
            self.bind_attributes(handle);
        }
    }

    pub fn on_initialize_all(&mut self) {
        self.traverse(|scheduler, handle| scheduler.initialize_instance(handle));
    }

    pub fn on_post_initialize_all(&mut self) {
        self.on_post_state_change();
    }

    pub fn on_update(&mut self, dt: f32) {
        self.run_pass(Pass::Update, dt);
    }

    pub fn on_post_update(&mut self, dt: f32) {
        self.run_pass(Pass::PostUpdate, dt);
    }

    /// Tear down before the component is discarded: every instance goes through
    /// [`destroy`](Self::destroy) inside one traversal, so each teardown still sees
    /// its siblings in place.
    pub fn on_before_remove(&mut self) {
        self.events.emit(ScriptEvent::Removed);
        let names: Vec<String> = self
            .instances
            .iter()
            .filter_map(|handle| super::slot_entry(&self.slots, *handle))
            .filter(|entry| !entry.state.destroyed)
            .map(|entry| entry.name.clone())
            .collect();

        self.begin_traversal();
        for name in &names {
            self.destroy(name);
        }
        self.end_traversal();
        self.index.clear_awaiting();
    }

    /// React to `name` being (re)registered in the type registry.
    ///
    /// An awaiting entry is created now; a live instance built from an older revision
    /// of the type is hot-swapped. Returns the new instance, if any.
    pub fn on_type_registered(&mut self, name: &str, preloading: bool) -> Option<ScriptHandle> {
        match self.index.get(name).cloned()? {
            IndexEntry::Awaiting(awaiting) => {
                let index = match self.settings.late_binding {
                    LateBinding::RecordedIndex => Some(awaiting.index.min(self.instances.len())),
                    LateBinding::Append => None,
                };
                tracing::debug!(script = name, index = ?index, "late binding awaiting script");
                let args = CreateArgs {
                    enabled: awaiting.enabled,
                    index,
                    preloading,
                    attributes: awaiting.attributes.map(AttributeSource::Raw),
                };
                self.create(name, args).ok()
            }
            IndexEntry::Live { swap_hook, .. } => {
                let revision = self.types.revision(name)?;
                if swap_hook.revision >= revision {
                    return None;
                }
                self.swap(name).ok()
            }
        }
    }

    fn run_pass(&mut self, pass: Pass, dt: f32) {
        if self.pass_list(pass).is_empty() {
            return;
        }
        self.begin_traversal();
        let saved = self.pass_list(pass).begin();
        while let Some(handle) = self.pass_list(pass).advance() {
            if !self.is_instance_enabled(handle) {
                continue;
            }
            match pass {
                Pass::Update => {
                    self.invoke(handle, ScriptMethod::Update, |script, ctx| script.update(ctx, dt))
                }
                Pass::PostUpdate => self.invoke(handle, ScriptMethod::PostUpdate, |script, ctx| {
                    script.post_update(ctx, dt)
                }),
            }
        }
        self.pass_list(pass).end(saved);
        self.end_traversal();
    }

    fn pass_list(&mut self, pass: Pass) -> &mut OrderedCallbackList<ScriptHandle> {
        match pass {
            Pass::Update => &mut self.update_list,
            Pass::PostUpdate => &mut self.post_update_list,
        }
    }

    /// Visit a snapshot of the instance list inside one traversal. Instances destroyed
    /// along the way are still visited but are never effectively enabled.
    fn traverse(&mut self, mut visit: impl FnMut(&mut Self, ScriptHandle)) {
        self.begin_traversal();
        for handle in self.instances.clone() {
            visit(self, handle);
        }
        self.end_traversal();
    }
}
