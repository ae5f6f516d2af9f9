//! Multi-entity driver.
//!
//! One [`ScriptScheduler`] per entity. Enabled components run in the order they were
//! added, kept in an [`OrderedCallbackList`] keyed by a monotonically increasing
//! component order. The host tells the system about entity enable changes, subtree
//! enables and clones; the system never walks a hierarchy itself.

use crate::callback_list::OrderedCallbackList;
use crate::error::SchedulerError;
use crate::handle::ScriptHandle;
use crate::scheduler::{CreateArgs, DuplicatedEntities, ScriptScheduler};
use crate::script::ScriptType;
use crate::settings::ScriptSettings;
use crate::types::{Registration, ScriptTypeRegistry};
use cinder_core::Entity;
use cinder_metrics::{CallCounter, PhaseTimer};
use std::collections::HashMap;
use std::time::Duration;

/// Snapshot returned by [`ScriptSystem::stats`]. Timings and pass counts stay at zero
/// without the `metrics` feature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptStats {
    pub components: usize,
    pub enabled_components: usize,
    pub instances: usize,
    pub update_passes: u64,
    pub post_update_passes: u64,
    pub update_time: Duration,
    pub post_update_time: Duration,
    pub last_update: Duration,
}

pub struct ScriptSystem {
    types: ScriptTypeRegistry,
    settings: ScriptSettings,
    components: HashMap<Entity, ScriptScheduler>,
    enabled: OrderedCallbackList<Entity>,
    component_order: HashMap<Entity, u32>,
    next_order: u32,
    preloading: bool,
    timer: PhaseTimer,
    counter: CallCounter,
}

impl ScriptSystem {
    pub fn new(settings: ScriptSettings) -> Self {
        Self::with_types(ScriptTypeRegistry::new(), settings)
    }

    pub fn with_types(types: ScriptTypeRegistry, settings: ScriptSettings) -> Self {
        let preloading = settings.start_preloading;
        Self {
            types,
            settings,
            components: HashMap::new(),
            enabled: OrderedCallbackList::new(),
            component_order: HashMap::new(),
            next_order: 0,
            preloading,
            timer: PhaseTimer::new(),
            counter: CallCounter::new(),
        }
    }

    pub fn types(&self) -> &ScriptTypeRegistry {
        &self.types
    }

    pub fn settings(&self) -> &ScriptSettings {
        &self.settings
    }

    /// Register (or hot reload) a script type and let every component react:
    /// awaiting scripts are created, stale instances swapped.
    pub fn register_type(&mut self, script_type: ScriptType) -> Registration {
        let name = script_type.name().to_string();
        let registration = self.types.register(script_type);
        let mut rebound = 0u64;
        for entity in self.entities_in_order() {
            let Some(component) = self.components.get_mut(&entity) else {
                continue;
            };
            if component.on_type_registered(&name, self.preloading).is_some() {
                rebound += 1;
            }
            Self::sync_enabled(&mut self.enabled, &self.component_order, entity, component);
        }
        self.counter.increment("rebound", rebound);
        tracing::debug!(script = %name, ?registration, rebound, "script type registered");
        registration
    }

    /// While preloading, `create` defers attribute binding and initialization to
    /// [`initialize`](Self::initialize) and updates are skipped.
    pub fn set_preloading(&mut self, preloading: bool) {
        self.preloading = preloading;
    }

    pub fn is_preloading(&self) -> bool {
        self.preloading
    }

    /// Attach a script component to `entity`. Adding twice returns the existing one.
    pub fn add_component(&mut self, entity: Entity, entity_enabled: bool) -> &mut ScriptScheduler {
        if self.components.contains_key(&entity) {
            tracing::warn!(%entity, "entity already has a script component");
        } else {
            self.component_order.insert(entity, self.next_order);
            self.next_order += 1;
        }
        let (types, settings) = (&self.types, &self.settings.scheduler);
        let component = self.components.entry(entity).or_insert_with(|| {
            let mut component = ScriptScheduler::new(types.clone(), settings.clone());
            component.attach(entity, entity_enabled);
            component
        });
        Self::sync_enabled(&mut self.enabled, &self.component_order, entity, component);
        component
    }

    fn insert_component(&mut self, entity: Entity, component: ScriptScheduler) {
        self.component_order.insert(entity, self.next_order);
        self.next_order += 1;
        Self::sync_enabled(&mut self.enabled, &self.component_order, entity, &component);
        self.components.insert(entity, component);
    }

    pub fn component(&self, entity: Entity) -> Option<&ScriptScheduler> {
        self.components.get(&entity)
    }

    pub fn component_mut(&mut self, entity: Entity) -> Option<&mut ScriptScheduler> {
        self.components.get_mut(&entity)
    }

    pub fn has_component(&self, entity: Entity) -> bool {
        self.components.contains_key(&entity)
    }

    /// Detach and tear down the component of `entity`.
    pub fn remove_component(&mut self, entity: Entity) -> bool {
        let Some(mut component) = self.components.remove(&entity) else {
            return false;
        };
        component.on_before_remove();
        component.detach();
        self.enabled.remove(&entity);
        self.component_order.remove(&entity);
        tracing::debug!(%entity, "script component removed");
        true
    }

    pub fn create(
        &mut self,
        entity: Entity,
        name: &str,
        mut args: CreateArgs,
    ) -> Result<ScriptHandle, SchedulerError> {
        args.preloading |= self.preloading;
        let component = self
            .components
            .get_mut(&entity)
            .ok_or(SchedulerError::MissingComponent { entity })?;
        let result = component.create(name, args);
        Self::sync_enabled(&mut self.enabled, &self.component_order, entity, component);
        result
    }

    /// Bind attributes and initialize every component, enabled or not. Instances that
    /// are not effectively enabled initialize later, on their first enable.
    pub fn initialize(&mut self) {
        let entities = self.entities_in_order();
        let components = &mut self.components;
        self.timer.time("initialize", || {
            for entity in &entities {
                if let Some(component) = components.get_mut(entity) {
                    component.on_initialize_attributes();
                }
            }
            for entity in &entities {
                if let Some(component) = components.get_mut(entity) {
                    component.on_initialize_all();
                }
            }
        });
        self.sync_all();
    }

    pub fn post_initialize(&mut self) {
        let entities = self.entities_in_order();
        let components = &mut self.components;
        self.timer.time("post_initialize", || {
            for entity in &entities {
                if let Some(component) = components.get_mut(entity) {
                    component.on_post_initialize_all();
                }
            }
        });
        self.sync_all();
    }

    pub fn update(&mut self, dt: f32) {
        if self.preloading {
            return;
        }
        let (components, enabled, order) =
            (&mut self.components, &mut self.enabled, &self.component_order);
        self.timer
            .time("update", || Self::run_enabled(components, enabled, order, |c| c.on_update(dt)));
        self.counter.increment("update", 1);
    }

    pub fn post_update(&mut self, dt: f32) {
        if self.preloading {
            return;
        }
        let (components, enabled, order) =
            (&mut self.components, &mut self.enabled, &self.component_order);
        self.timer.time("post_update", || {
            Self::run_enabled(components, enabled, order, |c| c.on_post_update(dt))
        });
        self.counter.increment("post_update", 1);
    }

    /// Enable or disable a single entity.
    pub fn set_entity_enabled(&mut self, entity: Entity, enabled: bool) -> bool {
        let Some(component) = self.components.get_mut(&entity) else {
            return false;
        };
        component.set_entity_enabled(enabled);
        Self::sync_enabled(&mut self.enabled, &self.component_order, entity, component);
        true
    }

    /// Enable a whole subtree: every entity is enabled (and initialized) first, then
    /// the post-initialize pass runs for all of them.
    pub fn enable_subtree(&mut self, entities: &[Entity]) {
        for entity in entities {
            if let Some(component) = self.components.get_mut(entity) {
                component.set_entity_being_enabled(true);
                component.set_entity_enabled(true);
                Self::sync_enabled(&mut self.enabled, &self.component_order, *entity, component);
            }
        }
        for entity in entities {
            if let Some(component) = self.components.get_mut(entity) {
                component.on_post_state_change();
                component.set_entity_being_enabled(false);
            }
        }
    }

    /// Clone the script components of a subtree. `pairs` lists `(original, clone)` in
    /// hierarchy order. All components are duplicated before any reference is
    /// resolved; unless preloading, the clones are then initialized.
    ///
    /// Returns the number of components created.
    pub fn clone_subtree(&mut self, pairs: &[(Entity, Entity)]) -> usize {
        let duplicated: DuplicatedEntities = pairs.iter().copied().collect();

        let mut clones: Vec<(Entity, Entity, ScriptScheduler)> = Vec::new();
        for (original, copy) in pairs {
            if self.components.contains_key(copy) {
                tracing::warn!(entity = %copy, "clone target already has a script component");
                continue;
            }
            if let Some(component) = self.components.get(original) {
                clones.push((*original, *copy, component.duplicate(*copy)));
            }
        }

        for (original, _, clone) in clones.iter_mut() {
            if let Some(source) = self.components.get(original) {
                clone.resolve_references(source, &duplicated);
            }
        }

        let count = clones.len();
        let cloned: Vec<Entity> = clones.iter().map(|(_, copy, _)| *copy).collect();
        for (_, copy, clone) in clones {
            self.insert_component(copy, clone);
        }
        if !self.preloading {
            for entity in &cloned {
                if let Some(component) = self.components.get_mut(entity) {
                    component.on_initialize_attributes();
                    component.on_initialize_all();
                }
            }
            for entity in &cloned {
                if let Some(component) = self.components.get_mut(entity) {
                    component.on_post_initialize_all();
                }
            }
            self.sync_all();
        }
        tracing::debug!(components = count, "script subtree cloned");
        count
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Entities whose component currently runs updates, in component order.
    pub fn enabled_entities(&self) -> &[Entity] {
        self.enabled.as_slice()
    }

    pub fn stats(&self) -> ScriptStats {
        ScriptStats {
            components: self.components.len(),
            enabled_components: self.enabled.len(),
            instances: self.components.values().map(ScriptScheduler::len).sum(),
            update_passes: self.counter.get("update"),
            post_update_passes: self.counter.get("post_update"),
            update_time: self.timer.total("update"),
            post_update_time: self.timer.total("post_update"),
            last_update: self.timer.last("update"),
        }
    }

    fn entities_in_order(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self.components.keys().copied().collect();
        entities.sort_by_key(|entity| self.component_order.get(entity).copied().unwrap_or(u32::MAX));
        entities
    }

    fn run_enabled<F>(
        components: &mut HashMap<Entity, ScriptScheduler>,
        enabled: &mut OrderedCallbackList<Entity>,
        order: &HashMap<Entity, u32>,
        mut run: F,
    ) where
        F: FnMut(&mut ScriptScheduler),
    {
        let saved = enabled.begin();
        while let Some(entity) = enabled.advance() {
            if let Some(component) = components.get_mut(&entity) {
                run(component);
                // a script may have disabled its own component
                Self::sync_enabled(enabled, order, entity, component);
            }
        }
        enabled.end(saved);
    }

    fn sync_all(&mut self) {
        for (entity, component) in self.components.iter() {
            Self::sync_enabled(&mut self.enabled, &self.component_order, *entity, component);
        }
    }

    fn sync_enabled(
        enabled: &mut OrderedCallbackList<Entity>,
        order: &HashMap<Entity, u32>,
        entity: Entity,
        component: &ScriptScheduler,
    ) {
        let listed = enabled.contains(&entity);
        if component.is_active() && !listed {
            enabled.insert(entity, |e| order.get(e).copied().unwrap_or(u32::MAX));
        } else if !component.is_active() && listed {
            enabled.remove(&entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeDef;
    use crate::script::Capabilities;
    use crate::test_support::{entries, journal, recorder};
    use cinder_core::EntityAllocator;

    #[test]
    fn components_update_in_creation_order_while_enabled() {
        let log = journal();
        let mut system = ScriptSystem::new(ScriptSettings::default());
        system.register_type(recorder("a", &log, Capabilities::UPDATE));
        system.register_type(recorder("b", &log, Capabilities::UPDATE));
        let mut entities = EntityAllocator::new();
        let (first, second) = (entities.alloc(), entities.alloc());

        system.add_component(second, true);
        system.add_component(first, true);
        system.create(second, "a", CreateArgs::new()).unwrap();
        system.create(first, "b", CreateArgs::new()).unwrap();

        system.update(0.016);
        assert_eq!(entries(&log), vec!["a.update", "b.update"]);

        system.set_entity_enabled(second, false);
        assert_eq!(system.enabled_entities(), &[first]);
        system.update(0.016);
        assert_eq!(
            entries(&log),
            vec!["a.update", "b.update", "a.disable", "b.update"]
        );

        let stats = system.stats();
        assert_eq!(stats.components, 2);
        assert_eq!(stats.enabled_components, 1);
        assert_eq!(stats.instances, 2);
        if cinder_metrics::ENABLED {
            assert_eq!(stats.update_passes, 2);
        }
    }

    #[test]
    fn preloading_defers_everything_to_initialize() {
        let log = journal();
        let settings = ScriptSettings {
            start_preloading: true,
            ..ScriptSettings::default()
        };
        let mut system = ScriptSystem::new(settings);
        system.register_type(recorder("a", &log, Capabilities::all()));
        let entity = Entity::new(0, 0);
        system.add_component(entity, true);
        system.create(entity, "a", CreateArgs::new()).unwrap();
        system.update(0.016);
        assert!(entries(&log).is_empty());

        system.set_preloading(false);
        system.initialize();
        system.post_initialize();
        system.update(0.016);
        assert_eq!(
            entries(&log),
            vec!["a.initialize", "a.post_initialize", "a.update"]
        );
    }

    #[test]
    fn late_registration_reaches_every_component() {
        let log = journal();
        let mut system = ScriptSystem::new(ScriptSettings::default());
        let (one, two) = (Entity::new(0, 0), Entity::new(1, 0));
        system.add_component(one, true);
        system.add_component(two, true);
        assert!(system.create(one, "late", CreateArgs::new()).is_err());
        assert!(system.create(two, "late", CreateArgs::new()).is_err());
        assert!(matches!(
            system.create(Entity::new(9, 0), "late", CreateArgs::new()),
            Err(SchedulerError::MissingComponent { .. })
        ));

        assert_eq!(
            system.register_type(recorder("late", &log, Capabilities::INITIALIZE)),
            Registration::Added
        );
        assert_eq!(entries(&log), vec!["late.initialize", "late.initialize"]);
        assert!(system.component(one).unwrap().has("late"));
    }

    #[test]
    fn subtree_enable_runs_post_initialize_after_all_initialize() {
        let log = journal();
        let mut system = ScriptSystem::new(ScriptSettings::default());
        system.register_type(recorder("a", &log, Capabilities::all()));
        system.register_type(recorder("b", &log, Capabilities::all()));
        let (parent, child) = (Entity::new(0, 0), Entity::new(1, 0));
        system.add_component(parent, false);
        system.add_component(child, false);
        system.create(parent, "a", CreateArgs::new()).unwrap();
        system.create(child, "b", CreateArgs::new()).unwrap();
        assert!(entries(&log).is_empty());

        system.enable_subtree(&[parent, child]);
        assert_eq!(
            entries(&log),
            vec![
                "a.enable",
                "a.initialize",
                "b.enable",
                "b.initialize",
                "a.post_initialize",
                "b.post_initialize"
            ]
        );
        assert_eq!(system.enabled_entities(), &[parent, child]);
    }

    #[test]
    fn clone_subtree_remaps_sibling_references() {
        let log = journal();
        let mut system = ScriptSystem::new(ScriptSettings::default());
        system.register_type(
            recorder("follower", &log, Capabilities::INITIALIZE)
                .attribute(AttributeDef::entity("target"))
                .unwrap(),
        );
        let mut entities = EntityAllocator::new();
        let (x, y, outside) = (entities.alloc(), entities.alloc(), entities.alloc());
        let (x2, y2) = (entities.alloc(), entities.alloc());

        system.add_component(x, true);
        let handle = system.create(x, "follower", CreateArgs::new()).unwrap();
        system
            .component_mut(x)
            .unwrap()
            .set_attribute(handle, "target", y.into())
            .unwrap();
        system.add_component(y, true);
        let other = system.create(y, "follower", CreateArgs::new()).unwrap();
        system
            .component_mut(y)
            .unwrap()
            .set_attribute(other, "target", outside.into())
            .unwrap();
        log.borrow_mut().clear();

        assert_eq!(system.clone_subtree(&[(x, x2), (y, y2)]), 2);

        let target_of = |entity: Entity| {
            let component = system.component(entity).unwrap();
            let handle = component.handle("follower").unwrap();
            component.attributes(handle).unwrap().get_entity("target")
        };
        assert_eq!(target_of(x2), Some(y2));
        assert_eq!(target_of(y2), Some(outside));
        assert_eq!(target_of(x), Some(y));
        assert_eq!(entries(&log), vec!["follower.initialize", "follower.initialize"]);
    }

    #[test]
    fn clone_while_preloading_keeps_scene_references() {
        let log = journal();
        let settings = ScriptSettings {
            start_preloading: true,
            ..ScriptSettings::default()
        };
        let mut system = ScriptSystem::new(settings);
        system.register_type(
            recorder("follower", &log, Capabilities::INITIALIZE)
                .attribute(AttributeDef::entity("target"))
                .unwrap(),
        );
        let mut entities = EntityAllocator::new();
        let (x, y, outside) = (entities.alloc(), entities.alloc(), entities.alloc());
        let (x2, y2) = (entities.alloc(), entities.alloc());

        let mut target = serde_json::Map::new();
        target.insert("target".into(), y.to_bits().into());
        system.add_component(x, true);
        system
            .create(x, "follower", CreateArgs::new().raw_attributes(target))
            .unwrap();
        let mut target = serde_json::Map::new();
        target.insert("target".into(), outside.to_bits().into());
        system.add_component(y, true);
        system
            .create(y, "follower", CreateArgs::new().raw_attributes(target))
            .unwrap();

        assert_eq!(system.clone_subtree(&[(x, x2), (y, y2)]), 2);
        assert!(entries(&log).is_empty());

        system.set_preloading(false);
        system.initialize();
        let target_of = |entity: Entity| {
            let component = system.component(entity).unwrap();
            let handle = component.handle("follower").unwrap();
            component.attributes(handle).unwrap().get_entity("target")
        };
        assert_eq!(target_of(x2), Some(y2));
        assert_eq!(target_of(y2), Some(outside));
        assert_eq!(target_of(x), Some(y));
        assert_eq!(target_of(y), Some(outside));
        assert_eq!(entries(&log).len(), 4);
    }

    #[test]
    fn remove_component_tears_down() {
        let log = journal();
        let mut system = ScriptSystem::new(ScriptSettings::default());
        system.register_type(recorder("a", &log, Capabilities::DESTROY));
        let entity = Entity::new(0, 0);
        system.add_component(entity, true);
        system.create(entity, "a", CreateArgs::new()).unwrap();

        assert!(system.remove_component(entity));
        assert!(!system.remove_component(entity));
        assert_eq!(entries(&log), vec!["a.disable", "a.destroy"]);
        assert!(system.enabled_entities().is_empty());
        assert!(system.is_empty());
    }
}
