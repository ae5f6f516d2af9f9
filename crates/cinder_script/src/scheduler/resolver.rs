//! Two-phase clone support.
//!
//! Cloning a subtree first duplicates every scheduler with [`ScriptScheduler::duplicate`],
//! then calls [`ScriptScheduler::resolve_references`] on each clone. References can point
//! forward to entities duplicated later, so remapping only starts once the whole old→new
//! table exists.

use super::{slot_entry, slot_entry_mut, AttributeSource, CreateArgs, ScriptScheduler};
use crate::attributes::{AttributeDef, AttributeType, AttributeValue};
use cinder_core::Entity;
use std::collections::HashMap;
use std::rc::Rc;

/// Original entity → its clone, for every entity of the duplicated subtree.
pub type DuplicatedEntities = HashMap<Entity, Entity>;

impl ScriptScheduler {
    /// Copy every live script (type, own enabled flag, attribute values) and every
    /// awaiting entry onto a fresh scheduler for `entity`. Nothing is initialized.
    pub fn duplicate(&self, entity: Entity) -> ScriptScheduler {
        let mut clone = ScriptScheduler::new(self.types.clone(), self.settings.clone());
        clone.entity = Some(entity);
        clone.enabled = self.enabled;
        clone.entity_enabled = self.entity_enabled;
        clone.active = self.enabled && self.entity_enabled;

        for handle in &self.instances {
            let Some(entry) = slot_entry(&self.slots, *handle) else {
                continue;
            };
            if entry.state.destroyed {
                continue;
            }
            let attributes = if entry.state.attributes_bound {
                Some(AttributeSource::Values(entry.attributes.clone()))
            } else {
                entry.pending_attributes.clone()
            };
            let revision = self
                .index
                .swap_hook(&entry.name)
                .map_or(0, |hook| hook.revision);
            let args = CreateArgs {
                enabled: entry.state.enabled,
                index: None,
                preloading: true,
                attributes,
            };
            let copy = clone.create_with_type(&entry.name, Rc::clone(&entry.script_type), revision, args);
            clone.bind_attributes(copy);
        }

        for (name, awaiting) in self.index.awaiting_entries() {
            clone.index.insert_awaiting(name, awaiting.clone());
        }
        tracing::debug!(from = ?self.entity, to = %entity, scripts = clone.len(), "script component duplicated");
        clone
    }

    /// Point entity references that target the duplicated subtree at the clones.
    ///
    /// `self` is the clone produced by [`duplicate`](Self::duplicate) and `old` its
    /// source. Only scripts the source still holds are remapped, reading the clone's own
    /// bound values. References to entities outside `duplicated` are left as they were.
    pub fn resolve_references(&mut self, old: &ScriptScheduler, duplicated: &DuplicatedEntities) {
        for (name, _) in old.index.live_entries() {
            let Some(new_handle) = self.index.live(name) else {
                continue;
            };
            let Some(new_entry) = slot_entry_mut(&mut self.slots, new_handle) else {
                continue;
            };
            let script_type = Rc::clone(&new_entry.script_type);
            for def in script_type
                .attributes()
                .iter()
                .filter(|def| def.references_entities())
            {
                if let Some(value) = new_entry.attributes.get(def.name()) {
                    let remapped = remap_value(def, value, duplicated);
                    new_entry.attributes.replace(def.name(), remapped);
                }
            }
        }
    }
}

fn remap_value(def: &AttributeDef, value: &AttributeValue, duplicated: &DuplicatedEntities) -> AttributeValue {
    match value {
        AttributeValue::Array(items) if def.is_array() => AttributeValue::Array(
            items
                .iter()
                .map(|item| remap_scalar(def, item, duplicated))
                .collect(),
        ),
        other => remap_scalar(def, other, duplicated),
    }
}

fn remap_scalar(def: &AttributeDef, value: &AttributeValue, duplicated: &DuplicatedEntities) -> AttributeValue {
    match (def.kind(), value) {
        (AttributeType::Entity, AttributeValue::Entity(entity)) => {
            AttributeValue::Entity(duplicated.get(entity).copied().unwrap_or(*entity))
        }
        (AttributeType::Json, AttributeValue::Json(fields)) => {
            let Some(schema) = def.schema() else {
                return value.clone();
            };
            AttributeValue::Json(
                fields
                    .iter()
                    .map(|(key, field)| {
                        let remapped = match schema.get(key) {
                            Some(field_def) if field_def.references_entities() => {
                                remap_value(field_def, field, duplicated)
                            }
                            _ => field.clone(),
                        };
                        (key.clone(), remapped)
                    })
                    .collect(),
            )
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Capabilities;
    use crate::settings::SchedulerSettings;
    use crate::test_support::{entries, journal, recorder};
    use crate::types::ScriptTypeRegistry;
    use serde_json::{json, Value};

    fn raw(value: Value) -> crate::attributes::RawAttributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("raw attributes must be an object"),
        }
    }

    fn follower_types(log: &crate::test_support::Journal) -> ScriptTypeRegistry {
        let types = ScriptTypeRegistry::new();
        let follower = recorder("follower", log, Capabilities::all())
            .attribute(AttributeDef::entity("target"))
            .unwrap()
            .attribute(AttributeDef::entity("anchor"))
            .unwrap()
            .attribute(
                AttributeDef::json(
                    "route",
                    [
                        AttributeDef::entity("stops").array(),
                        AttributeDef::number("wait"),
                    ],
                )
                .unwrap(),
            )
            .unwrap()
            .attribute(AttributeDef::entity("crowd").array())
            .unwrap();
        types.register(follower);
        types
    }

    #[test]
    fn references_inside_the_subtree_follow_the_clone() {
        let log = journal();
        let types = follower_types(&log);
        let (x, y, outside) = (Entity::new(1, 0), Entity::new(2, 0), Entity::new(3, 0));
        let (x2, y2) = (Entity::new(10, 0), Entity::new(11, 0));

        let mut original = ScriptScheduler::new(types.clone(), SchedulerSettings::default());
        original.attach(x, true);
        original
            .create(
                "follower",
                CreateArgs::new().raw_attributes(raw(json!({
                    "target": y.to_bits(),
                    "anchor": outside.to_bits(),
                    "route": { "stops": [y.to_bits(), outside.to_bits()], "wait": 2 },
                    "crowd": [x.to_bits(), y.to_bits(), outside.to_bits()]
                }))),
            )
            .unwrap();
        log.borrow_mut().clear();

        let duplicated: DuplicatedEntities = [(x, x2), (y, y2)].into_iter().collect();
        let mut clone = original.duplicate(x2);
        assert!(entries(&log).is_empty(), "duplicate must not initialize");
        clone.resolve_references(&original, &duplicated);

        let handle = clone.handle("follower").unwrap();
        let attributes = clone.attributes(handle).unwrap();
        assert_eq!(attributes.get_entity("target"), Some(y2));
        assert_eq!(attributes.get_entity("anchor"), Some(outside));
        assert_eq!(
            attributes.get("crowd"),
            Some(&AttributeValue::Array(vec![
                AttributeValue::Entity(x2),
                AttributeValue::Entity(y2),
                AttributeValue::Entity(outside),
            ]))
        );
        let route = attributes.get("route").and_then(AttributeValue::as_json).unwrap();
        assert_eq!(
            route["stops"],
            AttributeValue::Array(vec![AttributeValue::Entity(y2), AttributeValue::Entity(outside)])
        );
        assert_eq!(route["wait"], AttributeValue::Number(2.0));

        // the source keeps its own references
        let source = original.attributes(original.handle("follower").unwrap()).unwrap();
        assert_eq!(source.get_entity("target"), Some(y));
    }

    #[test]
    fn preloaded_source_remaps_from_the_clone_binding() {
        let log = journal();
        let types = follower_types(&log);
        let (x, y, outside) = (Entity::new(1, 0), Entity::new(2, 0), Entity::new(3, 0));
        let (x2, y2) = (Entity::new(10, 0), Entity::new(11, 0));

        let mut original = ScriptScheduler::new(types.clone(), SchedulerSettings::default());
        original.attach(x, true);
        let handle = original
            .create(
                "follower",
                CreateArgs::new().preloading(true).raw_attributes(raw(json!({
                    "target": y.to_bits(),
                    "anchor": outside.to_bits()
                }))),
            )
            .unwrap();
        assert!(!original.instance_state(handle).unwrap().attributes_bound());

        let duplicated: DuplicatedEntities = [(x, x2), (y, y2)].into_iter().collect();
        let mut clone = original.duplicate(x2);
        clone.resolve_references(&original, &duplicated);

        let attributes = clone.attributes(clone.handle("follower").unwrap()).unwrap();
        assert_eq!(attributes.get_entity("target"), Some(y2));
        assert_eq!(attributes.get_entity("anchor"), Some(outside));
        assert!(entries(&log).is_empty());
    }

    #[test]
    fn duplicate_keeps_order_flags_and_awaiting_entries() {
        let log = journal();
        let types = ScriptTypeRegistry::new();
        types.register(recorder("a", &log, Capabilities::all()));
        types.register(recorder("b", &log, Capabilities::all()));
        let mut original = ScriptScheduler::new(types.clone(), SchedulerSettings::default());
        original.attach(Entity::new(1, 0), true);
        original.create("a", CreateArgs::new()).unwrap();
        original.create("b", CreateArgs::new().enabled(false)).unwrap();
        let _ = original.create("later", CreateArgs::new());
        assert!(original.move_script("b", 0));

        let mut clone = original.duplicate(Entity::new(2, 0));
        assert_eq!(clone.script_names(), vec!["b", "a"]);
        assert!(clone.is_awaiting("later"));
        let b = clone.handle("b").unwrap();
        assert!(!clone.instance_state(b).unwrap().enabled());
        assert!(!clone.instance_state(b).unwrap().is_initialized());

        log.borrow_mut().clear();
        clone.on_initialize_all();
        clone.on_post_initialize_all();
        assert_eq!(entries(&log), vec!["a.initialize", "a.post_initialize"]);
    }
}
