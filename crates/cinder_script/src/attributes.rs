//! Script attribute schema and typed attribute values.
//!
//! A script type declares its configurable fields as an [`AttributeSchema`]. Each
//! instance owns an [`Attributes`] bag: a typed map keyed by attribute name with explicit
//! accessors. Raw attribute data arrives as a JSON object (scene files, editor payloads)
//! and is bound against the schema once per instance; values that fail to parse fall back
//! to the field default.

use crate::error::AttributeError;
use cinder_core::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Raw attribute payload as stored in scene data.
pub type RawAttributes = serde_json::Map<String, Value>;

/// Names that collide with instance state or lifecycle methods.
pub const RESERVED_NAMES: &[&str] = &[
    "entity",
    "enabled",
    "initialize",
    "post_initialize",
    "update",
    "post_update",
    "swap",
    "destroy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    Boolean,
    Number,
    String,
    Entity,
    Asset,
    Vec2,
    Vec3,
    Vec4,
    Rgb,
    Rgba,
    Json,
}

impl AttributeType {
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeType::Boolean => "boolean",
            AttributeType::Number => "number",
            AttributeType::String => "string",
            AttributeType::Entity => "entity",
            AttributeType::Asset => "asset",
            AttributeType::Vec2 => "vec2",
            AttributeType::Vec3 => "vec3",
            AttributeType::Vec4 => "vec4",
            AttributeType::Rgb => "rgb",
            AttributeType::Rgba => "rgba",
            AttributeType::Json => "json",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bound attribute value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AttributeValue {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Entity(Entity),
    Asset(u64),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// `rgb` and `rgba` both bind to RGBA; `rgb` keeps alpha at 1.
    Color([f32; 4]),
    Json(BTreeMap<String, AttributeValue>),
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AttributeValue::Null => "null",
            AttributeValue::Boolean(_) => "boolean",
            AttributeValue::Number(_) => "number",
            AttributeValue::String(_) => "string",
            AttributeValue::Entity(_) => "entity",
            AttributeValue::Asset(_) => "asset",
            AttributeValue::Vec2(_) => "vec2",
            AttributeValue::Vec3(_) => "vec3",
            AttributeValue::Vec4(_) => "vec4",
            AttributeValue::Color(_) => "color",
            AttributeValue::Json(_) => "json",
            AttributeValue::Array(_) => "array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<Entity> {
        match self {
            AttributeValue::Entity(entity) => Some(*entity),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&BTreeMap<String, AttributeValue>> {
        match self {
            AttributeValue::Json(fields) => Some(fields),
            _ => None,
        }
    }

    /// Loose conversion used for `json` attributes declared without a field schema.
    fn from_json_loose(raw: &Value) -> Self {
        match raw {
            Value::Null => AttributeValue::Null,
            Value::Bool(value) => AttributeValue::Boolean(*value),
            Value::Number(value) => value
                .as_f64()
                .map(AttributeValue::Number)
                .unwrap_or(AttributeValue::Null),
            Value::String(value) => AttributeValue::String(value.clone()),
            Value::Array(items) => {
                AttributeValue::Array(items.iter().map(Self::from_json_loose).collect())
            }
            Value::Object(fields) => AttributeValue::Json(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), Self::from_json_loose(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<Entity> for AttributeValue {
    fn from(value: Entity) -> Self {
        AttributeValue::Entity(value)
    }
}

/// Declaration of one script attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDef {
    name: String,
    kind: AttributeType,
    array: bool,
    default: Option<AttributeValue>,
    schema: Option<AttributeSchema>,
}

impl AttributeDef {
    pub fn new(name: impl Into<String>, kind: AttributeType) -> Self {
        Self {
            name: name.into(),
            kind,
            array: false,
            default: None,
            schema: None,
        }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Boolean)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Number)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::String)
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Entity)
    }

    /// Structured attribute whose fields follow `fields`. Field names are not subject
    /// to the reserved-name check.
    pub fn json<I>(name: impl Into<String>, fields: I) -> Result<Self, AttributeError>
    where
        I: IntoIterator<Item = AttributeDef>,
    {
        let mut schema = AttributeSchema::new();
        for field in fields {
            schema.insert(field, false)?;
        }
        let mut def = Self::new(name, AttributeType::Json);
        def.schema = Some(schema);
        Ok(def)
    }

    /// Mark the attribute as an array of its declared type.
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<AttributeValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttributeType {
        self.kind
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    /// Field schema of a structured (`json`) attribute.
    pub fn schema(&self) -> Option<&AttributeSchema> {
        self.schema.as_ref()
    }

    pub fn default_value(&self) -> AttributeValue {
        if let Some(value) = &self.default {
            return value.clone();
        }
        if self.array {
            return AttributeValue::Array(Vec::new());
        }
        match self.kind {
            AttributeType::Boolean => AttributeValue::Boolean(false),
            AttributeType::Number => AttributeValue::Number(0.0),
            AttributeType::String => AttributeValue::String(String::new()),
            AttributeType::Entity | AttributeType::Asset => AttributeValue::Null,
            AttributeType::Vec2 => AttributeValue::Vec2([0.0; 2]),
            AttributeType::Vec3 => AttributeValue::Vec3([0.0; 3]),
            AttributeType::Vec4 => AttributeValue::Vec4([0.0; 4]),
            AttributeType::Rgb | AttributeType::Rgba => AttributeValue::Color([0.0, 0.0, 0.0, 1.0]),
            AttributeType::Json => match &self.schema {
                Some(schema) => AttributeValue::Json(
                    schema
                        .iter()
                        .map(|field| (field.name.clone(), field.default_value()))
                        .collect(),
                ),
                None => AttributeValue::Json(BTreeMap::new()),
            },
        }
    }

    /// Whether `value` could have been produced by binding this declaration.
    pub fn accepts(&self, value: &AttributeValue) -> bool {
        if self.array {
            return match value {
                AttributeValue::Null => true,
                AttributeValue::Array(items) => items.iter().all(|item| self.accepts_scalar(item)),
                _ => false,
            };
        }
        self.accepts_scalar(value)
    }

    fn accepts_scalar(&self, value: &AttributeValue) -> bool {
        match (self.kind, value) {
            (_, AttributeValue::Null) => true,
            (AttributeType::Boolean, AttributeValue::Boolean(_))
            | (AttributeType::Number, AttributeValue::Number(_))
            | (AttributeType::String, AttributeValue::String(_))
            | (AttributeType::Entity, AttributeValue::Entity(_))
            | (AttributeType::Asset, AttributeValue::Asset(_))
            | (AttributeType::Vec2, AttributeValue::Vec2(_))
            | (AttributeType::Vec3, AttributeValue::Vec3(_))
            | (AttributeType::Vec4, AttributeValue::Vec4(_))
            | (AttributeType::Rgb, AttributeValue::Color(_))
            | (AttributeType::Rgba, AttributeValue::Color(_)) => true,
            (AttributeType::Json, AttributeValue::Json(fields)) => match &self.schema {
                Some(schema) => fields
                    .iter()
                    .all(|(key, field)| schema.get(key).is_some_and(|def| def.accepts(field))),
                None => true,
            },
            _ => false,
        }
    }

    /// Whether this attribute (or any nested field) holds entity references.
    pub fn references_entities(&self) -> bool {
        match self.kind {
            AttributeType::Entity => true,
            AttributeType::Json => self
                .schema
                .as_ref()
                .is_some_and(|schema| schema.iter().any(AttributeDef::references_entities)),
            _ => false,
        }
    }

    /// Convert a raw JSON value into a typed value.
    pub fn parse_raw(&self, raw: &Value) -> Result<AttributeValue, AttributeError> {
        if !self.array {
            return self.parse_scalar(raw);
        }
        match raw {
            Value::Null => Ok(AttributeValue::Array(Vec::new())),
            Value::Array(items) => items
                .iter()
                .map(|item| self.parse_scalar(item))
                .collect::<Result<Vec<_>, _>>()
                .map(AttributeValue::Array),
            other => Err(self.mismatch(other)),
        }
    }

    fn parse_scalar(&self, raw: &Value) -> Result<AttributeValue, AttributeError> {
        match self.kind {
            AttributeType::Boolean => match raw {
                Value::Bool(value) => Ok(AttributeValue::Boolean(*value)),
                Value::Number(value) => Ok(AttributeValue::Boolean(value.as_f64() != Some(0.0))),
                Value::Null => Ok(AttributeValue::Boolean(false)),
                other => Err(self.mismatch(other)),
            },
            AttributeType::Number => match raw {
                Value::Number(value) => Ok(value
                    .as_f64()
                    .map(AttributeValue::Number)
                    .unwrap_or(AttributeValue::Null)),
                Value::String(text) => text
                    .trim()
                    .parse::<f64>()
                    .map(AttributeValue::Number)
                    .map_err(|err| self.invalid(err.to_string())),
                Value::Null => Ok(AttributeValue::Null),
                other => Err(self.mismatch(other)),
            },
            AttributeType::String => match raw {
                Value::String(text) => Ok(AttributeValue::String(text.clone())),
                Value::Number(value) => Ok(AttributeValue::String(value.to_string())),
                Value::Bool(value) => Ok(AttributeValue::String(value.to_string())),
                Value::Null => Ok(AttributeValue::Null),
                other => Err(self.mismatch(other)),
            },
            AttributeType::Entity => self
                .parse_bits(raw)
                .map(|bits| bits.map_or(AttributeValue::Null, |bits| AttributeValue::Entity(Entity::from_bits(bits)))),
            AttributeType::Asset => self
                .parse_bits(raw)
                .map(|id| id.map_or(AttributeValue::Null, AttributeValue::Asset)),
            AttributeType::Vec2 => self.parse_floats::<2>(raw).map(AttributeValue::Vec2),
            AttributeType::Vec3 => self.parse_floats::<3>(raw).map(AttributeValue::Vec3),
            AttributeType::Vec4 => self.parse_floats::<4>(raw).map(AttributeValue::Vec4),
            AttributeType::Rgb => self
                .parse_floats::<3>(raw)
                .map(|[r, g, b]| AttributeValue::Color([r, g, b, 1.0])),
            AttributeType::Rgba => match raw {
                Value::Array(items) if items.len() == 3 => self
                    .parse_floats::<3>(raw)
                    .map(|[r, g, b]| AttributeValue::Color([r, g, b, 1.0])),
                _ => self.parse_floats::<4>(raw).map(AttributeValue::Color),
            },
            AttributeType::Json => self.parse_json(raw),
        }
    }

    fn parse_json(&self, raw: &Value) -> Result<AttributeValue, AttributeError> {
        let Some(schema) = &self.schema else {
            return Ok(AttributeValue::from_json_loose(raw));
        };
        match raw {
            Value::Null => Ok(self.default_value()),
            Value::Object(fields) => {
                let mut bound = BTreeMap::new();
                for field in schema.iter() {
                    let value = match fields.get(field.name()) {
                        Some(raw_field) => field.parse_raw(raw_field)?,
                        None => field.default_value(),
                    };
                    bound.insert(field.name().to_string(), value);
                }
                Ok(AttributeValue::Json(bound))
            }
            other => Err(self.mismatch(other)),
        }
    }

    fn parse_bits(&self, raw: &Value) -> Result<Option<u64>, AttributeError> {
        match raw {
            Value::Null => Ok(None),
            Value::Number(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.invalid(format!("{value} is not an unsigned id"))),
            Value::String(text) => text
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|err| self.invalid(err.to_string())),
            other => Err(self.mismatch(other)),
        }
    }

    fn parse_floats<const N: usize>(&self, raw: &Value) -> Result<[f32; N], AttributeError> {
        let Value::Array(items) = raw else {
            return Err(self.mismatch(raw));
        };
        if items.len() != N {
            return Err(self.invalid(format!("expected {N} components, got {}", items.len())));
        }
        let mut out = [0.0f32; N];
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = item
                .as_f64()
                .ok_or_else(|| self.invalid(format!("component {item} is not a number")))?
                as f32;
        }
        Ok(out)
    }

    fn mismatch(&self, raw: &Value) -> AttributeError {
        AttributeError::TypeMismatch {
            name: self.name.clone(),
            expected: self.kind,
            found: json_kind(raw),
        }
    }

    fn invalid(&self, reason: String) -> AttributeError {
        AttributeError::InvalidRaw {
            name: self.name.clone(),
            reason,
        }
    }
}

fn json_kind(raw: &Value) -> &'static str {
    match raw {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ordered set of attribute declarations for one script type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSchema {
    defs: Vec<AttributeDef>,
    index: HashMap<String, usize>,
}

impl AttributeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attribute. Rejects reserved and duplicate names.
    pub fn add(&mut self, def: AttributeDef) -> Result<(), AttributeError> {
        self.insert(def, true)
    }

    fn insert(&mut self, def: AttributeDef, check_reserved: bool) -> Result<(), AttributeError> {
        if check_reserved && RESERVED_NAMES.contains(&def.name()) {
            return Err(AttributeError::Reserved {
                name: def.name.clone(),
            });
        }
        if self.index.contains_key(def.name()) {
            return Err(AttributeError::Duplicate {
                name: def.name.clone(),
            });
        }
        self.index.insert(def.name.clone(), self.defs.len());
        self.defs.push(def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDef> {
        self.index.get(name).map(|&slot| &self.defs[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeDef> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn defaults(&self) -> Attributes {
        Attributes {
            values: self
                .defs
                .iter()
                .map(|def| (def.name.clone(), def.default_value()))
                .collect(),
        }
    }

    /// Bind a raw payload. Missing keys take the default; unparseable values take the
    /// default and log a warning. Keys without a declaration are ignored.
    pub fn bind_raw(&self, raw: &RawAttributes) -> Attributes {
        let mut bound = self.defaults();
        for def in &self.defs {
            let Some(value) = raw.get(def.name()) else {
                continue;
            };
            match def.parse_raw(value) {
                Ok(parsed) => {
                    bound.values.insert(def.name.clone(), parsed);
                }
                Err(err) => {
                    tracing::warn!(attribute = def.name(), "{err}; using default");
                }
            }
        }
        bound
    }

    /// Carry values from a previous bag onto this schema, keeping only values the
    /// declarations accept.
    pub fn rebind(&self, previous: &Attributes) -> Attributes {
        let mut bound = self.defaults();
        for def in &self.defs {
            if let Some(value) = previous.get(def.name()) {
                if def.accepts(value) {
                    bound.values.insert(def.name.clone(), value.clone());
                }
            }
        }
        bound
    }
}

/// Typed attribute bag of one script instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: BTreeMap<String, AttributeValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(AttributeValue::as_bool)
    }

    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttributeValue::as_number)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttributeValue::as_str)
    }

    pub fn get_entity(&self, name: &str) -> Option<Entity> {
        self.get(name).and_then(AttributeValue::as_entity)
    }

    /// Assign a value after checking it against `schema`. Returns the previous value.
    pub fn set(
        &mut self,
        schema: &AttributeSchema,
        name: &str,
        value: AttributeValue,
    ) -> Result<AttributeValue, AttributeError> {
        let def = schema.get(name).ok_or_else(|| AttributeError::Unknown {
            name: name.to_string(),
        })?;
        if !def.accepts(&value) {
            return Err(AttributeError::TypeMismatch {
                name: name.to_string(),
                expected: def.kind(),
                found: value.kind_name(),
            });
        }
        Ok(self
            .values
            .insert(name.to_string(), value)
            .unwrap_or_default())
    }

    /// Unchecked write used by the clone resolver, which only writes values derived
    /// from an already accepted value.
    pub(crate) fn replace(&mut self, name: &str, value: AttributeValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawAttributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("raw attributes must be an object"),
        }
    }

    #[test]
    fn reserved_and_duplicate_names_are_rejected() {
        let mut schema = AttributeSchema::new();
        assert!(matches!(
            schema.add(AttributeDef::number("enabled")),
            Err(AttributeError::Reserved { .. })
        ));
        schema.add(AttributeDef::number("speed")).unwrap();
        assert!(matches!(
            schema.add(AttributeDef::boolean("speed")),
            Err(AttributeError::Duplicate { .. })
        ));
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn bind_raw_parses_and_falls_back_to_defaults() {
        let mut schema = AttributeSchema::new();
        schema.add(AttributeDef::number("speed").with_default(2.5)).unwrap();
        schema.add(AttributeDef::boolean("loop")).unwrap();
        schema.add(AttributeDef::new("tint", AttributeType::Rgb)).unwrap();
        schema.add(AttributeDef::entity("target")).unwrap();
        schema.add(AttributeDef::new("offset", AttributeType::Vec3)).unwrap();

        let target = Entity::new(4, 1);
        let bound = schema.bind_raw(&raw(json!({
            "speed": "fast",
            "loop": true,
            "tint": [1.0, 0.5, 0.25],
            "target": target.to_bits(),
            "offset": [1.0, 2.0],
            "unknown": 12
        })));

        assert_eq!(bound.get_number("speed"), Some(2.5), "unparseable value keeps default");
        assert_eq!(bound.get_bool("loop"), Some(true));
        assert_eq!(bound.get("tint"), Some(&AttributeValue::Color([1.0, 0.5, 0.25, 1.0])));
        assert_eq!(bound.get_entity("target"), Some(target));
        assert_eq!(bound.get("offset"), Some(&AttributeValue::Vec3([0.0; 3])));
        assert!(!bound.contains("unknown"));
    }

    #[test]
    fn nested_json_schema_binds_entity_arrays() {
        let waypoint = AttributeDef::json(
            "route",
            [
                AttributeDef::entity("stops").array(),
                AttributeDef::number("wait").with_default(1.0),
            ],
        )
        .unwrap()
        .array();
        assert!(waypoint.references_entities());

        let stop = Entity::new(9, 0);
        let value = waypoint
            .parse_raw(&json!([{ "stops": [stop.to_bits(), null] }]))
            .unwrap();
        let items = value.as_array().unwrap();
        let fields = items[0].as_json().unwrap();
        assert_eq!(
            fields["stops"],
            AttributeValue::Array(vec![AttributeValue::Entity(stop), AttributeValue::Null])
        );
        assert_eq!(fields["wait"], AttributeValue::Number(1.0));
    }

    #[test]
    fn set_validates_against_schema() {
        let mut schema = AttributeSchema::new();
        schema.add(AttributeDef::number("speed")).unwrap();
        let mut attributes = schema.defaults();

        let previous = attributes
            .set(&schema, "speed", AttributeValue::Number(4.0))
            .unwrap();
        assert_eq!(previous, AttributeValue::Number(0.0));
        assert!(matches!(
            attributes.set(&schema, "speed", "slow".into()),
            Err(AttributeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            attributes.set(&schema, "missing", true.into()),
            Err(AttributeError::Unknown { .. })
        ));
        assert_eq!(attributes.get_number("speed"), Some(4.0));
    }

    #[test]
    fn rebind_keeps_only_compatible_values() {
        let mut old_schema = AttributeSchema::new();
        old_schema.add(AttributeDef::number("speed")).unwrap();
        old_schema.add(AttributeDef::string("label")).unwrap();
        let mut old = old_schema.defaults();
        old.set(&old_schema, "speed", 7.0.into()).unwrap();
        old.set(&old_schema, "label", "spinner".into()).unwrap();

        let mut new_schema = AttributeSchema::new();
        new_schema.add(AttributeDef::number("speed")).unwrap();
        new_schema.add(AttributeDef::boolean("label")).unwrap();
        let rebound = new_schema.rebind(&old);

        assert_eq!(rebound.get_number("speed"), Some(7.0));
        assert_eq!(rebound.get_bool("label"), Some(false));
    }
}
