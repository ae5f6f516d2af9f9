use crate::attributes::AttributeType;
use cinder_core::Entity;
use thiserror::Error;

/// Configuration errors reported by scheduler operations.
///
/// None of these leave partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("script '{name}' is already added to this entity")]
    DuplicateScript { name: String },

    /// Not fatal: an awaiting entry was recorded and the script is created once its
    /// type gets registered.
    #[error("script type '{name}' is not registered yet; awaiting registration")]
    AwaitingType { name: String },

    #[error("script '{name}' is not attached")]
    UnknownScript { name: String },

    #[error("script type '{name}' does not support swapping")]
    NotSwappable { name: String },

    #[error("script '{name}' is running a callback and cannot be replaced")]
    InstanceBusy { name: String },

    #[error("entity {entity} has no script component")]
    MissingComponent { entity: Entity },
}

/// Errors raised while declaring or assigning script attributes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("attribute name '{name}' is reserved")]
    Reserved { name: String },

    #[error("attribute '{name}' is already declared")]
    Duplicate { name: String },

    #[error("attribute '{name}' is not declared")]
    Unknown { name: String },

    #[error("attribute '{name}' expects {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: AttributeType,
        found: &'static str,
    },

    #[error("attribute '{name}' has an invalid raw value: {reason}")]
    InvalidRaw { name: String, reason: String },
}

/// Errors raised by the notification bus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("unknown script event '{topic}'")]
    UnknownEvent { topic: String },
}
