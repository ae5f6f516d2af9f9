//! Cinder Script Scheduler
//!
//! Per-entity script lifecycle management for a component-based engine.
//!
//! ## Architecture
//!
//! - **Types:** [`ScriptType`] factories live in a shared [`ScriptTypeRegistry`]; re-registering
//!   a name hot swaps live instances that opted into [`Capabilities::SWAP`]
//! - **Scheduler:** one [`ScriptScheduler`] per entity owns its instances, their execution
//!   order and the update/post-update [`OrderedCallbackList`]s
//! - **System:** [`ScriptSystem`] drives every enabled component each frame
//!
//! Callbacks may create, destroy, move or swap scripts (including themselves) mid-pass.
//! Destroys requested while a pass is running are unlinked once the outermost pass ends.

pub mod attributes;
pub mod callback_list;
pub mod context;
pub mod error;
pub mod events;
pub mod handle;
pub mod registry;
pub mod scheduler;
pub mod script;
pub mod settings;
pub mod system;
pub mod types;

#[cfg(test)]
mod test_support;

pub use attributes::{
    AttributeDef, AttributeSchema, AttributeType, AttributeValue, Attributes, RawAttributes,
};
pub use callback_list::OrderedCallbackList;
pub use context::ScriptContext;
pub use error::{AttributeError, EventError, SchedulerError};
pub use events::{EventKind, ListenerId, ScriptEvent, ScriptEvents};
pub use handle::ScriptHandle;
pub use registry::{AwaitingScript, IndexEntry, InstanceRegistry, SwapHook};
pub use scheduler::{
    AttributeSource, CreateArgs, DuplicatedEntities, InstanceState, LifecyclePhase,
    ScriptScheduler,
};
pub use script::{Capabilities, Script, ScriptMethod, ScriptResult, ScriptType};
pub use settings::{LateBinding, SchedulerSettings, ScriptSettings};
pub use system::{ScriptStats, ScriptSystem};
pub use types::{Registration, ScriptTypeRegistry};
