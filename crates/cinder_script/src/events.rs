//! Scheduler notification surface.
//!
//! Observers subscribe by topic string: a bare kind (`"create"`), a kind qualified with a
//! script name (`"create:rotator"`) or `"*"` for everything. Script names are type
//! names, so the qualified form is also the type-qualified form. Listeners only observe;
//! they get no access to the scheduler and cannot mutate the instance set.

use crate::error::EventError;
use crate::handle::ScriptHandle;
use crate::script::ScriptMethod;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Create,
    Destroy,
    Move,
    Swap,
    Error,
    Enable,
    Disable,
    State,
    Remove,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Create => "create",
            EventKind::Destroy => "destroy",
            EventKind::Move => "move",
            EventKind::Swap => "swap",
            EventKind::Error => "error",
            EventKind::Enable => "enable",
            EventKind::Disable => "disable",
            EventKind::State => "state",
            EventKind::Remove => "remove",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EventError;

    fn from_str(topic: &str) -> Result<Self, Self::Err> {
        Ok(match topic {
            "create" => EventKind::Create,
            "destroy" => EventKind::Destroy,
            "move" => EventKind::Move,
            "swap" => EventKind::Swap,
            "error" => EventKind::Error,
            "enable" => EventKind::Enable,
            "disable" => EventKind::Disable,
            "state" => EventKind::State,
            "remove" => EventKind::Remove,
            _ => {
                return Err(EventError::UnknownEvent {
                    topic: topic.to_string(),
                })
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEvent {
    Created {
        name: String,
        handle: ScriptHandle,
    },
    /// `handle` is `None` when an awaiting request was cancelled.
    Destroyed {
        name: String,
        handle: Option<ScriptHandle>,
    },
    Moved {
        name: String,
        handle: ScriptHandle,
        to: usize,
        from: usize,
    },
    Swapped {
        name: String,
        old: ScriptHandle,
        new: ScriptHandle,
    },
    Error {
        name: String,
        handle: ScriptHandle,
        method: ScriptMethod,
        message: String,
    },
    Enabled,
    Disabled,
    StateChanged {
        enabled: bool,
    },
    Removed,
}

impl ScriptEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ScriptEvent::Created { .. } => EventKind::Create,
            ScriptEvent::Destroyed { .. } => EventKind::Destroy,
            ScriptEvent::Moved { .. } => EventKind::Move,
            ScriptEvent::Swapped { .. } => EventKind::Swap,
            ScriptEvent::Error { .. } => EventKind::Error,
            ScriptEvent::Enabled => EventKind::Enable,
            ScriptEvent::Disabled => EventKind::Disable,
            ScriptEvent::StateChanged { .. } => EventKind::State,
            ScriptEvent::Removed => EventKind::Remove,
        }
    }

    /// Script the event is about, for the `<kind>:<name>` topics.
    pub fn script_name(&self) -> Option<&str> {
        match self {
            ScriptEvent::Created { name, .. }
            | ScriptEvent::Destroyed { name, .. }
            | ScriptEvent::Moved { name, .. }
            | ScriptEvent::Swapped { name, .. } => Some(name),
            // errors are aggregate only
            _ => None,
        }
    }
}

impl fmt::Display for ScriptEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptEvent::Created { name, handle } => write!(f, "create {name} ({handle})"),
            ScriptEvent::Destroyed { name, handle } => match handle {
                Some(handle) => write!(f, "destroy {name} ({handle})"),
                None => write!(f, "destroy {name} (awaiting)"),
            },
            ScriptEvent::Moved { name, to, from, .. } => write!(f, "move {name} {from}->{to}"),
            ScriptEvent::Swapped { name, old, new } => write!(f, "swap {name} {old}->{new}"),
            ScriptEvent::Error {
                name,
                method,
                message,
                ..
            } => write!(f, "error {name}.{method}: {message}"),
            ScriptEvent::Enabled => f.write_str("enable"),
            ScriptEvent::Disabled => f.write_str("disable"),
            ScriptEvent::StateChanged { enabled } => write!(f, "state {enabled}"),
            ScriptEvent::Removed => f.write_str("remove"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Topic {
    Any,
    Kind(EventKind),
    Named(EventKind, String),
}

impl Topic {
    fn parse(topic: &str) -> Result<Self, EventError> {
        if topic == "*" {
            return Ok(Topic::Any);
        }
        match topic.split_once(':') {
            Some((kind, name)) => Ok(Topic::Named(kind.parse()?, name.to_string())),
            None => Ok(Topic::Kind(topic.parse()?)),
        }
    }

    fn matches(&self, event: &ScriptEvent) -> bool {
        match self {
            Topic::Any => true,
            Topic::Kind(kind) => *kind == event.kind(),
            Topic::Named(kind, name) => {
                *kind == event.kind() && event.script_name() == Some(name.as_str())
            }
        }
    }
}

/// Subscription token returned by [`ScriptEvents::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    topic: Topic,
    callback: Box<dyn FnMut(&ScriptEvent)>,
}

#[derive(Default)]
pub struct ScriptEvents {
    listeners: Vec<Listener>,
    next_id: u64,
}

impl ScriptEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, topic: &str, callback: F) -> Result<ListenerId, EventError>
    where
        F: FnMut(&ScriptEvent) + 'static,
    {
        let topic = Topic::parse(topic)?;
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            topic,
            callback: Box::new(callback),
        });
        Ok(id)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        before != self.listeners.len()
    }

    /// Whether anyone listens to `topic` (exactly as subscribed).
    pub fn has_listeners(&self, topic: &str) -> bool {
        match Topic::parse(topic) {
            Ok(topic) => self.listeners.iter().any(|listener| listener.topic == topic),
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn emit(&mut self, event: ScriptEvent) {
        tracing::trace!(%event, "script event");
        for listener in self.listeners.iter_mut() {
            if listener.topic.matches(&event) {
                (listener.callback)(&event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn created(name: &str) -> ScriptEvent {
        ScriptEvent::Created {
            name: name.to_string(),
            handle: ScriptHandle::new(0, 0),
        }
    }

    #[test]
    fn plain_and_qualified_topics_both_fire() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut events = ScriptEvents::new();

        let log = Rc::clone(&seen);
        events.on("create", move |_| log.borrow_mut().push("create")).unwrap();
        let log = Rc::clone(&seen);
        events.on("create:rotator", move |_| log.borrow_mut().push("create:rotator")).unwrap();
        let log = Rc::clone(&seen);
        events.on("*", move |_| log.borrow_mut().push("*")).unwrap();

        events.emit(created("rotator"));
        events.emit(created("mover"));

        assert_eq!(
            *seen.borrow(),
            vec!["create", "create:rotator", "*", "create", "*"]
        );
    }

    #[test]
    fn unknown_topics_are_rejected_and_off_unsubscribes() {
        let mut events = ScriptEvents::new();
        assert!(matches!(
            events.on("explode", |_| {}),
            Err(EventError::UnknownEvent { .. })
        ));

        let id = events.on("destroy:mover", |_| {}).unwrap();
        assert!(events.has_listeners("destroy:mover"));
        assert!(!events.has_listeners("destroy"));
        assert!(events.off(id));
        assert!(!events.off(id));
        assert!(events.is_empty());
    }
}
