//! Journal-recording scripts shared by the unit tests.

use crate::context::ScriptContext;
use crate::script::{Capabilities, Script, ScriptMethod, ScriptResult, ScriptType};
use crate::types::ScriptTypeRegistry;
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) type Journal = Rc<RefCell<Vec<String>>>;

type Hook = Rc<dyn Fn(&mut ScriptContext<'_>) -> ScriptResult>;

pub(crate) fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub(crate) fn entries(journal: &Journal) -> Vec<String> {
    journal.borrow().clone()
}

pub(crate) fn every_callback() -> Capabilities {
    Capabilities::all()
}

/// Records `<name>.<callback>` for every callback. `counter` is transient state that
/// survives a swap.
pub(crate) struct Recorder {
    name: String,
    journal: Journal,
    hook: Option<Hook>,
    pub(crate) counter: u32,
}

impl Recorder {
    fn record(&self, what: &str) {
        self.journal.borrow_mut().push(format!("{}.{what}", self.name));
    }
}

impl Script for Recorder {
    fn initialize(&mut self, _ctx: &mut ScriptContext<'_>) -> ScriptResult {
        self.record("initialize");
        Ok(())
    }

    fn post_initialize(&mut self, _ctx: &mut ScriptContext<'_>) -> ScriptResult {
        self.record("post_initialize");
        Ok(())
    }

    fn update(&mut self, ctx: &mut ScriptContext<'_>, _dt: f32) -> ScriptResult {
        self.record("update");
        self.counter += 1;
        match &self.hook {
            Some(hook) => hook(ctx),
            None => Ok(()),
        }
    }

    fn post_update(&mut self, _ctx: &mut ScriptContext<'_>, _dt: f32) -> ScriptResult {
        self.record("post_update");
        Ok(())
    }

    fn swap(&mut self, _ctx: &mut ScriptContext<'_>, old: &mut dyn Script) -> ScriptResult {
        self.record("swap");
        if let Some(old) = (*old).as_any().downcast_ref::<Recorder>() {
            self.counter = old.counter;
        }
        Ok(())
    }

    fn destroy(&mut self, _ctx: &mut ScriptContext<'_>) -> ScriptResult {
        self.record("destroy");
        Ok(())
    }

    fn on_state(&mut self, enabled: bool) {
        self.record(if enabled { "enable" } else { "disable" });
    }

    fn on_error(&mut self, method: ScriptMethod, _error: &anyhow::Error) -> bool {
        self.record(&format!("error:{method}"));
        false
    }
}

pub(crate) fn recorder(name: &str, journal: &Journal, capabilities: Capabilities) -> ScriptType {
    build(name, journal, capabilities, None)
}

/// Recorder whose `update` runs `hook` after recording.
pub(crate) fn recorder_with<F>(
    name: &str,
    journal: &Journal,
    capabilities: Capabilities,
    hook: F,
) -> ScriptType
where
    F: Fn(&mut ScriptContext<'_>) -> ScriptResult + 'static,
{
    build(name, journal, capabilities, Some(Rc::new(hook)))
}

fn build(
    name: &str,
    journal: &Journal,
    capabilities: Capabilities,
    hook: Option<Hook>,
) -> ScriptType {
    let script_name = name.to_string();
    let journal = Rc::clone(journal);
    ScriptType::new(name, move || Recorder {
        name: script_name.clone(),
        journal: Rc::clone(&journal),
        hook: hook.clone(),
        counter: 0,
    })
    .capabilities(capabilities)
}

/// Registry with one recorder per name, each implementing every callback.
pub(crate) fn registry_with(names: &[&str], journal: &Journal) -> ScriptTypeRegistry {
    let types = ScriptTypeRegistry::new();
    for name in names {
        types.register(recorder(name, journal, every_callback()));
    }
    types
}
