//! Scheduler settings

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Script runtime settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    pub scheduler: SchedulerSettings,
    /// Initial preloading flag of a [`ScriptSystem`](crate::ScriptSystem).
    pub start_preloading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Disable a script whose callback returned an error.
    pub disable_on_error: bool,
    /// Warn when a failing script's `on_error` did not handle the error.
    pub log_unhandled_errors: bool,
    pub late_binding: LateBinding,
}

/// Where an awaiting script lands once its type is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateBinding {
    /// Index recorded at request time, clamped to the current instance count.
    #[default]
    RecordedIndex,
    /// End of the instance list.
    Append,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            disable_on_error: true,
            log_unhandled_errors: true,
            late_binding: LateBinding::RecordedIndex,
        }
    }
}

impl ScriptSettings {
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("invalid script settings")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            ScriptSettings::from_json_str(r#"{ "scheduler": { "late_binding": "append" } }"#)
                .unwrap();
        assert_eq!(settings.scheduler.late_binding, LateBinding::Append);
        assert!(settings.scheduler.disable_on_error);
        assert!(settings.scheduler.log_unhandled_errors);
        assert!(!settings.start_preloading);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ScriptSettings::from_json_str("{ \"scheduler\": 3 }").is_err());
    }
}
