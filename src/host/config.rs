//! Host Configuration
//!
//! Configuration options for a [`Hookable`](super::Hookable) host.

use serde::{Deserialize, Serialize};

use crate::core::HookResult;

/// Configuration for a hookable host
///
/// Use the builder pattern to configure the host:
///
/// ```ignore
/// let config = HookConfig::new("store")
///     .with_trace_transitions(true)
///     .with_log_registrations(false);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookConfig {
    /// Host name used in log lines
    #[serde(default = "default_label")]
    pub label: String,

    /// Whether to log every chain state transition at debug level
    #[serde(default)]
    pub trace_transitions: bool,

    /// Whether to log hook registration and removal at info level
    #[serde(default = "default_log_registrations")]
    pub log_registrations: bool,
}

fn default_label() -> String {
    "host".to_string()
}

fn default_log_registrations() -> bool {
    true
}

impl HookConfig {
    /// Create a configuration for a host with the given label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            trace_transitions: false,
            log_registrations: true,
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> HookResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Enable or disable transition tracing
    pub fn with_trace_transitions(mut self, enabled: bool) -> Self {
        self.trace_transitions = enabled;
        self
    }

    /// Enable or disable registration logging
    pub fn with_log_registrations(mut self, enabled: bool) -> Self {
        self.log_registrations = enabled;
        self
    }
}

impl Default for HookConfig {
    fn default() -> Self {
        Self::new(default_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HookConfig::default();
        assert_eq!(config.label, "host");
        assert!(!config.trace_transitions);
        assert!(config.log_registrations);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = HookConfig::from_json(r#"{"trace_transitions": true}"#).unwrap();
        assert_eq!(config, HookConfig::default().with_trace_transitions(true));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(HookConfig::from_json("{not json").is_err());
    }
}
