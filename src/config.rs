//! Configuration for a [`Notifier`](crate::Notifier).
//!
//! The notifier itself has no tunables that change its semantics. The
//! configuration only labels an instance so its tracing span and metric
//! attributes can be told apart from other notifiers in the same process.

use serde::{Deserialize, Serialize};

/// Name used when none is given.
pub const DEFAULT_NAME: &str = "notifier";

/// Notifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Label for the coordinator span and metric attributes
    pub name: String,
}

impl NotifierConfig {
    /// Create a configuration with the given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NotifierConfig::default();
        assert_eq!(config.name, "notifier");
    }

    #[test]
    fn test_with_name() {
        let config = NotifierConfig::with_name("jobs");
        assert_eq!(config.name, "jobs");
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: NotifierConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, NotifierConfig::default());

        let config: NotifierConfig = serde_json::from_str(r#"{"name":"mail"}"#).unwrap();
        assert_eq!(config.name, "mail");
    }
}
