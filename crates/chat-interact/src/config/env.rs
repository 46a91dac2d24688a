//! Environment-based configuration.

use std::collections::HashMap;
use std::time::Duration;

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "CHAT_INTERACT";

/// Environment variable reader.
///
/// Values set with [`EnvConfig::with_var`] shadow the process environment, which keeps tests
/// independent of the real environment.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
    /// Values that take precedence over the process environment.
    overrides: HashMap<String, String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a new environment config reader.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides: HashMap::new(),
        }
    }

    /// Build the full environment variable name.
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Shadow a variable.
    #[must_use]
    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        let var_name = self.var_name(name);
        self.overrides.insert(var_name, value.into());
        self
    }

    /// Get a string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let var_name = self.var_name(name);
        self.overrides
            .get(&var_name)
            .cloned()
            .or_else(|| std::env::var(&var_name).ok())
    }

    /// Get a parsed value.
    #[must_use]
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.trim().parse().ok())
    }

    /// Get a boolean value.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| {
            matches!(
                v.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on" | "enabled"
            )
        })
    }

    /// Get a duration in seconds. `0` means "no timeout" and yields `Some(None)`.
    #[must_use]
    pub fn timeout_secs(&self, name: &str) -> Option<Option<Duration>> {
        self.parse::<u64>(name)
            .map(|secs| (secs > 0).then(|| Duration::from_secs(secs)))
    }

    /// Check if a variable is set.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Variable names read by [`InteractConfig::apply_env`](super::InteractConfig::apply_env).
pub mod vars {
    /// Session inactivity timeout in seconds (`0` disables it).
    pub const TIMEOUT: &str = "TIMEOUT";
    /// Delete session messages when they end.
    pub const DELETE_AFTER: &str = "DELETE_AFTER";
    /// Clear all reactions on cleanup.
    pub const CLEAR_REACTIONS: &str = "CLEAR_REACTIONS";
    /// Prompt timeout in seconds (`0` disables it).
    pub const PROMPT_TIMEOUT: &str = "PROMPT_TIMEOUT";
    /// Fail prompts on timeout.
    pub const PROMPT_STRICT: &str = "PROMPT_STRICT";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_config_prefix() {
        let config = EnvConfig::new("TEST");
        assert_eq!(config.var_name("foo"), "TEST_FOO");
        assert_eq!(config.var_name("bar_baz"), "TEST_BAR_BAZ");
        assert_eq!(EnvConfig::default().var_name("timeout"), "CHAT_INTERACT_TIMEOUT");
    }

    #[test]
    fn env_bool_parsing() {
        let config = EnvConfig::new("CHAT_INTERACT_ENV_TEST")
            .with_var("ENABLED", "Yes")
            .with_var("DISABLED", "off");

        assert_eq!(config.bool("ENABLED"), Some(true));
        assert_eq!(config.bool("DISABLED"), Some(false));
        assert_eq!(config.bool("MISSING"), None);
    }

    #[test]
    fn env_timeouts() {
        let config = EnvConfig::new("CHAT_INTERACT_ENV_TEST")
            .with_var(vars::TIMEOUT, "45")
            .with_var(vars::PROMPT_TIMEOUT, "0")
            .with_var("BROKEN", "soon");

        assert_eq!(
            config.timeout_secs(vars::TIMEOUT),
            Some(Some(Duration::from_secs(45)))
        );
        assert_eq!(config.timeout_secs(vars::PROMPT_TIMEOUT), Some(None));
        assert_eq!(config.timeout_secs("BROKEN"), None);
        assert!(config.is_set("BROKEN"));
    }
}
