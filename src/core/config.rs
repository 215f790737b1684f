//! Bridge configuration with documented defaults
//!
//! Values come from an optional TOML file, then `RTE_BRIDGE_*` environment
//! variables override individual fields.

use crate::core::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Identity of the learner the host has authenticated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    /// Stable learner identifier, used as the xAPI account name
    pub id: String,

    /// Display name, formatted "Last, First" for SCORM 1.2 content
    pub name: String,

    /// Home page of the account system that issued `id`
    pub home_page: String,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            id: "learner".into(),
            name: "Learner".into(),
            home_page: "http://localhost:8080".into(),
        }
    }
}

/// Configuration for the runtime bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    // === BACKEND ===
    /// Base URL of the host backend API (no trailing slash)
    pub api_base: String,

    /// Origin that serves unpacked package files
    ///
    /// Launch URLs built from `directoryPath + launchFile` are resolved
    /// against this base.
    pub content_base: String,

    /// xAPI endpoint handed to cmi5 content as the `endpoint` parameter
    pub lrs_endpoint: String,

    /// Path of the cmi5 launch negotiation endpoint, relative to `api_base`
    pub init_launch_path: String,

    /// Path of the progress-save endpoint; `{packageId}` is substituted
    pub progress_path: String,

    /// Path of the package metadata endpoint; `{packageId}` is substituted
    pub metadata_path: String,

    /// Bearer token sent to the backend, if any
    pub auth_token: Option<String>,

    // === TIMING ===
    /// Interval between API publish passes (milliseconds)
    ///
    /// Content can load before or after the host is ready. Re-publishing on
    /// this interval bounds how long content waits to find the API.
    pub attach_interval_ms: u64,

    /// Interval between progress saves while content is running (milliseconds)
    pub progress_interval_ms: u64,

    // === DEBUGGING ===
    /// Number of API calls retained by the call logger
    pub call_log_capacity: usize,

    pub learner: LearnerConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080/api".into(),
            content_base: "http://localhost:8080/uploads/".into(),
            lrs_endpoint: "http://localhost:8080/api/lrs".into(),
            init_launch_path: "/cmi5/init-launch".into(),
            progress_path: "/progress/{packageId}".into(),
            metadata_path: "/packages/{packageId}".into(),
            auth_token: None,
            attach_interval_ms: 500,
            progress_interval_ms: 5000,
            call_log_capacity: 100,
            learner: LearnerConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text; missing fields keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, apply environment overrides, and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `RTE_BRIDGE_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("RTE_BRIDGE_API_BASE") {
            self.api_base = v;
        }
        if let Some(v) = lookup("RTE_BRIDGE_CONTENT_BASE") {
            self.content_base = v;
        }
        if let Some(v) = lookup("RTE_BRIDGE_LRS_ENDPOINT") {
            self.lrs_endpoint = v;
        }
        if let Some(v) = lookup("RTE_BRIDGE_AUTH_TOKEN") {
            self.auth_token = Some(v);
        }
        if let Some(v) = lookup("RTE_BRIDGE_LEARNER_ID") {
            self.learner.id = v;
        }
        if let Some(v) = lookup("RTE_BRIDGE_LEARNER_NAME") {
            self.learner.name = v;
        }
        if let Some(ms) = lookup("RTE_BRIDGE_ATTACH_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.attach_interval_ms = ms;
        }
        if let Some(ms) = lookup("RTE_BRIDGE_PROGRESS_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.progress_interval_ms = ms;
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.attach_interval_ms == 0 || self.progress_interval_ms == 0 {
            return Err(BridgeError::Config("intervals must be positive".into()));
        }

        if self.call_log_capacity == 0 {
            return Err(BridgeError::Config(
                "call_log_capacity must be at least 1".into(),
            ));
        }

        for (name, value) in [("api_base", &self.api_base), ("lrs_endpoint", &self.lrs_endpoint)] {
            url::Url::parse(value)
                .map_err(|e| BridgeError::Url(format!("{} ({}): {}", name, value, e)))?;
        }

        Ok(())
    }

    pub fn attach_interval(&self) -> Duration {
        Duration::from_millis(self.attach_interval_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Absolute URL of a backend path, with `{packageId}` substituted
    pub fn endpoint_url(&self, path: &str, package_id: &str) -> String {
        format!(
            "{}{}",
            self.api_base.trim_end_matches('/'),
            path.replace("{packageId}", package_id)
        )
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<BridgeConfig> = OnceLock::new();

/// Get the global bridge config (initializes with defaults if not set)
pub fn config() -> &'static BridgeConfig {
    CONFIG.get_or_init(BridgeConfig::default)
}

/// Set the global bridge config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: BridgeConfig) -> std::result::Result<(), BridgeConfig> {
    CONFIG.set(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.attach_interval(), Duration::from_millis(500));
        assert_eq!(config.progress_interval(), Duration::from_secs(5));
        assert_eq!(config.call_log_capacity, 100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BridgeConfig::from_toml_str(
            r#"
            api_base = "https://lms.example.com/api"

            [learner]
            id = "u-42"
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base, "https://lms.example.com/api");
        assert_eq!(config.learner.id, "u-42");
        assert_eq!(config.learner.name, "Learner");
        assert_eq!(config.attach_interval_ms, 500);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = BridgeConfig {
            attach_interval_ms: 0,
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_bad_url_rejected() {
        let result = BridgeConfig::from_toml_str(r#"lrs_endpoint = "not a url""#);
        match result {
            Err(BridgeError::Url(msg)) => assert!(msg.starts_with("lrs_endpoint")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("RTE_BRIDGE_LRS_ENDPOINT", "https://lrs.example.com/xapi"),
            ("RTE_BRIDGE_PROGRESS_INTERVAL_MS", "2500"),
            ("RTE_BRIDGE_ATTACH_INTERVAL_MS", "nope"),
        ]
        .into_iter()
        .collect();

        let mut config = BridgeConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.lrs_endpoint, "https://lrs.example.com/xapi");
        assert_eq!(config.progress_interval_ms, 2500);
        assert_eq!(config.attach_interval_ms, 500);
    }

    #[test]
    fn test_endpoint_url() {
        let config = BridgeConfig {
            api_base: "http://h/api/".into(),
            ..BridgeConfig::default()
        };
        assert_eq!(
            config.endpoint_url("/progress/{packageId}", "p1"),
            "http://h/api/progress/p1"
        );
    }
}
