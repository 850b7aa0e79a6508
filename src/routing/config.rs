//! Routing configuration types.
//!
//! Provides [`RoutingConfig`] for the pool endpoint, the static default
//! backend, per-role default overrides, the probe timeout, and decision
//! cache bounds.  All fields have documented defaults, are (de)serialisable
//! via serde for TOML config files, and can be overlaid with environment
//! variables (`OLLAMA_URL`, `ROUTER_DEFAULT_MODEL`, `GENERAL_MODEL`).

use crate::RouterError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

// ── Default value functions ────────────────────────────────────────────

/// Default pool endpoint (a local Ollama server).
fn default_pool_url() -> String {
    "http://localhost:11434".to_string()
}

/// Default backend used when every other path is exhausted.
fn default_backend() -> String {
    "qwen2.5:7b".to_string()
}

/// Default availability probe timeout: 5000 ms.
fn default_probe_timeout_ms() -> u64 {
    5000
}

/// Default decision cache capacity: 1024 entries.
fn default_cache_capacity() -> usize {
    1024
}

/// Default decision cache time-to-live: 300 seconds.
fn default_cache_ttl_secs() -> u64 {
    300
}

// ── RoutingConfig ──────────────────────────────────────────────────────

/// Configuration for the routing layer.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RoutingConfig {
    /// Base URL of the model pool (Ollama-style HTTP API).
    #[serde(default = "default_pool_url")]
    pub pool_url: String,

    /// Backend used when fallback resolution is exhausted or routing
    /// fails internally.  Trusted: never re-probed.
    #[serde(default = "default_backend")]
    pub default_backend: String,

    /// Per-role default backend overrides, keyed by agent role name.
    #[serde(default)]
    pub role_defaults: BTreeMap<String, String>,

    /// Availability probe timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Decision cache bounds.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            pool_url: default_pool_url(),
            default_backend: default_backend(),
            role_defaults: BTreeMap::new(),
            probe_timeout_ms: default_probe_timeout_ms(),
            cache: CacheConfig::default(),
        }
    }
}

/// Decision cache sizing and expiry.
///
/// # Panics
///
/// This type never panics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of cached decisions; oldest evicted first.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Seconds a cached decision stays valid.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl RoutingConfig {
    /// Build a config from defaults plus environment overrides.
    ///
    /// Reads `OLLAMA_URL` for the pool endpoint and `ROUTER_DEFAULT_MODEL`
    /// (falling back to `GENERAL_MODEL`) for the default backend.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overlay environment variables onto this config.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            self.pool_url = url;
        }
        if let Ok(model) = std::env::var("ROUTER_DEFAULT_MODEL") {
            self.default_backend = model;
        } else if let Ok(model) = std::env::var("GENERAL_MODEL") {
            self.default_backend = model;
        }
        self
    }

    /// Load and validate a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ConfigError`] if the file cannot be read,
    /// fails to parse, or violates a semantic constraint.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RouterError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RouterError::ConfigError(format!("read {}: {e}", path.as_ref().display()))
        })?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| RouterError::ConfigError(format!("parse config: {e}")))?;
        let errors = validate(&config);
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(RouterError::ConfigError(errors.join("; ")))
        }
    }

    /// The default backend for an agent role, falling back to the global
    /// default when the role has no override.
    ///
    /// # Panics
    ///
    /// This function never panics.
    pub fn default_backend_for_role(&self, role: &str) -> &str {
        self.role_defaults
            .get(role)
            .map_or(self.default_backend.as_str(), String::as_str)
    }

    /// The probe timeout as a [`Duration`].
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// The cache TTL as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

/// Validate a [`RoutingConfig`], returning a list of human-readable errors.
///
/// # Arguments
///
/// * `config` — The routing configuration to validate.
///
/// # Returns
///
/// An empty `Vec` on success, or one error string per violated constraint.
///
/// # Panics
///
/// This function never panics.
pub fn validate(config: &RoutingConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if !config.pool_url.starts_with("http://") && !config.pool_url.starts_with("https://") {
        errors.push(format!(
            "pool_url must be an http(s) URL, got {:?}",
            config.pool_url
        ));
    }

    if config.default_backend.trim().is_empty() {
        errors.push("default_backend must not be empty".to_string());
    }

    if config.probe_timeout_ms == 0 || config.probe_timeout_ms > 60_000 {
        errors.push(format!(
            "probe_timeout_ms must be in (0, 60000], got {}",
            config.probe_timeout_ms
        ));
    }

    if config.cache.capacity == 0 {
        errors.push("cache.capacity must be >= 1".to_string());
    }

    if config.cache.ttl_secs == 0 {
        errors.push("cache.ttl_secs must be >= 1".to_string());
    }

    for (role, backend) in &config.role_defaults {
        if backend.trim().is_empty() {
            errors.push(format!("role_defaults.{role} must not be empty"));
        }
    }

    errors
}

/// Export the JSON Schema for [`RoutingConfig`], for IDE autocomplete on
/// config files.
///
/// # Panics
///
/// This function never panics.
pub fn json_schema() -> schemars::Schema {
    schemars::schema_for!(RoutingConfig)
}

// ── Tests ──────────────────────────────────────────────────────────────
