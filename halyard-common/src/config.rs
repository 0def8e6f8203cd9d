//! Service configuration loaded from a TOML file.
//!
//! This is bootstrap configuration only: where the document store lives,
//! how often the queue drains, where operational errors are reported.
//! Operational knobs that change at runtime (processing gates, transporter
//! options, whitelists) live in the per-domain settings documents inside
//! the store itself.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while locating or parsing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("HALYARD_CONFIG points to non-existent file: {0}")]
    EnvPathMissing(PathBuf),

    #[error("no configuration file found (tried HALYARD_CONFIG, {0})")]
    NotFound(String),
}

/// Top-level halyard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HalyardConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub reporter: ReporterConfig,

    /// Hostname announced in the SMTP EHLO command.
    #[serde(default = "default_hello_name")]
    pub hello_name: String,
}

/// Which document store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// In-memory store; state is lost on restart.
    Memory,
    /// One JSON file per document under `store.root`.
    File,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_kind")]
    pub kind: StoreKind,

    /// Root directory for the file backend.
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// How often the email queue is drained (in seconds).
    #[serde(default = "default_drain_interval")]
    pub drain_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReporterConfig {
    /// Webhook endpoint for operational error summaries. When unset,
    /// summaries are only logged.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Application name prefixed to every reported summary.
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

const fn default_drain_interval() -> u64 {
    60
}

const fn default_store_kind() -> StoreKind {
    StoreKind::File
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./halyard-data")
}

fn default_app_name() -> String {
    "halyard".to_string()
}

fn default_hello_name() -> String {
    "halyard.local".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: default_store_kind(),
            root: default_store_root(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            drain_interval_secs: default_drain_interval(),
        }
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            app_name: default_app_name(),
        }
    }
}

impl HalyardConfig {
    /// Load configuration from an explicit path.
    pub fn from_path(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from the conventional locations.
    pub fn discover() -> Result<Self, ConfigError> {
        Self::from_path(&find_config_file()?)
    }
}

/// Find the configuration file using the following precedence:
/// 1. `HALYARD_CONFIG` environment variable
/// 2. `./halyard.toml` (current working directory)
/// 3. `/etc/halyard/halyard.toml` (system-wide config)
pub fn find_config_file() -> Result<PathBuf, ConfigError> {
    if let Ok(env_path) = std::env::var("HALYARD_CONFIG") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::EnvPathMissing(path));
    }

    let default_paths = [
        PathBuf::from("./halyard.toml"),
        PathBuf::from("/etc/halyard/halyard.toml"),
    ];

    for path in &default_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let tried = default_paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(ConfigError::NotFound(tried))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: HalyardConfig = toml::from_str("").expect("parse");
        assert_eq!(config.store.kind, StoreKind::File);
        assert_eq!(config.service.drain_interval_secs, 60);
        assert_eq!(config.reporter.app_name, "halyard");
        assert!(config.reporter.webhook_url.is_none());
        assert_eq!(config.hello_name, "halyard.local");
    }

    #[test]
    fn full_config_parses() {
        let config: HalyardConfig = toml::from_str(
            r#"
            hello_name = "relay.example.org"

            [store]
            kind = "memory"

            [service]
            drain_interval_secs = 15

            [reporter]
            webhook_url = "https://hooks.example.org/ops"
            app_name = "halyard-staging"
            "#,
        )
        .expect("parse");

        assert_eq!(config.store.kind, StoreKind::Memory);
        assert_eq!(config.service.drain_interval_secs, 15);
        assert_eq!(
            config.reporter.webhook_url.as_deref(),
            Some("https://hooks.example.org/ops")
        );
        assert_eq!(config.reporter.app_name, "halyard-staging");
        assert_eq!(config.hello_name, "relay.example.org");
    }
}
