//! Configuration file parser for ~/.config/taskflow/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, but each one is logged as a warning so
//! typos do not go unnoticed.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::view::SortKey;

/// Environment variable that overrides `service.public_key`.
pub const PUBLIC_KEY_ENV: &str = "TASKFLOW_PUBLIC_KEY";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// Every field has a default, so any subset of keys can be given.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial sort order of the task list.
    pub default_sort: SortKey,

    /// Ask before deleting a task or category.
    pub confirm_deletes: bool,

    /// Maximum number of tasks fetched on load.
    pub page_size: u32,

    pub service: ServiceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_sort: SortKey::DueDate,
            confirm_deletes: true,
            page_size: 100,
            service: ServiceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Http,
}

/// `[service]` table: which record service to use and how to reach it.
///
/// Debug output masks `public_key`.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub backend: Backend,

    /// SQLite file; defaults to `tasks.db` in the config directory.
    pub database: Option<PathBuf>,

    pub endpoint: Option<String>,

    pub project_id: Option<String>,

    /// Bearer key for the hosted service. `TASKFLOW_PUBLIC_KEY` takes precedence.
    pub public_key: Option<String>,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("backend", &self.backend)
            .field("database", &self.database)
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("public_key", &self.public_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ServiceConfig {
    /// Resolve the public key, preferring the environment over the file.
    pub fn public_key(&self) -> Option<SecretString> {
        self.public_key_with(std::env::var(PUBLIC_KEY_ENV).ok())
    }

    fn public_key_with(&self, env: Option<String>) -> Option<SecretString> {
        env.filter(|k| !k.trim().is_empty())
            .or_else(|| self.public_key.clone())
            .map(SecretString::from)
    }
}

const KNOWN_KEYS: [&str; 4] = ["default_sort", "confirm_deletes", "page_size", "service"];
const KNOWN_SERVICE_KEYS: [&str; 5] = ["backend", "database", "endpoint", "project_id", "public_key"];

impl Config {
    /// Maximum config file size (1 MiB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            warn_unknown_keys(&raw);
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            backend = ?config.service.backend,
            sort = %config.default_sort.as_str(),
            "Loaded configuration"
        );
        Ok(config)
    }
}

fn warn_unknown_keys(raw: &toml::Table) {
    for key in raw.keys() {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
        }
    }
    if let Some(toml::Value::Table(service)) = raw.get("service") {
        for key in service.keys() {
            if !KNOWN_SERVICE_KEYS.contains(&key.as_str()) {
                tracing::warn!(key = %format!("service.{}", key), "Unknown key in config file, ignoring");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
