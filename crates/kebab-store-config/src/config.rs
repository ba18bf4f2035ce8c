// crates/kebab-store-config/src/config.rs
// ============================================================================
// Module: Kebab Store Configuration
// Description: Configuration loading and validation for the store backends.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: kebab-store-core, kebab-store-sqlite, etcetera, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with size and path limits. The
//! `[store]` table selects the backend (`relational`, `file`, or `memory`) and
//! carries its settings. A missing or unknown backend fails closed.
//!
//! ```toml
//! [store]
//! backend = "relational"
//! path = "data/kebab.sqlite"
//! journal_mode = "wal"
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use etcetera::BaseStrategy;
use kebab_store_core::StoreError;
use kebab_store_sqlite::DEFAULT_BUSY_TIMEOUT_MS;
use kebab_store_sqlite::SqliteGatewayConfig;
use kebab_store_sqlite::SqliteJournalMode;
use kebab_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "kebab-store.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "KEBAB_STORE_CONFIG";
/// Directory created under the per-user data directory for file tables.
const DEFAULT_DATA_SUBDIR: &str = "kebab-store";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config Root
// ============================================================================

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KebabStoreConfig {
    /// Backend selection and settings.
    #[serde(default)]
    pub store: StoreConfig,
}

impl KebabStoreConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then `KEBAB_STORE_CONFIG`, then
    /// `kebab-store.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()
    }
}

// ============================================================================
// SECTION: Store Config
// ============================================================================

/// Backend kind selected by `store.backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// `SQLite` table gateway.
    Relational,
    /// Flat-file table store.
    File,
    /// Volatile in-memory tables.
    Memory,
}

impl BackendKind {
    /// Returns the configuration label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

/// Backend selection and backend-specific settings.
///
/// # Invariants
/// - `relational` requires `path` and rejects `root`.
/// - `file` rejects `path`; `root` defaults to the per-user data directory.
/// - `memory` rejects both `path` and `root`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Selected backend; required.
    #[serde(default)]
    pub backend: Option<BackendKind>,
    /// Directory holding table files for the file backend.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// `SQLite` database path for the relational backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: None,
            root: None,
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Creates a config selecting `backend` with default settings.
    #[must_use]
    pub fn with_backend(backend: BackendKind) -> Self {
        Self {
            backend: Some(backend),
            ..Self::default()
        }
    }

    /// Returns the selected backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when no backend is set.
    pub fn backend_kind(&self) -> Result<BackendKind, ConfigError> {
        self.backend
            .ok_or_else(|| ConfigError::Invalid("store.backend must be set".to_string()))
    }

    /// Validates backend-specific settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when settings conflict with the backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backend_kind()? {
            BackendKind::Relational => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("relational store requires store.path".to_string())
                })?;
                if self.root.is_some() {
                    return Err(ConfigError::Invalid(
                        "relational store must not set store.root".to_string(),
                    ));
                }
                if self.busy_timeout_ms == 0 {
                    return Err(ConfigError::Invalid(
                        "store.busy_timeout_ms must be greater than zero".to_string(),
                    ));
                }
                validate_path(path)
            }
            BackendKind::File => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "file store must not set store.path".to_string(),
                    ));
                }
                self.root.as_deref().map_or(Ok(()), validate_path)
            }
            BackendKind::Memory => {
                if self.path.is_some() || self.root.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory store must not set store.path or store.root".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Returns the file backend root, defaulting to the per-user data directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when no home directory can be determined.
    pub fn file_root(&self) -> Result<PathBuf, ConfigError> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        default_data_root()
    }

    /// Returns the `SQLite` gateway settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `store.path` is missing.
    pub fn sqlite(&self) -> Result<SqliteGatewayConfig, ConfigError> {
        let path = self.path.clone().ok_or_else(|| {
            ConfigError::Invalid("relational store requires store.path".to_string())
        })?;
        Ok(SqliteGatewayConfig {
            path,
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        })
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for StoreError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid("path must be non-empty".to_string()));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("path component too long".to_string()));
        }
    }
    Ok(())
}

/// Returns `<data_dir>/kebab-store` for the current user.
fn default_data_root() -> Result<PathBuf, ConfigError> {
    let strategy = etcetera::choose_base_strategy()
        .map_err(|err| ConfigError::Io(format!("cannot resolve data directory: {err}")))?;
    Ok(strategy.data_dir().join(DEFAULT_DATA_SUBDIR))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn long_component_is_rejected() {
        let path = PathBuf::from("a".repeat(MAX_PATH_COMPONENT_LENGTH + 1));
        assert!(validate_path(&path).is_err());
    }

    #[test]
    fn explicit_path_wins_over_defaults() {
        let resolved = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("custom.toml"));
    }

    #[test]
    fn explicit_root_skips_data_dir_lookup() {
        let config = StoreConfig {
            root: Some(PathBuf::from("tables")),
            ..StoreConfig::with_backend(BackendKind::File)
        };
        assert_eq!(config.file_root().unwrap(), PathBuf::from("tables"));
    }
}
