//! Process configuration.
//!
//! # Responsibility
//! - Describe where forms are stored, which backend stores them, and how
//!   logging is set up.
//! - Read `FORMCANVAS_*` environment overrides into an explicit value that
//!   callers pass down; nothing here is global.

use crate::repo::file_repo::StorageRoot;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_STORAGE_ROOT: &str = "FORMCANVAS_STORAGE_ROOT";
pub const ENV_BACKEND: &str = "FORMCANVAS_BACKEND";
pub const ENV_LOG_LEVEL: &str = "FORMCANVAS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "FORMCANVAS_LOG_DIR";

/// Storage root used when nothing is configured.
pub const DEFAULT_STORAGE_ROOT: &str = "data/forms";
const SQLITE_FILE_NAME: &str = "forms.sqlite3";

/// Which `FormRepository` implementation backs the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// One JSON document per form under the storage root.
    #[default]
    File,
    /// `forms.sqlite3` inside the storage root.
    Sqlite,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(Self::File),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::InvalidBackend(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Sqlite => "sqlite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub storage_root: PathBuf,
    pub backend: StorageBackend,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: &'static str,
    /// Absolute directory for rolling log files; `None` disables file logs.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            backend: StorageBackend::default(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by `FORMCANVAS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(root) = lookup(ENV_STORAGE_ROOT) {
            config.storage_root = non_empty_path(&root)?;
        }
        if let Some(backend) = lookup(ENV_BACKEND) {
            config.backend = StorageBackend::parse(&backend)?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level)?;
        }
        if let Some(log_dir) = lookup(ENV_LOG_DIR).filter(|value| !value.trim().is_empty()) {
            config.log_dir = Some(absolute_path(&log_dir)?);
        }

        Ok(config)
    }

    /// Storage handle for the file backend.
    pub fn storage_root(&self) -> StorageRoot {
        StorageRoot::new(self.storage_root.clone())
    }

    /// Database location for the SQLite backend.
    pub fn sqlite_path(&self) -> PathBuf {
        self.storage_root.join(SQLITE_FILE_NAME)
    }
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Maps a user-supplied level onto the canonical names.
pub fn normalize_level(level: &str) -> Result<&'static str, ConfigError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(ConfigError::InvalidLogLevel(other.to_string())),
    }
}

fn non_empty_path(value: &str) -> Result<PathBuf, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyStorageRoot);
    }
    Ok(PathBuf::from(trimmed))
}

fn absolute_path(value: &str) -> Result<PathBuf, ConfigError> {
    let path = PathBuf::from(value.trim());
    if !path.is_absolute() {
        return Err(ConfigError::RelativeLogDir(value.trim().to_string()));
    }
    Ok(path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidBackend(String),
    InvalidLogLevel(String),
    EmptyStorageRoot,
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBackend(value) => {
                write!(f, "unsupported storage backend `{value}`; expected file|sqlite")
            }
            Self::InvalidLogLevel(value) => write!(
                f,
                "unsupported log level `{value}`; expected trace|debug|info|warn|error"
            ),
            Self::EmptyStorageRoot => write!(f, "storage root cannot be empty"),
            Self::RelativeLogDir(value) => {
                write!(f, "log_dir must be an absolute path, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}
