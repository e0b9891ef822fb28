//! Runtime configuration read from the process environment.
//!
//! # Responsibility
//! - Resolve backend choice, database path, logging and validation settings.
//! - Reject malformed values instead of silently falling back.
//!
//! # Invariants
//! - Unset or blank variables take their documented default.
//! - Parsing never reads the environment directly when a lookup is supplied.

use crate::logging::default_log_level;
use crate::model::validation::{ErrorMode, ValidationPolicy};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_BACKEND: &str = "THOUGHTS_BACKEND";
pub const ENV_DB_PATH: &str = "THOUGHTS_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "THOUGHTS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "THOUGHTS_LOG_DIR";
pub const ENV_VALIDATION_MODE: &str = "THOUGHTS_VALIDATION_MODE";
pub const ENV_STRICT_TAGS: &str = "THOUGHTS_STRICT_TAGS";

const DEFAULT_DB_FILE: &str = "thoughts.sqlite3";

/// Storage backend chosen at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    Memory,
    #[default]
    Sqlite,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    key: &'static str,
    value: String,
    expected: &'static str,
}

impl ConfigError {
    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid value `{}` for {}; expected {}",
            self.value, self.key, self.expected
        )
    }
}

impl Error for ConfigError {}

/// Settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub backend: Backend,
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is off when `None`.
    pub log_dir: Option<PathBuf>,
    pub validation: ValidationPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            validation: ValidationPolicy::default(),
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(value) = read(ENV_BACKEND) {
            config.backend = match value.to_ascii_lowercase().as_str() {
                "memory" => Backend::Memory,
                "sqlite" => Backend::Sqlite,
                _ => return Err(invalid(ENV_BACKEND, value, "memory|sqlite")),
            };
        }
        if let Some(value) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            config.log_level = value;
        }
        config.log_dir = read(ENV_LOG_DIR).map(PathBuf::from);

        if let Some(value) = read(ENV_VALIDATION_MODE) {
            config.validation.mode = match value.to_ascii_lowercase().as_str() {
                "collect" => ErrorMode::CollectAll,
                "fail_fast" => ErrorMode::FailFast,
                _ => return Err(invalid(ENV_VALIDATION_MODE, value, "collect|fail_fast")),
            };
        }
        if let Some(value) = read(ENV_STRICT_TAGS) {
            let strict = parse_bool(&value)
                .ok_or_else(|| invalid(ENV_STRICT_TAGS, value, "true|false"))?;
            config.validation.reject_duplicate_tags = strict;
            config.validation.restrict_tag_charset = strict;
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(key: &'static str, value: String, expected: &'static str) -> ConfigError {
    ConfigError {
        key,
        value,
        expected,
    }
}
