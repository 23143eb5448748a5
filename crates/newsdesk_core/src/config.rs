//! Runtime configuration for core entry points.
//!
//! # Responsibility
//! - Resolve database location, history depth and log level from the
//!   process environment.
//!
//! # Invariants
//! - Loading never fails; invalid values fall back to defaults and are
//!   reported as warnings.
//! - `history_capacity` stays within
//!   `MIN_HISTORY_CAPACITY..=MAX_HISTORY_CAPACITY`.

use crate::editor::history::{
    DEFAULT_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY, MIN_HISTORY_CAPACITY,
};
use crate::logging::{default_log_level, normalize_level};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "NEWSDESK_DB_PATH";
pub const HISTORY_CAPACITY_ENV: &str = "NEWSDESK_HISTORY_CAPACITY";
pub const LOG_LEVEL_ENV: &str = "NEWSDESK_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "newsdesk.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub history_capacity: usize,
    pub log_level: &'static str,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            log_level: default_log_level(),
        }
    }
}

/// Resolved configuration plus any values that were ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: CoreConfig,
    pub warnings: Vec<String>,
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> LoadedConfig {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; unset or blank keys keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LoadedConfig {
        let mut config = Self::default();
        let mut warnings = Vec::new();
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(raw) = read(HISTORY_CAPACITY_ENV) {
            match raw.parse::<usize>() {
                Ok(value) if value < MIN_HISTORY_CAPACITY => warnings.push(format!(
                    "{HISTORY_CAPACITY_ENV}={value} is below the minimum {MIN_HISTORY_CAPACITY}; using {DEFAULT_HISTORY_CAPACITY}"
                )),
                Ok(value) if value > MAX_HISTORY_CAPACITY => warnings.push(format!(
                    "{HISTORY_CAPACITY_ENV}={value} is above the maximum {MAX_HISTORY_CAPACITY}; using {DEFAULT_HISTORY_CAPACITY}"
                )),
                Ok(value) => config.history_capacity = value,
                Err(_) => warnings.push(format!(
                    "{HISTORY_CAPACITY_ENV}=`{raw}` is not a number; using {DEFAULT_HISTORY_CAPACITY}"
                )),
            }
        }

        if let Some(raw) = read(LOG_LEVEL_ENV) {
            match normalize_level(&raw) {
                Ok(level) => config.log_level = level,
                Err(err) => warnings.push(format!(
                    "{LOG_LEVEL_ENV}: {err}; using {}",
                    config.log_level
                )),
            }
        }

        LoadedConfig { config, warnings }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DB_PATH_ENV, HISTORY_CAPACITY_ENV, LOG_LEVEL_ENV};
    use crate::editor::history::{DEFAULT_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn load(pairs: &[(&str, &str)]) -> super::LoadedConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        CoreConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let loaded = load(&[]);
        assert_eq!(loaded.config, CoreConfig::default());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn valid_values_override_defaults() {
        let loaded = load(&[
            (DB_PATH_ENV, "/var/lib/newsdesk/articles.db"),
            (HISTORY_CAPACITY_ENV, "25"),
            (LOG_LEVEL_ENV, " WARNING "),
        ]);
        assert_eq!(
            loaded.config.db_path,
            PathBuf::from("/var/lib/newsdesk/articles.db")
        );
        assert_eq!(loaded.config.history_capacity, 25);
        assert_eq!(loaded.config.log_level, "warn");
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn invalid_values_fall_back_with_warnings() {
        let loaded = load(&[
            (HISTORY_CAPACITY_ENV, "1"),
            (LOG_LEVEL_ENV, "loud"),
        ]);
        assert_eq!(loaded.config.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(loaded.config.log_level, CoreConfig::default().log_level);
        assert_eq!(loaded.warnings.len(), 2);

        let loaded = load(&[(HISTORY_CAPACITY_ENV, "many")]);
        assert!(loaded.warnings[0].contains("not a number"));
    }

    #[test]
    fn oversized_history_capacity_falls_back_with_warning() {
        let huge = usize::MAX.to_string();
        let loaded = load(&[(HISTORY_CAPACITY_ENV, huge.as_str())]);
        assert_eq!(loaded.config.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("above the maximum"));

        let limit = MAX_HISTORY_CAPACITY.to_string();
        let loaded = load(&[(HISTORY_CAPACITY_ENV, limit.as_str())]);
        assert_eq!(loaded.config.history_capacity, MAX_HISTORY_CAPACITY);
        assert!(loaded.warnings.is_empty());
    }
}
