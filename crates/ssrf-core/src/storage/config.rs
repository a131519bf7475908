//! TOML-based application configuration.
//!
//! Stores:
//! - Scheduler defaults (priority of new units, initial avg. grade,
//!   re-review window)
//! - Database location
//! - Log level
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::scheduler::SchedulerConfig;
use crate::types::{LuState, Priority};

/// Scheduler section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSection {
    /// Priority given to units added without one
    #[serde(default)]
    pub default_priority: Priority,
    #[serde(default = "default_initial_avg_grade")]
    pub initial_avg_grade: f64,
    #[serde(default = "default_rereview_window_hours")]
    pub rereview_window_hours: i64,
}

/// Storage section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file, relative to the data directory unless absolute
    #[serde(default = "default_database")]
    pub database: String,
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_initial_avg_grade() -> f64 {
    LuState::DEFAULT_AVG_GRADE
}
fn default_rereview_window_hours() -> i64 {
    24
}
fn default_database() -> String {
    "ssrf.db".into()
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            default_priority: Priority::default(),
            initial_avg_grade: default_initial_avg_grade(),
            rereview_window_hours: default_rereview_window_hours(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// `<data_dir>/config.toml`
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Every leaf key with its value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let Ok(serde_json::Value::Object(sections)) = serde_json::to_value(self) else {
            return Vec::new();
        };
        let mut entries = Vec::new();
        for (section, values) in &sections {
            if let serde_json::Value::Object(values) = values {
                for name in values.keys() {
                    let key = format!("{section}.{name}");
                    if let Some(value) = self.get(&key) {
                        entries.push((key, value));
                    }
                }
            }
        }
        entries
    }

    /// Change a value by key in memory. Returns error if key is unknown or
    /// the resulting config is invalid.
    pub fn update(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.update(key, value)?;
        self.save()
    }

    /// Runtime configuration of the scheduler.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            initial_avg_grade: self.scheduler.initial_avg_grade,
            rereview_window_hours: self.scheduler.rereview_window_hours,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler_config()
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: "scheduler".to_string(),
                message: e.to_string(),
            })
    }

    /// Database file, resolved against the data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        let path = PathBuf::from(&self.storage.database);
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(data_dir()?.join(path))
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.scheduler.default_priority, Priority::Medium);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let parsed: Config = toml::from_str("[scheduler]\ndefault_priority = \"high\"\n").unwrap();
        assert_eq!(parsed.scheduler.default_priority, Priority::High);
        assert_eq!(parsed.scheduler.rereview_window_hours, 24);
        assert_eq!(parsed.storage.database, "ssrf.db");
        assert_eq!(parsed.logging.level, "warn");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("scheduler.default_priority").as_deref(), Some("medium"));
        assert_eq!(cfg.get("scheduler.initial_avg_grade").as_deref(), Some("2.5"));
        assert_eq!(cfg.get("scheduler.rereview_window_hours").as_deref(), Some("24"));
        assert!(cfg.get("scheduler").is_none());
        assert!(cfg.get("scheduler.missing_key").is_none());
    }

    #[test]
    fn update_changes_values() {
        let mut cfg = Config::default();
        cfg.update("scheduler.default_priority", "high").unwrap();
        cfg.update("scheduler.initial_avg_grade", "3").unwrap();
        cfg.update("logging.level", "debug").unwrap();
        assert_eq!(cfg.scheduler.default_priority, Priority::High);
        assert_eq!(cfg.scheduler.initial_avg_grade, 3.0);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn update_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.update("scheduler.nonexistent_key", "1"),
            Err(crate::error::CoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(cfg.update("", "1").is_err());
        assert!(cfg.update("storage", "x").is_err());
    }

    #[test]
    fn update_rejects_invalid_values() {
        let mut cfg = Config::default();
        assert!(cfg.update("scheduler.default_priority", "urgent").is_err());
        assert!(cfg.update("scheduler.rereview_window_hours", "soon").is_err());
        assert!(cfg.update("scheduler.initial_avg_grade", "5.5").is_err());
        assert!(cfg.update("scheduler.rereview_window_hours", "-1").is_err());
        assert!(cfg
            .update("scheduler.rereview_window_hours", "10000000000")
            .is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn entries_list_every_leaf() {
        let keys: Vec<String> = Config::default().entries().into_iter().map(|(k, _)| k).collect();
        assert!(keys.contains(&"scheduler.default_priority".to_string()));
        assert!(keys.contains(&"storage.database".to_string()));
        assert!(keys.contains(&"logging.level".to_string()));
        assert_eq!(keys.len(), 5);
    }

    #[test]
    fn load_from_writes_defaults_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.update("scheduler.default_priority", "low").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), changed);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scheduler = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(crate::error::CoreError::Config(ConfigError::ParseFailed(_)))
        ));
    }

    #[test]
    fn scheduler_config_mirrors_section() {
        let mut cfg = Config::default();
        cfg.update("scheduler.rereview_window_hours", "12").unwrap();
        let scheduler = cfg.scheduler_config();
        assert_eq!(scheduler.rereview_window_hours, 12);
        assert_eq!(scheduler.initial_avg_grade, 2.5);
    }
}
