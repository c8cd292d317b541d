//! TOML-based application configuration.
//!
//! Stores the bookable slot labels and the date-picker look-ahead.
//! Configuration is stored at `<data_dir>/config.toml`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::calendar::LOOK_AHEAD_DAYS;
use crate::error::ConfigError;

/// Half-hour slots across a business day.
pub const DEFAULT_SLOTS: [&str; 16] = [
    "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "12:00", "12:30", "13:00", "13:30",
    "14:00", "14:30", "15:00", "15:30", "16:00", "16:30",
];

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Ordered `HH:MM` slot labels shared by every employee and every day.
    #[serde(default = "default_slots")]
    pub slots: Vec<String>,
    /// Number of days offered when picking an appointment date.
    #[serde(default = "default_look_ahead_days")]
    pub look_ahead_days: u32,
}

fn default_slots() -> Vec<String> {
    DEFAULT_SLOTS.iter().map(|s| s.to_string()).collect()
}
fn default_look_ahead_days() -> u32 {
    LOOK_AHEAD_DAYS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            slots: default_slots(),
            look_ahead_days: default_look_ahead_days(),
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
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    // Lists accept JSON or a comma-separated shorthand.
                    serde_json::Value::Array(_) => match serde_json::from_str(value) {
                        Ok(parsed) => parsed,
                        Err(_) => serde_json::Value::Array(
                            value
                                .split(',')
                                .map(str::trim)
                                .filter(|s| !s.is_empty())
                                .map(|s| serde_json::Value::String(s.to_string()))
                                .collect(),
                        ),
                    },
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default config location inside the data directory.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location or return (and persist) the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or is
    /// invalid, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from an explicit path; a missing file writes the defaults there.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
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
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        crate::storage::write_atomic(path, content.as_bytes()).map_err(|e| save_failed(e.to_string()))
    }

    /// Check slot labels are well-formed `HH:MM`, unique, and non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "slots".to_string(),
            message,
        };

        if self.slots.is_empty() {
            return Err(invalid("at least one slot is required".to_string()));
        }

        let mut seen = HashSet::new();
        for slot in &self.slots {
            if NaiveTime::parse_from_str(slot, "%H:%M").is_err() || slot.len() != 5 {
                return Err(invalid(format!("'{slot}' is not an HH:MM label")));
            }
            if !seen.insert(slot.as_str()) {
                return Err(invalid(format!("'{slot}' is listed more than once")));
            }
        }

        if self.look_ahead_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "look_ahead_days".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving. The result is validated
    /// and `self` is left untouched on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
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
        assert_eq!(parsed.slots.len(), 16);
        assert_eq!(parsed.look_ahead_days, 14);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str("slots = [\"08:00\", \"08:30\"]").unwrap();
        assert_eq!(parsed.slots, vec!["08:00", "08:30"]);
        assert_eq!(parsed.look_ahead_days, 14);
    }

    #[test]
    fn validate_rejects_bad_slots() {
        let mut cfg = Config::default();
        cfg.slots = vec![];
        assert!(cfg.validate().is_err());

        cfg.slots = vec!["9am".into()];
        assert!(cfg.validate().is_err());

        cfg.slots = vec!["9:00".into()];
        assert!(cfg.validate().is_err());

        cfg.slots = vec!["09:00".into(), "09:00".into()];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn get_by_key() {
        let cfg = Config::default();
        assert_eq!(cfg.get("look_ahead_days").as_deref(), Some("14"));
        assert!(cfg.get("nope").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_number_and_list() {
        let mut cfg = Config::default();
        cfg.set("look_ahead_days", "7").unwrap();
        assert_eq!(cfg.look_ahead_days, 7);

        cfg.set("slots", "10:00, 10:30").unwrap();
        assert_eq!(cfg.slots, vec!["10:00", "10:30"]);

        cfg.set("slots", r#"["11:00"]"#).unwrap();
        assert_eq!(cfg.slots, vec!["11:00"]);
    }

    #[test]
    fn set_rejects_unknown_and_invalid_without_mutating() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.set("theme", "dark"), Err(ConfigError::UnknownKey(_))));
        assert!(cfg.set("look_ahead_days", "soon").is_err());
        assert!(cfg.set("look_ahead_days", "0").is_err());
        assert!(cfg.set("slots", "noon").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_only_reaches_existing_leaves() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("look_ahead_days.inner", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("slots.0", "10:00"), Err(ConfigError::UnknownKey(_))));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_missing_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "slots = []").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
