//! TOML-based application configuration.
//!
//! Stores:
//! - The namespace rows are stored under
//! - Scheduling horizons for the default schedule, convergence and health reports
//! - The spoons value assumed for days without an override
//! - An optional pinned "today"
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::capacity::{DEFAULT_SPOONS, MAX_SPOONS};
use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.toml";

/// Longest configurable window, in days (about a century).
const MAX_WINDOW_DAYS: u32 = 36_525;

/// Who the rows belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Default windows, in days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    #[serde(default = "default_convergence_days")]
    pub convergence_days: u32,
    #[serde(default = "default_health_days")]
    pub health_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityConfig {
    /// Spoons for a day without an override, clamped to `0..=10` on use.
    #[serde(default = "default_spoons")]
    pub default_spoons: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Pins "today" for every invocation when set.
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub capacity: CapacityConfig,
    #[serde(default)]
    pub clock: ClockConfig,
}

fn default_namespace() -> String {
    "default".into()
}
fn default_horizon_days() -> u32 {
    90
}
fn default_convergence_days() -> u32 {
    crate::reports::DEFAULT_CONVERGENCE_DAYS
}
fn default_health_days() -> u32 {
    crate::reports::DEFAULT_HEALTH_DAYS
}
fn default_spoons() -> u8 {
    DEFAULT_SPOONS
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            convergence_days: default_convergence_days(),
            health_days: default_health_days(),
        }
    }
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            default_spoons: default_spoons(),
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
        if parts.peek().is_none() || key.is_empty() {
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
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(unknown());
                    }
                    // Optional values are cleared with an empty string or "none".
                    _ if value.is_empty() || value.eq_ignore_ascii_case("none") => {
                        serde_json::Value::Null
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Path of the config file inside the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join(CONFIG_FILE))
    }

    /// Load from the data directory, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "writing default config");
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

    /// Persist to the data directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    ///
    /// An unset optional value reads as `"none"`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some("none".to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        if updated.capacity.default_spoons > MAX_SPOONS {
            return Err(invalid(format!("spoons must be at most {MAX_SPOONS}")));
        }
        let schedule = &updated.schedule;
        for days in [schedule.horizon_days, schedule.convergence_days, schedule.health_days] {
            if days > MAX_WINDOW_DAYS {
                return Err(invalid(format!("windows must be at most {MAX_WINDOW_DAYS} days")));
            }
        }
        *self = updated;
        Ok(())
    }

    /// Every dot-path key with its current value, in declaration order.
    pub fn entries(&self) -> Vec<(String, String)> {
        const KEYS: [&str; 6] = [
            "user.namespace",
            "schedule.horizon_days",
            "schedule.convergence_days",
            "schedule.health_days",
            "capacity.default_spoons",
            "clock.today",
        ];
        KEYS.iter()
            .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
            .collect()
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
        assert_eq!(parsed.schedule.horizon_days, 90);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let parsed: Config = toml::from_str("[schedule]\nhorizon_days = 14\n").unwrap();
        assert_eq!(parsed.schedule.horizon_days, 14);
        assert_eq!(parsed.schedule.convergence_days, 365);
        assert_eq!(parsed.user.namespace, "default");
        assert_eq!(parsed.capacity.default_spoons, 5);
        assert_eq!(parsed.clock.today, None);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("user.namespace").as_deref(), Some("default"));
        assert_eq!(cfg.get("schedule.health_days").as_deref(), Some("30"));
        assert_eq!(cfg.get("clock.today").as_deref(), Some("none"));
        assert!(cfg.get("schedule.missing_key").is_none());
    }

    #[test]
    fn set_updates_number_and_string() {
        let mut cfg = Config::default();
        cfg.set("schedule.horizon_days", "30").unwrap();
        cfg.set("schedule.convergence_days", &MAX_WINDOW_DAYS.to_string()).unwrap();
        cfg.set("user.namespace", "alice@example.com").unwrap();
        assert_eq!(cfg.schedule.horizon_days, 30);
        assert_eq!(cfg.schedule.convergence_days, MAX_WINDOW_DAYS);
        assert_eq!(cfg.user.namespace, "alice@example.com");
    }

    #[test]
    fn set_pins_and_clears_today() {
        let mut cfg = Config::default();
        cfg.set("clock.today", "2022-11-20").unwrap();
        assert_eq!(cfg.clock.today, NaiveDate::from_ymd_opt(2022, 11, 20));
        cfg.set("clock.today", "none").unwrap();
        assert_eq!(cfg.clock.today, None);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set("schedule.nonexistent_key", "1").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));
        assert!(cfg.set("schedule", "1").is_err());
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("schedule.horizon_days", "soon").is_err());
        assert!(cfg.set("clock.today", "tomorrow").is_err());
        assert!(cfg.set("capacity.default_spoons", "11").is_err());
        assert!(cfg.set("schedule.horizon_days", "4000000000").is_err());
        assert!(cfg.set("schedule.convergence_days", "36526").is_err());
        assert!(cfg.set("schedule.health_days", "36526").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("schedule.horizon_days", "7").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().schedule.horizon_days, 7);
    }

    #[test]
    fn entries_list_every_key() {
        let entries = Config::default().entries();
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0], ("user.namespace".to_string(), "default".to_string()));
    }
}
