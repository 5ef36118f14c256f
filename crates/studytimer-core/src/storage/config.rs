//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The active duration preset (or custom durations in test mode)
//! - Whether phases auto-advance
//! - Alert backend and repeat interval
//! - An optional alternative location for the daily ledger
//!
//! Configuration is stored at `~/.config/studytimer/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::daily::DATA_FILE;
use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{Preset, TimerConfig};

/// Timer section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSection {
    #[serde(default)]
    pub preset: Preset,
    /// Only read when `preset = "custom"`.
    #[serde(default = "default_study_minutes")]
    pub study_minutes: f64,
    /// Only read when `preset = "custom"`.
    #[serde(default = "default_break_minutes")]
    pub break_minutes: f64,
    #[serde(default)]
    pub auto_advance: bool,
}

/// Which mechanism plays the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertBackend {
    /// Platform sound player, falling back to the terminal bell.
    #[default]
    Auto,
    /// Terminal bell only.
    Bell,
    /// Synthesised tone (requires the `tone` feature).
    Tone,
    /// No sound.
    None,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub backend: AlertBackend,
    /// Delay between alert repetitions.
    #[serde(default = "default_repeat_interval_ms")]
    pub repeat_interval_ms: u64,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Ledger location; defaults to `data.json` in the data directory.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studytimer/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerSection,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

// Default functions
fn default_study_minutes() -> f64 {
    25.0
}
fn default_break_minutes() -> f64 {
    5.0
}
fn default_true() -> bool {
    true
}
fn default_repeat_interval_ms() -> u64 {
    2500
}

impl Default for TimerSection {
    fn default() -> Self {
        Self {
            preset: Preset::Classic,
            study_minutes: default_study_minutes(),
            break_minutes: default_break_minutes(),
            auto_advance: false,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: AlertBackend::Auto,
            repeat_interval_ms: default_repeat_interval_ms(),
        }
    }
}

impl NotificationsConfig {
    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms.max(100))
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
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Optional paths serialize as null.
                    serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
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

    /// Default location of `config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result is not a usable configuration.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Reject configurations the timer could not run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        TimerConfig::new(self.timer.study_minutes, self.timer.break_minutes).map(|_| ())
    }

    /// Durations for the engine, resolved from the preset.
    pub fn timer_config(&self) -> Result<TimerConfig, ConfigError> {
        let config = match self.timer.preset.config() {
            Some(config) => config,
            None => TimerConfig::new(self.timer.study_minutes, self.timer.break_minutes)?,
        };
        Ok(config.with_auto_advance(self.timer.auto_advance))
    }

    /// Ledger location, from `storage.data_file` or the data directory.
    pub fn data_file(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.storage.data_file {
            return Ok(path.clone());
        }
        data_dir()
            .map(|dir| dir.join(DATA_FILE))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from(DATA_FILE),
                message: e.to_string(),
            })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
