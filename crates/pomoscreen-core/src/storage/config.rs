//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Work and break durations, long-break cadence, rest carry-over
//! - Idle, screen lock and screensaver interruption policies
//! - The curfew window
//! - The unlock debounce grace window
//!
//! Configuration is stored at `~/.config/pomoscreen/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::settings::{
    InterruptionPolicies, InterruptionPolicy, Settings, TriggerAction, DEFAULT_DEBOUNCE_GRACE_MS,
};
use crate::timer::CurfewWindow;

/// Timer durations and cycle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_long_break_every")]
    pub long_break_every: u32,
    /// Carry the unused part of a cancelled break into the next one.
    #[serde(default)]
    pub accumulate_rest_time: bool,
}

/// Idle detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdleConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_idle_timeout_minutes")]
    pub timeout_minutes: u32,
    #[serde(default)]
    pub action: TriggerAction,
}

/// Screen lock or screensaver configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub action: TriggerAction,
}

/// Curfew window, as `HH:MM` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurfewConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_curfew_start")]
    pub start: String,
    #[serde(default = "default_curfew_end")]
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebounceConfig {
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomoscreen/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub idle: IdleConfig,
    #[serde(default)]
    pub screen_lock: ScreenConfig,
    #[serde(default)]
    pub screensaver: ScreenConfig,
    #[serde(default)]
    pub curfew: CurfewConfig,
    #[serde(default)]
    pub debounce: DebounceConfig,
}

// Default functions
fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    3
}
fn default_long_break_minutes() -> u32 {
    5
}
fn default_long_break_every() -> u32 {
    2
}
fn default_idle_timeout_minutes() -> u32 {
    10
}
fn default_curfew_start() -> String {
    "23:00".into()
}
fn default_curfew_end() -> String {
    "06:00".into()
}
fn default_grace_ms() -> u64 {
    DEFAULT_DEBOUNCE_GRACE_MS
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            long_break_every: default_long_break_every(),
            accumulate_rest_time: false,
        }
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_minutes: default_idle_timeout_minutes(),
            action: TriggerAction::default(),
        }
    }
}

impl Default for CurfewConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start: default_curfew_start(),
            end: default_curfew_end(),
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            grace_ms: default_grace_ms(),
        }
    }
}

impl From<&ScreenConfig> for InterruptionPolicy {
    fn from(cfg: &ScreenConfig) -> Self {
        InterruptionPolicy {
            enabled: cfg.enabled,
            on_trigger: cfg.action,
        }
    }
}

/// Parse `HH:MM` into an hour and minute pair.
///
/// Only checks the shape; range rules are enforced by
/// [`CurfewWindow::validate`].
pub fn parse_clock_time(value: &str) -> Result<(u8, u8), ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "time".into(),
        message: format!("'{value}' is not HH:MM"),
    };
    let (hour, minute) = value.trim().split_once(':').ok_or_else(invalid)?;
    let hour = hour.parse::<u8>().map_err(|_| invalid())?;
    let minute = minute.parse::<u8>().map_err(|_| invalid())?;
    Ok((hour, minute))
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
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|e| invalid(e.to_string()))?,
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("cannot set a whole section".into()));
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// `<data_dir>/config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
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

    /// Persist to disk.
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
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Every leaf key with its value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Set a value in memory. The result must still form valid settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration does not validate.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.to_settings()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        self.apply(key, value)?;
        self.save()?;
        Ok(())
    }

    pub fn curfew_window(&self) -> Result<CurfewWindow, ConfigError> {
        let (start_hour, start_minute) = parse_clock_time(&self.curfew.start)?;
        let (end_hour, end_minute) = parse_clock_time(&self.curfew.end)?;
        Ok(CurfewWindow {
            enabled: self.curfew.enabled,
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        })
    }

    /// Build the validated settings snapshot the core runs on.
    pub fn to_settings(&self) -> Result<Settings, CoreError> {
        let minutes = |m: u32| u64::from(m) * 60;
        let settings = Settings {
            policies: InterruptionPolicies {
                idle: InterruptionPolicy {
                    enabled: self.idle.enabled,
                    on_trigger: self.idle.action,
                },
                screen_lock: (&self.screen_lock).into(),
                screensaver: (&self.screensaver).into(),
            },
            idle_timeout_secs: minutes(self.idle.timeout_minutes),
            work_duration_secs: minutes(self.timer.work_minutes),
            short_break_secs: minutes(self.timer.short_break_minutes),
            long_break_every: self.timer.long_break_every,
            long_break_duration_secs: minutes(self.timer.long_break_minutes),
            accumulate_rest_time: self.timer.accumulate_rest_time,
            curfew: self.curfew_window()?,
            debounce_grace_ms: self.debounce.grace_ms,
        };
        settings.validate()?;
        Ok(settings)
    }
}
