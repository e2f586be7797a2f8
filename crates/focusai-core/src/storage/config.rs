//! TOML-based application configuration.
//!
//! Stores:
//! - Task store endpoint and bearer token
//! - Alert monitor cadence, presenter countdown and snooze choices
//! - Ledger retention policy
//!
//! Configuration is stored at `~/.config/focusai/config.toml`.
//! `FOCUSAI_API_URL` and `FOCUSAI_TOKEN` override the `[api]` section at
//! load time without being written back.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::alerts::LedgerRetention;
use crate::error::ConfigError;

/// Task store endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Alert engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Seconds an alert stays on screen before auto-dismissing.
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u64,
    #[serde(default = "default_snooze_options")]
    pub snooze_options: Vec<u32>,
    #[serde(default)]
    pub retention: LedgerRetention,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusai/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
}

const MAX_POLL_INTERVAL_SECS: u64 = 86_400;
const MAX_COUNTDOWN_SECS: u64 = 3_600;
const MAX_TIMEOUT_SECS: u64 = 300;

// Default functions
fn default_base_url() -> String {
    "http://localhost:5001".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_poll_interval_secs() -> u64 {
    60
}
fn default_countdown_secs() -> u64 {
    10
}
fn default_snooze_options() -> Vec<u32> {
    vec![5, 10, 15]
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            countdown_secs: default_countdown_secs(),
            snooze_options: default_snooze_options(),
            retention: LedgerRetention::default(),
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
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Array(_) => serde_json::from_str(value)
                        .map_err(|e| invalid(format!("expected a JSON array: {e}")))?,
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Path of the config file inside [`data_dir`].
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return (and write) the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// [`Config::load`] against an explicit path.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
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

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// [`Config::save`] against an explicit path.
    ///
    /// # Errors
    ///
    /// Same as [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Apply `FOCUSAI_API_URL` / `FOCUSAI_TOKEN` if set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("FOCUSAI_API_URL") {
            if !url.is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(token) = std::env::var("FOCUSAI_TOKEN") {
            if !token.is_empty() {
                self.api.token = Some(token);
            }
        }
        self
    }

    /// Reject values the alert engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.into(),
            message: message.into(),
        };
        if self.api.base_url.trim().is_empty() {
            return Err(invalid("api.base_url", "must not be empty"));
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.api.timeout_secs) {
            return Err(invalid("api.timeout_secs", "must be between 1 and 300"));
        }
        if !(1..=MAX_POLL_INTERVAL_SECS).contains(&self.alerts.poll_interval_secs) {
            return Err(invalid("alerts.poll_interval_secs", "must be between 1 and 86400"));
        }
        if !(1..=MAX_COUNTDOWN_SECS).contains(&self.alerts.countdown_secs) {
            return Err(invalid("alerts.countdown_secs", "must be between 1 and 3600"));
        }
        if self.alerts.snooze_options.is_empty() || self.alerts.snooze_options.contains(&0) {
            return Err(invalid(
                "alerts.snooze_options",
                "must list at least one positive number of minutes",
            ));
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

    /// Set a config value by key without saving. Returns error if key is
    /// unknown or the result does not validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }
}
