mod config;

pub use config::{AlertsConfig, ApiConfig, Config};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/focusai[-dev]/` based on FOCUSAI_ENV.
///
/// Set FOCUSAI_ENV=dev to use the development data directory, or
/// FOCUSAI_CONFIG_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSAI_CONFIG_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSAI_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusai-dev")
            } else {
                base_dir.join("focusai")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::NoDataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
