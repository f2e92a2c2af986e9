mod config;

pub use config::{
    parse_clock_time, Config, CurfewConfig, DebounceConfig, IdleConfig, ScreenConfig,
    TimerConfig,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/pomoscreen[-dev]/` based on POMOSCREEN_ENV.
///
/// Set POMOSCREEN_ENV=dev to use development data directory, or
/// POMOSCREEN_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMOSCREEN_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("POMOSCREEN_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pomoscreen-dev")
            } else {
                base_dir.join("pomoscreen")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
