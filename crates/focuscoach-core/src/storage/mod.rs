mod config;

pub use config::{CoachConfig, Config, EvolutionConfig, PathsConfig, ReportConfig};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the focuscoach data directory.
///
/// `$FOCUSCOACH_HOME` wins when set. Otherwise `~/.config/focuscoach/`,
/// or `~/.config/focuscoach-dev/` when `FOCUSCOACH_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("FOCUSCOACH_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FOCUSCOACH_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("focuscoach-dev")
            } else {
                base_dir.join("focuscoach")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
