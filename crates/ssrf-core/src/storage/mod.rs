mod config;
pub mod migrations;
pub mod review_db;

pub use config::{Config, LoggingConfig, SchedulerSection, StorageConfig};
pub use review_db::{DayLoad, LearningUnit, ReviewDb, DEFAULT_COLLECTION};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the data directory, creating it if needed.
///
/// `SSRF_DATA_DIR` wins when set. Otherwise `~/.config/ssrf[-dev]/` based on
/// `SSRF_ENV`; set `SSRF_ENV=dev` to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("SSRF_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("SSRF_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("ssrf-dev")
            } else {
                base_dir.join("ssrf")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
