mod config;
pub mod database;
pub mod migrations;
pub mod repository;

pub use config::{Config, NarrativeConfig, NotificationsConfig, StreakConfig};
pub use database::Database;
pub use repository::CheckinRepository;

use std::path::PathBuf;

use crate::error::Result;

/// Returns the data directory, creating it if needed.
///
/// `QUANTA_DATA_DIR` wins when set. Otherwise `~/.config/quanta[-dev]/`,
/// chosen by `QUANTA_ENV` (set `QUANTA_ENV=dev` for the development
/// directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("QUANTA_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("QUANTA_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("quanta-dev")
            } else {
                base_dir.join("quanta")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
