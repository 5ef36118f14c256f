mod config;
pub mod daily;

pub use config::{AlertBackend, Config, NotificationsConfig, StorageConfig, TimerSection};
pub use daily::{DailyRecord, DailyStore};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/studytimer[-dev]/` based on STUDYTIMER_ENV.
///
/// Set STUDYTIMER_ENV=dev to use the development data directory, or
/// STUDYTIMER_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("STUDYTIMER_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYTIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studytimer-dev")
            } else {
                base_dir.join("studytimer")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| StorageError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
