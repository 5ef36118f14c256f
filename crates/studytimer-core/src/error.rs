//! Core error types for studytimer-core.
//!
//! Persistence and notification failures are non-fatal at the controller
//! level: they are logged and the timer keeps running. The lower layers still
//! report precisely what went wrong through these types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the crate's fallible entry points.
///
/// Only configuration can stop a controller from being built; the ledger and
/// the alert degrade instead (see [`StorageError`] and [`NotifyError`]).
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by the daily ledger file.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The data directory could not be determined or created
    #[error("Failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the ledger failed
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or renaming the ledger failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger exists but is not valid JSON
    #[error("Corrupt ledger at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An unreadable ledger could not be moved aside before rewriting it
    #[error("Failed to move unreadable ledger {path} aside: {source}")]
    Quarantine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger is valid JSON but not a date-keyed object
    #[error("Ledger at {path} is not a JSON object")]
    NotAnObject { path: PathBuf },

    /// A record could not be encoded
    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Unknown preset name
    #[error("Unknown preset '{0}' (expected classic, extended, test or custom)")]
    UnknownPreset(String),
}

/// Transitions the timer engine refuses to perform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Durations cannot change while the countdown is running
    #[error("Cannot change durations while the timer is running; stop or reset first")]
    Busy,
}

/// Alert playback errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The player program could not be spawned
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The player program ran but reported failure
    #[error("'{program}' exited with {status}")]
    CommandFailed { program: String, status: String },

    /// No audio mechanism is available on this platform
    #[error("No alert mechanism available: {0}")]
    Unavailable(String),

    /// Writing the terminal bell failed
    #[error("Terminal bell failed: {0}")]
    Bell(#[from] std::io::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
