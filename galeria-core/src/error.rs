//! Error types for the gallery core.
//!
//! Each concern has its own enum. The `Library` and the playback controller
//! are the boundaries where these turn into user-facing [`Notice`]s.
//!
//! [`Notice`]: crate::notice::Notice

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Listing is corrupt: {0}")]
    Listing(#[from] serde_json::Error),
    #[error("Source is not readable: {0}")]
    BadSource(String),
    #[error("No media with id {0}")]
    NotFound(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum PickError {
    #[error("Picker failed: {0}")]
    Platform(String),
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Sharing is not available on this device")]
    Unsupported,
    #[error("Share failed: {0}")]
    Platform(String),
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Cannot open {uri}: {reason}")]
    Open { uri: String, reason: String },
    #[error("Player command failed: {0}")]
    Command(String),
}

#[derive(Debug, Error)]
pub enum ChromeError {
    #[error("Orientation lock failed: {0}")]
    Orientation(String),
    #[error("Status bar update failed: {0}")]
    StatusBar(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
