//! Configuration
//!
//! Storage locations and playback tunables. Everything is passed explicitly
//! into the store and the controller so tests can point them at a temporary
//! root.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory that holds the listing file and the media directory.
    pub root: PathBuf,
    /// File name of the persisted listing inside `root`.
    pub listing_file: String,
    /// Directory name (inside `root`) for copied media.
    pub media_dir: String,
}

impl StoreConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn listing_path(&self) -> PathBuf {
        self.root.join(&self.listing_file)
    }

    pub fn media_path(&self) -> PathBuf {
        self.root.join(&self.media_dir)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: data_root(),
            listing_file: "media_listing.json".to_string(),
            media_dir: "galeria".to_string(),
        }
    }
}

// ============================================================================
// Playback
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub auto_hide_ms: u64,
    pub loading_timeout_ms: u64,
    pub skip_ms: u64,
    /// Time updates within this distance of a pending seek target settle it.
    pub seek_tolerance_ms: u64,
    pub volume_indicator_ms: u64,
    pub auto_play: bool,
}

impl PlaybackConfig {
    pub fn auto_hide(&self) -> Duration {
        Duration::from_millis(self.auto_hide_ms)
    }

    pub fn loading_timeout(&self) -> Duration {
        Duration::from_millis(self.loading_timeout_ms)
    }

    pub fn volume_indicator(&self) -> Duration {
        Duration::from_millis(self.volume_indicator_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            auto_hide_ms: 3_000,
            loading_timeout_ms: 10_000,
            skip_ms: 10_000,
            seek_tolerance_ms: 500,
            volume_indicator_ms: 1_200,
            auto_play: false,
        }
    }
}

// ============================================================================
// Application
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub playback: PlaybackConfig,
}

impl AppConfig {
    /// Load from the default location, falling back to defaults when absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(write_err)
    }
}

fn data_root() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("Galeria");
    path
}

pub fn config_file_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("Galeria");
    path.push("config.json");
    path
}
