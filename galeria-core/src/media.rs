//! Media records and classification
//!
//! A [`PickedAsset`] is what the picker hands over: a source URI plus
//! best-effort metadata. The store turns it into a [`MediaRecord`] once the
//! bytes live in app-owned storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Media Type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Image,
    Video,
}

impl MediaType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" | "photo" => Some(MediaType::Image),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    /// Wildcard MIME hint handed to the share sheet.
    pub fn share_mime(&self) -> &'static str {
        match self {
            MediaType::Image => "image/*",
            MediaType::Video => "video/*",
        }
    }
}

/// Extensions the picker treats as video when nothing better is known.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "3gp", "webm", "m4v"];

/// Extension to (type, MIME) table for files the gallery knows about.
const KNOWN_EXTENSIONS: &[(&str, MediaType, &str)] = &[
    ("mp4", MediaType::Video, "video/mp4"),
    ("m4v", MediaType::Video, "video/mp4"),
    ("mov", MediaType::Video, "video/quicktime"),
    ("avi", MediaType::Video, "video/x-msvideo"),
    ("mkv", MediaType::Video, "video/x-matroska"),
    ("3gp", MediaType::Video, "video/3gpp"),
    ("webm", MediaType::Video, "video/webm"),
    ("jpg", MediaType::Image, "image/jpeg"),
    ("jpeg", MediaType::Image, "image/jpeg"),
    ("png", MediaType::Image, "image/png"),
    ("gif", MediaType::Image, "image/gif"),
    ("webp", MediaType::Image, "image/webp"),
    ("heic", MediaType::Image, "image/heic"),
    ("bmp", MediaType::Image, "image/bmp"),
];

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// MIME type for a file name, if the extension is one we know.
pub fn mime_for_name(name: &str) -> Option<&'static str> {
    let ext = extension_of(name)?;
    KNOWN_EXTENSIONS
        .iter()
        .find(|(known, _, _)| *known == ext)
        .map(|(_, _, mime)| *mime)
}

/// Type inferred purely from a file name's extension. Unknown is `Image`.
pub fn type_from_filename(name: &str) -> MediaType {
    match extension_of(name) {
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => MediaType::Video,
        _ => MediaType::Image,
    }
}

/// Classify a picked asset.
///
/// Fallback order: explicit type hint, MIME, file name extension, URI
/// substring. The first source that is present decides; `Image` if none is.
/// A type hint that is not `image`/`video` counts as absent.
pub fn classify(
    type_hint: Option<&str>,
    mime: Option<&str>,
    filename: Option<&str>,
    uri: Option<&str>,
) -> MediaType {
    if let Some(media_type) = type_hint.and_then(MediaType::parse) {
        return media_type;
    }

    if let Some(mime) = mime.filter(|m| !m.is_empty()) {
        return if mime.to_ascii_lowercase().starts_with("video/") {
            MediaType::Video
        } else {
            MediaType::Image
        };
    }

    if let Some(name) = filename.filter(|n| !n.is_empty()) {
        return type_from_filename(name);
    }

    if let Some(uri) = uri {
        let lower = uri.to_ascii_lowercase();
        if VIDEO_EXTENSIONS
            .iter()
            .any(|ext| lower.contains(&format!(".{}", ext)))
        {
            return MediaType::Video;
        }
    }

    MediaType::Image
}

// ============================================================================
// Picked Asset
// ============================================================================

/// What the platform chooser returns, before classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAsset {
    pub uri: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub type_hint: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_ms: Option<u64>,
    pub file_size: Option<u64>,
}

impl RawAsset {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }
}

/// A classified asset waiting to be copied into app storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickedAsset {
    pub id: String,
    pub source_uri: String,
    pub filename: String,
    pub media_type: MediaType,
    pub created_at: DateTime<Utc>,
    pub file_size: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_ms: Option<u64>,
    pub thumbnail_uri: Option<String>,
}

// ============================================================================
// Media Record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: String,
    pub source_uri: String,
    pub local_uri: PathBuf,
    pub media_type: MediaType,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_uri: Option<String>,
}

impl MediaRecord {
    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    /// Where the bytes can be read from right now.
    pub fn uri(&self) -> String {
        self.local_uri.to_string_lossy().into_owned()
    }

    /// Specific MIME type when the extension is known, else the wildcard.
    pub fn mime(&self) -> &'static str {
        mime_for_name(&self.filename).unwrap_or_else(|| self.media_type.share_mime())
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// `m:ss` below an hour, `h:mm:ss` above.
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Human readable size, base 1024, two decimals with trailing zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
