//! Media Store
//!
//! Copies picked files into an app-owned directory and keeps a JSON listing
//! of [`MediaRecord`]s next to it.
//!
//! Layout under the configured root:
//!
//! ```text
//! <root>/media_listing.json         JSON array of records (camelCase keys)
//! <root>/galeria/<ts>_<filename>    copied media
//! ```
//!
//! Records whose file disappeared are pruned on the next `list()`.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::media::{type_from_filename, MediaRecord, MediaType, PickedAsset};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const TOMBSTONE_SUFFIX: &str = ".deleting";

#[derive(Debug, Clone)]
pub struct MediaStore {
    config: StoreConfig,
}

impl MediaStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create the root and media directories if they are missing.
    pub fn init(&self) -> Result<(), StoreError> {
        let media = self.config.media_path();
        fs::create_dir_all(&media).map_err(|e| StoreError::io(&media, e))?;
        tracing::debug!("Media store ready at {:?}", self.config.root);
        Ok(())
    }

    /// Copy each asset into app storage and append the new records.
    ///
    /// Either the whole batch lands in the listing or none of it does.
    pub fn save(&self, assets: &[PickedAsset]) -> Result<Vec<MediaRecord>, StoreError> {
        self.init()?;
        let mut records = self.list()?;

        let mut saved = Vec::with_capacity(assets.len());
        for asset in assets {
            match self.copy_in(asset) {
                Ok(record) => saved.push(record),
                Err(e) => {
                    tracing::error!("Copy of {} failed: {}", asset.filename, e);
                    remove_copies(&saved);
                    return Err(e);
                }
            }
        }

        records.extend(saved.iter().cloned());
        if let Err(e) = self.write_listing(&records) {
            remove_copies(&saved);
            return Err(e);
        }

        tracing::info!("Saved {} file(s) to the gallery", saved.len());
        Ok(saved)
    }

    /// Records whose backing file still exists, pruning the listing if
    /// anything went missing.
    pub fn list(&self) -> Result<Vec<MediaRecord>, StoreError> {
        let path = self.config.listing_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<StoredEntry> = serde_json::from_str(&content)?;
        let total = entries.len();

        let valid: Vec<MediaRecord> = entries
            .into_iter()
            .filter_map(StoredEntry::into_record)
            .filter(|record| record.local_uri.is_file())
            .collect();

        if valid.len() != total {
            tracing::debug!("Pruning {} stale record(s)", total - valid.len());
            if let Err(e) = self.write_listing(&valid) {
                tracing::warn!("Could not rewrite pruned listing: {}", e);
            }
        }

        Ok(valid)
    }

    /// Remove a record and its file together.
    ///
    /// The file is first moved to a tombstone name so a failed listing
    /// write can put it back.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.list()?;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let record = records.remove(index);

        let tombstone = tombstone_for(&record.local_uri);
        fs::rename(&record.local_uri, &tombstone)
            .map_err(|e| StoreError::io(&record.local_uri, e))?;

        if let Err(e) = self.write_listing(&records) {
            if let Err(restore) = fs::rename(&tombstone, &record.local_uri) {
                tracing::error!(
                    "Could not restore {:?} after failed delete: {}",
                    record.local_uri,
                    restore
                );
            }
            return Err(e);
        }

        if let Err(e) = fs::remove_file(&tombstone) {
            tracing::warn!("Leftover tombstone {:?}: {}", tombstone, e);
        }

        tracing::info!("Deleted {} ({})", record.filename, record.id);
        Ok(())
    }

    fn copy_in(&self, asset: &PickedAsset) -> Result<MediaRecord, StoreError> {
        let source = source_path(&asset.source_uri)?;
        let destination = self.unique_destination(&asset.filename);

        let bytes = fs::copy(&source, &destination).map_err(|e| StoreError::io(&source, e))?;

        Ok(MediaRecord {
            id: asset.id.clone(),
            source_uri: asset.source_uri.clone(),
            local_uri: destination,
            media_type: asset.media_type,
            filename: asset.filename.clone(),
            created_at: asset.created_at,
            saved_at: Utc::now(),
            file_size: bytes,
            width: asset.width,
            height: asset.height,
            duration_ms: asset.duration_ms,
            thumbnail_uri: asset.thumbnail_uri.clone(),
        })
    }

    /// `<timestamp>_<filename>`, with a counter when two copies land in the
    /// same millisecond under the same name.
    fn unique_destination(&self, filename: &str) -> PathBuf {
        let dir = self.config.media_path();
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "media".to_string());
        let stamp = Utc::now().timestamp_millis();

        let mut candidate = dir.join(format!("{}_{}", stamp, name));
        let mut counter = 1;
        while candidate.exists() {
            candidate = dir.join(format!("{}_{}_{}", stamp, counter, name));
            counter += 1;
        }
        candidate
    }

    fn write_listing(&self, records: &[MediaRecord]) -> Result<(), StoreError> {
        let root = &self.config.root;
        let path = self.config.listing_path();
        let json = serde_json::to_vec_pretty(records)?;

        fs::create_dir_all(root).map_err(|e| StoreError::io(root, e))?;
        let mut tmp = tempfile::NamedTempFile::new_in(root).map_err(|e| StoreError::io(root, e))?;
        tmp.write_all(&json).map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;
        Ok(())
    }
}

fn remove_copies(records: &[MediaRecord]) {
    for record in records {
        if let Err(e) = fs::remove_file(&record.local_uri) {
            tracing::warn!("Could not roll back copy {:?}: {}", record.local_uri, e);
        }
    }
}

fn tombstone_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TOMBSTONE_SUFFIX);
    PathBuf::from(name)
}

/// Turn a picker URI into a readable path. Accepts `file://` URLs and plain
/// paths; other schemes are not readable from here.
pub fn source_path(uri: &str) -> Result<PathBuf, StoreError> {
    match url::Url::parse(uri) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|_| StoreError::BadSource(uri.to_string())),
        // A single letter scheme is a Windows drive, not a URL.
        Ok(url) if url.scheme().len() > 1 => Err(StoreError::BadSource(uri.to_string())),
        _ => Ok(PathBuf::from(uri)),
    }
}

// ============================================================================
// Persisted entry
// ============================================================================

/// Lenient shape of a listing entry. Older entries may lack fields or carry
/// a media type we do not know.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    id: String,
    #[serde(default, alias = "uri")]
    source_uri: Option<String>,
    #[serde(default)]
    local_uri: Option<PathBuf>,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    duration_ms: Option<u64>,
    #[serde(default)]
    thumbnail_uri: Option<String>,
}

impl StoredEntry {
    /// Entries without an app-owned copy are not ours to show.
    fn into_record(self) -> Option<MediaRecord> {
        let local_uri = self.local_uri?;
        let filename = self
            .filename
            .or_else(|| {
                local_uri
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_default();
        let media_type = self
            .media_type
            .as_deref()
            .and_then(MediaType::parse)
            .unwrap_or_else(|| type_from_filename(&filename));
        let saved_at = self.saved_at.unwrap_or_default();

        Some(MediaRecord {
            id: self.id,
            source_uri: self.source_uri.unwrap_or_default(),
            media_type,
            filename,
            created_at: self.created_at.unwrap_or(saved_at),
            saved_at,
            file_size: self.file_size.unwrap_or(0),
            width: self.width,
            height: self.height,
            duration_ms: self.duration_ms,
            thumbnail_uri: self.thumbnail_uri,
            local_uri,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_path_forms() {
        assert_eq!(
            source_path("/tmp/a.jpg").unwrap(),
            PathBuf::from("/tmp/a.jpg")
        );
        #[cfg(unix)]
        assert_eq!(
            source_path("file:///tmp/a%20b.jpg").unwrap(),
            PathBuf::from("/tmp/a b.jpg")
        );
        assert!(matches!(
            source_path("content://media/external/1"),
            Err(StoreError::BadSource(_))
        ));
    }

    #[test]
    fn test_missing_media_type_is_inferred_from_extension() {
        let entry: StoredEntry = serde_json::from_str(
            r#"{ "id": "1", "localUri": "/x/1_clip.mp4", "filename": "clip.mp4" }"#,
        )
        .unwrap();
        assert_eq!(entry.into_record().unwrap().media_type, MediaType::Video);

        let entry: StoredEntry = serde_json::from_str(
            r#"{ "id": "2", "localUri": "/x/2_a.bin", "mediaType": "hologram" }"#,
        )
        .unwrap();
        let record = entry.into_record().unwrap();
        assert_eq!(record.media_type, MediaType::Image);
        assert_eq!(record.filename, "2_a.bin");
    }

    #[test]
    fn test_entry_without_local_copy_is_dropped() {
        let entry: StoredEntry =
            serde_json::from_str(r#"{ "id": "1", "uri": "file:///x/a.jpg" }"#).unwrap();
        assert!(entry.into_record().is_none());
    }

    #[test]
    fn test_tombstone_name() {
        assert_eq!(
            tombstone_for(Path::new("/m/1_a.jpg")),
            PathBuf::from("/m/1_a.jpg.deleting")
        );
    }
}
