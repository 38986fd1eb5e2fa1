//! Media Picker & Share
//!
//! The platform chooser and share sheet sit behind traits. The flows here
//! handle permission prompting, classification, id generation and turning
//! failures into notices.

use crate::error::{PickError, ShareError};
use crate::media::{classify, MediaType, PickedAsset, RawAsset};
use crate::notice::{Notice, Notices};
use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Platform file chooser.
pub trait MediaPicker {
    /// Ask for read access to the user's media. May show a system prompt.
    fn request_permission(&mut self) -> Permission;

    /// Open the chooser. `Ok(None)` means the user cancelled.
    fn choose(&mut self) -> Result<Option<Vec<RawAsset>>, PickError>;
}

/// Platform share sheet.
pub trait ShareSheet {
    fn is_available(&self) -> bool;

    fn share(&mut self, uri: &str, mime: &str, dialog_title: &str) -> Result<(), ShareError>;
}

/// Run the chooser and classify what comes back.
///
/// Returns `None` on cancel, on an empty selection and on a denied
/// permission (after queuing a notice).
pub fn pick_media<P: MediaPicker>(
    picker: &mut P,
    notices: &mut Notices,
) -> Result<Option<Vec<PickedAsset>>, PickError> {
    if picker.request_permission() == Permission::Denied {
        tracing::info!("Media permission denied");
        notices.push(Notice::warning(
            "Permission needed",
            "Access to your media library is required to add files",
        ));
        return Ok(None);
    }

    let raw = match picker.choose()? {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };

    let assets: Vec<PickedAsset> = raw.into_iter().map(into_picked).collect();
    tracing::info!("Picked {} asset(s)", assets.len());
    Ok(Some(assets))
}

fn into_picked(raw: RawAsset) -> PickedAsset {
    let media_type = classify(
        raw.type_hint.as_deref(),
        raw.mime_type.as_deref(),
        raw.file_name.as_deref(),
        Some(&raw.uri),
    );

    let filename = raw
        .file_name
        .clone()
        .filter(|name| !name.is_empty())
        .or_else(|| {
            raw.uri
                .rsplit('/')
                .next()
                .filter(|tail| !tail.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string());

    let is_video = media_type == MediaType::Video;

    PickedAsset {
        id: uuid::Uuid::new_v4().to_string(),
        filename,
        media_type,
        created_at: Utc::now(),
        file_size: raw.file_size,
        // Videos use their own URI as the thumbnail source; the renderer
        // shows the first frame.
        thumbnail_uri: Some(raw.uri.clone()),
        width: raw.width.filter(|_| is_video),
        height: raw.height.filter(|_| is_video),
        duration_ms: raw.duration_ms.filter(|_| is_video),
        source_uri: raw.uri,
    }
}

/// Hand a file to the share sheet. Failures become notices, never errors.
pub fn share_media<S: ShareSheet>(
    sheet: &mut S,
    uri: &str,
    media_type: MediaType,
    notices: &mut Notices,
) {
    if !sheet.is_available() {
        notices.push(Notice::warning(
            "Share",
            ShareError::Unsupported.to_string(),
        ));
        return;
    }

    if let Err(e) = sheet.share(uri, media_type.share_mime(), "Share file") {
        tracing::error!("Share failed: {}", e);
        notices.push(Notice::error("Share", "The file could not be shared"));
    }
}
