//! Desktop implementations of the platform collaborators.

use eframe::egui;
use galeria_core::error::{ChromeError, PickError, ShareError};
use galeria_core::media::{mime_for_name, RawAsset, VIDEO_EXTENSIONS};
use galeria_core::picker::{MediaPicker, Permission, ShareSheet};
use galeria_core::playback::{DeviceChrome, Orientation};
use std::path::{Path, PathBuf};
use std::process::Command;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic", "bmp"];

// ============================================================================
// File dialog picker
// ============================================================================

/// Native multi-select file dialog. Desktop file access needs no prompt.
#[derive(Debug, Default)]
pub struct DialogPicker {
    last_dir: Option<PathBuf>,
}

impl MediaPicker for DialogPicker {
    fn request_permission(&mut self) -> Permission {
        Permission::Granted
    }

    fn choose(&mut self) -> Result<Option<Vec<RawAsset>>, PickError> {
        let mut all = IMAGE_EXTENSIONS.to_vec();
        all.extend_from_slice(VIDEO_EXTENSIONS);

        let mut dialog = rfd::FileDialog::new()
            .set_title("Add to gallery")
            .add_filter("Photos and videos", all.as_slice())
            .add_filter("Photos", IMAGE_EXTENSIONS)
            .add_filter("Videos", VIDEO_EXTENSIONS);
        if let Some(dir) = &self.last_dir {
            dialog = dialog.set_directory(dir);
        }

        let Some(paths) = dialog.pick_files() else {
            return Ok(None);
        };
        if let Some(parent) = paths.first().and_then(|p| p.parent()) {
            self.last_dir = Some(parent.to_path_buf());
        }

        Ok(Some(paths.iter().map(|p| raw_asset(p)).collect()))
    }
}

fn raw_asset(path: &Path) -> RawAsset {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    let mime_type = file_name
        .as_deref()
        .and_then(mime_for_name)
        .map(str::to_string);
    let file_size = std::fs::metadata(path).ok().map(|m| m.len());

    RawAsset {
        file_name,
        mime_type,
        file_size,
        ..RawAsset::from_uri(path.to_string_lossy())
    }
}

// ============================================================================
// Share: reveal in the file manager
// ============================================================================

/// Desktop stand-in for a share sheet: shows the file in the system file
/// manager so it can be dragged into another app.
#[derive(Debug, Default)]
pub struct RevealShare;

impl ShareSheet for RevealShare {
    fn is_available(&self) -> bool {
        cfg!(any(target_os = "linux", target_os = "macos", target_os = "windows"))
    }

    fn share(&mut self, uri: &str, mime: &str, dialog_title: &str) -> Result<(), ShareError> {
        tracing::info!("{}: revealing {} ({})", dialog_title, uri, mime);
        reveal(Path::new(uri))
            .spawn()
            .map(|_| ())
            .map_err(|e| ShareError::Platform(e.to_string()))
    }
}

#[cfg(target_os = "macos")]
fn reveal(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg("-R").arg(path);
    cmd
}

#[cfg(target_os = "windows")]
fn reveal(path: &Path) -> Command {
    let mut cmd = Command::new("explorer");
    cmd.arg(format!("/select,{}", path.display()));
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn reveal(path: &Path) -> Command {
    let dir = path.parent().unwrap_or(path);
    let mut cmd = Command::new("xdg-open");
    cmd.arg(dir);
    cmd
}

// ============================================================================
// Window chrome
// ============================================================================

/// Landscape lock maps to window fullscreen; the status bar maps to the
/// window decorations.
pub struct WindowChrome {
    ctx: egui::Context,
}

impl WindowChrome {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx }
    }
}

impl DeviceChrome for WindowChrome {
    fn lock_orientation(&mut self, orientation: Orientation) -> Result<(), ChromeError> {
        let fullscreen = orientation == Orientation::Landscape;
        self.ctx
            .send_viewport_cmd(egui::ViewportCommand::Fullscreen(fullscreen));
        Ok(())
    }

    fn set_status_bar_hidden(&mut self, hidden: bool) -> Result<(), ChromeError> {
        self.ctx
            .send_viewport_cmd(egui::ViewportCommand::Decorations(!hidden));
        Ok(())
    }
}
