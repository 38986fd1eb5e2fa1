//! In-memory gallery list
//!
//! Owns the records the UI renders and keeps them in step with the store.
//! The list only changes after the store operation behind it succeeded;
//! failures become notices.

use crate::error::{PickError, StoreError};
use crate::media::{MediaRecord, MediaType, PickedAsset};
use crate::notice::{Notice, Notices};
use crate::picker::{pick_media, share_media, MediaPicker, ShareSheet};
use crate::store::MediaStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Active,
    Inactive,
    Background,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStats {
    pub total: usize,
    pub videos: usize,
    pub images: usize,
    pub total_size: u64,
}

pub struct Library {
    store: MediaStore,
    items: Vec<MediaRecord>,
    notices: Notices,
    app_state: AppState,
}

impl Library {
    pub fn new(store: MediaStore) -> Self {
        Self {
            store,
            items: Vec::new(),
            notices: Notices::new(),
            app_state: AppState::Active,
        }
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// Prepare storage and load what is already saved.
    pub fn init(&mut self) {
        let loaded = self.store.init().and_then(|_| self.store.list());
        match loaded {
            Ok(items) => {
                tracing::info!("Loaded {} item(s)", items.len());
                self.items = items;
            }
            Err(e) => {
                tracing::error!("Error initializing gallery: {}", e);
                self.notices.push(Notice::error(
                    "Error",
                    "There was a problem loading the gallery",
                ));
            }
        }
    }

    /// Pick from the device and save the selection.
    pub fn add<P: MediaPicker>(&mut self, picker: &mut P) -> usize {
        match pick_media(picker, &mut self.notices) {
            Ok(Some(assets)) => self.add_assets(&assets),
            Ok(None) => 0,
            Err(e) => {
                self.report_pick_error(e);
                0
            }
        }
    }

    pub fn add_assets(&mut self, assets: &[PickedAsset]) -> usize {
        let result = self.store.save(assets);
        self.finish_add(result)
    }

    /// Apply the outcome of a save, e.g. one that ran on a worker thread.
    pub fn finish_add(&mut self, result: Result<Vec<MediaRecord>, StoreError>) -> usize {
        match result {
            Ok(saved) => {
                let count = saved.len();
                self.items.extend(saved);
                self.notices.push(Notice::info(
                    "Files added",
                    format!("{} file(s) added to your gallery", count),
                ));
                count
            }
            Err(e) => {
                tracing::error!("Error adding media: {}", e);
                self.notices
                    .push(Notice::error("Error", "The files could not be added"));
                0
            }
        }
    }

    pub fn report_pick_error(&mut self, e: PickError) {
        tracing::error!("Error picking media: {}", e);
        self.notices
            .push(Notice::error("Error", "The files could not be added"));
    }

    pub fn delete(&mut self, id: &str) -> bool {
        match self.store.delete(id) {
            Ok(()) => {
                self.items.retain(|item| item.id != id);
                true
            }
            Err(e) => {
                tracing::error!("Error deleting media {}: {}", id, e);
                self.notices
                    .push(Notice::error("Error", "The file could not be deleted"));
                false
            }
        }
    }

    pub fn share<S: ShareSheet>(&mut self, sheet: &mut S, id: &str) {
        let Some(item) = self.get(id) else {
            return;
        };
        let (uri, media_type) = (item.uri(), item.media_type);
        share_media(sheet, &uri, media_type, &mut self.notices);
    }

    pub fn refresh(&mut self) {
        match self.store.list() {
            Ok(items) => self.items = items,
            Err(e) => {
                tracing::error!("Error refreshing media: {}", e);
                self.notices
                    .push(Notice::error("Error", "The gallery could not be refreshed"));
            }
        }
    }

    /// Coming back to the foreground re-reads the listing.
    pub fn on_app_state(&mut self, next: AppState) {
        let was_away = matches!(self.app_state, AppState::Inactive | AppState::Background);
        self.app_state = next;
        if was_away && next == AppState::Active {
            tracing::debug!("App resumed, refreshing gallery");
            self.refresh();
        }
    }

    pub fn items(&self) -> &[MediaRecord] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&MediaRecord> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn by_type(&self, media_type: MediaType) -> Vec<&MediaRecord> {
        self.items
            .iter()
            .filter(|item| item.media_type == media_type)
            .collect()
    }

    pub fn stats(&self) -> MediaStats {
        let videos = self.by_type(MediaType::Video).len();
        MediaStats {
            total: self.items.len(),
            videos,
            images: self.items.len() - videos,
            total_size: self.items.iter().map(|item| item.file_size).sum(),
        }
    }

    pub fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }
}
