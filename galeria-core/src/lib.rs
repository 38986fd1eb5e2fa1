//! # Galeria Core
//!
//! Local media gallery: picking, storing and listing photos and videos, and
//! the controller behind the video viewer.

// ============================================================================
// Foundation
// ============================================================================
pub mod config;
pub mod error;
pub mod notice;

// ============================================================================
// Media Store
// ============================================================================
pub mod library;
pub mod media;
pub mod picker;
pub mod store;

// ============================================================================
// Views
// ============================================================================
pub mod gallery;
pub mod playback;

// ============================================================================
// Version
// ============================================================================
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
