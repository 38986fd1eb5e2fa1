//! Playback session state
//!
//! Everything the overlay renders. Owned by the controller; the UI only
//! reads it.

use crate::media::MediaRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    /// Nothing bound
    Idle,
    /// Binding created, waiting for metadata
    Loading,
    /// Metadata available, not yet started
    Ready,
    Playing,
    Paused,
    /// Decoder failed; only `retry` leaves this state
    Error,
}

impl PlayerState {
    /// States in which the playback clock means something.
    pub fn has_clock(&self) -> bool {
        matches!(
            self,
            PlayerState::Ready | PlayerState::Playing | PlayerState::Paused
        )
    }
}

/// The fixed set of playback speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackRate {
    Half,
    ThreeQuarters,
    #[default]
    Normal,
    OneAndQuarter,
    OneAndHalf,
    Double,
}

impl PlaybackRate {
    pub const ALL: [PlaybackRate; 6] = [
        PlaybackRate::Half,
        PlaybackRate::ThreeQuarters,
        PlaybackRate::Normal,
        PlaybackRate::OneAndQuarter,
        PlaybackRate::OneAndHalf,
        PlaybackRate::Double,
    ];

    pub fn as_f32(&self) -> f32 {
        match self {
            PlaybackRate::Half => 0.5,
            PlaybackRate::ThreeQuarters => 0.75,
            PlaybackRate::Normal => 1.0,
            PlaybackRate::OneAndQuarter => 1.25,
            PlaybackRate::OneAndHalf => 1.5,
            PlaybackRate::Double => 2.0,
        }
    }

    /// Exact match against the supported speeds.
    pub fn from_f32(value: f32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|rate| (rate.as_f32() - value).abs() < f32::EPSILON)
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.as_f32())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub bound_media: Option<MediaRecord>,
    pub player_state: PlayerState,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub muted: bool,
    pub volume: f32,
    pub rate: PlaybackRate,
    pub controls_visible: bool,
    pub fullscreen: bool,
    pub speed_menu_open: bool,
    pub volume_indicator_visible: bool,
    /// Message of the last decoder error while in `Error`.
    pub error: Option<String>,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            bound_media: None,
            player_state: PlayerState::Idle,
            position_ms: 0,
            duration_ms: 0,
            muted: false,
            volume: 1.0,
            rate: PlaybackRate::Normal,
            controls_visible: true,
            fullscreen: false,
            speed_menu_open: false,
            volume_indicator_visible: false,
            error: None,
        }
    }
}

impl PlaybackSession {
    pub fn is_playing(&self) -> bool {
        self.player_state == PlayerState::Playing
    }

    /// Seek bar interaction needs a known, non-zero duration.
    pub fn can_seek(&self) -> bool {
        self.player_state.has_clock() && self.duration_ms > 0
    }

    /// 0..=100; zero when the duration is unknown.
    pub fn progress_percent(&self) -> f32 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.position_ms.min(self.duration_ms) as f64 / self.duration_ms as f64 * 100.0) as f32
    }

    /// Stopped at the end: the overlay offers replay.
    pub fn at_end(&self) -> bool {
        self.player_state.has_clock()
            && !self.is_playing()
            && self.duration_ms > 0
            && self.position_ms >= self.duration_ms
    }
}
