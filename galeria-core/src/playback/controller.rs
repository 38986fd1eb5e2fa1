//! Video playback controller
//!
//! Single reducer over user commands, decoder events and timer fires:
//!
//! ```text
//! Idle → Loading → Ready ⇄ Playing ⇄ Paused
//!          any ──error──▶ Error ──retry──▶ Loading
//! ```
//!
//! At most one player binding is live. Rebinding releases the previous
//! player before the next one is opened, and events or timer fires that
//! belong to a released binding are dropped.

use crate::config::PlaybackConfig;
use crate::error::PlayerError;
use crate::media::MediaRecord;
use crate::notice::{Notice, Notices};
use crate::playback::chrome::{DeviceChrome, Orientation};
use crate::playback::player::{
    BindingId, EventSender, EventSink, Player, PlayerBackend, PlayerEvent, PlayerEventKind,
};
use crate::playback::session::{PlaybackRate, PlaybackSession, PlayerState};
use crate::playback::timers::{Clock, SystemClock, TimerHandle, TimerKind, Timers};
use std::time::{Duration, Instant};

struct Binding {
    id: BindingId,
    player: Box<dyn Player>,
}

/// Optimistic seek waiting for the decoder to catch up.
#[derive(Debug, Clone, Copy)]
struct PendingSeek {
    target_ms: u64,
    /// Off-target time updates already ignored for this seek.
    skipped_updates: u8,
}

pub struct PlaybackController<B: PlayerBackend, C: DeviceChrome> {
    backend: B,
    chrome: C,
    clock: Box<dyn Clock>,
    config: PlaybackConfig,
    events: EventSender,
    session: PlaybackSession,
    binding: Option<Binding>,
    next_binding: u64,
    timers: Timers,
    pending_seek: Option<PendingSeek>,
    auto_play: bool,
    notices: Notices,
}

impl<B: PlayerBackend, C: DeviceChrome> PlaybackController<B, C> {
    pub fn new(backend: B, chrome: C, config: PlaybackConfig, events: EventSender) -> Self {
        Self {
            backend,
            chrome,
            clock: Box::new(SystemClock),
            config,
            events,
            session: PlaybackSession::default(),
            binding: None,
            next_binding: 0,
            timers: Timers::new(),
            pending_seek: None,
            auto_play: false,
            notices: Notices::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> PlayerState {
        self.session.player_state
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn binding_id(&self) -> Option<BindingId> {
        self.binding.as_ref().map(|b| b.id)
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn chrome(&self) -> &C {
        &self.chrome
    }

    pub fn timer_armed(&self, kind: TimerKind) -> bool {
        self.timers.is_armed(kind)
    }

    pub fn timer_deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.timers.deadline(kind)
    }

    /// Earliest armed timer, for hosts that sleep until something is due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    // ------------------------------------------------------------------
    // Binding lifecycle
    // ------------------------------------------------------------------

    /// Bind `media` using the configured auto-play preference.
    pub fn bind(&mut self, media: MediaRecord) {
        let auto_play = self.config.auto_play;
        self.bind_with(media, auto_play);
    }

    /// Bind `media`, tearing down whatever was bound before.
    ///
    /// Binding the item that is already live is a no-op unless it is in
    /// `Error`. A different item always starts from a fresh session with
    /// default rate and mute.
    pub fn bind_with(&mut self, media: MediaRecord, auto_play: bool) {
        if let Some(current) = &self.session.bound_media {
            if current.id == media.id
                && self.binding.is_some()
                && self.session.player_state != PlayerState::Error
            {
                tracing::debug!("{} already bound", media.id);
                return;
            }
        }

        self.release_binding();
        if self.session.fullscreen {
            self.restore_chrome();
        }

        tracing::info!("Binding {} ({})", media.filename, media.id);
        self.session = PlaybackSession {
            bound_media: Some(media),
            player_state: PlayerState::Loading,
            volume: self.session.volume,
            ..PlaybackSession::default()
        };
        self.auto_play = auto_play;
        self.open_binding();
    }

    /// Leave `Error` by opening a new binding for the same item.
    pub fn retry(&mut self) {
        if self.session.player_state != PlayerState::Error {
            return;
        }
        if self.session.bound_media.is_none() {
            return;
        }

        tracing::info!("Retrying playback");
        self.release_binding();
        self.session.player_state = PlayerState::Loading;
        self.session.position_ms = 0;
        self.session.duration_ms = 0;
        self.session.error = None;
        self.session.controls_visible = true;
        self.open_binding();
    }

    /// Release everything and return to `Idle`. Safe to call repeatedly.
    pub fn close(&mut self) {
        let active = self.binding.is_some()
            || self.session.player_state != PlayerState::Idle
            || self.session.fullscreen;
        if !active {
            return;
        }

        self.release_binding();
        self.restore_chrome();
        self.session = PlaybackSession {
            volume: self.session.volume,
            ..PlaybackSession::default()
        };
        tracing::info!("Playback closed");
    }

    fn open_binding(&mut self) {
        let Some(media) = self.session.bound_media.as_ref() else {
            return;
        };
        let uri = media.uri();

        self.next_binding += 1;
        let id = BindingId(self.next_binding);
        let sink = EventSink::new(id, self.events.clone());

        match self.backend.open(&uri, sink) {
            Ok(mut player) => {
                let session = &self.session;
                let applied = player
                    .set_volume(session.volume)
                    .and_then(|_| player.set_muted(session.muted))
                    .and_then(|_| player.set_rate(session.rate));
                if let Err(e) = applied {
                    tracing::warn!("Could not apply settings to {}: {}", id, e);
                }

                self.binding = Some(Binding { id, player });
                let deadline = self.clock.now() + self.config.loading_timeout();
                self.timers.schedule(TimerKind::LoadingWatchdog, deadline);
                tracing::debug!("Opened {} for {}", id, uri);
            }
            Err(e) => self.enter_error(e.to_string()),
        }
    }

    fn release_binding(&mut self) {
        if let Some(mut binding) = self.binding.take() {
            binding.player.release();
            tracing::debug!("Released {}", binding.id);
        }
        self.timers.cancel_all();
        self.pending_seek = None;
    }

    fn restore_chrome(&mut self) {
        if let Err(e) = self.chrome.lock_orientation(Orientation::Portrait) {
            tracing::warn!("Restoring orientation failed: {}", e);
        }
        if let Err(e) = self.chrome.set_status_bar_hidden(false) {
            tracing::warn!("Restoring status bar failed: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Decoder events
    // ------------------------------------------------------------------

    pub fn handle_event(&mut self, event: PlayerEvent) {
        let live = self.binding_id();
        if live != Some(event.binding) {
            tracing::debug!("Dropping stale event from {}", event.binding);
            return;
        }

        tracing::trace!("{}: {:?}", event.binding, event.kind);
        match event.kind {
            PlayerEventKind::Ready { duration_ms } => self.mark_ready(duration_ms),
            PlayerEventKind::PlayingChanged(true) => {
                if self.session.player_state == PlayerState::Loading {
                    self.mark_ready(self.session.duration_ms);
                }
                if matches!(
                    self.session.player_state,
                    PlayerState::Ready | PlayerState::Paused
                ) {
                    self.enter_playing();
                }
            }
            PlayerEventKind::PlayingChanged(false) => {
                if self.session.player_state == PlayerState::Playing {
                    self.enter_paused();
                }
            }
            PlayerEventKind::TimeUpdate {
                position_ms,
                duration_ms,
            } => self.on_time_update(position_ms, duration_ms),
            PlayerEventKind::SeekCompleted { position_ms } => {
                if self.session.player_state.has_clock() {
                    self.pending_seek = None;
                    self.session.position_ms = self.clamp_to_duration(position_ms);
                }
            }
            PlayerEventKind::Error(message) => self.enter_error(message),
        }
    }

    fn mark_ready(&mut self, duration_ms: u64) {
        if self.session.player_state != PlayerState::Loading {
            return;
        }

        self.timers.cancel(TimerKind::LoadingWatchdog);
        self.session.player_state = PlayerState::Ready;
        self.session.duration_ms = duration_ms;
        tracing::info!("Ready, duration {} ms", duration_ms);

        if self.auto_play {
            self.auto_play = false;
            if self.command(|p| p.play()).is_ok() {
                self.enter_playing();
            }
        }
    }

    fn on_time_update(&mut self, position_ms: u64, duration_ms: Option<u64>) {
        let duration_ms = duration_ms.filter(|d| *d > 0);

        if self.session.player_state == PlayerState::Loading {
            match duration_ms {
                Some(d) => self.mark_ready(d),
                None => return,
            }
        }
        if !self.session.player_state.has_clock() {
            return;
        }
        if let Some(d) = duration_ms {
            self.session.duration_ms = d;
        }

        let position_ms = self.clamp_to_duration(position_ms);
        match self.pending_seek {
            Some(pending)
                if position_ms.abs_diff(pending.target_ms) <= self.config.seek_tolerance_ms =>
            {
                self.pending_seek = None;
                self.session.position_ms = position_ms;
            }
            Some(mut pending) if pending.skipped_updates == 0 => {
                // One cycle of grace for a report that predates the seek.
                pending.skipped_updates += 1;
                self.pending_seek = Some(pending);
            }
            _ => {
                self.pending_seek = None;
                self.session.position_ms = position_ms;
            }
        }
    }

    fn enter_playing(&mut self) {
        self.session.player_state = PlayerState::Playing;
        if self.session.controls_visible {
            self.schedule(TimerKind::AutoHide, self.config.auto_hide());
        }
    }

    fn enter_paused(&mut self) {
        self.session.player_state = PlayerState::Paused;
        self.timers.cancel(TimerKind::AutoHide);
        self.session.controls_visible = true;
    }

    fn enter_error(&mut self, message: String) {
        tracing::warn!("Playback error: {}", message);
        self.timers.cancel_all();
        self.pending_seek = None;
        self.session.player_state = PlayerState::Error;
        self.session.position_ms = 0;
        self.session.controls_visible = true;
        self.session.speed_menu_open = false;
        self.session.volume_indicator_visible = false;
        self.session.error = Some(message);
        self.notices.push(Notice::error(
            "Playback error",
            "The video could not be played",
        ));
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Fire every timer whose deadline has passed.
    pub fn fire_due_timers(&mut self) {
        let now = self.clock.now();
        for handle in self.timers.take_due(now) {
            self.on_timer_kind(handle.kind);
        }
    }

    /// Fire one timer by handle; stale handles are ignored.
    pub fn on_timer(&mut self, handle: TimerHandle) {
        if !self.timers.is_live(handle) {
            tracing::debug!("Ignoring stale {:?} timer", handle.kind);
            return;
        }
        self.timers.cancel(handle.kind);
        self.on_timer_kind(handle.kind);
    }

    fn on_timer_kind(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::AutoHide => {
                if self.session.player_state == PlayerState::Playing
                    && self.session.controls_visible
                {
                    self.session.controls_visible = false;
                    self.session.speed_menu_open = false;
                }
            }
            TimerKind::LoadingWatchdog => {
                if self.session.player_state == PlayerState::Loading {
                    tracing::warn!("No ready signal, continuing without duration");
                    self.mark_ready(0);
                }
            }
            TimerKind::VolumeIndicator => {
                self.session.volume_indicator_visible = false;
            }
        }
    }

    fn schedule(&mut self, kind: TimerKind, after: Duration) -> TimerHandle {
        let deadline = self.clock.now() + after;
        self.timers.schedule(kind, deadline)
    }

    // ------------------------------------------------------------------
    // Transport commands
    // ------------------------------------------------------------------

    pub fn toggle_play_pause(&mut self) {
        if !self.session.player_state.has_clock() {
            return;
        }

        if self.session.player_state == PlayerState::Playing {
            if self.command(|p| p.pause()).is_ok() {
                self.enter_paused();
            }
        } else if self.command(|p| p.play()).is_ok() {
            self.enter_playing();
        }

        if self.session.player_state.has_clock() {
            self.touch_controls();
        }
    }

    /// Start again from the beginning after reaching the end.
    pub fn replay(&mut self) {
        if !self.session.can_seek() {
            return;
        }
        self.seek(0);
        if self.session.player_state.has_clock()
            && self.session.player_state != PlayerState::Playing
            && self.command(|p| p.play()).is_ok()
        {
            self.enter_playing();
        }
    }

    /// Seek to `target_ms`, clamped to the known duration.
    ///
    /// The position updates immediately; the next time update settles it.
    pub fn seek(&mut self, target_ms: i64) {
        if !self.session.can_seek() {
            tracing::debug!("Seek ignored, duration unknown");
            return;
        }

        let target = if target_ms <= 0 {
            0
        } else {
            (target_ms as u64).min(self.session.duration_ms)
        };
        if self.command(|p| p.seek(target)).is_err() {
            return;
        }

        self.session.position_ms = target;
        self.pending_seek = Some(PendingSeek {
            target_ms: target,
            skipped_updates: 0,
        });
        self.touch_controls();
    }

    pub fn seek_relative(&mut self, delta_ms: i64) {
        let position = i64::try_from(self.session.position_ms).unwrap_or(i64::MAX);
        self.seek(position.saturating_add(delta_ms));
    }

    pub fn skip_forward(&mut self) {
        self.seek_relative(self.skip_delta());
    }

    pub fn skip_backward(&mut self) {
        self.seek_relative(-self.skip_delta());
    }

    fn skip_delta(&self) -> i64 {
        i64::try_from(self.config.skip_ms).unwrap_or(i64::MAX)
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.session.muted = muted;
        self.apply_setting(|p| p.set_muted(muted));
        self.show_volume_indicator();
        self.touch_controls();
    }

    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.session.muted);
    }

    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.session.volume = volume;
        self.apply_setting(|p| p.set_volume(volume));
        self.show_volume_indicator();
        self.touch_controls();
    }

    pub fn set_rate(&mut self, rate: PlaybackRate) {
        self.session.rate = rate;
        self.apply_setting(|p| p.set_rate(rate));
        self.session.speed_menu_open = false;
        self.touch_controls();
    }

    pub fn toggle_speed_menu(&mut self) {
        self.session.speed_menu_open = !self.session.speed_menu_open;
        self.touch_controls();
    }

    /// Flip fullscreen and ask the device to follow. The flag flips even if
    /// the device refuses.
    pub fn toggle_fullscreen(&mut self) {
        let fullscreen = !self.session.fullscreen;
        self.session.fullscreen = fullscreen;

        let orientation = if fullscreen {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        if let Err(e) = self.chrome.lock_orientation(orientation) {
            tracing::warn!("Orientation lock failed: {}", e);
            self.notices.push(Notice::warning("Fullscreen", e.to_string()));
        }
        if let Err(e) = self.chrome.set_status_bar_hidden(fullscreen) {
            tracing::warn!("Status bar change failed: {}", e);
            self.notices.push(Notice::warning("Fullscreen", e.to_string()));
        }

        self.touch_controls();
    }

    pub fn toggle_controls_visibility(&mut self) {
        let visible = !self.session.controls_visible;
        self.session.controls_visible = visible;

        if visible {
            if self.session.player_state == PlayerState::Playing {
                self.schedule(TimerKind::AutoHide, self.config.auto_hide());
            }
        } else {
            self.timers.cancel(TimerKind::AutoHide);
            self.session.speed_menu_open = false;
        }
    }

    /// Any interaction with a control shows the overlay and restarts the
    /// auto-hide countdown.
    fn touch_controls(&mut self) {
        self.session.controls_visible = true;
        if self.session.player_state == PlayerState::Playing {
            self.schedule(TimerKind::AutoHide, self.config.auto_hide());
        } else {
            self.timers.cancel(TimerKind::AutoHide);
        }
    }

    fn show_volume_indicator(&mut self) {
        self.session.volume_indicator_visible = true;
        self.schedule(TimerKind::VolumeIndicator, self.config.volume_indicator());
    }

    fn clamp_to_duration(&self, position_ms: u64) -> u64 {
        if self.session.duration_ms > 0 {
            position_ms.min(self.session.duration_ms)
        } else {
            position_ms
        }
    }

    /// Transport command; a failure puts the session in `Error`.
    fn command(
        &mut self,
        op: impl FnOnce(&mut dyn Player) -> Result<(), PlayerError>,
    ) -> Result<(), PlayerError> {
        let Some(binding) = self.binding.as_mut() else {
            return Err(PlayerError::Command("no player bound".into()));
        };
        let result = op(binding.player.as_mut());
        if let Err(e) = &result {
            self.enter_error(e.to_string());
        }
        result
    }

    /// Setting change; a failure is only logged.
    fn apply_setting(&mut self, op: impl FnOnce(&mut dyn Player) -> Result<(), PlayerError>) {
        if let Some(binding) = self.binding.as_mut() {
            if let Err(e) = op(binding.player.as_mut()) {
                tracing::warn!("Player setting failed on {}: {}", binding.id, e);
            }
        }
    }
}

impl<B: PlayerBackend, C: DeviceChrome> Drop for PlaybackController<B, C> {
    fn drop(&mut self) {
        self.close();
    }
}
