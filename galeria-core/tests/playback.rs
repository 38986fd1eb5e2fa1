use chrono::Utc;
use galeria_core::config::PlaybackConfig;
use galeria_core::error::{ChromeError, PlayerError};
use galeria_core::media::{MediaRecord, MediaType};
use galeria_core::notice::Severity;
use galeria_core::playback::{
    event_channel, BindingId, Clock, DeviceChrome, EventReceiver, EventSink, Orientation,
    PlaybackController, PlaybackRate, Player, PlayerBackend, PlayerEvent, PlayerEventKind,
    PlayerState, TimerKind,
};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

// ============================================================================
// Fakes
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Play,
    Pause,
    Seek(u64),
    Muted(bool),
    Volume(f32),
    Rate(PlaybackRate),
}

#[derive(Debug, Default)]
struct Log {
    opened: Vec<(BindingId, String)>,
    released: Vec<BindingId>,
    calls: Vec<(BindingId, Call)>,
    live: usize,
    max_live: usize,
}

impl Log {
    fn calls_for(&self, binding: BindingId) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|(id, _)| *id == binding)
            .map(|(_, call)| call.clone())
            .collect()
    }
}

#[derive(Default)]
struct MockBackend {
    log: Rc<RefCell<Log>>,
    fail_open: Rc<Cell<bool>>,
    fail_play: Rc<Cell<bool>>,
}

struct MockPlayer {
    events: EventSink,
    log: Rc<RefCell<Log>>,
    fail_play: Rc<Cell<bool>>,
}

impl MockPlayer {
    fn record(&self, call: Call) {
        self.log
            .borrow_mut()
            .calls
            .push((self.events.binding(), call));
    }
}

impl Player for MockPlayer {
    fn play(&mut self) -> Result<(), PlayerError> {
        if self.fail_play.get() {
            return Err(PlayerError::Command("decoder gone".into()));
        }
        self.record(Call::Play);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.record(Call::Pause);
        Ok(())
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), PlayerError> {
        self.record(Call::Seek(position_ms));
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), PlayerError> {
        self.record(Call::Muted(muted));
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), PlayerError> {
        self.record(Call::Volume(volume));
        Ok(())
    }

    fn set_rate(&mut self, rate: PlaybackRate) -> Result<(), PlayerError> {
        self.record(Call::Rate(rate));
        Ok(())
    }

    fn release(&mut self) {
        let mut log = self.log.borrow_mut();
        log.released.push(self.events.binding());
        log.live -= 1;
    }
}

impl PlayerBackend for MockBackend {
    fn open(&mut self, uri: &str, events: EventSink) -> Result<Box<dyn Player>, PlayerError> {
        if self.fail_open.get() {
            return Err(PlayerError::Open {
                uri: uri.to_string(),
                reason: "unsupported codec".into(),
            });
        }

        let mut log = self.log.borrow_mut();
        log.opened.push((events.binding(), uri.to_string()));
        log.live += 1;
        log.max_live = log.max_live.max(log.live);

        Ok(Box::new(MockPlayer {
            events,
            log: self.log.clone(),
            fail_play: self.fail_play.clone(),
        }))
    }
}

#[derive(Debug, Default)]
struct ChromeLog {
    orientation: Vec<Orientation>,
    status_bar_hidden: Vec<bool>,
}

#[derive(Default)]
struct MockChrome {
    log: Rc<RefCell<ChromeLog>>,
    refuse: bool,
}

impl DeviceChrome for MockChrome {
    fn lock_orientation(&mut self, orientation: Orientation) -> Result<(), ChromeError> {
        if self.refuse {
            return Err(ChromeError::Orientation("locked by system".into()));
        }
        self.log.borrow_mut().orientation.push(orientation);
        Ok(())
    }

    fn set_status_bar_hidden(&mut self, hidden: bool) -> Result<(), ChromeError> {
        self.log.borrow_mut().status_bar_hidden.push(hidden);
        Ok(())
    }
}

#[derive(Clone)]
struct ManualClock(Rc<Cell<Instant>>);

impl ManualClock {
    fn new() -> Self {
        Self(Rc::new(Cell::new(Instant::now())))
    }

    fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.0.get()
    }
}

// ============================================================================
// Harness
// ============================================================================

type Controller = PlaybackController<MockBackend, MockChrome>;

struct Harness {
    controller: Controller,
    log: Rc<RefCell<Log>>,
    chrome: Rc<RefCell<ChromeLog>>,
    fail_open: Rc<Cell<bool>>,
    fail_play: Rc<Cell<bool>>,
    clock: ManualClock,
    _events: EventReceiver,
}

impl Harness {
    fn new() -> Self {
        Self::with_chrome(false)
    }

    fn with_chrome(refuse: bool) -> Self {
        let backend = MockBackend::default();
        let log = backend.log.clone();
        let fail_open = backend.fail_open.clone();
        let fail_play = backend.fail_play.clone();
        let chrome = MockChrome {
            refuse,
            ..MockChrome::default()
        };
        let chrome_log = chrome.log.clone();
        let clock = ManualClock::new();
        let (tx, rx) = event_channel();

        let controller = PlaybackController::new(backend, chrome, PlaybackConfig::default(), tx)
            .with_clock(clock.clone());

        Self {
            controller,
            log,
            chrome: chrome_log,
            fail_open,
            fail_play,
            clock,
            _events: rx,
        }
    }

    fn binding(&self) -> BindingId {
        self.controller.binding_id().unwrap()
    }

    fn emit(&mut self, kind: PlayerEventKind) {
        let binding = self.binding();
        self.controller.handle_event(PlayerEvent { binding, kind });
    }

    fn advance(&mut self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
        self.controller.fire_due_timers();
    }

    /// Bind `id` and bring it to `Playing` with the given duration.
    fn playing(&mut self, id: &str, duration_ms: u64) {
        self.controller.bind_with(video(id), true);
        self.emit(PlayerEventKind::Ready { duration_ms });
        assert_eq!(self.controller.state(), PlayerState::Playing);
    }
}

fn video(id: &str) -> MediaRecord {
    MediaRecord {
        id: id.to_string(),
        source_uri: format!("file:///DCIM/{}.mp4", id),
        local_uri: PathBuf::from(format!("/data/galeria/1_{}.mp4", id)),
        media_type: MediaType::Video,
        filename: format!("{}.mp4", id),
        created_at: Utc::now(),
        saved_at: Utc::now(),
        file_size: 1024,
        width: Some(1920),
        height: Some(1080),
        duration_ms: None,
        thumbnail_uri: None,
    }
}

// ============================================================================
// Binding lifecycle
// ============================================================================

#[test]
fn test_bind_opens_player_and_arms_watchdog() {
    let mut h = Harness::new();
    h.controller.bind(video("a"));

    assert_eq!(h.controller.state(), PlayerState::Loading);
    assert!(h.controller.timer_armed(TimerKind::LoadingWatchdog));
    assert_eq!(
        h.controller.timer_deadline(TimerKind::LoadingWatchdog),
        Some(h.clock.now() + Duration::from_secs(10))
    );

    let log = h.log.borrow();
    assert_eq!(log.opened.len(), 1);
    assert_eq!(log.opened[0].1, "/data/galeria/1_a.mp4");
    assert_eq!(
        log.calls_for(log.opened[0].0),
        vec![
            Call::Volume(1.0),
            Call::Muted(false),
            Call::Rate(PlaybackRate::Normal)
        ]
    );
}

#[test]
fn test_ready_without_auto_play_waits() {
    let mut h = Harness::new();
    h.controller.bind_with(video("a"), false);
    h.emit(PlayerEventKind::Ready {
        duration_ms: 30_000,
    });

    assert_eq!(h.controller.state(), PlayerState::Ready);
    assert_eq!(h.controller.session().duration_ms, 30_000);
    assert!(!h.controller.timer_armed(TimerKind::LoadingWatchdog));
    assert!(!h.log.borrow().calls_for(h.binding()).contains(&Call::Play));
}

#[test]
fn test_rebind_resets_settings_and_tears_down_previous() {
    let mut h = Harness::new();
    h.playing("a", 60_000);
    let first = h.binding();

    h.controller.set_rate(PlaybackRate::OneAndHalf);
    h.controller.set_muted(true);
    h.controller.set_volume(0.4);

    h.controller.bind_with(video("b"), false);
    let second = h.binding();
    assert_ne!(first, second);

    let session = h.controller.session();
    assert_eq!(session.player_state, PlayerState::Loading);
    assert_eq!(session.rate, PlaybackRate::Normal);
    assert!(!session.muted);
    assert_eq!(session.volume, 0.4);
    assert_eq!(session.position_ms, 0);
    assert_eq!(session.bound_media.as_ref().unwrap().id, "b");

    let log = h.log.borrow();
    assert_eq!(log.released, vec![first]);
    assert_eq!(log.max_live, 1);
    assert_eq!(log.live, 1);
}

#[test]
fn test_events_from_previous_binding_are_dropped() {
    let mut h = Harness::new();
    h.controller.bind_with(video("a"), false);
    let first = h.binding();
    h.controller.bind_with(video("b"), false);

    h.controller.handle_event(PlayerEvent {
        binding: first,
        kind: PlayerEventKind::Ready {
            duration_ms: 99_000,
        },
    });
    h.controller.handle_event(PlayerEvent {
        binding: first,
        kind: PlayerEventKind::Error("late failure".into()),
    });

    assert_eq!(h.controller.state(), PlayerState::Loading);
    assert_eq!(h.controller.session().duration_ms, 0);
    assert!(h.controller.take_notices().is_empty());
}

#[test]
fn test_binding_same_item_twice_is_a_no_op() {
    let mut h = Harness::new();
    h.playing("a", 10_000);
    let binding = h.binding();

    h.controller.bind(video("a"));

    assert_eq!(h.binding(), binding);
    assert_eq!(h.controller.state(), PlayerState::Playing);
    assert_eq!(h.log.borrow().opened.len(), 1);
}

#[test]
fn test_close_is_idempotent_and_ignores_late_events() {
    let mut h = Harness::new();
    h.playing("a", 10_000);
    h.controller.toggle_fullscreen();
    let binding = h.binding();

    h.controller.close();
    h.controller.close();

    assert_eq!(h.controller.state(), PlayerState::Idle);
    assert!(!h.controller.is_bound());
    assert!(!h.controller.session().fullscreen);
    assert_eq!(h.controller.next_deadline(), None);
    assert_eq!(h.log.borrow().released, vec![binding]);
    assert_eq!(
        h.chrome.borrow().orientation.last(),
        Some(&Orientation::Portrait)
    );
    assert_eq!(h.chrome.borrow().status_bar_hidden.last(), Some(&false));

    h.controller.handle_event(PlayerEvent {
        binding,
        kind: PlayerEventKind::PlayingChanged(true),
    });
    assert_eq!(h.controller.state(), PlayerState::Idle);
}

#[test]
fn test_open_failure_enters_error() {
    let mut h = Harness::new();
    h.fail_open.set(true);
    h.controller.bind(video("a"));

    assert_eq!(h.controller.state(), PlayerState::Error);
    assert!(!h.controller.is_bound());
    assert!(h.controller.session().error.is_some());
    let notices = h.controller.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].severity, Severity::Error);
}

// ============================================================================
// Errors and retry
// ============================================================================

#[test]
fn test_error_then_retry_opens_fresh_binding() {
    let mut h = Harness::new();
    h.playing("a", 20_000);
    h.controller.set_rate(PlaybackRate::Double);
    let first = h.binding();

    h.emit(PlayerEventKind::Error("network lost".into()));
    let session = h.controller.session();
    assert_eq!(session.player_state, PlayerState::Error);
    assert_eq!(session.position_ms, 0);
    assert!(session.controls_visible);
    assert_eq!(session.error.as_deref(), Some("network lost"));
    assert_eq!(h.controller.next_deadline(), None);

    // Transport is inert while in error.
    h.controller.toggle_play_pause();
    h.controller.seek(5_000);
    assert_eq!(h.controller.state(), PlayerState::Error);

    h.controller.retry();
    let second = h.binding();
    assert_ne!(first, second);
    assert_eq!(h.controller.state(), PlayerState::Loading);
    assert_eq!(h.controller.session().rate, PlaybackRate::Double);
    assert_eq!(h.controller.session().error, None);
    assert!(h
        .log
        .borrow()
        .calls_for(second)
        .contains(&Call::Rate(PlaybackRate::Double)));
}

#[test]
fn test_retry_outside_error_does_nothing() {
    let mut h = Harness::new();
    h.controller.retry();
    assert_eq!(h.controller.state(), PlayerState::Idle);

    h.playing("a", 20_000);
    let binding = h.binding();
    h.controller.retry();
    assert_eq!(h.binding(), binding);
}

#[test]
fn test_failed_play_command_enters_error() {
    let mut h = Harness::new();
    h.controller.bind_with(video("a"), false);
    h.emit(PlayerEventKind::Ready {
        duration_ms: 20_000,
    });

    h.fail_play.set(true);
    h.controller.toggle_play_pause();

    assert_eq!(h.controller.state(), PlayerState::Error);
    assert!(!h.controller.timer_armed(TimerKind::AutoHide));
}

// ============================================================================
// Seeking
// ============================================================================

#[test]
fn test_seek_clamps_to_duration() {
    let mut h = Harness::new();
    h.playing("a", 30_000);

    h.controller.seek(50_000);
    assert_eq!(h.controller.session().position_ms, 30_000);

    h.controller.seek(-1_000);
    assert_eq!(h.controller.session().position_ms, 0);

    let calls = h.log.borrow().calls_for(h.binding());
    assert!(calls.contains(&Call::Seek(30_000)));
    assert!(calls.contains(&Call::Seek(0)));
}

#[test]
fn test_skip_buttons_move_ten_seconds() {
    let mut h = Harness::new();
    h.playing("a", 30_000);

    h.controller.skip_forward();
    assert_eq!(h.controller.session().position_ms, 10_000);
    h.controller.skip_forward();
    h.controller.skip_forward();
    assert_eq!(h.controller.session().position_ms, 30_000);
    h.controller.skip_backward();
    assert_eq!(h.controller.session().position_ms, 20_000);
}

#[test]
fn test_seek_with_huge_duration_clamps() {
    let mut h = Harness::new();
    h.playing("a", u64::MAX);

    h.controller.seek(5_000);
    assert_eq!(h.controller.session().position_ms, 5_000);

    h.controller.seek(i64::MAX);
    assert_eq!(h.controller.session().position_ms, i64::MAX as u64);

    h.controller.seek_relative(i64::MAX);
    assert_eq!(h.controller.session().position_ms, i64::MAX as u64);
}

#[test]
fn test_seek_relative_saturates() {
    let mut h = Harness::new();
    h.playing("a", 30_000);
    h.controller.seek(10_000);

    h.controller.seek_relative(i64::MAX);
    assert_eq!(h.controller.session().position_ms, 30_000);

    h.controller.seek_relative(i64::MIN);
    assert_eq!(h.controller.session().position_ms, 0);
}

#[test]
fn test_seek_without_duration_is_ignored() {
    let mut h = Harness::new();
    h.controller.bind_with(video("a"), false);
    h.controller.seek(1_000);
    assert_eq!(h.controller.session().position_ms, 0);

    // Watchdog fires: ready, but duration still unknown.
    h.advance(10_000);
    assert_eq!(h.controller.state(), PlayerState::Ready);
    assert_eq!(h.controller.session().duration_ms, 0);

    h.controller.seek(1_000);
    assert_eq!(h.controller.session().position_ms, 0);
    assert!(!h
        .log
        .borrow()
        .calls_for(h.binding())
        .iter()
        .any(|c| matches!(c, Call::Seek(_))));
}

#[test]
fn test_optimistic_seek_survives_one_stale_update() {
    let mut h = Harness::new();
    h.playing("a", 60_000);
    h.emit(PlayerEventKind::TimeUpdate {
        position_ms: 5_000,
        duration_ms: Some(60_000),
    });

    h.controller.seek(40_000);
    assert_eq!(h.controller.session().position_ms, 40_000);

    // Report from before the seek landed.
    h.emit(PlayerEventKind::TimeUpdate {
        position_ms: 5_250,
        duration_ms: None,
    });
    assert_eq!(h.controller.session().position_ms, 40_000);

    // Decoder caught up.
    h.emit(PlayerEventKind::TimeUpdate {
        position_ms: 40_200,
        duration_ms: None,
    });
    assert_eq!(h.controller.session().position_ms, 40_200);

    h.emit(PlayerEventKind::TimeUpdate {
        position_ms: 41_200,
        duration_ms: None,
    });
    assert_eq!(h.controller.session().position_ms, 41_200);
}

#[test]
fn test_decoder_wins_when_seek_never_lands() {
    let mut h = Harness::new();
    h.playing("a", 60_000);

    h.controller.seek(40_000);
    h.emit(PlayerEventKind::TimeUpdate {
        position_ms: 5_000,
        duration_ms: None,
    });
    h.emit(PlayerEventKind::TimeUpdate {
        position_ms: 6_000,
        duration_ms: None,
    });

    assert_eq!(h.controller.session().position_ms, 6_000);
}

#[test]
fn test_time_update_with_duration_counts_as_ready() {
    let mut h = Harness::new();
    h.controller.bind_with(video("a"), false);

    h.emit(PlayerEventKind::TimeUpdate {
        position_ms: 0,
        duration_ms: None,
    });
    assert_eq!(h.controller.state(), PlayerState::Loading);

    h.emit(PlayerEventKind::TimeUpdate {
        position_ms: 120,
        duration_ms: Some(45_000),
    });
    assert_eq!(h.controller.state(), PlayerState::Ready);
    assert_eq!(h.controller.session().duration_ms, 45_000);
    assert_eq!(h.controller.session().position_ms, 120);
}

// ============================================================================
// Controls and timers
// ============================================================================

#[test]
fn test_auto_hide_after_three_seconds_of_playback() {
    let mut h = Harness::new();
    h.playing("a", 60_000);
    assert!(h.controller.session().controls_visible);

    h.advance(2_999);
    assert!(h.controller.session().controls_visible);

    h.advance(1);
    assert!(!h.controller.session().controls_visible);
}

#[test]
fn test_interaction_restarts_auto_hide() {
    let mut h = Harness::new();
    h.playing("a", 60_000);

    h.advance(2_000);
    h.controller.set_volume(0.5);
    h.advance(2_000);
    assert!(h.controller.session().controls_visible);

    h.advance(1_000);
    assert!(!h.controller.session().controls_visible);
}

#[test]
fn test_paused_never_arms_auto_hide() {
    let mut h = Harness::new();
    h.playing("a", 60_000);
    h.controller.toggle_play_pause();
    assert_eq!(h.controller.state(), PlayerState::Paused);
    assert!(!h.controller.timer_armed(TimerKind::AutoHide));

    for _ in 0..5 {
        h.controller.toggle_controls_visibility();
        assert!(!h.controller.timer_armed(TimerKind::AutoHide));
    }
    h.controller.toggle_speed_menu();
    h.controller.set_muted(true);
    assert!(!h.controller.timer_armed(TimerKind::AutoHide));

    h.advance(10_000);
    assert!(h.controller.session().controls_visible);
}

#[test]
fn test_pause_event_shows_controls() {
    let mut h = Harness::new();
    h.playing("a", 60_000);
    h.advance(3_000);
    assert!(!h.controller.session().controls_visible);

    h.emit(PlayerEventKind::PlayingChanged(false));
    assert_eq!(h.controller.state(), PlayerState::Paused);
    assert!(h.controller.session().controls_visible);
}

#[test]
fn test_hiding_controls_closes_speed_menu() {
    let mut h = Harness::new();
    h.playing("a", 60_000);
    h.controller.toggle_speed_menu();
    assert!(h.controller.session().speed_menu_open);

    h.controller.toggle_controls_visibility();
    let session = h.controller.session();
    assert!(!session.controls_visible);
    assert!(!session.speed_menu_open);
    assert!(!h.controller.timer_armed(TimerKind::AutoHide));
}

#[test]
fn test_rate_selection_closes_menu() {
    let mut h = Harness::new();
    h.playing("a", 60_000);
    h.controller.toggle_speed_menu();
    h.controller.set_rate(PlaybackRate::ThreeQuarters);

    assert!(!h.controller.session().speed_menu_open);
    assert_eq!(h.controller.session().rate, PlaybackRate::ThreeQuarters);
    assert!(h
        .log
        .borrow()
        .calls_for(h.binding())
        .contains(&Call::Rate(PlaybackRate::ThreeQuarters)));
}

#[test]
fn test_volume_indicator_hides_itself() {
    let mut h = Harness::new();
    h.controller.bind_with(video("a"), false);
    h.controller.set_volume(1.7);

    assert_eq!(h.controller.session().volume, 1.0);
    assert!(h.controller.session().volume_indicator_visible);

    h.advance(1_200);
    assert!(!h.controller.session().volume_indicator_visible);
}

#[test]
fn test_replay_from_end() {
    let mut h = Harness::new();
    h.playing("a", 10_000);
    h.emit(PlayerEventKind::TimeUpdate {
        position_ms: 10_000,
        duration_ms: None,
    });
    h.emit(PlayerEventKind::PlayingChanged(false));
    assert!(h.controller.session().at_end());

    h.controller.replay();
    assert_eq!(h.controller.state(), PlayerState::Playing);
    assert_eq!(h.controller.session().position_ms, 0);
}

// ============================================================================
// Fullscreen
// ============================================================================

#[test]
fn test_fullscreen_locks_landscape_and_hides_status_bar() {
    let mut h = Harness::new();
    h.playing("a", 10_000);

    h.controller.toggle_fullscreen();
    assert!(h.controller.session().fullscreen);
    assert_eq!(
        h.chrome.borrow().orientation.last(),
        Some(&Orientation::Landscape)
    );
    assert_eq!(h.chrome.borrow().status_bar_hidden.last(), Some(&true));

    h.controller.toggle_fullscreen();
    assert!(!h.controller.session().fullscreen);
    assert_eq!(
        h.chrome.borrow().orientation.last(),
        Some(&Orientation::Portrait)
    );
}

#[test]
fn test_refused_fullscreen_still_flips_and_warns() {
    let mut h = Harness::with_chrome(true);
    h.playing("a", 10_000);

    h.controller.toggle_fullscreen();

    assert!(h.controller.session().fullscreen);
    assert_eq!(h.controller.state(), PlayerState::Playing);
    let notices = h.controller.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].severity, Severity::Warning);
    // The status bar is still asked to hide.
    assert_eq!(h.chrome.borrow().status_bar_hidden, vec![true]);
}
