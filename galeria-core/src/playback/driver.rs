//! Async session driver
//!
//! Runs a controller on a tokio event loop: decoder events, UI commands and
//! timer deadlines are processed one at a time, each to completion. After
//! every step the session is published on a watch channel for the UI.
//!
//! This is an optional host for async front ends. A frame-driven UI can
//! instead own the controller directly, draining player events and calling
//! [`PlaybackController::fire_due_timers`] once per frame.

use crate::media::MediaRecord;
use crate::playback::chrome::DeviceChrome;
use crate::playback::controller::PlaybackController;
use crate::playback::player::{EventReceiver, PlayerBackend};
use crate::playback::session::{PlaybackRate, PlaybackSession};
use crate::playback::timers::Clock;
use std::time::Instant;
use tokio::sync::{mpsc, watch};

/// Clock that follows tokio's (pausable) time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    Bind { media: MediaRecord, auto_play: bool },
    Retry,
    TogglePlayPause,
    Replay,
    Seek(i64),
    SeekRelative(i64),
    SetMuted(bool),
    SetVolume(f32),
    SetRate(PlaybackRate),
    ToggleSpeedMenu,
    ToggleFullscreen,
    ToggleControls,
    Close,
}

/// UI side of a running driver.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    commands: mpsc::UnboundedSender<Command>,
    session: watch::Receiver<PlaybackSession>,
}

impl DriverHandle {
    /// Returns false once the driver has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn session(&self) -> PlaybackSession {
        self.session.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<PlaybackSession> {
        self.session.clone()
    }
}

pub struct SessionDriver<B: PlayerBackend, C: DeviceChrome> {
    controller: PlaybackController<B, C>,
    events: EventReceiver,
    commands: mpsc::UnboundedReceiver<Command>,
    session: watch::Sender<PlaybackSession>,
}

impl<B: PlayerBackend, C: DeviceChrome> SessionDriver<B, C> {
    /// `events` must be the receiving half of the channel the controller
    /// was built with.
    pub fn new(controller: PlaybackController<B, C>, events: EventReceiver) -> (Self, DriverHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (session_tx, session_rx) = watch::channel(controller.session().clone());

        let driver = Self {
            controller,
            events,
            commands: command_rx,
            session: session_tx,
        };
        let handle = DriverHandle {
            commands: command_tx,
            session: session_rx,
        };
        (driver, handle)
    }

    /// Process until every [`DriverHandle`] is dropped, then hand the
    /// controller back.
    pub async fn run(mut self) -> PlaybackController<B, C> {
        tracing::debug!("Session driver started");
        loop {
            let deadline = self.controller.next_deadline();

            tokio::select! {
                Some(event) = self.events.recv() => {
                    self.controller.handle_event(event);
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
                _ = sleep_until(deadline) => {
                    self.controller.fire_due_timers();
                }
            }

            self.session.send_replace(self.controller.session().clone());
        }

        tracing::debug!("Session driver stopped");
        self.controller
    }

    fn apply(&mut self, command: Command) {
        let controller = &mut self.controller;
        match command {
            Command::Bind { media, auto_play } => controller.bind_with(media, auto_play),
            Command::Retry => controller.retry(),
            Command::TogglePlayPause => controller.toggle_play_pause(),
            Command::Replay => controller.replay(),
            Command::Seek(target) => controller.seek(target),
            Command::SeekRelative(delta) => controller.seek_relative(delta),
            Command::SetMuted(muted) => controller.set_muted(muted),
            Command::SetVolume(volume) => controller.set_volume(volume),
            Command::SetRate(rate) => controller.set_rate(rate),
            Command::ToggleSpeedMenu => controller.toggle_speed_menu(),
            Command::ToggleFullscreen => controller.toggle_fullscreen(),
            Command::ToggleControls => controller.toggle_controls_visibility(),
            Command::Close => controller.close(),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending::<()>().await,
    }
}
