//! Player abstraction
//!
//! A [`PlayerBackend`] opens one native player per binding. Native callbacks
//! are collapsed into a single [`PlayerEvent`] stream tagged with the
//! binding they came from, so events from a torn-down binding can be told
//! apart and dropped.

use crate::error::PlayerError;
use crate::playback::session::PlaybackRate;
use std::fmt;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Identity of one player binding. Never reused within a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u64);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "binding#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEventKind {
    /// Metadata is available.
    Ready { duration_ms: u64 },
    PlayingChanged(bool),
    TimeUpdate {
        position_ms: u64,
        duration_ms: Option<u64>,
    },
    SeekCompleted { position_ms: u64 },
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEvent {
    pub binding: BindingId,
    pub kind: PlayerEventKind,
}

pub type EventSender = UnboundedSender<PlayerEvent>;
pub type EventReceiver = UnboundedReceiver<PlayerEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Event sender handed to one binding. Tags everything it sends.
#[derive(Debug, Clone)]
pub struct EventSink {
    binding: BindingId,
    tx: EventSender,
}

impl EventSink {
    pub fn new(binding: BindingId, tx: EventSender) -> Self {
        Self { binding, tx }
    }

    pub fn binding(&self) -> BindingId {
        self.binding
    }

    /// Returns false once the controller side has gone away.
    pub fn emit(&self, kind: PlayerEventKind) -> bool {
        self.tx
            .send(PlayerEvent {
                binding: self.binding,
                kind,
            })
            .is_ok()
    }
}

/// A live native player bound to one media URI.
pub trait Player {
    fn play(&mut self) -> Result<(), PlayerError>;

    fn pause(&mut self) -> Result<(), PlayerError>;

    fn seek(&mut self, position_ms: u64) -> Result<(), PlayerError>;

    fn set_muted(&mut self, muted: bool) -> Result<(), PlayerError>;

    fn set_volume(&mut self, volume: f32) -> Result<(), PlayerError>;

    fn set_rate(&mut self, rate: PlaybackRate) -> Result<(), PlayerError>;

    /// Stop playback, detach native listeners and free decoder resources.
    fn release(&mut self);
}

/// Creates players. One call per binding.
pub trait PlayerBackend {
    fn open(&mut self, uri: &str, events: EventSink) -> Result<Box<dyn Player>, PlayerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_tags_events_with_binding() {
        let (tx, mut rx) = event_channel();
        let sink = EventSink::new(BindingId(7), tx);

        assert!(sink.emit(PlayerEventKind::PlayingChanged(true)));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.binding, BindingId(7));
        assert_eq!(event.kind, PlayerEventKind::PlayingChanged(true));

        drop(rx);
        assert!(!sink.emit(PlayerEventKind::PlayingChanged(false)));
    }
}
