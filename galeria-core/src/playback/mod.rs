//! Video playback: player abstraction, session state, timers and the
//! controller that ties them together.

pub mod chrome;
pub mod controller;
pub mod driver;
pub mod player;
pub mod session;
pub mod timers;

pub use chrome::{DeviceChrome, NoChrome, Orientation};
pub use controller::PlaybackController;
pub use driver::{Command, DriverHandle, SessionDriver, TokioClock};
pub use player::{
    event_channel, BindingId, EventReceiver, EventSender, EventSink, Player, PlayerBackend,
    PlayerEvent, PlayerEventKind,
};
pub use session::{PlaybackRate, PlaybackSession, PlayerState};
pub use timers::{Clock, SystemClock, TimerHandle, TimerKind, Timers};
