//! Single-shot UI timers
//!
//! At most one timer per [`TimerKind`] is armed. Every schedule or cancel
//! bumps a generation counter, so a fire carrying an old [`TimerHandle`] is
//! recognized as stale and ignored.

use std::time::Instant;

/// Time source for the controller.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    AutoHide,
    LoadingWatchdog,
    VolumeIndicator,
}

impl TimerKind {
    const ALL: [TimerKind; 3] = [
        TimerKind::AutoHide,
        TimerKind::LoadingWatchdog,
        TimerKind::VolumeIndicator,
    ];

    fn slot(self) -> usize {
        match self {
            TimerKind::AutoHide => 0,
            TimerKind::LoadingWatchdog => 1,
            TimerKind::VolumeIndicator => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    pub kind: TimerKind,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    handle: TimerHandle,
    deadline: Instant,
}

#[derive(Debug, Default)]
pub struct Timers {
    slots: [Option<Armed>; 3],
    generation: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind`, replacing whatever was armed for it.
    pub fn schedule(&mut self, kind: TimerKind, deadline: Instant) -> TimerHandle {
        self.generation += 1;
        let handle = TimerHandle {
            kind,
            generation: self.generation,
        };
        self.slots[kind.slot()] = Some(Armed { handle, deadline });
        handle
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        if self.slots[kind.slot()].take().is_some() {
            self.generation += 1;
        }
    }

    pub fn cancel_all(&mut self) {
        for kind in TimerKind::ALL {
            self.cancel(kind);
        }
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.slots[kind.slot()].map(|armed| armed.deadline)
    }

    /// True while `handle` is the armed timer for its kind.
    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.slots[handle.kind.slot()].map(|armed| armed.handle) == Some(handle)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().flatten().map(|armed| armed.deadline).min()
    }

    /// Disarm and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerHandle> {
        let mut due: Vec<Armed> = self
            .slots
            .iter_mut()
            .filter(|slot| matches!(slot, Some(armed) if armed.deadline <= now))
            .filter_map(Option::take)
            .collect();
        due.sort_by_key(|armed| armed.deadline);
        due.into_iter().map(|armed| armed.handle).collect()
    }
}
