//! Transport-only player backend.
//!
//! Runs the playback clock on a ticker thread and reports it through the
//! binding's event sink. No frames are decoded; the viewer renders the
//! overlay over a poster. The duration comes from the container header
//! when it can be read.

use bytes::Buf;
use galeria_core::error::PlayerError;
use galeria_core::playback::{EventSink, PlaybackRate, Player, PlayerBackend, PlayerEventKind};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(200);

// ============================================================================
// Shared clock state (between ticker thread and player handle)
// ============================================================================

struct ClockShared {
    is_playing: AtomicBool,
    should_stop: AtomicBool,
    position_ms: AtomicU64,
    /// Rate in thousandths.
    rate_milli: AtomicU32,
    seek_target: Mutex<Option<u64>>,
}

impl ClockShared {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            is_playing: AtomicBool::new(false),
            should_stop: AtomicBool::new(false),
            position_ms: AtomicU64::new(0),
            rate_milli: AtomicU32::new(1000),
            seek_target: Mutex::new(None),
        })
    }
}

#[derive(Debug, Default)]
pub struct ClockBackend;

impl PlayerBackend for ClockBackend {
    fn open(&mut self, uri: &str, events: EventSink) -> Result<Box<dyn Player>, PlayerError> {
        let path = Path::new(uri);
        if !path.is_file() {
            return Err(PlayerError::Open {
                uri: uri.to_string(),
                reason: "file not found".to_string(),
            });
        }

        let duration_ms = probe_duration(path).unwrap_or(0);
        tracing::debug!("{} opened, duration {} ms", events.binding(), duration_ms);

        let shared = ClockShared::new();
        let ticker = {
            let shared = shared.clone();
            let events = events.clone();
            thread::Builder::new()
                .name(format!("clock-{}", events.binding().0))
                .spawn(move || run_clock(shared, events, duration_ms))
                .map_err(|e| PlayerError::Open {
                    uri: uri.to_string(),
                    reason: e.to_string(),
                })?
        };

        events.emit(PlayerEventKind::Ready { duration_ms });

        Ok(Box::new(ClockPlayer {
            shared,
            events,
            ticker: Some(ticker),
        }))
    }
}

struct ClockPlayer {
    shared: Arc<ClockShared>,
    events: EventSink,
    ticker: Option<thread::JoinHandle<()>>,
}

impl Player for ClockPlayer {
    fn play(&mut self) -> Result<(), PlayerError> {
        self.shared.is_playing.store(true, Ordering::SeqCst);
        self.events.emit(PlayerEventKind::PlayingChanged(true));
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.shared.is_playing.store(false, Ordering::SeqCst);
        self.events.emit(PlayerEventKind::PlayingChanged(false));
        Ok(())
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), PlayerError> {
        *self.shared.seek_target.lock() = Some(position_ms);
        Ok(())
    }

    fn set_muted(&mut self, _muted: bool) -> Result<(), PlayerError> {
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> Result<(), PlayerError> {
        Ok(())
    }

    fn set_rate(&mut self, rate: PlaybackRate) -> Result<(), PlayerError> {
        let milli = (rate.as_f32() * 1000.0).round() as u32;
        self.shared.rate_milli.store(milli, Ordering::Relaxed);
        Ok(())
    }

    fn release(&mut self) {
        self.shared.should_stop.store(true, Ordering::SeqCst);
        if let Some(ticker) = self.ticker.take() {
            if ticker.join().is_err() {
                tracing::warn!("Clock thread for {} panicked", self.events.binding());
            }
        }
    }
}

impl Drop for ClockPlayer {
    fn drop(&mut self) {
        self.release();
    }
}

fn run_clock(shared: Arc<ClockShared>, events: EventSink, duration_ms: u64) {
    let mut last = Instant::now();
    let reported_duration = (duration_ms > 0).then_some(duration_ms);

    while !shared.should_stop.load(Ordering::SeqCst) {
        thread::sleep(TICK);
        let now = Instant::now();
        let elapsed = now.duration_since(last);
        last = now;

        if let Some(target) = shared.seek_target.lock().take() {
            shared.position_ms.store(target, Ordering::SeqCst);
            events.emit(PlayerEventKind::SeekCompleted {
                position_ms: target,
            });
        }

        if !shared.is_playing.load(Ordering::SeqCst) {
            continue;
        }

        let rate = shared.rate_milli.load(Ordering::Relaxed) as u64;
        let advance = elapsed.as_millis() as u64 * rate / 1000;
        let mut position = shared.position_ms.load(Ordering::SeqCst) + advance;

        let finished = duration_ms > 0 && position >= duration_ms;
        if finished {
            position = duration_ms;
            shared.is_playing.store(false, Ordering::SeqCst);
        }
        shared.position_ms.store(position, Ordering::SeqCst);

        let delivered = events.emit(PlayerEventKind::TimeUpdate {
            position_ms: position,
            duration_ms: reported_duration,
        });
        if finished {
            events.emit(PlayerEventKind::PlayingChanged(false));
        }
        if !delivered {
            break;
        }
    }
}

// ============================================================================
// Container probe
// ============================================================================

const MOOV: [u8; 4] = *b"moov";
const MVHD: [u8; 4] = *b"mvhd";

/// Movie duration from an ISO-BMFF (`mp4`/`mov`/`m4v`/`3gp`) header.
pub fn probe_duration(path: &Path) -> Option<u64> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if !matches!(ext.as_str(), "mp4" | "m4v" | "mov" | "3gp") {
        return None;
    }

    let mut file = File::open(path).ok()?;
    let len = file.metadata().ok()?.len();

    let (moov_start, moov_end) = find_box(&mut file, 0, len, MOOV)?;
    let (mvhd_start, _) = find_box(&mut file, moov_start, moov_end, MVHD)?;
    file.seek(SeekFrom::Start(mvhd_start)).ok()?;

    let mut body = [0u8; 32];
    file.read_exact(&mut body).ok()?;
    let mut cursor = &body[..];

    let version = cursor.get_u8();
    cursor.advance(3); // flags
    let (timescale, duration) = if version == 1 {
        cursor.advance(16); // creation + modification time
        let timescale = cursor.get_u32();
        (timescale, cursor.get_u64())
    } else {
        cursor.advance(8);
        let timescale = cursor.get_u32();
        (timescale, cursor.get_u32() as u64)
    };

    if timescale == 0 {
        return None;
    }
    Some(duration.saturating_mul(1000) / timescale as u64)
}

/// Payload range of the first `kind` box between `start` and `end`.
fn find_box(file: &mut File, start: u64, end: u64, kind: [u8; 4]) -> Option<(u64, u64)> {
    let mut pos = start;
    while pos + 8 <= end {
        file.seek(SeekFrom::Start(pos)).ok()?;
        let mut header = [0u8; 8];
        file.read_exact(&mut header).ok()?;
        let mut cursor = &header[..];
        let size = cursor.get_u32() as u64;
        let mut box_type = [0u8; 4];
        cursor.copy_to_slice(&mut box_type);

        let (size, header_size) = match size {
            0 => (end - pos, 8),
            1 => {
                let mut ext = [0u8; 8];
                file.read_exact(&mut ext).ok()?;
                (u64::from_be_bytes(ext), 16)
            }
            size => (size, 8),
        };
        if size < header_size {
            return None;
        }

        if box_type == kind {
            return Some((pos + header_size, (pos + size).min(end)));
        }
        pos += size;
    }
    None
}
