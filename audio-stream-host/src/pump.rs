//! Control loops draining bus completion events into a session.
//!
//! The bus posts one event per finished segment; these loops feed each
//! event to `WavSession::buffer_fill` on the caller's thread, so all engine
//! state stays single-threaded.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use audio_stream_core::models::error::StreamError;
use audio_stream_core::processing::double_buffer::Segment;
use audio_stream_core::processing::wav_header::WAV_HEADER_SIZE;
use audio_stream_core::session::wav_session::WavSession;

/// Interval between playback progress reports.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Drive a playback session until it reaches end of stream.
///
/// Returns the number of completion events serviced. Also returns when the
/// bus drops its sender, which only happens if the transfer dies; callers
/// can tell the two apart through `session.status()`.
///
/// Progress is reported at info level about once per second; every
/// serviced event is still traced at debug level.
pub fn pump_until_stopped(
    session: &mut WavSession,
    completions: &Receiver<Segment>,
) -> Result<u64, StreamError> {
    let mut serviced = 0;
    let mut progress = ProgressTicker::new(PROGRESS_INTERVAL);
    while session.status().is_active() {
        let segment = match completions.recv() {
            Ok(segment) => segment,
            Err(_) => break,
        };
        session.buffer_fill(segment)?;
        serviced += 1;
        log::debug!(
            "serviced {:?}: cursor {} of {} payload bytes",
            segment,
            session.position(),
            session.total_size()
        );
        if progress.due() {
            let consumed = session
                .position()
                .saturating_sub(WAV_HEADER_SIZE as u64)
                .min(session.total_size());
            log::info!(
                "playing {} of {} payload bytes",
                consumed,
                session.total_size()
            );
        }
    }
    Ok(serviced)
}

/// Drive a session for `duration`, then stop it.
///
/// Used for recording, where no end-of-stream exists and the caller decides
/// the length. Events still queued when the deadline hits are discarded
/// with the receiver.
pub fn pump_for(
    session: &mut WavSession,
    completions: &Receiver<Segment>,
    duration: Duration,
) -> Result<u64, StreamError> {
    let deadline = Instant::now() + duration;
    let mut serviced = 0;

    while session.status().is_active() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        match completions.recv_timeout(deadline - now) {
            Ok(segment) => {
                session.buffer_fill(segment)?;
                serviced += 1;
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if session.status().is_active() {
        session.stop()?;
    }
    Ok(serviced)
}

// --- Internal helpers ---

/// Rate gate for the in-loop progress report.
///
/// `due` fires at most once per interval, and the first report lands one
/// full interval into the stream.
struct ProgressTicker {
    interval: Duration,
    last: Instant,
}

impl ProgressTicker {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    fn due(&mut self) -> bool {
        if self.last.elapsed() < self.interval {
            return false;
        }
        self.last = Instant::now();
        true
    }
}
