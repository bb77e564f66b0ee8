//! # audio-stream-core
//!
//! Platform-agnostic double-buffered WAV streaming core.
//!
//! Moves PCM audio between block storage and a serial audio bus under
//! completion callbacks, for both playback and record, with pause, resume,
//! stop, and end-of-stream handling. Platform backends implement the
//! `Storage` and `AudioBus` traits and plug into the generic `WavSession`
//! engine.
//!
//! ## Architecture
//!
//! ```text
//! audio-stream-core (this crate)
//! ├── traits/       ← Storage, AudioBus, Clock, Diagnostics
//! ├── models/       ← StreamError, StreamStatus, StreamMode, BusConfig
//! ├── processing/   ← WavHeader codec, DoubleBuffer
//! └── session/      ← WavSession (double-buffered streaming engine)
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{BusConfig, BusMode, BusStandard, ClockPolarity, SampleFormat};
pub use models::error::StreamError;
pub use models::state::{StreamMode, StreamStatus};
pub use processing::double_buffer::{DoubleBuffer, Segment};
pub use processing::wav_header::{WavHeader, WAV_HEADER_PROBE_LEN, WAV_HEADER_SIZE};
pub use session::wav_session::{WavSession, DEFAULT_BUFFER_LEN};
pub use traits::audio_bus::AudioBus;
pub use traits::clock::Clock;
pub use traits::diagnostics::{Diagnostics, LogDiagnostics};
pub use traits::storage::{AccessMode, Storage};
