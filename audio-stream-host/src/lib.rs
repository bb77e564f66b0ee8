//! # audio-stream-host
//!
//! Host backends for audio-stream-kit.
//!
//! Provides:
//! - `FileStorage` — stream storage over `std::fs`
//! - `LoopbackBus` — simulated serial audio bus with paced completion events
//! - `SystemClock` — blocking delays via `std::thread::sleep`
//! - `pump` — control loops draining completion events into a session
//! - `metadata` — JSON recording sidecar with SHA-256 checksum
//!
//! ## Usage
//!
//! ```ignore
//! use audio_stream_core::{BusConfig, LogDiagnostics, WavSession};
//! use audio_stream_host::{pump, FileStorage, LoopbackBus, SystemClock};
//!
//! let (bus, completions) = LoopbackBus::pair();
//! let mut session = WavSession::new();
//! session.bind_storage(FileStorage::new());
//! session.bind_bus(bus);
//! session.bind_clock(SystemClock);
//! session.bind_diagnostics(LogDiagnostics);
//! session.init()?;
//!
//! session.open_playback("tone.wav")?;
//! session.configure(&BusConfig::default())?;
//! session.start_playback()?;
//! pump::pump_until_stopped(&mut session, &completions)?;
//! ```

pub mod file_storage;
pub mod loopback_bus;
pub mod metadata;
pub mod pump;
pub mod system_clock;
pub mod tone;

pub use file_storage::FileStorage;
pub use loopback_bus::{CaptureSink, LoopbackBus, SUPPORTED_RATES};
pub use metadata::RecordingMetadata;
pub use pump::{pump_for, pump_until_stopped};
pub use system_clock::SystemClock;
pub use tone::{PcmSource, Silence, SineSource};
