//! Minimal WAV player/recorder over audio-stream-kit.
//!
//! ```text
//! wav-demo play <file>
//! wav-demo record <file> <seconds> [rate]
//! wav-demo info <file>
//! ```
//!
//! Playback drains the file through the loopback bus at the file's sample
//! rate; record captures a 440 Hz test tone and writes a metadata sidecar
//! next to the recording. Set `RUST_LOG=debug` to watch the engine work.

use std::env;
use std::path::Path;
use std::process;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use audio_stream_core::{
    AccessMode, BusConfig, BusMode, LogDiagnostics, SampleFormat, Segment, Storage, StreamError,
    WavHeader, WavSession, WAV_HEADER_PROBE_LEN,
};
use audio_stream_host::{
    metadata, pump, FileStorage, LoopbackBus, RecordingMetadata, SineSource, SystemClock,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("play") if args.len() == 2 => play(&args[1]),
        Some("record") if args.len() == 3 || args.len() == 4 => {
            let seconds = parse_or_usage(&args[2], "seconds");
            let rate = match args.get(3) {
                Some(raw) => parse_or_usage(raw, "rate"),
                None => 22050,
            };
            record(&args[1], seconds, rate)
        }
        Some("info") if args.len() == 2 => info(&args[1]),
        _ => usage(),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn usage() -> ! {
    eprintln!("usage: wav-demo play <file>");
    eprintln!("       wav-demo record <file> <seconds> [rate]");
    eprintln!("       wav-demo info <file>");
    process::exit(2);
}

fn parse_or_usage<T: std::str::FromStr>(raw: &str, what: &str) -> T {
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            eprintln!("invalid {}: {}", what, raw);
            usage()
        }
    }
}

fn bound_session(bus: LoopbackBus) -> WavSession {
    let mut session = WavSession::new();
    session.bind_storage(FileStorage::new());
    session.bind_bus(bus);
    session.bind_clock(SystemClock);
    session.bind_diagnostics(LogDiagnostics);
    session
}

fn play(path: &str) -> Result<(), StreamError> {
    let (bus, completions) = LoopbackBus::pair();
    let mut session = bound_session(bus);
    session.init()?;
    session.open_playback(path)?;

    let header = match session.header() {
        Some(header) => header.clone(),
        None => return Err(StreamError::InvalidFormat("no header decoded".into())),
    };
    check_playable(&header)?;
    log::info!(
        "{}: {} Hz, {} ch, {} bit, {:.2}s",
        path,
        header.sample_rate,
        header.num_channels,
        header.bits_per_sample,
        header.duration_secs()
    );

    let format = match header.bits_per_sample {
        24 => SampleFormat::B24,
        _ => SampleFormat::B16Extended,
    };
    session.configure(&BusConfig {
        format,
        frequency: header.sample_rate,
        ..BusConfig::default()
    })?;
    session.start_playback()?;
    let serviced = pump_until(&mut session, &completions)?;

    println!(
        "played {} payload bytes ({} segment completions)",
        session.total_size(),
        serviced
    );
    Ok(())
}

fn record(path: &str, seconds: u64, rate: u32) -> Result<(), StreamError> {
    let (mut bus, completions) = LoopbackBus::pair();
    bus.set_source(SineSource::new(440.0, rate));
    let mut session = bound_session(bus);
    session.init()?;

    session.configure(&BusConfig {
        mode: BusMode::MasterReceive,
        frequency: rate,
        ..BusConfig::default()
    })?;
    session.start_record(rate, path)?;
    log::info!("recording {}s of test tone at {} Hz", seconds, rate);
    pump::pump_for(&mut session, &completions, Duration::from_secs(seconds))?;

    let header = match session.header() {
        Some(header) => header.clone(),
        None => return Err(StreamError::InvalidFormat("no header produced".into())),
    };
    let meta = RecordingMetadata::for_recording(Path::new(path), &header)?;
    metadata::write_metadata(&meta, Path::new(path))?;

    println!("recorded {} payload bytes to {}", header.data_len(), path);
    println!("metadata: {}", metadata::metadata_path(Path::new(path)).display());
    Ok(())
}

fn info(path: &str) -> Result<(), StreamError> {
    let mut storage = FileStorage::new();
    let size = storage.open(AccessMode::Read, path)?;
    let probe_len = size.min(WAV_HEADER_PROBE_LEN as u64) as usize;
    let mut probe = vec![0u8; probe_len];
    storage.read(0, &mut probe)?;
    storage.close()?;

    let header = WavHeader::decode(&probe)?;
    println!("{}", path);
    println!("  audio format:  {}", header.audio_format);
    println!("  channels:      {}", header.num_channels);
    println!("  sample rate:   {} Hz", header.sample_rate);
    println!("  bits/sample:   {}", header.bits_per_sample);
    println!("  payload:       {} bytes", header.data_len());
    println!("  duration:      {:.2} s", header.duration_secs());
    Ok(())
}

fn pump_until(
    session: &mut WavSession,
    completions: &Receiver<Segment>,
) -> Result<u64, StreamError> {
    let serviced = pump::pump_until_stopped(session, completions)?;
    if session.status().is_active() {
        // The bus died without reaching end of stream; release everything.
        log::warn!("transfer ended early; stopping the session");
        session.stop()?;
    }
    Ok(serviced)
}

fn check_playable(header: &WavHeader) -> Result<(), StreamError> {
    if header.audio_format != 1 {
        return Err(StreamError::InvalidFormat(format!(
            "not PCM: audio format {}",
            header.audio_format
        )));
    }
    if !matches!(header.num_channels, 1 | 2) {
        return Err(StreamError::InvalidFormat(format!(
            "unsupported channel count: {}",
            header.num_channels
        )));
    }
    if !matches!(header.bits_per_sample, 16 | 24) {
        return Err(StreamError::InvalidFormat(format!(
            "unsupported bit depth: {}",
            header.bits_per_sample
        )));
    }
    Ok(())
}
