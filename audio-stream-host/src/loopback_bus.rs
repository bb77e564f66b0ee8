//! Simulated serial audio bus.
//!
//! Stands in for an I2S peripheral running circular DMA: a worker thread
//! alternately drains (transmit) or fills (receive) the two buffer segments
//! at the configured byte rate and posts a completion event after each one,
//! the way half- and full-transfer interrupts would fire.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use audio_stream_core::models::config::BusConfig;
use audio_stream_core::models::error::StreamError;
use audio_stream_core::processing::double_buffer::{DoubleBuffer, Segment};
use audio_stream_core::traits::audio_bus::AudioBus;

use crate::tone::{PcmSource, Silence};

/// Sample frequencies the bus accepts, mirroring the clock divider table of
/// the reference I2S peripheral.
pub const SUPPORTED_RATES: [u32; 8] = [8000, 11025, 16000, 22050, 32000, 44100, 48000, 96000];

/// Cloneable view of everything transmit transfers have drained.
#[derive(Debug, Default, Clone)]
pub struct CaptureSink {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureSink {
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn extend(&self, data: &[u8]) {
        self.bytes.lock().extend_from_slice(data);
    }
}

/// `AudioBus` backend simulating an I2S peripheral in software.
///
/// Completion events arrive on the receiver returned by [`pair`](Self::pair);
/// the application feeds them to `WavSession::buffer_fill`. Transmitted
/// audio lands in a [`CaptureSink`]; received audio comes from a
/// [`PcmSource`] (silence unless one is set).
pub struct LoopbackBus {
    events: Sender<Segment>,
    config: Option<BusConfig>,
    rate: u32,
    pace: Option<Duration>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
    captured: CaptureSink,
    source: Option<Box<dyn PcmSource>>,
}

impl LoopbackBus {
    /// Create a bus and the completion-event receiver to drain.
    pub fn pair() -> (Self, Receiver<Segment>) {
        let (events, completions) = mpsc::channel();
        let bus = Self {
            events,
            config: None,
            rate: 0,
            pace: None,
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            worker: None,
            captured: CaptureSink::default(),
            source: None,
        };
        (bus, completions)
    }

    /// Override the per-segment pace. Tests use this to compress time.
    pub fn set_pace(&mut self, pace: Duration) {
        self.pace = Some(pace);
    }

    /// Feed the next receive transfer from `source` instead of silence.
    pub fn set_source(&mut self, source: impl PcmSource + 'static) {
        self.source = Some(Box::new(source));
    }

    /// Sink collecting everything transmit transfers drain.
    pub fn capture_sink(&self) -> CaptureSink {
        self.captured.clone()
    }

    fn start_worker(
        &mut self,
        buffer: DoubleBuffer,
        source: Option<Box<dyn PcmSource>>,
    ) -> Result<(), StreamError> {
        if self.worker.is_some() {
            return Err(StreamError::TransportError(
                "a transfer is already running".into(),
            ));
        }
        let config = self
            .config
            .ok_or_else(|| StreamError::TransportError("bus is not configured".into()))?;

        let pace = self.pace.unwrap_or_else(|| {
            // Stereo frames at the configured rate.
            let bytes_per_second = (self.rate * config.format.sample_bytes() * 2).max(1);
            Duration::from_secs_f64(buffer.segment_len() as f64 / f64::from(bytes_per_second))
        });

        self.running.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let paused = Arc::clone(&self.paused);
        let events = self.events.clone();
        let captured = self.captured.clone();

        let handle = thread::Builder::new()
            .name("loopback-bus".into())
            .spawn(move || run_worker(running, paused, buffer, events, pace, captured, source))
            .map_err(|e| StreamError::TransportError(format!("failed to spawn bus thread: {}", e)))?;
        self.worker = Some(handle);
        Ok(())
    }

    fn halt_worker(&mut self) -> Result<(), StreamError> {
        self.running.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            handle
                .join()
                .map_err(|_| StreamError::TransportError("bus thread panicked".into()))?;
        }
        Ok(())
    }
}

impl AudioBus for LoopbackBus {
    fn init(&mut self, config: &BusConfig) -> Result<(), StreamError> {
        config.validate().map_err(StreamError::TransportError)?;
        self.config = Some(*config);
        self.rate = config.frequency;
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), StreamError> {
        if self.worker.is_some() {
            return Err(StreamError::TransportError(
                "cannot release the bus while a transfer is running".into(),
            ));
        }
        self.config = None;
        self.rate = 0;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), StreamError> {
        self.halt_worker()
    }

    fn pause(&mut self) -> Result<(), StreamError> {
        if self.worker.is_none() {
            return Err(StreamError::TransportError("no transfer in progress".into()));
        }
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), StreamError> {
        if self.worker.is_none() {
            return Err(StreamError::TransportError("no transfer in progress".into()));
        }
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn set_rate(&mut self, frequency: u32) -> Result<(), StreamError> {
        if !SUPPORTED_RATES.contains(&frequency) {
            return Err(StreamError::TransportError(format!(
                "unsupported frequency: {} Hz",
                frequency
            )));
        }
        self.rate = frequency;
        Ok(())
    }

    fn transmit(&mut self, buffer: DoubleBuffer) -> Result<(), StreamError> {
        self.start_worker(buffer, None)
    }

    fn receive(&mut self, buffer: DoubleBuffer) -> Result<(), StreamError> {
        let source = self
            .source
            .take()
            .unwrap_or_else(|| Box::new(Silence));
        self.start_worker(buffer, Some(source))
    }
}

impl Drop for LoopbackBus {
    fn drop(&mut self) {
        let _ = self.halt_worker();
    }
}

fn run_worker(
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    buffer: DoubleBuffer,
    events: Sender<Segment>,
    pace: Duration,
    captured: CaptureSink,
    mut source: Option<Box<dyn PcmSource>>,
) {
    const TICK: Duration = Duration::from_millis(1);

    'transfer: loop {
        for segment in [Segment::First, Segment::Second] {
            // Simulate the time the hardware spends on this segment,
            // holding position while paused.
            let mut spent = Duration::ZERO;
            while spent < pace {
                if !running.load(Ordering::SeqCst) {
                    break 'transfer;
                }
                if paused.load(Ordering::SeqCst) {
                    thread::sleep(TICK);
                    continue;
                }
                let step = TICK.min(pace - spent);
                thread::sleep(step);
                spent += step;
            }
            if !running.load(Ordering::SeqCst) {
                break 'transfer;
            }

            match source {
                // Receive: produce samples into the segment the engine
                // will flush next.
                Some(ref mut src) => buffer.with_segment_mut(segment, |half| src.fill(half)),
                // Transmit: drain the segment the engine keeps refilled.
                None => captured.extend(&buffer.read_segment(segment)),
            }

            if events.send(segment).is_err() {
                log::debug!("completion receiver dropped; halting transfer");
                break 'transfer;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_stream_core::models::config::BusMode;

    fn configured_bus() -> (LoopbackBus, Receiver<Segment>) {
        let (mut bus, completions) = LoopbackBus::pair();
        bus.set_pace(Duration::from_millis(1));
        bus.set_rate(48000).unwrap();
        bus.init(&BusConfig {
            frequency: 48000,
            ..BusConfig::default()
        })
        .unwrap();
        (bus, completions)
    }

    #[test]
    fn set_rate_rejects_unsupported_frequencies() {
        let (mut bus, _completions) = LoopbackBus::pair();
        assert!(bus.set_rate(44100).is_ok());
        let err = bus.set_rate(44000).unwrap_err();
        assert!(matches!(err, StreamError::TransportError(_)));
    }

    #[test]
    fn transmit_requires_configuration() {
        let (mut bus, _completions) = LoopbackBus::pair();
        let err = bus.transmit(DoubleBuffer::new(64)).unwrap_err();
        assert!(matches!(err, StreamError::TransportError(_)));
    }

    #[test]
    fn transmit_posts_alternating_completions_and_captures_audio() {
        let (mut bus, completions) = configured_bus();
        let buffer = DoubleBuffer::new(8);
        buffer.fill(&[1, 2, 3, 4, 5, 6, 7, 8]);

        bus.transmit(buffer).unwrap();
        let first: Vec<Segment> = (0..4)
            .map(|_| completions.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        bus.stop().unwrap();

        assert_eq!(
            first,
            vec![Segment::First, Segment::Second, Segment::First, Segment::Second]
        );

        let captured = bus.capture_sink().bytes();
        assert!(captured.len() >= 16);
        assert_eq!(&captured[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        // The engine never refilled, so the same contents loop.
        assert_eq!(&captured[8..16], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn receive_fills_segments_from_the_source() {
        struct Counting(u8);
        impl PcmSource for Counting {
            fn fill(&mut self, frame: &mut [u8]) {
                for byte in frame {
                    *byte = self.0;
                    self.0 = self.0.wrapping_add(1);
                }
            }
        }

        let (mut bus, completions) = LoopbackBus::pair();
        // Wide pace: segment 0 stays untouched long after its event posts.
        bus.set_pace(Duration::from_millis(20));
        bus.set_rate(48000).unwrap();
        bus.init(&BusConfig {
            frequency: 48000,
            ..BusConfig::default()
        })
        .unwrap();
        bus.set_source(Counting(0));
        let buffer = DoubleBuffer::new(8);

        bus.receive(buffer.clone()).unwrap();
        let segment = completions.recv_timeout(Duration::from_secs(5)).unwrap();
        let first = buffer.read_segment(Segment::First);
        bus.stop().unwrap();

        assert_eq!(segment, Segment::First);
        assert_eq!(first, vec![0, 1, 2, 3]);
    }

    #[test]
    fn stop_halts_the_worker_synchronously() {
        let (mut bus, completions) = configured_bus();
        bus.transmit(DoubleBuffer::new(8)).unwrap();
        completions.recv_timeout(Duration::from_secs(5)).unwrap();

        bus.stop().unwrap();
        // Drain anything posted before the halt took effect.
        while completions.try_recv().is_ok() {}

        thread::sleep(Duration::from_millis(10));
        assert!(completions.try_recv().is_err());
    }

    #[test]
    fn deinit_is_rejected_while_a_transfer_runs() {
        let (mut bus, _completions) = configured_bus();
        bus.transmit(DoubleBuffer::new(8)).unwrap();
        assert!(bus.deinit().is_err());
        bus.stop().unwrap();
        bus.deinit().unwrap();
    }

    #[test]
    fn pause_requires_a_transfer() {
        let (mut bus, _completions) = configured_bus();
        assert!(bus.pause().is_err());
        assert!(bus.resume().is_err());
    }

    #[test]
    fn a_stopped_bus_can_start_a_new_transfer() {
        let (mut bus, completions) = configured_bus();
        bus.transmit(DoubleBuffer::new(8)).unwrap();
        completions.recv_timeout(Duration::from_secs(5)).unwrap();
        bus.stop().unwrap();

        while completions.try_recv().is_ok() {}
        bus.transmit(DoubleBuffer::new(8)).unwrap();
        completions.recv_timeout(Duration::from_secs(5)).unwrap();
        bus.stop().unwrap();

        let config = BusConfig {
            mode: BusMode::MasterReceive,
            frequency: 48000,
            ..BusConfig::default()
        };
        bus.init(&config).unwrap();
    }

    #[test]
    fn default_pace_follows_the_byte_rate() {
        let (mut bus, completions) = LoopbackBus::pair();
        bus.set_rate(8000).unwrap();
        bus.init(&BusConfig {
            frequency: 8000,
            ..BusConfig::default()
        })
        .unwrap();

        // 64-byte segments at 8 kHz stereo 16-bit (32 kB/s) take 2 ms each.
        bus.transmit(DoubleBuffer::new(128)).unwrap();
        let started = std::time::Instant::now();
        completions.recv_timeout(Duration::from_secs(5)).unwrap();
        let elapsed = started.elapsed();
        bus.stop().unwrap();

        assert!(elapsed >= Duration::from_millis(2));
    }
}
