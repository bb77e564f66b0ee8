use crate::models::config::BusConfig;
use crate::models::error::StreamError;
use crate::models::state::{StreamMode, StreamStatus};
use crate::processing::double_buffer::{DoubleBuffer, Segment};
use crate::processing::wav_header::{WavHeader, WAV_HEADER_PROBE_LEN, WAV_HEADER_SIZE};
use crate::traits::audio_bus::AudioBus;
use crate::traits::clock::Clock;
use crate::traits::diagnostics::Diagnostics;
use crate::traits::storage::{AccessMode, Storage};

/// Default stream buffer length in bytes (two 16 KiB segments).
pub const DEFAULT_BUFFER_LEN: usize = 32 * 1024;

/// Double-buffered WAV streaming engine.
///
/// One session drives one stream at a time. The caller binds the four
/// capabilities, initializes, opens a file, configures the bus, and starts
/// a transfer; the bus then reports segment completions which the caller
/// feeds back through [`buffer_fill`](Self::buffer_fill):
///
/// ```text
/// Storage ──read──▶ [ segment 0 │ segment 1 ] ──transmit──▶ AudioBus   playback
/// Storage ◀─write── [ segment 0 │ segment 1 ] ◀──receive─── AudioBus   record
///                          ▲
///                          └─ buffer_fill(segment) per completion event
/// ```
///
/// While the bus drains or fills one segment the engine services the other.
/// `buffer_fill` expects exactly one call per completion event, naming the
/// segment the bus just finished with.
pub struct WavSession {
    storage: Option<Box<dyn Storage>>,
    bus: Option<Box<dyn AudioBus>>,
    clock: Option<Box<dyn Clock>>,
    diagnostics: Option<Box<dyn Diagnostics>>,

    buffer: DoubleBuffer,
    buffer_len: usize,
    header: Option<WavHeader>,
    mode: StreamMode,
    status: StreamStatus,
    cursor: u64,
    total_size: u64,
    initialized: bool,
}

impl WavSession {
    /// Create a session with the default 32 KiB buffer.
    pub fn new() -> Self {
        Self::with_buffer_len(DEFAULT_BUFFER_LEN)
    }

    /// Create a session with a custom buffer length.
    ///
    /// `buffer_len` must be even and non-zero; `init` rejects anything else
    /// with `InvalidHandle`.
    pub fn with_buffer_len(buffer_len: usize) -> Self {
        Self {
            storage: None,
            bus: None,
            clock: None,
            diagnostics: None,
            buffer: DoubleBuffer::new(buffer_len),
            buffer_len,
            header: None,
            mode: StreamMode::Playback,
            status: StreamStatus::Stopped,
            cursor: 0,
            total_size: 0,
            initialized: false,
        }
    }

    pub fn bind_storage(&mut self, storage: impl Storage + 'static) {
        self.storage = Some(Box::new(storage));
    }

    pub fn bind_bus(&mut self, bus: impl AudioBus + 'static) {
        self.bus = Some(Box::new(bus));
    }

    pub fn bind_clock(&mut self, clock: impl Clock + 'static) {
        self.clock = Some(Box::new(clock));
    }

    pub fn bind_diagnostics(&mut self, diagnostics: impl Diagnostics + 'static) {
        self.diagnostics = Some(Box::new(diagnostics));
    }

    /// Validate the handle and its capability set.
    ///
    /// Checks the buffer shape, then each capability in the order
    /// diagnostics, bus, storage, clock; the first gap is reported as
    /// `MissingCapability`. Only a fully bound session becomes initialized.
    pub fn init(&mut self) -> Result<(), StreamError> {
        if self.buffer_len == 0 || self.buffer_len % 2 != 0 {
            return Err(StreamError::InvalidHandle);
        }
        if self.diagnostics.is_none() {
            return Err(StreamError::MissingCapability("diagnostics"));
        }
        if self.bus.is_none() {
            self.diag("init failed: audio bus capability is not bound");
            return Err(StreamError::MissingCapability("bus"));
        }
        if self.storage.is_none() {
            self.diag("init failed: storage capability is not bound");
            return Err(StreamError::MissingCapability("storage"));
        }
        if self.clock.is_none() {
            self.diag("init failed: clock capability is not bound");
            return Err(StreamError::MissingCapability("clock"));
        }
        self.initialized = true;
        Ok(())
    }

    /// Mark the session uninitialized. Capabilities stay bound.
    pub fn deinit(&mut self) -> Result<(), StreamError> {
        self.ensure_initialized()?;
        self.initialized = false;
        Ok(())
    }

    /// Open a WAV file for playback and decode its header.
    ///
    /// On success the cursor sits at the start of the payload and
    /// [`header`](Self::header) describes the stream. Decode failures close
    /// the file again and surface `InvalidFormat`.
    pub fn open_playback(&mut self, path: &str) -> Result<(), StreamError> {
        self.ensure_initialized()?;

        let size = self.storage_mut()?.open(AccessMode::Read, path)?;
        let probe_len = size.min(WAV_HEADER_PROBE_LEN as u64) as usize;
        let mut probe = vec![0u8; probe_len];

        let decoded = self
            .storage_mut()?
            .read(0, &mut probe)
            .and_then(|_| WavHeader::decode(&probe));
        let header = match decoded {
            Ok(header) => header,
            Err(e) => {
                self.diag(&format!("open for playback failed: {}", e));
                let _ = self.storage_mut()?.close();
                return Err(e);
            }
        };

        self.total_size = header.data_len() as u64;
        self.cursor = WAV_HEADER_SIZE as u64;
        self.header = Some(header);
        self.mode = StreamMode::Playback;
        self.diag(&format!(
            "opened '{}' for playback, {} payload bytes",
            path, self.total_size
        ));
        Ok(())
    }

    /// Create a WAV file for recording and write a placeholder header.
    ///
    /// The header declares PCM, stereo, 16-bit at `sample_rate` with zeroed
    /// size fields; `stop` patches the sizes once the payload length is
    /// known.
    pub fn open_record(&mut self, path: &str, sample_rate: u32) -> Result<(), StreamError> {
        self.ensure_initialized()?;

        let header = WavHeader::pcm(sample_rate, 2, 16);
        let encoded = header.encode();
        self.storage_mut()?.open(AccessMode::Write, path)?;
        if let Err(e) = self.storage_mut()?.write(0, &encoded) {
            self.diag(&format!("open for record failed: {}", e));
            let _ = self.storage_mut()?.close();
            return Err(e);
        }

        self.total_size = 0;
        self.cursor = WAV_HEADER_SIZE as u64;
        self.header = Some(header);
        self.mode = StreamMode::Record;
        self.diag(&format!("opened '{}' for record at {} Hz", path, sample_rate));
        Ok(())
    }

    /// Forward bus parameters to the transport.
    ///
    /// Selects the sample frequency first, then initializes the bus with
    /// the full parameter set. Engine state does not change.
    pub fn configure(&mut self, config: &BusConfig) -> Result<(), StreamError> {
        self.ensure_initialized()?;
        let bus = self.bus_mut()?;
        bus.set_rate(config.frequency)?;
        bus.init(config)
    }

    /// Prime the full buffer from storage and begin circular transmission.
    ///
    /// The priming read is clamped to the remaining payload; anything past
    /// it is zero-filled. On failure the session stays Stopped with the
    /// cursor unmoved.
    pub fn start_playback(&mut self) -> Result<(), StreamError> {
        self.ensure_initialized()?;
        if self.status.is_active() {
            return Err(StreamError::AlreadyActive);
        }

        let len = self.buffer.len();
        let want = self.remaining().min(len as u64) as usize;
        let mut prime = vec![0u8; want];
        if want > 0 {
            let cursor = self.cursor;
            if let Err(e) = self.storage_mut()?.read(cursor, &mut prime) {
                self.diag(&format!("playback start failed: {}", e));
                return Err(e);
            }
        }
        self.buffer.fill(&prime);

        let buffer = self.buffer.clone();
        if let Err(e) = self.bus_mut()?.transmit(buffer) {
            self.diag(&format!("playback start failed: {}", e));
            return Err(e);
        }

        self.cursor += len as u64;
        self.status = StreamStatus::Active;
        Ok(())
    }

    /// Open a recording at `path`, hand the buffer to the bus for
    /// reception, and go active.
    pub fn start_record(&mut self, sample_rate: u32, path: &str) -> Result<(), StreamError> {
        self.ensure_initialized()?;
        if self.status.is_active() {
            return Err(StreamError::AlreadyActive);
        }

        self.open_record(path, sample_rate)?;

        let buffer = self.buffer.clone();
        if let Err(e) = self.bus_mut()?.receive(buffer) {
            self.diag(&format!("record start failed: {}", e));
            return Err(e);
        }

        self.status = StreamStatus::Active;
        Ok(())
    }

    /// Service one transport completion event.
    ///
    /// `segment` names the half the bus just finished draining (playback)
    /// or filling (record); it is idle until the next completion and is the
    /// one serviced here.
    ///
    /// Playback reads the next half-buffer from storage into the segment,
    /// zero-filling everything past the declared payload, and advances the
    /// cursor; once the cursor passes the end of the payload the transfer
    /// is halted, storage is closed, and the session returns to Stopped.
    /// Record flushes the segment to storage and advances the cursor.
    pub fn buffer_fill(&mut self, segment: Segment) -> Result<(), StreamError> {
        self.ensure_initialized()?;
        if !self.status.is_active() {
            return Err(StreamError::NotActive);
        }

        match self.mode {
            StreamMode::Playback => self.fill_playback(segment),
            StreamMode::Record => self.flush_record(segment),
        }
    }

    /// Halt the transfer and release both collaborators.
    ///
    /// For a recording the header sizes are patched to the produced payload
    /// length and rewritten at offset 0 before storage is closed. The
    /// session always ends up Stopped; the first sub-step failure, if any,
    /// is returned after the remaining release steps have run.
    pub fn stop(&mut self) -> Result<(), StreamError> {
        self.ensure_initialized()?;
        if !self.status.is_active() {
            return Err(StreamError::NotActive);
        }

        let mut first_failure = None;

        if let Err(e) = self.bus_mut()?.stop() {
            self.diag(&format!("stop: transfer halt failed: {}", e));
            first_failure = first_failure.or(Some(e));
        }

        if self.mode == StreamMode::Record {
            let payload = self.cursor.saturating_sub(WAV_HEADER_SIZE as u64) as u32;
            let encoded = self.header.as_mut().map(|header| {
                header.set_data_len(payload);
                header.encode()
            });
            if let Some(encoded) = encoded {
                if let Err(e) = self.storage_mut()?.write(0, &encoded) {
                    self.diag(&format!("stop: header rewrite failed: {}", e));
                    first_failure = first_failure.or(Some(e));
                }
            }
        }

        if let Err(e) = self.bus_mut()?.deinit() {
            self.diag(&format!("stop: bus release failed: {}", e));
            first_failure = first_failure.or(Some(e));
        }
        if let Err(e) = self.storage_mut()?.close() {
            self.diag(&format!("stop: storage close failed: {}", e));
            first_failure = first_failure.or(Some(e));
        }

        self.status = StreamStatus::Stopped;
        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Suspend the transfer. Position and buffer contents are preserved.
    pub fn pause(&mut self) -> Result<(), StreamError> {
        self.ensure_initialized()?;
        if !self.status.is_active() {
            return Err(StreamError::NotActive);
        }
        self.bus_mut()?.pause()
    }

    /// Continue a transfer suspended by `pause`.
    pub fn resume(&mut self) -> Result<(), StreamError> {
        self.ensure_initialized()?;
        if !self.status.is_active() {
            return Err(StreamError::NotActive);
        }
        self.bus_mut()?.resume()
    }

    /// Current stream status. Total; an uninitialized session is Stopped.
    pub fn status(&self) -> StreamStatus {
        self.status
    }

    /// Header of the currently open stream, if any.
    pub fn header(&self) -> Option<&WavHeader> {
        self.header.as_ref()
    }

    /// Byte offset of the next storage access (44 right after open).
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Declared payload length of the open stream, in bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Direction of the currently open stream.
    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    // --- Internal helpers ---

    fn fill_playback(&mut self, segment: Segment) -> Result<(), StreamError> {
        let seg_len = self.buffer.segment_len();
        let want = self.remaining().min(seg_len as u64) as usize;

        if want > 0 {
            let cursor = self.cursor;
            let buffer = self.buffer.clone();
            let storage = self.storage_mut()?;
            let read = buffer.with_segment_mut(segment, |half| {
                let res = storage.read(cursor, &mut half[..want]);
                if res.is_ok() {
                    half[want..].fill(0);
                }
                res
            });
            if let Err(e) = read {
                self.diag(&format!("playback fill failed: {}", e));
                return Err(e);
            }
        } else {
            // Past the payload: the segment drains as silence.
            self.buffer.fill_segment(segment, &[]);
        }

        self.cursor += seg_len as u64;

        if self.cursor > self.end_offset() {
            if let Err(e) = self.bus_mut()?.stop() {
                self.diag(&format!("end of stream: transfer halt failed: {}", e));
                return Err(e);
            }
            if let Err(e) = self.storage_mut()?.close() {
                self.diag(&format!("end of stream: storage close failed: {}", e));
                return Err(e);
            }
            self.status = StreamStatus::Stopped;
            self.diag("playback finished");
        }
        Ok(())
    }

    fn flush_record(&mut self, segment: Segment) -> Result<(), StreamError> {
        let seg_len = self.buffer.segment_len();
        let data = self.buffer.read_segment(segment);
        let cursor = self.cursor;
        if let Err(e) = self.storage_mut()?.write(cursor, &data) {
            self.diag(&format!("record flush failed: {}", e));
            return Err(e);
        }
        self.cursor += seg_len as u64;
        Ok(())
    }

    /// Payload bytes between the cursor and the end of the stream.
    fn remaining(&self) -> u64 {
        self.end_offset().saturating_sub(self.cursor)
    }

    /// File offset one past the last payload byte.
    fn end_offset(&self) -> u64 {
        WAV_HEADER_SIZE as u64 + self.total_size
    }

    fn ensure_initialized(&self) -> Result<(), StreamError> {
        if !self.initialized {
            return Err(StreamError::NotInitialized);
        }
        Ok(())
    }

    fn storage_mut(&mut self) -> Result<&mut dyn Storage, StreamError> {
        match self.storage {
            Some(ref mut storage) => Ok(storage.as_mut()),
            None => Err(StreamError::NotInitialized),
        }
    }

    fn bus_mut(&mut self) -> Result<&mut dyn AudioBus, StreamError> {
        match self.bus {
            Some(ref mut bus) => Ok(bus.as_mut()),
            None => Err(StreamError::NotInitialized),
        }
    }

    fn diag(&self, message: &str) {
        if let Some(ref diagnostics) = self.diagnostics {
            diagnostics.log(message);
        }
    }
}

impl Default for WavSession {
    fn default() -> Self {
        Self::new()
    }
}
