/// Streaming engine state machine.
///
/// State transitions:
/// ```text
/// stopped → active      via start_playback / start_record
/// active  → stopped     via stop, or end of stream inside buffer_fill
/// ```
///
/// `pause`/`resume` gate the transport while active and do not change the
/// reported status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Stopped,
    Active,
}

impl StreamStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Direction of the currently open stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Playback,
    Record,
}
