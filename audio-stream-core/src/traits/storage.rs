use crate::models::error::StreamError;

/// How a stream file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Open an existing file for reading.
    Read,
    /// Create (or truncate) a file for writing.
    Write,
}

/// Block storage capability consumed by the streaming engine.
///
/// Byte-addressed and synchronous. Transfers are exact: `read` fills the
/// whole buffer or fails, `write` persists the whole slice or fails.
/// Implementations map their native failures to `StreamError::StorageError`.
pub trait Storage: Send {
    /// Open the named file, returning its current size in bytes.
    fn open(&mut self, mode: AccessMode, path: &str) -> Result<u64, StreamError>;

    /// Flush and release the open file.
    fn close(&mut self) -> Result<(), StreamError>;

    /// Read exactly `buf.len()` bytes starting at `offset`.
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), StreamError>;

    /// Write all of `data` starting at `offset`.
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), StreamError>;
}
