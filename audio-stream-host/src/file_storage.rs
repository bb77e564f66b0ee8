//! File-backed stream storage.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use audio_stream_core::models::error::StreamError;
use audio_stream_core::traits::storage::{AccessMode, Storage};

/// `Storage` backend over a local file.
///
/// Transfers are seek-based and exact; every `std::io` failure maps to
/// `StreamError::StorageError` with context.
#[derive(Debug, Default)]
pub struct FileStorage {
    file: Option<File>,
    path: String,
}

impl FileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn file_mut(&mut self) -> Result<&mut File, StreamError> {
        match self.file {
            Some(ref mut file) => Ok(file),
            None => Err(StreamError::StorageError("no file is open".into())),
        }
    }
}

impl Storage for FileStorage {
    fn open(&mut self, mode: AccessMode, path: &str) -> Result<u64, StreamError> {
        if self.file.is_some() {
            return Err(StreamError::StorageError(format!(
                "'{}' is still open",
                self.path
            )));
        }

        let file = match mode {
            AccessMode::Read => File::open(path),
            AccessMode::Write => File::create(path),
        }
        .map_err(|e| StreamError::StorageError(format!("failed to open '{}': {}", path, e)))?;

        let size = file
            .metadata()
            .map_err(|e| StreamError::StorageError(format!("failed to stat '{}': {}", path, e)))?
            .len();

        self.path = path.to_string();
        self.file = Some(file);
        Ok(size)
    }

    fn close(&mut self) -> Result<(), StreamError> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| StreamError::StorageError("no file is open".into()))?;
        file.flush()
            .map_err(|e| StreamError::StorageError(format!("flush of '{}' failed: {}", self.path, e)))
    }

    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), StreamError> {
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| StreamError::StorageError(format!("seek to {} failed: {}", offset, e)))?;
        file.read_exact(buf)
            .map_err(|e| StreamError::StorageError(format!("read at {} failed: {}", offset, e)))
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), StreamError> {
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| StreamError::StorageError(format!("seek to {} failed: {}", offset, e)))?;
        file.write_all(data)
            .map_err(|e| StreamError::StorageError(format!("write at {} failed: {}", offset, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_file_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("audio_stream_storage_{}", name))
    }

    #[test]
    fn open_reports_the_file_size() {
        let path = temp_file_path("size.bin");
        fs::write(&path, [7u8; 123]).unwrap();

        let mut storage = FileStorage::new();
        let size = storage
            .open(AccessMode::Read, path.to_str().unwrap())
            .unwrap();
        assert_eq!(size, 123);
        storage.close().unwrap();

        fs::remove_file(&path).ok();
    }

    #[test]
    fn reads_are_exact_and_offset_addressed() {
        let path = temp_file_path("read.bin");
        fs::write(&path, (0u8..32).collect::<Vec<_>>()).unwrap();

        let mut storage = FileStorage::new();
        storage
            .open(AccessMode::Read, path.to_str().unwrap())
            .unwrap();

        let mut buf = [0u8; 4];
        storage.read(10, &mut buf).unwrap();
        assert_eq!(buf, [10, 11, 12, 13]);

        // Backwards seeks work too; the engine rereads nothing, but the
        // contract does not forbid it.
        storage.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0, 1, 2, 3]);

        storage.close().unwrap();
        fs::remove_file(&path).ok();
    }

    #[test]
    fn read_past_the_end_is_an_error() {
        let path = temp_file_path("short.bin");
        fs::write(&path, [1u8; 8]).unwrap();

        let mut storage = FileStorage::new();
        storage
            .open(AccessMode::Read, path.to_str().unwrap())
            .unwrap();
        let mut buf = [0u8; 16];
        let err = storage.read(0, &mut buf).unwrap_err();
        assert!(matches!(err, StreamError::StorageError(_)));

        storage.close().unwrap();
        fs::remove_file(&path).ok();
    }

    #[test]
    fn writes_land_at_their_offsets() {
        let path = temp_file_path("write.bin");

        let mut storage = FileStorage::new();
        storage
            .open(AccessMode::Write, path.to_str().unwrap())
            .unwrap();
        storage.write(0, &[1, 2, 3, 4]).unwrap();
        storage.write(8, &[9, 9]).unwrap();
        // Rewrite in place, as stop does with the header.
        storage.write(0, &[5, 5]).unwrap();
        storage.close().unwrap();

        let written = fs::read(&path).unwrap();
        assert_eq!(written, vec![5, 5, 3, 4, 0, 0, 0, 0, 9, 9]);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn open_while_open_is_rejected() {
        let path = temp_file_path("twice.bin");
        fs::write(&path, [0u8; 4]).unwrap();

        let mut storage = FileStorage::new();
        storage
            .open(AccessMode::Read, path.to_str().unwrap())
            .unwrap();
        let err = storage
            .open(AccessMode::Read, path.to_str().unwrap())
            .unwrap_err();
        assert!(matches!(err, StreamError::StorageError(_)));

        storage.close().unwrap();
        fs::remove_file(&path).ok();
    }

    #[test]
    fn close_without_open_is_an_error_and_reopen_works() {
        let path = temp_file_path("reopen.bin");
        fs::write(&path, [0u8; 4]).unwrap();

        let mut storage = FileStorage::new();
        assert!(storage.close().is_err());

        storage
            .open(AccessMode::Read, path.to_str().unwrap())
            .unwrap();
        storage.close().unwrap();
        storage
            .open(AccessMode::Read, path.to_str().unwrap())
            .unwrap();
        storage.close().unwrap();

        fs::remove_file(&path).ok();
    }
}
