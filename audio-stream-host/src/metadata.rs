//! Recording metadata sidecar.
//!
//! Each finished recording gets a JSON sidecar describing the stream and
//! carrying a SHA-256 checksum of the file, so recordings can be verified
//! after transfer.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use audio_stream_core::models::error::StreamError;
use audio_stream_core::processing::wav_header::WavHeader;

/// Metadata stored beside a finished recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    /// Unique recording ID (UUID v4).
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Path of the recording file.
    pub file_path: String,
    pub sample_rate: u32,
    pub num_channels: u16,
    pub bits_per_sample: u16,
    /// PCM payload length in bytes.
    pub payload_bytes: u64,
    pub duration_secs: f64,
    /// SHA-256 of the complete file, hex encoded.
    pub checksum: String,
}

impl RecordingMetadata {
    /// Describe a finished WAV recording, checksumming the file.
    pub fn for_recording(path: &Path, header: &WavHeader) -> Result<Self, StreamError> {
        let checksum = sha256_file(path)?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            file_path: path.to_string_lossy().into_owned(),
            sample_rate: header.sample_rate,
            num_channels: header.num_channels,
            bits_per_sample: header.bits_per_sample,
            payload_bytes: u64::from(header.data_len()),
            duration_secs: header.duration_secs(),
            checksum,
        })
    }
}

/// Path of the sidecar for a recording: `{stem}.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write metadata as a JSON sidecar next to the recording.
pub fn write_metadata(
    metadata: &RecordingMetadata,
    recording_path: &Path,
) -> Result<(), StreamError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| StreamError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(recording_path), json)
        .map_err(|e| StreamError::StorageError(format!("failed to write metadata: {}", e)))
}

/// Read a recording's JSON sidecar.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, StreamError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| StreamError::StorageError(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| StreamError::StorageError(format!("failed to parse metadata: {}", e)))
}

/// Compute the SHA-256 checksum of a file, hex encoded.
pub fn sha256_file(path: &Path) -> Result<String, StreamError> {
    let mut file = fs::File::open(path)
        .map_err(|e| StreamError::StorageError(format!("failed to open for checksum: {}", e)))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| StreamError::StorageError(format!("checksum read failed: {}", e)))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
