use crate::models::error::StreamError;

/// Size of the canonical RIFF WAV header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Longest header prefix the decoder consumes: the canonical 44 bytes plus
/// the 4-byte pad some encoders insert before the data subchunk.
pub const WAV_HEADER_PROBE_LEN: usize = 48;

/// Decoded RIFF WAV header.
///
/// Canonical layout (little-endian, ASCII literals):
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    chunk_size = 36 + subchunk2_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  subchunk1_size (16 for PCM)
/// [20-21]  audio_format (1 = PCM)
/// [22-23]  num_channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * block_align
/// [32-33]  block_align = num_channels * bits_per_sample / 8
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  subchunk2_size (payload bytes)
/// [44..]   PCM payload
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_id: [u8; 4],
    pub chunk_size: u32,
    pub format: [u8; 4],
    pub subchunk1_id: [u8; 4],
    pub subchunk1_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub subchunk2_id: [u8; 4],
    pub subchunk2_size: u32,
}

impl WavHeader {
    /// Synthesize a PCM header with zeroed size fields.
    ///
    /// Recording starts from this placeholder; `set_data_len` patches the
    /// size fields once the payload length is known.
    pub fn pcm(sample_rate: u32, num_channels: u16, bits_per_sample: u16) -> Self {
        let block_align = num_channels * bits_per_sample / 8;
        Self {
            chunk_id: *b"RIFF",
            chunk_size: 0,
            format: *b"WAVE",
            subchunk1_id: *b"fmt ",
            subchunk1_size: 16,
            audio_format: 1,
            num_channels,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample,
            subchunk2_id: *b"data",
            subchunk2_size: 0,
        }
    }

    /// Decode a header prefix.
    ///
    /// Accepts the canonical layout and a variant with 4 bytes of padding
    /// between the fmt and data subchunks: when offset 36 does not spell
    /// "data", the data subchunk id and size are re-read 4 bytes later.
    /// Either way the header counts as a fixed 44-byte prefix and the
    /// payload starts at offset 44.
    pub fn decode(bytes: &[u8]) -> Result<Self, StreamError> {
        if bytes.len() < WAV_HEADER_SIZE {
            return Err(StreamError::InvalidFormat(format!(
                "header prefix too short: {} bytes",
                bytes.len()
            )));
        }

        let (subchunk2_id, subchunk2_size) = if &bytes[36..40] == b"data" {
            (field(bytes, 36), read_u32(bytes, 40))
        } else {
            if bytes.len() < WAV_HEADER_PROBE_LEN {
                return Err(StreamError::InvalidFormat(format!(
                    "padded header prefix too short: {} bytes",
                    bytes.len()
                )));
            }
            (field(bytes, 40), read_u32(bytes, 44))
        };

        let header = Self {
            chunk_id: field(bytes, 0),
            chunk_size: read_u32(bytes, 4),
            format: field(bytes, 8),
            subchunk1_id: field(bytes, 12),
            subchunk1_size: read_u32(bytes, 16),
            audio_format: read_u16(bytes, 20),
            num_channels: read_u16(bytes, 22),
            sample_rate: read_u32(bytes, 24),
            byte_rate: read_u32(bytes, 28),
            block_align: read_u16(bytes, 32),
            bits_per_sample: read_u16(bytes, 34),
            subchunk2_id,
            subchunk2_size,
        };
        header.check_sentinels()?;
        Ok(header)
    }

    /// Encode into the canonical unpadded 44-byte layout.
    pub fn encode(&self) -> [u8; WAV_HEADER_SIZE] {
        let mut header = [0u8; WAV_HEADER_SIZE];

        header[0..4].copy_from_slice(&self.chunk_id);
        header[4..8].copy_from_slice(&self.chunk_size.to_le_bytes());
        header[8..12].copy_from_slice(&self.format);

        header[12..16].copy_from_slice(&self.subchunk1_id);
        header[16..20].copy_from_slice(&self.subchunk1_size.to_le_bytes());
        header[20..22].copy_from_slice(&self.audio_format.to_le_bytes());
        header[22..24].copy_from_slice(&self.num_channels.to_le_bytes());
        header[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        header[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        header[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());

        header[36..40].copy_from_slice(&self.subchunk2_id);
        header[40..44].copy_from_slice(&self.subchunk2_size.to_le_bytes());

        header
    }

    /// Payload length declared by the header, in bytes.
    pub fn data_len(&self) -> u32 {
        self.subchunk2_size
    }

    /// Patch the size fields once the payload length is known.
    pub fn set_data_len(&mut self, data_len: u32) {
        self.subchunk2_size = data_len;
        self.chunk_size = data_len + 36;
    }

    /// Payload duration in seconds, derived from the byte rate.
    pub fn duration_secs(&self) -> f64 {
        if self.byte_rate == 0 {
            return 0.0;
        }
        self.subchunk2_size as f64 / self.byte_rate as f64
    }

    fn check_sentinels(&self) -> Result<(), StreamError> {
        if &self.chunk_id != b"RIFF" {
            return Err(StreamError::InvalidFormat("chunk id is not RIFF".into()));
        }
        if &self.format != b"WAVE" {
            return Err(StreamError::InvalidFormat("format is not WAVE".into()));
        }
        if &self.subchunk1_id != b"fmt " {
            return Err(StreamError::InvalidFormat("missing fmt subchunk".into()));
        }
        if &self.subchunk2_id != b"data" {
            return Err(StreamError::InvalidFormat("missing data subchunk".into()));
        }
        Ok(())
    }
}

fn field(bytes: &[u8], at: usize) -> [u8; 4] {
    [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_header() -> WavHeader {
        let mut header = WavHeader::pcm(44100, 2, 16);
        header.set_data_len(6144);
        header
    }

    #[test]
    fn pcm_derives_rate_fields() {
        let header = WavHeader::pcm(22050, 2, 16);
        assert_eq!(header.block_align, 4);
        assert_eq!(header.byte_rate, 88200);
        assert_eq!(header.audio_format, 1);
        assert_eq!(header.subchunk1_size, 16);
        assert_eq!(header.chunk_size, 0);
        assert_eq!(header.subchunk2_size, 0);
    }

    #[test]
    fn set_data_len_patches_both_sizes() {
        let mut header = WavHeader::pcm(44100, 2, 16);
        header.set_data_len(1024);
        assert_eq!(header.subchunk2_size, 1024);
        assert_eq!(header.chunk_size, 1060);
    }

    #[test]
    fn encode_lays_out_canonical_fields() {
        let bytes = sample_header().encode();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 6180);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), 2);
        assert_eq!(u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]), 44100);
        assert_eq!(u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]), 176400);
        assert_eq!(u16::from_le_bytes([bytes[32], bytes[33]]), 4);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]), 6144);
    }

    #[test]
    fn decode_round_trips_encode() {
        let header = sample_header();
        let decoded = WavHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.encode(), header.encode());
    }

    #[test]
    fn decode_accepts_padded_data_subchunk() {
        let canonical = sample_header().encode();

        // Same header with 4 junk bytes between the fmt and data subchunks.
        let mut padded = Vec::with_capacity(WAV_HEADER_PROBE_LEN);
        padded.extend_from_slice(&canonical[0..36]);
        padded.extend_from_slice(b"LIST");
        padded.extend_from_slice(&canonical[36..44]);

        let decoded = WavHeader::decode(&padded).unwrap();
        assert_eq!(decoded, sample_header());
    }

    #[test]
    fn decode_rejects_short_padded_prefix() {
        let canonical = sample_header().encode();
        let mut padded = Vec::new();
        padded.extend_from_slice(&canonical[0..36]);
        padded.extend_from_slice(b"LIST");
        padded.extend_from_slice(&canonical[36..40]);

        let err = WavHeader::decode(&padded).unwrap_err();
        assert!(matches!(err, StreamError::InvalidFormat(_)));
    }

    #[test]
    fn decode_rejects_short_prefix() {
        let bytes = sample_header().encode();
        let err = WavHeader::decode(&bytes[..43]).unwrap_err();
        assert!(matches!(err, StreamError::InvalidFormat(_)));
    }

    #[test]
    fn decode_rejects_each_corrupt_sentinel() {
        for at in [0usize, 8, 12, 36] {
            let mut bytes = sample_header().encode().to_vec();
            bytes[at] = b'X';
            // Corrupting the data id at 36 sends the decoder down the padded
            // branch, which needs 48 bytes; extend so it fails on content.
            bytes.resize(WAV_HEADER_PROBE_LEN, 0);
            let err = WavHeader::decode(&bytes).unwrap_err();
            assert!(
                matches!(err, StreamError::InvalidFormat(_)),
                "corruption at {} not rejected",
                at
            );
        }
    }

    #[test]
    fn decode_keeps_non_sentinel_fields_unvalidated() {
        let mut bytes = sample_header().encode();
        bytes[20] = 7; // audio_format
        bytes[16] = 99; // subchunk1_size
        let decoded = WavHeader::decode(&bytes).unwrap();
        assert_eq!(decoded.audio_format, 7);
        assert_eq!(decoded.subchunk1_size, 99);
    }

    #[test]
    fn duration_follows_byte_rate() {
        let mut header = WavHeader::pcm(22050, 2, 16);
        header.set_data_len(88200);
        assert_relative_eq!(header.duration_secs(), 1.0, epsilon = 1e-9);

        header.byte_rate = 0;
        assert_relative_eq!(header.duration_secs(), 0.0, epsilon = 1e-9);
    }
}
