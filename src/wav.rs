//! Canonical RIFF/WAVE reader.
//!
//! Only the subset MDFourier-style test recordings actually use is
//! supported: PCM, 16-bit, stereo. Chunk sizes are little-endian as the
//! RIFF spec requires.

use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WavError {
    #[error("not a RIFF file (bad 'RIFF' magic)")]
    BadRiffMagic,

    #[error("not a WAVE file (bad 'WAVE' magic)")]
    BadWaveMagic,

    #[error("'fmt ' chunk not found where expected")]
    BadFmtMagic,

    #[error("'data' chunk not found where expected")]
    BadDataMagic,

    #[error("unsupported audio format {0} (only PCM/1 is supported)")]
    UnsupportedFormat(u16),

    #[error("unsupported channel count {0} (only stereo/2 is supported)")]
    UnsupportedChannels(u16),

    #[error("unsupported bit depth {0} (only 16-bit is supported)")]
    UnsupportedBitDepth(u16),

    #[error("file too short to contain a valid WAV header")]
    Truncated,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The canonical 44-byte `RIFF`/`WAVE`/`fmt `/`data` header, field for field.
#[derive(Debug, Clone, Copy)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub samples_per_sec: u32,
    pub bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub subchunk2_size: u32,
}

/// Reads an entire WAV file into memory and returns its header and raw
/// sample payload. `header.subchunk2_size` is the authoritative length of
/// the returned payload; trailing chunks after `data`, if any, are ignored.
pub fn read_wav(path: &Path) -> Result<(WavHeader, Vec<u8>), WavError> {
    let mut file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    parse_wav(&bytes)
}

/// Parses a WAV file already loaded into memory.
pub fn parse_wav(bytes: &[u8]) -> Result<(WavHeader, Vec<u8>), WavError> {
    if bytes.len() < 44 {
        return Err(WavError::Truncated);
    }

    if &bytes[0..4] != b"RIFF" {
        return Err(WavError::BadRiffMagic);
    }
    let chunk_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if &bytes[8..12] != b"WAVE" {
        return Err(WavError::BadWaveMagic);
    }
    if &bytes[12..16] != b"fmt " {
        return Err(WavError::BadFmtMagic);
    }

    let audio_format = u16::from_le_bytes([bytes[20], bytes[21]]);
    if audio_format != 1 {
        return Err(WavError::UnsupportedFormat(audio_format));
    }

    let num_channels = u16::from_le_bytes([bytes[22], bytes[23]]);
    if num_channels != 2 {
        return Err(WavError::UnsupportedChannels(num_channels));
    }

    let samples_per_sec = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);
    let bytes_per_sec = u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]);
    let block_align = u16::from_le_bytes([bytes[32], bytes[33]]);
    let bits_per_sample = u16::from_le_bytes([bytes[34], bytes[35]]);
    if bits_per_sample != 16 {
        return Err(WavError::UnsupportedBitDepth(bits_per_sample));
    }

    if &bytes[36..40] != b"data" {
        return Err(WavError::BadDataMagic);
    }
    let subchunk2_size = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]);

    let header = WavHeader {
        chunk_size,
        audio_format,
        num_channels,
        samples_per_sec,
        bytes_per_sec,
        block_align,
        bits_per_sample,
        subchunk2_size,
    };

    let available = bytes.len() - 44;
    let payload_len = (subchunk2_size as usize).min(available);
    let payload = bytes[44..44 + payload_len].to_vec();

    Ok((header, payload))
}

/// Builds a minimal canonical 44-byte WAV header + payload, for tests and
/// for the debug chunk-dump path. Mirrors the byte layout `parse_wav` reads.
#[must_use]
pub fn encode_wav(samples_per_sec: u32, samples: &[i16]) -> Vec<u8> {
    let data_size = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(44 + data_size as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&samples_per_sec.to_le_bytes());
    out.extend_from_slice(&(samples_per_sec * 4).to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    for &s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}
