//! Block extractor: maps each layout element to a byte range in the raw
//! sample payload, downmixes to mono, and applies a window.

use crate::config::Channel;
use crate::layout::Layout;
use crate::numerics::round4;
use crate::wav::WavHeader;
use crate::window::WindowCache;

/// The byte range `[start, end)` in the sample payload occupied by
/// element `pos`, anchored at `leading_offset` (the byte offset returned
/// by the sync detector for the leading pulse train).
#[must_use]
pub fn block_byte_range(layout: &Layout, header: &WavHeader, leading_offset: u64, pos: usize) -> (u64, u64) {
    let offset_seconds = layout.block_time_offset(pos);
    let start = leading_offset
        + round4(offset_seconds * header.samples_per_sec as f64 * 4.0).max(0) as u64;
    let duration_seconds = layout.block_duration(pos);
    let sample_count = (duration_seconds * header.samples_per_sec as f64).round() as u64;
    let end = start + sample_count * 4;
    (start, end)
}

/// Downmixes one block's raw stereo i16 samples to mono per `channel`,
/// applies the window for this block's sample count (using `cache` to
/// avoid regenerating windows of a length already seen), and returns the
/// windowed `f32` buffer ready for the DFT.
#[must_use]
pub fn extract_block(
    payload: &[u8],
    channel: Channel,
    start: u64,
    end: u64,
    window_cache: &mut WindowCache,
) -> Vec<f32> {
    let start = start as usize;
    let end = (end as usize).min(payload.len());
    if start >= end {
        return Vec::new();
    }

    let stereo = &payload[start..end];
    let frame_count = stereo.len() / 4;
    let mut mono = Vec::with_capacity(frame_count);

    for frame in stereo.chunks_exact(4) {
        let left = i16::from_le_bytes([frame[0], frame[1]]);
        let right = i16::from_le_bytes([frame[2], frame[3]]);
        let value = match channel {
            Channel::Left => left as f64,
            Channel::Right => right as f64,
            Channel::Sum => (left as f64 + right as f64) / 2.0,
        };
        mono.push(value as f32);
    }

    let window = window_cache.get(mono.len());
    for (sample, w) in mono.iter_mut().zip(window.iter()) {
        *sample *= w;
    }
    mono
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowKind;
    use std::io::Cursor;

    fn layout_with_one_tone() -> Layout {
        let text = "MDFourierAudioBlockFile 1.0\nX\n16.6883\n1\nTone 1 1 30 red\n";
        Layout::parse(Cursor::new(text)).unwrap()
    }

    fn header() -> WavHeader {
        WavHeader {
            chunk_size: 0,
            audio_format: 1,
            num_channels: 2,
            samples_per_sec: 44100,
            bytes_per_sec: 44100 * 4,
            block_align: 4,
            bits_per_sample: 16,
            subchunk2_size: 0,
        }
    }

    #[test]
    fn byte_range_starts_at_leading_offset_for_first_block() {
        let layout = layout_with_one_tone();
        let (start, _end) = block_byte_range(&layout, &header(), 1000, 0);
        assert_eq!(start, 1000);
    }

    #[test]
    fn downmix_sum_averages_channels() {
        let mut payload = Vec::new();
        // One stereo frame: left=100, right=-100 -> sum downmix = 0
        payload.extend_from_slice(&100i16.to_le_bytes());
        payload.extend_from_slice(&(-100i16).to_le_bytes());
        let mut cache = WindowCache::new(WindowKind::None);
        let out = extract_block(&payload, Channel::Sum, 0, 4, &mut cache);
        assert_eq!(out.len(), 1);
        assert!((out[0]).abs() < 1e-6);
    }

    #[test]
    fn left_channel_picks_left_sample() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&1234i16.to_le_bytes());
        payload.extend_from_slice(&(-999i16).to_le_bytes());
        let mut cache = WindowCache::new(WindowKind::None);
        let out = extract_block(&payload, Channel::Left, 0, 4, &mut cache);
        assert_eq!(out[0], 1234.0);
    }
}
