//! Sync pulse detector: locates the leading and trailing calibration
//! pulse trains in a recording so block offsets can be anchored to real
//! sample positions instead of assumed layout timing.

use thiserror::Error;

use crate::config::Channel;
use crate::numerics::{round4, round_float};
use crate::wav::WavHeader;

#[derive(Error, Debug, PartialEq)]
pub enum SyncError {
    #[error("no sync pulse train found in the recording")]
    NoSyncFound,
    #[error("sample data ends before the expected pulse train")]
    UnexpectedEof,
}

/// Dominant frequency measured in one analysis chunk of the pulse scan.
#[derive(Debug, Clone, Copy, Default)]
struct Pulse {
    byte_offset: u64,
    hertz: f64,
    magnitude: f64,
    amplitude_db: f64,
}

/// Expected calibration tone per `factor`, index-matched to the original
/// two-pass scan (`factor` 4 then 9); unused indices are never queried.
const EXPECTED_HZ: [f64; 10] = [0.0, 8018.18, 8018.18, 8820.0, 8018.18, 9800.0, 5512.5, 6300.0, 7350.0, 8820.0];
const TONE_MATCH_DB: f64 = -30.0;
const TONE_MATCH_HZ_TOLERANCE: f64 = 2.0;
const MIN_PULSE_FACTOR: i64 = 14;
const MAX_PULSE_FACTOR: i64 = 17;
const SILENCE_VOLUME_GAP_DB: f64 = 30.0;
const DISCONTINUITY_GAP: i64 = 2;
const REQUIRED_PULSE_COUNT: u32 = 10;

/// Analysis window size in bytes for a given `factor`: `round4((samplesPerSec·4)/(1000·factor))`,
/// clamped to at least one sample frame.
fn pulse_window_bytes(header: &WavHeader, factor: i64) -> u64 {
    round4((header.samples_per_sec as f64 * 4.0 / 1000.0) / factor as f64).max(4i64) as u64
}

/// Scans the payload in `factor`-sized sub-millisecond chunks starting
/// at `offset`, measuring each chunk's dominant frequency, then looks
/// for ten consecutive tone/silence pairs matching `EXPECTED_HZ[factor]`.
/// Returns the byte offset where the matched sequence begins.
fn detect_pulse_internal(
    payload: &[u8],
    header: &WavHeader,
    channel: Channel,
    factor: i64,
    offset: u64,
) -> Result<u64, SyncError> {
    let ms_bytes = pulse_window_bytes(header, factor);

    if (payload.len() as u64) < ms_bytes {
        return Err(SyncError::UnexpectedEof);
    }
    let total_chunks = (payload.len() as u64 / ms_bytes).saturating_sub(1);

    let mut pulses = Vec::with_capacity(total_chunks as usize);
    let mut max_magnitude = 0.0f64;
    let mut pos = offset;
    let mut i = if offset > 0 { offset / ms_bytes } else { 0 };

    while i < total_chunks {
        if pos + ms_bytes > payload.len() as u64 {
            break;
        }
        let chunk = &payload[pos as usize..(pos + ms_bytes) as usize];
        let (hertz, magnitude) = dominant_frequency(chunk, channel, header.samples_per_sec);
        if magnitude > max_magnitude {
            max_magnitude = magnitude;
        }
        pulses.push(Pulse {
            byte_offset: pos,
            hertz,
            magnitude,
            amplitude_db: 0.0,
        });
        pos += ms_bytes;
        i += 1;
    }

    if pulses.is_empty() || max_magnitude <= 0.0 {
        return Err(SyncError::NoSyncFound);
    }

    for pulse in &mut pulses {
        pulse.amplitude_db = if pulse.hertz != 0.0 {
            round_float(20.0 * (pulse.magnitude / max_magnitude).log10(), 2)
        } else {
            -100.0
        };
    }

    let expected_hz = EXPECTED_HZ[factor as usize];
    let min_run = MIN_PULSE_FACTOR * factor;
    let max_run = MAX_PULSE_FACTOR * factor;

    let mut inside_pulse: i64 = 0;
    let mut inside_silence: i64 = 0;
    let mut pulse_start: u64 = 0;
    let mut sequence_start: u64 = 0;
    let mut last_pulse_start: u64 = u64::MAX;
    let mut last_pulse_pos: Option<i64> = None;
    let mut last_silence_pos: Option<i64> = None;
    let mut pulse_amplitudes = 0.0;
    let mut silence_amplitudes = 0.0;
    let mut pulse_count: u32 = 0;

    for (idx, pulse) in pulses.iter().enumerate() {
        let idx = idx as i64;
        let is_tone = pulse.amplitude_db >= TONE_MATCH_DB
            && (pulse.hertz - expected_hz).abs() <= TONE_MATCH_HZ_TOLERANCE;

        if is_tone {
            if inside_pulse == 0 {
                pulse_start = pulse.byte_offset;
                pulse_amplitudes = 0.0;
                silence_amplitudes = 0.0;
                inside_silence = 0;
                last_pulse_start = u64::MAX;
                last_pulse_pos = None;
            }
            if sequence_start == 0 {
                sequence_start = pulse_start;
            }

            if let Some(last) = last_pulse_pos {
                if idx > last + DISCONTINUITY_GAP {
                    pulse_count = 0;
                    sequence_start = 0;
                    inside_silence = 0;
                    inside_pulse = 0;
                    continue;
                }
            }
            inside_pulse += 1;
            last_pulse_pos = Some(idx);
            pulse_amplitudes += pulse.amplitude_db;

            if inside_pulse >= max_run {
                pulse_count = 0;
                sequence_start = 0;
                inside_silence = 0;
                inside_pulse = 0;
            }
        } else {
            if inside_pulse >= min_run {
                if let Some(last) = last_silence_pos {
                    if idx > last + DISCONTINUITY_GAP {
                        pulse_count = 0;
                        sequence_start = 0;
                        inside_silence = 0;
                        inside_pulse = 0;
                        continue;
                    }
                }
                inside_silence += 1;
                silence_amplitudes += pulse.amplitude_db;
                last_silence_pos = Some(idx);

                if pulse_start != last_pulse_start && inside_silence >= min_run {
                    let pulse_volume = pulse_amplitudes / inside_pulse as f64;
                    let silence_volume = silence_amplitudes / inside_silence as f64;

                    if silence_volume.abs() - pulse_volume.abs() >= SILENCE_VOLUME_GAP_DB {
                        pulse_count += 1;
                        last_pulse_start = pulse_start;
                        if pulse_count == REQUIRED_PULSE_COUNT {
                            return Ok(sequence_start);
                        }
                    } else {
                        pulse_count = 0;
                        sequence_start = 0;
                    }
                    inside_silence = 0;
                    inside_pulse = 0;
                }

                if inside_silence >= max_run {
                    pulse_count = 0;
                    sequence_start = 0;
                    inside_silence = 0;
                    inside_pulse = 0;
                }
            } else if inside_pulse >= max_run || inside_silence >= max_run {
                pulse_count = 0;
                sequence_start = 0;
                inside_silence = 0;
                inside_pulse = 0;
            }
        }
    }

    Err(SyncError::NoSyncFound)
}

/// Single-bin dominant-frequency DFT over one analysis chunk's mono
/// downmix, mirroring the analyzer's real-to-complex approach but
/// returning only the strongest bin (bin 0 / DC is never a candidate).
fn dominant_frequency(chunk: &[u8], channel: Channel, sample_rate: u32) -> (f64, f64) {
    use rustfft::{num_complex::Complex, FftPlanner};

    let frame_count = chunk.len() / 4;
    if frame_count == 0 {
        return (0.0, 0.0);
    }

    let mut mono: Vec<Complex<f32>> = Vec::with_capacity(frame_count);
    for frame in chunk.chunks_exact(4) {
        let left = i16::from_le_bytes([frame[0], frame[1]]);
        let right = i16::from_le_bytes([frame[2], frame[3]]);
        let value = match channel {
            Channel::Left => left as f64,
            Channel::Right => right as f64,
            Channel::Sum => (left as f64 + right as f64) / 2.0,
        };
        mono.push(Complex::new(value as f32, 0.0));
    }

    let n = mono.len();
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut mono);

    let seconds = n as f64 / sample_rate as f64;
    let size = frame_count as f64; // stereo sample count, matches original magnitude normalization
    let sqrt_size = size.sqrt();

    let mut max_hertz = 0.0;
    let mut max_magnitude = 0.0;
    for (i, c) in mono.iter().enumerate().take(n / 2 + 1).skip(1) {
        let magnitude = ((c.re as f64).powi(2) + (c.im as f64).powi(2)).sqrt() / sqrt_size;
        if magnitude > max_magnitude {
            max_magnitude = magnitude;
            max_hertz = i as f64 / seconds;
        }
    }

    (max_hertz, max_magnitude)
}

/// Detects the leading pulse train: a coarse pass at `factor = 4`
/// followed by a refining pass at `factor = 9` anchored near the coarse
/// result, as the original two-stage scan does.
pub fn detect_leading_pulse(payload: &[u8], header: &WavHeader, channel: Channel) -> Result<u64, SyncError> {
    let coarse = detect_pulse_internal(payload, header, channel, 4, 0)?;
    let w4 = pulse_window_bytes(header, 4);
    let refine_offset = if coarse >= 2 * w4 { coarse - 2 * w4 } else { 0 };
    detect_pulse_internal(payload, header, channel, 9, refine_offset)
}

/// Detects the trailing pulse train, starting the scan at
/// `last_silence_byte_offset + leading_offset` as the original does.
pub fn detect_trailing_pulse(
    payload: &[u8],
    header: &WavHeader,
    channel: Channel,
    leading_offset: u64,
    last_silence_byte_offset: u64,
) -> Result<u64, SyncError> {
    let start = last_silence_byte_offset + leading_offset;
    let coarse = detect_pulse_internal(payload, header, channel, 4, start)?;
    let w4 = pulse_window_bytes(header, 4);
    let refine_offset = if coarse >= 2 * w4 { coarse - 2 * w4 } else { 0 };
    detect_pulse_internal(payload, header, channel, 9, refine_offset)
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn tone_payload(hertz: f64, sample_rate: u32, frames: usize, amplitude: i16) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(frames * 4);
        for i in 0..frames {
            let t = i as f64 / sample_rate as f64;
            let sample = (amplitude as f64 * (2.0 * std::f64::consts::PI * hertz * t).sin()) as i16;
            bytes.extend_from_slice(&sample.to_le_bytes());
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn dominant_frequency_of_pure_tone_matches_input() {
        let sample_rate = 44100;
        let payload = tone_payload(8018.18, sample_rate, 512, 20000);
        let (hertz, magnitude) = dominant_frequency(&payload, Channel::Left, sample_rate);
        assert!(magnitude > 0.0);
        assert!((hertz - 8018.18).abs() < 500.0);
    }

    #[test]
    fn silence_yields_no_pulse() {
        let header = header();
        let payload = vec![0u8; 44100 * 4];
        let result = detect_pulse_internal(&payload, &header, Channel::Left, 4, 0);
        assert!(result.is_err());
    }

    #[test]
    fn too_short_payload_is_eof() {
        let header = header();
        let payload = vec![0u8; 2];
        let result = detect_pulse_internal(&payload, &header, Channel::Left, 4, 0);
        assert_eq!(result, Err(SyncError::UnexpectedEof));
    }

    #[test]
    fn pulse_window_bytes_rounds_up_to_next_multiple_of_four() {
        let mut h = header();
        h.samples_per_sec = 48000;
        // raw = (48000*4/1000)/9 = 21.33 -> round4 (ceiling) -> 24, not round_down4's 20.
        assert_eq!(pulse_window_bytes(&h, 9), 24);
    }
}
