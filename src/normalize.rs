//! Amplitude normalization: converts raw FFT magnitudes into dB values
//! relative to a peak, under one of three policies (spec.md §4.6).
//!
//! Unlike the original routines this is grounded on, a zero maximum
//! magnitude (a fully silent signal) never reaches a division: every
//! block's peaks are clamped to `significant_volume_db` instead of
//! producing `NaN`/`-inf` amplitudes.

use crate::analysis::is_crt_noise;
use crate::numerics::round_float;
use crate::signal::Signal;

/// Finds the largest peak magnitude across every block of `signal`,
/// ignoring CRT-noise bins (which are never inserted as peaks anyway,
/// but the guard costs nothing and documents the invariant).
fn max_magnitude(signal: &Signal) -> f64 {
    signal
        .blocks
        .iter()
        .flat_map(|b| b.present_peaks())
        .filter(|p| !is_crt_noise(p.hertz))
        .map(|p| p.magnitude)
        .fold(0.0, f64::max)
}

fn apply_scale(signal: &mut Signal, scale: f64, significant_volume_db: f64) {
    if scale <= 0.0 {
        for block in &mut signal.blocks {
            for peak in block.peaks.iter_mut().take_while(|p| p.is_present()) {
                peak.amplitude_db = significant_volume_db;
                peak.magnitude = 0.0;
            }
        }
        return;
    }
    for block in &mut signal.blocks {
        for peak in block.peaks.iter_mut().take_while(|p| p.is_present()) {
            peak.amplitude_db = round_float(20.0 * (peak.magnitude / scale).log10(), 2);
            peak.magnitude = peak.magnitude * 100.0 / scale;
        }
    }
}

/// Normalizes every block against the single largest peak in the whole
/// signal.
pub fn global_normalize(signal: &mut Signal, significant_volume_db: f64) {
    let scale = max_magnitude(signal);
    apply_scale(signal, scale, significant_volume_db);
}

/// Normalizes each block independently against its own largest peak,
/// discarding cross-block relative volume information.
pub fn local_normalize(signal: &mut Signal, significant_volume_db: f64) {
    for block in &mut signal.blocks {
        let scale = block
            .present_peaks()
            .filter(|p| !is_crt_noise(p.hertz))
            .map(|p| p.magnitude)
            .fold(0.0, f64::max);
        if scale <= 0.0 {
            for peak in block.peaks.iter_mut().take_while(|p| p.is_present()) {
                peak.amplitude_db = significant_volume_db;
                peak.magnitude = 0.0;
            }
            continue;
        }
        for peak in block.peaks.iter_mut().take_while(|p| p.is_present()) {
            peak.amplitude_db = round_float(20.0 * (peak.magnitude / scale).log10(), 2);
            peak.magnitude = peak.magnitude * 100.0 / scale;
        }
    }
}

/// Normalizes against a scale shared between two signals: the first
/// call (typically the reference) establishes the scale from its own
/// global maximum; the second (typically the test signal) reuses it so
/// both are comparable on the same axis.
pub fn relative_normalize(signal: &mut Signal, shared_scale: &mut Option<f64>, significant_volume_db: f64) {
    let scale = match *shared_scale {
        Some(s) if s != 0.0 => s,
        _ => {
            let s = max_magnitude(signal);
            *shared_scale = Some(s);
            s
        }
    };
    apply_scale(signal, scale, significant_volume_db);
}

/// Scans the first silence block (if the layout has one) for the first
/// non-CRT-noise peak and records it as the signal's noise floor.
pub fn find_floor(signal: &mut Signal, first_silence_index: Option<usize>) {
    let Some(index) = first_silence_index else {
        signal.has_floor = false;
        return;
    };
    let Some(block) = signal.blocks.get(index) else {
        signal.has_floor = false;
        return;
    };
    for peak in block.present_peaks() {
        if !is_crt_noise(peak.hertz) {
            signal.floor_hz = peak.hertz;
            signal.floor_db = peak.amplitude_db;
            signal.has_floor = true;
            return;
        }
    }
    signal.has_floor = false;
}
