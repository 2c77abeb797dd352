//! The data model shared by every pipeline stage after extraction: peaks,
//! per-block results, and the signal that owns them.

use rustfft::num_complex::Complex;

use crate::wav::WavHeader;

/// A single frequency-domain peak picked out of one block's spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub hertz: f64,
    pub magnitude: f64,
    pub amplitude_db: f64,
    pub phase_deg: f64,
    /// 0 = unmatched; otherwise the 1-based index into the paired
    /// signal's peak list for this block.
    pub matched_index: usize,
}

impl Peak {
    #[must_use]
    pub fn zero() -> Self {
        Self {
            hertz: 0.0,
            magnitude: 0.0,
            amplitude_db: 0.0,
            phase_deg: 0.0,
            matched_index: 0,
        }
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.hertz != 0.0
    }
}

/// The ranked peak list and FFT metadata for a single block.
#[derive(Debug, Clone)]
pub struct BlockResult {
    /// Sorted by magnitude descending. Length is fixed at `MaxFreq`; a
    /// `hertz == 0.0` entry marks the end of real peaks.
    pub peaks: Vec<Peak>,
    pub fft_seconds: f64,
    pub fft_bin_count: usize,
    /// Retained only when the caller asked for it (see
    /// `AnalysisConfig`-adjacent `retain_spectrum` option on the
    /// analyzer); `None` otherwise so memory is released promptly.
    pub spectrum: Option<Vec<Complex<f32>>>,
}

impl BlockResult {
    #[must_use]
    pub fn empty(max_freq: usize) -> Self {
        Self {
            peaks: vec![Peak::zero(); max_freq],
            fft_seconds: 0.0,
            fft_bin_count: 0,
            spectrum: None,
        }
    }

    /// Iterates over real peaks only, stopping at the first zero-hertz
    /// entry — the legacy null-terminated-array semantics, exposed as an
    /// iterator instead of requiring callers to scan for the sentinel.
    pub fn present_peaks(&self) -> impl Iterator<Item = &Peak> {
        self.peaks.iter().take_while(|p| p.is_present())
    }
}

/// One fully analyzed recording: a WAV header plus one [`BlockResult`]
/// per element of the layout.
#[derive(Debug, Clone)]
pub struct Signal {
    pub source_file: std::path::PathBuf,
    pub header: WavHeader,
    pub blocks: Vec<BlockResult>,
    pub has_floor: bool,
    pub floor_hz: f64,
    pub floor_db: f64,
    /// Byte offset of the trailing calibration pulse train, if one was
    /// found. `None` doesn't abort analysis: the leading pulse train is
    /// the only anchor block offsets strictly require, so whether the
    /// absence of a trailing anchor matters is left to the caller.
    pub trailing_offset: Option<u64>,
}

impl Signal {
    #[must_use]
    pub fn new(source_file: std::path::PathBuf, header: WavHeader, total_chunks: usize, max_freq: usize) -> Self {
        Self {
            source_file,
            header,
            blocks: vec![BlockResult::empty(max_freq); total_chunks],
            has_floor: false,
            floor_hz: 0.0,
            floor_db: 0.0,
            trailing_offset: None,
        }
    }

    /// Clears every peak's `matched_index`. Required before re-matching
    /// (e.g. when re-running the matcher with different tolerances).
    pub fn clear_matched(&mut self) {
        for block in &mut self.blocks {
            for peak in block.peaks.iter_mut().take_while(|p| p.is_present()) {
                peak.matched_index = 0;
            }
        }
    }
}
