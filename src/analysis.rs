//! Frequency analyzer: real-to-complex DFT (via a zero-imaginary complex
//! FFT, following the same approach as a conventional dominant-frequency
//! detector) plus top-K peak picking.

use std::collections::HashMap;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::numerics::round_float;
use crate::signal::{BlockResult, Peak};

/// Horizontal-line CRT whine band; bins in this range never become peaks.
const CRT_NOISE_LOW_HZ: f64 = 15620.0;
const CRT_NOISE_HIGH_HZ: f64 = 15710.0;

#[must_use]
pub fn is_crt_noise(hertz: f64) -> bool {
    (CRT_NOISE_LOW_HZ..=CRT_NOISE_HIGH_HZ).contains(&hertz)
}

/// Owns one FFT plan per unique block length seen so far, reused across
/// every block of that duration instead of replanned each time.
pub struct FrequencyAnalyzer {
    planner: FftPlanner<f32>,
    plans: HashMap<usize, Arc<dyn Fft<f32>>>,
}

impl Default for FrequencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            plans: HashMap::new(),
        }
    }

    fn plan_for(&mut self, n: usize) -> Arc<dyn Fft<f32>> {
        self.plans
            .entry(n)
            .or_insert_with(|| self.planner.plan_fft_forward(n))
            .clone()
    }

    /// Runs the DFT over `windowed_samples`, scans `[start_hz, end_hz)`,
    /// and returns the top `max_freq` peaks by magnitude, sorted
    /// descending, with CRT-band bins excluded.
    pub fn analyze_block(
        &mut self,
        windowed_samples: &[f32],
        sample_rate: u32,
        start_hz: f64,
        end_hz: f64,
        max_freq: usize,
        retain_spectrum: bool,
    ) -> BlockResult {
        let n = windowed_samples.len();
        if n == 0 {
            return BlockResult::empty(max_freq);
        }

        let mut buffer: Vec<Complex<f32>> = windowed_samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
        let fft = self.plan_for(n);
        fft.process(&mut buffer);

        let seconds = n as f64 / sample_rate as f64;
        let sqrt_n = (n as f64).sqrt();

        let mut peaks = vec![Peak::zero(); max_freq];

        let start_bin = ((start_hz * seconds).floor() as usize).max(0);
        let end_bin = ((end_hz * seconds).ceil() as usize).min(n);

        for i in start_bin..end_bin {
            let c = buffer[i];
            let hertz = round_float(i as f64 / seconds, 2);
            if is_crt_noise(hertz) {
                continue;
            }
            let magnitude = ((c.re as f64).powi(2) + (c.im as f64).powi(2)).sqrt() / sqrt_n;
            if magnitude <= 0.0 {
                continue;
            }
            let phase_deg = (c.im as f64).atan2(c.re as f64) * 180.0 / std::f64::consts::PI;

            insert_peak(&mut peaks, Peak {
                hertz,
                magnitude,
                amplitude_db: 0.0,
                phase_deg,
                matched_index: 0,
            });
        }

        BlockResult {
            peaks,
            fft_seconds: seconds,
            fft_bin_count: n,
            spectrum: if retain_spectrum { Some(buffer) } else { None },
        }
    }
}

/// Inserts `incoming` into the magnitude-descending `peaks` array at its
/// sorted position, shifting later entries down and dropping the tail.
fn insert_peak(peaks: &mut [Peak], incoming: Peak) {
    let mut j = peaks.len();
    for (idx, existing) in peaks.iter().enumerate() {
        if incoming.magnitude > existing.magnitude {
            j = idx;
            break;
        }
    }
    if j >= peaks.len() {
        return;
    }
    for k in (j + 1..peaks.len()).rev() {
        peaks[k] = peaks[k - 1];
    }
    peaks[j] = incoming;
}

/// Optional, disabled-by-default pass: merges peaks whose hertz are
/// within `hz_width` of each other (lesser magnitude folds into greater,
/// summed), then re-sorts by magnitude descending.
pub fn compress_frequencies(block: &mut BlockResult, hz_width: f64) {
    let n = block.peaks.len();
    for i in 0..n {
        for j in 0..n {
            if i == j || !block.peaks[i].is_present() || !block.peaks[j].is_present() {
                continue;
            }
            let diff = (block.peaks[j].hertz - block.peaks[i].hertz).abs();
            if diff > hz_width {
                continue;
            }
            if block.peaks[i].magnitude > block.peaks[j].magnitude {
                block.peaks[i].magnitude += block.peaks[j].magnitude;
                block.peaks[j] = Peak::zero();
            } else {
                block.peaks[j].magnitude += block.peaks[i].magnitude;
                block.peaks[i] = Peak::zero();
            }
        }
    }
    block.peaks.sort_unstable_by(|a, b| b.magnitude.partial_cmp(&a.magnitude).unwrap());
}
