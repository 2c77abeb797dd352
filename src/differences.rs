//! Matcher: pairs reference and test peaks per block and produces the
//! amplitude/missing-frequency differences consumed by the report/plot
//! layer.

use crate::layout::Layout;
use crate::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeDifference {
    pub hz: f64,
    pub ref_db: f64,
    pub diff_db: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissingFrequency {
    pub hz: f64,
    pub db: f64,
}

#[derive(Debug, Clone, Default)]
pub struct BlockDifference {
    pub block_index: usize,
    pub name: String,
    pub colour: String,
    pub ampl_diffs: Vec<AmplitudeDifference>,
    pub missing_freqs: Vec<MissingFrequency>,
}

#[derive(Debug, Clone, Default)]
pub struct Differences {
    pub blocks: Vec<BlockDifference>,
}

impl Differences {
    #[must_use]
    pub fn total_amplitude_diffs(&self) -> usize {
        self.blocks.iter().map(|b| b.ampl_diffs.len()).sum()
    }

    #[must_use]
    pub fn total_missing(&self) -> usize {
        self.blocks.iter().map(|b| b.missing_freqs.len()).sum()
    }
}

/// Pairs reference and test peaks for every block of the layout.
///
/// Preconditions (spec.md §4.7): both signals have already been analyzed
/// and normalized, and `clear_matched` has been called on both. Peaks
/// are iterated in magnitude-descending order (their stored order).
pub fn compare(reference: &mut Signal, test: &mut Signal, layout: &Layout, hz_width: f64, tolerance_db: f64) -> Differences {
    let mut differences = Differences::default();

    let total = layout.total_chunks() as usize;
    for block_index in 0..total {
        let Some(ref_block) = reference.blocks.get(block_index) else {
            continue;
        };
        if block_index >= test.blocks.len() {
            continue;
        }

        let mut diff = BlockDifference {
            block_index,
            name: layout.block_name(block_index).to_string(),
            colour: layout.block_colour(block_index).to_string(),
            ampl_diffs: Vec::new(),
            missing_freqs: Vec::new(),
        };

        let ref_peaks: Vec<_> = ref_block.present_peaks().cloned().collect();
        let mut test_matched = vec![false; test.blocks[block_index].peaks.len()];

        for (i, r) in ref_peaks.iter().enumerate() {
            let test_block = &test.blocks[block_index];
            let mut best: Option<(usize, f64, f64)> = None; // (j, |dhz|, test_magnitude)

            for (j, t) in test_block.present_peaks().enumerate() {
                if test_matched[j] {
                    continue;
                }
                let dhz = (r.hertz - t.hertz).abs();
                if dhz > hz_width {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((_, best_dhz, best_mag)) => {
                        dhz < best_dhz || (dhz == best_dhz && t.magnitude > best_mag)
                    }
                };
                if better {
                    best = Some((j, dhz, t.magnitude));
                }
            }

            if let Some((j, _, _)) = best {
                test_matched[j] = true;
                test.blocks[block_index].peaks[j].matched_index = i + 1;
                reference.blocks[block_index].peaks[i].matched_index = j + 1;

                let t = test.blocks[block_index].peaks[j];
                let diff_db = r.amplitude_db - t.amplitude_db;
                if diff_db.abs() > tolerance_db {
                    diff.ampl_diffs.push(AmplitudeDifference {
                        hz: r.hertz,
                        ref_db: r.amplitude_db,
                        diff_db,
                    });
                }
            } else {
                diff.missing_freqs.push(MissingFrequency {
                    hz: r.hertz,
                    db: r.amplitude_db,
                });
            }
        }

        differences.blocks.push(diff);
    }

    differences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{BlockResult, Peak};
    use crate::wav::WavHeader;
    use std::io::Cursor;

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

    fn layout() -> Layout {
        let text = "MDFourierAudioBlockFile 1.0\nX\n16.6883\n1\nTone 1 1 30 red\n";
        Layout::parse(Cursor::new(text)).unwrap()
    }

    fn peak(hz: f64, db: f64) -> Peak {
        Peak { hertz: hz, magnitude: 1.0, amplitude_db: db, phase_deg: 0.0, matched_index: 0 }
    }

    #[test]
    fn identical_signals_produce_no_differences() {
        let mut reference = crate::signal::Signal::new("a".into(), header(), 1, 4);
        let mut test = crate::signal::Signal::new("b".into(), header(), 1, 4);
        reference.blocks[0] = BlockResult {
            peaks: vec![peak(1000.0, -3.0), Peak::zero(), Peak::zero(), Peak::zero()],
            fft_seconds: 1.0,
            fft_bin_count: 0,
            spectrum: None,
        };
        test.blocks[0] = reference.blocks[0].clone();

        let diffs = compare(&mut reference, &mut test, &layout(), 20.0, 0.1);
        assert_eq!(diffs.total_amplitude_diffs(), 0);
        assert_eq!(diffs.total_missing(), 0);
    }

    #[test]
    fn unmatched_reference_peak_is_missing() {
        let mut reference = crate::signal::Signal::new("a".into(), header(), 1, 4);
        let mut test = crate::signal::Signal::new("b".into(), header(), 1, 4);
        reference.blocks[0] = BlockResult {
            peaks: vec![peak(1000.0, -3.0), Peak::zero(), Peak::zero(), Peak::zero()],
            fft_seconds: 1.0,
            fft_bin_count: 0,
            spectrum: None,
        };
        test.blocks[0] = BlockResult::empty(4);

        let diffs = compare(&mut reference, &mut test, &layout(), 20.0, 0.1);
        assert_eq!(diffs.total_missing(), 1);
        assert_eq!(diffs.blocks[0].missing_freqs[0].hz, 1000.0);
    }

    #[test]
    fn amplitude_difference_above_tolerance_is_reported() {
        let mut reference = crate::signal::Signal::new("a".into(), header(), 1, 4);
        let mut test = crate::signal::Signal::new("b".into(), header(), 1, 4);
        reference.blocks[0] = BlockResult {
            peaks: vec![peak(1000.0, 0.0), Peak::zero(), Peak::zero(), Peak::zero()],
            fft_seconds: 1.0,
            fft_bin_count: 0,
            spectrum: None,
        };
        test.blocks[0] = BlockResult {
            peaks: vec![peak(1000.0, -10.0), Peak::zero(), Peak::zero(), Peak::zero()],
            fft_seconds: 1.0,
            fft_bin_count: 0,
            spectrum: None,
        };

        let diffs = compare(&mut reference, &mut test, &layout(), 20.0, 3.0);
        assert_eq!(diffs.total_amplitude_diffs(), 1);
        assert_eq!(diffs.blocks[0].ampl_diffs[0].diff_db, 10.0);
    }

    #[test]
    fn matching_sets_symmetric_indices() {
        let mut reference = crate::signal::Signal::new("a".into(), header(), 1, 4);
        let mut test = crate::signal::Signal::new("b".into(), header(), 1, 4);
        reference.blocks[0] = BlockResult {
            peaks: vec![peak(1000.0, 0.0), Peak::zero(), Peak::zero(), Peak::zero()],
            fft_seconds: 1.0,
            fft_bin_count: 0,
            spectrum: None,
        };
        test.blocks[0] = BlockResult {
            peaks: vec![peak(1001.0, 0.0), Peak::zero(), Peak::zero(), Peak::zero()],
            fft_seconds: 1.0,
            fft_bin_count: 0,
            spectrum: None,
        };

        let _ = compare(&mut reference, &mut test, &layout(), 20.0, 0.1);
        assert_eq!(test.blocks[0].peaks[0].matched_index, 1);
    }
}
