//! Offline audio-differencing core: aligns two recordings against a
//! declarative block layout, analyzes each block's frequency content,
//! and reports amplitude differences and missing frequencies between
//! them.

pub mod analysis;
pub mod config;
pub mod differences;
pub mod extractor;
pub mod layout;
pub mod normalize;
pub mod numerics;
pub mod signal;
pub mod sync;
pub mod wav;
pub mod weighting;
pub mod window;

use std::path::Path;
use thiserror::Error;

use config::AnalysisConfig;
use layout::Layout;
use signal::Signal;

/// Aggregates every error kind a full `analyze`/`compare` run can raise
/// (spec.md §7).
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error(transparent)]
    Layout(#[from] layout::LayoutError),

    #[error(transparent)]
    Wav(#[from] wav::WavError),

    #[error("no sync pulse train found in {0}: {1}")]
    NoSyncFound(String, sync::SyncError),
}

/// Loads `wav_path`, locates its leading (and, if present, trailing)
/// sync pulse train, extracts and analyzes every block named by
/// `layout`, and returns the fully populated [`Signal`].
///
/// Mirrors the consumer-facing `analyze(wavPath, layout, params)`
/// interface named in spec.md §6.
pub fn analyze(wav_path: &Path, layout: &Layout, params: &AnalysisConfig) -> Result<Signal, AnalyzerError> {
    let (header, payload) = wav::read_wav(wav_path)?;

    let leading_offset = sync::detect_leading_pulse(&payload, &header, params.channel)
        .map_err(|e| AnalyzerError::NoSyncFound(wav_path.display().to_string(), e))?;

    let mut window_cache = window::WindowCache::new(params.window);
    let mut analyzer = analysis::FrequencyAnalyzer::new();
    let total_chunks = layout.total_chunks() as usize;
    let mut signal = Signal::new(wav_path.to_path_buf(), header, total_chunks, params.max_freq);

    for pos in 0..total_chunks {
        let (start, end) = extractor::block_byte_range(layout, &header, leading_offset, pos);
        let windowed = extractor::extract_block(&payload, params.channel, start, end, &mut window_cache);
        if windowed.is_empty() {
            continue;
        }
        let mut block = analyzer.analyze_block(
            &windowed,
            header.samples_per_sec,
            params.start_hz,
            params.end_hz,
            params.max_freq,
            false,
        );
        if params.compress_frequencies {
            analysis::compress_frequencies(&mut block, params.hz_width);
        }
        signal.blocks[pos] = block;
    }

    normalize::find_floor(&mut signal, layout.first_silence_index());

    let last_silence_byte_offset = layout.last_silence_byte_offset(&header);
    match sync::detect_trailing_pulse(&payload, &header, params.channel, leading_offset, last_silence_byte_offset) {
        Ok(offset) => signal.trailing_offset = Some(offset),
        Err(err) => {
            tracing::warn!(wav_path = %wav_path.display(), error = %err, "trailing sync pulse not found");
        }
    }

    Ok(signal)
}

/// Normalizes both signals per `params.normalize`, clears prior matches,
/// and runs the peak matcher. Mirrors spec.md §6's `compare(reference,
/// test, params) → Differences` interface.
pub fn compare(
    reference: &mut Signal,
    test: &mut Signal,
    layout: &Layout,
    params: &AnalysisConfig,
) -> differences::Differences {
    match params.normalize {
        config::NormalizePolicy::Global => {
            normalize::global_normalize(reference, params.significant_volume_db);
            normalize::global_normalize(test, params.significant_volume_db);
        }
        config::NormalizePolicy::Local => {
            normalize::local_normalize(reference, params.significant_volume_db);
            normalize::local_normalize(test, params.significant_volume_db);
        }
        config::NormalizePolicy::Relative => {
            let mut shared = None;
            normalize::relative_normalize(reference, &mut shared, params.significant_volume_db);
            normalize::relative_normalize(test, &mut shared, params.significant_volume_db);
        }
    }

    reference.clear_matched();
    test.clear_matched();

    differences::compare(reference, test, layout, params.hz_width, params.tolerance_db)
}

/// One block's identity and peaks, as yielded by [`iterate_blocks`].
pub struct BlockView<'a> {
    pub index: usize,
    pub name: &'a str,
    pub colour: &'a str,
    pub kind: Option<layout::BlockKind>,
    pub peaks: &'a [signal::Peak],
}

/// Walks `signal`'s blocks alongside `layout`'s metadata, mirroring
/// spec.md §6's `iterateBlocks(signal) → (index, name, colour, kind,
/// peaks)` consumer interface.
pub fn iterate_blocks<'a>(signal: &'a Signal, layout: &'a Layout) -> impl Iterator<Item = BlockView<'a>> {
    signal.blocks.iter().enumerate().map(move |(index, block)| BlockView {
        index,
        name: layout.block_name(index),
        colour: layout.block_colour(index),
        kind: layout.block_type(index),
        peaks: &block.peaks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn layout() -> Layout {
        let text = "MDFourierAudioBlockFile 1.0\nX\n16.6883\n1\nTone 1 1 30 red\n";
        Layout::parse(Cursor::new(text)).unwrap()
    }

    fn header() -> wav::WavHeader {
        wav::WavHeader {
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
    fn iterate_blocks_matches_layout_metadata() {
        let signal = Signal::new("a".into(), header(), 1, 4);
        let layout = layout();
        let views: Vec<_> = iterate_blocks(&signal, &layout).collect();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "Tone");
        assert_eq!(views[0].colour, "red");
    }
}
