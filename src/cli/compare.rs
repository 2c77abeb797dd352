//! `compare` subcommand: the full analyze → normalize → match → report
//! pipeline wired up from CLI arguments.

use std::path::PathBuf;

use thiserror::Error;

use mdf_analyzer::config::{AnalysisConfig, Channel, NormalizePolicy};
use mdf_analyzer::window::WindowKind;
use mdf_analyzer::{analyze, compare, layout::Layout, weighting, AnalyzerError};

#[derive(Error, Debug)]
pub enum CompareCommandError {
    #[error("unknown channel '{0}' (expected l, r, or s)")]
    UnknownChannel(String),

    #[error("unknown window '{0}' (expected none, hann, hamming, flattop, or tukey)")]
    UnknownWindow(String),

    #[error("unknown normalization policy '{0}' (expected g, l, or r)")]
    UnknownNormalize(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Layout(#[from] mdf_analyzer::layout::LayoutError),

    #[error("analyzing {}: {source}", path.display())]
    Analysis { path: PathBuf, source: AnalyzerError },
}

pub struct CompareOptions {
    pub layout: PathBuf,
    pub reference: PathBuf,
    pub test: PathBuf,
    pub channel: String,
    pub window: String,
    pub normalize: String,
    pub start_hz: f64,
    pub end_hz: f64,
    pub max_freq: usize,
    pub hz_width: f64,
    pub tolerance_db: f64,
    pub significant_volume_db: f64,
    pub output_filter_function: u8,
    pub spreadsheet: bool,
    pub just_results: bool,
    pub compress_frequencies: bool,
}

pub fn run_compare(options: CompareOptions) -> Result<(), CompareCommandError> {
    let channel =
        Channel::from_str(&options.channel).ok_or_else(|| CompareCommandError::UnknownChannel(options.channel.clone()))?;
    let window =
        WindowKind::from_str(&options.window).ok_or_else(|| CompareCommandError::UnknownWindow(options.window.clone()))?;
    let normalize = NormalizePolicy::from_str(&options.normalize)
        .ok_or_else(|| CompareCommandError::UnknownNormalize(options.normalize.clone()))?;

    let params = AnalysisConfig {
        channel,
        window,
        normalize,
        start_hz: options.start_hz,
        end_hz: options.end_hz,
        max_freq: options.max_freq,
        hz_width: options.hz_width,
        tolerance_db: options.tolerance_db,
        significant_volume_db: options.significant_volume_db,
        output_filter_function: options.output_filter_function,
        spreadsheet: options.spreadsheet,
        just_results: options.just_results,
        compress_frequencies: options.compress_frequencies,
    };

    let file_contents = std::fs::read_to_string(&options.layout)?;
    let layout = Layout::parse(std::io::Cursor::new(file_contents))?;

    tracing::info!(layout = %options.layout.display(), total_chunks = layout.total_chunks(), "loaded layout");

    let mut reference = analyze(&options.reference, &layout, &params).map_err(|source| CompareCommandError::Analysis {
        path: options.reference.clone(),
        source,
    })?;
    let mut test = analyze(&options.test, &layout, &params).map_err(|source| CompareCommandError::Analysis {
        path: options.test.clone(),
        source,
    })?;

    let diffs = compare(&mut reference, &mut test, &layout, &params);

    report(&diffs, &params, options.spreadsheet, options.just_results);

    Ok(())
}

fn report(diffs: &mdf_analyzer::differences::Differences, params: &AnalysisConfig, spreadsheet: bool, just_results: bool) {
    let total_missing: usize = diffs.total_missing();
    let total_ampl: usize = diffs.total_amplitude_diffs();

    if just_results {
        println!("missing_frequencies,amplitude_differences");
        println!("{total_missing},{total_ampl}");
        return;
    }

    for block in &diffs.blocks {
        if block.ampl_diffs.is_empty() && block.missing_freqs.is_empty() {
            continue;
        }

        if spreadsheet {
            for d in &block.ampl_diffs {
                let p = weighting::p_error(params.significant_volume_db, d.ref_db);
                let w = weighting::weight(p, params.output_filter_function);
                println!(
                    "{},{},{},{:.2},{:.2},{:.2},{:.4}",
                    block.block_index, block.name, d.hz, d.ref_db, d.diff_db, d.ref_db - d.diff_db, w
                );
            }
            for m in &block.missing_freqs {
                println!("{},{},{},{:.2},MISSING", block.block_index, block.name, m.hz, m.db);
            }
        } else {
            println!("Block {} ({}):", block.block_index, block.name);
            for d in &block.ampl_diffs {
                println!("  {:.2} Hz: reference {:.2} dB, diff {:.2} dB", d.hz, d.ref_db, d.diff_db);
            }
            for m in &block.missing_freqs {
                println!("  {:.2} Hz missing (reference {:.2} dB)", m.hz, m.db);
            }
        }
    }

    println!("Total: {total_missing} missing frequencies, {total_ampl} amplitude differences");
}
