use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod compare;
pub mod dump_layout;

#[derive(Parser)]
#[command(name = "mdf-analyzer")]
#[command(author, version, about = "Offline audio-differencing tool for comparing frequency content across hardware revisions")]
#[command(long_about = "Compares a reference and a test recording against a declarative block \
layout: locates the calibration pulse train in each, analyzes every \
block's frequency content, and reports amplitude differences and \
missing frequencies between them.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze reference and test recordings and report their differences.
    Compare {
        /// Block-layout file (`mdfblocks.mfn`-style)
        #[arg(short, long)]
        layout: PathBuf,

        /// Reference (known-good) WAV recording
        #[arg(short, long)]
        reference: PathBuf,

        /// Test WAV recording to compare against the reference
        #[arg(short, long)]
        test: PathBuf,

        /// Channel to analyze: l, r, or s (sum)
        #[arg(short, long, default_value = "l")]
        channel: String,

        /// Window function: none, hann, hamming, flattop, tukey
        #[arg(short, long, default_value = "hann")]
        window: String,

        /// Normalization policy: g (global), l (local), r (relative)
        #[arg(short, long, default_value = "g")]
        normalize: String,

        /// Lowest frequency considered, in Hz
        #[arg(long, default_value = "10")]
        start_hz: f64,

        /// Highest frequency considered, in Hz
        #[arg(long, default_value = "20000")]
        end_hz: f64,

        /// Maximum number of peaks retained per block
        #[arg(long, default_value = "2000")]
        max_freq: usize,

        /// Frequency tolerance used by the peak matcher, in Hz
        #[arg(long, default_value = "20")]
        hz_width: f64,

        /// Amplitude tolerance before a difference is reported, in dB
        #[arg(long, default_value = "3")]
        tolerance_db: f64,

        /// Noise floor below which peaks are considered insignificant, in dB
        #[arg(long, default_value = "-60")]
        significant_volume_db: f64,

        /// Weighting curve applied to plotted differences (0-6)
        #[arg(long, default_value = "2")]
        output_filter_function: u8,

        /// Emit a comma-separated spreadsheet instead of a text report
        #[arg(long)]
        spreadsheet: bool,

        /// Only print the summary counts, not every difference
        #[arg(long)]
        just_results: bool,

        /// Merge nearby peaks before matching
        #[arg(long)]
        compress_frequencies: bool,
    },

    /// Parse a layout file and print its derived block structure.
    DumpLayout {
        /// Block-layout file (`mdfblocks.mfn`-style)
        #[arg(short, long)]
        layout: PathBuf,

        /// Platform frame duration override, in milliseconds
        #[arg(long)]
        platform_ms_per_frame: Option<f64>,
    },
}
