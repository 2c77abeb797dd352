//! mdf-analyzer - Offline audio-differencing tool for comparing frequency
//! content across hardware revisions.
//!
//! Aligns a reference and a test recording against a declarative block
//! layout, analyzes every block's frequency content, and reports
//! amplitude differences and missing frequencies between them.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::wrong_self_convention)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::enum_variant_names)]

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else if args.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Commands::Compare {
            layout,
            reference,
            test,
            channel,
            window,
            normalize,
            start_hz,
            end_hz,
            max_freq,
            hz_width,
            tolerance_db,
            significant_volume_db,
            output_filter_function,
            spreadsheet,
            just_results,
            compress_frequencies,
        } => {
            cli::compare::run_compare(cli::compare::CompareOptions {
                layout,
                reference,
                test,
                channel,
                window,
                normalize,
                start_hz,
                end_hz,
                max_freq,
                hz_width,
                tolerance_db,
                significant_volume_db,
                output_filter_function,
                spreadsheet,
                just_results,
                compress_frequencies,
            })?;
        }
        Commands::DumpLayout { layout, platform_ms_per_frame } => {
            cli::dump_layout::run_dump_layout(cli::dump_layout::DumpLayoutOptions {
                layout,
                platform_ms_per_frame,
            })?;
        }
    }

    Ok(())
}
