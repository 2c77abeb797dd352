//! `dump-layout` subcommand: parses a layout file and prints its derived
//! block structure, for debugging layout files without running a full
//! comparison.

use std::path::PathBuf;

use mdf_analyzer::layout::{BlockKind, Layout, LayoutError};

pub struct DumpLayoutOptions {
    pub layout: PathBuf,
    pub platform_ms_per_frame: Option<f64>,
}

pub fn run_dump_layout(options: DumpLayoutOptions) -> Result<(), LayoutError> {
    let contents = std::fs::read_to_string(&options.layout)?;
    let mut layout = Layout::parse(std::io::Cursor::new(contents))?;

    if let Some(ms) = options.platform_ms_per_frame {
        layout.set_platform_ms_per_frame(ms);
    }

    println!("Layout: {}", layout.name);
    println!("Platform ms/frame: {}", layout.platform_ms_per_frame);
    println!("Total chunks: {}", layout.total_chunks());
    println!("Regular chunks: {}", layout.regular_chunks());
    if let Some(idx) = layout.first_silence_index() {
        println!("First silence index: {idx}");
    }
    println!();

    let mut pos = 0usize;
    for block_type in &layout.types {
        let kind_label = match block_type.kind {
            BlockKind::Silence => "silence".to_string(),
            BlockKind::Sync => "sync".to_string(),
            BlockKind::Control => "control".to_string(),
            BlockKind::User(id) => format!("user({id})"),
        };
        println!(
            "{:>4}  {:<20} kind={:<12} count={:<4} frames={:<4} element_s={:.6} block_s={:.6} colour={}",
            pos, block_type.name, kind_label, block_type.element_count, block_type.frames,
            block_type.element_seconds, block_type.block_seconds, block_type.colour
        );
        pos += block_type.element_count as usize;
    }

    Ok(())
}
