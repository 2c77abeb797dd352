//! Integration tests for the `mdf-analyzer` CLI.
//!
//! These exercise the binary as a black box: write a layout file and WAV
//! fixtures to a temp directory, invoke the `compare`/`dump-layout`
//! subcommands, and check stdout/exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const LAYOUT_TEXT: &str = "MDFourierAudioBlockFile 1.0\n\
    TestPattern\n\
    16.6883\n\
    3\n\
    Sync s 1 10 white\n\
    Silence n 1 60 white\n\
    Tone 1 5 30 red\n";

fn write_layout(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("layout.mfn");
    fs::write(&path, LAYOUT_TEXT).expect("write layout");
    path
}

/// Writes a minimal canonical WAV: `frames` stereo 16-bit samples, all
/// silence. Good enough for CLI-plumbing tests that don't depend on a
/// real sync pulse train being found. Channels are interleaved, so the
/// sample count passed to the encoder is `2 * frames`.
fn write_silent_wav(path: &std::path::Path, sample_rate: u32, frames: usize) {
    let samples = vec![0i16; frames * 2];
    let bytes = mdf_analyzer::wav::encode_wav(sample_rate, &samples);
    fs::write(path, bytes).expect("write wav");
}

#[test]
fn dump_layout_reports_derived_totals() {
    let temp = TempDir::new().expect("tempdir");
    let layout_path = write_layout(temp.path());

    Command::cargo_bin("mdf-analyzer")
        .expect("binary")
        .args(["dump-layout", "--layout"])
        .arg(&layout_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total chunks: 7"))
        .stdout(predicate::str::contains("Regular chunks: 5"))
        .stdout(predicate::str::contains("First silence index: 1"));
}

#[test]
fn dump_layout_honours_platform_ms_override() {
    let temp = TempDir::new().expect("tempdir");
    let layout_path = write_layout(temp.path());

    Command::cargo_bin("mdf-analyzer")
        .expect("binary")
        .args(["dump-layout", "--layout"])
        .arg(&layout_path)
        .args(["--platform-ms-per-frame", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Platform ms/frame: 20"));
}

#[test]
fn dump_layout_rejects_malformed_file() {
    let temp = TempDir::new().expect("tempdir");
    let layout_path = temp.path().join("bad.mfn");
    fs::write(&layout_path, "NotMDFourier 1.0\n").unwrap();

    Command::cargo_bin("mdf-analyzer")
        .expect("binary")
        .args(["dump-layout", "--layout"])
        .arg(&layout_path)
        .assert()
        .failure();
}

#[test]
fn compare_reports_no_sync_found_on_silent_recordings() {
    let temp = TempDir::new().expect("tempdir");
    let layout_path = write_layout(temp.path());
    let reference_path = temp.path().join("reference.wav");
    let test_path = temp.path().join("test.wav");
    write_silent_wav(&reference_path, 44100, 44100);
    write_silent_wav(&test_path, 44100, 44100);

    // Silence contains no calibration pulse train, so the pipeline must
    // surface NoSyncFound rather than panicking or hanging.
    Command::cargo_bin("mdf-analyzer")
        .expect("binary")
        .args(["compare", "--layout"])
        .arg(&layout_path)
        .args(["--reference"])
        .arg(&reference_path)
        .args(["--test"])
        .arg(&test_path)
        .assert()
        .failure();
}

#[test]
fn compare_rejects_unknown_channel() {
    let temp = TempDir::new().expect("tempdir");
    let layout_path = write_layout(temp.path());
    let reference_path = temp.path().join("reference.wav");
    let test_path = temp.path().join("test.wav");
    write_silent_wav(&reference_path, 44100, 4000);
    write_silent_wav(&test_path, 44100, 4000);

    Command::cargo_bin("mdf-analyzer")
        .expect("binary")
        .args(["compare", "--layout"])
        .arg(&layout_path)
        .args(["--reference"])
        .arg(&reference_path)
        .args(["--test"])
        .arg(&test_path)
        .args(["--channel", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown channel"));
}
