//! Block-layout loader.
//!
//! Parses the declarative `mdfblocks.mfn`-style text file describing the
//! test-pattern structure: a named, ordered sequence of block types, each
//! repeated some number of times, with a per-element duration expressed in
//! platform frames.

use std::fmt;
use std::io::BufRead;
use thiserror::Error;

use crate::wav::WavHeader;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("line {line}: malformed layout file: {detail}")]
    Malformed { line: usize, detail: String },

    #[error("unsupported layout version {0} (this parser handles up to 1.0)")]
    UnsupportedVersion(f64),

    #[error("layout declares zero block types or zero total elements")]
    EmptyLayout,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The class of a [`BlockType`]; distinguishes calibration/structural
/// blocks from the blocks under test ("user" blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Silence,
    Sync,
    Control,
    User(i32),
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Silence => write!(f, "silence"),
            BlockKind::Sync => write!(f, "sync"),
            BlockKind::Control => write!(f, "control"),
            BlockKind::User(id) => write!(f, "user({id})"),
        }
    }
}

/// A class of contiguous chunks in the pattern: `element_count` repeats of
/// a chunk lasting `frames` platform frames each.
#[derive(Debug, Clone)]
pub struct BlockType {
    pub name: String,
    pub kind: BlockKind,
    pub element_count: u32,
    pub frames: u32,
    pub colour: String,
    pub element_seconds: f64,
    pub block_seconds: f64,
}

impl BlockType {
    fn recompute(&mut self, platform_ms_per_frame: f64) {
        self.element_seconds = self.frames as f64 * platform_ms_per_frame / 1000.0;
        self.block_seconds = self.element_count as f64 * self.element_seconds;
    }
}

/// The full, ordered test-pattern description.
#[derive(Debug, Clone)]
pub struct Layout {
    pub name: String,
    pub platform_ms_per_frame: f64,
    pub types: Vec<BlockType>,
    total_chunks: u32,
    regular_chunks: u32,
}

impl Layout {
    /// Parses a layout from any buffered reader using the grammar:
    ///
    /// ```text
    /// "MDFourierAudioBlockFile" <version>
    /// <layoutName>
    /// <platformMsPerFrame>
    /// <typeCount>
    /// <typeName> <kindToken> <elementCount> <frames> <colour>   (repeated)
    /// ```
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, LayoutError> {
        let mut tokens = Tokenizer::new(reader);

        let magic = tokens.next_token()?;
        if magic != "MDFourierAudioBlockFile" {
            return Err(LayoutError::Malformed {
                line: tokens.line(),
                detail: format!("expected magic header, got '{magic}'"),
            });
        }

        let version: f64 = tokens.next_token()?.parse().map_err(|_| LayoutError::Malformed {
            line: tokens.line(),
            detail: "version is not a number".into(),
        })?;
        if version > 1.0 {
            return Err(LayoutError::UnsupportedVersion(version));
        }

        let name = tokens.next_token()?;

        let platform_ms_per_frame: f64 =
            tokens.next_token()?.parse().map_err(|_| LayoutError::Malformed {
                line: tokens.line(),
                detail: "platformMsPerFrame is not a number".into(),
            })?;
        if platform_ms_per_frame <= 0.0 {
            return Err(LayoutError::Malformed {
                line: tokens.line(),
                detail: "platformMsPerFrame must be > 0".into(),
            });
        }

        let type_count: usize = tokens.next_token()?.parse().map_err(|_| LayoutError::Malformed {
            line: tokens.line(),
            detail: "typeCount is not an integer".into(),
        })?;

        let mut types = Vec::with_capacity(type_count);
        for _ in 0..type_count {
            let type_name = tokens.next_token()?;
            let kind_token = tokens.next_token()?;
            let element_count: u32 =
                tokens.next_token()?.parse().map_err(|_| LayoutError::Malformed {
                    line: tokens.line(),
                    detail: "elementCount is not an integer".into(),
                })?;
            let frames: u32 = tokens.next_token()?.parse().map_err(|_| LayoutError::Malformed {
                line: tokens.line(),
                detail: "frames is not an integer".into(),
            })?;
            let colour = tokens.next_token()?;

            if element_count == 0 || frames == 0 {
                return Err(LayoutError::Malformed {
                    line: tokens.line(),
                    detail: "elementCount and frames must both be >= 1".into(),
                });
            }

            let kind = parse_kind_token(&kind_token);
            let mut block_type = BlockType {
                name: type_name,
                kind,
                element_count,
                frames,
                colour,
                element_seconds: 0.0,
                block_seconds: 0.0,
            };
            block_type.recompute(platform_ms_per_frame);
            types.push(block_type);
        }

        if type_count == 0 {
            return Err(LayoutError::EmptyLayout);
        }

        let mut layout = Layout {
            name,
            platform_ms_per_frame,
            types,
            total_chunks: 0,
            regular_chunks: 0,
        };
        layout.recompute_derived();

        if layout.total_chunks == 0 {
            return Err(LayoutError::EmptyLayout);
        }

        Ok(layout)
    }

    fn recompute_derived(&mut self) {
        self.total_chunks = self.types.iter().map(|t| t.element_count).sum();
        self.regular_chunks = self
            .types
            .iter()
            .filter(|t| !matches!(t.kind, BlockKind::Silence | BlockKind::Sync | BlockKind::Control))
            .map(|t| t.element_count)
            .sum();
    }

    /// Recomputes every [`BlockType`]'s `element_seconds`/`block_seconds`
    /// for a new platform frame duration.
    pub fn set_platform_ms_per_frame(&mut self, ms_per_frame: f64) {
        self.platform_ms_per_frame = ms_per_frame;
        for block_type in &mut self.types {
            block_type.recompute(ms_per_frame);
        }
    }

    #[must_use]
    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    #[must_use]
    pub fn regular_chunks(&self) -> u32 {
        self.regular_chunks
    }

    /// Index of the first element belonging to a `Silence` block type, if any.
    #[must_use]
    pub fn first_silence_index(&self) -> Option<usize> {
        let mut index = 0usize;
        for block_type in &self.types {
            if block_type.kind == BlockKind::Silence {
                return Some(index);
            }
            index += block_type.element_count as usize;
        }
        None
    }

    /// Seconds elapsed, measured from the end of the leading sync pulse
    /// train, to the start of element `pos`.
    ///
    /// Sync block types contribute zero duration to this sum: their
    /// physical extent is already accounted for by the sync detector's
    /// anchor offset, so counting it again here would double it.
    #[must_use]
    pub fn block_time_offset(&self, pos: usize) -> f64 {
        let mut offset = 0.0;
        let mut counted = 0usize;
        for block_type in &self.types {
            let per_element = if block_type.kind == BlockKind::Sync {
                0.0
            } else {
                block_type.element_seconds
            };
            for _ in 0..block_type.element_count as usize {
                if counted == pos {
                    return offset;
                }
                offset += per_element;
                counted += 1;
            }
        }
        offset
    }

    /// Byte offset (relative to the start of the sample payload,
    /// immediately following the leading sync pulse train) at which the
    /// trailing sync block type is expected to begin.
    ///
    /// Computed as the total duration of every block type that precedes
    /// the last `Sync` block type, converted to bytes assuming 16-bit
    /// stereo framing (4 bytes/sample-pair).
    #[must_use]
    pub fn last_silence_byte_offset(&self, header: &WavHeader) -> u64 {
        let Some(trailing_sync_index) = self.types.iter().rposition(|t| t.kind == BlockKind::Sync) else {
            return 0;
        };
        let seconds: f64 = self.types[..trailing_sync_index]
            .iter()
            .map(|t| t.block_seconds)
            .sum();
        crate::numerics::round4(seconds * header.samples_per_sec as f64 * 4.0).max(0) as u64
    }

    /// Duration, in platform frames, of every block type preceding the
    /// trailing sync block type. Companion to [`Layout::last_silence_byte_offset`]
    /// expressed in frame units rather than bytes.
    #[must_use]
    pub fn last_sync_frame_offset(&self) -> u64 {
        let Some(trailing_sync_index) = self.types.iter().rposition(|t| t.kind == BlockKind::Sync) else {
            return 0;
        };
        self.types[..trailing_sync_index]
            .iter()
            .map(|t| u64::from(t.frames) * u64::from(t.element_count))
            .sum()
    }

    #[must_use]
    pub fn block_duration(&self, pos: usize) -> f64 {
        self.locate(pos).map(|(t, _)| t.element_seconds).unwrap_or(0.0)
    }

    #[must_use]
    pub fn block_name(&self, pos: usize) -> &str {
        self.locate(pos).map(|(t, _)| t.name.as_str()).unwrap_or("")
    }

    #[must_use]
    pub fn block_sub_index(&self, pos: usize) -> usize {
        self.locate(pos).map(|(_, sub)| sub).unwrap_or(0)
    }

    #[must_use]
    pub fn block_type(&self, pos: usize) -> Option<BlockKind> {
        self.locate(pos).map(|(t, _)| t.kind)
    }

    #[must_use]
    pub fn block_colour(&self, pos: usize) -> &str {
        self.locate(pos).map(|(t, _)| t.colour.as_str()).unwrap_or("")
    }

    fn locate(&self, pos: usize) -> Option<(&BlockType, usize)> {
        let mut counted = 0usize;
        for block_type in &self.types {
            let next = counted + block_type.element_count as usize;
            if pos < next {
                return Some((block_type, pos - counted));
            }
            counted = next;
        }
        None
    }
}

fn parse_kind_token(token: &str) -> BlockKind {
    if token == "n" {
        BlockKind::Silence
    } else if token == "s" {
        BlockKind::Sync
    } else {
        match token.parse::<i32>() {
            Ok(v) if v > 0 => BlockKind::User(v),
            _ => BlockKind::Control,
        }
    }
}

/// Minimal whitespace-splitting tokenizer that tracks line numbers for
/// error messages, since `fscanf("%s")` in the original parser skips
/// arbitrary whitespace including newlines.
struct Tokenizer<R> {
    reader: R,
    pending: std::collections::VecDeque<String>,
    line: usize,
}

impl<R: BufRead> Tokenizer<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            pending: std::collections::VecDeque::new(),
            line: 0,
        }
    }

    fn line(&self) -> usize {
        self.line
    }

    fn next_token(&mut self) -> Result<String, LayoutError> {
        loop {
            if let Some(tok) = self.pending.pop_front() {
                return Ok(tok);
            }
            let mut buf = String::new();
            let n = self.reader.read_line(&mut buf)?;
            if n == 0 {
                return Err(LayoutError::Malformed {
                    line: self.line,
                    detail: "unexpected end of file".into(),
                });
            }
            self.line += 1;
            for tok in buf.split_whitespace() {
                self.pending.push_back(tok.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_layout() -> &'static str {
        "MDFourierAudioBlockFile 1.0\n\
         TestPattern\n\
         16.6883\n\
         3\n\
         Sync s 1 10 white\n\
         Silence n 1 60 white\n\
         Tone 1 5 30 red\n"
    }

    #[test]
    fn parses_scenario_3_from_spec() {
        let layout = Layout::parse(Cursor::new(sample_layout())).unwrap();
        assert_eq!(layout.total_chunks(), 7);
        assert_eq!(layout.regular_chunks(), 5);
        assert_eq!(layout.first_silence_index(), Some(1));
        let offset = layout.block_time_offset(2);
        assert!((offset - 1.001298).abs() < 1e-5, "offset={offset}");
    }

    #[test]
    fn rejects_unsupported_version() {
        let text = "MDFourierAudioBlockFile 1.5\nX\n16.0\n1\nA n 1 1 red\n";
        let err = Layout::parse(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, LayoutError::UnsupportedVersion(_)));
    }

    #[test]
    fn rejects_zero_types() {
        let text = "MDFourierAudioBlockFile 1.0\nX\n16.0\n0\n";
        let err = Layout::parse(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, LayoutError::EmptyLayout));
    }

    #[test]
    fn rejects_malformed_header() {
        let text = "NotMDFourier 1.0\n";
        let err = Layout::parse(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, LayoutError::Malformed { .. }));
    }

    #[test]
    fn set_platform_ms_per_frame_recomputes_derived_fields() {
        let mut layout = Layout::parse(Cursor::new(sample_layout())).unwrap();
        layout.set_platform_ms_per_frame(20.0);
        for block_type in &layout.types {
            let expected_element = block_type.frames as f64 * 20.0 / 1000.0;
            assert!((block_type.element_seconds - expected_element).abs() < 1e-9);
            let expected_block = block_type.element_count as f64 * expected_element;
            assert!((block_type.block_seconds - expected_block).abs() < 1e-9);
        }
    }

    #[test]
    fn block_queries_resolve_names_and_subindices() {
        let layout = Layout::parse(Cursor::new(sample_layout())).unwrap();
        assert_eq!(layout.block_name(0), "Sync");
        assert_eq!(layout.block_name(1), "Silence");
        assert_eq!(layout.block_name(2), "Tone");
        assert_eq!(layout.block_sub_index(2), 0);
        assert_eq!(layout.block_sub_index(3), 1);
        assert_eq!(layout.block_type(0), Some(BlockKind::Sync));
        assert_eq!(layout.block_colour(2), "red");
    }
}
