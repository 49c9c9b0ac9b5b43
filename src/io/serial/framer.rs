// src/io/serial/framer.rs
//
// Frame assembly for the serial monitor: raw passthrough, delimiter-based
// line framing and fixed-length block framing.
//
// Chunks arrive from the port in whatever sizes the driver hands back. The
// assembler keeps the unconsumed tail between calls so that frame boundaries
// never depend on read boundaries. Nothing is flushed at end of stream: a
// trailing partial line or block is dropped with the assembler.

use std::borrow::Cow;
use std::num::NonZeroUsize;

// =============================================================================
// Constants
// =============================================================================

/// Carriage return + line feed, the line terminator used by text mode.
pub const CRLF: [u8; 2] = [0x0D, 0x0A];

// =============================================================================
// Types
// =============================================================================

/// A non-empty delimiter byte sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter(Vec<u8>);

impl Delimiter {
    /// Returns `None` for an empty sequence.
    pub fn new(bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() {
            None
        } else {
            Some(Delimiter(bytes))
        }
    }

    pub fn crlf() -> Self {
        Delimiter(CRLF.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::crlf()
    }
}

/// Framing discipline, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramingMode {
    /// Every chunk read from the port is one frame, unmodified
    Raw,
    /// Lines terminated by `delimiter` (not included in the frame)
    Delimited { delimiter: Delimiter },
    /// Blocks of exactly `length` bytes
    FixedLength { length: NonZeroUsize },
}

impl FramingMode {
    /// Line framing on CRLF.
    pub fn text() -> Self {
        FramingMode::Delimited {
            delimiter: Delimiter::crlf(),
        }
    }

    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            FramingMode::Raw => "raw",
            FramingMode::Delimited { .. } => "text",
            FramingMode::FixedLength { .. } => "byte",
        }
    }
}

/// A complete frame extracted from the serial stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub bytes: Vec<u8>,
}

impl Frame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Frame { bytes }
    }

    /// Frame contents decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// =============================================================================
// Internal Framer Trait
// =============================================================================

trait FramerImpl {
    fn feed(&mut self, data: &[u8]) -> Vec<Frame>;
    /// Bytes held back waiting for the rest of a frame.
    fn pending(&self) -> &[u8];
}

// =============================================================================
// Raw Framer (Pass-through)
// =============================================================================

struct RawFramer;

impl FramerImpl for RawFramer {
    fn feed(&mut self, data: &[u8]) -> Vec<Frame> {
        vec![Frame::new(data.to_vec())]
    }

    fn pending(&self) -> &[u8] {
        &[]
    }
}

// =============================================================================
// Delimiter-Based Framer
// =============================================================================

struct DelimiterFramer {
    buffer: Vec<u8>,
    delimiter: Delimiter,
    /// Offset in `buffer` before which no delimiter can start
    scan_from: usize,
}

impl DelimiterFramer {
    fn new(delimiter: Delimiter) -> Self {
        DelimiterFramer {
            buffer: Vec::new(),
            delimiter,
            scan_from: 0,
        }
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

impl FramerImpl for DelimiterFramer {
    fn feed(&mut self, data: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        self.buffer.extend_from_slice(data);

        let delimiter = self.delimiter.as_bytes();
        let mut consumed = 0;
        let mut search = self.scan_from;

        while let Some(pos) = find_subsequence(&self.buffer[search..], delimiter) {
            let end = search + pos;
            // Empty lines are frames too
            frames.push(Frame::new(self.buffer[consumed..end].to_vec()));
            consumed = end + delimiter.len();
            search = consumed;
        }

        self.buffer.drain(..consumed);
        // A delimiter split across chunks can only start in the last len-1 bytes
        self.scan_from = self.buffer.len().saturating_sub(delimiter.len() - 1);

        frames
    }

    fn pending(&self) -> &[u8] {
        &self.buffer
    }
}

// =============================================================================
// Fixed-Length Framer
// =============================================================================

struct FixedLengthFramer {
    buffer: Vec<u8>,
    length: usize,
}

impl FixedLengthFramer {
    fn new(length: NonZeroUsize) -> Self {
        FixedLengthFramer {
            buffer: Vec::with_capacity(length.get()),
            length: length.get(),
        }
    }
}

impl FramerImpl for FixedLengthFramer {
    fn feed(&mut self, data: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(data);

        let whole = self.buffer.len() - self.buffer.len() % self.length;
        if whole == 0 {
            return Vec::new();
        }

        let frames = self.buffer[..whole]
            .chunks_exact(self.length)
            .map(|block| Frame::new(block.to_vec()))
            .collect();
        self.buffer.drain(..whole);

        frames
    }

    fn pending(&self) -> &[u8] {
        &self.buffer
    }
}

// =============================================================================
// Public FrameAssembler
// =============================================================================

/// Stateful frame assembler for streaming data.
///
/// Chunks must be fed in arrival order. The assembler performs no I/O and
/// never fails: any byte content is valid frame data.
pub struct FrameAssembler {
    mode: FramingMode,
    framer: Box<dyn FramerImpl + Send>,
}

impl FrameAssembler {
    /// Create a new assembler for the given mode
    pub fn new(mode: FramingMode) -> Self {
        let framer: Box<dyn FramerImpl + Send> = match &mode {
            FramingMode::Raw => Box::new(RawFramer),
            FramingMode::Delimited { delimiter } => {
                Box::new(DelimiterFramer::new(delimiter.clone()))
            }
            FramingMode::FixedLength { length } => Box::new(FixedLengthFramer::new(*length)),
        };

        FrameAssembler { mode, framer }
    }

    pub fn mode(&self) -> &FramingMode {
        &self.mode
    }

    /// Feed one chunk of bytes.
    /// Returns the frames it completed, in stream order (possibly none).
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.framer.feed(chunk)
    }

    /// Carry-over bytes not yet part of a complete frame.
    pub fn pending(&self) -> &[u8] {
        self.framer.pending()
    }

    /// End the session, dropping any partial frame.
    /// Returns how many buffered bytes were discarded.
    pub fn discard(self) -> usize {
        self.framer.pending().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(length: usize) -> FrameAssembler {
        FrameAssembler::new(FramingMode::FixedLength {
            length: NonZeroUsize::new(length).unwrap(),
        })
    }

    fn bytes_of(frames: &[Frame]) -> Vec<&[u8]> {
        frames.iter().map(|f| f.bytes.as_slice()).collect()
    }

    #[test]
    fn test_raw_chunks_pass_through() {
        let mut assembler = FrameAssembler::new(FramingMode::Raw);
        let chunks: [&[u8]; 3] = [b"\x01\x02", b"\r\n", b"abc\x00"];

        let mut frames = Vec::new();
        for chunk in chunks {
            frames.extend(assembler.feed(chunk));
            assert!(assembler.pending().is_empty());
        }

        assert_eq!(bytes_of(&frames), chunks.to_vec());
    }

    #[test]
    fn test_raw_empty_chunk_is_an_empty_frame() {
        let mut assembler = FrameAssembler::new(FramingMode::Raw);
        let chunks: [&[u8]; 3] = [b"a", b"", b"b"];

        let mut frames = Vec::new();
        for chunk in chunks {
            frames.extend(assembler.feed(chunk));
        }

        assert_eq!(bytes_of(&frames), chunks.to_vec());
        assert!(frames[1].is_empty());
    }

    #[test]
    fn test_text_single_chunk() {
        let mut assembler = FrameAssembler::new(FramingMode::text());
        let frames = assembler.feed(b"ab\r\ncd\r\n");

        assert_eq!(bytes_of(&frames), vec![b"ab".as_slice(), b"cd"]);
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn test_text_delimiter_split_across_chunks() {
        let mut assembler = FrameAssembler::new(FramingMode::text());

        assert!(assembler.feed(b"ab\r").is_empty());
        assert_eq!(assembler.pending(), b"ab\r");

        let frames = assembler.feed(b"\ncd");
        assert_eq!(bytes_of(&frames), vec![b"ab".as_slice()]);
        assert_eq!(assembler.pending(), b"cd");
    }

    #[test]
    fn test_text_empty_lines_are_emitted() {
        let mut assembler = FrameAssembler::new(FramingMode::text());
        let frames = assembler.feed(b"\r\n\r\n");

        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(Frame::is_empty));
    }

    #[test]
    fn test_text_lone_cr_or_lf_does_not_terminate() {
        let mut assembler = FrameAssembler::new(FramingMode::text());

        assert!(assembler.feed(b"a\rb\nc").is_empty());
        let frames = assembler.feed(b"\n\r\n");
        assert_eq!(bytes_of(&frames), vec![b"a\rb\nc\n".as_slice()]);
    }

    #[test]
    fn test_text_unterminated_tail_is_discarded() {
        let mut assembler = FrameAssembler::new(FramingMode::text());
        let frames = assembler.feed(b"ab\r\ncd");

        assert_eq!(bytes_of(&frames), vec![b"ab".as_slice()]);
        assert_eq!(assembler.discard(), 2);
    }

    #[test]
    fn test_text_byte_by_byte() {
        let mut assembler = FrameAssembler::new(FramingMode::text());
        let mut frames = Vec::new();
        for byte in b"one\r\n\r\ntwo\r\nthr" {
            frames.extend(assembler.feed(&[*byte]));
        }

        assert_eq!(
            bytes_of(&frames),
            vec![b"one".as_slice(), b"", b"two"]
        );
        assert_eq!(assembler.pending(), b"thr");
    }

    #[test]
    fn test_text_decodes_lossy() {
        let mut assembler = FrameAssembler::new(FramingMode::text());
        let frames = assembler.feed(b"temp=21\xff\r\n");

        assert_eq!(frames[0].text(), "temp=21\u{FFFD}");
    }

    #[test]
    fn test_custom_delimiter_overlapping_prefix() {
        let mut assembler = FrameAssembler::new(FramingMode::Delimited {
            delimiter: Delimiter::new(b"##!".to_vec()).unwrap(),
        });

        assert!(assembler.feed(b"x#").is_empty());
        assert!(assembler.feed(b"#").is_empty());
        let frames = assembler.feed(b"#!y##!");
        assert_eq!(bytes_of(&frames), vec![b"x#".as_slice(), b"y"]);
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn test_single_byte_delimiter() {
        let mut assembler = FrameAssembler::new(FramingMode::Delimited {
            delimiter: Delimiter::new(vec![0x0A]).unwrap(),
        });

        let frames = assembler.feed(b"a\nb\n\nc");
        assert_eq!(bytes_of(&frames), vec![b"a".as_slice(), b"b", b""]);
        assert_eq!(assembler.pending(), b"c");
    }

    #[test]
    fn test_delimiter_rejects_empty() {
        assert!(Delimiter::new(Vec::new()).is_none());
        assert_eq!(Delimiter::default().as_bytes(), &CRLF);
    }

    #[test]
    fn test_fixed_exact_multiple() {
        let mut assembler = fixed(4);
        let frames = assembler.feed(b"ABCDEFGH");

        assert_eq!(bytes_of(&frames), vec![b"ABCD".as_slice(), b"EFGH"]);
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn test_fixed_byte_by_byte() {
        let mut assembler = fixed(3);
        let mut emitted_at = Vec::new();
        let mut frames = Vec::new();

        for (i, byte) in b"1234567".iter().enumerate() {
            let out = assembler.feed(&[*byte]);
            if !out.is_empty() {
                emitted_at.push(i + 1);
            }
            frames.extend(out);
        }

        assert_eq!(emitted_at, vec![3, 6]);
        assert_eq!(bytes_of(&frames), vec![b"123".as_slice(), b"456"]);
        assert_eq!(assembler.pending(), b"7");
        assert_eq!(assembler.discard(), 1);
    }

    #[test]
    fn test_fixed_remainder_carries_over() {
        let mut assembler = fixed(4);

        let frames = assembler.feed(b"ABCDEF");
        assert_eq!(bytes_of(&frames), vec![b"ABCD".as_slice()]);
        assert_eq!(assembler.pending(), b"EF");

        let frames = assembler.feed(b"GHIJKLMNO");
        assert_eq!(
            bytes_of(&frames),
            vec![b"EFGH".as_slice(), b"IJKL"]
        );
        assert_eq!(assembler.pending(), b"MNO");
    }

    #[test]
    fn test_fixed_length_one() {
        let mut assembler = fixed(1);
        let frames = assembler.feed(b"xyz");
        assert_eq!(bytes_of(&frames), vec![b"x".as_slice(), b"y", b"z"]);
    }

    #[test]
    fn test_order_preserved_across_chunk_sizes() {
        let stream: Vec<u8> = (0u8..=200).collect();

        for chunk_size in [1, 2, 3, 7, 64, 201] {
            let mut assembler = fixed(5);
            let mut out = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                for frame in assembler.feed(chunk) {
                    out.extend(frame.bytes);
                }
            }
            assert_eq!(out, stream[..200].to_vec(), "chunk size {}", chunk_size);
            assert_eq!(assembler.pending(), &stream[200..]);
        }
    }

    /// Reference split: every delimiter-terminated line of `stream`, plus the tail.
    fn split_lines<'a>(stream: &'a [u8], delimiter: &[u8]) -> (Vec<&'a [u8]>, &'a [u8]) {
        let mut lines = Vec::new();
        let mut rest = stream;
        while let Some(pos) = find_subsequence(rest, delimiter) {
            lines.push(&rest[..pos]);
            rest = &rest[pos + delimiter.len()..];
        }
        (lines, rest)
    }

    fn assert_lines_across_chunk_sizes(mode: FramingMode, delimiter: &[u8], stream: &[u8]) {
        let (expected, tail) = split_lines(stream, delimiter);

        for chunk_size in [1, 2, 3, 4, 5, 7, 13, 64, stream.len()] {
            let mut assembler = FrameAssembler::new(mode.clone());
            let mut frames = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                frames.extend(assembler.feed(chunk));
            }
            assert_eq!(bytes_of(&frames), expected, "chunk size {}", chunk_size);
            assert_eq!(assembler.pending(), tail, "chunk size {}", chunk_size);
        }
    }

    #[test]
    fn test_text_order_preserved_across_chunk_sizes() {
        let stream = b"first\r\n\r\nsecond\rline\n\r\n\r\r\nthird\r\n\n\rtail\r";
        assert_lines_across_chunk_sizes(FramingMode::text(), &CRLF, stream);
    }

    #[test]
    fn test_custom_delimiter_order_preserved_across_chunk_sizes() {
        let delimiter = b"##!".to_vec();
        let mode = FramingMode::Delimited {
            delimiter: Delimiter::new(delimiter.clone()).unwrap(),
        };
        let stream = b"a#b##!##!#####!c##d##!!##!x#";
        assert_lines_across_chunk_sizes(mode, &delimiter, stream);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(FramingMode::Raw.name(), "raw");
        assert_eq!(FramingMode::text().name(), "text");
        assert_eq!(fixed(2).mode().name(), "byte");
    }
}
