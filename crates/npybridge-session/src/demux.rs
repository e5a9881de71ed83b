//! Splitting the interpreter's output into array frames and plain text.
//!
//! A line is an array frame when it contains a quoted byte literal whose
//! first decoded bytes are the frame magic and version (`\x93NUMPY\x01\x00`).
//! This is a textual sniff, not length-prefixed framing: ordinary output that
//! happens to print such a literal is taken as a frame, and a frame broken
//! across lines is handed off truncated.

use std::io::{BufRead, ErrorKind};

use npybridge_format::header::VERSION;
use npybridge_format::MAGIC;
use tracing::{debug, warn};

use crate::channel::TransferChannel;
use crate::error::Result;
use crate::escape::LiteralBytes;

/// Decoded bytes every frame literal starts with.
pub const FRAME_PREFIX: [u8; 8] = [
    MAGIC[0], MAGIC[1], MAGIC[2], MAGIC[3], MAGIC[4], MAGIC[5], VERSION.0, VERSION.1,
];

/// Classification of one output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// An escaped frame literal; `body` starts right after the opening quote.
    Frame { body: &'a [u8], quote: u8 },
    /// Anything else.
    Text,
}

/// Where a line was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Frame,
    Text,
}

/// Classify a line (without its line ending).
pub fn classify(line: &[u8]) -> LineKind<'_> {
    for (index, &byte) in line.iter().enumerate() {
        if byte != b'"' && byte != b'\'' {
            continue;
        }
        let body = &line[index + 1..];
        let mut decoded = LiteralBytes::new(body, Some(byte));
        let is_frame = FRAME_PREFIX
            .iter()
            .all(|expected| matches!(decoded.next(), Some(Ok(b)) if b == *expected));
        if is_frame {
            return LineKind::Frame { body, quote: byte };
        }
    }
    LineKind::Text
}

/// Decode a frame literal body up to its closing quote.
///
/// Returns the raw bytes and whether the closing quote was found.
pub fn decode_frame_literal(body: &[u8], quote: u8) -> Result<(Vec<u8>, bool)> {
    let mut literal = LiteralBytes::new(body, Some(quote));
    let bytes = literal.by_ref().collect::<Result<Vec<u8>>>()?;
    Ok((bytes, literal.is_closed()))
}

/// Routes frame lines into a [`TransferChannel`] and all other lines to a
/// text callback.
///
/// Text lines reach the callback without their line ending and otherwise
/// unchanged when they are valid UTF-8. Invalid sequences are replaced with
/// U+FFFD, as [`String::from_utf8_lossy`] does.
pub struct LineDemultiplexer<F> {
    channel: TransferChannel,
    on_text: F,
    frames: u64,
}

impl<F: FnMut(&str)> LineDemultiplexer<F> {
    pub fn new(channel: TransferChannel, on_text: F) -> Self {
        Self {
            channel,
            on_text,
            frames: 0,
        }
    }

    /// Number of frames handed to the channel so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Route a single line. A trailing `\n` or `\r\n` is ignored.
    ///
    /// Blocks while the channel still holds an unread frame.
    pub fn feed_line(&mut self, line: &[u8]) -> Routed {
        let line = trim_line_ending(line);

        if let LineKind::Frame { body, quote } = classify(line) {
            match decode_frame_literal(body, quote) {
                Ok((bytes, closed)) => {
                    if !closed {
                        warn!(len = bytes.len(), "frame literal has no closing quote");
                    }
                    debug!(len = bytes.len(), "routing array frame");
                    self.channel.produce(bytes);
                    self.frames += 1;
                    return Routed::Frame;
                }
                Err(err) => {
                    warn!(%err, "frame-like line could not be unescaped, passing it on as text");
                }
            }
        }

        (self.on_text)(&String::from_utf8_lossy(line));
        Routed::Text
    }

    /// Route every line of `reader` until end of stream.
    ///
    /// Returns the number of frames routed over the demultiplexer's lifetime.
    pub fn run<R: BufRead>(&mut self, mut reader: R) -> std::io::Result<u64> {
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => return Ok(self.frames),
                Ok(_) => {
                    self.feed_line(&line);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
