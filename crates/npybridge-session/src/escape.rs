//! Backslash-hex escaping of raw bytes for the text channel.
//!
//! Outbound, every byte becomes `\xHH` inside a double-quoted literal.
//! Inbound, the interpreter prints bytes the way a Python bytes literal is
//! written: printable ASCII verbatim, `\\`, `\'`, `\"`, `\t`, `\n`, `\r`, and
//! `\xhh` for everything else. Each remaining input byte maps to exactly one
//! output byte (single-byte decoding), so all values 0-255 survive.

use crate::error::{Result, SessionError};

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Render `bytes` as `"\xHH\xHH..."`, uppercase hex, double-quoted.
pub fn escape_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4 + 2);
    out.push('"');
    for &byte in bytes {
        out.push_str("\\x");
        out.push(char::from(HEX_UPPER[usize::from(byte >> 4)]));
        out.push(char::from(HEX_UPPER[usize::from(byte & 0x0F)]));
    }
    out.push('"');
    out
}

/// Reverse the escaping of a literal body (the text between the quotes).
pub fn unescape_literal(body: &[u8]) -> Result<Vec<u8>> {
    LiteralBytes::new(body, None).collect()
}

/// Iterator over the bytes denoted by an escaped literal body.
///
/// When a closing quote is given, iteration stops at the first unescaped
/// occurrence of it and [`LiteralBytes::is_closed`] reports true.
pub(crate) struct LiteralBytes<'a> {
    input: &'a [u8],
    pos: usize,
    quote: Option<u8>,
    pending: Option<u8>,
    closed: bool,
}

impl<'a> LiteralBytes<'a> {
    pub(crate) fn new(input: &'a [u8], quote: Option<u8>) -> Self {
        Self {
            input,
            pos: 0,
            quote,
            pending: None,
            closed: false,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    fn hex_escape(&mut self, start: usize) -> Result<u8> {
        let digits = self
            .input
            .get(self.pos..self.pos + 2)
            .ok_or(SessionError::InvalidEscape {
                offset: start,
                reason: "\\x needs two hex digits",
            })?;
        let value = hex_value(digits[0])
            .zip(hex_value(digits[1]))
            .map(|(hi, lo)| (hi << 4) | lo)
            .ok_or(SessionError::InvalidEscape {
                offset: start,
                reason: "non-hex digit after \\x",
            })?;
        self.pos += 2;
        Ok(value)
    }
}

impl Iterator for LiteralBytes<'_> {
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(byte) = self.pending.take() {
            return Some(Ok(byte));
        }
        if self.closed {
            return None;
        }

        let &byte = self.input.get(self.pos)?;
        if Some(byte) == self.quote {
            self.closed = true;
            return None;
        }
        self.pos += 1;
        if byte != b'\\' {
            return Some(Ok(byte));
        }

        let start = self.pos - 1;
        let Some(&escape) = self.input.get(self.pos) else {
            return Some(Err(SessionError::InvalidEscape {
                offset: start,
                reason: "dangling backslash",
            }));
        };
        self.pos += 1;

        let decoded = match escape {
            b'\\' | b'\'' | b'"' => escape,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'x' => return Some(self.hex_escape(start)),
            other => {
                // Unknown escapes stand for themselves, backslash included.
                self.pending = Some(other);
                b'\\'
            }
        };
        Some(Ok(decoded))
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}
