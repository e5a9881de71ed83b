use std::io::{ErrorKind, Write};

use npybridge_format::{decode, encode, NdArray};
use tracing::debug;

use crate::channel::TransferChannel;
use crate::error::{Result, SessionError};
use crate::escape::escape_literal;

/// Drives an interactive interpreter through its command input.
///
/// Commands are opaque lines written to `sink`. Arrays travel inline as
/// escaped byte literals; arrays coming back are picked off the output stream
/// by a [`LineDemultiplexer`](crate::LineDemultiplexer) feeding the same
/// [`TransferChannel`].
pub struct Session<W> {
    sink: W,
    channel: TransferChannel,
    bytes_prefix: bool,
}

impl<W: Write> Session<W> {
    pub fn new(sink: W, channel: TransferChannel) -> Self {
        Self {
            sink,
            channel,
            bytes_prefix: true,
        }
    }

    /// Whether outbound literals get a `b` prefix (needed by Python 3).
    pub fn with_bytes_prefix(mut self, bytes_prefix: bool) -> Self {
        self.bytes_prefix = bytes_prefix;
        self
    }

    /// Forward one command line verbatim.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.sink, "{line}")
            .and_then(|()| self.sink.flush())
            .map_err(|err| match err.kind() {
                ErrorKind::BrokenPipe => SessionError::Closed,
                _ => SessionError::Io(err),
            })
    }

    /// Bind `array` to `name` inside the interpreter.
    pub fn send(&mut self, name: &str, array: &NdArray) -> Result<()> {
        let frame = encode(array)?;
        let prefix = if self.bytes_prefix { "b" } else { "" };
        debug!(name, frame_len = frame.len(), "sending array");

        self.write_line(&format!("content = {prefix}{}", escape_literal(&frame)))?;
        self.write_line(&format!("{name} = np.load(io.BytesIO(content))"))
    }

    /// Fetch the array bound to `name`.
    ///
    /// Blocks until the interpreter prints the frame; there is no timeout.
    pub fn get(&mut self, name: &str) -> Result<NdArray> {
        debug!(name, "requesting array");
        self.write_line("ioBytes = io.BytesIO()")?;
        self.write_line(&format!("np.save(ioBytes, {name})"))?;
        self.write_line("ioBytes.getvalue()")?;

        let frame = self.channel.consume();
        let array = decode(&frame)?;
        debug!(name, shape = ?array.shape(), element = %array.element_type(), "received array");
        Ok(array)
    }

    pub fn channel(&self) -> &TransferChannel {
        &self.channel
    }

    /// Borrow the command sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Consume the session and return the command sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}
