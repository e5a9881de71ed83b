use npybridge_format::FormatError;

/// Errors that can occur while exchanging arrays with an interpreter.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Encoding or decoding an array frame failed.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// A quoted byte literal contains a malformed escape sequence.
    #[error("invalid escape at byte {offset}: {reason}")]
    InvalidEscape { offset: usize, reason: &'static str },

    /// The interpreter process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command sink was closed by the other side.
    #[error("command sink closed")]
    Closed,

    /// An I/O error occurred on the command sink or output stream.
    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
