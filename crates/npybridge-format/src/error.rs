/// Errors that can occur while encoding or decoding `.npy` frames.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The stream does not start with `\x93NUMPY`.
    #[error("invalid npy magic (expected \\x93NUMPY)")]
    BadMagic,

    /// Only format version 1.0 is understood.
    #[error("unsupported npy version {major}.{minor} (expected 1.0)")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// The header dictionary is missing a key or carries an unparsable value.
    #[error("malformed npy header: {0}")]
    MalformedHeader(String),

    /// Column-major payloads are not reinterpreted.
    #[error("fortran-ordered arrays are not supported")]
    FortranOrderUnsupported,

    /// Big-endian payloads are not byte-swapped.
    #[error("big-endian dtype {0:?} is not supported")]
    BigEndianUnsupported(String),

    /// The dtype descriptor names a type letter or width outside the supported set.
    #[error("unsupported dtype descriptor {0:?}")]
    UnsupportedDtype(String),

    /// The element type cannot be carried in this direction.
    #[error("unsupported element type: {0}")]
    UnsupportedElementType(String),

    /// The stream ended before the payload was complete.
    #[error("truncated payload ({actual} of {expected} bytes)")]
    TruncatedPayload { expected: usize, actual: usize },

    /// The padded header dictionary does not fit the 16-bit length field.
    #[error("header too large ({0} bytes, max 65535)")]
    HeaderTooLarge(usize),

    /// A streamed frame exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// Byte-string payloads are write-only.
    #[error("byte-string payloads cannot be decoded")]
    StringPayloadUnsupported,

    /// A raw buffer does not match the size implied by its shape and element width.
    #[error("buffer holds {actual} bytes but shape requires {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A typed accessor was used on an array of a different element type.
    #[error("array holds {actual} elements, not {expected}")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
    },

    /// An I/O error occurred while reading or writing a frame.
    #[error("npy I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FormatError>;
