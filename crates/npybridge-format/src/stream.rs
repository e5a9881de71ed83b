//! Streaming codec for back-to-back frames on an async byte stream.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::array::NdArray;
use crate::codec::encode_into;
use crate::error::{FormatError, Result};
use crate::header::{parse_dict, parse_preamble, PREAMBLE_SIZE};

/// Default maximum frame size (header and payload): 256 MiB.
pub const DEFAULT_MAX_FRAME: usize = 256 * 1024 * 1024;

/// `tokio_util` codec yielding one [`NdArray`] per frame.
#[derive(Debug, Clone)]
pub struct NpyCodec {
    max_frame_size: usize,
}

impl NpyCodec {
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for NpyCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for NpyCodec {
    type Item = NdArray;
    type Error = FormatError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<NdArray>> {
        if src.len() < PREAMBLE_SIZE {
            return Ok(None);
        }

        let mut preamble = [0u8; PREAMBLE_SIZE];
        preamble.copy_from_slice(&src[..PREAMBLE_SIZE]);
        let header_len = PREAMBLE_SIZE + parse_preamble(&preamble)?;
        if src.len() < header_len {
            return Ok(None);
        }

        let header = parse_dict(&src[PREAMBLE_SIZE..header_len], header_len)?;
        if header.element.is_byte_string() {
            return Err(FormatError::UnsupportedElementType(format!(
                "{} cannot be decoded",
                header.descr
            )));
        }

        let payload_len = header.payload_len()?;
        let total = header_len.saturating_add(payload_len);
        if total > self.max_frame_size {
            return Err(FormatError::FrameTooLarge {
                size: total,
                max: self.max_frame_size,
            });
        }
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(header_len);
        let payload = src.split_to(payload_len).freeze();
        trace!(descr = %header.descr, shape = ?header.shape, "streamed npy frame");
        NdArray::from_raw(header.element, header.shape, payload).map(Some)
    }
}

impl Encoder<&NdArray> for NpyCodec {
    type Error = FormatError;

    fn encode(&mut self, item: &NdArray, dst: &mut BytesMut) -> Result<()> {
        encode_into(item, dst).map(|_| ())
    }
}

impl Encoder<NdArray> for NpyCodec {
    type Error = FormatError;

    fn encode(&mut self, item: NdArray, dst: &mut BytesMut) -> Result<()> {
        encode_into(&item, dst).map(|_| ())
    }
}
