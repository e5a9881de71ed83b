use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::array::NdArray;
use crate::dtype::descriptor_for;
use crate::error::{FormatError, Result};
use crate::header::{read_header, write_header, Header};

/// Upper bound on the payload buffer reserved before any payload byte arrives.
const PAYLOAD_PREALLOC: usize = 1 << 20;

/// Encode an array into a complete frame (header followed by payload).
pub fn encode(array: &NdArray) -> Result<Bytes> {
    let mut dst = BytesMut::new();
    encode_into(array, &mut dst)?;
    Ok(dst.freeze())
}

/// Append the frame for `array` to `dst`, returning the number of bytes written.
///
/// The payload is copied verbatim; only little-endian data is ever emitted so
/// no byte swapping takes place.
pub fn encode_into(array: &NdArray, dst: &mut BytesMut) -> Result<usize> {
    let descr = descriptor_for(array.element_type());
    let header_len = write_header(&descr, array.shape(), dst)?;

    dst.reserve(array.as_bytes().len());
    dst.put_slice(array.as_bytes());

    debug!(
        descr = %descr,
        shape = ?array.shape(),
        header_len,
        payload_len = array.as_bytes().len(),
        "encoded npy frame"
    );
    Ok(header_len + array.as_bytes().len())
}

/// Write the frame for `array` to a stream.
pub fn write_to<W: Write>(array: &NdArray, writer: &mut W) -> Result<usize> {
    let frame = encode(array)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(frame.len())
}

/// Decode a frame held entirely in memory.
pub fn decode(frame: &[u8]) -> Result<NdArray> {
    let mut reader = frame;
    decode_from(&mut reader)
}

/// Read one frame from a stream.
///
/// Byte-string frames are rejected with
/// [`FormatError::UnsupportedElementType`] before any payload is read.
pub fn decode_from<R: Read>(reader: &mut R) -> Result<NdArray> {
    let header = read_header(reader)?;
    if header.element.is_byte_string() {
        return Err(FormatError::UnsupportedElementType(format!(
            "{} cannot be decoded",
            header.descr
        )));
    }
    read_payload(&header, reader)
}

/// Read the payload that follows an already-parsed header.
pub fn read_payload<R: Read>(header: &Header, reader: &mut R) -> Result<NdArray> {
    if header.element.is_byte_string() {
        return Err(FormatError::StringPayloadUnsupported);
    }

    let expected = header.payload_len()?;
    // The header's shape is untrusted: grow with the data actually read.
    let mut payload = Vec::with_capacity(expected.min(PAYLOAD_PREALLOC));
    let limit = u64::try_from(expected).unwrap_or(u64::MAX);
    reader.by_ref().take(limit).read_to_end(&mut payload)?;
    let actual = payload.len();
    if actual < expected {
        return Err(FormatError::TruncatedPayload { expected, actual });
    }

    debug!(
        descr = %header.descr,
        shape = ?header.shape,
        payload_len = expected,
        "decoded npy frame"
    );
    NdArray::from_raw(header.element, header.shape.clone(), payload)
}

/// Save an array as a `.npy` file.
pub fn write_npy(path: impl AsRef<Path>, array: &NdArray) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_to(array, &mut writer)
}

/// Load an array from a `.npy` file.
pub fn read_npy(path: impl AsRef<Path>) -> Result<NdArray> {
    let mut reader = BufReader::new(File::open(path)?);
    decode_from(&mut reader)
}
