//! Reader and writer for the `.npy` array interchange format.
//!
//! Every frame carries:
//! - The 6-byte magic `\x93NUMPY` and version 1.0
//! - A 2-byte little-endian dictionary length
//! - A space-padded `{'descr': .., 'fortran_order': False, 'shape': (..), }` dictionary
//! - The raw row-major payload, little-endian only
//!
//! Only C-ordered, little-endian, fixed-width scalar frames are decoded.
//! Byte-string arrays can be encoded but are rejected on decode.

pub mod array;
pub mod codec;
pub mod dtype;
pub mod error;
pub mod header;
#[cfg(feature = "async")]
pub mod stream;

pub use array::{Element, NdArray};
pub use codec::{decode, decode_from, encode, encode_into, read_npy, read_payload, write_npy, write_to};
pub use dtype::{descriptor_for, type_for, DtypeDescriptor, ElementType, Endianness};
pub use error::{FormatError, Result};
pub use header::{format_shape, read_header, write_header, Header, HEADER_ALIGN, MAGIC, PREAMBLE_SIZE};
#[cfg(feature = "async")]
pub use stream::{NpyCodec, DEFAULT_MAX_FRAME};
