use std::io::{ErrorKind, Read};

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::dtype::{type_for, DtypeDescriptor, ElementType};
use crate::error::{FormatError, Result};

/// Magic bytes: 0x93 followed by "NUMPY".
pub const MAGIC: [u8; 6] = *b"\x93NUMPY";

/// The only format version written and accepted.
pub const VERSION: (u8, u8) = (1, 0);

/// Magic (6) + version (2) + dictionary length (2) = 10 bytes.
pub const PREAMBLE_SIZE: usize = 10;

/// The full header region is padded to a multiple of this many bytes.
pub const HEADER_ALIGN: usize = 16;

const DESCR_MARKER: &str = "'descr': '";
const FORTRAN_MARKER: &str = "'fortran_order': ";
const SHAPE_MARKER: &str = "'shape': (";

/// A parsed frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Descriptor exactly as found in the dictionary.
    pub descr: DtypeDescriptor,
    /// Element type named by `descr`.
    pub element: ElementType,
    /// Extent per dimension, row-major.
    pub shape: Vec<usize>,
    /// Total header bytes: preamble plus the padded dictionary.
    pub header_len: usize,
}

impl Header {
    /// Number of elements implied by the shape (1 for rank 0).
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Payload size in bytes implied by the shape and element width.
    pub fn payload_len(&self) -> Result<usize> {
        payload_len(&self.shape, self.element.width())
    }
}

pub(crate) fn payload_len(shape: &[usize], width: usize) -> Result<usize> {
    shape
        .iter()
        .try_fold(width, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| FormatError::MalformedHeader(format!("shape {shape:?} overflows usize")))
}

/// Render the header dictionary for a descriptor and shape, without padding.
///
/// ```text
/// {'descr': '<f8', 'fortran_order': False, 'shape': (2, 2), }
/// ```
pub fn format_dict(descr: &DtypeDescriptor, shape: &[usize]) -> String {
    format!(
        "{{'descr': '{descr}', 'fortran_order': False, 'shape': {}, }}",
        format_shape(shape)
    )
}

/// Render a shape the way numpy writes it: `()`, `(n,)` or `(a, b)`.
pub fn format_shape(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_string(),
        [only] => format!("({only},)"),
        dims => {
            let joined = dims
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("({joined})")
        }
    }
}

/// Write the header for `descr` and `shape` into `dst`.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────┬──────────┬──────────────────────────────────┐
/// │ Magic (6B) │ Version  │ Length   │ Dictionary, space padded, '\n'   │
/// │ \x93NUMPY  │ 1, 0     │ (2B LE)  │ (Length bytes)                   │
/// └────────────┴──────────┴──────────┴──────────────────────────────────┘
/// ```
///
/// Returns the number of header bytes written, always a multiple of
/// [`HEADER_ALIGN`].
pub fn write_header(descr: &DtypeDescriptor, shape: &[usize], dst: &mut BytesMut) -> Result<usize> {
    let dict = format_dict(descr, shape);

    let unpadded = PREAMBLE_SIZE + dict.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    let dict_len = dict.len() + padding + 1;
    let encoded_len = u16::try_from(dict_len).map_err(|_| FormatError::HeaderTooLarge(dict_len))?;

    dst.reserve(PREAMBLE_SIZE + dict_len);
    dst.put_slice(&MAGIC);
    dst.put_u8(VERSION.0);
    dst.put_u8(VERSION.1);
    dst.put_u16_le(encoded_len);
    dst.put_slice(dict.as_bytes());
    dst.put_bytes(b' ', padding);
    dst.put_u8(b'\n');

    trace!(descr = %descr, ?shape, header_len = PREAMBLE_SIZE + dict_len, "wrote npy header");
    Ok(PREAMBLE_SIZE + dict_len)
}

/// Read and validate a header, leaving `reader` positioned at the payload.
pub fn read_header<R: Read>(reader: &mut R) -> Result<Header> {
    let mut preamble = [0u8; PREAMBLE_SIZE];
    let filled = read_full(reader, &mut preamble)?;
    if filled < MAGIC.len() {
        return Err(FormatError::BadMagic);
    }
    if filled < PREAMBLE_SIZE {
        check_magic(&preamble)?;
        return Err(FormatError::MalformedHeader(format!(
            "preamble ends after {filled} bytes"
        )));
    }
    let dict_len = parse_preamble(&preamble)?;

    let mut dict = vec![0u8; dict_len];
    let filled = read_full(reader, &mut dict)?;
    if filled < dict_len {
        return Err(FormatError::MalformedHeader(format!(
            "dictionary ends after {filled} of {dict_len} bytes"
        )));
    }

    parse_dict(&dict, PREAMBLE_SIZE + dict_len)
}

fn check_magic(preamble: &[u8]) -> Result<()> {
    if preamble[..MAGIC.len()] != MAGIC {
        return Err(FormatError::BadMagic);
    }
    Ok(())
}

/// Validate magic and version, returning the dictionary length.
pub(crate) fn parse_preamble(preamble: &[u8; PREAMBLE_SIZE]) -> Result<usize> {
    check_magic(preamble)?;

    let (major, minor) = (preamble[6], preamble[7]);
    if (major, minor) != VERSION {
        return Err(FormatError::UnsupportedVersion { major, minor });
    }

    Ok(u16::from_le_bytes([preamble[8], preamble[9]]) as usize)
}

/// Extract `descr`, `fortran_order` and `shape` from the raw dictionary bytes.
pub(crate) fn parse_dict(dict: &[u8], header_len: usize) -> Result<Header> {
    // Single-byte decoding; the dictionary is ASCII in practice.
    let dict: String = dict.iter().map(|&b| char::from(b)).collect();

    let descr_text = field(&dict, DESCR_MARKER, &['\''])?;
    let descr: DtypeDescriptor = descr_text.parse()?;
    let element = type_for(&descr)?;
    if descr.is_big_endian() {
        return Err(FormatError::BigEndianUnsupported(descr_text.to_string()));
    }

    match field(&dict, FORTRAN_MARKER, &[',', '}'])?.trim() {
        "False" => {}
        "True" => return Err(FormatError::FortranOrderUnsupported),
        other => {
            return Err(FormatError::MalformedHeader(format!(
                "fortran_order is {other:?}, expected True or False"
            )))
        }
    }

    let shape = field(&dict, SHAPE_MARKER, &[')'])?
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.parse::<usize>()
                .map_err(|_| FormatError::MalformedHeader(format!("invalid dimension {dim:?}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Header {
        descr,
        element,
        shape,
        header_len,
    })
}

fn field<'a>(dict: &'a str, marker: &str, terminators: &[char]) -> Result<&'a str> {
    let start = dict
        .find(marker)
        .ok_or_else(|| FormatError::MalformedHeader(format!("missing {marker:?}")))?
        + marker.len();
    let rest = &dict[start..];
    let end = rest
        .find(terminators)
        .ok_or_else(|| FormatError::MalformedHeader(format!("unterminated {marker:?}")))?;
    Ok(&rest[..end])
}

/// Fill `buf` as far as the reader allows, returning the number of bytes read.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FormatError::Io(err)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::dtype::{descriptor_for, Endianness};

    fn raw_header(version: (u8, u8), dict: &str) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        out.extend_from_slice(&[version.0, version.1]);
        out.extend_from_slice(&(dict.len() as u16).to_le_bytes());
        out.extend_from_slice(dict.as_bytes());
        out
    }

    #[test]
    fn writes_float64_matrix_header() {
        let mut buf = BytesMut::new();
        let descr = descriptor_for(ElementType::Float64);
        let len = write_header(&descr, &[2, 2], &mut buf).unwrap();

        assert_eq!(len, 80);
        assert_eq!(buf.len(), 80);
        assert_eq!(&buf[..6], &MAGIC);
        assert_eq!(&buf[6..8], &[1, 0]);
        assert_eq!(u16::from_le_bytes([buf[8], buf[9]]), 70);

        let dict = std::str::from_utf8(&buf[10..]).unwrap();
        let expected = "{'descr': '<f8', 'fortran_order': False, 'shape': (2, 2), }";
        assert!(dict.starts_with(expected));
        assert!(dict[expected.len()..dict.len() - 1].bytes().all(|b| b == b' '));
        assert!(dict.ends_with('\n'));
    }

    #[test]
    fn header_length_is_always_aligned() {
        let shapes: [&[usize]; 7] = [
            &[],
            &[0],
            &[7],
            &[100, 3],
            &[1, 2, 3, 4],
            &[12345, 67, 8, 9],
            &[1; 40],
        ];
        for element in [ElementType::Bool, ElementType::Int64, ElementType::ByteString(33)] {
            for shape in shapes {
                let mut buf = BytesMut::new();
                let len = write_header(&descriptor_for(element), shape, &mut buf).unwrap();
                assert_eq!(len % HEADER_ALIGN, 0, "{element} {shape:?}");
                assert_eq!(buf.len(), len);
            }
        }
    }

    #[test]
    fn shape_formatting_matches_python_tuples() {
        let descr = descriptor_for(ElementType::Int32);
        assert!(format_dict(&descr, &[]).contains("'shape': (), "));
        assert!(format_dict(&descr, &[5]).contains("'shape': (5,), "));
        assert!(format_dict(&descr, &[3, 4]).contains("'shape': (3, 4), "));
    }

    #[test]
    fn written_header_reads_back() {
        let mut buf = BytesMut::new();
        let descr = descriptor_for(ElementType::UInt16);
        write_header(&descr, &[4, 0, 2], &mut buf).unwrap();

        let header = read_header(&mut Cursor::new(buf.to_vec())).unwrap();
        assert_eq!(header.descr, descr);
        assert_eq!(header.element, ElementType::UInt16);
        assert_eq!(header.shape, vec![4, 0, 2]);
        assert_eq!(header.header_len, buf.len());
        assert_eq!(header.element_count(), 0);
        assert_eq!(header.payload_len().unwrap(), 0);
    }

    #[test]
    fn reads_rank_one_and_scalar_shapes() {
        let dict = "{'descr': '<i8', 'fortran_order': False, 'shape': (6,), }\n";
        let header = read_header(&mut Cursor::new(raw_header((1, 0), dict))).unwrap();
        assert_eq!(header.shape, vec![6]);

        let dict = "{'descr': '|b1', 'fortran_order': False, 'shape': (), }\n";
        let header = read_header(&mut Cursor::new(raw_header((1, 0), dict))).unwrap();
        assert!(header.shape.is_empty());
        assert_eq!(header.element_count(), 1);
        assert_eq!(header.descr.endianness, Endianness::NotApplicable);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = raw_header((1, 0), "{}");
        bytes[0] = 0x94;
        let err = read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, FormatError::BadMagic));

        let err = read_header(&mut Cursor::new(b"\x93NU".to_vec())).unwrap_err();
        assert!(matches!(err, FormatError::BadMagic));
    }

    #[test]
    fn rejects_other_versions() {
        let dict = "{'descr': '<f8', 'fortran_order': False, 'shape': (1,), }\n";
        for version in [(2, 0), (1, 1), (3, 0)] {
            let err = read_header(&mut Cursor::new(raw_header(version, dict))).unwrap_err();
            assert!(
                matches!(err, FormatError::UnsupportedVersion { major, minor } if (major, minor) == version)
            );
        }
    }

    #[test]
    fn rejects_fortran_order() {
        let dict = "{'descr': '<f8', 'fortran_order': True, 'shape': (2, 3), }\n";
        let err = read_header(&mut Cursor::new(raw_header((1, 0), dict))).unwrap_err();
        assert!(matches!(err, FormatError::FortranOrderUnsupported));
    }

    #[test]
    fn rejects_big_endian() {
        let dict = "{'descr': '>i4', 'fortran_order': False, 'shape': (2,), }\n";
        let err = read_header(&mut Cursor::new(raw_header((1, 0), dict))).unwrap_err();
        assert!(matches!(err, FormatError::BigEndianUnsupported(ref d) if d == ">i4"));
    }

    #[test]
    fn rejects_missing_markers() {
        for dict in [
            "{'fortran_order': False, 'shape': (2,), }\n",
            "{'descr': '<f4', 'shape': (2,), }\n",
            "{'descr': '<f4', 'fortran_order': False, }\n",
            "{'descr': '<f4', 'fortran_order': maybe, 'shape': (2,), }\n",
            "{'descr': '<f4', 'fortran_order': False, 'shape': (2, x), }\n",
        ] {
            let err = read_header(&mut Cursor::new(raw_header((1, 0), dict))).unwrap_err();
            assert!(matches!(err, FormatError::MalformedHeader(_)), "{dict}");
        }
    }

    #[test]
    fn rejects_truncated_dictionary() {
        let mut bytes = raw_header((1, 0), "{'descr': '<f4', 'fortran_order': False, 'shape': (2,), }\n");
        bytes.truncate(30);
        let err = read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, FormatError::MalformedHeader(_)));
    }

    #[test]
    fn oversized_header_is_refused() {
        let shape = vec![1usize; 30_000];
        let mut buf = BytesMut::new();
        let err = write_header(&descriptor_for(ElementType::Int8), &shape, &mut buf).unwrap_err();
        assert!(matches!(err, FormatError::HeaderTooLarge(len) if len > u16::MAX as usize));
        assert!(buf.is_empty());
    }
}
