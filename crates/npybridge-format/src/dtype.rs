//! Mapping between dtype descriptor strings and element types.
//!
//! A descriptor is three or more characters: an endianness flag (`<`, `>` or
//! `|`), a type-class letter and the decimal byte width, e.g. `<f8` or `|S12`.

use std::fmt;
use std::str::FromStr;

use crate::error::{FormatError, Result};

/// Fixed-width scalar element types that can appear in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// Fixed-width byte string; the value is the per-element width.
    ByteString(usize),
}

impl ElementType {
    /// Size of one element in bytes.
    pub const fn width(self) -> usize {
        match self {
            ElementType::Bool | ElementType::Int8 | ElementType::UInt8 => 1,
            ElementType::Int16 | ElementType::UInt16 => 2,
            ElementType::Int32 | ElementType::UInt32 | ElementType::Float32 => 4,
            ElementType::Int64 | ElementType::UInt64 | ElementType::Float64 => 8,
            ElementType::ByteString(width) => width,
        }
    }

    pub const fn is_byte_string(self) -> bool {
        matches!(self, ElementType::ByteString(_))
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Bool => f.write_str("bool"),
            ElementType::Int8 => f.write_str("int8"),
            ElementType::Int16 => f.write_str("int16"),
            ElementType::Int32 => f.write_str("int32"),
            ElementType::Int64 => f.write_str("int64"),
            ElementType::UInt8 => f.write_str("uint8"),
            ElementType::UInt16 => f.write_str("uint16"),
            ElementType::UInt32 => f.write_str("uint32"),
            ElementType::UInt64 => f.write_str("uint64"),
            ElementType::Float32 => f.write_str("float32"),
            ElementType::Float64 => f.write_str("float64"),
            ElementType::ByteString(width) => write!(f, "bytes{width}"),
        }
    }
}

/// Byte order flag of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
    /// Single-byte types, where byte order is irrelevant.
    NotApplicable,
}

impl Endianness {
    pub const fn as_char(self) -> char {
        match self {
            Endianness::Little => '<',
            Endianness::Big => '>',
            Endianness::NotApplicable => '|',
        }
    }

    pub const fn from_char(flag: char) -> Option<Self> {
        match flag {
            '<' => Some(Endianness::Little),
            '>' => Some(Endianness::Big),
            '|' => Some(Endianness::NotApplicable),
            _ => None,
        }
    }
}

/// A parsed dtype descriptor such as `<i4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtypeDescriptor {
    pub endianness: Endianness,
    /// Type-class letter: `b`, `i`, `u`, `f` or `S`.
    pub letter: char,
    pub width: usize,
}

impl DtypeDescriptor {
    pub const fn new(endianness: Endianness, letter: char, width: usize) -> Self {
        Self {
            endianness,
            letter,
            width,
        }
    }

    pub fn is_big_endian(&self) -> bool {
        self.endianness == Endianness::Big
    }
}

impl fmt::Display for DtypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.endianness.as_char(),
            self.letter,
            self.width
        )
    }
}

impl FromStr for DtypeDescriptor {
    type Err = FormatError;

    fn from_str(descr: &str) -> Result<Self> {
        let unsupported = || FormatError::UnsupportedDtype(descr.to_string());

        let mut chars = descr.chars();
        let endianness = chars
            .next()
            .and_then(Endianness::from_char)
            .ok_or_else(unsupported)?;
        let letter = chars.next().ok_or_else(unsupported)?;
        if !matches!(letter, 'b' | 'i' | 'u' | 'f' | 'S') {
            return Err(unsupported());
        }
        let width = chars
            .as_str()
            .parse::<usize>()
            .map_err(|_| unsupported())?;

        Ok(Self::new(endianness, letter, width))
    }
}

/// The descriptor written for an element type.
///
/// Multi-byte numeric types are always emitted little-endian.
pub fn descriptor_for(element: ElementType) -> DtypeDescriptor {
    use Endianness::{Little, NotApplicable};

    match element {
        ElementType::Bool => DtypeDescriptor::new(NotApplicable, 'b', 1),
        ElementType::Int8 => DtypeDescriptor::new(NotApplicable, 'i', 1),
        ElementType::Int16 => DtypeDescriptor::new(Little, 'i', 2),
        ElementType::Int32 => DtypeDescriptor::new(Little, 'i', 4),
        ElementType::Int64 => DtypeDescriptor::new(Little, 'i', 8),
        ElementType::UInt8 => DtypeDescriptor::new(NotApplicable, 'u', 1),
        ElementType::UInt16 => DtypeDescriptor::new(Little, 'u', 2),
        ElementType::UInt32 => DtypeDescriptor::new(Little, 'u', 4),
        ElementType::UInt64 => DtypeDescriptor::new(Little, 'u', 8),
        ElementType::Float32 => DtypeDescriptor::new(Little, 'f', 4),
        ElementType::Float64 => DtypeDescriptor::new(Little, 'f', 8),
        ElementType::ByteString(width) => DtypeDescriptor::new(NotApplicable, 'S', width),
    }
}

/// The element type named by a descriptor, ignoring its byte order flag.
pub fn type_for(descr: &DtypeDescriptor) -> Result<ElementType> {
    let element = match (descr.letter, descr.width) {
        ('b', 1) => ElementType::Bool,
        ('i', 1) => ElementType::Int8,
        ('i', 2) => ElementType::Int16,
        ('i', 4) => ElementType::Int32,
        ('i', 8) => ElementType::Int64,
        ('u', 1) => ElementType::UInt8,
        ('u', 2) => ElementType::UInt16,
        ('u', 4) => ElementType::UInt32,
        ('u', 8) => ElementType::UInt64,
        ('f', 4) => ElementType::Float32,
        ('f', 8) => ElementType::Float64,
        ('S', width) if width > 0 => ElementType::ByteString(width),
        _ => return Err(FormatError::UnsupportedDtype(descr.to_string())),
    };
    Ok(element)
}
