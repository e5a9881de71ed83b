use bytes::{BufMut, Bytes, BytesMut};

use crate::dtype::ElementType;
use crate::error::{FormatError, Result};
use crate::header::payload_len;

/// Scalar types that can be stored in an [`NdArray`].
///
/// Implemented for `bool`, the signed and unsigned integers up to 64 bits,
/// `f32` and `f64`. Values are laid out little-endian.
pub trait Element: Copy + sealed::Sealed {
    /// Element type tag for this scalar.
    const TYPE: ElementType;

    /// Append the little-endian bytes of `self`.
    fn put_le(self, dst: &mut BytesMut);

    /// Read one value from exactly `Self::TYPE.width()` bytes.
    fn from_le_slice(src: &[u8]) -> Self;
}

mod sealed {
    pub trait Sealed {}
}

impl sealed::Sealed for bool {}

impl Element for bool {
    const TYPE: ElementType = ElementType::Bool;

    fn put_le(self, dst: &mut BytesMut) {
        dst.put_u8(u8::from(self));
    }

    fn from_le_slice(src: &[u8]) -> Self {
        src[0] != 0
    }
}

macro_rules! numeric_element {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const TYPE: ElementType = ElementType::$tag;

                fn put_le(self, dst: &mut BytesMut) {
                    dst.put_slice(&self.to_le_bytes());
                }

                fn from_le_slice(src: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(src);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

numeric_element! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}

/// An n-dimensional, row-major block of fixed-width elements.
///
/// The byte buffer always holds exactly `width × product(shape)` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    element: ElementType,
    shape: Vec<usize>,
    data: Bytes,
}

impl NdArray {
    /// Wrap an existing row-major little-endian buffer.
    pub fn from_raw(element: ElementType, shape: Vec<usize>, data: impl Into<Bytes>) -> Result<Self> {
        if element == ElementType::ByteString(0) {
            return Err(FormatError::UnsupportedElementType(
                "zero-width byte string".to_string(),
            ));
        }
        let data = data.into();
        let expected = payload_len(&shape, element.width())?;
        if data.len() != expected {
            return Err(FormatError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            element,
            shape,
            data,
        })
    }

    /// Build an array from row-major values.
    pub fn from_vec<T: Element>(shape: Vec<usize>, values: Vec<T>) -> Result<Self> {
        let width = T::TYPE.width();
        let mut data = BytesMut::with_capacity(values.len() * width);
        for value in values {
            value.put_le(&mut data);
        }
        Self::from_raw(T::TYPE, shape, data.freeze())
    }

    /// A rank-0 array holding one value.
    pub fn scalar<T: Element>(value: T) -> Self {
        let mut data = BytesMut::with_capacity(T::TYPE.width());
        value.put_le(&mut data);
        Self {
            element: T::TYPE,
            shape: Vec::new(),
            data: data.freeze(),
        }
    }

    /// Build a fixed-width byte-string array.
    ///
    /// The width is the longest value (at least 1); shorter values are
    /// NUL-padded.
    pub fn from_strings<S: AsRef<[u8]>>(shape: Vec<usize>, values: &[S]) -> Result<Self> {
        let width = values
            .iter()
            .map(|value| value.as_ref().len())
            .max()
            .unwrap_or(0)
            .max(1);
        let mut data = BytesMut::with_capacity(values.len() * width);
        for value in values {
            let value = value.as_ref();
            data.put_slice(value);
            data.put_bytes(0, width - value.len());
        }
        Self::from_raw(ElementType::ByteString(width), shape, data.freeze())
    }

    pub fn element_type(&self) -> ElementType {
        self.element
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw row-major payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Copy the elements out as `T`, in row-major order.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if self.element != T::TYPE {
            return Err(FormatError::TypeMismatch {
                expected: type_name(T::TYPE),
                actual: self.element.to_string(),
            });
        }
        Ok(self
            .data
            .chunks_exact(T::TYPE.width())
            .map(T::from_le_slice)
            .collect())
    }

    /// Byte-string elements with trailing NUL padding removed.
    pub fn byte_strings(&self) -> Result<Vec<&[u8]>> {
        let ElementType::ByteString(width) = self.element else {
            return Err(FormatError::TypeMismatch {
                expected: "byte string",
                actual: self.element.to_string(),
            });
        };
        Ok(self
            .data
            .chunks_exact(width)
            .map(|chunk| {
                let end = chunk.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
                &chunk[..end]
            })
            .collect())
    }
}

fn type_name(element: ElementType) -> &'static str {
    match element {
        ElementType::Bool => "bool",
        ElementType::Int8 => "int8",
        ElementType::Int16 => "int16",
        ElementType::Int32 => "int32",
        ElementType::Int64 => "int64",
        ElementType::UInt8 => "uint8",
        ElementType::UInt16 => "uint16",
        ElementType::UInt32 => "uint32",
        ElementType::UInt64 => "uint64",
        ElementType::Float32 => "float32",
        ElementType::Float64 => "float64",
        ElementType::ByteString(_) => "byte string",
    }
}
