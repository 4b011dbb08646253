//! Parsed values: byte ranges, strings and generic arrays.
//!
//! Values are small `Copy` ids; their payloads live in the session's arenas.

use std::mem::size_of;

use crate::{
    arena::{HandleId, Slot, StreamId},
    errors::{Error, Result},
    handle::HasHandle,
    types::TypeTag,
};

/// Where a [Bytes] value's content lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// `len` bytes at `pos` of `stream`, re-read on every access.
    Lazy { stream: StreamId, pos: u64, len: u64 },
    /// A buffer owned by the session.
    Owned(Slot<Vec<u8>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bytes {
    pub(crate) handle: HandleId,
    pub(crate) payload: Payload,
}

impl Bytes {
    pub fn payload(&self) -> Payload {
        self.payload
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.payload, Payload::Lazy { .. })
    }
}

/// A decoded, always-owned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KsString {
    pub(crate) handle: HandleId,
    pub(crate) slot: Slot<String>,
}

/// An array whose element kind is recorded in [ArrayData].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Array {
    pub(crate) handle: HandleId,
    pub(crate) slot: Slot<ArrayData>,
}

impl HasHandle for Bytes {
    fn handle(&self) -> HandleId {
        self.handle
    }
}

impl HasHandle for KsString {
    fn handle(&self) -> HandleId {
        self.handle
    }
}

impl HasHandle for Array {
    fn handle(&self) -> HandleId {
        self.handle
    }
}

/// Array storage, one variant per element kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Str(Vec<KsString>),
    Bytes(Vec<Bytes>),
}

/// One array element, widened to its kind's largest representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element {
    UInt(u64),
    Int(i64),
    Float(f64),
    Str(KsString),
    Bytes(Bytes),
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::U8(v) => v.len(),
            ArrayData::U16(v) => v.len(),
            ArrayData::U32(v) => v.len(),
            ArrayData::U64(v) => v.len(),
            ArrayData::I8(v) => v.len(),
            ArrayData::I16(v) => v.len(),
            ArrayData::I32(v) => v.len(),
            ArrayData::I64(v) => v.len(),
            ArrayData::F32(v) => v.len(),
            ArrayData::F64(v) => v.len(),
            ArrayData::Str(v) => v.len(),
            ArrayData::Bytes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            ArrayData::U8(_) | ArrayData::U16(_) | ArrayData::U32(_) | ArrayData::U64(_) => {
                TypeTag::ArrayUInt
            }
            ArrayData::I8(_) | ArrayData::I16(_) | ArrayData::I32(_) | ArrayData::I64(_) => {
                TypeTag::ArrayInt
            }
            ArrayData::F32(_) | ArrayData::F64(_) => TypeTag::ArrayFloat,
            ArrayData::Str(_) => TypeTag::ArrayString,
            ArrayData::Bytes(_) => TypeTag::ArrayBytes,
        }
    }

    pub fn element_size(&self) -> usize {
        match self {
            ArrayData::U8(_) => size_of::<u8>(),
            ArrayData::U16(_) => size_of::<u16>(),
            ArrayData::U32(_) => size_of::<u32>(),
            ArrayData::U64(_) => size_of::<u64>(),
            ArrayData::I8(_) => size_of::<i8>(),
            ArrayData::I16(_) => size_of::<i16>(),
            ArrayData::I32(_) => size_of::<i32>(),
            ArrayData::I64(_) => size_of::<i64>(),
            ArrayData::F32(_) => size_of::<f32>(),
            ArrayData::F64(_) => size_of::<f64>(),
            ArrayData::Str(_) => size_of::<KsString>(),
            ArrayData::Bytes(_) => size_of::<Bytes>(),
        }
    }

    pub fn get(&self, i: usize) -> Option<Element> {
        Some(match self {
            ArrayData::U8(v) => Element::UInt(*v.get(i)? as u64),
            ArrayData::U16(v) => Element::UInt(*v.get(i)? as u64),
            ArrayData::U32(v) => Element::UInt(*v.get(i)? as u64),
            ArrayData::U64(v) => Element::UInt(*v.get(i)?),
            ArrayData::I8(v) => Element::Int(*v.get(i)? as i64),
            ArrayData::I16(v) => Element::Int(*v.get(i)? as i64),
            ArrayData::I32(v) => Element::Int(*v.get(i)? as i64),
            ArrayData::I64(v) => Element::Int(*v.get(i)?),
            ArrayData::F32(v) => Element::Float(*v.get(i)? as f64),
            ArrayData::F64(v) => Element::Float(*v.get(i)?),
            ArrayData::Str(v) => Element::Str(*v.get(i)?),
            ArrayData::Bytes(v) => Element::Bytes(*v.get(i)?),
        })
    }

    /// Appends `element`, narrowing it to this array's element width.
    ///
    /// Values that do not fit fail with [Error::ValidationFailed]. For `F32`
    /// that means a finite value overflowing to infinity; NaN and infinities
    /// are stored as-is.
    pub fn push(&mut self, element: Element) -> Result<()> {
        let tag = self.type_tag();
        let out_of_range = |v: &dyn std::fmt::Display| {
            Error::ValidationFailed(format!("{v} does not fit a {tag:?} element"))
        };

        match (self, element) {
            (ArrayData::U8(v), Element::UInt(x)) => {
                v.push(u8::try_from(x).map_err(|_| out_of_range(&x))?)
            }
            (ArrayData::U16(v), Element::UInt(x)) => {
                v.push(u16::try_from(x).map_err(|_| out_of_range(&x))?)
            }
            (ArrayData::U32(v), Element::UInt(x)) => {
                v.push(u32::try_from(x).map_err(|_| out_of_range(&x))?)
            }
            (ArrayData::U64(v), Element::UInt(x)) => v.push(x),
            (ArrayData::I8(v), Element::Int(x)) => {
                v.push(i8::try_from(x).map_err(|_| out_of_range(&x))?)
            }
            (ArrayData::I16(v), Element::Int(x)) => {
                v.push(i16::try_from(x).map_err(|_| out_of_range(&x))?)
            }
            (ArrayData::I32(v), Element::Int(x)) => {
                v.push(i32::try_from(x).map_err(|_| out_of_range(&x))?)
            }
            (ArrayData::I64(v), Element::Int(x)) => v.push(x),
            (ArrayData::F32(v), Element::Float(x)) => {
                let narrowed = x as f32;
                if x.is_finite() && !narrowed.is_finite() {
                    return Err(out_of_range(&x));
                }
                v.push(narrowed)
            }
            (ArrayData::F64(v), Element::Float(x)) => v.push(x),
            (ArrayData::Str(v), Element::Str(x)) => v.push(x),
            (ArrayData::Bytes(v), Element::Bytes(x)) => v.push(x),
            (_, element) => {
                return Err(Error::TypeMismatch {
                    expected: tag,
                    found: element.type_tag(),
                });
            }
        }

        Ok(())
    }
}

impl Element {
    /// Tag of the array kind this element belongs in.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Element::UInt(_) => TypeTag::ArrayUInt,
            Element::Int(_) => TypeTag::ArrayInt,
            Element::Float(_) => TypeTag::ArrayFloat,
            Element::Str(_) => TypeTag::ArrayString,
            Element::Bytes(_) => TypeTag::ArrayBytes,
        }
    }
}

impl From<Vec<u8>> for ArrayData {
    fn from(value: Vec<u8>) -> Self {
        ArrayData::U8(value)
    }
}

impl From<Vec<u16>> for ArrayData {
    fn from(value: Vec<u16>) -> Self {
        ArrayData::U16(value)
    }
}

impl From<Vec<u32>> for ArrayData {
    fn from(value: Vec<u32>) -> Self {
        ArrayData::U32(value)
    }
}

impl From<Vec<u64>> for ArrayData {
    fn from(value: Vec<u64>) -> Self {
        ArrayData::U64(value)
    }
}

impl From<Vec<i8>> for ArrayData {
    fn from(value: Vec<i8>) -> Self {
        ArrayData::I8(value)
    }
}

impl From<Vec<i16>> for ArrayData {
    fn from(value: Vec<i16>) -> Self {
        ArrayData::I16(value)
    }
}

impl From<Vec<i32>> for ArrayData {
    fn from(value: Vec<i32>) -> Self {
        ArrayData::I32(value)
    }
}

impl From<Vec<i64>> for ArrayData {
    fn from(value: Vec<i64>) -> Self {
        ArrayData::I64(value)
    }
}

impl From<Vec<f32>> for ArrayData {
    fn from(value: Vec<f32>) -> Self {
        ArrayData::F32(value)
    }
}

impl From<Vec<f64>> for ArrayData {
    fn from(value: Vec<f64>) -> Self {
        ArrayData::F64(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_and_size_follow_variant() {
        let data = ArrayData::from(vec![1u16, 2, 3]);
        assert_eq!(data.type_tag(), TypeTag::ArrayUInt);
        assert_eq!(data.element_size(), 2);
        assert_eq!(data.len(), 3);

        let data = ArrayData::from(vec![1.0f64]);
        assert_eq!(data.type_tag(), TypeTag::ArrayFloat);
        assert_eq!(data.element_size(), 8);
    }

    #[test]
    fn test_get_widens() {
        let data = ArrayData::from(vec![-1i8, 5]);
        assert_eq!(data.get(0), Some(Element::Int(-1)));
        assert_eq!(data.get(2), None);
    }

    #[test]
    fn test_push_narrows() {
        let mut data = ArrayData::U8(vec![]);
        data.push(Element::UInt(255)).unwrap();
        assert!(matches!(
            data.push(Element::UInt(256)).unwrap_err(),
            Error::ValidationFailed(_)
        ));
        assert_eq!(data, ArrayData::U8(vec![255]));
    }

    #[test]
    fn test_push_f32_rejects_overflow() {
        let mut data = ArrayData::F32(vec![]);
        data.push(Element::Float(1.5)).unwrap();
        data.push(Element::Float(f64::INFINITY)).unwrap();
        assert!(matches!(
            data.push(Element::Float(1e300)).unwrap_err(),
            Error::ValidationFailed(_)
        ));
        assert_eq!(data.len(), 2);
        assert_eq!(data.get(1), Some(Element::Float(f64::INFINITY)));
    }

    #[test]
    fn test_push_wrong_kind() {
        let mut data = ArrayData::I32(vec![]);
        assert_eq!(
            data.push(Element::Float(1.0)).unwrap_err(),
            Error::TypeMismatch {
                expected: TypeTag::ArrayInt,
                found: TypeTag::ArrayFloat
            }
        );
    }
}
