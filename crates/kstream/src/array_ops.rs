//! Generic operations over [Array] values.
//!
//! Min/max dispatch on the [ArrayData] variant, so the element kind recorded
//! in the handle and the storage can never disagree.

use std::cmp::Ordering;

use crate::{
    arena::StreamId,
    errors::{Error, Result},
    session::Session,
    types::TypeTag,
    value::{Array, ArrayData, Bytes, Element, KsString},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Min,
    Max,
}

impl Extreme {
    fn replaces(self, ord: Ordering) -> bool {
        match self {
            Extreme::Min => ord == Ordering::Less,
            Extreme::Max => ord == Ordering::Greater,
        }
    }
}

/// First occurrence of the extreme element, or `None` when empty.
fn pick<T: Copy>(
    items: &[T],
    extreme: Extreme,
    mut cmp: impl FnMut(&T, &T) -> Result<Ordering>,
) -> Result<Option<T>> {
    let mut iter = items.iter();
    let Some(mut best) = iter.next().copied() else {
        return Ok(None);
    };

    for item in iter {
        if extreme.replaces(cmp(item, &best)?) {
            best = *item;
        }
    }

    Ok(Some(best))
}

fn pick_ord<T: Copy + Ord>(items: &[T], extreme: Extreme) -> Option<T> {
    pick(items, extreme, |a, b| Ok(a.cmp(b))).ok().flatten()
}

/// NaN never replaces the running extreme.
fn pick_float<T: Copy + PartialOrd>(items: &[T], extreme: Extreme) -> Option<T> {
    pick(items, extreme, |a, b| Ok(a.partial_cmp(b).unwrap_or(Ordering::Equal)))
        .ok()
        .flatten()
}

impl Session {
    /// Creates an array on `stream`; the handle's tag and element size are
    /// taken from the data's variant.
    pub fn array_new(&mut self, stream: StreamId, data: impl Into<ArrayData>) -> Result<Array> {
        self.ensure_clear()?;
        let result = self.owned_array(stream, data.into());
        self.guard(result)
    }

    pub fn array_data(&self, array: &Array) -> Result<&ArrayData> {
        self.arrays.get(array.slot)
    }

    pub fn array_len(&self, array: &Array) -> Result<usize> {
        Ok(self.array_data(array)?.len())
    }

    pub fn array_get(&self, array: &Array, index: usize) -> Result<Option<Element>> {
        Ok(self.array_data(array)?.get(index))
    }

    /// Appends `element` in place. Growing the array created last is O(1).
    pub fn array_push(&mut self, array: &Array, element: Element) -> Result<()> {
        self.ensure_clear()?;
        let mut pushed = Ok(());
        let result = self
            .arrays
            .realloc(array.slot, |data| pushed = data.push(element))
            .and(pushed);
        self.guard(result)
    }

    fn extreme(&self, array: &Array, extreme: Extreme) -> Result<Option<Element>> {
        let data = self.array_data(array)?;
        Ok(match data {
            ArrayData::U8(v) => pick_ord(v, extreme).map(|x| Element::UInt(x as u64)),
            ArrayData::U16(v) => pick_ord(v, extreme).map(|x| Element::UInt(x as u64)),
            ArrayData::U32(v) => pick_ord(v, extreme).map(|x| Element::UInt(x as u64)),
            ArrayData::U64(v) => pick_ord(v, extreme).map(Element::UInt),
            ArrayData::I8(v) => pick_ord(v, extreme).map(|x| Element::Int(x as i64)),
            ArrayData::I16(v) => pick_ord(v, extreme).map(|x| Element::Int(x as i64)),
            ArrayData::I32(v) => pick_ord(v, extreme).map(|x| Element::Int(x as i64)),
            ArrayData::I64(v) => pick_ord(v, extreme).map(Element::Int),
            ArrayData::F32(v) => pick_float(v, extreme).map(|x| Element::Float(x as f64)),
            ArrayData::F64(v) => pick_float(v, extreme).map(Element::Float),
            ArrayData::Str(v) => pick(v, extreme, |a: &KsString, b: &KsString| {
                Ok(self.str_as_str(a)?.cmp(self.str_as_str(b)?))
            })?
            .map(Element::Str),
            ArrayData::Bytes(v) => pick(v, extreme, |a: &Bytes, b: &Bytes| {
                Ok(self.materialize(a)?.cmp(&self.materialize(b)?))
            })?
            .map(Element::Bytes),
        })
    }

    fn latched_extreme(&mut self, array: &Array, extreme: Extreme) -> Result<Option<Element>> {
        self.ensure_clear()?;
        let result = self.extreme(array, extreme);
        self.guard(result)
    }

    /// Smallest element (first one on ties), `None` when empty.
    pub fn array_min(&mut self, array: &Array) -> Result<Option<Element>> {
        self.latched_extreme(array, Extreme::Min)
    }

    /// Largest element (first one on ties), `None` when empty.
    pub fn array_max(&mut self, array: &Array) -> Result<Option<Element>> {
        self.latched_extreme(array, Extreme::Max)
    }

    fn expect_tag(&mut self, array: &Array, expected: &[TypeTag]) -> Result<()> {
        self.ensure_clear()?;
        let found = self.array_data(array).map(ArrayData::type_tag);
        let result = found.and_then(|found| {
            if expected.contains(&found) {
                Ok(())
            } else {
                Err(Error::TypeMismatch {
                    expected: expected[0],
                    found,
                })
            }
        });
        self.guard(result)
    }

    fn int_extreme(&mut self, array: &Array, extreme: Extreme) -> Result<i64> {
        self.expect_tag(array, &[TypeTag::ArrayInt, TypeTag::ArrayUInt])?;
        Ok(match self.latched_extreme(array, extreme)? {
            Some(Element::Int(x)) => x,
            Some(Element::UInt(x)) => x as i64,
            _ => 0,
        })
    }

    fn float_extreme(&mut self, array: &Array, extreme: Extreme) -> Result<f64> {
        self.expect_tag(array, &[TypeTag::ArrayFloat])?;
        Ok(match self.latched_extreme(array, extreme)? {
            Some(Element::Float(x)) => x,
            _ => 0.0,
        })
    }

    fn str_extreme(&mut self, array: &Array, extreme: Extreme) -> Result<KsString> {
        self.expect_tag(array, &[TypeTag::ArrayString])?;
        match self.latched_extreme(array, extreme)? {
            Some(Element::Str(s)) => Ok(s),
            _ => self.str_from_literal(""),
        }
    }

    fn bytes_extreme(&mut self, array: &Array, extreme: Extreme) -> Result<Bytes> {
        self.expect_tag(array, &[TypeTag::ArrayBytes])?;
        match self.latched_extreme(array, extreme)? {
            Some(Element::Bytes(b)) => Ok(b),
            _ => self.bytes_from_slice(&[]),
        }
    }

    /// Smallest integer element, 0 for an empty array. Unsigned 64-bit
    /// values above `i64::MAX` are compared as unsigned but returned wrapped.
    pub fn array_min_int(&mut self, array: &Array) -> Result<i64> {
        self.int_extreme(array, Extreme::Min)
    }

    pub fn array_max_int(&mut self, array: &Array) -> Result<i64> {
        self.int_extreme(array, Extreme::Max)
    }

    pub fn array_min_float(&mut self, array: &Array) -> Result<f64> {
        self.float_extreme(array, Extreme::Min)
    }

    pub fn array_max_float(&mut self, array: &Array) -> Result<f64> {
        self.float_extreme(array, Extreme::Max)
    }

    /// Smallest string, or a new empty string for an empty array.
    pub fn array_min_str(&mut self, array: &Array) -> Result<KsString> {
        self.str_extreme(array, Extreme::Min)
    }

    pub fn array_max_str(&mut self, array: &Array) -> Result<KsString> {
        self.str_extreme(array, Extreme::Max)
    }

    pub fn array_min_bytes(&mut self, array: &Array) -> Result<Bytes> {
        self.bytes_extreme(array, Extreme::Min)
    }

    pub fn array_max_bytes(&mut self, array: &Array) -> Result<Bytes> {
        self.bytes_extreme(array, Extreme::Max)
    }
}
