//! Positioned, bit-aware cursor over a [Source].
//!
//! A stream covers `[origin, origin + length)` of its source. Substreams
//! share the parent's source but keep their own cursor and bit backlog.

use std::{fs::File, path::Path, rc::Rc};

use crate::{
    arena::StreamId,
    bits::BitAccumulator,
    errors::{Error, Result},
    source::Source,
    types::{BitOrder, Endian},
};

#[derive(Debug)]
pub struct Stream {
    source: Rc<Source>,
    origin: u64,
    length: u64,
    pos: u64,
    acc: BitAccumulator,
    parent: Option<StreamId>,
}

impl Stream {
    pub fn from_memory(data: Vec<u8>) -> Self {
        let source = Source::Memory(data);
        let length = source.len();
        Self::over(Rc::new(source), 0, length, None)
    }

    pub fn from_file(file: File) -> Result<Self> {
        let source = Source::file(file)?;
        let length = source.len();
        Ok(Self::over(Rc::new(source), 0, length, None))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(|e| Error::ReadFailed {
            offset: 0,
            reason: format!("{}: {e}", path.as_ref().display()),
        })?;
        Self::from_file(file)
    }

    /// A stream over `[origin, origin + length)` of `source`, cursor at 0.
    pub(crate) fn over(
        source: Rc<Source>,
        origin: u64,
        length: u64,
        parent: Option<StreamId>,
    ) -> Self {
        Self {
            source,
            origin,
            length,
            pos: 0,
            acc: BitAccumulator::default(),
            parent,
        }
    }

    pub(crate) fn source(&self) -> &Rc<Source> {
        &self.source
    }

    /// Absolute offset of this stream's byte 0 within its source.
    pub fn origin(&self) -> u64 {
        self.origin
    }

    pub fn parent(&self) -> Option<StreamId> {
        self.parent
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn size(&self) -> u64 {
        self.length
    }

    pub fn remaining(&self) -> u64 {
        self.length - self.pos
    }

    pub fn bits_left(&self) -> u32 {
        self.acc.bits_left()
    }

    pub fn is_eof(&self) -> bool {
        self.pos == self.length && self.acc.bits_left() == 0
    }

    /// Moves the cursor to `pos` and drops any buffered bits.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.length {
            return Err(Error::EndOfStream {
                pos,
                requested: 0,
                length: self.length,
            });
        }

        self.pos = pos;
        self.acc.clear();
        Ok(())
    }

    fn check_range(&self, pos: u64, n: u64) -> Result<()> {
        if pos.checked_add(n).is_none_or(|end| end > self.length) {
            return Err(Error::EndOfStream {
                pos,
                requested: n,
                length: self.length,
            });
        }
        Ok(())
    }

    /// Fills `buf` from the cursor and advances past it.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let n = buf.len() as u64;
        self.check_range(self.pos, n)?;
        self.source.read_at(self.origin + self.pos, buf)?;
        self.pos += n;
        Ok(())
    }

    /// Reads `len` bytes at `pos` without moving the cursor.
    pub fn read_range(&self, pos: u64, len: u64) -> Result<Vec<u8>> {
        self.check_range(pos, len)?;
        let mut buf = vec![0u8; len as usize];
        self.source.read_at(self.origin + pos, &mut buf)?;
        Ok(buf)
    }

    /// Reads `n` bytes eagerly.
    pub fn read_raw(&mut self, n: u64) -> Result<Vec<u8>> {
        self.check_range(self.pos, n)?;
        let mut buf = vec![0u8; n as usize];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Unsigned integer of `n` (1..=8) bytes.
    pub fn read_uint(&mut self, n: usize, endian: Endian) -> Result<u64> {
        if !(1..=8).contains(&n) {
            return Err(Error::ValidationFailed(format!(
                "integer width {n} outside 1..=8"
            )));
        }

        let mut buf = [0u8; 8];
        let bytes = &mut buf[..n];
        self.read_into(bytes)?;

        if endian == Endian::Big {
            bytes.reverse();
        }

        Ok(bytes
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, &b)| acc | (b as u64) << (i * 8)))
    }

    pub fn read_u1(&mut self) -> Result<u8> {
        Ok(self.read_uint(1, Endian::Little)? as u8)
    }

    pub fn read_u2le(&mut self) -> Result<u16> {
        Ok(self.read_uint(2, Endian::Little)? as u16)
    }

    pub fn read_u4le(&mut self) -> Result<u32> {
        Ok(self.read_uint(4, Endian::Little)? as u32)
    }

    pub fn read_u8le(&mut self) -> Result<u64> {
        self.read_uint(8, Endian::Little)
    }

    pub fn read_u2be(&mut self) -> Result<u16> {
        Ok(self.read_uint(2, Endian::Big)? as u16)
    }

    pub fn read_u4be(&mut self) -> Result<u32> {
        Ok(self.read_uint(4, Endian::Big)? as u32)
    }

    pub fn read_u8be(&mut self) -> Result<u64> {
        self.read_uint(8, Endian::Big)
    }

    pub fn read_s1(&mut self) -> Result<i8> {
        Ok(self.read_u1()? as i8)
    }

    pub fn read_s2le(&mut self) -> Result<i16> {
        Ok(self.read_u2le()? as i16)
    }

    pub fn read_s4le(&mut self) -> Result<i32> {
        Ok(self.read_u4le()? as i32)
    }

    pub fn read_s8le(&mut self) -> Result<i64> {
        Ok(self.read_u8le()? as i64)
    }

    pub fn read_s2be(&mut self) -> Result<i16> {
        Ok(self.read_u2be()? as i16)
    }

    pub fn read_s4be(&mut self) -> Result<i32> {
        Ok(self.read_u4be()? as i32)
    }

    pub fn read_s8be(&mut self) -> Result<i64> {
        Ok(self.read_u8be()? as i64)
    }

    /// Raw float bytes, flipped only when `endian` is not the host's.
    fn read_float_bytes<const N: usize>(&mut self, endian: Endian) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_into(&mut buf)?;
        if endian != Endian::native() {
            buf.reverse();
        }
        Ok(buf)
    }

    pub fn read_f4le(&mut self) -> Result<f32> {
        Ok(f32::from_ne_bytes(self.read_float_bytes(Endian::Little)?))
    }

    pub fn read_f4be(&mut self) -> Result<f32> {
        Ok(f32::from_ne_bytes(self.read_float_bytes(Endian::Big)?))
    }

    pub fn read_f8le(&mut self) -> Result<f64> {
        Ok(f64::from_ne_bytes(self.read_float_bytes(Endian::Little)?))
    }

    pub fn read_f8be(&mut self) -> Result<f64> {
        Ok(f64::from_ne_bytes(self.read_float_bytes(Endian::Big)?))
    }

    /// Reads `n` (0..=64) bits in the given order.
    pub fn read_bits(&mut self, n: u32, order: BitOrder) -> Result<u64> {
        let needed = self.acc.bytes_needed(n)?;
        let mut fresh = [0u8; 8];
        self.read_into(&mut fresh[..needed])?;
        Ok(self.acc.take(n, &fresh[..needed], order))
    }

    pub fn read_bits_le(&mut self, n: u32) -> Result<u64> {
        self.read_bits(n, BitOrder::LsbFirst)
    }

    pub fn read_bits_be(&mut self, n: u32) -> Result<u64> {
        self.read_bits(n, BitOrder::MsbFirst)
    }

    /// Drops buffered bits. The byte cursor does not move back.
    pub fn align_to_byte(&mut self) {
        self.acc.clear();
    }

    /// Claims `n` bytes at the cursor and returns where they start.
    pub fn take_range(&mut self, n: u64) -> Result<u64> {
        self.check_range(self.pos, n)?;
        let start = self.pos;
        self.pos += n;
        Ok(start)
    }

    /// Claims everything from the cursor to the end; returns `(start, len)`.
    pub fn take_full(&mut self) -> (u64, u64) {
        let start = self.pos;
        self.pos = self.length;
        (start, self.length - start)
    }

    /// Scans for `term` and returns the claimed `(start, len)`.
    ///
    /// With `include` the terminator is part of the range. Without `consume`
    /// the cursor is left on the terminator. Reaching the end is an error
    /// only when `eos_error` is set, in which case the cursor is restored.
    pub fn take_term(
        &mut self,
        term: u8,
        include: bool,
        consume: bool,
        eos_error: bool,
    ) -> Result<(u64, u64)> {
        let start = self.pos;

        loop {
            if self.pos == self.length {
                if eos_error {
                    let scanned = self.pos - start;
                    self.pos = start;
                    return Err(Error::EndOfStream {
                        pos: start,
                        requested: scanned + 1,
                        length: self.length,
                    });
                }
                return Ok((start, self.pos - start));
            }

            let mut b = [0u8; 1];
            if let Err(e) = self.read_into(&mut b) {
                self.pos = start;
                return Err(e);
            }

            if b[0] == term {
                let end = if include { self.pos } else { self.pos - 1 };
                if !consume {
                    self.pos -= 1;
                }
                return Ok((start, end - start));
            }
        }
    }

    /// Reads `expected.len()` bytes and checks they match.
    pub fn ensure_fixed_contents(&mut self, expected: &[u8]) -> Result<()> {
        let actual = self.read_raw(expected.len() as u64)?;
        if actual != expected {
            return Err(Error::ValidationFailed(format!(
                "expected {expected:02x?}, found {actual:02x?}"
            )));
        }
        Ok(())
    }
}
