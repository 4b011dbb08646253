//! Reads that produce [Bytes] and the transforms defined over them.
//!
//! Transforms never modify their input: they materialize it, compute, and
//! return a new owned value whose handle points at the input's stream.

use std::cmp::Ordering;

use crate::{
    arena::StreamId,
    errors::{Error, Result},
    handle::Handle,
    session::Session,
    types::TypeTag,
    value::{Bytes, Payload},
};

impl Session {
    /// The handle records `pos`, where the range started.
    fn lazy_bytes(&mut self, stream: StreamId, pos: u64, len: u64) -> Bytes {
        let handle = self.handles.alloc(Handle {
            stream,
            pos,
            tag: TypeTag::Bytes,
            element_size: 0,
            parent: None,
        });
        Bytes {
            handle,
            payload: Payload::Lazy { stream, pos, len },
        }
    }

    /// Claims the next `n` bytes without copying them.
    pub fn read_bytes(&mut self, id: StreamId, n: u64) -> Result<Bytes> {
        let start = self.read(id, |s| s.take_range(n))?;
        Ok(self.lazy_bytes(id, start, n))
    }

    /// Claims bytes up to `term`. See [crate::stream::Stream::take_term].
    pub fn read_bytes_term(
        &mut self,
        id: StreamId,
        term: u8,
        include: bool,
        consume: bool,
        eos_error: bool,
    ) -> Result<Bytes> {
        let (start, len) = self.read(id, |s| s.take_term(term, include, consume, eos_error))?;
        Ok(self.lazy_bytes(id, start, len))
    }

    /// Claims everything left in the stream.
    pub fn read_bytes_full(&mut self, id: StreamId) -> Result<Bytes> {
        let (start, len) = self.read(id, |s| Ok(s.take_full()))?;
        Ok(self.lazy_bytes(id, start, len))
    }

    /// Owned Bytes holding a copy of `data`, attached to the detached stream.
    pub fn bytes_from_slice(&mut self, data: &[u8]) -> Result<Bytes> {
        self.ensure_clear()?;
        let stream = self.detached_stream();
        let result = self.owned_bytes(stream, data.to_vec());
        self.guard(result)
    }

    pub fn bytes_len(&self, bytes: &Bytes) -> Result<u64> {
        match bytes.payload {
            Payload::Lazy { len, .. } => Ok(len),
            Payload::Owned(slot) => Ok(self.buffers.get(slot)?.len() as u64),
        }
    }

    /// Current content of `bytes`. Lazy values are re-read every call.
    pub(crate) fn materialize(&self, bytes: &Bytes) -> Result<Vec<u8>> {
        match bytes.payload {
            Payload::Lazy { stream, pos, len } => self.streams.get(stream)?.read_range(pos, len),
            Payload::Owned(slot) => Ok(self.buffers.get(slot)?.clone()),
        }
    }

    pub fn bytes_data(&mut self, bytes: &Bytes) -> Result<Vec<u8>> {
        self.ensure_clear()?;
        let result = self.materialize(bytes);
        self.guard(result)
    }

    /// New owned Bytes carrying `data`, with provenance taken from `from`.
    fn derive_bytes(&mut self, from: &Bytes, data: Vec<u8>) -> Result<Bytes> {
        let result = self
            .handles
            .get(from.handle)
            .map(|h| h.stream)
            .and_then(|stream| self.owned_bytes(stream, data));
        self.guard(result)
    }

    fn transform_bytes(
        &mut self,
        bytes: &Bytes,
        op: impl FnOnce(Vec<u8>) -> Result<Vec<u8>>,
    ) -> Result<Bytes> {
        let data = self.bytes_data(bytes)?;
        let result = op(data);
        let data = self.guard(result)?;
        self.derive_bytes(bytes, data)
    }

    /// Drops trailing `pad` bytes.
    pub fn bytes_strip_right(&mut self, bytes: &Bytes, pad: u8) -> Result<Bytes> {
        self.transform_bytes(bytes, |mut data| {
            let end = data.iter().rposition(|&b| b != pad).map_or(0, |i| i + 1);
            data.truncate(end);
            Ok(data)
        })
    }

    /// Cuts at the first `term`, keeping it when `include` is set.
    pub fn bytes_terminate(&mut self, bytes: &Bytes, term: u8, include: bool) -> Result<Bytes> {
        self.transform_bytes(bytes, |mut data| {
            if let Some(i) = data.iter().position(|&b| b == term) {
                data.truncate(if include { i + 1 } else { i });
            }
            Ok(data)
        })
    }

    /// XORs with the low `width` bytes of `key`, least significant first,
    /// cycling when `width` is more than one.
    pub fn bytes_process_xor_int(
        &mut self,
        bytes: &Bytes,
        key: u64,
        width: usize,
    ) -> Result<Bytes> {
        self.transform_bytes(bytes, |mut data| {
            if !(1..=8).contains(&width) {
                return Err(Error::ValidationFailed(format!(
                    "xor key width {width} outside 1..=8"
                )));
            }
            let key = &key.to_le_bytes()[..width];
            xor_cyclic(&mut data, key);
            Ok(data)
        })
    }

    /// XORs cyclically against the content of `key`. An empty key is a no-op.
    pub fn bytes_process_xor_bytes(&mut self, bytes: &Bytes, key: &Bytes) -> Result<Bytes> {
        let key = self.bytes_data(key)?;
        self.transform_bytes(bytes, move |mut data| {
            xor_cyclic(&mut data, &key);
            Ok(data)
        })
    }

    /// Rotates the bits of every byte left by `count`; negative rotates right.
    pub fn bytes_process_rotate_left(&mut self, bytes: &Bytes, count: i32) -> Result<Bytes> {
        let shift = count.rem_euclid(8) as u32;
        self.transform_bytes(bytes, |mut data| {
            for b in data.iter_mut() {
                *b = b.rotate_left(shift);
            }
            Ok(data)
        })
    }

    /// Runs the session's inflater over `bytes`.
    pub fn bytes_process_zlib(&mut self, bytes: &Bytes) -> Result<Bytes> {
        let data = self.bytes_data(bytes)?;
        let result = self.config.inflate.inflate(&data);
        let inflated = self.guard(result)?;
        self.derive_bytes(bytes, inflated)
    }

    pub fn bytes_concat(&mut self, a: &Bytes, b: &Bytes) -> Result<Bytes> {
        let tail = self.bytes_data(b)?;
        self.transform_bytes(a, move |mut data| {
            data.extend_from_slice(&tail);
            Ok(data)
        })
    }

    /// Lexicographic order; a strict prefix sorts first.
    pub fn bytes_compare(&mut self, a: &Bytes, b: &Bytes) -> Result<Ordering> {
        let left = self.bytes_data(a)?;
        let right = self.bytes_data(b)?;
        Ok(left.cmp(&right))
    }

    /// Smallest byte, or 0 when empty.
    pub fn bytes_min(&mut self, bytes: &Bytes) -> Result<u8> {
        Ok(self.bytes_data(bytes)?.into_iter().min().unwrap_or(0))
    }

    /// Largest byte, or 0 when empty.
    pub fn bytes_max(&mut self, bytes: &Bytes) -> Result<u8> {
        Ok(self.bytes_data(bytes)?.into_iter().max().unwrap_or(0))
    }
}

fn xor_cyclic(data: &mut [u8], key: &[u8]) {
    if key.is_empty() {
        return;
    }
    for (b, k) in data.iter_mut().zip(key.iter().cycle()) {
        *b ^= k;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(data: &[u8]) -> (Session, StreamId) {
        let mut ks = Session::default();
        let io = ks.open_memory(data.to_vec()).unwrap();
        (ks, io)
    }

    #[test]
    fn test_read_bytes_is_lazy() {
        let (mut ks, io) = session_with(&[1, 2, 3, 4]);
        ks.read(io, |s| s.read_u1()).unwrap();
        let bytes = ks.read_bytes(io, 2).unwrap();

        assert!(bytes.is_lazy());
        assert_eq!(
            bytes.payload(),
            Payload::Lazy {
                stream: io,
                pos: 1,
                len: 2
            }
        );
        assert_eq!(ks.bytes_len(&bytes).unwrap(), 2);
        assert_eq!(ks.bytes_data(&bytes).unwrap(), vec![2, 3]);
        // Reading again re-fetches the same range.
        assert_eq!(ks.bytes_data(&bytes).unwrap(), vec![2, 3]);
        assert_eq!(ks.stream(io).unwrap().pos(), 3);
    }

    #[test]
    fn test_read_bytes_past_end() {
        let (mut ks, io) = session_with(&[1, 2]);
        assert!(matches!(
            ks.read_bytes(io, 3).unwrap_err(),
            Error::EndOfStream { .. }
        ));
        assert_eq!(ks.stream(io).unwrap().pos(), 0);
    }

    #[test]
    fn test_read_bytes_term() {
        let (mut ks, io) = session_with(b"key=value;rest");
        let key = ks.read_bytes_term(io, b'=', false, true, true).unwrap();
        let value = ks.read_bytes_term(io, b';', true, true, true).unwrap();
        let rest = ks.read_bytes_full(io).unwrap();

        assert_eq!(ks.bytes_data(&key).unwrap(), b"key");
        assert_eq!(ks.bytes_data(&value).unwrap(), b"value;");
        assert_eq!(ks.bytes_data(&rest).unwrap(), b"rest");
        assert!(ks.stream(io).unwrap().is_eof());
    }

    #[test]
    fn test_strip_right() {
        let mut ks = Session::default();
        let b = ks.bytes_from_slice(b"ab\0c\0\0").unwrap();
        let stripped = ks.bytes_strip_right(&b, 0).unwrap();
        assert_eq!(ks.bytes_data(&stripped).unwrap(), b"ab\0c");

        let all_pad = ks.bytes_from_slice(&[0x20, 0x20]).unwrap();
        let empty = ks.bytes_strip_right(&all_pad, 0x20).unwrap();
        assert_eq!(ks.bytes_len(&empty).unwrap(), 0);
    }

    #[test]
    fn test_terminate() {
        let mut ks = Session::default();
        let b = ks.bytes_from_slice(b"ab\0cd\0").unwrap();

        let excl = ks.bytes_terminate(&b, 0, false).unwrap();
        assert_eq!(ks.bytes_data(&excl).unwrap(), b"ab");

        let incl = ks.bytes_terminate(&b, 0, true).unwrap();
        assert_eq!(ks.bytes_data(&incl).unwrap(), b"ab\0");

        let none = ks.bytes_terminate(&b, b'z', false).unwrap();
        assert_eq!(ks.bytes_data(&none).unwrap(), b"ab\0cd\0");
    }

    #[test]
    fn test_transform_keeps_input_and_provenance() {
        let (mut ks, io) = session_with(&[0x0F, 0xF0]);
        let b = ks.read_bytes(io, 2).unwrap();
        let x = ks.bytes_process_xor_int(&b, 0xFF, 1).unwrap();

        assert!(!x.is_lazy());
        assert_eq!(ks.bytes_data(&x).unwrap(), vec![0xF0, 0x0F]);
        assert_eq!(ks.bytes_data(&b).unwrap(), vec![0x0F, 0xF0]);
        assert_eq!(ks.handle(&x).unwrap().stream, io);
    }

    #[test]
    fn test_xor_int_wide_key() {
        let mut ks = Session::default();
        let b = ks.bytes_from_slice(&[0, 0, 0]).unwrap();
        let x = ks.bytes_process_xor_int(&b, 0x0201, 2).unwrap();
        assert_eq!(ks.bytes_data(&x).unwrap(), vec![0x01, 0x02, 0x01]);

        assert!(matches!(
            ks.bytes_process_xor_int(&b, 1, 0).unwrap_err(),
            Error::ValidationFailed(_)
        ));
    }

    #[test]
    fn test_xor_bytes() {
        let mut ks = Session::default();
        let data = ks.bytes_from_slice(&[1, 2, 3, 4, 5]).unwrap();
        let key = ks.bytes_from_slice(&[0xFF, 0x01]).unwrap();

        let once = ks.bytes_process_xor_bytes(&data, &key).unwrap();
        assert_eq!(ks.bytes_data(&once).unwrap(), vec![0xFE, 3, 0xFC, 5, 0xFA]);

        let twice = ks.bytes_process_xor_bytes(&once, &key).unwrap();
        assert_eq!(ks.bytes_data(&twice).unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_rotate_left() {
        let mut ks = Session::default();
        let b = ks.bytes_from_slice(&[0b1000_0001, 0b0000_0011]).unwrap();

        let r = ks.bytes_process_rotate_left(&b, 1).unwrap();
        assert_eq!(ks.bytes_data(&r).unwrap(), vec![0b0000_0011, 0b0000_0110]);

        let back = ks.bytes_process_rotate_left(&r, -1).unwrap();
        assert_eq!(ks.bytes_data(&back).unwrap(), vec![0b1000_0001, 0b0000_0011]);
    }

    #[test]
    fn test_zlib_without_inflater() {
        let mut ks = Session::default();
        let b = ks.bytes_from_slice(&[0x78, 0x9C]).unwrap();
        assert_eq!(
            ks.bytes_process_zlib(&b).unwrap_err(),
            Error::CompressionUnavailable
        );
        assert_eq!(ks.error(), Some(&Error::CompressionUnavailable));
    }

    #[test]
    fn test_zlib_with_custom_inflater() {
        let mut config = crate::Config::default();
        config.set_inflate(|input: &[u8]| -> Result<Vec<u8>> { Ok(input.repeat(2)) });
        let mut ks = Session::new(config);

        let b = ks.bytes_from_slice(&[7, 8]).unwrap();
        let out = ks.bytes_process_zlib(&b).unwrap();
        assert_eq!(ks.bytes_data(&out).unwrap(), vec![7, 8, 7, 8]);
    }

    #[test]
    fn test_compare() {
        let mut ks = Session::default();
        let abc = ks.bytes_from_slice(b"abc").unwrap();
        let ab = ks.bytes_from_slice(b"ab").unwrap();
        let abd = ks.bytes_from_slice(b"abd").unwrap();

        assert_eq!(ks.bytes_compare(&ab, &abc).unwrap(), Ordering::Less);
        assert_eq!(ks.bytes_compare(&abd, &abc).unwrap(), Ordering::Greater);
        assert_eq!(ks.bytes_compare(&abc, &abc).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_min_max_concat() {
        let mut ks = Session::default();
        let a = ks.bytes_from_slice(&[5, 200]).unwrap();
        let b = ks.bytes_from_slice(&[1]).unwrap();
        let empty = ks.bytes_from_slice(&[]).unwrap();

        assert_eq!(ks.bytes_min(&a).unwrap(), 5);
        assert_eq!(ks.bytes_max(&a).unwrap(), 200);
        assert_eq!(ks.bytes_max(&empty).unwrap(), 0);

        let ab = ks.bytes_concat(&a, &b).unwrap();
        assert_eq!(ks.bytes_data(&ab).unwrap(), vec![5, 200, 1]);
    }
}
