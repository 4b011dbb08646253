//! Pluggable decompression and text decoding.
//!
//! The engine only calls through these traits. Real implementations live in
//! `kstream-process`; the defaults here keep a session usable without them.

use crate::errors::{Error, Result};

/// Decompresses a byte payload. Must not depend on anything but `input`.
pub trait Inflate {
    fn inflate(&self, input: &[u8]) -> Result<Vec<u8>>;
}

/// Converts raw text in `encoding` to UTF-8.
pub trait TextDecode {
    fn decode(&self, raw: &[u8], encoding: &str) -> Result<String>;
}

impl<F> Inflate for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>>,
{
    fn inflate(&self, input: &[u8]) -> Result<Vec<u8>> {
        self(input)
    }
}

impl<F> TextDecode for F
where
    F: Fn(&[u8], &str) -> Result<String>,
{
    fn decode(&self, raw: &[u8], encoding: &str) -> Result<String> {
        self(raw, encoding)
    }
}

/// Inflater used when none is linked.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInflate;

impl Inflate for NoInflate {
    fn inflate(&self, _input: &[u8]) -> Result<Vec<u8>> {
        Err(Error::CompressionUnavailable)
    }
}

/// Decoder that performs no conversion: input that is already valid UTF-8
/// is returned unchanged whatever `encoding` says.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl TextDecode for PassThrough {
    fn decode(&self, raw: &[u8], encoding: &str) -> Result<String> {
        String::from_utf8(raw.to_vec()).map_err(|e| Error::encoding(encoding, e.to_string()))
    }
}
