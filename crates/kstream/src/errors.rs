//! Error types for stream reads, value operations and arena bookkeeping.

use thiserror::Error;

use crate::types::TypeTag;

/// Errors produced by a [crate::Session] or a [crate::stream::Stream].
///
/// Errors are `Clone` so the session can latch the first one and hand copies
/// back to every later operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Requested range runs past the end of the stream.
    #[error("end of stream: requested {requested} byte(s) at {pos}, length is {length}")]
    EndOfStream {
        pos: u64,
        requested: u64,
        length: u64,
    },
    /// The backing file could not be positioned.
    #[error("failed to seek to {offset}: {reason}")]
    SeekFailed { offset: u64, reason: String },
    /// The backing source returned fewer bytes than requested.
    #[error("failed to read at {offset}: {reason}")]
    ReadFailed { offset: u64, reason: String },
    /// A bit read needed more than 8 bytes of backlog.
    #[error("bit width {0} too large")]
    BitWidthTooLarge(u32),
    /// The inflater rejected its input.
    #[error("decompression failed: {0}")]
    CompressionError(String),
    /// No inflater is configured for this session.
    #[error("no decompression implementation available")]
    CompressionUnavailable,
    /// Text could not be decoded from the given encoding.
    #[error("cannot decode text as {encoding}: {reason}")]
    EncodingError { encoding: String, reason: String },
    /// A slot or id was not handed out by this session.
    #[error("allocator misuse: {0}")]
    AllocatorMisuse(String),
    /// Parsed data did not match an expected value.
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    /// Endianness was never fixed for a switchable-endian read.
    #[error("endianness unspecified")]
    EndianessUnspecified,
    /// A typed operation was applied to a value of another kind.
    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch { expected: TypeTag, found: TypeTag },
    /// A string/int conversion named a base outside 2..=36.
    #[error("radix {0} is outside 2..=36")]
    InvalidRadix(u32),
    /// Text is not a number in the requested base.
    #[error("{text:?} is not a base-{base} integer")]
    InvalidNumber { text: String, base: u32 },
}

impl Error {
    /// Fatal errors point at a bug in the calling code; they abort the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::AllocatorMisuse(_))
    }

    pub(crate) fn misuse(msg: impl Into<String>) -> Self {
        Error::AllocatorMisuse(msg.into())
    }

    pub(crate) fn encoding(encoding: &str, reason: impl Into<String>) -> Self {
        Error::EncodingError {
            encoding: encoding.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
