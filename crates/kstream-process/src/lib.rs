//! # kstream-process
//!
//! Codec implementations for a [kstream::Session]: zlib inflation through
//! `flate2` and decoding of the common single- and double-byte encodings.
//!
//! ```
//! use kstream::Session;
//!
//! let mut ks = Session::new(kstream_process::config());
//! let raw = ks.bytes_from_slice(&[b'c', 0xE9]).unwrap();
//! let text = ks.str_from_bytes(&raw, "ISO-8859-1").unwrap();
//! assert_eq!(ks.str_as_str(&text).unwrap(), "cé");
//! ```

pub mod encoding;
pub mod zlib;

pub use encoding::{Encoding, StdDecoder};
pub use zlib::ZlibInflate;

use kstream::Config;

/// Session configuration with [ZlibInflate] and [StdDecoder] installed.
pub fn config() -> Config {
    let mut config = Config::default();
    config.set_inflate(ZlibInflate).set_decoder(StdDecoder);
    config
}
