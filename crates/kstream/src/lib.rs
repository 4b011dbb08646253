//! # kstream
//!
//! Runtime support for parsers generated from declarative binary format
//! descriptions.
//!
//! A [Session] owns the input streams and every value produced while
//! reading them. Reads are bounds-checked and report failures through a
//! sticky error latch, so a generated parser can run a straight-line
//! sequence of reads and check the outcome once at the end.
//!
//! ## Example
//!
//! ```
//! use kstream::{BitOrder, Session};
//!
//! let mut ks = Session::default();
//! let io = ks.open_memory(vec![0x12, 0x34, 0xB2, b'h', b'i', 0]).unwrap();
//!
//! assert_eq!(ks.read(io, |s| s.read_u2be()).unwrap(), 0x1234);
//! assert_eq!(ks.read(io, |s| s.read_bits(3, BitOrder::MsbFirst)).unwrap(), 0b101);
//! ks.read(io, |s| {
//!     s.align_to_byte();
//!     Ok(())
//! })
//! .unwrap();
//!
//! let raw = ks.read_bytes_term(io, 0, false, true, true).unwrap();
//! let name = ks.str_from_bytes(&raw, "UTF-8").unwrap();
//! assert_eq!(ks.str_as_str(&name).unwrap(), "hi");
//! assert!(ks.stream(io).unwrap().is_eof());
//! ```

pub mod arena;
pub mod array_ops;
pub mod bits;
pub mod bytes_ops;
pub mod codec;
pub mod errors;
pub mod handle;
pub mod math;
pub mod session;
pub mod source;
pub mod stream;
pub mod string_ops;
pub mod types;
pub mod value;

pub use arena::{Arena, ArenaStats, HandleId, Slot, StreamId};
pub use codec::{Inflate, NoInflate, PassThrough, TextDecode};
pub use errors::{Error, Result};
pub use handle::{Handle, HasHandle};
pub use math::{div_floor, mod_floor};
pub use session::{Config, Session};
pub use source::Source;
pub use stream::Stream;
pub use types::{BitOrder, Endian, TypeTag};
pub use value::{Array, ArrayData, Bytes, Element, KsString, Payload};
