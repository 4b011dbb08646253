//! Text decoding for the encodings binary formats commonly declare.
//!
//! Labels are matched case-insensitively, ignoring `-` and `_`, so
//! `"UTF-16LE"`, `"utf16le"` and `"utf_16_le"` all name the same encoding.

use std::str::FromStr;

use kstream::{Error, Result, TextDecode};

/// Character encoding understood by [StdDecoder].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    /// Any valid UTF-8 sequence.
    Utf8,
    /// Every byte must be in 0..=0x7F.
    Ascii,
    /// ISO-8859-1: each byte is the code point of the same value.
    Latin1,
    Utf16Le,
    Utf16Be,
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "utf8" => Ok(Encoding::Utf8),
            "ascii" | "usascii" => Ok(Encoding::Ascii),
            "latin1" | "iso88591" => Ok(Encoding::Latin1),
            "utf16le" => Ok(Encoding::Utf16Le),
            "utf16be" => Ok(Encoding::Utf16Be),
            _ => Err(invalid(label, "unknown encoding")),
        }
    }
}

impl Encoding {
    /// Decodes `bytes` to a UTF-8 string.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            Encoding::Utf8 => {
                String::from_utf8(bytes.to_vec()).map_err(|e| invalid("UTF-8", e.to_string()))
            }
            Encoding::Ascii => {
                if let Some(pos) = bytes.iter().position(|b| *b > 0x7F) {
                    return Err(invalid(
                        "ASCII",
                        format!("byte {:#04x} at {pos} is not ASCII", bytes[pos]),
                    ));
                }
                Ok(bytes.iter().map(|&b| b as char).collect())
            }
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Utf16Le => decode_utf16("UTF-16LE", bytes, u16::from_le_bytes),
            Encoding::Utf16Be => decode_utf16("UTF-16BE", bytes, u16::from_be_bytes),
        }
    }
}

fn decode_utf16(label: &str, bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(invalid(label, format!("odd length {}", bytes.len())));
    }

    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| invalid(label, e.to_string()))
}

fn invalid(label: &str, reason: impl Into<String>) -> Error {
    Error::EncodingError {
        encoding: label.to_string(),
        reason: reason.into(),
    }
}

/// [TextDecode] over the encodings in [Encoding]. Unknown labels fail with
/// [Error::EncodingError].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDecoder;

impl TextDecode for StdDecoder {
    fn decode(&self, raw: &[u8], encoding: &str) -> Result<String> {
        encoding.parse::<Encoding>()?.decode(raw)
    }
}
