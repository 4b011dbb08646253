//! Byte order, bit order and the type tags carried by value handles.

/// Byte order of a multi-byte scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order of the host, probed at runtime.
    pub fn native() -> Self {
        if u16::from_ne_bytes([1, 0]) == 1 {
            Endian::Little
        } else {
            Endian::Big
        }
    }
}

/// Bit order when reading sub-byte fields.
///
/// `MsbFirst` consumes the high bits of each byte first (big-endian bit
/// reads); `LsbFirst` consumes the low bits first (little-endian bit reads).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitOrder {
    #[default]
    MsbFirst,
    LsbFirst,
}

/// Kind of value a [crate::handle::Handle] is attached to.
///
/// Together with the handle's element size this is how generic code tells
/// arrays of different element kinds apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeTag {
    #[default]
    Unknown,
    ArrayUInt,
    ArrayInt,
    ArrayFloat,
    ArrayString,
    ArrayBytes,
    Bytes,
    String,
    UserType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_matches_target() {
        let expected = if cfg!(target_endian = "little") {
            Endian::Little
        } else {
            Endian::Big
        };
        assert_eq!(Endian::native(), expected);
    }

    #[test]
    fn test_default_bit_order() {
        assert_eq!(BitOrder::default(), BitOrder::MsbFirst);
    }
}
