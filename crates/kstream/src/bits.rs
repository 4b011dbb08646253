//! Bit accumulator shared by the little- and big-endian bit readers.
//!
//! The two bit orders differ in both fill order and extraction anchor:
//! little-endian packs new bytes above the bits already held and hands out
//! the low bits; big-endian shifts new bytes in at the bottom and hands out
//! the high bits.

use crate::{errors::Error, types::BitOrder};

/// Mask with the low `n` bits set (`n` up to 128).
fn mask_ones(n: u32) -> u128 {
    if n >= 128 {
        u128::MAX
    } else {
        (1u128 << n) - 1
    }
}

/// Per-stream backlog of bits not yet handed out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitAccumulator {
    bits: u64,
    bits_left: u32,
}

impl BitAccumulator {
    /// Number of buffered bits.
    pub fn bits_left(&self) -> u32 {
        self.bits_left
    }

    /// Drops the backlog.
    pub fn clear(&mut self) {
        self.bits = 0;
        self.bits_left = 0;
    }

    /// How many new bytes a read of `n` bits must pull from the stream.
    pub fn bytes_needed(&self, n: u32) -> Result<usize, Error> {
        if n > 64 {
            return Err(Error::BitWidthTooLarge(n));
        }

        if n <= self.bits_left {
            return Ok(0);
        }

        let needed = n - self.bits_left;
        let bytes = needed.div_ceil(8) as usize;
        if bytes > 8 {
            return Err(Error::BitWidthTooLarge(n));
        }

        Ok(bytes)
    }

    /// Folds `fresh` into the backlog and extracts `n` bits.
    ///
    /// `fresh` must hold exactly [Self::bytes_needed] bytes. The fill can
    /// momentarily exceed 64 bits (7 leftover bits plus 8 new bytes), so the
    /// work happens in a wider register and only the remainder, always fewer
    /// than 8 bits after a fill, is stored back.
    pub fn take(&mut self, n: u32, fresh: &[u8], order: BitOrder) -> u64 {
        let mut acc = self.bits as u128;
        let mut held = self.bits_left;

        for &b in fresh {
            match order {
                BitOrder::MsbFirst => {
                    acc = (acc << 8) | b as u128;
                }
                BitOrder::LsbFirst => {
                    acc |= (b as u128) << held;
                }
            }
            held += 8;
        }

        let mask = mask_ones(n);
        let value = match order {
            BitOrder::MsbFirst => {
                let shift = held - n;
                let value = (acc >> shift) & mask;
                held -= n;
                acc &= mask_ones(held);
                value
            }
            BitOrder::LsbFirst => {
                let value = acc & mask;
                acc >>= n;
                held -= n;
                value
            }
        };

        self.bits = acc as u64;
        self.bits_left = held;

        value as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_needed() {
        let acc = BitAccumulator::default();
        assert_eq!(acc.bytes_needed(0).unwrap(), 0);
        assert_eq!(acc.bytes_needed(1).unwrap(), 1);
        assert_eq!(acc.bytes_needed(9).unwrap(), 2);
        assert_eq!(acc.bytes_needed(64).unwrap(), 8);
    }

    #[test]
    fn test_bytes_needed_too_wide() {
        let acc = BitAccumulator::default();
        assert_eq!(
            acc.bytes_needed(65).unwrap_err(),
            Error::BitWidthTooLarge(65)
        );
    }

    #[test]
    fn test_take_msb_first() {
        let mut acc = BitAccumulator::default();
        assert_eq!(acc.take(4, &[0xB2], BitOrder::MsbFirst), 0xB);
        assert_eq!(acc.bits_left(), 4);
        assert_eq!(acc.take(4, &[], BitOrder::MsbFirst), 0x2);
        assert_eq!(acc.bits_left(), 0);
    }

    #[test]
    fn test_take_lsb_first() {
        let mut acc = BitAccumulator::default();
        assert_eq!(acc.take(4, &[0xB2], BitOrder::LsbFirst), 0x2);
        assert_eq!(acc.take(4, &[], BitOrder::LsbFirst), 0xB);
    }

    #[test]
    fn test_take_64_with_leftover() {
        let mut acc = BitAccumulator::default();
        assert_eq!(acc.take(1, &[0x80], BitOrder::MsbFirst), 1);
        assert_eq!(acc.bits_left(), 7);

        let fresh = [0xFF; 8];
        assert_eq!(acc.bytes_needed(64).unwrap(), 8);
        assert_eq!(acc.take(64, &fresh, BitOrder::MsbFirst), 0x01FF_FFFF_FFFF_FFFF);
        assert_eq!(acc.bits_left(), 7);
        assert_eq!(acc.take(7, &[], BitOrder::MsbFirst), 0x7F);
    }

    #[test]
    fn test_clear() {
        let mut acc = BitAccumulator::default();
        acc.take(3, &[0xFF], BitOrder::LsbFirst);
        acc.clear();
        assert_eq!(acc, BitAccumulator::default());
    }
}
