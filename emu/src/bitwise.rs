use std::ops::RangeInclusive;

/// Contains some helper methods to read and manipulate bits,
/// the index (`bit_idx`) is supposed to be from lsb to msb (right to left).
///
/// Every accessor is a plain shift-then-mask on the value itself, so fields
/// that straddle byte boundaries (e.g. `20..=27`) cost the same as aligned ones.
pub trait Bits: Copy {
    /// Width of the value in bits.
    const WIDTH: u8;

    fn is_bit_on(&self, bit_idx: u8) -> bool;

    fn is_bit_off(&self, bit_idx: u8) -> bool {
        !self.is_bit_on(bit_idx)
    }

    fn set_bit(&mut self, bit_idx: u8, value: bool);

    fn get_bit(&self, bit_idx: u8) -> bool {
        self.is_bit_on(bit_idx)
    }

    /// Extracts the contiguous field `bits_range` (inclusive on both ends)
    /// and moves it down to bit 0.
    fn get_bits(&self, bits_range: RangeInclusive<u8>) -> Self;

    /// Replaces the contiguous field `bits_range` with the low bits of `value`.
    fn set_bits(&mut self, bits_range: RangeInclusive<u8>, value: Self);

    /// Checks if a certain sequence of bit is set to 1.
    fn are_bits_on(&self, bits_range: RangeInclusive<u8>) -> bool {
        bits_range.into_iter().all(|bit_idx| self.is_bit_on(bit_idx))
    }

    fn get_byte(&self, byte_nth: u8) -> u8;

    /// Returns a sign-extended copy of the value.
    /// `number_of_bits` is the width of the two's complement field
    /// we want to sign-extend (starting from bit 0).
    fn sign_extended(&self, number_of_bits: u8) -> Self;
}

macro_rules! impl_bits {
    ($($unsigned:ty => $signed:ty),* $(,)?) => {
        $(
            impl Bits for $unsigned {
                const WIDTH: u8 = <$unsigned>::BITS as u8;

                fn is_bit_on(&self, bit_idx: u8) -> bool {
                    debug_assert!(bit_idx < Self::WIDTH);
                    (*self >> bit_idx) & 1 == 1
                }

                fn set_bit(&mut self, bit_idx: u8, value: bool) {
                    debug_assert!(bit_idx < Self::WIDTH);
                    let mask = 1 << bit_idx;
                    if value {
                        *self |= mask;
                    } else {
                        *self &= !mask;
                    }
                }

                fn get_bits(&self, bits_range: RangeInclusive<u8>) -> Self {
                    let start = *bits_range.start();
                    let end = *bits_range.end();
                    debug_assert!(start <= end && end < Self::WIDTH);

                    let length = end - start + 1;
                    let mask = if length == Self::WIDTH {
                        Self::MAX
                    } else {
                        (1 << length) - 1
                    };

                    (*self >> start) & mask
                }

                fn set_bits(&mut self, bits_range: RangeInclusive<u8>, value: Self) {
                    let start = *bits_range.start();
                    let end = *bits_range.end();
                    debug_assert!(start <= end && end < Self::WIDTH);

                    let length = end - start + 1;
                    let mask = if length == Self::WIDTH {
                        Self::MAX
                    } else {
                        (1 << length) - 1
                    };

                    *self = (*self & !(mask << start)) | ((value & mask) << start);
                }

                fn get_byte(&self, byte_nth: u8) -> u8 {
                    debug_assert!(byte_nth < Self::WIDTH / 8);
                    (*self >> (byte_nth * 8)) as u8
                }

                fn sign_extended(&self, number_of_bits: u8) -> Self {
                    debug_assert!(number_of_bits > 0 && number_of_bits <= Self::WIDTH);

                    // Move the field's sign bit up to the msb, then let the
                    // arithmetic shift drag it back down across the high bits.
                    let unused = Self::WIDTH - number_of_bits;
                    (((*self << unused) as $signed) >> unused) as $unsigned
                }
            }
        )*
    };
}

impl_bits!(u32 => i32, u64 => i64);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::Rng;

    #[test]
    fn test_is_on() {
        let b = 0b1_1001_1101_u32;
        assert!(b.is_bit_on(0));
        assert!(!b.is_bit_on(1));
        assert!(b.is_bit_on(2));
        assert!(b.is_bit_on(3));
        assert!(b.is_bit_on(8));
        assert!(!b.is_bit_on(31));
    }

    #[test]
    fn test_is_off() {
        let b = 0b1_1001_1101_u32;
        assert!(!b.is_bit_off(0));
        assert!(b.is_bit_off(1));
        assert!(b.is_bit_off(31));
    }

    #[test]
    fn set_bit() {
        let mut b = 0b110_0110_u32;
        b.set_bit(0, true);
        b.set_bit(1, true);
        b.set_bit(2, false);
        b.set_bit(3, false);
        assert_eq!(b, 0b110_0011);

        b.set_bit(31, true);
        assert_eq!(b, 0x8000_0063);
    }

    #[test]
    fn get_bits() {
        let b = 0b10_1100_1110_u32;
        assert_eq!(b.get_bits(0..=3), 0b1110);
        assert_eq!(b.get_bits(1..=1), 0b1);
        assert_eq!(b.get_bits(4..=7), 0b1100);
        assert_eq!(b.get_bits(8..=9), 0b10);
        assert_eq!(b.get_bits(0..=31), 0b10_1100_1110);
        assert_eq!(b.get_bits(28..=31), 0b0);
    }

    #[test]
    fn get_bits_straddling_byte_boundaries() {
        let word = 0xE280_0C7E_u32;
        assert_eq!(word.get_bits(28..=31), 0xE);
        assert_eq!(word.get_bits(20..=27), 0x28);
        assert_eq!(word.get_bits(8..=11), 0xC);
        assert_eq!(word.get_bits(0..=7), 0x7E);
        assert_eq!(word.get_bits(0..=3), 0xE);
    }

    #[test]
    fn get_bits_u64() {
        let wide = 0x8000_0001_0000_0002_u64;
        assert_eq!(wide.get_bits(32..=63), 0x8000_0001);
        assert_eq!(wide.get_bits(0..=31), 0x2);
        assert!(wide.get_bit(63));
    }

    #[test]
    fn set_bits() {
        let mut b = 0b1000_1001_u32;
        b.set_bits(4..=5, 0b11);
        assert_eq!(b, 0b1011_1001);
        b.set_bits(1..=2, 0b11);
        assert_eq!(b, 0b1011_1111);

        let mut b = 0_u32;
        b.set_bits(28..=31, 0b1110);
        b.set_bits(0..=7, 0x1FF);
        assert_eq!(b, 0xE000_00FF);
    }

    #[test]
    fn random_set_then_get() {
        let mut rng = rand::thread_rng();
        for _ in 0..256 {
            let start = rng.gen_range(0..32_u8);
            let end = rng.gen_range(start..32_u8);
            let value: u32 = rng.r#gen();
            let mut word: u32 = rng.r#gen();

            word.set_bits(start..=end, value);
            let length = end - start + 1;
            let expected = if length == 32 {
                value
            } else {
                value & ((1 << length) - 1)
            };
            assert_eq!(word.get_bits(start..=end), expected);
        }
    }

    #[test]
    fn are_bits_on() {
        let b = 0b10_1100_1110_u32;
        assert!(!b.are_bits_on(0..=3));
        assert!(b.are_bits_on(1..=3));
    }

    #[test]
    fn get_byte() {
        let b: u32 = 0x0122_0448;

        assert_eq!(b.get_byte(0), 0x48);
        assert_eq!(b.get_byte(1), 0x04);
        assert_eq!(b.get_byte(2), 0x22);
        assert_eq!(b.get_byte(3), 0x01);
    }

    #[test]
    fn check_sign_extended() {
        let a: u32 = 0b1001; // -7 in i4
        assert_eq!(a.sign_extended(4) as i32, -7);

        let positive: u32 = 0b0111;
        assert_eq!(positive.sign_extended(4), 7);

        let branch_offset: u32 = 0x00FF_FFFF << 2;
        assert_eq!(branch_offset.sign_extended(26) as i32, -4);

        let full: u32 = 0x8000_0000;
        assert_eq!(full.sign_extended(32), full);
    }
}
