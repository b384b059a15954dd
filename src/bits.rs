//! Bit-field helpers for control registers.

/// Clear the bits selected by `field` in `byte`, then OR in `value & field`.
/// Bits outside `field` are left untouched.
pub fn replace_field(byte: u8, field: u8, value: u8) -> u8 {
    (byte & !field) | (value & field)
}

/// Extract the bits selected by `field`, still in place.
pub fn get_field(byte: u8, field: u8) -> u8 {
    byte & field
}

pub fn set_bits(byte: u8, bits: u8) -> u8 {
    byte | bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacing_low_field_keeps_high_bits() {
        assert_eq!(replace_field(0b1011_0101, 0b0000_1111, 0b0000_0001), 0b1011_0001);
        assert_eq!(replace_field(0b1011_0101, 0b0001_1111, 0b0000_0001), 0b1010_0001);
    }

    #[test]
    fn value_outside_field_is_masked() {
        assert_eq!(replace_field(0x00, 0x30, 0xFF), 0x30);
        assert_eq!(replace_field(0xFF, 0x18, 0x00), 0xE7);
    }

    #[test]
    fn get_field_keeps_position() {
        assert_eq!(get_field(0b1011_0101, 0x30), 0x30);
        assert_eq!(get_field(0b1011_0101, 0xE0), 0xA0);
    }

    #[test]
    fn set_bits_is_or() {
        assert_eq!(set_bits(0x01, 0x80), 0x81);
    }
}
