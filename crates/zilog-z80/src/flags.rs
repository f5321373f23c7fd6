//! Z80 flag register bits.

/// Sign flag (bit 7) - set if result is negative.
pub const SF: u8 = 0b1000_0000;

/// Zero flag (bit 6) - set if result is zero.
pub const ZF: u8 = 0b0100_0000;

/// Undocumented flag (bit 5) - usually a copy of bit 5 of the result.
pub const YF: u8 = 0b0010_0000;

/// Half-carry flag (bit 4) - carry from bit 3 to bit 4.
pub const HF: u8 = 0b0001_0000;

/// Undocumented flag (bit 3) - usually a copy of bit 3 of the result.
pub const XF: u8 = 0b0000_1000;

/// Parity/Overflow flag (bit 2) - parity or overflow depending on instruction.
pub const PF: u8 = 0b0000_0100;

/// Add/Subtract flag (bit 1) - set if last operation was subtraction.
pub const NF: u8 = 0b0000_0010;

/// Carry flag (bit 0) - carry out of bit 7.
pub const CF: u8 = 0b0000_0001;

/// Sign, zero and parity: the bits most rotate/shift-of-A ops leave alone.
pub(crate) const SZP: u8 = SF | ZF | PF;

/// Both undocumented bits.
pub(crate) const XY: u8 = YF | XF;

/// True if `value` has an even number of set bits.
#[must_use]
pub const fn parity(value: u8) -> bool {
    value.count_ones() & 1 == 0
}

/// Sign, zero and undocumented bits for a result byte.
#[must_use]
pub const fn sz53(value: u8) -> u8 {
    let mut f = value & (SF | XY);
    if value == 0 {
        f |= ZF;
    }
    f
}

/// [`sz53`] plus parity.
#[must_use]
pub const fn sz53p(value: u8) -> u8 {
    let mut f = sz53(value);
    if parity(value) {
        f |= PF;
    }
    f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_counts_set_bits() {
        assert!(parity(0x00));
        assert!(parity(0x12));
        assert!(!parity(0x01));
        assert!(!parity(0x7F));
    }

    #[test]
    fn sz53p_combines_sign_zero_and_parity() {
        assert_eq!(sz53p(0x00), ZF | PF);
        assert_eq!(sz53p(0x80), SF);
        assert_eq!(sz53p(0x28), YF | XF | PF);
    }
}
