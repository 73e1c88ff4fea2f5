use bitflags::bitflags;

// ============================================================================
//  FLAGS REGISTER (F)
// ============================================================================

bitflags! {
    /// Low byte of AF. Bits 3 and 5 are undocumented copies of result bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: u8 {
        const SIGN            = 0x80;
        const ZERO            = 0x40;
        const Y               = 0x20; // Copy of bit 5
        const HALF_CARRY      = 0x10;
        const X               = 0x08; // Copy of bit 3
        const PARITY_OVERFLOW = 0x04;
        const ADD_SUBTRACT    = 0x02;
        const CARRY           = 0x01;
    }
}

const fn build_parity_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).count_ones() % 2 == 0;
        i += 1;
    }
    table
}

const PARITY_TABLE: [bool; 256] = build_parity_table();

/// True when the byte has an even number of set bits.
#[inline(always)]
pub fn parity_even(value: u8) -> bool {
    PARITY_TABLE[value as usize]
}

/// Carry out of bit 3, valid for add and subtract (with or without carry-in).
#[inline(always)]
pub fn half_carry(a: u8, operand: u8, result: u8) -> bool {
    ((a ^ result ^ operand) & 0x10) != 0
}

/// Carry out of bit 11 for 16-bit arithmetic.
#[inline(always)]
pub fn half_carry16(a: u16, operand: u16, result: u16) -> bool {
    ((a ^ result ^ operand) & 0x1000) != 0
}

#[inline(always)]
pub fn overflow_add(a: u8, operand: u8, result: u8) -> bool {
    ((a ^ operand ^ 0x80) & (a ^ result) & 0x80) != 0
}

#[inline(always)]
pub fn overflow_sub(a: u8, operand: u8, result: u8) -> bool {
    ((a ^ operand) & (a ^ result) & 0x80) != 0
}

#[inline(always)]
pub fn overflow_add16(a: u16, operand: u16, result: u16) -> bool {
    ((a ^ operand ^ 0x8000) & (a ^ result) & 0x8000) != 0
}

#[inline(always)]
pub fn overflow_sub16(a: u16, operand: u16, result: u16) -> bool {
    ((a ^ operand) & (a ^ result) & 0x8000) != 0
}

impl Flags {
    /// S, Z and the undocumented X/Y copies taken from `value`.
    pub fn sign_zero_xy(value: u8) -> Self {
        let mut f = Flags::from_bits_retain(value & (Flags::SIGN | Flags::X | Flags::Y).bits());
        f.set(Flags::ZERO, value == 0);
        f
    }

    /// S, Z, X/Y and even parity: the result flags of AND/OR/XOR, rotates and IN.
    pub fn logic(value: u8) -> Self {
        let mut f = Self::sign_zero_xy(value);
        f.set(Flags::PARITY_OVERFLOW, parity_even(value));
        f
    }

    /// Replaces X/Y with bits 3 and 5 of `source`.
    pub fn with_xy(self, source: u8) -> Self {
        let xy = Flags::X | Flags::Y;
        (self - xy) | Flags::from_bits_retain(source & xy.bits())
    }

    pub fn carry(self) -> bool {
        self.contains(Flags::CARRY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_matches_popcount() {
        assert!(parity_even(0x00));
        assert!(!parity_even(0x01));
        assert!(parity_even(0x03));
        assert!(parity_even(0xFF));
        assert!(!parity_even(0x7F));
    }

    #[test]
    fn overflow_predicates() {
        // 0x7F + 0x01 overflows into the sign bit
        assert!(overflow_add(0x7F, 0x01, 0x80));
        assert!(!overflow_add(0x7F, 0xFF, 0x7E));
        // 0x80 - 0x01 = 0x7F overflows
        assert!(overflow_sub(0x80, 0x01, 0x7F));
        assert!(!overflow_sub(0x01, 0x01, 0x00));
    }

    #[test]
    fn logic_flags() {
        let f = Flags::logic(0x00);
        assert_eq!(f, Flags::ZERO | Flags::PARITY_OVERFLOW);
        let f = Flags::logic(0xA8);
        assert_eq!(f, Flags::SIGN | Flags::Y | Flags::X);
    }
}
