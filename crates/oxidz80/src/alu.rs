use crate::error::CpuError;
use crate::flags::{self, Flags};
use crate::registers::{Reg8, Registers};

// ============================================================================
//  BIT INDEX
// ============================================================================

/// Bit position 0-7 for BIT/SET/RES.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitIndex(u8);

impl BitIndex {
    pub fn new(bit: u8) -> Result<Self, CpuError> {
        if bit > 7 {
            return Err(CpuError::BitIndexOutOfRange(bit));
        }
        Ok(Self(bit))
    }

    /// Bits 3-5 of a CB opcode. Always in range.
    pub fn from_opcode(opcode: u8) -> Self {
        Self((opcode >> 3) & 7)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn mask(self) -> u8 {
        1 << self.0
    }

    pub fn set(self, value: u8) -> u8 {
        value | self.mask()
    }

    pub fn reset(self, value: u8) -> u8 {
        value & !self.mask()
    }
}

// ============================================================================
//  ROTATE / SHIFT FAMILY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    /// Undocumented: shift left, bit 0 filled with 1.
    Sll,
    Srl,
}

impl ShiftOp {
    /// Bits 3-5 of CB opcodes 0x00-0x3F.
    pub fn from_opcode(opcode: u8) -> Self {
        match (opcode >> 3) & 7 {
            0 => ShiftOp::Rlc,
            1 => ShiftOp::Rrc,
            2 => ShiftOp::Rl,
            3 => ShiftOp::Rr,
            4 => ShiftOp::Sla,
            5 => ShiftOp::Sra,
            6 => ShiftOp::Sll,
            _ => ShiftOp::Srl,
        }
    }

    /// Returns (result, bit shifted out).
    pub fn apply(self, value: u8, carry_in: bool) -> (u8, bool) {
        let cin = carry_in as u8;
        match self {
            ShiftOp::Rlc => (value.rotate_left(1), value & 0x80 != 0),
            ShiftOp::Rrc => (value.rotate_right(1), value & 0x01 != 0),
            ShiftOp::Rl => ((value << 1) | cin, value & 0x80 != 0),
            ShiftOp::Rr => ((value >> 1) | (cin << 7), value & 0x01 != 0),
            ShiftOp::Sla => (value << 1, value & 0x80 != 0),
            ShiftOp::Sra => ((value >> 1) | (value & 0x80), value & 0x01 != 0),
            ShiftOp::Sll => ((value << 1) | 0x01, value & 0x80 != 0),
            ShiftOp::Srl => (value >> 1, value & 0x01 != 0),
        }
    }
}

// ============================================================================
//  8-BIT ARITHMETIC
// ============================================================================

impl Registers {
    /// INC on a byte. Carry is preserved.
    pub fn inc8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        let mut f = Flags::sign_zero_xy(result) | (self.flags() & Flags::CARRY);
        f.set(Flags::HALF_CARRY, (value & 0x0F) == 0x0F);
        f.set(Flags::PARITY_OVERFLOW, value == 0x7F);
        self.set_flags(f);
        result
    }

    /// DEC on a byte. Carry is preserved.
    pub fn dec8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        let mut f =
            Flags::sign_zero_xy(result) | (self.flags() & Flags::CARRY) | Flags::ADD_SUBTRACT;
        f.set(Flags::HALF_CARRY, (value & 0x0F) == 0x00);
        f.set(Flags::PARITY_OVERFLOW, value == 0x80);
        self.set_flags(f);
        result
    }

    pub fn increment(&mut self, reg: Reg8) {
        let value = self.inc8(self.get8(reg));
        self.set8(reg, value);
    }

    pub fn decrement(&mut self, reg: Reg8) {
        let value = self.dec8(self.get8(reg));
        self.set8(reg, value);
    }

    /// ADD/ADC A,value
    pub fn add(&mut self, value: u8, with_carry: bool) {
        let a = self.a();
        let carry = (with_carry && self.flags().carry()) as u16;
        let wide = a as u16 + value as u16 + carry;
        let result = wide as u8;
        let mut f = Flags::sign_zero_xy(result);
        f.set(Flags::HALF_CARRY, flags::half_carry(a, value, result));
        f.set(Flags::PARITY_OVERFLOW, flags::overflow_add(a, value, result));
        f.set(Flags::CARRY, wide > 0xFF);
        self.set_flags(f);
        self.set_a(result);
    }

    /// SUB/SBC A,value
    pub fn subtract(&mut self, value: u8, with_carry: bool) {
        let result = self.subtract_flags(value, with_carry);
        self.set_a(result);
    }

    /// CP value: SUB without storing; X/Y come from the operand.
    pub fn compare(&mut self, value: u8) {
        self.subtract_flags(value, false);
        let f = self.flags().with_xy(value);
        self.set_flags(f);
    }

    fn subtract_flags(&mut self, value: u8, with_carry: bool) -> u8 {
        let a = self.a();
        let carry = (with_carry && self.flags().carry()) as i16;
        let wide = a as i16 - value as i16 - carry;
        let result = wide as u8;
        let mut f = Flags::sign_zero_xy(result) | Flags::ADD_SUBTRACT;
        f.set(Flags::HALF_CARRY, flags::half_carry(a, value, result));
        f.set(Flags::PARITY_OVERFLOW, flags::overflow_sub(a, value, result));
        f.set(Flags::CARRY, wide < 0);
        self.set_flags(f);
        result
    }

    pub fn and(&mut self, value: u8) {
        let result = self.a() & value;
        self.set_a(result);
        self.set_flags(Flags::logic(result) | Flags::HALF_CARRY);
    }

    pub fn or(&mut self, value: u8) {
        let result = self.a() | value;
        self.set_a(result);
        self.set_flags(Flags::logic(result));
    }

    pub fn xor(&mut self, value: u8) {
        let result = self.a() ^ value;
        self.set_a(result);
        self.set_flags(Flags::logic(result));
    }

    /// The eight ALU operations selected by bits 3-5 of 0x80-0xBF / 0xC6-0xFE.
    pub fn alu_by_opcode(&mut self, opcode: u8, value: u8) {
        match (opcode >> 3) & 7 {
            0 => self.add(value, false),
            1 => self.add(value, true),
            2 => self.subtract(value, false),
            3 => self.subtract(value, true),
            4 => self.and(value),
            5 => self.xor(value),
            6 => self.or(value),
            _ => self.compare(value),
        }
    }

    /// NEG: A = 0 - A
    pub fn negate(&mut self) {
        let value = self.a();
        self.set_a(0);
        self.subtract(value, false);
    }

    /// DAA, four-branch BCD correction.
    pub fn decimal_adjust_accumulator(&mut self) {
        let a = self.a();
        let f = self.flags();
        let subtract = f.contains(Flags::ADD_SUBTRACT);
        let mut correction = 0u8;
        let mut carry = f.carry();

        if f.contains(Flags::HALF_CARRY) || (a & 0x0F) > 9 {
            correction |= 0x06;
        }
        if carry || a > 0x99 {
            correction |= 0x60;
            carry = true;
        }

        let result = if subtract {
            a.wrapping_sub(correction)
        } else {
            a.wrapping_add(correction)
        };

        let mut nf = Flags::logic(result) | (f & Flags::ADD_SUBTRACT);
        nf.set(Flags::HALF_CARRY, ((a ^ result) & 0x10) != 0);
        nf.set(Flags::CARRY, carry);
        self.set_flags(nf);
        self.set_a(result);
    }

    /// CPL
    pub fn complement(&mut self) {
        let result = !self.a();
        self.set_a(result);
        let f = (self.flags() | Flags::HALF_CARRY | Flags::ADD_SUBTRACT).with_xy(result);
        self.set_flags(f);
    }

    /// SCF
    pub fn set_carry_flag(&mut self) {
        let keep = self.flags() & (Flags::SIGN | Flags::ZERO | Flags::PARITY_OVERFLOW);
        self.set_flags((keep | Flags::CARRY).with_xy(self.a()));
    }

    /// CCF: H takes the old carry.
    pub fn complement_carry_flag(&mut self) {
        let f = self.flags();
        let mut nf = f & (Flags::SIGN | Flags::ZERO | Flags::PARITY_OVERFLOW);
        nf.set(Flags::HALF_CARRY, f.carry());
        nf.set(Flags::CARRY, !f.carry());
        self.set_flags(nf.with_xy(self.a()));
    }

    // ------------------------------------------------------------------------
    //  Rotates / shifts
    // ------------------------------------------------------------------------

    /// CB-prefixed rotate/shift: full flag update.
    pub fn shift(&mut self, op: ShiftOp, value: u8) -> u8 {
        let (result, out) = op.apply(value, self.flags().carry());
        let mut f = Flags::logic(result);
        f.set(Flags::CARRY, out);
        self.set_flags(f);
        result
    }

    /// RLCA/RRCA/RLA/RRA: only H, N, C and X/Y change.
    pub fn shift_accumulator(&mut self, op: ShiftOp) {
        let (result, out) = op.apply(self.a(), self.flags().carry());
        self.set_a(result);
        let mut f = self.flags() & (Flags::SIGN | Flags::ZERO | Flags::PARITY_OVERFLOW);
        f.set(Flags::CARRY, out);
        self.set_flags(f.with_xy(result));
    }

    /// RLD: rotate the nibbles of A's low half and (HL) left. Returns the new (HL).
    pub fn rotate_left_digit(&mut self, memory_value: u8) -> u8 {
        let a = self.a();
        let result = (memory_value << 4) | (a & 0x0F);
        let new_a = (a & 0xF0) | (memory_value >> 4);
        self.set_a(new_a);
        self.set_flags(Flags::logic(new_a) | (self.flags() & Flags::CARRY));
        result
    }

    /// RRD: rotate the nibbles right. Returns the new (HL).
    pub fn rotate_right_digit(&mut self, memory_value: u8) -> u8 {
        let a = self.a();
        let result = (memory_value >> 4) | ((a & 0x0F) << 4);
        let new_a = (a & 0xF0) | (memory_value & 0x0F);
        self.set_a(new_a);
        self.set_flags(Flags::logic(new_a) | (self.flags() & Flags::CARRY));
        result
    }

    /// BIT b,value. X/Y come from `xy_source` (the operand, H for (HL), or the
    /// high byte of IX+d).
    pub fn test_bit(&mut self, bit: BitIndex, value: u8, xy_source: u8) {
        let set = value & bit.mask() != 0;
        let mut f = (self.flags() & Flags::CARRY) | Flags::HALF_CARRY;
        f.set(Flags::ZERO | Flags::PARITY_OVERFLOW, !set);
        f.set(Flags::SIGN, bit.get() == 7 && set);
        self.set_flags(f.with_xy(xy_source));
    }

    // ------------------------------------------------------------------------
    //  16-bit arithmetic
    // ------------------------------------------------------------------------

    /// ADD rr,rr: H from bit 11, C from bit 15; S/Z/P untouched.
    pub fn add16(&mut self, lhs: u16, rhs: u16) -> u16 {
        let wide = lhs as u32 + rhs as u32;
        let result = wide as u16;
        let mut f = self.flags() & (Flags::SIGN | Flags::ZERO | Flags::PARITY_OVERFLOW);
        f.set(Flags::HALF_CARRY, flags::half_carry16(lhs, rhs, result));
        f.set(Flags::CARRY, wide > 0xFFFF);
        self.set_flags(f.with_xy((result >> 8) as u8));
        result
    }

    /// ADC HL,rr
    pub fn add16_with_carry(&mut self, lhs: u16, rhs: u16) -> u16 {
        let carry = self.flags().carry() as u32;
        let wide = lhs as u32 + rhs as u32 + carry;
        let result = wide as u16;
        let mut f = Flags::sign_zero_xy((result >> 8) as u8);
        f.set(Flags::ZERO, result == 0);
        f.set(Flags::HALF_CARRY, flags::half_carry16(lhs, rhs, result));
        f.set(Flags::PARITY_OVERFLOW, flags::overflow_add16(lhs, rhs, result));
        f.set(Flags::CARRY, wide > 0xFFFF);
        self.set_flags(f);
        result
    }

    /// SBC HL,rr
    pub fn subtract16_with_carry(&mut self, lhs: u16, rhs: u16) -> u16 {
        let carry = self.flags().carry() as i32;
        let wide = lhs as i32 - rhs as i32 - carry;
        let result = wide as u16;
        let mut f = Flags::sign_zero_xy((result >> 8) as u8) | Flags::ADD_SUBTRACT;
        f.set(Flags::ZERO, result == 0);
        f.set(Flags::HALF_CARRY, flags::half_carry16(lhs, rhs, result));
        f.set(Flags::PARITY_OVERFLOW, flags::overflow_sub16(lhs, rhs, result));
        f.set(Flags::CARRY, wide < 0);
        self.set_flags(f);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs_with_a(a: u8) -> Registers {
        let mut regs = Registers::default();
        regs.set_a(a);
        regs
    }

    #[test]
    fn inc_dec_boundaries() {
        let mut regs = Registers::default();
        regs.set_flags(Flags::CARRY);
        assert_eq!(regs.inc8(0x7F), 0x80);
        let f = regs.flags();
        assert!(f.contains(
            Flags::SIGN | Flags::HALF_CARRY | Flags::PARITY_OVERFLOW | Flags::CARRY
        ));
        assert!(!f.contains(Flags::ADD_SUBTRACT));

        assert_eq!(regs.dec8(0x80), 0x7F);
        let f = regs.flags();
        assert!(f.contains(
            Flags::HALF_CARRY | Flags::PARITY_OVERFLOW | Flags::ADD_SUBTRACT | Flags::CARRY
        ));
        assert!(!f.contains(Flags::SIGN));

        assert_eq!(regs.dec8(0x01), 0x00);
        assert!(regs.flag(Flags::ZERO));
    }

    #[test]
    fn add_and_subtract() {
        let mut regs = regs_with_a(0xFF);
        regs.add(0x01, false);
        assert_eq!(regs.a(), 0x00);
        assert!(regs.flags().contains(Flags::ZERO | Flags::HALF_CARRY | Flags::CARRY));

        let mut regs = regs_with_a(0x10);
        regs.set_flags(Flags::CARRY);
        regs.subtract(0x01, true);
        assert_eq!(regs.a(), 0x0E);
        assert!(regs.flags().contains(Flags::HALF_CARRY | Flags::ADD_SUBTRACT));
        assert!(!regs.flags().carry());
    }

    #[test]
    fn compare_keeps_accumulator() {
        let mut regs = regs_with_a(0x20);
        regs.compare(0x28);
        assert_eq!(regs.a(), 0x20);
        assert!(regs.flags().carry());
        assert!(regs.flags().contains(Flags::X | Flags::Y));
    }

    #[test]
    fn daa_corrects_bcd() {
        let mut regs = regs_with_a(0x99);
        regs.add(0x01, false);
        regs.decimal_adjust_accumulator();
        assert_eq!(regs.a(), 0x00);
        assert!(regs.flags().carry());

        let mut regs = regs_with_a(0x05);
        regs.add(0x05, false);
        regs.decimal_adjust_accumulator();
        assert_eq!(regs.a(), 0x10);

        let mut regs = regs_with_a(0x00);
        regs.subtract(0x01, false);
        regs.decimal_adjust_accumulator();
        assert_eq!(regs.a(), 0x99);
        assert!(regs.flags().carry());
    }

    #[test]
    fn sll_fills_bit_zero() {
        let mut regs = Registers::default();
        assert_eq!(regs.shift(ShiftOp::Sll, 0x80), 0x01);
        assert!(regs.flags().carry());
        assert_eq!(regs.shift(ShiftOp::Sra, 0x81), 0xC0);
        assert!(regs.flags().carry());
    }

    #[test]
    fn bit_index_range() {
        assert!(BitIndex::new(7).is_ok());
        assert!(matches!(BitIndex::new(8), Err(CpuError::BitIndexOutOfRange(8))));
        assert_eq!(BitIndex::from_opcode(0x86).get(), 0);
        assert_eq!(BitIndex::from_opcode(0xFE).get(), 7);
    }

    #[test]
    fn sixteen_bit_carry_out_of_bit_eleven() {
        let mut regs = Registers::default();
        assert_eq!(regs.add16(0x0FFF, 0x0001), 0x1000);
        assert!(regs.flag(Flags::HALF_CARRY));
        assert!(!regs.flags().carry());

        regs.set_flags(Flags::CARRY);
        assert_eq!(regs.subtract16_with_carry(0x0000, 0x0000), 0xFFFF);
        assert!(regs.flags().contains(Flags::SIGN | Flags::CARRY | Flags::ADD_SUBTRACT));
    }
}
