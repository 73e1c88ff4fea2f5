use std::ops::{Deref, DerefMut};

use crate::flags::Flags;

// ============================================================================
//  REGISTER PAIRS
// ============================================================================

/// 16-bit register addressable as a word or as two bytes.
/// Stored as the word, so `word == (high << 8) | low` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterPair {
    word: u16,
}

impl RegisterPair {
    pub const fn new(word: u16) -> Self {
        Self { word }
    }

    #[inline(always)]
    pub fn word(&self) -> u16 {
        self.word
    }

    #[inline(always)]
    pub fn high(&self) -> u8 {
        (self.word >> 8) as u8
    }

    #[inline(always)]
    pub fn low(&self) -> u8 {
        (self.word & 0xFF) as u8
    }

    #[inline(always)]
    pub fn set(&mut self, word: u16) {
        self.word = word;
    }

    #[inline(always)]
    pub fn set_high(&mut self, value: u8) {
        self.word = (self.word & 0x00FF) | ((value as u16) << 8);
    }

    #[inline(always)]
    pub fn set_low(&mut self, value: u8) {
        self.word = (self.word & 0xFF00) | value as u16;
    }

    /// INC rr: wraps, touches no flags.
    pub fn increment(&mut self) {
        self.word = self.word.wrapping_add(1);
    }

    /// DEC rr: wraps, touches no flags.
    pub fn decrement(&mut self) {
        self.word = self.word.wrapping_sub(1);
    }
}

/// AF/BC/DE/HL carry an alternate bank swapped by EX AF,AF' and EXX.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadowableRegisterPair {
    active: RegisterPair,
    shadow: RegisterPair,
}

impl ShadowableRegisterPair {
    pub fn shadow(&self) -> RegisterPair {
        self.shadow
    }

    pub fn set_shadow(&mut self, word: u16) {
        self.shadow.set(word);
    }

    pub fn swap_with_shadow(&mut self) {
        std::mem::swap(&mut self.active, &mut self.shadow);
    }
}

impl Deref for ShadowableRegisterPair {
    type Target = RegisterPair;

    fn deref(&self) -> &RegisterPair {
        &self.active
    }
}

impl DerefMut for ShadowableRegisterPair {
    fn deref_mut(&mut self) -> &mut RegisterPair {
        &mut self.active
    }
}

// ============================================================================
//  REGISTER SELECTORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    Ixh,
    Ixl,
    Iyh,
    Iyl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg16 {
    Af,
    Bc,
    De,
    Hl,
    Ix,
    Iy,
    Sp,
}

/// A 3-bit register-select field: a register, or `(HL)` for field 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Register(Reg8),
    Memory,
}

impl Operand {
    /// {0:B, 1:C, 2:D, 3:E, 4:H, 5:L, 6:(HL), 7:A}
    pub fn decode(field: u8) -> Self {
        match field & 7 {
            0 => Operand::Register(Reg8::B),
            1 => Operand::Register(Reg8::C),
            2 => Operand::Register(Reg8::D),
            3 => Operand::Register(Reg8::E),
            4 => Operand::Register(Reg8::H),
            5 => Operand::Register(Reg8::L),
            6 => Operand::Memory,
            _ => Operand::Register(Reg8::A),
        }
    }

    /// Source field: bits 0-2 of the opcode.
    pub fn source(opcode: u8) -> Self {
        Self::decode(opcode)
    }

    /// Destination field: bits 3-5 of the opcode.
    pub fn destination(opcode: u8) -> Self {
        Self::decode(opcode >> 3)
    }
}

/// BC, DE, HL, SP selected by bits 4-5 (LD rr,nn / INC rr / ADD HL,rr ...).
pub fn decode_pair_sp(opcode: u8) -> Reg16 {
    match (opcode >> 4) & 3 {
        0 => Reg16::Bc,
        1 => Reg16::De,
        2 => Reg16::Hl,
        _ => Reg16::Sp,
    }
}

/// BC, DE, HL, AF selected by bits 4-5 (PUSH/POP).
pub fn decode_pair_af(opcode: u8) -> Reg16 {
    match (opcode >> 4) & 3 {
        0 => Reg16::Bc,
        1 => Reg16::De,
        2 => Reg16::Hl,
        _ => Reg16::Af,
    }
}

// ============================================================================
//  REGISTER FILE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    pub af: ShadowableRegisterPair,
    pub bc: ShadowableRegisterPair,
    pub de: ShadowableRegisterPair,
    pub hl: ShadowableRegisterPair,
    pub ix: RegisterPair,
    pub iy: RegisterPair,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,
}

impl Registers {
    #[inline(always)]
    pub fn a(&self) -> u8 {
        self.af.high()
    }

    #[inline(always)]
    pub fn set_a(&mut self, value: u8) {
        self.af.set_high(value);
    }

    #[inline(always)]
    pub fn flags(&self) -> Flags {
        Flags::from_bits_retain(self.af.low())
    }

    #[inline(always)]
    pub fn set_flags(&mut self, flags: Flags) {
        self.af.set_low(flags.bits());
    }

    #[inline(always)]
    pub fn flag(&self, flag: Flags) -> bool {
        self.flags().contains(flag)
    }

    pub fn get8(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::A => self.af.high(),
            Reg8::B => self.bc.high(),
            Reg8::C => self.bc.low(),
            Reg8::D => self.de.high(),
            Reg8::E => self.de.low(),
            Reg8::H => self.hl.high(),
            Reg8::L => self.hl.low(),
            Reg8::Ixh => self.ix.high(),
            Reg8::Ixl => self.ix.low(),
            Reg8::Iyh => self.iy.high(),
            Reg8::Iyl => self.iy.low(),
        }
    }

    pub fn set8(&mut self, reg: Reg8, value: u8) {
        match reg {
            Reg8::A => self.af.set_high(value),
            Reg8::B => self.bc.set_high(value),
            Reg8::C => self.bc.set_low(value),
            Reg8::D => self.de.set_high(value),
            Reg8::E => self.de.set_low(value),
            Reg8::H => self.hl.set_high(value),
            Reg8::L => self.hl.set_low(value),
            Reg8::Ixh => self.ix.set_high(value),
            Reg8::Ixl => self.ix.set_low(value),
            Reg8::Iyh => self.iy.set_high(value),
            Reg8::Iyl => self.iy.set_low(value),
        }
    }

    pub fn get16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::Af => self.af.word(),
            Reg16::Bc => self.bc.word(),
            Reg16::De => self.de.word(),
            Reg16::Hl => self.hl.word(),
            Reg16::Ix => self.ix.word(),
            Reg16::Iy => self.iy.word(),
            Reg16::Sp => self.sp,
        }
    }

    pub fn set16(&mut self, reg: Reg16, value: u16) {
        match reg {
            Reg16::Af => self.af.set(value),
            Reg16::Bc => self.bc.set(value),
            Reg16::De => self.de.set(value),
            Reg16::Hl => self.hl.set(value),
            Reg16::Ix => self.ix.set(value),
            Reg16::Iy => self.iy.set(value),
            Reg16::Sp => self.sp = value,
        }
    }

    /// EXX: BC, DE and HL swap with their shadows. AF is left alone.
    pub fn exchange_all(&mut self) {
        self.bc.swap_with_shadow();
        self.de.swap_with_shadow();
        self.hl.swap_with_shadow();
    }

    /// R counts the low 7 bits; bit 7 only changes through LD R,A.
    pub fn increment_refresh(&mut self, count: u8) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(count) & 0x7F);
    }
}
