//! Handlers and registration for the seven opcode tables.

pub(crate) mod cb;
pub(crate) mod ed;
pub(crate) mod index;
pub(crate) mod index_cb;
pub(crate) mod main;

use crate::flags::Flags;
use crate::registers::{Operand, Reg16, Reg8, RegisterPair, Registers};
use crate::table::TableKind;

// ============================================================================
//  IX / IY SELECTION
// ============================================================================

/// Compile-time choice between IX (DD prefix) and IY (FD prefix), so one
/// generic handler serves both tables without captured state.
pub trait IndexRegister {
    const TABLE: TableKind;
    const CB_TABLE: TableKind;
    const PAIR: Reg16;
    const HIGH: Reg8;
    const LOW: Reg8;
    const IS_IY: bool;

    fn pair(regs: &Registers) -> &RegisterPair;
    fn pair_mut(regs: &mut Registers) -> &mut RegisterPair;

    /// Picks the mnemonic for this register.
    fn pick(ix: &'static str, iy: &'static str) -> &'static str {
        if Self::IS_IY { iy } else { ix }
    }

    /// H/L in a register field become the index halves.
    fn substitute(operand: Operand) -> Operand {
        match operand {
            Operand::Register(Reg8::H) => Operand::Register(Self::HIGH),
            Operand::Register(Reg8::L) => Operand::Register(Self::LOW),
            other => other,
        }
    }
}

pub struct Ix;
pub struct Iy;

impl IndexRegister for Ix {
    const TABLE: TableKind = TableKind::Dd;
    const CB_TABLE: TableKind = TableKind::DdCb;
    const PAIR: Reg16 = Reg16::Ix;
    const HIGH: Reg8 = Reg8::Ixh;
    const LOW: Reg8 = Reg8::Ixl;
    const IS_IY: bool = false;

    fn pair(regs: &Registers) -> &RegisterPair {
        &regs.ix
    }

    fn pair_mut(regs: &mut Registers) -> &mut RegisterPair {
        &mut regs.ix
    }
}

impl IndexRegister for Iy {
    const TABLE: TableKind = TableKind::Fd;
    const CB_TABLE: TableKind = TableKind::FdCb;
    const PAIR: Reg16 = Reg16::Iy;
    const HIGH: Reg8 = Reg8::Iyh;
    const LOW: Reg8 = Reg8::Iyl;
    const IS_IY: bool = true;

    fn pair(regs: &Registers) -> &RegisterPair {
        &regs.iy
    }

    fn pair_mut(regs: &mut Registers) -> &mut RegisterPair {
        &mut regs.iy
    }
}

// ============================================================================
//  CONDITIONS
// ============================================================================

/// cc field (bits 3-5): NZ, Z, NC, C, PO, PE, P, M.
pub(crate) fn condition(regs: &Registers, cc: u8) -> bool {
    let f = regs.flags();
    match cc & 7 {
        0 => !f.contains(Flags::ZERO),
        1 => f.contains(Flags::ZERO),
        2 => !f.contains(Flags::CARRY),
        3 => f.contains(Flags::CARRY),
        4 => !f.contains(Flags::PARITY_OVERFLOW),
        5 => f.contains(Flags::PARITY_OVERFLOW),
        6 => !f.contains(Flags::SIGN),
        _ => f.contains(Flags::SIGN),
    }
}
