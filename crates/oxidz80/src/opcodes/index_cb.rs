use crate::alu::{BitIndex, ShiftOp};
use crate::error::CpuError;
use crate::instruction::Handler;
use crate::opcodes::IndexRegister;
use crate::registers::Operand;
use crate::state::Context;
use crate::table::InstructionTable;

// ============================================================================
//  DD CB d op / FD CB d op
// ============================================================================
//
// Every opcode operates on (IX+d). A register field other than 6 also
// receives the result (undocumented); BIT ignores the register field.

const SHIFT_IX: [&str; 8] = [
    "RLC (IX+d)", "RRC (IX+d)", "RL (IX+d)", "RR (IX+d)", "SLA (IX+d)", "SRA (IX+d)", "SLL (IX+d)",
    "SRL (IX+d)",
];
const SHIFT_IY: [&str; 8] = [
    "RLC (IY+d)", "RRC (IY+d)", "RL (IY+d)", "RR (IY+d)", "SLA (IY+d)", "SRA (IY+d)", "SLL (IY+d)",
    "SRL (IY+d)",
];

pub(crate) fn register<X: IndexRegister>(t: &mut InstructionTable) -> Result<(), CpuError> {
    let kind = X::CB_TABLE;
    for opcode in 0..=255u8 {
        let (name, cycles, handler) = match opcode >> 6 {
            0 => {
                let op = ((opcode >> 3) & 7) as usize;
                (X::pick(SHIFT_IX[op], SHIFT_IY[op]), 23, shift::<X> as Handler)
            }
            1 => (X::pick("BIT b,(IX+d)", "BIT b,(IY+d)"), 20, test_bit::<X> as Handler),
            2 => (X::pick("RES b,(IX+d)", "RES b,(IY+d)"), 23, reset_bit::<X> as Handler),
            _ => (X::pick("SET b,(IX+d)", "SET b,(IY+d)"), 23, set_bit::<X> as Handler),
        };
        t.add_special_cb(kind, opcode, name, cycles, handler)?;
    }
    Ok(())
}

fn target<X: IndexRegister>(ctx: &Context<'_>) -> u16 {
    X::pair(&ctx.state.registers).indexed_address(ctx.displacement)
}

/// Undocumented copy of the memory result into B, C, D, E, H, L or A.
fn copy_to_register(ctx: &mut Context<'_>, value: u8) {
    if let Operand::Register(reg) = Operand::source(ctx.opcode) {
        ctx.set8(reg, value);
    }
}

fn shift<X: IndexRegister>(ctx: &mut Context<'_>) {
    let address = target::<X>(ctx);
    let value = ctx.read(address);
    let op = ShiftOp::from_opcode(ctx.opcode);
    let result = ctx.regs().shift(op, value);
    ctx.write(address, result);
    copy_to_register(ctx, result);
}

fn test_bit<X: IndexRegister>(ctx: &mut Context<'_>) {
    let address = target::<X>(ctx);
    let value = ctx.read(address);
    let bit = BitIndex::from_opcode(ctx.opcode);
    // X/Y leak from the high byte of IX+d.
    ctx.regs().test_bit(bit, value, (address >> 8) as u8);
}

fn reset_bit<X: IndexRegister>(ctx: &mut Context<'_>) {
    let bit = BitIndex::from_opcode(ctx.opcode);
    let offset = ctx.displacement;
    let value =
        X::pair(&ctx.state.registers).reset_bit_by_register_location(ctx.memory, bit, offset);
    copy_to_register(ctx, value);
}

fn set_bit<X: IndexRegister>(ctx: &mut Context<'_>) {
    let bit = BitIndex::from_opcode(ctx.opcode);
    let offset = ctx.displacement;
    let value =
        X::pair(&ctx.state.registers).set_bit_by_register_location(ctx.memory, bit, offset);
    copy_to_register(ctx, value);
}
