use crate::alu::{BitIndex, ShiftOp};
use crate::error::CpuError;
use crate::registers::Operand;
use crate::state::Context;
use crate::table::{Field, InstructionTable, TableKind};

// ============================================================================
//  CB TABLE: rotates, shifts and single-bit operations
// ============================================================================

pub(crate) fn register(t: &mut InstructionTable) -> Result<(), CpuError> {
    const CB: TableKind = TableKind::Cb;
    let shifts = ["RLC r", "RRC r", "RL r", "RR r", "SLA r", "SRA r", "SLL r", "SRL r"];
    for (op, name) in shifts.into_iter().enumerate() {
        t.add_with_mask(CB, (op as u8) << 3, Field::Source, name, 8, Some(15), shift)?;
    }
    for bit in 0..8u8 {
        t.add_with_mask(CB, 0x40 | (bit << 3), Field::Source, "BIT b,r", 8, Some(12), test_bit)?;
        t.add_with_mask(CB, 0x80 | (bit << 3), Field::Source, "RES b,r", 8, Some(15), reset_bit)?;
        t.add_with_mask(CB, 0xC0 | (bit << 3), Field::Source, "SET b,r", 8, Some(15), set_bit)?;
    }
    Ok(())
}

fn shift(ctx: &mut Context<'_>) {
    let operand = Operand::source(ctx.opcode);
    let value = ctx.read_operand(operand);
    let op = ShiftOp::from_opcode(ctx.opcode);
    let result = ctx.regs().shift(op, value);
    ctx.write_operand(operand, result);
}

fn test_bit(ctx: &mut Context<'_>) {
    let operand = Operand::source(ctx.opcode);
    let value = ctx.read_operand(operand);
    // BIT b,(HL) leaks the high byte of the address into X/Y.
    let xy_source = match operand {
        Operand::Memory => ctx.state.registers.hl.high(),
        Operand::Register(_) => value,
    };
    let bit = BitIndex::from_opcode(ctx.opcode);
    ctx.regs().test_bit(bit, value, xy_source);
}

fn reset_bit(ctx: &mut Context<'_>) {
    let operand = Operand::source(ctx.opcode);
    let value = BitIndex::from_opcode(ctx.opcode).reset(ctx.read_operand(operand));
    ctx.write_operand(operand, value);
}

fn set_bit(ctx: &mut Context<'_>) {
    let operand = Operand::source(ctx.opcode);
    let value = BitIndex::from_opcode(ctx.opcode).set(ctx.read_operand(operand));
    ctx.write_operand(operand, value);
}
