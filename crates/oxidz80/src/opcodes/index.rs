//! DD and FD tables. Every handler is generic over [`IndexRegister`] and is
//! registered once per prefix.

use crate::cycles::Cycles;
use crate::error::CpuError;
use crate::opcodes::IndexRegister;
use crate::registers::{decode_pair_sp, Operand, Reg16};
use crate::state::Context;
use crate::table::InstructionTable;

const ALU_HALF_IX: [&str; 8] = [
    "ADD A,IXp", "ADC A,IXp", "SUB IXp", "SBC A,IXp", "AND IXp", "XOR IXp", "OR IXp", "CP IXp",
];
const ALU_HALF_IY: [&str; 8] = [
    "ADD A,IYp", "ADC A,IYp", "SUB IYp", "SBC A,IYp", "AND IYp", "XOR IYp", "OR IYp", "CP IYp",
];
const ALU_MEMORY_IX: [&str; 8] = [
    "ADD A,(IX+d)", "ADC A,(IX+d)", "SUB (IX+d)", "SBC A,(IX+d)", "AND (IX+d)", "XOR (IX+d)",
    "OR (IX+d)", "CP (IX+d)",
];
const ALU_MEMORY_IY: [&str; 8] = [
    "ADD A,(IY+d)", "ADC A,(IY+d)", "SUB (IY+d)", "SBC A,(IY+d)", "AND (IY+d)", "XOR (IY+d)",
    "OR (IY+d)", "CP (IY+d)",
];

pub(crate) fn register<X: IndexRegister>(t: &mut InstructionTable) -> Result<(), CpuError> {
    use Cycles::Fixed;
    let kind = X::TABLE;

    // --- 16-bit ---
    let add = X::pick("ADD IX,rr", "ADD IY,rr");
    t.add_pair_run(kind, 0x09, add, Fixed(15), add_index_pair::<X>)?;
    let ld = X::pick("LD IX,nn", "LD IY,nn");
    t.add_double_byte(kind, 0x21, ld, Fixed(14), ld_index_immediate::<X>)?;
    let store = X::pick("LD (nn),IX", "LD (nn),IY");
    t.add_double_byte(kind, 0x22, store, Fixed(20), ld_absolute_index::<X>)?;
    let load = X::pick("LD IX,(nn)", "LD IY,(nn)");
    t.add_double_byte(kind, 0x2A, load, Fixed(20), ld_index_absolute::<X>)?;
    t.add_double_byte(kind, 0x23, X::pick("INC IX", "INC IY"), Fixed(10), inc_index::<X>)?;
    t.add_double_byte(kind, 0x2B, X::pick("DEC IX", "DEC IY"), Fixed(10), dec_index::<X>)?;

    // --- INC / DEC / LD n on the halves and on (IX+d) ---
    for (opcode, cost) in [(0x24, 8), (0x2C, 8), (0x34, 23)] {
        let name = match opcode {
            0x34 => X::pick("INC (IX+d)", "INC (IY+d)"),
            _ => X::pick("INC IXp", "INC IYp"),
        };
        t.add_double_byte(kind, opcode, name, Fixed(cost), inc_operand::<X>)?;
    }
    for (opcode, cost) in [(0x25, 8), (0x2D, 8), (0x35, 23)] {
        let name = match opcode {
            0x35 => X::pick("DEC (IX+d)", "DEC (IY+d)"),
            _ => X::pick("DEC IXp", "DEC IYp"),
        };
        t.add_double_byte(kind, opcode, name, Fixed(cost), dec_operand::<X>)?;
    }
    for (opcode, cost) in [(0x26, 11), (0x2E, 11), (0x36, 19)] {
        let name = match opcode {
            0x36 => X::pick("LD (IX+d),n", "LD (IY+d),n"),
            _ => X::pick("LD IXp,n", "LD IYp,n"),
        };
        t.add_double_byte(kind, opcode, name, Fixed(cost), ld_operand_immediate::<X>)?;
    }

    // --- 0x40-0x7F: every load that names H, L or (HL) ---
    for destination in 0..8u8 {
        for source in 0..8u8 {
            let opcode = 0x40 | (destination << 3) | source;
            let touches_index = matches!(destination, 4..=6) || matches!(source, 4..=6);
            if opcode == 0x76 || !touches_index {
                continue;
            }
            let (name, cost) = match (destination, source) {
                (6, _) => (X::pick("LD (IX+d),r", "LD (IY+d),r"), 19),
                (_, 6) => (X::pick("LD r,(IX+d)", "LD r,(IY+d)"), 19),
                (4 | 5, _) => (X::pick("LD IXp,r", "LD IYp,r"), 8),
                _ => (X::pick("LD r,IXp", "LD r,IYp"), 8),
            };
            t.add_double_byte(kind, opcode, name, Fixed(cost), ld_operand_operand::<X>)?;
        }
    }

    // --- 0x80-0xBF: ALU with IXH, IXL or (IX+d) ---
    for op in 0..8usize {
        let base = 0x80 + ((op as u8) << 3);
        let half = X::pick(ALU_HALF_IX[op], ALU_HALF_IY[op]);
        let memory = X::pick(ALU_MEMORY_IX[op], ALU_MEMORY_IY[op]);
        t.add_double_byte(kind, base + 4, half, Fixed(8), alu_operand::<X>)?;
        t.add_double_byte(kind, base + 5, half, Fixed(8), alu_operand::<X>)?;
        t.add_double_byte(kind, base + 6, memory, Fixed(19), alu_operand::<X>)?;
    }

    // --- Stack and jumps ---
    t.add_double_byte(kind, 0xE1, X::pick("POP IX", "POP IY"), Fixed(14), pop_index::<X>)?;
    let ex = X::pick("EX (SP),IX", "EX (SP),IY");
    t.add_double_byte(kind, 0xE3, ex, Fixed(23), ex_indirect_sp_index::<X>)?;
    t.add_double_byte(kind, 0xE5, X::pick("PUSH IX", "PUSH IY"), Fixed(15), push_index::<X>)?;
    t.add_double_byte(kind, 0xE9, X::pick("JP (IX)", "JP (IY)"), Fixed(8), jp_index::<X>)?;
    t.add_double_byte(kind, 0xF9, X::pick("LD SP,IX", "LD SP,IY"), Fixed(10), ld_sp_index::<X>)?;
    Ok(())
}

// ============================================================================
//  OPERAND ACCESS
// ============================================================================

fn read_indexed<X: IndexRegister>(ctx: &Context<'_>, offset: u8) -> u8 {
    X::pair(&ctx.state.registers).read_by_register_location(&*ctx.memory, offset)
}

fn write_indexed<X: IndexRegister>(ctx: &mut Context<'_>, offset: u8, value: u8) {
    X::pair(&ctx.state.registers).write_by_register_location(&mut *ctx.memory, offset, value);
}

// ============================================================================
//  HANDLERS
// ============================================================================

fn add_index_pair<X: IndexRegister>(ctx: &mut Context<'_>) {
    // ADD IX,HL does not exist: the HL slot is ADD IX,IX.
    let reg = match decode_pair_sp(ctx.opcode) {
        Reg16::Hl => X::PAIR,
        other => other,
    };
    let regs = ctx.regs();
    let operand = regs.get16(reg);
    let lhs = regs.get16(X::PAIR);
    let result = regs.add16(lhs, operand);
    regs.set16(X::PAIR, result);
}

fn ld_index_immediate<X: IndexRegister>(ctx: &mut Context<'_>) {
    let value = ctx.next_two_data_bytes();
    X::pair_mut(ctx.regs()).set(value);
}

fn ld_absolute_index<X: IndexRegister>(ctx: &mut Context<'_>) {
    let address = ctx.next_two_data_bytes();
    let value = X::pair(&ctx.state.registers).word();
    ctx.memory.write_u16_le(address, value);
}

fn ld_index_absolute<X: IndexRegister>(ctx: &mut Context<'_>) {
    let address = ctx.next_two_data_bytes();
    let value = ctx.memory.read_u16_le(address);
    X::pair_mut(ctx.regs()).set(value);
}

fn inc_index<X: IndexRegister>(ctx: &mut Context<'_>) {
    X::pair_mut(ctx.regs()).increment();
}

fn dec_index<X: IndexRegister>(ctx: &mut Context<'_>) {
    X::pair_mut(ctx.regs()).decrement();
}

fn inc_operand<X: IndexRegister>(ctx: &mut Context<'_>) {
    match X::substitute(Operand::destination(ctx.opcode)) {
        Operand::Register(reg) => ctx.regs().increment(reg),
        Operand::Memory => {
            let offset = ctx.next_data_byte();
            let value = read_indexed::<X>(ctx, offset);
            let result = ctx.regs().inc8(value);
            write_indexed::<X>(ctx, offset, result);
        }
    }
}

fn dec_operand<X: IndexRegister>(ctx: &mut Context<'_>) {
    match X::substitute(Operand::destination(ctx.opcode)) {
        Operand::Register(reg) => ctx.regs().decrement(reg),
        Operand::Memory => {
            let offset = ctx.next_data_byte();
            let value = read_indexed::<X>(ctx, offset);
            let result = ctx.regs().dec8(value);
            write_indexed::<X>(ctx, offset, result);
        }
    }
}

fn ld_operand_immediate<X: IndexRegister>(ctx: &mut Context<'_>) {
    match X::substitute(Operand::destination(ctx.opcode)) {
        Operand::Register(reg) => {
            let value = ctx.next_data_byte();
            ctx.set8(reg, value);
        }
        Operand::Memory => {
            // DD 36 d n: displacement first.
            let offset = ctx.next_data_byte();
            let value = ctx.next_data_byte();
            write_indexed::<X>(ctx, offset, value);
        }
    }
}

fn ld_operand_operand<X: IndexRegister>(ctx: &mut Context<'_>) {
    let destination = Operand::destination(ctx.opcode);
    let source = Operand::source(ctx.opcode);
    match (destination, source) {
        // With (IX+d) on one side, H and L keep their usual meaning.
        (Operand::Memory, Operand::Register(reg)) => {
            let offset = ctx.next_data_byte();
            let value = ctx.get8(reg);
            write_indexed::<X>(ctx, offset, value);
        }
        (Operand::Register(reg), Operand::Memory) => {
            let offset = ctx.next_data_byte();
            let value = read_indexed::<X>(ctx, offset);
            ctx.set8(reg, value);
        }
        (destination, source) => {
            let value = ctx.read_operand(X::substitute(source));
            ctx.write_operand(X::substitute(destination), value);
        }
    }
}

fn alu_operand<X: IndexRegister>(ctx: &mut Context<'_>) {
    let value = match X::substitute(Operand::source(ctx.opcode)) {
        Operand::Register(reg) => ctx.get8(reg),
        Operand::Memory => {
            let offset = ctx.next_data_byte();
            read_indexed::<X>(ctx, offset)
        }
    };
    let opcode = ctx.opcode;
    ctx.regs().alu_by_opcode(opcode, value);
}

fn push_index<X: IndexRegister>(ctx: &mut Context<'_>) {
    let value = X::pair(&ctx.state.registers).word();
    ctx.push(value);
}

fn pop_index<X: IndexRegister>(ctx: &mut Context<'_>) {
    let value = ctx.pop();
    X::pair_mut(ctx.regs()).set(value);
}

fn ex_indirect_sp_index<X: IndexRegister>(ctx: &mut Context<'_>) {
    let sp = ctx.state.registers.sp;
    let from_stack = ctx.memory.read_u16_le(sp);
    let value = X::pair(&ctx.state.registers).word();
    ctx.memory.write_u16_le(sp, value);
    X::pair_mut(ctx.regs()).set(from_stack);
}

fn jp_index<X: IndexRegister>(ctx: &mut Context<'_>) {
    let target = X::pair(&ctx.state.registers).word();
    ctx.regs().pc = target;
}

fn ld_sp_index<X: IndexRegister>(ctx: &mut Context<'_>) {
    let value = X::pair(&ctx.state.registers).word();
    ctx.regs().sp = value;
}
