use crate::alu::ShiftOp;
use crate::cycles::{self, Cycles};
use crate::error::CpuError;
use crate::opcodes::condition;
use crate::registers::{decode_pair_af, decode_pair_sp, Operand};
use crate::state::Context;
use crate::table::{Field, InstructionTable, TableKind};

// ============================================================================
//  UNPREFIXED TABLE
// ============================================================================

pub(crate) fn register(t: &mut InstructionTable) -> Result<(), CpuError> {
    use Cycles::{Dynamic, Fixed};
    const M: TableKind = TableKind::Main;

    // --- 0x00-0x3F ---
    t.add_standard(0x00, "NOP", Fixed(4), nop)?;
    t.add_standard(0x08, "EX AF,AF'", Fixed(4), ex_af_af)?;
    t.add_standard(0x10, "DJNZ e", Dynamic, djnz)?;
    t.add_standard(0x18, "JR e", Fixed(12), jr)?;
    for cc in 0..4u8 {
        let name = ["JR NZ,e", "JR Z,e", "JR NC,e", "JR C,e"][cc as usize];
        t.add_standard(0x20 + (cc << 3), name, Dynamic, jr_conditional)?;
    }

    t.add_pair_run(M, 0x01, "LD rr,nn", Fixed(10), ld_pair_immediate)?;
    t.add_pair_run(M, 0x09, "ADD HL,rr", Fixed(11), add_hl_pair)?;
    t.add_pair_run(M, 0x03, "INC rr", Fixed(6), inc_pair)?;
    t.add_pair_run(M, 0x0B, "DEC rr", Fixed(6), dec_pair)?;

    t.add_standard(0x02, "LD (BC),A", Fixed(7), ld_indirect_bc_a)?;
    t.add_standard(0x12, "LD (DE),A", Fixed(7), ld_indirect_de_a)?;
    t.add_standard(0x0A, "LD A,(BC)", Fixed(7), ld_a_indirect_bc)?;
    t.add_standard(0x1A, "LD A,(DE)", Fixed(7), ld_a_indirect_de)?;
    t.add_standard(0x22, "LD (nn),HL", Fixed(16), ld_absolute_hl)?;
    t.add_standard(0x2A, "LD HL,(nn)", Fixed(16), ld_hl_absolute)?;
    t.add_standard(0x32, "LD (nn),A", Fixed(13), ld_absolute_a)?;
    t.add_standard(0x3A, "LD A,(nn)", Fixed(13), ld_a_absolute)?;

    t.add_with_mask(M, 0x04, Field::Destination, "INC r", 4, Some(11), inc_operand)?;
    t.add_with_mask(M, 0x05, Field::Destination, "DEC r", 4, Some(11), dec_operand)?;
    t.add_with_mask(M, 0x06, Field::Destination, "LD r,n", 7, Some(10), ld_operand_immediate)?;

    t.add_standard(0x07, "RLCA", Fixed(4), rotate_accumulator)?;
    t.add_standard(0x0F, "RRCA", Fixed(4), rotate_accumulator)?;
    t.add_standard(0x17, "RLA", Fixed(4), rotate_accumulator)?;
    t.add_standard(0x1F, "RRA", Fixed(4), rotate_accumulator)?;
    t.add_standard(0x27, "DAA", Fixed(4), daa)?;
    t.add_standard(0x2F, "CPL", Fixed(4), cpl)?;
    t.add_standard(0x37, "SCF", Fixed(4), scf)?;
    t.add_standard(0x3F, "CCF", Fixed(4), ccf)?;

    // --- 0x40-0x7F: LD r,r' and HALT ---
    for destination in 0..8u8 {
        for source in 0..8u8 {
            let opcode = 0x40 | (destination << 3) | source;
            if opcode == 0x76 {
                t.add_standard(opcode, "HALT", Fixed(4), halt)?;
                continue;
            }
            let (name, cost) = match (destination, source) {
                (6, _) => ("LD (HL),r", 7),
                (_, 6) => ("LD r,(HL)", 7),
                _ => ("LD r,r'", 4),
            };
            t.add_standard(opcode, name, Fixed(cost), ld_operand_operand)?;
        }
    }

    // --- 0x80-0xBF: 8-bit ALU ---
    let alu_names = ["ADD A,r", "ADC A,r", "SUB r", "SBC A,r", "AND r", "XOR r", "OR r", "CP r"];
    for (op, name) in alu_names.into_iter().enumerate() {
        t.add_with_mask(M, 0x80 + ((op as u8) << 3), Field::Source, name, 4, Some(7), alu_operand)?;
    }

    // --- 0xC0-0xFF ---
    let alu_immediate_names = [
        "ADD A,n", "ADC A,n", "SUB n", "SBC A,n", "AND n", "XOR n", "OR n", "CP n",
    ];
    let rst_names = [
        "RST 00H", "RST 08H", "RST 10H", "RST 18H", "RST 20H", "RST 28H", "RST 30H", "RST 38H",
    ];
    let ret_names = ["RET NZ", "RET Z", "RET NC", "RET C", "RET PO", "RET PE", "RET P", "RET M"];
    let jp_names = [
        "JP NZ,nn", "JP Z,nn", "JP NC,nn", "JP C,nn", "JP PO,nn", "JP PE,nn", "JP P,nn", "JP M,nn",
    ];
    let call_names = [
        "CALL NZ,nn", "CALL Z,nn", "CALL NC,nn", "CALL C,nn",
        "CALL PO,nn", "CALL PE,nn", "CALL P,nn", "CALL M,nn",
    ];
    for y in 0..8u8 {
        let i = y as usize;
        t.add_standard(0xC0 + (y << 3), ret_names[i], Dynamic, ret_conditional)?;
        t.add_standard(0xC2 + (y << 3), jp_names[i], Fixed(10), jp_conditional)?;
        t.add_standard(0xC4 + (y << 3), call_names[i], Dynamic, call_conditional)?;
        t.add_standard(0xC6 + (y << 3), alu_immediate_names[i], Fixed(7), alu_immediate)?;
        t.add_standard(0xC7 + (y << 3), rst_names[i], Fixed(11), rst)?;
    }

    t.add_pair_run(M, 0xC1, "POP rr", Fixed(10), pop_pair)?;
    t.add_pair_run(M, 0xC5, "PUSH rr", Fixed(11), push_pair)?;

    t.add_standard(0xC3, "JP nn", Fixed(10), jp)?;
    t.add_standard(0xC9, "RET", Fixed(10), ret)?;
    t.add_standard(0xCD, "CALL nn", Fixed(17), call)?;
    t.add_standard(0xD3, "OUT (n),A", Fixed(11), out_immediate_a)?;
    t.add_standard(0xDB, "IN A,(n)", Fixed(11), in_a_immediate)?;
    t.add_standard(0xD9, "EXX", Fixed(4), exx)?;
    t.add_standard(0xE3, "EX (SP),HL", Fixed(19), ex_indirect_sp_hl)?;
    t.add_standard(0xE9, "JP (HL)", Fixed(4), jp_hl)?;
    t.add_standard(0xEB, "EX DE,HL", Fixed(4), ex_de_hl)?;
    t.add_standard(0xF3, "DI", Fixed(4), di)?;
    t.add_standard(0xF9, "LD SP,HL", Fixed(6), ld_sp_hl)?;
    t.add_standard(0xFB, "EI", Fixed(4), ei)?;
    Ok(())
}

// ============================================================================
//  HANDLERS
// ============================================================================

fn nop(_: &mut Context<'_>) {}

fn halt(ctx: &mut Context<'_>) {
    ctx.state.halted = true;
    let pc = ctx.state.registers.pc;
    ctx.logger.debug(&format!("HALT at {:04X}", pc.wrapping_sub(1)));
}

// --- 8-bit loads ---

fn ld_operand_operand(ctx: &mut Context<'_>) {
    let value = ctx.read_operand(Operand::source(ctx.opcode));
    ctx.write_operand(Operand::destination(ctx.opcode), value);
}

fn ld_operand_immediate(ctx: &mut Context<'_>) {
    let value = ctx.next_data_byte();
    ctx.write_operand(Operand::destination(ctx.opcode), value);
}

fn ld_indirect_bc_a(ctx: &mut Context<'_>) {
    let address = ctx.state.registers.bc.word();
    ctx.write(address, ctx.state.registers.a());
}

fn ld_indirect_de_a(ctx: &mut Context<'_>) {
    let address = ctx.state.registers.de.word();
    ctx.write(address, ctx.state.registers.a());
}

fn ld_a_indirect_bc(ctx: &mut Context<'_>) {
    let value = ctx.read(ctx.state.registers.bc.word());
    ctx.regs().set_a(value);
}

fn ld_a_indirect_de(ctx: &mut Context<'_>) {
    let value = ctx.read(ctx.state.registers.de.word());
    ctx.regs().set_a(value);
}

fn ld_absolute_a(ctx: &mut Context<'_>) {
    let address = ctx.next_two_data_bytes();
    ctx.write(address, ctx.state.registers.a());
}

fn ld_a_absolute(ctx: &mut Context<'_>) {
    let address = ctx.next_two_data_bytes();
    let value = ctx.read(address);
    ctx.regs().set_a(value);
}

// --- 16-bit loads ---

fn ld_pair_immediate(ctx: &mut Context<'_>) {
    let value = ctx.next_two_data_bytes();
    let reg = decode_pair_sp(ctx.opcode);
    ctx.regs().set16(reg, value);
}

fn ld_absolute_hl(ctx: &mut Context<'_>) {
    let address = ctx.next_two_data_bytes();
    let value = ctx.hl();
    ctx.memory.write_u16_le(address, value);
}

fn ld_hl_absolute(ctx: &mut Context<'_>) {
    let address = ctx.next_two_data_bytes();
    let value = ctx.memory.read_u16_le(address);
    ctx.regs().hl.set(value);
}

fn ld_sp_hl(ctx: &mut Context<'_>) {
    let regs = ctx.regs();
    regs.sp = regs.hl.word();
}

fn push_pair(ctx: &mut Context<'_>) {
    let value = ctx.state.registers.get16(decode_pair_af(ctx.opcode));
    ctx.push(value);
}

fn pop_pair(ctx: &mut Context<'_>) {
    let value = ctx.pop();
    let reg = decode_pair_af(ctx.opcode);
    ctx.regs().set16(reg, value);
}

// --- Exchanges ---

fn ex_af_af(ctx: &mut Context<'_>) {
    ctx.regs().af.swap_with_shadow();
}

fn exx(ctx: &mut Context<'_>) {
    ctx.regs().exchange_all();
}

fn ex_de_hl(ctx: &mut Context<'_>) {
    let regs = ctx.regs();
    let de = regs.de.word();
    regs.de.set(regs.hl.word());
    regs.hl.set(de);
}

fn ex_indirect_sp_hl(ctx: &mut Context<'_>) {
    let sp = ctx.state.registers.sp;
    let from_stack = ctx.memory.read_u16_le(sp);
    let hl = ctx.hl();
    ctx.memory.write_u16_le(sp, hl);
    ctx.regs().hl.set(from_stack);
}

// --- 8-bit arithmetic ---

fn inc_operand(ctx: &mut Context<'_>) {
    let operand = Operand::destination(ctx.opcode);
    let value = ctx.read_operand(operand);
    let result = ctx.regs().inc8(value);
    ctx.write_operand(operand, result);
}

fn dec_operand(ctx: &mut Context<'_>) {
    let operand = Operand::destination(ctx.opcode);
    let value = ctx.read_operand(operand);
    let result = ctx.regs().dec8(value);
    ctx.write_operand(operand, result);
}

fn alu_operand(ctx: &mut Context<'_>) {
    let value = ctx.read_operand(Operand::source(ctx.opcode));
    let opcode = ctx.opcode;
    ctx.regs().alu_by_opcode(opcode, value);
}

fn alu_immediate(ctx: &mut Context<'_>) {
    let value = ctx.next_data_byte();
    let opcode = ctx.opcode;
    ctx.regs().alu_by_opcode(opcode, value);
}

fn daa(ctx: &mut Context<'_>) {
    ctx.regs().decimal_adjust_accumulator();
}

fn cpl(ctx: &mut Context<'_>) {
    ctx.regs().complement();
}

fn scf(ctx: &mut Context<'_>) {
    ctx.regs().set_carry_flag();
}

fn ccf(ctx: &mut Context<'_>) {
    ctx.regs().complement_carry_flag();
}

fn rotate_accumulator(ctx: &mut Context<'_>) {
    // 07/0F/17/1F share bits 3-5 with CB 07/0F/17/1F.
    let op = ShiftOp::from_opcode(ctx.opcode);
    ctx.regs().shift_accumulator(op);
}

// --- 16-bit arithmetic ---

fn add_hl_pair(ctx: &mut Context<'_>) {
    let reg = decode_pair_sp(ctx.opcode);
    let regs = ctx.regs();
    let operand = regs.get16(reg);
    let result = regs.add16(regs.hl.word(), operand);
    regs.hl.set(result);
}

fn inc_pair(ctx: &mut Context<'_>) {
    let reg = decode_pair_sp(ctx.opcode);
    let regs = ctx.regs();
    let value = regs.get16(reg).wrapping_add(1);
    regs.set16(reg, value);
}

fn dec_pair(ctx: &mut Context<'_>) {
    let reg = decode_pair_sp(ctx.opcode);
    let regs = ctx.regs();
    let value = regs.get16(reg).wrapping_sub(1);
    regs.set16(reg, value);
}

// --- Jumps, calls, returns ---

fn jp(ctx: &mut Context<'_>) {
    let address = ctx.next_two_data_bytes();
    ctx.regs().pc = address;
}

fn jp_conditional(ctx: &mut Context<'_>) {
    let address = ctx.next_two_data_bytes();
    if condition(&ctx.state.registers, ctx.opcode >> 3) {
        ctx.regs().pc = address;
    }
}

fn jp_hl(ctx: &mut Context<'_>) {
    let regs = ctx.regs();
    regs.pc = regs.hl.word();
}

fn jr(ctx: &mut Context<'_>) {
    let offset = ctx.next_data_byte();
    ctx.jump_by_offset(offset);
}

fn jr_conditional(ctx: &mut Context<'_>) {
    let offset = ctx.next_data_byte();
    // 20/28/30/38 -> NZ/Z/NC/C
    let taken = condition(&ctx.state.registers, (ctx.opcode >> 3) & 3);
    if taken {
        ctx.jump_by_offset(offset);
    }
    ctx.add_branch_cycles(taken, cycles::JR_CONDITIONAL);
}

fn djnz(ctx: &mut Context<'_>) {
    let offset = ctx.next_data_byte();
    let regs = ctx.regs();
    let b = regs.bc.high().wrapping_sub(1);
    regs.bc.set_high(b);
    let taken = b != 0;
    if taken {
        ctx.jump_by_offset(offset);
    }
    ctx.add_branch_cycles(taken, cycles::DJNZ);
}

fn call(ctx: &mut Context<'_>) {
    let address = ctx.next_two_data_bytes();
    ctx.set_and_save_existing(address);
}

fn call_conditional(ctx: &mut Context<'_>) {
    let address = ctx.next_two_data_bytes();
    let taken = condition(&ctx.state.registers, ctx.opcode >> 3);
    if taken {
        ctx.set_and_save_existing(address);
    }
    ctx.add_branch_cycles(taken, cycles::CALL_CONDITIONAL);
}

fn ret(ctx: &mut Context<'_>) {
    ctx.set_from_stack();
}

fn ret_conditional(ctx: &mut Context<'_>) {
    let taken = condition(&ctx.state.registers, ctx.opcode >> 3);
    if taken {
        ctx.set_from_stack();
    }
    ctx.add_branch_cycles(taken, cycles::RET_CONDITIONAL);
}

fn rst(ctx: &mut Context<'_>) {
    let vector = (ctx.opcode & 0x38) as u16;
    ctx.set_and_save_existing(vector);
}

// --- I/O and interrupts ---

fn out_immediate_a(ctx: &mut Context<'_>) {
    let low = ctx.next_data_byte();
    let a = ctx.state.registers.a();
    ctx.io.write_port(((a as u16) << 8) | low as u16, a);
}

fn in_a_immediate(ctx: &mut Context<'_>) {
    let low = ctx.next_data_byte();
    let a = ctx.state.registers.a();
    let value = ctx.io.read_port(((a as u16) << 8) | low as u16);
    ctx.regs().set_a(value);
}

fn di(ctx: &mut Context<'_>) {
    ctx.state.interrupts.disable();
}

fn ei(ctx: &mut Context<'_>) {
    ctx.state.interrupts.enable();
}
