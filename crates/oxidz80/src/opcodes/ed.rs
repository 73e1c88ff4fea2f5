use crate::cycles::{self, Cycles};
use crate::error::CpuError;
use crate::flags::{self, Flags};
use crate::interrupts::InterruptMode;
use crate::registers::{decode_pair_sp, Operand, Registers};
use crate::state::Context;
use crate::table::{Field, InstructionTable, TableKind};

// ============================================================================
//  ED TABLE
// ============================================================================

pub(crate) fn register(t: &mut InstructionTable) -> Result<(), CpuError> {
    use Cycles::{Dynamic, Fixed};
    const ED: TableKind = TableKind::Ed;

    // --- 0x40-0x7F ---
    t.add_with_mask(ED, 0x40, Field::Destination, "IN r,(C)", 12, None, in_register)?;
    t.add_double_byte(ED, 0x70, "IN (C)", Fixed(12), in_flags_only)?;
    t.add_with_mask(ED, 0x41, Field::Destination, "OUT (C),r", 12, None, out_register)?;
    t.add_double_byte(ED, 0x71, "OUT (C),0", Fixed(12), out_zero)?;

    t.add_pair_run(ED, 0x42, "SBC HL,rr", Fixed(15), sbc_hl_pair)?;
    t.add_pair_run(ED, 0x4A, "ADC HL,rr", Fixed(15), adc_hl_pair)?;
    t.add_pair_run(ED, 0x43, "LD (nn),rr", Fixed(20), ld_absolute_pair)?;
    t.add_pair_run(ED, 0x4B, "LD rr,(nn)", Fixed(20), ld_pair_absolute)?;

    t.add_with_mask(ED, 0x44, Field::Destination, "NEG", 8, Some(8), neg)?;

    for y in 0..8u8 {
        let opcode = 0x45 | (y << 3);
        if opcode == 0x4D {
            t.add_double_byte(ED, opcode, "RETI", Fixed(14), reti)?;
        } else {
            t.add_double_byte(ED, opcode, "RETN", Fixed(14), retn)?;
        }
    }

    let im_names = ["IM 0", "IM 0", "IM 1", "IM 2", "IM 0", "IM 0", "IM 1", "IM 2"];
    for (y, name) in im_names.into_iter().enumerate() {
        t.add_double_byte(ED, 0x46 | ((y as u8) << 3), name, Fixed(8), im)?;
    }

    t.add_double_byte(ED, 0x47, "LD I,A", Fixed(9), ld_i_a)?;
    t.add_double_byte(ED, 0x4F, "LD R,A", Fixed(9), ld_r_a)?;
    t.add_double_byte(ED, 0x57, "LD A,I", Fixed(9), ld_a_i)?;
    t.add_double_byte(ED, 0x5F, "LD A,R", Fixed(9), ld_a_r)?;
    t.add_double_byte(ED, 0x67, "RRD", Fixed(18), rrd)?;
    t.add_double_byte(ED, 0x6F, "RLD", Fixed(18), rld)?;

    // --- Block transfer, search and I/O ---
    t.add_double_byte(ED, 0xA0, "LDI", Fixed(16), ldi)?;
    t.add_double_byte(ED, 0xA1, "CPI", Fixed(16), cpi)?;
    t.add_double_byte(ED, 0xA2, "INI", Fixed(16), ini)?;
    t.add_double_byte(ED, 0xA3, "OUTI", Fixed(16), outi)?;
    t.add_double_byte(ED, 0xA8, "LDD", Fixed(16), ldd)?;
    t.add_double_byte(ED, 0xA9, "CPD", Fixed(16), cpd)?;
    t.add_double_byte(ED, 0xAA, "IND", Fixed(16), ind)?;
    t.add_double_byte(ED, 0xAB, "OUTD", Fixed(16), outd)?;

    t.add_double_byte(ED, 0xB0, "LDIR", Dynamic, ldir)?;
    t.add_double_byte(ED, 0xB1, "CPIR", Dynamic, cpir)?;
    t.add_double_byte(ED, 0xB2, "INIR", Dynamic, inir)?;
    t.add_double_byte(ED, 0xB3, "OTIR", Dynamic, otir)?;
    t.add_double_byte(ED, 0xB8, "LDDR", Dynamic, lddr)?;
    t.add_double_byte(ED, 0xB9, "CPDR", Dynamic, cpdr)?;
    t.add_double_byte(ED, 0xBA, "INDR", Dynamic, indr)?;
    t.add_double_byte(ED, 0xBB, "OTDR", Dynamic, otdr)?;
    Ok(())
}

// ============================================================================
//  PORT I/O
// ============================================================================

fn read_port_c(ctx: &mut Context<'_>) -> u8 {
    let port = ctx.state.registers.bc.word();
    let value = ctx.io.read_port(port);
    let regs = ctx.regs();
    let f = Flags::logic(value) | (regs.flags() & Flags::CARRY);
    regs.set_flags(f);
    value
}

fn in_register(ctx: &mut Context<'_>) {
    let value = read_port_c(ctx);
    ctx.write_operand(Operand::destination(ctx.opcode), value);
}

fn in_flags_only(ctx: &mut Context<'_>) {
    read_port_c(ctx);
}

fn out_register(ctx: &mut Context<'_>) {
    let value = ctx.read_operand(Operand::destination(ctx.opcode));
    let port = ctx.state.registers.bc.word();
    ctx.io.write_port(port, value);
}

fn out_zero(ctx: &mut Context<'_>) {
    let port = ctx.state.registers.bc.word();
    ctx.io.write_port(port, 0);
}

// ============================================================================
//  16-BIT ARITHMETIC AND LOADS
// ============================================================================

fn sbc_hl_pair(ctx: &mut Context<'_>) {
    let reg = decode_pair_sp(ctx.opcode);
    let regs = ctx.regs();
    let operand = regs.get16(reg);
    let result = regs.subtract16_with_carry(regs.hl.word(), operand);
    regs.hl.set(result);
}

fn adc_hl_pair(ctx: &mut Context<'_>) {
    let reg = decode_pair_sp(ctx.opcode);
    let regs = ctx.regs();
    let operand = regs.get16(reg);
    let result = regs.add16_with_carry(regs.hl.word(), operand);
    regs.hl.set(result);
}

fn ld_absolute_pair(ctx: &mut Context<'_>) {
    let address = ctx.next_two_data_bytes();
    let value = ctx.state.registers.get16(decode_pair_sp(ctx.opcode));
    ctx.memory.write_u16_le(address, value);
}

fn ld_pair_absolute(ctx: &mut Context<'_>) {
    let address = ctx.next_two_data_bytes();
    let value = ctx.memory.read_u16_le(address);
    let reg = decode_pair_sp(ctx.opcode);
    ctx.regs().set16(reg, value);
}

// ============================================================================
//  ACCUMULATOR, SPECIAL REGISTERS, INTERRUPT CONTROL
// ============================================================================

fn neg(ctx: &mut Context<'_>) {
    ctx.regs().negate();
}

fn retn(ctx: &mut Context<'_>) {
    ctx.set_from_stack();
    ctx.state.interrupts.restore_from_backup();
}

fn reti(ctx: &mut Context<'_>) {
    ctx.set_from_stack();
    ctx.io.clear_maskable_interrupt();
}

fn im(ctx: &mut Context<'_>) {
    let mode = match (ctx.opcode >> 3) & 3 {
        0 | 1 => InterruptMode::Mode0,
        2 => InterruptMode::Mode1,
        _ => InterruptMode::Mode2,
    };
    ctx.state.interrupts.set_mode(mode);
}

fn ld_i_a(ctx: &mut Context<'_>) {
    let regs = ctx.regs();
    regs.i = regs.a();
}

fn ld_r_a(ctx: &mut Context<'_>) {
    let regs = ctx.regs();
    regs.r = regs.a();
}

// LD A,I / LD A,R: P/V reports IFF2.
fn load_special_into_a(ctx: &mut Context<'_>, value: u8) {
    let iff2 = ctx.state.interrupts.iff2();
    let regs = ctx.regs();
    regs.set_a(value);
    let mut f = Flags::sign_zero_xy(value) | (regs.flags() & Flags::CARRY);
    f.set(Flags::PARITY_OVERFLOW, iff2);
    regs.set_flags(f);
}

fn ld_a_i(ctx: &mut Context<'_>) {
    let value = ctx.state.registers.i;
    load_special_into_a(ctx, value);
}

fn ld_a_r(ctx: &mut Context<'_>) {
    let value = ctx.state.registers.r;
    load_special_into_a(ctx, value);
}

fn rrd(ctx: &mut Context<'_>) {
    let address = ctx.hl();
    let value = ctx.read(address);
    let result = ctx.regs().rotate_right_digit(value);
    ctx.write(address, result);
}

fn rld(ctx: &mut Context<'_>) {
    let address = ctx.hl();
    let value = ctx.read(address);
    let result = ctx.regs().rotate_left_digit(value);
    ctx.write(address, result);
}

// ============================================================================
//  BLOCK INSTRUCTIONS
// ============================================================================

fn step_hl(regs: &mut Registers, forward: bool) {
    if forward {
        regs.hl.increment();
    } else {
        regs.hl.decrement();
    }
}

/// Repeating forms rewind PC onto their own ED prefix instead of looping, so
/// interrupts are still checked between iterations.
fn repeat_if(ctx: &mut Context<'_>, repeat: bool) {
    if repeat {
        let regs = ctx.regs();
        regs.pc = regs.pc.wrapping_sub(2);
    }
    ctx.add_branch_cycles(repeat, cycles::BLOCK_REPEAT);
}

/// LDI/LDD. Returns true while BC is non-zero.
fn block_load(ctx: &mut Context<'_>, forward: bool) -> bool {
    let value = ctx.read(ctx.hl());
    let de = ctx.state.registers.de.word();
    ctx.write(de, value);

    let regs = ctx.regs();
    step_hl(regs, forward);
    if forward {
        regs.de.increment();
    } else {
        regs.de.decrement();
    }
    regs.bc.decrement();

    let more = regs.bc.word() != 0;
    let n = value.wrapping_add(regs.a());
    let mut f = regs.flags() & (Flags::SIGN | Flags::ZERO | Flags::CARRY);
    f.set(Flags::PARITY_OVERFLOW, more);
    f.set(Flags::X, n & 0x08 != 0);
    f.set(Flags::Y, n & 0x02 != 0);
    regs.set_flags(f);
    more
}

/// CPI/CPD. Returns true when another iteration of the repeating form is due
/// (BC non-zero and no match).
fn block_compare(ctx: &mut Context<'_>, forward: bool) -> bool {
    let value = ctx.read(ctx.hl());

    let regs = ctx.regs();
    let a = regs.a();
    let result = a.wrapping_sub(value);
    let half = flags::half_carry(a, value, result);
    step_hl(regs, forward);
    regs.bc.decrement();

    let more = regs.bc.word() != 0;
    let n = result.wrapping_sub(half as u8);
    let mut f = (regs.flags() & Flags::CARRY) | Flags::ADD_SUBTRACT;
    f.set(Flags::SIGN, result & 0x80 != 0);
    f.set(Flags::ZERO, result == 0);
    f.set(Flags::HALF_CARRY, half);
    f.set(Flags::PARITY_OVERFLOW, more);
    f.set(Flags::X, n & 0x08 != 0);
    f.set(Flags::Y, n & 0x02 != 0);
    regs.set_flags(f);
    more && result != 0
}

// INI/IND/OUTI/OUTD: S/Z/X/Y from B, N from bit 7 of the byte, H and C from
// the 9-bit sum k, P/V from parity of (k & 7) ^ B.
fn set_block_io_flags(regs: &mut Registers, value: u8, k: u16) {
    let b = regs.bc.high();
    let mut f = Flags::sign_zero_xy(b);
    f.set(Flags::ADD_SUBTRACT, value & 0x80 != 0);
    f.set(Flags::HALF_CARRY | Flags::CARRY, k > 0xFF);
    f.set(Flags::PARITY_OVERFLOW, flags::parity_even((k as u8 & 0x07) ^ b));
    regs.set_flags(f);
}

/// INI/IND. Returns true while B is non-zero.
fn block_in(ctx: &mut Context<'_>, forward: bool) -> bool {
    let port = ctx.state.registers.bc.word();
    let value = ctx.io.read_port(port);
    let address = ctx.hl();
    ctx.write(address, value);

    let regs = ctx.regs();
    let c = regs.bc.low();
    let c = if forward { c.wrapping_add(1) } else { c.wrapping_sub(1) };
    let b = regs.bc.high().wrapping_sub(1);
    regs.bc.set_high(b);
    step_hl(regs, forward);
    set_block_io_flags(regs, value, value as u16 + c as u16);
    regs.bc.high() != 0
}

/// OUTI/OUTD. B is decremented before the port is driven.
fn block_out(ctx: &mut Context<'_>, forward: bool) -> bool {
    let value = ctx.read(ctx.hl());
    let regs = ctx.regs();
    let b = regs.bc.high().wrapping_sub(1);
    regs.bc.set_high(b);
    let port = regs.bc.word();
    ctx.io.write_port(port, value);

    let regs = ctx.regs();
    step_hl(regs, forward);
    let l = regs.hl.low();
    set_block_io_flags(regs, value, value as u16 + l as u16);
    regs.bc.high() != 0
}

fn ldi(ctx: &mut Context<'_>) {
    block_load(ctx, true);
}

fn ldd(ctx: &mut Context<'_>) {
    block_load(ctx, false);
}

fn ldir(ctx: &mut Context<'_>) {
    let more = block_load(ctx, true);
    repeat_if(ctx, more);
}

fn lddr(ctx: &mut Context<'_>) {
    let more = block_load(ctx, false);
    repeat_if(ctx, more);
}

fn cpi(ctx: &mut Context<'_>) {
    block_compare(ctx, true);
}

fn cpd(ctx: &mut Context<'_>) {
    block_compare(ctx, false);
}

fn cpir(ctx: &mut Context<'_>) {
    let more = block_compare(ctx, true);
    repeat_if(ctx, more);
}

fn cpdr(ctx: &mut Context<'_>) {
    let more = block_compare(ctx, false);
    repeat_if(ctx, more);
}

fn ini(ctx: &mut Context<'_>) {
    block_in(ctx, true);
}

fn ind(ctx: &mut Context<'_>) {
    block_in(ctx, false);
}

fn inir(ctx: &mut Context<'_>) {
    let more = block_in(ctx, true);
    repeat_if(ctx, more);
}

fn indr(ctx: &mut Context<'_>) {
    let more = block_in(ctx, false);
    repeat_if(ctx, more);
}

fn outi(ctx: &mut Context<'_>) {
    block_out(ctx, true);
}

fn outd(ctx: &mut Context<'_>) {
    block_out(ctx, false);
}

fn otir(ctx: &mut Context<'_>) {
    let more = block_out(ctx, true);
    repeat_if(ctx, more);
}

fn otdr(ctx: &mut Context<'_>) {
    let more = block_out(ctx, false);
    repeat_if(ctx, more);
}
