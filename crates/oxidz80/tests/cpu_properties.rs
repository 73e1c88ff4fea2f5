use oxide_core::testing::{FlatMemory, LatchedIo, RecordingLogger};
use oxide_core::{Cpu, IoBus, LogLogger, MemoryBus};
use oxidz80::alu::BitIndex;
use oxidz80::{CpuError, Flags, InstructionTable, InterruptMode, TableKind, Z80, Z80Config};

type TestCpu = Z80<FlatMemory, LatchedIo, RecordingLogger>;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cpu_at(address: u16, program: &[u8]) -> TestCpu {
    init_logging();
    let mut memory = FlatMemory::new();
    memory.load(address, program);
    let mut cpu = Z80::new(memory, LatchedIo::new(), RecordingLogger::new()).unwrap();
    cpu.registers_mut().pc = address;
    cpu
}

fn cpu_with(program: &[u8]) -> TestCpu {
    cpu_at(0x0000, program)
}

// ============================================================================
//  RESET
// ============================================================================

#[test]
fn reset_restores_power_on_state() {
    let mut cpu = cpu_with(&[
        0x01, 0x34, 0x12, // LD BC,1234h
        0xD9, // EXX
        0xFB, // EI
        0xED, 0x56, // IM 1
        0x76, // HALT
    ]);
    for _ in 0..5 {
        cpu.execute_next_cycle();
    }
    cpu.registers_mut().i = 0x12;
    cpu.registers_mut().ix.set(0xFFFF);
    assert!(cpu.status().halted);

    cpu.reset();
    let status = cpu.status();
    assert_eq!(status.pc, 0x0000);
    assert_eq!(status.sp, 0xDFF0);
    for pair in [status.af, status.bc, status.de, status.hl, status.ix, status.iy] {
        assert_eq!(pair, 0);
    }
    for pair in [status.af_shadow, status.bc_shadow, status.de_shadow, status.hl_shadow] {
        assert_eq!(pair, 0);
    }
    assert!(!status.halted);
    assert!(!status.iff1);
    assert!(!status.iff2);
    assert_eq!(status.interrupt_mode, InterruptMode::Mode0);
    assert_eq!((status.i, status.r), (0, 0));
    assert_eq!(status.cycle_count, 0);
    assert_eq!(status.total_cycles, 0);
}

#[test]
fn initial_stack_pointer_is_configurable() {
    let config = Z80Config { initial_stack_pointer: 0xFFF0, ..Z80Config::default() };
    let cpu: TestCpu =
        Z80::with_config(FlatMemory::new(), LatchedIo::new(), RecordingLogger::new(), config)
            .unwrap();
    assert_eq!(cpu.status().sp, 0xFFF0);
}

// ============================================================================
//  STEP CONTRACT
// ============================================================================

#[test]
fn halt_idles_until_an_interrupt() {
    let mut cpu = cpu_with(&[0x76]);
    assert_eq!(cpu.execute_next_cycle(), 4);
    assert!(cpu.status().halted);
    assert_eq!(cpu.pc(), 1);

    for _ in 0..3 {
        assert_eq!(cpu.execute_next_cycle(), 4);
        assert_eq!(cpu.pc(), 1);
    }

    cpu.io_mut().set_non_maskable_interrupt();
    assert_eq!(cpu.execute_next_cycle(), 11);
    assert!(!cpu.status().halted);
    assert_eq!(cpu.pc(), 0x0066);
    assert_eq!(cpu.memory().read_u16_le(cpu.status().sp), 0x0001);
}

#[test]
fn two_byte_instruction_sets_interrupt_mode() {
    let mut cpu = cpu_with(&[0xED, 0x5E]);
    assert_eq!(cpu.execute_next_cycle(), 8);
    assert_eq!(cpu.status().interrupt_mode, InterruptMode::Mode2);
    assert_eq!(cpu.pc(), 2);
}

#[test]
fn indexed_bit_reset_special_form() {
    let mut cpu = cpu_with(&[0xDD, 0xCB, 0x02, 0x86]); // RES 0,(IX+2)
    cpu.registers_mut().ix.set(0x3000);
    cpu.memory_mut().ram[0x3002] = 0xFF;
    assert_eq!(cpu.execute_next_cycle(), 23);
    assert_eq!(cpu.pc(), 4);
    assert_eq!(cpu.memory().ram[0x3002], 0xFE);
}

#[test]
fn negative_displacement_reaches_below_iy() {
    let mut cpu = cpu_with(&[0xFD, 0xCB, 0xFE, 0xC6]); // SET 0,(IY-2)
    cpu.registers_mut().iy.set(0x3000);
    assert_eq!(cpu.execute_next_cycle(), 23);
    assert_eq!(cpu.memory().ram[0x2FFE], 0x01);
}

#[test]
fn unknown_opcode_is_a_logged_no_op() {
    let mut cpu = cpu_with(&[0xDD, 0x00, 0xED, 0x00, 0x00]);
    assert_eq!(cpu.execute_next_cycle(), 4);
    assert_eq!(cpu.pc(), 2);
    assert_eq!(cpu.execute_next_cycle(), 4);
    assert_eq!(cpu.pc(), 4);

    let errors = &cpu.logger().errors;
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0], "Unhandled opcode DD 00 at 0000");
    assert_eq!(errors[1], "Unhandled opcode ED 00 at 0002");

    // Execution carries on.
    assert_eq!(cpu.execute_next_cycle(), 4);
    assert_eq!(cpu.pc(), 5);
}

// ============================================================================
//  INTERRUPTS
// ============================================================================

#[test]
fn nmi_takes_priority_over_maskable() {
    let mut cpu = cpu_with(&[0xFB, 0x00, 0x00]); // EI
    cpu.execute_next_cycle();
    cpu.io_mut().set_maskable_interrupt();
    cpu.io_mut().set_non_maskable_interrupt();
    cpu.io_mut().clear_maskable_interrupt();

    let sp_before = cpu.status().sp;
    assert_eq!(cpu.execute_next_cycle(), 11);
    let status = cpu.status();
    assert_eq!(status.pc, 0x0066);
    assert_eq!(status.sp, sp_before.wrapping_sub(2));
    assert_eq!(cpu.memory().read_u16_le(status.sp), 0x0001);
    assert!(!status.iff1);
    assert!(status.iff2);
    assert!(!status.non_maskable_interrupt);
}

#[test]
fn nmi_is_checked_even_with_interrupts_disabled() {
    let mut cpu = cpu_with(&[0xF3, 0x00]); // DI
    cpu.execute_next_cycle();
    cpu.io_mut().set_non_maskable_interrupt();
    assert_eq!(cpu.execute_next_cycle(), 11);
    assert_eq!(cpu.pc(), 0x0066);
    assert!(!cpu.status().iff2);
}

#[test]
fn mode_1_interrupt_restarts_at_38h() {
    let mut cpu = cpu_with(&[0xED, 0x56, 0xFB, 0x76]); // IM 1; EI; HALT
    for _ in 0..3 {
        cpu.execute_next_cycle();
    }
    assert!(cpu.status().halted);

    cpu.io_mut().set_maskable_interrupt();
    assert_eq!(cpu.execute_next_cycle(), 11);
    let status = cpu.status();
    assert_eq!(status.pc, 0x0038);
    assert!(!status.iff1 && !status.iff2);
    assert!(!status.halted);
    assert!(!status.maskable_interrupt);
    assert_eq!(cpu.memory().read_u16_le(status.sp), 0x0004);
    assert!(cpu.logger().debug_lines.iter().any(|line| line.starts_with("IRQ serviced")));
}

#[test]
fn mode_0_behaves_as_rst_38h() {
    let mut cpu = cpu_with(&[0xFB, 0x00]);
    cpu.execute_next_cycle();
    cpu.io_mut().set_maskable_interrupt();
    assert_eq!(cpu.execute_next_cycle(), 11);
    assert_eq!(cpu.pc(), 0x0038);
}

#[test]
fn masked_interrupt_waits_for_ei() {
    let mut cpu = cpu_with(&[0x00, 0xFB, 0x00]);
    cpu.io_mut().set_maskable_interrupt();
    assert_eq!(cpu.execute_next_cycle(), 4); // NOP, IFF1 clear
    assert_eq!(cpu.pc(), 1);
    cpu.execute_next_cycle(); // EI
    assert_eq!(cpu.execute_next_cycle(), 11);
    assert_eq!(cpu.pc(), 0x0038);
}

#[test]
fn mode_2_is_reported_and_dropped() {
    let mut cpu = cpu_with(&[0xED, 0x5E, 0xFB, 0x00]); // IM 2; EI
    cpu.execute_next_cycle();
    cpu.execute_next_cycle();
    cpu.io_mut().set_maskable_interrupt();
    let sp_before = cpu.status().sp;

    assert_eq!(cpu.execute_next_cycle(), 4);
    let status = cpu.status();
    assert_eq!(status.pc, 3);
    assert_eq!(status.sp, sp_before);
    assert!(!status.maskable_interrupt);
    assert!(status.iff1);
    assert_eq!(cpu.logger().errors.len(), 1);
    assert!(cpu.logger().errors[0].contains("mode 2"));
}

#[test]
fn retn_restores_iff1_from_iff2() {
    let mut cpu = cpu_with(&[0xFB, 0x00]);
    cpu.memory_mut().load(0x0066, &[0xED, 0x45]); // RETN
    cpu.execute_next_cycle();
    cpu.io_mut().set_non_maskable_interrupt();
    cpu.execute_next_cycle();
    assert!(!cpu.status().iff1);

    assert_eq!(cpu.execute_next_cycle(), 14);
    let status = cpu.status();
    assert_eq!(status.pc, 0x0001);
    assert!(status.iff1);
    assert_eq!(status.sp, 0xDFF0);
}

#[test]
fn reti_clears_the_latch_but_not_the_flip_flops() {
    let mut cpu = cpu_with(&[0xED, 0x4D]); // RETI
    cpu.memory_mut().write_u16_le(0xDFF0, 0x1234);
    cpu.io_mut().set_maskable_interrupt();
    assert_eq!(cpu.execute_next_cycle(), 14);
    let status = cpu.status();
    assert_eq!(status.pc, 0x1234);
    assert_eq!(status.sp, 0xDFF2);
    assert!(!status.maskable_interrupt);
    assert!(!status.iff1 && !status.iff2);
}

// ============================================================================
//  PROGRAM COUNTER AND STACK
// ============================================================================

#[test]
fn relative_jump_table() {
    for (offset, expected) in [(0u8, 502u16), (1, 503), (129, 631), (130, 376), (255, 501)] {
        let mut cpu = cpu_at(500, &[0x18, offset]);
        assert_eq!(cpu.execute_next_cycle(), 12);
        assert_eq!(cpu.pc(), expected, "JR with offset byte {offset}");
    }
}

#[test]
fn conditional_branches_report_their_own_cost() {
    // JR NZ,+2 with Z clear: taken.
    let mut cpu = cpu_with(&[0x20, 0x02]);
    assert_eq!(cpu.execute_next_cycle(), 12);
    assert_eq!(cpu.pc(), 4);

    // JR Z,+2 with Z clear: not taken.
    let mut cpu = cpu_with(&[0x28, 0x02]);
    assert_eq!(cpu.execute_next_cycle(), 7);
    assert_eq!(cpu.pc(), 2);

    // CALL NZ,4000h then RET NZ.
    let mut cpu = cpu_with(&[0xC4, 0x00, 0x40]);
    cpu.memory_mut().load(0x4000, &[0xC0]);
    assert_eq!(cpu.execute_next_cycle(), 17);
    assert_eq!(cpu.pc(), 0x4000);
    assert_eq!(cpu.execute_next_cycle(), 11);
    assert_eq!(cpu.pc(), 0x0003);

    // CALL Z,nn and RET Z not taken.
    let mut cpu = cpu_with(&[0xCC, 0x00, 0x40, 0xC8]);
    assert_eq!(cpu.execute_next_cycle(), 10);
    assert_eq!(cpu.execute_next_cycle(), 5);
    assert_eq!(cpu.pc(), 4);
}

#[test]
fn djnz_loops_until_b_is_zero() {
    let mut cpu = cpu_with(&[0x06, 0x02, 0x10, 0xFE]); // LD B,2; DJNZ $
    cpu.execute_next_cycle();
    assert_eq!(cpu.execute_next_cycle(), 13);
    assert_eq!(cpu.pc(), 2);
    assert_eq!(cpu.execute_next_cycle(), 8);
    assert_eq!(cpu.pc(), 4);
    assert_eq!(cpu.status().bc >> 8, 0);
}

#[test]
fn push_pop_round_trip() {
    let mut cpu = cpu_with(&[
        0x01, 0x34, 0x12, // LD BC,1234h
        0xC5, // PUSH BC
        0xD1, // POP DE
        0xDD, 0x21, 0xCD, 0xAB, // LD IX,ABCDh
        0xDD, 0xE5, // PUSH IX
        0xF1, // POP AF
    ]);
    cpu.execute_next_cycle();
    assert_eq!(cpu.execute_next_cycle(), 11);
    assert_eq!(cpu.status().sp, 0xDFEE);
    assert_eq!(cpu.execute_next_cycle(), 10);
    let status = cpu.status();
    assert_eq!(status.de, 0x1234);
    assert_eq!(status.sp, 0xDFF0);

    cpu.execute_next_cycle();
    assert_eq!(cpu.execute_next_cycle(), 15);
    cpu.execute_next_cycle();
    let status = cpu.status();
    assert_eq!(status.af, 0xABCD);
    assert_eq!(status.sp, 0xDFF0);
}

fn cpu_with_stack_bounds(minimum: usize, maximum: usize, program: &[u8]) -> TestCpu {
    init_logging();
    let mut memory = FlatMemory::with_stack_bounds(minimum, maximum);
    memory.load(0, program);
    Z80::new(memory, LatchedIo::new(), RecordingLogger::new()).unwrap()
}

#[test]
fn stack_wraps_at_the_configured_bounds() {
    // PUSH BC; POP BC; POP BC
    let mut cpu = cpu_with_stack_bounds(0xC000, 0xE000, &[0xC5, 0xC1, 0xC1]);
    cpu.registers_mut().sp = 0xC000;
    cpu.registers_mut().bc.set(0xBEEF);

    cpu.execute_next_cycle();
    assert_eq!(cpu.status().sp, 0xDFFE);
    assert_eq!(cpu.logger().errors.len(), 1);
    assert!(cpu.logger().errors[0].starts_with("Stack underflow"));

    // Low byte at DFFE, high byte at DFFF; SP comes back to the top.
    cpu.registers_mut().bc.set(0);
    cpu.execute_next_cycle();
    assert_eq!(cpu.status().bc, 0xBEEF);
    assert_eq!(cpu.status().sp, 0xE000);
    assert_eq!(cpu.logger().errors.len(), 1);

    // Popping an empty stack leaves the window and wraps to the bottom.
    cpu.execute_next_cycle();
    assert_eq!(cpu.status().sp, 0xC001);
    assert_eq!(cpu.logger().errors.len(), 2);
    assert!(cpu.logger().errors[1].starts_with("Stack overflow"));
}

#[test]
fn push_pop_round_trip_from_the_top_of_the_stack() {
    let mut cpu = cpu_with_stack_bounds(0xC000, 0xE000, &[0xC5, 0xD1]); // PUSH BC; POP DE
    cpu.registers_mut().sp = 0xE000;
    cpu.registers_mut().bc.set(0x1234);

    cpu.execute_next_cycle();
    assert_eq!(cpu.status().sp, 0xDFFE);
    cpu.execute_next_cycle();
    let status = cpu.status();
    assert_eq!(status.de, 0x1234);
    assert_eq!(status.sp, 0xE000);
    assert!(cpu.logger().errors.is_empty());
}

#[test]
fn push_pop_round_trip_across_the_top_of_memory() {
    let mut cpu = cpu_with(&[0xC5, 0xD1]); // PUSH BC; POP DE
    cpu.registers_mut().sp = 0x0000;
    cpu.registers_mut().bc.set(0x5678);

    cpu.execute_next_cycle();
    assert_eq!(cpu.status().sp, 0xFFFE);
    assert_eq!(cpu.memory().ram[0xFFFF], 0x56);
    cpu.execute_next_cycle();
    let status = cpu.status();
    assert_eq!(status.de, 0x5678);
    assert_eq!(status.sp, 0x0000);
    assert!(cpu.logger().errors.is_empty());
}

// ============================================================================
//  ARITHMETIC
// ============================================================================

fn check_adc_a_a(carry_in: bool) {
    for i in 0..=255u8 {
        let mut program = Vec::new();
        if carry_in {
            program.push(0x37); // SCF
        }
        program.extend_from_slice(&[0x3E, i, 0x8F]); // LD A,i; ADC A,A
        let mut cpu = cpu_with(&program);
        for _ in 0..program.len() - 1 {
            cpu.execute_next_cycle();
        }

        let sum = 2 * i as u16 + carry_in as u16;
        let result = sum as u8;
        let f = cpu.registers().flags();
        assert_eq!(cpu.registers().a(), result, "A for i={i} carry={carry_in}");
        assert_eq!(f.contains(Flags::SIGN), result & 0x80 != 0, "S for i={i}");
        assert_eq!(f.contains(Flags::ZERO), result == 0, "Z for i={i}");
        assert_eq!(f.contains(Flags::HALF_CARRY), (i & 0x0F) * 2 + carry_in as u8 > 0x0F, "H for i={i}");
        assert_eq!(f.contains(Flags::PARITY_OVERFLOW), (i ^ result) & 0x80 != 0, "V for i={i}");
        assert_eq!(f.contains(Flags::CARRY), sum > 0xFF, "C for i={i}");
        assert!(!f.contains(Flags::ADD_SUBTRACT));
    }
}

#[test]
fn adc_matches_unsigned_arithmetic_without_carry() {
    check_adc_a_a(false);
}

#[test]
fn adc_matches_unsigned_arithmetic_with_carry() {
    check_adc_a_a(true);
}

#[test]
fn sixteen_bit_subtract_with_carry() {
    let mut cpu = cpu_with(&[0x37, 0xED, 0x52]); // SCF; SBC HL,DE
    cpu.registers_mut().hl.set(0x1000);
    cpu.registers_mut().de.set(0x0FFF);
    cpu.execute_next_cycle();
    assert_eq!(cpu.execute_next_cycle(), 15);
    let f = cpu.registers().flags();
    assert_eq!(cpu.status().hl, 0x0000);
    assert!(f.contains(Flags::ZERO));
    assert!(f.contains(Flags::ADD_SUBTRACT));
    assert!(!f.contains(Flags::CARRY));
}

#[test]
fn bit_index_is_validated() {
    assert_eq!(BitIndex::new(8), Err(CpuError::BitIndexOutOfRange(8)));
    assert_eq!(BitIndex::new(7).map(|bit| bit.mask()), Ok(0x80));
}

// ============================================================================
//  BLOCK INSTRUCTIONS
// ============================================================================

#[test]
fn ldir_rewinds_pc_between_iterations() {
    let mut cpu = cpu_with(&[0xED, 0xB0]);
    cpu.memory_mut().load(0x4000, &[1, 2, 3]);
    cpu.registers_mut().hl.set(0x4000);
    cpu.registers_mut().de.set(0x5000);
    cpu.registers_mut().bc.set(3);

    assert_eq!(cpu.execute_next_cycle(), 21);
    assert_eq!(cpu.pc(), 0);
    assert_eq!(cpu.execute_next_cycle(), 21);
    assert_eq!(cpu.execute_next_cycle(), 16);
    assert_eq!(cpu.pc(), 2);

    assert_eq!(&cpu.memory().ram[0x5000..0x5003], &[1, 2, 3]);
    let status = cpu.status();
    assert_eq!((status.hl, status.de, status.bc), (0x4003, 0x5003, 0));
    assert!(!cpu.registers().flag(Flags::PARITY_OVERFLOW));
}

#[test]
fn interrupt_is_serviced_between_block_iterations() {
    let mut cpu = cpu_with(&[0xFB, 0xED, 0xB0]); // EI; LDIR
    cpu.registers_mut().hl.set(0x4000);
    cpu.registers_mut().de.set(0x5000);
    cpu.registers_mut().bc.set(4);
    cpu.execute_next_cycle();
    cpu.execute_next_cycle();
    cpu.io_mut().set_maskable_interrupt();

    assert_eq!(cpu.execute_next_cycle(), 11);
    assert_eq!(cpu.pc(), 0x0038);
    // Returns onto the ED prefix of the interrupted LDIR.
    assert_eq!(cpu.memory().read_u16_le(cpu.status().sp), 0x0001);
    assert_eq!(cpu.status().bc, 3);
}

#[test]
fn cpir_stops_on_match() {
    let mut cpu = cpu_with(&[0xED, 0xB1]);
    cpu.memory_mut().load(0x4000, &[0x01, 0x42, 0x03]);
    cpu.registers_mut().hl.set(0x4000);
    cpu.registers_mut().bc.set(3);
    cpu.registers_mut().set_a(0x42);

    assert_eq!(cpu.execute_next_cycle(), 21);
    assert_eq!(cpu.execute_next_cycle(), 16);
    assert_eq!(cpu.pc(), 2);
    let f = cpu.registers().flags();
    assert!(f.contains(Flags::ZERO));
    assert!(f.contains(Flags::PARITY_OVERFLOW)); // BC still non-zero
    assert_eq!((cpu.status().hl, cpu.status().bc), (0x4002, 1));
}

#[test]
fn otir_drives_ports_with_decremented_b() {
    let mut cpu = cpu_with(&[0xED, 0xB3]);
    cpu.memory_mut().load(0x4000, &[0xAA, 0xBB]);
    cpu.registers_mut().hl.set(0x4000);
    cpu.registers_mut().bc.set(0x02BE);

    assert_eq!(cpu.execute_next_cycle(), 21);
    assert_eq!(cpu.execute_next_cycle(), 16);
    assert_eq!(cpu.io().writes, vec![(0x01BE, 0xAA), (0x00BE, 0xBB)]);
    assert!(cpu.registers().flag(Flags::ZERO));
    // Bit 7 of the last byte sets N.
    assert!(cpu.registers().flag(Flags::ADD_SUBTRACT));
}

#[test]
fn inir_stores_port_data() {
    let mut cpu = cpu_with(&[0xED, 0xB2]);
    cpu.io_mut().input = 0x5A;
    cpu.registers_mut().hl.set(0x4000);
    cpu.registers_mut().bc.set(0x02BF);

    cpu.execute_next_cycle();
    cpu.execute_next_cycle();
    assert_eq!(&cpu.memory().ram[0x4000..0x4002], &[0x5A, 0x5A]);
    assert_eq!(cpu.io().reads, vec![0x02BF, 0x01BF]);
    assert_eq!(cpu.status().bc, 0x00BF);
}

// ============================================================================
//  PORT I/O
// ============================================================================

#[test]
fn immediate_port_address_uses_a_as_high_byte() {
    let mut cpu = cpu_with(&[0x3E, 0x12, 0xD3, 0xBF, 0xDB, 0x7E]); // LD A,12h; OUT (BFh),A; IN A,(7Eh)
    cpu.io_mut().input = 0x99;
    cpu.execute_next_cycle();
    assert_eq!(cpu.execute_next_cycle(), 11);
    assert_eq!(cpu.execute_next_cycle(), 11);
    assert_eq!(cpu.io().writes, vec![(0x12BF, 0x12)]);
    assert_eq!(cpu.io().reads, vec![0x127E]);
    assert_eq!(cpu.registers().a(), 0x99);
}

// ============================================================================
//  UNDOCUMENTED OPCODES
// ============================================================================

#[test]
fn sll_shifts_a_one_into_bit_0() {
    let mut cpu = cpu_with(&[0xCB, 0x37]); // SLL A
    cpu.registers_mut().set_a(0x80);
    assert_eq!(cpu.execute_next_cycle(), 8);
    assert_eq!(cpu.registers().a(), 0x01);
    assert!(cpu.registers().flag(Flags::CARRY));
}

#[test]
fn index_halves_are_addressable() {
    let mut cpu = cpu_with(&[
        0xDD, 0x26, 0x12, // LD IXH,12h
        0xDD, 0x2E, 0x34, // LD IXL,34h
        0xFD, 0x26, 0x56, // LD IYH,56h
        0xDD, 0x7C, // LD A,IXH
        0xFD, 0x84, // ADD A,IYH
        0xDD, 0x2C, // INC IXL
    ]);
    assert_eq!(cpu.execute_next_cycle(), 11);
    cpu.execute_next_cycle();
    cpu.execute_next_cycle();
    assert_eq!(cpu.execute_next_cycle(), 8);
    assert_eq!(cpu.execute_next_cycle(), 8);
    assert_eq!(cpu.execute_next_cycle(), 8);
    let status = cpu.status();
    assert_eq!(status.ix, 0x1235);
    assert_eq!(status.iy, 0x5600);
    assert_eq!(cpu.registers().a(), 0x68);
    assert_eq!(status.hl, 0);
}

#[test]
fn indexed_loads_keep_real_h_and_l() {
    let mut cpu = cpu_with(&[
        0xDD, 0x66, 0x01, // LD H,(IX+1)
        0xDD, 0x75, 0xFF, // LD (IX-1),L
    ]);
    cpu.registers_mut().ix.set(0x3000);
    cpu.registers_mut().hl.set(0x00AB);
    cpu.memory_mut().ram[0x3001] = 0x77;
    assert_eq!(cpu.execute_next_cycle(), 19);
    assert_eq!(cpu.execute_next_cycle(), 19);
    assert_eq!(cpu.status().hl, 0x77AB);
    assert_eq!(cpu.status().ix, 0x3000);
    assert_eq!(cpu.memory().ram[0x2FFF], 0xAB);
}

#[test]
fn indexed_memory_read_modify_write() {
    let mut cpu = cpu_with(&[
        0xFD, 0x36, 0xFE, 0x10, // LD (IY-2),10h
        0xFD, 0x34, 0xFE, // INC (IY-2)
        0xFD, 0x86, 0xFE, // ADD A,(IY-2)
        0xFD, 0x35, 0xFE, // DEC (IY-2)
    ]);
    cpu.registers_mut().iy.set(0x4002);
    assert_eq!(cpu.execute_next_cycle(), 19);
    assert_eq!(cpu.memory().ram[0x4000], 0x10);
    assert_eq!(cpu.execute_next_cycle(), 23);
    assert_eq!(cpu.memory().ram[0x4000], 0x11);
    assert_eq!(cpu.execute_next_cycle(), 19);
    assert_eq!(cpu.registers().a(), 0x11);
    assert_eq!(cpu.execute_next_cycle(), 23);
    assert_eq!(cpu.memory().ram[0x4000], 0x10);
    assert_eq!(cpu.pc(), 13);
}

#[test]
fn indexed_rotate_copies_into_register() {
    let mut cpu = cpu_with(&[0xDD, 0xCB, 0x05, 0x00]); // RLC (IX+5),B
    cpu.registers_mut().ix.set(0x3000);
    cpu.memory_mut().ram[0x3005] = 0x81;
    assert_eq!(cpu.execute_next_cycle(), 23);
    assert_eq!(cpu.memory().ram[0x3005], 0x03);
    assert_eq!(cpu.status().bc >> 8, 0x03);
    assert!(cpu.registers().flag(Flags::CARRY));
}

#[test]
fn indexed_bit_test_costs_20() {
    let mut cpu = cpu_with(&[0xFD, 0xCB, 0x00, 0x7E]); // BIT 7,(IY+0)
    cpu.registers_mut().iy.set(0x2800);
    cpu.memory_mut().ram[0x2800] = 0x80;
    assert_eq!(cpu.execute_next_cycle(), 20);
    let f = cpu.registers().flags();
    assert!(!f.contains(Flags::ZERO));
    assert!(f.contains(Flags::SIGN));
    // X/Y from the high byte of IY+d (28h: Y set, X set).
    assert!(f.contains(Flags::Y) && f.contains(Flags::X));
}

#[test]
fn out_c_zero_and_in_c_flags_only() {
    let mut cpu = cpu_with(&[0xED, 0x71, 0xED, 0x70]);
    cpu.registers_mut().bc.set(0x12BE);
    cpu.io_mut().input = 0x00;
    assert_eq!(cpu.execute_next_cycle(), 12);
    assert_eq!(cpu.io().writes, vec![(0x12BE, 0x00)]);

    assert_eq!(cpu.execute_next_cycle(), 12);
    assert!(cpu.registers().flag(Flags::ZERO));
    assert!(cpu.registers().flag(Flags::PARITY_OVERFLOW));
    assert_eq!(cpu.status().bc, 0x12BE);
    assert_eq!(cpu.status().hl, 0);
}

#[test]
fn neg_mirrors_all_negate() {
    for opcode in [0x44, 0x4C, 0x54, 0x5C, 0x64, 0x6C, 0x74, 0x7C] {
        let mut cpu = cpu_with(&[0xED, opcode]);
        cpu.registers_mut().set_a(0x01);
        assert_eq!(cpu.execute_next_cycle(), 8);
        assert_eq!(cpu.registers().a(), 0xFF);
        assert!(cpu.registers().flag(Flags::CARRY));
    }
}

// ============================================================================
//  INSTRUCTION TABLE
// ============================================================================

#[test]
fn table_construction_is_idempotent() {
    let first = InstructionTable::build().unwrap();
    let second = InstructionTable::build().unwrap();
    let a = cpu_with(&[]);
    let b = cpu_with(&[]);
    for kind in TableKind::ALL {
        assert_eq!(first.coverage(kind), second.coverage(kind), "{kind} table");
        assert_eq!(a.table().coverage(kind), b.table().coverage(kind), "{kind} table");
        for opcode in first.coverage(kind) {
            let (x, y) = (first.lookup(kind, opcode).unwrap(), second.lookup(kind, opcode).unwrap());
            assert_eq!((x.name, x.cycles, x.prefix), (y.name, y.cycles, y.prefix));
        }
    }
}

#[test]
fn runs_on_the_log_facade() {
    init_logging();
    let mut memory = FlatMemory::new();
    memory.load(0, &[0x3E, 0x01, 0xDD, 0x00, 0x76]);
    let config = Z80Config { trace_instructions: true, ..Z80Config::default() };
    let mut cpu: Z80<FlatMemory, LatchedIo> =
        Z80::with_config(memory, LatchedIo::new(), LogLogger, config).unwrap();
    let cycles: u32 = (0..3).map(|_| cpu.execute_next_cycle()).sum();
    assert_eq!(cycles, 7 + 4 + 4);
    assert!(cpu.status().halted);
}
