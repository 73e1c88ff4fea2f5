//! Intérprete Zilog Z80 con el perfil de interrupciones del SEGA Master System.
//!
//! La CPU es dueña de sus colaboradores (memoria, puertos, logger) y avanza de
//! a un paso lógico por llamada a [`Cpu::execute_next_cycle`].

use std::fmt::Write as _;

use oxide_core::{Cpu, IoBus, LogLogger, Logger, MemoryBus};

pub mod alu;
pub mod config;
pub mod cycles;
pub mod error;
pub mod flags;
mod indexed;
pub mod instruction;
pub mod interrupts;
mod opcodes;
pub mod registers;
mod stack;
pub mod state;
pub mod status;
pub mod table;

pub use config::Z80Config;
pub use error::CpuError;
pub use flags::Flags;
pub use instruction::{Instruction, InstructionKind};
pub use interrupts::InterruptMode;
pub use registers::{Reg16, Reg8, RegisterPair, Registers};
pub use state::{Context, CpuState};
pub use status::CpuStatus;
pub use table::{InstructionTable, TableKind};

// ============================================================================
//  Z80 CORE STRUCTURE
// ============================================================================

pub struct Z80<M: MemoryBus, I: IoBus, L: Logger = LogLogger> {
    state: CpuState,
    memory: M,
    io: I,
    logger: L,
    table: Box<InstructionTable>,
    config: Z80Config,
}

impl<M: MemoryBus, I: IoBus, L: Logger> Z80<M, I, L> {
    pub fn new(memory: M, io: I, logger: L) -> Result<Self, CpuError> {
        Self::with_config(memory, io, logger, Z80Config::default())
    }

    /// Builds the instruction tables and leaves the CPU in its reset state.
    pub fn with_config(memory: M, io: I, logger: L, config: Z80Config) -> Result<Self, CpuError> {
        let table = Box::new(InstructionTable::build()?);
        let mut cpu = Self {
            state: CpuState::default(),
            memory,
            io,
            logger,
            table,
            config,
        };
        cpu.reset();
        Ok(cpu)
    }

    // --- Colaboradores ---
    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn io(&self) -> &I {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut I {
        &mut self.io
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut L {
        &mut self.logger
    }

    pub fn config(&self) -> &Z80Config {
        &self.config
    }

    pub fn table(&self) -> &InstructionTable {
        &self.table
    }

    // --- Estado ---
    pub fn state(&self) -> &CpuState {
        &self.state
    }

    /// Direct register access for debuggers and test harnesses.
    pub fn state_mut(&mut self) -> &mut CpuState {
        &mut self.state
    }

    pub fn registers(&self) -> &Registers {
        &self.state.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.state.registers
    }

    pub fn status(&self) -> CpuStatus {
        let regs = &self.state.registers;
        let interrupts = &self.state.interrupts;
        CpuStatus {
            cycle_count: self.state.cycles.current(),
            total_cycles: self.state.cycles.total(),
            halted: self.state.halted,
            af: regs.af.word(),
            bc: regs.bc.word(),
            de: regs.de.word(),
            hl: regs.hl.word(),
            af_shadow: regs.af.shadow().word(),
            bc_shadow: regs.bc.shadow().word(),
            de_shadow: regs.de.shadow().word(),
            hl_shadow: regs.hl.shadow().word(),
            ix: regs.ix.word(),
            iy: regs.iy.word(),
            pc: regs.pc,
            sp: regs.sp,
            i: regs.i,
            r: regs.r,
            iff1: interrupts.iff1(),
            iff2: interrupts.iff2(),
            interrupt_mode: interrupts.mode(),
            maskable_interrupt: self.io.maskable_interrupt(),
            non_maskable_interrupt: self.io.non_maskable_interrupt(),
        }
    }
}

impl<M: MemoryBus, I: IoBus, L: Logger> Cpu for Z80<M, I, L> {
    fn reset(&mut self) {
        self.state.reset(self.config.initial_stack_pointer);
    }

    fn execute_next_cycle(&mut self) -> u32 {
        let Self {
            state,
            memory,
            io,
            logger,
            table,
            config,
        } = self;
        state.cycles.begin_step();

        let mut ctx = Context {
            state,
            memory,
            io,
            logger,
            opcode: 0,
            displacement: 0,
        };

        // 1. Interrupciones (NMI primero)
        if let Some(cost) = ctx.service_interrupts() {
            ctx.state.cycles.add(cost);
            return ctx.state.cycles.current();
        }

        // 2. HALT: NOPs hasta que llegue una interrupción
        if ctx.state.halted {
            ctx.state.cycles.add(cycles::NO_OP);
            return ctx.state.cycles.current();
        }

        // 3. Fetch / decode / execute
        decode_and_execute(&mut ctx, table, config.trace_instructions);
        ctx.state.cycles.current()
    }

    fn pc(&self) -> u16 {
        self.state.registers.pc
    }
}

// ============================================================================
//  DECODE
// ============================================================================

/// Bytes that selected one instruction.
struct Decoded {
    table: TableKind,
    opcode: u8,
    displacement: u8,
}

impl Decoded {
    fn opcode_text(&self) -> String {
        match self.table {
            TableKind::Main => format!("{:02X}", self.opcode),
            TableKind::DdCb | TableKind::FdCb => format!("{:02X} CB", self.table.prefix()),
            _ => format!("{:02X} {:02X}", self.table.prefix(), self.opcode),
        }
    }
}

fn fetch_opcode(ctx: &mut Context<'_>) -> Decoded {
    let regs = &mut ctx.state.registers;
    let first = regs.next_instruction_byte(&*ctx.memory);
    let (table, refresh) = match first {
        0xCB => (TableKind::Cb, 2),
        0xED => (TableKind::Ed, 2),
        0xDD => (TableKind::Dd, 2),
        0xFD => (TableKind::Fd, 2),
        _ => {
            regs.increment_refresh(1);
            return Decoded {
                table: TableKind::Main,
                opcode: first,
                displacement: 0,
            };
        }
    };
    regs.increment_refresh(refresh);
    let second = regs.next_instruction_byte(&*ctx.memory);

    match (table, second) {
        // DD CB d op: the displacement comes before the opcode. Both are
        // operand data for the trace.
        (TableKind::Dd | TableKind::Fd, 0xCB) => {
            let displacement = ctx.next_data_byte();
            let opcode = ctx.next_data_byte();
            let table = if table == TableKind::Dd {
                TableKind::DdCb
            } else {
                TableKind::FdCb
            };
            Decoded {
                table,
                opcode,
                displacement,
            }
        }
        _ => Decoded {
            table,
            opcode: second,
            displacement: 0,
        },
    }
}

fn decode_and_execute(ctx: &mut Context<'_>, table: &InstructionTable, trace: bool) {
    let address = ctx.state.registers.pc;
    ctx.state.operands.clear();
    let decoded = fetch_opcode(ctx);

    let Some(instruction) = table.lookup(decoded.table, decoded.opcode).copied() else {
        ctx.logger.error(&format!(
            "Unhandled opcode {} at {address:04X}",
            unhandled_text(&decoded)
        ));
        ctx.state.cycles.add(cycles::NO_OP);
        return;
    };

    ctx.opcode = decoded.opcode;
    ctx.displacement = decoded.displacement;
    instruction.execute(ctx);

    if trace && ctx.logger.instruction_logging_enabled() {
        let mut operands = String::new();
        for (i, byte) in ctx.state.operands.as_slice().iter().enumerate() {
            if i > 0 {
                operands.push(' ');
            }
            let _ = write!(operands, "{byte:02X}");
        }
        ctx.logger.log_instruction(
            address,
            &decoded.opcode_text(),
            instruction.name,
            &instruction.description(),
            &operands,
        );
    }
}

fn unhandled_text(decoded: &Decoded) -> String {
    match decoded.table {
        TableKind::DdCb | TableKind::FdCb => format!(
            "{:02X} CB {:02X} {:02X}",
            decoded.table.prefix(),
            decoded.displacement,
            decoded.opcode
        ),
        _ => decoded.opcode_text(),
    }
}
