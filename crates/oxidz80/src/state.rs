use oxide_core::{IoBus, Logger, MemoryBus};

use crate::cycles::CycleCounter;
use crate::interrupts::InterruptController;
use crate::registers::{Operand, Reg8, Registers};

// ============================================================================
//  CPU STATE
// ============================================================================

/// Everything the instruction handlers and the interrupt controller mutate.
#[derive(Debug, Clone, Default)]
pub struct CpuState {
    pub registers: Registers,
    pub interrupts: InterruptController,
    pub halted: bool,
    pub cycles: CycleCounter,
    pub(crate) operands: OperandTrace,
}

impl CpuState {
    /// Power-on values: everything zero except SP.
    pub fn reset(&mut self, stack_pointer: u16) {
        *self = Self::default();
        self.registers.sp = stack_pointer;
    }
}

/// Operand bytes read through the data-byte path during one instruction.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct OperandTrace {
    bytes: [u8; 4],
    len: usize,
}

impl OperandTrace {
    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn record(&mut self, byte: u8) {
        if self.len < self.bytes.len() {
            self.bytes[self.len] = byte;
            self.len += 1;
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

// ============================================================================
//  EXECUTION CONTEXT
// ============================================================================

/// What a handler sees: the CPU state, both buses, the logger and the bytes
/// that selected it.
pub struct Context<'a> {
    pub state: &'a mut CpuState,
    pub memory: &'a mut dyn MemoryBus,
    pub io: &'a mut dyn IoBus,
    pub logger: &'a mut dyn Logger,
    pub opcode: u8,
    /// Displacement byte of the DD CB / FD CB forms, 0 otherwise.
    pub displacement: u8,
}

impl Context<'_> {
    #[inline(always)]
    pub fn regs(&mut self) -> &mut Registers {
        &mut self.state.registers
    }

    #[inline(always)]
    pub fn read(&self, address: u16) -> u8 {
        self.memory.read(address)
    }

    #[inline(always)]
    pub fn write(&mut self, address: u16, value: u8) {
        self.memory.write(address, value);
    }

    pub fn hl(&self) -> u16 {
        self.state.registers.hl.word()
    }

    /// Reads a register, or `(HL)` for the memory operand.
    pub fn read_operand(&self, operand: Operand) -> u8 {
        match operand {
            Operand::Register(reg) => self.state.registers.get8(reg),
            Operand::Memory => self.memory.read(self.hl()),
        }
    }

    pub fn write_operand(&mut self, operand: Operand, value: u8) {
        match operand {
            Operand::Register(reg) => self.state.registers.set8(reg, value),
            Operand::Memory => {
                let address = self.hl();
                self.memory.write(address, value);
            }
        }
    }

    pub fn get8(&self, reg: Reg8) -> u8 {
        self.state.registers.get8(reg)
    }

    pub fn set8(&mut self, reg: Reg8, value: u8) {
        self.state.registers.set8(reg, value);
    }

    /// Adds the taken or not-taken cost of a dynamic instruction.
    pub fn add_branch_cycles(&mut self, taken: bool, costs: (u32, u32)) {
        self.state.cycles.add(if taken { costs.0 } else { costs.1 });
    }
}
