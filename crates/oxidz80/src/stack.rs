use oxide_core::MemoryBus;

use crate::registers::Registers;
use crate::state::Context;

// ============================================================================
//  PROGRAM COUNTER
// ============================================================================

impl Registers {
    /// Opcode/prefix fetch: `memory[pc]`, then pc += 1 (wrapping).
    #[inline(always)]
    pub fn next_instruction_byte(&mut self, memory: &dyn MemoryBus) -> u8 {
        let value = memory.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }
}

/// Branch displacement as used by JR/DJNZ: 0..=129 forward, 130..=255 back
/// by 126..1.
pub fn relative_offset(offset: u8) -> i16 {
    if offset <= 129 {
        offset as i16
    } else {
        offset as i16 - 256
    }
}

impl Context<'_> {
    /// Immediate operand fetch, recorded for the instruction trace.
    pub fn next_data_byte(&mut self) -> u8 {
        let value = self.state.registers.next_instruction_byte(&*self.memory);
        self.state.operands.record(value);
        value
    }

    /// Little-endian 16-bit immediate.
    pub fn next_two_data_bytes(&mut self) -> u16 {
        let lo = self.next_data_byte() as u16;
        let hi = self.next_data_byte() as u16;
        (hi << 8) | lo
    }

    pub fn jump_by_offset(&mut self, offset: u8) {
        let regs = &mut self.state.registers;
        regs.pc = regs.pc.wrapping_add(relative_offset(offset) as u16);
    }

    /// CALL/RST: push the current PC, then jump.
    pub fn set_and_save_existing(&mut self, address: u16) {
        let pc = self.state.registers.pc;
        self.push(pc);
        self.state.registers.pc = address;
    }

    /// RET
    pub fn set_from_stack(&mut self) {
        self.state.registers.pc = self.pop();
    }

    // ------------------------------------------------------------------------
    //  Stack
    // ------------------------------------------------------------------------

    /// High byte first, at descending addresses.
    pub fn push(&mut self, value: u16) {
        self.decrement_stack_pointer();
        let sp = self.state.registers.sp;
        self.memory.write(sp, (value >> 8) as u8);
        self.decrement_stack_pointer();
        let sp = self.state.registers.sp;
        self.memory.write(sp, (value & 0xFF) as u8);
    }

    /// Low byte first, at ascending addresses.
    pub fn pop(&mut self) -> u16 {
        let lo = self.memory.read(self.state.registers.sp) as u16;
        self.increment_stack_pointer();
        let hi = self.memory.read(self.state.registers.sp) as u16;
        self.increment_stack_pointer();
        (hi << 8) | lo
    }

    /// Bounds of the stack window. SP may sit anywhere in
    /// `[minimum, maximum]`; `maximum` is the empty-stack position.
    fn stack_window(&self) -> (usize, usize) {
        let minimum = self.memory.minimum_available_memory_size();
        let maximum = self.memory.maximum_available_memory_size().min(0x10000);
        (minimum, maximum)
    }

    // SP leaving the window is logged and wraps to the opposite bound.
    fn decrement_stack_pointer(&mut self) {
        let (minimum, maximum) = self.stack_window();
        let sp = match self.state.registers.sp as usize {
            // SP=0 with the full address space is the top of the stack.
            0 if maximum == 0x10000 => maximum,
            sp => sp,
        };
        if sp == 0 || sp - 1 < minimum {
            let wrapped = maximum.saturating_sub(1) as u16;
            self.logger.error(&format!(
                "Stack underflow: SP {sp:04X} decremented below {minimum:04X}, wrapped to {wrapped:04X}"
            ));
            self.state.registers.sp = wrapped;
        } else {
            self.state.registers.sp = (sp - 1) as u16;
        }
    }

    fn increment_stack_pointer(&mut self) {
        let (minimum, maximum) = self.stack_window();
        let sp = self.state.registers.sp as usize;
        if sp + 1 > maximum {
            let wrapped = minimum as u16;
            self.logger.error(&format!(
                "Stack overflow: SP {sp:04X} incremented past {maximum:04X}, wrapped to {wrapped:04X}"
            ));
            self.state.registers.sp = wrapped;
        } else {
            // 0x10000 stores as 0.
            self.state.registers.sp = (sp + 1) as u16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::relative_offset;

    #[test]
    fn relative_offsets() {
        assert_eq!(relative_offset(0), 0);
        assert_eq!(relative_offset(127), 127);
        assert_eq!(relative_offset(129), 129);
        assert_eq!(relative_offset(130), -126);
        assert_eq!(relative_offset(255), -1);
    }
}
