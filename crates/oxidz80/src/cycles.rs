/// Cost of an instruction as stored in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycles {
    Fixed(u32),
    /// The handler adds its own cost (taken/not-taken branches, block repeats).
    Dynamic,
}

/// Per-step accumulator plus a running total since reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleCounter {
    current: u32,
    total: u64,
}

impl CycleCounter {
    /// Starts a new step.
    pub fn begin_step(&mut self) {
        self.current = 0;
    }

    pub fn add(&mut self, cycles: u32) {
        self.current += cycles;
        self.total += cycles as u64;
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

// Conditional costs (taken, not taken).
pub const JR_CONDITIONAL: (u32, u32) = (12, 7);
pub const DJNZ: (u32, u32) = (13, 8);
pub const CALL_CONDITIONAL: (u32, u32) = (17, 10);
pub const RET_CONDITIONAL: (u32, u32) = (11, 5);
// Block instructions (repeating, finished).
pub const BLOCK_REPEAT: (u32, u32) = (21, 16);

pub const INTERRUPT: u32 = 11;
pub const NO_OP: u32 = 4;
