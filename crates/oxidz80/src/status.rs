use crate::interrupts::InterruptMode;

/// Read-only snapshot of the CPU, built on demand by [`crate::Z80::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuStatus {
    /// Cycles of the last step.
    pub cycle_count: u32,
    /// Cycles since the last reset.
    pub total_cycles: u64,
    pub halted: bool,

    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub af_shadow: u16,
    pub bc_shadow: u16,
    pub de_shadow: u16,
    pub hl_shadow: u16,
    pub ix: u16,
    pub iy: u16,
    pub pc: u16,
    pub sp: u16,
    pub i: u8,
    pub r: u8,

    pub iff1: bool,
    pub iff2: bool,
    pub interrupt_mode: InterruptMode,
    pub maskable_interrupt: bool,
    pub non_maskable_interrupt: bool,
}
