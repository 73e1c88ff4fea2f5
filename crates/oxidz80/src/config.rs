/// Top of the Master System work RAM, minus the 16 bytes the BIOS reserves.
pub const SMS_INITIAL_STACK_POINTER: u16 = 0xDFF0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Z80Config {
    /// SP after `reset()`.
    pub initial_stack_pointer: u16,
    /// Emit a trace line per instruction. The logger must also ask for them
    /// through `instruction_logging_enabled()`.
    pub trace_instructions: bool,
}

impl Default for Z80Config {
    fn default() -> Self {
        Self {
            initial_stack_pointer: SMS_INITIAL_STACK_POINTER,
            trace_instructions: false,
        }
    }
}
