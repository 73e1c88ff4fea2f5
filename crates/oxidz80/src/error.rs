use thiserror::Error;

use crate::table::TableKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CpuError {
    #[error("Instruction {opcode:#04X} registered twice in the {table} table")]
    DuplicateInstruction { table: TableKind, opcode: u8 },
    #[error("Bit index {0} out of range (0-7)")]
    BitIndexOutOfRange(u8),
}
