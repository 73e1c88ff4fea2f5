use std::fmt;

use crate::cycles::Cycles;
use crate::error::CpuError;
use crate::instruction::{Handler, Instruction, InstructionKind};
use crate::opcodes::{self, Ix, Iy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Main,
    Cb,
    Dd,
    Ed,
    Fd,
    DdCb,
    FdCb,
}

impl TableKind {
    pub const ALL: [TableKind; 7] = [
        TableKind::Main,
        TableKind::Cb,
        TableKind::Dd,
        TableKind::Ed,
        TableKind::Fd,
        TableKind::DdCb,
        TableKind::FdCb,
    ];

    /// Prefix byte stored in each entry (0 for unprefixed).
    pub fn prefix(self) -> u8 {
        match self {
            TableKind::Main => 0x00,
            TableKind::Cb => 0xCB,
            TableKind::Dd | TableKind::DdCb => 0xDD,
            TableKind::Ed => 0xED,
            TableKind::Fd | TableKind::FdCb => 0xFD,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::Main => "unprefixed",
            TableKind::Cb => "CB",
            TableKind::Dd => "DD",
            TableKind::Ed => "ED",
            TableKind::Fd => "FD",
            TableKind::DdCb => "DD CB",
            TableKind::FdCb => "FD CB",
        };
        f.write_str(name)
    }
}

/// Which 3-bit field a masked run varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Bits 0-2: opcodes `first..first+8`.
    Source,
    /// Bits 3-5: opcodes `first, first+8, ... first+56`.
    Destination,
}

type Slots = [Option<Instruction>; 256];

// ============================================================================
//  INSTRUCTION TABLE
// ============================================================================

/// Seven 256-slot tables indexed directly by opcode byte.
pub struct InstructionTable {
    main: Slots,
    cb: Slots,
    dd: Slots,
    ed: Slots,
    fd: Slots,
    dd_cb: Slots,
    fd_cb: Slots,
}

impl InstructionTable {
    fn empty() -> Self {
        Self {
            main: [None; 256],
            cb: [None; 256],
            dd: [None; 256],
            ed: [None; 256],
            fd: [None; 256],
            dd_cb: [None; 256],
            fd_cb: [None; 256],
        }
    }

    pub fn build() -> Result<Self, CpuError> {
        let mut table = Self::empty();
        opcodes::main::register(&mut table)?;
        opcodes::cb::register(&mut table)?;
        opcodes::ed::register(&mut table)?;
        opcodes::index::register::<Ix>(&mut table)?;
        opcodes::index::register::<Iy>(&mut table)?;
        opcodes::index_cb::register::<Ix>(&mut table)?;
        opcodes::index_cb::register::<Iy>(&mut table)?;
        Ok(table)
    }

    pub fn lookup(&self, kind: TableKind, opcode: u8) -> Option<&Instruction> {
        self.slots(kind)[opcode as usize].as_ref()
    }

    /// Populated opcodes of one table, ascending.
    pub fn coverage(&self, kind: TableKind) -> Vec<u8> {
        self.slots(kind)
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(opcode, _)| opcode as u8)
            .collect()
    }

    fn slots(&self, kind: TableKind) -> &Slots {
        match kind {
            TableKind::Main => &self.main,
            TableKind::Cb => &self.cb,
            TableKind::Dd => &self.dd,
            TableKind::Ed => &self.ed,
            TableKind::Fd => &self.fd,
            TableKind::DdCb => &self.dd_cb,
            TableKind::FdCb => &self.fd_cb,
        }
    }

    fn slots_mut(&mut self, kind: TableKind) -> &mut Slots {
        match kind {
            TableKind::Main => &mut self.main,
            TableKind::Cb => &mut self.cb,
            TableKind::Dd => &mut self.dd,
            TableKind::Ed => &mut self.ed,
            TableKind::Fd => &mut self.fd,
            TableKind::DdCb => &mut self.dd_cb,
            TableKind::FdCb => &mut self.fd_cb,
        }
    }

    // ------------------------------------------------------------------------
    //  Registration
    // ------------------------------------------------------------------------

    fn insert(
        &mut self,
        kind: TableKind,
        opcode: u8,
        name: &'static str,
        cycles: Cycles,
        instruction_kind: InstructionKind,
        handler: Handler,
    ) -> Result<(), CpuError> {
        let slot = &mut self.slots_mut(kind)[opcode as usize];
        if slot.is_some() {
            return Err(CpuError::DuplicateInstruction { table: kind, opcode });
        }
        *slot = Some(Instruction {
            prefix: kind.prefix(),
            opcode,
            name,
            cycles,
            kind: instruction_kind,
            handler,
        });
        Ok(())
    }

    /// Unprefixed instruction.
    pub(crate) fn add_standard(
        &mut self,
        opcode: u8,
        name: &'static str,
        cycles: Cycles,
        handler: Handler,
    ) -> Result<(), CpuError> {
        self.insert(TableKind::Main, opcode, name, cycles, InstructionKind::Standard, handler)
    }

    /// CB, DD, ED or FD prefixed instruction.
    pub(crate) fn add_double_byte(
        &mut self,
        kind: TableKind,
        opcode: u8,
        name: &'static str,
        cycles: Cycles,
        handler: Handler,
    ) -> Result<(), CpuError> {
        self.insert(kind, opcode, name, cycles, InstructionKind::Standard, handler)
    }

    /// DD CB d op / FD CB d op.
    pub(crate) fn add_special_cb(
        &mut self,
        kind: TableKind,
        opcode: u8,
        name: &'static str,
        cycles: u32,
        handler: Handler,
    ) -> Result<(), CpuError> {
        self.insert(
            kind,
            opcode,
            name,
            Cycles::Fixed(cycles),
            InstructionKind::SpecialCb,
            handler,
        )
    }

    /// Registers the eight opcodes of a register-select run sharing one
    /// handler. Field value 6 is `(HL)`: it costs `memory_cycles`, or is left
    /// out of the run when that is `None`.
    pub(crate) fn add_with_mask(
        &mut self,
        kind: TableKind,
        first: u8,
        field: Field,
        name: &'static str,
        cycles: u32,
        memory_cycles: Option<u32>,
        handler: Handler,
    ) -> Result<(), CpuError> {
        for select in 0..8u8 {
            let opcode = match field {
                Field::Source => first + select,
                Field::Destination => first + (select << 3),
            };
            let cost = match (select, memory_cycles) {
                (6, Some(memory)) => memory,
                (6, None) => continue,
                _ => cycles,
            };
            let cycles = Cycles::Fixed(cost);
            self.insert(kind, opcode, name, cycles, InstructionKind::Standard, handler)?;
        }
        Ok(())
    }

    /// Four opcodes 16 apart (the rr field, bits 4-5).
    pub(crate) fn add_pair_run(
        &mut self,
        kind: TableKind,
        first: u8,
        name: &'static str,
        cycles: Cycles,
        handler: Handler,
    ) -> Result<(), CpuError> {
        for pair in 0..4u8 {
            let opcode = first + (pair << 4);
            self.insert(kind, opcode, name, cycles, InstructionKind::Standard, handler)?;
        }
        Ok(())
    }
}
