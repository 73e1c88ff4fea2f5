use crate::cycles::Cycles;
use crate::state::Context;

pub type Handler = fn(&mut Context<'_>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    Standard,
    /// DD CB d op / FD CB d op: the displacement byte is read before the
    /// opcode and handed to the handler.
    SpecialCb,
}

/// One table entry. Immutable once the table is built.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub prefix: u8,
    pub opcode: u8,
    pub name: &'static str,
    pub cycles: Cycles,
    pub kind: InstructionKind,
    pub handler: Handler,
}

impl Instruction {
    pub fn description(&self) -> String {
        match self.cycles {
            Cycles::Fixed(n) => format!("{n} cycles"),
            Cycles::Dynamic => "dynamic cycles".to_string(),
        }
    }

    pub fn execute(&self, ctx: &mut Context<'_>) {
        if let Cycles::Fixed(n) = self.cycles {
            ctx.state.cycles.add(n);
        }
        (self.handler)(ctx);
    }
}
