//! Colaboradores sustitutos para tests: memoria plana, puertos grabados y
//! un logger que guarda todo lo que recibe.

use crate::{InterruptLatch, IoBus, Logger, MemoryBus};

// ============================================================================
//  MEMORIA PLANA (64KB)
// ============================================================================

pub struct FlatMemory {
    pub ram: Box<[u8; 0x10000]>,
    pub minimum: usize,
    pub maximum: usize,
}

impl FlatMemory {
    pub fn new() -> Self {
        Self {
            ram: Box::new([0; 0x10000]),
            minimum: 0,
            maximum: 0x10000,
        }
    }

    /// Memoria con límites de pila explícitos (ej. RAM del Master System).
    pub fn with_stack_bounds(minimum: usize, maximum: usize) -> Self {
        Self {
            minimum,
            maximum,
            ..Self::new()
        }
    }

    pub fn load(&mut self, address: u16, program: &[u8]) {
        for (i, &byte) in program.iter().enumerate() {
            self.ram[(address as usize + i) & 0xFFFF] = byte;
        }
    }
}

impl Default for FlatMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus for FlatMemory {
    fn read(&self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }

    fn minimum_available_memory_size(&self) -> usize {
        self.minimum
    }

    fn maximum_available_memory_size(&self) -> usize {
        self.maximum
    }
}

// ============================================================================
//  I/O CON PUERTOS GRABADOS
// ============================================================================

/// Devuelve `input` en cada lectura (0xFF = bus flotante) y graba cada
/// escritura como `(puerto, valor)`.
pub struct LatchedIo {
    pub latch: InterruptLatch,
    pub input: u8,
    pub reads: Vec<u16>,
    pub writes: Vec<(u16, u8)>,
}

impl LatchedIo {
    pub fn new() -> Self {
        Self {
            latch: InterruptLatch::new(),
            input: 0xFF,
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }
}

impl Default for LatchedIo {
    fn default() -> Self {
        Self::new()
    }
}

impl IoBus for LatchedIo {
    fn read_port(&mut self, port: u16) -> u8 {
        self.reads.push(port);
        self.input
    }

    fn write_port(&mut self, port: u16, value: u8) {
        self.writes.push((port, value));
    }

    fn maskable_interrupt(&self) -> bool {
        self.latch.maskable()
    }

    fn non_maskable_interrupt(&self) -> bool {
        self.latch.non_maskable()
    }

    fn set_maskable_interrupt(&mut self) {
        self.latch.set_maskable();
    }

    fn clear_maskable_interrupt(&mut self) {
        self.latch.clear_maskable();
    }

    fn set_non_maskable_interrupt(&mut self) {
        self.latch.set_non_maskable();
    }

    fn clear_non_maskable_interrupt(&mut self) {
        self.latch.clear_non_maskable();
    }
}

// ============================================================================
//  LOGGER QUE GRABA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine {
    pub address: u16,
    pub opcode_text: String,
    pub name: String,
    pub description: String,
    pub operand_data_text: String,
}

#[derive(Debug, Default)]
pub struct RecordingLogger {
    pub trace_enabled: bool,
    pub errors: Vec<String>,
    pub debug_lines: Vec<String>,
    pub traces: Vec<TraceLine>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger que además pide las trazas de instrucciones.
    pub fn tracing() -> Self {
        Self {
            trace_enabled: true,
            ..Self::default()
        }
    }
}

impl Logger for RecordingLogger {
    fn log_instruction(
        &mut self,
        address: u16,
        opcode_text: &str,
        name: &str,
        description: &str,
        operand_data_text: &str,
    ) {
        self.traces.push(TraceLine {
            address,
            opcode_text: opcode_text.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            operand_data_text: operand_data_text.to_string(),
        });
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn debug(&mut self, message: &str) {
        self.debug_lines.push(message.to_string());
    }

    fn instruction_logging_enabled(&self) -> bool {
        self.trace_enabled
    }
}
