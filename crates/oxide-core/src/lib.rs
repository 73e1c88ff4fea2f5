#[cfg(feature = "test-utils")]
pub mod testing;

// ============================================================================
//  CONTRACTS (TRAITS)
// ============================================================================

/// Representa cualquier dispositivo capaz de ejecutar instrucciones (CPU).
///
/// Los buses se inyectan en la construcción, por eso `execute_next_cycle`
/// no recibe parámetros.
pub trait Cpu {
    /// Reinicio en frío (Power On)
    fn reset(&mut self);

    /// Ejecuta una instrucción, una interrupción o un ciclo de HALT.
    /// Retorna la cantidad de ciclos consumidos (nunca menos de 4).
    fn execute_next_cycle(&mut self) -> u32;

    /// Debugging: Obtener el Program Counter actual
    fn pc(&self) -> u16;
}

/// Contrato del bus de memoria visto por la CPU.
pub trait MemoryBus {
    fn read(&self, address: u16) -> u8;
    fn write(&mut self, address: u16, value: u8);

    /// Dirección más baja de RAM utilizable por la pila.
    /// Puede cambiar con el bank-switching: consultarla siempre, no cachearla.
    fn minimum_available_memory_size(&self) -> usize {
        0
    }

    /// Límite superior (exclusivo) de RAM utilizable por la pila.
    fn maximum_available_memory_size(&self) -> usize {
        0x10000
    }

    // Lectura 16-bit Little Endian (Zilog Z80, Intel)
    fn read_u16_le(&self, address: u16) -> u16 {
        let lo = self.read(address) as u16;
        let hi = self.read(address.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    // Escritura 16-bit Little Endian
    fn write_u16_le(&mut self, address: u16, value: u16) {
        self.write(address, (value & 0xFF) as u8);
        self.write(address.wrapping_add(1), (value >> 8) as u8);
    }
}

/// Contrato del bus de I/O: puertos y líneas de interrupción.
///
/// Las líneas son "pegajosas": el dispositivo las levanta y la CPU las
/// limpia cuando atiende la interrupción.
pub trait IoBus {
    fn read_port(&mut self, port: u16) -> u8;
    fn write_port(&mut self, port: u16, value: u8);

    fn maskable_interrupt(&self) -> bool;
    fn non_maskable_interrupt(&self) -> bool;
    fn set_maskable_interrupt(&mut self);
    fn clear_maskable_interrupt(&mut self);
    fn set_non_maskable_interrupt(&mut self);
    fn clear_non_maskable_interrupt(&mut self);
}

/// Observador de la ejecución. Nunca altera el flujo de control.
pub trait Logger {
    fn log_instruction(
        &mut self,
        address: u16,
        opcode_text: &str,
        name: &str,
        description: &str,
        operand_data_text: &str,
    );
    fn error(&mut self, message: &str);
    fn debug(&mut self, message: &str);

    /// Permite a la CPU evitar formatear trazas que nadie va a leer.
    fn instruction_logging_enabled(&self) -> bool {
        false
    }
}

// ============================================================================
//  INTERRUPT LATCH
// ============================================================================

/// Par de flags de interrupción que los dispositivos de I/O embeben.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterruptLatch {
    maskable: bool,
    non_maskable: bool,
}

impl InterruptLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn maskable(&self) -> bool {
        self.maskable
    }

    pub fn non_maskable(&self) -> bool {
        self.non_maskable
    }

    pub fn set_maskable(&mut self) {
        self.maskable = true;
    }

    pub fn clear_maskable(&mut self) {
        self.maskable = false;
    }

    pub fn set_non_maskable(&mut self) {
        self.non_maskable = true;
    }

    pub fn clear_non_maskable(&mut self) {
        self.non_maskable = false;
    }
}

// ============================================================================
//  LOGGER POR DEFECTO (log crate)
// ============================================================================

/// Logger que reenvía todo a la fachada `log`.
/// Las trazas de instrucciones van al target `oxidz80::trace` en nivel TRACE.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLogger;

impl Logger for LogLogger {
    fn log_instruction(
        &mut self,
        address: u16,
        opcode_text: &str,
        name: &str,
        description: &str,
        operand_data_text: &str,
    ) {
        log::trace!(
            target: "oxidz80::trace",
            "{address:04X}: {opcode_text:<6} {name:<14} {operand_data_text:<6} ; {description}"
        );
    }

    fn error(&mut self, message: &str) {
        log::error!("{message}");
    }

    fn debug(&mut self, message: &str) {
        log::debug!("{message}");
    }

    fn instruction_logging_enabled(&self) -> bool {
        log::log_enabled!(target: "oxidz80::trace", log::Level::Trace)
    }
}
