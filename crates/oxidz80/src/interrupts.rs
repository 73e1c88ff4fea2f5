use crate::cycles;
use crate::state::Context;

const NMI_VECTOR: u16 = 0x0066;
const IRQ_VECTOR: u16 = 0x0038;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InterruptMode {
    #[default]
    Mode0,
    Mode1,
    Mode2,
}

impl InterruptMode {
    pub fn as_u8(self) -> u8 {
        match self {
            InterruptMode::Mode0 => 0,
            InterruptMode::Mode1 => 1,
            InterruptMode::Mode2 => 2,
        }
    }
}

// ============================================================================
//  INTERRUPT CONTROLLER
// ============================================================================

/// IFF1 gates maskable interrupts; IFF2 keeps its value across an NMI so
/// RETN can restore it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterruptController {
    iff1: bool,
    iff2: bool,
    mode: InterruptMode,
}

impl InterruptController {
    pub fn iff1(&self) -> bool {
        self.iff1
    }

    pub fn iff2(&self) -> bool {
        self.iff2
    }

    pub fn mode(&self) -> InterruptMode {
        self.mode
    }

    /// EI
    pub fn enable(&mut self) {
        self.iff1 = true;
        self.iff2 = true;
    }

    /// DI
    pub fn disable(&mut self) {
        self.iff1 = false;
        self.iff2 = false;
    }

    pub fn set_mode(&mut self, mode: InterruptMode) {
        self.mode = mode;
    }

    /// RETN
    pub fn restore_from_backup(&mut self) {
        self.iff1 = self.iff2;
    }

    fn accept_nmi(&mut self) {
        self.iff2 = self.iff1;
        self.iff1 = false;
    }
}

impl Context<'_> {
    /// Services a pending NMI, or a maskable interrupt when IFF1 allows it.
    /// Returns the cycles consumed, or `None` when nothing was serviced.
    pub(crate) fn service_interrupts(&mut self) -> Option<u32> {
        if self.io.non_maskable_interrupt() {
            self.io.clear_non_maskable_interrupt();
            self.state.interrupts.accept_nmi();
            self.state.halted = false;
            let pc = self.state.registers.pc;
            self.logger
                .debug(&format!("NMI serviced at PC={pc:04X}, jumping to {NMI_VECTOR:04X}"));
            self.set_and_save_existing(NMI_VECTOR);
            return Some(cycles::INTERRUPT);
        }

        if !(self.state.interrupts.iff1() && self.io.maskable_interrupt()) {
            return None;
        }

        self.io.clear_maskable_interrupt();
        let pc = self.state.registers.pc;
        match self.state.interrupts.mode() {
            // Mode 0 always reads 0xFF from the data bus here: RST 38H.
            InterruptMode::Mode0 | InterruptMode::Mode1 => {
                self.state.interrupts.disable();
                self.state.halted = false;
                self.logger.debug(&format!(
                    "IRQ serviced at PC={pc:04X} (IM {}), jumping to {IRQ_VECTOR:04X}",
                    self.state.interrupts.mode().as_u8()
                ));
                self.set_and_save_existing(IRQ_VECTOR);
                Some(cycles::INTERRUPT)
            }
            InterruptMode::Mode2 => {
                self.logger.error(&format!(
                    "Interrupt mode 2 is not supported on this hardware (PC={pc:04X}); request dropped"
                ));
                Some(cycles::NO_OP)
            }
        }
    }
}
