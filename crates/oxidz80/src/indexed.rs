use oxide_core::MemoryBus;

use crate::alu::BitIndex;
use crate::registers::RegisterPair;

// ============================================================================
//  (IX+d) / (IY+d) MEMORY ACCESS
// ============================================================================

impl RegisterPair {
    /// Base plus the two's-complement displacement `offset`.
    pub fn indexed_address(&self, offset: u8) -> u16 {
        self.word().wrapping_add(offset as i8 as u16)
    }

    pub fn read_by_register_location(&self, memory: &dyn MemoryBus, offset: u8) -> u8 {
        memory.read(self.indexed_address(offset))
    }

    pub fn write_by_register_location(&self, memory: &mut dyn MemoryBus, offset: u8, value: u8) {
        memory.write(self.indexed_address(offset), value);
    }

    /// SET b,(rr+d). Returns the byte written.
    pub fn set_bit_by_register_location(
        &self,
        memory: &mut dyn MemoryBus,
        bit: BitIndex,
        offset: u8,
    ) -> u8 {
        let address = self.indexed_address(offset);
        let value = bit.set(memory.read(address));
        memory.write(address, value);
        value
    }

    /// RES b,(rr+d). Returns the byte written.
    pub fn reset_bit_by_register_location(
        &self,
        memory: &mut dyn MemoryBus,
        bit: BitIndex,
        offset: u8,
    ) -> u8 {
        let address = self.indexed_address(offset);
        let value = bit.reset(memory.read(address));
        memory.write(address, value);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ram(Vec<u8>);

    impl MemoryBus for Ram {
        fn read(&self, address: u16) -> u8 {
            self.0[address as usize]
        }
        fn write(&mut self, address: u16, value: u8) {
            self.0[address as usize] = value;
        }
    }

    #[test]
    fn displacement_is_signed() {
        let ix = RegisterPair::new(0x1000);
        assert_eq!(ix.indexed_address(0x7F), 0x107F);
        assert_eq!(ix.indexed_address(0x80), 0x0F80);
        assert_eq!(ix.indexed_address(0xFF), 0x0FFF);
        assert_eq!(RegisterPair::new(0xFFFF).indexed_address(0x01), 0x0000);
    }

    #[test]
    fn reads_and_writes_at_the_displaced_address() {
        let mut ram = Ram(vec![0; 0x10000]);
        let iy = RegisterPair::new(0x3000);
        iy.write_by_register_location(&mut ram, 0xFE, 0x5A);
        assert_eq!(ram.0[0x2FFE], 0x5A);
        assert_eq!(iy.read_by_register_location(&ram, 0xFE), 0x5A);
    }

    #[test]
    fn reset_and_set_bits_in_memory() {
        let mut ram = Ram(vec![0; 0x10000]);
        ram.0[0x2002] = 0xFF;
        let ix = RegisterPair::new(0x2000);
        let bit0 = BitIndex::new(0).unwrap();
        assert_eq!(ix.reset_bit_by_register_location(&mut ram, bit0, 2), 0xFE);
        assert_eq!(ram.0[0x2002], 0xFE);
        assert_eq!(ix.set_bit_by_register_location(&mut ram, bit0, 2), 0xFF);
    }
}
