//! Memory control registers: expansion/RAM timing config (`$1F801000`-`$1F801020`)
//! and the RAM_SIZE register (`$1F801060`)
//!
//! These registers configure bus timing for the expansion regions and cache
//! control knobs that real software pokes at startup but that have no effect
//! on emulated behavior; we just store whatever is written and echo it back.

use bincode::{Decode, Encode};

const REGISTER_COUNT: usize = 9;

#[derive(Debug, Clone, Encode, Decode)]
pub struct MemoryControl {
    registers: [u32; REGISTER_COUNT],
    ram_size: u32,
}

impl MemoryControl {
    pub fn new() -> Self {
        Self { registers: [0; REGISTER_COUNT], ram_size: 0 }
    }

    pub fn read_register(&self, address: u32) -> u32 {
        let idx = register_index(address);
        self.registers[idx]
    }

    pub fn write_register(&mut self, address: u32, value: u32) {
        let idx = register_index(address);
        self.registers[idx] = value;

        log::debug!("Memory control register {idx} write: {value:08X}");
    }

    pub fn read_ram_size(&self) -> u32 {
        self.ram_size
    }

    pub fn write_ram_size(&mut self, value: u32) {
        self.ram_size = value;

        log::debug!("RAM_SIZE write: {value:08X}");
    }
}

impl Default for MemoryControl {
    fn default() -> Self {
        Self::new()
    }
}

fn register_index(address: u32) -> usize {
    (((address & 0xFFFF) - 0x1000) / 4) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_register_writes() {
        let mut memory_control = MemoryControl::new();
        memory_control.write_register(0x1F801008, 0x1325);
        assert_eq!(memory_control.read_register(0x1F801008), 0x1325);
    }

    #[test]
    fn round_trips_ram_size() {
        let mut memory_control = MemoryControl::new();
        memory_control.write_ram_size(0x0B88);
        assert_eq!(memory_control.read_ram_size(), 0x0B88);
    }
}
