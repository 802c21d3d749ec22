//! # Memory Bus
//!
//! The CPU core never touches memory directly. Everything goes through the
//! [`Bus`] trait, a 16-bit address space of byte reads and writes. Memory
//! maps, ROM, and memory-mapped peripherals all live behind implementations
//! of this trait, outside the core.

use crate::error::{Result, SimError};

/// The address bus as seen by the CPU.
///
/// Reads take `&mut self` because real devices (serial controllers, timers)
/// have read side effects. Every address is valid; open-bus or mirroring
/// behavior is the implementation's concern.
pub trait Bus {
    fn read(&mut self, address: u16) -> u8;
    fn write(&mut self, address: u16, value: u8);
}

/// A flat 64 KiB RAM with no mapped devices.
///
/// This is enough to run raw machine-code images and is what the test suite
/// and the CLI harness wire the CPU to.
pub struct FlatMemory {
    bytes: Box<[u8; 0x10000]>,
}

impl FlatMemory {
    pub fn new() -> Self {
        FlatMemory {
            bytes: Box::new([0; 0x10000]),
        }
    }

    /// Copy a program image into memory starting at `base`.
    pub fn load(&mut self, base: u16, program: &[u8]) -> Result<()> {
        let end = base as usize + program.len();
        if end > self.bytes.len() {
            return Err(SimError::ProgramTooLarge {
                base,
                len: program.len(),
            });
        }
        self.bytes[base as usize..end].copy_from_slice(program);
        Ok(())
    }

    /// Point the reset vector at `address`.
    pub fn set_reset_vector(&mut self, address: u16) {
        self.bytes[crate::cpu::RESET_VECTOR as usize] = address as u8;
        self.bytes[crate::cpu::RESET_VECTOR as usize + 1] = (address >> 8) as u8;
    }

    /// Point the vector used by BRK at `address`.
    pub fn set_irq_vector(&mut self, address: u16) {
        self.bytes[crate::cpu::IRQ_VECTOR as usize] = address as u8;
        self.bytes[crate::cpu::IRQ_VECTOR as usize + 1] = (address >> 8) as u8;
    }
}

impl Bus for FlatMemory {
    fn read(&mut self, address: u16) -> u8 {
        self.bytes[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.bytes[address as usize] = value;
    }
}

impl Default for FlatMemory {
    fn default() -> Self {
        Self::new()
    }
}
