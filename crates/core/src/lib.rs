//! # sim6502 Core
//!
//! Instruction-set simulator for the MOS 6502. The crate provides the CPU
//! engine only: register and flag state, instruction dispatch, arithmetic
//! (binary and BCD), stack and interrupt discipline, and a trace formatter.
//! Memory and memory-mapped devices are supplied by the embedder through
//! the [`Bus`] trait; [`FlatMemory`] is a plain 64 KiB RAM for tests and
//! simple machines.
//!
//! ```
//! use sim6502_core::{Cpu, FlatMemory, DEFAULT_BASE_ADDRESS};
//!
//! let mut memory = FlatMemory::new();
//! memory.load(DEFAULT_BASE_ADDRESS, &[0xa9, 0x42]).unwrap(); // LDA #$42
//! memory.set_reset_vector(DEFAULT_BASE_ADDRESS);
//!
//! let mut cpu = Cpu::new(memory);
//! cpu.reset();
//! cpu.step();
//! assert_eq!(cpu.a(), 0x42);
//! ```

pub mod bus;
pub mod cpu;
pub mod error;
pub mod instruction;

pub use bus::{Bus, FlatMemory};
pub use cpu::{Cpu, DEFAULT_BASE_ADDRESS, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR};
pub use error::{Result, SimError};
