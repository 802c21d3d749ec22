//! Error types.
//!
//! The execution engine itself is total: `step()` and `reset()` never fail.
//! Errors only arise on the loading side, before the CPU runs.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("program of {len} bytes does not fit in memory at ${base:04X}")]
    ProgramTooLarge { base: u16, len: usize },
}

pub type Result<T> = std::result::Result<T, SimError>;
