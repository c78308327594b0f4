//! Decoder and execution engine for a 32-bit ARM (ARMv4) instruction subset
//! running out of a flat little-endian RAM.

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
mod bitwise;

#[allow(clippy::cast_possible_truncation)]
pub mod config;
pub mod cpu;

#[allow(clippy::cast_possible_truncation)]
pub mod memory;

pub use config::{MachineConfig, TraceMode};
pub use cpu::fault::Fault;
pub use cpu::machine::{HaltReason, Machine, MachineSnapshot, RunSummary, StepOutcome};
