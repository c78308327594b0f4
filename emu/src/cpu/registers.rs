//! # Register File
//!
//! Sixteen 32-bit registers.
//!
//! - **R0-R13**: General purpose
//! - **R14 (LR)**: Link register, receives the return address of `BL`
//! - **R15 (PC)**: Program counter
//!
//! The PC stored here already points past the instruction being executed:
//! the fetch loop bumps it by one instruction before dispatching.

use serde::{Deserialize, Serialize};

/// Link Register index (return address for subroutines).
pub const REG_LR: usize = 0xE;

/// Program Counter register index.
pub const REG_PROGRAM_COUNTER: u32 = 0xF;

/// The 16 general-purpose registers, index 15 being the PC.
#[derive(Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers([u32; 16]);

impl Registers {
    #[must_use]
    pub const fn program_counter(&self) -> u32 {
        self.0[REG_PROGRAM_COUNTER as usize]
    }

    pub const fn set_program_counter(&mut self, new_value: u32) {
        self.0[REG_PROGRAM_COUNTER as usize] = new_value;
    }

    pub const fn advance_program_counter(&mut self, bytes: u32) {
        self.0[REG_PROGRAM_COUNTER as usize] =
            self.0[REG_PROGRAM_COUNTER as usize].wrapping_add(bytes);
    }

    /// Register indices come out of 4-bit instruction fields, so anything
    /// above 15 is a decoder bug rather than a property of the program.
    pub fn set_register_at(&mut self, reg: usize, new_value: u32) {
        assert!(reg <= 15, "Invalid register index: {reg} (0x{reg:X})");
        self.0[reg] = new_value;
    }

    #[must_use]
    pub const fn register_at(&self, reg: usize) -> u32 {
        self.0[reg]
    }

    #[must_use]
    pub const fn as_array(&self) -> &[u32; 16] {
        &self.0
    }
}

impl std::fmt::Debug for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, value) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(if idx % 4 == 0 { "\n" } else { " " })?;
            }
            write!(f, "R{idx:<2}={value:08X}")?;
        }
        Ok(())
    }
}
