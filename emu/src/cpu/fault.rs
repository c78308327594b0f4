use thiserror::Error;

use crate::cpu::arm::category::InstructionCategory;
use crate::memory::MemoryFault;

/// Reasons the engine stops before PC leaves RAM.
///
/// Every variant carries the address of the instruction that caused it,
/// which is PC minus one instruction at the time of the fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("memory fault at instruction 0x{address_of_instruction:08X}: {source}")]
    Memory {
        address_of_instruction: u32,
        #[source]
        source: MemoryFault,
    },

    #[error("undefined instruction 0x{word:08X} at 0x{address:08X}")]
    Undefined { address: u32, word: u32 },

    #[error("unimplemented {category} instruction 0x{word:08X} at 0x{address:08X}")]
    Unimplemented {
        address: u32,
        word: u32,
        category: InstructionCategory,
    },
}

impl Fault {
    /// Address of the faulting instruction.
    #[must_use]
    pub const fn address(&self) -> u32 {
        match self {
            Self::Memory {
                address_of_instruction,
                ..
            } => *address_of_instruction,
            Self::Undefined { address, .. } | Self::Unimplemented { address, .. } => *address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn messages() {
        let fault = Fault::Unimplemented {
            address: 0x10,
            word: 0xEF00_0000,
            category: InstructionCategory::SoftwareInterrupt,
        };
        assert_eq!(
            fault.to_string(),
            "unimplemented software interrupt instruction 0xEF000000 at 0x00000010"
        );

        let fault = Fault::Memory {
            address_of_instruction: 4,
            source: MemoryFault::OutOfBounds {
                address: 0x100,
                width: 4,
                size: 0x100,
            },
        };
        assert_eq!(
            fault.to_string(),
            "memory fault at instruction 0x00000004: 4-byte access at 0x00000100 is outside RAM (0x100 bytes)"
        );
        assert_eq!(fault.address(), 4);
    }

    #[test]
    fn memory_fault_is_the_source() {
        use std::error::Error;

        let fault = Fault::Memory {
            address_of_instruction: 0,
            source: MemoryFault::OutOfBounds {
                address: 9,
                width: 1,
                size: 8,
            },
        };
        assert!(fault.source().is_some());
        assert!(Fault::Undefined { address: 0, word: 0 }.source().is_none());
    }
}
