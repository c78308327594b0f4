//! # Instruction Classification
//!
//! A word is classified by walking a table of `(mask, pattern, category)`
//! entries and returning the first one for which `word & mask == pattern`.
//!
//! Several encodings overlap. Data processing only looks at bits 27-26, so a
//! multiply, a PSR transfer or a branch-and-exchange would all "match" it as
//! well. The table is therefore ordered most-specific first: entries with more
//! bits in their mask are tried earlier, and entries with the same number of
//! mask bits keep their declaration order. The ordering is computed at compile
//! time from the declaration list below, and a compile-time assertion keeps it
//! honest.
//!
//! Halfword transfers take two rows each: an `SH` field of `00` in that space
//! belongs to multiply, multiply long or swap, and a single mask cannot say
//! "not both zero".
//!
//! ```text
//! Category                 Mask        Pattern     Mask bits
//! ──────────────────────── ─────────── ─────────── ─────────
//! Branch and exchange      0x0FFFFFF0  0x012FFF10     24
//! MRS                      0x0FBF0FFF  0x010F0000     23
//! MSR (register)           0x0FBFFFF0  0x0129F000     23
//! Single data swap         0x0FB00FF0  0x01000090     15
//! MSR (flags only)         0x0DBFF000  0x0128F000     14
//! Halfword (reg, SH=10)    0x0E400FF0  0x000000D0     12
//! Halfword (reg, SH=x1)    0x0E400FB0  0x000000B0     11
//! Multiply                 0x0FC000F0  0x00000090     10
//! Multiply long            0x0F8000F0  0x00800090      9
//! Halfword (imm, SH=10)    0x0E4000F0  0x004000D0      8
//! Halfword (imm, SH=x1)    0x0E4000B0  0x004000B0      7
//! Coprocessor data op      0x0F000010  0x0E000000      5
//! Coprocessor reg transfer 0x0F000010  0x0E000010      5
//! Software interrupt       0x0F000000  0x0F000000      4
//! Undefined                0x0E000010  0x06000010      4
//! Block data transfer      0x0E000000  0x08000000      3
//! Branch                   0x0E000000  0x0A000000      3
//! Coprocessor data xfer    0x0E000000  0x0C000000      3
//! Data processing          0x0C000000  0x00000000      2
//! Single data transfer     0x0C000000  0x04000000      2
//! ```

use serde::{Deserialize, Serialize};

/// The instruction classes of the ARMv4 encoding space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionCategory {
    DataProcessing,
    Multiply,
    MultiplyLong,
    SingleDataSwap,
    SingleDataTransfer,
    BlockDataTransfer,
    HalfwordDataTransferImmediateOffset,
    HalfwordDataTransferRegisterOffset,
    Branch,
    BranchAndExchange,
    CoprocessorDataTransfer,
    CoprocessorDataOperation,
    CoprocessorRegisterTransfer,
    SoftwareInterrupt,
    /// `MRS Rd, PSR`
    PsrTransferMrs,
    /// `MSR PSR, Rm`
    PsrTransferMsr,
    /// `MSR PSR_flg, Rm|#imm`
    PsrTransferMsrFlags,
    Undefined,
}

impl InstructionCategory {
    /// Whether the engine has an execution unit for this category.
    #[must_use]
    pub const fn is_implemented(self) -> bool {
        matches!(
            self,
            Self::DataProcessing | Self::SingleDataTransfer | Self::Branch | Self::MultiplyLong
        )
    }
}

impl std::fmt::Display for InstructionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DataProcessing => "data processing",
            Self::Multiply => "multiply",
            Self::MultiplyLong => "multiply long",
            Self::SingleDataSwap => "single data swap",
            Self::SingleDataTransfer => "single data transfer",
            Self::BlockDataTransfer => "block data transfer",
            Self::HalfwordDataTransferImmediateOffset => "halfword data transfer (immediate offset)",
            Self::HalfwordDataTransferRegisterOffset => "halfword data transfer (register offset)",
            Self::Branch => "branch",
            Self::BranchAndExchange => "branch and exchange",
            Self::CoprocessorDataTransfer => "coprocessor data transfer",
            Self::CoprocessorDataOperation => "coprocessor data operation",
            Self::CoprocessorRegisterTransfer => "coprocessor register transfer",
            Self::SoftwareInterrupt => "software interrupt",
            Self::PsrTransferMrs => "PSR transfer (MRS)",
            Self::PsrTransferMsr => "PSR transfer (MSR)",
            Self::PsrTransferMsrFlags => "PSR transfer (MSR flags)",
            Self::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

/// One row of the decode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeEntry {
    pub mask: u32,
    pub pattern: u32,
    pub category: InstructionCategory,
}

impl DecodeEntry {
    const fn new(mask: u32, pattern: u32, category: InstructionCategory) -> Self {
        Self {
            mask,
            pattern,
            category,
        }
    }

    #[must_use]
    pub const fn specificity(&self) -> u32 {
        self.mask.count_ones()
    }

    #[must_use]
    pub const fn matches(&self, word: u32) -> bool {
        word & self.mask == self.pattern
    }
}

use InstructionCategory as C;

#[rustfmt::skip]
const DECLARED: [DecodeEntry; 20] = [
    DecodeEntry::new(0b0000_1100_0000_0000_0000_0000_0000_0000, 0b0000_0000_0000_0000_0000_0000_0000_0000, C::DataProcessing),
    DecodeEntry::new(0b0000_1111_1100_0000_0000_0000_1111_0000, 0b0000_0000_0000_0000_0000_0000_1001_0000, C::Multiply),
    DecodeEntry::new(0b0000_1111_1000_0000_0000_0000_1111_0000, 0b0000_0000_1000_0000_0000_0000_1001_0000, C::MultiplyLong),
    DecodeEntry::new(0b0000_1111_1011_0000_0000_1111_1111_0000, 0b0000_0001_0000_0000_0000_0000_1001_0000, C::SingleDataSwap),
    DecodeEntry::new(0b0000_1100_0000_0000_0000_0000_0000_0000, 0b0000_0100_0000_0000_0000_0000_0000_0000, C::SingleDataTransfer),
    DecodeEntry::new(0b0000_1110_0000_0000_0000_0000_0000_0000, 0b0000_1000_0000_0000_0000_0000_0000_0000, C::BlockDataTransfer),
    DecodeEntry::new(0b0000_1110_0100_0000_0000_0000_1011_0000, 0b0000_0000_0100_0000_0000_0000_1011_0000, C::HalfwordDataTransferImmediateOffset),
    DecodeEntry::new(0b0000_1110_0100_0000_0000_0000_1111_0000, 0b0000_0000_0100_0000_0000_0000_1101_0000, C::HalfwordDataTransferImmediateOffset),
    DecodeEntry::new(0b0000_1110_0100_0000_0000_1111_1011_0000, 0b0000_0000_0000_0000_0000_0000_1011_0000, C::HalfwordDataTransferRegisterOffset),
    DecodeEntry::new(0b0000_1110_0100_0000_0000_1111_1111_0000, 0b0000_0000_0000_0000_0000_0000_1101_0000, C::HalfwordDataTransferRegisterOffset),
    DecodeEntry::new(0b0000_1110_0000_0000_0000_0000_0000_0000, 0b0000_1010_0000_0000_0000_0000_0000_0000, C::Branch),
    DecodeEntry::new(0b0000_1111_1111_1111_1111_1111_1111_0000, 0b0000_0001_0010_1111_1111_1111_0001_0000, C::BranchAndExchange),
    DecodeEntry::new(0b0000_1110_0000_0000_0000_0000_0000_0000, 0b0000_1100_0000_0000_0000_0000_0000_0000, C::CoprocessorDataTransfer),
    DecodeEntry::new(0b0000_1111_0000_0000_0000_0000_0001_0000, 0b0000_1110_0000_0000_0000_0000_0000_0000, C::CoprocessorDataOperation),
    DecodeEntry::new(0b0000_1111_0000_0000_0000_0000_0001_0000, 0b0000_1110_0000_0000_0000_0000_0001_0000, C::CoprocessorRegisterTransfer),
    DecodeEntry::new(0b0000_1111_0000_0000_0000_0000_0000_0000, 0b0000_1111_0000_0000_0000_0000_0000_0000, C::SoftwareInterrupt),
    DecodeEntry::new(0b0000_1111_1011_1111_0000_1111_1111_1111, 0b0000_0001_0000_1111_0000_0000_0000_0000, C::PsrTransferMrs),
    DecodeEntry::new(0b0000_1111_1011_1111_1111_1111_1111_0000, 0b0000_0001_0010_1001_1111_0000_0000_0000, C::PsrTransferMsr),
    DecodeEntry::new(0b0000_1101_1011_1111_1111_0000_0000_0000, 0b0000_0001_0010_1000_1111_0000_0000_0000, C::PsrTransferMsrFlags),
    DecodeEntry::new(0b0000_1110_0000_0000_0000_0000_0001_0000, 0b0000_0110_0000_0000_0000_0000_0001_0000, C::Undefined),
];

/// Stable insertion sort on descending mask popcount.
const fn sort_by_specificity<const N: usize>(mut table: [DecodeEntry; N]) -> [DecodeEntry; N] {
    let mut i = 1;
    while i < N {
        let mut j = i;
        while j > 0 && table[j].specificity() > table[j - 1].specificity() {
            let tmp = table[j];
            table[j] = table[j - 1];
            table[j - 1] = tmp;
            j -= 1;
        }
        i += 1;
    }
    table
}

const fn is_most_specific_first(table: &[DecodeEntry]) -> bool {
    let mut i = 1;
    while i < table.len() {
        if table[i].specificity() > table[i - 1].specificity() {
            return false;
        }
        i += 1;
    }
    true
}

/// The decode table in match order.
pub static DECODE_TABLE: [DecodeEntry; 20] = sort_by_specificity(DECLARED);

const _: () = assert!(is_most_specific_first(&sort_by_specificity(DECLARED)));

/// Maps an instruction word to its category. Words that match no entry are
/// [`InstructionCategory::Undefined`].
#[must_use]
pub fn classify(word: u32) -> InstructionCategory {
    DECODE_TABLE
        .iter()
        .find(|entry| entry.matches(word))
        .map_or(InstructionCategory::Undefined, |entry| entry.category)
}
