//! # Conditional Execution
//!
//! Every instruction word carries a 4-bit condition in bits 31-28. Before an
//! instruction is dispatched the condition is tested against the N, Z, C and V
//! flags; if it fails the instruction is skipped and only the PC advances.
//!
//! ```text
//! code  suffix  executes when
//! 0000  EQ      Z
//! 0001  NE      !Z
//! 0010  CS/HS   C
//! 0011  CC/LO   !C
//! 0100  MI      N
//! 0101  PL      !N
//! 0110  VS      V
//! 0111  VC      !V
//! 1000  HI      C && !Z
//! 1001  LS      !C || Z
//! 1010  GE      N == V
//! 1011  LT      N != V
//! 1100  GT      !Z && N == V
//! 1101  LE      Z || N != V
//! 1110  AL      always
//! 1111  NV      never
//! ```
//!
//! The evaluation itself lives on the flags word, see
//! [`Psr::can_execute`](super::psr::Psr::can_execute).

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// Condition field of an instruction word (bits 31-28).
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Condition {
    EQ = 0x0,
    NE = 0x1,
    /// Also written HS.
    CS = 0x2,
    /// Also written LO.
    CC = 0x3,
    MI = 0x4,
    PL = 0x5,
    VS = 0x6,
    VC = 0x7,
    HI = 0x8,
    LS = 0x9,
    GE = 0xA,
    LT = 0xB,
    GT = 0xC,
    LE = 0xD,
    /// Assembly omits this suffix.
    AL = 0xE,
    /// Fetched and skipped.
    NV = 0xF,
}

impl Condition {
    /// All sixteen codes in encoding order.
    pub const ALL: [Self; 16] = [
        Self::EQ,
        Self::NE,
        Self::CS,
        Self::CC,
        Self::MI,
        Self::PL,
        Self::VS,
        Self::VC,
        Self::HI,
        Self::LS,
        Self::GE,
        Self::LT,
        Self::GT,
        Self::LE,
        Self::AL,
        Self::NV,
    ];

    /// Extracts the condition from bits 31-28 of an instruction word.
    #[must_use]
    pub fn from_word(word: u32) -> Self {
        Self::from(word.get_bits(28..=31) as u8)
    }
}

impl From<u8> for Condition {
    /// Only the low nibble is considered.
    fn from(nibble: u8) -> Self {
        Self::ALL[usize::from(nibble & 0xF)]
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const SUFFIXES: [&str; 16] = [
            "EQ", "NE", "CS", "CC", "MI", "PL", "VS", "VC", "HI", "LS", "GE", "LT", "GT", "LE",
            "", "NV",
        ];
        f.write_str(SUFFIXES[*self as usize])
    }
}
