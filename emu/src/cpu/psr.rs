//! # Flags Register
//!
//! The four condition flags live in the top nibble of a 32-bit status word,
//! the same place the ARM CPSR keeps them:
//!
//! ```text
//! 31 30 29 28 27                           0
//! ┌──┬──┬──┬──┬─────────────────────────────┐
//! │N │Z │C │V │          (unused)           │
//! └──┴──┴──┴──┴─────────────────────────────┘
//! ```
//!
//! Flags are only written by an execution unit that was asked to set condition
//! codes. Everything else must leave them alone.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::ArithmeticOpResult;
use crate::cpu::condition::Condition;

const SIGN_BIT: u8 = 31;
const ZERO_BIT: u8 = 30;
const CARRY_BIT: u8 = 29;
const OVERFLOW_BIT: u8 = 28;

/// Program status word holding the N, Z, C and V flags.
///
/// ```
/// use emu::cpu::psr::Psr;
///
/// let mut cpsr = Psr::default();
/// cpsr.set_zero_flag(true);
/// assert!(cpsr.zero_flag());
/// assert_eq!(u32::from(cpsr), 0x4000_0000);
/// ```
#[derive(Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psr(u32);

impl Psr {
    /// Builds a status word from the four individual flags.
    #[must_use]
    pub fn from_flags(sign: bool, zero: bool, carry: bool, overflow: bool) -> Self {
        let mut psr = Self::default();
        psr.set_sign_flag(sign);
        psr.set_zero_flag(zero);
        psr.set_carry_flag(carry);
        psr.set_overflow_flag(overflow);
        psr
    }

    /// Whether an instruction with condition `cond` executes under these flags.
    #[must_use]
    pub fn can_execute(self, cond: Condition) -> bool {
        use Condition::{AL, CC, CS, EQ, GE, GT, HI, LE, LS, LT, MI, NE, NV, PL, VC, VS};
        match cond {
            EQ => self.zero_flag(),
            NE => !self.zero_flag(),
            CS => self.carry_flag(),
            CC => !self.carry_flag(),
            MI => self.sign_flag(),
            PL => !self.sign_flag(),
            VS => self.overflow_flag(),
            VC => !self.overflow_flag(),
            HI => self.carry_flag() && !self.zero_flag(),
            LS => !self.carry_flag() || self.zero_flag(),
            GE => self.sign_flag() == self.overflow_flag(),
            LT => self.sign_flag() != self.overflow_flag(),
            GT => !self.zero_flag() && (self.sign_flag() == self.overflow_flag()),
            LE => self.zero_flag() || (self.sign_flag() != self.overflow_flag()),
            AL => true,
            NV => false,
        }
    }

    /// N => Bit 31, (0=Not Signed, 1=Signed)
    #[must_use]
    pub fn sign_flag(self) -> bool {
        self.0.get_bit(SIGN_BIT)
    }

    /// Z => Bit 30, (0=Not Zero, 1=Zero)
    #[must_use]
    pub fn zero_flag(self) -> bool {
        self.0.get_bit(ZERO_BIT)
    }

    /// C => Bit 29, (0=Borrow/No Carry, 1=Carry/No Borrow)
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.0.get_bit(CARRY_BIT)
    }

    /// V => Bit 28, (0=No Overflow, 1=Overflow)
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.0.get_bit(OVERFLOW_BIT)
    }

    pub fn set_sign_flag(&mut self, value: bool) {
        self.0.set_bit(SIGN_BIT, value);
    }

    pub fn set_zero_flag(&mut self, value: bool) {
        self.0.set_bit(ZERO_BIT, value);
    }

    pub fn set_carry_flag(&mut self, value: bool) {
        self.0.set_bit(CARRY_BIT, value);
    }

    pub fn set_overflow_flag(&mut self, value: bool) {
        self.0.set_bit(OVERFLOW_BIT, value);
    }

    /// Writes all four flags from an arithmetic result.
    pub fn set_flags(&mut self, op_result: &ArithmeticOpResult) {
        self.set_carry_flag(op_result.carry);
        self.set_zero_flag(op_result.zero);
        self.set_sign_flag(op_result.sign);
        self.set_overflow_flag(op_result.overflow);
    }
}

impl From<Psr> for u32 {
    fn from(p: Psr) -> Self {
        p.0
    }
}

impl std::fmt::Debug for Psr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}{}",
            flag(self.sign_flag(), 'N'),
            flag(self.zero_flag(), 'Z'),
            flag(self.carry_flag(), 'C'),
            flag(self.overflow_flag(), 'V'),
        )
    }
}
