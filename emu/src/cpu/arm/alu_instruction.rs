use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::flags::ShiftKind;

/// The sixteen data-processing opcodes (bits 24-21).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum ArmModeAluInstruction {
    And = 0x0,
    Eor = 0x1,
    Sub = 0x2,
    Rsb = 0x3,
    Add = 0x4,
    Adc = 0x5,
    Sbc = 0x6,
    Rsc = 0x7,
    Tst = 0x8,
    Teq = 0x9,
    Cmp = 0xA,
    Cmn = 0xB,
    Orr = 0xC,
    Mov = 0xD,
    Bic = 0xE,
    Mvn = 0xF,
}

impl Display for ArmModeAluInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Eor => f.write_str("EOR"),
            Self::Sub => f.write_str("SUB"),
            Self::Rsb => f.write_str("RSB"),
            Self::Add => f.write_str("ADD"),
            Self::Adc => f.write_str("ADC"),
            Self::Sbc => f.write_str("SBC"),
            Self::Rsc => f.write_str("RSC"),
            Self::Tst => f.write_str("TST"),
            Self::Teq => f.write_str("TEQ"),
            Self::Cmp => f.write_str("CMP"),
            Self::Cmn => f.write_str("CMN"),
            Self::Orr => f.write_str("ORR"),
            Self::Mov => f.write_str("MOV"),
            Self::Bic => f.write_str("BIC"),
            Self::Mvn => f.write_str("MVN"),
        }
    }
}

#[derive(Eq, PartialEq, Debug)]
pub enum AluInstructionKind {
    Logical,
    Arithmetic,
}

pub trait Kind {
    fn kind(&self) -> AluInstructionKind;
}

impl Kind for ArmModeAluInstruction {
    fn kind(&self) -> AluInstructionKind {
        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match &self {
            And | Eor | Tst | Teq | Orr | Mov | Bic | Mvn => AluInstructionKind::Logical,
            Sub | Rsb | Add | Adc | Sbc | Rsc | Cmp | Cmn => AluInstructionKind::Arithmetic,
        }
    }
}

impl From<u32> for ArmModeAluInstruction {
    /// Only the four low bits are considered.
    fn from(alu_op_code: u32) -> Self {
        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match alu_op_code & 0xF {
            0x0 => And,
            0x1 => Eor,
            0x2 => Sub,
            0x3 => Rsb,
            0x4 => Add,
            0x5 => Adc,
            0x6 => Sbc,
            0x7 => Rsc,
            0x8 => Tst,
            0x9 => Teq,
            0xA => Cmp,
            0xB => Cmn,
            0xC => Orr,
            0xD => Mov,
            0xE => Bic,
            _ => Mvn,
        }
    }
}

impl ArmModeAluInstruction {
    /// `TST`, `TEQ`, `CMP` and `CMN` only set flags.
    #[must_use]
    pub const fn writes_destination(self) -> bool {
        !matches!(self, Self::Tst | Self::Teq | Self::Cmp | Self::Cmn)
    }

    /// Whether the first operand register takes part in the operation.
    #[must_use]
    pub const fn uses_first_operand(self) -> bool {
        !matches!(self, Self::Mov | Self::Mvn)
    }

    /// Computes the operation.
    ///
    /// `op2` is the output of the barrel shifter (or of the immediate rotation):
    /// logical operations report its carry-out as their carry. Arithmetic ones
    /// go through [`add_with_carry`], subtraction being `op1 + !op2 + 1` so
    /// that C is "no borrow". `carry` is the current C flag, folded in by
    /// `ADC`, `SBC` and `RSC`.
    ///
    /// The `overflow` field of a logical result is meaningless and must not
    /// reach the flags register.
    #[must_use]
    pub fn execute(self, op1: u32, op2: ShiftResult, carry: bool) -> ArithmeticOpResult {
        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        let value = op2.result;
        match self {
            And | Tst => ArithmeticOpResult::logical(op1 & value, op2.carry),
            Eor | Teq => ArithmeticOpResult::logical(op1 ^ value, op2.carry),
            Orr => ArithmeticOpResult::logical(op1 | value, op2.carry),
            Mov => ArithmeticOpResult::logical(value, op2.carry),
            Bic => ArithmeticOpResult::logical(op1 & !value, op2.carry),
            Mvn => ArithmeticOpResult::logical(!value, op2.carry),
            Add | Cmn => add_with_carry(op1, value, false),
            Adc => add_with_carry(op1, value, carry),
            Sub | Cmp => add_with_carry(op1, !value, true),
            Sbc => add_with_carry(op1, !value, carry),
            Rsb => add_with_carry(value, !op1, true),
            Rsc => add_with_carry(value, !op1, carry),
        }
    }
}

/// Output of an ALU operation, with every flag it could produce.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticOpResult {
    pub result: u32,
    pub carry: bool,
    pub overflow: bool,
    pub sign: bool,
    pub zero: bool,
}

impl ArithmeticOpResult {
    fn logical(result: u32, carry: bool) -> Self {
        Self {
            result,
            carry,
            overflow: false,
            sign: result.get_bit(31),
            zero: result == 0,
        }
    }
}

/// Output of the barrel shifter: the shifted value and the last bit shifted out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShiftResult {
    pub result: u32,
    pub carry: bool,
}

/// Adds two words and a carry-in in 64 bits, so that bit 32 of the sum is the
/// carry and the low word is the result.
///
/// V is set when both inputs of the adder have the same sign and the
/// truncated result has the other one.
#[must_use]
pub fn add_with_carry(first_op: u32, second_op: u32, carry_in: bool) -> ArithmeticOpResult {
    let wide = u64::from(first_op) + u64::from(second_op) + u64::from(carry_in);
    let result = wide as u32;

    let sign_op1 = first_op.get_bit(31);
    let sign_op2 = second_op.get_bit(31);
    let sign_r = result.get_bit(31);

    ArithmeticOpResult {
        result,
        carry: wide.get_bit(32),
        overflow: sign_op1 == sign_op2 && sign_op1 != sign_r,
        sign: sign_r,
        zero: result == 0,
    }
}

/// Barrel shifter with an amount encoded in the instruction (5 bits).
///
/// An amount of 0 does not mean "no shift" for every mode:
///
/// | Mode | `#0` means          | Result                    | Carry     |
/// |------|---------------------|---------------------------|-----------|
/// | LSL  | no shift            | `rm`                      | unchanged |
/// | LSR  | `LSR #32`           | `0`                       | bit 31    |
/// | ASR  | `ASR #32`           | all bits = bit 31         | bit 31    |
/// | ROR  | `RRX`               | `carry << 31 \| rm >> 1`  | bit 0     |
///
/// Amounts above 31 (only reachable through [`shift_by_register`]) follow the
/// architectural rules instead of wrapping.
#[must_use]
pub fn shift(kind: ShiftKind, shift_amount: u32, rm: u32, carry: bool) -> ShiftResult {
    match kind {
        ShiftKind::Lsl => match shift_amount {
            0 => ShiftResult { result: rm, carry },
            1..=31 => ShiftResult {
                result: rm << shift_amount,
                carry: rm.get_bit((32 - shift_amount) as u8),
            },
            32 => ShiftResult {
                result: 0,
                carry: rm.get_bit(0),
            },
            _ => ShiftResult {
                result: 0,
                carry: false,
            },
        },
        ShiftKind::Lsr => match shift_amount {
            0 | 32 => ShiftResult {
                result: 0,
                carry: rm.get_bit(31),
            },
            1..=31 => ShiftResult {
                result: rm >> shift_amount,
                carry: rm.get_bit((shift_amount - 1) as u8),
            },
            _ => ShiftResult {
                result: 0,
                carry: false,
            },
        },
        ShiftKind::Asr => match shift_amount {
            1..=31 => ShiftResult {
                result: ((rm as i32) >> shift_amount) as u32,
                carry: rm.get_bit((shift_amount - 1) as u8),
            },
            _ => ShiftResult {
                result: ((rm as i32) >> 31) as u32,
                carry: rm.get_bit(31),
            },
        },
        ShiftKind::Ror => {
            if shift_amount == 0 {
                return ShiftResult {
                    result: (u32::from(carry) << 31) | (rm >> 1),
                    carry: rm.get_bit(0),
                };
            }

            match shift_amount % 32 {
                0 => ShiftResult {
                    result: rm,
                    carry: rm.get_bit(31),
                },
                amount => ShiftResult {
                    result: rm.rotate_right(amount),
                    carry: rm.get_bit((amount - 1) as u8),
                },
            }
        }
    }
}

/// Barrel shifter with the amount taken from the low byte of a register.
///
/// Unlike the immediate form, an amount of 0 always leaves both the value and
/// the carry untouched.
#[must_use]
pub fn shift_by_register(kind: ShiftKind, rs: u32, rm: u32, carry: bool) -> ShiftResult {
    let shift_amount = rs & 0xFF;
    if shift_amount == 0 {
        return ShiftResult { result: rm, carry };
    }

    shift(kind, shift_amount, rm, carry)
}

/// Data-processing immediate: an 8-bit value rotated right by twice the
/// 4-bit rotate field.
///
/// The carry-out is the old carry when no rotation happens, bit 31 of the
/// rotated value otherwise.
#[must_use]
pub fn rotate_immediate(immediate: u32, rotate: u32, carry: bool) -> ShiftResult {
    let amount = (rotate & 0xF) * 2;
    let immediate = immediate & 0xFF;
    if amount == 0 {
        return ShiftResult {
            result: immediate,
            carry,
        };
    }

    let result = immediate.rotate_right(amount);
    ShiftResult {
        result,
        carry: result.get_bit(31),
    }
}
