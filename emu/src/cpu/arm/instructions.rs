//! # ARM Instruction Decoding
//!
//! Turns a 32-bit word into an [`ArmModeInstruction`] with every field of its
//! format extracted. The category comes from [`classify`]; categories without
//! an execution unit are kept as [`ArmModeInstruction::Unimplemented`] so the
//! engine can report them.
//!
//! ## Field layouts
//!
//! ```text
//! Data processing
//! 31-28  27-26  25  24-21  20  19-16  15-12  11-0
//! [Cond] [ 00 ] [I] [code] [S] [ Rn ] [ Rd ] [operand2]
//!
//! Single data transfer
//! 31-28  27-26  25  24  23  22  21  20  19-16  15-12  11-0
//! [Cond] [ 01 ] [I] [P] [U] [B] [W] [L] [ Rn ] [ Rd ] [offset]
//!
//! Branch
//! 31-28  27-25  24  23-0
//! [Cond] [101]  [L] [offset]
//!
//! Multiply long
//! 31-28  27-23   22  21  20  19-16  15-12  11-8  7-4   3-0
//! [Cond] [00001] [U] [A] [S] [RdHi] [RdLo] [Rs]  [1001] [Rm]
//! ```
//!
//! Note the I bit of a single data transfer has the opposite meaning of the
//! data processing one: set means *register* offset.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::ArmModeAluInstruction;
use crate::cpu::arm::category::{InstructionCategory, classify};
use crate::cpu::condition::Condition;
use crate::cpu::flags::{Indexing, LoadStoreKind, Offsetting, OperandKind, ReadWriteKind, ShiftKind};

/// Where the shift amount of a register operand comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ShiftOperator {
    /// 5-bit amount encoded in bits 11-7.
    Immediate(u32),
    /// Register whose low byte holds the amount, encoded in bits 11-8.
    Register(u32),
}

impl std::fmt::Display for ShiftOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate(value) => write!(f, "#{value}"),
            Self::Register(register) => write!(f, "R{register}"),
        }
    }
}

/// Second operand of a data processing instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AluSecondOperandInfo {
    Register {
        shift_op: ShiftOperator,
        shift_kind: ShiftKind,
        register: u32,
    },
    /// `base` rotated right by `2 * rotate`.
    Immediate { base: u32, rotate: u32 },
}

impl std::fmt::Display for AluSecondOperandInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Register {
                shift_op,
                shift_kind,
                register,
            } => match (shift_op, shift_kind) {
                (ShiftOperator::Immediate(0), ShiftKind::Lsl) => write!(f, "R{register}"),
                (ShiftOperator::Immediate(0), ShiftKind::Ror) => write!(f, "R{register}, RRX"),
                (ShiftOperator::Immediate(0), _) => write!(f, "R{register}, {shift_kind} #32"),
                _ => write!(f, "R{register}, {shift_kind} {shift_op}"),
            },
            Self::Immediate { base, rotate } => write!(f, "#{}", base.rotate_right(rotate * 2)),
        }
    }
}

/// Offset of a single data transfer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SingleDataTransferOffsetInfo {
    /// Unsigned 12-bit offset.
    Immediate { offset: u32 },
    /// Register shifted by a 5-bit immediate amount.
    RegisterImmediate {
        shift_amount: u32,
        shift_kind: ShiftKind,
        reg_offset: u32,
    },
}

impl SingleDataTransferOffsetInfo {
    fn render(self, offsetting: Offsetting) -> String {
        let sign = match offsetting {
            Offsetting::Up => "",
            Offsetting::Down => "-",
        };
        match self {
            Self::Immediate { offset } => format!("#{sign}{offset}"),
            Self::RegisterImmediate {
                shift_amount: 0,
                shift_kind: ShiftKind::Lsl,
                reg_offset,
            } => format!("{sign}R{reg_offset}"),
            Self::RegisterImmediate {
                shift_amount,
                shift_kind,
                reg_offset,
            } => format!("{sign}R{reg_offset}, {shift_kind} #{shift_amount}"),
        }
    }
}

/// A decoded ARM instruction.
///
/// | Variant              | Example instructions         |
/// |----------------------|------------------------------|
/// | `DataProcessing`     | AND, ADD, CMP, MOV           |
/// | `SingleDataTransfer` | LDR, STR, LDRB, STRB         |
/// | `Branch`             | B, BL                        |
/// | `MultiplyLong`       | UMULL, UMLAL, SMULL, SMLAL   |
/// | `Unimplemented`      | MUL, SWP, LDM, SWI, MRS, ... |
/// | `Undefined`          | -                            |
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum ArmModeInstruction {
    DataProcessing {
        condition: Condition,
        alu_instruction: ArmModeAluInstruction,
        set_conditions: bool,
        op_kind: OperandKind,
        rn: u32,
        destination: u32,
        op2: AluSecondOperandInfo,
    },
    SingleDataTransfer {
        condition: Condition,
        load_store: LoadStoreKind,
        quantity: ReadWriteKind,
        write_back: bool,
        indexing: Indexing,
        offsetting: Offsetting,
        rd: u32,
        base_register: u32,
        offset_info: SingleDataTransferOffsetInfo,
    },
    Branch {
        condition: Condition,
        link: bool,
        /// Byte offset, already shifted and sign-extended.
        offset: i32,
    },
    MultiplyLong {
        condition: Condition,
        signed: bool,
        accumulate: bool,
        set_conditions: bool,
        rdhi: u32,
        rdlo: u32,
        rs: u32,
        rm: u32,
    },
    /// A well-formed instruction the engine cannot execute.
    Unimplemented {
        condition: Condition,
        category: InstructionCategory,
    },
    Undefined {
        condition: Condition,
    },
}

impl ArmModeInstruction {
    /// Extracts the fields of `op_code` according to an already known category.
    #[must_use]
    pub fn decode(op_code: u32, category: InstructionCategory) -> Self {
        let condition = Condition::from_word(op_code);
        match category {
            InstructionCategory::DataProcessing => {
                let op_kind: OperandKind = op_code.get_bit(25).into();
                let op2 = match op_kind {
                    OperandKind::Immediate => AluSecondOperandInfo::Immediate {
                        base: op_code.get_bits(0..=7),
                        rotate: op_code.get_bits(8..=11),
                    },
                    OperandKind::Register => {
                        let shift_op = if op_code.get_bit(4) {
                            ShiftOperator::Register(op_code.get_bits(8..=11))
                        } else {
                            ShiftOperator::Immediate(op_code.get_bits(7..=11))
                        };
                        AluSecondOperandInfo::Register {
                            shift_op,
                            shift_kind: op_code.get_bits(5..=6).into(),
                            register: op_code.get_bits(0..=3),
                        }
                    }
                };

                Self::DataProcessing {
                    condition,
                    alu_instruction: op_code.get_bits(21..=24).into(),
                    set_conditions: op_code.get_bit(20),
                    op_kind,
                    rn: op_code.get_bits(16..=19),
                    destination: op_code.get_bits(12..=15),
                    op2,
                }
            }
            InstructionCategory::SingleDataTransfer => {
                // Inverted with respect to data processing.
                let op_kind: OperandKind = (!op_code.get_bit(25)).into();
                let offset_info = match op_kind {
                    OperandKind::Immediate => SingleDataTransferOffsetInfo::Immediate {
                        offset: op_code.get_bits(0..=11),
                    },
                    OperandKind::Register => SingleDataTransferOffsetInfo::RegisterImmediate {
                        shift_amount: op_code.get_bits(7..=11),
                        shift_kind: op_code.get_bits(5..=6).into(),
                        reg_offset: op_code.get_bits(0..=3),
                    },
                };

                Self::SingleDataTransfer {
                    condition,
                    indexing: op_code.get_bit(24).into(),
                    offsetting: op_code.get_bit(23).into(),
                    quantity: op_code.get_bit(22).into(),
                    write_back: op_code.get_bit(21),
                    load_store: op_code.get_bit(20).into(),
                    base_register: op_code.get_bits(16..=19),
                    rd: op_code.get_bits(12..=15),
                    offset_info,
                }
            }
            InstructionCategory::Branch => Self::Branch {
                condition,
                link: op_code.get_bit(24),
                offset: (op_code.get_bits(0..=23) << 2).sign_extended(26) as i32,
            },
            InstructionCategory::MultiplyLong => Self::MultiplyLong {
                condition,
                signed: op_code.get_bit(22),
                accumulate: op_code.get_bit(21),
                set_conditions: op_code.get_bit(20),
                rdhi: op_code.get_bits(16..=19),
                rdlo: op_code.get_bits(12..=15),
                rs: op_code.get_bits(8..=11),
                rm: op_code.get_bits(0..=3),
            },
            InstructionCategory::Undefined => {
                tracing::debug!("undefined instruction decode: opcode=0x{op_code:08X}");
                Self::Undefined { condition }
            }
            category => Self::Unimplemented {
                condition,
                category,
            },
        }
    }

    #[must_use]
    pub const fn condition(&self) -> Condition {
        match self {
            Self::DataProcessing { condition, .. }
            | Self::SingleDataTransfer { condition, .. }
            | Self::Branch { condition, .. }
            | Self::MultiplyLong { condition, .. }
            | Self::Unimplemented { condition, .. }
            | Self::Undefined { condition } => *condition,
        }
    }

    /// Human-readable assembly for trace output.
    #[must_use]
    pub fn disassembler(&self) -> String {
        match self {
            Self::DataProcessing {
                condition,
                alu_instruction,
                set_conditions,
                op_kind: _,
                rn,
                destination,
                op2,
            } => {
                let set_string = if *set_conditions { "S" } else { "" };
                match alu_instruction {
                    ArmModeAluInstruction::Tst
                    | ArmModeAluInstruction::Teq
                    | ArmModeAluInstruction::Cmp
                    | ArmModeAluInstruction::Cmn => {
                        format!("{alu_instruction}{condition} R{rn}, {op2}")
                    }
                    ArmModeAluInstruction::Mov | ArmModeAluInstruction::Mvn => {
                        format!("{alu_instruction}{condition}{set_string} R{destination}, {op2}")
                    }
                    _ => format!(
                        "{alu_instruction}{condition}{set_string} R{destination}, R{rn}, {op2}"
                    ),
                }
            }
            Self::SingleDataTransfer {
                condition,
                load_store,
                quantity,
                write_back,
                indexing,
                offsetting,
                rd,
                base_register,
                offset_info,
            } => {
                let op = match load_store {
                    LoadStoreKind::Load => "LDR",
                    LoadStoreKind::Store => "STR",
                };
                let b = match quantity {
                    ReadWriteKind::Word => "",
                    ReadWriteKind::Byte => "B",
                };
                let offset = offset_info.render(*offsetting);
                let address = match indexing {
                    Indexing::Pre => {
                        let w = if *write_back { "!" } else { "" };
                        format!("[R{base_register}, {offset}]{w}")
                    }
                    Indexing::Post => format!("[R{base_register}], {offset}"),
                };

                format!("{op}{condition}{b} R{rd}, {address}")
            }
            Self::Branch {
                condition,
                link,
                offset,
            } => {
                let l = if *link { "L" } else { "" };
                format!("B{l}{condition} #{offset}")
            }
            Self::MultiplyLong {
                condition,
                signed,
                accumulate,
                set_conditions,
                rdhi,
                rdlo,
                rs,
                rm,
            } => {
                let u = if *signed { "S" } else { "U" };
                let op = if *accumulate { "MLAL" } else { "MULL" };
                let s = if *set_conditions { "S" } else { "" };
                format!("{u}{op}{condition}{s} R{rdlo}, R{rdhi}, R{rm}, R{rs}")
            }
            Self::Unimplemented {
                condition,
                category,
            } => format!("<{category}>{condition}"),
            Self::Undefined { condition } => format!("UNDEFINED{condition}"),
        }
    }
}

impl From<u32> for ArmModeInstruction {
    fn from(op_code: u32) -> Self {
        Self::decode(op_code, classify(op_code))
    }
}
