//! # ARM Instruction Set (32-bit)
//!
//! Every instruction is one little-endian word with a condition in its top
//! nibble.
//!
//! ```text
//! 31-28   27-25   24-0
//! [Cond] [Format] [Instruction-specific]
//! ```
//!
//! Decoding happens in two passes: [`category::classify`] picks one of the
//! eighteen instruction classes from a mask/pattern table, then
//! [`instructions::ArmModeInstruction::decode`] pulls the fields out.
//!
//! ## Executed classes
//!
//! | Class                | Examples                         |
//! |----------------------|----------------------------------|
//! | Data Processing      | AND, ADD, CMP, MOV               |
//! | Multiply Long        | UMULL, UMLAL, SMULL, SMLAL       |
//! | Single Data Transfer | LDR, STR, LDRB, STRB             |
//! | Branch               | B, BL                            |
//!
//! The remaining classes are recognised and disassembled but fault when they
//! reach the execute stage.
//!
//! ## Submodules
//!
//! - [`category`] - Classification table
//! - [`instructions`] - Field extraction and disassembly
//! - [`alu_instruction`] - ALU ops and barrel shifter
//! - [`operations`] - Execution
//! - [`mode`] - Decoded opcode and bit dump

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_lossless)]
pub mod alu_instruction;

#[allow(clippy::unreadable_literal)]
pub mod category;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::similar_names)]
pub mod instructions;

pub mod mode;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_lossless)]
#[allow(clippy::similar_names)]
pub mod operations;
