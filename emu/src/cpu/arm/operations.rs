//! Execution units for the implemented instruction classes.
//!
//! When an instruction executes, R15 already holds the address of the next
//! instruction (fetch address + 4). Reads of R15 as an operand see one more
//! instruction of look-ahead, that is fetch address + 8, or + 12 when the
//! operand is consumed in a second cycle (register-specified shift amounts and
//! the value stored by `STR R15`).

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::{
    AluInstructionKind, ArmModeAluInstruction, Kind, ShiftResult, rotate_immediate, shift,
    shift_by_register,
};
use crate::cpu::arm::instructions::{
    AluSecondOperandInfo, ShiftOperator, SingleDataTransferOffsetInfo,
};
use crate::cpu::flags::{Indexing, LoadStoreKind, Offsetting, ReadWriteKind};
use crate::cpu::machine::Machine;
use crate::cpu::registers::{REG_LR, REG_PROGRAM_COUNTER};
use crate::memory::MemoryFault;

pub const SIZE_OF_INSTRUCTION: u32 = 4;

/// Extra look-ahead applied to R15 when it is read as an operand.
const PC_OPERAND_OFFSET: u32 = 4;

/// Additional look-ahead for operands read in a second cycle.
const PC_SECOND_CYCLE_OFFSET: u32 = 4;

impl Machine {
    /// Reads `reg` as an instruction operand. R15 reads as the stored PC
    /// plus `pc_offset`.
    pub(crate) fn read_operand(&self, reg: u32, pc_offset: u32) -> u32 {
        let value = self.registers.register_at(reg as usize);
        if reg == REG_PROGRAM_COUNTER {
            value.wrapping_add(pc_offset)
        } else {
            value
        }
    }

    /// Resolves operand 2 through the immediate rotation or the barrel shifter.
    fn second_operand(&self, op2: AluSecondOperandInfo) -> ShiftResult {
        let carry = self.cpsr.carry_flag();
        match op2 {
            AluSecondOperandInfo::Immediate { base, rotate } => {
                rotate_immediate(base, rotate, carry)
            }
            AluSecondOperandInfo::Register {
                shift_op: ShiftOperator::Immediate(shift_amount),
                shift_kind,
                register,
            } => {
                let rm = self.read_operand(register, PC_OPERAND_OFFSET);
                shift(shift_kind, shift_amount, rm, carry)
            }
            AluSecondOperandInfo::Register {
                shift_op: ShiftOperator::Register(rs),
                shift_kind,
                register,
            } => {
                let offset = PC_OPERAND_OFFSET + PC_SECOND_CYCLE_OFFSET;
                let rm = self.read_operand(register, offset);
                let rs = self.read_operand(rs, offset);
                shift_by_register(shift_kind, rs, rm, carry)
            }
        }
    }

    pub fn data_processing(
        &mut self,
        alu_instruction: ArmModeAluInstruction,
        set_conditions: bool,
        rn: u32,
        destination: u32,
        op2: AluSecondOperandInfo,
    ) {
        let pc_offset = match op2 {
            AluSecondOperandInfo::Register {
                shift_op: ShiftOperator::Register(_),
                ..
            } => PC_OPERAND_OFFSET + PC_SECOND_CYCLE_OFFSET,
            _ => PC_OPERAND_OFFSET,
        };
        let op1 = self.read_operand(rn, pc_offset);
        let op2 = self.second_operand(op2);

        let result = alu_instruction.execute(op1, op2, self.cpsr.carry_flag());

        if alu_instruction.writes_destination() {
            self.registers
                .set_register_at(destination as usize, result.result);
        }

        // Writing PC redirects control flow and leaves the flags alone.
        if set_conditions && destination != REG_PROGRAM_COUNTER {
            match alu_instruction.kind() {
                AluInstructionKind::Logical => {
                    self.cpsr.set_carry_flag(result.carry);
                    self.cpsr.set_zero_flag(result.zero);
                    self.cpsr.set_sign_flag(result.sign);
                }
                AluInstructionKind::Arithmetic => self.cpsr.set_flags(&result),
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn single_data_transfer(
        &mut self,
        load_store: LoadStoreKind,
        quantity: ReadWriteKind,
        write_back: bool,
        indexing: Indexing,
        offsetting: Offsetting,
        rd: u32,
        base_register: u32,
        offset_info: SingleDataTransferOffsetInfo,
    ) -> Result<(), MemoryFault> {
        let base = self.read_operand(base_register, PC_OPERAND_OFFSET);

        // The carry out of this shift is not used.
        let offset = match offset_info {
            SingleDataTransferOffsetInfo::Immediate { offset } => offset,
            SingleDataTransferOffsetInfo::RegisterImmediate {
                shift_amount,
                shift_kind,
                reg_offset,
            } => {
                let rm = self.read_operand(reg_offset, PC_OPERAND_OFFSET);
                shift(shift_kind, shift_amount, rm, self.cpsr.carry_flag()).result
            }
        };

        let indexed = match offsetting {
            Offsetting::Up => base.wrapping_add(offset),
            Offsetting::Down => base.wrapping_sub(offset),
        };

        let address = match indexing {
            Indexing::Pre => indexed,
            Indexing::Post => base,
        };

        // Post-indexed transfers always write the base back.
        let update_base = write_back || indexing == Indexing::Post;

        match load_store {
            LoadStoreKind::Load => {
                let value = match quantity {
                    ReadWriteKind::Word => self.ram.read_word(address)?,
                    ReadWriteKind::Byte => u32::from(self.ram.read_byte(address)?),
                };

                if update_base {
                    self.registers
                        .set_register_at(base_register as usize, indexed);
                }

                // Loaded value wins over the write-back when rd is the base.
                self.registers.set_register_at(rd as usize, value);
            }
            LoadStoreKind::Store => {
                let value = self.read_operand(rd, PC_OPERAND_OFFSET + PC_SECOND_CYCLE_OFFSET);
                match quantity {
                    ReadWriteKind::Word => self.ram.write_word(address, value)?,
                    ReadWriteKind::Byte => self.ram.write_byte(address, value.get_byte(0))?,
                }

                if update_base {
                    self.registers
                        .set_register_at(base_register as usize, indexed);
                }
            }
        }

        Ok(())
    }

    /// `offset` is the sign-extended byte offset of the instruction.
    pub fn branch(&mut self, is_link: bool, offset: i32) {
        let pc = self.registers.program_counter();
        if is_link {
            self.registers.set_register_at(REG_LR, pc);
        }

        let new_pc = pc
            .wrapping_add_signed(offset)
            .wrapping_add(SIZE_OF_INSTRUCTION);
        self.registers.set_program_counter(new_pc);
    }

    /// `UMULL`, `UMLAL`, `SMULL` and `SMLAL`.
    ///
    /// The 64-bit product of Rm and Rs (optionally plus RdHi:RdLo) is split
    /// into RdLo (low word) and RdHi (high word). With S set, Z and N follow
    /// the 64-bit result while C and V are preserved.
    #[allow(clippy::too_many_arguments)]
    pub fn multiply_long(
        &mut self,
        signed: bool,
        accumulate: bool,
        set_conditions: bool,
        rdhi: u32,
        rdlo: u32,
        rs: u32,
        rm: u32,
    ) {
        let rm_operand_value = self.registers.register_at(rm as usize);
        let rs_operand_value = self.registers.register_at(rs as usize);

        let mut result = if signed {
            let product =
                i64::from(rm_operand_value as i32) * i64::from(rs_operand_value as i32);
            product as u64
        } else {
            u64::from(rm_operand_value) * u64::from(rs_operand_value)
        };

        if accumulate {
            let rdhi_register_value = u64::from(self.registers.register_at(rdhi as usize));
            let rdlo_register_value = u64::from(self.registers.register_at(rdlo as usize));
            result = result.wrapping_add((rdhi_register_value << 32) | rdlo_register_value);
        }

        self.registers
            .set_register_at(rdlo as usize, result.get_bits(0..=31) as u32);
        self.registers
            .set_register_at(rdhi as usize, result.get_bits(32..=63) as u32);

        if set_conditions {
            self.cpsr.set_zero_flag(result == 0);
            self.cpsr.set_sign_flag(result.get_bit(63));
        }
    }
}
