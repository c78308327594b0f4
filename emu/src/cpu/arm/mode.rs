use crate::cpu::arm::category::{InstructionCategory, classify};
use crate::cpu::arm::instructions::ArmModeInstruction;
use crate::cpu::condition::Condition;

/// A fetched word together with everything the decoder knows about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmModeOpcode {
    pub instruction: ArmModeInstruction,
    pub condition: Condition,
    pub category: InstructionCategory,
    pub raw: u32,
}

impl From<u32> for ArmModeOpcode {
    fn from(op_code: u32) -> Self {
        let category = classify(op_code);
        Self {
            instruction: ArmModeInstruction::decode(op_code, category),
            condition: Condition::from_word(op_code),
            category,
            raw: op_code,
        }
    }
}

impl std::ops::Deref for ArmModeOpcode {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

impl ArmModeOpcode {
    fn format_line(&self) -> &'static str {
        use InstructionCategory as C;
        match self.category {
            C::DataProcessing => {
                "FMT: |_Cond__|0_0|I|_code__|S|__Rn___|__Rd___|_______operand2________|"
            }
            C::Multiply => "FMT: |_Cond__|0_0_0_0_0_0|A|S|__Rd___|__Rn___|__Rs___|1_0_0_1|__Rm___|",
            C::MultiplyLong => {
                "FMT: |_Cond__|0_0_0_0_1|U|A|S|_RdHi__|_RdLo__|__Rs___|1_0_0_1|__Rm___|"
            }
            C::SingleDataSwap => {
                "FMT: |_Cond__|0_0_0_1_0|B|0_0|__Rn___|__Rd___|0_0_0_0|1_0_0_1|__Rm___|"
            }
            C::BranchAndExchange => {
                "FMT: |_Cond__|0_0_0_1|0_0_1_0|1_1_1_1|1_1_1_1|1_1_1_1|0_0_0_1|__Rn___|"
            }
            C::HalfwordDataTransferRegisterOffset => {
                "FMT: |_Cond__|0_0_0|P|U|0|W|L|__Rn___|__Rd___|0_0_0_0|1|S|H|1|__Rm___|"
            }
            C::HalfwordDataTransferImmediateOffset => {
                "FMT: |_Cond__|0_0_0|P|U|1|W|L|__Rn___|__Rd___|_Offset|1|S|H|1|_Offset|"
            }
            C::SingleDataTransfer => {
                "FMT: |_Cond__|0_1|I|P|U|B|W|L|__Rn___|__Rd___|________Offset_________|"
            }
            C::Undefined => "FMT: |_Cond__|0_1_1|__________________xxx___________________|1|_xxx__|",
            C::BlockDataTransfer => {
                "FMT: |_Cond__|1_0_0|P|U|S|W|L|__Rn___|_____________Reg_List__________|"
            }
            C::Branch => "FMT: |_Cond__|1_0_1|L|______________________Offset___________________|",
            C::CoprocessorDataTransfer => {
                "FMT: |_Cond__|1_1_0|P|U|N|W|L|__Rn___|__CRd__|__Cp#__|____Offset_____|"
            }
            C::CoprocessorDataOperation => {
                "FMT: |_Cond__|1_1_1_0|_CPOpc_|__CRn__|__CRd__|__Cp#__|_CP__|0|__CRm__|"
            }
            C::CoprocessorRegisterTransfer => {
                "FMT: |_Cond__|1_1_1_0|CPOpc|L|__CRn__|__Rd___|__Cp#__|_CP__|1|__CRm__|"
            }
            C::SoftwareInterrupt => {
                "FMT: |_Cond__|1_1_1_1|_________________Ignored_______________________|"
            }
            C::PsrTransferMrs => {
                "FMT: |_Cond__|0_0_0_1_0|P|0_0_1_1_1_1|__Rd___|0_0_0_0_0_0_0_0_0_0_0_0|"
            }
            C::PsrTransferMsr => {
                "FMT: |_Cond__|0_0_0_1_0|P|1_0_1_0_0_1_1_1_1_1|0_0_0_0_0_0_0_0|__Rm___|"
            }
            C::PsrTransferMsrFlags => {
                "FMT: |_Cond__|0_0|I|1_0|P|1_0_1_0_0_0_1_1_1_1|_____Source_operand____|"
            }
        }
    }
}

impl std::fmt::Display for ArmModeOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let instruction = self.instruction.disassembler();
        let instruction = format!("INS: {instruction}\n");

        let bytes_pos1 = "POS: |..3 ..................2 ..................1 ..................0|\n";
        let bytes_pos2 = "     |1_0_9_8_7_6_5_4_3_2_1_0_9_8_7_6_5_4_3_2_1_0_9_8_7_6_5_4_3_2_1_0|\n";

        let mut raw_bits = String::new();
        for i in format!("{:#034b}", self.raw).chars().skip(2) {
            raw_bits.push(i);
            raw_bits.push('_');
        }
        raw_bits.pop();
        let raw_bits = format!("RAW: |{raw_bits}|\n");

        write!(
            f,
            "{instruction}{bytes_pos1}{bytes_pos2}{raw_bits}{}",
            self.format_line()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn opcode_carries_category_and_condition() {
        let opcode = ArmModeOpcode::from(0x1353_0001);
        assert_eq!(opcode.category, InstructionCategory::DataProcessing);
        assert_eq!(opcode.condition, Condition::NE);
        assert_eq!(*opcode, 0x1353_0001);
    }

    #[test]
    fn display_lines_up_bits() {
        let opcode = ArmModeOpcode::from(0xEA00_0000);
        let dump = opcode.to_string();
        let lines: Vec<_> = dump.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "INS: B #0");
        assert_eq!(
            lines[3],
            "RAW: |1_1_1_0_1_0_1_0_0_0_0_0_0_0_0_0_0_0_0_0_0_0_0_0_0_0_0_0_0_0_0_0|"
        );
        // Every line after the header has the same width as the bit ruler.
        for line in &lines[1..] {
            assert_eq!(line.chars().count(), lines[1].chars().count(), "{line}");
        }
    }

    #[test]
    fn every_format_line_is_aligned() {
        use crate::cpu::arm::category::DECODE_TABLE;

        for entry in &DECODE_TABLE {
            let opcode = ArmModeOpcode::from(entry.pattern | 0xE000_0000);
            assert_eq!(opcode.category, entry.category);
            assert_eq!(
                opcode.format_line().chars().count(),
                70,
                "{}",
                opcode.format_line()
            );
        }
    }
}
