//! # Machine
//!
//! Registers, flags and RAM, driven by a fetch/execute loop.
//!
//! ```text
//!          ┌────────────────────────────────────────────────┐
//!          │                                                │
//!          ▼                                                │
//!   PC >= RAM size? ──yes──► Halted                         │
//!          │ no                                             │
//!   fetch word at PC (little-endian)                        │
//!   PC += 4                                                 │
//!   condition holds? ──no──► Skipped ───────────────────────┤
//!          │ yes                                            │
//!   dispatch on category ──fault──► Err(Fault)              │
//!          │                                                │
//!          └──────────────► Executed ───────────────────────┘
//! ```
//!
//! Halting because PC left RAM is the normal end of a program, not an error.

use serde::{Deserialize, Serialize};

use crate::config::{MachineConfig, TraceMode};
use crate::cpu::arm::instructions::ArmModeInstruction;
use crate::cpu::arm::mode::ArmModeOpcode;
use crate::cpu::arm::operations::SIZE_OF_INSTRUCTION;
use crate::cpu::fault::Fault;
use crate::cpu::psr::Psr;
use crate::cpu::registers::{REG_LR, Registers};
use crate::memory::MemoryFault;
use crate::memory::ram::Ram;

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Executed,
    /// The condition field did not hold; only PC moved.
    Skipped,
    /// PC is outside RAM. Nothing was fetched.
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    PcOutOfRange,
    StepLimit,
}

/// Result of [`Machine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: u64,
    pub reason: HaltReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagsSnapshot {
    pub n: bool,
    pub z: bool,
    pub c: bool,
    pub v: bool,
}

impl From<Psr> for FlagsSnapshot {
    fn from(psr: Psr) -> Self {
        Self {
            n: psr.sign_flag(),
            z: psr.zero_flag(),
            c: psr.carry_flag(),
            v: psr.overflow_flag(),
        }
    }
}

/// Observable state of a machine, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub registers: [u32; 16],
    pub flags: FlagsSnapshot,
    pub steps: u64,
}

pub struct Machine {
    pub registers: Registers,
    pub cpsr: Psr,
    pub ram: Ram,
    config: MachineConfig,
    steps: u64,
}

impl Machine {
    /// A machine with zeroed RAM of `config.ram_size` bytes.
    #[must_use]
    pub fn new(config: MachineConfig) -> Self {
        let mut registers = Registers::default();
        registers.set_program_counter(config.start_pc);
        registers.set_register_at(REG_LR, config.initial_link_register());

        Self {
            registers,
            cpsr: Psr::default(),
            ram: Ram::new(config.ram_size),
            config,
            steps: 0,
        }
    }

    /// A machine whose RAM starts with `image` at address 0.
    pub fn with_image(config: MachineConfig, image: &[u8]) -> Result<Self, MemoryFault> {
        let mut machine = Self::new(config);
        machine.ram.load_image(image)?;
        Ok(machine)
    }

    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Number of instructions fetched so far, skipped ones included.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        !self.ram.contains(self.registers.program_counter())
    }

    /// Runs one instruction of an already decoded word. PC must already point
    /// past it.
    pub fn execute_arm(&mut self, op_code: ArmModeOpcode) -> Result<StepOutcome, Fault> {
        let address = self
            .registers
            .program_counter()
            .wrapping_sub(SIZE_OF_INSTRUCTION);

        if !self.cpsr.can_execute(op_code.condition) {
            return Ok(StepOutcome::Skipped);
        }

        match op_code.instruction {
            ArmModeInstruction::DataProcessing {
                alu_instruction,
                set_conditions,
                rn,
                destination,
                op2,
                ..
            } => self.data_processing(alu_instruction, set_conditions, rn, destination, op2),
            ArmModeInstruction::SingleDataTransfer {
                load_store,
                quantity,
                write_back,
                indexing,
                offsetting,
                rd,
                base_register,
                offset_info,
                ..
            } => self
                .single_data_transfer(
                    load_store,
                    quantity,
                    write_back,
                    indexing,
                    offsetting,
                    rd,
                    base_register,
                    offset_info,
                )
                .map_err(|source| Fault::Memory {
                    address_of_instruction: address,
                    source,
                })?,
            ArmModeInstruction::Branch { link, offset, .. } => self.branch(link, offset),
            ArmModeInstruction::MultiplyLong {
                signed,
                accumulate,
                set_conditions,
                rdhi,
                rdlo,
                rs,
                rm,
                ..
            } => self.multiply_long(signed, accumulate, set_conditions, rdhi, rdlo, rs, rm),
            ArmModeInstruction::Unimplemented { category, .. } => {
                return Err(Fault::Unimplemented {
                    address,
                    word: op_code.raw,
                    category,
                });
            }
            ArmModeInstruction::Undefined { .. } => {
                return Err(Fault::Undefined {
                    address,
                    word: op_code.raw,
                });
            }
        }

        Ok(StepOutcome::Executed)
    }

    /// Executes `word` as if it had been fetched at the current PC, without
    /// reading RAM.
    pub fn process(&mut self, word: u32) -> Result<StepOutcome, Fault> {
        let address = self.registers.program_counter();
        self.registers.advance_program_counter(SIZE_OF_INSTRUCTION);
        self.steps += 1;

        let op_code = ArmModeOpcode::from(word);
        let outcome = self.execute_arm(op_code).inspect_err(|fault| {
            tracing::warn!("{fault}");
        })?;

        if self.config.trace == TraceMode::EveryStep {
            self.trace_step(address, &op_code, outcome);
        }

        Ok(outcome)
    }

    /// Processes `words` in order, stopping at the first fault.
    pub fn run_words(&mut self, words: &[u32]) -> Result<(), Fault> {
        for &word in words {
            self.process(word)?;
        }
        Ok(())
    }

    /// Fetches the word at PC and executes it.
    pub fn step(&mut self) -> Result<StepOutcome, Fault> {
        let pc = self.registers.program_counter();
        if !self.ram.contains(pc) {
            return Ok(StepOutcome::Halted);
        }

        let word = self.ram.read_word(pc).map_err(|source| {
            let fault = Fault::Memory {
                address_of_instruction: pc,
                source,
            };
            tracing::warn!("{fault}");
            fault
        })?;

        self.process(word)
    }

    /// Steps until PC leaves RAM or the configured step limit is reached.
    pub fn run(&mut self) -> Result<RunSummary, Fault> {
        let start = self.steps;
        let reason = loop {
            if self
                .config
                .max_steps
                .is_some_and(|max_steps| self.steps - start >= max_steps)
            {
                break HaltReason::StepLimit;
            }

            if self.step()? == StepOutcome::Halted {
                break HaltReason::PcOutOfRange;
            }
        };

        let summary = RunSummary {
            steps: self.steps - start,
            reason,
        };
        tracing::debug!(
            "halted after {} steps ({:?})\n{:?}\nflags: {:?}",
            summary.steps,
            summary.reason,
            self.registers,
            self.cpsr
        );

        Ok(summary)
    }

    #[must_use]
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            registers: *self.registers.as_array(),
            flags: self.cpsr.into(),
            steps: self.steps,
        }
    }

    fn trace_step(&self, address: u32, op_code: &ArmModeOpcode, outcome: StepOutcome) {
        let skipped = if outcome == StepOutcome::Skipped {
            " (skipped)"
        } else {
            ""
        };
        tracing::trace!(
            "{address:08X}: {:08X}  {}{skipped}\n{:?}\nflags: {:?}",
            op_code.raw,
            op_code.instruction.disassembler(),
            self.registers,
            self.cpsr
        );
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("registers", &self.registers)
            .field("cpsr", &self.cpsr)
            .field("ram", &self.ram)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::arm::category::InstructionCategory;
    use pretty_assertions::assert_eq;

    /// Zeroed registers, no link sentinel.
    fn bare(ram_size: usize) -> Machine {
        Machine::new(MachineConfig {
            ram_size,
            link_sentinel: false,
            ..MachineConfig::default()
        })
    }

    fn image(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|word| word.to_le_bytes()).collect()
    }

    #[test]
    fn branch_never_does_not_branch() {
        let mut machine = bare(0x100);
        let outcome = machine
            .process(0b1111_1010_0000_0000_0000_0000_0000_1111)
            .unwrap();
        assert_eq!(outcome, StepOutcome::Skipped);
        assert_eq!(machine.registers.program_counter(), 4);
    }

    #[test]
    fn branch_without_link() {
        let mut machine = bare(0x100);
        machine
            .process(0b1110_1010_0000_0000_0000_0000_0000_1111)
            .unwrap();
        assert_eq!(machine.registers.program_counter(), 68);
        assert_eq!(machine.registers.register_at(REG_LR), 0);
    }

    #[test]
    fn branch_with_link() {
        let mut machine = bare(0x100);
        machine
            .process(0b1110_1011_0000_0000_0000_0000_0000_1111)
            .unwrap();
        assert_eq!(machine.registers.program_counter(), 68);
        assert_eq!(machine.registers.register_at(REG_LR), 4);
    }

    #[test]
    fn add_immediate() {
        let mut machine = bare(0x100);
        machine.process(0xE280_0055).unwrap(); // add r0, r0, #85
        assert_eq!(machine.registers.register_at(0), 0x55);
        assert_eq!(machine.registers.program_counter(), 4);
    }

    #[test]
    fn add_rotated_immediate() {
        let mut machine = bare(0x100);
        machine
            .run_words(&[
                0xE280_0055, // add r0, r0, #85
                0xE280_0C7E, // add r0, r0, #32256
            ])
            .unwrap();
        assert_eq!(machine.registers.register_at(0), 85 + 32256);
    }

    #[test]
    fn sub_registers() {
        let mut machine = bare(0x100);
        machine
            .run_words(&[
                0xE280_0001, // add r0, r0, #1
                0xE281_1009, // add r1, r1, #9
                0xE282_2002, // add r2, r2, #2
                0xE042_3001, // sub r3, r2, r1
            ])
            .unwrap();
        assert_eq!(machine.registers.register_at(3), 2_u32.wrapping_sub(9));
    }

    #[test]
    fn sub_register_shifted_by_register() {
        let mut machine = bare(0x100);
        machine
            .run_words(&[
                0xE280_0001, // add r0, r0, #1
                0xE281_1009, // add r1, r1, #9
                0xE282_2002, // add r2, r2, #2
                0xE040_3231, // sub r3, r0, r1, lsr r2
            ])
            .unwrap();
        assert_eq!(machine.registers.register_at(3), 1_u32.wrapping_sub(9 >> 2));
    }

    #[test]
    fn store_byte_then_load_byte() {
        let mut machine = bare(0x100);
        machine
            .run_words(&[
                0xE3A0_00A5, // mov r0, #0xA5
                0xE3A0_1080, // mov r1, #0x80
                0xE5C1_0000, // strb r0, [r1]
                0xE5D1_2000, // ldrb r2, [r1]
            ])
            .unwrap();
        assert_eq!(machine.registers.register_at(2), 0xA5);
        assert_eq!(machine.ram.read_byte(0x80).unwrap(), 0xA5);
    }

    #[test]
    fn run_halts_when_pc_leaves_ram() {
        let program = image(&[
            0xE280_0055, // add r0, r0, #85
            0xE280_0C7E, // add r0, r0, #32256
        ]);
        let mut machine = Machine::with_image(
            MachineConfig {
                ram_size: program.len(),
                ..MachineConfig::default()
            },
            &program,
        )
        .unwrap();

        let summary = machine.run().unwrap();
        assert_eq!(
            summary,
            RunSummary {
                steps: 2,
                reason: HaltReason::PcOutOfRange
            }
        );
        assert_eq!(machine.registers.register_at(0), 85 + 32256);
        assert!(machine.is_halted());
        assert_eq!(machine.step().unwrap(), StepOutcome::Halted);
    }

    #[test]
    fn return_through_link_sentinel_halts() {
        let program = image(&[
            0xE3A0_0007, // mov r0, #7
            0xE1A0_F00E, // mov pc, lr
            0xE3A0_0009, // mov r0, #9
        ]);
        let mut machine = Machine::with_image(
            MachineConfig {
                ram_size: 0x40,
                ..MachineConfig::default()
            },
            &program,
        )
        .unwrap();

        let summary = machine.run().unwrap();
        assert_eq!(summary.reason, HaltReason::PcOutOfRange);
        assert_eq!(summary.steps, 2);
        assert_eq!(machine.registers.register_at(0), 7);
        assert_eq!(machine.registers.program_counter(), 0x40);
    }

    #[test]
    fn subroutine_call_and_loop() {
        // r0 = 3 * 4 by repeated addition in a subroutine.
        let program = image(&[
            0xE3A0_1003, // 00: mov r1, #3
            0xE3A0_2004, // 04: mov r2, #4
            0xEB00_0001, // 08: bl 0x14
            0xE1A0_4000, // 0C: mov r4, r0
            0xEA00_0004, // 10: b 0x28
            0xE080_0001, // 14: add r0, r0, r1
            0xE252_2001, // 18: subs r2, r2, #1
            0x1AFF_FFFC, // 1C: bne 0x14
            0xE1A0_F00E, // 20: mov pc, lr
            0xE3A0_40FF, // 24: mov r4, #0xFF (never reached)
        ]);
        let mut machine = Machine::with_image(
            MachineConfig {
                ram_size: 0x28,
                link_sentinel: false,
                ..MachineConfig::default()
            },
            &program,
        )
        .unwrap();

        let summary = machine.run().unwrap();
        assert_eq!(summary.reason, HaltReason::PcOutOfRange);
        assert_eq!(machine.registers.register_at(0), 12);
        assert_eq!(machine.registers.register_at(4), 12);
        assert_eq!(machine.registers.register_at(REG_LR), 0x0C);
        assert!(machine.cpsr.zero_flag());
    }

    #[test]
    fn step_limit() {
        // b . forever
        let program = image(&[0xEAFF_FFFE]);
        let mut machine = Machine::with_image(
            MachineConfig {
                ram_size: 0x10,
                max_steps: Some(5),
                ..MachineConfig::default()
            },
            &program,
        )
        .unwrap();

        let summary = machine.run().unwrap();
        assert_eq!(
            summary,
            RunSummary {
                steps: 5,
                reason: HaltReason::StepLimit
            }
        );
        assert_eq!(machine.registers.program_counter(), 0);
    }

    #[test]
    fn skipped_instructions_count_as_steps() {
        let mut machine = bare(0x100);
        machine.process(0x0280_0001).unwrap(); // addeq r0, r0, #1 with Z clear
        assert_eq!(machine.registers.register_at(0), 0);
        assert_eq!(machine.steps(), 1);
    }

    #[test]
    fn unimplemented_category_is_fatal() {
        let mut machine = bare(0x100);
        machine.registers.set_program_counter(0x20);
        let fault = machine.process(0xE000_0291).unwrap_err(); // mul r0, r1, r2
        assert_eq!(
            fault,
            Fault::Unimplemented {
                address: 0x20,
                word: 0xE000_0291,
                category: InstructionCategory::Multiply,
            }
        );
    }

    #[test]
    fn undefined_is_fatal() {
        let mut machine = bare(0x100);
        let fault = machine.process(0xE600_0010).unwrap_err();
        assert_eq!(
            fault,
            Fault::Undefined {
                address: 0,
                word: 0xE600_0010
            }
        );
    }

    #[test]
    fn failed_condition_hides_decode_gaps() {
        let mut machine = bare(0x100);
        // swine: Z is clear so the software interrupt never runs.
        assert_eq!(machine.process(0x0F00_0000).unwrap(), StepOutcome::Skipped);
    }

    #[test]
    fn run_stops_at_first_fault() {
        let program = image(&[
            0xE3A0_0001, // mov r0, #1
            0xEF00_0000, // swi 0
            0xE3A0_0002, // mov r0, #2
        ]);
        let mut machine = Machine::with_image(
            MachineConfig {
                ram_size: 0x20,
                ..MachineConfig::default()
            },
            &program,
        )
        .unwrap();

        let fault = machine.run().unwrap_err();
        assert_eq!(fault.address(), 4);
        assert_eq!(machine.registers.register_at(0), 1);
    }

    #[test]
    fn memory_fault_reports_the_instruction() {
        let mut machine = bare(0x100);
        machine.registers.set_program_counter(0x10);
        machine.registers.set_register_at(1, 0x100);
        let fault = machine.process(0xE591_0000).unwrap_err(); // ldr r0, [r1]
        assert_eq!(
            fault,
            Fault::Memory {
                address_of_instruction: 0x10,
                source: MemoryFault::OutOfBounds {
                    address: 0x100,
                    width: 4,
                    size: 0x100
                },
            }
        );
    }

    #[test]
    fn partial_fetch_faults() {
        let mut machine = bare(6);
        machine.registers.set_program_counter(4);
        let fault = machine.step().unwrap_err();
        assert!(matches!(
            fault,
            Fault::Memory {
                address_of_instruction: 4,
                ..
            }
        ));
    }

    #[test]
    fn image_too_large() {
        let error = Machine::with_image(
            MachineConfig {
                ram_size: 2,
                ..MachineConfig::default()
            },
            &[0; 3],
        )
        .unwrap_err();
        assert_eq!(
            error,
            MemoryFault::ImageTooLarge {
                image: 3,
                capacity: 2
            }
        );
    }

    #[test]
    fn initial_state() {
        let machine = Machine::new(MachineConfig {
            ram_size: 0x200,
            start_pc: 0x40,
            ..MachineConfig::default()
        });
        assert_eq!(machine.registers.program_counter(), 0x40);
        assert_eq!(machine.registers.register_at(REG_LR), 0x200);
        assert_eq!(machine.cpsr, Psr::default());
        assert_eq!(machine.steps(), 0);
    }

    #[test]
    fn snapshot_serializes() {
        let mut machine = bare(0x100);
        machine.process(0xE3B0_0000).unwrap(); // movs r0, #0
        let snapshot = machine.snapshot();

        assert_eq!(snapshot.registers[15], 4);
        assert_eq!(
            snapshot.flags,
            FlagsSnapshot {
                n: false,
                z: true,
                c: false,
                v: false
            }
        );

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["steps"], 1);
        assert_eq!(json["flags"]["z"], true);
        assert_eq!(json["registers"].as_array().unwrap().len(), 16);
    }

    #[test]
    fn tracing_every_step_does_not_change_results() {
        let mut machine = Machine::new(MachineConfig {
            ram_size: 0x100,
            trace: TraceMode::EveryStep,
            ..MachineConfig::default()
        });
        machine.run_words(&[0xE280_0055, 0xE280_0C7E]).unwrap();
        assert_eq!(machine.registers.register_at(0), 85 + 32256);
    }
}
