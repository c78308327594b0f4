//! Machine configuration.

use serde::{Deserialize, Serialize};

/// Default RAM capacity: 64 KiB.
pub const DEFAULT_RAM_SIZE: usize = 0x1_0000;

/// How much the fetch loop reports while running.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceMode {
    /// Only the final register dump is logged.
    #[default]
    Off,
    /// Every executed step is logged at `trace` level with its disassembly
    /// and the resulting registers.
    EveryStep,
}

/// Parameters of a [`Machine`](crate::cpu::machine::Machine).
///
/// ```
/// use emu::config::MachineConfig;
///
/// let config = MachineConfig {
///     ram_size: 0x100,
///     ..MachineConfig::default()
/// };
/// assert_eq!(config.start_pc, 0);
/// assert!(config.link_sentinel);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// RAM capacity in bytes. The loop halts once PC reaches it.
    pub ram_size: usize,
    /// Initial value of R15.
    pub start_pc: u32,
    /// Preset R14 to `ram_size`, so that returning through the link register
    /// from the outermost routine ends the program.
    pub link_sentinel: bool,
    pub trace: TraceMode,
    /// Stop after this many fetched instructions.
    pub max_steps: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            ram_size: DEFAULT_RAM_SIZE,
            start_pc: 0,
            link_sentinel: true,
            trace: TraceMode::Off,
            max_steps: None,
        }
    }
}

impl MachineConfig {
    /// Value R14 starts with.
    #[must_use]
    pub const fn initial_link_register(&self) -> u32 {
        if self.link_sentinel {
            self.ram_size as u32
        } else {
            0
        }
    }
}
