//! # Memory
//!
//! A flat, byte-addressable RAM starting at address 0. There is no memory
//! map: every address below the configured capacity is plain read/write
//! storage, everything else is a fault.

pub mod ram;

use thiserror::Error;

/// Errors raised by RAM accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryFault {
    /// `width` bytes starting at `address` do not all fit in RAM.
    #[error("{width}-byte access at 0x{address:08X} is outside RAM (0x{size:X} bytes)")]
    OutOfBounds { address: u32, width: u32, size: usize },

    #[error("image of {image} bytes does not fit in {capacity} bytes of RAM")]
    ImageTooLarge { image: usize, capacity: usize },
}
