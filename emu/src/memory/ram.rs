use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::memory::MemoryFault;

/// Zero-initialised RAM of a fixed capacity. Words are little-endian.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ram {
    bytes: Vec<u8>,
}

impl Ram {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity],
        }
    }

    /// Creates a RAM of `capacity` bytes with `image` copied at address 0.
    pub fn with_image(capacity: usize, image: &[u8]) -> Result<Self, MemoryFault> {
        let mut ram = Self::new(capacity);
        ram.load_image(image)?;
        Ok(ram)
    }

    /// Copies `image` at address 0, leaving the rest of RAM untouched.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), MemoryFault> {
        if image.len() > self.bytes.len() {
            return Err(MemoryFault::ImageTooLarge {
                image: image.len(),
                capacity: self.bytes.len(),
            });
        }

        self.bytes[..image.len()].copy_from_slice(image);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether `address` is a valid byte address.
    #[must_use]
    pub fn contains(&self, address: u32) -> bool {
        (address as usize) < self.bytes.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Index range of a `width`-byte access, checked against the capacity
    /// without wrapping around the 32-bit address space.
    fn span(&self, address: u32, width: u32) -> Result<std::ops::Range<usize>, MemoryFault> {
        let start = address as usize;
        match start.checked_add(width as usize) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(MemoryFault::OutOfBounds {
                address,
                width,
                size: self.bytes.len(),
            }),
        }
    }

    pub fn read_byte(&self, address: u32) -> Result<u8, MemoryFault> {
        let span = self.span(address, 1)?;
        Ok(self.bytes[span.start])
    }

    pub fn write_byte(&mut self, address: u32, value: u8) -> Result<(), MemoryFault> {
        let span = self.span(address, 1)?;
        self.bytes[span.start] = value;
        Ok(())
    }

    pub fn read_word(&self, address: u32) -> Result<u32, MemoryFault> {
        let span = self.span(address, 4)?;
        let mut word = [0; 4];
        word.copy_from_slice(&self.bytes[span]);
        Ok(u32::from_le_bytes(word))
    }

    pub fn write_word(&mut self, address: u32, value: u32) -> Result<(), MemoryFault> {
        let span = self.span(address, 4)?;
        for (offset, byte) in self.bytes[span].iter_mut().enumerate() {
            *byte = value.get_byte(offset as u8);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Ram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.bytes.iter().filter(|byte| **byte != 0).count();
        f.debug_struct("Ram")
            .field("capacity", &self.bytes.len())
            .field("non_zero_bytes", &used)
            .finish()
    }
}
