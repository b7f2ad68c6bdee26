use anyhow::{bail, Result};
use rand::RngCore;

/// Largest memory the 16-bit address bus can reach (64 KiB).
pub const MAX_MEMORY_SIZE: usize = 0x10000;

/// How memory is initialized on power-on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillMode {
    #[default]
    Zero,
    /// Independent uniformly random bytes, like real DRAM after power-up.
    /// Useful for shaking out programs that read uninitialized memory.
    Random,
}

/// Fixed-size RAM with wraparound addressing.
///
/// Every address is reduced modulo the memory size before use, so an access
/// can never be out of range. A 256 byte board answers address 0x0100 with
/// the byte at 0x0000, exactly like the partially decoded address lines on
/// a real memory card.
#[derive(Clone, Debug)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            bail!("memory size must be at least one byte");
        }
        if size > MAX_MEMORY_SIZE {
            bail!(
                "memory size {} exceeds the 16-bit address space ({} bytes)",
                size,
                MAX_MEMORY_SIZE
            );
        }
        Ok(Self {
            bytes: vec![0; size],
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn read_byte(&self, addr: usize) -> u8 {
        self.bytes[addr % self.bytes.len()]
    }

    pub fn write_byte(&mut self, addr: usize, value: u8) {
        let len = self.bytes.len();
        self.bytes[addr % len] = value;
    }

    pub fn fill(&mut self, mode: FillMode) {
        match mode {
            FillMode::Zero => self.bytes.fill(0),
            FillMode::Random => rand::thread_rng().fill_bytes(&mut self.bytes),
        }
    }

    /// Copy `data` in starting at `address`, stopping at the end of memory.
    ///
    /// Unlike single-byte accesses this does not wrap. Returns the number of
    /// bytes written.
    pub fn load(&mut self, address: usize, data: &[u8]) -> usize {
        let Some(dest) = self.bytes.get_mut(address..) else {
            return 0;
        };
        let len = dest.len().min(data.len());
        dest[..len].copy_from_slice(&data[..len]);
        len
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}
