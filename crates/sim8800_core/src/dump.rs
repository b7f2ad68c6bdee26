//! Text renderings for the CPU and memory monitors.

use std::fmt;

use crate::engine::{CpuStatus, StatusFlags};

/// Bytes shown per memory dump row.
pub const BYTES_PER_ROW: usize = 16;

const FLAG_NAMES: [(StatusFlags, &str); 5] = [
    (StatusFlags::SIGN, "SIGN"),
    (StatusFlags::ZERO, "ZERO"),
    (StatusFlags::AUX_CARRY, "AC"),
    (StatusFlags::PARITY, "PARITY"),
    (StatusFlags::CARRY, "CARRY"),
];

/// Hex listing of a memory image.
///
/// ```text
/// 0000  c3 00 00 00 00 00 00 00  00 00 00 00 00 00 00 00
/// 0010  00 00 00 00 00 00 00 00  00 00 00 00 00 00 00 00
/// ```
pub struct MemoryDump<'a>(pub &'a [u8]);

impl fmt::Display for MemoryDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.0.chunks(BYTES_PER_ROW).enumerate() {
            write!(f, "{:04x} ", row * BYTES_PER_ROW)?;
            for (i, byte) in chunk.iter().enumerate() {
                // Extra gap between the two 8-byte halves.
                let sep = if i == 8 { "  " } else { " " };
                write!(f, "{}{:02x}", sep, byte)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for CpuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PC = {:04x}  SP = {:04x}", self.pc, self.sp)?;
        writeln!(
            f,
            "A = {:02x}  B = {:02x}  C = {:02x}  D = {:02x}",
            self.a, self.b, self.c, self.d
        )?;
        writeln!(
            f,
            "E = {:02x}  F = {:02x}  H = {:02x}  L = {:02x}",
            self.e, self.f, self.h, self.l
        )?;
        write!(f, "FLAGS:")?;
        let flags = self.flags();
        for (flag, name) in FLAG_NAMES {
            if flags.contains(flag) {
                write!(f, " {}", name)?;
            }
        }
        writeln!(f)
    }
}
