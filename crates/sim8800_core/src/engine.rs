//! The seam between the front panel and an instruction execution engine.
//!
//! The panel never looks inside the CPU. It hands the engine a [`Bus8080`]
//! on every step and only ever asks for a reset, a slice of cycles, or a
//! register snapshot. Any type implementing [`Engine`] can be dropped in.

use bitflags::bitflags;

/// Simple bus interface for an Intel 8080-compatible CPU core.
///
/// The CPU uses this trait to access memory and IO ports without knowing
/// anything about the concrete machine behind them.
pub trait Bus8080 {
    fn mem_read(&mut self, addr: u16) -> u8;
    fn mem_write(&mut self, addr: u16, value: u8);

    fn io_read(&mut self, port: u8) -> u8;
    fn io_write(&mut self, port: u8, value: u8);
}

/// An opaque instruction execution engine.
pub trait Engine {
    /// Put every register back to its power-on value.
    fn reset(&mut self);

    /// Execute whole instructions until at least `cycles` clock cycles have
    /// elapsed and return the number actually consumed.
    ///
    /// A request of one cycle therefore executes exactly one instruction.
    fn step<B: Bus8080>(&mut self, bus: &mut B, cycles: u32) -> u32;

    /// Snapshot of the programmer-visible registers.
    fn status(&self) -> CpuStatus;
}

bitflags! {
    /// Bits of the 8080 flag register (F).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u8 {
        const SIGN = 0x80;
        const ZERO = 0x40;
        const AUX_CARRY = 0x10;
        const PARITY = 0x04;
        /// Always reads back as 1 on real silicon.
        const ALWAYS_ONE = 0x02;
        const CARRY = 0x01;
    }
}

/// Register snapshot returned by [`Engine::status`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuStatus {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub h: u8,
    pub l: u8,
}

impl CpuStatus {
    /// The F register decoded into named flags.
    pub fn flags(&self) -> StatusFlags {
        StatusFlags::from_bits_truncate(self.f)
    }
}
