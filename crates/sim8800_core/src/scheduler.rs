//! Cooperative run loop.
//!
//! Running the machine never blocks the caller. Instead the scheduler keeps
//! at most one tick pending and the host runs it whenever it is free
//! (between two rounds of event handling). Each tick executes roughly one
//! millisecond worth of CPU cycles and, while the machine is still running,
//! queues the next one. Clearing the running flag is the only way to cancel:
//! the tick already pending is consumed without doing any work and nothing
//! new is queued.

/// Ticks per emulated second; one tick covers a millisecond of execution.
pub const TICKS_PER_SECOND: u32 = 1000;

#[derive(Debug, Default)]
pub struct Scheduler {
    pending: bool,
    ticks_run: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a tick at the shortest available delay.
    ///
    /// Returns false when one is already pending; ticks never pile up.
    pub fn schedule(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    /// Claim the pending tick, if any.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Number of ticks waiting to run (0 or 1).
    pub fn pending_ticks(&self) -> usize {
        usize::from(self.pending)
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks_run = self.ticks_run.wrapping_add(1);
    }

    /// Ticks that actually executed work since construction.
    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    /// CPU cycles one tick executes at `clock_rate_hz`; never zero, so a
    /// very slow clock still makes progress.
    pub fn cycles_per_tick(clock_rate_hz: u32) -> u32 {
        (clock_rate_hz / TICKS_PER_SECOND).max(1)
    }
}
