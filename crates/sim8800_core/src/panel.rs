use anyhow::{Context, Result};
use sim8800_common::{to_bits, DebugSink, ADDRESS_BITS, DATA_BITS};

use crate::bus::PanelBus;
use crate::config::{PanelConfig, Peripherals};
use crate::cpu::Cpu8080;
use crate::dump::MemoryDump;
use crate::engine::{CpuStatus, Engine};
use crate::memory::Memory;
use crate::scheduler::Scheduler;

/// The externally visible front panel state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PanelState {
    Off,
    Idle,
    Running,
}

/// Power, run and addressing state of the machine.
///
/// `running` implies `powered_on`. `last_address` is the cursor that
/// EXAMINE NEXT and DEPOSIT NEXT advance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MachineState {
    pub powered_on: bool,
    pub running: bool,
    pub last_address: u16,
    pub clock_rate_hz: u32,
}

/// The Altair 8800 front panel controller.
///
/// Owns memory, the bus handed to the CPU, the run loop scheduler and the
/// optional frontend collaborators. Every operation mirrors a physical
/// switch: with the power off it does nothing, and nothing it does can fail.
pub struct FrontPanel<E: Engine = Cpu8080> {
    config: PanelConfig,
    state: MachineState,
    bus: PanelBus,
    engine: E,
    scheduler: Scheduler,
    debug: Option<Box<dyn DebugSink>>,
}

impl FrontPanel<Cpu8080> {
    /// Build a powered-off machine around the bundled 8080 core.
    pub fn new(config: PanelConfig, peripherals: Peripherals) -> Result<Self> {
        Self::with_engine(config, peripherals, Cpu8080::new())
    }
}

impl<E: Engine> FrontPanel<E> {
    /// Build a powered-off machine around any execution engine.
    pub fn with_engine(config: PanelConfig, peripherals: Peripherals, engine: E) -> Result<Self> {
        let memory = Memory::new(config.memory_size).context("invalid panel configuration")?;
        let Peripherals {
            switches,
            indicators,
            debug,
        } = peripherals;
        Ok(Self {
            config,
            state: MachineState {
                clock_rate_hz: config.clock_rate_hz,
                ..MachineState::default()
            },
            bus: PanelBus::new(memory, switches, indicators),
            engine,
            scheduler: Scheduler::new(),
            debug,
        })
    }

    pub fn state(&self) -> PanelState {
        match (self.state.powered_on, self.state.running) {
            (false, _) => PanelState::Off,
            (true, false) => PanelState::Idle,
            (true, true) => PanelState::Running,
        }
    }

    pub fn machine(&self) -> MachineState {
        self.state
    }

    pub fn is_powered_on(&self) -> bool {
        self.state.powered_on
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn last_address(&self) -> u16 {
        self.state.last_address
    }

    pub fn memory(&self) -> &[u8] {
        self.bus.memory().as_slice()
    }

    pub fn cpu_status(&self) -> CpuStatus {
        self.engine.status()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn pending_ticks(&self) -> usize {
        self.scheduler.pending_ticks()
    }

    pub fn ticks_run(&self) -> u64 {
        self.scheduler.ticks_run()
    }

    pub fn clock_rate_hz(&self) -> u32 {
        self.state.clock_rate_hz
    }

    /// Change the emulated clock; takes effect from the next tick.
    pub fn set_clock_rate_hz(&mut self, clock_rate_hz: u32) {
        self.state.clock_rate_hz = clock_rate_hz;
    }

    pub fn power_on(&mut self) {
        if self.state.powered_on {
            log::debug!("POWER ON ignored: already on");
            return;
        }
        log::info!(
            "Power on: {} bytes of memory ({:?} fill), {} Hz",
            self.bus.memory().len(),
            self.config.fill,
            self.state.clock_rate_hz
        );
        self.bus.memory.fill(self.config.fill);
        self.engine.reset();
        self.state.powered_on = true;
        self.state.running = false;
        self.state.last_address = 0;
        if let Some(indicators) = self.bus.indicators() {
            indicators.set_status_indicators(true);
            indicators.set_wait_indicator(true);
        }
        self.refresh_dumps();
    }

    /// Cut the power. Blanks every light and monitor, whatever the state.
    pub fn power_off(&mut self) {
        if self.state.powered_on {
            log::info!("Power off");
        }
        self.state.running = false;
        self.state.powered_on = false;
        if let Some(indicators) = self.bus.indicators() {
            indicators.set_address_indicators([false; ADDRESS_BITS]);
            indicators.set_data_indicators([false; DATA_BITS]);
            indicators.set_status_indicators(false);
            indicators.set_wait_indicator(false);
        }
        if let Some(debug) = self.debug.as_deref_mut() {
            debug.dump_cpu("");
            debug.dump_mem("");
        }
    }

    /// RESET: stop the CPU and restart it at 0000. Memory is kept; only a
    /// power cycle clears it.
    pub fn reset(&mut self) {
        if !self.state.powered_on {
            log::debug!("RESET ignored: power is off");
            return;
        }
        log::debug!("Reset");
        self.engine.reset();
        self.state.running = false;
        self.state.last_address = 0;
        if let Some(indicators) = self.bus.indicators() {
            // Lamp test flash.
            indicators.set_address_indicators([true; ADDRESS_BITS]);
            indicators.set_data_indicators([true; DATA_BITS]);
            indicators.set_address_indicators([false; ADDRESS_BITS]);
            indicators.set_data_indicators([false; DATA_BITS]);
            indicators.set_wait_indicator(true);
        }
        self.refresh_dumps();
    }

    /// RUN: hand the CPU to the scheduler. Returns immediately; the host
    /// drives execution through [`FrontPanel::tick`].
    pub fn start(&mut self) {
        if !self.state.powered_on {
            log::debug!("RUN ignored: power is off");
            return;
        }
        if self.state.running {
            log::debug!("RUN ignored: already running");
            return;
        }
        self.state.running = true;
        if let Some(indicators) = self.bus.indicators() {
            indicators.set_wait_indicator(false);
        }
        self.scheduler.schedule();
    }

    /// STOP: clear the running flag. A tick already queued still gets
    /// consumed but executes nothing.
    pub fn stop(&mut self) {
        if !self.state.powered_on {
            log::debug!("STOP ignored: power is off");
            return;
        }
        self.state.running = false;
        if let Some(indicators) = self.bus.indicators() {
            indicators.set_wait_indicator(true);
        }
    }

    /// SINGLE STEP: execute exactly one instruction while stopped.
    pub fn single_step(&mut self) {
        if !self.state.powered_on {
            log::debug!("SINGLE STEP ignored: power is off");
            return;
        }
        if self.state.running {
            log::debug!("SINGLE STEP ignored: machine is running");
            return;
        }
        self.execute(1);
    }

    /// Run the pending scheduler tick, if there is one.
    ///
    /// Hosts call this whenever they are free. Returns true when CPU work was
    /// done; the next tick is then already queued.
    pub fn tick(&mut self) -> bool {
        if !self.scheduler.take() {
            return false;
        }
        if !self.state.running {
            log::trace!("Tick dropped: machine stopped");
            return false;
        }
        let cycles = Scheduler::cycles_per_tick(self.state.clock_rate_hz);
        let consumed = self.execute(cycles);
        self.scheduler.record_tick();
        log::trace!(
            "Tick {}: {} cycles, pc={:04x}",
            self.scheduler.ticks_run(),
            consumed,
            self.engine.status().pc
        );
        self.scheduler.schedule();
        true
    }

    /// EXAMINE: load the address switches into the cursor and show the byte
    /// stored there.
    pub fn examine(&mut self) {
        if !self.state.powered_on {
            log::debug!("EXAMINE ignored: power is off");
            return;
        }
        self.state.last_address = self.bus.switch_word();
        self.show_last_address();
        self.refresh_dumps();
    }

    pub fn examine_next(&mut self) {
        if !self.state.powered_on {
            log::debug!("EXAMINE NEXT ignored: power is off");
            return;
        }
        self.state.last_address = self.state.last_address.wrapping_add(1);
        self.show_last_address();
        self.refresh_dumps();
    }

    /// DEPOSIT: store the low byte of the switches at the cursor.
    pub fn deposit(&mut self) {
        if !self.state.powered_on {
            log::debug!("DEPOSIT ignored: power is off");
            return;
        }
        let value = self.bus.switch_word() as u8;
        self.bus
            .memory
            .write_byte(usize::from(self.state.last_address), value);
        self.show_last_address();
        self.refresh_dumps();
    }

    pub fn deposit_next(&mut self) {
        if !self.state.powered_on {
            log::debug!("DEPOSIT NEXT ignored: power is off");
            return;
        }
        self.state.last_address = self.state.last_address.wrapping_add(1);
        self.deposit();
    }

    /// Copy `data` into memory from `address`, stopping at the end of memory.
    ///
    /// Returns the number of bytes written; zero while the power is off.
    pub fn load_data(&mut self, address: u16, data: &[u8]) -> usize {
        if !self.state.powered_on {
            log::debug!("Load ignored: power is off");
            return 0;
        }
        let written = self.bus.memory.load(usize::from(address), data);
        log::debug!("Loaded {} of {} bytes at {:04x}", written, data.len(), address);
        self.refresh_dumps();
        written
    }

    /// Load whitespace separated hex bytes such as `"c3 00 00"`.
    ///
    /// Every token owns one memory slot: a token that is not a valid byte is
    /// skipped, but the bytes after it still land at their own offset. So
    /// `"zz 05"` leaves `address` untouched and writes 05 at `address + 1`.
    /// Returns the number of bytes written.
    pub fn load_data_as_hex_string(&mut self, address: u16, hex: &str) -> usize {
        if !self.state.powered_on {
            log::debug!("Load ignored: power is off");
            return 0;
        }
        let len = self.bus.memory().len();
        let mut written = 0;
        for (offset, token) in hex.split_whitespace().enumerate() {
            let addr = usize::from(address) + offset;
            if addr >= len {
                break;
            }
            match u8::from_str_radix(token, 16) {
                Ok(byte) => {
                    self.bus.memory.write_byte(addr, byte);
                    written += 1;
                }
                Err(err) => log::warn!("Skipping hex token {:?} at {:04x}: {}", token, addr, err),
            }
        }
        log::debug!("Loaded {} hex bytes at {:04x}", written, address);
        self.refresh_dumps();
        written
    }

    fn execute(&mut self, cycles: u32) -> u32 {
        let consumed = self.engine.step(&mut self.bus, cycles);
        let pc = self.engine.status().pc;
        if let Some(indicators) = self.bus.indicators() {
            indicators.set_address_indicators(to_bits(pc));
        }
        self.refresh_dumps();
        consumed
    }

    fn show_last_address(&mut self) {
        let address = self.state.last_address;
        let data = self.bus.memory().read_byte(usize::from(address));
        if let Some(indicators) = self.bus.indicators() {
            indicators.set_address_indicators(to_bits(address));
            indicators.set_data_indicators(to_bits(u16::from(data)));
        }
    }

    fn refresh_dumps(&mut self) {
        let Some(debug) = self.debug.as_deref_mut() else {
            return;
        };
        debug.dump_cpu(&self.engine.status().to_string());
        debug.dump_mem(&MemoryDump(self.bus.memory.as_slice()).to_string());
    }
}

#[cfg(test)]
mod tests;
