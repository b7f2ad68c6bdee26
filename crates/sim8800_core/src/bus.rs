//! The bus the CPU sees: RAM plus the single wired IO port.

use sim8800_common::{to_bits, IndicatorSink, SwitchInput};

use crate::engine::Bus8080;
use crate::memory::Memory;

/// The only wired port. Reads return the high byte of the sense switches
/// (A8–A15); writes drive the eight data lights.
pub const SENSE_PORT: u8 = 0xff;

/// Bus state for the front panel machine (memory and the panel devices).
///
/// The switches and lights are optional: without switches the panel reads
/// all switches down, without lights port output goes nowhere.
pub struct PanelBus {
    pub(crate) memory: Memory,
    switches: Option<Box<dyn SwitchInput>>,
    indicators: Option<Box<dyn IndicatorSink>>,
}

impl PanelBus {
    pub fn new(
        memory: Memory,
        switches: Option<Box<dyn SwitchInput>>,
        indicators: Option<Box<dyn IndicatorSink>>,
    ) -> Self {
        Self {
            memory,
            switches,
            indicators,
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Current position of the 16 toggle switches.
    pub fn switch_word(&self) -> u16 {
        self.switches.as_ref().map_or(0, |s| s.current_word())
    }

    pub(crate) fn indicators(&mut self) -> Option<&mut (dyn IndicatorSink + 'static)> {
        self.indicators.as_deref_mut()
    }
}

impl Bus8080 for PanelBus {
    fn mem_read(&mut self, addr: u16) -> u8 {
        self.memory.read_byte(addr as usize)
    }

    fn mem_write(&mut self, addr: u16, value: u8) {
        self.memory.write_byte(addr as usize, value);
    }

    fn io_read(&mut self, port: u8) -> u8 {
        match (port, &self.switches) {
            (SENSE_PORT, Some(switches)) => (switches.current_word() >> 8) as u8,
            _ => 0,
        }
    }

    fn io_write(&mut self, port: u8, value: u8) {
        if port != SENSE_PORT {
            return;
        }
        if let Some(indicators) = self.indicators.as_deref_mut() {
            indicators.set_data_indicators(to_bits(u16::from(value)));
        }
    }
}
