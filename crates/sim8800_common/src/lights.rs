use crate::{from_bits, DebugSink, IndicatorSink, ADDRESS_BITS, DATA_BITS};

/// Latched copy of every panel light, as last driven by the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lights {
    pub address: [bool; ADDRESS_BITS],
    pub data: [bool; DATA_BITS],
    pub wait: bool,
    pub status: bool,
}

impl Lights {
    /// The address lights read back as a word.
    pub fn address_word(&self) -> u16 {
        from_bits(&self.address)
    }

    /// The data lights read back as a byte.
    pub fn data_byte(&self) -> u8 {
        from_bits(&self.data) as u8
    }

    /// True when every light on the panel is dark.
    pub fn is_dark(&self) -> bool {
        *self == Self::default()
    }
}

impl IndicatorSink for Lights {
    fn set_address_indicators(&mut self, bits: [bool; ADDRESS_BITS]) {
        self.address = bits;
    }

    fn set_data_indicators(&mut self, bits: [bool; DATA_BITS]) {
        self.data = bits;
    }

    fn set_wait_indicator(&mut self, on: bool) {
        self.wait = on;
    }

    fn set_status_indicators(&mut self, ready: bool) {
        self.status = ready;
    }
}

/// Last text pushed to the CPU and memory monitors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DebugText {
    pub cpu: String,
    pub mem: String,
}

impl DebugSink for DebugText {
    fn dump_cpu(&mut self, text: &str) {
        self.cpu.clear();
        self.cpu.push_str(text);
    }

    fn dump_mem(&mut self, text: &str) {
        self.mem.clear();
        self.mem.push_str(text);
    }
}
