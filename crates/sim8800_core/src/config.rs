use sim8800_common::{DebugSink, IndicatorSink, SwitchInput};
use typed_builder::TypedBuilder;

use crate::memory::FillMode;

/// Default memory size: one stock 256 byte Altair memory card.
pub const DEFAULT_MEMORY_SIZE: usize = 256;
/// Default clock rate of the 8080 on the Altair CPU board.
pub const DEFAULT_CLOCK_RATE_HZ: u32 = 2_000_000;

/// Machine configuration fixed at construction.
#[derive(TypedBuilder, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    #[builder(default = DEFAULT_MEMORY_SIZE)]
    pub memory_size: usize,
    #[builder(default = DEFAULT_CLOCK_RATE_HZ)]
    pub clock_rate_hz: u32,
    /// How memory is initialized on power-on.
    #[builder(default)]
    pub fill: FillMode,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The frontend collaborators, all optional.
#[derive(TypedBuilder, Default)]
pub struct Peripherals {
    #[builder(default, setter(strip_option))]
    pub switches: Option<Box<dyn SwitchInput>>,
    #[builder(default, setter(strip_option))]
    pub indicators: Option<Box<dyn IndicatorSink>>,
    #[builder(default, setter(strip_option))]
    pub debug: Option<Box<dyn DebugSink>>,
}
