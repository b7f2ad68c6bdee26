pub mod bus;
pub mod config;
pub mod cpu;
pub mod dump;
pub mod engine;
pub mod memory;
pub mod panel;
pub mod scheduler;

pub use bus::{PanelBus, SENSE_PORT};
pub use config::{PanelConfig, Peripherals};
pub use cpu::Cpu8080;
pub use engine::{Bus8080, CpuStatus, Engine, StatusFlags};
pub use memory::{FillMode, Memory};
pub use panel::{FrontPanel, MachineState, PanelState};
pub use scheduler::Scheduler;
