use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sim8800_common::{from_bits, DebugText, IndicatorSink, Lights};

use super::{FrontPanel, PanelState};
use crate::config::{PanelConfig, Peripherals};
use crate::engine::{Bus8080, CpuStatus, Engine};
use crate::memory::FillMode;

/// One call made on the indicator sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Signal {
    Address(u16),
    Data(u8),
    Wait(bool),
    Status(bool),
}

/// Indicator sink that latches the lights and keeps every call in order.
#[derive(Default)]
struct Recorder {
    lights: Lights,
    signals: Vec<Signal>,
}

impl IndicatorSink for Recorder {
    fn set_address_indicators(&mut self, bits: [bool; 16]) {
        self.lights.set_address_indicators(bits);
        self.signals.push(Signal::Address(from_bits(&bits)));
    }

    fn set_data_indicators(&mut self, bits: [bool; 8]) {
        self.lights.set_data_indicators(bits);
        self.signals.push(Signal::Data(from_bits(&bits) as u8));
    }

    fn set_wait_indicator(&mut self, on: bool) {
        self.lights.set_wait_indicator(on);
        self.signals.push(Signal::Wait(on));
    }

    fn set_status_indicators(&mut self, ready: bool) {
        self.lights.set_status_indicators(ready);
        self.signals.push(Signal::Status(ready));
    }
}

struct Fixture<E: Engine> {
    panel: FrontPanel<E>,
    switches: Rc<Cell<u16>>,
    recorder: Rc<RefCell<Recorder>>,
    debug: Rc<RefCell<DebugText>>,
}

impl<E: Engine> Fixture<E> {
    fn lights(&self) -> Lights {
        self.recorder.borrow().lights
    }

    fn take_signals(&self) -> Vec<Signal> {
        std::mem::take(&mut self.recorder.borrow_mut().signals)
    }
}

fn peripherals() -> (
    Peripherals,
    Rc<Cell<u16>>,
    Rc<RefCell<Recorder>>,
    Rc<RefCell<DebugText>>,
) {
    let switches = Rc::new(Cell::new(0));
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let debug = Rc::new(RefCell::new(DebugText::default()));
    let peripherals = Peripherals::builder()
        .switches(Box::new(switches.clone()))
        .indicators(Box::new(recorder.clone()))
        .debug(Box::new(debug.clone()))
        .build();
    (peripherals, switches, recorder, debug)
}

fn fixture(config: PanelConfig) -> Fixture<crate::Cpu8080> {
    let (peripherals, switches, recorder, debug) = peripherals();
    Fixture {
        panel: FrontPanel::new(config, peripherals).unwrap(),
        switches,
        recorder,
        debug,
    }
}

fn small_machine(memory_size: usize) -> Fixture<crate::Cpu8080> {
    fixture(PanelConfig::builder().memory_size(memory_size).build())
}

/// Engine that records what the panel asks of it and writes a marker byte
/// at its fake program counter on every step.
#[derive(Default)]
struct CountingEngine {
    resets: usize,
    requests: Vec<u32>,
    pc: u16,
}

impl Engine for CountingEngine {
    fn reset(&mut self) {
        self.resets += 1;
        self.pc = 0;
    }

    fn step<B: Bus8080>(&mut self, bus: &mut B, cycles: u32) -> u32 {
        self.requests.push(cycles);
        bus.mem_write(self.pc, 0xee);
        self.pc = self.pc.wrapping_add(1);
        cycles
    }

    fn status(&self) -> CpuStatus {
        CpuStatus {
            pc: self.pc,
            ..CpuStatus::default()
        }
    }
}

#[test]
fn rejects_empty_memory() {
    let config = PanelConfig::builder().memory_size(0).build();
    assert!(FrontPanel::new(config, Peripherals::default()).is_err());
}

#[test]
fn starts_powered_off_and_dark() {
    let fx = small_machine(8);
    assert_eq!(fx.panel.state(), PanelState::Off);
    assert!(fx.lights().is_dark());
    assert_eq!(fx.panel.pending_ticks(), 0);
}

#[test]
fn power_on_reports_ready_and_waiting() {
    let mut fx = small_machine(8);
    fx.panel.power_on();

    assert_eq!(fx.panel.state(), PanelState::Idle);
    assert_eq!(fx.take_signals(), [Signal::Status(true), Signal::Wait(true)]);
    assert!(fx.debug.borrow().cpu.starts_with("PC = 0000"));
    assert!(fx.debug.borrow().mem.starts_with("0000  00"));
}

#[test]
fn machine_state_follows_the_power_and_run_switches() {
    let mut fx = small_machine(8);

    let check = |panel: &FrontPanel, expected: PanelState| {
        let machine = panel.machine();
        assert_eq!(panel.state(), expected);
        assert!(!machine.running || machine.powered_on);
        assert_eq!(panel.is_powered_on(), expected != PanelState::Off);
        assert_eq!(panel.is_running(), expected == PanelState::Running);
        assert_eq!(machine.powered_on, panel.is_powered_on());
        assert_eq!(machine.running, panel.is_running());
        assert_eq!(machine.last_address, panel.last_address());
        assert_eq!(machine.clock_rate_hz, panel.clock_rate_hz());
    };

    check(&fx.panel, PanelState::Off);
    assert_eq!(fx.panel.clock_rate_hz(), 2_000_000);

    fx.panel.power_on();
    check(&fx.panel, PanelState::Idle);

    fx.switches.set(0x0004);
    fx.panel.examine();
    assert_eq!(fx.panel.machine().last_address, 4);

    fx.panel.start();
    check(&fx.panel, PanelState::Running);

    fx.panel.set_clock_rate_hz(4_000);
    assert_eq!(fx.panel.clock_rate_hz(), 4_000);
    assert_eq!(fx.panel.machine().clock_rate_hz, 4_000);
    check(&fx.panel, PanelState::Running);

    fx.panel.stop();
    check(&fx.panel, PanelState::Idle);

    fx.panel.start();
    fx.panel.power_off();
    check(&fx.panel, PanelState::Off);
    assert!(!fx.panel.machine().running);
}

#[test]
fn deposit_next_advances_the_cursor() {
    let mut fx = small_machine(8);
    fx.panel.power_on();

    fx.switches.set(0x0000);
    fx.panel.examine();
    fx.switches.set(0x0005);
    fx.panel.deposit();
    fx.switches.set(0x0006);
    fx.panel.deposit_next();

    assert_eq!(fx.panel.last_address(), 1);
    assert_eq!(fx.panel.memory()[0], 0x05);
    assert_eq!(fx.panel.memory()[1], 0x06);
    assert_eq!(fx.lights().address_word(), 0x0001);
    assert_eq!(fx.lights().data_byte(), 0x06);
}

#[test]
fn deposit_uses_only_the_low_switch_byte() {
    let mut fx = small_machine(8);
    fx.panel.power_on();

    fx.switches.set(0x0003);
    fx.panel.examine();
    fx.switches.set(0xab_cd);
    fx.panel.deposit();

    assert_eq!(fx.panel.last_address(), 3);
    assert_eq!(fx.panel.memory()[3], 0xcd);
}

#[test]
fn examine_shows_address_and_byte() {
    let mut fx = small_machine(256);
    fx.panel.power_on();
    fx.panel.load_data(0x10, &[0x3e, 0x42]);

    fx.switches.set(0x0010);
    fx.panel.examine();
    assert_eq!(fx.lights().address_word(), 0x0010);
    assert_eq!(fx.lights().data_byte(), 0x3e);

    fx.panel.examine_next();
    assert_eq!(fx.panel.last_address(), 0x0011);
    assert_eq!(fx.lights().address_word(), 0x0011);
    assert_eq!(fx.lights().data_byte(), 0x42);
}

#[test]
fn cursor_wraps_at_the_top_of_the_address_space() {
    let mut fx = small_machine(8);
    fx.panel.power_on();
    fx.panel.load_data(0, &[0, 1, 2, 3, 4, 5, 6, 7]);

    fx.switches.set(0xffff);
    fx.panel.examine();
    assert_eq!(fx.panel.last_address(), 0xffff);
    // 0xffff mod 8 == 7
    assert_eq!(fx.lights().data_byte(), 7);

    fx.panel.examine_next();
    assert_eq!(fx.panel.last_address(), 0);
    assert_eq!(fx.lights().data_byte(), 0);

    fx.switches.set(0xffff);
    fx.panel.examine();
    fx.switches.set(0x0099);
    fx.panel.deposit_next();
    assert_eq!(fx.panel.last_address(), 0);
    assert_eq!(fx.panel.memory()[0], 0x99);
}

#[test]
fn examine_and_deposit_refresh_the_monitors() {
    let mut fx = small_machine(32);
    fx.panel.power_on();
    fx.debug.borrow_mut().mem.clear();
    fx.debug.borrow_mut().cpu.clear();

    fx.switches.set(0x0011);
    fx.panel.examine();
    fx.switches.set(0x00c3);
    fx.panel.deposit();

    let debug = fx.debug.borrow();
    assert_eq!(
        debug.mem.lines().nth(1),
        Some("0010  00 c3 00 00 00 00 00 00  00 00 00 00 00 00 00 00")
    );
    assert!(debug.cpu.contains("SP = 0000"));
}

#[test]
fn hex_string_loads_bytes() {
    let mut fx = small_machine(8);
    fx.panel.power_on();

    assert_eq!(fx.panel.load_data_as_hex_string(0, "c3 00 00"), 3);
    assert_eq!(&fx.panel.memory()[..3], &[0xc3, 0x00, 0x00]);
}

// Decision: an invalid token still consumes its slot, so later bytes keep
// their position relative to the start address.
#[test]
fn hex_string_skips_bad_tokens_but_keeps_slots() {
    let mut fx = small_machine(8);
    fx.panel.power_on();
    fx.panel.load_data(0, &[0x77]);

    assert_eq!(fx.panel.load_data_as_hex_string(0, "zz 05"), 1);
    assert_eq!(fx.panel.memory()[0], 0x77);
    assert_eq!(fx.panel.memory()[1], 0x05);

    assert_eq!(fx.panel.load_data_as_hex_string(2, "100 -1 0a\t\n0B"), 2);
    assert_eq!(&fx.panel.memory()[2..8], &[0, 0, 0x0a, 0x0b, 0, 0]);
}

#[test]
fn loads_stop_at_the_end_of_memory() {
    let mut fx = small_machine(4);
    fx.panel.power_on();

    assert_eq!(fx.panel.load_data_as_hex_string(2, "01 02 03 04"), 2);
    assert_eq!(fx.panel.memory(), &[0, 0, 1, 2]);

    assert_eq!(fx.panel.load_data(3, &[9, 9, 9]), 1);
    assert_eq!(fx.panel.memory(), &[0, 0, 1, 9]);
    assert_eq!(fx.panel.load_data(4, &[9]), 0);
}

#[test]
fn loads_need_power() {
    let mut fx = small_machine(8);
    assert_eq!(fx.panel.load_data(0, &[1, 2, 3]), 0);
    assert_eq!(fx.panel.load_data_as_hex_string(0, "01 02"), 0);
    assert!(fx.panel.memory().iter().all(|&b| b == 0));
}

#[test]
fn switches_are_ignored_without_power() {
    let mut fx = small_machine(8);
    fx.switches.set(0x0012);

    fx.panel.examine();
    fx.panel.examine_next();
    fx.panel.deposit();
    fx.panel.deposit_next();
    fx.panel.start();
    fx.panel.stop();
    fx.panel.single_step();
    fx.panel.reset();

    assert_eq!(fx.panel.state(), PanelState::Off);
    assert_eq!(fx.panel.last_address(), 0);
    assert_eq!(fx.panel.pending_ticks(), 0);
    assert!(fx.panel.memory().iter().all(|&b| b == 0));
    assert!(fx.take_signals().is_empty());
    assert_eq!(*fx.debug.borrow(), DebugText::default());
}

#[test]
fn reset_while_off_changes_nothing() {
    let mut fx = small_machine(8);
    fx.panel.power_on();
    fx.panel.load_data(0, &[1, 2, 3, 4]);
    fx.switches.set(0x0003);
    fx.panel.examine();
    fx.panel.power_off();

    let memory = fx.panel.memory().to_vec();
    let last_address = fx.panel.last_address();
    let lights = fx.lights();
    let debug = fx.debug.borrow().clone();
    fx.take_signals();

    fx.panel.reset();

    assert_eq!(fx.panel.memory(), memory.as_slice());
    assert_eq!(fx.panel.last_address(), last_address);
    assert_eq!(fx.lights(), lights);
    assert!(fx.take_signals().is_empty());
    assert_eq!(*fx.debug.borrow(), debug);
}

#[test]
fn reset_keeps_memory_and_flashes_the_lights() {
    let mut fx = small_machine(8);
    fx.panel.power_on();
    fx.panel.load_data(0, &[0x00, 0x00, 0x3c]);
    fx.panel.single_step();
    fx.switches.set(0x0002);
    fx.panel.examine();
    fx.take_signals();
    *fx.debug.borrow_mut() = DebugText::default();

    fx.panel.reset();

    assert_eq!(
        fx.take_signals(),
        [
            Signal::Address(0xffff),
            Signal::Data(0xff),
            Signal::Address(0x0000),
            Signal::Data(0x00),
            Signal::Wait(true),
        ]
    );
    assert_eq!(fx.panel.memory()[2], 0x3c);
    assert_eq!(fx.panel.last_address(), 0);
    assert_eq!(fx.panel.cpu_status().pc, 0);
    assert_eq!(fx.panel.state(), PanelState::Idle);
    assert!(fx.debug.borrow().cpu.starts_with("PC = 0000"));
    assert!(fx.debug.borrow().mem.starts_with("0000  00 00 3c"));
}

#[test]
fn reset_stops_a_running_machine() {
    let mut fx = small_machine(8);
    fx.panel.power_on();
    fx.panel.start();
    assert!(fx.panel.tick());

    fx.panel.reset();
    assert_eq!(fx.panel.state(), PanelState::Idle);
    assert!(!fx.panel.tick());
    assert_eq!(fx.panel.pending_ticks(), 0);
}

#[test]
fn power_off_blanks_everything_while_running() {
    let mut fx = small_machine(16);
    fx.panel.power_on();
    fx.switches.set(0x0005);
    fx.panel.examine();
    fx.panel.start();
    assert!(fx.panel.tick());

    fx.panel.power_off();

    assert_eq!(fx.panel.state(), PanelState::Off);
    assert!(fx.lights().is_dark());
    assert_eq!(*fx.debug.borrow(), DebugText::default());
    assert!(!fx.panel.tick());
}

#[test]
fn power_off_blanks_everything_from_any_state() {
    let mut fx = small_machine(16);
    fx.panel.power_off();
    assert!(fx.lights().is_dark());

    fx.panel.power_on();
    fx.panel.power_off();
    assert!(fx.lights().is_dark());
    assert!(fx.debug.borrow().cpu.is_empty());
    assert!(fx.debug.borrow().mem.is_empty());
}

#[test]
fn power_cycle_clears_memory() {
    let mut fx = small_machine(8);
    fx.panel.power_on();
    fx.panel.load_data(0, &[1, 2, 3]);
    fx.switches.set(0x0002);
    fx.panel.examine();

    fx.panel.power_off();
    fx.panel.power_on();

    assert!(fx.panel.memory().iter().all(|&b| b == 0));
    assert_eq!(fx.panel.last_address(), 0);
}

#[test]
fn power_on_twice_keeps_memory() {
    let mut fx = small_machine(8);
    fx.panel.power_on();
    fx.panel.load_data(0, &[1, 2, 3]);
    fx.panel.power_on();
    assert_eq!(&fx.panel.memory()[..3], &[1, 2, 3]);
}

#[test]
fn random_fill_on_power_on() {
    let mut fx = fixture(
        PanelConfig::builder()
            .memory_size(4096)
            .fill(FillMode::Random)
            .build(),
    );
    fx.panel.power_on();
    assert!(fx.panel.memory().iter().any(|&b| b != 0));
}

#[test]
fn start_clears_wait_and_queues_one_tick() {
    let mut fx = small_machine(8);
    fx.panel.power_on();
    fx.take_signals();

    fx.panel.start();
    fx.panel.start();

    assert_eq!(fx.panel.state(), PanelState::Running);
    assert_eq!(fx.panel.pending_ticks(), 1);
    assert_eq!(fx.take_signals(), [Signal::Wait(false)]);
}

#[test]
fn stop_twice_never_leaves_more_than_one_tick() {
    let mut fx = small_machine(8);
    fx.panel.power_on();
    fx.panel.start();

    fx.panel.stop();
    fx.panel.stop();
    assert_eq!(fx.panel.pending_ticks(), 1);
    assert!(fx.lights().wait);

    // The queued tick is consumed without doing any work.
    assert!(!fx.panel.tick());
    assert_eq!(fx.panel.pending_ticks(), 0);
    assert_eq!(fx.panel.ticks_run(), 0);
}

#[test]
fn ticks_reschedule_until_stopped() {
    let mut fx = small_machine(8);
    fx.panel.power_on();
    fx.panel.start();

    for _ in 0..3 {
        assert!(fx.panel.tick());
        assert_eq!(fx.panel.pending_ticks(), 1);
    }
    fx.panel.stop();
    assert!(!fx.panel.tick());
    assert!(!fx.panel.tick());
    assert_eq!(fx.panel.ticks_run(), 3);
    assert_eq!(fx.panel.state(), PanelState::Idle);
}

#[test]
fn tick_without_start_does_nothing() {
    let mut fx = small_machine(8);
    fx.panel.power_on();
    assert!(!fx.panel.tick());
    assert_eq!(fx.panel.cpu_status().pc, 0);
}

#[test]
fn running_program_echoes_sense_switches() {
    // One instruction per tick at 1 kHz.
    let mut fx = fixture(
        PanelConfig::builder()
            .memory_size(256)
            .clock_rate_hz(1_000)
            .build(),
    );
    fx.panel.power_on();
    // IN FF ; OUT FF ; JMP 0000
    fx.panel.load_data_as_hex_string(0, "db ff d3 ff c3 00 00");
    fx.switches.set(0xa5_00);

    fx.panel.start();
    assert!(fx.panel.tick());
    assert_eq!(fx.panel.cpu_status().a, 0xa5);
    assert!(fx.debug.borrow().cpu.starts_with("PC = 0002"));
    assert!(fx.debug.borrow().cpu.contains("A = a5"));
    assert!(fx.panel.tick());
    assert!(fx.debug.borrow().cpu.starts_with("PC = 0004"));

    assert_eq!(fx.lights().data_byte(), 0xa5);
    assert_eq!(fx.lights().address_word(), 0x0004);
    assert!(!fx.lights().wait);

    assert!(fx.panel.tick());
    assert_eq!(fx.panel.cpu_status().pc, 0x0000);
}

#[test]
fn single_step_executes_one_instruction() {
    let mut fx = small_machine(16);
    fx.panel.power_on();
    // MVI A,42 ; HLT
    fx.panel.load_data(0, &[0x3e, 0x42, 0x76]);

    fx.panel.single_step();
    assert_eq!(fx.panel.cpu_status().a, 0x42);
    assert_eq!(fx.panel.cpu_status().pc, 2);
    assert_eq!(fx.lights().address_word(), 2);
    assert!(fx.debug.borrow().cpu.starts_with("PC = 0002"));

    fx.panel.single_step();
    assert!(fx.panel.engine().halted);
}

#[test]
fn single_step_is_ignored_while_running() {
    let mut fx = small_machine(16);
    fx.panel.power_on();
    fx.panel.start();
    fx.panel.single_step();
    assert_eq!(fx.panel.cpu_status().pc, 0);
}

#[test]
fn clock_rate_sets_the_slice_size() {
    let (peripherals, _, _, _) = peripherals();
    let config = PanelConfig::builder().memory_size(16).build();
    let mut panel = FrontPanel::with_engine(config, peripherals, CountingEngine::default()).unwrap();

    panel.power_on();
    assert_eq!(panel.engine().resets, 1);

    panel.start();
    assert!(panel.tick());
    panel.set_clock_rate_hz(500_000);
    assert!(panel.tick());
    panel.stop();
    panel.single_step();

    assert_eq!(panel.engine().requests, [2_000, 500, 1]);
    assert_eq!(&panel.memory()[..3], &[0xee, 0xee, 0xee]);

    panel.reset();
    assert_eq!(panel.engine().resets, 2);
}

#[test]
fn works_without_any_collaborators() {
    let config = PanelConfig::builder().memory_size(8).build();
    let mut panel = FrontPanel::new(config, Peripherals::default()).unwrap();

    panel.power_on();
    panel.examine();
    panel.deposit_next();
    panel.start();
    assert!(panel.tick());
    panel.stop();
    panel.reset();
    panel.power_off();

    assert_eq!(panel.state(), PanelState::Off);
    assert_eq!(panel.last_address(), 0);
}
