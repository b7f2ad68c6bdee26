pub mod command;
pub mod options;

use std::cell::{Cell, RefCell};
use std::io::BufRead;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use sim8800_common::{DebugText, Lights};
use sim8800_core::{FrontPanel, PanelState, Peripherals};

use crate::command::HELP;

pub use command::Command;
pub use options::Options;

/// Echo the high switch byte to the data lights: IN FF ; OUT FF ; JMP 0000.
pub const DEMO_PROGRAM: &str = "db ff d3 ff c3 00 00";

/// Wall clock time one run loop tick stands for. Each tick executes a
/// millisecond of CPU time.
const TICK_INTERVAL: Duration = Duration::from_millis(1);

/// How long to sleep after a tick that took `elapsed`, so a tick spans one
/// `TICK_INTERVAL` of wall clock time. Zero once the host is behind.
fn pacing_delay(elapsed: Duration) -> Duration {
    TICK_INTERVAL.saturating_sub(elapsed)
}

/// Terminal front panel: the controller plus the shared handles the terminal
/// reads back to draw the switches, lights and monitors.
pub struct Terminal {
    panel: FrontPanel,
    switches: Rc<Cell<u16>>,
    lights: Rc<RefCell<Lights>>,
    debug: Rc<RefCell<DebugText>>,
}

impl Terminal {
    pub fn new(options: &Options) -> Result<Self> {
        let switches = Rc::new(Cell::new(0));
        let lights = Rc::new(RefCell::new(Lights::default()));
        let debug = Rc::new(RefCell::new(DebugText::default()));
        let peripherals = Peripherals::builder()
            .switches(Box::new(switches.clone()))
            .indicators(Box::new(lights.clone()))
            .debug(Box::new(debug.clone()))
            .build();
        let panel = FrontPanel::new(options.panel_config(), peripherals)?;
        Ok(Self {
            panel,
            switches,
            lights,
            debug,
        })
    }

    pub fn panel(&self) -> &FrontPanel {
        &self.panel
    }

    /// Apply one command and return the text to show for it.
    ///
    /// Returns `None` for [`Command::Quit`].
    pub fn handle(&mut self, command: Command) -> Option<String> {
        match command {
            Command::PowerOn => self.panel.power_on(),
            Command::PowerOff => self.panel.power_off(),
            Command::Run => self.panel.start(),
            Command::Stop => self.panel.stop(),
            Command::Step => self.panel.single_step(),
            Command::Reset => self.panel.reset(),
            Command::Switches(word) => self.switches.set(word),
            Command::Examine => self.panel.examine(),
            Command::ExamineNext => self.panel.examine_next(),
            Command::Deposit => self.panel.deposit(),
            Command::DepositNext => self.panel.deposit_next(),
            Command::Load(address, bytes) => {
                let written = self.panel.load_data_as_hex_string(address, &bytes);
                return Some(format!("{} bytes loaded\n{}", written, self.render()));
            }
            Command::Demo => {
                let written = self.panel.load_data_as_hex_string(0, DEMO_PROGRAM);
                return Some(format!("demo: {} bytes loaded at 0000\n{}", written, self.render()));
            }
            Command::Regs => return Some(self.debug.borrow().cpu.clone()),
            Command::Mem => return Some(self.debug.borrow().mem.clone()),
            Command::Lights => {}
            Command::Help => return Some(HELP.to_string()),
            Command::Quit => return None,
        }
        Some(self.render())
    }

    /// One line showing the panel, most significant bits first as on the
    /// real machine.
    pub fn render(&self) -> String {
        let lights = self.lights.borrow();
        let state = match self.panel.state() {
            PanelState::Off => "OFF ",
            PanelState::Idle => "STOP",
            PanelState::Running => "RUN ",
        };
        format!(
            "{} {} {} | A {} | D {} | SW {}",
            state,
            lamp("READY", lights.status),
            lamp("WAIT", lights.wait),
            lamp_row(&lights.address),
            lamp_row(&lights.data),
            switch_row(self.switches.get()),
        )
    }
}

fn lamp(name: &str, on: bool) -> String {
    format!("{}{}", name, if on { '*' } else { '.' })
}

/// Lamps are stored LSB first; draw them MSB first in groups of four.
fn lamp_row(bits: &[bool]) -> String {
    let mut row = String::new();
    for (i, on) in bits.iter().rev().enumerate() {
        if i > 0 && i % 4 == 0 {
            row.push(' ');
        }
        row.push(if *on { '*' } else { '.' });
    }
    row
}

fn switch_row(word: u16) -> String {
    let bits: [bool; 16] = sim8800_common::to_bits(word);
    lamp_row(&bits).replace('*', "1").replace('.', "0")
}

/// Forward stdin lines to the panel thread; the channel closes on EOF.
fn spawn_stdin_reader() -> Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}

pub fn run(options: Options) -> Result<()> {
    let mut terminal = Terminal::new(&options)?;

    if let Some((address, path)) = &options.load {
        let image = std::fs::read(path)
            .with_context(|| format!("failed to read program image '{}'", path.display()))?;
        terminal.panel.power_on();
        let written = terminal.panel.load_data(*address, &image);
        log::info!(
            "Loaded {} of {} bytes from '{}' at {:04x}",
            written,
            image.len(),
            path.display(),
            address
        );
    }

    log::info!("Sim-8800 terminal front panel ready");
    println!("{}", HELP);
    println!("{}", terminal.render());

    let input = spawn_stdin_reader();
    loop {
        // Block on input while nothing is queued; poll while running.
        let line = if terminal.panel.pending_ticks() > 0 {
            match input.try_recv() {
                Ok(line) => Some(line),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match input.recv() {
                Ok(line) => Some(line),
                Err(_) => break,
            }
        };

        if let Some(line) = line.filter(|l| !l.trim().is_empty()) {
            match line.parse::<Command>() {
                Ok(command) => match terminal.handle(command) {
                    Some(text) => println!("{}", text),
                    None => break,
                },
                Err(err) => eprintln!("{:#}", err),
            }
        }

        let started = Instant::now();
        if terminal.panel.tick() {
            let delay = pacing_delay(started.elapsed());
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }

    terminal.panel.power_off();
    log::info!("Sim-8800 exit");
    Ok(())
}
