use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Error};

/// One line typed at the terminal front panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    PowerOn,
    PowerOff,
    Run,
    Stop,
    Step,
    Reset,
    /// Set all 16 toggle switches at once.
    Switches(u16),
    Examine,
    ExamineNext,
    Deposit,
    DepositNext,
    /// Hex bytes to load at an address, kept as text for the panel's loader.
    Load(u16, String),
    Demo,
    Regs,
    Mem,
    Lights,
    Help,
    Quit,
}

pub const HELP: &str = "\
Front panel commands:
  on | off          power switch
  run | stop        RUN / STOP
  step              SINGLE STEP
  reset             RESET
  sw <hex>          set the 16 address/data switches, e.g. sw 00c3
  ex | exn          EXAMINE / EXAMINE NEXT
  dep | depn        DEPOSIT / DEPOSIT NEXT
  load <addr> <hex bytes...>
                    load bytes, e.g. load 0000 db ff d3 ff c3 00 00
  demo              load a program echoing switches A8-A15 to the data lights
  regs | mem        show the CPU and memory monitors
  lights            redraw the panel lights
  help | quit";

fn parse_hex_u16(text: &str) -> anyhow::Result<u16> {
    let digits = text.trim_start_matches("0x");
    u16::from_str_radix(digits, 16).with_context(|| format!("'{}' is not a 16-bit hex value", text))
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let command = match name.to_ascii_lowercase().as_str() {
            "on" => Command::PowerOn,
            "off" => Command::PowerOff,
            "run" => Command::Run,
            "stop" => Command::Stop,
            "step" => Command::Step,
            "reset" => Command::Reset,
            "sw" | "switches" => {
                let value = words
                    .next()
                    .ok_or_else(|| anyhow!("usage: sw <hex>"))?;
                Command::Switches(parse_hex_u16(value)?)
            }
            "ex" | "examine" => Command::Examine,
            "exn" => Command::ExamineNext,
            "dep" | "deposit" => Command::Deposit,
            "depn" => Command::DepositNext,
            "load" => {
                let address = words
                    .next()
                    .ok_or_else(|| anyhow!("usage: load <addr> <hex bytes...>"))?;
                let address = parse_hex_u16(address)?;
                Command::Load(address, words.collect::<Vec<_>>().join(" "))
            }
            "demo" => Command::Demo,
            "regs" => Command::Regs,
            "mem" => Command::Mem,
            "lights" => Command::Lights,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{}', try 'help'", other),
        };
        Ok(command)
    }
}
