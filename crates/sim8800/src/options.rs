use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use sim8800_core::config::{DEFAULT_CLOCK_RATE_HZ, DEFAULT_MEMORY_SIZE};
use sim8800_core::{FillMode, PanelConfig};

/// Command line options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub memory_size: usize,
    pub clock_rate_hz: u32,
    pub fill: FillMode,
    /// Binary image to load (at the given address) right after power-on.
    pub load: Option<(u16, PathBuf)>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            clock_rate_hz: DEFAULT_CLOCK_RATE_HZ,
            fill: FillMode::Zero,
            load: None,
        }
    }
}

pub const USAGE: &str =
    "usage: sim8800 [--mem <bytes>] [--clock <hz>] [--random] [--load <hex-addr> <file>]";

impl Options {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Options::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |name: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{} needs a value\n{}", name, USAGE))
            };
            match arg.as_str() {
                "--mem" => {
                    let text = value("--mem")?;
                    options.memory_size = text
                        .parse()
                        .with_context(|| format!("invalid memory size '{}'", text))?;
                }
                "--clock" => {
                    let text = value("--clock")?;
                    options.clock_rate_hz = text
                        .parse()
                        .with_context(|| format!("invalid clock rate '{}'", text))?;
                }
                "--random" => options.fill = FillMode::Random,
                "--load" => {
                    let address = value("--load")?;
                    let address = u16::from_str_radix(address.trim_start_matches("0x"), 16)
                        .with_context(|| format!("invalid load address '{}'", address))?;
                    let path = value("--load")?;
                    options.load = Some((address, PathBuf::from(path)));
                }
                other => bail!("unknown option '{}'\n{}", other, USAGE),
            }
        }
        Ok(options)
    }

    pub fn panel_config(&self) -> PanelConfig {
        PanelConfig::builder()
            .memory_size(self.memory_size)
            .clock_rate_hz(self.clock_rate_hz)
            .fill(self.fill)
            .build()
    }
}
