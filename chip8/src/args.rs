use std::num::ParseIntError;
use std::path::PathBuf;

use clap::Parser;

use chipvm::constants::{PROGRAM_START, STACK_DEPTH, TIMER_HZ};
use chipvm::Config;

/// Runs a CHIP-8 or Super-CHIP ROM.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// ROM file to run
    pub rom: PathBuf,

    /// Log every executed instruction (needs RUST_LOG=trace)
    #[arg(short, long)]
    pub trace: bool,

    /// Delay timer frequency
    #[arg(long, default_value_t = TIMER_HZ)]
    pub delay_hz: u32,

    /// Sound timer frequency
    #[arg(long, default_value_t = TIMER_HZ)]
    pub sound_hz: u32,

    /// Spins before each instruction fetch; higher is slower
    #[arg(long, default_value_t = 5000)]
    pub fetch_delay: u32,

    /// Spins before each key check
    #[arg(long, default_value_t = 0)]
    pub peek_delay: u32,

    /// Return addresses the call stack holds
    #[arg(long, default_value_t = STACK_DEPTH)]
    pub stack: usize,

    /// Address execution starts at, decimal or 0x prefixed hex
    #[arg(long, value_parser = parse_address, default_value_t = PROGRAM_START)]
    pub entry: u16,

    /// Address the ROM is loaded at, decimal or 0x prefixed hex
    #[arg(long, value_parser = parse_address, default_value_t = PROGRAM_START)]
    pub load: u16,
}

impl Args {
    pub fn config(&self) -> Config {
        Config {
            stack_depth: self.stack,
            entry: self.entry,
            load_address: self.load,
            delay_hz: self.delay_hz,
            sound_hz: self.sound_hz,
            fetch_delay: self.fetch_delay,
            peek_delay: self.peek_delay,
            trace: self.trace,
            ..Config::default()
        }
    }
}

fn parse_address(arg: &str) -> Result<u16, ParseIntError> {
    match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => arg.parse(),
    }
}
