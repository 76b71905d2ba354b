use crate::constants::{MEMORY_SIZE, PROGRAM_START, RESERVED_END, STACK_DEPTH, TIMER_HZ};
use crate::error::{Result, VmError};
use crate::keyboard::Keyboard;

/// Knobs for one machine. The CPU reads these at construction and never changes them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Bytes of memory, including the sprite sheets.
    pub memory_size: usize,
    /// Return addresses the call stack can hold.
    pub stack_depth: usize,
    /// Address execution starts at.
    pub entry: u16,
    /// Address ROMs are loaded at.
    pub load_address: u16,
    pub delay_hz: u32,
    pub sound_hz: u32,
    /// Spins before each fetch, to slow the CPU down.
    pub fetch_delay: u32,
    /// Spins before each key peek.
    pub peek_delay: u32,
    /// Log every executed instruction at trace level.
    pub trace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            memory_size: MEMORY_SIZE,
            stack_depth: STACK_DEPTH,
            entry: PROGRAM_START,
            load_address: PROGRAM_START,
            delay_hz: TIMER_HZ,
            sound_hz: TIMER_HZ,
            fetch_delay: 0,
            peek_delay: 0,
            trace: false,
        }
    }
}

impl Config {
    /// A keyboard scanning keys as slowly as `peek_delay` asks.
    pub fn keyboard(&self) -> Keyboard {
        Keyboard::with_peek_delay(self.peek_delay)
    }

    pub fn validate(&self) -> Result<()> {
        // the sprite sheets plus at least one instruction
        if self.memory_size < RESERVED_END as usize + 2 {
            return Err(VmError::InvalidConfig(format!(
                "memory size {} is smaller than {} bytes",
                self.memory_size,
                RESERVED_END + 2
            )));
        }
        // I and PC are 16 bits wide
        if self.memory_size > 0x10000 {
            return Err(VmError::InvalidConfig(format!(
                "memory size {} is larger than the 16 bit address space",
                self.memory_size
            )));
        }
        if self.stack_depth == 0 {
            return Err(VmError::InvalidConfig("stack depth must be at least 1".into()));
        }
        if self.delay_hz == 0 || self.sound_hz == 0 {
            return Err(VmError::InvalidConfig(
                "timer frequencies must be above 0Hz".into(),
            ));
        }
        Ok(())
    }
}
