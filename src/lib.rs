//! A CHIP-8 / Super-CHIP virtual machine.
//!
//! The `Cpu` runs a program against three peripherals supplied by the host: a `Display`, the
//! shared `Keyboard` and an `Audio` sink. The delay and sound `Timers` run on their own threads
//! for as long as `Cpu::run` does.

pub use audio::{Audio, Mute};
pub use config::Config;
pub use cpu::{Cpu, Tracer};
pub use display::{Bitmap, Display};
pub use error::{Result, VmError};
pub use instruction::Instruction;
pub use keyboard::{Keyboard, KEYPAD};
pub use memory::Memory;
pub use state::{Stack, State};
pub use timer::{Callback, Timer, Timers};

pub mod constants;

mod audio;
mod config;
mod cpu;
mod display;
mod error;
mod instruction;
mod keyboard;
mod memory;
mod opcode;
mod state;
mod timer;
