use std::fmt::Write;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::audio::Audio;
use crate::config::Config;
use crate::constants::{
    EXTENDED_SPRITE_ROWS, LARGE_SPRITE_BYTES, LARGE_SPRITE_SHEET_ADDR, SPRITE_BYTES,
    SPRITE_SHEET_ADDR,
};
use crate::display::Display;
use crate::error::Result;
use crate::instruction::Instruction;
use crate::keyboard::Keyboard;
use crate::memory::Memory;
use crate::state::State;
use crate::timer::Timers;

/// Receives `(pc, opcode, mnemonic)` after each instruction executes.
pub type Tracer = Box<dyn FnMut(u16, u16, Option<&str>) + Send>;

/// # Chip-8 CPU
///
/// Owns the registers, the stack and memory, and borrows the machine's peripherals:
/// - a `Display` to draw sprites on
/// - the `Keyboard`, shared with whoever produces key presses
/// - an `Audio` sink the sound timer beeps through
///
/// `run` is the whole life of a program: it starts the delay and sound timers, executes
/// instructions until the keyboard's shutdown key is pressed, then stops the timers again.
pub struct Cpu<D: Display> {
    state: State,
    memory: Memory,
    display: D,
    keyboard: Arc<Keyboard>,
    audio: Arc<dyn Audio>,
    config: Config,
    tracer: Option<Tracer>,
}

impl<D: Display> Cpu<D> {
    pub fn new(
        config: Config,
        display: D,
        keyboard: Arc<Keyboard>,
        audio: Arc<dyn Audio>,
    ) -> Result<Self> {
        config.validate()?;
        let memory = Memory::new(config.memory_size)?;
        let tracer: Option<Tracer> = if config.trace {
            Some(Box::new(log_trace))
        } else {
            None
        };

        Ok(Cpu {
            state: State::new(config.entry, config.stack_depth),
            memory,
            display,
            keyboard,
            audio,
            config,
            tracer,
        })
    }

    /// Copy a ROM into memory at `address`.
    pub fn load(&mut self, address: u16, rom: &[u8]) -> Result<()> {
        self.memory.load(address, rom)?;
        debug!("loaded {} bytes at {:#05x}", rom.len(), address);
        Ok(())
    }

    /// Install a callback that sees every executed instruction.
    pub fn set_tracer<F>(&mut self, tracer: F)
    where
        F: FnMut(u16, u16, Option<&str>) + Send + 'static,
    {
        self.tracer = Some(Box::new(tracer));
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Execute from `entry` until shutdown.
    ///
    /// The timers only run for the duration of this call and are stopped on every way out of
    /// it, including errors.
    pub fn run(&mut self, entry: u16) -> Result<()> {
        let audio = Arc::clone(&self.audio);
        let timers = Timers::start(
            self.config.delay_hz,
            self.config.sound_hz,
            Box::new(move || audio.effect()),
        )?;

        self.state.pc = entry;
        self.audio.boot();
        debug!("running from {:#05x}", entry);

        let result = self.power_loop(&timers);

        timers.stop();
        self.audio.shutdown();
        debug!("stopped at {:#05x}", self.state.pc);
        result
    }

    fn power_loop(&mut self, timers: &Timers) -> Result<()> {
        while self.power_on() {
            self.step(timers)?;
        }
        Ok(())
    }

    fn power_on(&self) -> bool {
        !self.keyboard.is_shutdown()
    }

    /// Fetch, decode, execute and trace a single instruction.
    pub fn step(&mut self, timers: &Timers) -> Result<()> {
        let (pc, op) = self.fetch()?;
        self.state.pc = self.wrap(pc as usize + 2);
        let instruction = Instruction::decode(op, pc)?;
        self.execute(instruction, timers)?;

        if let Some(tracer) = self.tracer.as_mut() {
            tracer(pc, op, instruction.mnemonic().as_deref());
        }
        Ok(())
    }

    /// Gets the opcode currently pointed at by the pc, along with the pc.
    fn fetch(&self) -> Result<(u16, u16)> {
        for _ in 0..self.config.fetch_delay {
            std::hint::spin_loop();
        }
        let pc = self.state.pc;
        Ok((pc, self.memory.read_word(pc)?))
    }

    fn execute(&mut self, instruction: Instruction, timers: &Timers) -> Result<()> {
        use Instruction::*;

        match instruction {
            Nop => {}
            Clear => self.display.clear(),
            Return => self.state.pc = self.state.stack.pop()?,
            ScrollDown(lines) => self.display.down(lines as usize),
            ScrollRight => self.display.right(),
            ScrollLeft => self.display.left(),
            Extend => self.display.extend(true),
            Shrink => self.display.extend(false),
            Jump(addr) => self.state.pc = self.wrap(addr as usize),
            Call(addr) => {
                self.state.stack.push(self.state.pc)?;
                self.state.pc = self.wrap(addr as usize);
            }
            SkipEq { x, kk } => self.skip_if(self.vx(x) == kk),
            SkipNe { x, kk } => self.skip_if(self.vx(x) != kk),
            SkipEqReg { x, y } => self.skip_if(self.vx(x) == self.vx(y)),
            SkipNeReg { x, y } => self.skip_if(self.vx(x) != self.vx(y)),
            Load { x, kk } => self.state.v[x as usize] = kk,
            Add { x, kk } => self.state.v[x as usize] = self.vx(x).wrapping_add(kk),
            Move { x, y } => self.state.v[x as usize] = self.vx(y),
            Or { x, y } => self.state.v[x as usize] |= self.state.v[y as usize],
            And { x, y } => self.state.v[x as usize] &= self.state.v[y as usize],
            Xor { x, y } => self.state.v[x as usize] ^= self.state.v[y as usize],
            AddReg { x, y } => {
                let (sum, carry) = self.vx(x).overflowing_add(self.vx(y));
                self.alu(x, sum, carry);
            }
            Sub { x, y } => {
                let (difference, borrow) = self.vx(x).overflowing_sub(self.vx(y));
                self.alu(x, difference, !borrow);
            }
            SubN { x, y } => {
                let (difference, borrow) = self.vx(y).overflowing_sub(self.vx(x));
                self.alu(x, difference, !borrow);
            }
            Shr { x } => {
                let value = self.vx(x);
                self.alu(x, value >> 1, value & 0x1 == 0x1);
            }
            Shl { x } => {
                let value = self.vx(x);
                self.alu(x, value << 1, value & 0x80 == 0x80);
            }
            LoadIndex(addr) => self.state.i = self.wrap(addr as usize),
            JumpIndexed(addr) => self.state.pc = self.wrap(self.vx(0x0) as usize + addr as usize),
            Random { x, kk } => self.state.v[x as usize] = rand::random::<u8>() & kk,
            Draw { x, y, n } => self.draw(x, y, n)?,
            SkipPressed(x) => self.skip_if(self.keyboard.peek(self.vx(x))),
            SkipNotPressed(x) => self.skip_if(!self.keyboard.peek(self.vx(x))),
            LoadDelay(x) => self.state.v[x as usize] = timers.delay.get(),
            WaitKey(x) => match self.keyboard.wait() {
                Some(key) => self.state.v[x as usize] = key,
                None => warn!("shutdown while waiting for a key in V{:X}", x),
            },
            SetDelay(x) => timers.delay.set(self.vx(x)),
            SetSound(x) => timers.sound.set(self.vx(x)),
            AddIndex(x) => self.state.i = self.wrap(self.state.i as usize + self.vx(x) as usize),
            Glyph(x) => {
                self.state.i = SPRITE_SHEET_ADDR + u16::from(self.vx(x) & 0xF) * SPRITE_BYTES
            }
            LargeGlyph(x) => {
                self.state.i =
                    LARGE_SPRITE_SHEET_ADDR + u16::from(self.vx(x) & 0xF) * LARGE_SPRITE_BYTES
            }
            Bcd(x) => {
                let value = self.vx(x);
                let bcd = [value / 100, value / 10 % 10, value % 10];
                self.memory
                    .get_rw_slice(self.state.i, 3)?
                    .copy_from_slice(&bcd);
            }
            Store(x) => {
                let count = x as usize + 1;
                self.memory
                    .get_rw_slice(self.state.i, count)?
                    .copy_from_slice(&self.state.v[..count]);
            }
            Read(x) => {
                let count = x as usize + 1;
                let bytes = self.memory.get_ro_slice(self.state.i, count)?;
                self.state.v[..count].copy_from_slice(bytes);
            }
            SaveFlags(x) => {
                let count = x as usize + 1;
                self.state.rpl[..count].copy_from_slice(&self.state.v[..count]);
            }
            LoadFlags(x) => {
                let count = x as usize + 1;
                self.state.v[..count].copy_from_slice(&self.state.rpl[..count]);
            }
        }
        Ok(())
    }

    fn vx(&self, x: u8) -> u8 {
        self.state.v[x as usize]
    }

    /// Result first, then the flag, so the flag wins when x is VF.
    fn alu(&mut self, x: u8, result: u8, flag: bool) {
        self.state.v[x as usize] = result;
        self.state.flag(flag);
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.state.pc = self.wrap(self.state.pc as usize + 2);
        }
    }

    /// Addresses held in I and PC wrap around the end of memory.
    fn wrap(&self, addr: usize) -> u16 {
        (addr % self.memory.len()) as u16
    }

    /// draw_sprite(x=Vx y=Vy size=n)
    /// XORs a sprite from memory at I onto the display at Vx, Vy, wrapping at the edges.
    /// Sets VF if any pixel was erased.
    ///
    /// In extended mode `n == 0` draws a 16x16 sprite stored as two bytes per row.
    fn draw(&mut self, x: u8, y: u8, n: u8) -> Result<()> {
        let (x, y) = (self.vx(x) as usize, self.vx(y) as usize);
        let (rows, row_bytes) = if self.display.extended() && n == 0 {
            (EXTENDED_SPRITE_ROWS, 2)
        } else {
            (n as usize, 1)
        };

        // Reset the carry flag (used for collision detection)
        self.state.flag(false);

        let sprite = self.memory.get_ro_slice(self.state.i, rows * row_bytes)?;
        let (width, height) = (self.display.width(), self.display.height());
        let mut collision = false;

        for (row, bytes) in sprite.chunks(row_bytes).enumerate() {
            let py = (y + row) % height;
            for (half, byte) in bytes.iter().enumerate() {
                for bit in 0..8 {
                    if (byte >> (7 - bit)) & 0x1 == 0 {
                        continue;
                    }
                    let px = (x + half * 8 + bit) % width;
                    let lit = self.display.get(px, py);
                    collision |= lit;
                    self.display.set(px, py, !lit);
                }
            }
        }

        self.state.flag(collision);
        Ok(())
    }

    /// Register dump, for post mortems.
    pub fn dump(&self) -> String {
        let op = self.memory.read_word(self.state.pc).unwrap_or_default();
        let mut dump = format!(
            "PC  [{:04x}] OP  [{:04x}] I   [{:04x}] SP  [{:04x}]",
            self.state.pc,
            op,
            self.state.i,
            self.state.stack.sp()
        );
        for (n, value) in self.state.v.iter().enumerate() {
            let separator = if n % 8 == 0 { '\n' } else { ' ' };
            let _ = write!(dump, "{}V{:X}  [{:02x}]", separator, n, value);
        }
        dump
    }
}

fn log_trace(pc: u16, op: u16, mnemonic: Option<&str>) {
    trace!("{:04x}    {:04x}: {}", pc, op, mnemonic.unwrap_or("???"));
}

#[cfg(test)]
mod test_cpu {
    use super::*;
    use crate::audio::Mute;
    use crate::constants::{LARGE_SPRITE_SHEET, SPRITE_SHEET};
    use crate::display::Bitmap;
    use crate::error::VmError;
    use std::sync::Mutex;

    fn cpu() -> Cpu<Bitmap> {
        Cpu::new(
            Config::default(),
            Bitmap::new(),
            Arc::new(Keyboard::new()),
            Arc::new(Mute),
        )
        .unwrap()
    }

    /// Timers slow enough that nothing counts down while a test runs.
    fn timers() -> Timers {
        Timers::start(1, 1, Box::new(|| {})).unwrap()
    }

    /// Places `op` at the pc and steps over it.
    fn exec(cpu: &mut Cpu<Bitmap>, op: u16) -> Result<()> {
        let timers = timers();
        let result = exec_with(cpu, op, &timers);
        timers.stop();
        result
    }

    fn exec_with(cpu: &mut Cpu<Bitmap>, op: u16, timers: &Timers) -> Result<()> {
        let pc = cpu.state.pc;
        cpu.memory.load(pc, &op.to_be_bytes()).unwrap();
        cpu.step(timers)
    }

    #[test]
    fn test_step_advances_pc() {
        let mut cpu = cpu();
        exec(&mut cpu, 0x00E0).unwrap();
        assert_eq!(cpu.state.pc, 0x202);
    }

    #[test]
    fn test_00e0_cls() {
        let mut cpu = cpu();
        cpu.display.set(0, 0, true);
        exec(&mut cpu, 0x00E0).unwrap();
        assert!(!cpu.display.get(0, 0));
    }

    #[test]
    fn test_0000_nop() {
        let mut cpu = cpu();
        let before = cpu.state.v;
        exec(&mut cpu, 0x0000).unwrap();
        assert_eq!(cpu.state.v, before);
        assert_eq!(cpu.state.pc, 0x202);
    }

    #[test]
    fn test_2nnn_call_and_00ee_ret() {
        let mut cpu = cpu();
        cpu.state.pc = 0x2A0;
        // the call returns to the instruction after it
        exec(&mut cpu, 0x2230).unwrap();
        assert_eq!(cpu.state.pc, 0x230);
        assert_eq!(cpu.state.stack.top(), Some(0x2A2));
        assert_eq!(cpu.state.stack.sp(), 1);
        exec(&mut cpu, 0x00EE).unwrap();
        assert_eq!(cpu.state.pc, 0x2A2);
        assert_eq!(cpu.state.stack.sp(), 0);
    }

    #[test]
    fn test_call_pushes_pc() {
        let mut cpu = cpu();
        cpu.state.pc = 0x2A0;
        cpu.execute(Instruction::Call(0x230), &timers()).unwrap();
        assert_eq!(cpu.state.pc, 0x230);
        assert_eq!(cpu.state.stack.top(), Some(0x2A0));
        assert_eq!(cpu.state.stack.sp(), 1);
        cpu.execute(Instruction::Return, &timers()).unwrap();
        assert_eq!(cpu.state.pc, 0x2A0);
        assert_eq!(cpu.state.stack.sp(), 0);
    }

    #[test]
    fn test_00ee_underflow() {
        let mut cpu = cpu();
        assert_eq!(exec(&mut cpu, 0x00EE), Err(VmError::StackUnderflow));
    }

    #[test]
    fn test_2nnn_overflow() {
        let mut cpu = cpu();
        // calls itself forever
        cpu.memory.load(0x200, &[0x22, 0x00]).unwrap();
        let timers = timers();
        for _ in 0..24 {
            cpu.step(&timers).unwrap();
        }
        assert_eq!(
            cpu.step(&timers),
            Err(VmError::StackOverflow { depth: 24 })
        );
        timers.stop();
    }

    #[test]
    fn test_1nnn_jp() {
        let mut cpu = cpu();
        exec(&mut cpu, 0x1ABC).unwrap();
        assert_eq!(cpu.state.pc, 0x0ABC);
    }

    #[test]
    fn test_3xkk_se_skips() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x11;
        exec(&mut cpu, 0x3111).unwrap();
        assert_eq!(cpu.state.pc, 0x0204);
    }

    #[test]
    fn test_3xkk_se_doesntskip() {
        let mut cpu = cpu();
        exec(&mut cpu, 0x3111).unwrap();
        assert_eq!(cpu.state.pc, 0x0202);
    }

    #[test]
    fn test_4xkk_sne_skips() {
        let mut cpu = cpu();
        exec(&mut cpu, 0x4111).unwrap();
        assert_eq!(cpu.state.pc, 0x0204);
    }

    #[test]
    fn test_4xkk_sne_doesntskip() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x11;
        exec(&mut cpu, 0x4111).unwrap();
        assert_eq!(cpu.state.pc, 0x0202);
    }

    #[test]
    fn test_5xy0_se_skips() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x11;
        cpu.state.v[0x2] = 0x11;
        exec(&mut cpu, 0x5120).unwrap();
        assert_eq!(cpu.state.pc, 0x0204);
    }

    #[test]
    fn test_5xy0_se_doesntskip() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x11;
        exec(&mut cpu, 0x5120).unwrap();
        assert_eq!(cpu.state.pc, 0x0202);
    }

    #[test]
    fn test_skipped_instruction_never_runs() {
        let mut cpu = cpu();
        // SE V0, 0; LD V1, 0xFF; LD V2, 0xAA
        cpu.memory
            .load(0x200, &[0x30, 0x00, 0x61, 0xFF, 0x62, 0xAA])
            .unwrap();
        let timers = timers();
        cpu.step(&timers).unwrap();
        cpu.step(&timers).unwrap();
        timers.stop();
        assert_eq!(cpu.state.v[0x1], 0x00);
        assert_eq!(cpu.state.v[0x2], 0xAA);
    }

    #[test]
    fn test_6xkk_ld() {
        let mut cpu = cpu();
        exec(&mut cpu, 0x6122).unwrap();
        assert_eq!(cpu.state.v[0x1], 0x22);
    }

    #[test]
    fn test_7xkk_add_wraps_without_flag() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0xFF;
        cpu.state.v[0xF] = 0x7;
        exec(&mut cpu, 0x7102).unwrap();
        assert_eq!(cpu.state.v[0x1], 0x01);
        assert_eq!(cpu.state.v[0xF], 0x7);
    }

    #[test]
    fn test_8xy0_ld() {
        let mut cpu = cpu();
        cpu.state.v[0x2] = 0x1;
        exec(&mut cpu, 0x8120).unwrap();
        assert_eq!(cpu.state.v[0x1], 0x1);
    }

    #[test]
    fn test_8xy1_or() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x6;
        cpu.state.v[0x2] = 0x3;
        exec(&mut cpu, 0x8121).unwrap();
        assert_eq!(cpu.state.v[0x1], 0x7);
    }

    #[test]
    fn test_8xy2_and() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x6;
        cpu.state.v[0x2] = 0x3;
        exec(&mut cpu, 0x8122).unwrap();
        assert_eq!(cpu.state.v[0x1], 0x2);
    }

    #[test]
    fn test_8xy3_xor() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x6;
        cpu.state.v[0x2] = 0x3;
        exec(&mut cpu, 0x8123).unwrap();
        assert_eq!(cpu.state.v[0x1], 0x5);
    }

    #[test]
    fn test_8xy4_add_for_all_operands() {
        let mut cpu = cpu();
        let timers = timers();
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                cpu.state.v[0x1] = a;
                cpu.state.v[0x2] = b;
                cpu.execute(Instruction::AddReg { x: 1, y: 2 }, &timers)
                    .unwrap();
                let sum = u16::from(a) + u16::from(b);
                assert_eq!(cpu.state.v[0x1], (sum % 256) as u8);
                assert_eq!(cpu.state.v[0xF], u8::from(sum > 255));
            }
        }
        timers.stop();
    }

    #[test]
    fn test_8xy5_sub_for_all_operands() {
        let mut cpu = cpu();
        let timers = timers();
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                cpu.state.v[0x1] = a;
                cpu.state.v[0x2] = b;
                cpu.execute(Instruction::Sub { x: 1, y: 2 }, &timers).unwrap();
                let difference = (i16::from(a) - i16::from(b)).rem_euclid(256);
                assert_eq!(cpu.state.v[0x1], difference as u8);
                assert_eq!(cpu.state.v[0xF], u8::from(a >= b));
            }
        }
        timers.stop();
    }

    #[test]
    fn test_8xy5_sub_borrows() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 3;
        cpu.state.v[0x2] = 255;
        exec(&mut cpu, 0x8125).unwrap();
        assert_eq!(cpu.state.v[0x1], 4);
        assert_eq!(cpu.state.v[0xF], 0);
    }

    #[test]
    fn test_8xy6_shr_lsb() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x5;
        exec(&mut cpu, 0x8106).unwrap();
        assert_eq!(cpu.state.v[0x1], 0x2);
        assert_eq!(cpu.state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy6_shr_nolsb() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x4;
        exec(&mut cpu, 0x8106).unwrap();
        assert_eq!(cpu.state.v[0x1], 0x2);
        assert_eq!(cpu.state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy7_subn_nocarry() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x11;
        cpu.state.v[0x2] = 0x33;
        exec(&mut cpu, 0x8127).unwrap();
        assert_eq!(cpu.state.v[0x1], 0x22);
        assert_eq!(cpu.state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy7_subn_carry() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x12;
        cpu.state.v[0x2] = 0x11;
        exec(&mut cpu, 0x8127).unwrap();
        assert_eq!(cpu.state.v[0x1], 0xFF);
        assert_eq!(cpu.state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xye_shl_msb() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0xFF;
        exec(&mut cpu, 0x810E).unwrap();
        // 0xFF * 2 = 0x01FE
        assert_eq!(cpu.state.v[0x1], 0xFE);
        assert_eq!(cpu.state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xye_shl_nomsb() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x4;
        exec(&mut cpu, 0x810E).unwrap();
        assert_eq!(cpu.state.v[0x1], 0x8);
        assert_eq!(cpu.state.v[0xF], 0x0);
    }

    #[test]
    fn test_flag_wins_over_result_in_vf() {
        let mut cpu = cpu();
        cpu.state.v[0xF] = 0xFF;
        cpu.state.v[0x1] = 0x01;
        exec(&mut cpu, 0x8F14).unwrap();
        assert_eq!(cpu.state.v[0xF], 0x1);
    }

    #[test]
    fn test_9xy0_sne_skips() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x11;
        exec(&mut cpu, 0x9120).unwrap();
        assert_eq!(cpu.state.pc, 0x0204);
    }

    #[test]
    fn test_9xy0_sne_doesntskip() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x11;
        cpu.state.v[0x2] = 0x11;
        exec(&mut cpu, 0x9120).unwrap();
        assert_eq!(cpu.state.pc, 0x0202);
    }

    #[test]
    fn test_annn_ld() {
        let mut cpu = cpu();
        exec(&mut cpu, 0xAABC).unwrap();
        assert_eq!(cpu.state.i, 0xABC);
    }

    #[test]
    fn test_bnnn_jp() {
        let mut cpu = cpu();
        cpu.state.v[0x0] = 0x2;
        exec(&mut cpu, 0xBABC).unwrap();
        assert_eq!(cpu.state.pc, 0xABE);
    }

    #[test]
    fn test_cxkk_rnd_is_masked() {
        let mut cpu = cpu();
        for _ in 0..64 {
            cpu.state.pc = 0x200;
            exec(&mut cpu, 0xC10F).unwrap();
            assert_eq!(cpu.state.v[0x1] & 0xF0, 0);
        }
        cpu.state.pc = 0x200;
        exec(&mut cpu, 0xC100).unwrap();
        assert_eq!(cpu.state.v[0x1], 0);
    }

    #[test]
    fn test_dxyn_drw_draws() {
        let mut cpu = cpu();
        cpu.state.v[0x0] = 0x1;
        // Draw the 0x0 sprite with a 1x 1y offset
        exec(&mut cpu, 0xD005).unwrap();
        let expected = [
            [true, true, true, true],
            [true, false, false, true],
            [true, false, false, true],
            [true, false, false, true],
            [true, true, true, true],
        ];
        for (row, pixels) in expected.iter().enumerate() {
            for (col, on) in pixels.iter().enumerate() {
                assert_eq!(cpu.display.get(col + 1, row + 1), *on, "({}, {})", col, row);
            }
        }
        assert!(!cpu.display.get(0, 0));
        assert!(!cpu.display.get(5, 1));
        assert_eq!(cpu.state.v[0xF], 0x0);
    }

    #[test]
    fn test_dxyn_drw_twice_erases() {
        let mut cpu = cpu();
        exec(&mut cpu, 0xD005).unwrap();
        assert_eq!(cpu.state.v[0xF], 0x0);
        cpu.state.pc = 0x200;
        exec(&mut cpu, 0xD005).unwrap();
        assert_eq!(cpu.state.v[0xF], 0x1);
        assert!(cpu.display.rows().all(|row| row.iter().all(|p| !p)));
    }

    #[test]
    fn test_dxyn_drw_xors() {
        let mut cpu = cpu();
        // 0 1 0 1 -> Set
        cpu.display.set(1, 0, true);
        cpu.display.set(3, 0, true);
        // 1 1 1 1 -> Draw xor
        exec(&mut cpu, 0xD001).unwrap();
        let row: Vec<bool> = (0..4).map(|x| cpu.display.get(x, 0)).collect();
        assert_eq!(row, [true, false, true, false]);
        assert_eq!(cpu.state.v[0xF], 0x1);
    }

    #[test]
    fn test_dxyn_drw_wraps() {
        let mut cpu = cpu();
        cpu.state.v[0x0] = 62;
        cpu.state.v[0x1] = 30;
        exec(&mut cpu, 0xD015).unwrap();
        // top row of the 0 glyph is 1111, split over both edges
        assert!(cpu.display.get(62, 30));
        assert!(cpu.display.get(63, 30));
        assert!(cpu.display.get(0, 30));
        assert!(cpu.display.get(1, 30));
        // the last rows wrap to the top
        assert!(cpu.display.get(62, 2));
        assert!(cpu.display.get(1, 2));
    }

    #[test]
    fn test_dxy0_draws_large_sprite_when_extended() {
        let mut cpu = cpu();
        cpu.display.extend(true);
        cpu.state.i = 0x300;
        let mut sprite = [0u8; 32];
        // a single pixel at the right edge of the last row
        sprite[31] = 0x01;
        cpu.memory.load(0x300, &sprite).unwrap();
        exec(&mut cpu, 0xD000).unwrap();
        assert!(cpu.display.get(15, 15));
        assert_eq!(
            cpu.display.rows().flatten().filter(|p| **p).count(),
            1
        );
    }

    #[test]
    fn test_dxy0_draws_nothing_when_not_extended() {
        let mut cpu = cpu();
        exec(&mut cpu, 0xD000).unwrap();
        assert!(cpu.display.rows().all(|row| row.iter().all(|p| !p)));
    }

    #[test]
    fn test_00fe_00ff_resolution() {
        let mut cpu = cpu();
        exec(&mut cpu, 0x00FE).unwrap();
        assert!(cpu.display.extended());
        assert_eq!(cpu.display.width(), 128);
        exec(&mut cpu, 0x00FF).unwrap();
        assert!(!cpu.display.extended());
    }

    #[test]
    fn test_00cn_scrolls_down() {
        let mut cpu = cpu();
        cpu.display.set(8, 0, true);
        exec(&mut cpu, 0x00C3).unwrap();
        assert!(cpu.display.get(8, 3));
        exec(&mut cpu, 0x00FB).unwrap();
        assert!(cpu.display.get(12, 3));
        exec(&mut cpu, 0x00FC).unwrap();
        assert!(cpu.display.get(8, 3));
    }

    #[test]
    fn test_ex9e_skp_skips() {
        let mut cpu = cpu();
        // position 11 is labelled E
        cpu.keyboard.press(11);
        cpu.state.v[0x1] = 0xE;
        exec(&mut cpu, 0xE19E).unwrap();
        assert_eq!(cpu.state.pc, 0x0204);
    }

    #[test]
    fn test_ex9e_skp_doesntskip() {
        let mut cpu = cpu();
        exec(&mut cpu, 0xE19E).unwrap();
        assert_eq!(cpu.state.pc, 0x0202);
    }

    #[test]
    fn test_exa1_sknp_skips() {
        let mut cpu = cpu();
        exec(&mut cpu, 0xE1A1).unwrap();
        assert_eq!(cpu.state.pc, 0x0204);
    }

    #[test]
    fn test_exa1_sknp_doesntskip() {
        let mut cpu = cpu();
        cpu.keyboard.press(11);
        cpu.state.v[0x1] = 0xE;
        exec(&mut cpu, 0xE1A1).unwrap();
        assert_eq!(cpu.state.pc, 0x0202);
    }

    #[test]
    fn test_fx15_fx07_delay_timer() {
        let mut cpu = cpu();
        let timers = timers();
        cpu.state.v[0x1] = 0xF;
        exec_with(&mut cpu, 0xF115, &timers).unwrap();
        assert_eq!(timers.delay.get(), 0xF);
        exec_with(&mut cpu, 0xF207, &timers).unwrap();
        assert_eq!(cpu.state.v[0x2], 0xF);
        timers.stop();
    }

    #[test]
    fn test_fx18_ld() {
        let mut cpu = cpu();
        let timers = timers();
        cpu.state.v[0x1] = 0xF;
        exec_with(&mut cpu, 0xF118, &timers).unwrap();
        assert_eq!(timers.sound.get(), 0xF);
        assert_eq!(timers.delay.get(), 0x0);
        timers.stop();
    }

    #[test]
    fn test_fx0a_takes_held_key() {
        let mut cpu = cpu();
        cpu.keyboard.press(0);
        exec(&mut cpu, 0xF30A).unwrap();
        assert_eq!(cpu.state.v[0x3], 0x1);
    }

    #[test]
    fn test_fx0a_interrupted_by_shutdown() {
        let mut cpu = cpu();
        cpu.state.v[0x3] = 0x9;
        cpu.keyboard.shutdown();
        exec(&mut cpu, 0xF30A).unwrap();
        assert_eq!(cpu.state.v[0x3], 0x9);
        assert_eq!(cpu.state.pc, 0x202);
    }

    #[test]
    fn test_fx1e_add() {
        let mut cpu = cpu();
        cpu.state.i = 0x1;
        cpu.state.v[0x1] = 0x1;
        exec(&mut cpu, 0xF11E).unwrap();
        assert_eq!(cpu.state.i, 0x2);
    }

    #[test]
    fn test_fx1e_wraps_to_memory() {
        let mut cpu = cpu();
        cpu.state.i = 0xFFF;
        cpu.state.v[0x0] = 0x1;
        exec(&mut cpu, 0xF01E).unwrap();
        assert_eq!(cpu.state.i, 0x000);
        cpu.state.i = 0xFFF;
        cpu.state.v[0x0] = 0x2;
        exec(&mut cpu, 0xF01E).unwrap();
        assert_eq!(cpu.state.i, 0x001);
        exec(&mut cpu, 0xF065).unwrap();
        assert_eq!(cpu.state.v[0x0], SPRITE_SHEET[1]);
    }

    #[test]
    fn test_bnnn_wraps_to_memory() {
        let mut cpu = cpu();
        cpu.state.v[0x0] = 0xFF;
        exec(&mut cpu, 0xBFFF).unwrap();
        assert_eq!(cpu.state.pc, 0x0FE);
        // the next fetch stays inside memory
        exec(&mut cpu, 0x6101).unwrap();
        assert_eq!(cpu.state.v[0x1], 0x01);
        assert_eq!(cpu.state.pc, 0x100);
    }

    #[test]
    fn test_addresses_wrap_to_small_memory() {
        let config = Config {
            memory_size: 0x300,
            ..Config::default()
        };
        let mut cpu =
            Cpu::new(config, Bitmap::new(), Arc::new(Keyboard::new()), Arc::new(Mute)).unwrap();
        exec(&mut cpu, 0x1400).unwrap();
        assert_eq!(cpu.state.pc, 0x100);
        exec(&mut cpu, 0xA2FF).unwrap();
        assert_eq!(cpu.state.i, 0x2FF);
        exec(&mut cpu, 0xA310).unwrap();
        assert_eq!(cpu.state.i, 0x010);
    }

    #[test]
    fn test_skip_wraps_to_memory() {
        let mut cpu = cpu();
        cpu.state.pc = 0xFFE;
        exec(&mut cpu, 0x3000).unwrap();
        assert_eq!(cpu.state.pc, 0x002);
    }

    #[test]
    fn test_fx29_ld() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0x2;
        exec(&mut cpu, 0xF129).unwrap();
        assert_eq!(cpu.state.i, 0xA);
        assert_eq!(
            cpu.memory.get_ro_slice(cpu.state.i, 5).unwrap(),
            &SPRITE_SHEET[10..15]
        );
    }

    #[test]
    fn test_fx30_ld() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 0xF;
        exec(&mut cpu, 0xF130).unwrap();
        assert_eq!(cpu.state.i, 0x50 + 150);
        assert_eq!(
            cpu.memory.get_ro_slice(cpu.state.i, 10).unwrap(),
            &LARGE_SPRITE_SHEET[150..160]
        );
    }

    #[test]
    fn test_fx33_ld() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 235;
        cpu.state.i = 0x300;
        exec(&mut cpu, 0xF133).unwrap();
        assert_eq!(cpu.memory.get_ro_slice(0x300, 3).unwrap(), &[2, 3, 5]);
    }

    #[test]
    fn test_fx33_small_value() {
        let mut cpu = cpu();
        cpu.state.v[0x1] = 7;
        cpu.state.i = 0x300;
        exec(&mut cpu, 0xF133).unwrap();
        assert_eq!(cpu.memory.get_ro_slice(0x300, 3).unwrap(), &[0, 0, 7]);
    }

    #[test]
    fn test_fx_55_ld() {
        let mut cpu = cpu();
        cpu.state.i = 0x300;
        cpu.state.v[0x0..0x6].copy_from_slice(&[0x1, 0x2, 0x3, 0x4, 0x5, 0x6]);
        exec(&mut cpu, 0xF455).unwrap();
        // V0..=V4, V5 is left alone
        assert_eq!(
            cpu.memory.get_ro_slice(0x300, 6).unwrap(),
            &[0x1, 0x2, 0x3, 0x4, 0x5, 0x0]
        );
        assert_eq!(cpu.state.i, 0x300);
    }

    #[test]
    fn test_fx_65_ld() {
        let mut cpu = cpu();
        cpu.state.i = 0x300;
        cpu.memory
            .load(0x300, &[0x1, 0x2, 0x3, 0x4, 0x5, 0x6])
            .unwrap();
        exec(&mut cpu, 0xF465).unwrap();
        assert_eq!(cpu.state.v[0x0..0x6], [0x1, 0x2, 0x3, 0x4, 0x5, 0x0]);
    }

    #[test]
    fn test_fx55_fx65_restores_registers() {
        let mut cpu = cpu();
        let timers = timers();
        let saved = [9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
        cpu.state.v = saved;
        cpu.state.i = 0x400;
        exec_with(&mut cpu, 0xFF55, &timers).unwrap();
        cpu.state.v = [0; 16];
        exec_with(&mut cpu, 0xFF65, &timers).unwrap();
        timers.stop();
        assert_eq!(cpu.state.v, saved);
    }

    #[test]
    fn test_fx55_into_sprites_fails() {
        let mut cpu = cpu();
        cpu.state.i = 0x10;
        assert_eq!(
            exec(&mut cpu, 0xF055),
            Err(VmError::MemoryOutOfBounds { address: 0x10 })
        );
    }

    #[test]
    fn test_fx65_past_end_fails() {
        let mut cpu = cpu();
        cpu.state.i = 0xFFE;
        assert!(matches!(
            exec(&mut cpu, 0xF465),
            Err(VmError::MemoryOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_fx75_fx85_rpl_flags() {
        let mut cpu = cpu();
        let timers = timers();
        cpu.state.v[0x0..0x4].copy_from_slice(&[0x1, 0x2, 0x3, 0x4]);
        exec_with(&mut cpu, 0xF275, &timers).unwrap();
        assert_eq!(cpu.state.rpl[0x0..0x4], [0x1, 0x2, 0x3, 0x0]);
        cpu.state.v = [0; 16];
        exec_with(&mut cpu, 0xF185, &timers).unwrap();
        timers.stop();
        assert_eq!(cpu.state.v[0x0..0x3], [0x1, 0x2, 0x0]);
    }

    #[test]
    fn test_unsupported_opcode() {
        let mut cpu = cpu();
        assert_eq!(
            exec(&mut cpu, 0xF1FF),
            Err(VmError::UnsupportedOpcode {
                opcode: 0xF1FF,
                address: 0x200
            })
        );
    }

    #[test]
    fn test_fetch_past_end_of_memory() {
        let mut cpu = cpu();
        cpu.state.pc = 0xFFF;
        let timers = timers();
        assert!(matches!(
            cpu.step(&timers),
            Err(VmError::MemoryOutOfBounds { .. })
        ));
        timers.stop();
    }

    #[test]
    fn test_tracer_sees_instructions() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut cpu = cpu();
        let sink = Arc::clone(&seen);
        cpu.set_tracer(move |pc, op, mnemonic| {
            sink.lock()
                .unwrap()
                .push((pc, op, mnemonic.map(String::from)));
        });
        exec(&mut cpu, 0x6122).unwrap();
        exec(&mut cpu, 0x0000).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (0x200, 0x6122, Some("LD V1, 0x22".to_string())),
                (0x202, 0x0000, None)
            ]
        );
    }

    #[test]
    fn test_trace_config_installs_tracer() {
        let config = Config {
            trace: true,
            ..Config::default()
        };
        let mut cpu =
            Cpu::new(config, Bitmap::new(), Arc::new(Keyboard::new()), Arc::new(Mute)).unwrap();
        assert!(cpu.tracer.is_some());
        exec(&mut cpu, 0x00E0).unwrap();
    }

    #[test]
    fn test_dump() {
        let mut cpu = cpu();
        cpu.state.v[0xA] = 0x42;
        cpu.load(0x200, &[0x00, 0xE0]).unwrap();
        let dump = cpu.dump();
        assert!(dump.starts_with("PC  [0200] OP  [00e0] I   [0000] SP  [0000]"));
        assert!(dump.contains("VA  [42]"));
        assert_eq!(dump.lines().count(), 3);
    }

    #[test]
    fn test_run_returns_after_shutdown() {
        let mut cpu = cpu();
        // JP 0x200
        cpu.load(0x200, &[0x12, 0x00]).unwrap();
        cpu.keyboard.shutdown();
        cpu.run(0x200).unwrap();
        assert_eq!(cpu.state.pc, 0x200);
    }

    #[test]
    fn test_run_stops_on_error() {
        let mut cpu = cpu();
        cpu.load(0x200, &[0x60, 0x01, 0xFF, 0xFF]).unwrap();
        assert_eq!(
            cpu.run(0x200),
            Err(VmError::UnsupportedOpcode {
                opcode: 0xFFFF,
                address: 0x202
            })
        );
        assert_eq!(cpu.state.v[0x0], 0x01);
    }
}
