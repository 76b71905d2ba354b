use std::fmt;

use crate::error::{Result, VmError};
use crate::opcode::Opcode;

/// A decoded instruction.
///
/// Register operands are register numbers (0x0..=0xF), not register contents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 0000, 00FD
    Nop,
    /// 00E0
    Clear,
    /// 00EE
    Return,
    /// 00CN
    ScrollDown(u8),
    /// 00FB
    ScrollRight,
    /// 00FC
    ScrollLeft,
    /// 00FE
    Extend,
    /// 00FF
    Shrink,
    /// 1NNN
    Jump(u16),
    /// 2NNN
    Call(u16),
    /// 3XKK
    SkipEq { x: u8, kk: u8 },
    /// 4XKK
    SkipNe { x: u8, kk: u8 },
    /// 5XY0
    SkipEqReg { x: u8, y: u8 },
    /// 6XKK
    Load { x: u8, kk: u8 },
    /// 7XKK
    Add { x: u8, kk: u8 },
    /// 8XY0
    Move { x: u8, y: u8 },
    /// 8XY1
    Or { x: u8, y: u8 },
    /// 8XY2
    And { x: u8, y: u8 },
    /// 8XY3
    Xor { x: u8, y: u8 },
    /// 8XY4
    AddReg { x: u8, y: u8 },
    /// 8XY5
    Sub { x: u8, y: u8 },
    /// 8XY6
    Shr { x: u8 },
    /// 8XY7
    SubN { x: u8, y: u8 },
    /// 8XYE
    Shl { x: u8 },
    /// 9XY0
    SkipNeReg { x: u8, y: u8 },
    /// ANNN
    LoadIndex(u16),
    /// BNNN
    JumpIndexed(u16),
    /// CXKK
    Random { x: u8, kk: u8 },
    /// DXYN
    Draw { x: u8, y: u8, n: u8 },
    /// EX9E
    SkipPressed(u8),
    /// EXA1
    SkipNotPressed(u8),
    /// FX07
    LoadDelay(u8),
    /// FX0A
    WaitKey(u8),
    /// FX15
    SetDelay(u8),
    /// FX18
    SetSound(u8),
    /// FX1E
    AddIndex(u8),
    /// FX29
    Glyph(u8),
    /// FX30
    LargeGlyph(u8),
    /// FX33
    Bcd(u8),
    /// FX55
    Store(u8),
    /// FX65
    Read(u8),
    /// FX75
    SaveFlags(u8),
    /// FX85
    LoadFlags(u8),
}

impl Instruction {
    /// Selects the Instruction for a given Opcode.
    ///
    /// `address` is only used to report where an unsupported opcode was found.
    pub fn decode(op: u16, address: u16) -> Result<Instruction> {
        use Instruction::*;

        let (x, y, n, kk, addr) = (op.x(), op.y(), op.n(), op.kk(), op.addr());
        let instruction = match op.nibbles() {
            // family 0 only looks at the low byte
            (0x0, _, 0x0, 0x0) => Nop,
            (0x0, _, 0xC, _) => ScrollDown(n),
            (0x0, _, 0xE, 0x0) => Clear,
            (0x0, _, 0xE, 0xE) => Return,
            (0x0, _, 0xF, 0xB) => ScrollRight,
            (0x0, _, 0xF, 0xC) => ScrollLeft,
            (0x0, _, 0xF, 0xD) => Nop,
            (0x0, _, 0xF, 0xE) => Extend,
            (0x0, _, 0xF, 0xF) => Shrink,
            (0x1, ..) => Jump(addr),
            (0x2, ..) => Call(addr),
            (0x3, ..) => SkipEq { x, kk },
            (0x4, ..) => SkipNe { x, kk },
            (0x5, ..) => SkipEqReg { x, y },
            (0x6, ..) => Load { x, kk },
            (0x7, ..) => Add { x, kk },
            (0x8, .., 0x0) => Move { x, y },
            (0x8, .., 0x1) => Or { x, y },
            (0x8, .., 0x2) => And { x, y },
            (0x8, .., 0x3) => Xor { x, y },
            (0x8, .., 0x4) => AddReg { x, y },
            (0x8, .., 0x5) => Sub { x, y },
            (0x8, .., 0x6) => Shr { x },
            (0x8, .., 0x7) => SubN { x, y },
            (0x8, .., 0xE) => Shl { x },
            (0x9, ..) => SkipNeReg { x, y },
            (0xA, ..) => LoadIndex(addr),
            (0xB, ..) => JumpIndexed(addr),
            (0xC, ..) => Random { x, kk },
            (0xD, ..) => Draw { x, y, n },
            (0xE, _, 0x9, 0xE) => SkipPressed(x),
            (0xE, _, 0xA, 0x1) => SkipNotPressed(x),
            (0xF, _, 0x0, 0x7) => LoadDelay(x),
            (0xF, _, 0x0, 0xA) => WaitKey(x),
            (0xF, _, 0x1, 0x5) => SetDelay(x),
            (0xF, _, 0x1, 0x8) => SetSound(x),
            (0xF, _, 0x1, 0xE) => AddIndex(x),
            (0xF, _, 0x2, 0x9) => Glyph(x),
            (0xF, _, 0x3, 0x0) => LargeGlyph(x),
            (0xF, _, 0x3, 0x3) => Bcd(x),
            (0xF, _, 0x5, 0x5) => Store(x),
            (0xF, _, 0x6, 0x5) => Read(x),
            (0xF, _, 0x7, 0x5) => SaveFlags(x),
            (0xF, _, 0x8, 0x5) => LoadFlags(x),
            _ => {
                return Err(VmError::UnsupportedOpcode {
                    opcode: op,
                    address,
                })
            }
        };
        Ok(instruction)
    }

    /// Assembly listing for the trace, `None` for instructions that do nothing.
    pub fn mnemonic(&self) -> Option<String> {
        match self {
            Instruction::Nop => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instruction::*;

        match *self {
            Nop => write!(f, "NOP"),
            Clear => write!(f, "CLS"),
            Return => write!(f, "RET"),
            ScrollDown(n) => write!(f, "SCD {:#x}", n),
            ScrollRight => write!(f, "SCR"),
            ScrollLeft => write!(f, "SCL"),
            Extend => write!(f, "HIGH"),
            Shrink => write!(f, "LOW"),
            Jump(addr) => write!(f, "JP {:#05x}", addr),
            Call(addr) => write!(f, "CALL {:#05x}", addr),
            SkipEq { x, kk } => write!(f, "SE V{:X}, {:#04x}", x, kk),
            SkipNe { x, kk } => write!(f, "SNE V{:X}, {:#04x}", x, kk),
            SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            Load { x, kk } => write!(f, "LD V{:X}, {:#04x}", x, kk),
            Add { x, kk } => write!(f, "ADD V{:X}, {:#04x}", x, kk),
            Move { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr { x } => write!(f, "SHR V{:X}", x),
            SubN { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl { x } => write!(f, "SHL V{:X}", x),
            SkipNeReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadIndex(addr) => write!(f, "LD I, {:#05x}", addr),
            JumpIndexed(addr) => write!(f, "JP V0, {:#05x}", addr),
            Random { x, kk } => write!(f, "RND V{:X}, {:#04x}", x, kk),
            Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {:#x}", x, y, n),
            SkipPressed(x) => write!(f, "SKP V{:X}", x),
            SkipNotPressed(x) => write!(f, "SKNP V{:X}", x),
            LoadDelay(x) => write!(f, "LD V{:X}, DT", x),
            WaitKey(x) => write!(f, "LD V{:X}, K", x),
            SetDelay(x) => write!(f, "LD DT, V{:X}", x),
            SetSound(x) => write!(f, "LD ST, V{:X}", x),
            AddIndex(x) => write!(f, "ADD I, V{:X}", x),
            Glyph(x) => write!(f, "LD F, V{:X}", x),
            LargeGlyph(x) => write!(f, "LD HF, V{:X}", x),
            Bcd(x) => write!(f, "LD B, V{:X}", x),
            Store(x) => write!(f, "LD [I], V{:X}", x),
            Read(x) => write!(f, "LD V{:X}, [I]", x),
            SaveFlags(x) => write!(f, "LD R, V{:X}", x),
            LoadFlags(x) => write!(f, "LD V{:X}, R", x),
        }
    }
}
