/// Bytes of addressable memory on a stock machine.
pub const MEMORY_SIZE: usize = 4096;

/// Return addresses the call stack can hold.
pub const STACK_DEPTH: usize = 24;

/// Where ROMs are loaded and where execution begins.
pub const PROGRAM_START: u16 = 0x200;

/// Timers count down at 60Hz.
pub const TIMER_HZ: u32 = 60;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const EXTENDED_DISPLAY_WIDTH: usize = 128;
pub const EXTENDED_DISPLAY_HEIGHT: usize = 64;

/// Sprites drawn with `DXY0` in extended mode are 16x16.
pub const EXTENDED_SPRITE_ROWS: usize = 16;

/// Pixels moved by the horizontal scroll instructions.
pub const SCROLL_STEP: usize = 4;

pub const SPRITE_SHEET_ADDR: u16 = 0x00;
pub const SPRITE_BYTES: u16 = 5;
pub const LARGE_SPRITE_SHEET_ADDR: u16 = 0x50;
pub const LARGE_SPRITE_BYTES: u16 = 10;

/// Everything below this address holds glyphs and may not be written.
pub const RESERVED_END: u16 = LARGE_SPRITE_SHEET_ADDR + LARGE_SPRITE_SHEET.len() as u16;

/// # Sprite sheet
/// 4x5 glyphs for the hex digits 0..F, one byte per row with the glyph in the high nibble.
/// ```text
/// 0xF0 -> ####
/// 0x90 -> #  #
/// 0x90 -> #  #
/// 0x90 -> #  #
/// 0xF0 -> ####
/// ```
#[rustfmt::skip]
pub const SPRITE_SHEET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// # Large sprite sheet
/// 8x10 Super-CHIP glyphs for the hex digits 0..F, addressed with `FX30`.
#[rustfmt::skip]
pub const LARGE_SPRITE_SHEET: [u8; 160] = [
    0x3C, 0x7E, 0xE7, 0xC3, 0xC3, 0xC3, 0xC3, 0xE7, 0x7E, 0x3C, // 0
    0x18, 0x38, 0x58, 0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x3C, // 1
    0x3E, 0x7F, 0xC3, 0x06, 0x0C, 0x18, 0x30, 0x60, 0xFF, 0xFF, // 2
    0x3C, 0x7E, 0xC3, 0x03, 0x0E, 0x0E, 0x03, 0xC3, 0x7E, 0x3C, // 3
    0x06, 0x0E, 0x1E, 0x36, 0x66, 0xC6, 0xFF, 0xFF, 0x06, 0x06, // 4
    0xFF, 0xFF, 0xC0, 0xC0, 0xFC, 0xFE, 0x03, 0xC3, 0x7E, 0x3C, // 5
    0x3E, 0x7C, 0xE0, 0xC0, 0xFC, 0xFE, 0xC3, 0xC3, 0x7E, 0x3C, // 6
    0xFF, 0xFF, 0x03, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x60, 0x60, // 7
    0x3C, 0x7E, 0xC3, 0xC3, 0x7E, 0x7E, 0xC3, 0xC3, 0x7E, 0x3C, // 8
    0x3C, 0x7E, 0xC3, 0xC3, 0x7F, 0x3F, 0x03, 0x03, 0x3E, 0x7C, // 9
    0x3C, 0x7E, 0xC3, 0xC3, 0xFF, 0xFF, 0xC3, 0xC3, 0xC3, 0xC3, // A
    0xFC, 0xFE, 0xC3, 0xC3, 0xFE, 0xFE, 0xC3, 0xC3, 0xFE, 0xFC, // B
    0x3C, 0x7E, 0xC3, 0xC0, 0xC0, 0xC0, 0xC0, 0xC3, 0x7E, 0x3C, // C
    0xFC, 0xFE, 0xC3, 0xC3, 0xC3, 0xC3, 0xC3, 0xC3, 0xFE, 0xFC, // D
    0xFF, 0xFF, 0xC0, 0xC0, 0xFC, 0xFC, 0xC0, 0xC0, 0xFF, 0xFF, // E
    0xFF, 0xFF, 0xC0, 0xC0, 0xFC, 0xFC, 0xC0, 0xC0, 0xC0, 0xC0, // F
];
