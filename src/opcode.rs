/// # Opcode fields
///
/// Every instruction is a big-endian 16 bit word. Its nibbles are named:
/// ```text
/// [f x y n]
///  | | | `- n:  sub-operation or sprite height
///  | | `--- y:  register Vy
///  | `----- x:  register Vx, or the last register of the range V0..=Vx
///  `------- f:  instruction family
///    [_ k k]  kk:  8 bit immediate
///    [_ a d r] addr: 12 bit address
/// ```
/// Which of these carry meaning depends on the family; decoding picks the relevant ones.
pub trait Opcode {
    /// All four nibbles, most significant first.
    fn nibbles(&self) -> (u8, u8, u8, u8);

    /// `[f___]`
    fn family(&self) -> u8;

    /// `[_x__]`
    fn x(&self) -> u8;

    /// `[__y_]`
    fn y(&self) -> u8;

    /// `[___n]`
    fn n(&self) -> u8;

    /// `[__kk]`
    fn kk(&self) -> u8;

    /// `[_adr]`
    fn addr(&self) -> u16;
}

impl Opcode for u16 {
    fn nibbles(&self) -> (u8, u8, u8, u8) {
        (self.family(), self.x(), self.y(), self.n())
    }

    fn family(&self) -> u8 {
        (self >> 12) as u8
    }

    fn x(&self) -> u8 {
        ((self >> 8) & 0xF) as u8
    }

    fn y(&self) -> u8 {
        ((self >> 4) & 0xF) as u8
    }

    fn n(&self) -> u8 {
        (self & 0xF) as u8
    }

    fn kk(&self) -> u8 {
        (self & 0xFF) as u8
    }

    fn addr(&self) -> u16 {
        self & 0xFFF
    }
}
