use sdl2::keyboard::Keycode;

/// # Keymap
/// Chip-8 input is generated with a hexadecimal keypad.
///
/// This original layout is mapped to the left 4 alphanumeric columns, and each key resolves to
/// its position on the pad (see `chipvm::KEYPAD`).
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |Q|W|E|R|
/// |7|8|9|E|  ->  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
pub fn keymap(key: Keycode) -> Option<usize> {
    match key {
        Keycode::Num1 => Some(0),
        Keycode::Num2 => Some(1),
        Keycode::Num3 => Some(2),
        Keycode::Num4 => Some(3),
        Keycode::Q => Some(4),
        Keycode::W => Some(5),
        Keycode::E => Some(6),
        Keycode::R => Some(7),
        Keycode::A => Some(8),
        Keycode::S => Some(9),
        Keycode::D => Some(10),
        Keycode::F => Some(11),
        Keycode::Z => Some(12),
        Keycode::X => Some(13),
        Keycode::C => Some(14),
        Keycode::V => Some(15),
        _ => None,
    }
}
