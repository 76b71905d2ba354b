use std::sync::{Condvar, Mutex, MutexGuard};

use log::debug;

/// # Keypad layout
/// Keys are addressed by their position on the 4x4 pad, left to right and top to bottom.
/// Each position is labelled with the hex value programs see.
/// ```text
/// |1|2|3|C|      | 0| 1| 2| 3|
/// |4|5|6|D|  ->  | 4| 5| 6| 7|
/// |7|8|9|E|  ->  | 8| 9|10|11|
/// |A|0|B|F|      |12|13|14|15|
/// ```
pub const KEYPAD: [u8; 16] = [
    0x1, 0x2, 0x3, 0xC, //
    0x4, 0x5, 0x6, 0xD, //
    0x7, 0x8, 0x9, 0xE, //
    0xA, 0x0, 0xB, 0xF, //
];

#[derive(Default)]
struct KeyState {
    pressed: Option<usize>,
    shutdown: bool,
}

/// # Keyboard
/// The hex keypad plus the shutdown system key, shared between the input producer and the CPU.
///
/// One key can be held at a time. All state sits behind a single lock whose condition variable
/// is signalled by `press` and `shutdown`, so a CPU blocked in `wait` never misses either.
/// Shutdown is one way; once set it stays set.
#[derive(Default)]
pub struct Keyboard {
    state: Mutex<KeyState>,
    changed: Condvar,
    pub(crate) peek_delay: u32,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A keyboard whose `peek` spins `peek_delay` times first to model a slow key scan.
    pub fn with_peek_delay(peek_delay: u32) -> Self {
        Keyboard {
            peek_delay,
            ..Self::default()
        }
    }

    /// Hold down the key at `position`, replacing any key already held.
    pub fn press(&self, position: usize) {
        if position >= KEYPAD.len() {
            return;
        }
        self.lock().pressed = Some(position);
        self.changed.notify_all();
    }

    pub fn release(&self) {
        self.lock().pressed = None;
    }

    pub fn pressed(&self, position: usize) -> bool {
        self.lock().pressed == Some(position)
    }

    /// Whether the key labelled `value` is held.
    pub fn peek(&self, value: u8) -> bool {
        for _ in 0..self.peek_delay {
            std::hint::spin_loop();
        }
        match position_of(value) {
            Some(position) => self.pressed(position),
            None => false,
        }
    }

    /// The hex value of the key at `position`.
    pub fn label(&self, position: usize) -> Option<u8> {
        KEYPAD.get(position).copied()
    }

    /// Blocks until a key is held or the machine is shut down.
    ///
    /// Returns the held key's value, or `None` if shutdown interrupted the wait.
    pub fn wait(&self) -> Option<u8> {
        let mut state = self.lock();
        loop {
            if state.shutdown {
                debug!("key wait interrupted by shutdown");
                return None;
            }
            if let Some(position) = state.pressed {
                return Some(KEYPAD[position]);
            }
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Press the shutdown system key.
    pub fn shutdown(&self) {
        self.lock().shutdown = true;
        self.changed.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    fn lock(&self) -> MutexGuard<'_, KeyState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn position_of(value: u8) -> Option<usize> {
    KEYPAD.iter().position(|&label| label == value)
}
