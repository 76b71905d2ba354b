use crate::error::{Result, VmError};

/// The CPU's registers
///
/// ## Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the carry/borrow/collision flag
/// - (i) a 16-bit memory address register
///
/// ## Counter
/// - (pc) a 16-bit program counter
///
/// ## Stack
/// - return addresses for subroutine calls, see `Stack`
///
/// ## RPL flags
/// - 16 bytes that `FX75` and `FX85` save to and restore from
#[derive(Clone, Debug)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub stack: Stack,
    pub rpl: [u8; 16],
}

impl State {
    pub fn new(entry: u16, stack_depth: usize) -> Self {
        State {
            v: [0; 16],
            i: 0,
            pc: entry,
            stack: Stack::new(stack_depth),
            rpl: [0; 16],
        }
    }

    /// Writes the flag register.
    pub fn flag(&mut self, set: bool) {
        self.v[0xF] = u8::from(set);
    }
}

/// # Stack
/// A fixed number of return addresses and a pointer to the next free slot.
///
/// `push` stores then increments `sp`; `pop` decrements then reads.
#[derive(Clone, Debug)]
pub struct Stack {
    addresses: Vec<u16>,
    sp: usize,
}

impl Stack {
    pub fn new(depth: usize) -> Self {
        Stack {
            addresses: vec![0; depth],
            sp: 0,
        }
    }

    pub fn push(&mut self, addr: u16) -> Result<()> {
        let slot = self
            .addresses
            .get_mut(self.sp)
            .ok_or(VmError::StackOverflow {
                depth: self.sp,
            })?;
        *slot = addr;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16> {
        if self.sp == 0 {
            return Err(VmError::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.addresses[self.sp])
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    /// The most recently pushed address.
    pub fn top(&self) -> Option<u16> {
        self.sp.checked_sub(1).map(|i| self.addresses[i])
    }
}
