use crate::constants::{LARGE_SPRITE_SHEET, LARGE_SPRITE_SHEET_ADDR, RESERVED_END, SPRITE_SHEET};
use crate::error::{Result, VmError};

/// # Memory
/// A flat, byte addressable buffer.
///
/// ```text
/// 0x000 - 0x04F  4x5 sprite sheet
/// 0x050 - 0x0EF  8x10 sprite sheet
/// 0x0F0 - 0x1FF  unused
/// 0x200 - ...    program
/// ```
///
/// The sprite sheets are baked in at construction and the region they occupy is read only;
/// every write below `RESERVED_END` is rejected as out of bounds.
pub struct Memory {
    bytes: Box<[u8]>,
}

impl Memory {
    /// Allocates `size` zeroed bytes and installs both sprite sheets.
    pub fn new(size: usize) -> Result<Self> {
        if size <= RESERVED_END as usize {
            return Err(VmError::InvalidConfig(format!(
                "{} bytes of memory cannot hold the {} byte sprite sheets",
                size, RESERVED_END
            )));
        }
        let mut bytes = vec![0; size].into_boxed_slice();
        bytes[..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);
        let large = LARGE_SPRITE_SHEET_ADDR as usize;
        bytes[large..large + LARGE_SPRITE_SHEET.len()].copy_from_slice(&LARGE_SPRITE_SHEET);
        Ok(Memory { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Copies a program into memory at `addr`.
    pub fn load(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        let start = addr as usize;
        if start + data.len() > self.len() {
            return Err(VmError::InvalidLoad {
                address: addr,
                len: data.len(),
                capacity: self.len(),
            });
        }
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    pub fn read(&self, addr: u16) -> Result<u8> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or(VmError::MemoryOutOfBounds {
                address: addr as usize,
            })
    }

    /// Reads a big-endian word.
    pub fn read_word(&self, addr: u16) -> Result<u16> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from(word[0]) << 8 | u16::from(word[1]))
    }

    /// A read only view of `len` bytes starting at `addr`.
    pub fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8]> {
        let start = addr as usize;
        if start + len > self.len() {
            return Err(VmError::MemoryOutOfBounds {
                address: start,
            });
        }
        Ok(&self.bytes[start..start + len])
    }

    /// A writable view of `len` bytes starting at `addr`; never overlaps the sprite sheets.
    pub fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8]> {
        let start = addr as usize;
        if len > 0 && start < RESERVED_END as usize {
            return Err(VmError::MemoryOutOfBounds { address: start });
        }
        if start + len > self.len() {
            return Err(VmError::MemoryOutOfBounds {
                address: start,
            });
        }
        Ok(&mut self.bytes[start..start + len])
    }
}
