use crate::error::{Chip8Error, Result};
use std::io;
use std::ops::Range;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents memory map, ROM, RAM etc.
///
/// Every access covers `[addr, addr + len)` and fails with
/// [`Chip8Error::OutOfBounds`] unless that whole range is inside the map.
pub trait MemoryMap {
    /// write unknown len of data into memory at a particular address,
    /// returning how many bytes were written
    fn write_any(&mut self, reader: &mut impl io::Read, addr: u16) -> Result<usize> {
        let mut buf = Vec::new();
        let len = reader.read_to_end(&mut buf)?;
        self.write(addr, &buf)?;
        Ok(len)
    }

    /// write a chunk of bytes into "RAM"
    fn write(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// fill `buf` from memory starting at `addr`
    fn read(&self, addr: u16, buf: &mut [u8]) -> Result<()> {
        buf.copy_from_slice(self.get_ro_slice(addr, buf.len())?);
        Ok(())
    }

    /// get a single byte
    fn get(&self, addr: u16) -> Result<u8> {
        Ok(self.get_ro_slice(addr, 1)?[0])
    }

    /// get a big-endian two-byte word
    fn get_word(&self, addr: u16) -> Result<u16> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8]>;

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8]>;

    /// total addressable bytes
    fn capacity(&self) -> usize;
}

/// Defines the CHIP-8 standard memory map, 4K configuration:
///   0x0000-0x01ff  interpreter (digit sprites live here)
///   0x0200-0x0fff  program
///
/// the call stack is kept by the cpu rather than in RAM
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
    pub program_addr: u16,
}

impl MemoryMap for Chip8MemoryMap {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8]> {
        let r = self.span(addr, len)?;
        Ok(&mut self.bytes[r])
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8]> {
        let r = self.span(addr, len)?;
        Ok(&self.bytes[r])
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

impl Chip8MemoryMap {
    /// zeroed 4K of RAM; glyphs are the runtime's job
    pub fn new() -> Self {
        Chip8MemoryMap {
            bytes: vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice(),
            program_addr: CHIP8_PROGRAM_ADDR,
        }
    }

    /// load a CHIP-8 program at 0x200
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize> {
        self.write_any(reader, self.program_addr)
    }

    fn span(&self, addr: u16, len: usize) -> Result<Range<usize>> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(Chip8Error::OutOfBounds { addr: start, len }),
        }
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

/// where the runtime puts the hex digit glyphs
pub const CHIP8_CONTEMPORARY_FONT_ADDR: u16 = 0x050;

/// bytes per digit glyph
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

pub const CHIP8_CONTEMPORARY_FONT: [u8; 80] = [
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

/// copy the hex digit glyphs into low memory
pub fn install_digit_sprites(memory: &mut impl MemoryMap, base: u16) -> Result<()> {
    memory.write(base, &CHIP8_CONTEMPORARY_FONT)
}
