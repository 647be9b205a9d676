use crate::error::Result;
use crate::instruction::Instruction;
use crate::memory::MemoryMap;
use std::fmt;

/// fetch the two bytes at `pc`, moving it on to the next instruction
pub fn fetch(memory: &impl MemoryMap, pc: &mut u16) -> Result<(u8, u8)> {
    let hi = memory.get(*pc)?;
    let lo = memory.get(pc.wrapping_add(1))?;
    *pc = pc.wrapping_add(2);
    Ok((hi, lo))
}

/// an instruction together with where it came from and its raw bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fetched {
    pub pc: u16,
    pub hi: u8,
    pub lo: u8,
    pub instr: Instruction,
}

impl fmt::Display for Fetched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03x}: {:02x}{:02x}  {}", self.pc, self.hi, self.lo, self.instr)
    }
}

/// fetch and decode in one go
pub fn fetch_and_decode(memory: &impl MemoryMap, pc: &mut u16) -> Result<Fetched> {
    let at = *pc;
    let (hi, lo) = fetch(memory, pc)?;
    Ok(Fetched {
        pc: at,
        hi,
        lo,
        instr: decode(hi, lo),
    })
}

/// turn a byte pair into an instruction; never fails, junk comes back as
/// [`Instruction::Unknown`]
pub fn decode(hi: u8, lo: u8) -> Instruction {
    use Instruction::*;

    let x = hi & 0xf;
    let y = lo >> 4;
    let n = lo & 0xf;
    let addr = ((x as u16) << 8) | lo as u16;

    match hi >> 4 {
        0x0 => match (hi, lo) {
            (0x00, 0xe0) => ClearScreen,
            (0x00, 0xee) => Return,
            _ => Sys { addr },
        },
        0x1 => Jump { addr },
        0x2 => Call { addr },
        0x3 => SkipEqImm { x, byte: lo },
        0x4 => SkipNeqImm { x, byte: lo },
        // the low nibble is not checked, as on the VIP
        0x5 => SkipEqReg { x, y },
        0x6 => LoadImm { x, byte: lo },
        0x7 => AddImm { x, byte: lo },
        0x8 => match n {
            0x0 => Move { x, y },
            0x1 => Or { x, y },
            0x2 => And { x, y },
            0x3 => Xor { x, y },
            0x4 => Add { x, y },
            0x5 => Sub { x, y },
            0x6 => ShiftRight { x, y },
            0x7 => SubN { x, y },
            0xe => ShiftLeft { x, y },
            _ => Unknown { hi, lo },
        },
        0x9 => SkipNeqReg { x, y },
        0xa => LoadAddr { addr },
        0xb => JumpOffset { addr },
        0xc => RandomMask { x, byte: lo },
        0xd => Draw { x, y, height: n },
        0xe => match lo {
            0x9e => SkipIfPressed { x },
            0xa1 => SkipIfNotPressed { x },
            _ => Unknown { hi, lo },
        },
        // 0xf
        _ => match lo {
            0x07 => GetDelay { x },
            0x0a => WaitKey { x },
            0x15 => SetDelay { x },
            0x18 => SetSound { x },
            0x1e => AddToAddr { x },
            0x29 => AddrOfDigit { x },
            0x33 => StoreBcd { x },
            0x55 => SaveRegs { count: x + 1 },
            0x65 => RestoreRegs { count: x + 1 },
            _ => Unknown { hi, lo },
        },
    }
}
