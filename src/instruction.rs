//! # instruction
//!
//! Every CHIP-8 instruction is two bytes, packed in nibbles:
//!
//! ```text
//!  hi       lo
//!  [o][x]   [y][n]
//!       [   nnn   ]    12-bit address
//!           [ kk  ]    8-bit immediate
//! ```
//!
//! `x` and `y` index the sixteen V registers; VF doubles as the flag.
use std::fmt;

/// A decoded instruction. Operand names follow the nibble layout above:
/// `x`/`y` are register indices, `byte` an immediate, `addr` a 12-bit address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 0nnn, machine code routine on the COSMAC; ignored here
    Sys { addr: u16 },
    /// 1nnn
    Jump { addr: u16 },
    /// 2nnn
    Call { addr: u16 },
    /// 3xkk
    SkipEqImm { x: u8, byte: u8 },
    /// 4xkk
    SkipNeqImm { x: u8, byte: u8 },
    /// 5xy0
    SkipEqReg { x: u8, y: u8 },
    /// 6xkk
    LoadImm { x: u8, byte: u8 },
    /// 7xkk, no carry
    AddImm { x: u8, byte: u8 },
    /// 8xy0
    Move { x: u8, y: u8 },
    /// 8xy1
    Or { x: u8, y: u8 },
    /// 8xy2
    And { x: u8, y: u8 },
    /// 8xy3
    Xor { x: u8, y: u8 },
    /// 8xy4, VF = carry
    Add { x: u8, y: u8 },
    /// 8xy5, VF = Vx > Vy
    Sub { x: u8, y: u8 },
    /// 8xy6, VF = lsb; y is decoded but unused
    ShiftRight { x: u8, y: u8 },
    /// 8xy7, VF = Vy > Vx
    SubN { x: u8, y: u8 },
    /// 8xyE, VF = msb; y is decoded but unused
    ShiftLeft { x: u8, y: u8 },
    /// 9xy0
    SkipNeqReg { x: u8, y: u8 },
    /// Annn
    LoadAddr { addr: u16 },
    /// Bnnn
    JumpOffset { addr: u16 },
    /// Cxkk
    RandomMask { x: u8, byte: u8 },
    /// Dxyn
    Draw { x: u8, y: u8, height: u8 },
    /// Ex9E
    SkipIfPressed { x: u8 },
    /// ExA1
    SkipIfNotPressed { x: u8 },
    /// Fx07
    GetDelay { x: u8 },
    /// Fx0A
    WaitKey { x: u8 },
    /// Fx15
    SetDelay { x: u8 },
    /// Fx18
    SetSound { x: u8 },
    /// Fx1E
    AddToAddr { x: u8 },
    /// Fx29
    AddrOfDigit { x: u8 },
    /// Fx33
    StoreBcd { x: u8 },
    /// Fx55, `count` is x + 1
    SaveRegs { count: u8 },
    /// Fx65, `count` is x + 1
    RestoreRegs { count: u8 },
    /// anything else; executes as a no-op
    Unknown { hi: u8, lo: u8 },
}

impl Instruction {
    /// short name, for diagnostics
    pub fn mnemonic(&self) -> &'static str {
        use Instruction::*;
        match self {
            ClearScreen => "CLS",
            Return => "RET",
            Sys { .. } => "SYS",
            Jump { .. } | JumpOffset { .. } => "JP",
            Call { .. } => "CALL",
            SkipEqImm { .. } | SkipEqReg { .. } => "SE",
            SkipNeqImm { .. } | SkipNeqReg { .. } => "SNE",
            LoadImm { .. }
            | Move { .. }
            | LoadAddr { .. }
            | GetDelay { .. }
            | WaitKey { .. }
            | SetDelay { .. }
            | SetSound { .. }
            | AddrOfDigit { .. }
            | StoreBcd { .. }
            | SaveRegs { .. }
            | RestoreRegs { .. } => "LD",
            AddImm { .. } | Add { .. } | AddToAddr { .. } => "ADD",
            Or { .. } => "OR",
            And { .. } => "AND",
            Xor { .. } => "XOR",
            Sub { .. } => "SUB",
            ShiftRight { .. } => "SHR",
            SubN { .. } => "SUBN",
            ShiftLeft { .. } => "SHL",
            RandomMask { .. } => "RND",
            Draw { .. } => "DRW",
            SkipIfPressed { .. } => "SKP",
            SkipIfNotPressed { .. } => "SKNP",
            Unknown { .. } => "???",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        let m = self.mnemonic();
        match *self {
            ClearScreen | Return => write!(f, "{}", m),
            Sys { addr } | Jump { addr } | Call { addr } => write!(f, "{} {:#05x}", m, addr),
            JumpOffset { addr } => write!(f, "{} V0, {:#05x}", m, addr),
            LoadAddr { addr } => write!(f, "{} I, {:#05x}", m, addr),
            SkipEqImm { x, byte }
            | SkipNeqImm { x, byte }
            | LoadImm { x, byte }
            | AddImm { x, byte }
            | RandomMask { x, byte } => write!(f, "{} V{:X}, {:#04x}", m, x, byte),
            SkipEqReg { x, y }
            | SkipNeqReg { x, y }
            | Move { x, y }
            | Or { x, y }
            | And { x, y }
            | Xor { x, y }
            | Add { x, y }
            | Sub { x, y }
            | SubN { x, y } => write!(f, "{} V{:X}, V{:X}", m, x, y),
            ShiftRight { x, .. } | ShiftLeft { x, .. } => write!(f, "{} V{:X}", m, x),
            Draw { x, y, height } => write!(f, "{} V{:X}, V{:X}, {}", m, x, y, height),
            SkipIfPressed { x } | SkipIfNotPressed { x } => write!(f, "{} V{:X}", m, x),
            GetDelay { x } => write!(f, "{} V{:X}, DT", m, x),
            WaitKey { x } => write!(f, "{} V{:X}, K", m, x),
            SetDelay { x } => write!(f, "{} DT, V{:X}", m, x),
            SetSound { x } => write!(f, "{} ST, V{:X}", m, x),
            AddToAddr { x } => write!(f, "{} I, V{:X}", m, x),
            AddrOfDigit { x } => write!(f, "{} F, V{:X}", m, x),
            StoreBcd { x } => write!(f, "{} B, V{:X}", m, x),
            SaveRegs { count } => write!(f, "{} [I], V{:X}", m, count.saturating_sub(1)),
            RestoreRegs { count } => write!(f, "{} V{:X}, [I]", m, count.saturating_sub(1)),
            Unknown { hi, lo } => write!(f, "{} {:02x}{:02x}", m, hi, lo),
        }
    }
}
