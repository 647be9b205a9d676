use std::io;
use thiserror::Error;

/// Everything that can stop the machine. Unknown opcodes are deliberately
/// absent: they are logged and skipped by the interpreter.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("memory access of {len} byte(s) at {addr:#05x} is out of bounds")]
    OutOfBounds { addr: usize, len: usize },

    #[error("call stack overflow at {pc:#05x}")]
    StackOverflow { pc: u16 },

    #[error("return with empty call stack at {pc:#05x}")]
    StackUnderflow { pc: u16 },

    #[error("key wait cancelled")]
    Cancelled,

    #[error("no such key: {0:#x}")]
    InvalidKey(u8),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("fault at {pc:#05x}: {source}")]
    Fault {
        pc: u16,
        #[source]
        source: Box<Chip8Error>,
    },
}

impl Chip8Error {
    /// wrap an error with the address of the instruction that raised it
    pub fn at(self, pc: u16) -> Self {
        match self {
            // already pinned to an instruction
            Chip8Error::Fault { .. } => self,
            other => Chip8Error::Fault {
                pc,
                source: Box::new(other),
            },
        }
    }

    /// the error underneath any fault wrapper
    pub fn root(&self) -> &Chip8Error {
        match self {
            Chip8Error::Fault { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Chip8Error>;
