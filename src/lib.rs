//! A CHIP-8 interpreter.
//!
//! ## Design
//!
//! * the cpu knows nothing about screens, keyboards or clocks; everything it
//!   needs from outside goes through the [`runtime::Runtime`] trait
//! * abstract display so can plug alternatives; starting with TUI in-console
//! * instructions run as fast as asked for then sleep, and the 60Hz timers
//!   are run down from however much wall-clock time actually went by
//! * faults (bad memory access, stack over/underflow) come back as errors
//!   with the offending address instead of taking the process down
//!
//! Model
//!
//! ```text
//! main
//!  |-- display, sound, keypad, config
//!  |-- input thread(keypad)          -- key events -> keypad
//!  |-- interpreter
//!  |    |-- memory map
//!  |    |-- runtime(display, sound, keypad, timers, memory)
//!  |    `-- cpu
//!  `-- main loop
//!       |-- instr = decode(fetch(memory, pc))
//!       |-- cpu.execute(instr, memory, runtime)
//!       |-- runtime.tick_timers(ticks since last time)
//!       `-- sleep(whatever is left of this instruction's slot)
//! ```
pub mod config;
pub mod decoder;
pub mod display;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod runtime;
pub mod sound;
pub mod timer;

pub use config::Config;
pub use error::{Chip8Error, Result};
pub use instruction::Instruction;
pub use interpreter::{Chip8Interpreter, Cpu};
pub use runtime::{Chip8Runtime, Runtime};
