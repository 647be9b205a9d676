use crate::error::{Chip8Error, Result};
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// the COSMAC VIP hex keypad has sixteen keys
pub const KEY_COUNT: u8 = 16;

/// map of the left-hand side of a qwerty keyboard onto the keypad
///   1 2 3 C      1 2 3 4
///   4 5 6 D  <-  q w e r
///   7 8 9 E      a s d f
///   A 0 B F      z x c v
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// Key state shared between whatever produces key events and the thread
/// running the interpreter. Clones are handles onto the same keypad.
#[derive(Clone, Default)]
pub struct Keypad {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    /// bit n set while key n is held
    pressed: AtomicU16,
    latch: Mutex<Latch>,
    signal: Condvar,
}

#[derive(Default)]
struct Latch {
    last: Option<u8>,
    cancelled: bool,
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// key goes down; also wakes anyone in [`Keypad::wait_key`]
    pub fn press(&self, key: u8) -> Result<()> {
        let bit = Self::bit(key)?;
        self.shared.pressed.fetch_or(bit, Ordering::AcqRel);
        let mut latch = self.latch();
        latch.last = Some(key);
        self.shared.signal.notify_all();
        Ok(())
    }

    pub fn release(&self, key: u8) -> Result<()> {
        let bit = Self::bit(key)?;
        self.shared.pressed.fetch_and(!bit, Ordering::AcqRel);
        Ok(())
    }

    /// anything outside the keypad is never pressed
    pub fn is_pressed(&self, key: u8) -> bool {
        match Self::bit(key) {
            Ok(bit) => self.shared.pressed.load(Ordering::Acquire) & bit != 0,
            Err(_) => false,
        }
    }

    pub fn last_key(&self) -> Option<u8> {
        self.latch().last
    }

    /// Block until a key is pressed after this call starts. Fails with
    /// [`Chip8Error::Cancelled`] once [`Keypad::cancel`] has been called.
    pub fn wait_key(&self) -> Result<u8> {
        let mut latch = self.latch();
        // only a fresh press counts
        latch.last = None;
        loop {
            if latch.cancelled {
                return Err(Chip8Error::Cancelled);
            }
            if let Some(key) = latch.last {
                return Ok(key);
            }
            latch = self
                .shared
                .signal
                .wait(latch)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// give up on any current and future waits
    pub fn cancel(&self) {
        let mut latch = self.latch();
        latch.cancelled = true;
        self.shared.signal.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.latch().cancelled
    }

    fn bit(key: u8) -> Result<u16> {
        if key < KEY_COUNT {
            Ok(1 << key)
        } else {
            Err(Chip8Error::InvalidKey(key))
        }
    }

    fn latch(&self) -> MutexGuard<'_, Latch> {
        self.shared
            .latch
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

/// reads keypresses from somewhere and puts them on the keypad
pub trait Input {
    /// wait up to `timeout` for events and apply them to `keypad`; returns
    /// false once the user has asked to quit
    fn pump(&mut self, keypad: &Keypad, timeout: Duration) -> Result<bool>;
}

/// keyboard input from the terminal, via crossterm
///
/// terminals only report key-down, so a key counts as held until it has
/// gone `hold` without repeating
pub struct TermInput {
    keymap: HashMap<char, u8>,
    held_since: [Option<Instant>; KEY_COUNT as usize],
    hold: Duration,
}

impl TermInput {
    pub fn new(hold: Duration) -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            held_since: [None; KEY_COUNT as usize],
            hold,
        })
    }

    fn release_stale(&mut self, keypad: &Keypad, now: Instant) -> Result<()> {
        for (key, since) in self.held_since.iter_mut().enumerate() {
            if let Some(t) = since {
                if now.duration_since(*t) >= self.hold {
                    keypad.release(key as u8)?;
                    *since = None;
                }
            }
        }
        Ok(())
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TermInput {
    fn pump(&mut self, keypad: &Keypad, timeout: Duration) -> Result<bool> {
        let mut wait = timeout;
        while poll(wait)? {
            wait = Duration::ZERO;
            if let Event::Key(evt) = read()? {
                match evt.code {
                    KeyCode::Esc => return Ok(false),
                    KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(false)
                    }
                    KeyCode::Char(c) => match self.keymap.get(&c.to_ascii_lowercase()) {
                        Some(&key) => {
                            keypad.press(key)?;
                            self.held_since[key as usize] = Some(Instant::now());
                        }
                        None => log::debug!("can't map {:?} to a COSMAC key", c),
                    },
                    other => log::debug!("ignoring key event {:?}", other),
                }
            }
        }
        self.release_stale(keypad, Instant::now())?;
        Ok(true)
    }
}

/// dummy Input implementation for testing: presses one queued key per pump,
/// then reports that it has nothing more to say
pub struct DummyInput {
    keys: VecDeque<u8>,
}

impl DummyInput {
    pub fn new(keys: &[u8]) -> Self {
        DummyInput {
            keys: keys.iter().copied().collect(),
        }
    }
}

impl Input for DummyInput {
    fn pump(&mut self, keypad: &Keypad, _timeout: Duration) -> Result<bool> {
        match self.keys.pop_front() {
            Some(key) => {
                keypad.press(key)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
