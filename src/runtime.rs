//! # runtime
//!
//! Everything the interpreter needs from the world outside the cpu: the
//! screen, the keypad, the timers, randomness and the digit glyphs. The cpu
//! only ever talks to a [`Runtime`], so backends can be swapped freely.
use crate::display::{Display, FrameBuffer};
use crate::error::Result;
use crate::input::Keypad;
use crate::memory::{self, MemoryMap, CHIP8_CONTEMPORARY_FONT_ADDR, CHIP8_FONT_GLYPH_BYTES};
use crate::sound::Sound;
use crate::timer::Timers;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait Runtime {
    /// blank the screen
    fn clear(&mut self) -> Result<()>;

    /// a random byte
    fn rand(&mut self) -> u8;

    /// XOR `rows` bytes of sprite at `addr` onto the screen at (x, y);
    /// true if that switched any lit pixel off
    fn draw<M: MemoryMap>(&mut self, memory: &M, addr: u16, rows: u8, x: u8, y: u8)
        -> Result<bool>;

    /// is logical key `key` held down
    fn get_key(&mut self, key: u8) -> bool;

    /// block until a key is pressed and return it
    fn wait_key(&mut self) -> Result<u8>;

    fn delay_timer(&self) -> u8;

    fn set_delay_timer(&mut self, value: u8);

    fn set_sound_timer(&mut self, value: u8);

    /// address of the 5-byte glyph for a hex digit
    fn digit_sprite(&self, digit: u8) -> u16;

    /// hundreds, tens and ones of `value`
    fn bcd(&self, value: u8) -> [u8; 3] {
        [value / 100, value / 10 % 10, value % 10]
    }

    /// run both timers down by `ticks`; called by the host, not the cpu
    fn tick_timers(&mut self, ticks: u32);
}

/// the usual runtime: a frame buffer shown on some [`Display`], a beeper, a
/// shared [`Keypad`] and the two timers
pub struct Chip8Runtime<D: Display, S: Sound> {
    display: D,
    sound: S,
    keypad: Keypad,
    frame: FrameBuffer,
    timers: Timers,
    rng: StdRng,
    font_addr: u16,
}

impl<D: Display, S: Sound> Chip8Runtime<D, S> {
    /// set up the runtime, putting the digit glyphs into `memory`
    pub fn new(
        memory: &mut impl MemoryMap,
        display: D,
        sound: S,
        keypad: Keypad,
        seed: Option<u64>,
    ) -> Result<Self> {
        memory::install_digit_sprites(memory, CHIP8_CONTEMPORARY_FONT_ADDR)?;
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Chip8Runtime {
            display,
            sound,
            keypad,
            frame: FrameBuffer::new(),
            timers: Timers::new(),
            rng,
            font_addr: CHIP8_CONTEMPORARY_FONT_ADDR,
        })
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn timers(&self) -> Timers {
        self.timers
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn sound(&self) -> &S {
        &self.sound
    }

    fn present(&mut self) -> Result<()> {
        self.display.draw(&self.frame.to_bytes())?;
        Ok(())
    }

    fn update_sound(&mut self) {
        if let Err(e) = self.sound.follow(self.timers.sound) {
            log::warn!("sound device: {}", e);
        }
    }
}

impl<D: Display, S: Sound> Runtime for Chip8Runtime<D, S> {
    fn clear(&mut self) -> Result<()> {
        self.frame.clear();
        self.present()
    }

    fn rand(&mut self) -> u8 {
        self.rng.gen()
    }

    fn draw<M: MemoryMap>(
        &mut self,
        memory: &M,
        addr: u16,
        rows: u8,
        x: u8,
        y: u8,
    ) -> Result<bool> {
        let sprite = memory.get_ro_slice(addr, rows as usize)?;
        let collided = self.frame.blit(sprite, x, y);
        log::debug!(
            "draw {} row(s) from {:#05x} at ({}, {}), collision: {}",
            rows,
            addr,
            x,
            y,
            collided
        );
        self.present()?;
        Ok(collided)
    }

    fn get_key(&mut self, key: u8) -> bool {
        if key >= crate::input::KEY_COUNT {
            log::debug!("asked for key {:#x}, which the keypad does not have", key);
        }
        self.keypad.is_pressed(key)
    }

    fn wait_key(&mut self) -> Result<u8> {
        log::debug!("waiting for a key");
        self.keypad.wait_key()
    }

    fn delay_timer(&self) -> u8 {
        self.timers.delay
    }

    fn set_delay_timer(&mut self, value: u8) {
        self.timers.delay = value;
    }

    fn set_sound_timer(&mut self, value: u8) {
        self.timers.sound = value;
        self.update_sound();
    }

    fn digit_sprite(&self, digit: u8) -> u16 {
        self.font_addr + (digit & 0xf) as u16 * CHIP8_FONT_GLYPH_BYTES
    }

    fn tick_timers(&mut self, ticks: u32) {
        if ticks == 0 {
            return;
        }
        self.timers.tick(ticks);
        self.update_sound();
    }
}
