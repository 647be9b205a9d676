/// # interpreter
///
/// The CHIP-8 virtual machine as the programmer sees it:
///  V0-VF  sixteen 8-bit registers; VF is clobbered as a flag by the
///         arithmetic ops and DRW
///  I      16-bit address register (12 bits are meaningful)
///  PC     program counter, starts at 0x200
///  stack  sixteen return addresses, with SP counting how many are in use
///
/// on the COSMAC VIP the stack lived in RAM just below the work area; here
/// it is part of the cpu so that overflow can be reported instead of
/// trampling memory.
use crate::config::Config;
use crate::decoder;
use crate::error::{Chip8Error, Result};
use crate::instruction::Instruction;
use crate::memory::{Chip8MemoryMap, MemoryMap, CHIP8_PROGRAM_ADDR};
use crate::runtime::Runtime;
use crate::timer::TimerClock;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// nesting limit for CALL
pub const STACK_DEPTH: usize = 16;

/// VF
pub const FLAG: usize = 0xf;

/// register file plus the fetch/execute logic
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cpu {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    stack: [u16; STACK_DEPTH],
    sp: usize,
}

impl Cpu {
    pub fn new(pc: u16) -> Self {
        Cpu {
            v: [0; 16],
            i: 0,
            pc,
            stack: [0; STACK_DEPTH],
            sp: 0,
        }
    }

    /// return addresses currently on the stack, oldest first
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.sp]
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    /// Fetch, decode and execute one instruction. On error the pc is left
    /// on the faulting instruction and the error says where that was.
    pub fn step<M: MemoryMap, R: Runtime>(
        &mut self,
        memory: &mut M,
        runtime: &mut R,
    ) -> Result<Instruction> {
        let pc = self.pc;
        let fetched = decoder::fetch_and_decode(memory, &mut self.pc).map_err(|e| e.at(pc))?;
        log::trace!("{}", fetched);
        let instr = fetched.instr;
        if let Err(e) = self.execute(instr, memory, runtime) {
            self.pc = pc;
            return Err(e.at(pc));
        }
        Ok(instr)
    }

    /// Apply one instruction. Expects the pc to already point past it, as
    /// [`Cpu::step`] leaves it.
    pub fn execute<M: MemoryMap, R: Runtime>(
        &mut self,
        instr: Instruction,
        memory: &mut M,
        runtime: &mut R,
    ) -> Result<()> {
        use Instruction::*;
        let this = self.pc.wrapping_sub(2);

        match instr {
            ClearScreen => runtime.clear()?,
            Return => {
                if self.sp == 0 {
                    return Err(Chip8Error::StackUnderflow { pc: this });
                }
                self.sp -= 1;
                self.pc = self.stack[self.sp];
            }
            Sys { .. } => {}
            Jump { addr } => self.pc = addr,
            Call { addr } => {
                if self.sp == STACK_DEPTH {
                    return Err(Chip8Error::StackOverflow { pc: this });
                }
                self.stack[self.sp] = self.pc;
                self.sp += 1;
                self.pc = addr;
            }
            SkipEqImm { x, byte } => self.skip_if(self.reg(x) == byte),
            SkipNeqImm { x, byte } => self.skip_if(self.reg(x) != byte),
            SkipEqReg { x, y } => self.skip_if(self.reg(x) == self.reg(y)),
            SkipNeqReg { x, y } => self.skip_if(self.reg(x) != self.reg(y)),
            LoadImm { x, byte } => self.set_reg(x, byte),
            AddImm { x, byte } => self.set_reg(x, self.reg(x).wrapping_add(byte)),
            Move { x, y } => self.set_reg(x, self.reg(y)),
            Or { x, y } => self.set_reg(x, self.reg(x) | self.reg(y)),
            And { x, y } => self.set_reg(x, self.reg(x) & self.reg(y)),
            Xor { x, y } => self.set_reg(x, self.reg(x) ^ self.reg(y)),
            Add { x, y } => {
                let (sum, carry) = self.reg(x).overflowing_add(self.reg(y));
                self.set_flagged(x, sum, carry as u8);
            }
            Sub { x, y } => {
                let (a, b) = (self.reg(x), self.reg(y));
                self.set_flagged(x, a.wrapping_sub(b), (a > b) as u8);
            }
            ShiftRight { x, .. } => {
                let a = self.reg(x);
                self.set_flagged(x, a >> 1, a & 1);
            }
            SubN { x, y } => {
                let (a, b) = (self.reg(x), self.reg(y));
                self.set_flagged(x, b.wrapping_sub(a), (b > a) as u8);
            }
            ShiftLeft { x, .. } => {
                let a = self.reg(x);
                self.set_flagged(x, a << 1, a >> 7);
            }
            LoadAddr { addr } => self.i = addr,
            JumpOffset { addr } => self.pc = self.v[0] as u16 + addr,
            RandomMask { x, byte } => self.set_reg(x, runtime.rand() & byte),
            Draw { x, y, height } => {
                let collided = runtime.draw(&*memory, self.i, height, self.reg(x), self.reg(y))?;
                self.v[FLAG] = collided as u8;
            }
            SkipIfPressed { x } => {
                let pressed = runtime.get_key(self.reg(x));
                self.skip_if(pressed);
            }
            SkipIfNotPressed { x } => {
                let pressed = runtime.get_key(self.reg(x));
                self.skip_if(!pressed);
            }
            GetDelay { x } => self.set_reg(x, runtime.delay_timer()),
            WaitKey { x } => {
                let key = runtime.wait_key()?;
                self.set_reg(x, key);
            }
            SetDelay { x } => runtime.set_delay_timer(self.reg(x)),
            SetSound { x } => runtime.set_sound_timer(self.reg(x)),
            AddToAddr { x } => self.i = self.i.wrapping_add(self.reg(x) as u16),
            AddrOfDigit { x } => self.i = runtime.digit_sprite(self.reg(x)),
            StoreBcd { x } => memory.write(self.i, &runtime.bcd(self.reg(x)))?,
            SaveRegs { count } => {
                let n = (count as usize).min(self.v.len());
                memory.write(self.i, &self.v[..n])?;
            }
            RestoreRegs { count } => {
                let n = (count as usize).min(self.v.len());
                memory.read(self.i, &mut self.v[..n])?;
            }
            Unknown { hi, lo } => {
                log::warn!("ignoring unknown instruction {:02x}{:02x} at {:#05x}", hi, lo, this);
            }
        }
        Ok(())
    }

    fn reg(&self, x: u8) -> u8 {
        self.v[(x & 0xf) as usize]
    }

    fn set_reg(&mut self, x: u8, value: u8) {
        self.v[(x & 0xf) as usize] = value;
    }

    /// VF first, so when x is VF the result is what sticks
    fn set_flagged(&mut self, x: u8, value: u8, flag: u8) {
        self.v[FLAG] = flag;
        self.set_reg(x, value);
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.pc = self.pc.wrapping_add(2);
        }
    }
}

/// memory, cpu and runtime together, plus a paced main loop
pub struct Chip8Interpreter<R: Runtime> {
    memory: Chip8MemoryMap,
    cpu: Cpu,
    runtime: R,
}

impl<R: Runtime> Chip8Interpreter<R> {
    /// `build` makes the runtime against the fresh memory, so it can put its
    /// glyphs in place
    pub fn new(build: impl FnOnce(&mut Chip8MemoryMap) -> Result<R>) -> Result<Self> {
        let mut memory = Chip8MemoryMap::new();
        let runtime = build(&mut memory)?;
        Ok(Chip8Interpreter {
            memory,
            cpu: Cpu::new(CHIP8_PROGRAM_ADDR),
            runtime,
        })
    }

    /// load a chip8 program
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize> {
        let len = self.memory.load_program(reader)?;
        log::info!(
            "loaded {} byte program at {:#05x}",
            len,
            self.memory.program_addr
        );
        Ok(len)
    }

    pub fn step(&mut self) -> Result<Instruction> {
        self.cpu.step(&mut self.memory, &mut self.runtime)
    }

    /// Run until `running` is cleared, a key wait is cancelled, or the
    /// program faults. Timers are run down from wall-clock time between
    /// instructions.
    pub fn main_loop(&mut self, config: &Config, running: &AtomicBool) -> Result<()> {
        let period = config.instruction_period();
        let mut clock = TimerClock::new(config.timer_hz);
        let mut last = Instant::now();
        log::info!(
            "running at {} instructions/s from {:#05x}",
            config.instructions_per_second,
            self.cpu.pc
        );

        while running.load(Ordering::Acquire) {
            let started = Instant::now();
            match self.step() {
                Ok(_) => {}
                Err(e) if matches!(e.root(), Chip8Error::Cancelled) => {
                    log::info!("key wait cancelled");
                    break;
                }
                Err(e) => {
                    log::error!("{}", e);
                    return Err(e);
                }
            }

            let now = Instant::now();
            self.runtime.tick_timers(clock.advance(now - last));
            last = now;

            if let Some(rest) = period.checked_sub(started.elapsed()) {
                spin_sleep::sleep(rest);
            }
        }

        log::info!("stopped at {:#05x}", self.cpu.pc);
        Ok(())
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Chip8MemoryMap {
        &mut self.memory
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::input::Keypad;
    use crate::runtime::Chip8Runtime;
    use crate::sound::{Mute, Sound};
    use std::thread;
    use std::time::Duration;

    type TestRuntime = Chip8Runtime<DummyDisplay, Mute>;

    struct Rig {
        cpu: Cpu,
        mem: Chip8MemoryMap,
        rt: TestRuntime,
        keypad: Keypad,
    }

    impl Rig {
        fn new(prog: &[u8]) -> Rig {
            let mut mem = Chip8MemoryMap::new();
            let keypad = Keypad::new();
            let rt = Chip8Runtime::new(
                &mut mem,
                DummyDisplay::new(),
                Mute::new(),
                keypad.clone(),
                Some(7),
            )
            .unwrap();
            mem.write(CHIP8_PROGRAM_ADDR, prog).unwrap();
            Rig {
                cpu: Cpu::new(CHIP8_PROGRAM_ADDR),
                mem,
                rt,
                keypad,
            }
        }

        fn step(&mut self) -> Result<Instruction> {
            self.cpu.step(&mut self.mem, &mut self.rt)
        }

        fn run(&mut self, n: usize) -> Result<()> {
            for _ in 0..n {
                self.step()?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_program_load_ok() -> Result<()> {
        let mut i = Chip8Interpreter::new(|m| {
            Chip8Runtime::new(m, DummyDisplay::new(), Mute::new(), Keypad::new(), None)
        })?;
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        assert_eq!(i.load_program(&mut prog)?, 2);
        assert_eq!(i.step()?, Instruction::ClearScreen);
        assert_eq!(i.cpu().pc, 0x202);
        Ok(())
    }

    #[test]
    fn test_add_overflow_sets_flag() -> Result<()> {
        let mut r = Rig::new(&[0x80, 0x14]);
        r.cpu.v[0] = 0xff;
        r.cpu.v[1] = 0x01;
        r.step()?;
        assert_eq!(r.cpu.v[0], 0x00);
        assert_eq!(r.cpu.v[FLAG], 1);
        Ok(())
    }

    #[test]
    fn test_add_without_carry_clears_flag() -> Result<()> {
        let mut r = Rig::new(&[0x80, 0x14]);
        r.cpu.v[0] = 0x10;
        r.cpu.v[1] = 0x20;
        r.cpu.v[FLAG] = 1;
        r.step()?;
        assert_eq!(r.cpu.v[0], 0x30);
        assert_eq!(r.cpu.v[FLAG], 0);
        Ok(())
    }

    #[test]
    fn test_sub_borrow() -> Result<()> {
        let mut r = Rig::new(&[0x80, 0x15]);
        r.cpu.v[0] = 0x01;
        r.cpu.v[1] = 0x02;
        r.step()?;
        assert_eq!(r.cpu.v[0], 0xff);
        assert_eq!(r.cpu.v[FLAG], 0);
        Ok(())
    }

    #[test]
    fn test_sub_equal_is_not_greater() -> Result<()> {
        let mut r = Rig::new(&[0x80, 0x15]);
        r.cpu.v[0] = 0x05;
        r.cpu.v[1] = 0x05;
        r.step()?;
        assert_eq!(r.cpu.v[0], 0);
        assert_eq!(r.cpu.v[FLAG], 0);
        Ok(())
    }

    #[test]
    fn test_subn() -> Result<()> {
        let mut r = Rig::new(&[0x80, 0x17, 0x82, 0x37]);
        r.cpu.v[0] = 0x01;
        r.cpu.v[1] = 0x03;
        r.cpu.v[2] = 0x03;
        r.cpu.v[3] = 0x01;
        r.step()?;
        assert_eq!((r.cpu.v[0], r.cpu.v[FLAG]), (0x02, 1));
        r.step()?;
        assert_eq!((r.cpu.v[2], r.cpu.v[FLAG]), (0xfe, 0));
        Ok(())
    }

    #[test]
    fn test_shifts_use_pre_shift_bit() -> Result<()> {
        let mut r = Rig::new(&[0x80, 0x0e, 0x81, 0x06]);
        r.cpu.v[0] = 0b1000_0001;
        r.cpu.v[1] = 0b0000_0011;
        r.step()?;
        assert_eq!((r.cpu.v[0], r.cpu.v[FLAG]), (0b0000_0010, 1));
        r.step()?;
        assert_eq!((r.cpu.v[1], r.cpu.v[FLAG]), (0b0000_0001, 1));
        Ok(())
    }

    #[test]
    fn test_flag_register_as_destination_keeps_result() -> Result<()> {
        // ADD VF, V1 with carry: the sum is what survives
        let mut r = Rig::new(&[0x8f, 0x14]);
        r.cpu.v[FLAG] = 0xff;
        r.cpu.v[1] = 0x02;
        r.step()?;
        assert_eq!(r.cpu.v[FLAG], 0x01);
        Ok(())
    }

    #[test]
    fn test_logic_ops() -> Result<()> {
        let mut r = Rig::new(&[0x80, 0x11, 0x82, 0x32, 0x84, 0x13, 0x86, 0x50]);
        r.cpu.v = [0xf0, 0x0f, 0xf0, 0x3c, 0xff, 0x0f, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        r.run(4)?;
        assert_eq!(r.cpu.v[0], 0xff);
        assert_eq!(r.cpu.v[2], 0x30);
        assert_eq!(r.cpu.v[4], 0xf0);
        assert_eq!(r.cpu.v[6], 0x0f);
        Ok(())
    }

    #[test]
    fn test_load_and_add_immediate_wraps() -> Result<()> {
        let mut r = Rig::new(&[0x6a, 0xfe, 0x7a, 0x03]);
        r.cpu.v[FLAG] = 0x55;
        r.run(2)?;
        assert_eq!(r.cpu.v[0xa], 0x01);
        // 7xkk leaves the flag alone
        assert_eq!(r.cpu.v[FLAG], 0x55);
        Ok(())
    }

    #[test]
    fn test_skips() -> Result<()> {
        // taken: pc moves 4; not taken: pc moves 2
        let cases: [(&[u8], [u8; 2], u16); 8] = [
            (&[0x30, 0x05], [5, 0], 0x204),
            (&[0x30, 0x06], [5, 0], 0x202),
            (&[0x40, 0x06], [5, 0], 0x204),
            (&[0x40, 0x05], [5, 0], 0x202),
            (&[0x50, 0x10], [5, 5], 0x204),
            (&[0x50, 0x10], [5, 6], 0x202),
            (&[0x90, 0x10], [5, 6], 0x204),
            (&[0x90, 0x10], [5, 5], 0x202),
        ];
        for (prog, [v0, v1], pc) in cases {
            let mut r = Rig::new(prog);
            r.cpu.v[0] = v0;
            r.cpu.v[1] = v1;
            r.step()?;
            assert_eq!(r.cpu.pc, pc, "{:02x?}", prog);
        }
        Ok(())
    }

    #[test]
    fn test_key_skips() -> Result<()> {
        let mut r = Rig::new(&[0xe0, 0x9e, 0x00, 0x00, 0xe0, 0xa1]);
        r.cpu.v[0] = 0x7;
        r.keypad.press(0x7)?;
        r.step()?;
        assert_eq!(r.cpu.pc, 0x204);
        r.keypad.release(0x7)?;
        r.step()?;
        assert_eq!(r.cpu.pc, 0x208);
        Ok(())
    }

    #[test]
    fn test_jumps() -> Result<()> {
        let mut r = Rig::new(&[0x13, 0x00]);
        r.step()?;
        assert_eq!(r.cpu.pc, 0x300);

        let mut r = Rig::new(&[0xb3, 0x00]);
        r.cpu.v[0] = 0x12;
        r.step()?;
        assert_eq!(r.cpu.pc, 0x312);
        Ok(())
    }

    #[test]
    fn test_call_then_return() -> Result<()> {
        // 200: CALL 206; 202: ...; 206: RET
        let mut r = Rig::new(&[0x22, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0xee]);
        r.step()?;
        assert_eq!(r.cpu.pc, 0x206);
        assert_eq!(r.cpu.stack(), &[0x202]);
        r.step()?;
        assert_eq!(r.cpu.pc, 0x202);
        assert_eq!(r.cpu.sp(), 0);
        Ok(())
    }

    #[test]
    fn test_return_on_empty_stack() {
        let mut r = Rig::new(&[0x00, 0xee]);
        let err = r.step().unwrap_err();
        assert!(matches!(
            err,
            Chip8Error::Fault { pc: 0x200, .. }
        ));
        assert!(matches!(err.root(), Chip8Error::StackUnderflow { pc: 0x200 }));
        assert_eq!(r.cpu.pc, 0x200);
    }

    #[test]
    fn test_call_overflow_on_seventeenth() -> Result<()> {
        // CALL 200 forever
        let mut r = Rig::new(&[0x22, 0x00]);
        r.run(STACK_DEPTH)?;
        assert_eq!(r.cpu.sp(), STACK_DEPTH);
        let err = r.step().unwrap_err();
        assert!(matches!(err.root(), Chip8Error::StackOverflow { pc: 0x200 }));
        assert_eq!(r.cpu.sp(), STACK_DEPTH);
        Ok(())
    }

    #[test]
    fn test_sys_is_noop() -> Result<()> {
        let mut r = Rig::new(&[0x01, 0x23]);
        let before = r.cpu.clone();
        r.step()?;
        assert_eq!(r.cpu.pc, 0x202);
        assert_eq!(r.cpu.v, before.v);
        Ok(())
    }

    #[test]
    fn test_unknown_is_skipped() -> Result<()> {
        let mut r = Rig::new(&[0x80, 0x19, 0x60, 0x01]);
        assert_eq!(r.step()?, Instruction::Unknown { hi: 0x80, lo: 0x19 });
        assert_eq!(r.cpu.pc, 0x202);
        r.step()?;
        assert_eq!(r.cpu.v[0], 1);
        Ok(())
    }

    #[test]
    fn test_address_register_ops() -> Result<()> {
        let mut r = Rig::new(&[0xa1, 0x23, 0xf0, 0x1e, 0xf1, 0x29]);
        r.cpu.v[0] = 0x10;
        r.cpu.v[1] = 0x0a;
        r.step()?;
        assert_eq!(r.cpu.i, 0x123);
        r.step()?;
        assert_eq!(r.cpu.i, 0x133);
        r.step()?;
        assert_eq!(r.cpu.i, r.rt.digit_sprite(0xa));
        Ok(())
    }

    #[test]
    fn test_random_is_masked() -> Result<()> {
        let mut r = Rig::new(&[0xc0, 0x0f, 0xc1, 0x00]);
        r.run(2)?;
        assert_eq!(r.cpu.v[0] & 0xf0, 0);
        assert_eq!(r.cpu.v[1], 0);
        Ok(())
    }

    #[test]
    fn test_draw_twice_collides() -> Result<()> {
        // I = glyph 0; DRW V0, V1, 5 twice
        let mut r = Rig::new(&[0xf2, 0x29, 0xd0, 0x15, 0xd0, 0x15]);
        r.cpu.v[0] = 62;
        r.cpu.v[1] = 30;
        r.run(2)?;
        assert_eq!(r.cpu.v[FLAG], 0);
        assert!(r.rt.frame().pixel(62, 30));
        // wrapped onto the left edge and the top row
        assert!(r.rt.frame().pixel(1, 0));
        r.step()?;
        assert_eq!(r.cpu.v[FLAG], 1);
        assert!(!r.rt.frame().pixel(62, 30));
        Ok(())
    }

    #[test]
    fn test_timers() -> Result<()> {
        let mut r = Rig::new(&[0xf0, 0x15, 0xf1, 0x18, 0xf2, 0x07]);
        r.cpu.v[0] = 30;
        r.cpu.v[1] = 4;
        r.run(2)?;
        assert!(r.rt.sound().is_beeping());
        r.rt.tick_timers(10);
        r.step()?;
        assert_eq!(r.cpu.v[2], 20);
        assert!(!r.rt.sound().is_beeping());
        Ok(())
    }

    #[test]
    fn test_store_bcd() -> Result<()> {
        let mut r = Rig::new(&[0xa3, 0x00, 0xf5, 0x33]);
        r.cpu.v[5] = 254;
        r.run(2)?;
        assert_eq!(r.mem.get_ro_slice(0x300, 3)?, &[2, 5, 4]);
        Ok(())
    }

    #[test]
    fn test_save_restore_regs() -> Result<()> {
        // I = 300; save V0-V3; clobber; restore V0-V3
        let mut r = Rig::new(&[0xa3, 0x00, 0xf3, 0x55, 0xf3, 0x65]);
        r.cpu.v[..5].copy_from_slice(&[1, 2, 3, 4, 5]);
        r.run(2)?;
        assert_eq!(r.mem.get_ro_slice(0x300, 5)?, &[1, 2, 3, 4, 0]);
        assert_eq!(r.cpu.i, 0x300);
        r.cpu.v = [0xaa; 16];
        r.step()?;
        assert_eq!(r.cpu.v[..5], [1, 2, 3, 4, 0xaa]);
        Ok(())
    }

    #[test]
    fn test_save_regs_out_of_bounds() {
        let mut r = Rig::new(&[0xaf, 0xfa, 0xff, 0x55]);
        r.step().unwrap();
        let err = r.step().unwrap_err();
        assert!(matches!(
            err.root(),
            Chip8Error::OutOfBounds { addr: 0xffa, len: 16 }
        ));
        assert_eq!(r.cpu.pc, 0x202);
    }

    #[test]
    fn test_running_off_the_end() {
        let mut r = Rig::new(&[]);
        r.cpu.pc = 0xffe;
        // 0000 decodes as SYS and is harmless; the next fetch is not
        r.step().unwrap();
        assert!(matches!(
            r.step().unwrap_err(),
            Chip8Error::Fault { pc: 0x1000, .. }
        ));
    }

    #[test]
    fn test_wait_key() -> Result<()> {
        let mut r = Rig::new(&[0xf4, 0x0a]);
        let keypad = r.keypad.clone();
        let presser = thread::spawn(move || {
            for _ in 0..100 {
                thread::sleep(Duration::from_millis(5));
                keypad.press(0xc).unwrap();
            }
        });
        r.step()?;
        assert_eq!(r.cpu.v[4], 0xc);
        assert_eq!(r.cpu.pc, 0x202);
        presser.join().unwrap();
        Ok(())
    }

    #[test]
    fn test_wait_key_cancelled_leaves_pc() {
        let mut r = Rig::new(&[0xf4, 0x0a]);
        r.keypad.cancel();
        let err = r.step().unwrap_err();
        assert!(matches!(err.root(), Chip8Error::Cancelled));
        assert_eq!(r.cpu.pc, 0x200);
    }

    #[test]
    fn test_main_loop_stops_on_cancel() -> Result<()> {
        let keypad = Keypad::new();
        let pad = keypad.clone();
        let mut i = Chip8Interpreter::new(move |m| {
            Chip8Runtime::new(m, DummyDisplay::new(), Mute::new(), pad, Some(0))
        })?;
        // LD V0, 1; LD V1, K
        i.load_program(&mut &[0x60u8, 0x01, 0xf1, 0x0a][..])?;
        keypad.cancel();
        let running = AtomicBool::new(true);
        i.main_loop(&Config::default(), &running)?;
        assert_eq!(i.cpu().v[0], 1);
        assert_eq!(i.cpu().pc, 0x202);
        Ok(())
    }

    #[test]
    fn test_main_loop_reports_fault() -> Result<()> {
        let mut i = Chip8Interpreter::new(|m| {
            Chip8Runtime::new(m, DummyDisplay::new(), Mute::new(), Keypad::new(), Some(0))
        })?;
        i.load_program(&mut &[0x00u8, 0xee][..])?;
        let running = AtomicBool::new(true);
        let err = i.main_loop(&Config::default(), &running).unwrap_err();
        assert!(matches!(err, Chip8Error::Fault { pc: 0x200, .. }));
        Ok(())
    }

    #[test]
    fn test_main_loop_not_running() -> Result<()> {
        let mut i = Chip8Interpreter::new(|m| {
            Chip8Runtime::new(m, DummyDisplay::new(), Mute::new(), Keypad::new(), Some(0))
        })?;
        let running = AtomicBool::new(false);
        i.main_loop(&Config::default(), &running)?;
        assert_eq!(i.cpu().pc, 0x200);
        Ok(())
    }
}
