use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use chip8::display::{MonoTermDisplay, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use chip8::input::{Input, Keypad, TermInput};
use chip8::sound::{Mute, SimpleBeep, Sound};
use chip8::{Chip8Interpreter, Chip8Runtime, Config};

/// Run a CHIP-8 program in the terminal. Keys are 1234/qwer/asdf/zxcv, Esc quits.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// raw CHIP-8 program, loaded at 0x200
    rom: PathBuf,

    /// instructions executed per second
    #[arg(long, default_value_t = 700)]
    ips: u32,

    /// no beeping
    #[arg(short, long)]
    mute: bool,

    /// seed for the random number generator
    #[arg(long)]
    seed: Option<u64>,

    /// write a log here; RUST_LOG sets the level
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // the display owns the terminal, so logging only ever goes to a file
    if let Some(path) = &args.log {
        let file = File::create(path)?;
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    }

    let config = Config {
        instructions_per_second: args.ips,
        mute: args.mute,
        seed: args.seed,
        ..Config::default()
    };

    let result = if config.mute {
        run(&args, &config, Mute::new())
    } else {
        run(&args, &config, SimpleBeep::new())
    };

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..(DISPLAY_HEIGHT / 2) {
        println!();
    }
    result
}

fn run<S: Sound>(args: &Args, config: &Config, sound: S) -> Result<(), Box<dyn Error>> {
    let mut rom = File::open(&args.rom)?;

    let keypad = Keypad::new();
    let running = Arc::new(AtomicBool::new(true));

    let mut input = TermInput::new(config.key_hold)?;
    let display = MonoTermDisplay::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)?;

    let pad = keypad.clone();
    let seed = config.seed;
    let mut interpreter =
        Chip8Interpreter::new(move |m| Chip8Runtime::new(m, display, sound, pad, seed))?;
    interpreter.load_program(&mut rom)?;

    // key events arrive on their own thread so that a blocking key wait in
    // the interpreter can still be woken or cancelled
    let input_thread = {
        let keypad = keypad.clone();
        let running = Arc::clone(&running);
        thread::spawn(move || -> chip8::Result<()> {
            let result = pump_keys(&mut input, &keypad, &running);
            running.store(false, Ordering::Release);
            keypad.cancel();
            result
        })
    };

    let outcome = interpreter.main_loop(config, &running);
    running.store(false, Ordering::Release);
    keypad.cancel();

    let input = input_thread.join();
    drop(interpreter);
    settle(outcome, input)?;
    Ok(())
}

/// An interpreter fault carries the faulting pc, so it is what gets reported;
/// an input failure alongside it is only logged.
fn settle(
    outcome: chip8::Result<()>,
    input: thread::Result<chip8::Result<()>>,
) -> chip8::Result<()> {
    match (outcome, input) {
        (Err(fault), input) => {
            match input {
                Ok(Err(e)) => log::error!("input also failed: {}", e),
                Err(_) => log::error!("input thread panicked"),
                Ok(Ok(())) => {}
            }
            Err(fault)
        }
        (Ok(()), Ok(r)) => r,
        (Ok(()), Err(_)) => {
            log::error!("input thread panicked");
            Ok(())
        }
    }
}

/// feed the keypad until the user quits or the interpreter stops
fn pump_keys(input: &mut impl Input, keypad: &Keypad, running: &AtomicBool) -> chip8::Result<()> {
    while running.load(Ordering::Acquire) {
        if !input.pump(keypad, Duration::from_millis(10))? {
            log::info!("quit requested");
            break;
        }
    }
    Ok(())
}
