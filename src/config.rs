use std::time::Duration;

/// knobs for a run of the interpreter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// how many CHIP-8 instructions to execute per second
    pub instructions_per_second: u32,
    /// delay/sound timer rate; 60Hz on real hardware
    pub timer_hz: u32,
    /// how long a terminal key counts as held after it was last seen
    pub key_hold: Duration,
    /// skip the beeper
    pub mute: bool,
    /// fixed seed for RND, for reproducible runs
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instructions_per_second: 700,
            timer_hz: 60,
            key_hold: Duration::from_millis(150),
            mute: false,
            seed: None,
        }
    }
}

impl Config {
    /// wall-clock time one instruction should take
    pub fn instruction_period(&self) -> Duration {
        Duration::from_secs(1) / self.instructions_per_second.max(1)
    }
}
