use std::time::Duration;

/// the two CHIP-8 countdowns; both run at the same rate and stop at zero
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// count both timers down by `ticks`, never below zero
    pub fn tick(&mut self, ticks: u32) {
        let t = ticks.min(u8::MAX as u32) as u8;
        self.delay = self.delay.saturating_sub(t);
        self.sound = self.sound.saturating_sub(t);
    }
}

/// turns irregular wall-clock intervals into whole timer ticks, carrying
/// whatever is left over into the next call
#[derive(Clone, Debug)]
pub struct TimerClock {
    period: Duration,
    carried: Duration,
}

impl TimerClock {
    pub fn new(hz: u32) -> Self {
        TimerClock {
            period: Duration::from_secs(1) / hz.max(1),
            carried: Duration::ZERO,
        }
    }

    /// how many ticks `elapsed` (plus any carry) is worth
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let total = self.carried + elapsed;
        let ticks = total.as_nanos() / self.period.as_nanos();
        self.carried = total - self.period * ticks as u32;
        ticks.min(u32::MAX as u128) as u32
    }
}
