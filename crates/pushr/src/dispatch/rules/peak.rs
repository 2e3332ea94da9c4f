use chrono::{Local, NaiveDateTime, Timelike};

use super::config::RulesConfig;
use super::round_half_up;

/// Source of local wall-clock time for time-of-day pricing.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant. Used by tests, CLI overrides and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub(crate) fn is_peak_hour(hour: u32, config: &RulesConfig) -> bool {
    config.peak_windows.iter().any(|window| window.contains(hour))
}

pub(crate) fn peak_adjusted(base_price: f64, peak: bool, config: &RulesConfig) -> f64 {
    if peak {
        round_half_up(base_price * config.peak_multiplier)
    } else {
        base_price
    }
}

pub(crate) fn hour_of(clock: &dyn Clock) -> u32 {
    clock.now().hour()
}
