use std::time::{Duration, Instant};

/// Monotonic time source for elapsed-time diagnostics.
pub trait Clock {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that never advances.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock(pub Duration);

impl Clock for FixedClock {
    fn now(&self) -> Duration {
        self.0
    }
}

pub struct Stopwatch<'c, C: Clock + ?Sized> {
    clock: &'c C,
    started: Duration,
}

impl<'c, C: Clock + ?Sized> Stopwatch<'c, C> {
    pub fn start(clock: &'c C) -> Self {
        Self {
            clock,
            started: clock.now(),
        }
    }

    pub fn restart(&mut self) {
        self.started = self.clock.now();
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.clock.now().saturating_sub(self.started).as_millis()
    }
}
