//! Time source and cooperative waiting.
//!
//! The core never sleeps. Every wait is a loop against a deadline that calls
//! a [`Pump`] on each turn, so the caller can keep network keepalives or a
//! watchdog serviced during a command round-trip.

/// Monotonic time since an arbitrary epoch.
pub trait Clock {
    fn now_micros(&self) -> u64;

    fn now_millis(&self) -> u64 {
        self.now_micros() / 1_000
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_micros(&self) -> u64 {
        (**self).now_micros()
    }
}

/// Background work run while the core is waiting.
pub trait Pump {
    fn pump(&mut self);
}

impl<F: FnMut()> Pump for F {
    fn pump(&mut self) {
        self()
    }
}

/// A pump that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPump;

impl Pump for NoPump {
    fn pump(&mut self) {}
}

/// Deadline in microseconds, measured from when it was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: u64,
    budget: u64,
}

impl Deadline {
    #[must_use]
    pub fn after_micros<C: Clock + ?Sized>(clock: &C, micros: u64) -> Self {
        Self {
            start: clock.now_micros(),
            budget: micros,
        }
    }

    #[must_use]
    pub fn after_millis<C: Clock + ?Sized>(clock: &C, millis: u64) -> Self {
        Self::after_micros(clock, millis.saturating_mul(1_000))
    }

    #[must_use]
    pub fn expired<C: Clock + ?Sized>(&self, clock: &C) -> bool {
        clock.now_micros().saturating_sub(self.start) >= self.budget
    }
}

/// Busy-wait for `micros`, pumping on every turn.
pub fn pumped_delay_us<C, P>(clock: &C, pump: &mut P, micros: u64)
where
    C: Clock + ?Sized,
    P: Pump + ?Sized,
{
    let deadline = Deadline::after_micros(clock, micros);
    while !deadline.expired(clock) {
        pump.pump();
    }
}
