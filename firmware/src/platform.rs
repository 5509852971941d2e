//! Clock and pump for the RP2040.

use embassy_rp::watchdog::Watchdog;
use embassy_time::{Duration, Instant};
use radar_core::{Clock, Pump};

/// Watchdog period. Must outlast the longest blocking command sequence.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(5);

/// Monotonic time from the Embassy time driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    #[inline]
    fn now_micros(&self) -> u64 {
        Instant::now().as_micros()
    }
}

/// Feeds the hardware watchdog while the core busy-waits.
pub struct WatchdogPump {
    watchdog: Watchdog,
}

impl WatchdogPump {
    /// Start the watchdog with [`WATCHDOG_TIMEOUT`] and wrap it.
    #[must_use]
    pub fn start(mut watchdog: Watchdog) -> Self {
        watchdog.pause_on_debug(true);
        watchdog.start(WATCHDOG_TIMEOUT);
        Self { watchdog }
    }

    #[inline]
    pub fn feed(&mut self) {
        self.watchdog.feed();
    }

    /// Reset the chip through the watchdog.
    pub fn reboot(&mut self) -> ! {
        self.watchdog.trigger_reset();
        cortex_m::peripheral::SCB::sys_reset()
    }
}

impl Pump for WatchdogPump {
    #[inline]
    fn pump(&mut self) {
        self.watchdog.feed();
    }
}
