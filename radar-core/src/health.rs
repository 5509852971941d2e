//! Data liveness watchdog.
//!
//! Two tiers: after [`RadarConfig::no_data_timeout_ms`] of silence the serial
//! link is restarted; if still nothing arrives within
//! [`RadarConfig::restart_timeout_ms`] of that restart, a device reboot is
//! requested, once. Any data frame returns the monitor to
//! [`HealthState::Healthy`].
//!
//! [`RadarConfig::no_data_timeout_ms`]: crate::RadarConfig::no_data_timeout_ms
//! [`RadarConfig::restart_timeout_ms`]: crate::RadarConfig::restart_timeout_ms

/// Escalation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HealthState {
    Healthy,
    /// A serial restart completed at `since` ms and no data has arrived since.
    RestartAttempted { since: u64 },
}

/// What the owner of the link has to do after a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HealthAction {
    None,
    /// Restart the serial link, then report back with
    /// [`ConnectionHealthMonitor::restart_completed`].
    RestartSerial,
    /// Reboot the device. Signalled once per outage.
    Reboot,
}

/// Liveness state machine. Pure: time comes in as arguments.
#[derive(Debug, Clone)]
pub struct ConnectionHealthMonitor {
    state: HealthState,
    last_data_at: u64,
    timeout_count: u32,
    reboot_signalled: bool,
    no_data_timeout_ms: u64,
    restart_timeout_ms: u64,
}

impl ConnectionHealthMonitor {
    /// Start healthy, as if data was last seen at `now_ms`.
    #[must_use]
    pub const fn new(now_ms: u64, no_data_timeout_ms: u64, restart_timeout_ms: u64) -> Self {
        Self {
            state: HealthState::Healthy,
            last_data_at: now_ms,
            timeout_count: 0,
            reboot_signalled: false,
            no_data_timeout_ms,
            restart_timeout_ms,
        }
    }

    /// A valid data frame arrived.
    pub fn data_received(&mut self, now_ms: u64) {
        if self.state != HealthState::Healthy {
            info!("radar data back after serial restart");
        }
        self.state = HealthState::Healthy;
        self.reboot_signalled = false;
        self.last_data_at = now_ms;
    }

    /// Decide what to do at `now_ms`.
    pub fn check(&mut self, now_ms: u64) -> HealthAction {
        match self.state {
            HealthState::Healthy => {
                if now_ms.saturating_sub(self.last_data_at) > self.no_data_timeout_ms {
                    self.timeout_count = self.timeout_count.saturating_add(1);
                    self.state = HealthState::RestartAttempted { since: now_ms };
                    HealthAction::RestartSerial
                } else {
                    HealthAction::None
                }
            }
            HealthState::RestartAttempted { since } => {
                if !self.reboot_signalled
                    && now_ms.saturating_sub(since) > self.restart_timeout_ms
                {
                    self.reboot_signalled = true;
                    HealthAction::Reboot
                } else {
                    HealthAction::None
                }
            }
        }
    }

    /// The serial restart requested by [`check`](Self::check) finished at `now_ms`.
    pub fn restart_completed(&mut self, now_ms: u64) {
        if let HealthState::RestartAttempted { .. } = self.state {
            self.state = HealthState::RestartAttempted { since: now_ms };
        }
        self.last_data_at = now_ms;
    }

    /// Reset the silence timer without touching the escalation state.
    ///
    /// Used after a manual serial restart.
    pub fn touch(&mut self, now_ms: u64) {
        self.last_data_at = now_ms;
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> HealthState {
        self.state
    }

    /// Number of no-data timeouts seen.
    #[inline]
    #[must_use]
    pub fn timeout_count(&self) -> u32 {
        self.timeout_count
    }

    #[inline]
    #[must_use]
    pub fn last_data_at(&self) -> u64 {
        self.last_data_at
    }

    /// Milliseconds since data was last seen or the link was last restarted.
    #[must_use]
    pub fn no_data_elapsed(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_data_at)
    }

    #[must_use]
    pub fn is_stale(&self, now_ms: u64) -> bool {
        self.no_data_elapsed(now_ms) > self.no_data_timeout_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NO_DATA_TIMEOUT_MS, RESTART_TIMEOUT_MS};

    fn monitor() -> ConnectionHealthMonitor {
        ConnectionHealthMonitor::new(0, NO_DATA_TIMEOUT_MS, RESTART_TIMEOUT_MS)
    }

    #[test]
    fn test_quiet_within_timeout() {
        let mut m = monitor();
        assert_eq!(m.check(1_000), HealthAction::None);
        assert_eq!(m.check(3_000), HealthAction::None);
        assert_eq!(m.state(), HealthState::Healthy);
    }

    #[test]
    fn test_single_restart_then_single_reboot() {
        let mut m = monitor();
        assert_eq!(m.check(3_001), HealthAction::RestartSerial);
        m.restart_completed(3_500);
        assert_eq!(m.state(), HealthState::RestartAttempted { since: 3_500 });
        assert_eq!(m.timeout_count(), 1);

        // No second restart while waiting.
        for t in (3_600..=33_500).step_by(100) {
            assert_eq!(m.check(t), HealthAction::None, "at {t}");
        }

        assert_eq!(m.check(33_501), HealthAction::Reboot);
        assert_eq!(m.check(33_600), HealthAction::None);
        assert_eq!(m.check(90_000), HealthAction::None);
        assert_eq!(m.timeout_count(), 1);
    }

    #[test]
    fn test_data_returns_to_healthy() {
        let mut m = monitor();
        assert_eq!(m.check(4_000), HealthAction::RestartSerial);
        m.restart_completed(4_200);

        m.data_received(5_000);
        assert_eq!(m.state(), HealthState::Healthy);
        assert_eq!(m.check(40_000), HealthAction::RestartSerial);
        assert_eq!(m.timeout_count(), 2);
    }

    #[test]
    fn test_data_keeps_link_healthy() {
        let mut m = monitor();
        for t in (0..20_000).step_by(1_000) {
            m.data_received(t);
            assert_eq!(m.check(t + 999), HealthAction::None);
        }
        assert_eq!(m.timeout_count(), 0);
    }

    #[test]
    fn test_touch_resets_silence_only() {
        let mut m = monitor();
        m.touch(2_500);
        assert_eq!(m.check(5_000), HealthAction::None);
        assert_eq!(m.no_data_elapsed(5_000), 2_500);
        assert!(!m.is_stale(5_500));
        assert!(m.is_stale(5_501));
    }
}
