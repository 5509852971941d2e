//! Tracked target state and runtime configuration.

use radar_proto::command::{range_to_gate, RANGE_GATE_SIZE_M};
use radar_proto::target;
use radar_proto::TARGET_SLOTS;

/// Weight of the previous smoothed value in the moving average.
pub const ALPHA: f32 = 0.4;

/// Default sensor range in meters.
pub const DEFAULT_MAX_RANGE_M: f32 = 2.1;

/// Default hold interval in milliseconds.
pub const DEFAULT_HOLD_INTERVAL_MS: u32 = 500;

/// Largest accepted hold interval in milliseconds.
pub const MAX_HOLD_INTERVAL_MS: u32 = 10_000;

/// Accepted range is `MIN_RANGE_M < m <= MAX_RANGE_M`.
pub const MIN_RANGE_M: f32 = 0.5;

/// Largest accepted range in meters.
pub const MAX_RANGE_M: f32 = 15.0;

/// Fixed sensor baud rate.
pub const RADAR_BAUD: u32 = 256_000;

/// Delay between Open, Set and Close, in microseconds.
pub const INTER_COMMAND_DELAY_US: u32 = 50_000;

/// How long to wait for a command acknowledgement.
pub const ACK_TIMEOUT_MS: u32 = 200;

/// Silence after which the serial link is restarted.
pub const NO_DATA_TIMEOUT_MS: u64 = 3_000;

/// Silence after a serial restart before the device is rebooted.
pub const RESTART_TIMEOUT_MS: u64 = 30_000;

/// Pause after closing and after reopening the UART.
pub const SERIAL_SETTLE_MS: u32 = 100;

/// Bytes consumed by a single poll.
pub const MAX_READ_PER_POLL: usize = 256;

/// One smoothed target slot.
///
/// `presence == false` implies every numeric field is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackedTarget {
    pub presence: bool,
    /// Smoothed lateral position in mm.
    pub x: f32,
    /// Smoothed forward position in mm.
    pub y: f32,
    /// Smoothed radial speed.
    pub speed: f32,
    /// Sensor distance of the latest observation, unsmoothed.
    pub dist_raw: u16,
    /// Distance computed from the smoothed position.
    pub distance_xy: f32,
    /// Bearing computed from the smoothed position, in degrees.
    pub angle_deg: f32,
    pub(crate) last_seen_at: u64,
}

impl TrackedTarget {
    /// The absent, all-zero slot.
    pub const ABSENT: Self = Self {
        presence: false,
        x: 0.0,
        y: 0.0,
        speed: 0.0,
        dist_raw: 0,
        distance_xy: 0.0,
        angle_deg: 0.0,
        last_seen_at: 0,
    };

    /// Time in ms of the last observation that landed in this slot.
    #[inline]
    #[must_use]
    pub fn last_seen_at(&self) -> u64 {
        self.last_seen_at
    }

    /// Recompute the derived geometry from `x` and `y`.
    pub(crate) fn refresh_geometry(&mut self) {
        self.distance_xy = target::distance_xy(self.x, self.y);
        self.angle_deg = target::angle_deg(self.x, self.y);
    }
}

/// Published state of all three slots.
pub type TargetSnapshot = [TrackedTarget; TARGET_SLOTS];

/// Smoothing and hold parameters, plus the range the sensor is set to.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SmoothingConfig {
    pub alpha: f32,
    pub hold_interval_ms: u32,
    pub max_range_m: f32,
}

impl SmoothingConfig {
    /// Gate index the sensor is configured with for `max_range_m`.
    #[must_use]
    pub fn gate_index(&self) -> u8 {
        range_to_gate(self.max_range_m)
    }

    /// Upper edge of the configured gate, in meters.
    #[must_use]
    pub fn gate_range_m(&self) -> f32 {
        self.gate_index() as f32 * RANGE_GATE_SIZE_M
    }

    #[must_use]
    pub fn is_valid_range(meters: f32) -> bool {
        meters > MIN_RANGE_M && meters <= MAX_RANGE_M
    }

    #[must_use]
    pub fn is_valid_hold(ms: u32) -> bool {
        ms <= MAX_HOLD_INTERVAL_MS
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: ALPHA,
            hold_interval_ms: DEFAULT_HOLD_INTERVAL_MS,
            max_range_m: DEFAULT_MAX_RANGE_M,
        }
    }
}

/// Link timing and protocol options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadarConfig {
    pub baud: u32,
    pub inter_command_delay_us: u32,
    pub ack_timeout_ms: u32,
    pub no_data_timeout_ms: u64,
    pub restart_timeout_ms: u64,
    pub serial_settle_ms: u32,
    /// Accept acknowledgements whose code matches only in the low byte.
    pub ack_mask_low_byte: bool,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            baud: RADAR_BAUD,
            inter_command_delay_us: INTER_COMMAND_DELAY_US,
            ack_timeout_ms: ACK_TIMEOUT_MS,
            no_data_timeout_ms: NO_DATA_TIMEOUT_MS,
            restart_timeout_ms: RESTART_TIMEOUT_MS,
            serial_settle_ms: SERIAL_SETTLE_MS,
            ack_mask_low_byte: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gate() {
        let config = SmoothingConfig::default();
        assert_eq!(config.gate_index(), 3);
        assert!(libm::fabsf(config.gate_range_m() - 2.1) < 1e-5);
    }

    #[test]
    fn test_range_bounds() {
        assert!(!SmoothingConfig::is_valid_range(0.5));
        assert!(SmoothingConfig::is_valid_range(0.51));
        assert!(SmoothingConfig::is_valid_range(15.0));
        assert!(!SmoothingConfig::is_valid_range(15.01));
        assert!(!SmoothingConfig::is_valid_range(f32::NAN));
    }

    #[test]
    fn test_hold_bounds() {
        assert!(SmoothingConfig::is_valid_hold(0));
        assert!(SmoothingConfig::is_valid_hold(10_000));
        assert!(!SmoothingConfig::is_valid_hold(10_001));
    }

    #[test]
    fn test_absent_is_default() {
        assert_eq!(TrackedTarget::ABSENT, TrackedTarget::default());
    }
}
