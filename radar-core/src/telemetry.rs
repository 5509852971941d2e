//! Reports handed to the transport layer.
//!
//! - [`TargetReport`]: rounded per-target values plus a target count.
//! - [`PublishGate`]: lets every report with targets through, and at most one
//!   zero-target report per interval.
//! - [`HealthTelemetry`]: link counters and configuration with warnings.

use radar_proto::{FrameStats, TARGET_SLOTS};

use crate::types::{TargetSnapshot, TrackedTarget};

/// Minimum spacing of zero-target reports.
pub const ZERO_TARGET_PUBLISH_INTERVAL_MS: u64 = 1_000;

/// One target slot, rounded to whole units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TargetEntry {
    pub presence: bool,
    pub x: i32,
    pub y: i32,
    pub speed: i32,
    pub dist_raw: u16,
    #[cfg_attr(feature = "serde", serde(rename = "distance"))]
    pub distance_xy: i32,
    pub angle_deg: i32,
}

impl From<&TrackedTarget> for TargetEntry {
    fn from(t: &TrackedTarget) -> Self {
        if !t.presence {
            return Self::default();
        }
        Self {
            presence: true,
            x: round(t.x),
            y: round(t.y),
            speed: round(t.speed),
            dist_raw: t.dist_raw,
            distance_xy: round(t.distance_xy),
            angle_deg: round(t.angle_deg),
        }
    }
}

fn round(v: f32) -> i32 {
    libm::roundf(v) as i32
}

/// Snapshot of all slots ready for serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TargetReport {
    pub target_count: u8,
    pub targets: [TargetEntry; TARGET_SLOTS],
}

impl TargetReport {
    #[must_use]
    pub fn from_snapshot(snapshot: &TargetSnapshot) -> Self {
        let targets = core::array::from_fn(|i| TargetEntry::from(&snapshot[i]));
        let target_count = snapshot.iter().filter(|t| t.presence).count() as u8;
        Self {
            target_count,
            targets,
        }
    }
}

/// Rate limiter for zero-target reports.
#[derive(Debug, Clone)]
pub struct PublishGate {
    interval_ms: u64,
    last_zero_at: Option<u64>,
}

impl PublishGate {
    #[must_use]
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_zero_at: None,
        }
    }

    /// `true` if `report` should go out at `now_ms`.
    ///
    /// The first zero-target report always passes.
    pub fn should_publish(&mut self, report: &TargetReport, now_ms: u64) -> bool {
        if report.target_count > 0 {
            return true;
        }
        match self.last_zero_at {
            Some(last) if now_ms.saturating_sub(last) < self.interval_ms => false,
            _ => {
                self.last_zero_at = Some(now_ms);
                true
            }
        }
    }
}

impl Default for PublishGate {
    fn default() -> Self {
        Self::new(ZERO_TARGET_PUBLISH_INTERVAL_MS)
    }
}

/// Conditions worth flagging in a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Warning {
    /// At least one no-data timeout happened since boot.
    RadarTimeouts,
    /// No data right now.
    NoData,
}

impl Warning {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RadarTimeouts => "radar timeouts detected",
            Self::NoData => "no radar data",
        }
    }
}

impl core::fmt::Display for Warning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Link health and configuration at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct HealthTelemetry {
    /// Milliseconds since data was last seen or the link was restarted.
    pub no_data_ms: u64,
    pub timeout_count: u32,
    /// Serial restarts, manual and automatic.
    pub restart_count: u32,
    /// Smoothing weight on the previous value.
    pub alpha: f32,
    pub hold_interval_ms: u32,
    pub max_range_m: f32,
    pub gate_index: u8,
    /// `true` when the silence exceeds the no-data timeout.
    pub stale: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub frames: FrameStats,
}

impl HealthTelemetry {
    /// Active warnings, in a fixed order.
    pub fn warnings(&self) -> impl Iterator<Item = Warning> {
        let timeouts = (self.timeout_count > 0).then_some(Warning::RadarTimeouts);
        let no_data = self.stale.then_some(Warning::NoData);
        timeouts.into_iter().chain(no_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(x: f32, y: f32) -> TrackedTarget {
        let mut t = TrackedTarget {
            presence: true,
            x,
            y,
            speed: -15.5,
            dist_raw: 320,
            ..TrackedTarget::ABSENT
        };
        t.refresh_geometry();
        t
    }

    fn telemetry(timeout_count: u32, stale: bool) -> HealthTelemetry {
        HealthTelemetry {
            no_data_ms: 0,
            timeout_count,
            restart_count: 0,
            alpha: 0.4,
            hold_interval_ms: 0,
            max_range_m: 0.0,
            gate_index: 0,
            stale,
            frames: FrameStats::default(),
        }
    }

    #[test]
    fn test_report_rounds_values() {
        let snapshot = [present(-781.6, 1712.4), TrackedTarget::ABSENT, TrackedTarget::ABSENT];
        let report = TargetReport::from_snapshot(&snapshot);

        assert_eq!(report.target_count, 1);
        let t = report.targets[0];
        assert_eq!((t.x, t.y, t.speed, t.dist_raw), (-782, 1712, -16, 320));
        assert_eq!(t.distance_xy, 1882);
        assert_eq!(t.angle_deg, 115);
        assert_eq!(report.targets[1], TargetEntry::default());
    }

    #[test]
    fn test_publish_gate_targets_always_pass() {
        let mut gate = PublishGate::default();
        let report = TargetReport::from_snapshot(&[
            present(100.0, 100.0),
            TrackedTarget::ABSENT,
            TrackedTarget::ABSENT,
        ]);
        for t in 0..10 {
            assert!(gate.should_publish(&report, t));
        }
    }

    #[test]
    fn test_publish_gate_throttles_zero_reports() {
        let mut gate = PublishGate::default();
        let empty = TargetReport::default();

        assert!(gate.should_publish(&empty, 5_000));
        assert!(!gate.should_publish(&empty, 5_500));
        assert!(!gate.should_publish(&empty, 5_999));
        assert!(gate.should_publish(&empty, 6_000));
        assert!(!gate.should_publish(&empty, 6_001));
    }

    #[test]
    fn test_warnings() {
        assert_eq!(telemetry(0, false).warnings().count(), 0);

        let mut w = telemetry(2, true).warnings();
        assert_eq!(w.next(), Some(Warning::RadarTimeouts));
        assert_eq!(w.next(), Some(Warning::NoData));
        assert_eq!(w.next(), None);

        assert_eq!(
            telemetry(0, true).warnings().next().map(|w| w.as_str()),
            Some("no radar data")
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_report_json_shape() {
        let report = TargetReport::from_snapshot(&[
            TrackedTarget::ABSENT,
            present(300.0, 400.0),
            TrackedTarget::ABSENT,
        ]);
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["targetCount"], 1);
        assert_eq!(json["targets"][1]["distance"], 500);
        assert_eq!(json["targets"][1]["angleDeg"], 53);
        assert_eq!(json["targets"][0]["presence"], false);
    }
}
