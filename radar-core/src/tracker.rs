//! Per-slot smoothing and hold.
//!
//! Each slot moves between three states on every processed frame:
//!
//! - **Fresh**: observed while absent. The observation is copied verbatim.
//! - **Tracked**: observed while present. `x`, `y` and `speed` follow an
//!   exponential moving average; geometry is recomputed from the smoothed
//!   position.
//! - **Held**: not observed, but seen within the hold interval. The slot keeps
//!   its last smoothed values.
//!
//! Once the hold interval has elapsed the slot is reset to
//! [`TrackedTarget::ABSENT`].

use radar_proto::{TargetObservation, TARGET_SLOTS};

use crate::types::{SmoothingConfig, TargetSnapshot, TrackedTarget};

/// Smoothing filter over the three target slots.
#[derive(Debug, Clone)]
pub struct TargetTracker {
    targets: TargetSnapshot,
    config: SmoothingConfig,
}

impl TargetTracker {
    #[must_use]
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            targets: [TrackedTarget::ABSENT; TARGET_SLOTS],
            config,
        }
    }

    /// Current state of all slots.
    #[inline]
    #[must_use]
    pub fn targets(&self) -> &TargetSnapshot {
        &self.targets
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    pub fn set_hold_interval(&mut self, ms: u32) {
        self.config.hold_interval_ms = ms;
    }

    pub fn set_max_range(&mut self, meters: f32) {
        self.config.max_range_m = meters;
    }

    /// Number of slots currently present.
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.targets.iter().filter(|t| t.presence).count()
    }

    /// Fold one decoded frame observed at `now_ms` into the slots.
    pub fn update(&mut self, observations: &[Option<TargetObservation>; TARGET_SLOTS], now_ms: u64) {
        let alpha = self.config.alpha;
        let hold = u64::from(self.config.hold_interval_ms);

        for (slot, observation) in self.targets.iter_mut().zip(observations) {
            match observation {
                Some(obs) if slot.presence => {
                    slot.x = alpha * slot.x + (1.0 - alpha) * f32::from(obs.x);
                    slot.y = alpha * slot.y + (1.0 - alpha) * f32::from(obs.y);
                    slot.speed = alpha * slot.speed + (1.0 - alpha) * f32::from(obs.speed);
                    slot.dist_raw = obs.dist_raw;
                    slot.refresh_geometry();
                    slot.last_seen_at = now_ms;
                }
                Some(obs) => {
                    *slot = TrackedTarget {
                        presence: true,
                        x: f32::from(obs.x),
                        y: f32::from(obs.y),
                        speed: f32::from(obs.speed),
                        dist_raw: obs.dist_raw,
                        distance_xy: obs.distance_xy(),
                        angle_deg: obs.angle_deg(),
                        last_seen_at: now_ms,
                    };
                }
                None if slot.presence && now_ms.saturating_sub(slot.last_seen_at) <= hold => {}
                None => *slot = TrackedTarget::ABSENT,
            }
        }
    }

    /// Refresh `last_seen_at` of present slots that `observations` still
    /// reports, without smoothing.
    ///
    /// Used for repeated frames that the duplicate filter suppressed: the
    /// target is still there, so its hold window restarts at `now_ms`.
    pub fn touch(&mut self, observations: &[Option<TargetObservation>; TARGET_SLOTS], now_ms: u64) {
        for (slot, observation) in self.targets.iter_mut().zip(observations) {
            if slot.presence && observation.is_some() {
                slot.last_seen_at = now_ms;
            }
        }
    }

    /// Drop all slots back to absent.
    pub fn clear(&mut self) {
        self.targets = [TrackedTarget::ABSENT; TARGET_SLOTS];
    }
}

impl Default for TargetTracker {
    fn default() -> Self {
        Self::new(SmoothingConfig::default())
    }
}
