//! Platform-agnostic radar tracking, sensor commands and link health.
//!
//! This crate turns the raw byte stream of an RD-03D radar into smoothed
//! target state, reconfigures the sensor at runtime and watches the link.
//! It has no platform dependencies and runs in `no_std` firmware and in host
//! tests alike.
//!
//! # Overview
//!
//! - [`types`]: Tracked targets and configuration ([`TrackedTarget`], [`SmoothingConfig`], [`RadarConfig`])
//! - [`tracker`]: Smoothing and hold filter ([`TargetTracker`])
//! - [`uart`]: Serial port trait ([`RadarUart`])
//! - [`clock`]: Time source and cooperative waits ([`Clock`], [`Pump`])
//! - [`command`]: Command/ACK exchange ([`SensorCommandChannel`])
//! - [`health`]: Liveness escalation ([`ConnectionHealthMonitor`])
//! - [`control`]: Text control commands ([`ControlCommand`])
//! - [`telemetry`]: Reports for the transport layer ([`TargetReport`], [`HealthTelemetry`])
//! - [`radar`]: Context object tying it all together ([`Radar`])
//!
//! # Example
//!
//! ```rust
//! use radar_core::{NoPump, Radar, RadarConfig, RadarUart, SmoothingConfig, UartError, Clock};
//!
//! struct Loopback(Vec<u8>);
//!
//! impl RadarUart for Loopback {
//!     fn read(&mut self, buf: &mut [u8]) -> Result<usize, UartError> {
//!         let n = buf.len().min(self.0.len());
//!         buf[..n].copy_from_slice(&self.0[..n]);
//!         self.0.drain(..n);
//!         Ok(n)
//!     }
//!     fn write_all(&mut self, _bytes: &[u8]) -> Result<(), UartError> { Ok(()) }
//!     fn available(&mut self) -> bool { !self.0.is_empty() }
//!     fn close(&mut self) {}
//!     fn open(&mut self, _baud: u32) -> Result<(), UartError> { Ok(()) }
//! }
//!
//! struct Frozen;
//!
//! impl Clock for Frozen {
//!     fn now_micros(&self) -> u64 { 42_000 }
//! }
//!
//! let frame = radar_proto::DataFrame::from_observations(&[
//!     Some(radar_proto::TargetObservation::new(300, 400, 0, 500)),
//!     None,
//!     None,
//! ]);
//! let uart = Loopback(frame.as_bytes().to_vec());
//! let mut radar = Radar::new(uart, Frozen, NoPump, RadarConfig::default(), SmoothingConfig::default());
//!
//! let targets = radar.poll().unwrap();
//! assert!(targets[0].presence);
//! assert_eq!(targets[0].distance_xy, 500.0);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support and the [`mock`] platform
//! - **`defmt`**: Enable defmt formatting and logging (for embedded)
//! - **`log`**: Route diagnostics through the `log` facade
//! - **`serde`**: Derive `Serialize` for reports and telemetry
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// Must come first so the logging macros are visible to the other modules.
mod fmt;

pub mod clock;
pub mod command;
pub mod control;
pub mod health;
#[cfg(any(test, feature = "std"))]
pub mod mock;
pub mod radar;
pub mod telemetry;
pub mod tracker;
pub mod types;
pub mod uart;

// Re-export main types at crate root
pub use clock::{pumped_delay_us, Clock, Deadline, NoPump, Pump};
pub use command::{AckMessage, CommandOutcome, SensorCommandChannel};
pub use control::{ControlCommand, ControlError, MAX_COMMAND_LEN};
pub use health::{ConnectionHealthMonitor, HealthAction, HealthState};
pub use radar::Radar;
pub use telemetry::{HealthTelemetry, PublishGate, TargetEntry, TargetReport, Warning};
pub use tracker::TargetTracker;
pub use types::{RadarConfig, SmoothingConfig, TargetSnapshot, TrackedTarget};
pub use uart::{RadarUart, UartError};
