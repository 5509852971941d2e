//! RD-03D radar tracker for RP2040.
//!
//! This crate wires [`radar_core`] to the RP2040: the radar sits on a
//! buffered UART, control commands arrive as text lines on a second UART,
//! and target reports are logged over RTT.
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | UART0 TX | 0    | Control replies |
//! | UART0 RX | 1    | Control commands |
//! | UART1 TX | 4    | To radar RX (256000 baud) |
//! | UART1 RX | 5    | From radar TX |
//! | LED      | 25   | On-board LED (toggles on each report) |
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime with three tasks:
//!
//! - **Radar Task**: Polls the radar, runs control commands and liveness
//!   checks, signals target reports
//! - **Control Task**: Reads command lines and forwards them to the radar task
//! - **Report Task**: Waits for report signals and publishes them
//!
//! Command sequences to the sensor block the radar task for up to a few
//! hundred milliseconds; the watchdog is fed throughout.
//!
//! # Modules
//!
//! - [`radar_uart`]: [`RadarUart`](radar_core::RadarUart) over `embedded-io` ([`IoUart`])
//! - [`platform`]: Clock and watchdog pump ([`EmbassyClock`], [`WatchdogPump`])
//! - [`control_input`]: Control line reader and reply writer ([`ControlInput`], [`ControlOutput`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

pub use radar_core::{
    CommandOutcome, ControlCommand, HealthAction, HealthTelemetry, PublishGate, Radar,
    RadarConfig, SmoothingConfig, TargetReport,
};

pub mod control_input;
pub mod platform;
pub mod radar_uart;

pub use control_input::{ControlInput, ControlInputError, ControlOutput};
pub use platform::{EmbassyClock, WatchdogPump, WATCHDOG_TIMEOUT};
pub use radar_uart::IoUart;
