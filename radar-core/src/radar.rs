//! Radar: owns the serial link and runs the whole receive pipeline.
//!
//! ```text
//! UART → FrameAccumulator → decode → TargetTracker → TargetSnapshot
//! ```
//!
//! The same object drives configuration commands and liveness checks on the
//! same port, so the two can never interleave.

use radar_proto::{decode, FrameAccumulator};

use crate::clock::{Clock, Pump};
use crate::command::{CommandOutcome, SensorCommandChannel};
use crate::control::ControlCommand;
use crate::health::{ConnectionHealthMonitor, HealthAction};
use crate::telemetry::HealthTelemetry;
use crate::tracker::TargetTracker;
use crate::types::{RadarConfig, SmoothingConfig, TargetSnapshot, MAX_READ_PER_POLL};
use crate::uart::RadarUart;

/// Bytes pulled from the UART per read call.
const READ_CHUNK: usize = 32;

/// The radar context object.
pub struct Radar<U, C, P> {
    channel: SensorCommandChannel<U, C, P>,
    accumulator: FrameAccumulator,
    tracker: TargetTracker,
    health: ConnectionHealthMonitor,
    restart_count: u32,
}

impl<U: RadarUart, C: Clock, P: Pump> Radar<U, C, P> {
    /// Create a radar over an already opened UART.
    ///
    /// No command is sent; call [`configure`](Self::configure) to push the
    /// configuration to the sensor.
    pub fn new(uart: U, clock: C, pump: P, config: RadarConfig, smoothing: SmoothingConfig) -> Self {
        let now = clock.now_millis();
        Self {
            health: ConnectionHealthMonitor::new(
                now,
                config.no_data_timeout_ms,
                config.restart_timeout_ms,
            ),
            channel: SensorCommandChannel::new(uart, clock, pump, config),
            accumulator: FrameAccumulator::new(),
            tracker: TargetTracker::new(smoothing),
            restart_count: 0,
        }
    }

    /// Send the configured range and hold interval and enable multi-target mode.
    pub fn configure(&mut self) -> (CommandOutcome, CommandOutcome) {
        let config = *self.tracker.config();
        let range = self.channel.set_max_range(config.max_range_m);
        let hold = self.channel.set_hold_interval(config.hold_interval_ms);
        if let Err(e) = self.channel.enable_multi_target() {
            warn!("multi-target command not sent: {}", e);
        }
        (range, hold)
    }

    /// Read up to [`MAX_READ_PER_POLL`] bytes and run them through the pipeline.
    ///
    /// Returns the tracked targets if at least one frame was processed.
    pub fn poll(&mut self) -> Option<TargetSnapshot> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut consumed = 0;
        let mut updated = false;

        while consumed < MAX_READ_PER_POLL && self.channel.uart_mut().available() {
            let want = READ_CHUNK.min(MAX_READ_PER_POLL - consumed);
            let n = match self.channel.uart_mut().read(&mut chunk[..want]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    debug!("uart read error: {}", e);
                    break;
                }
            };
            consumed += n;

            for &byte in &chunk[..n] {
                updated |= self.feed(byte);
            }
        }

        updated.then(|| *self.tracker.targets())
    }

    fn feed(&mut self, byte: u8) -> bool {
        let valid_before = self.accumulator.stats().valid;
        let frame = self.accumulator.feed(byte);

        if self.accumulator.stats().valid == valid_before {
            return false;
        }

        let now = self.channel.now_millis();
        self.health.data_received(now);
        match frame {
            Some(frame) => {
                self.tracker.update(&decode(&frame), now);
                true
            }
            None => {
                // Suppressed repeat: the same targets are still in view.
                if let Some(last) = self.accumulator.last_frame() {
                    self.tracker.touch(&decode(last), now);
                }
                false
            }
        }
    }

    /// Run the liveness check, restarting the serial link if it has gone quiet.
    ///
    /// [`HealthAction::Reboot`] is returned to the caller, who owns the device.
    pub fn check_connection(&mut self) -> HealthAction {
        let now = self.channel.now_millis();
        let action = self.health.check(now);
        match action {
            HealthAction::RestartSerial => {
                warn!(
                    "no radar data for {} ms, restarting serial",
                    self.health.no_data_elapsed(now)
                );
                self.restart_serial();
                let done = self.channel.now_millis();
                self.health.restart_completed(done);
            }
            HealthAction::Reboot => {
                error!("no radar data after serial restart, reboot required");
            }
            HealthAction::None => {}
        }
        action
    }

    /// Manually restart the serial link.
    pub fn reset_sensor(&mut self) -> CommandOutcome {
        self.restart_serial();
        CommandOutcome::from_text(true, "resetRadar→OK")
    }

    fn restart_serial(&mut self) {
        info!("restarting radar serial");
        self.restart_count = self.restart_count.wrapping_add(1);

        self.channel.drain();
        self.accumulator.reset();
        if let Err(e) = self.channel.reopen() {
            error!("reopening radar uart failed: {}", e);
        }

        let range = self.tracker.config().max_range_m;
        let outcome = self.channel.set_max_range(range);
        if !outcome.ok {
            warn!("range not confirmed after restart");
        }
        if let Err(e) = self.channel.enable_multi_target() {
            warn!("multi-target command not sent: {}", e);
        }

        let now = self.channel.now_millis();
        self.health.touch(now);
        info!("radar serial restarted");
    }

    /// Store and send a new maximum range.
    pub fn set_max_range(&mut self, meters: f32) -> CommandOutcome {
        self.tracker.set_max_range(meters);
        self.channel.set_max_range(meters)
    }

    /// Store and send a new hold interval.
    pub fn set_hold_interval(&mut self, ms: u32) -> CommandOutcome {
        self.tracker.set_hold_interval(ms);
        self.channel.set_hold_interval(ms)
    }

    /// Run a control command.
    ///
    /// Commands that do not involve the sensor only produce their
    /// acknowledgement; acting on them is up to the caller.
    pub fn execute(&mut self, command: ControlCommand) -> CommandOutcome {
        match command {
            ControlCommand::SetRange(m) => self.set_max_range(m),
            ControlCommand::SetHold(ms) => self.set_hold_interval(ms),
            ControlCommand::ResetRadar => self.reset_sensor(),
            ControlCommand::Config | ControlCommand::Reboot | ControlCommand::GetStatus => {
                CommandOutcome::from_text(true, command.immediate_ack().unwrap_or_default())
            }
        }
    }

    /// Current link health and configuration.
    pub fn telemetry(&self) -> HealthTelemetry {
        let now = self.channel.now_millis();
        let config = self.tracker.config();
        HealthTelemetry {
            no_data_ms: self.health.no_data_elapsed(now),
            timeout_count: self.health.timeout_count(),
            restart_count: self.restart_count,
            alpha: config.alpha,
            hold_interval_ms: config.hold_interval_ms,
            max_range_m: config.max_range_m,
            gate_index: config.gate_index(),
            stale: self.health.is_stale(now),
            frames: self.accumulator.stats(),
        }
    }

    #[inline]
    pub fn targets(&self) -> &TargetSnapshot {
        self.tracker.targets()
    }

    #[inline]
    pub fn smoothing(&self) -> &SmoothingConfig {
        self.tracker.config()
    }

    #[inline]
    pub fn health(&self) -> &ConnectionHealthMonitor {
        &self.health
    }

    #[inline]
    pub fn restart_count(&self) -> u32 {
        self.restart_count
    }

    /// Get a reference to the command channel.
    pub fn channel(&self) -> &SensorCommandChannel<U, C, P> {
        &self.channel
    }

    /// Get a mutable reference to the command channel.
    pub fn channel_mut(&mut self) -> &mut SensorCommandChannel<U, C, P> {
        &mut self.channel
    }

    /// Get a reference to the UART.
    pub fn uart(&self) -> &U {
        self.channel.uart()
    }

    /// Get a mutable reference to the UART.
    pub fn uart_mut(&mut self) -> &mut U {
        self.channel.uart_mut()
    }

    /// Decompose the radar into its UART, clock and pump.
    pub fn into_parts(self) -> (U, C, P) {
        self.channel.into_parts()
    }
}
