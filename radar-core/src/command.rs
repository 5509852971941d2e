//! Command channel to the sensor.
//!
//! [`SensorCommandChannel`] owns the serial port. A parameter change runs the
//! full sequence every time:
//!
//! ```text
//! drain → Open → delay → Set → delay → Close → delay → wait for ACK
//! ```
//!
//! Acknowledgements for Open and Close may arrive before the one for Set; they
//! are skipped quietly. Any other unexpected code is logged and skipped.

use core::fmt::Write as _;

use heapless::String;
use radar_proto::{AckParser, Command, CMD_SET_PARAMETER};

use crate::clock::{pumped_delay_us, Clock, Deadline, Pump};
use crate::types::RadarConfig;
use crate::uart::{RadarUart, UartError};

/// Capacity of an acknowledgement message.
pub const ACK_MESSAGE_LEN: usize = 64;

/// Human-readable acknowledgement text.
pub type AckMessage = String<ACK_MESSAGE_LEN>;

/// Result of a command sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandOutcome {
    pub ok: bool,
    pub message: AckMessage,
}

impl CommandOutcome {
    /// Build an outcome from formatted text, truncating on overflow.
    #[must_use]
    pub fn new(ok: bool, args: core::fmt::Arguments<'_>) -> Self {
        let mut message = AckMessage::new();
        // Overflow only truncates the text.
        let _ = message.write_fmt(args);
        Self { ok, message }
    }

    #[must_use]
    pub fn from_text(ok: bool, text: &str) -> Self {
        Self::new(ok, format_args!("{}", text))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.message.as_str()
    }
}

/// Serial port plus everything needed to talk to the sensor on it.
pub struct SensorCommandChannel<U, C, P> {
    uart: U,
    clock: C,
    pump: P,
    config: RadarConfig,
    parser: AckParser,
}

impl<U: RadarUart, C: Clock, P: Pump> SensorCommandChannel<U, C, P> {
    pub fn new(uart: U, clock: C, pump: P, config: RadarConfig) -> Self {
        Self {
            uart,
            clock,
            pump,
            config,
            parser: AckParser::new(),
        }
    }

    /// Set the farthest reporting gate to `ceil(meters / 0.7)`, at most 15.
    pub fn set_max_range(&mut self, meters: f32) -> CommandOutcome {
        let gate = radar_proto::range_to_gate(meters);
        if self.write_parameter(Command::max_range_gate(gate)) {
            CommandOutcome::new(true, format_args!("setRange→OK: {:.2}m", meters))
        } else {
            CommandOutcome::from_text(false, "setRange→ERROR")
        }
    }

    /// Set how long the sensor keeps reporting a vanished target.
    pub fn set_hold_interval(&mut self, ms: u32) -> CommandOutcome {
        if self.write_parameter(Command::hold_interval(ms)) {
            CommandOutcome::new(true, format_args!("setHold→OK: {}ms", ms))
        } else {
            CommandOutcome::from_text(false, "setHold→ERROR")
        }
    }

    /// Switch the sensor to multi-target reporting. No acknowledgement is awaited.
    pub fn enable_multi_target(&mut self) -> Result<(), UartError> {
        self.send(Command::MultiTargetMode)
    }

    /// Run Open, Set, Close and wait for the Set acknowledgement.
    ///
    /// `set` is sent as given; it should be a [`Command::SetParameter`].
    pub fn write_parameter(&mut self, set: Command) -> bool {
        self.uart.drain();
        self.parser.reset();

        let delay = u64::from(self.config.inter_command_delay_us);
        for command in [Command::Open, set, Command::Close] {
            if let Err(e) = self.send(command) {
                warn!("command {:#x} not sent: {}", command.code(), e);
                return false;
            }
            self.delay_us(delay);
        }

        self.read_ack(CMD_SET_PARAMETER, self.config.ack_timeout_ms)
    }

    /// Write one encoded command.
    pub fn send(&mut self, command: Command) -> Result<(), UartError> {
        self.uart.write_all(command.frame().as_bytes())
    }

    /// Wait up to `timeout_ms` for the acknowledgement of `expected`.
    ///
    /// Returns `true` only for a matching acknowledgement with status 0.
    pub fn read_ack(&mut self, expected: u16, timeout_ms: u32) -> bool {
        let deadline = Deadline::after_millis(&self.clock, u64::from(timeout_ms));
        let mask = self.config.ack_mask_low_byte;
        let mut byte = [0u8; 1];

        while !deadline.expired(&self.clock) {
            self.pump.pump();

            match self.uart.read(&mut byte) {
                Ok(1) => {}
                Ok(_) => continue,
                Err(e) => {
                    trace!("uart error while waiting for ack: {}", e);
                    continue;
                }
            }

            let ack = match self.parser.push_byte(byte[0]) {
                Ok(Some(ack)) => ack,
                Ok(None) => continue,
                Err(e) => {
                    trace!("discarding ack: {}", e);
                    continue;
                }
            };

            if ack.matches(expected, mask) {
                if !ack.is_success() {
                    warn!(
                        "radar ack {:#x} status={}",
                        ack.command, ack.status
                    );
                }
                return ack.is_success();
            }
            if ack.is_open_close_ack() {
                trace!("skipping open/close ack {:#x}", ack.command);
                continue;
            }
            warn!(
                "radar ack unexpected cmd={:#x} expecting {:#x}",
                ack.command, expected
            );
        }

        debug!("ack {:#x} timed out after {} ms", expected, timeout_ms);
        false
    }

    /// Discard pending input.
    pub fn drain(&mut self) {
        self.uart.drain();
        self.parser.reset();
    }

    /// Close and reopen the port at the configured baud rate, settling after
    /// each step.
    pub fn reopen(&mut self) -> Result<(), UartError> {
        let settle = u64::from(self.config.serial_settle_ms) * 1_000;
        self.uart.close();
        self.delay_us(settle);
        let opened = self.uart.open(self.config.baud);
        self.delay_us(settle);
        opened
    }

    /// Busy-wait, pumping.
    pub fn delay_us(&mut self, micros: u64) {
        pumped_delay_us(&self.clock, &mut self.pump, micros);
    }

    #[inline]
    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    #[inline]
    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    /// Get a reference to the serial port.
    pub fn uart(&self) -> &U {
        &self.uart
    }

    /// Get a mutable reference to the serial port.
    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    /// Get a reference to the clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Get a mutable reference to the pump.
    pub fn pump_mut(&mut self) -> &mut P {
        &mut self.pump
    }

    /// Decompose the channel into its port, clock and pump.
    pub fn into_parts(self) -> (U, C, P) {
        (self.uart, self.clock, self.pump)
    }
}
