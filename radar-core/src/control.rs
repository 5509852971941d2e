//! Text control commands.
//!
//! ```text
//! config | reboot | resetRadar | getStatus | setRange:<meters> | setHold:<ms>
//! ```
//!
//! Input is trimmed and capped at [`MAX_COMMAND_LEN`] bytes. Range and hold
//! values are validated here, before anything reaches the sensor.

use crate::types::SmoothingConfig;

/// Longest accepted command.
pub const MAX_COMMAND_LEN: usize = 128;

const SET_RANGE_PREFIX: &str = "setRange:";
const SET_HOLD_PREFIX: &str = "setHold:";

/// A parsed, validated control command.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlCommand {
    /// Open the configuration portal.
    Config,
    /// Reboot the device.
    Reboot,
    /// Restart the serial link to the sensor.
    ResetRadar,
    /// Publish a status report.
    GetStatus,
    /// Set the maximum range in meters, `0.5 < m <= 15`.
    SetRange(f32),
    /// Set the hold interval in ms, `0..=10000`.
    SetHold(u32),
}

/// Rejected control input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    /// Nothing left after trimming.
    Empty,
    /// Input longer than [`MAX_COMMAND_LEN`].
    TooLong(usize),
    InvalidRange,
    InvalidHold,
    Unknown,
}

impl core::fmt::Display for ControlError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::TooLong(len) => write!(f, "command too long: {len}"),
            Self::InvalidRange => write!(f, "setRange ERROR: invalid value"),
            Self::InvalidHold => write!(f, "setHold ERROR: invalid value"),
            Self::Unknown => write!(f, "unknown command"),
        }
    }
}

impl ControlCommand {
    /// Parse one command.
    pub fn parse(input: &str) -> Result<Self, ControlError> {
        if input.len() > MAX_COMMAND_LEN {
            return Err(ControlError::TooLong(input.len()));
        }
        let cmd = input.trim();
        if cmd.is_empty() {
            return Err(ControlError::Empty);
        }

        if let Some(arg) = cmd.strip_prefix(SET_RANGE_PREFIX) {
            return arg
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|&m| SmoothingConfig::is_valid_range(m))
                .map(Self::SetRange)
                .ok_or(ControlError::InvalidRange);
        }
        if let Some(arg) = cmd.strip_prefix(SET_HOLD_PREFIX) {
            return arg
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|&ms| SmoothingConfig::is_valid_hold(ms))
                .map(Self::SetHold)
                .ok_or(ControlError::InvalidHold);
        }

        match cmd {
            "config" => Ok(Self::Config),
            "reboot" => Ok(Self::Reboot),
            "resetRadar" => Ok(Self::ResetRadar),
            "getStatus" => Ok(Self::GetStatus),
            _ => Err(ControlError::Unknown),
        }
    }

    /// Parse raw bytes, rejecting anything that is not UTF-8.
    pub fn parse_bytes(input: &[u8]) -> Result<Self, ControlError> {
        if input.len() > MAX_COMMAND_LEN {
            return Err(ControlError::TooLong(input.len()));
        }
        core::str::from_utf8(input)
            .map_err(|_| ControlError::Unknown)
            .and_then(Self::parse)
    }

    /// Immediate acknowledgement for commands that do not talk to the sensor.
    #[must_use]
    pub const fn immediate_ack(&self) -> Option<&'static str> {
        match self {
            Self::Config => Some("config OK"),
            Self::Reboot => Some("reboot OK"),
            Self::GetStatus => Some("getStatus OK"),
            Self::ResetRadar | Self::SetRange(_) | Self::SetHold(_) => None,
        }
    }
}

impl core::str::FromStr for ControlCommand {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn test_plain_commands() {
        assert_eq!(ControlCommand::parse("config"), Ok(ControlCommand::Config));
        assert_eq!(ControlCommand::parse("reboot"), Ok(ControlCommand::Reboot));
        assert_eq!(ControlCommand::parse("resetRadar"), Ok(ControlCommand::ResetRadar));
        assert_eq!(ControlCommand::parse("getStatus"), Ok(ControlCommand::GetStatus));
        assert_eq!(ControlCommand::parse("status"), Err(ControlError::Unknown));
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(
            ControlCommand::parse(" \t setHold:700\r\n"),
            Ok(ControlCommand::SetHold(700))
        );
    }

    #[test]
    fn test_set_range_bounds() {
        assert_eq!(
            ControlCommand::parse("setRange:3.5"),
            Ok(ControlCommand::SetRange(3.5))
        );
        assert_eq!(
            ControlCommand::parse("setRange:15"),
            Ok(ControlCommand::SetRange(15.0))
        );
        for bad in ["setRange:0.5", "setRange:0.2", "setRange:15.5", "setRange:-1", "setRange:abc", "setRange:"] {
            assert_eq!(ControlCommand::parse(bad), Err(ControlError::InvalidRange), "{bad}");
        }
    }

    #[test]
    fn test_set_hold_bounds() {
        assert_eq!(ControlCommand::parse("setHold:0"), Ok(ControlCommand::SetHold(0)));
        assert_eq!(
            ControlCommand::parse("setHold:10000"),
            Ok(ControlCommand::SetHold(10_000))
        );
        for bad in ["setHold:10001", "setHold:-5", "setHold:1.5", "setHold:x"] {
            assert_eq!(ControlCommand::parse(bad), Err(ControlError::InvalidHold), "{bad}");
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ControlError::InvalidRange.to_string(),
            "setRange ERROR: invalid value"
        );
        assert_eq!(
            ControlError::InvalidHold.to_string(),
            "setHold ERROR: invalid value"
        );
    }

    #[test]
    fn test_length_cap() {
        let long = [b'a'; MAX_COMMAND_LEN + 1];
        assert_eq!(
            ControlCommand::parse_bytes(&long),
            Err(ControlError::TooLong(MAX_COMMAND_LEN + 1))
        );
        assert_eq!(ControlCommand::parse("   "), Err(ControlError::Empty));
        assert_eq!(ControlCommand::parse_bytes(&[0xFF, 0xFE]), Err(ControlError::Unknown));
    }

    #[test]
    fn test_immediate_ack() {
        assert_eq!(ControlCommand::Reboot.immediate_ack(), Some("reboot OK"));
        assert_eq!(ControlCommand::SetHold(5).immediate_ack(), None);
    }
}
