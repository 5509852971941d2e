//! Acknowledgement frames returned by the sensor.
//!
//! ```text
//! FD FC FB FA | len (LE16) | code (LE16) | status (LE16) | … | 04 03 02 01
//! ```
//!
//! [`AckParser`] is a byte-at-a-time state machine: it hunts for the header,
//! reads the length, and emits an [`AckFrame`] once the whole reply including
//! the tail has arrived. The tail content is not checked.

use crate::command::{CLOSE_ACK, COMMAND_HEADER, COMMAND_TAIL, OPEN_ACK};

/// Longest reply the parser accepts, envelope included.
pub const MAX_ACK_FRAME_LEN: usize = 64;

/// Smallest payload that carries a code and a status.
pub const MIN_ACK_PAYLOAD: usize = 4;

const MAX_ACK_PAYLOAD: usize =
    MAX_ACK_FRAME_LEN - COMMAND_HEADER.len() - 2 - COMMAND_TAIL.len();

/// Encoded size of an acknowledgement with a minimal payload.
pub const ACK_FRAME_LEN: usize = COMMAND_HEADER.len() + 2 + MIN_ACK_PAYLOAD + COMMAND_TAIL.len();

/// A decoded acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AckFrame {
    /// Echoed command code, as sent by the sensor.
    pub command: u16,
    /// 0 on success.
    pub status: u16,
}

impl AckFrame {
    #[must_use]
    pub const fn new(command: u16, status: u16) -> Self {
        Self { command, status }
    }

    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == 0
    }

    /// `true` if this acknowledges `expected`.
    ///
    /// Some sensor firmware echoes the opcode with a high byte set, so with
    /// `mask_low_byte` only the low byte has to match.
    #[must_use]
    pub const fn matches(&self, expected: u16, mask_low_byte: bool) -> bool {
        self.command == expected || (mask_low_byte && self.command & 0x00FF == expected)
    }

    /// Acknowledgement of an Open or Close command.
    #[must_use]
    pub const fn is_open_close_ack(&self) -> bool {
        self.command == OPEN_ACK || self.command == CLOSE_ACK
    }

    /// Encode with a minimal payload, as the sensor sends it.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; ACK_FRAME_LEN] {
        let mut out = [0u8; ACK_FRAME_LEN];
        out[..4].copy_from_slice(&COMMAND_HEADER);
        out[4..6].copy_from_slice(&(MIN_ACK_PAYLOAD as u16).to_le_bytes());
        out[6..8].copy_from_slice(&self.command.to_le_bytes());
        out[8..10].copy_from_slice(&self.status.to_le_bytes());
        out[10..].copy_from_slice(&COMMAND_TAIL);
        out
    }
}

/// Parser error. The parser is reset and hunts for the next header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckError {
    /// Length field too small to carry code and status.
    PayloadTooShort(u16),
    /// Length field exceeds [`MAX_ACK_FRAME_LEN`].
    PayloadTooLong(u16),
}

impl core::fmt::Display for AckError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadTooShort(len) => write!(f, "ack payload too short: {len}"),
            Self::PayloadTooLong(len) => write!(f, "ack payload too long: {len}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Header { matched: usize },
    LengthLow,
    LengthHigh { lo: u8 },
    Body { remaining: usize },
}

/// Acknowledgement frame parser.
#[derive(Debug)]
pub struct AckParser {
    state: ParserState,
    head: [u8; MIN_ACK_PAYLOAD],
    received: usize,
}

impl AckParser {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ParserState::Header { matched: 0 },
            head: [0; MIN_ACK_PAYLOAD],
            received: 0,
        }
    }

    /// Reset parser state.
    pub fn reset(&mut self) {
        self.state = ParserState::Header { matched: 0 };
        self.received = 0;
    }

    /// Feed a byte to the parser.
    ///
    /// Returns `Some(frame)` once a complete acknowledgement has been read.
    pub fn push_byte(&mut self, byte: u8) -> Result<Option<AckFrame>, AckError> {
        match self.state {
            ParserState::Header { matched } => {
                let matched = if byte == COMMAND_HEADER[matched] {
                    matched + 1
                } else if byte == COMMAND_HEADER[0] {
                    1
                } else {
                    0
                };
                self.state = if matched == COMMAND_HEADER.len() {
                    ParserState::LengthLow
                } else {
                    ParserState::Header { matched }
                };
                Ok(None)
            }
            ParserState::LengthLow => {
                self.state = ParserState::LengthHigh { lo: byte };
                Ok(None)
            }
            ParserState::LengthHigh { lo } => {
                let len = u16::from_le_bytes([lo, byte]);
                if (len as usize) < MIN_ACK_PAYLOAD {
                    self.reset();
                    return Err(AckError::PayloadTooShort(len));
                }
                if len as usize > MAX_ACK_PAYLOAD {
                    self.reset();
                    return Err(AckError::PayloadTooLong(len));
                }
                self.received = 0;
                self.state = ParserState::Body {
                    remaining: len as usize + COMMAND_TAIL.len(),
                };
                Ok(None)
            }
            ParserState::Body { remaining } => {
                if let Some(slot) = self.head.get_mut(self.received) {
                    *slot = byte;
                }
                self.received += 1;

                if remaining > 1 {
                    self.state = ParserState::Body {
                        remaining: remaining - 1,
                    };
                    return Ok(None);
                }

                let frame = AckFrame {
                    command: u16::from_le_bytes([self.head[0], self.head[1]]),
                    status: u16::from_le_bytes([self.head[2], self.head[3]]),
                };
                self.reset();
                Ok(Some(frame))
            }
        }
    }
}

impl Default for AckParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::command::CMD_SET_PARAMETER;
    use std::vec::Vec;

    fn parse_all(parser: &mut AckParser, bytes: &[u8]) -> Vec<Result<AckFrame, AckError>> {
        bytes
            .iter()
            .filter_map(|&b| parser.push_byte(b).transpose())
            .collect()
    }

    #[test]
    fn test_parse_set_ack() {
        let mut parser = AckParser::new();
        let bytes = [
            0xFD, 0xFC, 0xFB, 0xFA, 0x04, 0x00, 0x07, 0x01, 0x00, 0x00, 0x04, 0x03, 0x02, 0x01,
        ];
        let out = parse_all(&mut parser, &bytes);
        assert_eq!(out, [Ok(AckFrame::new(0x0107, 0))]);
    }

    #[test]
    fn test_to_bytes_parses_back() {
        let ack = AckFrame::new(CMD_SET_PARAMETER, 3);
        let mut parser = AckParser::new();
        assert_eq!(parse_all(&mut parser, &ack.to_bytes()), [Ok(ack)]);
    }

    #[test]
    fn test_skips_leading_noise() {
        let mut parser = AckParser::new();
        let mut stream: Vec<u8> = Vec::new();
        // Partial header, a data frame fragment, then a real reply.
        stream.extend_from_slice(&[0xFD, 0xFC, 0x00, 0xAA, 0xFF, 0x03, 0x00, 0xFD]);
        stream.extend_from_slice(&AckFrame::new(OPEN_ACK, 0).to_bytes());
        assert_eq!(
            parse_all(&mut parser, &stream),
            [Ok(AckFrame::new(OPEN_ACK, 0))]
        );
    }

    #[test]
    fn test_longer_payload_accepted() {
        let mut parser = AckParser::new();
        let bytes = [
            0xFD, 0xFC, 0xFB, 0xFA, 0x06, 0x00, 0xFF, 0x01, 0x00, 0x00, 0x01, 0x00, 0x04, 0x03,
            0x02, 0x01,
        ];
        assert_eq!(
            parse_all(&mut parser, &bytes),
            [Ok(AckFrame::new(OPEN_ACK, 0))]
        );
    }

    #[test]
    fn test_consecutive_frames() {
        let mut parser = AckParser::new();
        let mut stream: Vec<u8> = Vec::new();
        stream.extend_from_slice(&AckFrame::new(OPEN_ACK, 0).to_bytes());
        stream.extend_from_slice(&AckFrame::new(0x0107, 0).to_bytes());
        stream.extend_from_slice(&AckFrame::new(CLOSE_ACK, 0).to_bytes());
        let out = parse_all(&mut parser, &stream);
        assert_eq!(
            out,
            [
                Ok(AckFrame::new(OPEN_ACK, 0)),
                Ok(AckFrame::new(0x0107, 0)),
                Ok(AckFrame::new(CLOSE_ACK, 0)),
            ]
        );
    }

    #[test]
    fn test_bad_length_resets() {
        let mut parser = AckParser::new();
        let out = parse_all(&mut parser, &[0xFD, 0xFC, 0xFB, 0xFA, 0x02, 0x00]);
        assert_eq!(out, [Err(AckError::PayloadTooShort(2))]);

        let out = parse_all(&mut parser, &[0xFD, 0xFC, 0xFB, 0xFA, 0xFF, 0x00]);
        assert_eq!(out, [Err(AckError::PayloadTooLong(255))]);

        // Still usable afterwards.
        let ack = AckFrame::new(CLOSE_ACK, 0);
        assert_eq!(parse_all(&mut parser, &ack.to_bytes()), [Ok(ack)]);
    }

    #[test]
    fn test_matches_masked_code() {
        let echoed = AckFrame::new(0x0107, 0);
        assert!(echoed.matches(CMD_SET_PARAMETER, true));
        assert!(!echoed.matches(CMD_SET_PARAMETER, false));
        assert!(AckFrame::new(CMD_SET_PARAMETER, 0).matches(CMD_SET_PARAMETER, false));
        assert!(!AckFrame::new(0x0108, 0).matches(CMD_SET_PARAMETER, true));
    }

    #[test]
    fn test_open_close_classification() {
        assert!(AckFrame::new(OPEN_ACK, 0).is_open_close_ack());
        assert!(AckFrame::new(CLOSE_ACK, 0).is_open_close_ack());
        assert!(!AckFrame::new(0x0107, 0).is_open_close_ack());
        assert!(!AckFrame::new(0x0107, 1).is_success());
    }
}
