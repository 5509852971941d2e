//! Wire protocol of the RD-03D multi-target mmWave radar.
//!
//! The sensor speaks two protocols on one UART:
//!
//! - **Data frames** (sensor → host): fixed 30-byte frames carrying up to
//!   three targets.
//!   - [`FrameAccumulator`] - Byte-stream synchronizer and validator
//!   - [`DataFrame`] - A validated frame
//!   - [`decode()`] - Decode the three target blocks
//!   - [`TargetObservation`] - One raw target
//!
//! - **Commands** (host → sensor) and their **acknowledgements**:
//!   - [`Command`] - Open / Set / Close / multi-target frames
//!   - [`AckParser`] - Acknowledgement state machine
//!   - [`range_to_gate()`] - Meters to sensor gate index
//!
//! # Data Frame Format
//!
//! ```text
//! AA FF 03 00 | target 0 (8) | target 1 (8) | target 2 (8) | 55 CC
//! ```
//!
//! Each target block is `x, y, speed` in the sensor's sign-magnitude layout
//! followed by an unsigned distance, all little-endian.
//!
//! # Command Format
//!
//! ```text
//! FD FC FB FA | len (LE16) | code (LE16) | value… | 04 03 02 01
//! ```
//!
//! # Examples
//!
//! ## Decoding a byte stream
//!
//! ```
//! use radar_proto::{decode, FrameAccumulator};
//!
//! let bytes = [
//!     0xAA, 0xFF, 0x03, 0x00, 0x0E, 0x03, 0xB1, 0x86, 0x10, 0x00, 0x40, 0x01, 0x00, 0x00,
//!     0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
//!     0x55, 0xCC,
//! ];
//!
//! let mut acc = FrameAccumulator::new();
//! let frame = acc.feed_slice(&bytes).unwrap();
//! let targets = decode(&frame);
//!
//! let t = targets[0].unwrap();
//! assert_eq!((t.x, t.y, t.speed, t.dist_raw), (-782, 1713, -16, 320));
//! assert!(targets[1].is_none());
//! ```
//!
//! ## Building a command
//!
//! ```
//! use radar_proto::{range_to_gate, Command};
//!
//! let mut buf = [0u8; 32];
//! let len = Command::max_range_gate(range_to_gate(3.5))
//!     .serialize(&mut buf)
//!     .unwrap();
//! assert_eq!(len, 18);
//! assert_eq!(&buf[8..14], &[0x01, 0x00, 0x05, 0x00, 0x00, 0x00]);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging
//! - **`log`**: Route diagnostics through the `log` facade
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// Must come first so the logging macros are visible to the other modules.
mod fmt;

pub mod ack;
pub mod command;
pub mod frame;
pub mod target;

pub use ack::{AckError, AckFrame, AckParser, ACK_FRAME_LEN, MAX_ACK_FRAME_LEN};
pub use command::{
    range_to_gate, Command, CommandFrame, Parameter, SerializeError, CLOSE_ACK, CMD_CLOSE,
    CMD_MULTI_TARGET, CMD_OPEN, CMD_SET_PARAMETER, COMMAND_HEADER, COMMAND_TAIL,
    MAX_GATE_INDEX, OPEN_ACK, RANGE_GATE_SIZE_M,
};
pub use frame::{DataFrame, FrameAccumulator, FrameError, FrameStats, FRAME_LEN, TARGET_SLOTS};
pub use target::{decode, decode_bytes, TargetObservation};
