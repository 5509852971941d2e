//! Configuration commands sent to the sensor.
//!
//! Every command travels in the same envelope:
//!
//! ```text
//! FD FC FB FA | len (LE16) | code (LE16) | value… | 04 03 02 01
//! ```
//!
//! A parameter change is always the sequence Open, Set, Close. The sensor
//! answers with acknowledgement frames parsed by [`crate::ack`].

/// Header shared by command and acknowledgement frames.
pub const COMMAND_HEADER: [u8; 4] = [0xFD, 0xFC, 0xFB, 0xFA];

/// Tail shared by command and acknowledgement frames.
pub const COMMAND_TAIL: [u8; 4] = [0x04, 0x03, 0x02, 0x01];

/// Enter configuration mode.
pub const CMD_OPEN: u16 = 0x00FF;

/// Leave configuration mode.
pub const CMD_CLOSE: u16 = 0x00FE;

/// Write one parameter.
pub const CMD_SET_PARAMETER: u16 = 0x0007;

/// Switch the sensor to multi-target reporting.
pub const CMD_MULTI_TARGET: u16 = 0x0090;

/// Code echoed in the acknowledgement to [`CMD_OPEN`].
pub const OPEN_ACK: u16 = 0x01FF;

/// Code echoed in the acknowledgement to [`CMD_CLOSE`].
pub const CLOSE_ACK: u16 = 0x01FE;

/// Largest encoded command (a Set frame).
pub const MAX_COMMAND_FRAME_LEN: usize = 18;

/// Range covered by one distance gate, in meters.
pub const RANGE_GATE_SIZE_M: f32 = 0.7;

/// Highest gate index the sensor accepts.
pub const MAX_GATE_INDEX: u8 = 15;

/// Value carried by the Open command.
const OPEN_VALUE: u16 = 0x0001;

/// Errors that can occur during serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializeError {
    /// The output buffer is too small to hold the encoded frame.
    BufferTooSmall,
}

impl core::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

/// Parameter ids understood by the Set command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum Parameter {
    /// Farthest distance gate that reports targets.
    MaxRangeGate = 0x0001,
    /// How long the sensor keeps reporting a vanished target, in ms.
    HoldInterval = 0x0004,
}

impl Parameter {
    #[inline]
    #[must_use]
    pub const fn id(self) -> u16 {
        self as u16
    }
}

/// A command frame the sensor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Open,
    SetParameter { parameter: Parameter, value: u32 },
    Close,
    MultiTargetMode,
}

impl Command {
    /// Set the maximum range gate.
    #[must_use]
    pub const fn max_range_gate(gate: u8) -> Self {
        Self::SetParameter {
            parameter: Parameter::MaxRangeGate,
            value: gate as u32,
        }
    }

    /// Set the hold interval in milliseconds.
    #[must_use]
    pub const fn hold_interval(ms: u32) -> Self {
        Self::SetParameter {
            parameter: Parameter::HoldInterval,
            value: ms,
        }
    }

    /// Command code carried after the length field.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::Open => CMD_OPEN,
            Self::SetParameter { .. } => CMD_SET_PARAMETER,
            Self::Close => CMD_CLOSE,
            Self::MultiTargetMode => CMD_MULTI_TARGET,
        }
    }

    /// Length of the payload (code plus value), as written in the length field.
    #[must_use]
    pub const fn payload_len(&self) -> usize {
        match self {
            Self::Open => 4,
            Self::SetParameter { .. } => 8,
            Self::Close | Self::MultiTargetMode => 2,
        }
    }

    /// Total encoded size including header, length field and tail.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        COMMAND_HEADER.len() + 2 + self.payload_len() + COMMAND_TAIL.len()
    }

    /// Encode into `buf`, returning the number of bytes written.
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError> {
        let len = self.encoded_len();
        let out = buf.get_mut(..len).ok_or(SerializeError::BufferTooSmall)?;
        self.write_frame(out);
        Ok(len)
    }

    /// Encode into an owned, fixed-size frame.
    #[must_use]
    pub fn frame(&self) -> CommandFrame {
        let mut frame = CommandFrame {
            bytes: [0; MAX_COMMAND_FRAME_LEN],
            len: self.encoded_len(),
        };
        self.write_frame(&mut frame.bytes[..frame.len]);
        frame
    }

    /// `out` is exactly [`encoded_len`](Self::encoded_len) bytes long.
    fn write_frame(&self, out: &mut [u8]) {
        let mut pos = 0;
        let mut put = |bytes: &[u8]| {
            out[pos..pos + bytes.len()].copy_from_slice(bytes);
            pos += bytes.len();
        };

        put(&COMMAND_HEADER);
        put(&(self.payload_len() as u16).to_le_bytes());
        put(&self.code().to_le_bytes());
        match *self {
            Self::Open => put(&OPEN_VALUE.to_le_bytes()),
            Self::SetParameter { parameter, value } => {
                put(&parameter.id().to_le_bytes());
                put(&value.to_le_bytes());
            }
            Self::Close | Self::MultiTargetMode => {}
        }
        put(&COMMAND_TAIL);
    }
}

/// An encoded command, ready to write to the UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: [u8; MAX_COMMAND_FRAME_LEN],
    len: usize,
}

impl CommandFrame {
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Convert a range in meters to a gate index, `ceil(m / 0.7)` clamped to
/// `0..=15`.
///
/// Non-positive and NaN inputs map to gate 0.
#[must_use]
pub fn range_to_gate(meters: f32) -> u8 {
    if !(meters > 0.0) {
        return 0;
    }
    let gate = libm::ceilf(meters / RANGE_GATE_SIZE_M);
    if gate >= MAX_GATE_INDEX as f32 {
        MAX_GATE_INDEX
    } else {
        gate as u8
    }
}
