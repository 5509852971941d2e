//! Target block decoding.
//!
//! Each 8-byte block holds four little-endian fields:
//!
//! | Bytes | Field    | Encoding                         |
//! |-------|----------|----------------------------------|
//! | 0–1   | x (mm)   | sign-magnitude                   |
//! | 2–3   | y (mm)   | sign-magnitude                   |
//! | 4–5   | speed    | sign-magnitude                   |
//! | 6–7   | distance | unsigned                         |
//!
//! The sign-magnitude layout is the sensor's own: bit 7 of the high byte is
//! set for non-negative values and clear for negative ones. It is not two's
//! complement.

use crate::frame::{DataFrame, FrameError, TARGET_BLOCK_LEN, TARGET_SLOTS};

/// High-byte flag marking a non-negative value.
pub const SIGN_FLAG: u8 = 0x80;

/// High-byte bits that carry magnitude bits 8–14.
pub const MAGNITUDE_HIGH_MASK: u8 = 0x7F;

/// Largest magnitude the layout can carry.
pub const MAX_MAGNITUDE: u16 = 0x7FFF;

/// Decode a sign-magnitude value from its low and high byte.
#[inline]
#[must_use]
pub const fn decode_sign_magnitude(lo: u8, hi: u8) -> i16 {
    let magnitude = (((hi & MAGNITUDE_HIGH_MASK) as u16) << 8 | lo as u16) as i16;
    if hi & SIGN_FLAG != 0 {
        magnitude
    } else {
        -magnitude
    }
}

/// Encode a value in the sensor's sign-magnitude layout, `[lo, hi]`.
///
/// Magnitudes above [`MAX_MAGNITUDE`] saturate.
#[inline]
#[must_use]
pub const fn encode_sign_magnitude(value: i16) -> [u8; 2] {
    let mut magnitude = value.unsigned_abs();
    if magnitude > MAX_MAGNITUDE {
        magnitude = MAX_MAGNITUDE;
    }
    let sign = if value >= 0 { SIGN_FLAG } else { 0 };
    [
        (magnitude & 0xFF) as u8,
        ((magnitude >> 8) as u8 & MAGNITUDE_HIGH_MASK) | sign,
    ]
}

/// Euclidean distance of a point from the sensor.
#[inline]
#[must_use]
pub fn distance_xy(x: f32, y: f32) -> f32 {
    libm::sqrtf(x * x + y * y)
}

/// Bearing of a point in degrees, `atan2(y, x)`.
#[inline]
#[must_use]
pub fn angle_deg(x: f32, y: f32) -> f32 {
    libm::atan2f(y, x) * 180.0 / core::f32::consts::PI
}

/// One raw target decoded from a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TargetObservation {
    /// Lateral position in mm.
    pub x: i16,
    /// Forward position in mm.
    pub y: i16,
    /// Radial speed.
    pub speed: i16,
    /// Distance as reported by the sensor.
    pub dist_raw: u16,
}

impl TargetObservation {
    #[must_use]
    pub const fn new(x: i16, y: i16, speed: i16, dist_raw: u16) -> Self {
        Self {
            x,
            y,
            speed,
            dist_raw,
        }
    }

    /// Decode a block. An all-zero block means no object and yields `None`.
    #[must_use]
    pub fn from_block(block: &[u8; TARGET_BLOCK_LEN]) -> Option<Self> {
        if block.iter().all(|&b| b == 0) {
            return None;
        }
        Some(Self {
            x: decode_sign_magnitude(block[0], block[1]),
            y: decode_sign_magnitude(block[2], block[3]),
            speed: decode_sign_magnitude(block[4], block[5]),
            dist_raw: u16::from_le_bytes([block[6], block[7]]),
        })
    }

    /// Encode back into the sensor's block layout.
    #[must_use]
    pub const fn to_block(&self) -> [u8; TARGET_BLOCK_LEN] {
        let x = encode_sign_magnitude(self.x);
        let y = encode_sign_magnitude(self.y);
        let speed = encode_sign_magnitude(self.speed);
        let dist = self.dist_raw.to_le_bytes();
        [x[0], x[1], y[0], y[1], speed[0], speed[1], dist[0], dist[1]]
    }

    /// Distance computed from x and y, in mm.
    #[inline]
    #[must_use]
    pub fn distance_xy(&self) -> f32 {
        distance_xy(self.x as f32, self.y as f32)
    }

    /// Bearing computed from x and y, in degrees.
    #[inline]
    #[must_use]
    pub fn angle_deg(&self) -> f32 {
        angle_deg(self.x as f32, self.y as f32)
    }
}

/// Decode the three target blocks of a frame.
#[must_use]
pub fn decode(frame: &DataFrame) -> [Option<TargetObservation>; TARGET_SLOTS] {
    core::array::from_fn(|slot| {
        frame
            .target_block(slot)
            .and_then(TargetObservation::from_block)
    })
}

/// Validate raw bytes as a frame and decode it.
pub fn decode_bytes(bytes: &[u8]) -> Result<[Option<TargetObservation>; TARGET_SLOTS], FrameError> {
    DataFrame::from_bytes(bytes).map(|frame| decode(&frame))
}

impl DataFrame {
    /// Build a frame carrying the given observations (`None` = empty block).
    #[must_use]
    pub fn from_observations(targets: &[Option<TargetObservation>; TARGET_SLOTS]) -> Self {
        Self::with_blocks(core::array::from_fn(|slot| {
            targets[slot].map_or([0; TARGET_BLOCK_LEN], |t| t.to_block())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        libm::fabsf(a - b) <= 1e-3 * libm::fabsf(b).max(1.0)
    }

    #[test]
    fn test_sign_flag_set_is_positive() {
        assert_eq!(decode_sign_magnitude(0x0E, 0x83), 0x030E);
        assert_eq!(decode_sign_magnitude(0x0E, 0x03), -0x030E);
    }

    #[test]
    fn test_zero_decodes_regardless_of_flag() {
        assert_eq!(decode_sign_magnitude(0x00, 0x80), 0);
        assert_eq!(decode_sign_magnitude(0x00, 0x00), 0);
    }

    #[test]
    fn test_sign_magnitude_round_trip_sensor_range() {
        for v in -4095i16..=4095 {
            let [lo, hi] = encode_sign_magnitude(v);
            assert_eq!(decode_sign_magnitude(lo, hi), v, "value {v}");
        }
    }

    #[test]
    fn test_decode_covers_every_high_byte() {
        // Every 16-bit pattern decodes to its magnitude with the flag's sign.
        for hi in 0..=u8::MAX {
            for lo in [0x00, 0x01, 0x7F, 0x80, 0xFF] {
                let magnitude = (((hi & 0x7F) as i32) << 8) | lo as i32;
                let expected = if hi & 0x80 != 0 { magnitude } else { -magnitude };
                assert_eq!(decode_sign_magnitude(lo, hi) as i32, expected);
            }
        }
    }

    #[test]
    fn test_encode_saturates() {
        assert_eq!(encode_sign_magnitude(i16::MIN), [0xFF, 0x7F]);
        assert_eq!(encode_sign_magnitude(i16::MAX), [0xFF, 0xFF]);
    }

    #[test]
    fn test_empty_block_is_absent() {
        assert_eq!(TargetObservation::from_block(&[0; 8]), None);
    }

    #[test]
    fn test_distance_is_plain_unsigned() {
        // The high bit of the distance field is data, not a sign flag.
        let block = [0x00, 0x80, 0x00, 0x80, 0x00, 0x80, 0x34, 0x92];
        let t = TargetObservation::from_block(&block).unwrap();
        assert_eq!(t.dist_raw, 0x9234);
    }

    #[test]
    fn test_decode_frame_geometry() {
        let targets = [
            Some(TargetObservation::new(-782, 1713, -16, 360)),
            None,
            Some(TargetObservation::new(300, 400, 0, 500)),
        ];
        let frame = DataFrame::from_observations(&targets);
        let decoded = decode(&frame);
        assert_eq!(decoded, targets);

        let first = decoded[0].unwrap();
        assert!(approx(first.distance_xy(), 1883.054_2));
        assert!(approx(first.angle_deg(), 114.537_1));

        let third = decoded[2].unwrap();
        assert!(approx(third.distance_xy(), 500.0));
        assert!(approx(third.angle_deg(), 53.130_1));
    }

    #[test]
    fn test_decode_bytes_rejects_wrong_header() {
        let mut bytes = *DataFrame::from_observations(&[
            Some(TargetObservation::new(1, 2, 3, 4)),
            None,
            None,
        ])
        .as_bytes();
        bytes[0] = 0xAB;
        assert_eq!(decode_bytes(&bytes), Err(FrameError::Header));
    }

    #[test]
    fn test_decode_sensor_capture() {
        // Sample frame from the sensor datasheet.
        let bytes = [
            0xAA, 0xFF, 0x03, 0x00, 0x0E, 0x03, 0xB1, 0x86, 0x10, 0x00, 0x40, 0x01, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x55, 0xCC,
        ];
        let decoded = decode_bytes(&bytes).unwrap();
        let t = decoded[0].unwrap();
        assert_eq!(t.x, -782);
        assert_eq!(t.y, 1713);
        assert_eq!(t.speed, -16);
        assert_eq!(t.dist_raw, 320);
        assert_eq!(decoded[1], None);
        assert_eq!(decoded[2], None);
    }
}
