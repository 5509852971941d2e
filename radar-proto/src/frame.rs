//! Data frame type and the byte-stream frame accumulator.
//!
//! The sensor streams fixed 30-byte frames:
//!
//! ```text
//! AA FF 03 00 | x y speed dist (8) | x y speed dist (8) | x y speed dist (8) | 55 CC
//! ```
//!
//! [`FrameAccumulator`] synchronizes on the `0xAA` start marker, collects bytes
//! into a bounded buffer until the `55 CC` terminator, and emits frames that
//! pass validation and the duplicate filter.

use heapless::Vec;

/// Total size of a data frame in bytes.
pub const FRAME_LEN: usize = 30;

/// Header that opens every data frame.
pub const FRAME_HEADER: [u8; 4] = [0xAA, 0xFF, 0x03, 0x00];

/// Terminator that closes every data frame.
pub const FRAME_TERMINATOR: [u8; 2] = [0x55, 0xCC];

/// Start marker the accumulator synchronizes on.
pub const START_MARKER: u8 = FRAME_HEADER[0];

/// Number of target slots carried by one frame.
pub const TARGET_SLOTS: usize = 3;

/// Size of one target block.
pub const TARGET_BLOCK_LEN: usize = 8;

/// Byte offset of the first target block.
pub const FIRST_BLOCK_OFFSET: usize = FRAME_HEADER.len();

/// Capacity of the raw accumulation buffer.
pub const RAW_BUFFER_CAPACITY: usize = 64;

/// Reasons a byte sequence is not a valid data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Candidate length differs from [`FRAME_LEN`].
    Length(usize),
    /// First four bytes are not [`FRAME_HEADER`].
    Header,
    /// Last two bytes are not [`FRAME_TERMINATOR`].
    Terminator,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Length(len) => write!(f, "invalid frame size: {len}"),
            Self::Header => write!(f, "bad frame header"),
            Self::Terminator => write!(f, "bad frame terminator"),
        }
    }
}

/// A validated 30-byte data frame.
///
/// Construction goes through [`DataFrame::from_bytes`], so every value of this
/// type carries the correct header and terminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataFrame([u8; FRAME_LEN]);

impl DataFrame {
    /// A frame with all three target blocks zeroed.
    pub const EMPTY: Self = Self::with_blocks([[0; TARGET_BLOCK_LEN]; TARGET_SLOTS]);

    /// Validate `bytes` and copy them into a frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() != FRAME_LEN {
            return Err(FrameError::Length(bytes.len()));
        }
        if bytes[..FRAME_HEADER.len()] != FRAME_HEADER {
            return Err(FrameError::Header);
        }
        if bytes[FRAME_LEN - FRAME_TERMINATOR.len()..] != FRAME_TERMINATOR {
            return Err(FrameError::Terminator);
        }

        let mut raw = [0u8; FRAME_LEN];
        raw.copy_from_slice(bytes);
        Ok(Self(raw))
    }

    /// Assemble a frame from three raw target blocks.
    #[must_use]
    pub const fn with_blocks(blocks: [[u8; TARGET_BLOCK_LEN]; TARGET_SLOTS]) -> Self {
        let mut raw = [0u8; FRAME_LEN];
        let mut i = 0;
        while i < FRAME_HEADER.len() {
            raw[i] = FRAME_HEADER[i];
            i += 1;
        }
        let mut slot = 0;
        while slot < TARGET_SLOTS {
            let mut j = 0;
            while j < TARGET_BLOCK_LEN {
                raw[FIRST_BLOCK_OFFSET + slot * TARGET_BLOCK_LEN + j] = blocks[slot][j];
                j += 1;
            }
            slot += 1;
        }
        raw[FRAME_LEN - 2] = FRAME_TERMINATOR[0];
        raw[FRAME_LEN - 1] = FRAME_TERMINATOR[1];
        Self(raw)
    }

    /// Raw frame bytes, header and terminator included.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// The 8-byte block of target `slot`, or `None` past the last slot.
    #[must_use]
    pub fn target_block(&self, slot: usize) -> Option<&[u8; TARGET_BLOCK_LEN]> {
        if slot >= TARGET_SLOTS {
            return None;
        }
        let start = FIRST_BLOCK_OFFSET + slot * TARGET_BLOCK_LEN;
        self.0.get(start..start + TARGET_BLOCK_LEN)?.try_into().ok()
    }

    /// `true` when at least one target block holds a non-zero byte.
    #[must_use]
    pub fn has_any_target(&self) -> bool {
        (0..TARGET_SLOTS)
            .filter_map(|slot| self.target_block(slot))
            .any(|block| block.iter().any(|&b| b != 0))
    }
}

/// Counters kept by [`FrameAccumulator`] for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameStats {
    /// Complete, header-valid 30-byte candidates (duplicates included).
    pub valid: u32,
    /// Valid candidates suppressed by the duplicate filter.
    pub duplicates: u32,
    /// Candidates shorter than a frame.
    pub undersized: u32,
    /// Candidates longer than a frame.
    pub oversized: u32,
    /// Candidates abandoned because their header did not match.
    pub bad_header: u32,
    /// Buffer resets caused by a missing terminator.
    pub overflows: u32,
}

/// Byte-stream synchronizer that extracts [`DataFrame`]s.
///
/// Feed it one byte at a time with [`feed`](Self::feed). It never fails:
/// malformed input is dropped and the accumulator resynchronizes on the next
/// start marker. The header is checked as it arrives, so a stray `0xAA`
/// right before a real frame does not swallow it.
///
/// A candidate frame is emitted when it differs from the last emitted frame,
/// or when it carries no target at all. Repeated identical frames with targets
/// are suppressed; empty frames always pass so that downstream hold timers
/// keep running.
#[derive(Debug)]
pub struct FrameAccumulator {
    buffer: Vec<u8, RAW_BUFFER_CAPACITY>,
    last_frame: Option<DataFrame>,
    stats: FrameStats,
}

impl FrameAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            last_frame: None,
            stats: FrameStats {
                valid: 0,
                duplicates: 0,
                undersized: 0,
                oversized: 0,
                bad_header: 0,
                overflows: 0,
            },
        }
    }

    /// Discard any partially accumulated bytes.
    ///
    /// The last emitted frame is kept for duplicate filtering.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Number of bytes currently buffered.
    #[inline]
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// The most recently emitted frame.
    #[inline]
    #[must_use]
    pub fn last_frame(&self) -> Option<&DataFrame> {
        self.last_frame.as_ref()
    }

    /// Diagnostic counters.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Push one byte. Returns a frame when one is ready for decoding.
    pub fn feed(&mut self, byte: u8) -> Option<DataFrame> {
        if self.buffer.is_full() {
            trace!("frame buffer overflow, resetting");
            self.stats.overflows = self.stats.overflows.wrapping_add(1);
            self.buffer.clear();
        }

        if self.buffer.is_empty() && byte != START_MARKER {
            return None;
        }

        // Cannot fail: a full buffer was cleared above.
        let _ = self.buffer.push(byte);

        let pos = self.buffer.len() - 1;
        if pos < FRAME_HEADER.len() && byte != FRAME_HEADER[pos] {
            self.stats.bad_header = self.stats.bad_header.wrapping_add(1);
            self.buffer.clear();
            if byte == START_MARKER {
                let _ = self.buffer.push(byte);
            }
            return None;
        }

        if !self.buffer.ends_with(&FRAME_TERMINATOR) {
            return None;
        }

        let emitted = self.complete_candidate();
        self.buffer.clear();
        emitted
    }

    /// Feed a slice, returning the last frame emitted while doing so.
    pub fn feed_slice(&mut self, bytes: &[u8]) -> Option<DataFrame> {
        bytes.iter().fold(None, |last, &b| self.feed(b).or(last))
    }

    fn complete_candidate(&mut self) -> Option<DataFrame> {
        let len = self.buffer.len();
        if len < FRAME_LEN {
            self.stats.undersized = self.stats.undersized.wrapping_add(1);
            return None;
        }
        if len > FRAME_LEN {
            warn!("invalid frame size: {}", len);
            self.stats.oversized = self.stats.oversized.wrapping_add(1);
            return None;
        }

        let frame = match DataFrame::from_bytes(&self.buffer) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("dropping frame: {:?}", e);
                self.stats.bad_header = self.stats.bad_header.wrapping_add(1);
                return None;
            }
        };
        self.stats.valid = self.stats.valid.wrapping_add(1);

        let changed = self.last_frame.as_ref() != Some(&frame);
        if changed || !frame.has_any_target() {
            self.last_frame = Some(frame);
            Some(frame)
        } else {
            self.stats.duplicates = self.stats.duplicates.wrapping_add(1);
            None
        }
    }
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    const BLOCK_A: [u8; 8] = [0x0E, 0x83, 0xB1, 0x86, 0x10, 0x80, 0x68, 0x01];

    fn frame_with(block: [u8; 8]) -> DataFrame {
        DataFrame::with_blocks([block, [0; 8], [0; 8]])
    }

    fn feed_all(acc: &mut FrameAccumulator, bytes: &[u8]) -> Vec<DataFrame> {
        bytes.iter().filter_map(|&b| acc.feed(b)).collect()
    }

    #[test]
    fn test_from_bytes_validates_layout() {
        let frame = frame_with(BLOCK_A);
        assert_eq!(DataFrame::from_bytes(frame.as_bytes()), Ok(frame));

        let mut bad = *frame.as_bytes();
        bad[2] = 0x04;
        assert_eq!(DataFrame::from_bytes(&bad), Err(FrameError::Header));

        bad = *frame.as_bytes();
        bad[29] = 0x00;
        assert_eq!(DataFrame::from_bytes(&bad), Err(FrameError::Terminator));

        assert_eq!(
            DataFrame::from_bytes(&frame.as_bytes()[..29]),
            Err(FrameError::Length(29))
        );
    }

    #[test]
    fn test_target_block_offsets() {
        let frame = DataFrame::with_blocks([[1; 8], [2; 8], [3; 8]]);
        assert_eq!(frame.as_bytes()[4], 1);
        assert_eq!(frame.as_bytes()[12], 2);
        assert_eq!(frame.as_bytes()[20], 3);
        assert_eq!(frame.target_block(2), Some(&[3; 8]));
        assert_eq!(frame.target_block(3), None);
    }

    #[test]
    fn test_empty_frame_has_no_target() {
        assert!(!DataFrame::EMPTY.has_any_target());
        assert!(frame_with(BLOCK_A).has_any_target());
    }

    #[test]
    fn test_emits_well_formed_frame() {
        let mut acc = FrameAccumulator::new();
        let frame = frame_with(BLOCK_A);
        let out = feed_all(&mut acc, frame.as_bytes());
        assert_eq!(out, [frame]);
        assert_eq!(acc.buffered(), 0);
    }

    #[test]
    fn test_discards_bytes_until_start_marker() {
        let mut acc = FrameAccumulator::new();
        for b in [0x00, 0x13, 0x55, 0xCC, 0xFF] {
            assert!(acc.feed(b).is_none());
            assert_eq!(acc.buffered(), 0);
        }
        acc.feed(START_MARKER);
        assert_eq!(acc.buffered(), 1);
    }

    #[test]
    fn test_resync_after_garbage() {
        let mut acc = FrameAccumulator::new();
        let frame = frame_with(BLOCK_A);

        let mut stream: Vec<u8> = Vec::new();
        stream.extend_from_slice(&[0x01, 0x7F, 0x55, 0xCC, 0x00, 0x42]);
        // A stray start marker followed by a premature terminator.
        stream.extend_from_slice(&[0xAA, 0x10, 0x20, 0x55, 0xCC]);
        stream.extend_from_slice(&[0x99, 0xEE, 0x03]);
        stream.extend_from_slice(frame.as_bytes());

        let out = feed_all(&mut acc, &stream);
        assert_eq!(out, [frame]);
        assert_eq!(acc.stats().bad_header, 1);
        assert_eq!(acc.stats().undersized, 0);
    }

    #[test]
    fn test_resync_when_garbage_ends_in_start_marker() {
        let mut acc = FrameAccumulator::new();
        let frame = frame_with(BLOCK_A);

        let mut stream: Vec<u8> = Vec::new();
        stream.extend_from_slice(&[0x01, 0x02, START_MARKER]);
        stream.extend_from_slice(frame.as_bytes());

        assert_eq!(feed_all(&mut acc, &stream), [frame]);
        assert_eq!(acc.stats().oversized, 0);
        assert_eq!(acc.stats().valid, 1);
    }

    #[test]
    fn test_repeated_start_markers() {
        let mut acc = FrameAccumulator::new();
        let frame = frame_with(BLOCK_A);

        let mut stream: Vec<u8> = Vec::new();
        stream.extend_from_slice(&[START_MARKER, START_MARKER, 0xFF, 0x03, START_MARKER]);
        stream.extend_from_slice(frame.as_bytes());

        assert_eq!(feed_all(&mut acc, &stream), [frame]);
    }

    #[test]
    fn test_undersized_candidate_with_valid_header() {
        let mut acc = FrameAccumulator::new();
        let mut stream: Vec<u8> = Vec::new();
        stream.extend_from_slice(&FRAME_HEADER);
        stream.extend_from_slice(&[0x01, 0x02]);
        stream.extend_from_slice(&FRAME_TERMINATOR);

        assert!(feed_all(&mut acc, &stream).is_empty());
        assert_eq!(acc.stats().undersized, 1);
        assert_eq!(acc.buffered(), 0);
    }

    #[test]
    fn test_oversized_candidate_dropped() {
        let mut acc = FrameAccumulator::new();
        let frame = frame_with(BLOCK_A);

        // Start marker, then a frame body missing its terminator, then a full frame.
        let mut stream: Vec<u8> = Vec::new();
        stream.extend_from_slice(&frame.as_bytes()[..20]);
        stream.extend_from_slice(frame.as_bytes());

        let out = feed_all(&mut acc, &stream);
        assert!(out.is_empty());
        assert_eq!(acc.stats().oversized, 1);

        // The accumulator recovers on the next frame.
        assert_eq!(feed_all(&mut acc, frame.as_bytes()), [frame]);
    }

    #[test]
    fn test_overflow_resets_buffer() {
        let mut acc = FrameAccumulator::new();
        acc.feed_slice(&FRAME_HEADER);
        for _ in FRAME_HEADER.len()..RAW_BUFFER_CAPACITY {
            acc.feed(0x11);
        }
        assert_eq!(acc.buffered(), RAW_BUFFER_CAPACITY);

        // The next byte forces a reset; a non-marker byte is then discarded.
        assert!(acc.feed(0x11).is_none());
        assert_eq!(acc.buffered(), 0);
        assert_eq!(acc.stats().overflows, 1);

        // A start marker right after the overflow begins a new frame.
        acc.feed(START_MARKER);
        assert_eq!(acc.buffered(), 1);
    }

    #[test]
    fn test_identical_target_frames_suppressed() {
        let mut acc = FrameAccumulator::new();
        let frame = frame_with(BLOCK_A);

        assert_eq!(feed_all(&mut acc, frame.as_bytes()), [frame]);
        assert!(feed_all(&mut acc, frame.as_bytes()).is_empty());
        assert_eq!(acc.stats().duplicates, 1);
        assert_eq!(acc.stats().valid, 2);
    }

    #[test]
    fn test_target_disappearance_propagates() {
        let mut acc = FrameAccumulator::new();
        let frame = frame_with(BLOCK_A);

        feed_all(&mut acc, frame.as_bytes());
        assert_eq!(
            feed_all(&mut acc, DataFrame::EMPTY.as_bytes()),
            [DataFrame::EMPTY]
        );
        // Empty frames keep flowing so hold timers downstream can expire.
        assert_eq!(
            feed_all(&mut acc, DataFrame::EMPTY.as_bytes()),
            [DataFrame::EMPTY]
        );
        assert_eq!(acc.last_frame(), Some(&DataFrame::EMPTY));
    }

    #[test]
    fn test_bad_header_counted() {
        let mut acc = FrameAccumulator::new();
        let mut bytes = *frame_with(BLOCK_A).as_bytes();
        bytes[1] = 0x00;
        assert!(feed_all(&mut acc, &bytes).is_empty());
        assert_eq!(acc.stats().bad_header, 1);
        assert_eq!(acc.stats().valid, 0);
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut acc = FrameAccumulator::new();
        let frame = frame_with(BLOCK_A);
        acc.feed_slice(&frame.as_bytes()[..10]);
        acc.reset();
        assert_eq!(acc.buffered(), 0);
        assert_eq!(acc.feed_slice(frame.as_bytes()), Some(frame));
    }
}
