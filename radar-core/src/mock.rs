//! In-memory platform for host tests.
//!
//! [`MockUart`] records everything written and serves injected bytes. It can
//! also play the sensor's part in a command exchange: replies queued with
//! [`MockUart::reply_on_close`] are released when a Close command is written.
//! [`MockClock`] is a shared, manually driven clock that also creeps forward a
//! little on every read, so busy-waits always terminate.

extern crate std;

use core::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use radar_proto::{AckFrame, Command, DataFrame};

use crate::clock::Clock;
use crate::uart::{RadarUart, UartError};

/// Mock sensor serial port.
#[derive(Debug, Default)]
pub struct MockUart {
    rx: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
    on_close: VecDeque<Vec<u8>>,
    open: bool,
    baud: u32,
    open_calls: u32,
    close_calls: u32,
    fail_writes: bool,
}

impl MockUart {
    #[must_use]
    pub fn new() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }

    /// Inject receive data.
    pub fn inject_rx_data(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    /// Inject one data frame.
    pub fn inject_frame(&mut self, frame: &DataFrame) {
        self.inject_rx_data(frame.as_bytes());
    }

    /// Queue a reply released when the next Close command is written.
    pub fn reply_on_close(&mut self, reply: &[u8]) {
        self.on_close.push_back(reply.to_vec());
    }

    /// Queue the acknowledgements a sensor sends for one Open/Set/Close
    /// sequence, in the order given.
    pub fn ack_sequence(&mut self, acks: &[AckFrame]) {
        let reply: Vec<u8> = acks.iter().flat_map(|a| a.to_bytes()).collect();
        self.reply_on_close(&reply);
    }

    /// Make every write fail with [`UartError::Io`].
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Every write, in order.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// All transmitted bytes, concatenated.
    pub fn tx_buffer(&self) -> Vec<u8> {
        self.writes.concat()
    }

    pub fn clear_tx_buffer(&mut self) {
        self.writes.clear();
    }

    /// Bytes not yet read.
    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud
    }

    pub fn open_calls(&self) -> u32 {
        self.open_calls
    }

    pub fn close_calls(&self) -> u32 {
        self.close_calls
    }
}

impl RadarUart for MockUart {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, UartError> {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), UartError> {
        if self.fail_writes {
            return Err(UartError::Io);
        }
        self.writes.push(bytes.to_vec());
        if bytes == Command::Close.frame().as_bytes() {
            if let Some(reply) = self.on_close.pop_front() {
                self.rx.extend(reply);
            }
        }
        Ok(())
    }

    fn available(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn close(&mut self) {
        self.open = false;
        self.close_calls += 1;
    }

    fn open(&mut self, baud: u32) -> Result<(), UartError> {
        self.open = true;
        self.baud = baud;
        self.open_calls += 1;
        Ok(())
    }
}

/// Shared mock clock. Clones observe the same time.
#[derive(Debug, Clone)]
pub struct MockClock {
    now_us: Rc<Cell<u64>>,
    creep_us: u64,
}

impl MockClock {
    /// Start at zero, creeping 100 µs per read.
    #[must_use]
    pub fn new() -> Self {
        Self::with_creep(100)
    }

    /// Start at zero, creeping `creep_us` per read.
    #[must_use]
    pub fn with_creep(creep_us: u64) -> Self {
        Self {
            now_us: Rc::new(Cell::new(0)),
            creep_us,
        }
    }

    pub fn set_millis(&self, ms: u64) {
        self.now_us.set(ms * 1_000);
    }

    pub fn advance_millis(&self, ms: u64) {
        self.now_us.set(self.now_us.get() + ms * 1_000);
    }

    /// Current time without creeping.
    pub fn peek_millis(&self) -> u64 {
        self.now_us.get() / 1_000
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_micros(&self) -> u64 {
        let now = self.now_us.get();
        self.now_us.set(now + self.creep_us);
        now
    }
}
