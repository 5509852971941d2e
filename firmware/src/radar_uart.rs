//! [`RadarUart`] over a buffered, interrupt-driven UART.
//!
//! The radar port is polled from the radar task, so reads must never block:
//! [`IoUart::read`] checks [`ReadReady`] first and returns `Ok(0)` when the
//! receive buffer is empty.
//!
//! Close and open are logical. The buffered driver keeps the peripheral
//! running for the life of the program, configured once at startup:
//! `close` flushes pending output and stops reads and writes, and
//! `open` drains whatever arrived meanwhile and re-enables the
//! port. Opening at a baud rate other than the configured one fails with
//! [`UartError::Reconfigure`].
//!
//! # Pins
//!
//! Uses UART1 by default:
//! - GPIO 4: TX (to radar RX)
//! - GPIO 5: RX (from radar TX)

use defmt::{debug, info};
use embedded_io::{Error as _, ErrorKind, Read, ReadReady, Write};
use radar_core::{RadarUart, UartError};

/// Convert an `embedded-io` error kind to [`UartError`].
#[inline]
fn io_error_to_uart_error(kind: ErrorKind) -> UartError {
    match kind {
        ErrorKind::OutOfMemory => UartError::Overrun,
        ErrorKind::InvalidData => UartError::Framing,
        _ => UartError::Io,
    }
}

/// A [`RadarUart`] backed by any blocking `embedded-io` port.
pub struct IoUart<T> {
    port: T,
    open: bool,
    baud: u32,
}

impl<T> IoUart<T> {
    /// Wrap a port that is already configured at `baud`.
    #[must_use]
    pub fn new(port: T, baud: u32) -> Self {
        Self {
            port,
            open: true,
            baud,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[inline]
    #[must_use]
    pub fn baud(&self) -> u32 {
        self.baud
    }

    /// Get a mutable reference to the wrapped port.
    pub fn port_mut(&mut self) -> &mut T {
        &mut self.port
    }
}

impl<T: Read + ReadReady + Write> RadarUart for IoUart<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, UartError> {
        if !self.open || buf.is_empty() {
            return Ok(0);
        }
        match self.port.read_ready() {
            Ok(true) => {}
            Ok(false) => return Ok(0),
            Err(e) => return Err(io_error_to_uart_error(e.kind())),
        }
        self.port
            .read(buf)
            .map_err(|e| io_error_to_uart_error(e.kind()))
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), UartError> {
        if !self.open {
            return Err(UartError::Io);
        }
        self.port
            .write_all(bytes)
            .map_err(|e| io_error_to_uart_error(e.kind()))
    }

    fn available(&mut self) -> bool {
        self.open && self.port.read_ready().unwrap_or(false)
    }

    fn close(&mut self) {
        if let Err(e) = self.port.flush() {
            debug!("flush before close failed: {:?}", e.kind());
        }
        self.open = false;
    }

    fn open(&mut self, baud: u32) -> Result<(), UartError> {
        if baud != self.baud {
            // The buffered driver is configured once at startup.
            return Err(UartError::Reconfigure);
        }
        self.open = true;
        self.drain();
        info!("radar uart open at {} baud", baud);
        Ok(())
    }
}
