//! UART trait and error types.

/// Error type for UART operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError {
    /// Peripheral I/O error.
    Io,
    /// Receive overrun, bytes were lost.
    Overrun,
    /// Line framing error.
    Framing,
    /// The port could not be reconfigured.
    Reconfigure,
}

impl core::fmt::Display for UartError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "uart i/o error"),
            Self::Overrun => write!(f, "uart overrun"),
            Self::Framing => write!(f, "uart framing error"),
            Self::Reconfigure => write!(f, "uart reconfigure failed"),
        }
    }
}

/// The sensor's serial port.
///
/// Reads never block: with nothing buffered, [`read`](Self::read) returns
/// `Ok(0)`. Whoever owns the port drives both frame reading and command
/// sequences, never at the same time.
pub trait RadarUart {
    /// Copy buffered bytes into `buf`, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, UartError>;

    /// Write all of `bytes`.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), UartError>;

    /// `true` when at least one byte can be read.
    fn available(&mut self) -> bool;

    /// Close the port.
    fn close(&mut self);

    /// Open the port again at `baud`.
    fn open(&mut self, baud: u32) -> Result<(), UartError>;

    /// Discard everything currently buffered on the receive side.
    fn drain(&mut self) {
        let mut scratch = [0u8; 32];
        while self.available() {
            match self.read(&mut scratch) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }
}

impl<T: RadarUart + ?Sized> RadarUart for &mut T {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, UartError> {
        (**self).read(buf)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), UartError> {
        (**self).write_all(bytes)
    }

    fn available(&mut self) -> bool {
        (**self).available()
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn open(&mut self, baud: u32) -> Result<(), UartError> {
        (**self).open(baud)
    }

    fn drain(&mut self) {
        (**self).drain();
    }
}
