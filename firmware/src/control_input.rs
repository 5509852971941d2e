//! Line-based control commands over UART.
//!
//! Each line is one command (see [`ControlCommand`]). Carriage returns and
//! surrounding whitespace are trimmed by the parser; replies are written back
//! on the same port, one per line.
//!
//! # Pins
//!
//! Uses UART0 by default:
//! - GPIO 0: TX
//! - GPIO 1: RX

use embassy_rp::uart::{Async, Error as RpUartError, UartRx, UartTx};
use heapless::Vec;
use radar_core::{ControlCommand, ControlError, UartError, MAX_COMMAND_LEN};

/// Error reading a control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum ControlInputError {
    Uart(UartError),
    Command(ControlError),
}

impl From<ControlError> for ControlInputError {
    fn from(e: ControlError) -> Self {
        Self::Command(e)
    }
}

/// Convert UART errors to [`UartError`].
///
/// A helper instead of a `From` impl, both types live in other crates.
#[inline]
fn rp_error_to_uart_error(e: RpUartError) -> UartError {
    match e {
        RpUartError::Framing => UartError::Framing,
        RpUartError::Overrun => UartError::Overrun,
        _ => UartError::Io,
    }
}

/// Reads control commands from a UART receiver.
pub struct ControlInput<'d> {
    rx: UartRx<'d, Async>,
    buffer: Vec<u8, MAX_COMMAND_LEN>,
}

impl<'d> ControlInput<'d> {
    #[must_use]
    pub fn new(rx: UartRx<'d, Async>) -> Self {
        Self {
            rx,
            buffer: Vec::new(),
        }
    }

    /// Wait for the next line and parse it.
    pub async fn receive(&mut self) -> Result<ControlCommand, ControlInputError> {
        self.read_line().await?;
        Ok(ControlCommand::parse_bytes(&self.buffer)?)
    }

    /// Read bytes until a newline is found or the buffer is full.
    ///
    /// An overlong line is discarded up to its newline.
    async fn read_line(&mut self) -> Result<(), ControlInputError> {
        self.buffer.clear();
        let mut byte = [0u8; 1];

        loop {
            self.read_byte(&mut byte).await?;

            if byte[0] == b'\n' {
                return Ok(());
            }

            if self.buffer.push(byte[0]).is_err() {
                let mut len = self.buffer.len() + 1;
                loop {
                    self.read_byte(&mut byte).await?;
                    if byte[0] == b'\n' {
                        break;
                    }
                    len += 1;
                }
                return Err(ControlError::TooLong(len).into());
            }
        }
    }

    async fn read_byte(&mut self, byte: &mut [u8; 1]) -> Result<(), ControlInputError> {
        self.rx
            .read(byte)
            .await
            .map_err(|e| ControlInputError::Uart(rp_error_to_uart_error(e)))
    }
}

/// Writes replies to the control port.
pub struct ControlOutput<'d> {
    tx: UartTx<'d, Async>,
}

impl<'d> ControlOutput<'d> {
    #[must_use]
    pub fn new(tx: UartTx<'d, Async>) -> Self {
        Self { tx }
    }

    /// Write `text` followed by a line break.
    pub async fn send_line(&mut self, text: &str) -> Result<(), UartError> {
        self.tx
            .write(text.as_bytes())
            .await
            .map_err(rp_error_to_uart_error)?;
        self.tx.write(b"\r\n").await.map_err(rp_error_to_uart_error)
    }
}
