//! Buffered UART as a link port
//!
//! The interrupt-driven ring buffers of `BufferedUart` do the actual
//! transfer. Reads and writes here only move bytes between those rings and
//! the engine, and return at once when nothing can move.

use core::task::Poll;

use embassy_futures::poll_once;
use embassy_rp::uart::{self, BufferedUartRx, BufferedUartTx, DataBits, Parity, StopBits};
use embedded_io_async::{Read, Write};
use rclink_hal::{serial, SerialRx, SerialTx, UartConfig};

/// UART peripheral identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartId {
    Uart0,
    Uart1,
}

/// Determine which UART can use a given GPIO pin
pub fn gpio_to_uart(gpio: u8) -> Option<UartId> {
    // UART0: GPIO 0/1, 12/13, 16/17, 28/29
    // UART1: GPIO 4/5, 8/9, 20/21, 24/25
    match gpio {
        0 | 1 | 12 | 13 | 16 | 17 | 28 | 29 => Some(UartId::Uart0),
        4 | 5 | 8 | 9 | 20 | 21 | 24 | 25 => Some(UartId::Uart1),
        _ => None,
    }
}

/// Check that a TX/RX pin pair belongs to a single UART
pub fn pin_pair_uart(tx: u8, rx: u8) -> Option<UartId> {
    let id = gpio_to_uart(tx)?;
    (gpio_to_uart(rx)? == id && tx != rx).then_some(id)
}

/// Translate a board-neutral UART configuration for embassy-rp
pub fn to_rp_config(config: &UartConfig) -> uart::Config {
    let mut rp = uart::Config::default();
    rp.baudrate = config.baudrate;
    rp.data_bits = match config.data_bits {
        serial::DataBits::Seven => DataBits::DataBits7,
        serial::DataBits::Eight => DataBits::DataBits8,
    };
    rp.parity = match config.parity {
        serial::Parity::None => Parity::ParityNone,
        serial::Parity::Even => Parity::ParityEven,
        serial::Parity::Odd => Parity::ParityOdd,
    };
    rp.stop_bits = match config.stop_bits {
        serial::StopBits::One => StopBits::STOP1,
        serial::StopBits::Two => StopBits::STOP2,
    };
    rp
}

/// Both halves of a buffered UART, polled without waiting
pub struct LinkUart {
    tx: BufferedUartTx,
    rx: BufferedUartRx,
}

impl LinkUart {
    pub fn new(tx: BufferedUartTx, rx: BufferedUartRx) -> Self {
        Self { tx, rx }
    }

    /// Give the halves back
    pub fn split(self) -> (BufferedUartTx, BufferedUartRx) {
        (self.tx, self.rx)
    }
}

impl SerialTx for LinkUart {
    type Error = uart::Error;

    fn write_nonblocking(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        if data.is_empty() {
            return Ok(0);
        }
        match poll_once(self.tx.write(data)) {
            Poll::Ready(result) => result,
            Poll::Pending => Ok(0),
        }
    }
}

impl SerialRx for LinkUart {
    type Error = uart::Error;

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        match poll_once(self.rx.read(buf)) {
            Poll::Ready(result) => result,
            Poll::Pending => Ok(0),
        }
    }
}
