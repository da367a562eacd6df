//! Serial byte transport abstractions
//!
//! The link engine is poll-driven: every call made through these traits
//! must return immediately with whatever the hardware can do right now.
//! Partial reads and writes are normal.

/// Serial transmitter
pub trait SerialTx {
    /// Error type for transmit operations
    type Error;

    /// Queue as many bytes of `data` as the port accepts without blocking
    ///
    /// Returns the number of bytes accepted, which may be zero.
    fn write_nonblocking(&mut self, data: &[u8]) -> Result<usize, Self::Error>;
}

/// Serial receiver
pub trait SerialRx {
    /// Error type for receive operations
    type Error;

    /// Copy already-received bytes into `buf` without blocking
    ///
    /// Returns the number of bytes copied, which may be zero.
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Combined serial interface
///
/// For ports that provide both directions on a single peripheral.
pub trait Serial: SerialTx + SerialRx {}

// Blanket implementation
impl<T: SerialTx + SerialRx> Serial for T {}

impl<T: SerialTx + ?Sized> SerialTx for &mut T {
    type Error = T::Error;

    fn write_nonblocking(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        (**self).write_nonblocking(data)
    }
}

impl<T: SerialRx + ?Sized> SerialRx for &mut T {
    type Error = T::Error;

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read_nonblocking(buf)
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sink {
        accepted: usize,
        budget: usize,
    }

    impl SerialTx for Sink {
        type Error = ();

        fn write_nonblocking(&mut self, data: &[u8]) -> Result<usize, ()> {
            let n = data.len().min(self.budget);
            self.budget -= n;
            self.accepted += n;
            Ok(n)
        }
    }

    fn push_through<W: SerialTx>(mut tx: W, data: &[u8]) -> usize {
        tx.write_nonblocking(data).unwrap_or(0)
    }

    #[test]
    fn test_mut_ref_forwards_partial_write() {
        let mut sink = Sink {
            accepted: 0,
            budget: 3,
        };
        assert_eq!(push_through(&mut sink, &[1, 2, 3, 4, 5]), 3);
        assert_eq!(push_through(&mut sink, &[6]), 0);
        assert_eq!(sink.accepted, 3);
    }

    #[test]
    fn test_default_uart_config() {
        let config = UartConfig::default();
        assert_eq!(config.baudrate, 115200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
    }
}
