//! RP2040 support for the rclink serial control link
//!
//! This crate implements the `rclink-hal` traits on top of embassy-rp:
//!
//! - [`uart::LinkUart`] - buffered UART halves as a non-blocking link port
//! - [`uart::gpio_to_uart`] - which UART a GPIO can be routed to
//! - [`clock::EmbassyClock`] - millisecond ticks from the embassy time driver

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod uart;

pub use clock::EmbassyClock;
pub use uart::{LinkUart, UartId};
