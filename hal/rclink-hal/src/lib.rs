//! rclink Hardware Abstraction Layer
//!
//! This crate defines the two boundaries the link engine talks through,
//! so the same protocol code runs on any board (or on the host, in tests):
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (rclink-firmware, etc.)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  rclink-protocol (engine)               │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  rclink-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  rclink-hal-  │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`serial::SerialRx`], [`serial::SerialTx`] - Non-blocking byte transport
//! - [`clock::Clock`] - Monotonic millisecond tick source

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod serial;

pub use clock::{Clock, ManualClock};
pub use serial::{Serial, SerialRx, SerialTx, UartConfig};
