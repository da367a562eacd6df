//! rclink serial control protocol
//!
//! A lightweight link between a microcontroller and a single peer over a
//! byte stream (UART, USB CDC, RawHID...). Many small fixed-size items are
//! multiplexed over one link; items can be pushed on demand or broadcast
//! periodically, and the receiving side polls which items hold fresh data.
//!
//! # Wire format
//!
//! Zero or more sub-packets are framed inside one frame:
//! ```text
//! ┌──────┬──────┬─────────┬──────────┬────────┬─────────────┬────────┬────────┐
//! │ 0x55 │ 0xAA │ FRAMEID │ LASTSEEN │ LENGTH │ PAYLOAD     │ CRC-L  │ CRC-H  │
//! │ 1B   │ 1B   │ 1B      │ 1B       │ 1B     │ 0–57B       │ 1B     │ 1B     │
//! └──────┴──────┴─────────┴──────────┴────────┴─────────────┴────────┴────────┘
//! ```
//!
//! The CRC covers LENGTH and PAYLOAD. The payload is a sequence of
//! `<type:1><data>` sub-packets whose data length is implied by the type,
//! i.e. by the size of the item bound to that id on the receiving side.
//!
//! The magic bytes filter out most false starts from common payloads, line
//! noise and wrong baud rates.
//!
//! # Usage
//!
//! The application owns an [`Engine`], binds byte regions to ids, and calls
//! [`Engine::step`] from its main loop. All work happens inside `step`; no
//! call blocks and nothing is allocated.

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod crc;
pub mod engine;
pub mod frame;
pub mod hooks;
pub mod pacing;
pub mod packet;
pub mod reader;
pub mod registry;
pub mod stats;
pub mod wire;
pub mod writer;

pub use config::{ConfigError, LinkConfig};
pub use engine::Engine;
pub use frame::{
    Frame, FrameError, FrameHeader, FRAME_OVERHEAD, MAGIC, MAX_INBUF_SIZE, MAX_ITEM_SIZE,
    MAX_OUTBUF_SIZE, MAX_PAYLOAD_SIZE,
};
pub use hooks::{DiscardReason, LinkHooks, NoHooks};
pub use registry::{BindError, ItemFlags, Registry, MAX_ITEMS};
pub use stats::LinkStats;
pub use wire::{region_of, Packer, Unpacker, WireError, WireItem};
pub use writer::EnqueueError;
