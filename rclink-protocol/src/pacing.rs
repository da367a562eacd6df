//! Autosend pacing
//!
//! The autosend interval stretches with link load so periodic traffic backs
//! off when explicit sends keep the link busy.
//!
//! Load is an 8-bit fixed-point moving average (1/8 weight per sample, full
//! scale [`LOAD_FULL`]). Each built frame contributes the share of the
//! payload capacity taken by explicit sends; each step spent waiting for
//! the transport to drain the previous frame contributes a full-scale
//! sample. Frames carrying only autosend data contribute zero, so an idle
//! link decays back to the minimum interval.
//!
//! The interval is linear in load:
//! `min + (max - min) * load / LOAD_FULL`.

use crate::config::LinkConfig;
use crate::frame::MAX_PAYLOAD_SIZE;

/// Load value of a saturated link
pub const LOAD_FULL: u16 = 256;

/// Moving-average load tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AutoSendPacer {
    load: u16,
}

impl AutoSendPacer {
    pub const fn new() -> Self {
        Self { load: 0 }
    }

    pub fn reset(&mut self) {
        self.load = 0;
    }

    /// Current load, 0..=[`LOAD_FULL`]
    pub fn load(&self) -> u16 {
        self.load
    }

    /// Record a built frame carrying `busy_bytes` of explicitly sent data
    pub fn record_frame(&mut self, busy_bytes: usize) {
        let sample = busy_bytes.min(MAX_PAYLOAD_SIZE) * LOAD_FULL as usize / MAX_PAYLOAD_SIZE;
        self.mix(sample as u16);
    }

    /// Record a step where the transport had not drained the last frame
    pub fn record_stall(&mut self) {
        self.mix(LOAD_FULL);
    }

    fn mix(&mut self, sample: u16) {
        let weighted = self.load as u32 * 7 + sample as u32;
        // Round toward the sample so the average can reach both ends
        self.load = if sample > self.load {
            weighted.div_ceil(8)
        } else {
            weighted / 8
        } as u16;
    }

    /// Ticks between autosend cycles at the current load
    pub fn interval(&self, config: &LinkConfig) -> u32 {
        let span = config.autosend_max.saturating_sub(config.autosend_min) as u64;
        config.autosend_min + (span * self.load as u64 / LOAD_FULL as u64) as u32
    }
}
