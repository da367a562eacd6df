//! Link configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shortest autosend interval, used on an idle link (ms)
pub const DEFAULT_AUTOSEND_MIN_MS: u32 = 500;

/// Longest autosend interval, used on a saturated link (ms)
pub const DEFAULT_AUTOSEND_MAX_MS: u32 = 8000;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Stay silent until the first valid frame from the peer arrives
    ///
    /// At least one side of a link must leave this off, or neither will
    /// ever speak first.
    pub wait_for_first_packet: bool,
    /// Autosend interval on an idle link, in clock ticks
    pub autosend_min: u32,
    /// Autosend interval on a saturated link, in clock ticks
    pub autosend_max: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            wait_for_first_packet: true,
            autosend_min: DEFAULT_AUTOSEND_MIN_MS,
            autosend_max: DEFAULT_AUTOSEND_MAX_MS,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Autosend interval of zero would send every step
    ZeroInterval,
    /// Minimum interval is above the maximum
    InvertedBounds,
}

impl LinkConfig {
    /// Configuration for the side that opens the conversation
    pub fn initiator() -> Self {
        Self {
            wait_for_first_packet: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.autosend_min == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.autosend_min > self.autosend_max {
            return Err(ConfigError::InvertedBounds);
        }
        Ok(())
    }
}
