//! Link clock backed by the embassy time driver

use embassy_time::Instant;
use rclink_hal::Clock;

/// Milliseconds since boot, truncated to 32 bits
///
/// The truncation wraps after ~49 days, which the engine tolerates.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}
