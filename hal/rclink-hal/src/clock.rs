//! Monotonic time source
//!
//! The engine only needs a non-decreasing millisecond counter. It is
//! allowed to wrap; consumers compare ticks with `wrapping_sub`.

use core::cell::Cell;

/// Monotonic millisecond clock
pub trait Clock {
    /// Current time in milliseconds
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Clock that only moves when told to
///
/// Useful for host-side simulation and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    /// Create a clock reading `start`
    pub const fn new(start: u32) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Move time forward by `delta_ms`, wrapping on overflow
    pub fn advance(&self, delta_ms: u32) {
        self.now.set(self.now.get().wrapping_add(delta_ms));
    }

    /// Jump to an absolute time
    pub fn set(&self, now_ms: u32) {
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}
