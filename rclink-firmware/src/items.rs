//! Items exchanged with the transmitter
//!
//! Both ends must agree on ids and layouts. Everything is little-endian
//! with no padding; see the `pack`/`unpack` field order.

use rclink_protocol::{Packer, Unpacker, WireItem};

/// Stick and switch positions, sent by the transmitter
pub const CONTROL_ID: u8 = 0x01;

/// Receiver status, autosent back to the transmitter
pub const TELEMETRY_ID: u8 = 0x02;

/// Switch bit: outputs are live
pub const SWITCH_ARMED: u8 = 0x01;

/// Switch bit: lights on
pub const SWITCH_LIGHTS: u8 = 0x02;

/// Stick positions from the transmitter
///
/// Axes run from -1000 to 1000 with 0 at center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct ControlInputs {
    pub throttle: i16,
    pub steering: i16,
    pub switches: u8,
}

impl ControlInputs {
    /// What outputs fall back to when the link goes quiet
    pub const FAILSAFE: Self = Self {
        throttle: 0,
        steering: 0,
        switches: 0,
    };

    pub fn armed(&self) -> bool {
        self.switches & SWITCH_ARMED != 0
    }

    /// Clamp both axes into range
    pub fn clamped(self) -> Self {
        Self {
            throttle: self.throttle.clamp(-1000, 1000),
            steering: self.steering.clamp(-1000, 1000),
            switches: self.switches,
        }
    }
}

impl WireItem for ControlInputs {
    const WIRE_SIZE: usize = 5;

    fn pack(&self, out: &mut [u8]) {
        Packer::new(out)
            .put(&self.throttle)
            .put(&self.steering)
            .put(&self.switches);
    }

    fn unpack(bytes: &[u8]) -> Self {
        let mut r = Unpacker::new(bytes);
        Self {
            throttle: r.get(),
            steering: r.get(),
            switches: r.get(),
        }
    }
}

/// Receiver health report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, defmt::Format)]
pub struct Telemetry {
    /// Supply voltage in millivolts
    pub battery_mv: u16,
    /// Seconds since boot
    pub uptime_s: u32,
    /// Frames rejected since the link started, saturating
    pub link_errors: u16,
    /// Whether outputs are currently in failsafe
    pub failsafe: bool,
}

impl WireItem for Telemetry {
    const WIRE_SIZE: usize = 9;

    fn pack(&self, out: &mut [u8]) {
        Packer::new(out)
            .put(&self.battery_mv)
            .put(&self.uptime_s)
            .put(&self.link_errors)
            .put(&self.failsafe);
    }

    fn unpack(bytes: &[u8]) -> Self {
        let mut r = Unpacker::new(bytes);
        Self {
            battery_mv: r.get(),
            uptime_s: r.get(),
            link_errors: r.get(),
            failsafe: r.get(),
        }
    }
}
