//! Link counters

/// Running totals since the last `Engine::begin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Frames that passed validation
    pub frames_received: u32,
    /// Frames built and handed to the transport
    pub frames_sent: u32,
    /// Candidates rejected for a bad checksum
    pub checksum_errors: u32,
    /// Candidates rejected for an impossible length
    pub length_errors: u32,
    /// Bytes reported to the discard hook
    ///
    /// Rejected candidates can overlap, and each report counts its whole
    /// candidate, so this may exceed the number of bytes received.
    pub bytes_discarded: u32,
    /// Frames whose payload could not be fully decoded
    pub undecoded_frames: u32,
    /// Failed transport reads or writes
    pub transport_errors: u32,
    /// Steps where the previous frame was still waiting for the transport
    pub write_stalls: u32,
}

impl LinkStats {
    pub const fn new() -> Self {
        Self {
            frames_received: 0,
            frames_sent: 0,
            checksum_errors: 0,
            length_errors: 0,
            bytes_discarded: 0,
            undecoded_frames: 0,
            transport_errors: 0,
            write_stalls: 0,
        }
    }

    /// Frames rejected for any reason
    pub fn frames_rejected(&self) -> u32 {
        self.checksum_errors.saturating_add(self.length_errors)
    }
}
