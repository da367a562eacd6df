//! Application hooks
//!
//! Extension points the engine calls from inside `step`. Every method has a
//! do-nothing default, so implement only what you need.

use crate::frame::FrameHeader;

/// Why the reader abandoned a framed candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscardReason {
    /// Declared length cannot fit the input buffer
    BadLength,
    /// Checksum mismatch
    BadChecksum,
}

/// Callbacks for traffic the registry does not handle by itself
pub trait LinkHooks {
    /// A frame passed validation and is about to be decoded
    fn frame_received(&mut self, _header: &FrameHeader, _payload: &[u8]) {}

    /// Take over decoding of a sub-packet before the registry sees it
    ///
    /// Called for every sub-packet, bound or not. Return `Some(n)` to claim
    /// the sub-packet and `n` bytes of `remaining` as its data; the bound
    /// item, if any, is left untouched. `None` keeps the default handling.
    fn parse_packet(&mut self, _kind: u8, _remaining: &[u8]) -> Option<usize> {
        None
    }

    /// A sub-packet with an unbound type arrived
    ///
    /// `remaining` is everything left in the frame after the type byte.
    /// Return how many of those bytes belong to this sub-packet. Returning
    /// 0 means the size is unknown: the rest of the frame is dropped rather
    /// than guessing where the next sub-packet starts.
    fn unknown_packet(&mut self, _kind: u8, _remaining: &[u8]) -> usize {
        0
    }

    /// A corrupt frame candidate is being abandoned
    ///
    /// `bytes` is the whole candidate, but only its two magic bytes are
    /// consumed: the rest is scanned again, so some of these bytes may
    /// still turn up in a valid frame or in a later discard report.
    /// Not called for bytes skipped while hunting for the magic sequence.
    fn discarding_data(&mut self, _bytes: &[u8], _reason: DiscardReason) {}
}

/// Hooks that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl LinkHooks for NoHooks {}

impl<H: LinkHooks + ?Sized> LinkHooks for &mut H {
    fn frame_received(&mut self, header: &FrameHeader, payload: &[u8]) {
        (**self).frame_received(header, payload)
    }

    fn parse_packet(&mut self, kind: u8, remaining: &[u8]) -> Option<usize> {
        (**self).parse_packet(kind, remaining)
    }

    fn unknown_packet(&mut self, kind: u8, remaining: &[u8]) -> usize {
        (**self).unknown_packet(kind, remaining)
    }

    fn discarding_data(&mut self, bytes: &[u8], reason: DiscardReason) {
        (**self).discarding_data(bytes, reason)
    }
}
