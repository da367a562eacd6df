//! Sub-packet codec
//!
//! A frame payload is a run of `<type:1><data>` sub-packets. The data length
//! is never on the wire: it is the size of the item bound to `type`, or
//! whatever the unknown-packet hook says it consumed.

use core::cell::Cell;

use crate::hooks::LinkHooks;
use crate::registry::{ItemFlags, Registry};

/// Why decoding stopped before the end of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Halt {
    /// Unbound type whose size nobody could tell
    UnknownType(u8),
    /// Bound type with fewer bytes left than its size
    Truncated(u8),
}

/// Result of decoding one payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeOutcome {
    /// Sub-packets delivered to the registry or the hook
    pub packets: usize,
    /// Set when the remainder of the payload was dropped
    pub halted: Option<Halt>,
}

/// Split a validated payload into sub-packets and deliver them
///
/// `hooks.parse_packet` gets the first look at each sub-packet. Otherwise
/// bound types are copied into their regions and unbound types go to
/// `hooks.unknown_packet`. Nothing past `payload` is ever read.
pub fn decode_payload<H: LinkHooks + ?Sized>(
    registry: &mut Registry<'_>,
    hooks: &mut H,
    payload: &[u8],
) -> DecodeOutcome {
    let mut outcome = DecodeOutcome::default();
    let mut rest = payload;

    while let Some((&kind, data)) = rest.split_first() {
        if let Some(claimed) = hooks.parse_packet(kind, data) {
            outcome.packets += 1;
            rest = &data[claimed.min(data.len())..];
            continue;
        }

        let consumed = match registry.size_of(kind) {
            Some(size) if size <= data.len() => {
                registry.mark_received(kind, &data[..size]);
                size
            }
            Some(_) => {
                outcome.halted = Some(Halt::Truncated(kind));
                break;
            }
            None => match hooks.unknown_packet(kind, data).min(data.len()) {
                0 => {
                    outcome.halted = Some(Halt::UnknownType(kind));
                    break;
                }
                n => n,
            },
        };
        outcome.packets += 1;
        rest = &data[consumed..];
    }

    outcome
}

/// Appends whole sub-packets into a bounded payload area
pub struct PayloadBuilder<'b> {
    buf: &'b mut [u8],
    len: usize,
}

impl<'b> PayloadBuilder<'b> {
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Append one sub-packet, or nothing if it does not fit
    pub fn push(&mut self, kind: u8, data: &[u8]) -> bool {
        if 1 + data.len() > self.remaining() {
            return false;
        }
        self.buf[self.len] = kind;
        self.buf[self.len + 1..self.len + 1 + data.len()].copy_from_slice(data);
        self.len += 1 + data.len();
        true
    }

    /// Append one sub-packet whose data is read from a bound region
    pub fn push_region(&mut self, kind: u8, region: &[Cell<u8>]) -> bool {
        if 1 + region.len() > self.remaining() {
            return false;
        }
        self.buf[self.len] = kind;
        for (byte, cell) in self.buf[self.len + 1..].iter_mut().zip(region) {
            *byte = cell.get();
        }
        self.len += 1 + region.len();
        true
    }

    /// Append pre-formatted sub-packets verbatim
    pub fn push_raw(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.remaining() {
            return false;
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        true
    }
}

/// What [`encode_items`] put into a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncodeOutcome {
    /// Payload bytes taken by explicitly queued items
    pub explicit_bytes: usize,
    /// Items included because their autosend was due
    pub autosent: usize,
    /// Due items left for a later frame for lack of space
    pub deferred: usize,
    /// Every autosend item has gone out in the current cycle
    pub cycle_complete: bool,
}

/// Fill a payload from the registry
///
/// Items flagged `TO_SEND` go first. When `autosend_due` is set, autosend
/// items that have not gone out in the current cycle follow. An item that
/// does not fit stays flagged for a later frame; smaller items behind it
/// may still be included. Once every autosend item carries `WAS_AUTO_SENT`
/// the cycle closes and those flags are cleared.
pub fn encode_items(
    registry: &mut Registry<'_>,
    payload: &mut PayloadBuilder<'_>,
    autosend_due: bool,
) -> EncodeOutcome {
    let mut outcome = EncodeOutcome::default();

    for slot in registry.slots_mut().iter_mut() {
        if !slot.flags().contains(ItemFlags::TO_SEND) {
            continue;
        }
        if payload.push_region(slot.id(), slot.region()) {
            outcome.explicit_bytes += 1 + slot.size();
            let flags = slot.flags_mut();
            flags.remove(ItemFlags::TO_SEND);
            if autosend_due && flags.contains(ItemFlags::AUTO_SEND) {
                flags.insert(ItemFlags::WAS_AUTO_SENT);
            }
        } else {
            outcome.deferred += 1;
        }
    }

    if !autosend_due {
        return outcome;
    }

    let pending = ItemFlags::AUTO_SEND;
    let done = ItemFlags::AUTO_SEND | ItemFlags::WAS_AUTO_SENT;
    for slot in registry.slots_mut().iter_mut() {
        let flags = slot.flags();
        if !flags.contains(pending) || flags.contains(done) {
            continue;
        }
        if payload.push_region(slot.id(), slot.region()) {
            slot.flags_mut().insert(ItemFlags::WAS_AUTO_SENT);
            outcome.autosent += 1;
        } else {
            outcome.deferred += 1;
        }
    }

    outcome.cycle_complete = registry
        .iter()
        .filter(|s| s.flags().contains(pending))
        .all(|s| s.flags().contains(done));

    if outcome.cycle_complete {
        registry.reset_cycle();
    }

    outcome
}
