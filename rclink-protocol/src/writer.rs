//! Outgoing frame construction
//!
//! At most one frame is held at a time. It is built in place in the output
//! buffer and handed to the transport; whatever the transport does not
//! accept stays in the buffer and is retried on later steps before any new
//! frame is built, so a stalled frame keeps its serial number and contents.

use heapless::Vec;
use rclink_hal::SerialTx;

use crate::frame::{
    seal_frame, FrameError, HEADER_SIZE, MAX_ITEM_SIZE, MAX_OUTBUF_SIZE, MAX_PAYLOAD_SIZE,
    NO_SERIAL,
};
use crate::packet::PayloadBuilder;

/// Errors from queuing an ad hoc payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnqueueError {
    /// Data can never fit in a frame
    PayloadTooLarge,
    /// Not enough staging space left right now
    BufferFull,
}

/// Frame that was just built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BuiltFrame {
    pub frame_id: u8,
    /// Total bytes including header and checksum
    pub len: usize,
    /// Payload bytes that came from `enqueue_payload`
    pub staged_bytes: usize,
}

/// Output buffer, send cursor and outgoing serial number
#[derive(Debug, Clone)]
pub struct FrameWriter {
    buf: [u8; MAX_OUTBUF_SIZE],
    len: usize,
    sent: usize,
    serial: u8,
    staged: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameWriter {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_OUTBUF_SIZE],
            len: 0,
            sent: 0,
            serial: NO_SERIAL,
            staged: Vec::new(),
        }
    }

    /// Forget the pending frame, staged data and serial number
    pub fn reset(&mut self) {
        self.len = 0;
        self.sent = 0;
        self.serial = NO_SERIAL;
        self.staged.clear();
    }

    /// Serial number of the most recently built frame, 0 if none
    pub fn serial(&self) -> u8 {
        self.serial
    }

    /// A built frame still has bytes the transport has not taken
    pub fn is_pending(&self) -> bool {
        self.sent < self.len
    }

    /// Bytes of the pending frame not yet handed to the transport
    pub fn pending_bytes(&self) -> usize {
        self.len - self.sent
    }

    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Free staging space, in payload bytes
    pub fn staging_space(&self) -> usize {
        self.staged.capacity() - self.staged.len()
    }

    fn next_serial(&mut self) -> u8 {
        self.serial = self.serial.wrapping_add(1);
        if self.serial == NO_SERIAL {
            self.serial = 1;
        }
        self.serial
    }

    /// Queue a `<kind><data>` sub-packet for the next frame
    ///
    /// Either the whole sub-packet is queued or nothing changes.
    pub fn stage(&mut self, kind: u8, data: &[u8]) -> Result<(), EnqueueError> {
        if data.len() > MAX_ITEM_SIZE {
            return Err(EnqueueError::PayloadTooLarge);
        }
        if 1 + data.len() > self.staging_space() {
            return Err(EnqueueError::BufferFull);
        }
        self.staged
            .push(kind)
            .map_err(|_| EnqueueError::BufferFull)?;
        self.staged
            .extend_from_slice(data)
            .map_err(|_| EnqueueError::BufferFull)
    }

    /// Build the next frame
    ///
    /// Staged sub-packets go first, then `fill` adds whatever it wants.
    /// The caller must not build while a frame [`is_pending`](Self::is_pending).
    pub fn build<T, F>(&mut self, last_seen: u8, fill: F) -> Result<(BuiltFrame, T), FrameError>
    where
        F: FnOnce(&mut PayloadBuilder<'_>) -> T,
    {
        debug_assert!(!self.is_pending());

        let area = &mut self.buf[HEADER_SIZE..HEADER_SIZE + MAX_PAYLOAD_SIZE];
        let mut payload = PayloadBuilder::new(area);
        let staged_bytes = if payload.push_raw(&self.staged) {
            self.staged.len()
        } else {
            0
        };
        let extra = fill(&mut payload);
        let payload_len = payload.len();

        if staged_bytes > 0 {
            self.staged.clear();
        }

        let frame_id = self.next_serial();
        let len = seal_frame(&mut self.buf, frame_id, last_seen, payload_len)?;
        self.len = len;
        self.sent = 0;

        Ok((
            BuiltFrame {
                frame_id,
                len,
                staged_bytes,
            },
            extra,
        ))
    }

    /// Hand pending bytes to the transport
    ///
    /// Returns the number of bytes it accepted.
    pub fn flush<W: SerialTx + ?Sized>(&mut self, tx: &mut W) -> Result<usize, W::Error> {
        if !self.is_pending() {
            return Ok(0);
        }
        let pending = &self.buf[self.sent..self.len];
        let n = tx.write_nonblocking(pending)?.min(pending.len());
        self.sent += n;
        if self.sent == self.len {
            self.len = 0;
            self.sent = 0;
        }
        Ok(n)
    }

    /// Bytes of the pending frame not yet sent
    pub fn pending(&self) -> &[u8] {
        &self.buf[self.sent..self.len]
    }
}
