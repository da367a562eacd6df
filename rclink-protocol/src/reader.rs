//! Incoming frame detection
//!
//! The reader keeps whatever bytes the transport delivered in a fixed
//! buffer whose first byte is always the earliest unconsumed byte. Each
//! poll walks the buffer: bytes that cannot start a frame are skipped
//! silently, complete candidates are validated, and the walk stops as soon
//! as more input is needed. It never waits for data it does not have.
//!
//! A rejected candidate (impossible length or bad checksum) is reported
//! whole to the discard sink, but only its two magic bytes are consumed.
//! Scanning then resumes at the byte after them, so a genuine frame that
//! starts inside the rejected candidate is still found.

use rclink_hal::SerialRx;

use crate::crc::frame_checksum;
use crate::frame::{
    Frame, FrameHeader, CHECKSUM_SIZE, HEADER_SIZE, MAGIC, MAX_INBUF_SIZE,
};
use crate::hooks::DiscardReason;

/// Where the reader stopped on its last poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadState {
    /// Looking for the magic sequence
    Scanning,
    /// Have the magic, waiting for frame id, last seen and length
    HeaderWait,
    /// Have the header, waiting for payload bytes
    PayloadWait,
    /// Have the payload, waiting for the checksum
    ChecksumWait,
}

/// Something the reader wants the engine to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderEvent<'b> {
    /// A frame passed validation
    Frame(Frame<'b>),
    /// A framed candidate was rejected
    Discard {
        bytes: &'b [u8],
        reason: DiscardReason,
    },
}

enum Verdict {
    Skip,
    NeedMore(ReadState),
    Reject(usize, DiscardReason),
    Accept(FrameHeader),
}

/// Input buffer and frame scanner
#[derive(Debug, Clone)]
pub struct FrameReader {
    buf: [u8; MAX_INBUF_SIZE],
    len: usize,
    state: ReadState,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReader {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_INBUF_SIZE],
            len: 0,
            state: ReadState::Scanning,
        }
    }

    /// Drop all buffered input
    pub fn reset(&mut self) {
        self.len = 0;
        self.state = ReadState::Scanning;
    }

    pub fn state(&self) -> ReadState {
        self.state
    }

    /// Bytes waiting in the input buffer
    pub fn buffered(&self) -> usize {
        self.len
    }

    /// Free space in the input buffer
    pub fn space(&self) -> usize {
        MAX_INBUF_SIZE - self.len
    }

    /// Pull whatever the transport has ready into the free space
    ///
    /// Returns the number of bytes added.
    pub fn fill<R: SerialRx + ?Sized>(&mut self, rx: &mut R) -> Result<usize, R::Error> {
        if self.len == MAX_INBUF_SIZE {
            return Ok(0);
        }
        let free = &mut self.buf[self.len..];
        let n = rx.read_nonblocking(free)?.min(free.len());
        self.len += n;
        Ok(n)
    }

    /// Append bytes directly, up to the free space
    ///
    /// Returns the number of bytes taken.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.space());
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        n
    }

    /// Process buffered bytes until more input is needed
    ///
    /// `sink` sees each accepted frame and each rejected candidate, in
    /// stream order. Returns the number of frames accepted.
    pub fn poll<F>(&mut self, mut sink: F) -> usize
    where
        F: FnMut(ReaderEvent<'_>),
    {
        let mut accepted = 0;
        loop {
            match self.examine() {
                Verdict::Skip => self.consume(1),
                Verdict::NeedMore(state) => {
                    self.state = state;
                    return accepted;
                }
                Verdict::Reject(candidate_len, reason) => {
                    sink(ReaderEvent::Discard {
                        bytes: &self.buf[..candidate_len],
                        reason,
                    });
                    self.consume(MAGIC.len());
                }
                Verdict::Accept(header) => {
                    let end = HEADER_SIZE + header.length as usize;
                    sink(ReaderEvent::Frame(Frame {
                        header,
                        payload: &self.buf[HEADER_SIZE..end],
                    }));
                    self.consume(header.frame_len());
                    accepted += 1;
                }
            }
        }
    }

    fn examine(&self) -> Verdict {
        let data = &self.buf[..self.len];

        match data {
            [] => return Verdict::NeedMore(ReadState::Scanning),
            [first, ..] if *first != MAGIC[0] => return Verdict::Skip,
            [_] => return Verdict::NeedMore(ReadState::Scanning),
            [_, second, ..] if *second != MAGIC[1] => return Verdict::Skip,
            _ => {}
        }

        let Some(header) = FrameHeader::parse(data) else {
            return Verdict::NeedMore(ReadState::HeaderWait);
        };

        let total = header.frame_len();
        if total > MAX_INBUF_SIZE {
            return Verdict::Reject(HEADER_SIZE, DiscardReason::BadLength);
        }

        let payload_end = HEADER_SIZE + header.length as usize;
        if data.len() < payload_end {
            return Verdict::NeedMore(ReadState::PayloadWait);
        }
        if data.len() < total {
            return Verdict::NeedMore(ReadState::ChecksumWait);
        }

        let payload = &data[HEADER_SIZE..payload_end];
        let received = u16::from_le_bytes([data[payload_end], data[payload_end + 1]]);
        debug_assert_eq!(payload_end + CHECKSUM_SIZE, total);

        if received != frame_checksum(header.length, payload) {
            return Verdict::Reject(total, DiscardReason::BadChecksum);
        }
        Verdict::Accept(header)
    }

    fn consume(&mut self, n: usize) {
        let n = n.min(self.len);
        self.buf.copy_within(n..self.len, 0);
        self.len -= n;
    }
}
