//! Frame layout and encoding
//!
//! Frame format:
//! - MAGIC (2 bytes): 0x55 0xAA
//! - FRAMEID (1 byte): sender's serial number, never 0
//! - LASTSEEN (1 byte): last FRAMEID accepted from the peer, 0 if none
//! - LENGTH (1 byte): payload length
//! - PAYLOAD (LENGTH bytes): concatenated sub-packets
//! - CHECKSUM (2 bytes): CRC-16 of LENGTH and PAYLOAD, low byte first

use crate::crc::frame_checksum;

/// Start-of-frame sequence
pub const MAGIC: [u8; 2] = [0x55, 0xAA];

/// Magic + frame id + last seen + length
pub const HEADER_SIZE: usize = 5;

/// Trailing CRC-16
pub const CHECKSUM_SIZE: usize = 2;

/// Bytes a frame carries besides its payload
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Input buffer capacity (one RawHID report)
pub const MAX_INBUF_SIZE: usize = 64;

/// Output buffer capacity (one RawHID report)
pub const MAX_OUTBUF_SIZE: usize = 64;

/// Largest payload that fits a frame in the output buffer
pub const MAX_PAYLOAD_SIZE: usize = MAX_OUTBUF_SIZE - FRAME_OVERHEAD;

/// Largest item that fits a frame together with its type byte
pub const MAX_ITEM_SIZE: usize = MAX_PAYLOAD_SIZE - 1;

/// Serial number that means "nothing seen yet"
pub const NO_SERIAL: u8 = 0;

/// Errors that can occur while encoding a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Fixed fields that follow the magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHeader {
    /// Sender's serial number for this frame
    pub frame_id: u8,
    /// Last serial number the sender accepted from us
    pub last_seen: u8,
    /// Payload length in bytes
    pub length: u8,
}

impl FrameHeader {
    /// Read the header of a frame that starts at `bytes[0]`
    ///
    /// Returns `None` if fewer than [`HEADER_SIZE`] bytes are available or
    /// the magic does not match.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE || bytes[..2] != MAGIC {
            return None;
        }
        Some(Self {
            frame_id: bytes[2],
            last_seen: bytes[3],
            length: bytes[4],
        })
    }

    /// Total encoded size of the frame this header announces
    pub fn frame_len(&self) -> usize {
        FRAME_OVERHEAD + self.length as usize
    }
}

/// A validated frame borrowed from the input buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'b> {
    pub header: FrameHeader,
    pub payload: &'b [u8],
}

/// Encode a complete frame into `out`
///
/// Returns the number of bytes written.
pub fn encode_frame(
    frame_id: u8,
    last_seen: u8,
    payload: &[u8],
    out: &mut [u8],
) -> Result<usize, FrameError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge);
    }
    if out.len() < FRAME_OVERHEAD + payload.len() {
        return Err(FrameError::BufferTooSmall);
    }
    out[HEADER_SIZE..HEADER_SIZE + payload.len()].copy_from_slice(payload);
    seal_frame(out, frame_id, last_seen, payload.len())
}

/// Write header and checksum around a payload already placed at
/// `buf[HEADER_SIZE..]`
///
/// Returns the total frame length.
pub fn seal_frame(
    buf: &mut [u8],
    frame_id: u8,
    last_seen: u8,
    payload_len: usize,
) -> Result<usize, FrameError> {
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge);
    }
    let total = FRAME_OVERHEAD + payload_len;
    if buf.len() < total {
        return Err(FrameError::BufferTooSmall);
    }

    let length = payload_len as u8;
    buf[..2].copy_from_slice(&MAGIC);
    buf[2] = frame_id;
    buf[3] = last_seen;
    buf[4] = length;

    let crc = frame_checksum(length, &buf[HEADER_SIZE..HEADER_SIZE + payload_len]);
    buf[total - CHECKSUM_SIZE..total].copy_from_slice(&crc.to_le_bytes());

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::checksum16;

    #[test]
    fn test_encode_empty_payload() {
        let mut buffer = [0u8; 16];
        let len = encode_frame(1, 0, &[], &mut buffer).unwrap();

        assert_eq!(len, 7);
        assert_eq!(&buffer[..5], &[0x55, 0xAA, 1, 0, 0]);
        // CRC-16/ARC of a single zero byte is zero
        assert_eq!(&buffer[5..7], &[0x00, 0x00]);
    }

    #[test]
    fn test_encode_layout() {
        let payload = [0x03, 0x10, 0x20];
        let mut buffer = [0u8; 16];
        let len = encode_frame(7, 42, &payload, &mut buffer).unwrap();

        assert_eq!(len, 10);
        assert_eq!(&buffer[..5], &[0x55, 0xAA, 7, 42, 3]);
        assert_eq!(&buffer[5..8], &payload);

        let crc = checksum16(&[3, 0x03, 0x10, 0x20]);
        assert_eq!(buffer[8], (crc & 0xFF) as u8); // low byte first
        assert_eq!(buffer[9], (crc >> 8) as u8);
    }

    #[test]
    fn test_payload_too_large() {
        let payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let mut buffer = [0u8; 128];
        assert_eq!(
            encode_frame(1, 0, &payload, &mut buffer),
            Err(FrameError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_buffer_too_small() {
        let mut buffer = [0u8; 8];
        assert_eq!(
            encode_frame(1, 0, &[1, 2], &mut buffer),
            Err(FrameError::BufferTooSmall)
        );
    }

    #[test]
    fn test_max_payload_fills_output_buffer() {
        let payload = [0x5A; MAX_PAYLOAD_SIZE];
        let mut buffer = [0u8; MAX_OUTBUF_SIZE];
        assert_eq!(encode_frame(9, 8, &payload, &mut buffer), Ok(MAX_OUTBUF_SIZE));
    }

    #[test]
    fn test_header_parse() {
        let header = FrameHeader::parse(&[0x55, 0xAA, 3, 2, 9]).unwrap();
        assert_eq!(header.frame_id, 3);
        assert_eq!(header.last_seen, 2);
        assert_eq!(header.length, 9);
        assert_eq!(header.frame_len(), 16);

        assert!(FrameHeader::parse(&[0x55, 0xAA, 3, 2]).is_none());
        assert!(FrameHeader::parse(&[0x55, 0xAB, 3, 2, 9]).is_none());
    }
}
