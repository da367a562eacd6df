//! Frame checksum
//!
//! CRC-16/ARC (reflected 0x8005, initial value 0), the same CRC-16 the
//! AVR/Teensy `crc16` utility computes, so the peer can be a plain C
//! implementation.

use crc::{Crc, CRC_16_ARC};

const LINK_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// CRC-16 of a byte range
pub fn checksum16(bytes: &[u8]) -> u16 {
    LINK_CRC.checksum(bytes)
}

/// CRC-16 of a frame: the length byte followed by the payload
pub fn frame_checksum(length: u8, payload: &[u8]) -> u16 {
    let mut digest = LINK_CRC.digest();
    digest.update(&[length]);
    digest.update(payload);
    digest.finalize()
}
