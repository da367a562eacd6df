//! Bound regions and item serialization
//!
//! A bound item is a byte region owned by the application and shared with
//! the engine as `&[Cell<u8>]`. The engine copies received bytes into it
//! and reads it when sending, all from inside `Engine::step`; the
//! application reads and writes it between steps.
//!
//! The bytes in a region are the item's wire representation. Native values
//! go through [`WireItem`], an explicit little-endian pack/unpack pair, so
//! in-memory layout (alignment, byte order, padding) never leaks onto the
//! link and both ends can evolve their structs independently.

use core::cell::Cell;

use crate::frame::MAX_ITEM_SIZE;

/// Errors from typed access to a bound item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    /// No item is bound to the id
    NotBound,
    /// The region size does not match the type's wire size
    SizeMismatch { expected: usize, actual: usize },
}

/// Share a byte buffer with the engine
pub fn region_of(bytes: &mut [u8]) -> &[Cell<u8>] {
    Cell::from_mut(bytes).as_slice_of_cells()
}

/// Whether two regions are the same memory
///
/// A sub-slice sharing the start of a region is a different region.
pub fn same_region(a: &[Cell<u8>], b: &[Cell<u8>]) -> bool {
    core::ptr::eq(a.as_ptr(), b.as_ptr()) && a.len() == b.len()
}

/// Copy `src` into `region`, bounded by the shorter of the two
///
/// Returns the number of bytes written.
pub fn write_region(region: &[Cell<u8>], src: &[u8]) -> usize {
    let n = region.len().min(src.len());
    for (cell, &byte) in region.iter().zip(&src[..n]) {
        cell.set(byte);
    }
    n
}

/// Copy `region` into `out`, bounded by the shorter of the two
///
/// Returns the number of bytes read.
pub fn read_region(region: &[Cell<u8>], out: &mut [u8]) -> usize {
    let n = region.len().min(out.len());
    for (byte, cell) in out[..n].iter_mut().zip(region) {
        *byte = cell.get();
    }
    n
}

/// Fixed-size wire representation of a value
///
/// `pack` is always given exactly `WIRE_SIZE` bytes and `unpack` always
/// receives exactly `WIRE_SIZE` bytes.
pub trait WireItem: Sized {
    /// Encoded size in bytes
    const WIRE_SIZE: usize;

    /// Encode into `out`
    fn pack(&self, out: &mut [u8]);

    /// Decode from `bytes`
    fn unpack(bytes: &[u8]) -> Self;
}

macro_rules! impl_wire_le {
    ($($ty:ty),* $(,)?) => {
        $(
            impl WireItem for $ty {
                const WIRE_SIZE: usize = core::mem::size_of::<$ty>();

                fn pack(&self, out: &mut [u8]) {
                    out[..Self::WIRE_SIZE].copy_from_slice(&self.to_le_bytes());
                }

                fn unpack(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::WIRE_SIZE]);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_wire_le!(u8, i8, u16, i16, u32, i32, f32);

impl WireItem for bool {
    const WIRE_SIZE: usize = 1;

    fn pack(&self, out: &mut [u8]) {
        out[0] = *self as u8;
    }

    fn unpack(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

impl<const N: usize> WireItem for [u8; N] {
    const WIRE_SIZE: usize = N;

    fn pack(&self, out: &mut [u8]) {
        out[..N].copy_from_slice(self);
    }

    fn unpack(bytes: &[u8]) -> Self {
        let mut raw = [0u8; N];
        raw.copy_from_slice(&bytes[..N]);
        raw
    }
}

/// Sequential writer for composing [`WireItem::pack`] implementations
pub struct Packer<'b> {
    buf: &'b mut [u8],
    pos: usize,
}

impl<'b> Packer<'b> {
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Append one field
    pub fn put<T: WireItem>(&mut self, value: &T) -> &mut Self {
        value.pack(&mut self.buf[self.pos..self.pos + T::WIRE_SIZE]);
        self.pos += T::WIRE_SIZE;
        self
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.pos
    }
}

/// Sequential reader for composing [`WireItem::unpack`] implementations
pub struct Unpacker<'b> {
    buf: &'b [u8],
    pos: usize,
}

impl<'b> Unpacker<'b> {
    pub fn new(buf: &'b [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Read the next field
    pub fn get<T: WireItem>(&mut self) -> T {
        let value = T::unpack(&self.buf[self.pos..self.pos + T::WIRE_SIZE]);
        self.pos += T::WIRE_SIZE;
        value
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }
}

fn check_size<T: WireItem>(region: &[Cell<u8>]) -> Result<(), WireError> {
    if region.len() != T::WIRE_SIZE || T::WIRE_SIZE > MAX_ITEM_SIZE {
        return Err(WireError::SizeMismatch {
            expected: T::WIRE_SIZE,
            actual: region.len(),
        });
    }
    Ok(())
}

/// Pack `value` into a region of exactly its wire size
pub fn store<T: WireItem>(region: &[Cell<u8>], value: &T) -> Result<(), WireError> {
    check_size::<T>(region)?;
    let mut scratch = [0u8; MAX_ITEM_SIZE];
    value.pack(&mut scratch[..T::WIRE_SIZE]);
    write_region(region, &scratch[..T::WIRE_SIZE]);
    Ok(())
}

/// Unpack a value from a region of exactly its wire size
pub fn load<T: WireItem>(region: &[Cell<u8>]) -> Result<T, WireError> {
    check_size::<T>(region)?;
    let mut scratch = [0u8; MAX_ITEM_SIZE];
    read_region(region, &mut scratch[..T::WIRE_SIZE]);
    Ok(T::unpack(&scratch[..T::WIRE_SIZE]))
}
