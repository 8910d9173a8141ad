//! Bit sink: the write side of the PER bit I/O service
//!
//! # Usage Example
//!
//! ```rust
//! use e2per_asn1::per::{BitSink, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3)?;
//! writer.align_to_byte();
//! writer.write_bytes(&[0xAB])?;
//! assert_eq!(&writer.into_bytes()[..], &[0xA0, 0xAB]);
//! # Ok::<(), e2per_core::CodecError>(())
//! ```

use bitvec::prelude::*;
use bytes::Bytes;
use e2per_core::{CodecError, CodecResult};

/// A deferred fixed-width field written as zeros and filled in later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    offset: usize,
    width: usize,
}

impl Reservation {
    /// Bit offset of the reserved field
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Width of the reserved field in bits
    pub fn width(&self) -> usize {
        self.width
    }
}

/// Append-only bit sink
///
/// Bits are written MSB first. Implementations must preserve exact call order.
pub trait BitSink {
    /// Write the low `count` bits of `value`, most significant first (`count <= 64`)
    fn write_bits(&mut self, value: u64, count: usize) -> CodecResult<()>;

    /// Write raw octets at the current bit position
    fn write_bytes(&mut self, bytes: &[u8]) -> CodecResult<()>;

    /// Pad with zero bits up to the next octet boundary
    fn align_to_byte(&mut self);

    /// Number of bits written so far
    fn bit_position(&self) -> usize;

    /// Reserve a `count`-bit field to be backpatched later
    fn reserve(&mut self, count: usize) -> CodecResult<Reservation>;

    /// Fill a previously reserved field
    fn backpatch(&mut self, reservation: Reservation, value: u64) -> CodecResult<()>;

    /// Write a single bit
    fn write_bit(&mut self, bit: bool) -> CodecResult<()> {
        self.write_bits(bit as u64, 1)
    }
}

/// In-memory bit sink backed by a `BitVec`
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    buffer: BitVec<u8, Msb0>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            buffer: BitVec::new(),
        }
    }

    /// Check if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Finish writing: pad to an octet boundary and return the bytes
    pub fn into_bytes(mut self) -> Bytes {
        self.align_to_byte();
        Bytes::from(self.buffer.into_vec())
    }
}

impl BitSink for BitWriter {
    fn write_bits(&mut self, value: u64, count: usize) -> CodecResult<()> {
        if count > 64 {
            return Err(CodecError::InvalidData(format!(
                "Cannot write {} bits at once (max 64)",
                count
            )));
        }
        for i in (0..count).rev() {
            self.buffer.push((value >> i) & 1 == 1);
        }
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.buffer.extend_from_bitslice(bytes.view_bits::<Msb0>());
        Ok(())
    }

    fn align_to_byte(&mut self) {
        let remainder = self.buffer.len() % 8;
        if remainder != 0 {
            self.buffer.resize(self.buffer.len() + 8 - remainder, false);
        }
    }

    fn bit_position(&self) -> usize {
        self.buffer.len()
    }

    fn reserve(&mut self, count: usize) -> CodecResult<Reservation> {
        let offset = self.buffer.len();
        self.write_bits(0, count)?;
        Ok(Reservation {
            offset,
            width: count,
        })
    }

    fn backpatch(&mut self, reservation: Reservation, value: u64) -> CodecResult<()> {
        let Reservation { offset, width } = reservation;
        if offset + width > self.buffer.len() {
            return Err(CodecError::InvalidData(format!(
                "Reservation at bit {} (width {}) lies outside the sink",
                offset, width
            )));
        }
        if width < 64 && value >> width != 0 {
            return Err(CodecError::InvalidData(format!(
                "Value {} does not fit the {}-bit reserved field",
                value, width
            )));
        }
        for i in 0..width {
            let bit = (value >> (width - 1 - i)) & 1 == 1;
            self.buffer.set(offset + i, bit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bits_msb_first() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b1, 1).unwrap();
        writer.write_bits(0b0110, 4).unwrap();
        assert_eq!(writer.bit_position(), 5);
        assert_eq!(&writer.into_bytes()[..], &[0b1011_0000]);
    }

    #[test]
    fn test_write_bytes_unaligned() {
        let mut writer = BitWriter::new();
        writer.write_bit(true).unwrap();
        writer.write_bytes(&[0xFF]).unwrap();
        assert_eq!(&writer.into_bytes()[..], &[0xFF, 0x80]);
    }

    #[test]
    fn test_reserve_and_backpatch() {
        let mut writer = BitWriter::new();
        writer.write_bytes(&[0xA0]).unwrap();
        let slot = writer.reserve(16).unwrap();
        writer.write_bytes(&[0x01, 0x02, 0x03]).unwrap();
        writer.backpatch(slot, 3).unwrap();
        assert_eq!(&writer.into_bytes()[..], &[0xA0, 0x00, 0x03, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_backpatch_overflow() {
        let mut writer = BitWriter::new();
        let slot = writer.reserve(4).unwrap();
        assert!(writer.backpatch(slot, 16).is_err());
    }

    #[test]
    fn test_too_many_bits() {
        let mut writer = BitWriter::new();
        assert!(writer.write_bits(0, 65).is_err());
    }
}
