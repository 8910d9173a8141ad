//! Bit source: the read side of the PER bit I/O service

use bitvec::prelude::*;
use e2per_core::{CodecError, CodecResult};

/// Sequential bit source
///
/// Every read fails with `TruncatedInput` when fewer bits remain than requested.
pub trait BitSource {
    /// Read `count` bits (`count <= 64`) as an unsigned value, MSB first
    fn read_bits(&mut self, count: usize) -> CodecResult<u64>;

    /// Read `n` octets starting at the current bit position
    fn read_bytes(&mut self, n: usize) -> CodecResult<Vec<u8>>;

    /// Skip to the next octet boundary
    fn align_to_byte(&mut self);

    /// Number of unread bits
    fn bits_remaining(&self) -> usize;

    /// Number of bits consumed so far
    fn bit_position(&self) -> usize;

    /// Read a single bit
    fn read_bit(&mut self) -> CodecResult<bool> {
        Ok(self.read_bits(1)? == 1)
    }
}

/// Bit source over a borrowed byte slice
pub struct BitReader<'a> {
    bytes: &'a [u8],
    data: &'a BitSlice<u8, Msb0>,
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            data: bytes.view_bits::<Msb0>(),
            position: 0,
        }
    }

    fn ensure(&self, needed: usize) -> CodecResult<()> {
        let available = self.bits_remaining();
        if needed > available {
            return Err(CodecError::TruncatedInput { needed, available });
        }
        Ok(())
    }
}

impl BitSource for BitReader<'_> {
    fn read_bits(&mut self, count: usize) -> CodecResult<u64> {
        if count > 64 {
            return Err(CodecError::InvalidData(format!(
                "Cannot read {} bits at once (max 64)",
                count
            )));
        }
        self.ensure(count)?;

        let mut value: u64 = 0;
        for bit in &self.data[self.position..self.position + count] {
            value = (value << 1) | (*bit as u64);
        }
        self.position += count;
        Ok(value)
    }

    fn read_bytes(&mut self, n: usize) -> CodecResult<Vec<u8>> {
        let needed = n.checked_mul(8).ok_or(CodecError::TruncatedInput {
            needed: usize::MAX,
            available: self.bits_remaining(),
        })?;
        self.ensure(needed)?;

        if self.position % 8 == 0 {
            let start = self.position / 8;
            self.position += needed;
            return Ok(self.bytes[start..start + n].to_vec());
        }

        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_bits(8)? as u8);
        }
        Ok(out)
    }

    fn align_to_byte(&mut self) {
        let remainder = self.position % 8;
        if remainder != 0 {
            self.position = (self.position + 8 - remainder).min(self.data.len());
        }
    }

    fn bits_remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    fn bit_position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits() {
        let data = [0b1011_0000];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(4).unwrap(), 0b0110);
        assert_eq!(reader.bits_remaining(), 3);
    }

    #[test]
    fn test_read_bytes_unaligned() {
        let data = [0xFF, 0x80];
        let mut reader = BitReader::new(&data);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bytes(1).unwrap(), vec![0xFF]);
    }

    #[test]
    fn test_truncated_input() {
        let data = [0x00];
        let mut reader = BitReader::new(&data);
        reader.read_bits(5).unwrap();
        assert_eq!(
            reader.read_bits(4),
            Err(CodecError::TruncatedInput {
                needed: 4,
                available: 3
            })
        );
        assert!(matches!(reader.read_bytes(1), Err(CodecError::TruncatedInput { .. })));
    }

    #[test]
    fn test_align() {
        let data = [0x00, 0xAB];
        let mut reader = BitReader::new(&data);
        reader.read_bits(3).unwrap();
        reader.align_to_byte();
        assert_eq!(reader.bit_position(), 8);
        assert_eq!(reader.read_bytes(1).unwrap(), vec![0xAB]);
    }
}
