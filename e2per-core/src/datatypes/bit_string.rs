//! Bit string type for PER values

use crate::error::{CodecError, CodecResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arbitrary string of bits (zeros and ones). A bit string value can have any length including zero.
///
/// Bits are stored MSB first. The backing buffer always holds exactly
/// `ceil(num_bits / 8)` bytes and the unused trailing bits of the last byte are
/// zero, so two bit strings compare equal exactly when their bits do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBitString")]
pub struct BitString {
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
    num_bits: usize,
}

impl BitString {
    /// Construct a new bit string object.
    ///
    /// # Arguments
    ///
    /// * `bit_string` - The bit string as a byte array
    /// * `num_bits` - The number of bits
    ///
    /// # Errors
    ///
    /// Returns an error if `num_bits > bit_string.len() * 8`. Extra trailing
    /// bytes are dropped and unused bits of the last byte are cleared.
    pub fn new(mut bit_string: Vec<u8>, num_bits: usize) -> CodecResult<Self> {
        if num_bits > bit_string.len() * 8 {
            return Err(CodecError::InvalidData(format!(
                "bit_string is too short to hold all bits. Need {} bytes for {} bits",
                num_bits.div_ceil(8),
                num_bits
            )));
        }

        bit_string.truncate(num_bits.div_ceil(8));
        let unused = bit_string.len() * 8 - num_bits;
        if let Some(last) = bit_string.last_mut() {
            *last &= 0xFFu8 << unused;
        }

        Ok(Self {
            bytes: bit_string,
            num_bits,
        })
    }

    /// Create an empty bit string
    pub fn empty() -> Self {
        Self {
            bytes: Vec::new(),
            num_bits: 0,
        }
    }

    /// Get the bit string as byte array.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The number of bits in the byte array.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Check if the bit string holds no bits
    pub fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    /// Get the bit at a specific position
    ///
    /// # Returns
    /// * `true` if the bit is set, `false` otherwise
    /// * `Err` if the index is out of bounds
    pub fn get_bit(&self, index: usize) -> CodecResult<bool> {
        if index >= self.num_bits {
            return Err(CodecError::InvalidData(format!(
                "Bit index {} out of bounds (num_bits: {})",
                index, self.num_bits
            )));
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8); // MSB first
        Ok((self.bytes[byte_index] >> bit_index) & 1 == 1)
    }

    /// Set the bit at a specific position
    pub fn set_bit(&mut self, index: usize, value: bool) -> CodecResult<()> {
        if index >= self.num_bits {
            return Err(CodecError::InvalidData(format!(
                "Bit index {} out of bounds (num_bits: {})",
                index, self.num_bits
            )));
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8); // MSB first
        if value {
            self.bytes[byte_index] |= 1 << bit_index;
        } else {
            self.bytes[byte_index] &= !(1 << bit_index);
        }
        Ok(())
    }

    /// Iterate over the bits, MSB first
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.num_bits).map(move |i| (self.bytes[i / 8] >> (7 - (i % 8))) & 1 == 1)
    }
}

/// Unchecked serde form; deserialization goes through [`BitString::new`]
#[derive(Deserialize)]
struct RawBitString {
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
    num_bits: usize,
}

impl TryFrom<RawBitString> for BitString {
    type Error = CodecError;

    fn try_from(raw: RawBitString) -> CodecResult<Self> {
        BitString::new(raw.bytes, raw.num_bits)
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{:02X} ", byte)?;
        }
        write!(f, "({} bits)", self.num_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_string_new() {
        let bytes = vec![0xFF, 0x00, 0xAA];
        let bit_string = BitString::new(bytes.clone(), 24).unwrap();
        assert_eq!(bit_string.as_bytes(), &bytes);
        assert_eq!(bit_string.num_bits(), 24);
    }

    #[test]
    fn test_bit_string_invalid() {
        let bytes = vec![0xFF];
        let result = BitString::new(bytes, 16);
        assert!(result.is_err());
    }

    #[test]
    fn test_bit_string_normalizes_unused_bits() {
        // 22 bits: the last two bits of 0x0B are padding
        let a = BitString::new(vec![0xD4, 0xBC, 0x0B, 0xFF], 22).unwrap();
        let b = BitString::new(vec![0xD4, 0xBC, 0x08], 22).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_bytes(), &[0xD4, 0xBC, 0x08]);
    }

    #[test]
    fn test_bit_string_deserialize_checks_length() {
        let result = serde_json::from_str::<BitString>(r#"{"bytes":[],"num_bits":9}"#);
        assert!(result.is_err());

        let bits: BitString = serde_json::from_str(r#"{"bytes":[212,188,11],"num_bits":22}"#).unwrap();
        assert_eq!(bits.as_bytes(), &[0xD4, 0xBC, 0x08]);
        assert_eq!(bits.num_bits(), 22);
    }

    #[test]
    fn test_bit_string_get_set() {
        let mut bits = BitString::new(vec![0x00], 4).unwrap();
        bits.set_bit(1, true).unwrap();
        assert!(bits.get_bit(1).unwrap());
        assert!(!bits.get_bit(0).unwrap());
        assert!(bits.get_bit(4).is_err());
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![false, true, false, false]);
    }
}
