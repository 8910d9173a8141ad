//! PER building-block decoder
//!
//! Mirror of [`PerEncoder`](crate::per::PerEncoder). Every read is bounds
//! checked; malformed input surfaces as an error, never a panic.

use crate::per::constraint::{bits_for_range, Constraint};
use crate::per::encoder::{is_printable, printable_char_bits};
use crate::per::source::BitSource;
use crate::per::{LENGTH_FRAGMENT_LIMIT, MAX_CONSTRAINED_LENGTH};
use e2per_core::{Alignment, BitString, CodecError, CodecResult};

/// PER decoder reading from a borrowed bit source
pub struct PerDecoder<'s, S: BitSource> {
    source: &'s mut S,
    alignment: Alignment,
}

impl<'s, S: BitSource> PerDecoder<'s, S> {
    pub fn new(source: &'s mut S, alignment: Alignment) -> Self {
        Self { source, alignment }
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Access the underlying source
    pub fn source(&mut self) -> &mut S {
        self.source
    }

    /// Skip padding to the next octet boundary in the aligned variant
    pub fn align(&mut self) {
        if self.alignment.is_aligned() {
            self.source.align_to_byte();
        }
    }

    pub fn read_bit(&mut self) -> CodecResult<bool> {
        self.source.read_bit()
    }

    pub fn read_bits(&mut self, count: usize) -> CodecResult<u64> {
        self.source.read_bits(count)
    }

    /// Decode the offset of a value inside a range of `range` values
    ///
    /// The offset is returned as read; callers check it against the range.
    pub fn decode_constrained_offset(&mut self, range: u128) -> CodecResult<u64> {
        if range <= 1 {
            return Ok(0);
        }
        let bits = bits_for_range(range);

        if !self.alignment.is_aligned() || range <= 255 {
            return self.source.read_bits(bits);
        }

        if range == 256 {
            self.source.align_to_byte();
            self.source.read_bits(8)
        } else if range <= 65536 {
            self.source.align_to_byte();
            self.source.read_bits(16)
        } else {
            let max_octets = bits.div_ceil(8);
            let octets = self.decode_constrained_offset(max_octets as u128)? as usize + 1;
            if octets > max_octets {
                return Err(CodecError::InvalidData(format!(
                    "constrained whole number uses {} octets, range allows {}",
                    octets, max_octets
                )));
            }
            self.source.align_to_byte();
            self.source.read_bits(octets * 8)
        }
    }

    /// Decode a constrained whole number in `lower..=upper`
    ///
    /// # Errors
    /// `RangeViolation` if the offset on the wire lies beyond `upper`.
    pub fn decode_constrained_whole_number(&mut self, lower: i64, upper: i64) -> CodecResult<i64> {
        let range = (upper as i128 - lower as i128) as u128 + 1;
        let offset = self.decode_constrained_offset(range)?;
        let value = lower as i128 + offset as i128;
        if value > upper as i128 {
            return Err(CodecError::RangeViolation {
                value: i64::try_from(value).unwrap_or(i64::MAX),
                lower,
                upper,
            });
        }
        Ok(value as i64)
    }

    /// Decode a semi-constrained whole number `lower..MAX`
    pub fn decode_semi_constrained_whole_number(&mut self, lower: i64) -> CodecResult<i64> {
        let octets = self.decode_length_determinant()?;
        let offset = self.read_octets_as_unsigned(octets)?;
        let value = lower as i128 + offset as i128;
        i64::try_from(value).map_err(|_| CodecError::RangeViolation {
            value: i64::MAX,
            lower,
            upper: i64::MAX,
        })
    }

    /// Decode an unconstrained whole number in two's complement
    pub fn decode_unconstrained_whole_number(&mut self) -> CodecResult<i64> {
        let octets = self.decode_length_determinant()?;
        let raw = self.read_octets_as_unsigned(octets)?;
        // Sign-extend from the top bit of the first octet
        let shift = 64 - octets * 8;
        Ok(((raw << shift) as i64) >> shift)
    }

    /// Decode a normally small non-negative whole number
    pub fn decode_normally_small_non_negative(&mut self) -> CodecResult<u64> {
        if !self.source.read_bit()? {
            self.source.read_bits(6)
        } else {
            Ok(self.decode_semi_constrained_whole_number(0)? as u64)
        }
    }

    /// Decode a normally small length, always at least one
    pub fn decode_normally_small_length(&mut self) -> CodecResult<usize> {
        if !self.source.read_bit()? {
            Ok(self.source.read_bits(6)? as usize + 1)
        } else {
            let length = self.decode_length_determinant()?;
            if length == 0 {
                return Err(CodecError::MalformedBitmap(
                    "extension bitmap with zero length".to_string(),
                ));
            }
            Ok(length)
        }
    }

    /// Decode an unconstrained length determinant
    ///
    /// # Errors
    /// `UnsupportedConstruct` for the fragmented form (`11xxxxxx`).
    pub fn decode_length_determinant(&mut self) -> CodecResult<usize> {
        self.align();
        let first = self.source.read_bits(8)?;
        if first & 0x80 == 0 {
            Ok(first as usize)
        } else if first & 0x40 == 0 {
            let second = self.source.read_bits(8)?;
            Ok((((first & 0x3F) << 8) | second) as usize)
        } else {
            Err(CodecError::UnsupportedConstruct(format!(
                "fragmented length determinant (header 0x{:02X}, fragments of {} octets)",
                first,
                LENGTH_FRAGMENT_LIMIT
            )))
        }
    }

    /// Decode an INTEGER under its constraint
    pub fn decode_integer(&mut self, constraint: &Constraint) -> CodecResult<i64> {
        if constraint.is_extensible() && self.source.read_bit()? {
            return self.decode_unconstrained_whole_number();
        }

        match (constraint.lower(), constraint.upper()) {
            (Some(lower), Some(upper)) => self.decode_constrained_whole_number(lower, upper),
            (Some(lower), None) => self.decode_semi_constrained_whole_number(lower),
            _ => self.decode_unconstrained_whole_number(),
        }
    }

    /// Decode the length prefix of a size-constrained item
    pub fn decode_size(&mut self, size: &Constraint, unit_bits: usize) -> CodecResult<usize> {
        let extended = size.is_extensible() && self.source.read_bit()?;

        match (extended, size.lower(), size.upper()) {
            (false, Some(lower), Some(upper)) if upper < MAX_CONSTRAINED_LENGTH => {
                let length = if lower == upper {
                    lower
                } else {
                    self.decode_constrained_whole_number(lower, upper)
                        .map_err(|e| match e {
                            CodecError::RangeViolation { value, .. } => CodecError::SizeViolation {
                                length: usize::try_from(value).unwrap_or(usize::MAX),
                                lower,
                                upper,
                            },
                            other => other,
                        })?
                };
                if upper as usize * unit_bits > 16 {
                    self.align();
                }
                usize::try_from(length).map_err(|_| CodecError::SizeViolation {
                    length: 0,
                    lower,
                    upper,
                })
            }
            (false, lower, upper) => {
                let length = self.decode_length_determinant()?;
                if lower.is_some_and(|lower| (length as i64) < lower) {
                    return Err(CodecError::SizeViolation {
                        length,
                        lower: lower.unwrap_or(0),
                        upper: upper.unwrap_or(i64::MAX),
                    });
                }
                Ok(length)
            }
            (true, _, _) => self.decode_length_determinant(),
        }
    }

    /// Decode a BIT STRING
    pub fn decode_bit_string(&mut self, size: &Constraint) -> CodecResult<BitString> {
        let num_bits = self.decode_size(size, 1)?;
        let available = self.source.bits_remaining();
        if num_bits > available {
            return Err(CodecError::TruncatedInput {
                needed: num_bits,
                available,
            });
        }
        let mut bytes = self.source.read_bytes(num_bits / 8)?;
        let rest = num_bits % 8;
        if rest != 0 {
            let tail = self.source.read_bits(rest)? as u8;
            bytes.push(tail << (8 - rest));
        }
        BitString::new(bytes, num_bits)
    }

    /// Decode an OCTET STRING
    pub fn decode_octet_string(&mut self, size: &Constraint) -> CodecResult<Vec<u8>> {
        let length = self.decode_size(size, 8)?;
        self.source.read_bytes(length)
    }

    /// Decode a PrintableString
    pub fn decode_printable_string(&mut self, size: &Constraint) -> CodecResult<String> {
        let char_bits = printable_char_bits(self.alignment);
        let length = self.decode_size(size, char_bits)?;
        let available = self.source.bits_remaining();
        if length.saturating_mul(char_bits) > available {
            return Err(CodecError::TruncatedInput {
                needed: length.saturating_mul(char_bits),
                available,
            });
        }

        let mut text = String::with_capacity(length);
        for _ in 0..length {
            let c = char::from(self.source.read_bits(char_bits)? as u8);
            if !is_printable(c) {
                return Err(CodecError::InvalidData(format!(
                    "character {:?} is not in the PrintableString alphabet",
                    c
                )));
            }
            text.push(c);
        }
        Ok(text)
    }

    /// Decode an open type, returning its octets
    pub fn decode_open_type(&mut self, max_length: usize) -> CodecResult<Vec<u8>> {
        let length = self.decode_length_determinant()?;
        if length > max_length {
            return Err(CodecError::InvalidData(format!(
                "open type of {} octets exceeds the limit of {}",
                length, max_length
            )));
        }
        self.source.read_bytes(length)
    }

    fn read_octets_as_unsigned(&mut self, octets: usize) -> CodecResult<u64> {
        match octets {
            0 => Err(CodecError::InvalidData("zero-length integer encoding".to_string())),
            1..=8 => self.source.read_bits(octets * 8),
            _ => Err(CodecError::UnsupportedConstruct(format!(
                "integer of {} octets does not fit 64 bits",
                octets
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::per::encoder::PerEncoder;
    use crate::per::sink::BitWriter;
    use crate::per::source::BitReader;

    fn decoder_for(bytes: &[u8]) -> BitReader<'_> {
        BitReader::new(bytes)
    }

    #[test]
    fn test_decode_extensible_integer() {
        let arp = Constraint::extensible(1, 15);
        let mut reader = decoder_for(&[0x70]);
        let mut decoder = PerDecoder::new(&mut reader, Alignment::Aligned);
        assert_eq!(decoder.decode_integer(&arp).unwrap(), 15);

        let mut reader = decoder_for(&[0x80, 0x01, 0x79]);
        let mut decoder = PerDecoder::new(&mut reader, Alignment::Aligned);
        assert_eq!(decoder.decode_integer(&arp).unwrap(), 121);
    }

    #[test]
    fn test_decode_indefinite_length_integer() {
        let id = Constraint::range(0, 68_719_476_735);
        let mut reader = decoder_for(&[0x20, 0x04, 0xD2]);
        let mut decoder = PerDecoder::new(&mut reader, Alignment::Aligned);
        assert_eq!(decoder.decode_integer(&id).unwrap(), 1234);
    }

    #[test]
    fn test_decode_offset_out_of_range() {
        // 3 bits for 0..4, offset 7 on the wire
        let mut reader = decoder_for(&[0b1110_0000]);
        let mut decoder = PerDecoder::new(&mut reader, Alignment::Aligned);
        assert!(matches!(
            decoder.decode_constrained_whole_number(0, 4),
            Err(CodecError::RangeViolation { .. })
        ));
    }

    #[test]
    fn test_decode_negative_unconstrained() {
        for value in [-1i64, -128, -129, 0, 127, 128, i64::MIN, i64::MAX] {
            let mut writer = BitWriter::new();
            PerEncoder::new(&mut writer, Alignment::Aligned)
                .encode_unconstrained_whole_number(value)
                .unwrap();
            let bytes = writer.into_bytes();
            let mut reader = BitReader::new(&bytes);
            let mut decoder = PerDecoder::new(&mut reader, Alignment::Aligned);
            assert_eq!(decoder.decode_unconstrained_whole_number().unwrap(), value);
        }
    }

    #[test]
    fn test_fragmented_length_rejected() {
        let mut reader = decoder_for(&[0xC1, 0x00]);
        let mut decoder = PerDecoder::new(&mut reader, Alignment::Aligned);
        assert!(matches!(
            decoder.decode_length_determinant(),
            Err(CodecError::UnsupportedConstruct(_))
        ));
    }

    #[test]
    fn test_decode_unconstrained_octet_string() {
        let mut reader = decoder_for(&[0x06, 0x53, 0x6F, 0x6D, 0x65, 0x55, 0x45]);
        let mut decoder = PerDecoder::new(&mut reader, Alignment::Aligned);
        assert_eq!(
            decoder.decode_octet_string(&Constraint::unconstrained()).unwrap(),
            b"SomeUE".to_vec()
        );
    }

    #[test]
    fn test_decode_bit_string_truncated() {
        // Claims 36 bits, carries 16
        let mut reader = decoder_for(&[0xD4, 0xBC]);
        let mut decoder = PerDecoder::new(&mut reader, Alignment::Aligned);
        assert!(matches!(
            decoder.decode_bit_string(&Constraint::fixed(36)),
            Err(CodecError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_open_type_limit() {
        let mut reader = decoder_for(&[0x03, 0x01, 0x02, 0x03]);
        let mut decoder = PerDecoder::new(&mut reader, Alignment::Aligned);
        assert!(decoder.decode_open_type(2).is_err());
    }

    #[test]
    fn test_printable_string_unaligned() {
        let mut writer = BitWriter::new();
        PerEncoder::new(&mut writer, Alignment::Unaligned)
            .encode_printable_string("RAN 1", &Constraint::range(1, 150))
            .unwrap();
        let bytes = writer.into_bytes();
        // 8-bit length + 5 * 7-bit characters
        assert_eq!(bytes.len(), 6);

        let mut reader = BitReader::new(&bytes);
        let mut decoder = PerDecoder::new(&mut reader, Alignment::Unaligned);
        assert_eq!(
            decoder.decode_printable_string(&Constraint::range(1, 150)).unwrap(),
            "RAN 1"
        );
    }
}
