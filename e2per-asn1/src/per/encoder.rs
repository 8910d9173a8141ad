//! PER building-block encoder
//!
//! Encodes the X.691 primitives every ASN.1 type is composed of: constrained,
//! semi-constrained and unconstrained whole numbers, length determinants,
//! normally small numbers and size-constrained strings. The same code serves
//! both the aligned and the unaligned variant; alignment points are no-ops in
//! the unaligned one.

use crate::per::constraint::{bits_for_range, Constraint, RangeCheck};
use crate::per::sink::BitSink;
use crate::per::{LENGTH_FRAGMENT_LIMIT, MAX_CONSTRAINED_LENGTH};
use e2per_core::{Alignment, BitString, CodecError, CodecResult};

/// PER encoder writing into a borrowed bit sink
pub struct PerEncoder<'s, S: BitSink> {
    sink: &'s mut S,
    alignment: Alignment,
}

impl<'s, S: BitSink> PerEncoder<'s, S> {
    pub fn new(sink: &'s mut S, alignment: Alignment) -> Self {
        Self { sink, alignment }
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Access the underlying sink
    pub fn sink(&mut self) -> &mut S {
        self.sink
    }

    /// Octet-align in the aligned variant
    pub fn align(&mut self) {
        if self.alignment.is_aligned() {
            self.sink.align_to_byte();
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> CodecResult<()> {
        self.sink.write_bit(bit)
    }

    pub fn write_bits(&mut self, value: u64, count: usize) -> CodecResult<()> {
        self.sink.write_bits(value, count)
    }

    /// Encode the offset of a value inside a range of `range` values (X.691 11.5.7)
    pub fn encode_constrained_offset(&mut self, offset: u64, range: u128) -> CodecResult<()> {
        if range <= 1 {
            return Ok(());
        }
        let bits = bits_for_range(range);

        if !self.alignment.is_aligned() || range <= 255 {
            // Bit-field case: minimal bits, no alignment
            return self.sink.write_bits(offset, bits);
        }

        if range == 256 {
            // One-octet case
            self.sink.align_to_byte();
            self.sink.write_bits(offset, 8)
        } else if range <= 65536 {
            // Two-octet case
            self.sink.align_to_byte();
            self.sink.write_bits(offset, 16)
        } else {
            // Indefinite-length case: octet count, then the minimal octets
            let max_octets = bits.div_ceil(8);
            let octets = minimal_octets(offset);
            self.encode_constrained_offset((octets - 1) as u64, max_octets as u128)?;
            self.sink.align_to_byte();
            self.sink.write_bits(offset, octets * 8)
        }
    }

    /// Encode a constrained whole number in `lower..=upper` (X.691 11.5)
    pub fn encode_constrained_whole_number(&mut self, value: i64, lower: i64, upper: i64) -> CodecResult<()> {
        if value < lower || value > upper {
            return Err(CodecError::RangeViolation { value, lower, upper });
        }
        let range = (upper as i128 - lower as i128) as u128 + 1;
        let offset = (value as i128 - lower as i128) as u64;
        self.encode_constrained_offset(offset, range)
    }

    /// Encode a semi-constrained whole number `lower..MAX` (X.691 11.7)
    pub fn encode_semi_constrained_whole_number(&mut self, value: i64, lower: i64) -> CodecResult<()> {
        if value < lower {
            return Err(CodecError::RangeViolation {
                value,
                lower,
                upper: i64::MAX,
            });
        }
        let offset = (value as i128 - lower as i128) as u64;
        let octets = minimal_octets(offset);
        self.encode_length_determinant(octets)?;
        self.sink.write_bits(offset, octets * 8)
    }

    /// Encode an unconstrained whole number as minimal two's complement (X.691 11.8)
    pub fn encode_unconstrained_whole_number(&mut self, value: i64) -> CodecResult<()> {
        let bytes = twos_complement_bytes(value);
        self.encode_length_determinant(bytes.len())?;
        self.sink.write_bytes(&bytes)
    }

    /// Encode a normally small non-negative whole number (X.691 11.6)
    pub fn encode_normally_small_non_negative(&mut self, value: u64) -> CodecResult<()> {
        if value <= 63 {
            self.sink.write_bit(false)?;
            self.sink.write_bits(value, 6)
        } else {
            self.sink.write_bit(true)?;
            let value = i64::try_from(value).map_err(|_| {
                CodecError::UnsupportedConstruct(format!("normally small number {} exceeds 63 bits", value))
            })?;
            self.encode_semi_constrained_whole_number(value, 0)
        }
    }

    /// Encode a normally small length (X.691 11.9.3.4), used for extension bitmaps
    pub fn encode_normally_small_length(&mut self, length: usize) -> CodecResult<()> {
        if length == 0 {
            return Err(CodecError::InvalidData("normally small length must be positive".to_string()));
        }
        if length <= 64 {
            self.sink.write_bit(false)?;
            self.sink.write_bits((length - 1) as u64, 6)
        } else {
            self.sink.write_bit(true)?;
            self.encode_length_determinant(length)
        }
    }

    /// Encode an unconstrained length determinant (X.691 11.9.3.5-8)
    ///
    /// Lengths of 16K and above need fragmentation, which is not supported.
    pub fn encode_length_determinant(&mut self, length: usize) -> CodecResult<()> {
        self.align();
        if length <= 127 {
            self.sink.write_bits(length as u64, 8)
        } else if length < LENGTH_FRAGMENT_LIMIT {
            self.sink.write_bits(0x8000 | length as u64, 16)
        } else {
            Err(CodecError::UnsupportedConstruct(format!(
                "fragmented length determinant ({} >= {})",
                length, LENGTH_FRAGMENT_LIMIT
            )))
        }
    }

    /// Encode an INTEGER under its constraint, including the extension bit
    pub fn encode_integer(&mut self, value: i64, constraint: &Constraint) -> CodecResult<()> {
        let check = constraint.check(value)?;
        if constraint.is_extensible() {
            self.sink.write_bit(check == RangeCheck::Extension)?;
        }
        if check == RangeCheck::Extension {
            return self.encode_unconstrained_whole_number(value);
        }

        match (constraint.lower(), constraint.upper()) {
            (Some(lower), Some(upper)) => self.encode_constrained_whole_number(value, lower, upper),
            (Some(lower), None) => self.encode_semi_constrained_whole_number(value, lower),
            _ => self.encode_unconstrained_whole_number(value),
        }
    }

    /// Encode the length prefix of a size-constrained item
    ///
    /// `unit_bits` is the size of one unit (1 for BIT STRING, 8 for OCTET
    /// STRING, the character width for character strings) and decides whether
    /// the content that follows is octet-aligned.
    pub fn encode_size(&mut self, length: usize, size: &Constraint, unit_bits: usize) -> CodecResult<()> {
        let check = size.check_size(length)?;
        if size.is_extensible() {
            self.sink.write_bit(check == RangeCheck::Extension)?;
        }

        match (check, size.lower(), size.upper()) {
            (RangeCheck::Root, Some(lower), Some(upper)) if upper < MAX_CONSTRAINED_LENGTH => {
                if lower != upper {
                    self.encode_constrained_whole_number(length as i64, lower, upper)?;
                }
                if upper as usize * unit_bits > 16 {
                    self.align();
                }
                Ok(())
            }
            _ => self.encode_length_determinant(length),
        }
    }

    /// Encode a BIT STRING
    pub fn encode_bit_string(&mut self, bits: &BitString, size: &Constraint) -> CodecResult<()> {
        let whole = bits.num_bits() / 8;
        let rest = bits.num_bits() % 8;
        let bytes = bits.as_bytes();
        if bytes.len() < bits.num_bits().div_ceil(8) {
            return Err(CodecError::InvalidData(format!(
                "bit string of {} bits backed by {} octets",
                bits.num_bits(),
                bytes.len()
            )));
        }

        self.encode_size(bits.num_bits(), size, 1)?;
        self.sink.write_bytes(&bytes[..whole])?;
        if rest != 0 {
            self.sink.write_bits((bytes[whole] >> (8 - rest)) as u64, rest)?;
        }
        Ok(())
    }

    /// Encode an OCTET STRING
    pub fn encode_octet_string(&mut self, bytes: &[u8], size: &Constraint) -> CodecResult<()> {
        self.encode_size(bytes.len(), size, 8)?;
        self.sink.write_bytes(bytes)
    }

    /// Encode a PrintableString
    pub fn encode_printable_string(&mut self, text: &str, size: &Constraint) -> CodecResult<()> {
        let char_bits = printable_char_bits(self.alignment);
        for c in text.chars() {
            if !is_printable(c) {
                return Err(CodecError::InvalidData(format!(
                    "character {:?} is not in the PrintableString alphabet",
                    c
                )));
            }
        }
        // Every PrintableString character is ASCII, so bytes == characters
        self.encode_size(text.len(), size, char_bits)?;
        for byte in text.bytes() {
            self.sink.write_bits(byte as u64, char_bits)?;
        }
        Ok(())
    }

    /// Encode an open type: a length-prefixed, octet-padded complete encoding
    pub fn encode_open_type(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.encode_length_determinant(bytes.len())?;
        self.sink.write_bytes(bytes)
    }
}

/// Minimal number of octets holding `value` as a non-negative binary integer (at least one)
pub(crate) fn minimal_octets(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

/// Minimal big-endian two's complement representation
pub(crate) fn twos_complement_bytes(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// Character width of PrintableString: 8 bits aligned, 7 bits unaligned (X.691 30.5.2)
pub(crate) fn printable_char_bits(alignment: Alignment) -> usize {
    if alignment.is_aligned() { 8 } else { 7 }
}

/// PrintableString alphabet (X.680 41.4)
pub(crate) fn is_printable(c: char) -> bool {
    c.is_ascii_alphanumeric() || " '()+,-./:=?".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::per::sink::BitWriter;

    fn encode_with<F>(alignment: Alignment, f: F) -> Vec<u8>
    where
        F: FnOnce(&mut PerEncoder<'_, BitWriter>) -> CodecResult<()>,
    {
        let mut writer = BitWriter::new();
        let mut encoder = PerEncoder::new(&mut writer, alignment);
        f(&mut encoder).unwrap();
        writer.into_bytes().to_vec()
    }

    #[test]
    fn test_twos_complement_bytes() {
        assert_eq!(twos_complement_bytes(0), vec![0x00]);
        assert_eq!(twos_complement_bytes(127), vec![0x7F]);
        assert_eq!(twos_complement_bytes(128), vec![0x00, 0x80]);
        assert_eq!(twos_complement_bytes(-1), vec![0xFF]);
        assert_eq!(twos_complement_bytes(-128), vec![0x80]);
        assert_eq!(twos_complement_bytes(-129), vec![0xFF, 0x7F]);
        assert_eq!(twos_complement_bytes(i64::MIN).len(), 8);
    }

    #[test]
    fn test_minimal_octets() {
        assert_eq!(minimal_octets(0), 1);
        assert_eq!(minimal_octets(255), 1);
        assert_eq!(minimal_octets(256), 2);
        assert_eq!(minimal_octets(u64::MAX), 8);
    }

    #[test]
    fn test_extensible_integer_reference_bytes() {
        // ARP ::= INTEGER (1..15, ...)
        let arp = Constraint::extensible(1, 15);
        assert_eq!(encode_with(Alignment::Aligned, |e| e.encode_integer(1, &arp)), vec![0x00]);
        assert_eq!(encode_with(Alignment::Aligned, |e| e.encode_integer(15, &arp)), vec![0x70]);
        assert_eq!(
            encode_with(Alignment::Aligned, |e| e.encode_integer(121, &arp)),
            vec![0x80, 0x01, 0x79]
        );
    }

    #[test]
    fn test_indefinite_length_constrained_integer() {
        // GNB-CU-UP-ID ::= INTEGER (0..68719476735)
        let id = Constraint::range(0, 68_719_476_735);
        assert_eq!(
            encode_with(Alignment::Aligned, |e| e.encode_integer(1234, &id)),
            vec![0x20, 0x04, 0xD2]
        );
        // SubscriptionID ::= INTEGER (1..4294967295)
        let sub = Constraint::range(1, 4_294_967_295);
        assert_eq!(
            encode_with(Alignment::Aligned, |e| e.encode_integer(12345, &sub)),
            vec![0x40, 0x30, 0x38]
        );
    }

    #[test]
    fn test_unaligned_uses_minimal_bits() {
        let c = Constraint::range(0, 1000);
        // 10 bits, no padding between fields
        let bytes = encode_with(Alignment::Unaligned, |e| {
            e.write_bit(true)?;
            e.encode_integer(1000, &c)
        });
        assert_eq!(bytes, vec![0b1111_1101, 0b0000_0000]);
    }

    #[test]
    fn test_length_determinant_forms() {
        assert_eq!(encode_with(Alignment::Aligned, |e| e.encode_length_determinant(5)), vec![0x05]);
        assert_eq!(
            encode_with(Alignment::Aligned, |e| e.encode_length_determinant(300)),
            vec![0x81, 0x2C]
        );

        let mut writer = BitWriter::new();
        let mut encoder = PerEncoder::new(&mut writer, Alignment::Aligned);
        assert!(matches!(
            encoder.encode_length_determinant(16384),
            Err(CodecError::UnsupportedConstruct(_))
        ));
    }

    #[test]
    fn test_fixed_size_octet_string_aligned() {
        // TimeStamp ::= OCTET STRING (SIZE(4))
        let bytes = encode_with(Alignment::Aligned, |e| {
            e.encode_octet_string(&[0x01, 0x02, 0x03, 0x04], &Constraint::fixed(4))
        });
        assert_eq!(bytes, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_size_violation() {
        let mut writer = BitWriter::new();
        let mut encoder = PerEncoder::new(&mut writer, Alignment::Aligned);
        assert!(matches!(
            encoder.encode_octet_string(&[0x01], &Constraint::fixed(4)),
            Err(CodecError::SizeViolation { length: 1, .. })
        ));
    }

    #[test]
    fn test_printable_string_alphabet() {
        let mut writer = BitWriter::new();
        let mut encoder = PerEncoder::new(&mut writer, Alignment::Aligned);
        assert!(encoder.encode_printable_string("ONF", &Constraint::unconstrained()).is_ok());
        assert!(matches!(
            encoder.encode_printable_string("a_b", &Constraint::unconstrained()),
            Err(CodecError::InvalidData(_))
        ));
    }
}
