//! Tag types and BER identifier/length octets

use crate::per::{BitSink, BitSource};
use e2per_core::{CodecError, CodecResult};
use std::cmp::Ordering;
use std::fmt;

/// Tag class
///
/// Variants are declared in canonical order (X.680 8.6): Universal,
/// Application, Context-specific, Private. The derived `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl TagClass {
    /// Get tag class from the identifier octet (bits 8-7)
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    /// Convert tag class to identifier bits
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// Tagging mode of a member
///
/// Implicit tags only select CHOICE alternatives and order members: PER
/// sends nothing for them. Explicit tags wrap the member encoding in a BER
/// identifier/length envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaggingMode {
    #[default]
    Implicit,
    Explicit,
}

/// ASN.1 tag of a member or alternative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    class: TagClass,
    number: u32,
    mode: TaggingMode,
}

impl Tag {
    pub const fn new(class: TagClass, number: u32, mode: TaggingMode) -> Self {
        Self { class, number, mode }
    }

    /// `[n]`, implicitly tagged
    pub const fn context(number: u32) -> Self {
        Self::new(TagClass::ContextSpecific, number, TaggingMode::Implicit)
    }

    /// `[n] EXPLICIT`
    pub const fn explicit(number: u32) -> Self {
        Self::new(TagClass::ContextSpecific, number, TaggingMode::Explicit)
    }

    /// `[APPLICATION n]`
    pub const fn application(number: u32) -> Self {
        Self::new(TagClass::Application, number, TaggingMode::Implicit)
    }

    /// `[PRIVATE n]`
    pub const fn private(number: u32) -> Self {
        Self::new(TagClass::Private, number, TaggingMode::Implicit)
    }

    /// `[UNIVERSAL n]`
    pub const fn universal(number: u32) -> Self {
        Self::new(TagClass::Universal, number, TaggingMode::Implicit)
    }

    pub fn class(&self) -> TagClass {
        self.class
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn mode(&self) -> TaggingMode {
        self.mode
    }

    pub fn is_explicit(&self) -> bool {
        self.mode == TaggingMode::Explicit
    }

    /// Same class and number, whatever the tagging mode
    pub fn same_identity(&self, other: &Tag) -> bool {
        self.class == other.class && self.number == other.number
    }

    /// Canonical tag order: by class, then by number
    pub fn canonical_cmp(&self, other: &Tag) -> Ordering {
        self.class
            .cmp(&other.class)
            .then(self.number.cmp(&other.number))
    }

    /// Identifier octets of this tag on a constructed encoding (X.690 8.1.2)
    ///
    /// Numbers up to 30 take one octet; larger numbers use the high-tag-number
    /// form with base-128 continuation octets.
    pub fn identifier_octets(&self) -> Vec<u8> {
        let leading = self.class.to_bits() | 0x20;
        if self.number <= 30 {
            return vec![leading | self.number as u8];
        }

        let mut groups = Vec::new();
        let mut remaining = self.number;
        while remaining > 0 {
            groups.push((remaining & 0x7F) as u8);
            remaining >>= 7;
        }

        let mut out = Vec::with_capacity(groups.len() + 1);
        out.push(leading | 0x1F);
        let last = groups.len() - 1;
        for (i, group) in groups.iter().rev().enumerate() {
            out.push(if i < last { group | 0x80 } else { *group });
        }
        out
    }

    /// Write the identifier octets to a sink
    pub fn write_identifier<S: BitSink>(&self, sink: &mut S) -> CodecResult<()> {
        sink.write_bytes(&self.identifier_octets())
    }

    /// Read identifier octets from a source, returning class, constructed flag and number
    pub fn read_identifier<S: BitSource>(source: &mut S) -> CodecResult<(TagClass, bool, u32)> {
        let first = source.read_bits(8)? as u8;
        let class = TagClass::from_bits(first);
        let constructed = first & 0x20 != 0;
        let low = first & 0x1F;
        if low < 31 {
            return Ok((class, constructed, low as u32));
        }

        let mut number = 0u32;
        for _ in 0..5 {
            let octet = source.read_bits(8)? as u8;
            number = (number << 7) | (octet & 0x7F) as u32;
            if octet & 0x80 == 0 {
                return Ok((class, constructed, number));
            }
        }
        Err(CodecError::InvalidData(
            "Tag number too large or invalid encoding".to_string(),
        ))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            TagClass::Universal => write!(f, "[UNIVERSAL {}]", self.number)?,
            TagClass::Application => write!(f, "[APPLICATION {}]", self.number)?,
            TagClass::ContextSpecific => write!(f, "[{}]", self.number)?,
            TagClass::Private => write!(f, "[PRIVATE {}]", self.number)?,
        }
        if self.is_explicit() {
            write!(f, " EXPLICIT")?;
        }
        Ok(())
    }
}

/// BER definite length
///
/// - **Short form**: one octet, lengths 0-127
/// - **Long form**: `1NNNNNNN` followed by N big-endian length octets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    Short(u8),
    Long(usize),
}

impl BerLength {
    /// Prefix of a long-form length carried in exactly two octets
    pub const TWO_OCTET_PREFIX: u8 = 0x82;

    pub fn value(&self) -> usize {
        match self {
            BerLength::Short(l) => *l as usize,
            BerLength::Long(l) => *l,
        }
    }

    /// Read length octets in any definite form from a source
    ///
    /// # Errors
    /// `UnsupportedConstruct` for the indefinite form, `InvalidData` when more
    /// than four length octets are used.
    pub fn read_from<S: BitSource>(source: &mut S) -> CodecResult<Self> {
        let first = source.read_bits(8)? as u8;
        if first & 0x80 == 0 {
            return Ok(BerLength::Short(first));
        }

        let num_bytes = (first & 0x7F) as usize;
        if num_bytes == 0 {
            return Err(CodecError::UnsupportedConstruct(
                "Indefinite length encoding not supported".to_string(),
            ));
        }
        if num_bytes > 4 {
            return Err(CodecError::InvalidData(format!(
                "Length encoding too large: {} bytes (max 4)",
                num_bytes
            )));
        }
        let length = source.read_bits(num_bytes * 8)? as usize;
        Ok(BerLength::Long(length))
    }
}
