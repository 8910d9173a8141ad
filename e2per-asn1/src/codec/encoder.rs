//! Descriptor-driven value encoder

use crate::ber::{BerLength, Tag};
use crate::per::{BitSink, BitWriter, PerEncoder};
use crate::schema::{Member, Presence, PrimitiveKind, TypeDescriptor, TypeKind};
use e2per_core::{ChoiceValue, CodecConfig, CodecError, CodecResult, SequenceValue, Value};
use std::collections::BTreeMap;

/// Walks a descriptor and a value in lockstep, writing PER to a sink
pub(crate) struct ValueEncoder<'s, 'c, S: BitSink> {
    per: PerEncoder<'s, S>,
    config: &'c CodecConfig,
    depth: usize,
}

impl<'s, 'c, S: BitSink> ValueEncoder<'s, 'c, S> {
    pub(crate) fn new(sink: &'s mut S, config: &'c CodecConfig, depth: usize) -> Self {
        Self {
            per: PerEncoder::new(sink, config.alignment),
            config,
            depth,
        }
    }

    pub(crate) fn encode_value(&mut self, descriptor: &TypeDescriptor, value: &Value) -> CodecResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(CodecError::DepthExceeded(self.config.max_depth));
        }
        self.depth += 1;
        let result = self.encode_kind(descriptor, value);
        self.depth -= 1;
        result
    }

    fn encode_kind(&mut self, descriptor: &TypeDescriptor, value: &Value) -> CodecResult<()> {
        let constraint = descriptor.constraint();
        match (descriptor.kind(), value) {
            (TypeKind::Primitive(PrimitiveKind::Null), Value::Null) => Ok(()),
            (TypeKind::Primitive(PrimitiveKind::Boolean), Value::Boolean(v)) => self.per.write_bit(*v),
            (TypeKind::Primitive(PrimitiveKind::Integer), Value::Integer(v)) => {
                self.per.encode_integer(*v, &constraint)
            }
            (TypeKind::Primitive(PrimitiveKind::Enumerated(items)), Value::Enumerated(index)) => {
                let root = items.root_len() as u32;
                if *index < root {
                    if items.is_extensible() {
                        self.per.write_bit(false)?;
                    }
                    self.per
                        .encode_constrained_whole_number(*index as i64, 0, root as i64 - 1)
                } else if items.is_extensible() {
                    self.per.write_bit(true)?;
                    self.per.encode_normally_small_non_negative((*index - root) as u64)
                } else {
                    Err(CodecError::RangeViolation {
                        value: *index as i64,
                        lower: 0,
                        upper: root as i64 - 1,
                    })
                }
            }
            (TypeKind::Primitive(PrimitiveKind::BitString), Value::BitString(bits)) => {
                self.per.encode_bit_string(bits, &constraint)
            }
            (TypeKind::Primitive(PrimitiveKind::OctetString), Value::OctetString(bytes)) => {
                self.per.encode_octet_string(bytes, &constraint)
            }
            (TypeKind::Primitive(PrimitiveKind::PrintableString), Value::PrintableString(text)) => {
                self.per.encode_printable_string(text, &constraint)
            }
            (TypeKind::SequenceOf(item), Value::SequenceOf(items)) => {
                let item = item.get()?;
                // Components are not aligned after the count
                self.per.encode_size(items.len(), &constraint, 0)?;
                for value in items {
                    self.encode_value(item, value)?;
                }
                Ok(())
            }
            (TypeKind::Sequence, Value::Sequence(fields)) => self.encode_sequence(descriptor, fields),
            (TypeKind::Choice, Value::Choice(choice)) => self.encode_choice(descriptor, choice),
            (kind, value) => Err(CodecError::type_mismatch(
                format!("{} ({})", kind.name(), descriptor.name()),
                value.kind_name(),
            )),
        }
    }

    fn encode_sequence(&mut self, descriptor: &TypeDescriptor, value: &SequenceValue) -> CodecResult<()> {
        if let Some((name, _)) = value.fields().find(|(name, _)| descriptor.member_index(name).is_none()) {
            return Err(CodecError::type_mismatch(
                format!("member of {}", descriptor.name()),
                format!("'{}'", name),
            ));
        }

        let root = descriptor.root_members();
        let additions = descriptor.additions();
        let extended = additions.iter().any(|m| value.contains(m.name()))
            || !value.unknown_extensions().is_empty();

        if descriptor.is_extensible() {
            self.per.write_bit(extended)?;
        } else if extended {
            return Err(CodecError::type_mismatch(
                format!("{} without extensions", descriptor.name()),
                "unknown extension additions",
            ));
        }

        for member in root.iter().filter(|m| m.presence().has_presence_bit()) {
            self.per.write_bit(value.contains(member.name()))?;
        }

        for member in root {
            match value.get(member.name()) {
                Some(field) => {
                    log::trace!("{}.{}: encode", descriptor.name(), member.name());
                    self.encode_member(member, field)?;
                }
                None if member.presence() == &Presence::Mandatory => {
                    return Err(CodecError::type_mismatch(
                        format!("mandatory member '{}' of {}", member.name(), descriptor.name()),
                        "absent",
                    ));
                }
                None => {}
            }
        }

        if extended {
            self.encode_additions(descriptor, value)?;
        }
        Ok(())
    }

    /// Extension additions: count, presence bitmap, then one open type per present addition
    fn encode_additions(&mut self, descriptor: &TypeDescriptor, value: &SequenceValue) -> CodecResult<()> {
        let mut slots: BTreeMap<usize, Vec<u8>> = BTreeMap::new();
        for (index, member) in descriptor.additions().iter().enumerate() {
            if let Some(field) = value.get(member.name()) {
                log::trace!("{}.{}: encode extension addition", descriptor.name(), member.name());
                slots.insert(index, self.open_type(|encoder| encoder.encode_member(member, field))?);
            }
        }
        let known = descriptor.additions().len();
        for unknown in value.unknown_extensions() {
            if unknown.index < known {
                return Err(CodecError::type_mismatch(
                    format!("unknown extension addition of {} (index >= {})", descriptor.name(), known),
                    format!("opaque addition at known index {}", unknown.index),
                ));
            }
            if slots.insert(unknown.index, unknown.bytes.clone()).is_some() {
                return Err(CodecError::InvalidData(format!(
                    "{}: extension addition {} given twice",
                    descriptor.name(),
                    unknown.index
                )));
            }
        }

        let count = slots.keys().next_back().map_or(0, |last| last + 1);
        self.per.encode_normally_small_length(count)?;
        for index in 0..count {
            self.per.write_bit(slots.contains_key(&index))?;
        }
        for bytes in slots.values() {
            self.per.encode_open_type(bytes)?;
        }
        Ok(())
    }

    fn encode_choice(&mut self, descriptor: &TypeDescriptor, value: &ChoiceValue) -> CodecResult<()> {
        let root_len = descriptor.root_members().len();
        match value {
            ChoiceValue::Known { present, payload } => {
                let member = descriptor.member(*present).ok_or_else(|| {
                    CodecError::type_mismatch(
                        format!("alternative of {}", descriptor.name()),
                        format!("#{}", present),
                    )
                })?;
                log::trace!("{}: alternative '{}'", descriptor.name(), member.name());

                match descriptor.choice_index_of(*present) {
                    Some(index) => {
                        if descriptor.is_extensible() {
                            self.per.write_bit(false)?;
                        }
                        self.per
                            .encode_constrained_whole_number(index as i64, 0, root_len as i64 - 1)?;
                        self.encode_member(member, payload)
                    }
                    None => {
                        self.per.write_bit(true)?;
                        self.per.encode_normally_small_non_negative((*present - root_len) as u64)?;
                        let bytes = self.open_type(|encoder| encoder.encode_member(member, payload))?;
                        self.per.encode_open_type(&bytes)
                    }
                }
            }
            ChoiceValue::Unknown(open) => {
                if !descriptor.is_extensible() {
                    return Err(CodecError::type_mismatch(
                        format!("alternative of {}", descriptor.name()),
                        "unknown extension alternative",
                    ));
                }
                let known = descriptor.additions().len();
                if open.index < known {
                    return Err(CodecError::type_mismatch(
                        format!("unknown extension alternative of {} (index >= {})", descriptor.name(), known),
                        format!("opaque alternative at known index {}", open.index),
                    ));
                }
                self.per.write_bit(true)?;
                self.per.encode_normally_small_non_negative(open.index as u64)?;
                self.per.encode_open_type(&open.bytes)
            }
        }
    }

    /// Encode a member, wrapping it in a BER envelope when explicitly tagged
    fn encode_member(&mut self, member: &Member, value: &Value) -> CodecResult<()> {
        let descriptor = member.descriptor()?;
        let tag = member.tag();
        if tag.is_explicit() {
            self.encode_explicit(&tag, descriptor, value)
        } else {
            self.encode_value(descriptor, value)
        }
    }

    /// `identifier 0x82 hh ll inner-octets`, with `hhll` backpatched
    fn encode_explicit(&mut self, tag: &Tag, descriptor: &TypeDescriptor, value: &Value) -> CodecResult<()> {
        let sink = self.per.sink();
        sink.align_to_byte();
        tag.write_identifier(sink)?;
        sink.write_bits(BerLength::TWO_OCTET_PREFIX as u64, 8)?;
        let slot = sink.reserve(16)?;
        let start = sink.bit_position();

        self.encode_value(descriptor, value)?;

        let sink = self.per.sink();
        sink.align_to_byte();
        let octets = (sink.bit_position() - start) / 8;
        if octets > 0xFFFF {
            return Err(CodecError::UnsupportedConstruct(format!(
                "explicit tag {} envelope of {} octets",
                tag, octets
            )));
        }
        sink.backpatch(slot, octets as u64)
    }

    /// Encode into a separate buffer as a complete encoding (at least one octet)
    fn open_type<F>(&self, encode: F) -> CodecResult<Vec<u8>>
    where
        F: FnOnce(&mut ValueEncoder<'_, 'c, BitWriter>) -> CodecResult<()>,
    {
        let mut writer = BitWriter::new();
        let mut encoder = ValueEncoder::new(&mut writer, self.config, self.depth);
        encode(&mut encoder)?;
        if writer.is_empty() {
            return Ok(vec![0x00]);
        }
        Ok(writer.into_bytes().to_vec())
    }
}
