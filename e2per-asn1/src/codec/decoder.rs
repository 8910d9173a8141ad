//! Descriptor-driven value decoder

use crate::ber::{BerLength, Tag, TaggingMode};
use crate::per::{BitReader, BitSource, PerDecoder};
use crate::schema::{Member, PrimitiveKind, TypeDescriptor, TypeKind};
use e2per_core::{ChoiceValue, CodecConfig, CodecError, CodecResult, OpenType, SequenceValue, Value};

/// Walks a descriptor, reading PER from a source and building the value tree
pub(crate) struct ValueDecoder<'s, 'c, S: BitSource> {
    per: PerDecoder<'s, S>,
    config: &'c CodecConfig,
    depth: usize,
}

impl<'s, 'c, S: BitSource> ValueDecoder<'s, 'c, S> {
    pub(crate) fn new(source: &'s mut S, config: &'c CodecConfig, depth: usize) -> Self {
        Self {
            per: PerDecoder::new(source, config.alignment),
            config,
            depth,
        }
    }

    pub(crate) fn decode_value(&mut self, descriptor: &TypeDescriptor) -> CodecResult<Value> {
        if self.depth >= self.config.max_depth {
            return Err(CodecError::DepthExceeded(self.config.max_depth));
        }
        self.depth += 1;
        let result = self.decode_kind(descriptor);
        self.depth -= 1;
        result
    }

    fn decode_kind(&mut self, descriptor: &TypeDescriptor) -> CodecResult<Value> {
        let constraint = descriptor.constraint();
        match descriptor.kind() {
            TypeKind::Primitive(PrimitiveKind::Null) => Ok(Value::Null),
            TypeKind::Primitive(PrimitiveKind::Boolean) => Ok(Value::Boolean(self.per.read_bit()?)),
            TypeKind::Primitive(PrimitiveKind::Integer) => {
                Ok(Value::Integer(self.per.decode_integer(&constraint)?))
            }
            TypeKind::Primitive(PrimitiveKind::Enumerated(items)) => {
                let root = items.root_len() as u32;
                if items.is_extensible() && self.per.read_bit()? {
                    let offset = self.per.decode_normally_small_non_negative()?;
                    let index = u32::try_from(offset)
                        .ok()
                        .and_then(|offset| offset.checked_add(root))
                        .ok_or_else(|| {
                            CodecError::InvalidData(format!("enumeration index {} out of range", offset))
                        })?;
                    if items.name_of(index).is_none() {
                        log::warn!("{}: preserving unknown enumeration index {}", descriptor.name(), index);
                    }
                    Ok(Value::Enumerated(index))
                } else {
                    let index = self.per.decode_constrained_whole_number(0, root as i64 - 1)?;
                    Ok(Value::Enumerated(index as u32))
                }
            }
            TypeKind::Primitive(PrimitiveKind::BitString) => {
                Ok(Value::BitString(self.per.decode_bit_string(&constraint)?))
            }
            TypeKind::Primitive(PrimitiveKind::OctetString) => {
                Ok(Value::OctetString(self.per.decode_octet_string(&constraint)?))
            }
            TypeKind::Primitive(PrimitiveKind::PrintableString) => {
                Ok(Value::PrintableString(self.per.decode_printable_string(&constraint)?))
            }
            TypeKind::SequenceOf(item) => {
                let item = item.get()?;
                let count = self.per.decode_size(&constraint, 0)?;
                let mut items = Vec::with_capacity(count.min(self.per.source().bits_remaining()));
                for _ in 0..count {
                    items.push(self.decode_value(item)?);
                }
                Ok(Value::SequenceOf(items))
            }
            TypeKind::Sequence => self.decode_sequence(descriptor).map(Value::Sequence),
            TypeKind::Choice => self.decode_choice(descriptor).map(Value::Choice),
        }
    }

    fn decode_sequence(&mut self, descriptor: &TypeDescriptor) -> CodecResult<SequenceValue> {
        let extended = descriptor.is_extensible() && self.per.read_bit()?;

        let root = descriptor.root_members();
        let mut present = Vec::with_capacity(root.len());
        for member in root {
            present.push(!member.presence().has_presence_bit() || self.per.read_bit()?);
        }

        let mut value = SequenceValue::new();
        for (member, present) in root.iter().zip(present) {
            if present {
                log::trace!("{}.{}: decode", descriptor.name(), member.name());
                value.insert(member.name(), self.decode_member(member)?);
            }
        }

        if extended {
            self.decode_additions(descriptor, &mut value)?;
        }
        Ok(value)
    }

    fn decode_additions(&mut self, descriptor: &TypeDescriptor, value: &mut SequenceValue) -> CodecResult<()> {
        let count = self.per.decode_normally_small_length()?;
        let available = self.per.source().bits_remaining();
        if count > available {
            return Err(CodecError::TruncatedInput {
                needed: count,
                available,
            });
        }

        let mut bitmap = Vec::with_capacity(count);
        for _ in 0..count {
            bitmap.push(self.per.read_bit()?);
        }
        if !bitmap.contains(&true) {
            return Err(CodecError::MalformedBitmap(format!(
                "{}: extension bit set but none of {} additions present",
                descriptor.name(),
                count
            )));
        }

        let additions = descriptor.additions();
        for (index, _) in bitmap.iter().enumerate().filter(|(_, present)| **present) {
            let bytes = self.per.decode_open_type(self.config.max_open_type_length)?;
            match additions.get(index) {
                Some(member) => {
                    log::trace!("{}.{}: decode extension addition", descriptor.name(), member.name());
                    let field = self.decode_in_open_type(&bytes, |decoder| decoder.decode_member(member))?;
                    value.insert(member.name(), field);
                }
                None => {
                    log::warn!(
                        "{}: preserving unknown extension addition {} ({} octets)",
                        descriptor.name(),
                        index,
                        bytes.len()
                    );
                    value.push_unknown_extension(OpenType::new(index, bytes));
                }
            }
        }
        Ok(())
    }

    fn decode_choice(&mut self, descriptor: &TypeDescriptor) -> CodecResult<ChoiceValue> {
        let root_len = descriptor.root_members().len();

        if descriptor.is_extensible() && self.per.read_bit()? {
            let offset = self.per.decode_normally_small_non_negative()?;
            let bytes = self.per.decode_open_type(self.config.max_open_type_length)?;
            let present = usize::try_from(offset).ok().and_then(|o| o.checked_add(root_len));
            return match present.and_then(|p| descriptor.member(p).map(|m| (p, m))) {
                Some((present, member)) => {
                    log::trace!("{}: extension alternative '{}'", descriptor.name(), member.name());
                    let payload = self.decode_in_open_type(&bytes, |decoder| decoder.decode_member(member))?;
                    Ok(ChoiceValue::new(present, payload))
                }
                None => {
                    log::warn!(
                        "{}: preserving unknown extension alternative {} ({} octets)",
                        descriptor.name(),
                        offset,
                        bytes.len()
                    );
                    Ok(ChoiceValue::Unknown(OpenType::new(offset as usize, bytes)))
                }
            };
        }

        let index = self.per.decode_constrained_offset(root_len as u128)?;
        let present = usize::try_from(index)
            .ok()
            .and_then(|i| descriptor.choice_root_order().get(i).copied())
            .ok_or(CodecError::UnknownAlternative {
                index,
                root: root_len,
            })?;
        let member = descriptor.member(present).ok_or(CodecError::UnknownAlternative {
            index,
            root: root_len,
        })?;
        log::trace!("{}: alternative '{}'", descriptor.name(), member.name());
        Ok(ChoiceValue::new(present, self.decode_member(member)?))
    }

    fn decode_member(&mut self, member: &Member) -> CodecResult<Value> {
        let descriptor = member.descriptor()?;
        let tag = member.tag();
        if tag.is_explicit() {
            self.decode_explicit(&tag, descriptor)
        } else {
            self.decode_value(descriptor)
        }
    }

    /// Read a BER envelope and decode exactly its contents
    fn decode_explicit(&mut self, tag: &Tag, descriptor: &TypeDescriptor) -> CodecResult<Value> {
        let source = self.per.source();
        source.align_to_byte();
        let (class, _constructed, number) = Tag::read_identifier(source)?;
        if class != tag.class() || number != tag.number() {
            return Err(CodecError::TagMismatch {
                expected: tag.to_string(),
                found: Tag::new(class, number, TaggingMode::Explicit).to_string(),
            });
        }

        let declared = BerLength::read_from(source)?.value();
        if declared > self.config.max_open_type_length {
            return Err(CodecError::InvalidData(format!(
                "explicit tag {} envelope of {} octets exceeds the limit of {}",
                tag, declared, self.config.max_open_type_length
            )));
        }
        let available = source.bits_remaining();
        if declared.saturating_mul(8) > available {
            return Err(CodecError::TruncatedInput {
                needed: declared.saturating_mul(8),
                available,
            });
        }
        let start = source.bit_position();

        let value = self.decode_value(descriptor)?;

        let source = self.per.source();
        source.align_to_byte();
        let consumed = (source.bit_position() - start) / 8;
        if consumed != declared {
            return Err(CodecError::LengthMismatch { declared, consumed });
        }
        Ok(value)
    }

    /// Decode a value carried in an open type
    fn decode_in_open_type<F>(&self, bytes: &[u8], decode: F) -> CodecResult<Value>
    where
        F: FnOnce(&mut ValueDecoder<'_, 'c, BitReader<'_>>) -> CodecResult<Value>,
    {
        let mut reader = BitReader::new(bytes);
        let mut decoder = ValueDecoder::new(&mut reader, self.config, self.depth);
        decode(&mut decoder)
    }
}
