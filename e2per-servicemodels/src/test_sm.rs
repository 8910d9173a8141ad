//! TEST-SM information elements
//!
//! A service model with no radio semantics, shaped to exercise the codec:
//! fully optional sequences, lists of them, extensible enumerations and
//! choices with wide integer alternatives.

use e2per_asn1::per::Constraint;
use e2per_asn1::schema::{Enumeration, Member, TypeDescriptor};
use e2per_core::CodecResult;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Maximum number of items in TestList3
pub const MAX_LIST3_ITEMS: i64 = 12;

#[derive(Debug)]
pub struct TestSmDescriptors {
    /// TestEnumeratedExtensible ::= ENUMERATED { enum1, ..., enum6, ... }
    pub enumerated_extensible: Arc<TypeDescriptor>,
    pub fully_optional_sequence: Arc<TypeDescriptor>,
    /// TestList3 ::= SEQUENCE (SIZE(0..12)) OF TestFullyOptionalSequence
    pub list3: Arc<TypeDescriptor>,
    /// Choice4 ::= CHOICE { choice4A INTEGER, ... }
    pub choice4: Arc<TypeDescriptor>,
    pub constrained_choices: Arc<TypeDescriptor>,
}

static DESCRIPTORS: OnceCell<TestSmDescriptors> = OnceCell::new();

/// Shared TEST-SM descriptors, built on first call
pub fn descriptors() -> CodecResult<&'static TestSmDescriptors> {
    DESCRIPTORS.get_or_try_init(build)
}

/// A CHOICE of `count` unconstrained INTEGER alternatives named `<prefix>A`, `<prefix>B`, ...
fn integer_choice(name: &str, prefix: &str, count: u8, integer: &Arc<TypeDescriptor>) -> CodecResult<Arc<TypeDescriptor>> {
    let mut builder = TypeDescriptor::choice(name);
    for letter in (b'A'..).take(count as usize) {
        builder = builder.member(Member::new(format!("{}{}", prefix, letter as char), integer));
    }
    builder.extensible().build()
}

fn build() -> CodecResult<TestSmDescriptors> {
    let integer = TypeDescriptor::integer("INTEGER", Constraint::unconstrained())?;

    let enumerated_extensible = TypeDescriptor::enumerated(
        "TestEnumeratedExtensible",
        Enumeration::new(["enum1", "enum2", "enum3", "enum4", "enum5", "enum6"]).extensible(),
    )?;

    let fully_optional_sequence = TypeDescriptor::sequence("TestFullyOptionalSequence")
        .member(Member::optional("item1", &integer))
        .member(Member::optional("item2", TypeDescriptor::octet_string("OCTET STRING", None)?))
        .member(Member::optional("item3", TypeDescriptor::boolean("BOOLEAN")))
        .member(Member::optional(
            "item4",
            TypeDescriptor::enumerated(
                "TestFullyOptionalSequenceItem4",
                Enumeration::new(["one", "two"]).extensible(),
            )?,
        ))
        .member(Member::optional("item5", TypeDescriptor::null("NULL")))
        .extensible()
        .build()?;

    let list3 = TypeDescriptor::sequence_of(
        "TestList3",
        &fully_optional_sequence,
        Some(Constraint::range(0, MAX_LIST3_ITEMS)),
    )?;

    let choice4 = TypeDescriptor::choice("Choice4")
        .member(Member::new("choice4A", &integer))
        .extensible()
        .build()?;

    let constrained_choices = TypeDescriptor::sequence("TestConstrainedChoices")
        .member(Member::new(
            "otherCAttr",
            TypeDescriptor::printable_string("PrintableString", Some(Constraint::extensible(1, 50)))?,
        ))
        .member(Member::new(
            "constrainedChoice1",
            integer_choice("ConstrainedChoice1", "constrainedChoice1", 1, &integer)?,
        ))
        .member(Member::new(
            "constrainedChoice2",
            integer_choice("ConstrainedChoice2", "constrainedChoice2", 2, &integer)?,
        ))
        .member(Member::new(
            "constrainedChoice3",
            integer_choice("ConstrainedChoice3", "constrainedChoice3", 4, &integer)?,
        ))
        .member(Member::new("constrainedChoice4", &choice4))
        .build()?;

    log::debug!("Built TEST-SM descriptors");

    Ok(TestSmDescriptors {
        enumerated_extensible,
        fully_optional_sequence,
        list3,
        choice4,
        constrained_choices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use e2per_asn1::codec::{decode, encode};
    use e2per_core::{SequenceValue, Value};

    fn round_trip(descriptor: &TypeDescriptor, value: &Value) -> Vec<u8> {
        let bytes = encode(descriptor, value).unwrap();
        assert_eq!(&decode(descriptor, &bytes).unwrap(), value);
        bytes.to_vec()
    }

    #[test]
    fn test_enumerated_extensible() {
        let sm = descriptors().unwrap();
        for index in 0..6u32 {
            let bytes = round_trip(&sm.enumerated_extensible, &Value::Enumerated(index));
            assert_eq!(bytes, vec![(index as u8) << 4]);
        }
    }

    #[test]
    fn test_list3_empty() {
        let sm = descriptors().unwrap();
        let bytes = round_trip(&sm.list3, &Value::SequenceOf(Vec::new()));
        assert_eq!(bytes, vec![0x00]);
    }

    #[test]
    fn test_list3_three_items() {
        let sm = descriptors().unwrap();
        let value = Value::SequenceOf(vec![
            Value::Sequence(
                SequenceValue::new()
                    .with("item1", 153i64)
                    .with("item2", Value::octets(vec![0x02, 0x3F, 0x5D, 0x9A]))
                    .with("item3", true)
                    .with("item4", Value::Enumerated(0))
                    .with("item5", Value::Null),
            ),
            Value::Sequence(SequenceValue::new()),
            Value::Sequence(
                SequenceValue::new()
                    .with("item2", Value::octets(vec![0xC2, 0xF3, 0xD3, 0x9A]))
                    .with("item3", true)
                    .with("item5", Value::Null),
            ),
        ]);
        round_trip(&sm.list3, &value);
    }

    #[test]
    fn test_list3_too_long() {
        let sm = descriptors().unwrap();
        let value = Value::SequenceOf(vec![Value::Sequence(SequenceValue::new()); 13]);
        assert!(matches!(
            encode(&sm.list3, &value),
            Err(e2per_core::CodecError::SizeViolation { .. })
        ));
    }

    #[test]
    fn test_empty_fully_optional_sequence() {
        let sm = descriptors().unwrap();
        let bytes = round_trip(&sm.fully_optional_sequence, &Value::Sequence(SequenceValue::new()));
        assert_eq!(bytes, vec![0x00]);
    }

    #[test]
    fn test_choice4() {
        let sm = descriptors().unwrap();
        let bytes = round_trip(&sm.choice4, &Value::choice(0, Value::Integer(130)));
        // extension bit, then an unconstrained INTEGER: length 2, 00 82
        assert_eq!(bytes, vec![0x00, 0x02, 0x00, 0x82]);
    }

    #[test]
    fn test_constrained_choices() {
        let sm = descriptors().unwrap();
        let value = Value::Sequence(
            SequenceValue::new()
                .with("otherCAttr", Value::PrintableString("nil".into()))
                .with("constrainedChoice1", Value::choice(0, Value::Integer(129)))
                .with("constrainedChoice2", Value::choice(1, Value::Integer(4_294_967_296)))
                .with("constrainedChoice3", Value::choice(3, Value::Integer(2)))
                .with("constrainedChoice4", Value::choice(0, Value::Integer(130))),
        );
        round_trip(&sm.constrained_choices, &value);
    }
}
