//! Property-based tests for the PER codec engine
//!
//! - Round-trip: `decode(d, encode(d, v)) == v` for values valid under `d`
//! - Minimal width: constrained integers use exactly `minimal_bits` bits (UPER)
//! - Truncation: dropping the last octet of an encoding is `TruncatedInput`

#[cfg(test)]
mod tests {
    use crate::codec::Codec;
    use crate::per::{BitSink, BitWriter, Constraint};
    use crate::schema::{Member, TypeDescriptor};
    use e2per_core::{Alignment, BitString, CodecConfig, CodecError, SequenceValue, Value};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn codec(alignment: Alignment) -> Codec {
        Codec::new(CodecConfig::default().with_alignment(alignment))
    }

    fn arb_alignment() -> impl Strategy<Value = Alignment> {
        prop::sample::select(vec![Alignment::Aligned, Alignment::Unaligned])
    }

    // ========================================================================
    // Integers
    // ========================================================================

    mod integer_props {
        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            #[test]
            fn prop_constrained_integer_roundtrip(
                alignment in arb_alignment(),
                lower in -1_000_000_000i64..1_000_000_000,
                span in 0i64..5_000_000_000,
                pick in any::<u64>(),
            ) {
                let value = lower + (pick % (span as u64 + 1)) as i64;
                let descriptor = TypeDescriptor::integer("Bounded", Constraint::range(lower, lower + span)).unwrap();
                let codec = codec(alignment);
                let bytes = codec.encode(&descriptor, &Value::Integer(value)).unwrap();
                prop_assert_eq!(codec.decode(&descriptor, &bytes).unwrap(), Value::Integer(value));
            }

            #[test]
            fn prop_unaligned_uses_minimal_bits(
                lower in any::<i32>(),
                span in 0i64..(1i64 << 40),
                at_upper in any::<bool>(),
            ) {
                let lower = lower as i64;
                let constraint = Constraint::range(lower, lower + span);
                let descriptor = TypeDescriptor::integer("Bounded", constraint).unwrap();
                let value = if at_upper { lower + span } else { lower };

                let mut writer = BitWriter::new();
                codec(Alignment::Unaligned)
                    .encode_into(&descriptor, &Value::Integer(value), &mut writer)
                    .unwrap();
                prop_assert_eq!(Some(writer.bit_position()), constraint.minimal_bits());
            }

            #[test]
            fn prop_extensible_integer_roundtrip(alignment in arb_alignment(), value in any::<i64>()) {
                let descriptor = TypeDescriptor::integer("Ext", Constraint::extensible(1, 15)).unwrap();
                let codec = codec(alignment);
                let bytes = codec.encode(&descriptor, &Value::Integer(value)).unwrap();
                prop_assert_eq!(codec.decode(&descriptor, &bytes).unwrap(), Value::Integer(value));
            }

            #[test]
            fn prop_unconstrained_integer_roundtrip(alignment in arb_alignment(), value in any::<i64>()) {
                let descriptor = TypeDescriptor::integer("Any", Constraint::unconstrained()).unwrap();
                let codec = codec(alignment);
                let bytes = codec.encode(&descriptor, &Value::Integer(value)).unwrap();
                prop_assert_eq!(codec.decode(&descriptor, &bytes).unwrap(), Value::Integer(value));
            }

            #[test]
            fn prop_semi_constrained_integer_roundtrip(lower in -1000i64..1000, offset in 0i64..i64::MAX / 2) {
                let descriptor = TypeDescriptor::integer("Semi", Constraint::semi(lower)).unwrap();
                let value = lower + offset;
                let bytes = codec(Alignment::Aligned).encode(&descriptor, &Value::Integer(value)).unwrap();
                prop_assert_eq!(
                    codec(Alignment::Aligned).decode(&descriptor, &bytes).unwrap(),
                    Value::Integer(value)
                );
            }

            #[test]
            fn prop_out_of_range_rejected(lower in -1000i64..1000, span in 0i64..1000, beyond in 1i64..1000) {
                let descriptor = TypeDescriptor::integer("Strict", Constraint::range(lower, lower + span)).unwrap();
                let result = codec(Alignment::Aligned).encode(&descriptor, &Value::Integer(lower + span + beyond));
                prop_assert!(
                    matches!(result, Err(CodecError::RangeViolation { .. })),
                    "expected RangeViolation"
                );
            }
        }
    }

    // ========================================================================
    // Strings
    // ========================================================================

    mod string_props {
        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn prop_octet_string_roundtrip(
                alignment in arb_alignment(),
                bytes in prop::collection::vec(any::<u8>(), 0..300),
            ) {
                let descriptor = TypeDescriptor::octet_string("Octets", Some(Constraint::range(0, 300))).unwrap();
                let codec = codec(alignment);
                let value = Value::OctetString(bytes);
                let encoded = codec.encode(&descriptor, &value).unwrap();
                prop_assert_eq!(codec.decode(&descriptor, &encoded).unwrap(), value);
            }

            #[test]
            fn prop_bit_string_roundtrip(
                alignment in arb_alignment(),
                bytes in prop::collection::vec(any::<u8>(), 5),
                num_bits in 22usize..=32,
            ) {
                let descriptor = TypeDescriptor::bit_string("GNB-ID", Some(Constraint::range(22, 32))).unwrap();
                let codec = codec(alignment);
                let value = Value::BitString(BitString::new(bytes, num_bits).unwrap());
                let encoded = codec.encode(&descriptor, &value).unwrap();
                prop_assert_eq!(codec.decode(&descriptor, &encoded).unwrap(), value);
            }

            #[test]
            fn prop_printable_string_roundtrip(alignment in arb_alignment(), text in "[A-Za-z0-9 ]{1,40}") {
                let descriptor =
                    TypeDescriptor::printable_string("Name", Some(Constraint::extensible(1, 150))).unwrap();
                let codec = codec(alignment);
                let value = Value::PrintableString(text);
                let encoded = codec.encode(&descriptor, &value).unwrap();
                prop_assert_eq!(codec.decode(&descriptor, &encoded).unwrap(), value);
            }
        }
    }

    // ========================================================================
    // Constructed types
    // ========================================================================

    mod sequence_props {
        use super::*;

        fn descriptor() -> Arc<TypeDescriptor> {
            let small = TypeDescriptor::integer("Small", Constraint::range(0, 7)).unwrap();
            let wide = TypeDescriptor::integer("Wide", Constraint::range(0, 68_719_476_735)).unwrap();
            let choice = TypeDescriptor::choice("Pick")
                .member(Member::new("n", TypeDescriptor::null("N")))
                .member(Member::new("w", &wide))
                .extensible()
                .build()
                .unwrap();
            TypeDescriptor::sequence("Record")
                .member(Member::new("id", &wide))
                .member(Member::optional("a", &small))
                .member(Member::optional("b", TypeDescriptor::boolean("B")))
                .member(Member::optional("c", &choice))
                .extensible()
                .member(Member::new("d", &small))
                .member(Member::new("e", TypeDescriptor::octet_string("E", None).unwrap()))
                .build()
                .unwrap()
        }

        fn arb_record() -> impl Strategy<Value = Value> {
            (
                0i64..=68_719_476_735,
                prop::option::of(0i64..8),
                prop::option::of(any::<bool>()),
                prop::option::of(prop::option::of(0i64..=68_719_476_735)),
                prop::option::of(0i64..8),
                prop::option::of(prop::collection::vec(any::<u8>(), 0..20)),
            )
                .prop_map(|(id, a, b, c, d, e)| {
                    let mut value = SequenceValue::new().with("id", id);
                    if let Some(a) = a {
                        value.insert("a", a);
                    }
                    if let Some(b) = b {
                        value.insert("b", b);
                    }
                    if let Some(c) = c {
                        let choice = match c {
                            Some(w) => Value::choice(1, Value::Integer(w)),
                            None => Value::choice(0, Value::Null),
                        };
                        value.insert("c", choice);
                    }
                    if let Some(d) = d {
                        value.insert("d", d);
                    }
                    if let Some(e) = e {
                        value.insert("e", Value::OctetString(e));
                    }
                    Value::Sequence(value)
                })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn prop_sequence_roundtrip(alignment in arb_alignment(), value in arb_record()) {
                let descriptor = descriptor();
                let codec = codec(alignment);
                let bytes = codec.encode(&descriptor, &value).unwrap();
                prop_assert_eq!(codec.decode(&descriptor, &bytes).unwrap(), value);
            }

            #[test]
            fn prop_truncated_sequence_rejected(value in arb_record()) {
                let descriptor = descriptor();
                let codec = codec(Alignment::Aligned);
                let bytes = codec.encode(&descriptor, &value).unwrap();
                let result = codec.decode(&descriptor, &bytes[..bytes.len() - 1]);
                prop_assert!(
                    matches!(result, Err(CodecError::TruncatedInput { .. })),
                    "expected TruncatedInput, got {:?}",
                    result
                );
            }

            #[test]
            fn prop_sequence_of_roundtrip(items in prop::collection::vec(0i64..8, 1..32)) {
                let small = TypeDescriptor::integer("Small", Constraint::range(0, 7)).unwrap();
                let list = TypeDescriptor::sequence_of("List", &small, Some(Constraint::range(1, 32))).unwrap();
                let value = Value::SequenceOf(items.into_iter().map(Value::Integer).collect());
                let bytes = codec(Alignment::Aligned).encode(&list, &value).unwrap();
                prop_assert_eq!(codec(Alignment::Aligned).decode(&list, &bytes).unwrap(), value);
            }
        }
    }
}
