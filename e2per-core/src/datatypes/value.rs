//! Runtime value tree encoded and decoded by the PER codec

use crate::datatypes::bit_string::BitString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value mirroring the shape of a type descriptor
///
/// Values are created by the application before encoding or by the decoder,
/// and are fully owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// NULL
    Null,
    /// BOOLEAN
    Boolean(bool),
    /// INTEGER
    Integer(i64),
    /// ENUMERATED, as the index of the enumeration item
    ///
    /// Root items are numbered `0..root`, extension items continue from `root`.
    Enumerated(u32),
    /// BIT STRING
    BitString(BitString),
    /// OCTET STRING
    OctetString(#[serde(with = "serde_bytes")] Vec<u8>),
    /// PrintableString
    PrintableString(String),
    /// SEQUENCE
    Sequence(SequenceValue),
    /// SEQUENCE OF
    SequenceOf(Vec<Value>),
    /// CHOICE
    Choice(ChoiceValue),
}

impl Value {
    /// Create a CHOICE value selecting the alternative at `present`
    pub fn choice(present: usize, payload: Value) -> Self {
        Value::Choice(ChoiceValue::new(present, payload))
    }

    /// Create an OCTET STRING value
    pub fn octets(bytes: impl Into<Vec<u8>>) -> Self {
        Value::OctetString(bytes.into())
    }

    /// Name of the value kind, used in type mismatch diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(_) => "BOOLEAN",
            Value::Integer(_) => "INTEGER",
            Value::Enumerated(_) => "ENUMERATED",
            Value::BitString(_) => "BIT STRING",
            Value::OctetString(_) => "OCTET STRING",
            Value::PrintableString(_) => "PrintableString",
            Value::Sequence(_) => "SEQUENCE",
            Value::SequenceOf(_) => "SEQUENCE OF",
            Value::Choice(_) => "CHOICE",
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&SequenceValue> {
        match self {
            Value::Sequence(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&ChoiceValue> {
        match self {
            Value::Choice(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<BitString> for Value {
    fn from(value: BitString) -> Self {
        Value::BitString(value)
    }
}

impl From<SequenceValue> for Value {
    fn from(value: SequenceValue) -> Self {
        Value::Sequence(value)
    }
}

impl From<ChoiceValue> for Value {
    fn from(value: ChoiceValue) -> Self {
        Value::Choice(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Enumerated(v) => write!(f, "enum({})", v),
            Value::BitString(v) => write!(f, "{}", v),
            Value::OctetString(v) => write!(f, "{:02X?}", v),
            Value::PrintableString(v) => write!(f, "{:?}", v),
            Value::Sequence(v) => {
                write!(f, "{{")?;
                for (i, (name, value)) in v.fields().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", name, value)?;
                }
                if !v.unknown_extensions().is_empty() {
                    write!(f, " +{} unknown extension(s)", v.unknown_extensions().len())?;
                }
                write!(f, "}}")
            }
            Value::SequenceOf(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Choice(ChoiceValue::Known { present, payload }) => {
                write!(f, "#{}: {}", present, payload)
            }
            Value::Choice(ChoiceValue::Unknown(open)) => {
                write!(f, "unknown extension #{} ({} octets)", open.index, open.bytes.len())
            }
        }
    }
}

/// Opaque extension data preserved from a newer schema revision
///
/// `index` is the position of the extension addition (or extension
/// alternative) counted from the first addition, `bytes` the complete open-type
/// encoding as it appeared on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpenType {
    pub index: usize,
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
}

impl OpenType {
    pub fn new(index: usize, bytes: Vec<u8>) -> Self {
        Self { index, bytes }
    }
}

/// CHOICE value: exactly one alternative is present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceValue {
    /// Alternative defined by the schema, identified by its declaration index
    Known { present: usize, payload: Box<Value> },
    /// Extension alternative this schema does not define
    Unknown(OpenType),
}

impl ChoiceValue {
    pub fn new(present: usize, payload: Value) -> Self {
        ChoiceValue::Known {
            present,
            payload: Box::new(payload),
        }
    }

    /// Declaration index of the present alternative, if it is known
    pub fn present(&self) -> Option<usize> {
        match self {
            ChoiceValue::Known { present, .. } => Some(*present),
            ChoiceValue::Unknown(_) => None,
        }
    }

    /// Payload of the present alternative, if it is known
    pub fn payload(&self) -> Option<&Value> {
        match self {
            ChoiceValue::Known { payload, .. } => Some(payload),
            ChoiceValue::Unknown(_) => None,
        }
    }
}

/// SEQUENCE value: member name to value, plus unknown extension additions
///
/// Absent members are simply not in the map. Equality does not depend on
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequenceValue {
    fields: BTreeMap<String, Value>,
    unknown_extensions: Vec<OpenType>,
}

impl SequenceValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a member value, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of members present
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.unknown_extensions.is_empty()
    }

    /// Iterate over present members in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Extension additions from a newer schema revision, in wire order
    pub fn unknown_extensions(&self) -> &[OpenType] {
        &self.unknown_extensions
    }

    /// Record an unknown extension addition
    pub fn push_unknown_extension(&mut self, extension: OpenType) {
        self.unknown_extensions.push(extension);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_value_order_independent() {
        let a = SequenceValue::new().with("a", 1i64).with("b", true);
        let b = SequenceValue::new().with("b", true).with("a", 1i64);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get("a"), Some(&Value::Integer(1)));
        assert!(!a.contains("c"));
    }

    #[test]
    fn test_choice_value_accessors() {
        let known = ChoiceValue::new(2, Value::Null);
        assert_eq!(known.present(), Some(2));
        assert_eq!(known.payload(), Some(&Value::Null));

        let unknown = ChoiceValue::Unknown(OpenType::new(0, vec![0x80]));
        assert_eq!(unknown.present(), None);
        assert!(unknown.payload().is_none());
    }

    #[test]
    fn test_value_display() {
        let value = Value::Sequence(SequenceValue::new().with("a", 10i64));
        assert_eq!(value.to_string(), "{a 10}");
        assert_eq!(Value::choice(1, Value::Null).to_string(), "#1: NULL");
    }

    #[test]
    fn test_value_serde_round_trip() {
        let value = Value::Sequence(
            SequenceValue::new()
                .with("plmn", Value::octets(vec![0x21, 0x22, 0x23]))
                .with("id", Value::choice(0, Value::Integer(5))),
        );
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);
    }
}
