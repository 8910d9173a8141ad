//! Data types carried by PER-encoded messages

pub mod bit_string;
pub mod value;

// Re-export types
pub use bit_string::BitString;
pub use value::{ChoiceValue, OpenType, SequenceValue, Value};
