use thiserror::Error;

/// Main error type for PER encode/decode operations
///
/// Every failure aborts the current encode or decode call. Variants fall into
/// three groups:
/// - schema problems detected while building descriptors (`Schema`)
/// - caller bugs surfaced on encode (`TypeMismatch`, `RangeViolation`, `SizeViolation`)
/// - malformed wire input surfaced on decode (`TruncatedInput`, `UnknownAlternative`,
///   `LengthMismatch`, `MalformedBitmap`, `TagMismatch`)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Range violation: value {value} not in range {lower}..={upper}")]
    RangeViolation { value: i64, lower: i64, upper: i64 },

    #[error("Size violation: length {length} not in range {lower}..={upper}")]
    SizeViolation { length: usize, lower: i64, upper: i64 },

    #[error("Unknown alternative: index {index} (root alternatives: {root})")]
    UnknownAlternative { index: u64, root: usize },

    #[error("Length mismatch: envelope declared {declared} octets, inner value consumed {consumed}")]
    LengthMismatch { declared: usize, consumed: usize },

    #[error("Malformed presence bitmap: {0}")]
    MalformedBitmap(String),

    #[error("Tag mismatch: expected {expected}, found {found}")]
    TagMismatch { expected: String, found: String },

    #[error("Truncated input: need {needed} bits, have {available}")]
    TruncatedInput { needed: usize, available: usize },

    #[error("Unsupported construct: {0}")]
    UnsupportedConstruct(String),

    #[error("Nesting depth limit of {0} exceeded")]
    DepthExceeded(usize),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl CodecError {
    /// Shorthand for a type mismatch between a descriptor kind and a value
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        CodecError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Whether the error was caused by malformed wire input
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            CodecError::TruncatedInput { .. }
                | CodecError::UnknownAlternative { .. }
                | CodecError::LengthMismatch { .. }
                | CodecError::MalformedBitmap(_)
                | CodecError::TagMismatch { .. }
        )
    }
}

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
