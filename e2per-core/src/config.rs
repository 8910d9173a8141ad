//! Codec configuration
//!
//! # Usage Example
//!
//! ```rust
//! use e2per_core::{Alignment, CodecConfig};
//!
//! let config = CodecConfig::default()
//!     .with_alignment(Alignment::Unaligned)
//!     .with_max_depth(16);
//! assert_eq!(config.max_depth, 16);
//! ```

use serde::{Deserialize, Serialize};

/// Default recursion bound for nested descriptors
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default upper bound on open-type and explicit-envelope lengths, in octets
pub const DEFAULT_MAX_OPEN_TYPE_LENGTH: usize = 65535;

/// PER variant
///
/// - **Aligned** (APER): octet-aligns length determinants, large constrained
///   integers and strings longer than two octets. This is the variant E2
///   service models are exchanged in.
/// - **Unaligned** (UPER): never inserts padding; every constrained whole
///   number uses its minimal bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Aligned,
    Unaligned,
}

impl Alignment {
    /// Check if this is the aligned variant
    pub fn is_aligned(self) -> bool {
        self == Alignment::Aligned
    }
}

/// Codec configuration
///
/// Loaded from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// PER variant used for encoding and decoding
    pub alignment: Alignment,
    /// Maximum nesting depth of constructed values
    pub max_depth: usize,
    /// Maximum length accepted for an open type or explicit envelope on decode
    pub max_open_type_length: usize,
}

impl CodecConfig {
    /// Create a configuration with default settings (aligned PER)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the PER variant
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum open-type length in octets
    pub fn with_max_open_type_length(mut self, max_open_type_length: usize) -> Self {
        self.max_open_type_length = max_open_type_length;
        self
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            alignment: Alignment::Aligned,
            max_depth: DEFAULT_MAX_DEPTH,
            max_open_type_length: DEFAULT_MAX_OPEN_TYPE_LENGTH,
        }
    }
}
