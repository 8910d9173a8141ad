//! Codec engine: encode a value tree under a descriptor, decode it back
//!
//! The engine walks the descriptor graph recursively and dispatches on the
//! closed [`TypeKind`](crate::schema::TypeKind) set. The two directions are
//! exact inverses: `decode(d, encode(d, v)) == v` for every value `v` valid
//! under `d`.
//!
//! # Usage Example
//!
//! ```rust
//! use e2per_asn1::codec::Codec;
//! use e2per_asn1::per::Constraint;
//! use e2per_asn1::schema::TypeDescriptor;
//! use e2per_core::{CodecConfig, Value};
//!
//! // FiveQI ::= INTEGER (0..255, ...)
//! let five_qi = TypeDescriptor::integer("FiveQI", Constraint::extensible(0, 255))?;
//! let codec = Codec::new(CodecConfig::default());
//! let bytes = codec.encode(&five_qi, &Value::Integer(12))?;
//! assert_eq!(&bytes[..], &[0x00, 0x0C]);
//! assert_eq!(codec.decode(&five_qi, &bytes)?, Value::Integer(12));
//! # Ok::<(), e2per_core::CodecError>(())
//! ```

mod decoder;
mod encoder;

use crate::per::{BitReader, BitSink, BitSource, BitWriter};
use crate::schema::TypeDescriptor;
use bytes::Bytes;
use decoder::ValueDecoder;
use e2per_core::{CodecConfig, CodecError, CodecResult, Value};
use encoder::ValueEncoder;

/// PER codec bound to a configuration
///
/// Holds no per-call state; one instance can serve any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode `value` as a complete encoding
    ///
    /// An encoding with no bits at all (e.g. NULL) yields a single zero octet.
    ///
    /// # Errors
    /// `TypeMismatch` if the value does not have the shape of the descriptor,
    /// `RangeViolation`/`SizeViolation` for values outside non-extensible
    /// constraints, `UnsupportedConstruct` for fragmented lengths.
    pub fn encode(&self, descriptor: &TypeDescriptor, value: &Value) -> CodecResult<Bytes> {
        let mut writer = BitWriter::new();
        self.encode_into(descriptor, value, &mut writer)?;
        if writer.is_empty() {
            log::debug!("Encoded {} as empty complete encoding", descriptor.name());
            return Ok(Bytes::from_static(&[0x00]));
        }

        let bits = writer.bit_position();
        let bytes = writer.into_bytes();
        log::debug!("Encoded {} ({} bits): {}", descriptor.name(), bits, hex(&bytes));
        Ok(bytes)
    }

    /// Encode `value` into a caller-supplied sink without padding the end
    pub fn encode_into<S: BitSink>(&self, descriptor: &TypeDescriptor, value: &Value, sink: &mut S) -> CodecResult<()> {
        ValueEncoder::new(sink, &self.config, 0).encode_value(descriptor, value)
    }

    /// Decode a complete encoding
    ///
    /// A complete encoding is at least one octet, so empty input is rejected
    /// even for types that encode to zero bits.
    ///
    /// # Errors
    /// `TruncatedInput` when the input is empty or ends inside a field, and
    /// `UnknownAlternative`, `MalformedBitmap`, `LengthMismatch`, `TagMismatch`
    /// for malformed input. No partial value is ever returned.
    pub fn decode(&self, descriptor: &TypeDescriptor, bytes: &[u8]) -> CodecResult<Value> {
        log::debug!("Decoding {} from {}", descriptor.name(), hex(bytes));
        if bytes.is_empty() {
            return Err(CodecError::TruncatedInput {
                needed: 8,
                available: 0,
            });
        }
        let mut reader = BitReader::new(bytes);
        let value = self.decode_from(descriptor, &mut reader)?;
        log::debug!("Decoded {} ({} bits): {}", descriptor.name(), reader.bit_position(), value);
        Ok(value)
    }

    /// Decode one value from a caller-supplied source
    pub fn decode_from<S: BitSource>(&self, descriptor: &TypeDescriptor, source: &mut S) -> CodecResult<Value> {
        ValueDecoder::new(source, &self.config, 0).decode_value(descriptor)
    }
}

/// Encode with the default configuration (aligned PER)
pub fn encode(descriptor: &TypeDescriptor, value: &Value) -> CodecResult<Bytes> {
    Codec::default().encode(descriptor, value)
}

/// Decode with the default configuration (aligned PER)
pub fn decode(descriptor: &TypeDescriptor, bytes: &[u8]) -> CodecResult<Value> {
    Codec::default().decode(descriptor, bytes)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
