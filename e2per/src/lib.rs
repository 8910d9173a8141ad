//! e2per - ASN.1 PER codec for O-RAN E2 service models
//!
//! Encodes and decodes service-model payloads (the opaque octets carried in
//! E2AP messages) from type descriptors, without generated C code.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `e2per-core`: value tree, error taxonomy, codec configuration
//! - `e2per-asn1`: PER bit I/O, type descriptors and the codec engine
//! - `e2per-servicemodels`: KPM v2 and TEST-SM descriptors
//!
//! # Implementation Status
//!
//! ## ✅ 已完成
//! - APER/UPER 基本类型编码/解码
//! - SEQUENCE / SEQUENCE OF / CHOICE（含扩展和未知扩展保留）
//! - 显式标签封装、自动标签
//! - 递归类型（延迟引用）与深度限制
//! - KPM v2 节点/小区标识、TEST-SM
//!
//! ## 📋 待实现
//! - 分片长度（>= 16K）
//! - 扩展附加组
//!
//! # Usage
//!
//! ```rust
//! use e2per::servicemodels::kpm_v2;
//! use e2per::{Codec, CodecConfig, Value};
//!
//! let kpm = kpm_v2::descriptors()?;
//! let codec = Codec::new(CodecConfig::default());
//! let bytes = codec.encode(&kpm.five_qi, &Value::Integer(12))?;
//! assert_eq!(&bytes[..], &[0x00, 0x0C]);
//! assert_eq!(codec.decode(&kpm.five_qi, &bytes)?, Value::Integer(12));
//! # Ok::<(), e2per::CodecError>(())
//! ```

// Re-export core types
pub use e2per_core::datatypes::*;
pub use e2per_core::{Alignment, CodecConfig, CodecError, CodecResult};

// Re-export the codec engine
pub use e2per_asn1::{
    decode, encode, Codec, Constraint, Deferred, Enumeration, Member, Presence, PrimitiveKind, Tag, TagClass,
    TaggingMode, TypeDescriptor, TypeKind, TypeRef,
};

/// Low-level PER primitives and bit I/O
pub mod per {
    pub use e2per_asn1::per::*;
}

/// Service-model descriptors
pub mod servicemodels {
    pub use e2per_servicemodels::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_value_serializes() {
        let kpm = servicemodels::kpm_v2::descriptors().unwrap();
        let bytes = [0x00, 0x21, 0x22, 0x23, 0xD4, 0xBC, 0x09, 0x00];
        let value = decode(&kpm.eutra_cgi, &bytes).unwrap();

        let json = serde_json::to_string(&value).unwrap();
        let restored: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, value);
        assert_eq!(&encode(&kpm.eutra_cgi, &restored).unwrap()[..], &bytes);
    }

    #[test]
    fn test_short_bit_string_rejected_on_deserialize() {
        let result = serde_json::from_str::<Value>(r#"{"BitString":{"bytes":[],"num_bits":9}}"#);
        assert!(result.is_err());

        let value: Value = serde_json::from_str(r#"{"BitString":{"bytes":[212,188,9,0],"num_bits":28}}"#).unwrap();
        let kpm = servicemodels::kpm_v2::descriptors().unwrap();
        assert_eq!(
            &encode(&kpm.eutra_cell_identity, &value).unwrap()[..],
            &[0xD4, 0xBC, 0x09, 0x00]
        );
    }

    #[test]
    fn test_unaligned_codec() {
        let kpm = servicemodels::kpm_v2::descriptors().unwrap();
        let codec = Codec::new(CodecConfig::default().with_alignment(Alignment::Unaligned));
        // UPER: extension bit plus 8 bits, no padding before the value
        let bytes = codec.encode(&kpm.five_qi, &Value::Integer(12)).unwrap();
        assert_eq!(&bytes[..], &[0x06, 0x00]);
        assert_eq!(codec.decode(&kpm.five_qi, &bytes).unwrap(), Value::Integer(12));
    }
}
