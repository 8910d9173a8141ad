//! ASN.1 PER codec engine for E2 service models
//!
//! This crate provides the schema model (type descriptors with members, tags
//! and constraints) and the codec engine that encodes/decodes value trees
//! under those descriptors with the Packed Encoding Rules.
//!
//! # Layout
//!
//! - [`per`]: bit I/O, constraints and X.691 primitives
//! - [`ber`]: tags, canonical tag order, explicit-tag envelopes
//! - [`schema`]: type descriptors and their validation
//! - [`codec`]: the descriptor-driven encoder/decoder
//!
//! # Status
//!
//! ## PER 编码/解码
//! - [x] 约束整数（APER/UPER）、半约束和无约束整数
//! - [x] BOOLEAN、NULL、ENUMERATED（含扩展）
//! - [x] BIT STRING、OCTET STRING、PrintableString（SIZE 约束）
//! - [x] SEQUENCE（OPTIONAL/DEFAULT、扩展附加）
//! - [x] SEQUENCE OF
//! - [x] CHOICE（规范标签顺序、扩展备选）
//! - [x] 显式标签封装（BER 标识符 + 长度回填）
//! - [ ] 分片长度（>= 16K）
//! - [ ] 扩展附加组 `[[ ]]`

pub mod ber;
pub mod codec;
pub mod per;
pub mod schema;

#[cfg(test)]
mod property_tests;

pub use ber::{Tag, TagClass, TaggingMode};
pub use codec::{decode, encode, Codec};
pub use per::{BitReader, BitSink, BitSource, BitWriter, Constraint};
pub use schema::{Deferred, Enumeration, Member, Presence, PrimitiveKind, TypeDescriptor, TypeKind, TypeRef};
