//! PER (Packed Encoding Rules, ITU-T X.691) building blocks
//!
//! PER encodes a value using knowledge of its type: constraints shrink
//! integers to the minimal bit width, OPTIONAL members cost one presence bit,
//! and no tags or lengths are sent for things the receiver already knows.
//!
//! # Layers
//!
//! - **Bit I/O** ([`BitSink`], [`BitSource`]): MSB-first bit writing and reading
//!   with octet alignment and backpatching.
//! - **Constraints** ([`Constraint`]): value and size ranges, with or without an
//!   extension marker.
//! - **Primitives** ([`PerEncoder`], [`PerDecoder`]): constrained whole numbers,
//!   length determinants, normally small numbers, strings and open types.
//!
//! # Variants
//!
//! Both the ALIGNED (APER) and UNALIGNED (UPER) variants are supported and
//! selected with [`e2per_core::Alignment`]. E2 service models use APER.
//!
//! # Implementation Notes
//!
//! 1. **Fragmentation**: lengths of 16K and above need fragmented length
//!    determinants, which are rejected with `UnsupportedConstruct`.
//! 2. **Integers**: values are limited to 64 bits.

pub mod constraint;
pub mod decoder;
pub mod encoder;
pub mod sink;
pub mod source;

pub use constraint::{Constraint, RangeCheck};
pub use decoder::PerDecoder;
pub use encoder::PerEncoder;
pub use sink::{BitSink, BitWriter, Reservation};
pub use source::{BitReader, BitSource};

/// Lengths from here on need fragmentation (X.691 11.9.3.8)
pub const LENGTH_FRAGMENT_LIMIT: usize = 16384;

/// Size constraints with an upper bound at or above this use a length determinant
pub const MAX_CONSTRAINED_LENGTH: i64 = 65536;
