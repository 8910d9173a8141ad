//! ASN.1 tags and the BER octets PER borrows from
//!
//! PER itself never transmits tags. They still matter for three things:
//!
//! - **CHOICE alternatives** are indexed in canonical tag order.
//! - **Uniqueness**: tags of SEQUENCE members and CHOICE alternatives must be
//!   distinct so a schema is unambiguous.
//! - **Explicit tags** are carried as a BER identifier/length envelope around
//!   the inner PER encoding.
//!
//! ## Identifier Octets
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - P = Primitive (0) or Constructed (1)
//! - TTTTT = Tag number (0-30), or 11111 for the high-tag-number form

pub mod types;

pub use types::{BerLength, Tag, TagClass, TaggingMode};
