//! Schema model: type descriptors, members and tag resolution
//!
//! Descriptors are the input contract of the codec engine. They are
//! validated when built and immutable afterwards, so one descriptor graph can
//! be shared by every encode/decode call in the process.

pub mod descriptor;
pub mod member;

pub use descriptor::{DescriptorBuilder, Enumeration, PrimitiveKind, TypeDescriptor, TypeKind};
pub use member::{Deferred, Member, Presence, TypeRef};
