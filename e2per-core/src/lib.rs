//! Core types and utilities for the E2 service-model PER codec
//!
//! This crate provides the runtime value tree the codec produces and consumes,
//! the error taxonomy shared by every layer, and the codec configuration.

pub mod config;
pub mod datatypes;
pub mod error;

pub use config::{Alignment, CodecConfig};
pub use datatypes::{BitString, ChoiceValue, OpenType, SequenceValue, Value};
pub use error::{CodecError, CodecResult};
