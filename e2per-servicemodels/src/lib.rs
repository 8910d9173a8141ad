//! E2 service-model descriptors
//!
//! Each module builds the descriptors of one service model lazily and
//! shares them for the life of the process.
//!
//! - [`kpm_v2`]: E2SM-KPM v2 node and cell identifiers
//! - [`test_sm`]: the TEST-SM model

pub mod kpm_v2;
pub mod test_sm;

pub use kpm_v2::KpmV2Descriptors;
pub use test_sm::TestSmDescriptors;
