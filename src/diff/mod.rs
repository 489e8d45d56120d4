//! Structured diff engine
//!
//! - [`value`] - tagged field values with per-variant display formatting
//! - [`tracker`] - recursive record diffing into field-change entries
//! - [`changelog`] - per-record change history (changesets)
//! - [`compare`] - part-to-part comparison across BOM, documents,
//!   revisions, files, and technical attributes

pub mod changelog;
pub mod compare;
pub mod tracker;
pub mod value;

pub use changelog::{ChangeLog, ChangeReason, ChangeSet};
pub use compare::{CompareError, CompareScope, ComparisonReport};
pub use tracker::{diff_records, ChangeType, FieldChange};
pub use value::{FieldValue, Record};
