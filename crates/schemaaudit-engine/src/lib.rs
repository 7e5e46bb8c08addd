//! SchemaAudit engine - comparison of two schema indexes
//!
//! This crate implements the comparison logic:
//! - Partition of file ids into baseline-only, other-only and common
//! - Field-level diff of common files
//! - Grouping of exclusive files (class 1 tops, class 3 tops, sub-records)
//! - Corruption summaries and report counts

pub mod comparer;
pub mod field_diff;
pub mod one_only;
pub mod corruption;
pub mod counts;

pub use comparer::{partition_ids, SchemaComparer};
pub use field_diff::diff_fields;
pub use one_only::{one_only_section, truncate_description};
pub use corruption::corruption_section;
pub use counts::compute_counts;
