//! Static reference tables for schema indexing
//!
//! Two lookups, both loaded once from CSV and read-only afterwards:
//! - namespaces: 3-digit station prefix to owning organization
//! - packages: file id or id range to package label
//!
//! Consumers depend on the `ReferenceLookup` trait so tests can substitute
//! their own tables.

pub mod lookup;
pub mod namespace;
pub mod package;

pub use lookup::{ReferenceError, ReferenceLookup, ReferenceTables};
pub use namespace::NamespaceTable;
pub use package::{PackageRange, PackageTable};
