//! Schema indexing for one database instance
//!
//! This crate handles:
//! - The raw per-record description format (describe results)
//! - Schema providers, including the on-disk describe cache
//! - Building the immutable `SchemaIndex`: corruption isolation, parent
//!   chains, class-3 flags, package and namespace labels
//! - Pure accessors the comparer and renderers query

pub mod raw;
pub mod provider;
pub mod index;

pub use raw::{RawDescription, RawError, RawField, RawRecord, RawText};
pub use provider::{CacheProvider, MemoryProvider, ProviderError, SchemaProvider};
pub use index::{FieldSelection, FileAttr, IndexError, SchemaIndex};
