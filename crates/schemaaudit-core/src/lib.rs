//! SchemaAudit Core
//!
//! Core domain model with stable, versioned types.
//! Never rename classification codes - they are part of the public API.

pub mod ids;
pub mod schema;
pub mod classification;
pub mod report;
pub mod config;

pub use ids::DottedId;
pub use schema::{
    normalize_name, CorruptFile, EntryCount, FieldDef, FieldSchema, FieldType, FileDef, FileSchema,
    LocalOwner,
};
pub use classification::{DiffKind, Side};
pub use report::{
    CommonFile, ComparisonReport, CorruptFieldEntry, CorruptFieldsOfFile, CorruptFileGroup,
    CorruptionSection, Counts, FieldDifference, FieldEntry, FileComparison, FileDiff,
    InstanceCounts, OneOnlyGroup, OneOnlyGroupKind, OneOnlyRow, OneOnlySection, Partition,
    ReportVersion,
};
pub use config::{
    ClassificationConfig, ComparisonConfig, Config, ConfigError, ReferenceConfig, ReportConfig,
    ReportFormat,
};
