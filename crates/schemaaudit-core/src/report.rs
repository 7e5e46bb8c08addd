//! Comparison report tree (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use crate::classification::{DiffKind, Side};
use crate::ids::DottedId;
use crate::schema::{EntryCount, LocalOwner};
use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Three-way split of the union of both instances' file ids
///
/// Disjoint, exhaustive, each list in ascending numeric order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub baseline_only: Vec<DottedId>,
    pub other_only: Vec<DottedId>,
    pub both: Vec<DottedId>,
}

impl Partition {
    /// Size of the union
    pub fn total(&self) -> usize {
        self.baseline_only.len() + self.other_only.len() + self.both.len()
    }
}

/// A field as listed in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub number: DottedId,
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_owner: Option<LocalOwner>,
}

/// One classified field difference within a common file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDifference {
    pub kind: DiffKind,

    /// The field as seen by the side the difference is reported against;
    /// the baseline's view for renames
    pub field: FieldEntry,

    /// The other instance's name, for renames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_name: Option<String>,
}

/// Field-level differences of a file present in both instances
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Ordinary field count in the baseline
    pub baseline_field_count: usize,

    /// Ordinary field count in the other instance
    pub other_field_count: usize,

    /// Differences ordered by kind, then field number
    pub differences: Vec<FieldDifference>,
}

impl FileDiff {
    /// Differences of one kind
    pub fn of_kind(&self, kind: DiffKind) -> impl Iterator<Item = &FieldDifference> {
        self.differences.iter().filter(move |d| d.kind == kind)
    }

    /// Count differences of one kind
    pub fn count(&self, kind: DiffKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Differences reported against one side
    pub fn for_side(&self, side: Side) -> impl Iterator<Item = &FieldDifference> {
        self.differences.iter().filter(move |d| d.kind.side() == side)
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }
}

/// A file present and well-formed in both instances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileComparison {
    pub id: DottedId,
    pub package: Option<String>,
    pub baseline_name: String,
    pub other_name: String,

    /// Names differ after normalization
    pub name_mismatch: bool,

    /// Baseline name carries the deprecation marker
    pub pending_deletion: bool,

    pub location: Option<String>,
    pub parents: Vec<DottedId>,
    pub baseline_count: EntryCount,
    pub other_count: EntryCount,
    pub diff: FileDiff,
}

/// A file id present in both instances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CommonFile {
    /// Field-level comparison performed
    Compared(FileComparison),

    /// Member of a volatile family: listed, never diffed
    Volatile(FileComparison),

    /// Corrupt on at least one side: no comparison
    Corrupt {
        id: DottedId,
        in_baseline: bool,
        in_other: bool,
    },
}

impl CommonFile {
    pub fn id(&self) -> &DottedId {
        match self {
            Self::Compared(c) | Self::Volatile(c) => &c.id,
            Self::Corrupt { id, .. } => id,
        }
    }

    pub fn comparison(&self) -> Option<&FileComparison> {
        match self {
            Self::Compared(c) | Self::Volatile(c) => Some(c),
            Self::Corrupt { .. } => None,
        }
    }

    /// Whether a renderer has anything to say about this file
    pub fn is_notable(&self) -> bool {
        match self {
            Self::Compared(c) => c.name_mismatch || !c.diff.is_empty(),
            Self::Volatile(_) => true,
            Self::Corrupt { .. } => false,
        }
    }
}

/// The three report groups of an instance's exclusive files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OneOnlyGroupKind {
    /// Top-level, centrally-issued files
    TopClass1,

    /// Top-level, locally-assigned files
    TopClass3,

    /// Sub-records of files the other instance also has
    SubRecords,
}

impl OneOnlyGroupKind {
    pub const ALL: [OneOnlyGroupKind; 3] = [Self::TopClass1, Self::TopClass3, Self::SubRecords];

    /// Stable anchor id
    pub fn id(&self) -> &'static str {
        match self {
            Self::TopClass1 => "topsClass1",
            Self::TopClass3 => "topsClass3",
            Self::SubRecords => "uniqueMultiples",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::TopClass1 => "Top, Class 1",
            Self::TopClass3 => "Top, Class 3",
            Self::SubRecords => "Unique Multiples in Shared Files",
        }
    }

    pub fn blurb(&self) -> &'static str {
        match self {
            Self::TopClass1 => "Unique, complete, class 1 files ...",
            Self::TopClass3 => "Unique, complete, class 3 files ...",
            Self::SubRecords => "Unique, multiples in shared files ...",
        }
    }
}

/// A file present in only one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneOnlyRow {
    pub id: DottedId,
    pub name: String,
    pub package: Option<String>,
    pub location: Option<String>,
    pub parents: Vec<DottedId>,

    /// Truncated description
    pub description: Option<String>,

    /// Ordinary field count
    pub field_count: usize,

    pub count: EntryCount,
    pub local_owner: Option<LocalOwner>,
    pub pending_deletion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneOnlyGroup {
    pub kind: OneOnlyGroupKind,
    pub rows: Vec<OneOnlyRow>,
}

/// Files exclusive to one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneOnlySection {
    pub side: Side,

    /// Instance label
    pub label: String,

    /// Size of the exclusive id set, corrupt files included
    pub total: usize,

    /// Always the three groups, in `OneOnlyGroupKind::ALL` order
    pub groups: Vec<OneOnlyGroup>,
}

impl OneOnlySection {
    pub fn group(&self, kind: OneOnlyGroupKind) -> Option<&OneOnlyGroup> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    /// Ids listed in a group
    pub fn ids(&self, kind: OneOnlyGroupKind) -> Vec<&DottedId> {
        self.group(kind)
            .map(|g| g.rows.iter().map(|r| &r.id).collect())
            .unwrap_or_default()
    }
}

/// Corrupt files sharing one reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptFileGroup {
    pub reason: String,
    pub files: Vec<DottedId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptFieldEntry {
    pub number: DottedId,
    pub reason: String,
}

/// Corrupt fields of one otherwise well-formed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptFieldsOfFile {
    pub file: DottedId,
    pub fields: Vec<CorruptFieldEntry>,
}

/// Corruption found in one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptionSection {
    pub side: Side,
    pub label: String,

    /// Grouped by reason, reasons in alphabetical order
    pub files: Vec<CorruptFileGroup>,

    /// Ordered by file id
    pub fields: Vec<CorruptFieldsOfFile>,
}

impl CorruptionSection {
    /// Number of corrupt files
    pub fn file_count(&self) -> usize {
        self.files.iter().map(|g| g.files.len()).sum()
    }

    /// Number of corrupt fields across all files
    pub fn field_count(&self) -> usize {
        self.fields.iter().map(|f| f.fields.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.fields.is_empty()
    }
}

/// Totals for one instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceCounts {
    pub datapoints: usize,

    /// Non-corrupt files; always `tops + subfiles`
    pub files: usize,
    pub tops: usize,
    pub subfiles: usize,

    /// Files isolated as corrupt, outside `files`
    pub corrupt_files: usize,

    /// Files only this instance has
    pub only_files: usize,

    /// Top-level files with a positive entry count
    pub populated_tops: usize,

    /// Ordinary fields across all files
    pub fields: usize,

    /// Ordinary fields across files both instances have
    pub fields_in_shared: usize,

    /// Fields of shared files only this instance has
    pub unique_fields: usize,
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub all_files: usize,
    pub both_files: usize,
    pub renamed_fields: usize,
    pub baseline: InstanceCounts,
    pub other: InstanceCounts,
}

impl Counts {
    /// Fields the other instance added or repurposed
    pub fn custom_fields(&self) -> usize {
        self.other.unique_fields + self.renamed_fields
    }

    /// Percentage of `part` in `whole`, zero when `whole` is zero
    pub fn percent(part: usize, whole: usize) -> f64 {
        if whole == 0 {
            0.0
        } else {
            (part as f64 / whole as f64) * 100.0
        }
    }
}

/// Schema comparison report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    pub baseline_label: String,
    pub other_label: String,

    pub partition: Partition,

    /// Every common id, in partition order
    pub both: Vec<CommonFile>,

    pub other_only: OneOnlySection,
    pub other_corruption: CorruptionSection,
    pub baseline_only: OneOnlySection,
    pub baseline_corruption: CorruptionSection,

    pub counts: Counts,
}

impl ComparisonReport {
    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Exclusive section for a side
    pub fn one_only(&self, side: Side) -> &OneOnlySection {
        match side {
            Side::Baseline => &self.baseline_only,
            Side::Other => &self.other_only,
        }
    }

    /// Corruption section for a side
    pub fn corruption(&self, side: Side) -> &CorruptionSection {
        match side {
            Side::Baseline => &self.baseline_corruption,
            Side::Other => &self.other_corruption,
        }
    }

    /// Common files that renderers should show
    pub fn notable_common_files(&self) -> impl Iterator<Item = &CommonFile> {
        self.both.iter().filter(|f| f.is_notable())
    }
}

/// Current time in RFC 3339, as stamped on new reports
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(number: &str, name: &str) -> FieldEntry {
        FieldEntry {
            number: DottedId::new(number),
            name: name.to_string(),
            local_owner: None,
        }
    }

    #[test]
    fn file_diff_filters() {
        let diff = FileDiff {
            baseline_field_count: 2,
            other_field_count: 1,
            differences: vec![
                FieldDifference {
                    kind: DiffKind::BaselineUnique,
                    field: entry(".02", "SSN"),
                    other_name: None,
                },
                FieldDifference {
                    kind: DiffKind::Renamed,
                    field: entry(".03", "SEX"),
                    other_name: Some("GENDER".to_string()),
                },
            ],
        };

        assert_eq!(diff.count(DiffKind::BaselineUnique), 1);
        assert_eq!(diff.count(DiffKind::OtherUnique), 0);
        assert_eq!(diff.for_side(Side::Other).count(), 1);
        assert!(!diff.is_empty());
    }

    #[test]
    fn percent_guards_zero() {
        assert_eq!(Counts::percent(1, 0), 0.0);
        assert_eq!(Counts::percent(1, 4), 25.0);
    }

    #[test]
    fn corrupt_common_file_not_notable() {
        let file = CommonFile::Corrupt {
            id: DottedId::new("5"),
            in_baseline: true,
            in_other: false,
        };
        assert_eq!(file.id().as_str(), "5");
        assert!(!file.is_notable());
        assert!(file.comparison().is_none());
    }

    #[test]
    fn group_kinds_stable() {
        assert_eq!(OneOnlyGroupKind::TopClass3.id(), "topsClass3");
        let json = serde_json::to_string(&OneOnlyGroupKind::SubRecords).unwrap();
        assert_eq!(json, "\"sub_records\"");
    }
}
