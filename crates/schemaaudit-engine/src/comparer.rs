//! Schema comparer: two indexes in, one report tree out

use crate::corruption::corruption_section;
use crate::counts::compute_counts;
use crate::field_diff::diff_fields;
use crate::one_only::one_only_section;
use schemaaudit_core::report::timestamp_now;
use schemaaudit_core::{
    normalize_name, CommonFile, ComparisonConfig, ComparisonReport, Config, DottedId, FileComparison,
    FileDef, FileDiff, Partition, ReportVersion, Side,
};
use schemaaudit_index::SchemaIndex;
use std::collections::BTreeSet;

/// Compares an instance against a trusted baseline
///
/// Comparison never fails: corruption is reported, not raised.
#[derive(Debug, Clone)]
pub struct SchemaComparer {
    comparison: ComparisonConfig,
    description_limit: usize,
}

impl Default for SchemaComparer {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SchemaComparer {
    pub fn new(comparison: ComparisonConfig) -> Self {
        Self {
            comparison,
            description_limit: Config::default().report.description_limit,
        }
    }

    /// Comparison policy and report settings from a loaded config
    pub fn from_config(config: &Config) -> Self {
        Self {
            comparison: config.comparison.clone(),
            description_limit: config.report.description_limit,
        }
    }

    pub fn with_description_limit(mut self, limit: usize) -> Self {
        self.description_limit = limit;
        self
    }

    /// Build the full report tree
    pub fn compare(&self, baseline: &SchemaIndex, other: &SchemaIndex) -> ComparisonReport {
        let partition = partition_ids(baseline, other);

        tracing::info!(
            baseline = %baseline.label(),
            other = %other.label(),
            both = partition.both.len(),
            baseline_only = partition.baseline_only.len(),
            other_only = partition.other_only.len(),
            "comparing schemas"
        );

        let both: Vec<CommonFile> = partition
            .both
            .iter()
            .map(|id| self.compare_common(id, baseline, other))
            .collect();

        let counts = compute_counts(baseline, other, &partition, &both);

        ComparisonReport {
            version: ReportVersion::CURRENT,
            timestamp: timestamp_now(),
            baseline_label: baseline.label().to_string(),
            other_label: other.label().to_string(),
            other_only: one_only_section(Side::Other, other, &partition.other_only, self.description_limit),
            other_corruption: corruption_section(Side::Other, other),
            baseline_only: one_only_section(
                Side::Baseline,
                baseline,
                &partition.baseline_only,
                self.description_limit,
            ),
            baseline_corruption: corruption_section(Side::Baseline, baseline),
            both,
            counts,
            partition,
        }
    }

    fn compare_common(&self, id: &DottedId, baseline: &SchemaIndex, other: &SchemaIndex) -> CommonFile {
        let (Some(base), Some(theirs)) = (baseline.file(id), other.file(id)) else {
            return CommonFile::Corrupt {
                id: id.clone(),
                in_baseline: baseline.file(id).is_none(),
                in_other: other.file(id).is_none(),
            };
        };

        if self.comparison.is_volatile(id) {
            return CommonFile::Volatile(file_comparison(baseline, base, theirs, FileDiff::default()));
        }

        let diff = diff_fields(base, theirs);
        CommonFile::Compared(file_comparison(baseline, base, theirs, diff))
    }
}

/// Split the union of both instances' ids three ways, each part in id order
pub fn partition_ids(baseline: &SchemaIndex, other: &SchemaIndex) -> Partition {
    let base_ids: BTreeSet<&DottedId> = baseline.file_ids(false).into_iter().collect();
    let other_ids: BTreeSet<&DottedId> = other.file_ids(false).into_iter().collect();

    Partition {
        baseline_only: base_ids.difference(&other_ids).map(|id| (*id).clone()).collect(),
        other_only: other_ids.difference(&base_ids).map(|id| (*id).clone()).collect(),
        both: base_ids.intersection(&other_ids).map(|id| (*id).clone()).collect(),
    }
}

fn file_comparison(baseline: &SchemaIndex, base: &FileDef, theirs: &FileDef, diff: FileDiff) -> FileComparison {
    FileComparison {
        id: base.id.clone(),
        package: base.package.clone().or_else(|| theirs.package.clone()),
        baseline_name: base.name.clone(),
        other_name: theirs.name.clone(),
        name_mismatch: normalize_name(&base.name) != normalize_name(&theirs.name),
        pending_deletion: baseline.is_deprecated(&base.id),
        location: base.location.clone(),
        parents: base.parents.clone(),
        baseline_count: base.count.clone(),
        other_count: theirs.count.clone(),
        diff,
    }
}
