//! Report counts

use schemaaudit_core::{
    CommonFile, Counts, DiffKind, DottedId, FileComparison, InstanceCounts, Partition, Side,
};
use schemaaudit_index::{FileAttr, SchemaIndex};

/// Totals over both instances and the comparison results
pub fn compute_counts(
    baseline: &SchemaIndex,
    other: &SchemaIndex,
    partition: &Partition,
    both: &[CommonFile],
) -> Counts {
    let renamed_fields = both
        .iter()
        .filter_map(compared)
        .map(|c| c.diff.count(DiffKind::Renamed))
        .sum();

    Counts {
        all_files: partition.total(),
        both_files: partition.both.len(),
        renamed_fields,
        baseline: instance_counts(Side::Baseline, baseline, &partition.baseline_only, partition, both),
        other: instance_counts(Side::Other, other, &partition.other_only, partition, both),
    }
}

fn compared(file: &CommonFile) -> Option<&FileComparison> {
    match file {
        CommonFile::Compared(c) => Some(c),
        _ => None,
    }
}

fn instance_counts(
    side: Side,
    index: &SchemaIndex,
    only: &[DottedId],
    partition: &Partition,
    both: &[CommonFile],
) -> InstanceCounts {
    let unique_kinds = match side {
        Side::Baseline => [DiffKind::BaselineUnique, DiffKind::BaselineUniqueDeprecated],
        Side::Other => [DiffKind::OtherUnique, DiffKind::OtherUniqueDeprecated],
    };

    let unique_fields = both
        .iter()
        .filter_map(compared)
        .map(|c| unique_kinds.iter().map(|k| c.diff.count(*k)).sum::<usize>())
        .sum();

    InstanceCounts {
        datapoints: index.datapoints(None),
        files: index.files_without(FileAttr::Corruption, None).len(),
        tops: index.count_files(true),
        subfiles: index.files_with(FileAttr::Parent, None).len(),
        corrupt_files: index.files_with(FileAttr::Corruption, None).len(),
        only_files: only.len(),
        populated_tops: index.count_populated_tops(),
        fields: index.count_fields(index.file_ids(false)),
        fields_in_shared: index.count_fields(&partition.both),
        unique_fields,
    }
}
