//! CSV report: one flat row per finding

use crate::sink::{Renderer, ReportSink};
use crate::ReportError;
use schemaaudit_core::{
    CommonFile, CorruptionSection, Counts, InstanceCounts, OneOnlyGroup, OneOnlyGroupKind,
    OneOnlyRow, OneOnlySection, Side,
};
use serde::Serialize;

/// A CSV row; the header is derived from the field names
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CsvRow {
    pub section: &'static str,
    pub side: String,
    pub group: String,
    pub file: String,
    pub name: String,
    pub package: String,
    pub entries: String,
    pub field: String,
    pub field_name: String,
    pub classification: String,
    pub detail: String,
}

/// Collects rows while walking, writes them on finish
#[derive(Debug, Default)]
pub struct CsvRenderer {
    side: Option<Side>,
    group: Option<OneOnlyGroupKind>,
    rows: Vec<CsvRow>,
}

impl CsvRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[CsvRow] {
        &self.rows
    }

    fn side_name(&self) -> String {
        self.side.map(|s| s.to_string()).unwrap_or_default()
    }

    fn count_rows(&mut self, side: Side, counts: &InstanceCounts) {
        let metrics = [
            ("datapoints", counts.datapoints),
            ("files", counts.files),
            ("tops", counts.tops),
            ("subfiles", counts.subfiles),
            ("corrupt_files", counts.corrupt_files),
            ("only_files", counts.only_files),
            ("populated_tops", counts.populated_tops),
            ("fields", counts.fields),
            ("fields_in_shared", counts.fields_in_shared),
            ("unique_fields", counts.unique_fields),
        ];
        for (metric, value) in metrics {
            self.rows.push(count_row(Some(side), metric, value));
        }
    }
}

fn count_row(side: Option<Side>, metric: &str, value: usize) -> CsvRow {
    CsvRow {
        section: "counts",
        side: side.map(|s| s.to_string()).unwrap_or_default(),
        classification: metric.to_string(),
        detail: value.to_string(),
        ..CsvRow::default()
    }
}

impl ReportSink for CsvRenderer {
    fn both(&mut self, file: &CommonFile) {
        if !file.is_notable() {
            return;
        }
        let Some(c) = file.comparison() else {
            return;
        };

        let base = CsvRow {
            section: "both",
            file: c.id.to_string(),
            name: c.baseline_name.clone(),
            package: c.package.clone().unwrap_or_default(),
            entries: format!("{} / {}", c.baseline_count, c.other_count),
            ..CsvRow::default()
        };

        if c.name_mismatch {
            self.rows.push(CsvRow {
                classification: "FILE_NAME_MISMATCH".to_string(),
                detail: c.other_name.clone(),
                ..base.clone()
            });
        }
        if c.pending_deletion {
            self.rows.push(CsvRow {
                side: Side::Baseline.to_string(),
                classification: "PENDING_DELETION".to_string(),
                ..base.clone()
            });
        }

        if matches!(file, CommonFile::Volatile(_)) {
            self.rows.push(CsvRow {
                classification: "VOLATILE".to_string(),
                detail: "not compared".to_string(),
                ..base
            });
            return;
        }

        for difference in &c.diff.differences {
            self.rows.push(CsvRow {
                side: difference.kind.side().to_string(),
                field: difference.field.number.to_string(),
                field_name: difference.field.name.clone(),
                classification: difference.kind.as_str().to_string(),
                detail: difference
                    .other_name
                    .clone()
                    .or_else(|| difference.field.local_owner.as_ref().map(|o| o.to_string()))
                    .unwrap_or_default(),
                ..base.clone()
            });
        }
    }

    fn start_one_only(&mut self, section: &OneOnlySection) {
        self.side = Some(section.side);
    }

    fn start_one_only_group(&mut self, group: &OneOnlyGroup) {
        self.group = Some(group.kind);
    }

    fn one_only(&mut self, row: &OneOnlyRow) {
        let mut flags = Vec::new();
        if row.pending_deletion {
            flags.push("PENDING_DELETION".to_string());
        }
        if let Some(owner) = &row.local_owner {
            flags.push(format!("LOCAL {}", owner));
        }

        self.rows.push(CsvRow {
            section: "one_only",
            side: self.side_name(),
            group: self.group.map(|g| g.id().to_string()).unwrap_or_default(),
            file: row.id.to_string(),
            name: row.name.clone(),
            package: row.package.clone().unwrap_or_default(),
            entries: row.count.to_string(),
            field: row.field_count.to_string(),
            classification: flags.join(" "),
            detail: row.description.clone().unwrap_or_default(),
            ..CsvRow::default()
        });
    }

    fn end_one_only(&mut self, _section: &OneOnlySection) {
        self.group = None;
    }

    fn corruption(&mut self, section: &CorruptionSection) {
        let side = section.side.to_string();
        for group in &section.files {
            for file in &group.files {
                self.rows.push(CsvRow {
                    section: "corruption",
                    side: side.clone(),
                    file: file.to_string(),
                    classification: "CORRUPT_FILE".to_string(),
                    detail: group.reason.clone(),
                    ..CsvRow::default()
                });
            }
        }
        for file in &section.fields {
            for field in &file.fields {
                self.rows.push(CsvRow {
                    section: "corruption",
                    side: side.clone(),
                    file: file.file.to_string(),
                    field: field.number.to_string(),
                    classification: "CORRUPT_FIELD".to_string(),
                    detail: field.reason.clone(),
                    ..CsvRow::default()
                });
            }
        }
    }

    fn counts(&mut self, counts: &Counts) {
        self.rows.push(count_row(None, "all_files", counts.all_files));
        self.rows.push(count_row(None, "both_files", counts.both_files));
        self.rows.push(count_row(None, "renamed_fields", counts.renamed_fields));
        self.rows.push(count_row(None, "custom_fields", counts.custom_fields()));
        self.count_rows(Side::Baseline, &counts.baseline);
        self.count_rows(Side::Other, &counts.other);
    }
}

impl Renderer for CsvRenderer {
    fn finish(self) -> Result<String, ReportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &self.rows {
            writer.serialize(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ReportError::Csv(csv::Error::from(e.into_error())))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
