//! Plain formatted text report

use crate::sink::{Renderer, ReportSink};
use crate::ReportError;
use schemaaudit_core::{
    CommonFile, ComparisonReport, CorruptionSection, Counts, DiffKind, OneOnlyGroup, OneOnlyRow,
    OneOnlySection, Side,
};

#[derive(Debug, Default)]
pub struct TextRenderer {
    baseline_label: String,
    other_label: String,
    out: String,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn label(&self, side: Side) -> &str {
        match side {
            Side::Baseline => &self.baseline_label,
            Side::Other => &self.other_label,
        }
    }

    fn heading(&mut self, title: &str) {
        self.out.push_str(&format!("\n{}\n{}\n", title, "-".repeat(title.chars().count())));
    }
}

impl ReportSink for TextRenderer {
    fn start_report(&mut self, report: &ComparisonReport) {
        self.baseline_label = report.baseline_label.clone();
        self.other_label = report.other_label.clone();

        self.out.push_str(&format!(
            "Schema Comparison: {} (other) against {} (baseline)\n",
            report.other_label, report.baseline_label
        ));
        self.out.push_str(&format!("Version: {}\n", report.version));
        self.out.push_str(&format!("Timestamp: {}\n", report.timestamp));
        self.out.push_str(&format!("{}\n", "=".repeat(60)));
    }

    fn start_both(&mut self) {
        self.heading("Files in Both");
    }

    fn both(&mut self, file: &CommonFile) {
        if !file.is_notable() {
            return;
        }
        let Some(c) = file.comparison() else {
            return;
        };

        let mut title = format!("{} {}", c.id, c.baseline_name);
        if c.name_mismatch {
            title.push_str(&format!(" / {} (file name mismatch)", c.other_name));
        } else if c.pending_deletion {
            title.push_str(" (pending deletion)");
        }
        if let Some(package) = &c.package {
            title.push_str(&format!(" [{}]", package));
        }
        self.out.push_str(&format!("  {}\n", title));

        if c.baseline_count == c.other_count {
            self.out.push_str(&format!("    entries: {}\n", c.baseline_count));
        } else {
            self.out.push_str(&format!(
                "    entries: {} / {}\n",
                c.baseline_count, c.other_count
            ));
        }

        if matches!(file, CommonFile::Volatile(_)) {
            self.out
                .push_str("    IGNORING - volatile file family, contents always differ\n");
            return;
        }

        let mut kinds: Vec<DiffKind> = c.diff.differences.iter().map(|d| d.kind).collect();
        kinds.dedup();
        for kind in kinds {
            let side = kind.side();
            let total = match side {
                Side::Baseline => c.diff.baseline_field_count,
                Side::Other => c.diff.other_field_count,
            };
            let items: Vec<String> = c
                .diff
                .of_kind(kind)
                .map(|d| match (&d.other_name, &d.field.local_owner) {
                    (Some(other_name), _) => format!(
                        "{}: {} (base) -- {} (other)",
                        d.field.number,
                        d.field.name.to_lowercase(),
                        other_name.to_lowercase()
                    ),
                    (None, Some(owner)) => format!("{} ({} {})", d.field.name.to_lowercase(), d.field.number, owner),
                    (None, None) => format!("{} ({})", d.field.name.to_lowercase(), d.field.number),
                })
                .collect();

            let line = if kind == DiffKind::Renamed {
                format!("    field name mismatch: {}\n", items.join("; "))
            } else {
                format!(
                    "    {} has {} {} out of {}: {}\n",
                    self.label(side),
                    items.len(),
                    kind.label(),
                    total,
                    items.join(", ")
                )
            };
            self.out.push_str(&line);
        }
    }

    fn start_one_only(&mut self, section: &OneOnlySection) {
        self.heading(&format!("Files only in {} ({})", section.label, section.total));
    }

    fn start_one_only_group(&mut self, group: &OneOnlyGroup) {
        self.out
            .push_str(&format!("\n  {} ({})\n", group.kind.title(), group.rows.len()));
    }

    fn one_only(&mut self, row: &OneOnlyRow) {
        let id = if row.parents.is_empty() {
            row.id.to_string()
        } else {
            let chain: Vec<String> = row.parents.iter().map(|p| p.to_string()).collect();
            format!("{} > {}", chain.join(" > "), row.id)
        };

        let mut line = format!("    {} {}", id, row.name);
        if row.pending_deletion {
            line.push_str(" (pending deletion)");
        }
        if let Some(owner) = &row.local_owner {
            line.push_str(&format!(" <{}>", owner));
        }
        if let Some(package) = &row.package {
            line.push_str(&format!(" [{}]", package));
        }
        line.push_str(&format!("\n      fields: {}, entries: {}", row.field_count, row.count));
        if let Some(location) = &row.location {
            line.push_str(&format!(", location: {}", location));
        }
        line.push('\n');
        if let Some(description) = &row.description {
            line.push_str(&format!("      {}\n", description));
        }
        self.out.push_str(&line);
    }

    fn start_corruption(&mut self, section: &CorruptionSection) {
        self.heading(&format!("Corruption in {}", section.label));
    }

    fn corruption(&mut self, section: &CorruptionSection) {
        if section.is_empty() {
            self.out.push_str("  none\n");
            return;
        }
        for group in &section.files {
            let ids: Vec<String> = group.files.iter().map(|f| f.to_string()).collect();
            self.out
                .push_str(&format!("  {}: {}\n", group.reason, ids.join(", ")));
        }
        for file in &section.fields {
            let fields: Vec<String> = file
                .fields
                .iter()
                .map(|f| format!("{} ({})", f.number, f.reason))
                .collect();
            self.out.push_str(&format!(
                "  file {} corrupt fields: {}\n",
                file.file,
                fields.join(", ")
            ));
        }
    }

    fn counts(&mut self, counts: &Counts) {
        self.heading("Counts");
        self.out.push_str(&format!(
            "  Overall: {} files, {} in both\n",
            counts.all_files, counts.both_files
        ));

        for side in [Side::Baseline, Side::Other] {
            let c = match side {
                Side::Baseline => &counts.baseline,
                Side::Other => &counts.other,
            };
            self.out.push_str(&format!("  {} ({}):\n", self.label(side), side));
            self.out.push_str(&format!(
                "    {} datapoints, {} files, {} tops, {} multiples, {} corrupt, {} unique ({:.1}%), {} populated ({:.1}%)\n",
                c.datapoints,
                c.files,
                c.tops,
                c.subfiles,
                c.corrupt_files,
                c.only_files,
                Counts::percent(c.only_files, c.files),
                c.populated_tops,
                Counts::percent(c.populated_tops, c.tops)
            ));
            self.out.push_str(&format!(
                "    {} fields, {} in shared files, {} unique\n",
                c.fields, c.fields_in_shared, c.unique_fields
            ));
        }

        self.out.push_str(&format!(
            "  Custom fields: {} ({} unique, {} repurposed, {:.1}% of shared)\n",
            counts.custom_fields(),
            counts.other.unique_fields,
            counts.renamed_fields,
            Counts::percent(counts.custom_fields(), counts.other.fields_in_shared)
        ));
    }
}

impl Renderer for TextRenderer {
    fn finish(self) -> Result<String, ReportError> {
        Ok(self.out)
    }
}
