//! Single-page HTML report

use crate::sink::{Renderer, ReportSink};
use crate::ReportError;
use html_escape::{encode_single_quoted_attribute, encode_text};
use schemaaudit_core::{
    CommonFile, ComparisonReport, CorruptionSection, Counts, DiffKind, DottedId, EntryCount,
    FieldEntry, FileComparison, OneOnlyGroup, OneOnlyRow, OneOnlySection, Side,
};

const STYLE: &str = "body{font-family:Helvetica,Arial,sans-serif;margin:2em}\
table{border-collapse:collapse;width:100%;margin-bottom:1em}\
th,td{border:1px solid #ccc;padding:4px;vertical-align:top;text-align:left}\
th{background:#eee}.highlight{background:#e8e8e8}\
.titleInCol{font-weight:bold}.marray{font-family:monospace}\
dt{font-weight:bold;margin-top:.5em}";

/// Renders the report as one HTML page
///
/// Counts come first, then the sections in walk order. Only notable common
/// files get a row.
#[derive(Debug, Default)]
pub struct HtmlRenderer {
    baseline_label: String,
    other_label: String,
    version: String,
    timestamp: String,
    both_files: usize,
    side: Option<Side>,
    row_no: usize,
    counts: String,
    body: String,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn label(&self, side: Side) -> &str {
        match side {
            Side::Baseline => &self.baseline_label,
            Side::Other => &self.other_label,
        }
    }

    fn side_suffix(&self) -> &'static str {
        match self.side {
            Some(Side::Baseline) => "Base",
            _ => "Other",
        }
    }

    fn differences_cell(&self, side: Side, file: &FileComparison) -> String {
        let total = match side {
            Side::Baseline => file.diff.baseline_field_count,
            Side::Other => file.diff.other_field_count,
        };
        let kinds = match side {
            Side::Baseline => [
                DiffKind::BaselineUnique,
                DiffKind::DeprecatedOnlyByBaseline,
                DiffKind::BaselineUniqueDeprecated,
            ],
            Side::Other => [
                DiffKind::OtherUnique,
                DiffKind::DeprecatedOnlyByOther,
                DiffKind::OtherUniqueDeprecated,
            ],
        };

        let mut cell = String::new();
        for kind in kinds {
            let fields: Vec<&FieldEntry> = file.diff.of_kind(kind).map(|d| &d.field).collect();
            if fields.is_empty() {
                continue;
            }
            if !cell.is_empty() {
                cell.push_str("<br/>");
            }
            let class = if highlighted(kind) { " class='highlight'" } else { "" };
            cell.push_str(&format!(
                "<div{}><span class='titleInCol'>{} has {} {} out of {}</span><br/>{}</div>",
                class,
                encode_text(self.label(side)),
                fields.len(),
                kind.label(),
                total,
                field_list(&fields)
            ));
        }

        if side == Side::Other {
            let renames: Vec<String> = file
                .diff
                .of_kind(DiffKind::Renamed)
                .map(|d| {
                    format!(
                        "{}: {} (base) -- {} (other)",
                        d.field.number,
                        encode_text(&d.field.name.to_lowercase()),
                        encode_text(&d.other_name.as_deref().unwrap_or_default().to_lowercase())
                    )
                })
                .collect();
            if !renames.is_empty() {
                if !cell.is_empty() {
                    cell.push_str("<br/>");
                }
                cell.push_str(&format!(
                    "<div class='highlight'><span class='titleInCol'>Field Name Mismatch</span><br/>{}</div>",
                    renames.join("<br/>")
                ));
            }
        }

        if cell.is_empty() {
            "<td/>".to_string()
        } else {
            format!("<td>{}</td>", cell)
        }
    }

    fn counts_item(&mut self, term: &str, definition: &str) {
        self.counts
            .push_str(&format!("<dt>{}</dt><dd>{}</dd>", term, definition));
    }
}

impl ReportSink for HtmlRenderer {
    fn start_report(&mut self, report: &ComparisonReport) {
        self.baseline_label = report.baseline_label.clone();
        self.other_label = report.other_label.clone();
        self.version = report.version.to_string();
        self.timestamp = report.timestamp.clone();
        self.both_files = report.partition.both.len();
    }

    fn start_both(&mut self) {
        self.row_no = 0;
        self.body.push_str(&format!(
            "<div class='report' id='both'><h2>Files in Both</h2>\
             <p>{} files are in both instances. Only files with differences are listed.</p>",
            self.both_files
        ));
        self.body.push_str(&format!(
            "<table><tr><th>#</th><th>Name/ID</th><th>Entries</th><th>{} (\"Baseline\")</th><th>{} (\"Other\")</th></tr>",
            encode_text(&self.baseline_label),
            encode_text(&self.other_label)
        ));
    }

    fn both(&mut self, file: &CommonFile) {
        if !file.is_notable() {
            return;
        }
        let Some(c) = file.comparison() else {
            return;
        };

        self.row_no += 1;
        self.body
            .push_str(&format!(
                "<tr id='{}'><td>{}</td>",
                encode_single_quoted_attribute(c.id.as_str()),
                self.row_no
            ));

        if c.name_mismatch {
            self.body.push_str(&format!(
                "<td class='highlight'><span class='titleInCol'>File Name Mismatch</span><br/>{}<br/><br/>{}<br/><br/>",
                encode_text(&c.baseline_name),
                encode_text(&c.other_name)
            ));
        } else if c.pending_deletion {
            self.body.push_str(&format!(
                "<td class='highlight'><span class='titleInCol'>Pending Deletion</span><br/>{}<br/><br/>",
                encode_text(&c.baseline_name)
            ));
        } else {
            self.body
                .push_str(&format!("<td>{}<br/><br/>", encode_text(&c.baseline_name)));
        }

        if c.parents.is_empty() {
            self.body.push_str(&format!(
                "{} &nbsp;{}",
                c.id,
                location_markup(c.location.as_deref())
            ));
        } else {
            self.body.push_str(&sub_file_id(&c.id, &c.parents));
        }
        if let Some(package) = &c.package {
            self.body.push_str(&format!("<br/><br/>{}", encode_text(package)));
        }
        self.body.push_str("</td>");

        self.body
            .push_str(&entries_cell(&c.baseline_count, &c.other_count));

        if matches!(file, CommonFile::Volatile(_)) {
            self.body.push_str(
                "<td colspan='2'>IGNORING - volatile file family, contents always differ</td></tr>",
            );
            return;
        }

        let baseline = self.differences_cell(Side::Baseline, c);
        let other = self.differences_cell(Side::Other, c);
        self.body.push_str(&baseline);
        self.body.push_str(&other);
        self.body.push_str("</tr>");
    }

    fn end_both(&mut self) {
        self.body.push_str("</table></div>");
    }

    fn start_one_only(&mut self, section: &OneOnlySection) {
        self.side = Some(section.side);
        let blurb = match section.side {
            Side::Baseline => format!(
                "{} files are unique to {}. Along with missing fields, these files show what {} lacks.",
                section.total,
                encode_text(&self.baseline_label),
                encode_text(&self.other_label)
            ),
            Side::Other => format!(
                "{} files are unique to {}. Along with custom fields added to common files, \
                 these indicate the extent of custom functionality in this instance.",
                section.total,
                encode_text(&self.other_label)
            ),
        };
        let anchor = match section.side {
            Side::Baseline => "baseOnly",
            Side::Other => "otherOnly",
        };
        self.body.push_str(&format!(
            "<div class='report' id='{}'><h2>Files only in {}</h2><p>{}</p>",
            anchor,
            encode_text(&section.label),
            blurb
        ));
    }

    fn start_one_only_group(&mut self, group: &OneOnlyGroup) {
        self.row_no = 0;
        self.body.push_str(&format!(
            "<div id='{}{}'><h3>{}</h3><p>{}</p>",
            group.kind.id(),
            self.side_suffix(),
            group.kind.title(),
            group.kind.blurb()
        ));
        self.body.push_str(
            "<table><tr><th>#</th><th>ID/Locn</th><th>Name</th><th># Fields</th><th># Entries</th><th>Description (first part)</th></tr>",
        );
    }

    fn one_only(&mut self, row: &OneOnlyRow) {
        self.row_no += 1;
        let package = row
            .package
            .as_deref()
            .map(|p| format!("<br/><br/>{}", encode_text(p)))
            .unwrap_or_default();

        let (id_cell, name_cell) = if row.parents.is_empty() {
            let id = match &row.local_owner {
                Some(owner) => owner_markup(&row.id, owner.owner.as_deref().unwrap_or(&owner.station)),
                None => row.id.to_string(),
            };
            let name = if row.pending_deletion {
                format!("<strong>{}</strong><br/>PENDING DELETION", encode_text(&row.name))
            } else {
                encode_text(&row.name).into_owned()
            };
            (
                format!("{}<br/><br/>{}", id, location_markup(row.location.as_deref())),
                name + &package,
            )
        } else {
            (sub_file_id(&row.id, &row.parents), encode_text(&row.name).into_owned() + &package)
        };

        self.body.push_str(&format!(
            "<tr id='{}'><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            encode_single_quoted_attribute(row.id.as_str()),
            self.row_no,
            id_cell,
            name_cell,
            row.field_count,
            row.count,
            encode_text(row.description.as_deref().unwrap_or_default())
        ));
    }

    fn end_one_only_group(&mut self, _group: &OneOnlyGroup) {
        self.body.push_str("</table></div>");
    }

    fn end_one_only(&mut self, _section: &OneOnlySection) {
        self.body.push_str("</div>");
    }

    fn start_corruption(&mut self, section: &CorruptionSection) {
        let anchor = match section.side {
            Side::Baseline => "corruptInBase",
            Side::Other => "corruptInOther",
        };
        self.body.push_str(&format!(
            "<div class='report' id='{}'><h2>Corruption in {}</h2>\
             <p>Schema corruption must be accounted for when comparing schemas. \
             Corrupt files and fields take no part in the comparison.</p>",
            anchor,
            encode_text(&section.label)
        ));
    }

    fn corruption(&mut self, section: &CorruptionSection) {
        if section.is_empty() {
            self.body.push_str("<p>No corruption found.</p>");
            return;
        }

        self.body.push_str("<p>Corrupt files ...</p>");
        self.body
            .push_str("<table><tr><th>Corruption</th><th>Files</th></tr>");
        for group in &section.files {
            self.body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>",
                encode_text(&group.reason),
                join_ids(&group.files)
            ));
        }
        self.body.push_str("</table>");

        self.body.push_str("<p>Corrupt fields in files ...</p>");
        self.body
            .push_str("<table><tr><th>#</th><th>Field/Corruption</th></tr>");
        for file in &section.fields {
            let fields: Vec<String> = file
                .fields
                .iter()
                .map(|f| format!("{} ({})", f.number, encode_text(&f.reason)))
                .collect();
            self.body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>",
                file.file,
                fields.join(", ")
            ));
        }
        self.body.push_str("</table>");
    }

    fn end_corruption(&mut self, _section: &CorruptionSection) {
        self.body.push_str("</div>");
    }

    fn counts(&mut self, counts: &Counts) {
        let base = &counts.baseline;
        let other = &counts.other;

        self.counts.push_str("<div class='report' id='counts'><h2>Schema Counts</h2><dl>");
        self.counts_item(
            "Overall",
            &format!("{} files, {} in both", counts.all_files, counts.both_files),
        );
        self.counts_item(
            &format!("{} (\"Baseline\")", encode_text(&self.baseline_label)),
            &format!(
                "{} datapoints, {} files, {} tops, {} multiples, {} corrupt, <span class='highlight'>{} unique</span>, \
                 {} populated ({:.1}%)<br/>{} fields, {} in shared files, <span class='highlight'>{} unique</span>",
                base.datapoints,
                base.files,
                base.tops,
                base.subfiles,
                base.corrupt_files,
                base.only_files,
                base.populated_tops,
                Counts::percent(base.populated_tops, base.tops),
                base.fields,
                base.fields_in_shared,
                base.unique_fields
            ),
        );
        self.counts_item(
            &format!("{} (\"Other\")", encode_text(&self.other_label)),
            &format!(
                "{} datapoints, {} files, {} tops, {} multiples, {} corrupt, <span class='highlight'>{} unique ({:.1}%)</span>, \
                 {} populated ({:.1}%)<br/>{} fields, {} in shared files, {} unique, {} repurposed, \
                 <span class='highlight'>{} custom ({:.1}%)</span>",
                other.datapoints,
                other.files,
                other.tops,
                other.subfiles,
                other.corrupt_files,
                other.only_files,
                Counts::percent(other.only_files, other.files),
                other.populated_tops,
                Counts::percent(other.populated_tops, other.tops),
                other.fields,
                other.fields_in_shared,
                other.unique_fields,
                counts.renamed_fields,
                counts.custom_fields(),
                Counts::percent(counts.custom_fields(), other.fields_in_shared)
            ),
        );
        self.counts.push_str("</dl></div>");
    }
}

impl Renderer for HtmlRenderer {
    fn finish(self) -> Result<String, ReportError> {
        let base = encode_text(&self.baseline_label);
        let other = encode_text(&self.other_label);

        let mut html = String::new();
        html.push_str("<!DOCTYPE html><html><head><meta charset='utf-8'/>");
        html.push_str(&format!(
            "<title>Schema Comparison: {} vs {}</title><style>{}</style></head><body>",
            base, other, STYLE
        ));
        html.push_str(&format!("<h1>Schema Comparison: {} vs {}</h1>", base, other));
        html.push_str(&format!(
            "<p>Compare two instances, {} ('Other') against {} ('Baseline'). \
             This report shows which files and fields are shared and which are exclusive to one \
             or the other. For each file, the report also gives a count of its entries as \
             reported by its instance. Highlights are in grey.</p>",
            other, base
        ));
        html.push_str(&format!(
            "<p>Jump to: <a href='#counts'>Counts</a> | <a href='#both' class='highlight'>In Both</a> | \
             <a href='#otherOnly' class='highlight'>{o} Only</a> (Class <a href='#topsClass1Other'>1</a>, \
             <a href='#topsClass3Other'>3</a>, <a href='#uniqueMultiplesOther'>Multiples</a>) | \
             <a href='#baseOnly' class='highlight'>{b} Only</a> (Class <a href='#topsClass1Base'>1</a>, \
             <a href='#topsClass3Base'>3</a>, <a href='#uniqueMultiplesBase'>Multiples</a>) | \
             Corruption (<a href='#corruptInOther'>{o}</a>, <a href='#corruptInBase'>{b}</a>)</p>",
            o = other,
            b = base
        ));
        html.push_str(&self.counts);
        html.push_str(&self.body);
        html.push_str(&format!(
            "<p class='footer'>Report version {}, generated {}</p></body></html>",
            self.version,
            encode_text(&self.timestamp)
        ));

        Ok(html)
    }
}

fn highlighted(kind: DiffKind) -> bool {
    !matches!(
        kind,
        DiffKind::OtherUnique | DiffKind::BaselineUniqueDeprecated | DiffKind::OtherUniqueDeprecated
    )
}

/// Lower-cased names with their numbers; locally-owned numbers carry the owner
fn field_list(fields: &[&FieldEntry]) -> String {
    fields
        .iter()
        .map(|f| {
            let number = match &f.local_owner {
                Some(owner) => owner_markup(&f.number, owner.owner.as_deref().unwrap_or(&owner.station)),
                None => f.number.to_string(),
            };
            format!("{} ({})", encode_text(&f.name.to_lowercase()), number)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn owner_markup(id: &DottedId, owner: &str) -> String {
    format!("{} [<strong>{}</strong>]", id, encode_text(owner))
}

fn entries_cell(baseline: &EntryCount, other: &EntryCount) -> String {
    if baseline == other {
        match baseline {
            EntryCount::Unpopulated => "<td/>".to_string(),
            EntryCount::Reported(_) => format!("<td>{}</td>", encode_text(&baseline.to_string())),
        }
    } else {
        format!(
            "<td>{}<br/>{}</td>",
            encode_text(&baseline.to_string()),
            encode_text(&other.to_string())
        )
    }
}

/// Storage root in monospace, subscript part as is
fn location_markup(location: Option<&str>) -> String {
    match location {
        None | Some("") => String::new(),
        Some(location) => match location.split_once('(') {
            Some((root, rest)) => format!(
                "<span class='marray'>{}</span>({}",
                encode_text(root),
                encode_text(rest)
            ),
            None => format!("<span class='marray'>{}</span>", encode_text(location)),
        },
    }
}

/// Ancestor chain, one indented id per line, ending with the file itself
fn sub_file_id(id: &DottedId, parents: &[DottedId]) -> String {
    let mut markup = String::new();
    let mut indent = String::new();
    for ancestor in parents.iter().chain(std::iter::once(id)) {
        if !markup.is_empty() {
            markup.push_str("<br/>");
        }
        markup.push_str(&indent);
        markup.push_str(ancestor.as_str());
        indent.push_str("&nbsp;&nbsp;&nbsp;");
    }
    markup
}

fn join_ids(ids: &[DottedId]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::walk;
    use schemaaudit_core::ClassificationConfig;
    use schemaaudit_engine::SchemaComparer;
    use schemaaudit_index::{RawDescription, RawField, RawRecord, SchemaIndex};
    use schemaaudit_reference::ReferenceTables;

    fn index(label: &str, records: Vec<RawRecord>) -> SchemaIndex {
        SchemaIndex::build(label, records, &ReferenceTables::empty(), &ClassificationConfig::default())
    }

    fn render(baseline: &SchemaIndex, other: &SchemaIndex) -> String {
        let report = SchemaComparer::default().compare(baseline, other);
        let mut renderer = HtmlRenderer::new();
        walk(&report, &mut renderer);
        renderer.finish().unwrap()
    }

    #[test]
    fn counts_precede_sections() {
        let gold = index("GOLD", vec![RawDescription::new("2", "PATIENT").into()]);
        let html = render(&gold, &gold);

        let counts = html.find("id='counts'").unwrap();
        let both = html.find("id='both'").unwrap();
        let other_only = html.find("id='otherOnly'").unwrap();
        let other_corrupt = html.find("id='corruptInOther'").unwrap();
        let base_only = html.find("id='baseOnly'").unwrap();
        let base_corrupt = html.find("id='corruptInBase'").unwrap();
        assert!(counts < both);
        assert!(both < other_only);
        assert!(other_only < other_corrupt);
        assert!(other_corrupt < base_only);
        assert!(base_only < base_corrupt);
        assert!(html.contains("href='#topsClass3Other'"));
    }

    #[test]
    fn unchanged_common_file_has_no_row() {
        let gold = index(
            "GOLD",
            vec![RawDescription::new("2", "PATIENT")
                .with_field(RawField::new(".01", "NAME", "4"))
                .into()],
        );
        let html = render(&gold, &gold);
        assert!(!html.contains("<tr id='2'>"));
    }

    #[test]
    fn renames_shown_lower_case() {
        let baseline = index(
            "GOLD",
            vec![RawDescription::new("2", "PATIENT")
                .with_field(RawField::new(".03", "SEX", "3"))
                .into()],
        );
        let other = index(
            "OTHER",
            vec![RawDescription::new("2", "PATIENT")
                .with_field(RawField::new(".03", "GENDER", "3"))
                .into()],
        );
        let html = render(&baseline, &other);
        assert!(html.contains("<tr id='2'>"));
        assert!(html.contains(".03: sex (base) -- gender (other)"));
        assert!(html.contains("Field Name Mismatch"));
    }

    #[test]
    fn volatile_file_notice() {
        let baseline = index("GOLD", vec![RawDescription::new("63", "LAB DATA").into()]);
        let other = index("OTHER", vec![RawDescription::new("63", "LAB DATA").into()]);
        let html = render(&baseline, &other);
        assert!(html.contains("IGNORING - volatile file family"));
    }

    #[test]
    fn labels_are_escaped() {
        let baseline = index("A<B", vec![]);
        let other = index("C&D", vec![]);
        let html = render(&baseline, &other);
        assert!(html.contains("A&lt;B"));
        assert!(html.contains("C&amp;D"));
        assert!(!html.contains("A<B"));
    }

    #[test]
    fn names_and_descriptions_are_escaped() {
        let baseline = index("GOLD", vec![RawDescription::new("2", "PATIENT").into()]);
        let other = index(
            "OTHER",
            vec![
                RawDescription::new("2", "PATIENT").into(),
                RawDescription::new("9", "R&D <SITE>")
                    .with_description("Tracks <b>local</b> work")
                    .into(),
            ],
        );

        let html = render(&baseline, &other);
        assert!(html.contains("R&amp;D &lt;SITE&gt;"));
        assert!(html.contains("Tracks &lt;b&gt;local&lt;/b&gt; work"));
        assert!(!html.contains("<b>local</b>"));
    }

    #[test]
    fn sub_file_chain() {
        let chain = sub_file_id(&DottedId::new("2.01"), &[DottedId::new("2")]);
        assert_eq!(chain, "2<br/>&nbsp;&nbsp;&nbsp;2.01");
    }

    #[test]
    fn location_split() {
        assert_eq!(
            location_markup(Some("^DPT(")),
            "<span class='marray'>^DPT</span>("
        );
        assert_eq!(location_markup(None), "");
    }
}
