//! Files only one instance has, split into the three report groups

use schemaaudit_core::{
    DottedId, OneOnlyGroup, OneOnlyGroupKind, OneOnlyRow, OneOnlySection, Side,
};
use schemaaudit_index::{FieldSelection, SchemaIndex};
use std::collections::HashSet;

/// Group an instance's exclusive files
///
/// Corrupt files are left out of every group; they belong to the
/// corruption summary. A sub-record is only listed when its top ancestor is
/// shared, so a whole exclusive tree shows up once, under its top file.
pub fn one_only_section(
    side: Side,
    index: &SchemaIndex,
    exclusive: &[DottedId],
    description_limit: usize,
) -> OneOnlySection {
    let members: HashSet<&DottedId> = exclusive.iter().collect();

    let mut groups: Vec<OneOnlyGroup> = OneOnlyGroupKind::ALL
        .iter()
        .map(|kind| OneOnlyGroup {
            kind: *kind,
            rows: Vec::new(),
        })
        .collect();

    for id in exclusive {
        let Some(def) = index.file(id) else {
            continue;
        };

        let kind = if !def.is_top() {
            if members.contains(def.top_id()) {
                continue;
            }
            OneOnlyGroupKind::SubRecords
        } else if def.class3 {
            OneOnlyGroupKind::TopClass3
        } else {
            OneOnlyGroupKind::TopClass1
        };

        let row = OneOnlyRow {
            id: def.id.clone(),
            name: def.name.clone(),
            package: def.package.clone(),
            location: def.location.clone(),
            parents: def.parents.clone(),
            description: def
                .description
                .as_deref()
                .map(|d| truncate_description(d, description_limit)),
            field_count: index.field_ids(id, FieldSelection::Ordinary).len(),
            count: def.count.clone(),
            local_owner: def.local_owner.clone(),
            pending_deletion: index.is_deprecated(id),
        };

        if let Some(group) = groups.iter_mut().find(|g| g.kind == kind) {
            group.rows.push(row);
        }
    }

    for group in &mut groups {
        group
            .rows
            .sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.name.cmp(&b.name)));
    }

    OneOnlySection {
        side,
        label: index.label().to_string(),
        total: exclusive.len(),
        groups,
    }
}

/// First `limit` characters of a description, marked when cut
pub fn truncate_description(description: &str, limit: usize) -> String {
    if description.chars().count() > limit {
        let cut: String = description.chars().take(limit).collect();
        format!("{} ...", cut)
    } else {
        description.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemaaudit_core::ClassificationConfig;
    use schemaaudit_index::{RawDescription, RawField, RawRecord};
    use schemaaudit_reference::ReferenceTables;

    fn index(records: Vec<RawRecord>) -> SchemaIndex {
        SchemaIndex::build("OTHER", records, &ReferenceTables::empty(), &ClassificationConfig::default())
    }

    fn ids(section: &OneOnlySection, kind: OneOnlyGroupKind) -> Vec<String> {
        section.ids(kind).iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn groups_exclusive_files() {
        let index = index(vec![
            RawDescription::new("2", "PATIENT").into(),
            RawDescription::new("2.02", "RACE").with_parent("2").into(),
            RawDescription::new("9", "INSTALLATION").into(),
            RawDescription::new("460001", "REGISTRY")
                .with_field(RawField::new(".01", "NAME", "4"))
                .into(),
            RawDescription::new("460001.01", "ENTRIES").with_parent("460001").into(),
            RawRecord::error("58", "OTHER: bad"),
        ]);

        let exclusive: Vec<DottedId> = ["2.02", "9", "460001", "460001.01", "58"]
            .iter()
            .map(|s| DottedId::new(s))
            .collect();
        let section = one_only_section(Side::Other, &index, &exclusive, 300);

        assert_eq!(section.total, 5);
        assert_eq!(section.label, "OTHER");
        assert_eq!(ids(&section, OneOnlyGroupKind::TopClass1), vec!["9"]);
        assert_eq!(ids(&section, OneOnlyGroupKind::TopClass3), vec!["460001"]);
        assert_eq!(ids(&section, OneOnlyGroupKind::SubRecords), vec!["2.02"]);

        let registry = &section.group(OneOnlyGroupKind::TopClass3).unwrap().rows[0];
        assert_eq!(registry.field_count, 1);
        assert_eq!(registry.local_owner.as_ref().map(|o| o.station.as_str()), Some("460"));

        let race = &section.group(OneOnlyGroupKind::SubRecords).unwrap().rows[0];
        assert_eq!(race.parents, vec![DottedId::new("2")]);
    }

    #[test]
    fn pending_deletion_flag() {
        let index = index(vec![RawDescription::new("9", "*INSTALLATION").into()]);
        let section = one_only_section(Side::Other, &index, &[DottedId::new("9")], 300);
        assert!(section.group(OneOnlyGroupKind::TopClass1).unwrap().rows[0].pending_deletion);
    }

    #[test]
    fn description_truncation() {
        assert_eq!(truncate_description("short", 300), "short");
        assert_eq!(truncate_description("abcdef", 3), "abc ...");
        assert_eq!(truncate_description("ééé", 3), "ééé");
    }
}
