//! Field-level diff of a file both instances have
//!
//! Only ordinary fields take part: subordinate-file references are files of
//! their own and corrupt fields are never classified.

use schemaaudit_core::{
    normalize_name, DiffKind, FieldDef, FieldDifference, FieldEntry, FieldSchema, FileDef, FileDiff,
};

/// Classify the field differences between two versions of one file
pub fn diff_fields(baseline: &FileDef, other: &FileDef) -> FileDiff {
    let baseline_fields = ordinary_fields(baseline);
    let other_fields = ordinary_fields(other);

    let mut differences = Vec::new();

    // Fields both sides have
    for base in &baseline_fields {
        let Some(theirs) = other_fields.iter().find(|o| o.number == base.number) else {
            continue;
        };

        match (base.deprecated, theirs.deprecated) {
            (true, true) => {}
            (true, false) => differences.push(difference(DiffKind::DeprecatedOnlyByBaseline, base, None)),
            (false, true) => differences.push(difference(DiffKind::DeprecatedOnlyByOther, theirs, None)),
            (false, false) => {
                if normalize_name(&base.name) != normalize_name(&theirs.name) {
                    differences.push(difference(DiffKind::Renamed, base, Some(theirs.name.clone())));
                }
            }
        }
    }

    // Ordinary on one side only; numbers corrupt on the other side stay unclassified
    for base in &baseline_fields {
        if !has_ordinary(&other_fields, base) && !is_corrupt(other, base) {
            let kind = if base.deprecated {
                DiffKind::BaselineUniqueDeprecated
            } else {
                DiffKind::BaselineUnique
            };
            differences.push(difference(kind, base, None));
        }
    }

    for theirs in &other_fields {
        if !has_ordinary(&baseline_fields, theirs) && !is_corrupt(baseline, theirs) {
            let kind = if theirs.deprecated {
                DiffKind::OtherUniqueDeprecated
            } else {
                DiffKind::OtherUnique
            };
            differences.push(difference(kind, theirs, None));
        }
    }

    differences.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.field.number.cmp(&b.field.number)));

    FileDiff {
        baseline_field_count: baseline_fields.len(),
        other_field_count: other_fields.len(),
        differences,
    }
}

fn ordinary_fields(file: &FileDef) -> Vec<&FieldDef> {
    file.fields
        .iter()
        .filter(|f| f.is_ordinary())
        .filter_map(FieldSchema::as_normal)
        .collect()
}

fn has_ordinary(fields: &[&FieldDef], field: &FieldDef) -> bool {
    fields.iter().any(|f| f.number == field.number)
}

fn is_corrupt(file: &FileDef, field: &FieldDef) -> bool {
    matches!(file.field(&field.number), Some(FieldSchema::Corrupt { .. }))
}

fn difference(kind: DiffKind, field: &FieldDef, other_name: Option<String>) -> FieldDifference {
    FieldDifference {
        kind,
        field: FieldEntry {
            number: field.number.clone(),
            name: field.name.clone(),
            local_owner: field.class3.clone(),
        },
        other_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemaaudit_core::{FieldType, LocalOwner};

    fn field(number: &str, name: &str) -> FieldSchema {
        let mut def = FieldDef::new(number, name, FieldType::FreeText);
        def.deprecated = name.starts_with('*');
        FieldSchema::Normal(def)
    }

    fn file(fields: Vec<FieldSchema>) -> FileDef {
        let mut def = FileDef::new("2", "PATIENT");
        def.fields = fields;
        def
    }

    fn kinds(diff: &FileDiff) -> Vec<(DiffKind, String)> {
        diff.differences
            .iter()
            .map(|d| (d.kind, d.field.number.to_string()))
            .collect()
    }

    #[test]
    fn identical_files_have_no_differences() {
        let a = file(vec![field(".01", "NAME"), field(".02", "SSN")]);
        let diff = diff_fields(&a, &a.clone());
        assert!(diff.is_empty());
        assert_eq!(diff.baseline_field_count, 2);
    }

    #[test]
    fn baseline_unique_field() {
        let base = file(vec![field(".01", "NAME"), field(".02", "SSN")]);
        let other = file(vec![field(".01", "NAME")]);

        let diff = diff_fields(&base, &other);
        assert_eq!(kinds(&diff), vec![(DiffKind::BaselineUnique, ".02".to_string())]);
        assert_eq!(diff.differences[0].field.name, "SSN");
    }

    #[test]
    fn normalized_names_are_not_renames() {
        let base = file(vec![field(".01", "PATIENT_NAME")]);
        let other = file(vec![field(".01", "Patient Name")]);
        assert!(diff_fields(&base, &other).is_empty());
    }

    #[test]
    fn rename_keeps_both_names() {
        let base = file(vec![field(".03", "SEX")]);
        let other = file(vec![field(".03", "GENDER")]);

        let diff = diff_fields(&base, &other);
        assert_eq!(diff.count(DiffKind::Renamed), 1);
        assert_eq!(diff.differences[0].field.name, "SEX");
        assert_eq!(diff.differences[0].other_name.as_deref(), Some("GENDER"));
    }

    #[test]
    fn deprecation_rules() {
        let base = file(vec![
            field(".09", "*OLD ID"),
            field(".1", "WARD"),
            field(".2", "*OLD WARD"),
            field(".5", "*RETIRED"),
        ]);
        let other = file(vec![
            field(".09", "*OLD ID"),
            field(".1", "*WARD"),
            field(".2", "COMPLETELY DIFFERENT"),
            field(".6", "*GONE"),
        ]);

        let diff = diff_fields(&base, &other);
        assert_eq!(
            kinds(&diff),
            vec![
                (DiffKind::DeprecatedOnlyByBaseline, ".2".to_string()),
                (DiffKind::BaselineUniqueDeprecated, ".5".to_string()),
                (DiffKind::DeprecatedOnlyByOther, ".1".to_string()),
                (DiffKind::OtherUniqueDeprecated, ".6".to_string()),
            ]
        );
    }

    #[test]
    fn corrupt_fields_never_classified() {
        let base = file(vec![
            field(".01", "NAME"),
            FieldSchema::Corrupt {
                number: ".02".into(),
                reason: "no type node".to_string(),
            },
        ]);
        let other = file(vec![
            field(".01", "NAME"),
            field(".02", "SSN"),
            FieldSchema::Corrupt {
                number: ".03".into(),
                reason: "bad".to_string(),
            },
        ]);

        let diff = diff_fields(&base, &other);
        assert!(diff.is_empty());
        assert_eq!(diff.baseline_field_count, 1);
        assert_eq!(diff.other_field_count, 2);
    }

    #[test]
    fn subordinate_references_skipped() {
        let base = file(vec![
            field(".01", "NAME"),
            FieldSchema::Normal(FieldDef::new("1900", "VISIT", FieldType::Multiple)),
        ]);
        let other = file(vec![field(".01", "NAME")]);

        let diff = diff_fields(&base, &other);
        assert!(diff.is_empty());
        assert_eq!(diff.baseline_field_count, 1);
    }

    #[test]
    fn field_turned_multiple_is_unique() {
        let base = file(vec![field(".01", "NAME"), field("1", "ALIAS")]);
        let other = file(vec![
            field(".01", "NAME"),
            FieldSchema::Normal(FieldDef::new("1", "ALIAS", FieldType::Multiple)),
        ]);

        let diff = diff_fields(&base, &other);
        assert_eq!(kinds(&diff), vec![(DiffKind::BaselineUnique, "1".to_string())]);
        assert_eq!(diff.baseline_field_count, 2);
        assert_eq!(diff.other_field_count, 1);

        let reversed = diff_fields(&other, &base);
        assert_eq!(kinds(&reversed), vec![(DiffKind::OtherUnique, "1".to_string())]);
    }

    #[test]
    fn other_unique_carries_local_owner() {
        let base = file(vec![field(".01", "NAME")]);
        let mut local = FieldDef::new("460010", "LOCAL FLAG", FieldType::SetOfCodes);
        local.class3 = Some(LocalOwner {
            station: "460".to_string(),
            owner: Some("WILMINGTON".to_string()),
        });
        let other = file(vec![field(".01", "NAME"), FieldSchema::Normal(local)]);

        let diff = diff_fields(&base, &other);
        assert_eq!(diff.count(DiffKind::OtherUnique), 1);
        assert_eq!(
            diff.differences[0].field.local_owner.as_ref().map(|o| o.station.as_str()),
            Some("460")
        );
    }
}
