//! Corruption summary of one instance

use regex::Regex;
use schemaaudit_core::{
    CorruptFieldEntry, CorruptFieldsOfFile, CorruptFileGroup, CorruptionSection, DottedId,
    FileSchema, Side,
};
use schemaaudit_index::SchemaIndex;
use std::collections::BTreeMap;

/// Corrupt files grouped by reason, then corrupt fields of well-formed files
///
/// Sources often prefix reasons with the instance label (`GOLD: bad
/// header`); the prefix is dropped so equal reasons group together.
pub fn corruption_section(side: Side, index: &SchemaIndex) -> CorruptionSection {
    let qualifier = label_qualifier(index.label());

    let mut by_reason: BTreeMap<String, Vec<DottedId>> = BTreeMap::new();
    let mut fields = Vec::new();

    for (id, schema) in index.iter() {
        match schema {
            FileSchema::Corrupt(corrupt) => {
                let reason = match &qualifier {
                    Some(re) => re.replace(&corrupt.reason, "").into_owned(),
                    None => corrupt.reason.clone(),
                };
                by_reason.entry(reason).or_default().push(id.clone());
            }
            FileSchema::Normal(def) => {
                let corrupt: Vec<CorruptFieldEntry> = def
                    .fields
                    .iter()
                    .filter_map(|f| {
                        f.corruption().map(|reason| CorruptFieldEntry {
                            number: f.number().clone(),
                            reason: reason.to_string(),
                        })
                    })
                    .collect();

                if !corrupt.is_empty() {
                    fields.push(CorruptFieldsOfFile {
                        file: id.clone(),
                        fields: corrupt,
                    });
                }
            }
        }
    }

    CorruptionSection {
        side,
        label: index.label().to_string(),
        files: by_reason
            .into_iter()
            .map(|(reason, files)| CorruptFileGroup { reason, files })
            .collect(),
        fields,
    }
}

fn label_qualifier(label: &str) -> Option<Regex> {
    if label.is_empty() {
        return None;
    }
    match Regex::new(&format!(r"^\s*{}:\s*", regex::escape(label))) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(label = %label, "cannot build reason qualifier pattern: {}", e);
            None
        }
    }
}
