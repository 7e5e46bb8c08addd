//! The schema index of one instance
//!
//! Built once from a full snapshot of raw records, immutable afterwards.

use crate::raw::{RawDescription, RawField, RawRecord};
use schemaaudit_core::{
    ClassificationConfig, CorruptFile, DottedId, EntryCount, FieldDef, FieldSchema, FieldType,
    FileDef, FileSchema, LocalOwner,
};
use schemaaudit_reference::ReferenceLookup;
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

/// Which fields of a file an accessor returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSelection {
    /// Non-corrupt fields other than subordinate-file references
    Ordinary,

    /// Every non-corrupt field
    IncludeSubordinate,

    /// Corrupt fields only
    CorruptOnly,
}

/// File attributes the set queries filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAttr {
    Corruption,
    Class3,
    Deprecated,
    Parent,
}

/// Errors that can occur when querying an index
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("{label}: no file {id}")]
    NotFound { label: String, id: DottedId },
}

/// File id to schema mapping for one instance
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    label: String,
    rules: ClassificationConfig,
    files: BTreeMap<DottedId, FileSchema>,
}

impl SchemaIndex {
    /// Build an index from raw records
    ///
    /// Records are read in order; a later record with an id already seen
    /// replaces the earlier one.
    pub fn build(
        label: impl Into<String>,
        records: impl IntoIterator<Item = RawRecord>,
        reference: &dyn ReferenceLookup,
        rules: &ClassificationConfig,
    ) -> Self {
        let label = label.into();
        let start = Instant::now();
        tracing::info!(label = %label, "building schema index");

        let mut files = BTreeMap::new();
        for record in records {
            let schema = normalize_record(record, reference, rules);
            if let FileSchema::Corrupt(corrupt) = &schema {
                tracing::debug!(label = %label, id = %corrupt.id, reason = %corrupt.reason, "corrupt file");
            }

            let id = schema.id().clone();
            if files.insert(id.clone(), schema).is_some() {
                tracing::warn!(label = %label, id = %id, "duplicate file id, keeping the later record");
            }
        }

        resolve_parents(&mut files, reference, rules);

        let index = Self {
            label,
            rules: rules.clone(),
            files,
        };

        tracing::info!(
            label = %index.label,
            files = index.files.len(),
            corrupt = index.files_with(FileAttr::Corruption, None).len(),
            elapsed = ?start.elapsed(),
            "schema index built"
        );

        index
    }

    /// Instance label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Rules the index was built with
    pub fn rules(&self) -> &ClassificationConfig {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Entries in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (&DottedId, &FileSchema)> {
        self.files.iter()
    }

    /// Schema of a file
    pub fn schema(&self, id: &DottedId) -> Result<&FileSchema, IndexError> {
        self.files.get(id).ok_or_else(|| IndexError::NotFound {
            label: self.label.clone(),
            id: id.clone(),
        })
    }

    pub fn get(&self, id: &DottedId) -> Option<&FileSchema> {
        self.files.get(id)
    }

    /// Well-formed file by id
    pub fn file(&self, id: &DottedId) -> Option<&FileDef> {
        self.files.get(id).and_then(FileSchema::as_normal)
    }

    pub fn contains(&self, id: &DottedId) -> bool {
        self.files.contains_key(id)
    }

    /// File ids in ascending order
    ///
    /// `top_only` keeps well-formed top-level files; otherwise every id,
    /// corrupt ones included.
    pub fn file_ids(&self, top_only: bool) -> Vec<&DottedId> {
        self.files
            .iter()
            .filter(|(_, schema)| !top_only || schema.as_normal().is_some_and(FileDef::is_top))
            .map(|(id, _)| id)
            .collect()
    }

    /// Field numbers of a file in source order; empty for unknown or corrupt files
    pub fn field_ids(&self, file: &DottedId, selection: FieldSelection) -> Vec<&DottedId> {
        self.file(file)
            .map(|def| {
                def.fields
                    .iter()
                    .filter(|f| matches_selection(f, selection))
                    .map(FieldSchema::number)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fields with the given numbers, in the file's field order
    pub fn fields(&self, file: &DottedId, ids: &[&DottedId]) -> Vec<&FieldSchema> {
        self.file(file)
            .map(|def| {
                def.fields
                    .iter()
                    .filter(|f| ids.contains(&f.number()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn corrupt_fields(&self, file: &DottedId) -> Vec<&FieldSchema> {
        self.file(file)
            .map(|def| def.fields.iter().filter(|f| f.is_corrupt()).collect())
            .unwrap_or_default()
    }

    /// Information content of the given files, or of the whole index
    pub fn datapoints(&self, subset: Option<&[DottedId]>) -> usize {
        match subset {
            None => self.files.values().map(FileSchema::datapoints).sum(),
            Some(ids) => ids
                .iter()
                .filter_map(|id| self.files.get(id))
                .map(FileSchema::datapoints)
                .sum(),
        }
    }

    /// Ids (within `within`, or the whole index) whose file has `attr`
    pub fn files_with(&self, attr: FileAttr, within: Option<&[DottedId]>) -> Vec<&DottedId> {
        self.files_matching_within(within, |schema| self.has_attr(schema, attr))
    }

    /// Ids (within `within`, or the whole index) whose file lacks `attr`
    pub fn files_without(&self, attr: FileAttr, within: Option<&[DottedId]>) -> Vec<&DottedId> {
        self.files_matching_within(within, |schema| !self.has_attr(schema, attr))
    }

    /// Ids whose schema satisfies a predicate
    pub fn files_matching(&self, predicate: impl Fn(&FileSchema) -> bool) -> Vec<&DottedId> {
        self.files_matching_within(None, predicate)
    }

    pub fn count_files(&self, top_only: bool) -> usize {
        self.file_ids(top_only).len()
    }

    /// Top-level files whose entry count is a positive integer
    pub fn count_populated_tops(&self) -> usize {
        self.files
            .values()
            .filter_map(FileSchema::as_normal)
            .filter(|def| def.is_top() && def.count.populated().is_some())
            .count()
    }

    /// Ordinary fields across the given files
    pub fn count_fields<'a>(&self, files: impl IntoIterator<Item = &'a DottedId>) -> usize {
        files
            .into_iter()
            .map(|id| self.field_ids(id, FieldSelection::Ordinary).len())
            .sum()
    }

    pub fn file_name(&self, id: &DottedId) -> Option<&str> {
        self.files.get(id).and_then(FileSchema::name)
    }

    /// Whether a file's name carries the deprecation marker
    pub fn is_deprecated(&self, id: &DottedId) -> bool {
        self.file(id).is_some_and(|def| self.rules.is_deprecated(&def.name))
    }

    fn has_attr(&self, schema: &FileSchema, attr: FileAttr) -> bool {
        match (attr, schema) {
            (FileAttr::Corruption, schema) => schema.is_corrupt(),
            (_, FileSchema::Corrupt(_)) => false,
            (FileAttr::Class3, FileSchema::Normal(def)) => def.class3,
            (FileAttr::Deprecated, FileSchema::Normal(def)) => self.rules.is_deprecated(&def.name),
            (FileAttr::Parent, FileSchema::Normal(def)) => def.parent_id.is_some(),
        }
    }

    fn files_matching_within(
        &self,
        within: Option<&[DottedId]>,
        predicate: impl Fn(&FileSchema) -> bool,
    ) -> Vec<&DottedId> {
        match within {
            None => self
                .files
                .iter()
                .filter(|(_, schema)| predicate(schema))
                .map(|(id, _)| id)
                .collect(),
            Some(ids) => {
                let mut matched: Vec<&DottedId> = ids
                    .iter()
                    .filter_map(|id| self.files.get_key_value(id))
                    .filter(|(_, schema)| predicate(schema))
                    .map(|(id, _)| id)
                    .collect();
                matched.sort();
                matched.dedup();
                matched
            }
        }
    }
}

fn matches_selection(field: &FieldSchema, selection: FieldSelection) -> bool {
    match selection {
        FieldSelection::Ordinary => field.is_ordinary(),
        FieldSelection::IncludeSubordinate => !field.is_corrupt(),
        FieldSelection::CorruptOnly => field.is_corrupt(),
    }
}

/// First pass: one raw record to a file schema, parents unresolved
fn normalize_record(
    record: RawRecord,
    reference: &dyn ReferenceLookup,
    rules: &ClassificationConfig,
) -> FileSchema {
    match record {
        RawRecord::Error(marker) => FileSchema::Corrupt(CorruptFile {
            id: DottedId::new(marker.id()),
            name: None,
            reason: marker.error,
        }),
        RawRecord::Described(description) => normalize_description(description, reference, rules),
    }
}

fn normalize_description(
    description: RawDescription,
    reference: &dyn ReferenceLookup,
    rules: &ClassificationConfig,
) -> FileSchema {
    let id = DottedId::new(&description.number);
    let corrupt = |name: Option<String>, reason: String| {
        FileSchema::Corrupt(CorruptFile {
            id: id.clone(),
            name,
            reason,
        })
    };

    if !id.is_numeric() {
        return corrupt(description.name, format!("malformed file number {}", description.number));
    }

    let Some(name) = description.name.clone() else {
        return corrupt(None, "missing file name".to_string());
    };

    let parent_id = match description.parent.as_deref() {
        None | Some("") => None,
        Some(parent) => {
            let parent = DottedId::new(parent);
            if !parent.is_numeric() {
                return corrupt(Some(name), format!("unresolved parent {}", parent));
            }
            Some(parent)
        }
    };

    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(description.fields.len());
    for raw in &description.fields {
        let field = normalize_field(raw, reference, rules);
        if !seen.insert(field.number().clone()) {
            return corrupt(Some(name), format!("duplicate field number {}", field.number()));
        }
        fields.push(field);
    }

    let count = EntryCount::from_raw(description.count_text().as_deref());

    FileSchema::Normal(FileDef {
        id,
        name,
        location: description.location.filter(|l| !l.is_empty()),
        parent_id,
        parents: Vec::new(),
        count,
        class3: false,
        local_owner: None,
        package: None,
        description: description.description.map(|d| d.value),
        fields,
    })
}

fn normalize_field(
    raw: &RawField,
    reference: &dyn ReferenceLookup,
    rules: &ClassificationConfig,
) -> FieldSchema {
    let number = DottedId::new(&raw.number);
    let corrupt = |reason: String| FieldSchema::Corrupt {
        number: number.clone(),
        reason,
    };

    if let Some(reason) = &raw.corruption {
        return corrupt(reason.clone());
    }
    if !number.is_numeric() {
        return corrupt(format!("malformed field number {}", raw.number));
    }
    let Some(name) = &raw.name else {
        return corrupt("missing field name".to_string());
    };
    let Some(code) = &raw.field_type else {
        return corrupt("missing field type".to_string());
    };

    FieldSchema::Normal(FieldDef {
        deprecated: rules.is_deprecated(name),
        class3: local_owner(&number, reference, rules),
        attributes: raw.attributes(),
        field_type: FieldType::from_code(code),
        name: name.clone(),
        number,
    })
}

fn local_owner(
    id: &DottedId,
    reference: &dyn ReferenceLookup,
    rules: &ClassificationConfig,
) -> Option<LocalOwner> {
    rules.station(id).map(|station| LocalOwner {
        station: station.to_string(),
        owner: reference.namespace(station).map(str::to_string),
    })
}

/// Root-first ancestor chain of a file, or the corruption reason
fn ancestor_chain(files: &BTreeMap<DottedId, FileSchema>, def: &FileDef) -> Result<Vec<DottedId>, String> {
    let mut chain = Vec::new();
    let mut visited = HashSet::from([def.id.clone()]);
    let mut next = def.parent_id.clone();

    while let Some(parent) = next {
        if !visited.insert(parent.clone()) {
            return Err(format!("cyclic parent reference {}", parent));
        }

        // A corrupt ancestor breaks the chain like a missing one
        let Some(FileSchema::Normal(parent_def)) = files.get(&parent) else {
            return Err(format!("unresolved parent {}", parent));
        };

        next = parent_def.parent_id.clone();
        chain.insert(0, parent);
    }

    Ok(chain)
}

/// Second pass: ancestor chains, class 3, owner and package from the top file
fn resolve_parents(
    files: &mut BTreeMap<DottedId, FileSchema>,
    reference: &dyn ReferenceLookup,
    rules: &ClassificationConfig,
) {
    let chains: Vec<(DottedId, Result<Vec<DottedId>, String>)> = files
        .values()
        .filter_map(FileSchema::as_normal)
        .map(|def| (def.id.clone(), ancestor_chain(files, def)))
        .collect();

    for (id, chain) in chains {
        let Some(entry) = files.get_mut(&id) else {
            continue;
        };

        match chain {
            Ok(parents) => {
                if let FileSchema::Normal(def) = entry {
                    def.parents = parents;
                    let top = def.top_id().clone();
                    def.class3 = rules.is_local(&top);
                    def.local_owner = local_owner(&top, reference, rules);
                    def.package = reference.package(&top).map(str::to_string);
                }
            }
            Err(reason) => {
                tracing::debug!(id = %id, reason = %reason, "corrupt file");
                let name = entry.name().map(str::to_string);
                *entry = FileSchema::Corrupt(CorruptFile { id, name, reason });
            }
        }
    }
}
