//! Schema types for files (record types) and their fields

use crate::ids::DottedId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field type as reported by the provider
///
/// Maps provider type codes to a common representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    DateTime,
    Numeric,
    SetOfCodes,
    FreeText,
    WordProcessing,
    Computed,
    Pointer,
    VariablePointer,

    /// Subordinate file reference: the sub-record is a separate file entry
    Multiple,

    Mumps,

    /// Code the provider emitted that has no known meaning
    Other(String),
}

impl FieldType {
    /// Map a provider type code
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => Self::DateTime,
            "2" => Self::Numeric,
            "3" => Self::SetOfCodes,
            "4" => Self::FreeText,
            "5" => Self::WordProcessing,
            "6" => Self::Computed,
            "7" => Self::Pointer,
            "8" => Self::VariablePointer,
            "9" => Self::Multiple,
            "10" => Self::Mumps,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether fields of this type are ordinary (not subordinate-file references)
    pub fn is_ordinary(&self) -> bool {
        !matches!(self, Self::Multiple)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DateTime => write!(f, "DATE-TIME"),
            Self::Numeric => write!(f, "NUMERIC"),
            Self::SetOfCodes => write!(f, "SET OF CODES"),
            Self::FreeText => write!(f, "FREE TEXT"),
            Self::WordProcessing => write!(f, "WORD-PROCESSING"),
            Self::Computed => write!(f, "COMPUTED"),
            Self::Pointer => write!(f, "POINTER"),
            Self::VariablePointer => write!(f, "VARIABLE POINTER"),
            Self::Multiple => write!(f, "MULTIPLE"),
            Self::Mumps => write!(f, "MUMPS"),
            Self::Other(code) => write!(f, "TYPE {}", code),
        }
    }
}

/// Station and owning organization of a locally-assigned (class 3) number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalOwner {
    /// 3-digit station prefix
    pub station: String,

    /// Owner name from the namespace table, when known
    pub owner: Option<String>,
}

impl std::fmt::Display for LocalOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{} [{}]", self.station, owner),
            None => write!(f, "{}", self.station),
        }
    }
}

/// A well-formed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field number, unique within its file
    pub number: DottedId,

    /// Field label as reported
    pub name: String,

    pub field_type: FieldType,

    /// Name carries the deprecation marker
    pub deprecated: bool,

    /// Present when the field number is locally assigned
    pub class3: Option<LocalOwner>,

    /// Further raw attributes the provider supplied (input transform, title, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl FieldDef {
    /// Create an ordinary, non-deprecated field
    pub fn new(number: impl Into<DottedId>, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            field_type,
            deprecated: false,
            class3: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Number of defined raw attributes (number, name, type and extras)
    pub fn datapoints(&self) -> usize {
        3 + self.attributes.len()
    }
}

/// A field entry: either well-formed or corrupt
///
/// Corruption excludes every derived attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FieldSchema {
    Normal(FieldDef),
    Corrupt { number: DottedId, reason: String },
}

impl FieldSchema {
    pub fn number(&self) -> &DottedId {
        match self {
            Self::Normal(def) => &def.number,
            Self::Corrupt { number, .. } => number,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Normal(def) => Some(&def.name),
            Self::Corrupt { .. } => None,
        }
    }

    pub fn as_normal(&self) -> Option<&FieldDef> {
        match self {
            Self::Normal(def) => Some(def),
            Self::Corrupt { .. } => None,
        }
    }

    pub fn corruption(&self) -> Option<&str> {
        match self {
            Self::Normal(_) => None,
            Self::Corrupt { reason, .. } => Some(reason),
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }

    /// Non-corrupt and not a subordinate-file reference
    pub fn is_ordinary(&self) -> bool {
        self.as_normal().map(|d| d.field_type.is_ordinary()).unwrap_or(false)
    }

    pub fn is_deprecated(&self) -> bool {
        self.as_normal().map(|d| d.deprecated).unwrap_or(false)
    }
}

/// Entry count of a file, as reported by the source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum EntryCount {
    /// Absent, empty or zero
    Unpopulated,

    /// Verbatim count text (not guaranteed numeric)
    Reported(String),
}

impl EntryCount {
    /// Normalize a raw count
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Unpopulated,
            Some(text) if text.chars().all(|c| c == '0') => Self::Unpopulated,
            Some(text) => Self::Reported(text.to_string()),
        }
    }

    /// Count as a positive number, when it parses as one
    pub fn populated(&self) -> Option<u64> {
        match self {
            Self::Unpopulated => None,
            Self::Reported(text) => text.parse::<u64>().ok().filter(|n| *n > 0),
        }
    }
}

impl std::fmt::Display for EntryCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unpopulated => write!(f, "-"),
            Self::Reported(text) => write!(f, "{}", text),
        }
    }
}

/// A well-formed file (record type) with resolved ancestry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDef {
    pub id: DottedId,

    pub name: String,

    /// Storage descriptor; None for sub-records
    pub location: Option<String>,

    /// Immediate parent for sub-records
    pub parent_id: Option<DottedId>,

    /// Ancestor chain, root first, immediate parent last
    pub parents: Vec<DottedId>,

    pub count: EntryCount,

    /// File or its topmost ancestor is locally assigned
    pub class3: bool,

    /// Station/owner of the topmost ancestor when class 3
    pub local_owner: Option<LocalOwner>,

    /// Package label of the topmost ancestor
    pub package: Option<String>,

    pub description: Option<String>,

    /// Fields in source order
    pub fields: Vec<FieldSchema>,
}

impl FileDef {
    /// Create a top-level file with no fields
    pub fn new(id: impl Into<DottedId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: None,
            parent_id: None,
            parents: Vec::new(),
            count: EntryCount::Unpopulated,
            class3: false,
            local_owner: None,
            package: None,
            description: None,
            fields: Vec::new(),
        }
    }

    /// Topmost ancestor, or the file itself when top-level
    pub fn top_id(&self) -> &DottedId {
        self.parents.first().unwrap_or(&self.id)
    }

    pub fn is_top(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Find a field by number
    pub fn field(&self, number: &DottedId) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.number() == number)
    }

    /// Information content: the name plus each non-corrupt field's attributes
    pub fn datapoints(&self) -> usize {
        1 + self
            .fields
            .iter()
            .filter_map(FieldSchema::as_normal)
            .map(FieldDef::datapoints)
            .sum::<usize>()
    }
}

/// A file that could not be classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptFile {
    pub id: DottedId,

    /// Name, when the record got far enough to report one
    pub name: Option<String>,

    pub reason: String,
}

/// A file entry: either well-formed or corrupt
///
/// A corrupt file carries no fields, parents, class or package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FileSchema {
    Normal(FileDef),
    Corrupt(CorruptFile),
}

impl FileSchema {
    pub fn id(&self) -> &DottedId {
        match self {
            Self::Normal(def) => &def.id,
            Self::Corrupt(c) => &c.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Normal(def) => Some(&def.name),
            Self::Corrupt(c) => c.name.as_deref(),
        }
    }

    pub fn as_normal(&self) -> Option<&FileDef> {
        match self {
            Self::Normal(def) => Some(def),
            Self::Corrupt(_) => None,
        }
    }

    pub fn corruption(&self) -> Option<&str> {
        match self {
            Self::Normal(_) => None,
            Self::Corrupt(c) => Some(&c.reason),
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt(_))
    }

    pub fn datapoints(&self) -> usize {
        match self {
            Self::Normal(def) => def.datapoints(),
            Self::Corrupt(_) => 1,
        }
    }
}

/// Normalize a label for comparison: upper-cased, letters and digits only
///
/// "Patient Name", "PATIENT_NAME" and "patient-name" all normalize to "PATIENTNAME".
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}
