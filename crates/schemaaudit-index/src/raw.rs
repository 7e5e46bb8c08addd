//! Raw describe results, as a schema provider emits them
//!
//! One JSON document per record type:
//!
//! ```json
//! {"number": "2", "name": "PATIENT", "location": "^DPT(", "count": "1204",
//!  "description": {"value": "..."},
//!  "fields": [{"number": ".01", "name": "NAME", "type": "4", "title": "..."}]}
//! ```
//!
//! A record the source could not describe is an error marker:
//! `{"error": "...", "fmql": {"TYPE": "63_04"}}` (or `"id"` in place of `fmql`).

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One raw record: a description or an error marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRecord {
    Error(RawError),
    Described(RawDescription),
}

impl RawRecord {
    /// Error marker for a record that could not be read at all
    pub fn error(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Error(RawError {
            error: reason.into(),
            fmql: None,
            id: Some(id.into()),
        })
    }

    /// Identifier text as the source reported it
    pub fn id(&self) -> &str {
        match self {
            Self::Error(e) => e.id(),
            Self::Described(d) => &d.number,
        }
    }

    /// Parse one JSON document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<RawDescription> for RawRecord {
    fn from(description: RawDescription) -> Self {
        Self::Described(description)
    }
}

/// Error marker: the source knows the record exists but not its shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawError {
    /// Opaque reason text
    pub error: String,

    /// Query echo carrying the type id under `TYPE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fmql: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RawError {
    pub fn id(&self) -> &str {
        self.fmql
            .as_ref()
            .and_then(|q| q.get("TYPE"))
            .or(self.id.as_ref())
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Free text wrapped the way describe results carry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawText {
    pub value: String,
}

/// A described record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDescription {
    #[serde(deserialize_with = "id_text")]
    pub number: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default, deserialize_with = "opt_id_text")]
    pub parent: Option<String>,

    /// Entry count; text or number
    #[serde(default)]
    pub count: Option<Value>,

    #[serde(default)]
    pub description: Option<RawText>,

    #[serde(default)]
    pub fields: Vec<RawField>,
}

impl RawDescription {
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            name: Some(name.into()),
            location: None,
            parent: None,
            count: None,
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_count(mut self, count: impl Into<String>) -> Self {
        self.count = Some(Value::String(count.into()));
        self
    }

    pub fn with_description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(RawText { value: value.into() });
        self
    }

    pub fn with_field(mut self, field: RawField) -> Self {
        self.fields.push(field);
        self
    }

    /// Count as text, whatever JSON type carried it
    pub fn count_text(&self) -> Option<String> {
        match self.count.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// A described field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawField {
    #[serde(deserialize_with = "id_text")]
    pub number: String,

    /// Absent when the source could not read the field
    #[serde(default)]
    pub name: Option<String>,

    /// Type code
    #[serde(rename = "type", default, deserialize_with = "opt_id_text")]
    pub field_type: Option<String>,

    /// Reason the source gave for an unreadable field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corruption: Option<String>,

    /// Every other attribute (input transform, title, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawField {
    pub fn new(number: impl Into<String>, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            name: Some(name.into()),
            field_type: Some(field_type.into()),
            corruption: None,
            extra: BTreeMap::new(),
        }
    }

    /// A field the source reported as unreadable
    pub fn corrupt(number: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            name: None,
            field_type: None,
            corruption: Some(reason.into()),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Extra attributes as text; nulls dropped
    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.extra
            .iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key.clone(), s.clone())),
                other => Some((key.clone(), other.to_string())),
            })
            .collect()
    }
}

fn id_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected an identifier, found {}", other))),
    }
}

fn opt_id_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(D::Error::custom(format!("expected an identifier, found {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_description() {
        let json = r#"{
            "number": "2",
            "name": "PATIENT",
            "location": "^DPT(",
            "count": 12,
            "description": {"value": "Patient demographics"},
            "fields": [
                {"number": ".01", "name": "NAME", "type": "4", "title": "Full name"},
                {"number": ".02", "corruption": "no type node"}
            ]
        }"#;

        let RawRecord::Described(record) = RawRecord::from_json(json).unwrap() else {
            panic!("expected a description");
        };

        assert_eq!(record.number, "2");
        assert_eq!(record.count_text().as_deref(), Some("12"));
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[0].field_type.as_deref(), Some("4"));
        assert_eq!(record.fields[0].attributes().get("title").map(String::as_str), Some("Full name"));
        assert_eq!(record.fields[1].name, None);
        assert_eq!(record.fields[1].corruption.as_deref(), Some("no type node"));
    }

    #[test]
    fn parse_error_marker() {
        let record = RawRecord::from_json(r#"{"error": "bad DD", "fmql": {"TYPE": "63_04"}}"#).unwrap();
        assert!(matches!(record, RawRecord::Error(_)));
        assert_eq!(record.id(), "63_04");

        let record = RawRecord::from_json(r#"{"error": "bad DD", "id": "44"}"#).unwrap();
        assert_eq!(record.id(), "44");
    }

    #[test]
    fn numeric_ids_accepted() {
        let record = RawRecord::from_json(r#"{"number": 200, "name": "NEW PERSON", "parent": 2}"#).unwrap();
        let RawRecord::Described(record) = record else {
            panic!("expected a description");
        };
        assert_eq!(record.number, "200");
        assert_eq!(record.parent.as_deref(), Some("2"));
    }

    #[test]
    fn builder_shape() {
        let record = RawDescription::new("2", "PATIENT")
            .with_count("0")
            .with_field(RawField::new(".01", "NAME", "4").with_attribute("title", "Name"));
        assert_eq!(record.count_text().as_deref(), Some("0"));
        assert_eq!(record.fields[0].attributes().len(), 1);
    }
}
