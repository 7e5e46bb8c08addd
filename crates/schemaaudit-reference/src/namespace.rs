//! Namespace table: 3-digit station prefix to owning organization

use crate::lookup::ReferenceError;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct NamespaceRow {
    station: String,
    owner: String,
}

/// Station prefix to owner name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceTable {
    owners: HashMap<String, String>,
}

impl NamespaceTable {
    /// Build from (station, owner) pairs
    pub fn from_entries<I, S, O>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, O)>,
        S: Into<String>,
        O: Into<String>,
    {
        Self {
            owners: entries
                .into_iter()
                .map(|(s, o)| (s.into(), o.into()))
                .collect(),
        }
    }

    /// Load a `station,owner` CSV file
    pub fn from_path(path: &Path) -> Result<Self, ReferenceError> {
        let file = std::fs::File::open(path).map_err(|source| ReferenceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file, &path.display().to_string())
    }

    /// Load `station,owner` CSV from any reader; `origin` names it in errors
    pub fn from_reader(reader: impl Read, origin: &str) -> Result<Self, ReferenceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut owners = HashMap::new();
        let csv_error = |source: csv::Error| ReferenceError::Csv {
            path: origin.to_string(),
            source,
        };
        let headers = csv_reader.headers().map_err(csv_error)?.clone();

        for record in csv_reader.records() {
            let record = record.map_err(csv_error)?;
            let row: NamespaceRow = record.deserialize(Some(&headers)).map_err(csv_error)?;

            if row.station.len() != 3 || !row.station.chars().all(|c| c.is_ascii_digit()) {
                return Err(ReferenceError::InvalidRow {
                    path: origin.to_string(),
                    line: record.position().map(|p| p.line()).unwrap_or_default(),
                    message: format!("station '{}' is not a 3-digit prefix", row.station),
                });
            }

            owners.insert(row.station, row.owner);
        }

        Ok(Self { owners })
    }

    /// Owner of a station prefix
    pub fn owner(&self, station: &str) -> Option<&str> {
        self.owners.get(station).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
