//! Schema providers: where raw describe results come from
//!
//! The remote transport is out of scope; `CacheProvider` reads describe
//! results that were already fetched to disk.

use crate::raw::RawRecord;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Source of raw record descriptions for one instance
pub trait SchemaProvider {
    /// Instance label ("GOLD", "OTHER", ...)
    fn label(&self) -> &str;

    /// Every raw record of the instance, in source order
    fn describe_types(&self) -> Result<Vec<RawRecord>, ProviderError>;
}

/// Errors that can occur when reading a provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Cache not found: {0}")]
    NotFound(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk cache directory {path}: {message}")]
    Walk { path: String, message: String },

    #[error("Malformed cache {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Unsupported cache path {0} (expected a directory, .json or .jsonl)")]
    Unsupported(String),
}

/// Reads describe results cached on disk
///
/// The path is one of:
/// - a directory of `*.json` documents, one record each, read in path order
/// - a `.jsonl` file, one record per line
/// - a `.json` file holding an array of records
///
/// A document that does not parse becomes an error marker so the record
/// still shows up as corrupt in reports.
#[derive(Debug, Clone)]
pub struct CacheProvider {
    label: String,
    path: PathBuf,
}

impl CacheProvider {
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_directory(&self) -> Result<Vec<RawRecord>, ProviderError> {
        let mut records = Vec::new();

        let walker = WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| ProviderError::Walk {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;

            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let contents = read(path)?;
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();

            records.push(parse_or_mark(&contents, &stem, path));
        }

        Ok(records)
    }

    fn read_lines(&self) -> Result<Vec<RawRecord>, ProviderError> {
        let contents = read(&self.path)?;

        Ok(contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| parse_or_mark(line, &format!("line:{}", i + 1), &self.path))
            .collect())
    }

    fn read_array(&self) -> Result<Vec<RawRecord>, ProviderError> {
        let contents = read(&self.path)?;

        let documents: Vec<serde_json::Value> =
            serde_json::from_str(&contents).map_err(|e| ProviderError::Parse {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(documents
            .into_iter()
            .enumerate()
            .map(|(i, document)| {
                serde_json::from_value(document).unwrap_or_else(|e| {
                    let id = format!("item:{}", i + 1);
                    tracing::warn!(path = %self.path.display(), id = %id, "unparsable cache document: {}", e);
                    RawRecord::error(id, format!("unparsable describe result: {}", e))
                })
            })
            .collect())
    }
}

impl SchemaProvider for CacheProvider {
    fn label(&self) -> &str {
        &self.label
    }

    fn describe_types(&self) -> Result<Vec<RawRecord>, ProviderError> {
        if !self.path.exists() {
            return Err(ProviderError::NotFound(self.path.display().to_string()));
        }

        let records = if self.path.is_dir() {
            self.read_directory()?
        } else {
            match self.path.extension().and_then(|e| e.to_str()) {
                Some("jsonl") => self.read_lines()?,
                Some("json") => self.read_array()?,
                _ => return Err(ProviderError::Unsupported(self.path.display().to_string())),
            }
        };

        tracing::debug!(label = %self.label, records = records.len(), "read describe cache");
        Ok(records)
    }
}

fn read(path: &Path) -> Result<String, ProviderError> {
    std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_or_mark(document: &str, fallback_id: &str, origin: &Path) -> RawRecord {
    RawRecord::from_json(document).unwrap_or_else(|e| {
        tracing::warn!(path = %origin.display(), id = %fallback_id, "unparsable cache document: {}", e);
        RawRecord::error(fallback_id, format!("unparsable describe result: {}", e))
    })
}

/// Records held in memory
///
/// Useful for tests and for callers that fetched descriptions themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    label: String,
    records: Vec<RawRecord>,
}

impl MemoryProvider {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            records: Vec::new(),
        }
    }

    pub fn with_record(mut self, record: impl Into<RawRecord>) -> Self {
        self.records.push(record.into());
        self
    }
}

impl SchemaProvider for MemoryProvider {
    fn label(&self) -> &str {
        &self.label
    }

    fn describe_types(&self) -> Result<Vec<RawRecord>, ProviderError> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawDescription;
    use std::io::Write;

    #[test]
    fn directory_cache_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("8.json"), r#"{"number": "8", "name": "MAS"}"#).unwrap();
        std::fs::write(dir.path().join("2.json"), r#"{"number": "2", "name": "PATIENT"}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let provider = CacheProvider::new("GOLD", dir.path());
        let records = provider.describe_types().unwrap();

        let ids: Vec<&str> = records.iter().map(RawRecord::id).collect();
        assert_eq!(ids, vec!["2", "8"]);
        assert_eq!(provider.label(), "GOLD");
    }

    #[test]
    fn unparsable_document_becomes_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("63_04.json"), "{not json").unwrap();

        let records = CacheProvider::new("GOLD", dir.path()).describe_types().unwrap();
        assert_eq!(records.len(), 1);
        let RawRecord::Error(marker) = &records[0] else {
            panic!("expected an error marker");
        };
        assert_eq!(marker.id(), "63_04");
        assert!(marker.error.starts_with("unparsable describe result"));
    }

    #[test]
    fn jsonl_cache() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, r#"{{"number": "2", "name": "PATIENT"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "garbage").unwrap();

        let records = CacheProvider::new("X", file.path()).describe_types().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id(), "line:3");
    }

    #[test]
    fn missing_cache() {
        let err = CacheProvider::new("X", "/nonexistent/cache").describe_types().unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[test]
    fn memory_provider() {
        let provider = MemoryProvider::new("MEM")
            .with_record(RawDescription::new("2", "PATIENT"))
            .with_record(RawRecord::error("3", "bad"));
        assert_eq!(provider.describe_types().unwrap().len(), 2);
    }
}
