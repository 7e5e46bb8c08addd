//! Lookup contract for reference tables

use crate::namespace::NamespaceTable;
use crate::package::PackageTable;
use schemaaudit_core::{DottedId, ReferenceConfig};
use std::path::{Path, PathBuf};

/// Static lookups the index attaches labels from
///
/// Implementations are read-only once built. Tests substitute their own.
pub trait ReferenceLookup {
    /// Owning organization of a 3-digit station prefix
    fn namespace(&self, station: &str) -> Option<&str>;

    /// Package owning a (top-level) file id
    fn package(&self, file_id: &DottedId) -> Option<&str>;
}

/// Both reference tables, loaded once
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub namespaces: NamespaceTable,
    pub packages: PackageTable,
}

impl ReferenceTables {
    /// Tables with no entries; every lookup misses
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(namespaces: NamespaceTable, packages: PackageTable) -> Self {
        Self { namespaces, packages }
    }

    /// Load whichever tables the configuration names
    ///
    /// `resolve` maps configured (possibly relative) paths to real ones.
    pub fn from_config(
        config: &ReferenceConfig,
        resolve: impl Fn(&Path) -> PathBuf,
    ) -> Result<Self, ReferenceError> {
        let namespaces = match &config.namespaces {
            Some(path) => NamespaceTable::from_path(&resolve(path))?,
            None => NamespaceTable::default(),
        };

        let packages = match &config.packages {
            Some(path) => PackageTable::from_path(&resolve(path))?,
            None => PackageTable::default(),
        };

        tracing::debug!(
            namespaces = namespaces.len(),
            packages = packages.len(),
            "reference tables loaded"
        );

        Ok(Self { namespaces, packages })
    }
}

impl ReferenceLookup for ReferenceTables {
    fn namespace(&self, station: &str) -> Option<&str> {
        self.namespaces.owner(station)
    }

    fn package(&self, file_id: &DottedId) -> Option<&str> {
        self.packages.package(file_id)
    }
}

/// Errors that can occur when loading reference tables
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("Failed to read reference table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed reference table {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid row {line} in {path}: {message}")]
    InvalidRow {
        path: String,
        line: u64,
        message: String,
    },
}
