//! Package table: file id (or id range) to package label

use crate::lookup::ReferenceError;
use schemaaudit_core::DottedId;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PackageRow {
    low: String,
    #[serde(default)]
    high: Option<String>,
    #[serde(default)]
    package: Option<String>,
}

/// An inclusive id range owned by one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRange {
    pub low: DottedId,
    pub high: DottedId,
    pub package: String,
}

impl PackageRange {
    pub fn contains(&self, id: &DottedId) -> bool {
        &self.low <= id && id <= &self.high
    }
}

/// File id to package mapping
///
/// Exact ids win over ranges; among ranges containing an id the narrowest
/// (highest low bound, then lowest high bound) wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageTable {
    exact: HashMap<DottedId, String>,
    ranges: Vec<PackageRange>,
}

impl PackageTable {
    /// Add an exact file id
    pub fn with_file(mut self, id: impl Into<DottedId>, package: impl Into<String>) -> Self {
        self.exact.insert(id.into(), package.into());
        self
    }

    /// Add an inclusive range
    pub fn with_range(
        mut self,
        low: impl Into<DottedId>,
        high: impl Into<DottedId>,
        package: impl Into<String>,
    ) -> Self {
        self.ranges.push(PackageRange {
            low: low.into(),
            high: high.into(),
            package: package.into(),
        });
        self
    }

    /// Load a `low,high,package` CSV file
    pub fn from_path(path: &Path) -> Result<Self, ReferenceError> {
        let file = std::fs::File::open(path).map_err(|source| ReferenceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file, &path.display().to_string())
    }

    /// Load `low,high,package` CSV from any reader
    ///
    /// An empty `high` makes the row an exact id. An empty `package` carries
    /// the most recent non-empty label forward.
    pub fn from_reader(reader: impl Read, origin: &str) -> Result<Self, ReferenceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut table = Self::default();
        let mut current: Option<String> = None;

        let csv_error = |source: csv::Error| ReferenceError::Csv {
            path: origin.to_string(),
            source,
        };
        let headers = csv_reader.headers().map_err(csv_error)?.clone();

        for record in csv_reader.records() {
            let record = record.map_err(csv_error)?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let row: PackageRow = record.deserialize(Some(&headers)).map_err(csv_error)?;

            if let Some(label) = row.package.filter(|p| !p.is_empty()) {
                current = Some(label);
            }
            let Some(package) = current.clone() else {
                return Err(ReferenceError::InvalidRow {
                    path: origin.to_string(),
                    line,
                    message: "no package label to carry forward".to_string(),
                });
            };

            let low = DottedId::new(&row.low);
            if !low.is_numeric() {
                return Err(ReferenceError::InvalidRow {
                    path: origin.to_string(),
                    line,
                    message: format!("'{}' is not a file number", row.low),
                });
            }

            match row.high.filter(|h| !h.is_empty()) {
                None => {
                    table.exact.insert(low, package);
                }
                Some(high) => {
                    let high = DottedId::new(&high);
                    if !high.is_numeric() || high < low {
                        return Err(ReferenceError::InvalidRow {
                            path: origin.to_string(),
                            line,
                            message: format!("bad range {}-{}", low, high),
                        });
                    }
                    table.ranges.push(PackageRange { low, high, package });
                }
            }
        }

        Ok(table)
    }

    /// Package of a file id
    pub fn package(&self, id: &DottedId) -> Option<&str> {
        if let Some(package) = self.exact.get(id) {
            return Some(package);
        }

        self.ranges
            .iter()
            .filter(|r| r.contains(id))
            .max_by(|a, b| a.low.cmp(&b.low).then_with(|| b.high.cmp(&a.high)))
            .map(|r| r.package.as_str())
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carry_forward_labels() {
        let csv = "low,high,package\n2,,REGISTRATION\n2.01,,\n50,59.999,PHARMACY\n52,,\n";
        let table = PackageTable::from_reader(csv.as_bytes(), "inline").unwrap();

        assert_eq!(table.package(&DottedId::new("2")), Some("REGISTRATION"));
        assert_eq!(table.package(&DottedId::new("2.01")), Some("REGISTRATION"));
        assert_eq!(table.package(&DottedId::new("55")), Some("PHARMACY"));
        assert_eq!(table.package(&DottedId::new("52")), Some("PHARMACY"));
        assert_eq!(table.package(&DottedId::new("60")), None);
    }

    #[test]
    fn leading_row_without_label_rejected() {
        let csv = "low,high,package\n2,,\n";
        let err = PackageTable::from_reader(csv.as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, ReferenceError::InvalidRow { line: 2, .. }));
    }

    #[test]
    fn invalid_row_reports_its_line() {
        let csv = "low,high,package\n2,,REGISTRATION\n50,59.999,PHARMACY\nabc,,\n";
        let err = PackageTable::from_reader(csv.as_bytes(), "packages.csv").unwrap_err();
        match err {
            ReferenceError::InvalidRow { path, line, message } => {
                assert_eq!(path, "packages.csv");
                assert_eq!(line, 4);
                assert!(message.contains("abc"));
            }
            other => panic!("expected InvalidRow, got {:?}", other),
        }
    }

    #[test]
    fn reversed_range_rejected() {
        let csv = "low,high,package\n60,50,BACKWARDS\n";
        let err = PackageTable::from_reader(csv.as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, ReferenceError::InvalidRow { line: 2, .. }));
    }

    #[test]
    fn narrowest_range_wins() {
        let table = PackageTable::default()
            .with_range("50", "59.999", "PHARMACY")
            .with_range("52", "52.999", "OUTPATIENT PHARMACY")
            .with_file("55", "INPATIENT");

        assert_eq!(table.package(&DottedId::new("52.1")), Some("OUTPATIENT PHARMACY"));
        assert_eq!(table.package(&DottedId::new("51")), Some("PHARMACY"));
        assert_eq!(table.package(&DottedId::new("55")), Some("INPATIENT"));
    }

    #[test]
    fn inclusive_bounds() {
        let table = PackageTable::default().with_range("100", "200", "ORDERS");
        assert_eq!(table.package(&DottedId::new("100")), Some("ORDERS"));
        assert_eq!(table.package(&DottedId::new("200")), Some("ORDERS"));
        assert_eq!(table.package(&DottedId::new("200.1")), None);
    }
}
