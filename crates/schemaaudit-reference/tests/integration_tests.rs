//! Integration tests for loading reference tables from disk

use schemaaudit_core::{DottedId, ReferenceConfig};
use schemaaudit_reference::{ReferenceError, ReferenceLookup, ReferenceTables};
use std::io::Write;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[test]
fn load_fixture_tables() {
    let config = ReferenceConfig {
        namespaces: Some(PathBuf::from("namespaces.csv")),
        packages: Some(PathBuf::from("packages.csv")),
    };

    let root = fixtures_dir();
    let tables = ReferenceTables::from_config(&config, |p| root.join(p)).unwrap();

    assert_eq!(tables.namespace("460"), Some("WILMINGTON"));
    assert_eq!(tables.package(&DottedId::new("2")), Some("REGISTRATION"));
    assert_eq!(tables.package(&DottedId::new("200")), Some("KERNEL"));
    assert_eq!(tables.package(&DottedId::new("63")), Some("LAB SERVICE"));
}

#[test]
fn load_from_tempfile() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "station,owner").unwrap();
    writeln!(file, "580,HOUSTON").unwrap();

    let config = ReferenceConfig {
        namespaces: Some(file.path().to_path_buf()),
        packages: None,
    };
    let tables = ReferenceTables::from_config(&config, |p| p.to_path_buf()).unwrap();
    assert_eq!(tables.namespace("580"), Some("HOUSTON"));
}

#[test]
fn missing_file_is_io_error() {
    let config = ReferenceConfig {
        namespaces: Some(PathBuf::from("/nonexistent/namespaces.csv")),
        packages: None,
    };
    let err = ReferenceTables::from_config(&config, |p| p.to_path_buf()).unwrap_err();
    assert!(matches!(err, ReferenceError::Io { .. }));
}
