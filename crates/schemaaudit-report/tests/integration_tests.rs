//! Integration tests: render the fixture comparison in every format

use pretty_assertions::assert_eq;
use schemaaudit_core::{ClassificationConfig, ComparisonReport, ReferenceConfig, ReportFormat};
use schemaaudit_engine::SchemaComparer;
use schemaaudit_index::{CacheProvider, SchemaIndex, SchemaProvider};
use schemaaudit_reference::ReferenceTables;
use schemaaudit_report::{render, ReportWriter};
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../schemaaudit-index/tests/fixtures")
}

fn reference_fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../schemaaudit-reference/tests/fixtures")
}

fn fixture_report() -> ComparisonReport {
    let root = fixtures_dir();
    let config = ReferenceConfig {
        namespaces: Some(PathBuf::from("namespaces.csv")),
        packages: Some(PathBuf::from("packages.csv")),
    };
    let tables = ReferenceTables::from_config(&config, |p| reference_fixtures_dir().join(p)).unwrap();
    let rules = ClassificationConfig::default();

    let load = |label: &str, path: &str| {
        let provider = CacheProvider::new(label, root.join(path));
        SchemaIndex::build(label, provider.describe_types().unwrap(), &tables, &rules)
    };

    let gold = load("GOLD", "gold.jsonl");
    let other = load("OTHER", "other");
    SchemaComparer::default().compare(&gold, &other)
}

#[test]
fn html_lists_notable_files_only() {
    let html = render(&fixture_report(), ReportFormat::Html).unwrap();

    assert!(html.contains("<tr id='2'>"));
    assert!(html.contains("<tr id='63'>"));
    assert!(!html.contains("<tr id='8'>"));
    assert!(html.contains(".03: sex (base) -- gender (other)"));
    assert!(html.contains("460001 [<strong>WILMINGTON</strong>]"));
    assert!(html.contains("IGNORING - volatile file family"));
    assert!(html.find("id='counts'").unwrap() < html.find("id='both'").unwrap());
}

#[test]
fn json_round_trips() {
    let report = fixture_report();
    let json = render(&report, ReportFormat::Json).unwrap();
    let parsed: ComparisonReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, report);
}

#[test]
fn csv_has_one_header() {
    let csv = render(&fixture_report(), ReportFormat::Csv).unwrap();
    let headers = csv.lines().filter(|l| l.starts_with("section,")).count();
    assert_eq!(headers, 1);
    assert!(csv.contains("corruption,other,,58,,,,,,CORRUPT_FILE,bad data dictionary"));
}

#[test]
fn writes_named_report_files() {
    let report = fixture_report();
    let temp = tempfile::tempdir().unwrap();

    for (format, name) in [
        (ReportFormat::Html, "schemaGOLD_vs_OTHER.html"),
        (ReportFormat::Csv, "schemaGOLD_vs_OTHER.csv"),
        (ReportFormat::Text, "schemaGOLD_vs_OTHER.txt"),
        (ReportFormat::Json, "schemaGOLD_vs_OTHER.json"),
    ] {
        let writer = ReportWriter::create(temp.path().join("Reports"), format).unwrap();
        let path = writer.write(&report).unwrap();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(name));
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
