//! SchemaAudit Report
//!
//! Renders a comparison report tree as HTML, CSV, plain text or JSON.

pub mod sink;
pub mod html;
pub mod delimited;
pub mod text;
pub mod writer;

pub use sink::{walk, Renderer, ReportSink};
pub use html::HtmlRenderer;
pub use delimited::CsvRenderer;
pub use text::TextRenderer;
pub use writer::{report_file_name, ReportWriter};

use schemaaudit_core::{ComparisonReport, ReportFormat};
use std::path::PathBuf;

/// Report layer error types
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Cannot set up report location {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown report format '{0}' (expected html, csv, text or json)")]
    InvalidFormat(String),

    #[error("Failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a user-supplied format name
pub fn parse_format(name: &str) -> Result<ReportFormat, ReportError> {
    name.parse::<ReportFormat>()
        .map_err(|_| ReportError::InvalidFormat(name.to_string()))
}

/// Render a report in the given format
pub fn render(report: &ComparisonReport, format: ReportFormat) -> Result<String, ReportError> {
    match format {
        ReportFormat::Html => run(report, HtmlRenderer::new()),
        ReportFormat::Csv => run(report, CsvRenderer::new()),
        ReportFormat::Text => run(report, TextRenderer::new()),
        ReportFormat::Json => Ok(report.to_json()?),
    }
}

fn run<R: Renderer>(report: &ComparisonReport, mut renderer: R) -> Result<String, ReportError> {
    walk(report, &mut renderer);
    renderer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names() {
        assert_eq!(parse_format("HTML").unwrap(), ReportFormat::Html);
        assert_eq!(parse_format("txt").unwrap(), ReportFormat::Text);
        assert!(matches!(
            parse_format("pdf"),
            Err(ReportError::InvalidFormat(name)) if name == "pdf"
        ));
    }
}
