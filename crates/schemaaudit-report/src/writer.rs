//! Writing rendered reports to the output directory

use crate::{render, ReportError};
use schemaaudit_core::{ComparisonReport, ReportFormat};
use std::path::{Path, PathBuf};

/// `schema<baseline>_vs_<other>.<ext>`, spaces in labels replaced by `_`
pub fn report_file_name(baseline_label: &str, other_label: &str, format: ReportFormat) -> String {
    format!(
        "schema{}_vs_{}.{}",
        baseline_label.replace(' ', "_"),
        other_label.replace(' ', "_"),
        format.extension()
    )
}

/// Renders reports into one directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
    format: ReportFormat,
}

impl ReportWriter {
    /// Prepare the output directory, creating it if needed
    ///
    /// Fails with [`ReportError::Setup`] when the location cannot hold
    /// reports, before any comparison work is spent.
    pub fn create(output_dir: impl Into<PathBuf>, format: ReportFormat) -> Result<Self, ReportError> {
        let output_dir = output_dir.into();

        std::fs::create_dir_all(&output_dir).map_err(|source| ReportError::Setup {
            path: output_dir.clone(),
            source,
        })?;

        Ok(Self { output_dir, format })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Render and write, returning the report path
    pub fn write(&self, report: &ComparisonReport) -> Result<PathBuf, ReportError> {
        let contents = render(report, self.format)?;
        let path = self.output_dir.join(report_file_name(
            &report.baseline_label,
            &report.other_label,
            self.format,
        ));

        std::fs::write(&path, contents).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(path = %path.display(), format = %self.format, "report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(
            report_file_name("GOLD", "CG VISTA", ReportFormat::Html),
            "schemaGOLD_vs_CG_VISTA.html"
        );
        assert_eq!(
            report_file_name("A B", "C", ReportFormat::Text),
            "schemaA_B_vs_C.txt"
        );
    }

    #[test]
    fn creates_missing_directory() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("Reports").join("nested");

        let writer = ReportWriter::create(&dir, ReportFormat::Json).unwrap();
        assert!(dir.is_dir());
        assert_eq!(writer.output_dir(), dir.as_path());
    }

    #[test]
    fn file_in_the_way_is_setup_error() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("Reports");
        std::fs::write(&blocker, "not a directory").unwrap();

        let result = ReportWriter::create(&blocker, ReportFormat::Html);
        assert!(matches!(result, Err(ReportError::Setup { .. })));
    }
}
