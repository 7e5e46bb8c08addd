//! Configuration schema (schemaaudit.toml)

use crate::ids::DottedId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output format of a comparison report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Single HTML page
    Html,

    /// Flat rows for spreadsheets
    Csv,

    /// Plain formatted text
    Text,

    /// The report tree as JSON
    Json,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self::Html
    }
}

impl ReportFormat {
    /// File extension for reports in this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Csv => "csv",
            Self::Text => "txt",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "csv" => Ok(Self::Csv),
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Html => write!(f, "html"),
            Self::Csv => write!(f, "csv"),
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Rules that classify identifiers and names while indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// Digit count of a locally-assigned integer part (NNNXXX)
    #[serde(default = "default_prefix_digits")]
    pub local_prefix_digits: usize,

    /// Locally-assigned integer parts are strictly above this value
    #[serde(default = "default_threshold")]
    pub local_threshold: u64,

    /// Names starting with this marker are pending deletion
    #[serde(default = "default_marker")]
    pub deprecation_marker: String,
}

fn default_prefix_digits() -> usize {
    6
}

fn default_threshold() -> u64 {
    101000
}

fn default_marker() -> String {
    "*".to_string()
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            local_prefix_digits: default_prefix_digits(),
            local_threshold: default_threshold(),
            deprecation_marker: default_marker(),
        }
    }
}

impl ClassificationConfig {
    /// Whether an identifier falls in the locally-assigned (class 3) range
    ///
    /// Only the integer part counts: `500003.1` is judged as `500003`.
    pub fn is_local(&self, id: &DottedId) -> bool {
        let prefix = id.integer_part();
        prefix.len() == self.local_prefix_digits
            && id.integer_value().is_some_and(|value| value > self.local_threshold)
    }

    /// 3-digit station prefix of a locally-assigned identifier
    pub fn station<'a>(&self, id: &'a DottedId) -> Option<&'a str> {
        if self.is_local(id) {
            id.integer_part().get(..3)
        } else {
            None
        }
    }

    /// Whether a name carries the deprecation marker
    pub fn is_deprecated(&self, name: &str) -> bool {
        !self.deprecation_marker.is_empty() && name.starts_with(&self.deprecation_marker)
    }
}

/// Comparison policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Id prefixes of file families listed but never field-diffed
    #[serde(default = "default_volatile")]
    pub volatile_prefixes: Vec<String>,
}

fn default_volatile() -> Vec<String> {
    vec!["63".to_string()]
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            volatile_prefixes: default_volatile(),
        }
    }
}

impl ComparisonConfig {
    /// Check if a file belongs to a volatile family (its id starts with a listed prefix)
    pub fn is_volatile(&self, id: &DottedId) -> bool {
        self.volatile_prefixes
            .iter()
            .any(|p| !p.is_empty() && id.as_str().starts_with(p.as_str()))
    }
}

/// Report output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,

    /// Directory reports are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Characters of a file description shown before truncation
    #[serde(default = "default_description_limit")]
    pub description_limit: usize,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("Reports")
}

fn default_description_limit() -> usize {
    300
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            output_dir: default_output_dir(),
            description_limit: default_description_limit(),
        }
    }
}

/// Locations of the reference table resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Namespace CSV (station,owner)
    #[serde(default)]
    pub namespaces: Option<PathBuf>,

    /// Package CSV (low,high,package)
    #[serde(default)]
    pub packages: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub classification: ClassificationConfig,

    #[serde(default)]
    pub comparison: ComparisonConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classification: ClassificationConfig::default(),
            comparison: ComparisonConfig::default(),
            report: ReportConfig::default(),
            reference: ReferenceConfig::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Reject settings no comparison could run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classification.local_prefix_digits < 3 {
            return Err(ConfigError::Invalid(format!(
                "local_prefix_digits must be at least 3 (station prefix), got {}",
                self.classification.local_prefix_digits
            )));
        }
        if self.comparison.volatile_prefixes.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::Invalid(
                "volatile_prefixes must not contain empty entries".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Unknown report format '{0}' (expected html, csv, text or json)")]
    UnknownFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.report.format, ReportFormat::Html);
        assert_eq!(config.classification.local_threshold, 101000);
        assert_eq!(config.comparison.volatile_prefixes, vec!["63".to_string()]);
    }

    #[test]
    fn local_range_rule() {
        let rules = ClassificationConfig::default();
        assert!(!rules.is_local(&DottedId::new("101000")));
        assert!(rules.is_local(&DottedId::new("101001")));
        assert!(rules.is_local(&DottedId::new("460001")));
        assert!(rules.is_local(&DottedId::new("580950.1")));
        assert!(!rules.is_local(&DottedId::new("1010010")));
        assert!(!rules.is_local(&DottedId::new("99999")));
        assert_eq!(rules.station(&DottedId::new("460001")), Some("460"));
        assert_eq!(rules.station(&DottedId::new("2")), None);
    }

    #[test]
    fn configurable_threshold() {
        let rules = ClassificationConfig {
            local_threshold: 500000,
            ..ClassificationConfig::default()
        };
        assert!(!rules.is_local(&DottedId::new("460001")));
        assert!(rules.is_local(&DottedId::new("500003")));
    }

    #[test]
    fn deprecation_marker() {
        let rules = ClassificationConfig::default();
        assert!(rules.is_deprecated("*OLD FIELD"));
        assert!(!rules.is_deprecated("NAME"));
    }

    #[test]
    fn volatile_matches_id_prefix() {
        let comparison = ComparisonConfig::default();
        assert!(comparison.is_volatile(&DottedId::new("63")));
        assert!(comparison.is_volatile(&DottedId::new("63.04")));
        assert!(comparison.is_volatile(&DottedId::new("631")));
        assert!(comparison.is_volatile(&DottedId::new("6300")));
        assert!(!comparison.is_volatile(&DottedId::new("2")));
        assert!(!comparison.is_volatile(&DottedId::new("6.3")));
        assert!(!comparison.is_volatile(&DottedId::new("163")));
    }

    #[test]
    fn report_format_parsing() {
        assert_eq!("HTML".parse::<ReportFormat>().unwrap(), ReportFormat::Html);
        assert_eq!("txt".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert!(matches!(
            "pdf".parse::<ReportFormat>(),
            Err(ConfigError::UnknownFormat(_))
        ));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [comparison]
            volatile_prefixes = ["63", "69"]

            [report]
            format = "csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.report.format, ReportFormat::Csv);
        assert_eq!(config.report.description_limit, 300);
        assert_eq!(config.classification.deprecation_marker, "*");
        assert!(config.comparison.is_volatile(&DottedId::new("69.1")));
    }

    #[test]
    fn unknown_format_rejected() {
        let result = Config::from_toml("[report]\nformat = \"pdf\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn invalid_digits_rejected() {
        let result = Config::from_toml("[classification]\nlocal_prefix_digits = 2\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.report, parsed.report);
        assert_eq!(config.classification, parsed.classification);
    }
}
