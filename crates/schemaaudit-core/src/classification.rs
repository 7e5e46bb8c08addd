//! Field difference classifications
//!
//! IMPORTANT: classification codes are versioned and stable.
//! They appear in CSV and JSON reports; NEVER rename or remove codes.

use serde::{Deserialize, Serialize};

/// Which instance a classification or section belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Baseline,
    Other,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Baseline => write!(f, "baseline"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Field difference code registry (v1)
///
/// Ordered the way renderers list them within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffKind {
    /// Active field present only in the baseline ("missing" from other)
    BaselineUnique,

    /// Common field that only the baseline deprecates
    DeprecatedOnlyByBaseline,

    /// Deprecated field present only in the baseline
    BaselineUniqueDeprecated,

    /// Active field present only in the other instance ("custom")
    OtherUnique,

    /// Common field that only the other instance deprecates
    DeprecatedOnlyByOther,

    /// Deprecated field present only in the other instance
    OtherUniqueDeprecated,

    /// Common field whose normalized names differ
    Renamed,
}

impl DiffKind {
    /// Stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaselineUnique => "BASELINE_UNIQUE",
            Self::DeprecatedOnlyByBaseline => "DEPRECATED_ONLY_BY_BASELINE",
            Self::BaselineUniqueDeprecated => "BASELINE_UNIQUE_DEPRECATED",
            Self::OtherUnique => "OTHER_UNIQUE",
            Self::DeprecatedOnlyByOther => "DEPRECATED_ONLY_BY_OTHER",
            Self::OtherUniqueDeprecated => "OTHER_UNIQUE_DEPRECATED",
            Self::Renamed => "RENAMED",
        }
    }

    /// Instance the difference is reported against
    pub fn side(&self) -> Side {
        match self {
            Self::BaselineUnique | Self::DeprecatedOnlyByBaseline | Self::BaselineUniqueDeprecated => {
                Side::Baseline
            }
            Self::OtherUnique
            | Self::DeprecatedOnlyByOther
            | Self::OtherUniqueDeprecated
            | Self::Renamed => Side::Other,
        }
    }

    /// Short human label used in rendered reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::BaselineUnique | Self::OtherUnique => "unique fields",
            Self::DeprecatedOnlyByBaseline | Self::DeprecatedOnlyByOther => "fields only it deprecates",
            Self::BaselineUniqueDeprecated | Self::OtherUniqueDeprecated => "unique but deprecated fields",
            Self::Renamed => "field name mismatch",
        }
    }
}

impl std::fmt::Display for DiffKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_stability() {
        assert_eq!(DiffKind::Renamed.as_str(), "RENAMED");
        assert_eq!(DiffKind::DeprecatedOnlyByOther.as_str(), "DEPRECATED_ONLY_BY_OTHER");
        let json = serde_json::to_string(&DiffKind::BaselineUniqueDeprecated).unwrap();
        assert_eq!(json, "\"BASELINE_UNIQUE_DEPRECATED\"");
    }

    #[test]
    fn sides() {
        assert_eq!(DiffKind::BaselineUnique.side(), Side::Baseline);
        assert_eq!(DiffKind::Renamed.side(), Side::Other);
        assert_eq!(Side::Other.to_string(), "other");
    }
}
