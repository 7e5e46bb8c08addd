//! Dotted numeric identifiers for files and fields

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A dotted numeric identifier (e.g. `2`, `2.01`, `.01`, `580950.1`)
///
/// The provider's underscore form (`63_04`) is normalized to dots. Ordering
/// is numeric, so `2` < `10` < `100` and `2.01` < `2.1`. Identifiers that
/// are not dotted numbers are kept verbatim and sort after all numeric ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct DottedId {
    raw: String,
    key: Option<NumericKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct NumericKey {
    integer: u64,
    /// Fraction digits with trailing zeros removed
    fraction: String,
}

impl DottedId {
    /// Create an identifier from provider text
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim().replace('_', ".");
        let key = parse_key(&raw);
        Self { raw, key }
    }

    /// Identifier text in dotted form
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the identifier is a well-formed dotted number
    pub fn is_numeric(&self) -> bool {
        self.key.is_some()
    }

    /// Digits before the dot (`580950` for `580950.1`, empty for `.01`)
    pub fn integer_part(&self) -> &str {
        self.raw.split('.').next().unwrap_or_default()
    }

    /// Integer value of the part before the dot, if numeric
    pub fn integer_value(&self) -> Option<u64> {
        self.key.as_ref().map(|k| k.integer)
    }
}

fn parse_key(raw: &str) -> Option<NumericKey> {
    let (integer, fraction) = match raw.split_once('.') {
        Some((i, f)) => (i, f),
        None => (raw, ""),
    };

    if integer.is_empty() && fraction.is_empty() {
        return None;
    }
    if !integer.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if raw.contains('.') && fraction.is_empty() {
        return None;
    }

    let integer = if integer.is_empty() { 0 } else { integer.parse().ok()? };

    Some(NumericKey {
        integer,
        fraction: fraction.trim_end_matches('0').to_string(),
    })
}

impl Ord for DottedId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.key, &other.key) {
            (Some(a), Some(b)) => a.cmp(b).then_with(|| self.raw.cmp(&other.raw)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.raw.cmp(&other.raw),
        }
    }
}

impl PartialOrd for DottedId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for DottedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<String> for DottedId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for DottedId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<DottedId> for String {
    fn from(id: DottedId) -> Self {
        id.raw
    }
}

/// Sort identifiers in ascending numeric order
pub fn sort_ids(ids: &mut [DottedId]) {
    ids.sort();
}
