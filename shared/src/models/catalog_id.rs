//! Catalog identifier
//!
//! Raw ids arrive from the datasets with inconsistent quoting (`3`, `"3"`,
//! `'3'`). Every id that enters the catalog goes through [`CatalogId::new`],
//! so comparisons only ever see one canonical form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, normalized identifier for categories and products
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(String);

impl CatalogId {
    /// Create an id from raw input, stripping one layer of wrapping quotes
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize(raw.as_ref()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The id wrapped in a single pair of double quotes
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// Tolerant comparison against a raw id
    ///
    /// Matches when the normalized forms are equal, or when either side
    /// equals the single-quoted wrapping of the other.
    pub fn matches(&self, raw: &str) -> bool {
        let other = normalize(raw);
        if self.0 == other {
            return true;
        }
        let other_quoted = format!("\"{}\"", other);
        self.0 == other_quoted || self.quoted() == other
    }
}

/// Trim whitespace and strip one layer of matching wrapping quotes
pub fn normalize(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CatalogId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for CatalogId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for CatalogId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
