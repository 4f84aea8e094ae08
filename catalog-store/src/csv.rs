//! CSV ingestion for the catalog datasets
//!
//! The datasets use a loose comma-separated format: values containing a
//! comma are wrapped in double quotes, and a quote preceded by a backslash
//! does not toggle the quoted state. There is no other escaping, so this is
//! a single-pass scanner rather than a full RFC 4180 reader.

use std::collections::HashMap;

use crate::error::{CatalogError, CatalogResult};

/// Header whose empty values are coerced to null
pub const PARENT_CATEGORY_FIELD: &str = "parentCategoryId";

/// One data row, keyed by header name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvRecord {
    fields: HashMap<String, Option<String>>,
}

impl CsvRecord {
    /// Build a record from `(header, value)` pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, Option<V>)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        }
    }

    /// Field value; `None` when the column is missing or null
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }

    /// Field value with missing and null read as empty
    pub fn text(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    /// Non-empty field value
    pub fn present(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn is_null(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(None))
    }
}

/// Parse dataset text into records
///
/// A leading byte-order mark is ignored. The first line is the header.
/// Blank lines are skipped; missing trailing fields read as empty strings.
/// Input without a header line is an error.
pub fn parse_csv(text: &str) -> CatalogResult<Vec<CsvRecord>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

    let header_line = lines
        .next()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| CatalogError::Parse("missing header row".into()))?;

    let headers: Vec<String> = header_line
        .split(',')
        .map(|name| strip_wrapping_quotes(name.trim()).to_string())
        .collect();

    let records = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| build_record(&headers, split_line(line)))
        .collect();

    Ok(records)
}

/// Split one data line into raw field values
///
/// Quotes that toggle the quoted state are kept in the buffer and removed
/// afterwards by [`strip_wrapping_quotes`].
pub fn split_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for ch in line.chars() {
        match ch {
            '"' if prev != Some('\\') => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                values.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
        prev = Some(ch);
    }
    values.push(current);

    values
        .into_iter()
        .map(|v| strip_wrapping_quotes(&v).to_string())
        .collect()
}

/// Strip one layer of wrapping double quotes
pub fn strip_wrapping_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn build_record(headers: &[String], values: Vec<String>) -> CsvRecord {
    let mut values = values.into_iter();
    let fields = headers
        .iter()
        .map(|name| {
            let value = values.next().unwrap_or_default();
            let value = if name == PARENT_CATEGORY_FIELD && (value.is_empty() || value == "\"\"") {
                None
            } else {
                Some(value)
            };
            (name.clone(), value)
        })
        .collect();
    CsvRecord { fields }
}
