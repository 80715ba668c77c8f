//! Cell values extracted from rows for searching.
//!
//! Rows are opaque to the core. Instead of reflecting over their fields,
//! the host supplies one accessor per column that extracts a `CellValue`.
//! The value kinds cover everything the fuzzy filter knows how to turn
//! into text; anything else is `Opaque` and never searched.

use chrono::{DateTime, Local};
use regex::Regex;
use url::Url;

/// A single cell's value as seen by the fuzzy filter.
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Rendered with the locale's date-time format.
    Date(DateTime<Local>),
    /// Rendered as the serialized href.
    Url(Url),
    /// Rendered as the source pattern.
    Pattern(Regex),
    /// Not representable as text; skipped by the filter.
    Opaque,
}

impl CellValue {
    /// Canonical string form used for matching, or `None` for values
    /// that cannot be searched.
    pub fn searchable_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Int(i) => Some(i.to_string()),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Date(d) => Some(d.format("%c").to_string()),
            CellValue::Url(u) => Some(u.as_str().to_string()),
            CellValue::Pattern(r) => Some(r.as_str().to_string()),
            CellValue::Opaque => None,
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<Url> for CellValue {
    fn from(u: Url) -> Self {
        CellValue::Url(u)
    }
}

impl From<Regex> for CellValue {
    fn from(r: Regex) -> Self {
        CellValue::Pattern(r)
    }
}
