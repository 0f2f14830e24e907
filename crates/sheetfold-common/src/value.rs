use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;
use std::fmt::{self, Display};

/// A raw cell value as delivered by the spreadsheet boundary, before any
/// schema-driven coercion. This is distinct from the JSON values the engine
/// builds: a cell may be a date, or empty, neither of which exists in JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// An explicit JSON null supplied by a JSON-backed sheet.
    Null,
    /// An absent cell.
    Empty,
}

impl CellValue {
    /// Empty cells and empty strings are both "missing": they never reach the
    /// tree builder and never establish shape.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Lower the cell into a JSON leaf without schema hints. `None` for
    /// missing cells. Dates lower to their ISO-8601 rendering.
    pub fn to_json(&self) -> Option<JsonValue> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) if s.is_empty() => None,
            CellValue::Text(s) => Some(JsonValue::String(s.clone())),
            CellValue::Int(i) => Some(JsonValue::from(*i)),
            CellValue::Number(n) => {
                Some(serde_json::Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number))
            }
            CellValue::Boolean(b) => Some(JsonValue::Bool(*b)),
            CellValue::Date(d) => Some(JsonValue::String(d.format("%Y-%m-%d").to_string())),
            CellValue::DateTime(dt) => {
                Some(JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()))
            }
            CellValue::Null => Some(JsonValue::Null),
        }
    }

    /// Build a cell from a JSON leaf, as read from a JSON-backed sheet.
    /// Containers do not occur in well-formed sheets; they degrade to their
    /// compact JSON text.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => CellValue::Null,
            JsonValue::Bool(b) => CellValue::Boolean(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Int(i)
                } else {
                    CellValue::Number(n.as_f64().unwrap_or(0.0))
                }
            }
            JsonValue::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Boolean(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::DateTime(dt) => write!(f, "{dt}"),
            CellValue::Null => write!(f, ""),
            CellValue::Empty => write!(f, ""),
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Int(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Boolean(v)
    }
}

/// Render a JSON leaf the way it appears inside user-facing messages:
/// strings bare, everything else in its compact JSON form.
pub fn display_json(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
